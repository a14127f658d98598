// Identifier helpers shared by the expansions.

/// `PlayerController` -> `player_controller`, `HTTPClient` -> `http_client`.
pub(crate) fn to_snake_case(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut result = String::with_capacity(s.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if c.is_uppercase() {
            let prev_lower = i > 0 && (chars[i - 1].is_lowercase() || chars[i - 1].is_ascii_digit());
            let next_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            if i > 0 && (prev_lower || (next_lower && chars[i - 1].is_uppercase())) {
                result.push('_');
            }
            result.extend(c.to_lowercase());
        } else {
            result.push(c);
        }
    }
    result
}

/// Engine name of a `#[vfunc]` method: `ready` -> `_ready`.
pub(crate) fn virtual_name(method: &str) -> String {
    if method.starts_with('_') {
        method.to_string()
    } else {
        format!("_{method}")
    }
}

/// `r#type` -> `type`.
pub(crate) fn unraw(ident: &syn::Ident) -> String {
    let s = ident.to_string();
    s.strip_prefix("r#").map(str::to_string).unwrap_or(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snake_case() {
        assert_eq!(to_snake_case("Player"), "player");
        assert_eq!(to_snake_case("PlayerController"), "player_controller");
        assert_eq!(to_snake_case("HTTPClient"), "http_client");
        assert_eq!(to_snake_case("Node3D"), "node3_d");
    }

    #[test]
    fn virtual_names() {
        assert_eq!(virtual_name("ready"), "_ready");
        assert_eq!(virtual_name("_process"), "_process");
    }
}
