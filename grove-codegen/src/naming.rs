// Name conversion utilities for codegen.

/// Convert a PascalCase or UPPER_CASE name to snake_case.
///
/// Digit runs attach to the preceding word: `Node3D` → `node_3d`,
/// `AudioStreamMP3` → `audio_stream_mp3`.
pub fn to_snake_case(name: &str) -> String {
    let mut result = String::with_capacity(name.len() + 8);
    let chars: Vec<char> = name.chars().collect();

    for (i, &ch) in chars.iter().enumerate() {
        if ch.is_ascii_uppercase() {
            if i > 0 {
                let prev = chars[i - 1];
                // Insert underscore before uppercase if preceded by lowercase,
                // or if it starts a new word in an acronym (e.g., "HTTPServer" -> "http_server").
                if prev.is_ascii_lowercase() {
                    result.push('_');
                } else if prev.is_ascii_uppercase()
                    && i + 1 < chars.len()
                    && chars[i + 1].is_ascii_lowercase()
                {
                    result.push('_');
                }
            }
            result.push(ch.to_ascii_lowercase());
        } else if ch.is_ascii_digit() {
            if i > 0 && chars[i - 1].is_ascii_lowercase() {
                result.push('_');
            }
            result.push(ch);
        } else {
            result.push(ch);
        }
    }

    result
}

/// Convert SCREAMING_SNAKE or snake_case to PascalCase.
pub fn to_pascal_case(name: &str) -> String {
    let mut result = String::with_capacity(name.len());
    for word in name.split('_').filter(|w| !w.is_empty()) {
        let mut chars = word.chars();
        if let Some(first) = chars.next() {
            result.push(first.to_ascii_uppercase());
            result.extend(chars.map(|c| c.to_ascii_lowercase()));
        }
    }
    result
}

/// Convert a PascalCase name to SCREAMING_SNAKE_CASE.
pub fn to_screaming_snake(name: &str) -> String {
    to_snake_case(name).to_ascii_uppercase()
}

/// Rust type name for a descriptor enum name. Scoped names like
/// `Variant.Type` are joined: `VariantType`.
pub fn enum_type_name(name: &str) -> String {
    name.split('.').collect::<String>()
}

/// Make an arbitrary string a valid Rust identifier.
pub fn sanitize_ident(name: &str) -> String {
    let mut result = String::with_capacity(name.len() + 1);
    for (i, ch) in name.chars().enumerate() {
        if ch.is_ascii_alphanumeric() || ch == '_' {
            if i == 0 && ch.is_ascii_digit() {
                result.push('_');
            }
            result.push(ch);
        } else {
            result.push('_');
        }
    }
    if result.is_empty() {
        result.push_str("_Unnamed");
    }
    result
}

const RESERVED_WORDS: &[&str] = &[
    "as", "break", "const", "continue", "crate", "else", "enum", "extern", "false",
    "fn", "for", "if", "impl", "in", "let", "loop", "match", "mod", "move",
    "mut", "pub", "ref", "return", "self", "Self", "static", "struct", "super",
    "trait", "true", "type", "unsafe", "use", "where", "while", "async",
    "await", "dyn", "abstract", "become", "box", "do", "final", "macro",
    "override", "priv", "typeof", "unsized", "virtual", "yield", "try", "gen",
];

/// Check if a name is a Rust reserved word.
pub fn is_reserved(name: &str) -> bool {
    RESERVED_WORDS.contains(&name)
}

/// Escape Rust reserved words by prepending `r#`. `self`, `Self`, `crate`
/// and `super` cannot be raw identifiers and get a trailing underscore.
pub fn escape_reserved(name: &str) -> String {
    match name {
        "self" | "Self" | "crate" | "super" => format!("{name}_"),
        _ if is_reserved(name) => format!("r#{name}"),
        _ => name.to_string(),
    }
}

/// Module file name for a class: `Node3D` → `node_3d`.
pub fn module_name(class: &str) -> String {
    escape_reserved(&to_snake_case(class))
}

/// Strip the prefix shared by every enum case name, on `_` boundaries.
///
/// Falls back to stripping the enum's own SCREAMING name when there is a
/// single case. Never strips a prefix that would leave an empty name.
pub fn strip_case_prefixes<'a>(enum_name: &str, cases: &[&'a str]) -> Vec<&'a str> {
    let prefix_len = if cases.len() > 1 {
        common_word_prefix(cases)
    } else {
        let own = format!("{}_", to_screaming_snake(&enum_type_name(enum_name)));
        match cases.first() {
            Some(case) if case.starts_with(&own) && case.len() > own.len() => own.len(),
            _ => 0,
        }
    };
    cases.iter().map(|c| &c[prefix_len..]).collect()
}

fn common_word_prefix(cases: &[&str]) -> usize {
    let Some(first) = cases.first() else {
        return 0;
    };
    let mut len = 0;
    for (i, ch) in first.char_indices() {
        if ch != '_' {
            continue;
        }
        let candidate = &first[..=i];
        let all_share = cases
            .iter()
            .all(|c| c.starts_with(candidate) && c.len() > candidate.len());
        if all_share {
            len = i + 1;
        } else {
            break;
        }
    }
    len
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_snake_case() {
        assert_eq!(to_snake_case("Node3D"), "node_3d");
        assert_eq!(to_snake_case("GetObjectCount"), "get_object_count");
        assert_eq!(to_snake_case("HTTPRequest"), "http_request");
        assert_eq!(to_snake_case("Texture2DArray"), "texture_2d_array");
        assert_eq!(to_snake_case("AudioStreamMP3"), "audio_stream_mp3");
        assert_eq!(to_snake_case("GPUParticles3D"), "gpu_particles_3d");
        assert_eq!(to_snake_case("URL"), "url");
        assert_eq!(to_snake_case("GetGlobalTransform2D"), "get_global_transform_2d");
    }

    #[test]
    fn test_to_pascal_case() {
        assert_eq!(to_pascal_case("ROTATION_EDIT_MODE_EULER"), "RotationEditModeEuler");
        assert_eq!(to_pascal_case("EULER"), "Euler");
        assert_eq!(to_pascal_case("process_mode"), "ProcessMode");
    }

    #[test]
    fn test_escape_reserved() {
        assert_eq!(escape_reserved("type"), "r#type");
        assert_eq!(escape_reserved("move"), "r#move");
        assert_eq!(escape_reserved("self"), "self_");
        assert_eq!(escape_reserved("position"), "position");
    }

    #[test]
    fn test_enum_type_name() {
        assert_eq!(enum_type_name("Variant.Type"), "VariantType");
        assert_eq!(enum_type_name("Side"), "Side");
    }

    #[test]
    fn strips_shared_prefix() {
        let cases = ["PROCESS_MODE_INHERIT", "PROCESS_MODE_PAUSABLE", "PROCESS_MODE_ALWAYS"];
        assert_eq!(
            strip_case_prefixes("ProcessMode", &cases),
            vec!["INHERIT", "PAUSABLE", "ALWAYS"]
        );
    }

    #[test]
    fn keeps_names_when_prefix_would_empty_them() {
        let cases = ["KEY_A", "KEY"];
        assert_eq!(strip_case_prefixes("Key", &cases), vec!["KEY_A", "KEY"]);
    }

    #[test]
    fn single_case_strips_enum_name() {
        let cases = ["SIDE_LEFT"];
        assert_eq!(strip_case_prefixes("Side", &cases), vec!["LEFT"]);
    }

    #[test]
    fn sanitizes_digit_start() {
        assert_eq!(sanitize_ident("0"), "_0");
        assert_eq!(sanitize_ident("a-b"), "a_b");
    }
}
