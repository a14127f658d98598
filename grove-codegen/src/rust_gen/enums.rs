// Rust enum generation from descriptor enums.

use std::collections::{BTreeMap, BTreeSet};

use crate::naming::{enum_type_name, escape_reserved, sanitize_ident, strip_case_prefixes, to_pascal_case};
use crate::schema::EnumDescriptor;

/// One generated case. Aliases (a value already taken by an earlier case)
/// become associated constants pointing at the first case.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumCase {
    pub ident: String,
    pub value: i64,
    pub alias_of: Option<String>,
}

/// Case identifiers for an exhaustive enum, in descriptor order.
pub fn enum_cases(e: &EnumDescriptor) -> Vec<EnumCase> {
    let names: Vec<&str> = e.values.iter().map(|v| v.name.as_str()).collect();
    let stripped = strip_case_prefixes(&e.name, &names);

    let mut seen_idents = BTreeSet::new();
    let mut first_by_value: BTreeMap<i64, String> = BTreeMap::new();
    let mut cases = Vec::with_capacity(e.values.len());
    for (value, short) in e.values.iter().zip(stripped) {
        let mut ident = escape_reserved(&sanitize_ident(&to_pascal_case(short)));
        if !seen_idents.insert(ident.clone()) {
            ident = escape_reserved(&sanitize_ident(&to_pascal_case(&value.name)));
            seen_idents.insert(ident.clone());
        }
        let alias_of = first_by_value.get(&value.value).cloned();
        if alias_of.is_none() {
            first_by_value.insert(value.value, ident.clone());
        }
        cases.push(EnumCase {
            ident,
            value: value.value,
            alias_of,
        });
    }
    cases
}

/// Flag constant names for a bitfield: stripped SCREAMING names.
fn bitfield_flags(e: &EnumDescriptor) -> Vec<(String, i64)> {
    let names: Vec<&str> = e.values.iter().map(|v| v.name.as_str()).collect();
    let stripped = strip_case_prefixes(&e.name, &names);
    let mut seen = BTreeSet::new();
    e.values
        .iter()
        .zip(stripped)
        .map(|(v, short)| {
            let mut ident = sanitize_ident(short);
            if !seen.insert(ident.clone()) {
                ident = sanitize_ident(&v.name);
                seen.insert(ident.clone());
            }
            (ident, v.value)
        })
        .collect()
}

fn display(ident: &str) -> &str {
    ident.strip_prefix("r#").unwrap_or(ident)
}

/// Generate Rust code for one enum. `engine_name` is the scoped engine name
/// (`Node.ProcessMode`), used for diagnostics and editor metadata.
pub fn generate_enum(e: &EnumDescriptor, engine_name: &str) -> String {
    if e.is_bitfield || e.values.is_empty() {
        return generate_bitfield(e, engine_name);
    }

    let name = enum_type_name(&e.name);
    let cases = enum_cases(e);
    let mut out = String::with_capacity(2048);

    out.push_str(&format!(
        "/// Engine enum `{engine_name}`.\n\
         #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]\n\
         #[repr(i64)]\n\
         pub enum {name} {{\n"
    ));
    for case in cases.iter().filter(|c| c.alias_of.is_none()) {
        out.push_str(&format!("    {} = {},\n", case.ident, case.value));
    }
    out.push_str("}\n");

    let aliases: Vec<&EnumCase> = cases.iter().filter(|c| c.alias_of.is_some()).collect();
    if !aliases.is_empty() {
        out.push_str(&format!("\nimpl {name} {{\n"));
        for case in aliases {
            let target = case.alias_of.as_deref().unwrap_or_default();
            out.push_str(&format!(
                "    #[allow(non_upper_case_globals)]\n    pub const {}: Self = Self::{target};\n",
                case.ident
            ));
        }
        out.push_str("}\n");
    }

    out.push_str(&format!(
        "\nimpl grove_runtime::EngineEnum for {name} {{\n\
         \x20   const ENGINE_NAME: &'static str = \"{engine_name}\";\n\n\
         \x20   fn ord(self) -> i64 {{\n\
         \x20       self as i64\n\
         \x20   }}\n\n\
         \x20   fn try_from_ord(ord: i64) -> Option<Self> {{\n\
         \x20       match ord {{\n"
    ));
    for case in cases.iter().filter(|c| c.alias_of.is_none()) {
        out.push_str(&format!(
            "            {} => Some({name}::{}),\n",
            case.value, case.ident
        ));
    }
    out.push_str(
        "            _ => None,\n\
         \x20       }\n\
         \x20   }\n\n\
         \x20   fn cases() -> &'static [(&'static str, i64)] {\n\
         \x20       &[\n",
    );
    for case in cases.iter().filter(|c| c.alias_of.is_none()) {
        out.push_str(&format!(
            "            (\"{}\", {}),\n",
            display(&case.ident),
            case.value
        ));
    }
    out.push_str("        ]\n    }\n}\n");
    out.push_str(&format!("\ngrove_runtime::engine_enum_codec!({name});\n"));
    out
}

fn generate_bitfield(e: &EnumDescriptor, engine_name: &str) -> String {
    let name = enum_type_name(&e.name);
    let flags = bitfield_flags(e);
    let mut out = String::with_capacity(1024);

    out.push_str(&format!(
        "/// Engine bitfield `{engine_name}`.\n\
         #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]\n\
         pub struct {name}(pub u64);\n\n\
         impl {name} {{\n"
    ));
    for (ident, value) in &flags {
        out.push_str(&format!("    pub const {ident}: Self = Self({});\n", *value as u64));
    }
    out.push_str("}\n");

    out.push_str(&format!(
        "\nimpl std::ops::BitOr for {name} {{\n\
         \x20   type Output = Self;\n\n\
         \x20   fn bitor(self, rhs: Self) -> Self {{\n\
         \x20       Self(self.0 | rhs.0)\n\
         \x20   }}\n\
         }}\n\n\
         impl grove_runtime::EngineBitfield for {name} {{\n\
         \x20   const ENGINE_NAME: &'static str = \"{engine_name}\";\n\n\
         \x20   fn bits(self) -> u64 {{\n\
         \x20       self.0\n\
         \x20   }}\n\n\
         \x20   fn from_bits(bits: u64) -> Self {{\n\
         \x20       Self(bits)\n\
         \x20   }}\n\n\
         \x20   fn flags() -> &'static [(&'static str, i64)] {{\n\
         \x20       &[\n"
    ));
    for (ident, value) in &flags {
        out.push_str(&format!("            (\"{ident}\", {value}),\n"));
    }
    out.push_str("        ]\n    }\n}\n");
    out.push_str(&format!("\ngrove_runtime::engine_bitfield_codec!({name});\n"));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::EnumValue;

    fn make(name: &str, bitfield: bool, values: &[(&str, i64)]) -> EnumDescriptor {
        EnumDescriptor {
            name: name.to_string(),
            is_bitfield: bitfield,
            values: values
                .iter()
                .map(|(n, v)| EnumValue {
                    name: n.to_string(),
                    value: *v,
                })
                .collect(),
        }
    }

    #[test]
    fn gaps_are_preserved() {
        let e = make(
            "ProcessMode",
            false,
            &[("PROCESS_MODE_INHERIT", 0), ("PROCESS_MODE_ALWAYS", 3), ("PROCESS_MODE_DISABLED", 4)],
        );
        let code = generate_enum(&e, "Node.ProcessMode");
        assert!(code.contains("    Inherit = 0,\n"));
        assert!(code.contains("    Always = 3,\n"));
        assert!(code.contains("            4 => Some(ProcessMode::Disabled),\n"));
        assert!(code.contains("(\"Always\", 3)"));
        assert!(!code.contains("= 1,"));
    }

    #[test]
    fn aliases_become_constants() {
        let e = make("Key", false, &[("KEY_NONE", 0), ("KEY_SPECIAL", 1), ("KEY_FIRST", 1)]);
        let cases = enum_cases(&e);
        assert_eq!(cases[2].alias_of.as_deref(), Some("Special"));
        let code = generate_enum(&e, "Key");
        assert!(code.contains("pub const First: Self = Self::Special;"));
    }

    #[test]
    fn digit_cases_are_sanitized() {
        let e = make("Slot", false, &[("SLOT_0", 0), ("SLOT_1", 1)]);
        let idents: Vec<String> = enum_cases(&e).into_iter().map(|c| c.ident).collect();
        assert_eq!(idents, vec!["_0", "_1"]);
    }

    #[test]
    fn bitfields_are_newtypes() {
        let e = make("MouseButtonMask", true, &[("MOUSE_BUTTON_MASK_LEFT", 1), ("MOUSE_BUTTON_MASK_RIGHT", 2)]);
        let code = generate_enum(&e, "MouseButtonMask");
        assert!(code.contains("pub struct MouseButtonMask(pub u64);"));
        assert!(code.contains("pub const LEFT: Self = Self(1);"));
        assert!(code.contains("engine_bitfield_codec!(MouseButtonMask)"));
    }
}
