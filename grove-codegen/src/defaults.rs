// Default argument values: descriptor literals → Rust expressions.
//
// A literal that cannot be expressed leaves the argument required; the
// descriptor value is never guessed at.

use crate::context::CodegenContext;
use crate::rust_gen::enums;
use crate::type_map::{MappedType, TypeKind};

#[derive(Debug, Clone, PartialEq)]
pub struct DefaultExpr {
    pub expr: String,
    /// The argument is taken by reference, so the default must be bound to a
    /// local before `unwrap_or(&local)`.
    pub needs_binding: bool,
}

/// Try to turn a descriptor default literal into a Rust expression for `ty`.
pub fn parse_default(
    ctx: &CodegenContext<'_>,
    ty: &str,
    mapped: &MappedType,
    literal: &str,
) -> Option<DefaultExpr> {
    let literal = literal.trim();
    let expr = match mapped.kind {
        TypeKind::Primitive => primitive_default(&mapped.rust_type, literal)?,
        TypeKind::Enum | TypeKind::Bitfield => enum_default(ctx, ty, mapped, literal)?,
        TypeKind::Builtin => builtin_default(ty, literal)?,
        TypeKind::TypedArray => {
            if literal == "[]" || (literal.starts_with("Array[") && literal.ends_with("([])")) {
                "Vec::new()".to_string()
            } else {
                return None;
            }
        }
        TypeKind::Variant => match literal {
            "null" => "grove_runtime::Variant::Nil".to_string(),
            _ => return None,
        },
        // Object arguments are already optional; pointers have no literal form.
        TypeKind::Object | TypeKind::Pointer => return None,
    };
    let needs_binding = mapped.param_type.starts_with('&') && mapped.param_type != "&str";
    Some(DefaultExpr { expr, needs_binding })
}

fn primitive_default(rust_type: &str, literal: &str) -> Option<String> {
    match rust_type {
        "bool" => match literal {
            "true" | "false" => Some(literal.to_string()),
            _ => None,
        },
        "f32" | "f64" => float_literal(literal, rust_type),
        _ => int_literal(literal, rust_type),
    }
}

fn int_literal(literal: &str, rust_type: &str) -> Option<String> {
    let value: i128 = literal.parse().ok()?;
    let (min, max): (i128, i128) = match rust_type {
        "i8" => (i8::MIN as i128, i8::MAX as i128),
        "i16" => (i16::MIN as i128, i16::MAX as i128),
        "i32" => (i32::MIN as i128, i32::MAX as i128),
        "u8" => (0, u8::MAX as i128),
        "u16" => (0, u16::MAX as i128),
        "u32" => (0, u32::MAX as i128),
        "u64" => (0, u64::MAX as i128),
        _ => (i64::MIN as i128, i64::MAX as i128),
    };
    if value < min || value > max {
        return None;
    }
    Some(format!("{value}{rust_type}"))
}

fn float_literal(literal: &str, rust_type: &str) -> Option<String> {
    match literal {
        "inf" => return Some(format!("{rust_type}::INFINITY")),
        "-inf" => return Some(format!("{rust_type}::NEG_INFINITY")),
        _ => {}
    }
    let value: f64 = literal.parse().ok()?;
    if !value.is_finite() {
        return None;
    }
    if literal.contains(['.', 'e', 'E']) {
        Some(format!("{literal}{rust_type}"))
    } else {
        Some(format!("{literal}.0{rust_type}"))
    }
}

fn enum_default(
    ctx: &CodegenContext<'_>,
    ty: &str,
    mapped: &MappedType,
    literal: &str,
) -> Option<String> {
    let value: i64 = literal.parse().ok()?;
    let (_, scoped) = ty.split_once("::")?;
    let resolved = ctx.find_enum(scoped)?;
    if resolved.descriptor.is_bitfield {
        return (value >= 0).then(|| format!("{}({value})", mapped.rust_type));
    }
    let case = enums::enum_cases(resolved.descriptor)
        .into_iter()
        .find(|c| c.value == value && c.alias_of.is_none())?;
    Some(format!("{}::{}", mapped.rust_type, case.ident))
}

/// Split `Name(a, b, c)` into its numeric components.
fn constructor_args<'s>(literal: &'s str, name: &str) -> Option<Vec<&'s str>> {
    let inner = literal.strip_prefix(name)?.strip_prefix('(')?.strip_suffix(')')?;
    if inner.trim().is_empty() {
        return Some(Vec::new());
    }
    Some(inner.split(',').map(str::trim).collect())
}

fn floats(args: &[&str]) -> Option<Vec<String>> {
    args.iter().map(|a| float_literal(a, "f32")).collect()
}

fn ints(args: &[&str]) -> Option<Vec<String>> {
    args.iter().map(|a| int_literal(a, "i32")).collect()
}

fn quoted(s: &str) -> Option<&str> {
    s.strip_prefix('"')?.strip_suffix('"')
}

fn builtin_default(ty: &str, literal: &str) -> Option<String> {
    let rt = crate::type_map::builtin_info(ty)?.rust;
    match ty {
        "String" => {
            let text = quoted(literal)?;
            Some(format!("{text:?}"))
        }
        "StringName" => {
            let text = quoted(literal.strip_prefix('&')?)?;
            Some(format!("{rt}::from({text:?})"))
        }
        "NodePath" => {
            let inner = literal.strip_prefix("NodePath(")?.strip_suffix(')')?;
            let text = if inner.is_empty() { "" } else { quoted(inner)? };
            Some(format!("{rt}::from({text:?})"))
        }
        "Vector2" | "Vector3" | "Vector4" => {
            let args = floats(&constructor_args(literal, ty)?)?;
            Some(format!("{rt}::new({})", args.join(", ")))
        }
        "Vector2i" | "Vector3i" | "Vector4i" => {
            let args = ints(&constructor_args(literal, ty)?)?;
            Some(format!("{rt}::new({})", args.join(", ")))
        }
        "Color" => {
            let args = floats(&constructor_args(literal, ty)?)?;
            (args.len() == 4).then(|| format!("{rt}::new({})", args.join(", ")))
        }
        "Rect2" => {
            let args = floats(&constructor_args(literal, ty)?)?;
            (args.len() == 4).then(|| format!("{rt}::from_components({})", args.join(", ")))
        }
        "Rect2i" => {
            let args = ints(&constructor_args(literal, ty)?)?;
            (args.len() == 4).then(|| format!("{rt}::from_components({})", args.join(", ")))
        }
        "Quaternion" => {
            let args = floats(&constructor_args(literal, ty)?)?;
            (args.len() == 4).then(|| format!("{rt}::from_xyzw({})", args.join(", ")))
        }
        "Transform2D" => {
            let args = constructor_args(literal, ty)?;
            (args == ["1", "0", "0", "1", "0", "0"]).then(|| format!("{rt}::IDENTITY"))
        }
        "Transform3D" => {
            let args = constructor_args(literal, ty)?;
            let identity = ["1", "0", "0", "0", "1", "0", "0", "0", "1", "0", "0", "0"];
            (args == identity).then(|| format!("{rt}::IDENTITY"))
        }
        "Basis" => {
            let args = constructor_args(literal, ty)?;
            let identity = ["1", "0", "0", "0", "1", "0", "0", "0", "1"];
            (args == identity).then(|| format!("{rt}::IDENTITY"))
        }
        "AABB" | "Plane" => {
            let args = constructor_args(literal, ty)?;
            args.iter().all(|a| *a == "0").then(|| format!("{rt}::default()"))
        }
        "Projection" => {
            let args = constructor_args(literal, ty)?;
            args.iter().all(|a| *a == "0").then(|| format!("{rt}::ZERO"))
        }
        "RID" | "Callable" | "Signal" => (constructor_args(literal, ty)?.is_empty())
            .then(|| format!("{rt}::default()")),
        "Array" => (literal == "[]" || literal.ends_with("([])")).then(|| format!("{rt}::new()")),
        "Dictionary" => (literal == "{}").then(|| format!("{rt}::new()")),
        t if t.starts_with("Packed") => {
            (constructor_args(literal, ty)?.is_empty()).then(|| format!("{rt}::default()"))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitives() {
        assert_eq!(primitive_default("bool", "true").as_deref(), Some("true"));
        assert_eq!(primitive_default("i64", "-1").as_deref(), Some("-1i64"));
        assert_eq!(primitive_default("u8", "300"), None);
        assert_eq!(primitive_default("f64", "1").as_deref(), Some("1.0f64"));
        assert_eq!(primitive_default("f32", "0.5").as_deref(), Some("0.5f32"));
        assert_eq!(primitive_default("f64", "inf").as_deref(), Some("f64::INFINITY"));
    }

    #[test]
    fn vectors_and_colors() {
        assert_eq!(
            builtin_default("Vector3", "Vector3(0, 1, 0)").as_deref(),
            Some("grove_runtime::Vector3::new(0.0f32, 1.0f32, 0.0f32)")
        );
        assert_eq!(
            builtin_default("Color", "Color(1, 1, 1, 1)").as_deref(),
            Some("grove_runtime::Color::new(1.0f32, 1.0f32, 1.0f32, 1.0f32)")
        );
        assert_eq!(
            builtin_default("Vector2i", "Vector2i(-1, 2)").as_deref(),
            Some("grove_runtime::Vector2i::new(-1i32, 2i32)")
        );
    }

    #[test]
    fn strings() {
        assert_eq!(builtin_default("String", "\"\"").as_deref(), Some("\"\""));
        assert_eq!(
            builtin_default("StringName", "&\"idle\"").as_deref(),
            Some("grove_runtime::StringName::from(\"idle\")")
        );
        assert_eq!(
            builtin_default("NodePath", "NodePath(\"\")").as_deref(),
            Some("grove_runtime::NodePath::from(\"\")")
        );
    }

    #[test]
    fn containers() {
        assert_eq!(builtin_default("Array", "[]").as_deref(), Some("grove_runtime::VariantArray::new()"));
        assert_eq!(builtin_default("Dictionary", "{}").as_deref(), Some("grove_runtime::Dictionary::new()"));
        assert_eq!(
            builtin_default("PackedStringArray", "PackedStringArray()").as_deref(),
            Some("grove_runtime::PackedStringArray::default()")
        );
    }

    #[test]
    fn unsupported_literals_stay_required() {
        assert_eq!(builtin_default("Transform3D", "Transform3D(2, 0, 0, 0, 1, 0, 0, 0, 1, 0, 0, 0)"), None);
        assert_eq!(builtin_default("Color", "Color(1, 1, 1)"), None);
        assert_eq!(builtin_default("String", "unquoted"), None);
    }
}
