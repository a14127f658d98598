// Type Mapper: descriptor type strings → Rust types and marshalling strategy.
//
// Every descriptor type either maps to a concrete host type or is a
// generation error. Nothing is silently skipped.

use crate::context::CodegenContext;
use crate::error::{GenResult, GenerationError};

/// How a value crosses the call boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marshal {
    /// Plain value copied into a Variant.
    ByValue,
    /// Engine object: identity-preserving, lifetime-managed handle.
    SharedRef,
    /// Raw engine pointer passed through as an address.
    OpaqueHandle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    Primitive,
    Builtin,
    Variant,
    Object,
    Enum,
    Bitfield,
    TypedArray,
    Pointer,
}

#[derive(Debug, Clone)]
pub struct MappedType {
    pub kind: TypeKind,
    /// Owned form, used for return values and typed-array elements.
    pub rust_type: String,
    /// Argument form (references for heap-backed types).
    pub param_type: String,
    pub strategy: Marshal,
    /// Whether nil is an accepted value.
    pub nullable: bool,
}

/// A builtin value type known to the runtime.
#[derive(Debug, Clone, Copy)]
pub struct BuiltinInfo {
    pub name: &'static str,
    pub rust: &'static str,
    /// Argument type; `None` means pass by value.
    pub param: Option<&'static str>,
}

const fn by_value(name: &'static str, rust: &'static str) -> BuiltinInfo {
    BuiltinInfo { name, rust, param: None }
}

const fn by_ref(name: &'static str, rust: &'static str, param: &'static str) -> BuiltinInfo {
    BuiltinInfo { name, rust, param: Some(param) }
}

/// Builtin catalogue. A builtin class in the descriptor that is missing here
/// is a new engine type kind and aborts generation.
pub const BUILTINS: &[BuiltinInfo] = &[
    by_value("Nil", "()"),
    by_value("bool", "bool"),
    by_value("int", "i64"),
    by_value("float", "f64"),
    by_ref("String", "String", "&str"),
    by_value("Vector2", "grove_runtime::Vector2"),
    by_value("Vector2i", "grove_runtime::Vector2i"),
    by_value("Rect2", "grove_runtime::Rect2"),
    by_value("Rect2i", "grove_runtime::Rect2i"),
    by_value("Vector3", "grove_runtime::Vector3"),
    by_value("Vector3i", "grove_runtime::Vector3i"),
    by_value("Transform2D", "grove_runtime::Transform2D"),
    by_value("Vector4", "grove_runtime::Vector4"),
    by_value("Vector4i", "grove_runtime::Vector4i"),
    by_value("Plane", "grove_runtime::Plane"),
    by_value("Quaternion", "grove_runtime::Quaternion"),
    by_value("AABB", "grove_runtime::Aabb"),
    by_value("Basis", "grove_runtime::Basis"),
    by_value("Transform3D", "grove_runtime::Transform3D"),
    by_value("Projection", "grove_runtime::Projection"),
    by_value("Color", "grove_runtime::Color"),
    by_ref("StringName", "grove_runtime::StringName", "&grove_runtime::StringName"),
    by_ref("NodePath", "grove_runtime::NodePath", "&grove_runtime::NodePath"),
    by_value("RID", "grove_runtime::Rid"),
    by_ref("Callable", "grove_runtime::Callable", "&grove_runtime::Callable"),
    by_ref("Signal", "grove_runtime::Signal", "&grove_runtime::Signal"),
    by_ref("Dictionary", "grove_runtime::Dictionary", "&grove_runtime::Dictionary"),
    by_ref("Array", "grove_runtime::VariantArray", "&grove_runtime::VariantArray"),
    by_ref("PackedByteArray", "grove_runtime::PackedByteArray", "&grove_runtime::PackedByteArray"),
    by_ref("PackedInt32Array", "grove_runtime::PackedInt32Array", "&grove_runtime::PackedInt32Array"),
    by_ref("PackedInt64Array", "grove_runtime::PackedInt64Array", "&grove_runtime::PackedInt64Array"),
    by_ref("PackedFloat32Array", "grove_runtime::PackedFloat32Array", "&grove_runtime::PackedFloat32Array"),
    by_ref("PackedFloat64Array", "grove_runtime::PackedFloat64Array", "&grove_runtime::PackedFloat64Array"),
    by_ref("PackedStringArray", "grove_runtime::PackedStringArray", "&grove_runtime::PackedStringArray"),
    by_ref("PackedVector2Array", "grove_runtime::PackedVector2Array", "&grove_runtime::PackedVector2Array"),
    by_ref("PackedVector3Array", "grove_runtime::PackedVector3Array", "&grove_runtime::PackedVector3Array"),
    by_ref("PackedColorArray", "grove_runtime::PackedColorArray", "&grove_runtime::PackedColorArray"),
    by_ref("PackedVector4Array", "grove_runtime::PackedVector4Array", "&grove_runtime::PackedVector4Array"),
];

pub fn builtin_info(name: &str) -> Option<&'static BuiltinInfo> {
    BUILTINS.iter().find(|b| b.name == name)
}

/// Rust width for an `int` with a descriptor `meta` qualifier.
fn int_for_meta(meta: Option<&str>) -> &'static str {
    match meta {
        Some("int8") => "i8",
        Some("int16") => "i16",
        Some("int32") => "i32",
        Some("uint8") => "u8",
        Some("uint16") | Some("char16") => "u16",
        Some("uint32") | Some("char32") => "u32",
        Some("uint64") => "u64",
        _ => "i64",
    }
}

fn float_for_meta(meta: Option<&str>) -> &'static str {
    match meta {
        Some("float") => "f32",
        _ => "f64",
    }
}

fn simple(kind: TypeKind, rust: &str, param: Option<&str>, strategy: Marshal) -> MappedType {
    MappedType {
        kind,
        rust_type: rust.to_string(),
        param_type: param.unwrap_or(rust).to_string(),
        strategy,
        nullable: false,
    }
}

/// Map a descriptor type string. `context` names the use site for errors.
pub fn map_type(
    ctx: &CodegenContext<'_>,
    ty: &str,
    meta: Option<&str>,
    nullable: bool,
    context: &str,
) -> GenResult<MappedType> {
    match ty {
        "bool" => return Ok(simple(TypeKind::Primitive, "bool", None, Marshal::ByValue)),
        "int" => return Ok(simple(TypeKind::Primitive, int_for_meta(meta), None, Marshal::ByValue)),
        "float" => {
            return Ok(simple(TypeKind::Primitive, float_for_meta(meta), None, Marshal::ByValue));
        }
        "Variant" => {
            let mut mapped = simple(
                TypeKind::Variant,
                "grove_runtime::Variant",
                Some("&grove_runtime::Variant"),
                Marshal::ByValue,
            );
            mapped.nullable = true;
            return Ok(mapped);
        }
        _ => {}
    }

    if ty.ends_with('*') {
        return Ok(simple(
            TypeKind::Pointer,
            "grove_runtime::OpaquePtr",
            None,
            Marshal::OpaqueHandle,
        ));
    }

    if let Some((kind, rest)) = ty.split_once("::") {
        return match kind {
            "enum" | "bitfield" => {
                let resolved = ctx.find_enum(rest).ok_or_else(|| GenerationError::UnknownType {
                    ty: ty.to_string(),
                    context: context.to_string(),
                })?;
                let kind = if resolved.descriptor.is_bitfield {
                    TypeKind::Bitfield
                } else {
                    TypeKind::Enum
                };
                Ok(simple(kind, &resolved.path, None, Marshal::ByValue))
            }
            "typedarray" => {
                // Object elements are always nullable: the engine may hand back
                // arrays with freed or null entries.
                let element = map_type(ctx, rest, None, true, context)?;
                let rust = format!("Vec<{}>", element.rust_type);
                let param = format!("&[{}]", element.rust_type);
                Ok(MappedType {
                    kind: TypeKind::TypedArray,
                    rust_type: rust,
                    param_type: param,
                    strategy: element.strategy,
                    nullable: false,
                })
            }
            "typeddictionary" => Ok(simple(
                TypeKind::Builtin,
                "grove_runtime::Dictionary",
                Some("&grove_runtime::Dictionary"),
                Marshal::ByValue,
            )),
            other => Err(GenerationError::UnsupportedTypeKind {
                kind: other.to_string(),
                ty: ty.to_string(),
                context: context.to_string(),
            }),
        };
    }

    if let Some(info) = builtin_info(ty) {
        return Ok(simple(TypeKind::Builtin, info.rust, info.param, Marshal::ByValue));
    }

    if ctx.classes.contains_key(ty) {
        let gd = format!("grove_runtime::Gd<crate::classes::{ty}>");
        let (rust, param) = if nullable {
            (format!("Option<{gd}>"), format!("Option<&{gd}>"))
        } else {
            (gd.clone(), format!("&{gd}"))
        };
        return Ok(MappedType {
            kind: TypeKind::Object,
            rust_type: rust,
            param_type: param,
            strategy: Marshal::SharedRef,
            nullable,
        });
    }

    Err(GenerationError::UnknownType {
        ty: ty.to_string(),
        context: context.to_string(),
    })
}

/// Short snake_case discriminator for a type, used to name overloads.
pub fn type_discriminator(ty: &str) -> String {
    let base = match ty.split_once("::") {
        Some((_, rest)) => {
            let last = rest.rsplit('.').next().unwrap_or(rest);
            if ty.starts_with("typedarray::") {
                format!("array_{last}")
            } else {
                last.to_string()
            }
        }
        None => ty.trim_end_matches('*').trim().to_string(),
    };
    crate::naming::sanitize_ident(&crate::naming::to_snake_case(&base).replace(' ', "_"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CodegenOptions;
    use crate::schema::Descriptor;

    fn descriptor() -> Descriptor {
        serde_json::from_str(
            r#"{
            "header": {"version_major": 4, "version_minor": 3},
            "global_enums": [{"name": "Side", "values": [{"name": "SIDE_LEFT", "value": 0}]}],
            "builtin_classes": [{"name": "Vector3"}, {"name": "int"}],
            "classes": [
                {"name": "Object", "is_instantiable": true},
                {"name": "Node", "inherits": "Object",
                 "enums": [{"name": "ProcessMode", "values": [
                    {"name": "PROCESS_MODE_INHERIT", "value": 0},
                    {"name": "PROCESS_MODE_ALWAYS", "value": 3}]}]}
            ]
        }"#,
        )
        .unwrap()
    }

    fn map(ty: &str, meta: Option<&str>) -> GenResult<MappedType> {
        let d = descriptor();
        let options = CodegenOptions::default();
        let ctx = CodegenContext::build(&d, &options).unwrap();
        map_type(&ctx, ty, meta, true, "test")
    }

    #[test]
    fn int_widths_follow_meta() {
        assert_eq!(map("int", None).unwrap().rust_type, "i64");
        assert_eq!(map("int", Some("int32")).unwrap().rust_type, "i32");
        assert_eq!(map("int", Some("uint8")).unwrap().rust_type, "u8");
        assert_eq!(map("float", Some("float")).unwrap().rust_type, "f32");
        assert_eq!(map("float", Some("double")).unwrap().rust_type, "f64");
    }

    #[test]
    fn builtins_map_to_runtime_types() {
        let v = map("Vector3", None).unwrap();
        assert_eq!(v.rust_type, "grove_runtime::Vector3");
        assert_eq!(v.strategy, Marshal::ByValue);
        let s = map("String", None).unwrap();
        assert_eq!(s.param_type, "&str");
    }

    #[test]
    fn objects_are_shared_refs() {
        let node = map("Node", None).unwrap();
        assert_eq!(node.kind, TypeKind::Object);
        assert_eq!(node.strategy, Marshal::SharedRef);
        assert_eq!(node.rust_type, "Option<grove_runtime::Gd<crate::classes::Node>>");
    }

    #[test]
    fn typed_object_arrays_have_nullable_elements() {
        let arr = map("typedarray::Node", None).unwrap();
        assert_eq!(arr.rust_type, "Vec<Option<grove_runtime::Gd<crate::classes::Node>>>");
        let values = map("typedarray::Vector3", None).unwrap();
        assert_eq!(values.rust_type, "Vec<grove_runtime::Vector3>");
    }

    #[test]
    fn enums_resolve_to_scoped_paths() {
        assert_eq!(
            map("enum::Node.ProcessMode", None).unwrap().rust_type,
            "crate::classes::node::ProcessMode"
        );
        assert_eq!(map("enum::Side", None).unwrap().rust_type, "crate::global_enums::Side");
    }

    #[test]
    fn unknown_kinds_are_errors() {
        assert!(matches!(
            map("Spline", None),
            Err(GenerationError::UnknownType { .. })
        ));
        assert!(matches!(
            map("tuple::int;int", None),
            Err(GenerationError::UnsupportedTypeKind { .. })
        ));
        assert!(matches!(
            map("enum::Node.Missing", None),
            Err(GenerationError::UnknownType { .. })
        ));
    }

    #[test]
    fn pointers_are_opaque() {
        let p = map("const uint8_t*", None).unwrap();
        assert_eq!(p.strategy, Marshal::OpaqueHandle);
    }

    #[test]
    fn discriminators() {
        assert_eq!(type_discriminator("int"), "int");
        assert_eq!(type_discriminator("Vector3"), "vector_3");
        assert_eq!(type_discriminator("typedarray::Node"), "array_node");
        assert_eq!(type_discriminator("enum::Node.ProcessMode"), "process_mode");
    }
}
