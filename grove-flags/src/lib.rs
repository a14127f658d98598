// Engine ABI constants.
//
// Mirrors the engine's Variant::Type, PropertyHint, PropertyUsageFlags and
// MethodFlags enumerations. Values are part of the binary contract and must
// never be renumbered.

// ---------------------------------------------------------------------------
// Variant type tags (u32)
// ---------------------------------------------------------------------------

pub const VARIANT_NIL: u32 = 0;
pub const VARIANT_BOOL: u32 = 1;
pub const VARIANT_INT: u32 = 2;
pub const VARIANT_FLOAT: u32 = 3;
pub const VARIANT_STRING: u32 = 4;
pub const VARIANT_VECTOR2: u32 = 5;
pub const VARIANT_VECTOR2I: u32 = 6;
pub const VARIANT_RECT2: u32 = 7;
pub const VARIANT_RECT2I: u32 = 8;
pub const VARIANT_VECTOR3: u32 = 9;
pub const VARIANT_VECTOR3I: u32 = 10;
pub const VARIANT_TRANSFORM2D: u32 = 11;
pub const VARIANT_VECTOR4: u32 = 12;
pub const VARIANT_VECTOR4I: u32 = 13;
pub const VARIANT_PLANE: u32 = 14;
pub const VARIANT_QUATERNION: u32 = 15;
pub const VARIANT_AABB: u32 = 16;
pub const VARIANT_BASIS: u32 = 17;
pub const VARIANT_TRANSFORM3D: u32 = 18;
pub const VARIANT_PROJECTION: u32 = 19;
pub const VARIANT_COLOR: u32 = 20;
pub const VARIANT_STRING_NAME: u32 = 21;
pub const VARIANT_NODE_PATH: u32 = 22;
pub const VARIANT_RID: u32 = 23;
pub const VARIANT_OBJECT: u32 = 24;
pub const VARIANT_CALLABLE: u32 = 25;
pub const VARIANT_SIGNAL: u32 = 26;
pub const VARIANT_DICTIONARY: u32 = 27;
pub const VARIANT_ARRAY: u32 = 28;
pub const VARIANT_PACKED_BYTE_ARRAY: u32 = 29;
pub const VARIANT_PACKED_INT32_ARRAY: u32 = 30;
pub const VARIANT_PACKED_INT64_ARRAY: u32 = 31;
pub const VARIANT_PACKED_FLOAT32_ARRAY: u32 = 32;
pub const VARIANT_PACKED_FLOAT64_ARRAY: u32 = 33;
pub const VARIANT_PACKED_STRING_ARRAY: u32 = 34;
pub const VARIANT_PACKED_VECTOR2_ARRAY: u32 = 35;
pub const VARIANT_PACKED_VECTOR3_ARRAY: u32 = 36;
pub const VARIANT_PACKED_COLOR_ARRAY: u32 = 37;
pub const VARIANT_PACKED_VECTOR4_ARRAY: u32 = 38;
/// Number of variant tags. Any tag `>= VARIANT_MAX` is invalid on the wire.
pub const VARIANT_MAX: u32 = 39;

// ---------------------------------------------------------------------------
// PropertyHint (u32)
// ---------------------------------------------------------------------------

pub const PROPERTY_HINT_NONE: u32 = 0;
/// `"min,max[,step][,or_greater][,or_less][,suffix:unit]"`
pub const PROPERTY_HINT_RANGE: u32 = 1;
/// `"Name,Name:value,..."`
pub const PROPERTY_HINT_ENUM: u32 = 2;
pub const PROPERTY_HINT_ENUM_SUGGESTION: u32 = 3;
/// `"attenuation"` and/or `"positive_only"`.
pub const PROPERTY_HINT_EXP_EASING: u32 = 4;
pub const PROPERTY_HINT_LINK: u32 = 5;
/// `"Name:bit,Name:bit,..."`
pub const PROPERTY_HINT_FLAGS: u32 = 6;
pub const PROPERTY_HINT_LAYERS_2D_RENDER: u32 = 7;
pub const PROPERTY_HINT_LAYERS_2D_PHYSICS: u32 = 8;
pub const PROPERTY_HINT_LAYERS_2D_NAVIGATION: u32 = 9;
pub const PROPERTY_HINT_LAYERS_3D_RENDER: u32 = 10;
pub const PROPERTY_HINT_LAYERS_3D_PHYSICS: u32 = 11;
pub const PROPERTY_HINT_LAYERS_3D_NAVIGATION: u32 = 12;
/// Comma-separated filters: `"*.png,*.jpg"`.
pub const PROPERTY_HINT_FILE: u32 = 13;
pub const PROPERTY_HINT_DIR: u32 = 14;
pub const PROPERTY_HINT_GLOBAL_FILE: u32 = 15;
pub const PROPERTY_HINT_GLOBAL_DIR: u32 = 16;
/// Resource class name.
pub const PROPERTY_HINT_RESOURCE_TYPE: u32 = 17;
pub const PROPERTY_HINT_MULTILINE_TEXT: u32 = 18;
pub const PROPERTY_HINT_EXPRESSION: u32 = 19;
pub const PROPERTY_HINT_PLACEHOLDER_TEXT: u32 = 20;
pub const PROPERTY_HINT_COLOR_NO_ALPHA: u32 = 21;
pub const PROPERTY_HINT_OBJECT_ID: u32 = 22;
pub const PROPERTY_HINT_TYPE_STRING: u32 = 23;
pub const PROPERTY_HINT_NODE_PATH_TO_EDITED_NODE: u32 = 24;
pub const PROPERTY_HINT_OBJECT_TOO_BIG: u32 = 25;
pub const PROPERTY_HINT_NODE_PATH_VALID_TYPES: u32 = 26;
pub const PROPERTY_HINT_SAVE_FILE: u32 = 27;
pub const PROPERTY_HINT_GLOBAL_SAVE_FILE: u32 = 28;
pub const PROPERTY_HINT_INT_IS_OBJECTID: u32 = 29;
pub const PROPERTY_HINT_INT_IS_POINTER: u32 = 30;
pub const PROPERTY_HINT_ARRAY_TYPE: u32 = 31;
pub const PROPERTY_HINT_LOCALE_ID: u32 = 32;
pub const PROPERTY_HINT_LOCALIZABLE_STRING: u32 = 33;
/// Node class name restriction for object members.
pub const PROPERTY_HINT_NODE_TYPE: u32 = 34;
pub const PROPERTY_HINT_HIDE_QUATERNION_EDIT: u32 = 35;
pub const PROPERTY_HINT_PASSWORD: u32 = 36;
pub const PROPERTY_HINT_LAYERS_AVOIDANCE: u32 = 37;

// ---------------------------------------------------------------------------
// PropertyUsageFlags (u32)
// ---------------------------------------------------------------------------

pub const PROPERTY_USAGE_NONE: u32 = 0;
/// Serialized with the owning object.
pub const PROPERTY_USAGE_STORAGE: u32 = 1 << 1;
/// Shown in the inspector.
pub const PROPERTY_USAGE_EDITOR: u32 = 1 << 2;
pub const PROPERTY_USAGE_INTERNAL: u32 = 1 << 3;
pub const PROPERTY_USAGE_CHECKABLE: u32 = 1 << 4;
pub const PROPERTY_USAGE_CHECKED: u32 = 1 << 5;
/// Group marker: the name is the group title, the hint string its prefix.
pub const PROPERTY_USAGE_GROUP: u32 = 1 << 6;
pub const PROPERTY_USAGE_CATEGORY: u32 = 1 << 7;
/// Subgroup marker, nested in the active group.
pub const PROPERTY_USAGE_SUBGROUP: u32 = 1 << 8;
pub const PROPERTY_USAGE_CLASS_IS_BITFIELD: u32 = 1 << 9;
pub const PROPERTY_USAGE_NO_INSTANCE_STATE: u32 = 1 << 10;
pub const PROPERTY_USAGE_RESTART_IF_CHANGED: u32 = 1 << 11;
pub const PROPERTY_USAGE_SCRIPT_VARIABLE: u32 = 1 << 12;
pub const PROPERTY_USAGE_STORE_IF_NULL: u32 = 1 << 13;
pub const PROPERTY_USAGE_UPDATE_ALL_IF_MODIFIED: u32 = 1 << 14;
pub const PROPERTY_USAGE_CLASS_IS_ENUM: u32 = 1 << 16;
pub const PROPERTY_USAGE_NIL_IS_VARIANT: u32 = 1 << 17;
pub const PROPERTY_USAGE_ARRAY: u32 = 1 << 18;
pub const PROPERTY_USAGE_ALWAYS_DUPLICATE: u32 = 1 << 19;
pub const PROPERTY_USAGE_NEVER_DUPLICATE: u32 = 1 << 20;
pub const PROPERTY_USAGE_READ_ONLY: u32 = 1 << 27;
/// Storage + editor: the usage of an ordinary exported member.
pub const PROPERTY_USAGE_DEFAULT: u32 = PROPERTY_USAGE_STORAGE | PROPERTY_USAGE_EDITOR;

// ---------------------------------------------------------------------------
// MethodFlags (u32)
// ---------------------------------------------------------------------------

pub const METHOD_FLAG_NORMAL: u32 = 1;
pub const METHOD_FLAG_EDITOR: u32 = 1 << 1;
pub const METHOD_FLAG_CONST: u32 = 1 << 2;
pub const METHOD_FLAG_VIRTUAL: u32 = 1 << 3;
pub const METHOD_FLAG_VARARG: u32 = 1 << 4;
pub const METHOD_FLAG_STATIC: u32 = 1 << 5;
pub const METHOD_FLAG_VIRTUAL_REQUIRED: u32 = 1 << 7;
pub const METHOD_FLAGS_DEFAULT: u32 = METHOD_FLAG_NORMAL;

/// Engine-facing name of a variant tag, as it appears in the API descriptor.
pub fn variant_type_name(tag: u32) -> Option<&'static str> {
    const NAMES: [&str; VARIANT_MAX as usize] = [
        "Nil",
        "bool",
        "int",
        "float",
        "String",
        "Vector2",
        "Vector2i",
        "Rect2",
        "Rect2i",
        "Vector3",
        "Vector3i",
        "Transform2D",
        "Vector4",
        "Vector4i",
        "Plane",
        "Quaternion",
        "AABB",
        "Basis",
        "Transform3D",
        "Projection",
        "Color",
        "StringName",
        "NodePath",
        "RID",
        "Object",
        "Callable",
        "Signal",
        "Dictionary",
        "Array",
        "PackedByteArray",
        "PackedInt32Array",
        "PackedInt64Array",
        "PackedFloat32Array",
        "PackedFloat64Array",
        "PackedStringArray",
        "PackedVector2Array",
        "PackedVector3Array",
        "PackedColorArray",
        "PackedVector4Array",
    ];
    NAMES.get(tag as usize).copied()
}

/// Inverse of [`variant_type_name`].
pub fn variant_type_from_name(name: &str) -> Option<u32> {
    (0..VARIANT_MAX).find(|&tag| variant_type_name(tag) == Some(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_tag_has_a_name() {
        for tag in 0..VARIANT_MAX {
            assert!(variant_type_name(tag).is_some(), "tag {tag} unnamed");
        }
        assert_eq!(variant_type_name(VARIANT_MAX), None);
    }

    #[test]
    fn names_round_trip() {
        assert_eq!(variant_type_from_name("Vector3"), Some(VARIANT_VECTOR3));
        assert_eq!(variant_type_from_name("PackedVector4Array"), Some(VARIANT_PACKED_VECTOR4_ARRAY));
        assert_eq!(variant_type_from_name("Vector5"), None);
    }

    #[test]
    fn default_usage_is_storage_and_editor() {
        assert_eq!(PROPERTY_USAGE_DEFAULT, 6);
        assert_eq!(PROPERTY_USAGE_GROUP, 64);
        assert_eq!(PROPERTY_USAGE_SUBGROUP, 256);
    }
}
