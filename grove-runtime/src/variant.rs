// Variant: the engine's dynamically-typed value, plus the heap-backed
// builtin types it can hold.

use std::fmt;

use grove_ffi as ffi;

use crate::callable::{Callable, Signal};
use crate::error::{GroveError, GroveResult};
use crate::math::*;
use crate::object::ObjectRef;

// ---------------------------------------------------------------------------
// VariantType
// ---------------------------------------------------------------------------

/// Variant tag. Discriminants are the ABI values from `grove_flags`.
#[repr(u32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum VariantType {
    Nil = ffi::VARIANT_NIL,
    Bool = ffi::VARIANT_BOOL,
    Int = ffi::VARIANT_INT,
    Float = ffi::VARIANT_FLOAT,
    String = ffi::VARIANT_STRING,
    Vector2 = ffi::VARIANT_VECTOR2,
    Vector2i = ffi::VARIANT_VECTOR2I,
    Rect2 = ffi::VARIANT_RECT2,
    Rect2i = ffi::VARIANT_RECT2I,
    Vector3 = ffi::VARIANT_VECTOR3,
    Vector3i = ffi::VARIANT_VECTOR3I,
    Transform2D = ffi::VARIANT_TRANSFORM2D,
    Vector4 = ffi::VARIANT_VECTOR4,
    Vector4i = ffi::VARIANT_VECTOR4I,
    Plane = ffi::VARIANT_PLANE,
    Quaternion = ffi::VARIANT_QUATERNION,
    Aabb = ffi::VARIANT_AABB,
    Basis = ffi::VARIANT_BASIS,
    Transform3D = ffi::VARIANT_TRANSFORM3D,
    Projection = ffi::VARIANT_PROJECTION,
    Color = ffi::VARIANT_COLOR,
    StringName = ffi::VARIANT_STRING_NAME,
    NodePath = ffi::VARIANT_NODE_PATH,
    Rid = ffi::VARIANT_RID,
    Object = ffi::VARIANT_OBJECT,
    Callable = ffi::VARIANT_CALLABLE,
    Signal = ffi::VARIANT_SIGNAL,
    Dictionary = ffi::VARIANT_DICTIONARY,
    Array = ffi::VARIANT_ARRAY,
    PackedByteArray = ffi::VARIANT_PACKED_BYTE_ARRAY,
    PackedInt32Array = ffi::VARIANT_PACKED_INT32_ARRAY,
    PackedInt64Array = ffi::VARIANT_PACKED_INT64_ARRAY,
    PackedFloat32Array = ffi::VARIANT_PACKED_FLOAT32_ARRAY,
    PackedFloat64Array = ffi::VARIANT_PACKED_FLOAT64_ARRAY,
    PackedStringArray = ffi::VARIANT_PACKED_STRING_ARRAY,
    PackedVector2Array = ffi::VARIANT_PACKED_VECTOR2_ARRAY,
    PackedVector3Array = ffi::VARIANT_PACKED_VECTOR3_ARRAY,
    PackedColorArray = ffi::VARIANT_PACKED_COLOR_ARRAY,
    PackedVector4Array = ffi::VARIANT_PACKED_VECTOR4_ARRAY,
}

impl VariantType {
    pub const ALL: [VariantType; ffi::VARIANT_MAX as usize] = [
        VariantType::Nil,
        VariantType::Bool,
        VariantType::Int,
        VariantType::Float,
        VariantType::String,
        VariantType::Vector2,
        VariantType::Vector2i,
        VariantType::Rect2,
        VariantType::Rect2i,
        VariantType::Vector3,
        VariantType::Vector3i,
        VariantType::Transform2D,
        VariantType::Vector4,
        VariantType::Vector4i,
        VariantType::Plane,
        VariantType::Quaternion,
        VariantType::Aabb,
        VariantType::Basis,
        VariantType::Transform3D,
        VariantType::Projection,
        VariantType::Color,
        VariantType::StringName,
        VariantType::NodePath,
        VariantType::Rid,
        VariantType::Object,
        VariantType::Callable,
        VariantType::Signal,
        VariantType::Dictionary,
        VariantType::Array,
        VariantType::PackedByteArray,
        VariantType::PackedInt32Array,
        VariantType::PackedInt64Array,
        VariantType::PackedFloat32Array,
        VariantType::PackedFloat64Array,
        VariantType::PackedStringArray,
        VariantType::PackedVector2Array,
        VariantType::PackedVector3Array,
        VariantType::PackedColorArray,
        VariantType::PackedVector4Array,
    ];

    pub fn tag(self) -> u32 {
        self as u32
    }

    pub fn from_tag(tag: u32) -> Option<Self> {
        Self::ALL.get(tag as usize).copied()
    }

    /// Engine-facing name, as spelled in the API descriptor.
    pub fn name(self) -> &'static str {
        ffi::variant_type_name(self.tag()).unwrap_or("?")
    }

    pub fn is_numeric(self) -> bool {
        matches!(self, VariantType::Int | VariantType::Float)
    }
}

impl fmt::Display for VariantType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Strings
// ---------------------------------------------------------------------------

/// Interned engine string. Held host-side as an owned `String`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StringName(String);

impl StringName {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for StringName {
    fn from(s: &str) -> Self {
        StringName(s.to_string())
    }
}

impl From<String> for StringName {
    fn from(s: String) -> Self {
        StringName(s)
    }
}

impl fmt::Display for StringName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Scene-tree path such as `"../Player/Camera"`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct NodePath(String);

impl NodePath {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn is_absolute(&self) -> bool {
        self.0.starts_with('/')
    }
}

impl From<&str> for NodePath {
    fn from(s: &str) -> Self {
        NodePath(s.to_string())
    }
}

impl From<String> for NodePath {
    fn from(s: String) -> Self {
        NodePath(s)
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Containers
// ---------------------------------------------------------------------------

/// Untyped engine array.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VariantArray(Vec<Variant>);

impl VariantArray {
    pub fn new() -> Self {
        VariantArray(Vec::new())
    }

    pub fn push(&mut self, value: Variant) {
        self.0.push(value);
    }

    pub fn get(&self, index: usize) -> Option<&Variant> {
        self.0.get(index)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Variant> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[Variant] {
        &self.0
    }
}

impl From<Vec<Variant>> for VariantArray {
    fn from(items: Vec<Variant>) -> Self {
        VariantArray(items)
    }
}

impl FromIterator<Variant> for VariantArray {
    fn from_iter<I: IntoIterator<Item = Variant>>(iter: I) -> Self {
        VariantArray(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a VariantArray {
    type Item = &'a Variant;
    type IntoIter = std::slice::Iter<'a, Variant>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Insertion-ordered engine dictionary. Keys compare by value; lookups are
/// linear, which matches the small dictionaries that cross the boundary.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Dictionary(Vec<(Variant, Variant)>);

impl Dictionary {
    pub fn new() -> Self {
        Dictionary(Vec::new())
    }

    /// Insert or replace. Returns the previous value.
    pub fn insert(&mut self, key: Variant, value: Variant) -> Option<Variant> {
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.0.push((key, value));
                None
            }
        }
    }

    pub fn get(&self, key: &Variant) -> Option<&Variant> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn remove(&mut self, key: &Variant) -> Option<Variant> {
        let pos = self.0.iter().position(|(k, _)| k == key)?;
        Some(self.0.remove(pos).1)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Variant, &Variant)> {
        self.0.iter().map(|(k, v)| (k, v))
    }
}

impl FromIterator<(Variant, Variant)> for Dictionary {
    fn from_iter<I: IntoIterator<Item = (Variant, Variant)>>(iter: I) -> Self {
        let mut dict = Dictionary::new();
        for (k, v) in iter {
            dict.insert(k, v);
        }
        dict
    }
}

/// Contiguous engine array of one element type.
#[derive(Clone, Debug, PartialEq)]
pub struct PackedArray<T>(pub Vec<T>);

impl<T> PackedArray<T> {
    pub fn new() -> Self {
        PackedArray(Vec::new())
    }

    pub fn as_slice(&self) -> &[T] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<T> Default for PackedArray<T> {
    fn default() -> Self {
        PackedArray(Vec::new())
    }
}

impl<T> From<Vec<T>> for PackedArray<T> {
    fn from(items: Vec<T>) -> Self {
        PackedArray(items)
    }
}

impl<T> FromIterator<T> for PackedArray<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        PackedArray(iter.into_iter().collect())
    }
}

pub type PackedByteArray = PackedArray<u8>;
pub type PackedInt32Array = PackedArray<i32>;
pub type PackedInt64Array = PackedArray<i64>;
pub type PackedFloat32Array = PackedArray<f32>;
pub type PackedFloat64Array = PackedArray<f64>;
pub type PackedStringArray = PackedArray<String>;
pub type PackedVector2Array = PackedArray<Vector2>;
pub type PackedVector3Array = PackedArray<Vector3>;
pub type PackedColorArray = PackedArray<Color>;
pub type PackedVector4Array = PackedArray<Vector4>;

/// Raw pointer argument (`const void*`, `AudioFrame*`). Passed through
/// untouched as an integer variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OpaquePtr(pub *mut std::ffi::c_void);

impl OpaquePtr {
    pub const NULL: OpaquePtr = OpaquePtr(std::ptr::null_mut());

    pub fn is_null(self) -> bool {
        self.0.is_null()
    }
}

impl Default for OpaquePtr {
    fn default() -> Self {
        Self::NULL
    }
}

// Pointer arguments are only meaningful on the engine thread; the wrapper
// itself carries no ownership.
unsafe impl Send for OpaquePtr {}
unsafe impl Sync for OpaquePtr {}

// ---------------------------------------------------------------------------
// Variant
// ---------------------------------------------------------------------------

/// Tagged union over every engine value type. A null object decodes to
/// `Nil`, so `Object` always holds a live-at-decode-time reference.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Variant {
    #[default]
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Vector2(Vector2),
    Vector2i(Vector2i),
    Rect2(Rect2),
    Rect2i(Rect2i),
    Vector3(Vector3),
    Vector3i(Vector3i),
    Transform2D(Transform2D),
    Vector4(Vector4),
    Vector4i(Vector4i),
    Plane(Plane),
    Quaternion(Quaternion),
    Aabb(Aabb),
    Basis(Basis),
    Transform3D(Transform3D),
    Projection(Projection),
    Color(Color),
    StringName(StringName),
    NodePath(NodePath),
    Rid(Rid),
    Object(ObjectRef),
    Callable(Callable),
    Signal(Signal),
    Dictionary(Dictionary),
    Array(VariantArray),
    PackedByteArray(PackedByteArray),
    PackedInt32Array(PackedInt32Array),
    PackedInt64Array(PackedInt64Array),
    PackedFloat32Array(PackedFloat32Array),
    PackedFloat64Array(PackedFloat64Array),
    PackedStringArray(PackedStringArray),
    PackedVector2Array(PackedVector2Array),
    PackedVector3Array(PackedVector3Array),
    PackedColorArray(PackedColorArray),
    PackedVector4Array(PackedVector4Array),
}

impl Variant {
    pub fn get_type(&self) -> VariantType {
        match self {
            Variant::Nil => VariantType::Nil,
            Variant::Bool(_) => VariantType::Bool,
            Variant::Int(_) => VariantType::Int,
            Variant::Float(_) => VariantType::Float,
            Variant::String(_) => VariantType::String,
            Variant::Vector2(_) => VariantType::Vector2,
            Variant::Vector2i(_) => VariantType::Vector2i,
            Variant::Rect2(_) => VariantType::Rect2,
            Variant::Rect2i(_) => VariantType::Rect2i,
            Variant::Vector3(_) => VariantType::Vector3,
            Variant::Vector3i(_) => VariantType::Vector3i,
            Variant::Transform2D(_) => VariantType::Transform2D,
            Variant::Vector4(_) => VariantType::Vector4,
            Variant::Vector4i(_) => VariantType::Vector4i,
            Variant::Plane(_) => VariantType::Plane,
            Variant::Quaternion(_) => VariantType::Quaternion,
            Variant::Aabb(_) => VariantType::Aabb,
            Variant::Basis(_) => VariantType::Basis,
            Variant::Transform3D(_) => VariantType::Transform3D,
            Variant::Projection(_) => VariantType::Projection,
            Variant::Color(_) => VariantType::Color,
            Variant::StringName(_) => VariantType::StringName,
            Variant::NodePath(_) => VariantType::NodePath,
            Variant::Rid(_) => VariantType::Rid,
            Variant::Object(_) => VariantType::Object,
            Variant::Callable(_) => VariantType::Callable,
            Variant::Signal(_) => VariantType::Signal,
            Variant::Dictionary(_) => VariantType::Dictionary,
            Variant::Array(_) => VariantType::Array,
            Variant::PackedByteArray(_) => VariantType::PackedByteArray,
            Variant::PackedInt32Array(_) => VariantType::PackedInt32Array,
            Variant::PackedInt64Array(_) => VariantType::PackedInt64Array,
            Variant::PackedFloat32Array(_) => VariantType::PackedFloat32Array,
            Variant::PackedFloat64Array(_) => VariantType::PackedFloat64Array,
            Variant::PackedStringArray(_) => VariantType::PackedStringArray,
            Variant::PackedVector2Array(_) => VariantType::PackedVector2Array,
            Variant::PackedVector3Array(_) => VariantType::PackedVector3Array,
            Variant::PackedColorArray(_) => VariantType::PackedColorArray,
            Variant::PackedVector4Array(_) => VariantType::PackedVector4Array,
        }
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Variant::Nil)
    }

    /// Tag check before a payload is read.
    pub fn decode_as(&self, expected: VariantType) -> GroveResult<&Self> {
        let found = self.get_type();
        if found == expected {
            Ok(self)
        } else {
            Err(GroveError::TypeMismatch { expected, found })
        }
    }

    /// `StaleReference` if this value reaches a freed object, directly or
    /// through a container, signal or method callable.
    pub fn ensure_live(&self) -> GroveResult<()> {
        match self {
            Variant::Object(obj) => obj.checked_handle().map(|_| ()),
            Variant::Signal(signal) => match &signal.object {
                Some(obj) => obj.checked_handle().map(|_| ()),
                None => Ok(()),
            },
            Variant::Callable(Callable::Method { object, .. }) => object.checked_handle().map(|_| ()),
            Variant::Array(items) => items.iter().try_for_each(Variant::ensure_live),
            Variant::Dictionary(dict) => dict.iter().try_for_each(|(k, v)| {
                k.ensure_live()?;
                v.ensure_live()
            }),
            _ => Ok(()),
        }
    }

    /// Object payload, if any. A freed object still yields its reference;
    /// use it to get a `StaleReference` error with the id.
    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Variant::Object(obj) => Some(obj),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_match_the_abi() {
        for (tag, ty) in VariantType::ALL.iter().enumerate() {
            assert_eq!(ty.tag(), tag as u32);
            assert_eq!(VariantType::from_tag(tag as u32), Some(*ty));
        }
        assert_eq!(VariantType::from_tag(ffi::VARIANT_MAX), None);
        assert_eq!(VariantType::Aabb.name(), "AABB");
    }

    #[test]
    fn decode_as_reports_both_tags() {
        let v = Variant::Int(3);
        assert!(v.decode_as(VariantType::Int).is_ok());
        match v.decode_as(VariantType::String) {
            Err(GroveError::TypeMismatch { expected, found }) => {
                assert_eq!(expected, VariantType::String);
                assert_eq!(found, VariantType::Int);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn dictionary_keeps_insertion_order_and_replaces() {
        let mut dict = Dictionary::new();
        dict.insert(Variant::String("b".into()), Variant::Int(1));
        dict.insert(Variant::String("a".into()), Variant::Int(2));
        assert_eq!(dict.insert(Variant::String("b".into()), Variant::Int(3)), Some(Variant::Int(1)));
        let keys: Vec<_> = dict.iter().map(|(k, _)| k.clone()).collect();
        assert_eq!(keys, vec![Variant::String("b".into()), Variant::String("a".into())]);
        assert_eq!(dict.get(&Variant::String("b".into())), Some(&Variant::Int(3)));
        assert_eq!(dict.remove(&Variant::String("a".into())), Some(Variant::Int(2)));
        assert_eq!(dict.len(), 1);
    }

    #[test]
    fn node_paths() {
        assert!(NodePath::from("/root/Main").is_absolute());
        assert!(!NodePath::from("Camera").is_absolute());
        assert_eq!(StringName::from("idle").to_string(), "idle");
    }
}
