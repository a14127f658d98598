// Variant codec: conversions between Rust values and `Variant`.
//
// Encoding is total. Decoding checks the tag first and then the value range:
// narrow integers and `f32` only decode when the value is exactly
// representable.

use crate::callable::{Callable, Signal};
use crate::error::{GroveError, GroveResult};
use crate::math::*;
use crate::variant::*;

/// Rust value → `Variant`.
pub trait ToVariant {
    fn to_variant(&self) -> Variant;
}

/// `Variant` → Rust value.
pub trait FromVariant: Sized {
    fn from_variant(variant: &Variant) -> GroveResult<Self>;
}

fn mismatch<T>(expected: VariantType, found: &Variant) -> GroveResult<T> {
    Err(GroveError::TypeMismatch {
        expected,
        found: found.get_type(),
    })
}

// ---------------------------------------------------------------------------
// Identity and references
// ---------------------------------------------------------------------------

impl ToVariant for Variant {
    fn to_variant(&self) -> Variant {
        self.clone()
    }
}

impl FromVariant for Variant {
    fn from_variant(variant: &Variant) -> GroveResult<Self> {
        Ok(variant.clone())
    }
}

impl<T: ToVariant + ?Sized> ToVariant for &T {
    fn to_variant(&self) -> Variant {
        (**self).to_variant()
    }
}

impl ToVariant for () {
    fn to_variant(&self) -> Variant {
        Variant::Nil
    }
}

impl FromVariant for () {
    fn from_variant(variant: &Variant) -> GroveResult<Self> {
        match variant {
            Variant::Nil => Ok(()),
            other => mismatch(VariantType::Nil, other),
        }
    }
}

// ---------------------------------------------------------------------------
// Scalars
// ---------------------------------------------------------------------------

impl ToVariant for bool {
    fn to_variant(&self) -> Variant {
        Variant::Bool(*self)
    }
}

impl FromVariant for bool {
    fn from_variant(variant: &Variant) -> GroveResult<Self> {
        match variant {
            Variant::Bool(b) => Ok(*b),
            other => mismatch(VariantType::Bool, other),
        }
    }
}

impl ToVariant for i64 {
    fn to_variant(&self) -> Variant {
        Variant::Int(*self)
    }
}

impl FromVariant for i64 {
    fn from_variant(variant: &Variant) -> GroveResult<Self> {
        match variant {
            Variant::Int(i) => Ok(*i),
            other => mismatch(VariantType::Int, other),
        }
    }
}

macro_rules! narrow_int_codec {
    ($($ty:ty),*) => {$(
        impl ToVariant for $ty {
            fn to_variant(&self) -> Variant {
                Variant::Int(*self as i64)
            }
        }

        impl FromVariant for $ty {
            fn from_variant(variant: &Variant) -> GroveResult<Self> {
                let wide = i64::from_variant(variant)?;
                <$ty>::try_from(wide).map_err(|_| GroveError::LossyConversion {
                    value: wide.to_string(),
                    target: stringify!($ty),
                })
            }
        }
    )*};
}

narrow_int_codec!(i8, i16, i32, u8, u16, u32);

// Engine ints are signed 64-bit; `u64` travels as its bit pattern so that
// bitfields and instance ids survive unchanged.
impl ToVariant for u64 {
    fn to_variant(&self) -> Variant {
        Variant::Int(*self as i64)
    }
}

impl FromVariant for u64 {
    fn from_variant(variant: &Variant) -> GroveResult<Self> {
        Ok(i64::from_variant(variant)? as u64)
    }
}

impl ToVariant for f64 {
    fn to_variant(&self) -> Variant {
        Variant::Float(*self)
    }
}

impl FromVariant for f64 {
    fn from_variant(variant: &Variant) -> GroveResult<Self> {
        match variant {
            Variant::Float(f) => Ok(*f),
            other => mismatch(VariantType::Float, other),
        }
    }
}

impl ToVariant for f32 {
    fn to_variant(&self) -> Variant {
        Variant::Float(*self as f64)
    }
}

impl FromVariant for f32 {
    fn from_variant(variant: &Variant) -> GroveResult<Self> {
        let wide = f64::from_variant(variant)?;
        let narrow = wide as f32;
        // NaN never compares equal but is representable.
        if narrow as f64 == wide || wide.is_nan() {
            Ok(narrow)
        } else {
            Err(GroveError::LossyConversion {
                value: wide.to_string(),
                target: "f32",
            })
        }
    }
}

// ---------------------------------------------------------------------------
// Strings
// ---------------------------------------------------------------------------

impl ToVariant for str {
    fn to_variant(&self) -> Variant {
        Variant::String(self.to_string())
    }
}

impl ToVariant for String {
    fn to_variant(&self) -> Variant {
        Variant::String(self.clone())
    }
}

impl FromVariant for String {
    fn from_variant(variant: &Variant) -> GroveResult<Self> {
        match variant {
            Variant::String(s) => Ok(s.clone()),
            other => mismatch(VariantType::String, other),
        }
    }
}

// ---------------------------------------------------------------------------
// One variant arm per type
// ---------------------------------------------------------------------------

macro_rules! arm_codec {
    ($($ty:ty => $arm:ident),* $(,)?) => {$(
        impl ToVariant for $ty {
            fn to_variant(&self) -> Variant {
                Variant::$arm(self.clone())
            }
        }

        impl FromVariant for $ty {
            fn from_variant(variant: &Variant) -> GroveResult<Self> {
                match variant {
                    Variant::$arm(value) => Ok(value.clone()),
                    other => mismatch(VariantType::$arm, other),
                }
            }
        }
    )*};
}

arm_codec! {
    Vector2 => Vector2,
    Vector2i => Vector2i,
    Rect2 => Rect2,
    Rect2i => Rect2i,
    Vector3 => Vector3,
    Vector3i => Vector3i,
    Transform2D => Transform2D,
    Vector4 => Vector4,
    Vector4i => Vector4i,
    Plane => Plane,
    Quaternion => Quaternion,
    Aabb => Aabb,
    Basis => Basis,
    Transform3D => Transform3D,
    Projection => Projection,
    Color => Color,
    StringName => StringName,
    NodePath => NodePath,
    Rid => Rid,
    Callable => Callable,
    Signal => Signal,
    Dictionary => Dictionary,
    VariantArray => Array,
    PackedByteArray => PackedByteArray,
    PackedInt32Array => PackedInt32Array,
    PackedInt64Array => PackedInt64Array,
    PackedFloat32Array => PackedFloat32Array,
    PackedFloat64Array => PackedFloat64Array,
    PackedStringArray => PackedStringArray,
    PackedVector2Array => PackedVector2Array,
    PackedVector3Array => PackedVector3Array,
    PackedColorArray => PackedColorArray,
    PackedVector4Array => PackedVector4Array,
}

impl ToVariant for OpaquePtr {
    fn to_variant(&self) -> Variant {
        Variant::Int(self.0 as i64)
    }
}

impl FromVariant for OpaquePtr {
    fn from_variant(variant: &Variant) -> GroveResult<Self> {
        Ok(OpaquePtr(i64::from_variant(variant)? as *mut std::ffi::c_void))
    }
}

// ---------------------------------------------------------------------------
// Option and sequences
// ---------------------------------------------------------------------------

impl<T: ToVariant> ToVariant for Option<T> {
    fn to_variant(&self) -> Variant {
        match self {
            Some(value) => value.to_variant(),
            None => Variant::Nil,
        }
    }
}

impl<T: FromVariant> FromVariant for Option<T> {
    fn from_variant(variant: &Variant) -> GroveResult<Self> {
        match variant {
            Variant::Nil => Ok(None),
            other => T::from_variant(other).map(Some),
        }
    }
}

impl<T: ToVariant> ToVariant for [T] {
    fn to_variant(&self) -> Variant {
        Variant::Array(self.iter().map(ToVariant::to_variant).collect())
    }
}

impl<T: ToVariant> ToVariant for Vec<T> {
    fn to_variant(&self) -> Variant {
        self.as_slice().to_variant()
    }
}

/// Typed array: every element must decode. Nil elements only pass when the
/// element type is an `Option`.
impl<T: FromVariant> FromVariant for Vec<T> {
    fn from_variant(variant: &Variant) -> GroveResult<Self> {
        match variant {
            Variant::Array(items) => items.iter().map(T::from_variant).collect(),
            other => mismatch(VariantType::Array, other),
        }
    }
}

// ---------------------------------------------------------------------------
// Engine enums and bitfields
// ---------------------------------------------------------------------------

/// Implemented by generated engine enums and `#[derive(ExportEnum)]` types.
pub trait EngineEnum: Copy + 'static {
    /// Qualified engine name, e.g. `"Node.ProcessMode"`.
    const ENGINE_NAME: &'static str;

    fn ord(self) -> i64;
    fn try_from_ord(ord: i64) -> Option<Self>;

    /// Every `(name, value)` pair, aliases included, in declaration order.
    fn cases() -> &'static [(&'static str, i64)];
}

/// Implemented by generated bitfield newtypes.
pub trait EngineBitfield: Copy + 'static {
    const ENGINE_NAME: &'static str;

    fn bits(self) -> u64;
    fn from_bits(bits: u64) -> Self;
    fn flags() -> &'static [(&'static str, i64)];
}

pub fn decode_enum<T: EngineEnum>(variant: &Variant) -> GroveResult<T> {
    let ord = i64::from_variant(variant)?;
    T::try_from_ord(ord).ok_or(GroveError::InvalidEnumValue {
        ty: T::ENGINE_NAME,
        value: ord,
    })
}

pub fn decode_bitfield<T: EngineBitfield>(variant: &Variant) -> GroveResult<T> {
    Ok(T::from_bits(u64::from_variant(variant)?))
}

/// Codec and export impls for a type implementing [`EngineEnum`].
#[macro_export]
macro_rules! engine_enum_codec {
    ($ty:ty) => {
        impl $crate::ToVariant for $ty {
            fn to_variant(&self) -> $crate::Variant {
                $crate::Variant::Int(<$ty as $crate::EngineEnum>::ord(*self))
            }
        }

        impl $crate::FromVariant for $ty {
            fn from_variant(variant: &$crate::Variant) -> $crate::GroveResult<Self> {
                $crate::codec::decode_enum::<$ty>(variant)
            }
        }

        impl $crate::ExportType for $ty {
            fn export_info() -> $crate::ExportTypeInfo {
                $crate::ExportTypeInfo::enumeration::<$ty>()
            }
        }
    };
}

/// Codec and export impls for a type implementing [`EngineBitfield`].
#[macro_export]
macro_rules! engine_bitfield_codec {
    ($ty:ty) => {
        impl $crate::ToVariant for $ty {
            fn to_variant(&self) -> $crate::Variant {
                $crate::Variant::Int(<$ty as $crate::EngineBitfield>::bits(*self) as i64)
            }
        }

        impl $crate::FromVariant for $ty {
            fn from_variant(variant: &$crate::Variant) -> $crate::GroveResult<Self> {
                $crate::codec::decode_bitfield::<$ty>(variant)
            }
        }

        impl $crate::ExportType for $ty {
            fn export_info() -> $crate::ExportTypeInfo {
                $crate::ExportTypeInfo::bitfield::<$ty>()
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip<T: ToVariant + FromVariant + PartialEq + std::fmt::Debug>(value: T) {
        let encoded = value.to_variant();
        let decoded = T::from_variant(&encoded).unwrap();
        assert_eq!(decoded, value);
        assert_eq!(decoded.to_variant(), encoded);
    }

    #[test]
    fn builtins_round_trip() {
        round_trip(true);
        round_trip(-7i64);
        round_trip(1.5f64);
        round_trip(String::from("grove"));
        round_trip(Vector3::new(1.0, 2.0, 3.0));
        round_trip(Vector2i::new(-1, 2));
        round_trip(Transform3D::from_translation(Vector3::X));
        round_trip(Color::new(0.5, 0.25, 1.0, 1.0));
        round_trip(StringName::from("idle"));
        round_trip(Rid(42));
        round_trip(PackedVector3Array::from(vec![Vector3::ZERO, Vector3::ONE]));
        round_trip(PackedStringArray::from(vec!["a".to_string()]));
    }

    #[test]
    fn tag_mismatch_is_an_error() {
        let err = Vector3::from_variant(&Variant::Int(1)).unwrap_err();
        assert!(matches!(
            err,
            GroveError::TypeMismatch {
                expected: VariantType::Vector3,
                found: VariantType::Int
            }
        ));
    }

    #[test]
    fn narrow_ints_reject_out_of_range_values() {
        assert_eq!(i32::from_variant(&Variant::Int(-5)).unwrap(), -5);
        assert!(matches!(
            u8::from_variant(&Variant::Int(300)),
            Err(GroveError::LossyConversion { target: "u8", .. })
        ));
        assert!(matches!(
            u32::from_variant(&Variant::Int(-1)),
            Err(GroveError::LossyConversion { .. })
        ));
    }

    #[test]
    fn f32_requires_exact_representation() {
        assert_eq!(f32::from_variant(&Variant::Float(0.5)).unwrap(), 0.5);
        assert!(f32::from_variant(&Variant::Float(f64::NAN)).unwrap().is_nan());
        assert!(matches!(
            f32::from_variant(&Variant::Float(0.1)),
            Err(GroveError::LossyConversion { target: "f32", .. })
        ));
    }

    #[test]
    fn options_accept_nil() {
        assert_eq!(Option::<i64>::from_variant(&Variant::Nil).unwrap(), None);
        assert_eq!(Option::<i64>::from_variant(&Variant::Int(3)).unwrap(), Some(3));
        assert_eq!(None::<i64>.to_variant(), Variant::Nil);
    }

    #[test]
    fn typed_arrays_decode_each_element() {
        let arr = vec![1i64, 2, 3].to_variant();
        assert_eq!(Vec::<i64>::from_variant(&arr).unwrap(), vec![1, 2, 3]);

        let with_nil = Variant::Array(VariantArray::from(vec![Variant::Int(1), Variant::Nil]));
        assert!(Vec::<i64>::from_variant(&with_nil).is_err());
        assert_eq!(
            Vec::<Option<i64>>::from_variant(&with_nil).unwrap(),
            vec![Some(1), None]
        );
    }

    #[test]
    fn u64_keeps_its_bit_pattern() {
        let v = u64::MAX.to_variant();
        assert_eq!(v, Variant::Int(-1));
        assert_eq!(u64::from_variant(&v).unwrap(), u64::MAX);
    }

    #[test]
    fn strings_from_str() {
        assert_eq!("abc".to_variant(), Variant::String("abc".into()));
        let s: &str = "x";
        assert_eq!(ToVariant::to_variant(&s), Variant::String("x".into()));
    }
}
