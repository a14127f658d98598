// Wire layout of a Variant crossing the ABI.
//
// Ownership convention:
//   * Arguments passed host → engine are borrowed for the duration of the call.
//     Heap payloads (`slice`, `string`) point into host memory.
//   * Values returned engine → host are engine-owned. The host copies what it
//     needs and then hands the variant back through `GroveVariantApi::destroy`.
//     `destroy` releases container storage and nested object references, but
//     never the top-level object of an ownership-transferring return.
//   * Values the host returns to the engine are written with
//     `GroveVariantApi::new_copy`, so the engine always owns its copy.
//   * Custom callable userdata is borrowed like any other payload. Every copy
//     the engine keeps takes a count with `ref_custom_callable` and gives it
//     back with `free_custom_callable`.

use std::ffi::c_void;

use crate::handles::{ObjectHandle, RawStr};

/// Borrowed contiguous buffer. `len` counts elements, not bytes.
///
/// Element layout per tag:
///   Array               → `RawVariant`
///   Dictionary          → `RawVariant` key/value pairs (`2 * len` entries)
///   PackedByteArray     → `u8`
///   PackedInt32Array    → `i32`
///   PackedInt64Array    → `i64`
///   PackedFloat32Array  → `f32`
///   PackedFloat64Array  → `f64`
///   PackedStringArray   → `RawStr`
///   PackedVector2Array  → `[f32; 2]`
///   PackedVector3Array  → `[f32; 3]`
///   PackedColorArray    → `[f32; 4]`
///   PackedVector4Array  → `[f32; 4]`
#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct RawSlice {
    pub ptr: *const c_void,
    pub len: u64,
}

impl RawSlice {
    pub const EMPTY: RawSlice = RawSlice {
        ptr: std::ptr::null(),
        len: 0,
    };

    pub fn from_slice<T>(items: &[T]) -> Self {
        RawSlice {
            ptr: items.as_ptr() as *const c_void,
            len: items.len() as u64,
        }
    }

    /// # Safety
    /// `ptr` must point at `len` initialised `T`s for the returned lifetime.
    pub unsafe fn as_slice<'a, T>(&self) -> &'a [T] {
        if self.ptr.is_null() || self.len == 0 {
            return &[];
        }
        unsafe { std::slice::from_raw_parts(self.ptr as *const T, self.len as usize) }
    }
}

/// Callable kinds.
pub const CALLABLE_KIND_NULL: u32 = 0;
/// Bound engine method: `object` + `method`.
pub const CALLABLE_KIND_METHOD: u32 = 1;
/// Host closure: `custom` is host userdata, invoked through
/// `GroveHostCallbacks::call_custom_callable`.
pub const CALLABLE_KIND_CUSTOM: u32 = 2;

#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct RawCallable {
    pub kind: u32,
    pub object: ObjectHandle,
    pub method: RawStr,
    pub custom: *mut c_void,
}

#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct RawSignal {
    pub object: ObjectHandle,
    pub name: RawStr,
}

/// Payload union. Which member is active is decided by `RawVariant::tag`.
///
/// Value types are packed into `reals` / `ints` in declaration order:
/// Vector2 (2), Rect2 (position, size = 4), Vector3 (3), Transform2D
/// (x, y, origin = 6), Vector4 (4), Plane (normal, d = 4), Quaternion (4),
/// AABB (position, size = 6), Basis (3 rows = 9), Transform3D (basis rows,
/// origin = 12), Projection (4 columns = 16), Color (r, g, b, a).
#[repr(C)]
#[derive(Clone, Copy)]
pub union RawVariantData {
    /// 0 is false, anything else true.
    pub boolean: u8,
    pub int: i64,
    pub float: f64,
    pub reals: [f32; 16],
    pub ints: [i32; 4],
    pub rid: u64,
    pub string: RawStr,
    pub slice: RawSlice,
    pub object: ObjectHandle,
    pub callable: RawCallable,
    pub signal: RawSignal,
}

#[repr(C)]
#[derive(Clone, Copy)]
pub struct RawVariant {
    pub tag: u32,
    pub data: RawVariantData,
}

impl RawVariant {
    pub const NIL: RawVariant = RawVariant {
        tag: crate::VARIANT_NIL,
        data: RawVariantData { int: 0 },
    };
}

impl Default for RawVariant {
    fn default() -> Self {
        Self::NIL
    }
}

impl std::fmt::Debug for RawVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RawVariant").field("tag", &self.tag).finish_non_exhaustive()
    }
}

unsafe impl Send for RawSlice {}
unsafe impl Sync for RawSlice {}
