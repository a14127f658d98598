// Variant <-> RawVariant marshalling.
//
// Encoding borrows: strings and plain packed arrays point straight into the
// encoded `Variant`, everything that needs a different layout is staged in a
// `RawArena` that must outlive the engine call. Custom callables are borrowed
// the same way; the engine takes its own strong count through
// `ref_custom_callable` for every copy it keeps. Decoding copies everything
// out of the engine-owned value, so the engine may release it right after.

use std::ffi::c_void;
use std::marker::PhantomData;
use std::sync::Arc;

use glam::{IVec2, IVec3, IVec4, Mat4, Quat, Vec2, Vec3, Vec4};
use grove_ffi::{
    GroveErrorCode, ObjectHandle, RawCallable, RawSignal, RawSlice, RawStr, RawVariant, RawVariantData,
    CALLABLE_KIND_CUSTOM, CALLABLE_KIND_METHOD, CALLABLE_KIND_NULL,
};

use crate::callable::{Callable, CustomCallable, Signal};
use crate::error::{GroveError, GroveResult};
use crate::math::*;
use crate::object::{ObjectResolver, Transfer};
use crate::variant::*;

/// Side buffers for one batch of encoded variants.
#[derive(Default)]
pub struct RawArena<'a> {
    variants: Vec<Vec<RawVariant>>,
    strs: Vec<Vec<RawStr>>,
    reals: Vec<Vec<f32>>,
    _borrow: PhantomData<&'a Variant>,
}

impl<'a> RawArena<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn encode_all(&mut self, values: &'a [Variant]) -> GroveResult<Vec<RawVariant>> {
        values.iter().map(|v| self.encode(v)).collect()
    }

    /// Borrowed wire form of `value`, valid while `value` and `self` live.
    ///
    /// Fails with `StaleReference` if `value` reaches a freed object.
    pub fn encode(&mut self, value: &'a Variant) -> GroveResult<RawVariant> {
        let tag = value.get_type().tag();
        let data = match value {
            Variant::Nil => RawVariantData { int: 0 },
            Variant::Bool(b) => RawVariantData { boolean: u8::from(*b) },
            Variant::Int(i) => RawVariantData { int: *i },
            Variant::Float(f) => RawVariantData { float: *f },
            Variant::String(s) => RawVariantData {
                string: RawStr::from_str(s),
            },
            Variant::StringName(s) => RawVariantData {
                string: RawStr::from_str(s.as_str()),
            },
            Variant::NodePath(p) => RawVariantData {
                string: RawStr::from_str(p.as_str()),
            },
            Variant::Vector2(v) => reals(&v.to_array()),
            Variant::Vector2i(v) => ints(&v.to_array()),
            Variant::Rect2(r) => reals(&[r.position.x, r.position.y, r.size.x, r.size.y]),
            Variant::Rect2i(r) => ints(&[r.position.x, r.position.y, r.size.x, r.size.y]),
            Variant::Vector3(v) => reals(&v.to_array()),
            Variant::Vector3i(v) => ints(&v.to_array()),
            Variant::Transform2D(t) => reals(&[t.x.x, t.x.y, t.y.x, t.y.y, t.origin.x, t.origin.y]),
            Variant::Vector4(v) => reals(&v.to_array()),
            Variant::Vector4i(v) => ints(&v.to_array()),
            Variant::Plane(p) => reals(&[p.normal.x, p.normal.y, p.normal.z, p.d]),
            Variant::Quaternion(q) => reals(&q.to_array()),
            Variant::Aabb(b) => reals(&[
                b.position.x,
                b.position.y,
                b.position.z,
                b.size.x,
                b.size.y,
                b.size.z,
            ]),
            Variant::Basis(b) => reals(&basis_to_rows(b)),
            Variant::Transform3D(t) => {
                let mut packed = [0.0; 12];
                packed[..9].copy_from_slice(&basis_to_rows(&t.basis));
                packed[9..].copy_from_slice(&t.origin.to_array());
                reals(&packed)
            }
            Variant::Projection(p) => reals(&p.to_cols_array()),
            Variant::Color(c) => reals(&c.to_array()),
            Variant::Rid(rid) => RawVariantData { rid: rid.0 },
            Variant::Object(obj) => RawVariantData {
                object: obj.checked_handle()?,
            },
            Variant::Callable(c) => RawVariantData {
                callable: encode_callable(c)?,
            },
            Variant::Signal(s) => RawVariantData {
                signal: RawSignal {
                    object: match &s.object {
                        Some(obj) => obj.checked_handle()?,
                        None => ObjectHandle::NULL,
                    },
                    name: RawStr::from_str(s.name.as_str()),
                },
            },
            Variant::Array(items) => {
                let raw = items.iter().map(|v| self.encode(v)).collect::<GroveResult<Vec<_>>>()?;
                self.stage_variants(raw, items.len())
            }
            Variant::Dictionary(dict) => {
                let mut raw = Vec::with_capacity(dict.len() * 2);
                for (k, v) in dict.iter() {
                    raw.push(self.encode(k)?);
                    raw.push(self.encode(v)?);
                }
                self.stage_variants(raw, dict.len())
            }
            Variant::PackedByteArray(a) => slice(RawSlice::from_slice(a.as_slice())),
            Variant::PackedInt32Array(a) => slice(RawSlice::from_slice(a.as_slice())),
            Variant::PackedInt64Array(a) => slice(RawSlice::from_slice(a.as_slice())),
            Variant::PackedFloat32Array(a) => slice(RawSlice::from_slice(a.as_slice())),
            Variant::PackedFloat64Array(a) => slice(RawSlice::from_slice(a.as_slice())),
            Variant::PackedStringArray(a) => {
                let strs: Vec<RawStr> = a.as_slice().iter().map(|s| RawStr::from_str(s)).collect();
                let raw = RawSlice::from_slice(&strs);
                self.strs.push(strs);
                slice(raw)
            }
            Variant::PackedVector2Array(a) => self.stage_reals(a.as_slice().iter().flat_map(|v| v.to_array()), a.len()),
            Variant::PackedVector3Array(a) => self.stage_reals(a.as_slice().iter().flat_map(|v| v.to_array()), a.len()),
            Variant::PackedColorArray(a) => self.stage_reals(a.as_slice().iter().flat_map(|c| c.to_array()), a.len()),
            Variant::PackedVector4Array(a) => self.stage_reals(a.as_slice().iter().flat_map(|v| v.to_array()), a.len()),
        };
        Ok(RawVariant { tag, data })
    }

    fn stage_variants(&mut self, raw: Vec<RawVariant>, len: usize) -> RawVariantData {
        let ptr = raw.as_ptr() as *const c_void;
        self.variants.push(raw);
        slice(RawSlice { ptr, len: len as u64 })
    }

    fn stage_reals(&mut self, flat: impl Iterator<Item = f32>, len: usize) -> RawVariantData {
        let flat: Vec<f32> = flat.collect();
        let ptr = flat.as_ptr() as *const c_void;
        self.reals.push(flat);
        slice(RawSlice { ptr, len: len as u64 })
    }
}

fn reals(values: &[f32]) -> RawVariantData {
    let mut packed = [0.0f32; 16];
    packed[..values.len()].copy_from_slice(values);
    RawVariantData { reals: packed }
}

fn ints(values: &[i32]) -> RawVariantData {
    let mut packed = [0i32; 4];
    packed[..values.len()].copy_from_slice(values);
    RawVariantData { ints: packed }
}

fn slice(slice: RawSlice) -> RawVariantData {
    RawVariantData { slice }
}

fn encode_callable(callable: &Callable) -> GroveResult<RawCallable> {
    Ok(match callable {
        Callable::Null => RawCallable {
            kind: CALLABLE_KIND_NULL,
            object: ObjectHandle::NULL,
            method: RawStr::EMPTY,
            custom: std::ptr::null_mut(),
        },
        Callable::Method { object, method } => RawCallable {
            kind: CALLABLE_KIND_METHOD,
            object: object.checked_handle()?,
            method: RawStr::from_str(method.as_str()),
            custom: std::ptr::null_mut(),
        },
        Callable::Custom(custom) => RawCallable {
            kind: CALLABLE_KIND_CUSTOM,
            object: ObjectHandle::NULL,
            method: RawStr::from_str(custom.name()),
            custom: Arc::as_ptr(custom) as *mut c_void,
        },
    })
}

/// Host closure behind a custom callable userdata pointer, with one new
/// strong count for the caller.
///
/// # Safety
/// `userdata` must come from [`RawArena::encode`] and still be kept alive,
/// either by the encoded value or by a count the engine holds.
pub unsafe fn custom_callable_from_raw(userdata: *mut c_void) -> Arc<CustomCallable> {
    let ptr = userdata as *const CustomCallable;
    unsafe {
        Arc::increment_strong_count(ptr);
        Arc::from_raw(ptr)
    }
}

/// The engine kept a copy of a custom callable: take one strong count for it.
///
/// # Safety
/// Same as [`custom_callable_from_raw`].
pub unsafe fn retain_custom_callable(userdata: *mut c_void) {
    unsafe { Arc::increment_strong_count(userdata as *const CustomCallable) }
}

/// The engine dropped a copy taken with [`retain_custom_callable`].
///
/// # Safety
/// At most once per retained count.
pub unsafe fn release_custom_callable(userdata: *mut c_void) {
    unsafe { drop(Arc::from_raw(userdata as *const CustomCallable)) }
}

/// Copy an engine string, rejecting invalid UTF-8.
///
/// # Safety
/// `raw` must point at `len` readable bytes (or be null).
pub unsafe fn read_str(raw: &RawStr) -> GroveResult<String> {
    let bytes = unsafe { raw.as_bytes() };
    match std::str::from_utf8(bytes) {
        Ok(s) => Ok(s.to_string()),
        Err(e) => Err(GroveError::InvalidUtf8 {
            valid_up_to: e.valid_up_to(),
        }),
    }
}

fn read_reals<const N: usize>(data: &RawVariantData) -> [f32; N] {
    let mut out = [0.0; N];
    // Every bit pattern is a valid f32 array.
    out.copy_from_slice(unsafe { &data.reals[..N] });
    out
}

fn read_ints<const N: usize>(data: &RawVariantData) -> [i32; N] {
    let mut out = [0; N];
    out.copy_from_slice(unsafe { &data.ints[..N] });
    out
}

/// Decode the borrowed argument array of an inbound call.
///
/// # Safety
/// `args` must point to `argc` initialised values (or be null with `argc == 0`).
pub unsafe fn decode_args(
    args: *const RawVariant,
    argc: u32,
    resolver: &dyn ObjectResolver,
) -> GroveResult<Vec<Variant>> {
    if args.is_null() || argc == 0 {
        return Ok(Vec::new());
    }
    let raw = unsafe { std::slice::from_raw_parts(args, argc as usize) };
    raw.iter()
        .map(|value| unsafe { decode(value, resolver, Transfer::Borrowed) })
        .collect()
}

/// Copy a raw variant into an owned `Variant`.
///
/// A top-level object is adopted per `transfer`; nested objects are always
/// borrowed. A null object decodes to `Nil`.
///
/// # Safety
/// `raw` must be a well-formed variant whose payload is readable for the
/// duration of the call.
pub unsafe fn decode(raw: &RawVariant, resolver: &dyn ObjectResolver, transfer: Transfer) -> GroveResult<Variant> {
    let ty = VariantType::from_tag(raw.tag).ok_or(GroveError::Engine(GroveErrorCode::TypeMismatch))?;
    let d = &raw.data;
    let value = unsafe {
        match ty {
            VariantType::Nil => Variant::Nil,
            VariantType::Bool => Variant::Bool(d.boolean != 0),
            VariantType::Int => Variant::Int(d.int),
            VariantType::Float => Variant::Float(d.float),
            VariantType::String => Variant::String(read_str(&d.string)?),
            VariantType::StringName => Variant::StringName(StringName::from(read_str(&d.string)?)),
            VariantType::NodePath => Variant::NodePath(NodePath::from(read_str(&d.string)?)),
            VariantType::Vector2 => Variant::Vector2(Vec2::from_array(read_reals(d))),
            VariantType::Vector2i => Variant::Vector2i(IVec2::from_array(read_ints(d))),
            VariantType::Rect2 => {
                let [x, y, w, h] = read_reals(d);
                Variant::Rect2(Rect2::from_components(x, y, w, h))
            }
            VariantType::Rect2i => {
                let [x, y, w, h] = read_ints(d);
                Variant::Rect2i(Rect2i::from_components(x, y, w, h))
            }
            VariantType::Vector3 => Variant::Vector3(Vec3::from_array(read_reals(d))),
            VariantType::Vector3i => Variant::Vector3i(IVec3::from_array(read_ints(d))),
            VariantType::Transform2D => {
                let [xx, xy, yx, yy, ox, oy] = read_reals(d);
                Variant::Transform2D(Transform2D::new(Vec2::new(xx, xy), Vec2::new(yx, yy), Vec2::new(ox, oy)))
            }
            VariantType::Vector4 => Variant::Vector4(Vec4::from_array(read_reals(d))),
            VariantType::Vector4i => Variant::Vector4i(IVec4::from_array(read_ints(d))),
            VariantType::Plane => {
                let [x, y, z, dist] = read_reals(d);
                Variant::Plane(Plane::new(Vec3::new(x, y, z), dist))
            }
            VariantType::Quaternion => Variant::Quaternion(Quat::from_array(read_reals(d))),
            VariantType::Aabb => {
                let [px, py, pz, sx, sy, sz] = read_reals(d);
                Variant::Aabb(Aabb::new(Vec3::new(px, py, pz), Vec3::new(sx, sy, sz)))
            }
            VariantType::Basis => Variant::Basis(basis_from_rows(&read_reals::<9>(d))),
            VariantType::Transform3D => {
                let packed = read_reals::<12>(d);
                Variant::Transform3D(Transform3D::new(
                    basis_from_rows(&packed[..9]),
                    Vec3::new(packed[9], packed[10], packed[11]),
                ))
            }
            VariantType::Projection => Variant::Projection(Mat4::from_cols_array(&read_reals(d))),
            VariantType::Color => Variant::Color(Color::from_array(read_reals(d))),
            VariantType::Rid => Variant::Rid(Rid(d.rid)),
            VariantType::Object => {
                if d.object.is_null() {
                    Variant::Nil
                } else {
                    Variant::Object(resolver.resolve(d.object, transfer)?)
                }
            }
            VariantType::Callable => Variant::Callable(decode_callable(&d.callable, resolver)?),
            VariantType::Signal => {
                let object = if d.signal.object.is_null() {
                    None
                } else {
                    Some(resolver.resolve(d.signal.object, Transfer::Borrowed)?)
                };
                Variant::Signal(Signal {
                    object,
                    name: StringName::from(read_str(&d.signal.name)?),
                })
            }
            VariantType::Array => {
                let items: &[RawVariant] = d.slice.as_slice();
                let decoded = items
                    .iter()
                    .map(|item| decode(item, resolver, Transfer::Borrowed))
                    .collect::<GroveResult<Vec<_>>>()?;
                Variant::Array(VariantArray::from(decoded))
            }
            VariantType::Dictionary => {
                let pairs: &[RawVariant] = RawSlice {
                    ptr: d.slice.ptr,
                    len: d.slice.len * 2,
                }
                .as_slice();
                let mut dict = Dictionary::new();
                for pair in pairs.chunks_exact(2) {
                    dict.insert(
                        decode(&pair[0], resolver, Transfer::Borrowed)?,
                        decode(&pair[1], resolver, Transfer::Borrowed)?,
                    );
                }
                Variant::Dictionary(dict)
            }
            VariantType::PackedByteArray => Variant::PackedByteArray(copy_slice(&d.slice)),
            VariantType::PackedInt32Array => Variant::PackedInt32Array(copy_slice(&d.slice)),
            VariantType::PackedInt64Array => Variant::PackedInt64Array(copy_slice(&d.slice)),
            VariantType::PackedFloat32Array => Variant::PackedFloat32Array(copy_slice(&d.slice)),
            VariantType::PackedFloat64Array => Variant::PackedFloat64Array(copy_slice(&d.slice)),
            VariantType::PackedStringArray => {
                let strs: &[RawStr] = d.slice.as_slice();
                Variant::PackedStringArray(strs.iter().map(|s| read_str(s)).collect::<GroveResult<_>>()?)
            }
            VariantType::PackedVector2Array => {
                let items: &[[f32; 2]] = d.slice.as_slice();
                Variant::PackedVector2Array(items.iter().map(|v| Vec2::from_array(*v)).collect())
            }
            VariantType::PackedVector3Array => {
                let items: &[[f32; 3]] = d.slice.as_slice();
                Variant::PackedVector3Array(items.iter().map(|v| Vec3::from_array(*v)).collect())
            }
            VariantType::PackedColorArray => {
                let items: &[[f32; 4]] = d.slice.as_slice();
                Variant::PackedColorArray(items.iter().map(|c| Color::from_array(*c)).collect())
            }
            VariantType::PackedVector4Array => {
                let items: &[[f32; 4]] = d.slice.as_slice();
                Variant::PackedVector4Array(items.iter().map(|v| Vec4::from_array(*v)).collect())
            }
        }
    };
    Ok(value)
}

unsafe fn copy_slice<T: Copy>(raw: &RawSlice) -> PackedArray<T> {
    PackedArray(unsafe { raw.as_slice::<T>() }.to_vec())
}

unsafe fn decode_callable(raw: &RawCallable, resolver: &dyn ObjectResolver) -> GroveResult<Callable> {
    Ok(match raw.kind {
        CALLABLE_KIND_METHOD if !raw.object.is_null() => Callable::Method {
            object: resolver.resolve(raw.object, Transfer::Borrowed)?,
            method: StringName::from(unsafe { read_str(&raw.method) }?),
        },
        CALLABLE_KIND_CUSTOM if !raw.custom.is_null() => {
            Callable::Custom(unsafe { custom_callable_from_raw(raw.custom) })
        }
        _ => Callable::Null,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::{ObjectCell, ObjectRef};
    use std::sync::atomic::AtomicBool;
    use std::sync::{OnceLock, Weak};

    struct NoObjects;

    impl ObjectResolver for NoObjects {
        fn resolve(&self, _: ObjectHandle, _: Transfer) -> GroveResult<ObjectRef> {
            Err(GroveError::NullObject)
        }
    }

    fn freed_object(id: u64) -> ObjectRef {
        ObjectRef(Arc::new(ObjectCell {
            handle: ObjectHandle {
                id,
                ptr: id as *mut c_void,
            },
            class: "Node".into(),
            refcounted: false,
            holds_reference: false,
            host_owned: AtomicBool::new(false),
            alive: AtomicBool::new(false),
            instance: OnceLock::new(),
            ctx: Weak::new(),
        }))
    }

    fn wire(value: &Variant) -> Variant {
        let mut arena = RawArena::new();
        let raw = arena.encode(value).unwrap();
        unsafe { decode(&raw, &NoObjects, Transfer::Borrowed) }.unwrap()
    }

    #[test]
    fn value_types_survive_the_wire() {
        let values = vec![
            Variant::Nil,
            Variant::Bool(true),
            Variant::Int(-7),
            Variant::Float(0.25),
            Variant::String("héllo".into()),
            Variant::StringName(StringName::from("ready")),
            Variant::NodePath(NodePath::from("../Camera")),
            Variant::Vector2i(IVec2::new(3, -4)),
            Variant::Rect2(Rect2::from_components(1.0, 2.0, 3.0, 4.0)),
            Variant::Vector3(Vec3::new(1.0, 2.0, 3.0)),
            Variant::Transform2D(Transform2D::new(Vec2::X, Vec2::Y, Vec2::new(5.0, 6.0))),
            Variant::Plane(Plane::new(Vec3::Y, 2.0)),
            Variant::Quaternion(Quat::from_xyzw(0.0, 0.0, 0.0, 1.0)),
            Variant::Aabb(Aabb::new(Vec3::ZERO, Vec3::ONE)),
            Variant::Transform3D(Transform3D::new(
                glam::Mat3::from_cols(Vec3::new(1.0, 2.0, 3.0), Vec3::new(4.0, 5.0, 6.0), Vec3::new(7.0, 8.0, 9.0)),
                Vec3::new(10.0, 11.0, 12.0),
            )),
            Variant::Projection(Mat4::from_cols_array(&std::array::from_fn(|i| i as f32))),
            Variant::Color(Color::new(0.1, 0.2, 0.3, 0.4)),
            Variant::Rid(Rid(99)),
        ];
        for value in &values {
            assert_eq!(&wire(value), value);
        }
    }

    #[test]
    fn inbound_argument_arrays() {
        let values = vec![Variant::Int(4), Variant::String("jump".into())];
        let mut arena = RawArena::new();
        let raw = arena.encode_all(&values).unwrap();
        let decoded = unsafe { decode_args(raw.as_ptr(), raw.len() as u32, &NoObjects) }.unwrap();
        assert_eq!(decoded, values);
        assert!(unsafe { decode_args(std::ptr::null(), 3, &NoObjects) }.unwrap().is_empty());
    }

    #[test]
    fn containers_survive_the_wire() {
        let nested = Variant::Array(VariantArray::from(vec![
            Variant::Int(1),
            Variant::Array(VariantArray::from(vec![Variant::String("inner".into())])),
        ]));
        assert_eq!(wire(&nested), nested);

        let dict: Dictionary = [
            (Variant::String("hp".into()), Variant::Int(10)),
            (Variant::Int(2), Variant::Bool(false)),
        ]
        .into_iter()
        .collect();
        let dict = Variant::Dictionary(dict);
        assert_eq!(wire(&dict), dict);

        let strings = Variant::PackedStringArray(PackedArray(vec!["a".into(), "bc".into()]));
        assert_eq!(wire(&strings), strings);
        let points = Variant::PackedVector3Array(PackedArray(vec![Vec3::X, Vec3::new(1.0, 2.0, 3.0)]));
        assert_eq!(wire(&points), points);
        let colors = Variant::PackedColorArray(PackedArray(vec![Color::WHITE]));
        assert_eq!(wire(&colors), colors);
        let bytes = Variant::PackedByteArray(PackedArray(vec![1, 2, 3]));
        assert_eq!(wire(&bytes), bytes);
    }

    #[test]
    fn null_object_decodes_to_nil() {
        let raw = RawVariant {
            tag: grove_ffi::VARIANT_OBJECT,
            data: RawVariantData {
                object: ObjectHandle::NULL,
            },
        };
        assert_eq!(unsafe { decode(&raw, &NoObjects, Transfer::Owned) }.unwrap(), Variant::Nil);
    }

    #[test]
    fn unknown_tags_are_rejected() {
        let raw = RawVariant {
            tag: 400,
            data: RawVariantData { int: 0 },
        };
        assert!(unsafe { decode(&raw, &NoObjects, Transfer::Borrowed) }.is_err());
    }

    #[test]
    fn custom_callables_are_borrowed_until_the_engine_keeps_a_copy() {
        let token = Arc::new(());
        let captured = Arc::clone(&token);
        let callable = Callable::from_fn("double", move |args: &[Variant]| {
            let _ = &captured;
            match args {
                [Variant::Int(i)] => Ok(Variant::Int(i * 2)),
                _ => Ok(Variant::Nil),
            }
        });
        let Callable::Custom(custom) = &callable else {
            panic!("expected a custom callable");
        };
        let custom = Arc::clone(custom);
        let value = Variant::Callable(callable);

        let mut arena = RawArena::new();
        let first = arena.encode(&value).unwrap();
        let second = arena.encode(&value).unwrap();
        let userdata = unsafe { first.data.callable.custom };
        assert_eq!(userdata, unsafe { second.data.callable.custom });
        assert_eq!(Arc::strong_count(&custom), 2);

        let decoded = unsafe { decode(&first, &NoObjects, Transfer::Borrowed) }.unwrap();
        assert_eq!(decoded, value);
        if let Variant::Callable(c) = &decoded {
            assert_eq!(c.callv(&[Variant::Int(4)]).unwrap(), Variant::Int(8));
        }
        drop(decoded);
        assert_eq!(Arc::strong_count(&custom), 2);

        // An engine-side copy holds its own count until it is dropped.
        unsafe { retain_custom_callable(userdata) };
        assert_eq!(Arc::strong_count(&custom), 3);
        unsafe { release_custom_callable(userdata) };
        assert_eq!(Arc::strong_count(&custom), 2);

        drop(arena);
        drop(value);
        drop(custom);
        assert_eq!(Arc::strong_count(&token), 1);
    }

    #[test]
    fn freed_objects_are_not_encoded() {
        let obj = freed_object(7);
        let nested = Variant::Array(VariantArray::from(vec![Variant::Int(1), Variant::Object(obj.clone())]));
        let mut arena = RawArena::new();
        assert!(matches!(arena.encode(&nested), Err(GroveError::StaleReference { id: 7 })));
        let signal = Variant::Signal(Signal {
            object: Some(obj),
            name: StringName::from("died"),
        });
        assert!(matches!(arena.encode(&signal), Err(GroveError::StaleReference { id: 7 })));
    }

    #[test]
    fn invalid_utf8_is_an_error() {
        let bytes = [b'a', 0xFF, b'b'];
        let raw = RawVariant {
            tag: grove_ffi::VARIANT_STRING,
            data: RawVariantData {
                string: RawStr {
                    ptr: bytes.as_ptr(),
                    len: bytes.len() as u64,
                },
            },
        };
        assert!(matches!(
            unsafe { decode(&raw, &NoObjects, Transfer::Borrowed) },
            Err(GroveError::InvalidUtf8 { valid_up_to: 1 })
        ));
    }

    #[test]
    fn any_nonzero_byte_is_true() {
        let raw = RawVariant {
            tag: grove_ffi::VARIANT_BOOL,
            data: RawVariantData { boolean: 2 },
        };
        assert_eq!(unsafe { decode(&raw, &NoObjects, Transfer::Borrowed) }.unwrap(), Variant::Bool(true));
        let mut arena = RawArena::new();
        let encoded = arena.encode(&Variant::Bool(true)).unwrap();
        assert_eq!(unsafe { encoded.data.boolean }, 1);
    }
}
