// `Engine` over the C interface table handed to the entry point.

use grove_ffi::{
    CallError, EngineVersion, GroveClassDbApi, GroveCoreApi, GroveErrorCode, GroveInterface, GroveObjectApi,
    GroveRegistrationApi, GroveVariantApi, MethodBindPtr, ObjectHandle, RawClassInfo, RawMethodInfo,
    RawPropertyInfo, RawStr, RawVariant, GROVE_INTERFACE_VERSION,
};

use crate::callable::Callable;
use crate::engine::{ClassInfo, Engine, EngineCall, LogLevel, MethodMeta};
use crate::error::{check_ffi, GroveError, GroveResult};
use crate::export::PropertyInfo;
use crate::object::{ObjectResolver, Transfer};
use crate::raw::{self, RawArena};
use crate::variant::Variant;

/// Initial guess for class name buffers; longer names take one retry.
const NAME_BUF: usize = 64;

pub struct FfiEngine {
    table: *const GroveInterface,
}

// SAFETY: the engine guarantees the interface table and its sub-tables stay
// valid and immutable from load until shutdown.
unsafe impl Send for FfiEngine {}
unsafe impl Sync for FfiEngine {}

impl FfiEngine {
    /// # Safety
    /// `table` must be the interface pointer the engine passed to the entry
    /// point, valid for the lifetime of the returned value.
    pub unsafe fn new(table: *const GroveInterface) -> GroveResult<Self> {
        if table.is_null() {
            return Err(GroveError::NullObject);
        }
        let found = unsafe { (*table).version };
        if found != GROVE_INTERFACE_VERSION {
            return Err(GroveError::IncompatibleInterface {
                expected: GROVE_INTERFACE_VERSION,
                found,
            });
        }
        Ok(FfiEngine { table })
    }

    pub fn engine_version(&self) -> EngineVersion {
        self.interface().engine_version
    }

    /// Hand `value` to the engine through an out-parameter it owns.
    ///
    /// # Safety
    /// `dst` must point to writable storage for one `RawVariant`.
    pub unsafe fn write_return(&self, dst: *mut RawVariant, value: &Variant) -> GroveResult<()> {
        if dst.is_null() {
            return Ok(());
        }
        let mut arena = RawArena::new();
        let raw = arena.encode(value)?;
        unsafe { (self.variant().new_copy)(dst, &raw) };
        Ok(())
    }

    #[inline]
    fn interface(&self) -> &GroveInterface {
        unsafe { &*self.table }
    }

    #[inline]
    fn core(&self) -> &GroveCoreApi {
        unsafe { &*self.interface().core }
    }

    #[inline]
    fn object(&self) -> &GroveObjectApi {
        unsafe { &*self.interface().object }
    }

    #[inline]
    fn classdb(&self) -> &GroveClassDbApi {
        unsafe { &*self.interface().classdb }
    }

    #[inline]
    fn variant(&self) -> &GroveVariantApi {
        unsafe { &*self.interface().variant }
    }

    #[inline]
    fn registration(&self) -> &GroveRegistrationApi {
        unsafe { &*self.interface().registration }
    }

    /// Copy an engine-owned return value and release it.
    unsafe fn take_return(
        &self,
        ret: &mut RawVariant,
        resolver: &dyn ObjectResolver,
        transfer: Transfer,
    ) -> GroveResult<Variant> {
        let value = unsafe { raw::decode(ret, resolver, transfer) };
        unsafe { (self.variant().destroy)(ret) };
        value
    }
}

/// Run a buffer-filling name query, growing the buffer once if the engine
/// reports it too small.
fn read_name(mut query: impl FnMut(*mut u8, u32, *mut u32) -> GroveErrorCode) -> GroveResult<String> {
    let mut buf = vec![0u8; NAME_BUF];
    let mut len = 0u32;
    let mut code = query(buf.as_mut_ptr(), buf.len() as u32, &mut len);
    if code == GroveErrorCode::BufferTooSmall {
        buf.resize(len as usize, 0);
        code = query(buf.as_mut_ptr(), buf.len() as u32, &mut len);
    }
    check_ffi(code)?;
    buf.truncate(len as usize);
    String::from_utf8(buf).map_err(|e| GroveError::InvalidUtf8 {
        valid_up_to: e.utf8_error().valid_up_to(),
    })
}

fn call_result(label: &str, err: CallError) -> GroveResult<()> {
    if err.is_ok() {
        Ok(())
    } else {
        Err(GroveError::CallFailed {
            method: label.to_string(),
            error: err,
        })
    }
}

fn raw_property(info: &PropertyInfo) -> RawPropertyInfo {
    RawPropertyInfo {
        name: RawStr::from_str(&info.name),
        class_name: RawStr::from_str(&info.class_name),
        variant_type: info.variant_type.tag(),
        hint: info.hint,
        hint_string: RawStr::from_str(&info.hint_string),
        usage: info.usage,
    }
}

const NO_RETURN: RawPropertyInfo = RawPropertyInfo {
    name: RawStr::EMPTY,
    class_name: RawStr::EMPTY,
    variant_type: grove_ffi::VARIANT_NIL,
    hint: grove_ffi::PROPERTY_HINT_NONE,
    hint_string: RawStr::EMPTY,
    usage: grove_ffi::PROPERTY_USAGE_NONE,
};

fn lookup(bind: MethodBindPtr, live_hash: u32) -> Result<MethodBindPtr, Option<u32>> {
    if bind.0.is_null() {
        Err((live_hash != 0).then_some(live_hash))
    } else {
        Ok(bind)
    }
}

impl Engine for FfiEngine {
    fn print(&self, level: LogLevel, message: &str) {
        unsafe { (self.core().print)(level as u8, RawStr::from_str(message)) }
    }

    fn singleton(&self, name: &str) -> Option<ObjectHandle> {
        let handle = unsafe { (self.core().get_singleton)(RawStr::from_str(name)) };
        (!handle.is_null()).then_some(handle)
    }

    fn object_class(&self, object: ObjectHandle) -> GroveResult<String> {
        let get_class = self.object().get_class;
        read_name(|buf, len, out| unsafe { get_class(object, buf, len, out) })
    }

    fn class_parent(&self, class: &str) -> GroveResult<Option<String>> {
        let class_parent = self.object().class_parent;
        let parent = read_name(|buf, len, out| unsafe { class_parent(RawStr::from_str(class), buf, len, out) })?;
        Ok((!parent.is_empty()).then_some(parent))
    }

    fn construct(&self, class: &str) -> GroveResult<ObjectHandle> {
        let mut handle = ObjectHandle::NULL;
        check_ffi(unsafe { (self.object().construct)(RawStr::from_str(class), &mut handle) })?;
        if handle.is_null() {
            return Err(GroveError::NullObject);
        }
        Ok(handle)
    }

    fn destroy(&self, object: ObjectHandle) {
        unsafe { (self.object().destroy)(object) }
    }

    fn reference(&self, object: ObjectHandle) {
        unsafe { (self.object().reference)(object) }
    }

    fn unreference(&self, object: ObjectHandle) -> bool {
        unsafe { (self.object().unreference)(object) }
    }

    fn method_bind(&self, class: &str, method: &str, hash: u32) -> Result<MethodBindPtr, Option<u32>> {
        let mut live = 0u32;
        let bind = unsafe {
            (self.classdb().get_method_bind)(RawStr::from_str(class), RawStr::from_str(method), hash, &mut live)
        };
        lookup(bind, live)
    }

    fn utility_function(&self, name: &str, hash: u32) -> Result<MethodBindPtr, Option<u32>> {
        let mut live = 0u32;
        let bind = unsafe { (self.classdb().get_utility_function)(RawStr::from_str(name), hash, &mut live) };
        lookup(bind, live)
    }

    fn call(&self, call: EngineCall<'_>) -> GroveResult<Variant> {
        let mut arena = RawArena::new();
        let args = arena.encode_all(call.args)?;
        let mut ret = RawVariant::NIL;
        let mut err = CallError::OK;
        unsafe {
            (self.classdb().call)(
                call.bind,
                call.receiver,
                args.as_ptr(),
                args.len() as u32,
                &mut ret,
                &mut err,
            );
        }
        call_result(call.label, err)?;
        unsafe { self.take_return(&mut ret, call.resolver, call.return_transfer) }
    }

    fn call_callable(
        &self,
        callable: &Callable,
        args: &[Variant],
        resolver: &dyn ObjectResolver,
    ) -> GroveResult<Variant> {
        let target = Variant::Callable(callable.clone());
        let mut arena = RawArena::new();
        let raw_target = arena.encode(&target)?;
        let raw_args = arena.encode_all(args)?;
        let mut ret = RawVariant::NIL;
        let mut err = CallError::OK;
        unsafe {
            (self.variant().call_callable)(
                &raw_target,
                raw_args.as_ptr(),
                raw_args.len() as u32,
                &mut ret,
                &mut err,
            );
        }
        call_result("Callable.call", err)?;
        unsafe { self.take_return(&mut ret, resolver, Transfer::Borrowed) }
    }

    fn register_class(&self, info: &ClassInfo) -> GroveResult<()> {
        let raw = RawClassInfo {
            name: RawStr::from_str(&info.name),
            parent: RawStr::from_str(&info.parent),
            is_abstract: info.is_abstract,
            is_exposed: info.is_exposed,
        };
        check_ffi(unsafe { (self.registration().register_class)(&raw) })
    }

    fn register_method(&self, class: &str, method: &MethodMeta) -> GroveResult<()> {
        let args: Vec<RawPropertyInfo> = method.args.iter().map(raw_property).collect();
        let ret = method.ret.as_ref().map(raw_property);
        let raw = RawMethodInfo {
            name: RawStr::from_str(&method.name),
            flags: method.flags,
            has_return: ret.is_some(),
            return_info: ret.unwrap_or(NO_RETURN),
            args: args.as_ptr(),
            argc: args.len() as u32,
        };
        check_ffi(unsafe { (self.registration().register_method)(RawStr::from_str(class), &raw) })
    }

    fn register_property(&self, class: &str, property: &PropertyInfo) -> GroveResult<()> {
        let raw = raw_property(property);
        check_ffi(unsafe { (self.registration().register_property)(RawStr::from_str(class), &raw) })
    }

    fn register_group(&self, class: &str, name: &str, prefix: &str, subgroup: bool) -> GroveResult<()> {
        check_ffi(unsafe {
            (self.registration().register_group)(
                RawStr::from_str(class),
                RawStr::from_str(name),
                RawStr::from_str(prefix),
                subgroup,
            )
        })
    }

    fn unregister_class(&self, class: &str) -> GroveResult<()> {
        check_ffi(unsafe { (self.registration().unregister_class)(RawStr::from_str(class)) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_buffers_grow_once() {
        let long = "A".repeat(100);
        let mut calls = 0;
        let name = read_name(|buf, len, out| {
            calls += 1;
            unsafe { *out = long.len() as u32 };
            if (len as usize) < long.len() {
                return GroveErrorCode::BufferTooSmall;
            }
            unsafe { std::ptr::copy_nonoverlapping(long.as_ptr(), buf, long.len()) };
            GroveErrorCode::Ok
        })
        .unwrap();
        assert_eq!(name, long);
        assert_eq!(calls, 2);
    }

    #[test]
    fn invalid_utf8_names_are_rejected() {
        let name = read_name(|buf, _, out| {
            unsafe {
                std::ptr::copy_nonoverlapping([b'N', 0xC3].as_ptr(), buf, 2);
                *out = 2;
            }
            GroveErrorCode::Ok
        });
        assert!(matches!(name, Err(GroveError::InvalidUtf8 { valid_up_to: 1 })));
    }

    #[test]
    fn missing_binds_report_the_live_hash() {
        let null = MethodBindPtr(std::ptr::null());
        assert_eq!(lookup(null, 0).unwrap_err(), None);
        assert_eq!(lookup(null, 77).unwrap_err(), Some(77));
        let real = MethodBindPtr(8 as *const std::ffi::c_void);
        assert!(lookup(real, 0).is_ok());
    }

    #[test]
    fn interface_version_is_checked() {
        let table = GroveInterface {
            version: GROVE_INTERFACE_VERSION + 1,
            engine_version: EngineVersion {
                major: 4,
                minor: 3,
                patch: 0,
            },
            core: std::ptr::null(),
            object: std::ptr::null(),
            classdb: std::ptr::null(),
            variant: std::ptr::null(),
            registration: std::ptr::null(),
        };
        let err = unsafe { FfiEngine::new(&table) }.err();
        assert!(matches!(err, Some(GroveError::IncompatibleInterface { found: 2, .. })));
    }
}
