use std::ffi::c_void;

use crate::error::CallError;
use crate::handles::{ObjectHandle, RawStr};
use crate::raw_variant::RawVariant;

/// Callback table filled by the host and returned to the engine from the entry
/// point. The engine passes `host_data` back verbatim on every call.
///
/// Arguments are borrowed for the duration of the call; results are written
/// into `ret` through `GroveVariantApi::new_copy`.
#[repr(C)]
pub struct GroveHostCallbacks {
    pub host_data: *mut c_void,

    /// The engine constructed the base object of an extension class and asks
    /// the host to attach its instance. Returns false if `class` is unknown.
    pub create_instance:
        extern "C" fn(host_data: *mut c_void, class: RawStr, object: ObjectHandle) -> bool,

    /// The engine is about to free an extension instance.
    pub free_instance: extern "C" fn(host_data: *mut c_void, object: ObjectHandle),

    /// Virtual override or registered method call on an extension instance.
    /// Returns false when the host has no override and the engine should run
    /// its own default; `err` carries failures.
    pub call_method: extern "C" fn(
        host_data: *mut c_void,
        object: ObjectHandle,
        method: RawStr,
        args: *const RawVariant,
        argc: u32,
        ret: *mut RawVariant,
        err: *mut CallError,
    ) -> bool,

    /// Read an exported member. Returns false for unknown properties.
    pub get_property: extern "C" fn(
        host_data: *mut c_void,
        object: ObjectHandle,
        name: RawStr,
        ret: *mut RawVariant,
    ) -> bool,

    /// Write an exported member. Returns false for unknown properties or
    /// values of the wrong type.
    pub set_property: extern "C" fn(
        host_data: *mut c_void,
        object: ObjectHandle,
        name: RawStr,
        value: *const RawVariant,
    ) -> bool,

    /// Invoke a host closure wrapped in a custom callable.
    pub call_custom_callable: extern "C" fn(
        userdata: *mut c_void,
        args: *const RawVariant,
        argc: u32,
        ret: *mut RawVariant,
        err: *mut CallError,
    ),

    /// The engine kept a copy of a custom callable it was handed (an argument
    /// it stores, or a `new_copy` of a return value). Paired with exactly one
    /// `free_custom_callable`.
    pub ref_custom_callable: extern "C" fn(userdata: *mut c_void),

    /// The engine dropped a copy taken with `ref_custom_callable`.
    pub free_custom_callable: extern "C" fn(userdata: *mut c_void),

    /// An object the host may hold wrappers for has been freed engine-side.
    pub notify_object_freed: extern "C" fn(host_data: *mut c_void, instance_id: u64),

    /// Shutdown notification. The host releases everything; `host_data` is
    /// invalid afterwards.
    pub on_shutdown: extern "C" fn(host_data: *mut c_void),
}

unsafe impl Send for GroveHostCallbacks {}
unsafe impl Sync for GroveHostCallbacks {}
