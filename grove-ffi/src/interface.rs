use crate::error::{CallError, GroveErrorCode};
use crate::handles::*;
use crate::raw_variant::RawVariant;
use crate::registration::{RawClassInfo, RawMethodInfo, RawPropertyInfo};

/// Bumped whenever the layout of any table below changes.
pub const GROVE_INTERFACE_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// Top-level interface
// ---------------------------------------------------------------------------

/// The table the engine passes to the host's entry point. Every sub-table
/// pointer is valid from load until `GroveHostCallbacks::on_shutdown` returns.
#[repr(C)]
pub struct GroveInterface {
    pub version: u32,
    pub engine_version: EngineVersion,

    pub core: *const GroveCoreApi,
    pub object: *const GroveObjectApi,
    pub classdb: *const GroveClassDbApi,
    pub variant: *const GroveVariantApi,
    pub registration: *const GroveRegistrationApi,
}

unsafe impl Send for GroveInterface {}
unsafe impl Sync for GroveInterface {}

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct EngineVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

// ---------------------------------------------------------------------------
// GroveCoreApi
// ---------------------------------------------------------------------------

#[repr(C)]
pub struct GroveCoreApi {
    /// Engine print. `level`: 0=debug, 1=info, 2=warning, 3=error.
    pub print: unsafe extern "C" fn(level: u8, msg: RawStr),

    /// Engine singleton by name. Returns `ObjectHandle::NULL` when unknown.
    pub get_singleton: unsafe extern "C" fn(name: RawStr) -> ObjectHandle,
}

// ---------------------------------------------------------------------------
// GroveObjectApi
// ---------------------------------------------------------------------------

#[repr(C)]
pub struct GroveObjectApi {
    /// Write the object's most-derived class name into a caller buffer (UTF-8).
    /// Returns `BufferTooSmall` with `out_len` set when `buf_len` is insufficient.
    pub get_class: unsafe extern "C" fn(
        obj: ObjectHandle,
        buf: *mut u8,
        buf_len: u32,
        out_len: *mut u32,
    ) -> GroveErrorCode,

    /// Parent class of `class`. Writes an empty string for the root class and
    /// returns `UnknownClass` for names the engine does not know.
    pub class_parent: unsafe extern "C" fn(
        class: RawStr,
        buf: *mut u8,
        buf_len: u32,
        out_len: *mut u32,
    ) -> GroveErrorCode,

    /// Instantiate `class`. Ref-counted results carry one reference that the
    /// caller owns.
    pub construct: unsafe extern "C" fn(class: RawStr, out: *mut ObjectHandle) -> GroveErrorCode,

    /// Free a manually-managed object.
    pub destroy: unsafe extern "C" fn(obj: ObjectHandle),

    /// Take one reference on a ref-counted object.
    pub reference: unsafe extern "C" fn(obj: ObjectHandle),

    /// Drop one reference. Returns true when the count reached zero; the
    /// caller is then responsible for calling `destroy` exactly once.
    pub unreference: unsafe extern "C" fn(obj: ObjectHandle) -> bool,
}

// ---------------------------------------------------------------------------
// GroveClassDbApi
// ---------------------------------------------------------------------------

#[repr(C)]
pub struct GroveClassDbApi {
    /// Resolve a method bind. Returns null when the method is missing or its
    /// ABI hash differs; `out_live_hash` receives the engine's hash, or 0 if
    /// the method does not exist at all.
    pub get_method_bind: unsafe extern "C" fn(
        class: RawStr,
        method: RawStr,
        hash: u32,
        out_live_hash: *mut u32,
    ) -> MethodBindPtr,

    /// Same contract as `get_method_bind` for global utility functions.
    pub get_utility_function: unsafe extern "C" fn(
        name: RawStr,
        hash: u32,
        out_live_hash: *mut u32,
    ) -> MethodBindPtr,

    /// Invoke a bind. `receiver` is `ObjectHandle::NULL` for static methods
    /// and utility functions. `ret` is engine-owned on return.
    pub call: unsafe extern "C" fn(
        bind: MethodBindPtr,
        receiver: ObjectHandle,
        args: *const RawVariant,
        argc: u32,
        ret: *mut RawVariant,
        err: *mut CallError,
    ),
}

// ---------------------------------------------------------------------------
// GroveVariantApi
// ---------------------------------------------------------------------------

#[repr(C)]
pub struct GroveVariantApi {
    /// Deep-copy a host-borrowed variant into engine-owned storage at `dst`.
    pub new_copy: unsafe extern "C" fn(dst: *mut RawVariant, src: *const RawVariant),

    /// Release an engine-owned variant previously returned to the host.
    pub destroy: unsafe extern "C" fn(value: *mut RawVariant),

    /// Invoke a callable variant.
    pub call_callable: unsafe extern "C" fn(
        callable: *const RawVariant,
        args: *const RawVariant,
        argc: u32,
        ret: *mut RawVariant,
        err: *mut CallError,
    ),
}

// ---------------------------------------------------------------------------
// GroveRegistrationApi
// ---------------------------------------------------------------------------

#[repr(C)]
pub struct GroveRegistrationApi {
    pub register_class: unsafe extern "C" fn(info: *const RawClassInfo) -> GroveErrorCode,

    pub register_method:
        unsafe extern "C" fn(class: RawStr, info: *const RawMethodInfo) -> GroveErrorCode,

    pub register_property:
        unsafe extern "C" fn(class: RawStr, info: *const RawPropertyInfo) -> GroveErrorCode,

    /// Group (`subgroup == false`) or subgroup marker. An empty `name` closes
    /// the current group.
    pub register_group: unsafe extern "C" fn(
        class: RawStr,
        name: RawStr,
        prefix: RawStr,
        subgroup: bool,
    ) -> GroveErrorCode,

    pub unregister_class: unsafe extern "C" fn(class: RawStr) -> GroveErrorCode,
}
