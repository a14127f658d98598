// Engine-facing side of the process: the callback table handed back from
// `grove_init` and the state its `host_data` points at.

use std::ffi::c_void;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, MutexGuard};

use grove_ffi::{CallError, CallErrorCode, GroveHostCallbacks, GroveInterface, ObjectHandle, RawStr, RawVariant};
use grove_runtime::{raw, EngineContext, FfiEngine, GroveError, GroveResult, Outcome, Transfer, ffi_boundary, logging};
use log::LevelFilter;

use crate::LOG_LEVEL_ENV;

struct HostState {
    ctx: Arc<EngineContext>,
    engine: Arc<FfiEngine>,
}

struct Host {
    state: Arc<HostState>,
    callbacks: Box<GroveHostCallbacks>,
}

static HOST: Mutex<Option<Host>> = Mutex::new(None);

fn host() -> MutexGuard<'static, Option<Host>> {
    HOST.lock().unwrap_or_else(|e| e.into_inner())
}

fn log_level() -> LevelFilter {
    std::env::var(LOG_LEVEL_ENV)
        .ok()
        .and_then(|level| level.parse().ok())
        .unwrap_or(LevelFilter::Info)
}

/// # Safety
/// `interface` must be the table the engine passed to the entry point.
pub(crate) unsafe fn start(interface: *const GroveInterface) -> GroveResult<*const GroveHostCallbacks> {
    let mut slot = host();
    if slot.is_some() {
        return Err(GroveError::Registration("grove is already initialized".into()));
    }

    let engine = Arc::new(unsafe { FfiEngine::new(interface)? });
    logging::attach(engine.clone(), log_level());

    let ctx = EngineContext::new(engine.clone());
    ctx.register_engine_classes(grove_bindings::ENGINE_CLASSES);
    let count = match ctx.register_extension_classes() {
        Ok(count) => count,
        Err(e) => {
            ctx.shutdown();
            logging::detach();
            return Err(e);
        }
    };

    let mismatches = ctx.verify_methods(grove_bindings::METHOD_TABLES.iter().flat_map(|t| t.iter().copied()));
    for e in &mismatches {
        log::warn!("{e}");
    }

    let version = engine.engine_version();
    let (major, minor, patch) = grove_bindings::API_VERSION;
    log::info!(
        "grove {} initialized on engine {}.{}.{} (bindings for {major}.{minor}.{patch}, {count} extension classes)",
        env!("CARGO_PKG_VERSION"),
        version.major,
        version.minor,
        version.patch,
    );

    let state = Arc::new(HostState { ctx, engine });
    let callbacks = Box::new(GroveHostCallbacks {
        host_data: Arc::as_ptr(&state) as *mut c_void,
        create_instance,
        free_instance,
        call_method,
        get_property,
        set_property,
        call_custom_callable,
        ref_custom_callable,
        free_custom_callable,
        notify_object_freed,
        on_shutdown,
    });
    let table: *const GroveHostCallbacks = &*callbacks;
    *slot = Some(Host { state, callbacks });
    Ok(table)
}

pub(crate) fn stop() {
    let Some(host) = host().take() else {
        return;
    };
    host.state.ctx.shutdown();
    log::info!("grove shut down");
    logging::detach();
    drop(host.callbacks);
}

fn current() -> Option<Arc<HostState>> {
    host().as_ref().map(|h| h.state.clone())
}

/// Run `f` against the state behind `host_data`, catching panics.
fn with_state<R>(host_data: *mut c_void, default: R, f: impl FnOnce(&HostState) -> R) -> R {
    // SAFETY: `host_data` is the pointer from our own callback table; the
    // engine stops calling in once `on_shutdown` has run.
    let Some(state) = (unsafe { (host_data as *const HostState).as_ref() }) else {
        log::error!("engine callback without host data");
        return default;
    };
    ffi_boundary(default, AssertUnwindSafe(|| f(state)))
}

fn report<T>(what: &str, result: GroveResult<T>, fallback: T) -> T {
    result.unwrap_or_else(|e| {
        log::error!("{what}: {e}");
        fallback
    })
}

fn set_error(err: *mut CallError, value: CallError) {
    if !err.is_null() {
        unsafe { *err = value };
    }
}

extern "C" fn create_instance(host_data: *mut c_void, class: RawStr, object: ObjectHandle) -> bool {
    with_state(host_data, false, |state| {
        let created = unsafe { raw::read_str(&class) }
            .and_then(|class| state.ctx.create_instance(&class, object))
            .map(|()| true);
        report("creating extension instance", created, false)
    })
}

extern "C" fn free_instance(host_data: *mut c_void, object: ObjectHandle) {
    with_state(host_data, (), |state| state.ctx.free_instance(object.id))
}

extern "C" fn call_method(
    host_data: *mut c_void,
    object: ObjectHandle,
    method: RawStr,
    args: *const RawVariant,
    argc: u32,
    ret: *mut RawVariant,
    err: *mut CallError,
) -> bool {
    with_state(host_data, false, |state| {
        let method = match unsafe { raw::read_str(&method) } {
            Ok(method) => method,
            Err(e) => {
                log::error!("method call on object {}: {e}", object.id);
                set_error(err, e.to_call_error());
                return true;
            }
        };
        let outcome = unsafe { raw::decode_args(args, argc, &state.ctx) }
            .and_then(|args| state.ctx.dispatch(object.id, &method, &args))
            .and_then(|outcome| match outcome {
                Outcome::Returned(value) => unsafe { state.engine.write_return(ret, &value) }.map(|()| true),
                Outcome::Default => Ok(false),
            });
        match outcome {
            Ok(true) => {
                set_error(err, CallError::OK);
                true
            }
            Ok(false) => false,
            Err(e) => {
                log::error!("{method} on object {}: {e}", object.id);
                set_error(err, e.to_call_error());
                true
            }
        }
    })
}

extern "C" fn get_property(host_data: *mut c_void, object: ObjectHandle, name: RawStr, ret: *mut RawVariant) -> bool {
    with_state(host_data, false, |state| {
        let read = unsafe { raw::read_str(&name) }.and_then(|name| match state.ctx.get_property(object.id, &name)? {
            Some(value) => unsafe { state.engine.write_return(ret, &value) }.map(|()| true),
            None => Ok(false),
        });
        report(&format!("reading a property of object {}", object.id), read, false)
    })
}

extern "C" fn set_property(
    host_data: *mut c_void,
    object: ObjectHandle,
    name: RawStr,
    value: *const RawVariant,
) -> bool {
    with_state(host_data, false, |state| {
        // SAFETY: a non-null `value` is a borrowed, initialised variant.
        let Some(value) = (unsafe { value.as_ref() }) else {
            return false;
        };
        let stored = unsafe { raw::read_str(&name) }.and_then(|name| {
            let value = unsafe { raw::decode(value, &state.ctx, Transfer::Borrowed) }?;
            state.ctx.set_property(object.id, &name, &value)
        });
        match stored {
            Ok(known) => known,
            Err(e) => {
                log::warn!("writing a property of object {}: {e}", object.id);
                false
            }
        }
    })
}

extern "C" fn call_custom_callable(
    userdata: *mut c_void,
    args: *const RawVariant,
    argc: u32,
    ret: *mut RawVariant,
    err: *mut CallError,
) {
    ffi_boundary(
        (),
        AssertUnwindSafe(|| {
            let Some(state) = current().filter(|_| !userdata.is_null()) else {
                set_error(
                    err,
                    CallError {
                        code: CallErrorCode::InstanceIsNull,
                        argument: 0,
                        expected: 0,
                    },
                );
                return;
            };
            let callable = unsafe { raw::custom_callable_from_raw(userdata) };
            let result = unsafe { raw::decode_args(args, argc, &state.ctx) }
                .and_then(|args| callable.invoke(&args))
                .and_then(|value| unsafe { state.engine.write_return(ret, &value) });
            match result {
                Ok(()) => set_error(err, CallError::OK),
                Err(e) => {
                    log::error!("callable {}: {e}", callable.name());
                    set_error(err, e.to_call_error());
                }
            }
        }),
    )
}

extern "C" fn ref_custom_callable(userdata: *mut c_void) {
    if userdata.is_null() {
        return;
    }
    ffi_boundary((), AssertUnwindSafe(|| unsafe { raw::retain_custom_callable(userdata) }))
}

extern "C" fn free_custom_callable(userdata: *mut c_void) {
    if userdata.is_null() {
        return;
    }
    ffi_boundary((), AssertUnwindSafe(|| unsafe { raw::release_custom_callable(userdata) }))
}

extern "C" fn notify_object_freed(host_data: *mut c_void, instance_id: u64) {
    with_state(host_data, (), |state| state.ctx.object_freed(instance_id))
}

extern "C" fn on_shutdown(_host_data: *mut c_void) {
    ffi_boundary((), stop)
}

#[cfg(test)]
mod tests {
    use super::*;
    use grove_ffi::{EngineVersion, GROVE_INTERFACE_VERSION};

    fn interface(version: u32) -> GroveInterface {
        GroveInterface {
            version,
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
        }
    }

    #[test]
    fn null_interface_is_refused() {
        assert!(crate::init(std::ptr::null()).is_null());
        assert!(current().is_none());
    }

    #[test]
    fn newer_interface_versions_are_refused() {
        let table = interface(GROVE_INTERFACE_VERSION + 1);
        assert!(crate::init(&table).is_null());
        assert!(current().is_none());
    }

    #[test]
    fn shutdown_without_init_is_a_no_op() {
        crate::shutdown();
        on_shutdown(std::ptr::null_mut());
        assert!(current().is_none());
    }

    #[test]
    fn callbacks_without_host_data_fall_back() {
        let name = RawStr::from_str("hp");
        assert!(!get_property(std::ptr::null_mut(), ObjectHandle::NULL, name, std::ptr::null_mut()));
        assert!(!create_instance(std::ptr::null_mut(), name, ObjectHandle::NULL));

        let mut err = CallError::OK;
        call_custom_callable(std::ptr::null_mut(), std::ptr::null(), 0, std::ptr::null_mut(), &mut err);
        assert_eq!(err.code, CallErrorCode::InstanceIsNull);
        ref_custom_callable(std::ptr::null_mut());
        free_custom_callable(std::ptr::null_mut());
    }
}
