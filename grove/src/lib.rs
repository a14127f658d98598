// grove: User-facing library crate. Extensions depend on this and use
// `grove::entry!()` to generate the library entry points in their own cdylib.

// Re-exports for proc macro path resolution and user access.
pub use grove_bindings as bindings;
pub use grove_ffi as ffi;
pub use grove_macros::{ExportEnum, gclass, gclass_impl};
pub use grove_runtime as runtime;

// For proc macro generated inventory::submit! invocations.
#[doc(hidden)]
pub extern crate inventory as __inventory;

mod host;
pub mod prelude;

// Re-export glam for convenience.
pub use glam;

use std::panic::AssertUnwindSafe;

/// Environment variable read at load time to pick the log level
/// (`error`, `warn`, `info`, `debug`, `trace`, `off`).
pub const LOG_LEVEL_ENV: &str = "GROVE_LOG";

/// Initialize grove. Called by the `entry!()` generated `grove_init`.
///
/// Checks the interface version, routes logging to the engine, registers the
/// engine class tree and every `#[gclass]` in the binary, and returns the
/// callback table. Returns null on failure; the reason goes to the log.
pub fn init(interface: *const ffi::GroveInterface) -> *const ffi::GroveHostCallbacks {
    runtime::ffi_boundary(
        std::ptr::null(),
        AssertUnwindSafe(|| match unsafe { host::start(interface) } {
            Ok(callbacks) => callbacks,
            Err(e) => {
                log::error!("grove failed to initialize: {e}");
                std::ptr::null()
            }
        }),
    )
}

/// Shut grove down. Called by the `entry!()` generated `grove_shutdown`.
///
/// Equivalent to the engine invoking `on_shutdown`; whichever comes first
/// wins and the other is a no-op.
pub fn shutdown() {
    runtime::ffi_boundary((), host::stop);
}

/// Generates the library exports for the grove entry points.
///
/// Place this at the top of your cdylib crate's `lib.rs`:
/// ```ignore
/// grove::entry!();
/// ```
#[macro_export]
macro_rules! entry {
    () => {
        mod __grove_entry {
            #[unsafe(no_mangle)]
            pub extern "C" fn grove_init(
                interface: *const $crate::ffi::GroveInterface,
            ) -> *const $crate::ffi::GroveHostCallbacks {
                $crate::init(interface)
            }

            #[unsafe(no_mangle)]
            pub extern "C" fn grove_shutdown() {
                $crate::shutdown()
            }
        }
    };
}
