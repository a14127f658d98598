// FFI boundary guard: wraps host callbacks so a panic never unwinds into
// the engine (which is undefined behavior).

/// Execute `f` and catch any panic, returning `default` on failure.
///
/// Every `extern "C"` function the engine calls wraps its body in this
/// guard. The panic message is logged through the `log` facade, which
/// reaches the engine console once the logger is attached.
pub fn ffi_boundary<F, R>(default: R, f: F) -> R
where
    F: FnOnce() -> R + std::panic::UnwindSafe,
{
    match std::panic::catch_unwind(f) {
        Ok(value) => value,
        Err(payload) => {
            log::error!("{}", panic_message(payload.as_ref()));
            default
        }
    }
}

/// Extract a human-readable message from a panic payload.
pub fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("Rust panic: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("Rust panic: {s}")
    } else {
        "Rust panic (unknown payload)".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ffi_boundary_returns_value_on_success() {
        let result = ffi_boundary(0i32, || 42);
        assert_eq!(result, 42);
    }

    #[test]
    fn ffi_boundary_returns_default_on_panic() {
        let result = ffi_boundary(-1i32, || {
            panic!("test panic");
        });
        assert_eq!(result, -1);
    }

    #[test]
    fn ffi_boundary_returns_default_on_string_panic() {
        let result = ffi_boundary(false, || -> bool {
            panic!("{}", "formatted panic");
        });
        assert!(!result);
    }

    #[test]
    fn panic_messages() {
        assert_eq!(panic_message(&"boom"), "Rust panic: boom");
        assert_eq!(panic_message(&String::from("bang")), "Rust panic: bang");
        assert_eq!(panic_message(&7u8), "Rust panic (unknown payload)");
    }
}
