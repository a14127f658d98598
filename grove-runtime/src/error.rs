// Error types for the grove runtime.

use grove_ffi::{CallError, CallErrorCode, GroveErrorCode};

use crate::variant::VariantType;

/// Rich error type for grove operations.
///
/// `TypeMismatch` and `StaleReference` are the two a caller is expected to
/// handle locally; everything else usually propagates to the FFI boundary.
#[derive(Debug, thiserror::Error)]
pub enum GroveError {
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: VariantType, found: VariantType },

    #[error("{value} is not representable as {target}")]
    LossyConversion { value: String, target: &'static str },

    #[error("engine string is not valid UTF-8 (valid up to byte {valid_up_to})")]
    InvalidUtf8 { valid_up_to: usize },

    #[error("object {id} has been freed")]
    StaleReference { id: u64 },

    #[error("ABI mismatch for {class}.{method}: expected hash {expected}, engine has {}", live_hash(.found))]
    AbiMismatch {
        class: String,
        method: String,
        expected: u32,
        found: Option<u32>,
    },

    #[error("invalid hint on `{member}`: {reason}")]
    HintValidation { member: String, reason: String },

    #[error("required virtual {class}.{method} is not implemented")]
    NotImplemented { class: String, method: String },

    #[error("call to {method} failed: {error:?}")]
    CallFailed { method: String, error: CallError },

    #[error("null object")]
    NullObject,

    #[error("cannot cast {from} to {to}")]
    InvalidCast { from: String, to: String },

    #[error("object {id} is not owned by the host")]
    NotOwner { id: u64 },

    #[error("instance of object {id} is already bound")]
    AlreadyBound { id: u64 },

    #[error("unknown class: {0}")]
    UnknownClass(String),

    #[error("{value} is not a valid {ty}")]
    InvalidEnumValue { ty: &'static str, value: i64 },

    #[error("registration failed: {0}")]
    Registration(String),

    #[error("engine interface version {found} is not supported (expected {expected})")]
    IncompatibleInterface { expected: u32, found: u32 },

    #[error("engine context has been shut down")]
    ShutDown,

    #[error("engine error: {0:?}")]
    Engine(GroveErrorCode),
}

impl GroveError {
    /// Call error record reported to the engine when an inbound call fails.
    pub fn to_call_error(&self) -> CallError {
        let code = match self {
            GroveError::CallFailed { error, .. } => return *error,
            GroveError::TypeMismatch { expected, .. } => {
                return CallError {
                    code: CallErrorCode::InvalidArgument,
                    argument: -1,
                    expected: expected.tag(),
                };
            }
            GroveError::StaleReference { .. } | GroveError::NullObject => CallErrorCode::InstanceIsNull,
            _ => CallErrorCode::InvalidMethod,
        };
        CallError {
            code,
            argument: 0,
            expected: 0,
        }
    }
}

fn live_hash(found: &Option<u32>) -> String {
    match found {
        Some(hash) => hash.to_string(),
        None => "no such method".to_string(),
    }
}

/// Convenience alias used throughout the runtime and generated code.
pub type GroveResult<T> = Result<T, GroveError>;

/// Convert an FFI status code to a `GroveResult<()>`.
pub fn check_ffi(code: GroveErrorCode) -> GroveResult<()> {
    match code {
        GroveErrorCode::Ok => Ok(()),
        other => Err(GroveError::from(other)),
    }
}

impl From<GroveErrorCode> for GroveError {
    fn from(code: GroveErrorCode) -> Self {
        match code {
            GroveErrorCode::InvalidObject => GroveError::NullObject,
            other => GroveError::Engine(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_ffi_ok_returns_ok() {
        assert!(check_ffi(GroveErrorCode::Ok).is_ok());
    }

    #[test]
    fn check_ffi_errors_map_correctly() {
        assert!(matches!(check_ffi(GroveErrorCode::InvalidObject), Err(GroveError::NullObject)));
        assert!(matches!(
            check_ffi(GroveErrorCode::UnknownClass),
            Err(GroveError::Engine(GroveErrorCode::UnknownClass))
        ));
    }

    #[test]
    fn abi_mismatch_names_both_hashes() {
        let err = GroveError::AbiMismatch {
            class: "Node3D".into(),
            method: "set_position".into(),
            expected: 1,
            found: Some(2),
        };
        assert_eq!(err.to_string(), "ABI mismatch for Node3D.set_position: expected hash 1, engine has 2");
        let missing = GroveError::AbiMismatch {
            class: "Node3D".into(),
            method: "gone".into(),
            expected: 1,
            found: None,
        };
        assert!(missing.to_string().ends_with("engine has no such method"));
    }

    #[test]
    fn inbound_failures_become_call_errors() {
        let failed = CallError {
            code: CallErrorCode::TooFewArguments,
            argument: 0,
            expected: 2,
        };
        let err = GroveError::CallFailed {
            method: "Player.jump".into(),
            error: failed,
        };
        assert_eq!(err.to_call_error(), failed);
        assert_eq!(
            GroveError::StaleReference { id: 3 }.to_call_error().code,
            CallErrorCode::InstanceIsNull
        );
        let mismatch = GroveError::TypeMismatch {
            expected: VariantType::Int,
            found: VariantType::String,
        };
        assert_eq!(mismatch.to_call_error().code, CallErrorCode::InvalidArgument);
        assert_eq!(mismatch.to_call_error().expected, VariantType::Int.tag());
    }

    #[test]
    fn display_formats_are_human_readable() {
        let err = GroveError::TypeMismatch {
            expected: VariantType::Vector3,
            found: VariantType::Int,
        };
        assert_eq!(err.to_string(), "type mismatch: expected Vector3, found int");
    }
}
