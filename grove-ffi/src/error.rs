/// Status codes returned by the engine interface functions.
#[repr(u32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GroveErrorCode {
    Ok = 0,
    InvalidObject = 1,
    UnknownClass = 2,
    MethodNotFound = 3,
    HashMismatch = 4,
    TypeMismatch = 5,
    InvalidArgument = 6,
    AlreadyRegistered = 7,
    BufferTooSmall = 8,
    InternalError = 9,
}

/// Outcome of a dynamic call, mirroring the engine's call error record.
#[repr(u32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CallErrorCode {
    Ok = 0,
    InvalidMethod = 1,
    InvalidArgument = 2,
    TooManyArguments = 3,
    TooFewArguments = 4,
    InstanceIsNull = 5,
    MethodNotConst = 6,
}

/// Detailed call error. `argument` is the offending argument index for
/// `InvalidArgument`, `expected` the expected variant tag or argument count.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CallError {
    pub code: CallErrorCode,
    pub argument: i32,
    pub expected: u32,
}

impl CallError {
    pub const OK: CallError = CallError {
        code: CallErrorCode::Ok,
        argument: 0,
        expected: 0,
    };

    pub fn is_ok(&self) -> bool {
        self.code == CallErrorCode::Ok
    }
}

impl Default for CallError {
    fn default() -> Self {
        Self::OK
    }
}
