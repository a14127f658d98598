// The engine seam.
//
// Everything the runtime needs from the engine goes through this trait. The
// production implementation is `FfiEngine` over the C interface table; tests
// use the in-process `MockEngine`.

use grove_ffi::{MethodBindPtr, ObjectHandle};

use crate::callable::Callable;
use crate::error::GroveResult;
use crate::export::PropertyInfo;
use crate::object::{ObjectResolver, Transfer};
use crate::variant::Variant;

/// Severity of an engine print.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug = 0,
    Info = 1,
    Warning = 2,
    Error = 3,
}

impl From<log::Level> for LogLevel {
    fn from(level: log::Level) -> Self {
        match level {
            log::Level::Error => LogLevel::Error,
            log::Level::Warn => LogLevel::Warning,
            log::Level::Info => LogLevel::Info,
            log::Level::Debug | log::Level::Trace => LogLevel::Debug,
        }
    }
}

/// One outbound method call.
pub struct EngineCall<'a> {
    /// `Class.method`, for diagnostics.
    pub label: &'a str,
    pub bind: MethodBindPtr,
    /// `ObjectHandle::NULL` for static methods and utility functions.
    pub receiver: ObjectHandle,
    pub args: &'a [Variant],
    pub return_transfer: Transfer,
    pub resolver: &'a dyn ObjectResolver,
}

/// An extension class as announced to the engine.
#[derive(Clone, Debug, PartialEq)]
pub struct ClassInfo {
    pub name: String,
    pub parent: String,
    pub is_abstract: bool,
    pub is_exposed: bool,
}

/// A host method registered on an extension class.
#[derive(Clone, Debug, PartialEq)]
pub struct MethodMeta {
    pub name: String,
    pub flags: u32,
    pub args: Vec<PropertyInfo>,
    pub ret: Option<PropertyInfo>,
}

pub trait Engine: Send + Sync {
    fn print(&self, level: LogLevel, message: &str);

    fn singleton(&self, name: &str) -> Option<ObjectHandle>;

    /// Most-derived class of a live object.
    fn object_class(&self, object: ObjectHandle) -> GroveResult<String>;

    /// Parent of `class`; `None` for the root class.
    fn class_parent(&self, class: &str) -> GroveResult<Option<String>>;

    /// Ref-counted results carry one reference owned by the caller.
    fn construct(&self, class: &str) -> GroveResult<ObjectHandle>;

    fn destroy(&self, object: ObjectHandle);

    fn reference(&self, object: ObjectHandle);

    /// Drop one reference; `true` when the count reached zero.
    fn unreference(&self, object: ObjectHandle) -> bool;

    /// The bind for `(class, method, hash)`, or the engine's own hash for
    /// that method (`None` if it does not exist).
    fn method_bind(&self, class: &str, method: &str, hash: u32) -> Result<MethodBindPtr, Option<u32>>;

    fn utility_function(&self, name: &str, hash: u32) -> Result<MethodBindPtr, Option<u32>>;

    fn call(&self, call: EngineCall<'_>) -> GroveResult<Variant>;

    /// Invoke an engine-side callable.
    fn call_callable(
        &self,
        callable: &Callable,
        args: &[Variant],
        resolver: &dyn ObjectResolver,
    ) -> GroveResult<Variant>;

    fn register_class(&self, info: &ClassInfo) -> GroveResult<()>;

    fn register_method(&self, class: &str, method: &MethodMeta) -> GroveResult<()>;

    fn register_property(&self, class: &str, property: &PropertyInfo) -> GroveResult<()>;

    /// Group or subgroup marker; an empty `name` closes the current one.
    fn register_group(&self, class: &str, name: &str, prefix: &str, subgroup: bool) -> GroveResult<()>;

    fn unregister_class(&self, class: &str) -> GroveResult<()>;
}
