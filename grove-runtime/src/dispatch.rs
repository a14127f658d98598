// Inbound dispatch: the engine calls a virtual override or a `#[func]` on an
// extension instance.
//
// Each extension class gets one `DispatchTable` when it is registered; the
// table of a class extending another extension class starts from its
// parent's entries. Lookups never walk the class chain at call time.

use std::collections::HashMap;
use std::sync::Arc;

use grove_ffi::{CallError, CallErrorCode};

use crate::codec::FromVariant;
use crate::context::EngineContext;
use crate::error::{GroveError, GroveResult};
use crate::export::PropertyInfo;
use crate::tracker::{InstanceMut, InstanceRef, InstanceStorage};
use crate::variant::Variant;

/// Virtual method an engine class lets subclasses override.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VirtualSlot {
    pub name: &'static str,
    pub hash: u32,
    /// The engine has no default; an extension class must override it.
    pub required: bool,
    pub returns_value: bool,
}

/// Result of an inbound dispatch.
#[derive(Debug, PartialEq)]
pub enum Outcome {
    Returned(Variant),
    /// No override: the engine runs its own default.
    Default,
}

/// Arguments of one inbound call, handed to a method thunk.
pub struct DispatchCall<'a> {
    pub ctx: &'a Arc<EngineContext>,
    pub instance_id: u64,
    pub storage: &'a InstanceStorage,
    pub method: &'a str,
    pub args: &'a [Variant],
}

impl DispatchCall<'_> {
    /// Fail unless exactly `count` arguments were passed.
    pub fn expect_args(&self, count: usize) -> GroveResult<()> {
        let code = match self.args.len() {
            n if n > count => CallErrorCode::TooManyArguments,
            n if n < count => CallErrorCode::TooFewArguments,
            _ => return Ok(()),
        };
        Err(GroveError::CallFailed {
            method: format!("{}.{}", self.storage.class_name(), self.method),
            error: CallError {
                code,
                argument: 0,
                expected: count as u32,
            },
        })
    }

    /// Decode argument `index`.
    pub fn arg<T: FromVariant>(&self, index: usize) -> GroveResult<T> {
        match self.args.get(index) {
            Some(value) => T::from_variant(value).map_err(|e| match e {
                GroveError::TypeMismatch { expected, .. } => GroveError::CallFailed {
                    method: format!("{}.{}", self.storage.class_name(), self.method),
                    error: CallError {
                        code: CallErrorCode::InvalidArgument,
                        argument: index as i32,
                        expected: expected.tag(),
                    },
                },
                other => other,
            }),
            None => {
                self.expect_args(index + 1)?;
                Err(GroveError::NullObject)
            }
        }
    }

    pub fn bind<T: 'static>(&self) -> GroveResult<InstanceRef<'_, T>> {
        self.storage.read::<T>(self.instance_id)
    }

    pub fn bind_mut<T: 'static>(&self) -> GroveResult<InstanceMut<'_, T>> {
        self.storage.write::<T>(self.instance_id)
    }
}

pub type MethodThunk = fn(&DispatchCall<'_>) -> GroveResult<Variant>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FuncKind {
    /// `#[func]`: registered with the engine, callable by name.
    Func,
    /// `#[vfunc]`: override of an engine virtual.
    Virtual,
}

/// One host method of an extension class.
#[derive(Clone, Debug)]
pub struct FuncInfo {
    pub name: &'static str,
    pub kind: FuncKind,
    pub flags: u32,
    pub thunk: MethodThunk,
    pub args: Vec<PropertyInfo>,
    pub ret: Option<PropertyInfo>,
}

/// Per-class method table.
#[derive(Clone, Debug, Default)]
pub struct DispatchTable {
    entries: HashMap<&'static str, Arc<FuncInfo>>,
}

impl DispatchTable {
    /// Own methods on top of the inherited table, if any.
    pub fn build(funcs: impl IntoIterator<Item = FuncInfo>, inherited: Option<&DispatchTable>) -> Self {
        let mut entries = inherited.map(|t| t.entries.clone()).unwrap_or_default();
        for func in funcs {
            if let Some(prev) = entries.insert(func.name, Arc::new(func)) {
                log::debug!("`{}` overrides an inherited method", prev.name);
            }
        }
        DispatchTable { entries }
    }

    pub fn get(&self, method: &str) -> Option<&Arc<FuncInfo>> {
        self.entries.get(method)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Route an inbound call on extension instance `id`.
///
/// Without an override, the virtual-slot metadata of the engine classes
/// decides: optional slots fall back to the engine default, required ones
/// fail with `NotImplemented`.
pub fn dispatch_virtual(
    ctx: &Arc<EngineContext>,
    id: u64,
    method: &str,
    args: &[Variant],
) -> GroveResult<Outcome> {
    let storage = ctx
        .tracker()
        .instance(id)
        .ok_or(GroveError::StaleReference { id })?;
    let class = storage.class_name();
    let ext = ctx
        .registry()
        .extension(class)
        .ok_or_else(|| GroveError::UnknownClass(class.to_string()))?;

    if let Some(func) = ext.dispatch.get(method) {
        let call = DispatchCall {
            ctx,
            instance_id: id,
            storage: &storage,
            method,
            args,
        };
        return (func.thunk)(&call).map(Outcome::Returned);
    }

    match ctx.registry().virtual_slot(ctx.engine(), class, method) {
        Some(slot) if slot.required => Err(GroveError::NotImplemented {
            class: class.to_string(),
            method: method.to_string(),
        }),
        Some(_) => Ok(Outcome::Default),
        None => {
            log::trace!("{class}.{method}: no override, no slot");
            Ok(Outcome::Default)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop(_: &DispatchCall<'_>) -> GroveResult<Variant> {
        Ok(Variant::Nil)
    }

    fn func(name: &'static str, kind: FuncKind, thunk: MethodThunk) -> FuncInfo {
        FuncInfo {
            name,
            kind,
            flags: grove_ffi::METHOD_FLAGS_DEFAULT,
            thunk,
            args: Vec::new(),
            ret: None,
        }
    }

    #[test]
    fn tables_inherit_and_override() {
        let base = DispatchTable::build(
            [func("_ready", FuncKind::Virtual, noop), func("jump", FuncKind::Func, noop)],
            None,
        );
        let mut jump = func("jump", FuncKind::Func, noop);
        jump.flags |= grove_ffi::METHOD_FLAG_CONST;
        let child = DispatchTable::build([jump], Some(&base));
        assert_eq!(child.len(), 2);
        assert!(child.get("_ready").is_some());
        assert_ne!(child.get("jump").unwrap().flags & grove_ffi::METHOD_FLAG_CONST, 0);
        assert_eq!(base.get("jump").unwrap().flags & grove_ffi::METHOD_FLAG_CONST, 0);
        assert!(child.get("fly").is_none());
    }
}
