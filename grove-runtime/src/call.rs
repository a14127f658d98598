// Outbound call bridge.
//
// Every generated method carries a static `MethodInfo` with the ABI hash it
// was generated against. The bridge resolves `(class, method, hash)` to an
// engine method bind once and caches it; a hash the engine disagrees with is
// an `AbiMismatch` and is never cached.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use grove_ffi::{MethodBindPtr, ObjectHandle, METHOD_FLAG_STATIC, METHOD_FLAG_VARARG};

use crate::context::EngineContext;
use crate::engine::{Engine, EngineCall};
use crate::error::{GroveError, GroveResult};
use crate::object::{ObjectRef, Transfer};
use crate::variant::Variant;

/// Pseudo-class of global utility functions.
pub const GLOBAL_SCOPE: &str = "@GlobalScope";

/// Static description of one engine method, emitted by codegen.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MethodInfo {
    pub class: &'static str,
    pub name: &'static str,
    pub hash: u32,
    pub flags: u32,
    /// Ownership of an object returned by this method.
    pub return_transfer: Transfer,
}

impl MethodInfo {
    pub fn is_static(&self) -> bool {
        self.flags & METHOD_FLAG_STATIC != 0
    }

    pub fn is_vararg(&self) -> bool {
        self.flags & METHOD_FLAG_VARARG != 0
    }

    pub fn is_utility(&self) -> bool {
        self.class == GLOBAL_SCOPE
    }
}

type BindKey = (&'static str, &'static str, u32);

/// Method-bind cache.
#[derive(Default)]
pub struct CallBridge {
    binds: RwLock<HashMap<BindKey, MethodBindPtr>>,
}

impl CallBridge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve (and cache) the bind for `method`.
    pub fn resolve(&self, engine: &dyn Engine, method: &MethodInfo) -> GroveResult<MethodBindPtr> {
        let key = (method.class, method.name, method.hash);
        if let Some(bind) = self.read_cache(&key) {
            return Ok(bind);
        }
        let looked_up = if method.is_utility() {
            engine.utility_function(method.name, method.hash)
        } else {
            engine.method_bind(method.class, method.name, method.hash)
        };
        let bind = looked_up.map_err(|found| {
            log::error!(
                "{}.{}: generated against hash {}, engine reports {:?}",
                method.class,
                method.name,
                method.hash,
                found
            );
            GroveError::AbiMismatch {
                class: method.class.to_string(),
                method: method.name.to_string(),
                expected: method.hash,
                found,
            }
        })?;
        match self.binds.write() {
            Ok(mut binds) => {
                binds.insert(key, bind);
            }
            Err(poisoned) => {
                poisoned.into_inner().insert(key, bind);
            }
        }
        Ok(bind)
    }

    fn read_cache(&self, key: &BindKey) -> Option<MethodBindPtr> {
        match self.binds.read() {
            Ok(binds) => binds.get(key).copied(),
            Err(poisoned) => poisoned.into_inner().get(key).copied(),
        }
    }

    /// Call `method` on `receiver` (or statically when `None`).
    ///
    /// The receiver and every object reachable from `args` must still be
    /// alive; instance methods require a receiver.
    pub fn invoke(
        &self,
        ctx: &Arc<EngineContext>,
        method: &MethodInfo,
        receiver: Option<&ObjectRef>,
        args: &[Variant],
    ) -> GroveResult<Variant> {
        let receiver = match receiver {
            Some(obj) => obj.checked_handle()?,
            None if method.is_static() || method.is_utility() => ObjectHandle::NULL,
            None => return Err(GroveError::NullObject),
        };
        args.iter().try_for_each(Variant::ensure_live)?;
        let engine = ctx.engine();
        let bind = self.resolve(engine, method)?;
        let label = format!("{}.{}", method.class, method.name);
        engine.call(EngineCall {
            label: &label,
            bind,
            receiver,
            args,
            return_transfer: method.return_transfer,
            resolver: ctx,
        })
    }

    /// Resolve every method eagerly. Returns one error per mismatch; the
    /// binds that did resolve stay cached.
    pub fn verify<'a>(
        &self,
        engine: &dyn Engine,
        methods: impl IntoIterator<Item = &'a MethodInfo>,
    ) -> Vec<GroveError> {
        methods
            .into_iter()
            .filter_map(|m| self.resolve(engine, m).err())
            .collect()
    }

    pub fn cached_count(&self) -> usize {
        match self.binds.read() {
            Ok(binds) => binds.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    pub fn clear(&self) {
        match self.binds.write() {
            Ok(mut binds) => binds.clear(),
            Err(poisoned) => poisoned.into_inner().clear(),
        }
    }
}
