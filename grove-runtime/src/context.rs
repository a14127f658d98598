// Process-scoped engine context.
//
// Created once at load, handed to every engine callback through the callback
// table's `host_data`, and torn down by `shutdown`. There are no implicit
// globals: anything that needs the engine gets an `Arc<EngineContext>`.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use grove_ffi::ObjectHandle;

use crate::call::{CallBridge, MethodInfo};
use crate::callable::Callable;
use crate::dispatch::{self, Outcome};
use crate::engine::Engine;
use crate::error::{GroveError, GroveResult};
use crate::object::{Gd, ObjectRef, ObjectResolver, Transfer};
use crate::registry::{self, ClassRegistry, EngineClassMeta, InstanceInit};
use crate::tracker::ObjectTracker;
use crate::traits::GodotClass;
use crate::variant::Variant;

pub struct EngineContext {
    engine: Arc<dyn Engine>,
    tracker: ObjectTracker,
    registry: ClassRegistry,
    bridge: CallBridge,
}

impl EngineContext {
    pub fn new(engine: Arc<dyn Engine>) -> Arc<Self> {
        Arc::new(EngineContext {
            engine,
            tracker: ObjectTracker::new(),
            registry: ClassRegistry::new(),
            bridge: CallBridge::new(),
        })
    }

    pub fn engine(&self) -> &dyn Engine {
        self.engine.as_ref()
    }

    /// Shared handle to the engine, for the logger.
    pub fn engine_arc(&self) -> Arc<dyn Engine> {
        Arc::clone(&self.engine)
    }

    pub fn tracker(&self) -> &ObjectTracker {
        &self.tracker
    }

    pub fn registry(&self) -> &ClassRegistry {
        &self.registry
    }

    pub fn bridge(&self) -> &CallBridge {
        &self.bridge
    }

    pub fn register_engine_classes(&self, metas: &[EngineClassMeta]) {
        self.registry.register_engine_classes(metas);
    }

    /// Register every `#[gclass]` linked into the binary.
    pub fn register_extension_classes(&self) -> GroveResult<usize> {
        let (classes, methods) = registry::collected();
        self.registry.register_extensions(self.engine(), classes, methods)
    }

    /// Canonical reference for a handle received from the engine.
    pub fn attach(self: &Arc<Self>, handle: ObjectHandle, transfer: Transfer) -> GroveResult<ObjectRef> {
        self.tracker.attach(self, handle, transfer)
    }

    /// Instantiate `T`. Manual objects are owned by the host until freed;
    /// extension classes get their instance attached right away.
    pub fn construct<T: GodotClass>(self: &Arc<Self>) -> GroveResult<Gd<T>> {
        let handle = self.engine.construct(T::CLASS_NAME)?;
        if self.registry.extension(T::CLASS_NAME).is_some() && self.tracker.instance(handle.id).is_none() {
            self.create_instance(T::CLASS_NAME, handle)?;
        }
        let obj = self.tracker.attach(self, handle, Transfer::Owned)?;
        if !obj.is_refcounted() {
            obj.0.host_owned.store(true, Ordering::Release);
        }
        Ok(Gd::from_object_unchecked(obj))
    }

    /// Engine singleton by name, checked against `T`.
    pub fn singleton<T: GodotClass>(self: &Arc<Self>, name: &str) -> GroveResult<Gd<T>> {
        let handle = self
            .engine
            .singleton(name)
            .ok_or_else(|| GroveError::UnknownClass(name.to_string()))?;
        self.tracker.attach(self, handle, Transfer::Borrowed)?.cast::<T>()
    }

    /// Static method or utility function.
    pub fn call_static(self: &Arc<Self>, method: &MethodInfo, args: &[Variant]) -> GroveResult<Variant> {
        self.bridge.invoke(self, method, None, args)
    }

    /// Eager ABI check of `methods`; mismatches are returned, not fatal.
    pub fn verify_methods<'a>(&self, methods: impl IntoIterator<Item = &'a MethodInfo>) -> Vec<GroveError> {
        self.bridge.verify(self.engine(), methods)
    }

    pub fn call_callable(self: &Arc<Self>, callable: &Callable, args: &[Variant]) -> GroveResult<Variant> {
        args.iter().try_for_each(Variant::ensure_live)?;
        match callable {
            Callable::Custom(custom) => custom.invoke(args),
            _ => self.engine.call_callable(callable, args, self),
        }
    }

    // -----------------------------------------------------------------------
    // Inbound callbacks
    // -----------------------------------------------------------------------

    /// Attach a fresh instance of extension class `class` to `handle`.
    pub fn create_instance(self: &Arc<Self>, class: &str, handle: ObjectHandle) -> GroveResult<()> {
        let ext = self
            .registry
            .extension(class)
            .ok_or_else(|| GroveError::UnknownClass(class.to_string()))?;
        let data = (ext.info.create)(&InstanceInit { handle, ctx: self });
        self.tracker.bind_instance(handle.id, class, data)?;
        log::trace!("created {class} instance #{}", handle.id);
        Ok(())
    }

    /// The engine is freeing extension instance `id`.
    pub fn free_instance(&self, id: u64) {
        self.tracker.invalidate(id);
    }

    /// An engine object was freed engine-side.
    pub fn object_freed(&self, id: u64) {
        self.tracker.invalidate(id);
    }

    pub fn dispatch(self: &Arc<Self>, id: u64, method: &str, args: &[Variant]) -> GroveResult<Outcome> {
        dispatch::dispatch_virtual(self, id, method, args)
    }

    /// Read exported member `name`; `None` if the class has no such member.
    pub fn get_property(&self, id: u64, name: &str) -> GroveResult<Option<Variant>> {
        let storage = self.tracker.instance(id).ok_or(GroveError::StaleReference { id })?;
        let ext = self
            .registry
            .extension(storage.class_name())
            .ok_or_else(|| GroveError::UnknownClass(storage.class_name().to_string()))?;
        storage.with_ref(id, |data| (ext.info.get_property)(data, name))
    }

    /// Write exported member `name`. `Ok(false)` for unknown members.
    pub fn set_property(&self, id: u64, name: &str, value: &Variant) -> GroveResult<bool> {
        let storage = self.tracker.instance(id).ok_or(GroveError::StaleReference { id })?;
        let ext = self
            .registry
            .extension(storage.class_name())
            .ok_or_else(|| GroveError::UnknownClass(storage.class_name().to_string()))?;
        storage.with_mut(id, |data| (ext.info.set_property)(data, name, value))
    }

    /// Drop every instance, unregister extension classes, clear caches.
    pub fn shutdown(&self) {
        log::info!(
            "shutting down: {} instances, {} live objects",
            self.tracker.instance_count(),
            self.tracker.live_count()
        );
        self.tracker.clear();
        self.registry.unregister_extensions(self.engine());
        self.bridge.clear();
    }
}

impl ObjectResolver for Arc<EngineContext> {
    fn resolve(&self, handle: ObjectHandle, transfer: Transfer) -> GroveResult<ObjectRef> {
        self.tracker.attach(self, handle, transfer)
    }
}
