// In-process engine for tests.
//
// Objects are plain records keyed by instance id (the handle pointer is the
// id itself, never dereferenced). Methods are host closures registered per
// `(class, name, hash)`. Every registration and print is recorded so tests
// can assert on what the runtime told the engine.

use std::collections::HashMap;
use std::ffi::c_void;
use std::sync::{Arc, Mutex, MutexGuard};

use grove_ffi::{CallError, CallErrorCode, GroveErrorCode, MethodBindPtr, ObjectHandle};

use crate::call::GLOBAL_SCOPE;
use crate::callable::Callable;
use crate::engine::{ClassInfo, Engine, EngineCall, LogLevel, MethodMeta};
use crate::error::{GroveError, GroveResult};
use crate::export::PropertyInfo;
use crate::lock_or_recover;
use crate::object::{ObjectResolver, Transfer};
use crate::variant::Variant;

/// What a mock method sees of one call.
pub struct MockCall<'a> {
    pub receiver: ObjectHandle,
    pub args: &'a [Variant],
    resolver: &'a dyn ObjectResolver,
    transfer: Transfer,
}

impl MockCall<'_> {
    /// Return an engine object with the method's ownership convention.
    pub fn object(&self, handle: ObjectHandle) -> GroveResult<Variant> {
        Ok(Variant::Object(self.resolver.resolve(handle, self.transfer)?))
    }
}

pub type MockHandler = Arc<dyn Fn(&MockCall<'_>) -> GroveResult<Variant> + Send + Sync>;

/// Everything the runtime registered, in order.
#[derive(Clone, Debug, PartialEq)]
pub enum MockEvent {
    Class(ClassInfo),
    Method { class: String, method: MethodMeta },
    Property { class: String, property: PropertyInfo },
    Group { class: String, name: String, prefix: String, subgroup: bool },
    Unregister(String),
}

struct MockClass {
    parent: Option<String>,
    refcounted: bool,
}

struct MockObject {
    class: String,
    refcount: u32,
}

struct MockMethod {
    class: String,
    name: String,
    hash: u32,
    handler: MockHandler,
}

#[derive(Default)]
struct MockState {
    classes: HashMap<String, MockClass>,
    objects: HashMap<u64, MockObject>,
    next_id: u64,
    methods: Vec<MockMethod>,
    singletons: HashMap<String, ObjectHandle>,
    destroyed: Vec<u64>,
    prints: Vec<(LogLevel, String)>,
    events: Vec<MockEvent>,
    calls: Vec<String>,
    rejected_methods: Vec<String>,
}

#[derive(Clone, Default)]
pub struct MockEngine {
    state: Arc<Mutex<MockState>>,
}

fn handle(id: u64) -> ObjectHandle {
    ObjectHandle {
        id,
        ptr: id as *mut c_void,
    }
}

fn call_error(code: CallErrorCode) -> CallError {
    CallError { code, ..CallError::OK }
}

impl MockEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// A mock that knows the usual engine class tree.
    pub fn with_core_classes() -> Self {
        let mock = Self::new();
        for (class, parent) in [
            ("Object", None),
            ("RefCounted", Some("Object")),
            ("Resource", Some("RefCounted")),
            ("Texture2D", Some("Resource")),
            ("Node", Some("Object")),
            ("Node2D", Some("Node")),
            ("Node3D", Some("Node")),
            ("Camera3D", Some("Node3D")),
        ] {
            mock.add_class(class, parent);
        }
        mock
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        lock_or_recover(&self.state)
    }

    /// Add an engine class. `RefCounted` and its descendants are ref-counted.
    pub fn add_class(&self, class: &str, parent: Option<&str>) {
        let mut state = self.state();
        let refcounted = class == "RefCounted"
            || parent
                .and_then(|p| state.classes.get(p))
                .is_some_and(|p| p.refcounted);
        state.classes.insert(
            class.to_string(),
            MockClass {
                parent: parent.map(str::to_string),
                refcounted,
            },
        );
    }

    pub fn add_method(
        &self,
        class: &str,
        name: &str,
        hash: u32,
        handler: impl Fn(&MockCall<'_>) -> GroveResult<Variant> + Send + Sync + 'static,
    ) {
        self.state().methods.push(MockMethod {
            class: class.to_string(),
            name: name.to_string(),
            hash,
            handler: Arc::new(handler),
        });
    }

    pub fn add_utility(
        &self,
        name: &str,
        hash: u32,
        handler: impl Fn(&MockCall<'_>) -> GroveResult<Variant> + Send + Sync + 'static,
    ) {
        self.add_method(GLOBAL_SCOPE, name, hash, handler);
    }

    /// Create an object held by the engine itself. Ref-counted objects start
    /// with the engine's own reference.
    pub fn spawn(&self, class: &str) -> ObjectHandle {
        let mut state = self.state();
        state.next_id += 1;
        let id = state.next_id;
        let refcounted = state.classes.get(class).is_some_and(|c| c.refcounted);
        state.objects.insert(
            id,
            MockObject {
                class: class.to_string(),
                refcount: u32::from(refcounted),
            },
        );
        handle(id)
    }

    pub fn add_singleton(&self, name: &str, class: &str) -> ObjectHandle {
        let obj = self.spawn(class);
        self.state().singletons.insert(name.to_string(), obj);
        obj
    }

    /// Engine-side free; the runtime has to be told separately.
    pub fn free_object(&self, id: u64) {
        let mut state = self.state();
        if state.objects.remove(&id).is_some() {
            state.destroyed.push(id);
        }
    }

    /// Make `register_method` fail for methods named `name`.
    pub fn reject_method(&self, name: &str) {
        self.state().rejected_methods.push(name.to_string());
    }

    pub fn is_alive(&self, id: u64) -> bool {
        self.state().objects.contains_key(&id)
    }

    pub fn refcount(&self, id: u64) -> Option<u32> {
        self.state().objects.get(&id).map(|o| o.refcount)
    }

    /// How many times `id` was destroyed.
    pub fn destroy_count(&self, id: u64) -> usize {
        self.state().destroyed.iter().filter(|d| **d == id).count()
    }

    pub fn object_count(&self) -> usize {
        self.state().objects.len()
    }

    pub fn events(&self) -> Vec<MockEvent> {
        self.state().events.clone()
    }

    pub fn prints(&self) -> Vec<(LogLevel, String)> {
        self.state().prints.clone()
    }

    /// Labels of every outbound call, in order.
    pub fn calls(&self) -> Vec<String> {
        self.state().calls.clone()
    }

    fn find_bind(&self, class: &str, name: &str, hash: u32) -> Result<MethodBindPtr, Option<u32>> {
        let state = self.state();
        let (index, method) = state
            .methods
            .iter()
            .enumerate()
            .find(|(_, m)| m.class == class && m.name == name)
            .ok_or(None)?;
        if method.hash != hash {
            return Err(Some(method.hash));
        }
        Ok(MethodBindPtr((index + 1) as *const c_void))
    }

    /// Nearest handler named `name` on `class` or its ancestors.
    fn find_by_name(&self, class: &str, name: &str) -> Option<MockHandler> {
        let state = self.state();
        let mut current = Some(class.to_string());
        while let Some(class) = current {
            let found = state
                .methods
                .iter()
                .find(|m| m.class == class && m.name == name)
                .map(|m| Arc::clone(&m.handler));
            if found.is_some() {
                return found;
            }
            current = state.classes.get(&class).and_then(|c| c.parent.clone());
        }
        None
    }

    fn record(&self, event: MockEvent) {
        self.state().events.push(event);
    }
}

impl Engine for MockEngine {
    fn print(&self, level: LogLevel, message: &str) {
        self.state().prints.push((level, message.to_string()));
    }

    fn singleton(&self, name: &str) -> Option<ObjectHandle> {
        self.state().singletons.get(name).copied()
    }

    fn object_class(&self, object: ObjectHandle) -> GroveResult<String> {
        self.state()
            .objects
            .get(&object.id)
            .map(|o| o.class.clone())
            .ok_or(GroveError::from(GroveErrorCode::InvalidObject))
    }

    fn class_parent(&self, class: &str) -> GroveResult<Option<String>> {
        self.state()
            .classes
            .get(class)
            .map(|c| c.parent.clone())
            .ok_or(GroveError::Engine(GroveErrorCode::UnknownClass))
    }

    fn construct(&self, class: &str) -> GroveResult<ObjectHandle> {
        if !self.state().classes.contains_key(class) {
            return Err(GroveError::Engine(GroveErrorCode::UnknownClass));
        }
        Ok(self.spawn(class))
    }

    fn destroy(&self, object: ObjectHandle) {
        let mut state = self.state();
        state.objects.remove(&object.id);
        state.destroyed.push(object.id);
    }

    fn reference(&self, object: ObjectHandle) {
        if let Some(obj) = self.state().objects.get_mut(&object.id) {
            obj.refcount += 1;
        }
    }

    fn unreference(&self, object: ObjectHandle) -> bool {
        match self.state().objects.get_mut(&object.id) {
            Some(obj) => {
                obj.refcount = obj.refcount.saturating_sub(1);
                obj.refcount == 0
            }
            None => false,
        }
    }

    fn method_bind(&self, class: &str, method: &str, hash: u32) -> Result<MethodBindPtr, Option<u32>> {
        self.find_bind(class, method, hash)
    }

    fn utility_function(&self, name: &str, hash: u32) -> Result<MethodBindPtr, Option<u32>> {
        self.find_bind(GLOBAL_SCOPE, name, hash)
    }

    fn call(&self, call: EngineCall<'_>) -> GroveResult<Variant> {
        let handler = {
            let mut state = self.state();
            state.calls.push(call.label.to_string());
            if !call.receiver.is_null() && !state.objects.contains_key(&call.receiver.id) {
                return Err(GroveError::CallFailed {
                    method: call.label.to_string(),
                    error: call_error(CallErrorCode::InstanceIsNull),
                });
            }
            (call.bind.0 as usize)
                .checked_sub(1)
                .and_then(|index| state.methods.get(index))
                .map(|m| Arc::clone(&m.handler))
        };
        let handler = handler.ok_or_else(|| GroveError::CallFailed {
            method: call.label.to_string(),
            error: call_error(CallErrorCode::InvalidMethod),
        })?;
        handler(&MockCall {
            receiver: call.receiver,
            args: call.args,
            resolver: call.resolver,
            transfer: call.return_transfer,
        })
    }

    fn call_callable(
        &self,
        callable: &Callable,
        args: &[Variant],
        resolver: &dyn ObjectResolver,
    ) -> GroveResult<Variant> {
        match callable {
            Callable::Custom(custom) => custom.invoke(args),
            Callable::Null => Err(GroveError::NullObject),
            Callable::Method { object, method } => {
                let receiver = object.checked_handle()?;
                let handler = self
                    .find_by_name(object.class_name(), method.as_str())
                    .ok_or_else(|| GroveError::CallFailed {
                        method: method.to_string(),
                        error: call_error(CallErrorCode::InvalidMethod),
                    })?;
                handler(&MockCall {
                    receiver,
                    args,
                    resolver,
                    transfer: Transfer::Borrowed,
                })
            }
        }
    }

    fn register_class(&self, info: &ClassInfo) -> GroveResult<()> {
        if self.state().classes.contains_key(&info.name) {
            return Err(GroveError::Engine(GroveErrorCode::AlreadyRegistered));
        }
        self.add_class(&info.name, Some(&info.parent));
        self.record(MockEvent::Class(info.clone()));
        Ok(())
    }

    fn register_method(&self, class: &str, method: &MethodMeta) -> GroveResult<()> {
        if self.state().rejected_methods.contains(&method.name) {
            return Err(GroveError::Engine(GroveErrorCode::InvalidArgument));
        }
        self.record(MockEvent::Method {
            class: class.to_string(),
            method: method.clone(),
        });
        Ok(())
    }

    fn register_property(&self, class: &str, property: &PropertyInfo) -> GroveResult<()> {
        self.record(MockEvent::Property {
            class: class.to_string(),
            property: property.clone(),
        });
        Ok(())
    }

    fn register_group(&self, class: &str, name: &str, prefix: &str, subgroup: bool) -> GroveResult<()> {
        self.record(MockEvent::Group {
            class: class.to_string(),
            name: name.to_string(),
            prefix: prefix.to_string(),
            subgroup,
        });
        Ok(())
    }

    fn unregister_class(&self, class: &str) -> GroveResult<()> {
        if self.state().classes.remove(class).is_none() {
            return Err(GroveError::Engine(GroveErrorCode::UnknownClass));
        }
        self.record(MockEvent::Unregister(class.to_string()));
        Ok(())
    }
}
