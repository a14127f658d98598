// Object references.
//
// `ObjectRef` is the untyped, shared reference to one engine object; the
// tracker keeps exactly one `ObjectCell` per live instance id, so every
// sighting of the same object yields the same cell. `Gd<T>` is a typed view
// over an `ObjectRef`.

use std::fmt;
use std::marker::PhantomData;
use std::ops::Deref;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock, Weak};

use grove_ffi::ObjectHandle;

use crate::call::MethodInfo;
use crate::codec::{FromVariant, ToVariant};
use crate::context::EngineContext;
use crate::error::{GroveError, GroveResult};
use crate::traits::{GodotClass, HasParent, Memory, ValidHandle};
use crate::tracker::{InstanceMut, InstanceRef, InstanceStorage};
use crate::variant::{Variant, VariantType};

/// Ownership convention for an object handle received from the engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transfer {
    /// The engine handed over one reference; the host adopts it.
    Owned,
    /// The engine keeps its reference; ref-counted objects get a new one.
    Borrowed,
}

/// Turns engine handles into canonical references. Implemented by the engine
/// context; engine implementations use it to decode object variants.
pub trait ObjectResolver {
    fn resolve(&self, handle: ObjectHandle, transfer: Transfer) -> GroveResult<ObjectRef>;
}

/// Per-identity state shared by every reference to one engine object.
pub struct ObjectCell {
    pub(crate) handle: ObjectHandle,
    pub(crate) class: String,
    pub(crate) refcounted: bool,
    /// Whether this cell owns one engine reference.
    pub(crate) holds_reference: bool,
    pub(crate) host_owned: AtomicBool,
    pub(crate) alive: AtomicBool,
    pub(crate) instance: OnceLock<Arc<InstanceStorage>>,
    pub(crate) ctx: Weak<EngineContext>,
}

impl Drop for ObjectCell {
    fn drop(&mut self) {
        if let Some(ctx) = self.ctx.upgrade() {
            ctx.tracker().release(ctx.engine(), self);
        }
    }
}

/// Shared reference to an engine object.
#[derive(Clone)]
pub struct ObjectRef(pub(crate) Arc<ObjectCell>);

impl ObjectRef {
    pub fn instance_id(&self) -> u64 {
        self.0.handle.id
    }

    pub fn handle(&self) -> ObjectHandle {
        self.0.handle
    }

    /// Most-derived class, resolved when the object was first seen.
    pub fn class_name(&self) -> &str {
        &self.0.class
    }

    pub fn is_refcounted(&self) -> bool {
        self.0.refcounted
    }

    pub fn is_alive(&self) -> bool {
        self.0.alive.load(Ordering::Acquire)
    }

    /// The handle, or `StaleReference` once the engine freed the object.
    pub fn checked_handle(&self) -> GroveResult<ObjectHandle> {
        if self.is_alive() {
            Ok(self.0.handle)
        } else {
            Err(GroveError::StaleReference { id: self.instance_id() })
        }
    }

    pub fn context(&self) -> GroveResult<Arc<EngineContext>> {
        self.0.ctx.upgrade().ok_or(GroveError::ShutDown)
    }

    /// Call an engine method on this object through the call bridge.
    pub fn call(&self, method: &MethodInfo, args: &[Variant]) -> GroveResult<Variant> {
        let ctx = self.context()?;
        ctx.bridge().invoke(&ctx, method, Some(self), args)
    }

    /// `true` if the object's class is `class` or derives from it.
    pub fn is_a(&self, class: &str) -> bool {
        match self.context() {
            Ok(ctx) => ctx.registry().is_a(ctx.engine(), &self.0.class, class),
            Err(_) => self.0.class == class,
        }
    }

    /// Typed view. Fails with `InvalidCast` if the object is not a `T`.
    pub fn cast<T: GodotClass>(&self) -> GroveResult<Gd<T>> {
        self.checked_handle()?;
        if self.is_a(T::CLASS_NAME) {
            Ok(Gd::from_object_unchecked(self.clone()))
        } else {
            Err(GroveError::InvalidCast {
                from: self.0.class.clone(),
                to: T::CLASS_NAME.to_string(),
            })
        }
    }

    pub(crate) fn instance(&self) -> Option<&Arc<InstanceStorage>> {
        self.0.instance.get()
    }
}

impl PartialEq for ObjectRef {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.instance_id() == other.instance_id()
    }
}

impl Eq for ObjectRef {}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectRef")
            .field("id", &self.instance_id())
            .field("class", &self.0.class)
            .field("alive", &self.is_alive())
            .finish()
    }
}

impl ValidHandle for ObjectRef {
    fn object_ref(&self) -> &ObjectRef {
        self
    }
}

impl ToVariant for ObjectRef {
    fn to_variant(&self) -> Variant {
        Variant::Object(self.clone())
    }
}

// ---------------------------------------------------------------------------
// Gd<T>
// ---------------------------------------------------------------------------

/// Typed reference to an engine object of class `T` (or a subclass).
///
/// Clones share one engine reference for ref-counted classes. Engine methods
/// come from the generated `…Ext` traits; inherited ones resolve through the
/// `Deref` chain.
#[repr(transparent)]
pub struct Gd<T: GodotClass> {
    obj: ObjectRef,
    _marker: PhantomData<fn() -> T>,
}

impl<T: GodotClass> Gd<T> {
    /// Checked conversion from an untyped reference.
    pub fn from_object(obj: ObjectRef) -> GroveResult<Self> {
        obj.cast::<T>()
    }

    pub(crate) fn from_object_unchecked(obj: ObjectRef) -> Self {
        Gd {
            obj,
            _marker: PhantomData,
        }
    }

    pub fn instance_id(&self) -> u64 {
        self.obj.instance_id()
    }

    pub fn is_instance_valid(&self) -> bool {
        self.obj.is_alive()
    }

    pub fn into_object(self) -> ObjectRef {
        self.obj
    }

    /// Downcast (or sidecast) checked against the object's runtime class.
    pub fn cast<U: GodotClass>(&self) -> GroveResult<Gd<U>> {
        self.obj.cast::<U>()
    }

    /// Free a manually-managed object the host created. Ref-counted objects
    /// and objects owned by the engine (scene tree nodes, singletons) are
    /// rejected with `NotOwner`.
    pub fn free(self) -> GroveResult<()> {
        let id = self.instance_id();
        self.obj.checked_handle()?;
        if T::MEMORY == Memory::RefCounted
            || self.obj.0.refcounted
            || !self.obj.0.host_owned.load(Ordering::Acquire)
        {
            return Err(GroveError::NotOwner { id });
        }
        let ctx = self.obj.context()?;
        ctx.tracker().free(ctx.engine(), &self.obj);
        Ok(())
    }

    fn storage(&self) -> GroveResult<&Arc<InstanceStorage>> {
        self.obj.checked_handle()?;
        self.obj.instance().ok_or_else(|| GroveError::InvalidCast {
            from: self.obj.0.class.clone(),
            to: T::CLASS_NAME.to_string(),
        })
    }

    /// Shared access to the extension instance behind this object.
    pub fn bind(&self) -> GroveResult<InstanceRef<'_, T>> {
        self.storage()?.read::<T>(self.instance_id())
    }

    /// Exclusive access to the extension instance. Fails with `AlreadyBound`
    /// while any other bind is active.
    pub fn bind_mut(&self) -> GroveResult<InstanceMut<'_, T>> {
        self.storage()?.write::<T>(self.instance_id())
    }
}

impl<T: HasParent> Gd<T> {
    /// Infallible upcast to the parent class. Zero-cost (same cell).
    pub fn upcast(self) -> Gd<T::Parent> {
        Gd::from_object_unchecked(self.obj)
    }
}

/// Blanket Deref: `Gd<Child>` auto-derefs to `Gd<Parent>`.
/// Sound because `Gd<T>` is `#[repr(transparent)]` over `ObjectRef`.
impl<T: HasParent> Deref for Gd<T> {
    type Target = Gd<T::Parent>;

    #[inline]
    fn deref(&self) -> &Gd<T::Parent> {
        unsafe { &*(self as *const Gd<T> as *const Gd<T::Parent>) }
    }
}

impl<T: GodotClass> Clone for Gd<T> {
    fn clone(&self) -> Self {
        Gd::from_object_unchecked(self.obj.clone())
    }
}

impl<T: GodotClass> PartialEq for Gd<T> {
    fn eq(&self, other: &Self) -> bool {
        self.obj == other.obj
    }
}

impl<T: GodotClass> Eq for Gd<T> {}

impl<T: GodotClass> fmt::Debug for Gd<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Gd<{}>#{}", T::CLASS_NAME, self.instance_id())
    }
}

impl<T: GodotClass> ValidHandle for Gd<T> {
    fn object_ref(&self) -> &ObjectRef {
        &self.obj
    }
}

impl<T: GodotClass> ToVariant for Gd<T> {
    fn to_variant(&self) -> Variant {
        Variant::Object(self.obj.clone())
    }
}

impl<T: GodotClass> FromVariant for Gd<T> {
    fn from_variant(variant: &Variant) -> GroveResult<Self> {
        match variant {
            Variant::Object(obj) => obj.cast::<T>(),
            Variant::Nil => Err(GroveError::NullObject),
            other => Err(GroveError::TypeMismatch {
                expected: VariantType::Object,
                found: other.get_type(),
            }),
        }
    }
}

impl FromVariant for ObjectRef {
    fn from_variant(variant: &Variant) -> GroveResult<Self> {
        match variant {
            Variant::Object(obj) => Ok(obj.clone()),
            Variant::Nil => Err(GroveError::NullObject),
            other => Err(GroveError::TypeMismatch {
                expected: VariantType::Object,
                found: other.get_type(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Base<T>
// ---------------------------------------------------------------------------

/// Non-owning link from an extension instance to its engine object.
///
/// Stored inside the instance itself, so it must not keep the object alive;
/// [`to_gd`](Self::to_gd) produces an owning handle on demand.
pub struct Base<T: GodotClass> {
    handle: ObjectHandle,
    ctx: Weak<EngineContext>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: GodotClass> Base<T> {
    pub(crate) fn new(handle: ObjectHandle, ctx: Weak<EngineContext>) -> Self {
        Base {
            handle,
            ctx,
            _marker: PhantomData,
        }
    }

    pub fn instance_id(&self) -> u64 {
        self.handle.id
    }

    /// Owning handle to the engine object.
    pub fn to_gd(&self) -> GroveResult<Gd<T>> {
        let ctx = self.ctx.upgrade().ok_or(GroveError::ShutDown)?;
        let obj = ctx.tracker().attach(&ctx, self.handle, Transfer::Borrowed)?;
        Ok(Gd::from_object_unchecked(obj))
    }
}

impl<T: GodotClass> fmt::Debug for Base<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Base<{}>#{}", T::CLASS_NAME, self.handle.id)
    }
}
