// Marker traits for engine classes. Codegen generates impls for every engine
// class in the descriptor; `#[gclass]` generates them for extension classes.

use crate::object::ObjectRef;

/// How the engine manages an object's lifetime.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Memory {
    /// Shared ownership through the engine reference count.
    RefCounted,
    /// Owned by whoever created it; freed explicitly.
    Manual,
}

/// Implemented for every engine and extension class.
pub trait GodotClass: 'static {
    const CLASS_NAME: &'static str;
    const MEMORY: Memory;
    const INSTANTIABLE: bool;

    /// `true` if `Self` is `class_name` or derives from it.
    fn inherits(class_name: &str) -> bool;
}

/// Declares the immediate parent class.
///
/// Enables the blanket `Deref` on `Gd<T>` so inherited methods resolve
/// through the Deref chain instead of being flattened into each child's Ext
/// trait. The root class `Object` does NOT implement this trait.
pub trait HasParent: GodotClass {
    type Parent: GodotClass;
}

/// Types holding an object reference. Codegen Ext traits use this as their
/// supertrait; liveness is checked on every call.
pub trait ValidHandle {
    fn object_ref(&self) -> &ObjectRef;
}
