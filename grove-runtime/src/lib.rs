// grove-runtime: safe Rust layer over grove-ffi.
// All unsafe engine access is confined to this crate. Generated bindings and
// extension code only see the safe types exported here, plus an
// `Arc<EngineContext>` for everything that talks to the engine.

pub mod call;
pub mod callable;
pub mod codec;
pub mod context;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod export;
pub mod ffi_engine;
pub mod ffi_guard;
pub mod logging;
pub mod math;
pub mod object;
pub mod raw;
pub mod registry;
#[cfg(any(test, feature = "mock-engine"))]
pub mod testing;
pub mod tracker;
pub mod traits;
pub mod variant;

use std::sync::{Mutex, MutexGuard};

// Re-export the primary public API surface.
pub use call::{CallBridge, MethodInfo, GLOBAL_SCOPE};
pub use callable::{Callable, CustomCallable, IntoCallableFn, Signal};
pub use codec::{decode_bitfield, decode_enum, EngineBitfield, EngineEnum, FromVariant, ToVariant};
pub use context::EngineContext;
pub use dispatch::{DispatchCall, DispatchTable, FuncInfo, FuncKind, MethodThunk, Outcome, VirtualSlot};
pub use engine::{ClassInfo, Engine, EngineCall, LogLevel, MethodMeta};
pub use error::{check_ffi, GroveError, GroveResult};
pub use export::{
    ExportBuilder, ExportEntry, ExportHint, ExportList, ExportType, ExportTypeInfo, ExportedMember, PropertyInfo,
};
pub use ffi_engine::FfiEngine;
pub use ffi_guard::ffi_boundary;
pub use logging::EngineLogger;
pub use math::{
    Aabb, Basis, Color, Plane, Projection, Quaternion, Rect2, Rect2i, Rid, Transform2D, Transform3D, Vector2,
    Vector2i, Vector3, Vector3i, Vector4, Vector4i,
};
pub use object::{Base, Gd, ObjectRef, ObjectResolver, Transfer};
pub use registry::{
    ClassMethodsRegistration, ClassRegistration, ClassRegistry, EngineClassMeta, ExtensionClassInfo, InstanceInit,
};
pub use tracker::{InstanceMut, InstanceRef, ObjectTracker};
pub use traits::{GodotClass, HasParent, Memory, ValidHandle};
pub use variant::{
    Dictionary, NodePath, OpaquePtr, PackedArray, PackedByteArray, PackedColorArray, PackedFloat32Array,
    PackedFloat64Array, PackedInt32Array, PackedInt64Array, PackedStringArray, PackedVector2Array,
    PackedVector3Array, PackedVector4Array, StringName, Variant, VariantArray, VariantType,
};

// Used by `#[gclass]` expansions in downstream crates.
pub use inventory;

// Re-export FFI types needed by generated code in grove-bindings.
pub use grove_ffi::{MethodBindPtr, ObjectHandle};

/// Lock, ignoring poisoning. Every map guarded this way is updated in a
/// single insert or remove.
pub(crate) fn lock_or_recover<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}
