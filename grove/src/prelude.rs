// Prelude: one-import access to the most commonly used grove types.
//
// Usage: `use grove::prelude::*;`

// Core runtime types
pub use grove_runtime::{
    Base, Callable, Dictionary, EngineContext, ExportType, FromVariant, Gd, GodotClass, GroveError, GroveResult,
    InstanceInit, NodePath, ObjectRef, Signal, StringName, ToVariant, ValidHandle, Variant, VariantArray,
};

// Packed arrays
pub use grove_runtime::{
    PackedByteArray, PackedColorArray, PackedFloat32Array, PackedFloat64Array, PackedInt32Array, PackedInt64Array,
    PackedStringArray, PackedVector2Array, PackedVector3Array,
};

// Engine math types
pub use grove_runtime::{
    Aabb, Basis, Color, Plane, Quaternion, Rect2, Rect2i, Rid, Transform2D, Transform3D, Vector2, Vector2i, Vector3,
    Vector3i, Vector4,
};

// Proc macros
pub use grove_macros::{ExportEnum, gclass, gclass_impl};

// Engine classes and their method traits
pub use grove_bindings::classes::*;
pub use grove_bindings::manual::node::NodeTreeExt;
