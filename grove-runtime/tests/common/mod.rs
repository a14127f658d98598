// Hand-written class markers standing in for generated bindings.
#![allow(dead_code)]

use std::sync::Arc;

use grove_runtime::testing::MockEngine;
use grove_runtime::{EngineContext, GodotClass, Memory};

macro_rules! engine_class {
    ($ty:ident, $memory:ident, [$($ancestor:literal),*]) => {
        pub struct $ty;

        impl GodotClass for $ty {
            const CLASS_NAME: &'static str = stringify!($ty);
            const MEMORY: Memory = Memory::$memory;
            const INSTANTIABLE: bool = true;

            fn inherits(class_name: &str) -> bool {
                class_name == stringify!($ty) $(|| class_name == $ancestor)*
            }
        }
    };
}

engine_class!(Object, Manual, []);
engine_class!(Node, Manual, ["Object"]);
engine_class!(Node3D, Manual, ["Node", "Object"]);
engine_class!(Resource, RefCounted, ["RefCounted", "Object"]);
engine_class!(Texture2D, RefCounted, ["Resource", "RefCounted", "Object"]);

pub fn setup() -> (MockEngine, Arc<EngineContext>) {
    let mock = MockEngine::with_core_classes();
    let ctx = EngineContext::new(Arc::new(mock.clone()));
    (mock, ctx)
}
