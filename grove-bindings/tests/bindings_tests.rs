use std::sync::{Arc, Mutex};

use grove_bindings::classes::{node, node_3d, Node, Node3D, Node3DExt};
use grove_bindings::manual::node::NodeTreeExt;
use grove_bindings::{ENGINE_CLASSES, METHOD_TABLES};
use grove_runtime::testing::MockEngine;
use grove_runtime::{EngineContext, GodotClass, Variant, VariantArray, Vector3};

fn setup() -> (MockEngine, Arc<EngineContext>) {
    let mock = MockEngine::with_core_classes();
    let ctx = EngineContext::new(Arc::new(mock.clone()));
    ctx.register_engine_classes(ENGINE_CLASSES);
    (mock, ctx)
}

#[test]
fn engine_classes_are_listed_bases_first() {
    let names: Vec<&str> = ENGINE_CLASSES.iter().map(|m| m.name).collect();
    let pos = |name: &str| names.iter().position(|n| *n == name).unwrap();
    assert!(pos("Object") < pos("Node"));
    assert!(pos("Node") < pos("Node3D"));
    assert!(pos("RefCounted") < pos("Resource"));
    assert!(Node3D::inherits("Object"));
    assert!(!Node::inherits("Node3D"));
}

#[test]
fn every_class_publishes_its_method_table() {
    assert_eq!(METHOD_TABLES.len(), ENGINE_CLASSES.len());
    let names: Vec<&str> = node_3d::METHODS.iter().map(|m| m.name).collect();
    assert!(names.contains(&"get_position"));
    assert!(names.contains(&"set_position"));
    assert!(node_3d::METHODS.iter().all(|m| m.class == "Node3D"));
}

#[test]
fn node3d_position_round_trips_through_the_property_accessor() {
    let (mock, ctx) = setup();
    let stored = Arc::new(Mutex::new(Variant::Vector3(Vector3::ZERO)));
    let slot = Arc::clone(&stored);
    mock.add_method("Node3D", "set_position", node_3d::methods::SET_POSITION.hash, move |call| {
        *slot.lock().unwrap() = call.args[0].clone();
        Ok(Variant::Nil)
    });
    let slot = Arc::clone(&stored);
    mock.add_method("Node3D", "get_position", node_3d::methods::GET_POSITION.hash, move |_| {
        Ok(slot.lock().unwrap().clone())
    });

    let node = Node3D::new(&ctx).unwrap();
    node.set_position(Vector3::new(1.0, 2.5, -3.0)).unwrap();
    assert_eq!(node.position().unwrap(), Vector3::new(1.0, 2.5, -3.0));
    assert_eq!(mock.calls(), vec!["Node3D.set_position", "Node3D.get_position"]);
}

#[test]
fn typed_children_skip_other_classes() {
    let (mock, ctx) = setup();
    let engine = mock.clone();
    mock.add_method("Node", "get_children", node::methods::GET_CHILDREN.hash, move |call| {
        let spatial = call.object(engine.spawn("Node3D"))?;
        let plain = call.object(engine.spawn("Node"))?;
        Ok(Variant::Array(VariantArray::from(vec![plain, Variant::Nil, spatial])))
    });

    let parent = Node::new(&ctx).unwrap();
    assert_eq!(parent.children_of::<Node>().unwrap().len(), 2);
    let spatial = parent.children_of::<Node3D>().unwrap();
    assert_eq!(spatial.len(), 1);
    assert!(parent.first_child_of::<Node3D>().unwrap().is_some());
}
