mod common;

use common::{setup, Node, Resource};
use grove_runtime::{Callable, GroveError, MethodInfo, Transfer, ValidHandle, Variant, VariantArray, GLOBAL_SCOPE};

const GET_NAME: MethodInfo = MethodInfo {
    class: "Node",
    name: "get_name",
    hash: 0x1111,
    flags: 0,
    return_transfer: Transfer::Borrowed,
};

fn method(class: &'static str, name: &'static str, hash: u32, return_transfer: Transfer) -> MethodInfo {
    MethodInfo {
        class,
        name,
        hash,
        flags: 0,
        return_transfer,
    }
}

#[test]
fn matching_hash_resolves_once_and_is_cached() {
    let (mock, ctx) = setup();
    mock.add_method("Node", "get_name", 0x1111, |_| Ok(Variant::String("Player".into())));
    let node = ctx.construct::<Node>().unwrap();

    let first = node.object_ref().call(&GET_NAME, &[]);
    let second = node.object_ref().call(&GET_NAME, &[]);
    assert_eq!(first.unwrap(), Variant::String("Player".into()));
    assert_eq!(second.unwrap(), Variant::String("Player".into()));
    assert_eq!(ctx.bridge().cached_count(), 1);
    assert_eq!(mock.calls(), vec!["Node.get_name", "Node.get_name"]);
}

#[test]
fn hash_mismatch_is_reported_and_not_cached() {
    let (mock, ctx) = setup();
    mock.add_method("Node", "get_name", 0x2222, |_| Ok(Variant::Nil));
    let node = ctx.construct::<Node>().unwrap();

    let err = node.object_ref().call(&GET_NAME, &[]).unwrap_err();
    assert!(matches!(
        err,
        GroveError::AbiMismatch { expected: 0x1111, found: Some(0x2222), .. }
    ));
    assert_eq!(ctx.bridge().cached_count(), 0);
    assert!(mock.calls().is_empty());
}

#[test]
fn missing_method_is_an_abi_mismatch_without_live_hash() {
    let (_mock, ctx) = setup();
    let node = ctx.construct::<Node>().unwrap();
    let err = node.object_ref().call(&GET_NAME, &[]).unwrap_err();
    assert!(matches!(err, GroveError::AbiMismatch { found: None, .. }));
}

#[test]
fn verify_collects_every_mismatch() {
    let (mock, ctx) = setup();
    mock.add_method("Node", "get_name", 0x1111, |_| Ok(Variant::Nil));
    mock.add_method("Node", "queue_free", 9, |_| Ok(Variant::Nil));
    let stale = method("Node", "queue_free", 8, Transfer::Borrowed);
    let gone = method("Node", "get_tree_string", 3, Transfer::Borrowed);
    let errors = ctx.verify_methods([&GET_NAME, &stale, &gone]);
    assert_eq!(errors.len(), 2);
}

#[test]
fn utility_functions_have_no_receiver() {
    let (mock, ctx) = setup();
    mock.add_utility("absi", 77, |call| {
        assert!(call.receiver.is_null());
        match call.args {
            [Variant::Int(i)] => Ok(Variant::Int(i.abs())),
            _ => Ok(Variant::Nil),
        }
    });
    let absi = method(GLOBAL_SCOPE, "absi", 77, Transfer::Borrowed);
    assert_eq!(ctx.call_static(&absi, &[Variant::Int(-4)]).unwrap(), Variant::Int(4));
}

#[test]
fn instance_methods_without_receiver_fail() {
    let (mock, ctx) = setup();
    mock.add_method("Node", "get_name", 0x1111, |_| Ok(Variant::Nil));
    assert!(matches!(ctx.call_static(&GET_NAME, &[]), Err(GroveError::NullObject)));
}

#[test]
fn calls_on_freed_objects_never_reach_the_engine() {
    let (mock, ctx) = setup();
    mock.add_method("Node", "get_name", 0x1111, |_| Ok(Variant::Nil));
    let node = ctx.construct::<Node>().unwrap();
    let id = node.instance_id();
    mock.free_object(id);
    ctx.object_freed(id);

    assert!(matches!(
        node.object_ref().call(&GET_NAME, &[]),
        Err(GroveError::StaleReference { .. })
    ));
    assert!(mock.calls().is_empty());
}

#[test]
fn freed_objects_in_arguments_never_reach_the_engine() {
    let (mock, ctx) = setup();
    mock.add_method("Node", "add_child", 0x3333, |_| Ok(Variant::Nil));
    mock.add_method("Node", "get_child_count", 1, |_| Ok(Variant::Int(0)));
    let add_child = method("Node", "add_child", 0x3333, Transfer::Borrowed);
    let parent = ctx.construct::<Node>().unwrap();
    let child = ctx.construct::<Node>().unwrap();
    let child_id = child.instance_id();
    mock.free_object(child_id);
    ctx.object_freed(child_id);

    let direct = Variant::Object(child.object_ref().clone());
    assert!(matches!(
        parent.object_ref().call(&add_child, &[direct.clone()]),
        Err(GroveError::StaleReference { id }) if id == child_id
    ));
    let nested = Variant::Array(VariantArray::from(vec![Variant::Int(1), direct.clone()]));
    assert!(matches!(
        parent.object_ref().call(&add_child, &[nested]),
        Err(GroveError::StaleReference { .. })
    ));
    let count = Callable::from_method(parent.object_ref().clone(), "get_child_count");
    assert!(matches!(
        ctx.call_callable(&count, &[direct]),
        Err(GroveError::StaleReference { .. })
    ));
    assert!(mock.calls().is_empty());
}

#[test]
fn owned_object_returns_are_adopted() {
    let (mock, ctx) = setup();
    let engine = mock.clone();
    mock.add_method("ResourceLoader", "load", 5, move |call| {
        let handle = engine.spawn("Resource");
        call.object(handle)
    });
    let load = MethodInfo {
        flags: grove_ffi::METHOD_FLAG_STATIC,
        ..method("ResourceLoader", "load", 5, Transfer::Owned)
    };
    let value = ctx.call_static(&load, &[]).unwrap();
    let res = match value {
        Variant::Object(obj) => obj.cast::<Resource>().unwrap(),
        other => panic!("expected an object, got {other:?}"),
    };
    let id = res.instance_id();
    assert_eq!(mock.refcount(id), Some(1));
    drop(res);
    assert_eq!(mock.destroy_count(id), 1);
}

#[test]
fn method_callables_route_through_the_engine() {
    let (mock, ctx) = setup();
    mock.add_method("Node", "get_child_count", 1, |_| Ok(Variant::Int(3)));
    let node = ctx.construct::<Node>().unwrap();
    let callable = Callable::from_method(node.object_ref().clone(), "get_child_count");
    assert_eq!(callable.callv(&[]).unwrap(), Variant::Int(3));
    assert_eq!(ctx.call_callable(&callable, &[]).unwrap(), Variant::Int(3));
}

#[test]
fn custom_callables_run_locally() {
    let (_mock, ctx) = setup();
    let sum = Callable::from_closure("sum", |a: i64, b: i64| a + b);
    assert_eq!(
        ctx.call_callable(&sum, &[Variant::Int(2), Variant::Int(5)]).unwrap(),
        Variant::Int(7)
    );
    assert!(sum.callv(&[Variant::Int(2)]).is_err());
}
