mod common;

use std::any::Any;
use std::collections::HashMap;

use common::setup;
use grove_runtime::dispatch::VirtualSlot;
use grove_runtime::testing::MockEvent;
use grove_runtime::{
    Base, ClassInfo, DispatchCall, EngineClassMeta, ExportBuilder, ExportHint, ExportList, ExportType,
    ExtensionClassInfo, FromVariant, FuncInfo, FuncKind, GodotClass, GroveError, GroveResult, InstanceInit,
    Memory, Outcome, ToVariant, Variant,
};

struct Player {
    base: Base<Player>,
    hp: i64,
    speed: f64,
}

impl GodotClass for Player {
    const CLASS_NAME: &'static str = "Player";
    const MEMORY: Memory = Memory::Manual;
    const INSTANTIABLE: bool = true;

    fn inherits(class_name: &str) -> bool {
        matches!(class_name, "Player" | "Node" | "Object")
    }
}

fn create_player(init: &InstanceInit<'_>) -> Box<dyn Any + Send + Sync> {
    Box::new(Player {
        base: init.base(),
        hp: 100,
        speed: 1.5,
    })
}

fn player_exports() -> GroveResult<ExportList> {
    ExportBuilder::new("Player")
        .member("hp", i64::export_info(), Some(ExportHint::range(0.0, 100.0)))
        .group("Movement", "move_")
        .member("speed", f64::export_info(), None)
        .build()
}

fn get_player(data: &(dyn Any + Send + Sync), name: &str) -> Option<Variant> {
    let player = data.downcast_ref::<Player>()?;
    match name {
        "hp" => Some(player.hp.to_variant()),
        "speed" => Some(player.speed.to_variant()),
        _ => None,
    }
}

fn set_player(data: &mut (dyn Any + Send + Sync), name: &str, value: &Variant) -> GroveResult<bool> {
    let Some(player) = data.downcast_mut::<Player>() else {
        return Ok(false);
    };
    match name {
        "hp" => player.hp = i64::from_variant(value)?,
        "speed" => player.speed = f64::from_variant(value)?,
        _ => return Ok(false),
    }
    Ok(true)
}

fn take_damage(call: &DispatchCall<'_>) -> GroveResult<Variant> {
    call.expect_args(1)?;
    let amount: i64 = call.arg(0)?;
    let mut player = call.bind_mut::<Player>()?;
    player.hp -= amount;
    Ok(player.hp.to_variant())
}

fn ready(call: &DispatchCall<'_>) -> GroveResult<Variant> {
    call.bind_mut::<Player>()?.speed = 3.0;
    Ok(Variant::Nil)
}

fn player_info() -> ExtensionClassInfo {
    ExtensionClassInfo {
        name: "Player",
        base: "Node",
        create: create_player,
        exports: player_exports,
        get_property: get_player,
        set_property: set_player,
    }
}

fn player_methods() -> Vec<FuncInfo> {
    vec![
        FuncInfo {
            name: "take_damage",
            kind: FuncKind::Func,
            flags: grove_ffi::METHOD_FLAGS_DEFAULT,
            thunk: take_damage,
            args: vec![grove_runtime::PropertyInfo::of::<i64>("amount")],
            ret: Some(grove_runtime::PropertyInfo::of::<i64>("")),
        },
        FuncInfo {
            name: "_ready",
            kind: FuncKind::Virtual,
            flags: grove_ffi::METHOD_FLAGS_DEFAULT | grove_ffi::METHOD_FLAG_VIRTUAL,
            thunk: ready,
            args: Vec::new(),
            ret: None,
        },
    ]
}

fn boss_info() -> ExtensionClassInfo {
    ExtensionClassInfo {
        name: "Boss",
        base: "Player",
        ..player_info()
    }
}

const NODE_VIRTUALS: &[VirtualSlot] = &[
    VirtualSlot {
        name: "_process",
        hash: 1,
        required: false,
        returns_value: false,
    },
    VirtualSlot {
        name: "_get_configuration_warnings",
        hash: 2,
        required: true,
        returns_value: true,
    },
];

const ENGINE_CLASSES: &[EngineClassMeta] = &[
    EngineClassMeta {
        name: "Object",
        parent: None,
        refcounted: false,
        instantiable: true,
        virtuals: &[],
    },
    EngineClassMeta {
        name: "Node",
        parent: Some("Object"),
        refcounted: false,
        instantiable: true,
        virtuals: NODE_VIRTUALS,
    },
];

fn register(ctx: &grove_runtime::EngineContext, classes: Vec<ExtensionClassInfo>) -> GroveResult<usize> {
    ctx.register_engine_classes(ENGINE_CLASSES);
    let methods = HashMap::from([("Player", player_methods())]);
    ctx.registry().register_extensions(ctx.engine(), classes, methods)
}

#[test]
fn registration_announces_class_methods_and_exports_in_order() {
    let (mock, ctx) = setup();
    assert_eq!(register(&ctx, vec![player_info()]).unwrap(), 1);

    let events = mock.events();
    assert_eq!(
        events[0],
        MockEvent::Class(ClassInfo {
            name: "Player".into(),
            parent: "Node".into(),
            is_abstract: false,
            is_exposed: true,
        })
    );
    // Virtual overrides are dispatched, not registered.
    assert!(matches!(&events[1], MockEvent::Method { method, .. } if method.name == "take_damage"));
    assert!(matches!(&events[2], MockEvent::Property { property, .. } if property.name == "hp" && property.hint_string == "0,100"));
    assert!(matches!(&events[3], MockEvent::Group { name, prefix, subgroup: false, .. } if name == "Movement" && prefix == "move_"));
    assert!(matches!(&events[4], MockEvent::Property { property, .. } if property.name == "speed"));
    assert_eq!(events.len(), 5);
    assert_eq!(ctx.registry().extension_names(), vec!["Player"]);
}

#[test]
fn bases_register_before_subclasses() {
    let (mock, ctx) = setup();
    assert_eq!(register(&ctx, vec![boss_info(), player_info()]).unwrap(), 2);
    let classes: Vec<String> = mock
        .events()
        .into_iter()
        .filter_map(|e| match e {
            MockEvent::Class(info) => Some(info.name),
            _ => None,
        })
        .collect();
    assert_eq!(classes, vec!["Player", "Boss"]);

    let boss = ctx.registry().extension("Boss").unwrap();
    assert!(boss.dispatch.get("take_damage").is_some());
    assert!(ctx.registry().is_a(ctx.engine(), "Boss", "Node"));
}

#[test]
fn unknown_base_and_duplicates_are_rejected() {
    let (_mock, ctx) = setup();
    let orphan = ExtensionClassInfo {
        name: "Orphan",
        base: "NoSuchClass",
        ..player_info()
    };
    assert!(matches!(register(&ctx, vec![orphan]), Err(GroveError::Registration(_))));

    register(&ctx, vec![player_info()]).unwrap();
    assert!(matches!(register(&ctx, vec![player_info()]), Err(GroveError::Registration(_))));
}

#[test]
fn inheritance_cycles_are_rejected() {
    let (_mock, ctx) = setup();
    let a = ExtensionClassInfo {
        name: "A",
        base: "B",
        ..player_info()
    };
    let b = ExtensionClassInfo {
        name: "B",
        base: "A",
        ..player_info()
    };
    let err = register(&ctx, vec![a, b]).unwrap_err();
    assert!(err.to_string().contains("cycle"));
}

#[test]
fn invalid_exports_fail_registration() {
    fn bad_exports() -> GroveResult<ExportList> {
        ExportBuilder::new("Broken")
            .member("label", String::export_info(), Some(ExportHint::range(0.0, 1.0)))
            .build()
    }
    let (mock, ctx) = setup();
    let broken = ExtensionClassInfo {
        name: "Broken",
        exports: bad_exports,
        ..player_info()
    };
    assert!(matches!(register(&ctx, vec![broken]), Err(GroveError::HintValidation { .. })));
    assert!(mock.events().is_empty());
}

#[test]
fn rejected_methods_roll_the_class_back() {
    let (mock, ctx) = setup();
    mock.reject_method("take_damage");
    assert!(matches!(
        register(&ctx, vec![player_info()]),
        Err(GroveError::Engine(grove_ffi::GroveErrorCode::InvalidArgument))
    ));
    assert!(mock.events().contains(&MockEvent::Unregister("Player".into())));
    assert!(ctx.registry().extension("Player").is_none());
    assert!(ctx.registry().extension_names().is_empty());
    // The engine no longer knows the class, so a retry is not a duplicate.
    assert!(grove_runtime::Engine::class_parent(&mock, "Player").is_err());
}

#[test]
fn inbound_calls_reach_the_instance() {
    let (_mock, ctx) = setup();
    register(&ctx, vec![player_info()]).unwrap();
    let player = ctx.construct::<Player>().unwrap();
    let id = player.instance_id();

    assert_eq!(
        ctx.dispatch(id, "take_damage", &[Variant::Int(30)]).unwrap(),
        Outcome::Returned(Variant::Int(70))
    );
    assert_eq!(ctx.dispatch(id, "_ready", &[]).unwrap(), Outcome::Returned(Variant::Nil));
    {
        let data = player.bind().unwrap();
        assert_eq!(data.hp, 70);
        assert_eq!(data.speed, 3.0);
        assert_eq!(data.base.to_gd().unwrap().instance_id(), id);
    }

    let err = ctx.dispatch(id, "take_damage", &[]).unwrap_err();
    assert!(matches!(err, GroveError::CallFailed { .. }));
}

#[test]
fn missing_overrides_follow_the_virtual_slots() {
    let (_mock, ctx) = setup();
    register(&ctx, vec![player_info()]).unwrap();
    let id = ctx.construct::<Player>().unwrap().instance_id();

    assert_eq!(ctx.dispatch(id, "_process", &[Variant::Float(0.016)]).unwrap(), Outcome::Default);
    assert_eq!(ctx.dispatch(id, "_unknown", &[]).unwrap(), Outcome::Default);
    assert!(matches!(
        ctx.dispatch(id, "_get_configuration_warnings", &[]),
        Err(GroveError::NotImplemented { .. })
    ));
}

#[test]
fn exported_members_are_readable_and_writable() {
    let (_mock, ctx) = setup();
    register(&ctx, vec![player_info()]).unwrap();
    let player = ctx.construct::<Player>().unwrap();
    let id = player.instance_id();

    assert_eq!(ctx.get_property(id, "hp").unwrap(), Some(Variant::Int(100)));
    assert!(ctx.set_property(id, "hp", &Variant::Int(5)).unwrap());
    assert_eq!(player.bind().unwrap().hp, 5);
    assert!(!ctx.set_property(id, "mana", &Variant::Int(5)).unwrap());
    assert!(matches!(
        ctx.set_property(id, "hp", &Variant::String("lots".into())),
        Err(GroveError::TypeMismatch { .. })
    ));
    assert_eq!(ctx.get_property(id, "mana").unwrap(), None);
}

#[test]
fn freed_instances_reject_inbound_calls() {
    let (mock, ctx) = setup();
    register(&ctx, vec![player_info()]).unwrap();
    let player = ctx.construct::<Player>().unwrap();
    let id = player.instance_id();

    ctx.free_instance(id);
    mock.free_object(id);
    assert!(matches!(ctx.dispatch(id, "_ready", &[]), Err(GroveError::StaleReference { .. })));
    assert!(matches!(ctx.get_property(id, "hp"), Err(GroveError::StaleReference { .. })));
    assert!(player.bind().is_err());
}

#[test]
fn shutdown_unregisters_subclasses_first() {
    let (mock, ctx) = setup();
    register(&ctx, vec![player_info(), boss_info()]).unwrap();
    let player = ctx.construct::<Player>().unwrap();
    ctx.shutdown();

    let unregistered: Vec<String> = mock
        .events()
        .into_iter()
        .filter_map(|e| match e {
            MockEvent::Unregister(name) => Some(name),
            _ => None,
        })
        .collect();
    assert_eq!(unregistered, vec!["Boss", "Player"]);
    assert!(ctx.registry().extension("Player").is_none());
    assert!(player.bind().is_err());
}
