use std::sync::Arc;

use demo_extension::{Turret, WeaponStats};
use grove::bindings::classes::{editor_export_plugin, node_3d};
use grove::ffi::{
    CallErrorCode, METHOD_FLAG_CONST, METHOD_FLAG_STATIC, PROPERTY_HINT_ENUM, PROPERTY_HINT_NODE_TYPE,
    PROPERTY_HINT_RESOURCE_TYPE, PROPERTY_USAGE_CLASS_IS_ENUM,
};
use grove::prelude::*;
use grove::runtime::testing::{MockEngine, MockEvent};
use grove::runtime::{Outcome, PropertyInfo, Transfer};

/// Registered alongside the demo classes; leaves the required `_get_name`
/// unimplemented.
#[gclass(base = EditorExportPlugin)]
struct HalfExporter {
    #[export]
    label: String,
}

fn setup() -> (MockEngine, Arc<EngineContext>) {
    let mock = MockEngine::with_core_classes();
    mock.add_class("EditorExportPlugin", Some("RefCounted"));
    let ctx = EngineContext::new(Arc::new(mock.clone()));
    ctx.register_engine_classes(grove::bindings::ENGINE_CLASSES);
    ctx.register_extension_classes().unwrap();
    (mock, ctx)
}

fn properties_of(mock: &MockEngine, class: &str) -> Vec<PropertyInfo> {
    mock.events()
        .into_iter()
        .filter_map(|e| match e {
            MockEvent::Property { class: owner, property } if owner == class => Some(property),
            _ => None,
        })
        .collect()
}

fn returned(outcome: GroveResult<Outcome>) -> Variant {
    match outcome.unwrap() {
        Outcome::Returned(value) => value,
        Outcome::Default => panic!("expected a value, got the engine default"),
    }
}

fn float(value: Variant) -> f64 {
    match value {
        Variant::Float(f) => f,
        other => panic!("expected a float, got {other:?}"),
    }
}

#[test]
fn every_class_in_the_binary_is_registered() {
    let (mock, ctx) = setup();
    let mut names = ctx.registry().extension_names();
    names.sort();
    assert_eq!(names, vec!["HalfExporter", "ModExporter", "Turret", "WeaponStats"]);

    let turret = mock
        .events()
        .into_iter()
        .find_map(|e| match e {
            MockEvent::Class(info) if info.name == "Turret" => Some(info),
            _ => None,
        })
        .unwrap();
    assert_eq!(turret.parent, "Node3D");
    assert!(ctx.registry().is_a(ctx.engine(), "Turret", "Node"));
}

#[test]
fn turret_exports_keep_declaration_order_and_scopes() {
    let (mock, _ctx) = setup();
    let layout: Vec<String> = mock
        .events()
        .into_iter()
        .filter_map(|e| match e {
            MockEvent::Property { class, property } if class == "Turret" => Some(property.name),
            MockEvent::Group { class, name, subgroup, .. } if class == "Turret" => {
                Some(format!("{}:{name}", if subgroup { "subgroup" } else { "group" }))
            }
            _ => None,
        })
        .collect();
    assert_eq!(
        layout,
        vec![
            "yaw",
            "mode",
            "group:Ammo",
            "ammo_count",
            "ammo_profile",
            "subgroup:Reload",
            "reload_time",
            "group:",
            "stats",
            "target",
        ]
    );
}

#[test]
fn hints_are_encoded_and_enums_auto_tagged() {
    let (mock, _ctx) = setup();
    let props = properties_of(&mock, "Turret");
    let prop = |name: &str| props.iter().find(|p| p.name == name).unwrap().clone();

    assert_eq!(prop("yaw").hint_string, "0,360,0.5");
    assert_eq!(prop("ammo_count").hint_string, "0,200,or_greater");
    assert_eq!(prop("ammo_profile").hint_string, "*.tres,*.res");
    assert_eq!(prop("reload_time").hint_string, "attenuation");

    let mode = prop("mode");
    assert_eq!(mode.hint, PROPERTY_HINT_ENUM);
    assert_eq!(mode.hint_string, "Single:0,Burst:3,Auto:10");
    assert_eq!(mode.class_name, "FireMode");
    assert_ne!(mode.usage & PROPERTY_USAGE_CLASS_IS_ENUM, 0);

    let stats = prop("stats");
    assert_eq!(stats.hint, PROPERTY_HINT_RESOURCE_TYPE);
    assert_eq!(stats.hint_string, "WeaponStats");
    let target = prop("target");
    assert_eq!(target.hint, PROPERTY_HINT_NODE_TYPE);
    assert_eq!(target.hint_string, "Node3D");

    let weapon = properties_of(&mock, "WeaponStats");
    let elements = weapon.iter().find(|p| p.name == "elements").unwrap();
    assert_eq!(elements.hint_string, "Fire,Ice,Poison:8");
}

#[test]
fn funcs_are_registered_with_their_signatures() {
    let (mock, _ctx) = setup();
    let methods: Vec<_> = mock
        .events()
        .into_iter()
        .filter_map(|e| match e {
            MockEvent::Method { class, method } if class == "Turret" => Some(method),
            _ => None,
        })
        .collect();
    let names: Vec<&str> = methods.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(
        names,
        vec!["fire", "reload", "shots_fired", "max_ammo", "aim_at", "track_target", "damage_per_second"]
    );

    let reload = &methods[1];
    assert_eq!(reload.args.len(), 1);
    assert_eq!(reload.args[0].name, "rounds");
    assert_eq!(reload.ret.as_ref().unwrap().variant_type, grove::runtime::VariantType::Int);
    assert_ne!(methods[2].flags & METHOD_FLAG_CONST, 0);
    assert_ne!(methods[3].flags & METHOD_FLAG_STATIC, 0);
}

#[test]
fn firing_follows_mode_and_cooldown() {
    let (_mock, ctx) = setup();
    let turret = ctx.construct::<Turret>().unwrap();
    let id = turret.instance_id();

    assert_eq!(returned(ctx.dispatch(id, "_ready", &[])), Variant::Nil);
    assert_eq!(returned(ctx.dispatch(id, "fire", &[])), Variant::Bool(true));
    assert_eq!(returned(ctx.dispatch(id, "fire", &[])), Variant::Bool(false));

    returned(ctx.dispatch(id, "_process", &[Variant::Float(1.0)]));
    assert!(ctx.set_property(id, "mode", &Variant::Int(3)).unwrap());
    assert_eq!(returned(ctx.dispatch(id, "fire", &[])), Variant::Bool(true));

    assert_eq!(ctx.get_property(id, "ammo_count").unwrap(), Some(Variant::Int(26)));
    assert_eq!(returned(ctx.dispatch(id, "shots_fired", &[])), Variant::Int(4));
    assert_eq!(ctx.get_property(id, "cooldown").unwrap(), None);
}

#[test]
fn static_funcs_and_argument_errors() {
    let (_mock, ctx) = setup();
    let id = ctx.construct::<Turret>().unwrap().instance_id();

    assert_eq!(returned(ctx.dispatch(id, "max_ammo", &[])), Variant::Int(200));
    assert_eq!(returned(ctx.dispatch(id, "reload", &[Variant::Int(500)])), Variant::Int(200));

    let err = ctx
        .dispatch(id, "reload", &[Variant::String("lots".into())])
        .unwrap_err();
    let call = err.to_call_error();
    assert_eq!(call.code, CallErrorCode::InvalidArgument);
    assert_eq!(call.argument, 0);

    let err = ctx.dispatch(id, "reload", &[]).unwrap_err();
    assert_eq!(err.to_call_error().code, CallErrorCode::TooFewArguments);
}

#[test]
fn enum_members_reject_unknown_values() {
    let (_mock, ctx) = setup();
    let id = ctx.construct::<Turret>().unwrap().instance_id();
    assert!(matches!(
        ctx.set_property(id, "mode", &Variant::Int(7)),
        Err(GroveError::InvalidEnumValue { ty: "FireMode", value: 7 })
    ));
    assert_eq!(ctx.get_property(id, "mode").unwrap(), Some(Variant::Int(0)));
}

#[test]
fn aiming_reads_positions_through_the_engine() {
    let (mock, ctx) = setup();
    let target = mock.spawn("Node3D");
    let target_id = target.id;
    mock.add_method("Node3D", "get_position", node_3d::methods::GET_POSITION.hash, move |call| {
        if call.receiver.id == target_id {
            Ok(Variant::Vector3(Vector3::new(0.0, 0.0, -5.0)))
        } else {
            Ok(Variant::Vector3(Vector3::ZERO))
        }
    });
    let id = ctx.construct::<Turret>().unwrap().instance_id();

    let yaw = float(returned(ctx.dispatch(id, "aim_at", &[Variant::Vector3(Vector3::new(1.0, 0.0, 0.0))])));
    assert!((yaw - 90.0).abs() < 1e-9);

    let target = ctx.attach(target, Transfer::Borrowed).unwrap();
    assert!(ctx.set_property(id, "target", &Variant::Object(target)).unwrap());
    let yaw = float(returned(ctx.dispatch(id, "track_target", &[])));
    assert!((yaw - 180.0).abs() < 1e-9);
}

#[test]
fn resources_assigned_to_members_are_shared() {
    let (_mock, ctx) = setup();
    let stats = ctx.construct::<WeaponStats>().unwrap();
    let stats_id = stats.instance_id();
    assert!(ctx.set_property(stats_id, "damage", &Variant::Float(20.0)).unwrap());
    assert_eq!(float(returned(ctx.dispatch(stats_id, "dps", &[]))), 40.0);
    let scaled = float(returned(ctx.dispatch(stats_id, "damage_at", &[Variant::Int(3)])));
    assert!((scaled - 24.0).abs() < 1e-9);

    let turret = ctx.construct::<Turret>().unwrap();
    let id = turret.instance_id();
    assert_eq!(float(returned(ctx.dispatch(id, "damage_per_second", &[]))), 0.0);
    assert!(ctx.set_property(id, "stats", &stats.to_variant()).unwrap());
    assert_eq!(float(returned(ctx.dispatch(id, "damage_per_second", &[]))), 40.0);

    match ctx.get_property(id, "stats").unwrap() {
        Some(Variant::Object(obj)) => assert_eq!(obj.instance_id(), stats_id),
        other => panic!("expected the stats resource, got {other:?}"),
    }
}

#[test]
fn virtual_overrides_and_engine_defaults() {
    let (_mock, ctx) = setup();
    let id = ctx.construct::<Turret>().unwrap().instance_id();
    assert_eq!(ctx.dispatch(id, "_enter_tree", &[]).unwrap(), Outcome::Default);
    assert_eq!(ctx.dispatch(id, "_get_configuration_warnings", &[]).unwrap(), Outcome::Default);
}

#[test]
fn required_virtuals_must_be_implemented() {
    let (_mock, ctx) = setup();
    let exporter = ctx.construct::<demo_extension::ModExporter>().unwrap();
    assert_eq!(
        returned(ctx.dispatch(exporter.instance_id(), "_get_name", &[])),
        Variant::String("grove_mod_exporter".into())
    );

    let half = ctx.construct::<HalfExporter>().unwrap();
    assert!(matches!(
        ctx.dispatch(half.instance_id(), "_get_name", &[]),
        Err(GroveError::NotImplemented { class, method }) if class == "HalfExporter" && method == "_get_name"
    ));
}

#[test]
fn export_hook_skips_listed_files() {
    let (mock, ctx) = setup();
    mock.add_method("EditorExportPlugin", "skip", editor_export_plugin::methods::SKIP.hash, |_| {
        Ok(Variant::Nil)
    });
    let exporter = ctx.construct::<demo_extension::ModExporter>().unwrap();
    let id = exporter.instance_id();
    let skipped = Variant::Array(VariantArray::from(vec![Variant::String(".import".into())]));
    assert!(ctx.set_property(id, "skipped", &skipped).unwrap());

    let export = |path: &str| {
        let args = [
            Variant::String(path.into()),
            Variant::String("Texture2D".into()),
            Variant::PackedStringArray(PackedStringArray::from(vec!["pc".to_string()])),
        ];
        returned(ctx.dispatch(id, "_export_file", &args))
    };
    assert_eq!(export("res://icon.png"), Variant::Nil);
    assert_eq!(export("res://icon.png.import"), Variant::Nil);

    assert_eq!(returned(ctx.dispatch(id, "exported_count", &[])), Variant::Int(1));
    assert_eq!(mock.calls(), vec!["EditorExportPlugin.skip"]);
}

#[test]
fn shutdown_unregisters_and_invalidates_instances() {
    let (mock, ctx) = setup();
    let turret = ctx.construct::<Turret>().unwrap();
    ctx.shutdown();

    let unregistered = mock
        .events()
        .into_iter()
        .filter(|e| matches!(e, MockEvent::Unregister(_)))
        .count();
    assert_eq!(unregistered, 4);
    assert!(turret.bind().is_err());
}
