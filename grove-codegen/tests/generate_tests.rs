use std::path::{Path, PathBuf};

use grove_codegen::config::CodegenOptions;
use grove_codegen::schema::Descriptor;
use grove_codegen::{generate, load_descriptor, run_generate, Error};

fn fixture_path() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/mini_api.json")
}

fn fixture() -> Descriptor {
    load_descriptor(&fixture_path()).unwrap()
}

fn fixture_json() -> serde_json::Value {
    serde_json::from_str(&std::fs::read_to_string(fixture_path()).unwrap()).unwrap()
}

fn from_json(value: serde_json::Value) -> Descriptor {
    serde_json::from_value(value).unwrap()
}

#[test]
fn generates_every_module() {
    let files = generate(&fixture(), &CodegenOptions::default()).unwrap();
    for path in [
        "lib.rs",
        "classes/mod.rs",
        "classes/object.rs",
        "classes/node_3d.rs",
        "classes/engine.rs",
        "global_enums.rs",
        "builtin_enums/mod.rs",
        "builtin_enums/vector_3.rs",
        "utilities.rs",
        "native.rs",
    ] {
        assert!(files.get(path).is_some(), "missing {path}");
    }
}

#[test]
fn output_is_deterministic() {
    let d = fixture();
    let a = generate(&d, &CodegenOptions::default()).unwrap();
    let b = generate(&d, &CodegenOptions::default()).unwrap();
    assert_eq!(a, b);

    // Descriptor order does not leak into the output.
    let mut json = fixture_json();
    json["classes"].as_array_mut().unwrap().reverse();
    let c = generate(&from_json(json), &CodegenOptions::default()).unwrap();
    assert_eq!(a, c);
}

#[test]
fn inheritance_is_expressed_through_has_parent() {
    let files = generate(&fixture(), &CodegenOptions::default()).unwrap();
    let node_3d = files.get("classes/node_3d.rs").unwrap();
    assert!(node_3d.contains("type Parent = crate::classes::Node;"));
    assert!(node_3d.contains("<crate::classes::Node as grove_runtime::GodotClass>::inherits(class_name)"));
    let object = files.get("classes/object.rs").unwrap();
    assert!(!object.contains("HasParent"));

    let lib = files.get("lib.rs").unwrap();
    let pos = |needle: &str| lib.find(needle).unwrap_or_else(|| panic!("{needle} not in lib.rs"));
    assert!(pos("classes::object::META") < pos("classes::node::META"));
    assert!(pos("classes::node::META") < pos("classes::node_3d::META"));
    assert!(pos("classes::ref_counted::META") < pos("classes::resource::META"));
}

#[test]
fn methods_carry_hashes_and_ownership() {
    let files = generate(&fixture(), &CodegenOptions::default()).unwrap();
    let node_3d = files.get("classes/node_3d.rs").unwrap();
    assert!(node_3d.contains("pub static SET_POSITION: grove_runtime::MethodInfo"));
    assert!(node_3d.contains("hash: 3460891852,"));
    assert!(node_3d.contains("    &methods::SET_POSITION,\n"));

    let resource = files.get("classes/resource.rs").unwrap();
    let duplicate = &resource[resource.find("pub static DUPLICATE").unwrap()..];
    assert!(duplicate.contains("return_transfer: grove_runtime::Transfer::Owned"));

    let node = files.get("classes/node.rs").unwrap();
    let parent = &node[node.find("pub static GET_PARENT").unwrap()..];
    assert!(parent.contains("return_transfer: grove_runtime::Transfer::Borrowed"));
}

#[test]
fn default_arguments_become_options() {
    let files = generate(&fixture(), &CodegenOptions::default()).unwrap();
    let node_3d = files.get("classes/node_3d.rs").unwrap();
    assert!(node_3d.contains(
        "fn look_at(&self, target: grove_runtime::Vector3, up: Option<grove_runtime::Vector3>, use_model_front: Option<bool>)"
    ));
    assert!(node_3d.contains("let up = up.unwrap_or(grove_runtime::Vector3::new(0.0f32, 1.0f32, 0.0f32));"));

    let node = files.get("classes/node.rs").unwrap();
    assert!(node.contains("group: &grove_runtime::StringName, persistent: Option<bool>"));
    assert!(node.contains("fn add_child(&self, node: &grove_runtime::Gd<crate::classes::Node>"));
}

#[test]
fn containers_of_objects_are_nullable() {
    let files = generate(&fixture(), &CodegenOptions::default()).unwrap();
    let node = files.get("classes/node.rs").unwrap();
    assert!(node.contains("grove_runtime::GroveResult<Vec<Option<grove_runtime::Gd<crate::classes::Node>>>>"));
}

#[test]
fn enums_keep_gaps_and_bitfields_are_newtypes() {
    let files = generate(&fixture(), &CodegenOptions::default()).unwrap();
    let globals = files.get("global_enums.rs").unwrap();
    assert!(globals.contains("ErrInvalidParameter = 31,"));
    assert!(globals.contains("pub struct KeyModifierMask(pub u64);"));
    assert!(globals.contains("pub const SHIFT: Self = Self(33554432);"));

    let node = files.get("classes/node.rs").unwrap();
    assert!(node.contains("pub enum ProcessMode {"));
    assert!(node.contains("WhenPaused = 2,"));

    let axis = files.get("builtin_enums/vector_3.rs").unwrap();
    assert!(axis.contains("pub enum Axis {"));
}

#[test]
fn properties_get_accessors_without_shadowing_methods() {
    let files = generate(&fixture(), &CodegenOptions::default()).unwrap();
    let node_3d = files.get("classes/node_3d.rs").unwrap();
    assert!(node_3d.contains("fn position(&self) -> grove_runtime::GroveResult<grove_runtime::Vector3>"));
    // `set_position` already exists as a method.
    assert_eq!(node_3d.matches("fn set_position(").count(), 1);

    let resource = files.get("classes/resource.rs").unwrap();
    assert!(resource.contains("fn set_resource_name(&self, value: &str)"));
}

#[test]
fn singletons_and_virtual_slots() {
    let files = generate(&fixture(), &CodegenOptions::default()).unwrap();
    let engine = files.get("classes/engine.rs").unwrap();
    assert!(engine.contains("ctx.singleton::<Self>(\"Engine\")"));
    assert!(!engine.contains("pub fn new("));

    let node = files.get("classes/node.rs").unwrap();
    assert!(node.contains("name: \"_ready\","));
    let warnings = &node[node.find("name: \"_get_configuration_warnings\"").unwrap()..];
    assert!(warnings.contains("returns_value: true,"));
}

#[test]
fn utilities_and_native_structures() {
    let files = generate(&fixture(), &CodegenOptions::default()).unwrap();
    let utilities = files.get("utilities.rs").unwrap();
    assert!(utilities.contains("pub fn sin(ctx: &std::sync::Arc<grove_runtime::EngineContext>, angle_rad: f64)"));
    assert!(utilities.contains("varargs: &[grove_runtime::Variant]"));
    assert!(utilities.contains("class: grove_runtime::GLOBAL_SCOPE,"));

    let native = files.get("native.rs").unwrap();
    assert!(native.contains("pub struct AudioFrame {"));
}

#[test]
fn flattened_output_has_no_module_files() {
    let files = generate(&fixture(), &CodegenOptions::default()).unwrap();
    let flat = files.flatten();
    assert!(!flat.lines().any(|l| l.trim_start().starts_with("pub mod") && l.ends_with(';')));
    assert!(flat.contains("pub mod node_3d {"));
}

#[test]
fn unknown_types_abort_generation() {
    let mut json = fixture_json();
    json["classes"][3]["methods"][0]["arguments"][0]["type"] = "Spline".into();
    let err = generate(&from_json(json), &CodegenOptions::default()).unwrap_err();
    assert!(matches!(err, Error::UnknownType { ref ty, .. } if ty == "Spline"), "{err}");
}

#[test]
fn duplicate_enum_cases_abort_generation() {
    let mut json = fixture_json();
    json["global_enums"][0]["values"][1]["name"] = "SIDE_LEFT".into();
    let err = generate(&from_json(json), &CodegenOptions::default()).unwrap_err();
    assert!(matches!(err, Error::DuplicateName { kind: "enum case", .. }), "{err}");
}

fn write_config(dir: &Path, descriptor: &Path) -> PathBuf {
    let config = dir.join("grove.toml");
    std::fs::write(
        &config,
        format!(
            "[codegen]\ndescriptor = {:?}\nout_dir = \"generated\"\n",
            descriptor.to_string_lossy()
        ),
    )
    .unwrap();
    config
}

#[test]
fn run_generate_writes_the_tree() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), &fixture_path());
    let summary = run_generate(&config).unwrap();
    assert_eq!(summary.classes, 6);
    assert!(dir.path().join("generated/lib.rs").exists());
    assert!(dir.path().join("generated/classes/node_3d.rs").exists());
    assert!(!dir.path().join("generated.grove-tmp").exists());
}

#[test]
fn incompatible_descriptor_leaves_previous_output_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), &fixture_path());
    run_generate(&config).unwrap();
    let before = std::fs::read_to_string(dir.path().join("generated/lib.rs")).unwrap();

    let mut json = fixture_json();
    json["header"]["version_minor"] = 9.into();
    let bad = dir.path().join("bad_api.json");
    std::fs::write(&bad, serde_json::to_string(&json).unwrap()).unwrap();
    let config = write_config(dir.path(), &bad);

    let err = run_generate(&config).unwrap_err();
    assert!(matches!(err, Error::IncompatibleVersion { minor: 9, .. }), "{err}");
    let after = std::fs::read_to_string(dir.path().join("generated/lib.rs")).unwrap();
    assert_eq!(before, after);
}

#[test]
fn missing_descriptor_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), &dir.path().join("nope.json"));
    assert!(matches!(run_generate(&config), Err(Error::Io { .. })));
    assert!(!dir.path().join("generated").exists());
}
