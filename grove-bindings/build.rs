// Generates the engine bindings from the bundled descriptor into OUT_DIR.
//
// Set GROVE_API_JSON to generate against another engine build's
// extension_api.json.

use std::path::PathBuf;

use grove_codegen::config::CodegenOptions;

fn main() {
    println!("cargo:rerun-if-env-changed=GROVE_API_JSON");
    let descriptor = match std::env::var_os("GROVE_API_JSON") {
        Some(path) => PathBuf::from(path),
        None => PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("api/extension_api.json"),
    };
    println!("cargo:rerun-if-changed={}", descriptor.display());

    let code = match grove_codegen::generate_flat(&descriptor, &CodegenOptions::default()) {
        Ok(code) => code,
        Err(e) => panic!("binding generation from {} failed: {e}", descriptor.display()),
    };
    let Some(out_dir) = std::env::var_os("OUT_DIR") else {
        panic!("OUT_DIR is not set; build.rs must run under cargo");
    };
    let out = PathBuf::from(out_dir).join("bindings.rs");
    if let Err(e) = std::fs::write(&out, code) {
        panic!("cannot write {}: {e}", out.display());
    }
}
