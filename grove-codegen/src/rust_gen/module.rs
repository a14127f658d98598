// Crate-level files: lib root, enum modules, native structures.

use crate::context::CodegenContext;
use crate::error::GenResult;
use crate::naming::module_name;

use super::{enums, native};

/// Lints the generated tree cannot satisfy for every descriptor.
const MODULE_ALLOWS: &str =
    "#[allow(dead_code, unused_variables, non_snake_case, non_upper_case_globals, clippy::all)]";

pub fn generate_lib_rs(ctx: &CodegenContext<'_>) -> String {
    let header = &ctx.descriptor.header;
    let mut out = String::with_capacity(4096);
    out.push_str("// Generated by grove-codegen from the engine API descriptor. Do not edit.\n\n");
    for module in ["classes", "global_enums", "builtin_enums", "utilities", "native"] {
        out.push_str(&format!("{MODULE_ALLOWS}\npub mod {module};\n"));
    }

    out.push_str(&format!(
        "\n/// Engine version the bindings were generated from.\n\
         pub const API_VERSION: (u32, u32, u32) = ({}, {}, {});\n",
        header.version_major, header.version_minor, header.version_patch
    ));

    // Bases strictly before subclasses; ties broken by name.
    let mut ordered: Vec<(&str, usize)> = ctx.chains.iter().map(|(n, c)| (*n, c.len())).collect();
    ordered.sort_by(|a, b| a.1.cmp(&b.1).then(a.0.cmp(b.0)));
    out.push_str(
        "\n/// Every engine class, bases before subclasses.\n\
         pub static ENGINE_CLASSES: &[grove_runtime::EngineClassMeta] = &[\n",
    );
    for (name, _) in ordered {
        out.push_str(&format!("    classes::{}::META,\n", module_name(name)));
    }
    out.push_str("];\n");

    out.push_str(
        "\n/// Method tables of every engine class, in class name order.\n\
         pub static METHOD_TABLES: &[&[&grove_runtime::MethodInfo]] = &[\n",
    );
    for name in ctx.chains.keys() {
        out.push_str(&format!("    classes::{}::METHODS,\n", module_name(name)));
    }
    out.push_str("];\n");

    out.push_str("\n/// `(singleton name, class name)` pairs.\npub const SINGLETONS: &[(&str, &str)] = &[\n");
    for s in &ctx.descriptor.singletons {
        out.push_str(&format!("    (\"{}\", \"{}\"),\n", s.name, s.class_type));
    }
    out.push_str("];\n");
    out
}

pub fn generate_global_enums(ctx: &CodegenContext<'_>) -> String {
    let mut out = String::new();
    for (name, e) in &ctx.global_enums {
        out.push_str(&enums::generate_enum(e, name));
        out.push('\n');
    }
    out
}

/// `builtin_enums/mod.rs` plus one file per builtin class that has enums.
pub fn generate_builtin_enums(ctx: &CodegenContext<'_>) -> Vec<(String, String)> {
    let mut files = Vec::new();
    let mut root = String::new();
    for (name, builtin) in &ctx.builtins {
        if builtin.enums.is_empty() {
            continue;
        }
        let module = module_name(name);
        root.push_str(&format!("pub mod {module};\n"));
        let mut code = String::new();
        for e in &builtin.enums {
            code.push_str(&enums::generate_enum(e, &format!("{name}.{}", e.name)));
            code.push('\n');
        }
        files.push((format!("builtin_enums/{module}.rs"), code));
    }
    files.push(("builtin_enums/mod.rs".to_string(), root));
    files
}

pub fn generate_native(ctx: &CodegenContext<'_>) -> GenResult<String> {
    let mut out = String::new();
    for s in ctx.native_structs.values() {
        out.push_str(&native::generate_native_struct(s)?);
        out.push('\n');
    }
    Ok(out)
}

