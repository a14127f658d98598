// Rust code generation orchestrator.
//
// Everything is rendered in memory first; nothing touches the disk until the
// whole tree generated without error.

pub mod enums;
pub mod classes;
pub mod native;
pub mod module;
pub mod utilities;
pub mod param_helpers;

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use crate::context::CodegenContext;
use crate::error::{GenResult, GenerationError};
use crate::filter::{self, ResolvedMethod};
use crate::naming::module_name;

/// Callable methods of every class, resolved once per run.
pub struct MethodIndex<'a> {
    by_class: BTreeMap<&'a str, Vec<ResolvedMethod<'a>>>,
}

impl<'a> MethodIndex<'a> {
    pub fn build(ctx: &CodegenContext<'a>) -> Self {
        let by_class = ctx
            .classes
            .iter()
            .map(|(name, class)| (*name, filter::callable_methods(ctx, *class)))
            .collect();
        MethodIndex { by_class }
    }

    pub fn methods(&self, class: &str) -> &[ResolvedMethod<'a>] {
        self.by_class.get(class).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Generated source tree: relative path → file contents. `lib.rs` is the root.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct GeneratedFiles {
    files: BTreeMap<String, String>,
}

impl GeneratedFiles {
    pub fn insert(&mut self, path: impl Into<String>, contents: String) {
        self.files.insert(path.into(), contents);
    }

    pub fn get(&self, path: &str) -> Option<&str> {
        self.files.get(path).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.files.iter().map(|(p, c)| (p.as_str(), c.as_str()))
    }

    /// Write every file below `dir`, creating directories as needed.
    pub fn write_to(&self, dir: &Path) -> GenResult<()> {
        for (rel, contents) in &self.files {
            let path = dir.join(rel);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).map_err(|source| GenerationError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
            std::fs::write(&path, contents).map_err(|source| GenerationError::Io { path, source })?;
        }
        Ok(())
    }

    /// Single-file rendition with every `pub mod x;` inlined, suitable for
    /// `include!` from a build script output.
    pub fn flatten(&self) -> String {
        self.flatten_file("lib.rs")
    }

    fn flatten_file(&self, path: &str) -> String {
        let Some(contents) = self.files.get(path) else {
            return String::new();
        };
        let dir = module_dir(path);
        let mut out = String::with_capacity(contents.len());
        for line in contents.lines() {
            let child = line
                .trim()
                .strip_prefix("pub mod ")
                .and_then(|rest| rest.strip_suffix(';'))
                .and_then(|name| {
                    let file = format!("{dir}{name}.rs");
                    let nested = format!("{dir}{name}/mod.rs");
                    if self.files.contains_key(&file) {
                        Some((name, file))
                    } else if self.files.contains_key(&nested) {
                        Some((name, nested))
                    } else {
                        None
                    }
                });
            match child {
                Some((name, file)) => {
                    out.push_str(&format!("pub mod {name} {{\n"));
                    out.push_str(&self.flatten_file(&file));
                    out.push_str("}\n");
                }
                None => {
                    out.push_str(line);
                    out.push('\n');
                }
            }
        }
        out
    }
}

/// Directory holding the children of the module defined in `path`.
fn module_dir(path: &str) -> String {
    if path == "lib.rs" {
        return String::new();
    }
    match path.strip_suffix("mod.rs") {
        Some(dir) => dir.to_string(),
        None => format!("{}/", path.trim_end_matches(".rs")),
    }
}

/// Generate the whole binding tree.
pub fn generate(ctx: &CodegenContext<'_>) -> GenResult<GeneratedFiles> {
    let index = MethodIndex::build(ctx);
    let mut files = GeneratedFiles::default();
    let mut with_ext = BTreeSet::new();

    for (name, class) in &ctx.classes {
        let code = classes::generate_class(ctx, &index, class)?;
        if classes::has_ext_trait(&code, name) {
            with_ext.insert(name.to_string());
        }
        files.insert(format!("classes/{}.rs", module_name(name)), code);
    }
    files.insert("classes/mod.rs", classes::generate_classes_mod(ctx, &with_ext));
    files.insert("global_enums.rs", module::generate_global_enums(ctx));
    for (path, code) in module::generate_builtin_enums(ctx) {
        files.insert(path, code);
    }
    files.insert("utilities.rs", utilities::generate_utilities(ctx)?);
    files.insert("native.rs", module::generate_native(ctx)?);
    files.insert("lib.rs", module::generate_lib_rs(ctx));

    log::debug!("rendered {} files for {} classes", files.len(), ctx.classes.len());
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flatten_inlines_nested_modules() {
        let mut files = GeneratedFiles::default();
        files.insert("lib.rs", "#[allow(dead_code)]\npub mod classes;\npub const X: u8 = 1;\n".to_string());
        files.insert("classes/mod.rs", "pub mod node;\npub use node::Node;\n".to_string());
        files.insert("classes/node.rs", "pub struct Node;\n".to_string());
        let flat = files.flatten();
        assert_eq!(
            flat,
            "#[allow(dead_code)]\npub mod classes {\npub mod node {\npub struct Node;\n}\npub use node::Node;\n}\npub const X: u8 = 1;\n"
        );
    }

    #[test]
    fn module_dirs() {
        assert_eq!(module_dir("lib.rs"), "");
        assert_eq!(module_dir("classes/mod.rs"), "classes/");
        assert_eq!(module_dir("utilities.rs"), "utilities/");
    }
}
