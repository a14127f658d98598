// Build context: validated descriptor view with lookups and inheritance chains.

use std::collections::{BTreeMap, BTreeSet};

use crate::config::CodegenOptions;
use crate::error::{GenResult, GenerationError};
use crate::naming;
use crate::schema::*;
use crate::type_map;

/// Root of every class chain.
pub const ROOT_CLASS: &str = "Object";
/// Capability marker: classes below this one are reference-counted.
pub const REFCOUNTED_CLASS: &str = "RefCounted";

/// Central build context for the codegen pipeline.
pub struct CodegenContext<'a> {
    pub descriptor: &'a Descriptor,
    /// Classes to generate, by name (blocklisted classes removed).
    pub classes: BTreeMap<&'a str, &'a ClassDescriptor>,
    /// Class → `[class, parent, ..., Object]`.
    pub chains: BTreeMap<&'a str, Vec<&'a str>>,
    pub builtins: BTreeMap<&'a str, &'a BuiltinClassDescriptor>,
    pub global_enums: BTreeMap<&'a str, &'a EnumDescriptor>,
    pub native_structs: BTreeMap<&'a str, &'a NativeStructureDescriptor>,
    blocked_methods: BTreeSet<(String, String)>,
}

/// An enum resolved from a scoped type reference.
pub struct ResolvedEnum<'a> {
    pub descriptor: &'a EnumDescriptor,
    /// Full Rust path of the generated type.
    pub path: String,
}

impl<'a> CodegenContext<'a> {
    /// Validate the descriptor and build lookups. Any structural problem is
    /// reported here, before generation starts.
    pub fn build(descriptor: &'a Descriptor, options: &CodegenOptions) -> GenResult<Self> {
        check_header(&descriptor.header, options)?;

        let mut builtins = BTreeMap::new();
        for builtin in &descriptor.builtin_classes {
            if type_map::builtin_info(&builtin.name).is_none() {
                return Err(GenerationError::UnknownBuiltin(builtin.name.clone()));
            }
            if builtins.insert(builtin.name.as_str(), builtin).is_some() {
                return Err(duplicate("builtin class", &builtin.name, "descriptor"));
            }
            check_enums(&builtin.enums, &builtin.name)?;
        }

        let mut all_classes: BTreeMap<&str, &ClassDescriptor> = BTreeMap::new();
        for class in &descriptor.classes {
            if builtins.contains_key(class.name.as_str()) {
                return Err(duplicate("class", &class.name, "builtin classes"));
            }
            if all_classes.insert(class.name.as_str(), class).is_some() {
                return Err(duplicate("class", &class.name, "descriptor"));
            }
        }

        let mut chains = BTreeMap::new();
        for name in all_classes.keys() {
            chains.insert(*name, resolve_chain(*name, &all_classes)?);
        }

        // Blocklisted classes drop out; their descendants would lose their
        // parent, so that is an error rather than a silent removal.
        let blocked: BTreeSet<&str> = options
            .blocklist
            .classes
            .iter()
            .map(|s| s.as_str())
            .collect();
        for (name, chain) in &chains {
            if blocked.contains(name) {
                continue;
            }
            if let Some(b) = chain.iter().find(|c| blocked.contains(*c)) {
                return Err(GenerationError::BlockedAncestor {
                    class: name.to_string(),
                    blocked: b.to_string(),
                });
            }
        }
        let classes: BTreeMap<&str, &ClassDescriptor> = all_classes
            .into_iter()
            .filter(|(name, _)| !blocked.contains(name))
            .collect();
        chains.retain(|name, _| classes.contains_key(name));
        for name in &blocked {
            log::info!("blocklisted class `{name}` skipped");
        }

        let mut global_enums = BTreeMap::new();
        for e in &descriptor.global_enums {
            if global_enums.insert(e.name.as_str(), e).is_some() {
                return Err(duplicate("enum", &e.name, "global scope"));
            }
        }
        check_enums(&descriptor.global_enums, "global scope")?;

        let mut native_structs = BTreeMap::new();
        for s in &descriptor.native_structures {
            if native_structs.insert(s.name.as_str(), s).is_some() {
                return Err(duplicate("native structure", &s.name, "descriptor"));
            }
        }

        let mut utilities = BTreeSet::new();
        for f in &descriptor.utility_functions {
            if !utilities.insert(f.name.as_str()) {
                return Err(duplicate("utility function", &f.name, "global scope"));
            }
        }

        let ctx = CodegenContext {
            descriptor,
            classes,
            chains,
            builtins,
            global_enums,
            native_structs,
            blocked_methods: options.blocklist.method_tuples().into_iter().collect(),
        };

        for class in ctx.classes.values() {
            ctx.check_class(class)?;
        }

        Ok(ctx)
    }

    fn check_class(&self, class: &ClassDescriptor) -> GenResult<()> {
        let scope = format!("class `{}`", class.name);
        check_enums(&class.enums, &class.name)?;

        let mut seen = BTreeSet::new();
        for p in &class.properties {
            if !seen.insert(p.name.as_str()) {
                return Err(duplicate("property", &p.name, &scope));
            }
            for accessor in [&p.getter, &p.setter].into_iter().flatten() {
                if accessor.is_empty() {
                    continue;
                }
                if self.find_method(&class.name, accessor).is_none() {
                    return Err(GenerationError::MissingAccessor {
                        class: class.name.clone(),
                        property: p.name.clone(),
                        accessor: accessor.clone(),
                    });
                }
            }
        }

        let mut seen = BTreeSet::new();
        for s in &class.signals {
            if !seen.insert(s.name.as_str()) {
                return Err(duplicate("signal", &s.name, &scope));
            }
        }

        let mut signatures: BTreeSet<(&str, Vec<&str>)> = BTreeSet::new();
        for m in &class.methods {
            if !signatures.insert((m.name.as_str(), m.signature())) {
                return Err(duplicate("method", &m.name, &scope));
            }
            if !m.is_virtual && m.hash.is_none() {
                return Err(GenerationError::MissingHash {
                    class: class.name.clone(),
                    method: m.name.clone(),
                });
            }
        }
        Ok(())
    }

    /// Find `method` on `class` or the nearest ancestor declaring it.
    pub fn find_method(&self, class: &str, method: &str) -> Option<(&'a ClassDescriptor, &'a MethodDescriptor)> {
        let chain = self.chains.get(class)?;
        chain.iter().find_map(|c| {
            let desc: &'a ClassDescriptor = *self.classes.get(c)?;
            desc.methods
                .iter()
                .find(|m| m.name == method)
                .map(|m| (desc, m))
        })
    }

    pub fn is_refcounted(&self, class: &str) -> bool {
        let declared = self.classes.get(class).is_some_and(|c| c.is_refcounted);
        declared
            || self
                .chains
                .get(class)
                .is_some_and(|chain| chain.contains(&REFCOUNTED_CLASS))
    }

    pub fn is_method_blocked(&self, class: &str, method: &str) -> bool {
        self.blocked_methods
            .contains(&(class.to_string(), method.to_string()))
    }

    /// Resolve `Side`, `Variant.Type`, `Node.ProcessMode` or `Vector3.Axis`.
    pub fn find_enum(&self, name: &str) -> Option<ResolvedEnum<'a>> {
        if let Some(&e) = self.global_enums.get(name) {
            return Some(ResolvedEnum {
                descriptor: e,
                path: format!("crate::global_enums::{}", naming::enum_type_name(name)),
            });
        }
        let (scope, enum_name) = name.rsplit_once('.')?;
        if let Some(&class) = self.classes.get(scope) {
            let e = class.enums.iter().find(|e| e.name == enum_name)?;
            return Some(ResolvedEnum {
                descriptor: e,
                path: format!(
                    "crate::classes::{}::{}",
                    naming::module_name(scope),
                    naming::enum_type_name(enum_name)
                ),
            });
        }
        if let Some(&builtin) = self.builtins.get(scope) {
            let e = builtin.enums.iter().find(|e| e.name == enum_name)?;
            return Some(ResolvedEnum {
                descriptor: e,
                path: format!(
                    "crate::builtin_enums::{}::{}",
                    naming::module_name(scope),
                    naming::enum_type_name(enum_name)
                ),
            });
        }
        None
    }
}

fn duplicate(kind: &'static str, name: &str, scope: &str) -> GenerationError {
    GenerationError::DuplicateName {
        kind,
        name: name.to_string(),
        scope: scope.to_string(),
    }
}

fn check_header(header: &Header, options: &CodegenOptions) -> GenResult<()> {
    let compatible = header.version_major == 4
        && (options.min_minor..=options.max_minor).contains(&header.version_minor);
    if !compatible {
        return Err(GenerationError::IncompatibleVersion {
            major: header.version_major,
            minor: header.version_minor,
            min_minor: options.min_minor,
            max_minor: options.max_minor,
        });
    }
    if header.precision != "single" {
        return Err(GenerationError::UnsupportedPrecision(header.precision.clone()));
    }
    Ok(())
}

fn check_enums(enums: &[EnumDescriptor], scope: &str) -> GenResult<()> {
    let mut names = BTreeSet::new();
    for e in enums {
        if !names.insert(e.name.as_str()) {
            return Err(duplicate("enum", &e.name, scope));
        }
        let mut cases = BTreeSet::new();
        for v in &e.values {
            if !cases.insert(v.name.as_str()) {
                return Err(duplicate("enum case", &v.name, &format!("enum `{}`", e.name)));
            }
        }
    }
    Ok(())
}

/// Walk parents up to the root, detecting cycles and dangling parents.
fn resolve_chain<'a>(
    start: &'a str,
    classes: &BTreeMap<&'a str, &'a ClassDescriptor>,
) -> GenResult<Vec<&'a str>> {
    let mut chain = vec![start];
    let mut current = start;
    loop {
        let Some(desc) = classes.get(current) else {
            return Err(GenerationError::UnknownParent {
                class: chain[chain.len().saturating_sub(2)].to_string(),
                parent: current.to_string(),
            });
        };
        match desc.inherits.as_deref() {
            None | Some("") => {
                if current != ROOT_CLASS {
                    return Err(GenerationError::BrokenChain(current.to_string()));
                }
                return Ok(chain);
            }
            Some(parent) => {
                let parent = classes
                    .get_key_value(parent)
                    .map(|(k, _)| *k)
                    .ok_or_else(|| GenerationError::UnknownParent {
                        class: current.to_string(),
                        parent: parent.to_string(),
                    })?;
                if chain.contains(&parent) {
                    let mut cycle: Vec<String> = chain.iter().map(|s| s.to_string()).collect();
                    cycle.push(parent.to_string());
                    return Err(GenerationError::InheritanceCycle(cycle));
                }
                chain.push(parent);
                current = parent;
            }
        }
    }
}
