// Method selection: blocklist, virtual split, deterministic overload naming.

use std::collections::{BTreeMap, BTreeSet};

use crate::context::CodegenContext;
use crate::naming::{escape_reserved, sanitize_ident};
use crate::schema::{ClassDescriptor, MethodDescriptor};
use crate::type_map::type_discriminator;

/// A callable method with its final Rust name.
#[derive(Debug, Clone)]
pub struct ResolvedMethod<'a> {
    pub desc: &'a MethodDescriptor,
    pub rust_name: String,
}

/// Methods of `class` to expose as callable wrappers, in descriptor order.
///
/// Virtual methods are excluded (they become dispatch slots). Overloads, i.e.
/// several methods sharing a name with different argument types, are renamed
/// `name_<discriminator>` where the discriminator is derived from the
/// argument types. Names that still collide get a `_2`, `_3`, ... suffix
/// handed out in hash order, so the names never depend on descriptor order.
pub fn callable_methods<'a>(ctx: &CodegenContext<'_>, class: &'a ClassDescriptor) -> Vec<ResolvedMethod<'a>> {
    let selected: Vec<&MethodDescriptor> = class
        .methods
        .iter()
        .filter(|m| !m.is_virtual)
        .filter(|m| {
            let blocked = ctx.is_method_blocked(&class.name, &m.name);
            if blocked {
                log::info!("blocklisted method `{}.{}` skipped", class.name, m.name);
            }
            !blocked
        })
        .collect();

    let mut by_name: BTreeMap<&str, usize> = BTreeMap::new();
    for m in &selected {
        *by_name.entry(m.name.as_str()).or_default() += 1;
    }

    let mut order: Vec<usize> = (0..selected.len()).collect();
    order.sort_by_key(|&i| (selected[i].name.as_str(), selected[i].hash, i));

    let mut taken: BTreeSet<String> = BTreeSet::new();
    let mut names = vec![String::new(); selected.len()];
    for i in order {
        let m = selected[i];
        let base = if by_name[m.name.as_str()] > 1 {
            overload_name(m)
        } else {
            m.name.clone()
        };
        let base = sanitize_ident(&base);
        let mut name = escape_reserved(&base);
        let mut n = 2;
        while !taken.insert(name.clone()) {
            name = escape_reserved(&format!("{base}_{n}"));
            n += 1;
        }
        names[i] = name;
    }

    selected
        .into_iter()
        .zip(names)
        .map(|(desc, rust_name)| ResolvedMethod { desc, rust_name })
        .collect()
}

/// Virtual methods of `class`, sorted by name.
pub fn virtual_methods(class: &ClassDescriptor) -> Vec<&MethodDescriptor> {
    let mut v: Vec<&MethodDescriptor> = class.methods.iter().filter(|m| m.is_virtual).collect();
    v.sort_by(|a, b| a.name.cmp(&b.name));
    v
}

fn overload_name(m: &MethodDescriptor) -> String {
    if m.arguments.is_empty() {
        return format!("{}_none", m.name);
    }
    let parts: Vec<String> = m.arguments.iter().map(|a| type_discriminator(&a.type_name)).collect();
    format!("{}_{}", m.name, parts.join("_"))
}
