// Rust class generation: marker types, GodotClass impls, method tables,
// extension traits with method and property wrappers.

use std::collections::BTreeSet;

use crate::context::{CodegenContext, ROOT_CLASS};
use crate::error::{GenResult, GenerationError};
use crate::filter::{self, ResolvedMethod};
use crate::naming::{escape_reserved, module_name, sanitize_ident};
use crate::schema::*;

use super::enums;
use super::param_helpers::{self, plan_params, plan_return, return_transfer};
use super::MethodIndex;

const INDENT: &str = "        ";

/// Name of the `MethodInfo` static for a resolved wrapper name.
pub fn static_name(rust_name: &str) -> String {
    rust_name.trim_start_matches("r#").to_uppercase()
}

fn method_flags(m: &MethodDescriptor) -> u32 {
    let mut flags = grove_flags::METHOD_FLAG_NORMAL;
    if m.is_const {
        flags |= grove_flags::METHOD_FLAG_CONST;
    }
    if m.is_vararg {
        flags |= grove_flags::METHOD_FLAG_VARARG;
    }
    if m.is_static {
        flags |= grove_flags::METHOD_FLAG_STATIC;
    }
    if m.is_virtual {
        flags |= grove_flags::METHOD_FLAG_VIRTUAL;
    }
    if m.is_required {
        flags |= grove_flags::METHOD_FLAG_VIRTUAL_REQUIRED;
    }
    flags
}

/// Generate the module for one engine class.
pub fn generate_class(
    ctx: &CodegenContext<'_>,
    index: &MethodIndex<'_>,
    class: &ClassDescriptor,
) -> GenResult<String> {
    let name = &class.name;
    let refcounted = ctx.is_refcounted(name);
    let methods = index.methods(name);
    let mut out = String::with_capacity(8192);

    out.push_str(&format!("/// Engine class `{name}`.\npub struct {name};\n\n"));

    let parent = class.inherits.as_deref().filter(|p| !p.is_empty());
    let memory = if refcounted { "RefCounted" } else { "Manual" };
    let inherits_expr = match parent {
        Some(p) => format!(
            "class_name == Self::CLASS_NAME\n\
             \x20           || <crate::classes::{p} as grove_runtime::GodotClass>::inherits(class_name)"
        ),
        None => "class_name == Self::CLASS_NAME".to_string(),
    };
    out.push_str(&format!(
        "impl grove_runtime::GodotClass for {name} {{\n\
         \x20   const CLASS_NAME: &'static str = \"{name}\";\n\
         \x20   const MEMORY: grove_runtime::Memory = grove_runtime::Memory::{memory};\n\
         \x20   const INSTANTIABLE: bool = {};\n\n\
         \x20   fn inherits(class_name: &str) -> bool {{\n\
         \x20       {inherits_expr}\n\
         \x20   }}\n\
         }}\n\n",
        class.is_instantiable
    ));

    if let Some(p) = parent {
        out.push_str(&format!(
            "impl grove_runtime::HasParent for {name} {{\n\
             \x20   type Parent = crate::classes::{p};\n\
             }}\n\n"
        ));
    } else if name != ROOT_CLASS {
        return Err(GenerationError::BrokenChain(name.clone()));
    }

    generate_inherent_impl(ctx, class, methods, &mut out)?;

    for e in &class.enums {
        out.push_str(&enums::generate_enum(e, &format!("{name}.{}", e.name)));
        out.push('\n');
    }

    generate_method_table(ctx, class, methods, &mut out);
    generate_virtual_slots(class, &mut out);

    out.push_str(&format!(
        "pub const META: grove_runtime::EngineClassMeta = grove_runtime::EngineClassMeta {{\n\
         \x20   name: \"{name}\",\n\
         \x20   parent: {},\n\
         \x20   refcounted: {refcounted},\n\
         \x20   instantiable: {},\n\
         \x20   virtuals: VIRTUALS,\n\
         }};\n\n",
        match parent {
            Some(p) => format!("Some(\"{p}\")"),
            None => "None".to_string(),
        },
        class.is_instantiable
    ));

    generate_ext_trait(ctx, index, class, methods, &mut out)?;
    Ok(out)
}

fn generate_inherent_impl(
    ctx: &CodegenContext<'_>,
    class: &ClassDescriptor,
    methods: &[ResolvedMethod<'_>],
    out: &mut String,
) -> GenResult<()> {
    let name = &class.name;
    out.push_str(&format!("impl {name} {{\n"));

    for c in &class.constants {
        out.push_str(&format!("    pub const {}: i64 = {};\n", sanitize_ident(&c.name), c.value));
    }
    if !class.signals.is_empty() {
        let list: Vec<String> = class.signals.iter().map(|s| format!("\"{}\"", s.name)).collect();
        out.push_str(&format!(
            "    /// Signals declared by `{name}` itself.\n    pub const SIGNALS: &'static [&'static str] = &[{}];\n",
            list.join(", ")
        ));
    }
    if !class.constants.is_empty() || !class.signals.is_empty() {
        out.push('\n');
    }

    if class.is_instantiable {
        out.push_str(
            "    /// Construct a new instance owned by the host.\n\
             \x20   pub fn new(\n\
             \x20       ctx: &std::sync::Arc<grove_runtime::EngineContext>,\n\
             \x20   ) -> grove_runtime::GroveResult<grove_runtime::Gd<Self>> {\n\
             \x20       ctx.construct::<Self>()\n\
             \x20   }\n\n",
        );
    }

    let singletons: Vec<&SingletonDescriptor> = ctx
        .descriptor
        .singletons
        .iter()
        .filter(|s| s.class_type == *name)
        .collect();
    for s in &singletons {
        let fn_name = if singletons.len() == 1 {
            "singleton".to_string()
        } else {
            format!("singleton_{}", module_name(&s.name))
        };
        out.push_str(&format!(
            "    /// The engine-wide `{}` instance.\n\
             \x20   pub fn {fn_name}(\n\
             \x20       ctx: &std::sync::Arc<grove_runtime::EngineContext>,\n\
             \x20   ) -> grove_runtime::GroveResult<grove_runtime::Gd<Self>> {{\n\
             \x20       ctx.singleton::<Self>(\"{}\")\n\
             \x20   }}\n\n",
            s.name, s.name
        ));
    }

    for rm in methods.iter().filter(|m| m.desc.is_static) {
        let m = rm.desc;
        let owner = format!("{name}.{}", m.name);
        let params = plan_params(ctx, &m.arguments, m.is_vararg, &owner, INDENT)?;
        let ret = plan_return(ctx, return_type(m), return_meta(m), &owner)?;
        let sig = if params.signature.is_empty() {
            String::new()
        } else {
            format!(", {}", params.signature)
        };
        out.push_str(&format!(
            "    pub fn {}(ctx: &std::sync::Arc<grove_runtime::EngineContext>{sig}) -> grove_runtime::GroveResult<{}> {{\n",
            rm.rust_name, ret.rust_type
        ));
        out.push_str(&params.prelude);
        out.push_str(&args_statement(&params));
        out.push_str(&ret.tail(
            &format!("ctx.call_static(&methods::{}, &args)", static_name(&rm.rust_name)),
            INDENT,
        ));
        out.push_str("    }\n\n");
    }

    trim_blank_line(out);
    out.push_str("}\n\n");
    Ok(())
}

fn args_statement(params: &param_helpers::ParamPlan) -> String {
    if params.encoded.is_empty() && !params.vararg {
        format!("{INDENT}let args: [grove_runtime::Variant; 0] = [];\n")
    } else {
        params.args_statement(INDENT)
    }
}

fn trim_blank_line(out: &mut String) {
    if out.ends_with("\n\n") {
        out.pop();
    }
}

fn return_type(m: &MethodDescriptor) -> Option<&str> {
    m.return_value.as_ref().map(|r| r.type_name.as_str())
}

fn return_meta(m: &MethodDescriptor) -> Option<&str> {
    m.return_value.as_ref().and_then(|r| r.meta.as_deref())
}

fn generate_method_table(
    ctx: &CodegenContext<'_>,
    class: &ClassDescriptor,
    methods: &[ResolvedMethod<'_>],
    out: &mut String,
) {
    out.push_str("pub mod methods {\n");
    for rm in methods {
        let m = rm.desc;
        out.push_str(&format!(
            "    pub static {}: grove_runtime::MethodInfo = grove_runtime::MethodInfo {{\n\
             \x20       class: \"{}\",\n\
             \x20       name: \"{}\",\n\
             \x20       hash: {},\n\
             \x20       flags: {},\n\
             \x20       return_transfer: {},\n\
             \x20   }};\n",
            static_name(&rm.rust_name),
            class.name,
            m.name,
            m.hash.unwrap_or_default(),
            method_flags(m),
            return_transfer(ctx, return_type(m), m.return_ownership),
        ));
    }
    out.push_str("}\n\n");

    out.push_str("/// Every method table entry, for the ABI check at load.\n");
    if methods.is_empty() {
        out.push_str("pub static METHODS: &[&grove_runtime::MethodInfo] = &[];\n\n");
        return;
    }
    out.push_str("pub static METHODS: &[&grove_runtime::MethodInfo] = &[\n");
    for rm in methods {
        out.push_str(&format!("    &methods::{},\n", static_name(&rm.rust_name)));
    }
    out.push_str("];\n\n");
}

fn generate_virtual_slots(class: &ClassDescriptor, out: &mut String) {
    let virtuals = filter::virtual_methods(class);
    if virtuals.is_empty() {
        out.push_str("pub static VIRTUALS: &[grove_runtime::VirtualSlot] = &[];\n\n");
        return;
    }
    out.push_str("pub static VIRTUALS: &[grove_runtime::VirtualSlot] = &[\n");
    for m in virtuals {
        let returns_value = !matches!(return_type(m), None | Some("void") | Some("Nil"));
        out.push_str(&format!(
            "    grove_runtime::VirtualSlot {{\n\
             \x20       name: \"{}\",\n\
             \x20       hash: {},\n\
             \x20       required: {},\n\
             \x20       returns_value: {returns_value},\n\
             \x20   }},\n",
            m.name,
            m.hash.unwrap_or_default(),
            m.is_required,
        ));
    }
    out.push_str("];\n\n");
}

/// A resolved property accessor: the method to call and where its table lives.
struct Accessor<'a> {
    method: &'a MethodDescriptor,
    table_path: String,
}

fn resolve_accessor<'a>(
    ctx: &CodegenContext<'a>,
    index: &MethodIndex<'a>,
    class: &str,
    accessor: Option<&str>,
    expected_args: usize,
) -> Option<Accessor<'a>> {
    let accessor = accessor.filter(|a| !a.is_empty())?;
    let (decl, method) = ctx.find_method(class, accessor)?;
    if method.is_virtual || method.is_static || method.arguments.len() != expected_args {
        return None;
    }
    let rm = index
        .methods(&decl.name)
        .iter()
        .find(|rm| std::ptr::eq(rm.desc, method))?;
    Some(Accessor {
        method,
        table_path: format!(
            "crate::classes::{}::methods::{}",
            module_name(&decl.name),
            static_name(&rm.rust_name)
        ),
    })
}

fn generate_ext_trait(
    ctx: &CodegenContext<'_>,
    index: &MethodIndex<'_>,
    class: &ClassDescriptor,
    methods: &[ResolvedMethod<'_>],
    out: &mut String,
) -> GenResult<()> {
    let name = &class.name;
    let instance_methods: Vec<&ResolvedMethod<'_>> = methods.iter().filter(|m| !m.desc.is_static).collect();

    let mut taken: BTreeSet<String> = methods.iter().map(|m| m.rust_name.clone()).collect();
    let mut body = String::new();

    for prop in &class.properties {
        generate_property(ctx, index, class, prop, &mut taken, &mut body)?;
    }

    for rm in instance_methods {
        let m = rm.desc;
        let owner = format!("{name}.{}", m.name);
        let params = plan_params(ctx, &m.arguments, m.is_vararg, &owner, INDENT)?;
        let ret = plan_return(ctx, return_type(m), return_meta(m), &owner)?;
        let sig = if params.signature.is_empty() {
            String::new()
        } else {
            format!(", {}", params.signature)
        };
        body.push_str(&format!(
            "    fn {}(&self{sig}) -> grove_runtime::GroveResult<{}> {{\n",
            rm.rust_name, ret.rust_type
        ));
        body.push_str(&params.prelude);
        body.push_str(&args_statement(&params));
        body.push_str(&ret.tail(
            &format!(
                "self.object_ref().call(&crate::classes::{}::methods::{}, &args)",
                module_name(name),
                static_name(&rm.rust_name)
            ),
            INDENT,
        ));
        body.push_str("    }\n\n");
    }

    if body.is_empty() {
        return Ok(());
    }
    trim_blank_line(&mut body);

    out.push_str(&format!(
        "/// Methods and properties of `{name}`, available on `Gd<{name}>` and every subclass handle.\n\
         pub trait {name}Ext: grove_runtime::ValidHandle {{\n"
    ));
    out.push_str(&body);
    out.push_str("}\n\n");
    out.push_str(&format!("impl {name}Ext for grove_runtime::Gd<{name}> {{}}\n"));
    Ok(())
}

fn generate_property(
    ctx: &CodegenContext<'_>,
    index: &MethodIndex<'_>,
    class: &ClassDescriptor,
    prop: &PropertyDescriptor,
    taken: &mut BTreeSet<String>,
    out: &mut String,
) -> GenResult<()> {
    let indexed = prop.index.is_some();
    let base = escape_reserved(&sanitize_ident(&prop.name.replace('/', "_")));
    let index_arg = prop
        .index
        .map(|i| format!("grove_runtime::ToVariant::to_variant(&{i}i64), "))
        .unwrap_or_default();
    let owner = format!("{}.{}", class.name, prop.name);

    if let Some(getter) = resolve_accessor(ctx, index, &class.name, prop.getter.as_deref(), usize::from(indexed)) {
        if taken.insert(base.clone()) {
            let m = getter.method;
            let ret = plan_return(ctx, return_type(m), return_meta(m), &owner)?;
            if !ret.is_void {
                out.push_str(&format!(
                    "    /// Property `{}`.\n    fn {base}(&self) -> grove_runtime::GroveResult<{}> {{\n",
                    prop.name, ret.rust_type
                ));
                if indexed {
                    out.push_str(&format!("{INDENT}let args = [{}];\n", index_arg.trim_end_matches(", ")));
                } else {
                    out.push_str(&format!("{INDENT}let args: [grove_runtime::Variant; 0] = [];\n"));
                }
                out.push_str(&ret.tail(&format!("self.object_ref().call(&{}, &args)", getter.table_path), INDENT));
                out.push_str("    }\n\n");
            }
        } else {
            log::debug!("getter for `{owner}` collides with a method and is not generated");
        }
    }

    let setter_name = format!("set_{}", base.trim_start_matches("r#"));
    if let Some(setter) = resolve_accessor(ctx, index, &class.name, prop.setter.as_deref(), 1 + usize::from(indexed)) {
        if taken.insert(setter_name.clone()) {
            let value_arg = setter.method.arguments.last();
            if let Some(value_arg) = value_arg {
                let mapped = crate::type_map::map_type(
                    ctx,
                    &value_arg.type_name,
                    value_arg.meta.as_deref(),
                    value_arg.nullable,
                    &format!("property `{owner}`"),
                )?;
                let encode = if mapped.kind == crate::type_map::TypeKind::TypedArray {
                    "grove_runtime::ToVariant::to_variant(value)"
                } else {
                    "grove_runtime::ToVariant::to_variant(&value)"
                };
                out.push_str(&format!(
                    "    /// Set property `{}`.\n    fn {setter_name}(&self, value: {}) -> grove_runtime::GroveResult<()> {{\n",
                    prop.name, mapped.param_type
                ));
                out.push_str(&format!("{INDENT}let args = [{index_arg}{encode}];\n"));
                out.push_str(&format!(
                    "{INDENT}self.object_ref().call(&{}, &args)?;\n{INDENT}Ok(())\n",
                    setter.table_path
                ));
                out.push_str("    }\n\n");
            }
        } else {
            log::debug!("setter for `{owner}` collides with a method and is not generated");
        }
    }
    Ok(())
}

/// Root `classes/mod.rs`: modules plus re-exports of each class and its trait.
pub fn generate_classes_mod(ctx: &CodegenContext<'_>, with_ext: &BTreeSet<String>) -> String {
    let mut out = String::new();
    for name in ctx.classes.keys() {
        out.push_str(&format!("pub mod {};\n", module_name(name)));
    }
    out.push('\n');
    for name in ctx.classes.keys() {
        let module = module_name(name);
        if with_ext.contains(*name) {
            out.push_str(&format!("pub use {module}::{{{name}, {name}Ext}};\n"));
        } else {
            out.push_str(&format!("pub use {module}::{name};\n"));
        }
    }
    out
}

/// Whether `generate_class` emitted an extension trait.
pub fn has_ext_trait(code: &str, class: &str) -> bool {
    code.contains(&format!("pub trait {class}Ext:"))
}

