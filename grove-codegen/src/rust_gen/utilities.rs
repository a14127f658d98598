// Global utility function wrappers.

use crate::context::CodegenContext;
use crate::error::GenResult;
use crate::naming::{escape_reserved, sanitize_ident};

use super::classes::static_name;
use super::param_helpers::{plan_params, plan_return};

const INDENT: &str = "    ";

pub fn generate_utilities(ctx: &CodegenContext<'_>) -> GenResult<String> {
    let functions = &ctx.descriptor.utility_functions;
    let mut table = String::from("pub mod infos {\n");
    let mut wrappers = String::new();

    for f in functions {
        let rust_name = escape_reserved(&sanitize_ident(&f.name));
        let info = static_name(&rust_name);
        let mut flags = grove_flags::METHOD_FLAG_NORMAL | grove_flags::METHOD_FLAG_STATIC;
        if f.is_vararg {
            flags |= grove_flags::METHOD_FLAG_VARARG;
        }
        table.push_str(&format!(
            "    pub static {info}: grove_runtime::MethodInfo = grove_runtime::MethodInfo {{\n\
             \x20       class: grove_runtime::GLOBAL_SCOPE,\n\
             \x20       name: \"{}\",\n\
             \x20       hash: {},\n\
             \x20       flags: {flags},\n\
             \x20       return_transfer: grove_runtime::Transfer::Borrowed,\n\
             \x20   }};\n",
            f.name, f.hash
        ));

        let owner = format!("@GlobalScope.{}", f.name);
        let params = plan_params(ctx, &f.arguments, f.is_vararg, &owner, INDENT)?;
        let ret = plan_return(ctx, f.return_type.as_deref(), None, &owner)?;
        let sig = if params.signature.is_empty() {
            String::new()
        } else {
            format!(", {}", params.signature)
        };
        if !f.category.is_empty() {
            wrappers.push_str(&format!("/// `{}` utility `{}`.\n", f.category, f.name));
        }
        wrappers.push_str(&format!(
            "pub fn {rust_name}(ctx: &std::sync::Arc<grove_runtime::EngineContext>{sig}) -> grove_runtime::GroveResult<{}> {{\n",
            ret.rust_type
        ));
        wrappers.push_str(&params.prelude);
        if params.encoded.is_empty() && !params.vararg {
            wrappers.push_str(&format!("{INDENT}let args: [grove_runtime::Variant; 0] = [];\n"));
        } else {
            wrappers.push_str(&params.args_statement(INDENT));
        }
        wrappers.push_str(&ret.tail(&format!("ctx.call_static(&infos::{info}, &args)"), INDENT));
        wrappers.push_str("}\n\n");
    }
    table.push_str("}\n");

    let mut out = wrappers;
    out.push_str(&table);
    Ok(out)
}
