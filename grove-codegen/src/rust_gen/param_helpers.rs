// Shared parameter and return handling for class methods and utility functions.

use crate::context::CodegenContext;
use crate::defaults;
use crate::error::GenResult;
use crate::naming::{escape_reserved, sanitize_ident, to_snake_case};
use crate::schema::{Argument, ReturnOwnership};
use crate::type_map::{self, TypeKind};

/// Names used by generated bodies; arguments are renamed around them.
const BODY_LOCALS: &[&str] = &["ctx", "args", "ret", "varargs"];

/// Rendered argument list of one wrapper.
#[derive(Debug, Default)]
pub struct ParamPlan {
    /// `a: T, b: Option<U>`; empty when there are no parameters.
    pub signature: String,
    /// Statements resolving defaulted arguments before the call.
    pub prelude: String,
    /// Expressions encoding each argument as a Variant, in order.
    pub encoded: Vec<String>,
    pub vararg: bool,
}

impl ParamPlan {
    /// `args` construction statements, indented by `indent`.
    pub fn args_statement(&self, indent: &str) -> String {
        let list = self.encoded.join(", ");
        if self.vararg {
            format!(
                "{indent}let mut args = vec![{list}];\n{indent}args.extend_from_slice(varargs);\n"
            )
        } else {
            format!("{indent}let args = [{list}];\n")
        }
    }
}

pub fn param_name(name: &str) -> String {
    let snake = escape_reserved(&sanitize_ident(&to_snake_case(name)));
    if BODY_LOCALS.contains(&snake.as_str()) {
        format!("{snake}_")
    } else {
        snake
    }
}

/// Map arguments to wrapper parameters. Arguments with a representable
/// default become `Option<T>` once every following argument is defaulted too.
pub fn plan_params(
    ctx: &CodegenContext<'_>,
    arguments: &[Argument],
    vararg: bool,
    owner: &str,
    indent: &str,
) -> GenResult<ParamPlan> {
    let mut mapped = Vec::with_capacity(arguments.len());
    for arg in arguments {
        let context = format!("argument `{}` of `{owner}`", arg.name);
        let m = type_map::map_type(ctx, &arg.type_name, arg.meta.as_deref(), arg.nullable, &context)?;
        let default = arg
            .default_value
            .as_deref()
            .and_then(|lit| defaults::parse_default(ctx, &arg.type_name, &m, lit));
        if arg.default_value.is_some() && default.is_none() {
            log::debug!("default of {context} is not representable; argument stays required");
        }
        mapped.push((arg, m, default));
    }

    // Only a trailing run of defaults can be optional.
    let mut optional_from = mapped.len();
    while optional_from > 0 && mapped[optional_from - 1].2.is_some() {
        optional_from -= 1;
    }

    let mut plan = ParamPlan {
        vararg,
        ..ParamPlan::default()
    };
    let mut params = Vec::with_capacity(mapped.len() + 1);
    for (i, (arg, m, default)) in mapped.iter().enumerate() {
        let name = param_name(&arg.name);
        match default {
            Some(d) if i >= optional_from => {
                let inner = &m.param_type;
                params.push(format!("{name}: Option<{inner}>"));
                if d.needs_binding {
                    plan.prelude.push_str(&format!(
                        "{indent}let __default_{name} = {};\n{indent}let {name} = {name}.unwrap_or(&__default_{name});\n",
                        d.expr
                    ));
                } else {
                    plan.prelude
                        .push_str(&format!("{indent}let {name} = {name}.unwrap_or({});\n", d.expr));
                }
            }
            _ => params.push(format!("{name}: {}", m.param_type)),
        }
        plan.encoded.push(encode_expr(&name, m.kind));
    }
    if vararg {
        params.push("varargs: &[grove_runtime::Variant]".to_string());
    }
    plan.signature = params.join(", ");
    Ok(plan)
}

fn encode_expr(name: &str, kind: TypeKind) -> String {
    match kind {
        // Already references or slices.
        TypeKind::TypedArray => format!("grove_runtime::ToVariant::to_variant({name})"),
        _ => format!("grove_runtime::ToVariant::to_variant(&{name})"),
    }
}

/// Rendered return handling.
#[derive(Debug)]
pub struct ReturnPlan {
    /// `T` inside `GroveResult<T>`.
    pub rust_type: String,
    pub is_void: bool,
}

impl ReturnPlan {
    /// Tail of a wrapper body given the call expression (without `?`).
    pub fn tail(&self, call: &str, indent: &str) -> String {
        if self.is_void {
            format!("{indent}{call}?;\n{indent}Ok(())\n")
        } else {
            format!("{indent}let ret = {call}?;\n{indent}grove_runtime::FromVariant::from_variant(&ret)\n")
        }
    }
}

pub fn plan_return(
    ctx: &CodegenContext<'_>,
    ty: Option<&str>,
    meta: Option<&str>,
    owner: &str,
) -> GenResult<ReturnPlan> {
    match ty {
        None | Some("void") | Some("Nil") => Ok(ReturnPlan {
            rust_type: "()".to_string(),
            is_void: true,
        }),
        Some(ty) => {
            let m = type_map::map_type(ctx, ty, meta, true, &format!("return value of `{owner}`"))?;
            Ok(ReturnPlan {
                rust_type: m.rust_type,
                is_void: false,
            })
        }
    }
}

/// Ownership of a returned object reference: explicit in the descriptor, or
/// inferred as owned for reference-counted classes.
pub fn return_transfer(ctx: &CodegenContext<'_>, ty: Option<&str>, explicit: Option<ReturnOwnership>) -> &'static str {
    let owned = match explicit {
        Some(ReturnOwnership::Owned) => true,
        Some(ReturnOwnership::Borrowed) => false,
        None => ty.is_some_and(|t| ctx.classes.contains_key(t) && ctx.is_refcounted(t)),
    };
    if owned {
        "grove_runtime::Transfer::Owned"
    } else {
        "grove_runtime::Transfer::Borrowed"
    }
}
