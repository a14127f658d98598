// grove-macros: proc macros for #[gclass], #[gclass_impl], #[derive(ExportEnum)].
//
// Expansions refer to `::grove::runtime`, `::grove::ffi` and
// `::grove::__inventory`, so user crates depend on `grove`, not on the
// individual workspace crates.

mod export_enum;
mod gclass;
mod gclass_impl;
mod hints;
mod naming;

/// Attribute macro registering a Rust struct as an extension class.
///
/// # Example
/// ```ignore
/// #[gclass(base = Node3D)]
/// pub struct Turret {
///     base: Base<Turret>,
///
///     #[export(range(0, 360, 5))]
///     yaw: f64,
///
///     #[group("Ammo", prefix = "ammo_")]
///     #[export]
///     #[init(val = 30)]
///     ammo_count: i64,
///
///     // Host-only state, `Default::default()` at construction.
///     cooldown: f64,
/// }
/// ```
#[proc_macro_attribute]
pub fn gclass(attr: proc_macro::TokenStream, item: proc_macro::TokenStream) -> proc_macro::TokenStream {
    match gclass::expand_gclass(attr.into(), item.into()) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

/// Attribute macro for an impl block on a `#[gclass]` struct.
/// Methods marked `#[func]` are callable from the engine; `#[vfunc]` methods
/// override engine virtuals (`fn ready` overrides `_ready`).
///
/// # Example
/// ```ignore
/// #[gclass_impl]
/// impl Turret {
///     #[func]
///     fn fire(&mut self, count: i64) -> bool {
///         self.ammo_count -= count;
///         self.ammo_count >= 0
///     }
///
///     #[vfunc]
///     fn process(&mut self, delta: f64) {
///         self.cooldown -= delta;
///     }
///
///     fn helper(&self) -> f64 { self.yaw * 2.0 }  // plain Rust method
/// }
/// ```
#[proc_macro_attribute]
pub fn gclass_impl(attr: proc_macro::TokenStream, item: proc_macro::TokenStream) -> proc_macro::TokenStream {
    match gclass_impl::expand_gclass_impl(attr.into(), item.into()) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

/// Derive for fieldless enums usable as exported members and method
/// arguments. The enum must also derive `Clone` and `Copy`.
///
/// # Example
/// ```ignore
/// #[derive(Clone, Copy, ExportEnum)]
/// enum FireMode {
///     Single = 0,
///     Burst = 3,
///     Auto = 10,
/// }
/// ```
#[proc_macro_derive(ExportEnum)]
pub fn derive_export_enum(item: proc_macro::TokenStream) -> proc_macro::TokenStream {
    match export_enum::expand_export_enum(item.into()) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}
