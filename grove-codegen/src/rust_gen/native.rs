// Native structures: `#[repr(C)]` mirrors of engine structs exchanged by pointer.
//
// The descriptor format is a `;`-separated C declaration list, e.g.
// `Vector3 position;Vector3 normal;ObjectID collider_id;Object *collider;int shape`.

use crate::error::{GenResult, GenerationError};
use crate::naming::{escape_reserved, sanitize_ident};
use crate::schema::NativeStructureDescriptor;
use crate::type_map::builtin_info;

fn c_type(ty: &str) -> Option<&'static str> {
    Some(match ty {
        "bool" => "bool",
        "int8_t" => "i8",
        "uint8_t" => "u8",
        "int16_t" => "i16",
        "uint16_t" => "u16",
        "int" | "int32_t" => "i32",
        "uint32_t" => "u32",
        "int64_t" => "i64",
        "uint64_t" | "ObjectID" => "u64",
        "float" | "real_t" => "f32",
        "double" => "f64",
        "char32_t" => "u32",
        _ => return None,
    })
}

/// One parsed field: Rust name and Rust type.
fn parse_field(owner: &str, decl: &str) -> GenResult<(String, String)> {
    let invalid = || GenerationError::InvalidNativeStructure {
        name: owner.to_string(),
        field: decl.to_string(),
    };
    // Defaults (`float x = 1.0`) do not affect layout.
    let decl = decl.split('=').next().unwrap_or(decl).trim();
    let (ty, name) = decl.rsplit_once(' ').ok_or_else(invalid)?;
    let mut ty = ty.trim().to_string();
    let mut name = name.trim();
    while let Some(rest) = name.strip_prefix('*') {
        ty.push('*');
        name = rest;
    }

    let (name, array_len) = match name.split_once('[') {
        Some((n, len)) => {
            let len: usize = len.trim_end_matches(']').parse().map_err(|_| invalid())?;
            (n, Some(len))
        }
        None => (name, None),
    };
    if name.is_empty() {
        return Err(invalid());
    }

    let ty = ty.trim();
    let rust = if ty.ends_with('*') {
        "*mut std::ffi::c_void".to_string()
    } else if let Some(t) = c_type(ty) {
        t.to_string()
    } else {
        match builtin_info(ty) {
            // Only plain-data builtins have a stable C layout.
            Some(info) if info.param.is_none() && info.rust != "()" => info.rust.to_string(),
            _ => return Err(invalid()),
        }
    };
    let rust = match array_len {
        Some(len) => format!("[{rust}; {len}]"),
        None => rust,
    };
    Ok((escape_reserved(&sanitize_ident(name)), rust))
}

pub fn generate_native_struct(s: &NativeStructureDescriptor) -> GenResult<String> {
    let mut out = format!(
        "/// Engine native structure `{}`.\n\
         #[repr(C)]\n\
         #[derive(Debug, Clone, Copy)]\n\
         pub struct {} {{\n",
        s.name,
        sanitize_ident(&s.name)
    );
    for decl in s.format.split(';').map(str::trim).filter(|d| !d.is_empty()) {
        let (name, ty) = parse_field(&s.name, decl)?;
        out.push_str(&format!("    pub {name}: {ty},\n"));
    }
    out.push_str("}\n");
    Ok(out)
}
