// grove-codegen: reads the engine API descriptor, generates typed Rust bindings.

pub mod schema;
pub mod naming;
pub mod config;
pub mod context;
pub mod error;
pub mod type_map;
pub mod defaults;
pub mod filter;
pub mod rust_gen;

use std::path::{Path, PathBuf};

use crate::config::{CodegenOptions, GroveConfig};
use crate::context::CodegenContext;
use crate::error::{GenResult, GenerationError};
use crate::rust_gen::GeneratedFiles;
use crate::schema::Descriptor;

pub use crate::error::GenerationError as Error;

/// Read and parse an API descriptor.
pub fn load_descriptor(path: &Path) -> GenResult<Descriptor> {
    let data = std::fs::read_to_string(path).map_err(|source| GenerationError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&data).map_err(|source| GenerationError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Read and parse a `grove.toml`.
pub fn load_config(path: &Path) -> GenResult<GroveConfig> {
    let data = std::fs::read_to_string(path).map_err(|source| GenerationError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&data).map_err(|source| GenerationError::Toml {
        path: path.to_path_buf(),
        source,
    })
}

/// Validate `descriptor` and render the binding tree in memory.
pub fn generate(descriptor: &Descriptor, options: &CodegenOptions) -> GenResult<GeneratedFiles> {
    let ctx = CodegenContext::build(descriptor, options)?;
    log::info!(
        "descriptor {}.{}.{}: {} classes, {} global enums, {} utility functions",
        descriptor.header.version_major,
        descriptor.header.version_minor,
        descriptor.header.version_patch,
        ctx.classes.len(),
        ctx.global_enums.len(),
        descriptor.utility_functions.len()
    );
    rust_gen::generate(&ctx)
}

/// Generate bindings as one flattened source file, for build scripts.
pub fn generate_flat(descriptor_path: &Path, options: &CodegenOptions) -> GenResult<String> {
    let descriptor = load_descriptor(descriptor_path)?;
    Ok(generate(&descriptor, options)?.flatten())
}

/// Outcome of a generate or check run.
#[derive(Debug, Clone)]
pub struct GenerateSummary {
    pub classes: usize,
    pub files: usize,
    pub out_dir: PathBuf,
}

struct ResolvedConfig {
    descriptor: PathBuf,
    out_dir: PathBuf,
    options: CodegenOptions,
}

fn resolve_config(config_path: &Path) -> GenResult<ResolvedConfig> {
    let config = load_config(config_path)?;
    let config_dir = config_path.parent().unwrap_or(Path::new("."));
    Ok(ResolvedConfig {
        descriptor: config_dir.join(&config.codegen.descriptor),
        out_dir: config_dir.join(&config.codegen.out_dir),
        options: config.codegen.options(),
    })
}

/// Validate and render without writing anything.
pub fn run_check(config_path: &Path) -> GenResult<GenerateSummary> {
    let resolved = resolve_config(config_path)?;
    log::info!("checking {}", resolved.descriptor.display());
    let descriptor = load_descriptor(&resolved.descriptor)?;
    let files = generate(&descriptor, &resolved.options)?;
    Ok(GenerateSummary {
        classes: descriptor.classes.len(),
        files: files.len(),
        out_dir: resolved.out_dir,
    })
}

/// Run the generate command. Main entry point for codegen.
///
/// The output directory is replaced atomically from the caller's point of
/// view: files are written to a sibling directory which is swapped in only
/// after every file was written.
pub fn run_generate(config_path: &Path) -> GenResult<GenerateSummary> {
    let resolved = resolve_config(config_path)?;
    log::info!("loading {}", resolved.descriptor.display());
    let descriptor = load_descriptor(&resolved.descriptor)?;
    let files = generate(&descriptor, &resolved.options)?;

    let out_dir = &resolved.out_dir;
    let staging = staging_dir(out_dir);
    let io = |path: &Path| {
        let path = path.to_path_buf();
        move |source: std::io::Error| GenerationError::Io { path, source }
    };
    if staging.exists() {
        std::fs::remove_dir_all(&staging).map_err(io(&staging))?;
    }
    files.write_to(&staging)?;
    if out_dir.exists() {
        std::fs::remove_dir_all(out_dir).map_err(io(out_dir))?;
    }
    std::fs::rename(&staging, out_dir).map_err(io(out_dir))?;

    log::info!("wrote {} files to {}", files.len(), out_dir.display());
    Ok(GenerateSummary {
        classes: descriptor.classes.len(),
        files: files.len(),
        out_dir: resolved.out_dir,
    })
}

fn staging_dir(out_dir: &Path) -> PathBuf {
    let mut name = out_dir
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "generated".into());
    name.push(".grove-tmp");
    out_dir.with_file_name(name)
}
