// Configuration types for grove-codegen, deserialized from grove.toml.

use serde::Deserialize;

/// Top-level config file.
#[derive(Debug, Deserialize)]
pub struct GroveConfig {
    pub codegen: CodegenConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CodegenConfig {
    /// Path to extension_api.json, relative to the config file.
    pub descriptor: String,
    /// Output directory for generated Rust sources, relative to the config file.
    pub out_dir: String,
    #[serde(default = "default_min_minor")]
    pub min_minor: u32,
    #[serde(default = "default_max_minor")]
    pub max_minor: u32,
    #[serde(default)]
    pub blocklist: Blocklist,
}

fn default_min_minor() -> u32 {
    2
}

fn default_max_minor() -> u32 {
    4
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Blocklist {
    #[serde(default)]
    pub classes: Vec<String>,
    /// Method blocklist in "Class.method" format.
    #[serde(default)]
    pub methods: Vec<String>,
}

impl Blocklist {
    /// Parse method blocklist entries into (class, method) tuples.
    pub fn method_tuples(&self) -> Vec<(String, String)> {
        self.methods
            .iter()
            .filter_map(|entry| {
                let (class, method) = entry.split_once('.')?;
                Some((class.to_string(), method.to_string()))
            })
            .collect()
    }

    pub fn blocks_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }
}

/// Options that shape a single generation run, independent of file paths.
#[derive(Debug, Clone)]
pub struct CodegenOptions {
    pub min_minor: u32,
    pub max_minor: u32,
    pub blocklist: Blocklist,
}

impl Default for CodegenOptions {
    fn default() -> Self {
        CodegenOptions {
            min_minor: default_min_minor(),
            max_minor: default_max_minor(),
            blocklist: Blocklist::default(),
        }
    }
}

impl CodegenConfig {
    pub fn options(&self) -> CodegenOptions {
        CodegenOptions {
            min_minor: self.min_minor,
            max_minor: self.max_minor,
            blocklist: self.blocklist.clone(),
        }
    }
}
