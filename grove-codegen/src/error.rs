// Generation errors. Any of these aborts the run before a single file is written.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse descriptor {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("descriptor version {major}.{minor} is not supported (expected 4.{min_minor}..=4.{max_minor})")]
    IncompatibleVersion {
        major: u32,
        minor: u32,
        min_minor: u32,
        max_minor: u32,
    },

    #[error("descriptor precision `{0}` is not supported (expected `single`)")]
    UnsupportedPrecision(String),

    #[error("class `{class}` inherits unknown class `{parent}`")]
    UnknownParent { class: String, parent: String },

    #[error("inheritance cycle through {}", .0.join(" -> "))]
    InheritanceCycle(Vec<String>),

    #[error("class `{0}` has no parent but is not the root class `Object`")]
    BrokenChain(String),

    #[error("class `{class}` inherits blocklisted class `{blocked}`")]
    BlockedAncestor { class: String, blocked: String },

    #[error("duplicate {kind} `{name}` in {scope}")]
    DuplicateName {
        kind: &'static str,
        name: String,
        scope: String,
    },

    #[error("unknown type `{ty}` used by {context}")]
    UnknownType { ty: String, context: String },

    #[error("unsupported type kind `{kind}` in `{ty}` used by {context}")]
    UnsupportedTypeKind {
        kind: String,
        ty: String,
        context: String,
    },

    #[error("builtin class `{0}` has no runtime value type")]
    UnknownBuiltin(String),

    #[error("property `{class}.{property}` names accessor `{accessor}` which does not exist")]
    MissingAccessor {
        class: String,
        property: String,
        accessor: String,
    },

    #[error("method `{class}.{method}` has no ABI hash")]
    MissingHash { class: String, method: String },

    #[error("native structure `{name}` has an invalid field `{field}`")]
    InvalidNativeStructure { name: String, field: String },
}

pub type GenResult<T> = Result<T, GenerationError>;
