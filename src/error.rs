//! Error types for schema resolution and code generation

use thiserror::Error;

use crate::graph::TypePath;

/// Result type for generator operations
pub type Result<T> = std::result::Result<T, GeneratorError>;

/// Generator errors
///
/// Every failure in the resolution engine is fatal: a half-resolved type
/// graph is unsafe to emit, so there is no partial-success output mode.
/// Components return these values instead of terminating the process; the
/// binary is the single boundary that decides exit behavior.
#[derive(Error, Debug)]
pub enum GeneratorError {
    #[error("cannot generate an identifier from \"{input}\"")]
    EmptyIdentifier { input: String },

    #[error("cannot resolve schema paths: {}", join_paths(.paths))]
    Unresolvable { paths: Vec<TypePath> },

    #[error("cannot disambiguate type names at: {}", join_paths(.paths))]
    AmbiguousNames { paths: Vec<TypePath> },

    #[error("schema at {path} declares both properties and an additionalProperties schema")]
    UnsupportedObject { path: TypePath },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

fn join_paths(paths: &[TypePath]) -> String {
    paths
        .iter()
        .map(|p| p.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}
