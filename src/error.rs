//! Error types for schema import and the runtime object engine

use thiserror::Error;

/// Result type for schema-import operations
pub type ImportResult<T> = std::result::Result<T, ImportError>;

/// Result type for runtime object operations
pub type ObjectResult<T> = std::result::Result<T, ObjectError>;

/// Errors raised while importing a schema document into a type registry
#[derive(Error, Debug)]
pub enum ImportError {
    #[error("unknown type: {name}")]
    UnknownType { name: String },

    #[error("ambiguous reference {name}: matches {}", candidates.join(", "))]
    AmbiguousReference { name: String, candidates: Vec<String> },

    #[error("circular dependency on {name} (resolution stack: {})", stack.join(" -> "))]
    CircularDependency { name: String, stack: Vec<String> },

    #[error("unresolvable name conflict: {name}")]
    UnresolvableConflict { name: String },

    #[error("invalid schema document: {0}")]
    InvalidDocument(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors raised by typed-object access and merging
#[derive(Error, Debug)]
pub enum ObjectError {
    #[error("unknown field {field:?} on {type_name}")]
    UnknownField { type_name: String, field: String },

    #[error("cannot coerce {given} into {expected}")]
    TypeCoercion { expected: String, given: String },

    #[error("field {field:?} is read-only: fixed value {expected:?}, got {given:?}")]
    ReadOnlyField { field: String, expected: String, given: String },

    #[error("{type_name} is not an API resource type")]
    NotApiResource { type_name: String },

    #[error("no registered type for apiVersion {api_version:?} kind {kind:?}")]
    UnknownKind { api_version: String, kind: String },
}
