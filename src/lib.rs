//! kubedef
//!
//! A Kubernetes schema importer and typed object runtime. The crate has two
//! coupled halves:
//!
//! - **Schema import**: walks an OpenAPI-style document (the core API schema
//!   or a single CRD) and produces a closed, deduplicated,
//!   dependency-ordered registry of type definitions for code emission.
//!   Handles `$ref` cycles, synthesizes names for anonymous nested schemas,
//!   and resolves collisions between structurally different anonymous types.
//! - **Object runtime**: backs instances of the generated types with an
//!   ordered wire-keyed map while exposing a typed, name-translated surface
//!   with auto-vivification, per-element list coercion, and recursive merge
//!   from loose documents.
//!
//! ## Workflow
//!
//! ```text
//! SchemaDocument -> Importer::import("Certificate") -> Importer::finish()
//!                         |                                   |
//!                   TypeRegistry (topological)          ImportOutput -> emitter
//! ```
//!
//! At runtime, generated types contribute static [`object::TypeSpec`] tables
//! and wrap [`object::TypedObject`] for storage and merging.

pub mod error;
pub mod import;
pub mod names;
pub mod object;

pub use error::{ImportError, ImportResult, ObjectError, ObjectResult};
pub use import::{ImportOutput, Importer, SchemaDocument, TypeDef, TypeRegistry};
pub use object::{
    ApiIdentity, FieldDescriptor, KindRegistry, TypeSpec, TypedList, TypedObject, Value, ValueKind,
};
