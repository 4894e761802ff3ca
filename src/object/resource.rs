//! API Resources
//!
//! A directly-creatable API object carries its `apiVersion`/`kind` identity
//! in the backing map from construction and always has a metadata name.
//! [`KindRegistry`] is the explicit dispatch table from wire identity to
//! generated type, built once at startup from the set of generated types.

use std::collections::HashMap;

use tracing::debug;

use crate::error::{ObjectError, ObjectResult};
use crate::object::value::Value;
use crate::object::{TypeSpec, TypedObject};

impl TypedObject {
    /// Construct an API resource instance. The fixed `apiVersion`/`kind`
    /// literals are written into the backing map; `name` lands in
    /// `metadata.name`, auto-vivifying `metadata`. A `namespace` is written
    /// only when the resource kind is namespace-scoped.
    pub fn new_api(
        spec: &'static TypeSpec,
        name: &str,
        namespace: Option<&str>,
    ) -> ObjectResult<Self> {
        let api = spec
            .api
            .ok_or_else(|| ObjectError::NotApiResource { type_name: spec.name.to_string() })?;

        let mut obj = Self::with_identity(spec)?;
        obj.get_object("metadata")?.set("name", name)?;
        if let Some(namespace) = namespace {
            if api.namespaced {
                obj.get_object("metadata")?.set("namespace", namespace)?;
            }
        }
        obj.clear_auto_created("metadata");
        Ok(obj)
    }

    /// A bare instance with only the identity literals injected
    pub(crate) fn with_identity(spec: &'static TypeSpec) -> ObjectResult<Self> {
        let api = spec
            .api
            .ok_or_else(|| ObjectError::NotApiResource { type_name: spec.name.to_string() })?;
        let mut obj = TypedObject::new(spec);
        obj.store_mut().insert("apiVersion".to_string(), Value::from(api.api_version));
        obj.store_mut().insert("kind".to_string(), Value::from(api.kind));
        Ok(obj)
    }
}

/// Dispatch table from `(apiVersion, kind)` to generated type
#[derive(Debug, Default)]
pub struct KindRegistry {
    types: HashMap<(String, String), &'static TypeSpec>,
}

impl KindRegistry {
    /// Build the registry from the set of generated types; non-resource
    /// types are skipped.
    pub fn new(specs: impl IntoIterator<Item = &'static TypeSpec>) -> Self {
        let mut types = HashMap::new();
        for spec in specs {
            if let Some(api) = spec.api {
                types.insert((api.api_version.to_string(), api.kind.to_string()), spec);
            }
        }
        Self { types }
    }

    pub fn lookup(&self, api_version: &str, kind: &str) -> Option<&'static TypeSpec> {
        self.types.get(&(api_version.to_string(), kind.to_string())).copied()
    }

    /// Construct a typed instance from an arbitrary wire document
    pub fn from_document(
        &self,
        doc: &serde_json::Map<String, serde_json::Value>,
    ) -> ObjectResult<TypedObject> {
        let api_version = doc.get("apiVersion").and_then(|v| v.as_str()).unwrap_or_default();
        let kind = doc.get("kind").and_then(|v| v.as_str()).unwrap_or_default();
        let spec = self.lookup(api_version, kind).ok_or_else(|| ObjectError::UnknownKind {
            api_version: api_version.to_string(),
            kind: kind.to_string(),
        })?;

        debug!(api_version, kind, type_name = spec.name, "constructing from wire document");
        let mut obj = TypedObject::with_identity(spec)?;
        obj.update(doc)?;
        Ok(obj)
    }
}
