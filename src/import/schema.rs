//! Raw Schema Document Model
//!
//! serde view of the subset of OpenAPI / JSON Schema that Kubernetes
//! definitions actually use: object/array/scalar/`$ref` plus the
//! `x-kubernetes-*` extensions. Both document flavors are supported: a
//! top-level `definitions` map (core API schema) and `components.schemas`
//! (single-CRD wrapping).

use indexmap::IndexMap;
use serde::Deserialize;

use crate::error::{ImportError, ImportResult};

/// One schema node in the document tree
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawSchema {
    /// JSON Schema `type` keyword
    #[serde(rename = "type")]
    pub schema_type: Option<String>,

    /// Format refinement for scalars (`int-or-string`, `byte`, `date-time`, ...)
    pub format: Option<String>,

    pub description: Option<String>,

    /// `$ref` to another definition
    #[serde(rename = "$ref")]
    pub reference: Option<String>,

    /// Declared object properties, in document order
    pub properties: IndexMap<String, RawSchema>,

    /// Names of required properties
    pub required: Vec<String>,

    /// Array element schema
    pub items: Option<Box<RawSchema>>,

    /// Map value schema (or a bare boolean allowing free-form values)
    #[serde(rename = "additionalProperties")]
    pub additional_properties: Option<Box<AdditionalProperties>>,

    /// Marks a directly-creatable API object and names its identity
    #[serde(rename = "x-kubernetes-group-version-kind")]
    pub group_version_kind: Vec<GroupVersionKind>,

    /// Opts the whole subtree out of typing
    #[serde(rename = "x-kubernetes-preserve-unknown-fields")]
    pub preserve_unknown_fields: bool,

    /// Shorthand for the IntOrString union
    #[serde(rename = "x-kubernetes-int-or-string")]
    pub int_or_string: bool,

    /// Externally supplied namespace-scoping flag (CRD import only)
    #[serde(rename = "x-scoped")]
    pub scoped: Option<bool>,
}

impl RawSchema {
    /// Whether this node is an object schema with declared properties
    pub fn is_object_with_properties(&self) -> bool {
        self.schema_type.as_deref() == Some("object") && !self.properties.is_empty()
    }

    /// Whether a property name is listed as required
    pub fn requires(&self, property: &str) -> bool {
        self.required.iter().any(|r| r == property)
    }
}

/// `additionalProperties` is either a value schema or a permissive boolean
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum AdditionalProperties {
    Schema(RawSchema),
    Allow(bool),
}

/// The `x-kubernetes-group-version-kind` extension entry
#[derive(Debug, Clone, Deserialize)]
pub struct GroupVersionKind {
    #[serde(default)]
    pub group: String,
    pub version: String,
    pub kind: String,
}

impl GroupVersionKind {
    /// The `apiVersion` literal written into wire documents
    pub fn api_version(&self) -> String {
        if self.group.is_empty() {
            self.version.clone()
        } else {
            format!("{}/{}", self.group, self.version)
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct Components {
    schemas: IndexMap<String, RawSchema>,
}

/// A loaded schema document: an ordered map of qualified keys to schemas
#[derive(Debug, Clone, Deserialize)]
pub struct SchemaDocument {
    #[serde(default)]
    definitions: IndexMap<String, RawSchema>,

    #[serde(default)]
    components: Components,
}

impl SchemaDocument {
    /// Parse a document from its JSON representation
    pub fn from_json(value: serde_json::Value) -> ImportResult<Self> {
        let doc: SchemaDocument = serde_json::from_value(value)?;
        if doc.entries().next().is_none() {
            return Err(ImportError::InvalidDocument(
                "no definitions or components.schemas present".to_string(),
            ));
        }
        Ok(doc)
    }

    /// All (qualified key, schema) pairs in document order
    pub fn entries(&self) -> impl Iterator<Item = (&str, &RawSchema)> {
        let named = if self.definitions.is_empty() {
            &self.components.schemas
        } else {
            &self.definitions
        };
        named.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Look up a schema by its fully-qualified key
    pub fn get(&self, key: &str) -> Option<&RawSchema> {
        self.definitions
            .get(key)
            .or_else(|| self.components.schemas.get(key))
    }
}

/// Strip the document-local pointer prefix from a `$ref` target
pub fn ref_key(reference: &str) -> &str {
    reference
        .strip_prefix("#/definitions/")
        .or_else(|| reference.strip_prefix("#/components/schemas/"))
        .unwrap_or(reference)
}
