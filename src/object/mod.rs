//! Runtime Object Engine
//!
//! Generated types are thin shells around this engine: each type contributes
//! a static field-descriptor table ([`TypeSpec`], emitted by the code
//! generator with inherited fields already flattened in), and every instance
//! wraps an ordered wire-keyed map plus that table. Attribute access
//! translates identifier names to wire keys, auto-vivifies nested and
//! collection fields on first read, and coerces loose values on writes.

pub mod list;
pub mod merge;
pub mod resource;
pub mod value;

use std::collections::HashSet;

use indexmap::IndexMap;

use crate::error::{ObjectError, ObjectResult};
use crate::names::{camel_to_snake, snake_to_camel};
pub use list::TypedList;
pub use resource::KindRegistry;
pub use value::Value;

/// Fixed identity of a directly-creatable API object
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApiIdentity {
    /// The `apiVersion` wire literal, e.g. `"cert-manager.io/v1"`
    pub api_version: &'static str,
    pub kind: &'static str,
    /// Whether instances live inside a namespace
    pub namespaced: bool,
}

/// What a field holds, from the generated descriptor table
#[derive(Debug, Clone, Copy)]
pub enum ValueKind {
    /// Scalars, unions, and untyped collections: stored verbatim
    Scalar,
    /// A nested typed object
    Nested(&'static TypeSpec),
    /// A typed list of nested objects
    ListOf(&'static TypeSpec),
    /// A plain string-keyed map with scalar values
    MapOf,
}

/// One field in a generated type's descriptor table
#[derive(Debug, Clone, Copy)]
pub struct FieldDescriptor {
    /// Identifier-cased field name
    pub name: &'static str,
    /// Explicit wire key, when the generic conversion would get it wrong
    /// (e.g. `is_ca` -> `isCA`)
    pub wire: Option<&'static str>,
    pub kind: ValueKind,
    pub required: bool,
}

impl FieldDescriptor {
    /// The wire key this field serializes under
    pub fn wire_key(&self) -> String {
        match self.wire {
            Some(wire) => wire.to_string(),
            None => snake_to_camel(self.name),
        }
    }
}

/// Static description of a generated type: its name, flattened field table,
/// and (for API resources) fixed identity
#[derive(Debug)]
pub struct TypeSpec {
    pub name: &'static str,
    pub fields: &'static [FieldDescriptor],
    pub api: Option<ApiIdentity>,
}

impl TypeSpec {
    /// Look up a field by identifier name
    pub fn field(&self, name: &str) -> Option<&'static FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Resolve an incoming key in either spelling: explicit wire overrides
    /// first, then the generic camelCase conversion, then identifier names.
    pub fn field_for_key(&self, key: &str) -> Option<&'static FieldDescriptor> {
        if let Some(found) = self.fields.iter().find(|f| f.wire == Some(key)) {
            return Some(found);
        }
        if let Some(found) = self.field(&camel_to_snake(key)) {
            return Some(found);
        }
        self.field(key)
    }
}

/// An instance of a generated type: an ordered wire-keyed backing map plus
/// the type's field table
#[derive(Debug, Clone)]
pub struct TypedObject {
    spec: &'static TypeSpec,
    store: IndexMap<String, Value>,
    /// Wire keys whose values were materialized by a read, not set by the
    /// caller. Diagnostic only; never serialized and ignored by equality.
    auto_created: HashSet<String>,
}

impl TypedObject {
    pub fn new(spec: &'static TypeSpec) -> Self {
        Self { spec, store: IndexMap::new(), auto_created: HashSet::new() }
    }

    pub fn spec(&self) -> &'static TypeSpec {
        self.spec
    }

    fn descriptor(&self, field: &str) -> ObjectResult<&'static FieldDescriptor> {
        self.spec.field(field).ok_or_else(|| ObjectError::UnknownField {
            type_name: self.spec.name.to_string(),
            field: field.to_string(),
        })
    }

    /// Read a field. Nested, list, and map fields are materialized with a
    /// default value on first read so the returned instance is stable across
    /// reads; scalar fields return `None` while unset.
    pub fn get(&mut self, field: &str) -> ObjectResult<Option<&mut Value>> {
        let descriptor = self.descriptor(field)?;
        let key = descriptor.wire_key();
        if self.store.contains_key(&key) {
            return Ok(self.store.get_mut(&key));
        }
        let default = match descriptor.kind {
            ValueKind::Scalar => return Ok(None),
            ValueKind::Nested(spec) => Value::Object(TypedObject::new(spec)),
            ValueKind::ListOf(spec) => Value::List(TypedList::typed(spec)),
            ValueKind::MapOf => Value::Map(IndexMap::new()),
        };
        self.auto_created.insert(key.clone());
        self.store.insert(key.clone(), default);
        Ok(self.store.get_mut(&key))
    }

    /// Read a nested object field, auto-vivifying it
    pub fn get_object(&mut self, field: &str) -> ObjectResult<&mut TypedObject> {
        match self.get(field)? {
            Some(Value::Object(obj)) => Ok(obj),
            Some(other) => Err(ObjectError::TypeCoercion {
                expected: "object".to_string(),
                given: other.kind_name().to_string(),
            }),
            // Only scalar fields come back absent; the field exists but
            // holds the wrong kind
            None => Err(ObjectError::TypeCoercion {
                expected: "object".to_string(),
                given: "scalar field".to_string(),
            }),
        }
    }

    /// Read a typed list field, auto-vivifying it
    pub fn get_list(&mut self, field: &str) -> ObjectResult<&mut TypedList> {
        match self.get(field)? {
            Some(Value::List(list)) => Ok(list),
            Some(other) => Err(ObjectError::TypeCoercion {
                expected: "list".to_string(),
                given: other.kind_name().to_string(),
            }),
            None => Err(ObjectError::TypeCoercion {
                expected: "list".to_string(),
                given: "scalar field".to_string(),
            }),
        }
    }

    /// Write a field, coercing the value into the declared kind
    pub fn set(&mut self, field: &str, value: impl Into<Value>) -> ObjectResult<()> {
        let descriptor = self.descriptor(field)?;
        let key = descriptor.wire_key();
        let coerced = Self::coerce(descriptor, value.into())?;
        self.auto_created.remove(&key);
        self.store.insert(key, coerced);
        Ok(())
    }

    /// Write a field, or delete it when `value` is `None`
    pub fn set_opt(&mut self, field: &str, value: Option<Value>) -> ObjectResult<()> {
        match value {
            Some(value) => self.set(field, value),
            None => self.delete(field),
        }
    }

    /// Remove a field from the backing map. Absence is key omission on the
    /// wire, never an explicit null.
    pub fn delete(&mut self, field: &str) -> ObjectResult<()> {
        let key = self.descriptor(field)?.wire_key();
        self.store.shift_remove(&key);
        self.auto_created.remove(&key);
        Ok(())
    }

    /// Whether a field's current value came from auto-vivification rather
    /// than an explicit write. Diagnostic only.
    pub fn is_auto_created(&self, field: &str) -> bool {
        self.spec
            .field(field)
            .map(|d| self.auto_created.contains(&d.wire_key()))
            .unwrap_or(false)
    }

    /// The wire representation of this instance
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.store.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
        )
    }

    fn coerce(descriptor: &FieldDescriptor, value: Value) -> ObjectResult<Value> {
        match descriptor.kind {
            ValueKind::Scalar | ValueKind::MapOf => Ok(value),
            ValueKind::Nested(spec) => match value {
                Value::Object(obj) if std::ptr::eq(obj.spec(), spec) => Ok(Value::Object(obj)),
                Value::Map(map) => {
                    let mut fresh = TypedObject::new(spec);
                    fresh.merge_values(map)?;
                    Ok(Value::Object(fresh))
                }
                other => Err(ObjectError::TypeCoercion {
                    expected: spec.name.to_string(),
                    given: other.kind_name().to_string(),
                }),
            },
            ValueKind::ListOf(spec) => match value {
                Value::List(list) => {
                    Ok(Value::List(TypedList::typed_from(spec, list.into_items())?))
                }
                other => Err(ObjectError::TypeCoercion {
                    expected: format!("list of {}", spec.name),
                    given: other.kind_name().to_string(),
                }),
            },
        }
    }

    pub(crate) fn store(&self) -> &IndexMap<String, Value> {
        &self.store
    }

    pub(crate) fn store_mut(&mut self) -> &mut IndexMap<String, Value> {
        &mut self.store
    }

    pub(crate) fn into_store(self) -> IndexMap<String, Value> {
        self.store
    }

    pub(crate) fn clear_auto_created(&mut self, key: &str) {
        self.auto_created.remove(key);
    }
}

impl PartialEq for TypedObject {
    fn eq(&self, other: &Self) -> bool {
        // The auto-created bit set is diagnostic state, not object state
        std::ptr::eq(self.spec, other.spec) && self.store == other.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static INNER: TypeSpec = TypeSpec {
        name: "Inner",
        fields: &[FieldDescriptor { name: "value", wire: None, kind: ValueKind::Scalar, required: false }],
        api: None,
    };

    static OUTER: TypeSpec = TypeSpec {
        name: "Outer",
        fields: &[
            FieldDescriptor { name: "inner", wire: None, kind: ValueKind::Nested(&INNER), required: false },
            FieldDescriptor { name: "is_ca", wire: Some("isCA"), kind: ValueKind::Scalar, required: false },
            FieldDescriptor { name: "items", wire: None, kind: ValueKind::ListOf(&INNER), required: false },
            FieldDescriptor { name: "labels", wire: None, kind: ValueKind::MapOf, required: false },
            FieldDescriptor { name: "count", wire: None, kind: ValueKind::Scalar, required: false },
        ],
        api: None,
    };

    #[test]
    fn test_unknown_field() {
        let mut obj = TypedObject::new(&OUTER);
        assert!(matches!(
            obj.get("missing"),
            Err(ObjectError::UnknownField { .. })
        ));
        assert!(matches!(
            obj.set("missing", 1i64),
            Err(ObjectError::UnknownField { .. })
        ));
    }

    #[test]
    fn test_scalar_field_is_a_kind_error_for_container_reads() {
        let mut obj = TypedObject::new(&OUTER);
        // "count" is declared, so this is a kind mismatch, not an unknown field
        assert!(matches!(
            obj.get_object("count"),
            Err(ObjectError::TypeCoercion { .. })
        ));
        assert!(matches!(
            obj.get_list("count"),
            Err(ObjectError::TypeCoercion { .. })
        ));
        assert!(matches!(
            obj.get_object("missing"),
            Err(ObjectError::UnknownField { .. })
        ));
    }

    #[test]
    fn test_scalar_absent_returns_none() {
        let mut obj = TypedObject::new(&OUTER);
        assert!(obj.get("count").unwrap().is_none());
        // Nothing was stored by the read
        assert!(obj.store().is_empty());
    }

    #[test]
    fn test_auto_vivification_is_stable() {
        let mut obj = TypedObject::new(&OUTER);
        obj.get_object("inner").unwrap().set("value", "x").unwrap();
        // The second read sees the mutation made through the first
        let inner = obj.get_object("inner").unwrap();
        assert_eq!(inner.get("value").unwrap(), Some(&mut Value::from("x")));
    }

    #[test]
    fn test_auto_created_bit() {
        let mut obj = TypedObject::new(&OUTER);
        obj.get_object("inner").unwrap();
        assert!(obj.is_auto_created("inner"));
        obj.set("inner", Value::Map(IndexMap::new())).unwrap();
        assert!(!obj.is_auto_created("inner"));
    }

    #[test]
    fn test_explicit_null_differs_from_absent() {
        let mut obj = TypedObject::new(&OUTER);
        obj.set("count", Value::Null).unwrap();
        assert_eq!(obj.get("count").unwrap(), Some(&mut Value::Null));
        obj.delete("count").unwrap();
        assert_eq!(obj.get("count").unwrap(), None);
    }

    #[test]
    fn test_wire_override() {
        let mut obj = TypedObject::new(&OUTER);
        obj.set("is_ca", true).unwrap();
        assert_eq!(obj.to_json()["isCA"], serde_json::Value::Bool(true));
    }

    #[test]
    fn test_delete_removes_key() {
        let mut obj = TypedObject::new(&OUTER);
        obj.set("count", 3i64).unwrap();
        obj.delete("count").unwrap();
        assert_eq!(obj.to_json(), serde_json::json!({}));
    }

    #[test]
    fn test_set_opt_none_deletes() {
        let mut obj = TypedObject::new(&OUTER);
        obj.set("count", 3i64).unwrap();
        obj.set_opt("count", None).unwrap();
        assert!(obj.get("count").unwrap().is_none());
    }

    #[test]
    fn test_set_nested_coerces_map() {
        let mut obj = TypedObject::new(&OUTER);
        let mut map = IndexMap::new();
        map.insert("value".to_string(), Value::from("x"));
        obj.set("inner", Value::Map(map)).unwrap();
        assert_eq!(obj.get_object("inner").unwrap().spec().name, "Inner");
    }

    #[test]
    fn test_set_list_coerces_elements() {
        let mut obj = TypedObject::new(&OUTER);
        let mut map = IndexMap::new();
        map.insert("value".to_string(), Value::from("x"));
        let list = TypedList::untyped_from(vec![Value::Map(map)]);
        obj.set("items", Value::List(list)).unwrap();

        let stored = obj.get_list("items").unwrap();
        assert_eq!(stored.element_type().unwrap().name, "Inner");
        assert!(matches!(stored.get(0), Some(Value::Object(_))));
    }
}
