//! Merge/Update Engine
//!
//! Populates typed objects from loosely-typed documents (e.g. parsed YAML).
//! Incoming keys may use wire spelling, identifier spelling, or a mix.
//! Nested objects and plain maps merge recursively; scalars and lists are
//! replaced wholesale. API resources additionally enforce their fixed
//! `apiVersion`/`kind` identity and drop server-managed bookkeeping.

use indexmap::IndexMap;

use crate::error::{ObjectError, ObjectResult};
use crate::object::list::TypedList;
use crate::object::value::Value;
use crate::object::{TypedObject, ValueKind};

impl TypedObject {
    /// Merge a wire document into this instance.
    ///
    /// On error the backing map may be partially updated; callers should
    /// discard the object.
    pub fn update(&mut self, src: &serde_json::Map<String, serde_json::Value>) -> ObjectResult<()> {
        let values: IndexMap<String, Value> = src
            .iter()
            .map(|(k, v)| (k.clone(), Value::from_json(v)))
            .collect();
        self.merge_values(values)
    }

    /// Merge already-converted values into this instance
    pub fn merge_values(&mut self, src: IndexMap<String, Value>) -> ObjectResult<()> {
        let api = self.spec().api;
        for (key, incoming) in src {
            if let Some(api) = api {
                match key.as_str() {
                    // Fixed identity: a matching value is a no-op
                    "apiVersion" | "api_version" => {
                        check_read_only("apiVersion", api.api_version, &incoming)?;
                        continue;
                    }
                    "kind" => {
                        check_read_only("kind", api.kind, &incoming)?;
                        continue;
                    }
                    // Server-managed, never part of a desired-state document
                    "status" => continue,
                    _ => {}
                }
            }

            let descriptor = self.spec().field_for_key(&key).ok_or_else(|| {
                ObjectError::UnknownField {
                    type_name: self.spec().name.to_string(),
                    field: key.clone(),
                }
            })?;
            let wire = descriptor.wire_key();

            match descriptor.kind {
                ValueKind::Nested(spec) => {
                    let mut map = match incoming {
                        Value::Map(map) => map,
                        Value::Object(obj) => obj.into_store(),
                        other => {
                            return Err(ObjectError::TypeCoercion {
                                expected: spec.name.to_string(),
                                given: other.kind_name().to_string(),
                            })
                        }
                    };
                    if api.is_some() && descriptor.name == "metadata" {
                        map.shift_remove("managedFields");
                        map.shift_remove("managed_fields");
                    }
                    self.get_object(descriptor.name)?.merge_values(map)?;
                }
                ValueKind::MapOf => {
                    let incoming_map = match incoming {
                        Value::Map(map) => map,
                        other => {
                            return Err(ObjectError::TypeCoercion {
                                expected: "map".to_string(),
                                given: other.kind_name().to_string(),
                            })
                        }
                    };
                    // get() auto-vivifies an empty map; a non-map value can
                    // only be here via a verbatim scalar write, replace it
                    let mergeable = matches!(self.get(descriptor.name)?, Some(Value::Map(_)));
                    if mergeable {
                        if let Some(Value::Map(existing)) = self.get(descriptor.name)? {
                            merge_plain(existing, incoming_map);
                        }
                    } else {
                        self.store_mut().insert(wire.clone(), Value::Map(incoming_map));
                    }
                }
                ValueKind::ListOf(spec) => {
                    let items = match incoming {
                        Value::List(list) => list.into_items(),
                        other => {
                            return Err(ObjectError::TypeCoercion {
                                expected: format!("list of {}", spec.name),
                                given: other.kind_name().to_string(),
                            })
                        }
                    };
                    let list = TypedList::typed_from(spec, items)?;
                    self.store_mut().insert(wire.clone(), Value::List(list));
                }
                ValueKind::Scalar => {
                    self.store_mut().insert(wire.clone(), incoming);
                }
            }
            self.clear_auto_created(&wire);
        }
        Ok(())
    }
}

fn check_read_only(field: &str, expected: &str, incoming: &Value) -> ObjectResult<()> {
    if incoming.as_str() == Some(expected) {
        return Ok(());
    }
    Err(ObjectError::ReadOnlyField {
        field: field.to_string(),
        expected: expected.to_string(),
        given: match incoming.as_str() {
            Some(s) => s.to_string(),
            None => incoming.kind_name().to_string(),
        },
    })
}

/// Recursive merge for plain maps: nested maps merge, everything else
/// replaces
fn merge_plain(dst: &mut IndexMap<String, Value>, src: IndexMap<String, Value>) {
    for (key, value) in src {
        if let Value::Map(inner) = value {
            if let Some(Value::Map(existing)) = dst.get_mut(&key) {
                merge_plain(existing, inner);
                continue;
            }
            dst.insert(key, Value::Map(inner));
        } else {
            dst.insert(key, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::{ApiIdentity, FieldDescriptor, TypeSpec};
    use serde_json::json;

    static ISSUER_REF: TypeSpec = TypeSpec {
        name: "IssuerRef",
        fields: &[
            FieldDescriptor { name: "name", wire: None, kind: ValueKind::Scalar, required: true },
            FieldDescriptor { name: "kind", wire: None, kind: ValueKind::Scalar, required: false },
        ],
        api: None,
    };

    static SPEC: TypeSpec = TypeSpec {
        name: "CertificateSpec",
        fields: &[
            FieldDescriptor { name: "is_ca", wire: Some("isCA"), kind: ValueKind::Scalar, required: false },
            FieldDescriptor { name: "secret_name", wire: None, kind: ValueKind::Scalar, required: true },
            FieldDescriptor { name: "issuer_ref", wire: None, kind: ValueKind::Nested(&ISSUER_REF), required: true },
            FieldDescriptor { name: "dns_names", wire: None, kind: ValueKind::Scalar, required: false },
        ],
        api: None,
    };

    static OBJECT_META: TypeSpec = TypeSpec {
        name: "ObjectMeta",
        fields: &[
            FieldDescriptor { name: "name", wire: None, kind: ValueKind::Scalar, required: false },
            FieldDescriptor { name: "namespace", wire: None, kind: ValueKind::Scalar, required: false },
            FieldDescriptor { name: "labels", wire: None, kind: ValueKind::MapOf, required: false },
        ],
        api: None,
    };

    static CERTIFICATE: TypeSpec = TypeSpec {
        name: "Certificate",
        fields: &[
            FieldDescriptor { name: "metadata", wire: None, kind: ValueKind::Nested(&OBJECT_META), required: false },
            FieldDescriptor { name: "spec", wire: None, kind: ValueKind::Nested(&SPEC), required: false },
        ],
        api: Some(ApiIdentity {
            api_version: "cert-manager.io/v1",
            kind: "Certificate",
            namespaced: true,
        }),
    };

    fn as_map(value: serde_json::Value) -> serde_json::Map<String, serde_json::Value> {
        match value {
            serde_json::Value::Object(map) => map,
            other => panic!("expected object, got {other:?}"),
        }
    }

    #[test]
    fn test_update_translates_wire_keys() {
        let mut cert = TypedObject::new(&CERTIFICATE);
        cert.update(&as_map(json!({
            "spec": {"isCA": true, "secretName": "x", "issuerRef": {"name": "ca-issuer"}}
        })))
        .unwrap();

        let spec = cert.get_object("spec").unwrap();
        assert_eq!(spec.get("is_ca").unwrap(), Some(&mut Value::Bool(true)));
        assert_eq!(spec.get("secret_name").unwrap(), Some(&mut Value::from("x")));
        // issuer_ref came back as a real nested instance, not a raw map
        let issuer = spec.get_object("issuer_ref").unwrap();
        assert_eq!(issuer.get("name").unwrap(), Some(&mut Value::from("ca-issuer")));
    }

    #[test]
    fn test_update_accepts_identifier_spelling() {
        let mut cert = TypedObject::new(&CERTIFICATE);
        cert.update(&as_map(json!({
            "spec": {"is_ca": false, "secret_name": "y", "issuer_ref": {"name": "i"}}
        })))
        .unwrap();
        let spec = cert.get_object("spec").unwrap();
        assert_eq!(spec.get("secret_name").unwrap(), Some(&mut Value::from("y")));
    }

    #[test]
    fn test_nested_merge_is_recursive() {
        let mut cert = TypedObject::new(&CERTIFICATE);
        cert.update(&as_map(json!({"spec": {"secretName": "a"}}))).unwrap();
        cert.update(&as_map(json!({"spec": {"isCA": true}}))).unwrap();

        let spec = cert.get_object("spec").unwrap();
        // Both updates took effect: nested objects merge, not replace
        assert_eq!(spec.get("secret_name").unwrap(), Some(&mut Value::from("a")));
        assert_eq!(spec.get("is_ca").unwrap(), Some(&mut Value::Bool(true)));
    }

    #[test]
    fn test_map_fields_merge_scalars_replace() {
        let mut cert = TypedObject::new(&CERTIFICATE);
        cert.update(&as_map(json!({"metadata": {"labels": {"a": "1"}}}))).unwrap();
        cert.update(&as_map(json!({"metadata": {"labels": {"b": "2"}}}))).unwrap();

        let meta = cert.get_object("metadata").unwrap();
        match meta.get("labels").unwrap() {
            Some(Value::Map(labels)) => {
                assert_eq!(labels.get("a"), Some(&Value::from("1")));
                assert_eq!(labels.get("b"), Some(&Value::from("2")));
            }
            other => panic!("expected label map, got {other:?}"),
        }

        let mut spec_doc = as_map(json!({"spec": {"secretName": "first", "issuerRef": {"name": "i"}}}));
        cert.update(&spec_doc).unwrap();
        spec_doc = as_map(json!({"spec": {"secretName": "second"}}));
        cert.update(&spec_doc).unwrap();
        let spec = cert.get_object("spec").unwrap();
        assert_eq!(spec.get("secret_name").unwrap(), Some(&mut Value::from("second")));
    }

    #[test]
    fn test_read_only_kind_conflict() {
        let mut cert = TypedObject::new(&CERTIFICATE);
        let err = cert.update(&as_map(json!({"kind": "WrongKind"}))).unwrap_err();
        match err {
            ObjectError::ReadOnlyField { field, expected, given } => {
                assert_eq!(field, "kind");
                assert_eq!(expected, "Certificate");
                assert_eq!(given, "WrongKind");
            }
            other => panic!("expected ReadOnlyField, got {other:?}"),
        }
    }

    #[test]
    fn test_matching_identity_is_noop() {
        let mut cert = TypedObject::new(&CERTIFICATE);
        cert.update(&as_map(json!({
            "apiVersion": "cert-manager.io/v1",
            "kind": "Certificate"
        })))
        .unwrap();
    }

    #[test]
    fn test_status_is_stripped() {
        let mut cert = TypedObject::new(&CERTIFICATE);
        // status is not even in the field table; it must not error
        cert.update(&as_map(json!({"status": {"conditions": []}}))).unwrap();
        assert_eq!(cert.to_json(), json!({}));
    }

    #[test]
    fn test_managed_fields_stripped_from_metadata() {
        let mut cert = TypedObject::new(&CERTIFICATE);
        cert.update(&as_map(json!({
            "metadata": {"name": "demo", "managedFields": [{"manager": "kubectl"}]}
        })))
        .unwrap();
        let meta = cert.get_object("metadata").unwrap();
        assert_eq!(meta.get("name").unwrap(), Some(&mut Value::from("demo")));
        assert_eq!(meta.to_json(), json!({"name": "demo"}));
    }

    #[test]
    fn test_unknown_key_fails() {
        let mut cert = TypedObject::new(&CERTIFICATE);
        let err = cert.update(&as_map(json!({"nope": 1}))).unwrap_err();
        assert!(matches!(err, ObjectError::UnknownField { .. }));
    }
}
