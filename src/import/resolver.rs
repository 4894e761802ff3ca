//! Type Resolver
//!
//! Recursive descent over the schema tree. Each requested definition is
//! walked once: `$ref`s pull in further definitions, inline object schemas
//! synthesize anonymous types, and scalars map through a fixed policy table.
//! An explicit resolution stack detects reference cycles, which the emitted
//! code cannot express.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use tracing::{debug, trace};

use crate::error::{ImportError, ImportResult};
use crate::import::conflicts::ConflictTracker;
use crate::import::schema::{ref_key, AdditionalProperties, RawSchema, SchemaDocument};
use crate::import::typedef::{
    Property, ResourceKind, ResourceType, ScalarKind, SpecialType, TypeAlias, TypeDef, TypeExpr,
    TypeRegistry,
};
use crate::names::type_name_for_property;

/// Built-in kinds that live inside a namespace. Everything else defaults to
/// cluster scope unless the schema says otherwise (`x-scoped`).
static NAMESPACED_KINDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "Binding", "ConfigMap", "ControllerRevision", "CronJob", "DaemonSet", "Deployment",
        "Endpoints", "EndpointSlice", "Event", "HorizontalPodAutoscaler", "Ingress", "Job",
        "Lease", "LimitRange", "NetworkPolicy", "PersistentVolumeClaim", "Pod",
        "PodDisruptionBudget", "PodTemplate", "ReplicaSet", "ReplicationController",
        "ResourceQuota", "Role", "RoleBinding", "Secret", "Service", "ServiceAccount",
        "StatefulSet",
    ]
    .into_iter()
    .collect()
});

/// Per-node context threaded through recursive type resolution
#[derive(Clone, Copy)]
struct ResolveContext<'a> {
    /// Short name of the definition currently being resolved
    def_name: &'a str,
    /// Name of the type whose property is being resolved
    enclosing: &'a str,
    /// Property name that led here (wire spelling)
    property: &'a str,
    /// Anonymous-nesting depth below the resolution root
    depth: usize,
    /// Whether the schema describes the items of an array property
    in_array: bool,
}

/// Resolves definitions from one document into a shared registry
pub struct Resolver<'a> {
    doc: &'a SchemaDocument,
    registry: &'a mut TypeRegistry,
    conflicts: &'a mut ConflictTracker,
    /// Active resolution stack, for cycle detection
    stack: Vec<String>,
}

impl<'a> Resolver<'a> {
    pub fn new(
        doc: &'a SchemaDocument,
        registry: &'a mut TypeRegistry,
        conflicts: &'a mut ConflictTracker,
    ) -> Self {
        Self { doc, registry, conflicts, stack: Vec::new() }
    }

    /// Import one definition by qualified key, resolving everything it
    /// depends on. Returns the registry key of the resolved definition.
    pub fn import_type(&mut self, qualified_key: &str) -> ImportResult<String> {
        if self.stack.iter().any(|k| k == qualified_key) {
            return Err(ImportError::CircularDependency {
                name: qualified_key.to_string(),
                stack: self.stack.clone(),
            });
        }
        if self.registry.contains(qualified_key) {
            return Ok(qualified_key.to_string());
        }

        let schema = self
            .doc
            .get(qualified_key)
            .ok_or_else(|| ImportError::UnknownType { name: qualified_key.to_string() })?
            .clone();

        debug!(key = qualified_key, "importing definition");
        self.stack.push(qualified_key.to_string());
        let result = self.build_definition(qualified_key, &schema);
        self.stack.pop();

        let def = result?;
        // A previously synthesized anonymous type may already hold this
        // definition's short name; two entries must never share a name
        let clash = self.registry.iter().any(|(_, existing)| {
            existing.name() == def.name()
                && matches!(
                    existing,
                    TypeDef::Resource(r) if matches!(r.kind, ResourceKind::Anonymous { .. })
                )
        });
        if clash {
            return Err(ImportError::UnresolvableConflict { name: def.name().to_string() });
        }
        self.registry.insert(qualified_key, def);
        Ok(qualified_key.to_string())
    }

    fn build_definition(&mut self, key: &str, schema: &RawSchema) -> ImportResult<TypeDef> {
        let name = short_name(key).to_string();

        if schema.is_object_with_properties() {
            let kind = match schema.group_version_kind.first() {
                Some(gvk) => {
                    let group = if gvk.group.is_empty() { "core".to_string() } else { gvk.group.clone() };
                    let cluster_scoped = match schema.scoped {
                        Some(scoped) => scoped,
                        None => !NAMESPACED_KINDS.contains(gvk.kind.as_str()),
                    };
                    ResourceKind::Api {
                        group,
                        version: gvk.version.clone(),
                        kind: gvk.kind.clone(),
                        cluster_scoped,
                    }
                }
                None => ResourceKind::Plain,
            };

            let mut properties = Vec::new();
            for (prop_name, prop_schema) in &schema.properties {
                // status is server-managed; apiVersion/kind are fixed identity
                if prop_name == "status" {
                    continue;
                }
                if matches!(kind, ResourceKind::Api { .. })
                    && (prop_name == "apiVersion" || prop_name == "kind")
                {
                    continue;
                }
                let ctx = ResolveContext {
                    def_name: &name,
                    enclosing: &name,
                    property: prop_name,
                    depth: 0,
                    in_array: false,
                };
                properties.push(Property {
                    name: prop_name.clone(),
                    type_expr: self.resolve_type(prop_schema, &ctx)?,
                    required: schema.requires(prop_name),
                });
            }
            properties.sort_by(|a, b| a.name.cmp(&b.name));

            return Ok(TypeDef::Resource(ResourceType { name, properties, kind }));
        }

        let ctx = ResolveContext {
            def_name: &name,
            enclosing: &name,
            property: "",
            depth: 0,
            in_array: false,
        };
        let mut underlying = self.resolve_type(schema, &ctx)?;
        // Quantities accept numeric literals in practice
        if name == "Quantity" && underlying == TypeExpr::Scalar(ScalarKind::Str) {
            underlying = TypeExpr::Union(vec![ScalarKind::Str, ScalarKind::Int]);
        }
        Ok(TypeDef::Alias(TypeAlias { name, underlying }))
    }

    /// The scalar/array/map mapping policy
    fn resolve_type(&mut self, schema: &RawSchema, ctx: &ResolveContext) -> ImportResult<TypeExpr> {
        if let Some(reference) = &schema.reference {
            let target = ref_key(reference).to_string();
            self.import_type(&target)?;
            return Ok(TypeExpr::Ref(target));
        }
        if schema.preserve_unknown_fields {
            return Ok(TypeExpr::Any);
        }
        if schema.int_or_string {
            return Ok(TypeExpr::Special(SpecialType::IntOrString));
        }

        match schema.schema_type.as_deref() {
            Some("integer") => Ok(TypeExpr::Scalar(ScalarKind::Int)),
            Some("boolean") => Ok(TypeExpr::Scalar(ScalarKind::Bool)),
            Some("number") => Ok(TypeExpr::Scalar(if schema.format.as_deref() == Some("double") {
                ScalarKind::Float
            } else {
                ScalarKind::Int
            })),
            Some("string") => Ok(self.resolve_string(schema, ctx)),
            Some("array") => match &schema.items {
                Some(items) => {
                    let item_ctx = ResolveContext { in_array: true, ..*ctx };
                    Ok(TypeExpr::List(Box::new(self.resolve_type(items, &item_ctx)?)))
                }
                None => Ok(TypeExpr::List(Box::new(TypeExpr::Any))),
            },
            Some("object") | None if !schema.properties.is_empty() => {
                self.resolve_anonymous(schema, ctx)
            }
            Some("object") | None => match schema.additional_properties.as_deref() {
                Some(AdditionalProperties::Schema(values)) => {
                    let value_ctx = ResolveContext { in_array: false, ..*ctx };
                    Ok(TypeExpr::Dict(Box::new(self.resolve_type(values, &value_ctx)?)))
                }
                _ => Ok(TypeExpr::Dict(Box::new(TypeExpr::Any))),
            },
            Some(other) => Err(ImportError::InvalidDocument(format!(
                "unsupported schema type {other:?} under {}",
                ctx.def_name
            ))),
        }
    }

    fn resolve_string(&self, schema: &RawSchema, ctx: &ResolveContext) -> TypeExpr {
        match schema.format.as_deref() {
            Some("int-or-string") => TypeExpr::Union(vec![ScalarKind::Int, ScalarKind::Str]),
            Some("byte") => TypeExpr::Special(SpecialType::Base64),
            // The canonical Time definition aliases to plain string so the
            // alias does not reference itself
            Some("date-time") if ctx.def_name == "Time" => TypeExpr::Scalar(ScalarKind::Str),
            Some("date-time") => TypeExpr::Special(SpecialType::Time),
            Some("idn-hostname") => TypeExpr::Special(SpecialType::IdnHostname),
            _ => TypeExpr::Scalar(ScalarKind::Str),
        }
    }

    /// Synthesize (or reuse) a type for an inline object schema
    fn resolve_anonymous(
        &mut self,
        schema: &RawSchema,
        ctx: &ResolveContext,
    ) -> ImportResult<TypeExpr> {
        let base = type_name_for_property(ctx.property, ctx.in_array);
        // Direct children of a named definition carry its name to keep
        // generic names like Spec from colliding across resources
        let name = if ctx.depth == 0 {
            format!("{}{}", ctx.def_name, base)
        } else {
            base
        };

        // A definition still being resolved will claim its short name once
        // it lands in the registry, and named definitions cannot be renamed
        if self.stack.iter().any(|key| short_name(key) == name) {
            return Err(ImportError::UnresolvableConflict { name });
        }

        let mut properties = Vec::new();
        for (prop_name, prop_schema) in &schema.properties {
            let child_ctx = ResolveContext {
                def_name: ctx.def_name,
                enclosing: &name,
                property: prop_name,
                depth: ctx.depth + 1,
                in_array: false,
            };
            properties.push(Property {
                name: prop_name.clone(),
                type_expr: self.resolve_type(prop_schema, &child_ctx)?,
                required: schema.requires(prop_name),
            });
        }
        properties.sort_by(|a, b| a.name.cmp(&b.name));

        let new_type = ResourceType {
            name: name.clone(),
            properties,
            kind: ResourceKind::Anonymous { enclosing: ctx.enclosing.to_string() },
        };

        // Uniqueness is by declared type name, not registry key: named
        // definitions sit under their dotted qualified key
        let mut same_shape_key = None;
        let mut conflicting_anonymous = false;
        let mut named_holder = false;
        for (key, def) in self.registry.iter() {
            if def.name() != name {
                continue;
            }
            match def {
                TypeDef::Resource(existing) if existing.same_shape(&new_type) => {
                    same_shape_key = Some(key.to_string());
                }
                TypeDef::Resource(existing)
                    if matches!(existing.kind, ResourceKind::Anonymous { .. }) =>
                {
                    conflicting_anonymous = true;
                }
                _ => named_holder = true,
            }
        }

        if let Some(existing_key) = same_shape_key {
            trace!(name = %name, key = %existing_key, "anonymous type collapses into existing entry");
            return Ok(TypeExpr::Ref(existing_key));
        }
        if named_holder {
            // The name belongs to a named definition, which cannot be
            // renamed away
            return Err(ImportError::UnresolvableConflict { name });
        }
        if conflicting_anonymous {
            // Same synthesized name, different shape: park the new variant
            // under an interim key and let conflict resolution rename both
            let interim = self.conflicts.record(&name);
            debug!(name = %name, interim = %interim, "anonymous type name conflict");
            self.registry.insert(interim.clone(), TypeDef::Resource(new_type));
            return Ok(TypeExpr::Ref(interim));
        }

        trace!(name = %name, enclosing = ctx.enclosing, "synthesized anonymous type");
        self.registry.insert(name.clone(), TypeDef::Resource(new_type));
        Ok(TypeExpr::Ref(name))
    }
}

/// Final dotted segment of a qualified key
pub fn short_name(qualified: &str) -> &str {
    qualified.rsplit('.').next().unwrap_or(qualified)
}
