//! Resolved Type Definitions
//!
//! The output model of the importer: a closed, order-preserving registry of
//! type definitions ready for code emission. Registry iteration order is the
//! emission order, so after conflict resolution it is topologically sorted
//! (emitted code has no forward declarations).

use std::collections::BTreeSet;

use indexmap::IndexMap;

/// Scalar leaf types in the emitted language
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ScalarKind {
    Int,
    Float,
    Bool,
    Str,
}

/// Well-known wrapper aliases shared by all generated modules
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecialType {
    /// base64-encoded bytes (`format: byte`)
    Base64,
    /// RFC 3339 timestamp (`format: date-time`)
    Time,
    /// internationalized hostname (`format: idn-hostname`)
    IdnHostname,
    /// the `x-kubernetes-int-or-string` union
    IntOrString,
}

/// A property's (or alias's) type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeExpr {
    Scalar(ScalarKind),
    /// Untagged union of scalar alternatives, e.g. `string | int`
    Union(Vec<ScalarKind>),
    List(Box<TypeExpr>),
    Dict(Box<TypeExpr>),
    /// Untyped value (`x-kubernetes-preserve-unknown-fields`, bare objects)
    Any,
    /// Reference to another registry entry, by registry key
    Ref(String),
    Special(SpecialType),
}

impl TypeExpr {
    /// Collect every registry key this expression references
    pub fn collect_refs<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            TypeExpr::Ref(key) => out.push(key),
            TypeExpr::List(inner) | TypeExpr::Dict(inner) => inner.collect_refs(out),
            _ => {}
        }
    }

    /// Point references at a renamed registry entry
    pub fn rewrite_refs(&mut self, old_key: &str, new_key: &str) {
        match self {
            TypeExpr::Ref(key) if key == old_key => *key = new_key.to_string(),
            TypeExpr::List(inner) | TypeExpr::Dict(inner) => inner.rewrite_refs(old_key, new_key),
            _ => {}
        }
    }

    fn collect_imports(&self, out: &mut BTreeSet<GenericImport>) {
        match self {
            TypeExpr::Union(_) => {
                out.insert(GenericImport::Union);
            }
            TypeExpr::List(inner) => {
                out.insert(GenericImport::List);
                inner.collect_imports(out);
            }
            TypeExpr::Dict(inner) => {
                out.insert(GenericImport::Map);
                inner.collect_imports(out);
            }
            TypeExpr::Any => {
                out.insert(GenericImport::Any);
            }
            TypeExpr::Special(SpecialType::IntOrString) => {
                out.insert(GenericImport::Union);
            }
            _ => {}
        }
    }
}

/// Generic wrapper types the emitter must import when they appear anywhere
/// in a resolved graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum GenericImport {
    Union,
    List,
    Map,
    Any,
}

/// One property of an object type. `name` keeps the wire spelling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    pub name: String,
    pub type_expr: TypeExpr,
    pub required: bool,
}

/// A scalar/union alias, e.g. `Quantity = string | int`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeAlias {
    pub name: String,
    pub underlying: TypeExpr,
}

/// What flavor of object type a `ResourceType` is
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceKind {
    /// A named nested object type
    Plain,
    /// A synthesized type for an inline object schema
    Anonymous {
        /// Name of the type whose property introduced this schema
        enclosing: String,
    },
    /// A top-level, directly-creatable API object
    Api {
        group: String,
        version: String,
        kind: String,
        cluster_scoped: bool,
    },
}

/// An object type with an ordered (alphabetical) property list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceType {
    pub name: String,
    pub properties: Vec<Property>,
    pub kind: ResourceKind,
}

impl ResourceType {
    /// Structural identity: same property names, types and requiredness.
    /// Names and enclosing context deliberately do not participate.
    pub fn same_shape(&self, other: &ResourceType) -> bool {
        self.properties == other.properties
    }
}

/// A resolved type definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeDef {
    Alias(TypeAlias),
    Resource(ResourceType),
}

impl TypeDef {
    pub fn name(&self) -> &str {
        match self {
            TypeDef::Alias(a) => &a.name,
            TypeDef::Resource(r) => &r.name,
        }
    }

    pub fn set_name(&mut self, name: String) {
        match self {
            TypeDef::Alias(a) => a.name = name,
            TypeDef::Resource(r) => r.name = name,
        }
    }

    /// Registry keys this definition depends on
    pub fn references(&self) -> Vec<&str> {
        let mut refs = Vec::new();
        match self {
            TypeDef::Alias(a) => a.underlying.collect_refs(&mut refs),
            TypeDef::Resource(r) => {
                for prop in &r.properties {
                    prop.type_expr.collect_refs(&mut refs);
                }
            }
        }
        refs
    }

    /// Point references at a renamed registry entry
    pub fn rewrite_refs(&mut self, old_key: &str, new_key: &str) {
        match self {
            TypeDef::Alias(a) => a.underlying.rewrite_refs(old_key, new_key),
            TypeDef::Resource(r) => {
                for prop in &mut r.properties {
                    prop.type_expr.rewrite_refs(old_key, new_key);
                }
            }
        }
    }

    fn collect_imports(&self, out: &mut BTreeSet<GenericImport>) {
        match self {
            TypeDef::Alias(a) => a.underlying.collect_imports(out),
            TypeDef::Resource(r) => {
                for prop in &r.properties {
                    prop.type_expr.collect_imports(out);
                }
            }
        }
    }
}

/// Order-preserving registry of resolved definitions, keyed by qualified
/// schema key (named types) or synthesized name (anonymous types)
#[derive(Debug, Default)]
pub struct TypeRegistry {
    entries: IndexMap<String, TypeDef>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&TypeDef> {
        self.entries.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut TypeDef> {
        self.entries.get_mut(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, def: TypeDef) {
        self.entries.insert(key.into(), def);
    }

    /// Remove and return the first remaining entry (rebuild driver)
    pub fn pop_front(&mut self) -> Option<(String, TypeDef)> {
        self.entries.shift_remove_index(0)
    }

    /// Remove a specific entry, preserving the order of the rest
    pub fn take(&mut self, key: &str) -> Option<TypeDef> {
        self.entries.shift_remove(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in registry (emission) order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &TypeDef)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Rewrite every reference to `old_key` across the registry
    pub fn rewrite_refs(&mut self, old_key: &str, new_key: &str) {
        for def in self.entries.values_mut() {
            def.rewrite_refs(old_key, new_key);
        }
    }

    /// Which generic wrapper types appear anywhere in the graph
    pub fn generic_imports(&self) -> BTreeSet<GenericImport> {
        let mut imports = BTreeSet::new();
        for def in self.entries.values() {
            def.collect_imports(&mut imports);
        }
        imports
    }
}
