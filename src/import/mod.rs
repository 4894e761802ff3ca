//! Schema Import Pipeline
//!
//! Turns a loaded OpenAPI-style document into a closed, deduplicated,
//! dependency-ordered registry of type definitions. The pipeline is:
//! short-name lookup ([`SchemaIndex`]), recursive resolution ([`Resolver`]),
//! then conflict resolution and re-linearization ([`ConflictTracker`]).
//! The finished [`ImportOutput`] is what a code emitter consumes.

pub mod conflicts;
pub mod index;
pub mod resolver;
pub mod schema;
pub mod typedef;

use std::collections::BTreeSet;

use tracing::debug;

use crate::error::ImportResult;
pub use conflicts::ConflictTracker;
pub use index::SchemaIndex;
pub use resolver::Resolver;
pub use schema::{GroupVersionKind, RawSchema, SchemaDocument};
pub use typedef::{
    GenericImport, Property, ResourceKind, ResourceType, ScalarKind, SpecialType, TypeAlias,
    TypeDef, TypeExpr, TypeRegistry,
};

/// The resolved registry plus the generic wrapper types the emitter must
/// import to render it
#[derive(Debug)]
pub struct ImportOutput {
    pub registry: TypeRegistry,
    pub imports: BTreeSet<GenericImport>,
}

/// Drives imports against one loaded schema document
pub struct Importer {
    doc: SchemaDocument,
    index: SchemaIndex,
    registry: TypeRegistry,
    conflicts: ConflictTracker,
}

impl Importer {
    pub fn new(doc: SchemaDocument) -> Self {
        let index = SchemaIndex::build(&doc);
        Self { doc, index, registry: TypeRegistry::new(), conflicts: ConflictTracker::new() }
    }

    /// Import one type by short or qualified name. Returns the registry key
    /// of the resolved definition.
    pub fn import(&mut self, name: &str) -> ImportResult<String> {
        let key = self.index.resolve(name)?;
        debug!(name, key = %key, "import requested");
        let mut resolver = Resolver::new(&self.doc, &mut self.registry, &mut self.conflicts);
        resolver.import_type(&key)
    }

    /// Import every definition in the document, in document order
    pub fn import_all(&mut self) -> ImportResult<Vec<String>> {
        let keys: Vec<String> = self.doc.entries().map(|(k, _)| k.to_string()).collect();
        let mut imported = Vec::with_capacity(keys.len());
        for key in keys {
            let mut resolver = Resolver::new(&self.doc, &mut self.registry, &mut self.conflicts);
            imported.push(resolver.import_type(&key)?);
        }
        Ok(imported)
    }

    /// The registry as resolved so far (before conflict resolution)
    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    /// Resolve recorded conflicts, re-linearize, and hand the result to
    /// emission
    pub fn finish(self) -> ImportResult<ImportOutput> {
        let registry = self.conflicts.resolve(self.registry)?;
        let imports = registry.generic_imports();
        Ok(ImportOutput { registry, imports })
    }
}
