//! Schema Index
//!
//! Maps short type names (the final dotted segment of a qualified key,
//! lower-cased) back to fully-qualified definition keys, tracking short names
//! that several qualified keys collapse onto so lookups can fail loudly
//! instead of guessing.

use std::collections::{HashMap, HashSet};

use crate::error::{ImportError, ImportResult};
use crate::import::schema::SchemaDocument;

/// Short-name lookup over one loaded schema document
#[derive(Debug, Default)]
pub struct SchemaIndex {
    /// short key -> qualified key (unambiguous entries only)
    short: HashMap<String, String>,
    /// short key -> every qualified key that collapses onto it
    ambiguous: HashMap<String, Vec<String>>,
    /// all qualified keys, for pass-through lookup
    qualified: HashSet<String>,
}

impl SchemaIndex {
    /// Build the index from a document. Built fully before any lookup runs.
    pub fn build(doc: &SchemaDocument) -> Self {
        let mut index = SchemaIndex::default();
        for (key, _) in doc.entries() {
            index.qualified.insert(key.to_string());
            let short = short_key(key);
            if let Some(existing) = index.ambiguous.get_mut(&short) {
                existing.push(key.to_string());
                continue;
            }
            match index.short.remove(&short) {
                Some(previous) => {
                    // Second qualified key for this short key: neither wins
                    index
                        .ambiguous
                        .insert(short, vec![previous, key.to_string()]);
                }
                None => {
                    index.short.insert(short, key.to_string());
                }
            }
        }
        index
    }

    /// Resolve a short or qualified name to a qualified key
    pub fn resolve(&self, name: &str) -> ImportResult<String> {
        let short = name.to_ascii_lowercase();
        if let Some(candidates) = self.ambiguous.get(&short) {
            return Err(ImportError::AmbiguousReference {
                name: name.to_string(),
                candidates: candidates.clone(),
            });
        }
        if let Some(qualified) = self.short.get(&short) {
            return Ok(qualified.clone());
        }
        if self.qualified.contains(name) {
            return Ok(name.to_string());
        }
        Err(ImportError::UnknownType { name: name.to_string() })
    }
}

/// The final dotted segment of a qualified key, lower-cased
fn short_key(qualified: &str) -> String {
    qualified
        .rsplit('.')
        .next()
        .unwrap_or(qualified)
        .to_ascii_lowercase()
}
