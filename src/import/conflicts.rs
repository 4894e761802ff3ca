//! Anonymous-Type Conflict Resolution
//!
//! Two inline schemas can synthesize the same type name while disagreeing on
//! shape. The resolver parks later variants under interim keys; once the
//! requested root type is fully built, every member of a conflict group is
//! renamed to `<enclosing><name>` and the whole registry is re-linearized so
//! dependencies still precede dependents.

use indexmap::IndexMap;
use tracing::debug;

use crate::error::{ImportError, ImportResult};
use crate::import::typedef::{ResourceKind, TypeDef, TypeRegistry};

/// Records conflict groups during resolution
#[derive(Debug, Default)]
pub struct ConflictTracker {
    /// shared synthesized name -> member registry keys. The first member is
    /// keyed by the shared name itself; later members get interim keys.
    groups: IndexMap<String, Vec<String>>,
    counter: usize,
}

impl ConflictTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new conflicting variant and hand back its interim key
    pub fn record(&mut self, name: &str) -> String {
        let group = self
            .groups
            .entry(name.to_string())
            .or_insert_with(|| vec![name.to_string()]);
        self.counter += 1;
        // '#' cannot appear in a synthesized name, so interim keys are safe
        let interim = format!("{name}#{}", self.counter);
        group.push(interim.clone());
        interim
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Rename every conflict-group member and rebuild the registry in
    /// dependency-first order
    pub fn resolve(self, mut registry: TypeRegistry) -> ImportResult<TypeRegistry> {
        if self.groups.is_empty() {
            return Ok(registry);
        }

        for (shared_name, members) in &self.groups {
            let mut renames: Vec<(String, String)> = Vec::new();
            for member_key in members {
                let def = registry.get(member_key).ok_or_else(|| {
                    ImportError::UnresolvableConflict { name: member_key.clone() }
                })?;
                let enclosing = match def {
                    TypeDef::Resource(r) => match &r.kind {
                        ResourceKind::Anonymous { enclosing } => enclosing.clone(),
                        _ => {
                            return Err(ImportError::UnresolvableConflict {
                                name: member_key.clone(),
                            })
                        }
                    },
                    TypeDef::Alias(_) => {
                        return Err(ImportError::UnresolvableConflict { name: member_key.clone() })
                    }
                };
                let qualified = format!("{enclosing}{shared_name}");
                if renames.iter().any(|(_, n)| n == &qualified) {
                    return Err(ImportError::UnresolvableConflict { name: qualified });
                }
                renames.push((member_key.clone(), qualified));
            }

            // Renamed members must not shadow unrelated registry entries
            for (_, qualified) in &renames {
                let taken = registry
                    .iter()
                    .any(|(key, def)| def.name() == qualified.as_str() && !members.contains(&key.to_string()));
                if taken {
                    return Err(ImportError::UnresolvableConflict { name: qualified.clone() });
                }
            }

            for (old_key, qualified) in renames {
                debug!(old = %old_key, new = %qualified, "renaming conflicting anonymous type");
                let mut def = registry
                    .take(&old_key)
                    .ok_or_else(|| ImportError::UnresolvableConflict { name: old_key.clone() })?;
                def.set_name(qualified.clone());
                registry.rewrite_refs(&old_key, &qualified);
                registry.insert(qualified, def);
            }
        }

        Ok(reorder(registry))
    }
}

/// Rebuild a registry in dependency-first order: repeatedly pop the next
/// remaining entry and pull its dependencies across first.
fn reorder(mut old: TypeRegistry) -> TypeRegistry {
    let mut fresh = TypeRegistry::new();
    while let Some((key, def)) = old.pop_front() {
        place(key, def, &mut old, &mut fresh);
    }
    fresh
}

fn place(key: String, def: TypeDef, old: &mut TypeRegistry, fresh: &mut TypeRegistry) {
    let deps: Vec<String> = def.references().iter().map(|s| s.to_string()).collect();
    for dep in deps {
        if let Some(dep_def) = old.take(&dep) {
            place(dep, dep_def, old, fresh);
        }
    }
    fresh.insert(key, def);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::typedef::{Property, ResourceType, ScalarKind, TypeExpr};

    fn anon(name: &str, enclosing: &str, props: &[(&str, ScalarKind)]) -> TypeDef {
        TypeDef::Resource(ResourceType {
            name: name.to_string(),
            properties: props
                .iter()
                .map(|(n, k)| Property {
                    name: n.to_string(),
                    type_expr: TypeExpr::Scalar(*k),
                    required: false,
                })
                .collect(),
            kind: ResourceKind::Anonymous { enclosing: enclosing.to_string() },
        })
    }

    fn holder(name: &str, refs: &[&str]) -> TypeDef {
        TypeDef::Resource(ResourceType {
            name: name.to_string(),
            properties: refs
                .iter()
                .map(|r| Property {
                    name: r.to_lowercase(),
                    type_expr: TypeExpr::Ref(r.to_string()),
                    required: false,
                })
                .collect(),
            kind: ResourceKind::Plain,
        })
    }

    #[test]
    fn test_conflict_renames_both_members() {
        let mut tracker = ConflictTracker::new();
        let mut registry = TypeRegistry::new();

        registry.insert("Selector", anon("Selector", "TargetA", &[("matchNames", ScalarKind::Str)]));
        let interim = tracker.record("Selector");
        registry.insert(
            interim.clone(),
            anon("Selector", "TargetB", &[("matchIds", ScalarKind::Int)]),
        );
        registry.insert("RootA", holder("RootA", &["Selector"]));
        registry.insert("RootB", holder("RootB", &[interim.as_str()]));

        let resolved = tracker.resolve(registry).unwrap();

        assert!(resolved.get("TargetASelector").is_some());
        assert!(resolved.get("TargetBSelector").is_some());
        assert!(resolved.get("Selector").is_none());

        // References followed the renames
        let root_a = resolved.get("RootA").unwrap();
        assert_eq!(root_a.references(), vec!["TargetASelector"]);
        let root_b = resolved.get("RootB").unwrap();
        assert_eq!(root_b.references(), vec!["TargetBSelector"]);
    }

    #[test]
    fn test_rename_collision_fails() {
        let mut tracker = ConflictTracker::new();
        let mut registry = TypeRegistry::new();

        // Same enclosing type on both sides: renaming cannot disambiguate
        registry.insert("Selector", anon("Selector", "Target", &[("a", ScalarKind::Str)]));
        let interim = tracker.record("Selector");
        registry.insert(interim, anon("Selector", "Target", &[("b", ScalarKind::Int)]));

        match tracker.resolve(registry) {
            Err(ImportError::UnresolvableConflict { name }) => assert_eq!(name, "TargetSelector"),
            other => panic!("expected UnresolvableConflict, got {other:?}"),
        }
    }

    #[test]
    fn test_reorder_is_topological_and_stable() {
        let mut registry = TypeRegistry::new();
        registry.insert("Leaf", anon("Leaf", "Mid", &[("x", ScalarKind::Str)]));
        registry.insert("Mid", holder("Mid", &["Leaf"]));
        registry.insert("Root", holder("Root", &["Mid"]));

        let resolved = reorder(registry);
        let order: Vec<&str> = resolved.iter().map(|(k, _)| k).collect();
        assert_eq!(order, vec!["Leaf", "Mid", "Root"]);
    }

    #[test]
    fn test_reorder_pulls_dependencies_forward() {
        let mut registry = TypeRegistry::new();
        registry.insert("Root", holder("Root", &["Mid"]));
        registry.insert("Mid", holder("Mid", &["Leaf"]));
        registry.insert("Leaf", anon("Leaf", "Mid", &[("x", ScalarKind::Str)]));

        let resolved = reorder(registry);
        let order: Vec<&str> = resolved.iter().map(|(k, _)| k).collect();
        assert_eq!(order, vec!["Leaf", "Mid", "Root"]);
    }
}
