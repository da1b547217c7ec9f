//! Project format version migration framework.
//!
//! A registry of step functions that upgrade a raw project document from
//! one format version to the next, so files written by older editors still
//! load after the format changes. Steps work on untyped JSON because older
//! documents do not fit the current model.

use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::id::ObjectKind;
use crate::project::FORMAT_VERSION;

/// Errors that can occur during migration.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MigrationError {
    #[error("no migration path from version {from} to version {to}")]
    NoMigrationPath { from: u32, to: u32 },
    #[error("migration from version {from} to version {to} failed: {reason}")]
    MigrationFailed { from: u32, to: u32, reason: String },
}

/// Upgrades a document in place from `version N` to `version N+1`.
pub type MigrationFn = fn(&mut Value) -> Result<(), MigrationError>;

/// Registry of migration steps keyed by source version.
///
/// The registry chains steps to migrate across multiple versions and
/// stamps `formatVersion` after each one.
pub struct MigrationRegistry {
    migrations: BTreeMap<u32, MigrationFn>,
}

impl MigrationRegistry {
    /// Create an empty migration registry.
    pub fn new() -> Self {
        Self {
            migrations: BTreeMap::new(),
        }
    }

    /// Every step up to [`FORMAT_VERSION`].
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register(0, v0_to_v1);
        registry.register(1, v1_to_v2);
        registry
    }

    /// Register a migration step from `from_version` to `from_version + 1`.
    pub fn register(&mut self, from_version: u32, migrate: MigrationFn) {
        self.migrations.insert(from_version, migrate);
    }

    /// Check whether a complete migration path exists from `from` to `to`.
    pub fn can_migrate(&self, from: u32, to: u32) -> bool {
        if from >= to {
            return from == to;
        }
        (from..to).all(|v| self.migrations.contains_key(&v))
    }

    /// Migrate `doc` from version `from` to version `to`.
    pub fn migrate(&self, doc: &mut Value, from: u32, to: u32) -> Result<(), MigrationError> {
        if from == to {
            return Ok(());
        }
        if from > to {
            return Err(MigrationError::NoMigrationPath { from, to });
        }
        for version in from..to {
            let step = self
                .migrations
                .get(&version)
                .ok_or(MigrationError::NoMigrationPath { from, to })?;
            step(doc)?;
            if let Some(root) = doc.as_object_mut() {
                root.insert("formatVersion".to_string(), Value::from(version + 1));
            }
        }
        Ok(())
    }

    /// Number of registered migration steps.
    pub fn step_count(&self) -> usize {
        self.migrations.len()
    }
}

impl Default for MigrationRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Move `from` to `to` unless `to` is already present.
fn rename_key(map: &mut Map<String, Value>, from: &str, to: &str) {
    if let Some(value) = map.remove(from) {
        map.entry(to.to_string()).or_insert(value);
    }
}

fn root_mut(doc: &mut Value, from: u32) -> Result<&mut Map<String, Value>, MigrationError> {
    doc.as_object_mut().ok_or(MigrationError::MigrationFailed {
        from,
        to: from + 1,
        reason: "document is not an object".to_string(),
    })
}

fn objects_mut(root: &mut Map<String, Value>) -> impl Iterator<Item = &mut Map<String, Value>> {
    let collections: Vec<&str> = ObjectKind::ALL.iter().map(|k| k.collection()).collect();
    root.iter_mut()
        .filter(move |(name, _)| collections.contains(&name.as_str()))
        .filter_map(|(_, value)| value.as_array_mut())
        .flatten()
        .filter_map(Value::as_object_mut)
}

/// v0 used `custom`-prefixed taxonomy collections and called sprites images.
fn v0_to_v1(doc: &mut Value) -> Result<(), MigrationError> {
    let root = root_mut(doc, 0)?;
    rename_key(root, "customRarities", "rarities");
    rename_key(root, "customConsumableSets", "consumableSets");
    for object in objects_mut(root) {
        rename_key(object, "image", "sprite");
    }
    Ok(())
}

/// v1 called effects actions and nested conditions in single-level groups.
fn v1_to_v2(doc: &mut Value) -> Result<(), MigrationError> {
    let root = root_mut(doc, 1)?;
    for object in objects_mut(root) {
        let Some(rules) = object.get_mut("rules").and_then(Value::as_array_mut) else {
            continue;
        };
        for rule in rules.iter_mut().filter_map(Value::as_object_mut) {
            rename_key(rule, "actions", "effects");
            let Some(groups) = rule.remove("conditionGroups") else {
                continue;
            };
            let mut flattened: Vec<Value> = match rule.remove("conditions") {
                Some(Value::Array(existing)) => existing,
                _ => Vec::new(),
            };
            for group in groups.as_array().into_iter().flatten() {
                if let Some(conditions) = group.get("conditions").and_then(Value::as_array) {
                    flattened.extend(conditions.iter().cloned());
                }
            }
            rule.insert("conditions".to_string(), Value::Array(flattened));
        }
    }
    Ok(())
}

/// Whether the built-in registry reaches the current version from `from`.
pub fn is_supported(from: u32) -> bool {
    from <= FORMAT_VERSION && MigrationRegistry::builtin().can_migrate(from, FORMAT_VERSION)
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn mark(doc: &mut Value) -> Result<(), MigrationError> {
        let steps = doc["steps"].as_u64().unwrap_or(0);
        doc["steps"] = json!(steps + 1);
        Ok(())
    }

    fn failing(_: &mut Value) -> Result<(), MigrationError> {
        Err(MigrationError::MigrationFailed {
            from: 0,
            to: 1,
            reason: "test failure".into(),
        })
    }

    #[test]
    fn registry_new_is_empty() {
        assert_eq!(MigrationRegistry::new().step_count(), 0);
    }

    #[test]
    fn builtin_reaches_current_version() {
        let reg = MigrationRegistry::builtin();
        assert!(reg.can_migrate(0, FORMAT_VERSION));
        assert!(is_supported(0));
        assert!(!is_supported(FORMAT_VERSION + 1));
    }

    #[test]
    fn can_migrate_gap_returns_false() {
        let mut reg = MigrationRegistry::new();
        reg.register(1, mark);
        reg.register(3, mark);
        assert!(!reg.can_migrate(1, 4));
        assert!(reg.can_migrate(2, 2));
        assert!(!reg.can_migrate(2, 1));
    }

    #[test]
    fn migrate_chains_and_stamps_version() {
        let mut reg = MigrationRegistry::new();
        reg.register(0, mark);
        reg.register(1, mark);
        let mut doc = json!({});
        reg.migrate(&mut doc, 0, 2).unwrap();
        assert_eq!(doc["steps"], 2);
        assert_eq!(doc["formatVersion"], 2);
    }

    #[test]
    fn migrate_backwards_fails() {
        let reg = MigrationRegistry::builtin();
        let mut doc = json!({});
        assert_eq!(
            reg.migrate(&mut doc, 2, 1),
            Err(MigrationError::NoMigrationPath { from: 2, to: 1 })
        );
    }

    #[test]
    fn failing_step_propagates() {
        let mut reg = MigrationRegistry::new();
        reg.register(0, failing);
        let mut doc = json!({});
        assert!(matches!(
            reg.migrate(&mut doc, 0, 1),
            Err(MigrationError::MigrationFailed { .. })
        ));
    }

    #[test]
    fn v0_renames_taxonomies_and_images() {
        let mut doc = json!({
            "metadata": {},
            "jokers": [{ "name": "A", "image": { "x": 1, "y": 0 } }],
            "customRarities": [{ "id": "r1" }],
            "customConsumableSets": [],
        });
        MigrationRegistry::builtin().migrate(&mut doc, 0, 1).unwrap();
        assert_eq!(doc["rarities"][0]["id"], "r1");
        assert!(doc.get("customRarities").is_none());
        assert!(doc["consumableSets"].is_array());
        assert_eq!(doc["jokers"][0]["sprite"]["x"], 1);
        assert!(doc["jokers"][0].get("image").is_none());
    }

    #[test]
    fn v1_flattens_condition_groups() {
        let mut doc = json!({
            "metadata": {},
            "jokers": [{
                "rules": [{
                    "trigger": "hand_played",
                    "conditionGroups": [
                        { "conditions": [{ "kind": "first_hand" }] },
                        { "conditions": [{ "kind": "hand_type", "params": { "hand": "Pair" } }] },
                    ],
                    "actions": [{ "kind": "add_mult", "params": { "amount": 2 } }],
                }],
            }],
        });
        MigrationRegistry::builtin().migrate(&mut doc, 1, 2).unwrap();
        let rule = &doc["jokers"][0]["rules"][0];
        assert_eq!(rule["conditions"][0]["kind"], "first_hand");
        assert_eq!(rule["conditions"][1]["kind"], "hand_type");
        assert_eq!(rule["effects"][0]["kind"], "add_mult");
        assert!(rule.get("actions").is_none());
        assert!(rule.get("conditionGroups").is_none());
    }
}
