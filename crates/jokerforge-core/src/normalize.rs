//! Schema normalizer: turns any stored project document into a
//! schema-complete [`Project`].
//!
//! Documents are upgraded through the [`MigrationRegistry`], missing or
//! mistyped collections are replaced with empty ones, and every absent
//! field takes its default during deserialization. Only a document whose
//! basic shape is wrong fails, and that failure is structural.

use crate::id::ObjectKind;
use crate::migration::{MigrationError, MigrationRegistry};
use crate::project::{FORMAT_VERSION, Project};
use serde_json::{Map, Value};
use tracing::{debug, warn};

const TAXONOMY_COLLECTIONS: [&str; 2] = ["rarities", "consumableSets"];

#[derive(Debug, thiserror::Error)]
pub enum NormalizeError {
    #[error("project is malformed: {0}")]
    Structural(String),
    #[error("project format version {found} is newer than the supported version {supported}")]
    TooNew { found: u64, supported: u32 },
    #[error("project could not be upgraded: {0}")]
    Migration(#[from] MigrationError),
}

fn structural(reason: impl Into<String>) -> NormalizeError {
    NormalizeError::Structural(reason.into())
}

/// Remove `null` members everywhere so they read as absent.
fn strip_nulls(value: &mut Value) {
    match value {
        Value::Object(map) => {
            map.retain(|_, v| !v.is_null());
            map.values_mut().for_each(strip_nulls);
        }
        Value::Array(items) => items.iter_mut().for_each(strip_nulls),
        _ => {}
    }
}

fn check_shape(root: &Map<String, Value>) -> Result<(), NormalizeError> {
    if !root.get("metadata").is_some_and(Value::is_object) {
        return Err(structural("'metadata' is missing or not an object"));
    }
    if !root.get("jokers").is_some_and(Value::is_array) {
        return Err(structural("'jokers' is missing or not an array"));
    }
    Ok(())
}

fn format_version(root: &Map<String, Value>) -> Result<u64, NormalizeError> {
    match root.get("formatVersion") {
        None => Ok(0),
        Some(v) => v
            .as_u64()
            .ok_or_else(|| structural(format!("'formatVersion' is not a version number: {v}"))),
    }
}

/// Make `name` an array of objects, dropping anything else. When `kind` is
/// given, stamp it on every entry.
fn repair_collection(root: &mut Map<String, Value>, name: &str, kind: Option<ObjectKind>) {
    let entries = match root.remove(name) {
        Some(Value::Array(entries)) => entries,
        Some(other) => {
            warn!(collection = name, found = %other, "collection is not an array, replacing with an empty one");
            Vec::new()
        }
        None => Vec::new(),
    };
    let mut kept = Vec::with_capacity(entries.len());
    for (index, entry) in entries.into_iter().enumerate() {
        match entry {
            Value::Object(mut object) => {
                if let Some(kind) = kind {
                    object.insert("kind".to_string(), Value::from(kind.name()));
                }
                kept.push(Value::Object(object));
            }
            other => warn!(collection = name, index, found = %other, "dropping malformed entry"),
        }
    }
    root.insert(name.to_string(), Value::Array(kept));
}

/// Normalize a raw project document using the built-in migrations.
pub fn normalize(doc: Value) -> Result<Project, NormalizeError> {
    normalize_with(doc, &MigrationRegistry::builtin())
}

/// Normalize a raw project document with an explicit migration registry.
pub fn normalize_with(mut doc: Value, migrations: &MigrationRegistry) -> Result<Project, NormalizeError> {
    let root = doc
        .as_object()
        .ok_or_else(|| structural("top level is not an object"))?;
    check_shape(root)?;
    let found = format_version(root)?;
    if found > u64::from(FORMAT_VERSION) {
        return Err(NormalizeError::TooNew {
            found,
            supported: FORMAT_VERSION,
        });
    }

    strip_nulls(&mut doc);
    let from = found as u32;
    if from < FORMAT_VERSION {
        debug!(from, to = FORMAT_VERSION, "upgrading project document");
    }
    migrations.migrate(&mut doc, from, FORMAT_VERSION)?;

    let root = doc
        .as_object_mut()
        .ok_or_else(|| structural("top level is not an object"))?;
    for kind in ObjectKind::ALL {
        repair_collection(root, kind.collection(), Some(kind));
    }
    for name in TAXONOMY_COLLECTIONS {
        repair_collection(root, name, None);
    }
    root.insert("formatVersion".to_string(), Value::from(FORMAT_VERSION));

    serde_json::from_value(doc).map_err(|e| structural(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{KindData, RarityRef};
    use crate::trigger::Trigger;
    use serde_json::json;

    #[test]
    fn minimal_document_fills_defaults() {
        let p = normalize(json!({ "metadata": { "name": "M" }, "jokers": [] })).unwrap();
        assert_eq!(p.format_version, FORMAT_VERSION);
        assert_eq!(p.metadata.name, "M");
        assert_eq!(p.metadata.main_file, "main.lua");
        assert!(p.consumables.is_empty());
        assert!(p.rarities.is_empty());
    }

    #[test]
    fn missing_fields_take_defaults() {
        let p = normalize(json!({
            "formatVersion": 2,
            "metadata": {},
            "jokers": [{ "id": "j1", "name": "Plain", "cost": null }],
        }))
        .unwrap();
        let joker = &p.jokers[0];
        assert_eq!(joker.cost, 4);
        assert!(joker.unlocked);
        match &joker.data {
            KindData::Joker(data) => assert_eq!(data.rarity, RarityRef::Builtin(1)),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn structural_problems_fail() {
        assert!(matches!(normalize(json!([])), Err(NormalizeError::Structural(_))));
        assert!(matches!(
            normalize(json!({ "jokers": [] })),
            Err(NormalizeError::Structural(_))
        ));
        assert!(matches!(
            normalize(json!({ "metadata": {}, "jokers": {} })),
            Err(NormalizeError::Structural(_))
        ));
        assert!(matches!(
            normalize(json!({ "metadata": {}, "jokers": [], "formatVersion": "two" })),
            Err(NormalizeError::Structural(_))
        ));
    }

    #[test]
    fn newer_versions_are_refused() {
        assert!(matches!(
            normalize(json!({ "metadata": {}, "jokers": [], "formatVersion": 99 })),
            Err(NormalizeError::TooNew { found: 99, .. })
        ));
    }

    #[test]
    fn malformed_collections_are_repaired() {
        let p = normalize(json!({
            "metadata": {},
            "jokers": [1, "two", { "id": "j1", "name": "Kept" }],
            "consumables": "oops",
            "seals": [{ "id": "s1", "name": "Wax", "kind": "joker" }],
        }))
        .unwrap();
        assert_eq!(p.jokers.len(), 1);
        assert!(p.consumables.is_empty());
        // The collection decides the kind.
        assert!(matches!(p.seals[0].data, KindData::Seal(_)));
    }

    #[test]
    fn type_mismatch_is_structural() {
        assert!(matches!(
            normalize(json!({ "metadata": {}, "jokers": [{ "cost": "cheap" }] })),
            Err(NormalizeError::Structural(_))
        ));
    }

    #[test]
    fn legacy_document_upgrades() {
        let p = normalize(json!({
            "metadata": { "prefix": "mc" },
            "jokers": [{
                "id": "j1",
                "name": "Old",
                "image": { "x": 3, "y": 1 },
                "rules": [{
                    "trigger": "hand_played",
                    "conditionGroups": [{ "conditions": [{ "kind": "first_hand" }] }],
                    "actions": [{ "kind": "add_mult", "params": { "amount": 2 } }],
                }],
            }],
            "customRarities": [{ "id": "r1", "name": "Mythic" }],
        }))
        .unwrap();
        let joker = &p.jokers[0];
        assert_eq!(joker.sprite.map(|s| s.x), Some(3));
        assert_eq!(joker.rules[0].trigger, Trigger::HandPlayed);
        assert_eq!(joker.rules[0].conditions[0].kind, "first_hand");
        assert_eq!(joker.rules[0].effects[0].kind, "add_mult");
        assert_eq!(p.rarities[0].name, "Mythic");
    }

    #[test]
    fn normalizing_twice_is_stable() {
        let doc = json!({
            "metadata": { "name": "M" },
            "jokers": [{ "id": "j1", "name": "A" }],
        });
        let once = normalize(doc).unwrap();
        let twice = normalize(serde_json::to_value(&once).unwrap()).unwrap();
        assert_eq!(once, twice);
    }
}
