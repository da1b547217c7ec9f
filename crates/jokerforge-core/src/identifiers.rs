//! Identifier registry: stable ids and collision-free engine keys.
//!
//! Keys are slugs of object names, disambiguated with `_2`, `_3`, ... in
//! list order. Assignment runs in two passes so that it is idempotent and
//! stable under insertion:
//!
//! 1. Every object whose stored key still matches its name (the slug itself
//!    or the slug plus a numeric suffix) keeps it, first come first served.
//! 2. Every remaining object takes the first free candidate.
//!
//! A new object therefore never displaces an existing key, and running the
//! assignment on already-keyed data changes nothing.

use crate::id::{EngineKey, ObjectId};
use crate::project::Project;
use std::collections::{BTreeMap, HashMap, HashSet};

// ===========================================================================
// Id generation
// ===========================================================================

/// Source of fresh object ids.
pub trait IdGenerator {
    fn next_id(&mut self) -> ObjectId;
}

/// Random UUID v4 ids, used by the editor.
#[derive(Debug, Default)]
pub struct UuidIds;

impl IdGenerator for UuidIds {
    fn next_id(&mut self) -> ObjectId {
        ObjectId(uuid::Uuid::new_v4().to_string())
    }
}

/// Deterministic `{prefix}-1`, `{prefix}-2`, ... ids.
#[derive(Debug)]
pub struct SequentialIds {
    prefix: String,
    next: u64,
}

impl SequentialIds {
    pub fn new(prefix: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
            next: 1,
        }
    }
}

impl IdGenerator for SequentialIds {
    fn next_id(&mut self) -> ObjectId {
        let id = ObjectId(format!("{}-{}", self.prefix, self.next));
        self.next += 1;
        id
    }
}

// ===========================================================================
// Slugs
// ===========================================================================

/// Lowercase ASCII slug of a display name: `"Lucky Charm!"` -> `lucky_charm`.
/// Returns an empty string when the name has no usable characters.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_sep = false;
    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_sep && !slug.is_empty() {
                slug.push('_');
            }
            pending_sep = false;
            slug.push(ch.to_ascii_lowercase());
        } else {
            pending_sep = true;
        }
    }
    slug
}

/// Whether `key` is `base` or `base_N` for some N >= 2 without leading zeros.
fn key_matches_base(key: &str, base: &str) -> bool {
    if key == base {
        return true;
    }
    let Some(suffix) = key
        .strip_prefix(base)
        .and_then(|rest| rest.strip_prefix('_'))
    else {
        return false;
    };
    !suffix.starts_with('0') && suffix.parse::<u32>().is_ok_and(|n| n >= 2)
}

/// Two-pass key assignment over `(name, stored key, fallback)` entries.
/// The result is parallel to the input.
fn assign_keys(entries: &[(&str, &str, &str)]) -> Vec<String> {
    let bases: Vec<String> = entries
        .iter()
        .map(|(name, _, fallback)| {
            let slug = slugify(name);
            if slug.is_empty() {
                fallback.to_string()
            } else {
                slug
            }
        })
        .collect();

    let mut claimed: HashSet<String> = HashSet::new();
    let mut keys: Vec<Option<String>> = entries
        .iter()
        .zip(&bases)
        .map(|((_, stored, _), base)| {
            (key_matches_base(stored, base) && claimed.insert(stored.to_string()))
                .then(|| stored.to_string())
        })
        .collect();

    for (slot, base) in keys.iter_mut().zip(&bases) {
        if slot.is_some() {
            continue;
        }
        let mut candidate = base.clone();
        let mut n = 2;
        while claimed.contains(&candidate) {
            candidate = format!("{base}_{n}");
            n += 1;
        }
        claimed.insert(candidate.clone());
        *slot = Some(candidate);
    }

    keys.into_iter().flatten().collect()
}

// ===========================================================================
// Key table
// ===========================================================================

/// One object's position in the key table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEntry {
    pub id: ObjectId,
    pub key: EngineKey,
}

/// Engine keys for every object, rarity, and consumable set of a project
/// snapshot. Entries follow [`Project::objects`] order.
#[derive(Debug, Clone)]
pub struct KeyTable {
    prefix: String,
    entries: Vec<KeyEntry>,
    by_id: HashMap<ObjectId, usize>,
    rarities: BTreeMap<String, String>,
    consumable_sets: BTreeMap<String, String>,
}

impl KeyTable {
    /// Compute keys for a snapshot without mutating it.
    pub fn derive(project: &Project) -> Self {
        let prefix = project.metadata.prefix.clone();

        let objects: Vec<_> = project.objects().collect();
        let entries: Vec<(&str, &str, &str)> = objects
            .iter()
            .map(|o| (o.name.as_str(), o.key.as_str(), o.kind().name()))
            .collect();
        let keys = assign_keys(&entries);

        let mut by_id = HashMap::new();
        let entries: Vec<KeyEntry> = objects
            .iter()
            .zip(keys)
            .enumerate()
            .map(|(index, (object, key))| {
                by_id.entry(object.id.clone()).or_insert(index);
                KeyEntry {
                    id: object.id.clone(),
                    key: EngineKey::new(object.kind(), &prefix, &key),
                }
            })
            .collect();

        let rarity_entries: Vec<_> = project
            .rarities
            .iter()
            .map(|r| (r.name.as_str(), r.key.as_str(), "rarity"))
            .collect();
        let rarities = project
            .rarities
            .iter()
            .map(|r| r.id.clone())
            .zip(assign_keys(&rarity_entries))
            .collect();

        let set_entries: Vec<_> = project
            .consumable_sets
            .iter()
            .map(|s| (s.name.as_str(), s.key.as_str(), "set"))
            .collect();
        let consumable_sets = project
            .consumable_sets
            .iter()
            .map(|s| s.id.clone())
            .zip(assign_keys(&set_entries))
            .collect();

        Self {
            prefix,
            entries,
            by_id,
            rarities,
            consumable_sets,
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn entries(&self) -> &[KeyEntry] {
        &self.entries
    }

    /// Key of the object at `index` in [`Project::objects`] order.
    pub fn key_at(&self, index: usize) -> Option<&EngineKey> {
        self.entries.get(index).map(|e| &e.key)
    }

    pub fn key_of(&self, id: &ObjectId) -> Option<&EngineKey> {
        self.by_id.get(id).map(|&i| &self.entries[i].key)
    }

    /// Unprefixed key of a custom rarity.
    pub fn rarity_key(&self, id: &str) -> Option<&str> {
        self.rarities.get(id).map(String::as_str)
    }

    /// Unprefixed key of a custom consumable set.
    pub fn consumable_set_key(&self, id: &str) -> Option<&str> {
        self.consumable_sets.get(id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ===========================================================================
// Assignment
// ===========================================================================

/// Give every object, rarity, and consumable set a unique id and key.
///
/// Objects lacking an id, or repeating an id already seen earlier in
/// canonical order, receive a fresh one. Rule contents are never touched.
pub fn assign_identifiers(mut project: Project, ids: &mut dyn IdGenerator) -> Project {
    let mut seen: HashSet<ObjectId> = HashSet::new();
    for object in project.objects_mut() {
        if object.id.is_empty() || !seen.insert(object.id.clone()) {
            object.id = ids.next_id();
            seen.insert(object.id.clone());
        }
    }
    let mut seen_taxonomy: HashSet<String> = HashSet::new();
    for rarity in &mut project.rarities {
        if rarity.id.trim().is_empty() || !seen_taxonomy.insert(rarity.id.clone()) {
            rarity.id = ids.next_id().0;
            seen_taxonomy.insert(rarity.id.clone());
        }
    }
    for set in &mut project.consumable_sets {
        if set.id.trim().is_empty() || !seen_taxonomy.insert(set.id.clone()) {
            set.id = ids.next_id().0;
            seen_taxonomy.insert(set.id.clone());
        }
    }

    let table = KeyTable::derive(&project);
    for (object, entry) in project.objects_mut().zip(table.entries()) {
        if object.key != entry.key.key {
            object.key = entry.key.key.clone();
        }
    }
    for rarity in &mut project.rarities {
        if let Some(key) = table.rarity_key(&rarity.id) {
            rarity.key = key.to_string();
        }
    }
    for set in &mut project.consumable_sets {
        if let Some(key) = table.consumable_set_key(&set.id) {
            set.key = key.to_string();
        }
    }
    project
}

/// All engine keys currently in use, as `{prefix}_{key}` strings.
pub fn engine_keys(project: &Project) -> Vec<String> {
    KeyTable::derive(project)
        .entries()
        .iter()
        .map(|e| e.key.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::ObjectKind;
    use crate::model::{GameObject, ModMetadata, RarityData};

    fn meta() -> ModMetadata {
        ModMetadata {
            id: "MoreCharms".to_string(),
            name: "More Charms".to_string(),
            prefix: "mc".to_string(),
            author: vec!["Ada".to_string()],
            ..ModMetadata::default()
        }
    }

    fn joker(name: &str) -> GameObject {
        GameObject::new(ObjectKind::Joker, name)
    }

    #[test]
    fn slugify_collapses_separators() {
        assert_eq!(slugify("Lucky Charm"), "lucky_charm");
        assert_eq!(slugify("  Lucky -- Charm!! "), "lucky_charm");
        assert_eq!(slugify("8 Ball"), "8_ball");
        assert_eq!(slugify("Épée"), "p_e");
        assert_eq!(slugify("???"), "");
    }

    #[test]
    fn suffix_matching_requires_number_from_two() {
        assert!(key_matches_base("lucky_charm", "lucky_charm"));
        assert!(key_matches_base("lucky_charm_2", "lucky_charm"));
        assert!(key_matches_base("lucky_charm_17", "lucky_charm"));
        assert!(!key_matches_base("lucky_charm_1", "lucky_charm"));
        assert!(!key_matches_base("lucky_charm_02", "lucky_charm"));
        assert!(!key_matches_base("lucky_charm_x", "lucky_charm"));
        assert!(!key_matches_base("lucky", "lucky_charm"));
    }

    #[test]
    fn single_object_gets_prefixed_slug() {
        let mut p = Project::new(meta());
        p.add_object(joker("Lucky Charm"));
        let p = assign_identifiers(p, &mut SequentialIds::new("id"));
        assert_eq!(engine_keys(&p), ["mc_lucky_charm"]);
        assert_eq!(p.jokers[0].id, ObjectId::new("id-1"));
    }

    #[test]
    fn duplicates_are_suffixed_in_list_order() {
        let mut p = Project::new(meta());
        p.add_object(joker("Lucky Charm"));
        p.add_object(joker("Lucky Charm"));
        p.add_object(joker("Lucky Charm"));
        let p = assign_identifiers(p, &mut SequentialIds::new("id"));
        assert_eq!(
            engine_keys(&p),
            ["mc_lucky_charm", "mc_lucky_charm_2", "mc_lucky_charm_3"]
        );
    }

    #[test]
    fn keys_are_unique_across_kinds() {
        let mut p = Project::new(meta());
        p.add_object(joker("Glow"));
        p.add_object(GameObject::new(ObjectKind::Edition, "Glow"));
        let p = assign_identifiers(p, &mut SequentialIds::new("id"));
        assert_eq!(p.jokers[0].key, "glow");
        assert_eq!(p.editions[0].key, "glow_2");
    }

    #[test]
    fn assignment_is_idempotent() {
        let mut p = Project::new(meta());
        p.add_object(joker("Lucky Charm"));
        p.add_object(joker("Lucky Charm"));
        p.add_object(joker("Lucky Charm 2"));
        let mut ids = SequentialIds::new("id");
        let once = assign_identifiers(p, &mut ids);
        let twice = assign_identifiers(once.clone(), &mut ids);
        assert_eq!(once, twice);
    }

    #[test]
    fn insertion_does_not_move_existing_keys() {
        let mut p = Project::new(meta());
        p.add_object(joker("Lucky Charm"));
        p.add_object(joker("Lucky Charm"));
        let mut ids = SequentialIds::new("id");
        let mut p = assign_identifiers(p, &mut ids);
        let before = engine_keys(&p);

        // Insert at the front: a naive list-order pass would hand it the
        // unsuffixed key.
        p.jokers.insert(0, joker("Lucky Charm"));
        let p = assign_identifiers(p, &mut ids);
        let after = engine_keys(&p);

        assert_eq!(&after[1..], &before[..]);
        assert_eq!(after[0], "mc_lucky_charm_3");
    }

    #[test]
    fn renamed_object_gets_a_fresh_key() {
        let mut p = Project::new(meta());
        p.add_object(joker("Lucky Charm"));
        let mut ids = SequentialIds::new("id");
        let mut p = assign_identifiers(p, &mut ids);
        p.jokers[0].name = "Unlucky Charm".to_string();
        let p = assign_identifiers(p, &mut ids);
        assert_eq!(p.jokers[0].key, "unlucky_charm");
    }

    #[test]
    fn nameless_objects_fall_back_to_kind_name() {
        let mut p = Project::new(meta());
        p.add_object(joker(""));
        p.add_object(GameObject::new(ObjectKind::Seal, "!!!"));
        let p = assign_identifiers(p, &mut SequentialIds::new("id"));
        assert_eq!(engine_keys(&p), ["mc_joker", "mc_seal"]);
    }

    #[test]
    fn repeated_ids_are_replaced() {
        let mut p = Project::new(meta());
        p.add_object(joker("A").with_id("same"));
        p.add_object(joker("B").with_id("same"));
        let p = assign_identifiers(p, &mut SequentialIds::new("id"));
        assert_eq!(p.jokers[0].id, ObjectId::new("same"));
        assert_eq!(p.jokers[1].id, ObjectId::new("id-1"));
    }

    #[test]
    fn derive_does_not_require_stored_keys() {
        let mut p = Project::new(meta());
        p.add_object(joker("Lucky Charm").with_id("j1"));
        let table = KeyTable::derive(&p);
        assert_eq!(
            table.key_of(&ObjectId::new("j1")).unwrap().to_string(),
            "mc_lucky_charm"
        );
        assert!(p.jokers[0].key.is_empty());
    }

    #[test]
    fn taxonomies_get_their_own_keys() {
        let mut p = Project::new(meta());
        p.rarities.push(RarityData {
            name: "Mythic".to_string(),
            ..RarityData::default()
        });
        p.rarities.push(RarityData {
            name: "Mythic".to_string(),
            ..RarityData::default()
        });
        let p = assign_identifiers(p, &mut SequentialIds::new("r"));
        assert_eq!(p.rarities[0].key, "mythic");
        assert_eq!(p.rarities[1].key, "mythic_2");
        assert_ne!(p.rarities[0].id, p.rarities[1].id);
    }

    #[test]
    fn uuid_ids_are_distinct() {
        let mut ids = UuidIds;
        assert_ne!(ids.next_id(), ids.next_id());
    }
}
