//! Cross-reference registry: derived lookup tables between objects and
//! taxonomies.
//!
//! Built from a project snapshot and its [`KeyTable`] by a pure function and
//! never edited by hand. Consumers rebuild it whenever they need it, so a
//! stale mapping is impossible.

use crate::diagnostic::Problem;
use crate::id::{EngineKey, ObjectId, ObjectKind};
use crate::identifiers::KeyTable;
use crate::model::{BoosterPool, GameObject, KindData, RarityRef, SetRef};
use crate::nodes::{NodeRegistry, ParamType};
use crate::project::Project;
use std::collections::BTreeMap;

/// Builtin rarity names, indexed by `rarity - 1`.
pub const BUILTIN_RARITIES: [&str; 4] = ["Common", "Uncommon", "Rare", "Legendary"];

/// A resolved rarity as it appears in generated source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RarityValue {
    /// Base-game rarity 1..=4, emitted as a number.
    Builtin(u8),
    /// Custom rarity, emitted as its prefixed key string.
    Custom(String),
}

impl RarityValue {
    /// Name the engine's card pools use: builtin rarity names, or the
    /// custom rarity's key.
    pub fn pool_name(&self) -> &str {
        match self {
            RarityValue::Builtin(n) => BUILTIN_RARITIES
                .get(usize::from(*n).saturating_sub(1))
                .copied()
                .unwrap_or(BUILTIN_RARITIES[0]),
            RarityValue::Custom(key) => key,
        }
    }
}

/// Target of a resolved object reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedObject {
    pub kind: ObjectKind,
    pub key: EngineKey,
    pub name: String,
}

/// Derived lookup tables for one project snapshot.
#[derive(Debug, Clone, Default)]
pub struct CrossRefs {
    prefix: String,
    objects: BTreeMap<ObjectId, ResolvedObject>,
    rarities: BTreeMap<String, String>,
    consumable_sets: BTreeMap<String, String>,
    rarity_members: BTreeMap<String, Vec<ObjectId>>,
    set_members: BTreeMap<String, Vec<ObjectId>>,
    referenced_by: BTreeMap<ObjectId, Vec<ObjectId>>,
}

/// Member-table key for a rarity reference: builtin names or custom ids.
fn rarity_slot(rarity: &RarityRef) -> String {
    match rarity {
        RarityRef::Builtin(n) => BUILTIN_RARITIES
            .get((*n as usize).wrapping_sub(1))
            .map(|s| s.to_string())
            .unwrap_or_else(|| n.to_string()),
        RarityRef::Custom(id) => id.clone(),
    }
}

fn set_slot(set: &SetRef) -> String {
    set.clone().into()
}

impl CrossRefs {
    /// Build every table from the snapshot. Rule-embedded references are
    /// discovered through the node registry's parameter schemas.
    pub fn build(project: &Project, keys: &KeyTable, nodes: &NodeRegistry) -> Self {
        let mut refs = CrossRefs {
            prefix: keys.prefix().to_string(),
            ..CrossRefs::default()
        };

        for (index, object) in project.objects().enumerate() {
            if let Some(key) = keys.key_at(index) {
                refs.objects
                    .entry(object.id.clone())
                    .or_insert_with(|| ResolvedObject {
                        kind: object.kind(),
                        key: key.clone(),
                        name: object.name.clone(),
                    });
            }
        }

        for rarity in &project.rarities {
            if let Some(key) = keys.rarity_key(&rarity.id) {
                refs.rarities
                    .insert(rarity.id.clone(), format!("{}_{key}", refs.prefix));
            }
        }
        for set in &project.consumable_sets {
            if let Some(key) = keys.consumable_set_key(&set.id) {
                refs.consumable_sets
                    .insert(set.id.clone(), format!("{}_{key}", refs.prefix));
            }
        }

        for object in project.objects() {
            match &object.data {
                KindData::Joker(joker) => refs
                    .rarity_members
                    .entry(rarity_slot(&joker.rarity))
                    .or_default()
                    .push(object.id.clone()),
                KindData::Consumable(card) => refs
                    .set_members
                    .entry(set_slot(&card.set))
                    .or_default()
                    .push(object.id.clone()),
                _ => {}
            }

            for target in outgoing_references(object, nodes) {
                let users = refs.referenced_by.entry(target).or_default();
                if !users.contains(&object.id) {
                    users.push(object.id.clone());
                }
            }
        }

        refs
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn object(&self, id: &ObjectId) -> Option<&ResolvedObject> {
        self.objects.get(id)
    }

    /// Resolve an object reference, checking the target's kind.
    pub fn resolve_object(&self, id: &str, expected: ObjectKind) -> Result<&EngineKey, Problem> {
        let target = self
            .objects
            .get(&ObjectId::new(id))
            .ok_or_else(|| Problem::UnresolvedReference {
                target: id.to_string(),
                expected: expected.name(),
            })?;
        if target.kind != expected {
            return Err(Problem::WrongReferenceKind {
                target: id.to_string(),
                expected,
                found: target.kind,
            });
        }
        Ok(&target.key)
    }

    pub fn resolve_rarity(&self, rarity: &RarityRef) -> Result<RarityValue, Problem> {
        match rarity {
            RarityRef::Builtin(n @ 1..=4) => Ok(RarityValue::Builtin(*n)),
            RarityRef::Builtin(n) => Err(Problem::InvalidField {
                field: "rarity",
                reason: format!("builtin rarity must be 1 to 4, got {n}"),
            }),
            RarityRef::Custom(id) => self
                .rarities
                .get(id)
                .map(|key| RarityValue::Custom(key.clone()))
                .ok_or_else(|| Problem::UnresolvedReference {
                    target: id.clone(),
                    expected: "rarity",
                }),
        }
    }

    /// Resolve a consumable set to the name the engine knows it by.
    pub fn resolve_set(&self, set: &SetRef) -> Result<String, Problem> {
        match set {
            SetRef::Builtin(builtin) => Ok(builtin.name().to_string()),
            SetRef::Custom(id) => {
                self.consumable_sets
                    .get(id)
                    .cloned()
                    .ok_or_else(|| Problem::UnresolvedReference {
                        target: id.clone(),
                        expected: "consumable set",
                    })
            }
        }
    }

    /// Jokers of a rarity, in canonical order.
    pub fn rarity_members(&self, rarity: &RarityRef) -> &[ObjectId] {
        self.rarity_members
            .get(&rarity_slot(rarity))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Consumables of a set, in canonical order.
    pub fn set_members(&self, set: &SetRef) -> &[ObjectId] {
        self.set_members
            .get(&set_slot(set))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Objects whose rules or static fields point at `target`.
    pub fn referenced_by(&self, target: &ObjectId) -> &[ObjectId] {
        self.referenced_by
            .get(target)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

/// Every object id an object points at, through rule parameters of
/// [`ParamType::Object`] or its own static fields. Unknown node kinds and
/// non-text values are skipped; validation reports those.
pub fn outgoing_references(object: &GameObject, nodes: &NodeRegistry) -> Vec<ObjectId> {
    let mut out = Vec::new();
    for rule in &object.rules {
        let conditions = rule
            .conditions
            .iter()
            .map(|c| (nodes.condition(&c.kind), &c.params));
        let effects = rule
            .effects
            .iter()
            .map(|e| (nodes.effect(&e.kind), &e.params));
        for (spec, params) in conditions.chain(effects) {
            let Some(spec) = spec else { continue };
            for param in &spec.params {
                if let ParamType::Object(_) = param.ty {
                    if let Some(id) = params.get(param.name).and_then(|v| v.as_text()) {
                        out.push(ObjectId::new(id));
                    }
                }
            }
        }
    }
    match &object.data {
        KindData::Voucher(voucher) => out.extend(voucher.requires.iter().cloned()),
        KindData::Booster(booster) => {
            if let BoosterPool::Specific { objects } = &booster.pool {
                out.extend(objects.iter().cloned());
            }
        }
        _ => {}
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::*;

    fn project() -> Project {
        let mut p = Project::new(ModMetadata {
            prefix: "mc".to_string(),
            ..ModMetadata::default()
        });
        p.rarities.push(RarityData {
            id: "r1".to_string(),
            name: "Mythic".to_string(),
            ..RarityData::default()
        });
        p.consumable_sets.push(ConsumableSetData {
            id: "s1".to_string(),
            name: "Runes".to_string(),
            ..ConsumableSetData::default()
        });

        let mut charm = GameObject::new(ObjectKind::Joker, "Lucky Charm").with_id("j1");
        charm.data = KindData::Joker(JokerData {
            rarity: RarityRef::Custom("r1".to_string()),
            ..JokerData::default()
        });
        p.add_object(charm);
        p.add_object(
            GameObject::new(ObjectKind::Joker, "Summoner")
                .with_id("j2")
                .with_rule(
                    Rule::new(crate::trigger::Trigger::BlindSelected)
                        .then(Effect::new("create_joker").with("joker", "j1")),
                ),
        );
        let mut rune = GameObject::new(ObjectKind::Consumable, "Rune").with_id("c1");
        rune.data = KindData::Consumable(ConsumableData {
            set: SetRef::Custom("s1".to_string()),
            hidden: false,
        });
        p.add_object(rune);
        p
    }

    fn build(p: &Project) -> CrossRefs {
        CrossRefs::build(p, &KeyTable::derive(p), &NodeRegistry::builtin())
    }

    #[test]
    fn resolves_objects_to_engine_keys() {
        let p = project();
        let refs = build(&p);
        let key = refs.resolve_object("j1", ObjectKind::Joker).unwrap();
        assert_eq!(key.qualified(), "j_mc_lucky_charm");
    }

    #[test]
    fn dangling_reference_is_unresolved() {
        let refs = build(&project());
        assert_eq!(
            refs.resolve_object("gone", ObjectKind::Joker),
            Err(Problem::UnresolvedReference {
                target: "gone".to_string(),
                expected: "joker",
            })
        );
    }

    #[test]
    fn wrong_kind_is_reported() {
        let refs = build(&project());
        assert!(matches!(
            refs.resolve_object("c1", ObjectKind::Joker),
            Err(Problem::WrongReferenceKind {
                found: ObjectKind::Consumable,
                ..
            })
        ));
    }

    #[test]
    fn taxonomies_resolve_to_prefixed_keys() {
        let refs = build(&project());
        assert_eq!(
            refs.resolve_rarity(&RarityRef::Custom("r1".to_string())),
            Ok(RarityValue::Custom("mc_mythic".to_string()))
        );
        assert_eq!(
            refs.resolve_rarity(&RarityRef::Builtin(3)),
            Ok(RarityValue::Builtin(3))
        );
        assert!(refs.resolve_rarity(&RarityRef::Builtin(9)).is_err());
        assert_eq!(RarityValue::Builtin(3).pool_name(), "Rare");
        assert_eq!(RarityValue::Custom("mc_mythic".to_string()).pool_name(), "mc_mythic");
        assert_eq!(
            refs.resolve_set(&SetRef::Custom("s1".to_string())),
            Ok("mc_runes".to_string())
        );
        assert_eq!(
            refs.resolve_set(&SetRef::Builtin(BuiltinSet::Planet)),
            Ok("Planet".to_string())
        );
    }

    #[test]
    fn member_tables_group_by_taxonomy() {
        let refs = build(&project());
        assert_eq!(
            refs.rarity_members(&RarityRef::Custom("r1".to_string())),
            &[ObjectId::new("j1")]
        );
        assert_eq!(
            refs.rarity_members(&RarityRef::Builtin(1)),
            &[ObjectId::new("j2")]
        );
        assert_eq!(
            refs.set_members(&SetRef::Custom("s1".to_string())),
            &[ObjectId::new("c1")]
        );
    }

    #[test]
    fn rule_references_are_indexed() {
        let refs = build(&project());
        assert_eq!(
            refs.referenced_by(&ObjectId::new("j1")),
            &[ObjectId::new("j2")]
        );
        assert!(refs.referenced_by(&ObjectId::new("j2")).is_empty());
    }

    #[test]
    fn rebuild_reflects_deletions() {
        let mut p = project();
        p.remove_object(&ObjectId::new("j1"));
        let refs = build(&p);
        assert!(refs.resolve_object("j1", ObjectKind::Joker).is_err());
    }
}
