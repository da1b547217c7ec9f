//! The project: mod metadata plus every authored collection.
//!
//! Structural edits (add, duplicate, remove) live here. Derived data
//! (keys, cross references) is recomputed from a project snapshot by the
//! [`identifiers`](crate::identifiers) and [`xref`](crate::xref) modules.

use crate::diagnostic::NodeRole;
use crate::id::{ObjectId, ObjectKind};
use crate::identifiers::IdGenerator;
use crate::model::*;
use crate::nodes::{NodeRegistry, ParamDefault, ParamSpec, ParamType};
use serde::{Deserialize, Serialize};

/// Current project file format version. Increment when the shape changes
/// and register a migration step for the previous version.
pub const FORMAT_VERSION: u32 = 2;

/// The full editable state of one mod.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    #[serde(default)]
    pub format_version: u32,
    pub metadata: ModMetadata,
    #[serde(default)]
    pub jokers: Vec<GameObject>,
    #[serde(default)]
    pub consumables: Vec<GameObject>,
    #[serde(default)]
    pub boosters: Vec<GameObject>,
    #[serde(default)]
    pub enhancements: Vec<GameObject>,
    #[serde(default)]
    pub seals: Vec<GameObject>,
    #[serde(default)]
    pub editions: Vec<GameObject>,
    #[serde(default)]
    pub vouchers: Vec<GameObject>,
    #[serde(default)]
    pub rarities: Vec<RarityData>,
    #[serde(default)]
    pub consumable_sets: Vec<ConsumableSetData>,
}

/// What to do with objects that reference a taxonomy being deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeletePolicy {
    /// Refuse the deletion while anything references it.
    Block,
    /// Reset every reference to the base-game default.
    Cascade,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TaxonomyError {
    #[error("'{id}' is still used by {} object(s)", .users.len())]
    InUse { id: String, users: Vec<ObjectId> },
    #[error("no taxonomy with id '{0}'")]
    NotFound(String),
}

impl Project {
    pub fn new(metadata: ModMetadata) -> Self {
        Self {
            format_version: FORMAT_VERSION,
            metadata,
            jokers: Vec::new(),
            consumables: Vec::new(),
            boosters: Vec::new(),
            enhancements: Vec::new(),
            seals: Vec::new(),
            editions: Vec::new(),
            vouchers: Vec::new(),
            rarities: Vec::new(),
            consumable_sets: Vec::new(),
        }
    }

    pub fn collection(&self, kind: ObjectKind) -> &Vec<GameObject> {
        match kind {
            ObjectKind::Joker => &self.jokers,
            ObjectKind::Consumable => &self.consumables,
            ObjectKind::Booster => &self.boosters,
            ObjectKind::Enhancement => &self.enhancements,
            ObjectKind::Seal => &self.seals,
            ObjectKind::Edition => &self.editions,
            ObjectKind::Voucher => &self.vouchers,
        }
    }

    pub fn collection_mut(&mut self, kind: ObjectKind) -> &mut Vec<GameObject> {
        match kind {
            ObjectKind::Joker => &mut self.jokers,
            ObjectKind::Consumable => &mut self.consumables,
            ObjectKind::Booster => &mut self.boosters,
            ObjectKind::Enhancement => &mut self.enhancements,
            ObjectKind::Seal => &mut self.seals,
            ObjectKind::Edition => &mut self.editions,
            ObjectKind::Voucher => &mut self.vouchers,
        }
    }

    /// All objects across every kind, in canonical kind order then list order.
    pub fn objects(&self) -> impl Iterator<Item = &GameObject> {
        ObjectKind::ALL
            .into_iter()
            .flat_map(move |kind| self.collection(kind).iter())
    }

    pub fn objects_mut(&mut self) -> impl Iterator<Item = &mut GameObject> {
        self.jokers
            .iter_mut()
            .chain(self.consumables.iter_mut())
            .chain(self.boosters.iter_mut())
            .chain(self.enhancements.iter_mut())
            .chain(self.seals.iter_mut())
            .chain(self.editions.iter_mut())
            .chain(self.vouchers.iter_mut())
    }

    pub fn object_count(&self) -> usize {
        ObjectKind::ALL
            .iter()
            .map(|&kind| self.collection(kind).len())
            .sum()
    }

    pub fn object(&self, id: &ObjectId) -> Option<&GameObject> {
        self.objects().find(|o| &o.id == id)
    }

    pub fn object_mut(&mut self, id: &ObjectId) -> Option<&mut GameObject> {
        self.objects_mut().find(|o| &o.id == id)
    }

    /// Append an object to the collection matching its kind.
    pub fn add_object(&mut self, object: GameObject) {
        self.collection_mut(object.kind()).push(object);
    }

    /// Clone an object under a fresh id, inserting the copy right after
    /// the original. The copy's key is cleared so the identifier registry
    /// assigns it a disambiguated one. Returns the new id.
    pub fn duplicate_object(
        &mut self,
        id: &ObjectId,
        ids: &mut dyn IdGenerator,
    ) -> Option<ObjectId> {
        for kind in ObjectKind::ALL {
            let collection = self.collection_mut(kind);
            if let Some(pos) = collection.iter().position(|o| &o.id == id) {
                let mut copy = collection[pos].clone();
                copy.id = ids.next_id();
                copy.key.clear();
                let new_id = copy.id.clone();
                collection.insert(pos + 1, copy);
                return Some(new_id);
            }
        }
        None
    }

    /// Delete an object. References to it elsewhere are left in place and
    /// surface as unresolved references at compile time.
    pub fn remove_object(&mut self, id: &ObjectId) -> Option<GameObject> {
        for kind in ObjectKind::ALL {
            let collection = self.collection_mut(kind);
            if let Some(pos) = collection.iter().position(|o| &o.id == id) {
                return Some(collection.remove(pos));
            }
        }
        None
    }

    /// Ids of objects that reference the given rarity, through a static
    /// field or a rule parameter typed [`ParamType::Rarity`].
    pub fn rarity_users(&self, rarity_id: &str, nodes: &NodeRegistry) -> Vec<ObjectId> {
        let in_rules = RuleTaxonomy::rarity(rarity_id);
        let is_it = |r: &RarityRef| matches!(r, RarityRef::Custom(id) if id == rarity_id);
        self.objects()
            .filter(|o| {
                let static_use = match &o.data {
                    KindData::Joker(j) => is_it(&j.rarity),
                    KindData::Booster(b) => {
                        matches!(&b.pool, BoosterPool::Joker { rarity: Some(r) } if is_it(r))
                    }
                    _ => false,
                };
                static_use || in_rules.used_by(o, nodes)
            })
            .map(|o| o.id.clone())
            .collect()
    }

    /// Ids of objects that reference the given consumable set, through a
    /// static field or a rule parameter typed [`ParamType::ConsumableSet`].
    pub fn consumable_set_users(&self, set_id: &str, nodes: &NodeRegistry) -> Vec<ObjectId> {
        let in_rules = RuleTaxonomy::consumable_set(set_id);
        let is_it = |s: &SetRef| matches!(s, SetRef::Custom(id) if id == set_id);
        self.objects()
            .filter(|o| {
                let static_use = match &o.data {
                    KindData::Consumable(c) => is_it(&c.set),
                    KindData::Booster(b) => {
                        matches!(&b.pool, BoosterPool::Consumable { set } if is_it(set))
                    }
                    _ => false,
                };
                static_use || in_rules.used_by(o, nodes)
            })
            .map(|o| o.id.clone())
            .collect()
    }

    pub fn remove_rarity(
        &mut self,
        id: &str,
        policy: DeletePolicy,
        nodes: &NodeRegistry,
    ) -> Result<RarityData, TaxonomyError> {
        let pos = self
            .rarities
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| TaxonomyError::NotFound(id.to_string()))?;
        let users = self.rarity_users(id, nodes);
        if !users.is_empty() && policy == DeletePolicy::Block {
            return Err(TaxonomyError::InUse {
                id: id.to_string(),
                users,
            });
        }
        let in_rules = RuleTaxonomy::rarity(id);
        let is_it = |r: &RarityRef| matches!(r, RarityRef::Custom(rid) if rid == id);
        for object in self.objects_mut() {
            match &mut object.data {
                KindData::Joker(j) if is_it(&j.rarity) => j.rarity = RarityRef::default(),
                KindData::Booster(b) => {
                    if let BoosterPool::Joker { rarity } = &mut b.pool {
                        if rarity.as_ref().is_some_and(is_it) {
                            *rarity = None;
                        }
                    }
                }
                _ => {}
            }
            in_rules.clear(object, nodes);
        }
        Ok(self.rarities.remove(pos))
    }

    pub fn remove_consumable_set(
        &mut self,
        id: &str,
        policy: DeletePolicy,
        nodes: &NodeRegistry,
    ) -> Result<ConsumableSetData, TaxonomyError> {
        let pos = self
            .consumable_sets
            .iter()
            .position(|s| s.id == id)
            .ok_or_else(|| TaxonomyError::NotFound(id.to_string()))?;
        let users = self.consumable_set_users(id, nodes);
        if !users.is_empty() && policy == DeletePolicy::Block {
            return Err(TaxonomyError::InUse {
                id: id.to_string(),
                users,
            });
        }
        let in_rules = RuleTaxonomy::consumable_set(id);
        let is_it = |s: &SetRef| matches!(s, SetRef::Custom(sid) if sid == id);
        for object in self.objects_mut() {
            match &mut object.data {
                KindData::Consumable(c) if is_it(&c.set) => c.set = SetRef::default(),
                KindData::Booster(b) => {
                    if let BoosterPool::Consumable { set } = &mut b.pool {
                        if is_it(set) {
                            *set = SetRef::default();
                        }
                    }
                }
                _ => {}
            }
            in_rules.clear(object, nodes);
        }
        Ok(self.consumable_sets.remove(pos))
    }
}

/// A taxonomy as it appears inside rule parameters. Which parameters can
/// hold it comes from the node schemas, so new node kinds are covered
/// without changes here.
struct RuleTaxonomy<'a> {
    ty: ParamType,
    id: &'a str,
    /// Written into required parameters on cascade; optional ones are
    /// removed and fall back to their schema default.
    fallback: ParamValue,
}

impl<'a> RuleTaxonomy<'a> {
    fn rarity(id: &'a str) -> Self {
        Self {
            ty: ParamType::Rarity,
            id,
            fallback: ParamValue::Number(1.0),
        }
    }

    fn consumable_set(id: &'a str) -> Self {
        Self {
            ty: ParamType::ConsumableSet,
            id,
            fallback: ParamValue::Text(String::from(SetRef::default())),
        }
    }

    fn names(&self, value: &ParamValue) -> bool {
        let ParamValue::Text(text) = value else {
            return false;
        };
        match self.ty {
            ParamType::ConsumableSet => {
                matches!(SetRef::from(text.clone()), SetRef::Custom(id) if id == self.id)
            }
            _ => text == self.id,
        }
    }

    /// Schema entries of this taxonomy's type on one rule node.
    fn slots(&self, nodes: &NodeRegistry, role: NodeRole, kind: &str) -> Vec<ParamSpec> {
        nodes
            .get(role, kind)
            .map(|spec| spec.params.iter().filter(|p| p.ty == self.ty).copied().collect())
            .unwrap_or_default()
    }

    fn used_by(&self, object: &GameObject, nodes: &NodeRegistry) -> bool {
        object.rules.iter().any(|rule| {
            let conditions = rule
                .conditions
                .iter()
                .map(|c| (NodeRole::Condition, &c.kind, &c.params));
            let effects = rule
                .effects
                .iter()
                .map(|e| (NodeRole::Effect, &e.kind, &e.params));
            conditions.chain(effects).any(|(role, kind, params)| {
                self.slots(nodes, role, kind)
                    .iter()
                    .any(|p| params.get(p.name).is_some_and(|v| self.names(v)))
            })
        })
    }

    fn clear(&self, object: &mut GameObject, nodes: &NodeRegistry) {
        for rule in &mut object.rules {
            let conditions = rule
                .conditions
                .iter_mut()
                .map(|c| (NodeRole::Condition, &c.kind, &mut c.params));
            let effects = rule
                .effects
                .iter_mut()
                .map(|e| (NodeRole::Effect, &e.kind, &mut e.params));
            for (role, kind, params) in conditions.chain(effects) {
                for slot in self.slots(nodes, role, kind) {
                    if !params.get(slot.name).is_some_and(|v| self.names(v)) {
                        continue;
                    }
                    if matches!(slot.default, ParamDefault::Required) {
                        params.insert(slot.name.to_string(), self.fallback.clone());
                    } else {
                        params.remove(slot.name);
                    }
                }
            }
        }
    }
}
