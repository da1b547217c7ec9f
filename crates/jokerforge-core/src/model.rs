//! Canonical data model for an authored mod.
//!
//! These are the on-disk (project file) shapes as well as the in-memory
//! model the compiler reads. Every field that may be absent in older
//! project files carries a serde default, so deserializing a normalized
//! payload always yields a schema-complete value.

use crate::id::{ObjectId, ObjectKind};
use crate::trigger::Trigger;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// ===========================================================================
// Mod metadata
// ===========================================================================

/// Mod-level identity. Serialized (in part) into the archive manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ModMetadata {
    pub id: String,
    pub name: String,
    pub display_name: String,
    pub author: Vec<String>,
    pub description: String,
    pub version: String,
    /// Namespacing string prepended to every generated key.
    pub prefix: String,
    pub main_file: String,
    pub priority: i32,
    pub badge_colour: String,
    pub badge_text_colour: String,
    pub dependencies: Vec<String>,
    pub conflicts: Vec<String>,
    pub provides: Vec<String>,
    pub icon_image: Option<String>,
    pub game_image: Option<String>,
}

impl Default for ModMetadata {
    fn default() -> Self {
        Self {
            id: String::new(),
            name: String::new(),
            display_name: String::new(),
            author: Vec::new(),
            description: String::new(),
            version: "1.0.0".to_string(),
            prefix: String::new(),
            main_file: "main.lua".to_string(),
            priority: 0,
            badge_colour: "666665".to_string(),
            badge_text_colour: "FFFFFF".to_string(),
            dependencies: Vec::new(),
            conflicts: Vec::new(),
            provides: Vec::new(),
            icon_image: None,
            game_image: None,
        }
    }
}

// ===========================================================================
// Rule nodes
// ===========================================================================

/// A parameter value on a condition or effect. References to other
/// objects or taxonomies are stored as text holding the target id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl ParamValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            ParamValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ParamValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Bool(b) => write!(f, "{b}"),
            ParamValue::Number(n) => write!(f, "{n}"),
            ParamValue::Text(s) => write!(f, "\"{s}\""),
        }
    }
}

impl From<f64> for ParamValue {
    fn from(n: f64) -> Self {
        ParamValue::Number(n)
    }
}

impl From<&str> for ParamValue {
    fn from(s: &str) -> Self {
        ParamValue::Text(s.to_string())
    }
}

impl From<bool> for ParamValue {
    fn from(b: bool) -> Self {
        ParamValue::Bool(b)
    }
}

pub type Params = BTreeMap<String, ParamValue>;

/// A boolean predicate gating the effects of its rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub kind: String,
    #[serde(default)]
    pub negate: bool,
    #[serde(default)]
    pub params: Params,
}

impl Condition {
    pub fn new(kind: &str) -> Self {
        Self {
            id: String::new(),
            kind: kind.to_string(),
            negate: false,
            params: Params::new(),
        }
    }

    pub fn with(mut self, name: &str, value: impl Into<ParamValue>) -> Self {
        self.params.insert(name.to_string(), value.into());
        self
    }

    pub fn negated(mut self) -> Self {
        self.negate = true;
        self
    }
}

/// A single executable action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Effect {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub kind: String,
    #[serde(default)]
    pub params: Params,
}

impl Effect {
    pub fn new(kind: &str) -> Self {
        Self {
            id: String::new(),
            kind: kind.to_string(),
            params: Params::new(),
        }
    }

    pub fn with(mut self, name: &str, value: impl Into<ParamValue>) -> Self {
        self.params.insert(name.to_string(), value.into());
        self
    }
}

/// Trigger -> all conditions -> effects in order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default)]
    pub trigger: Trigger,
    #[serde(default)]
    pub conditions: Vec<Condition>,
    #[serde(default)]
    pub effects: Vec<Effect>,
}

impl Rule {
    pub fn new(trigger: Trigger) -> Self {
        Self {
            id: String::new(),
            trigger,
            conditions: Vec::new(),
            effects: Vec::new(),
        }
    }

    pub fn when(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn then(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }
}

// ===========================================================================
// Taxonomy references
// ===========================================================================

/// Either one of the four base-game rarities (1..=4) or a custom rarity id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RarityRef {
    Builtin(u8),
    Custom(String),
}

impl Default for RarityRef {
    fn default() -> Self {
        RarityRef::Builtin(1)
    }
}

/// Base-game consumable sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinSet {
    Tarot,
    Planet,
    Spectral,
}

impl BuiltinSet {
    pub fn name(self) -> &'static str {
        match self {
            BuiltinSet::Tarot => "Tarot",
            BuiltinSet::Planet => "Planet",
            BuiltinSet::Spectral => "Spectral",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "Tarot" => Some(BuiltinSet::Tarot),
            "Planet" => Some(BuiltinSet::Planet),
            "Spectral" => Some(BuiltinSet::Spectral),
            _ => None,
        }
    }
}

/// Either a base-game consumable set or a custom consumable-set id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SetRef {
    Builtin(BuiltinSet),
    Custom(String),
}

impl Default for SetRef {
    fn default() -> Self {
        SetRef::Builtin(BuiltinSet::Tarot)
    }
}

impl From<String> for SetRef {
    fn from(s: String) -> Self {
        match BuiltinSet::from_name(&s) {
            Some(builtin) => SetRef::Builtin(builtin),
            None => SetRef::Custom(s),
        }
    }
}

impl From<SetRef> for String {
    fn from(set: SetRef) -> Self {
        match set {
            SetRef::Builtin(builtin) => builtin.name().to_string(),
            SetRef::Custom(id) => id,
        }
    }
}

// ===========================================================================
// Game objects
// ===========================================================================

/// Cell position inside the kind's sprite atlas.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpritePos {
    pub x: u32,
    pub y: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct JokerData {
    pub rarity: RarityRef,
    pub blueprint_compat: bool,
    pub eternal_compat: bool,
    pub perishable_compat: bool,
}

impl Default for JokerData {
    fn default() -> Self {
        Self {
            rarity: RarityRef::default(),
            blueprint_compat: true,
            eternal_compat: true,
            perishable_compat: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ConsumableData {
    pub set: SetRef,
    pub hidden: bool,
}

/// Where a booster pack draws its cards from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BoosterPool {
    Joker {
        #[serde(default)]
        rarity: Option<RarityRef>,
    },
    Consumable {
        #[serde(default)]
        set: SetRef,
    },
    PlayingCard,
    Specific {
        #[serde(default)]
        objects: Vec<ObjectId>,
    },
}

impl Default for BoosterPool {
    fn default() -> Self {
        BoosterPool::Joker { rarity: None }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BoosterData {
    pub pool: BoosterPool,
    /// Cards shown when the pack opens.
    pub extra: u32,
    /// Cards the player may take.
    pub choose: u32,
    pub weight: f64,
    pub draw_hand: bool,
}

impl Default for BoosterData {
    fn default() -> Self {
        Self {
            pool: BoosterPool::default(),
            extra: 3,
            choose: 1,
            weight: 1.0,
            draw_hand: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EnhancementData {
    pub bonus_chips: f64,
    pub bonus_mult: f64,
    pub x_mult: f64,
    pub replace_base_card: bool,
    pub no_rank: bool,
    pub no_suit: bool,
    pub always_scores: bool,
    pub weight: f64,
}

impl Default for EnhancementData {
    fn default() -> Self {
        Self {
            bonus_chips: 0.0,
            bonus_mult: 0.0,
            x_mult: 1.0,
            replace_base_card: false,
            no_rank: false,
            no_suit: false,
            always_scores: false,
            weight: 5.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SealData {
    pub badge_colour: String,
}

impl Default for SealData {
    fn default() -> Self {
        Self {
            badge_colour: "FFAA00".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EditionData {
    pub chips: f64,
    pub mult: f64,
    pub x_mult: f64,
    pub shader: Option<String>,
    pub extra_cost: u32,
    pub weight: f64,
    pub in_shop: bool,
}

impl Default for EditionData {
    fn default() -> Self {
        Self {
            chips: 0.0,
            mult: 0.0,
            x_mult: 1.0,
            shader: None,
            extra_cost: 0,
            weight: 3.0,
            in_shop: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VoucherData {
    /// Vouchers that must be redeemed first.
    pub requires: Vec<ObjectId>,
}

/// Kind-specific payload of a [`GameObject`], tagged by `kind`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum KindData {
    Joker(JokerData),
    Consumable(ConsumableData),
    Booster(BoosterData),
    Enhancement(EnhancementData),
    Seal(SealData),
    Edition(EditionData),
    Voucher(VoucherData),
}

impl KindData {
    pub fn kind(&self) -> ObjectKind {
        match self {
            KindData::Joker(_) => ObjectKind::Joker,
            KindData::Consumable(_) => ObjectKind::Consumable,
            KindData::Booster(_) => ObjectKind::Booster,
            KindData::Enhancement(_) => ObjectKind::Enhancement,
            KindData::Seal(_) => ObjectKind::Seal,
            KindData::Edition(_) => ObjectKind::Edition,
            KindData::Voucher(_) => ObjectKind::Voucher,
        }
    }

    /// Default payload for a kind.
    pub fn default_for(kind: ObjectKind) -> Self {
        match kind {
            ObjectKind::Joker => KindData::Joker(JokerData::default()),
            ObjectKind::Consumable => KindData::Consumable(ConsumableData::default()),
            ObjectKind::Booster => KindData::Booster(BoosterData::default()),
            ObjectKind::Enhancement => KindData::Enhancement(EnhancementData::default()),
            ObjectKind::Seal => KindData::Seal(SealData::default()),
            ObjectKind::Edition => KindData::Edition(EditionData::default()),
            ObjectKind::Voucher => KindData::Voucher(VoucherData::default()),
        }
    }
}

fn default_cost() -> u32 {
    4
}

fn default_true() -> bool {
    true
}

/// An authored game object. Common fields plus a tagged kind payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameObject {
    #[serde(default)]
    pub id: ObjectId,
    /// Unprefixed engine key; assigned by the identifier registry.
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Vec<String>,
    #[serde(default = "default_cost")]
    pub cost: u32,
    #[serde(default)]
    pub sprite: Option<SpritePos>,
    #[serde(default = "default_true")]
    pub unlocked: bool,
    #[serde(default = "default_true")]
    pub discovered: bool,
    #[serde(default)]
    pub rules: Vec<Rule>,
    #[serde(flatten)]
    pub data: KindData,
}

impl GameObject {
    /// An empty object of the given kind with all defaults.
    pub fn new(kind: ObjectKind, name: &str) -> Self {
        Self {
            id: ObjectId::default(),
            key: String::new(),
            name: name.to_string(),
            description: Vec::new(),
            cost: default_cost(),
            sprite: None,
            unlocked: true,
            discovered: true,
            rules: Vec::new(),
            data: KindData::default_for(kind),
        }
    }

    pub fn kind(&self) -> ObjectKind {
        self.data.kind()
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.id = ObjectId::new(id);
        self
    }

    pub fn with_rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }
}

// ===========================================================================
// Taxonomies
// ===========================================================================

/// A user-defined joker rarity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RarityData {
    pub id: String,
    pub key: String,
    pub name: String,
    pub badge_colour: String,
    pub default_weight: f64,
}

impl Default for RarityData {
    fn default() -> Self {
        Self {
            id: String::new(),
            key: String::new(),
            name: String::new(),
            badge_colour: "009DFF".to_string(),
            default_weight: 0.0,
        }
    }
}

/// A user-defined consumable set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ConsumableSetData {
    pub id: String,
    pub key: String,
    pub name: String,
    pub primary_colour: String,
    pub secondary_colour: String,
    pub shop_rate: f64,
    pub collection_rows: Vec<u32>,
}

impl Default for ConsumableSetData {
    fn default() -> Self {
        Self {
            id: String::new(),
            key: String::new(),
            name: String::new(),
            primary_colour: "666666".to_string(),
            secondary_colour: "333333".to_string(),
            shop_rate: 0.0,
            collection_rows: vec![4, 5],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_json_carries_kind_tag() {
        let obj = GameObject::new(ObjectKind::Joker, "Lucky Charm").with_id("j1");
        let json = serde_json::to_value(&obj).unwrap();
        assert_eq!(json["kind"], "joker");
        assert_eq!(json["name"], "Lucky Charm");
        assert_eq!(json["rarity"], 1);
    }

    #[test]
    fn object_defaults_fill_missing_fields() {
        let obj: GameObject =
            serde_json::from_str(r#"{"kind": "consumable", "name": "Oracle"}"#).unwrap();
        assert_eq!(obj.kind(), ObjectKind::Consumable);
        assert_eq!(obj.cost, 4);
        assert!(obj.unlocked);
        assert!(obj.rules.is_empty());
        match obj.data {
            KindData::Consumable(data) => assert_eq!(data.set, SetRef::Builtin(BuiltinSet::Tarot)),
            other => panic!("expected consumable payload, got {other:?}"),
        }
    }

    #[test]
    fn set_ref_distinguishes_builtin_names() {
        assert_eq!(
            SetRef::from("Planet".to_string()),
            SetRef::Builtin(BuiltinSet::Planet)
        );
        assert_eq!(
            SetRef::from("set-7".to_string()),
            SetRef::Custom("set-7".to_string())
        );
    }

    #[test]
    fn rarity_ref_accepts_number_or_id() {
        let builtin: RarityRef = serde_json::from_str("3").unwrap();
        assert_eq!(builtin, RarityRef::Builtin(3));
        let custom: RarityRef = serde_json::from_str(r#""rar-1""#).unwrap();
        assert_eq!(custom, RarityRef::Custom("rar-1".to_string()));
    }

    #[test]
    fn param_values_deserialize_by_shape() {
        let params: Params =
            serde_json::from_str(r#"{"amount": 4, "hand": "Flush", "once": true}"#).unwrap();
        assert_eq!(params["amount"], ParamValue::Number(4.0));
        assert_eq!(params["hand"], ParamValue::Text("Flush".to_string()));
        assert_eq!(params["once"], ParamValue::Bool(true));
    }

    #[test]
    fn booster_pool_is_tagged_by_type() {
        let data: BoosterData =
            serde_json::from_str(r#"{"pool": {"type": "consumable", "set": "Spectral"}}"#)
                .unwrap();
        assert_eq!(
            data.pool,
            BoosterPool::Consumable {
                set: SetRef::Builtin(BuiltinSet::Spectral)
            }
        );
        assert_eq!(data.extra, 3);
    }
}
