use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable, client-generated identifier of a game object. Never reused.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(pub String);

impl ObjectId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ObjectId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// The seven kinds of authored game objects, in canonical collection order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
    Joker,
    Consumable,
    Booster,
    Enhancement,
    Seal,
    Edition,
    Voucher,
}

impl ObjectKind {
    pub const ALL: [ObjectKind; 7] = [
        ObjectKind::Joker,
        ObjectKind::Consumable,
        ObjectKind::Booster,
        ObjectKind::Enhancement,
        ObjectKind::Seal,
        ObjectKind::Edition,
        ObjectKind::Voucher,
    ];

    /// Lowercase name used in messages and as the slug fallback.
    pub fn name(self) -> &'static str {
        match self {
            ObjectKind::Joker => "joker",
            ObjectKind::Consumable => "consumable",
            ObjectKind::Booster => "booster",
            ObjectKind::Enhancement => "enhancement",
            ObjectKind::Seal => "seal",
            ObjectKind::Edition => "edition",
            ObjectKind::Voucher => "voucher",
        }
    }

    /// Name of the project-file collection holding this kind.
    pub fn collection(self) -> &'static str {
        match self {
            ObjectKind::Joker => "jokers",
            ObjectKind::Consumable => "consumables",
            ObjectKind::Booster => "boosters",
            ObjectKind::Enhancement => "enhancements",
            ObjectKind::Seal => "seals",
            ObjectKind::Edition => "editions",
            ObjectKind::Voucher => "vouchers",
        }
    }

    /// Class prefix the engine adds in front of a registered key.
    pub fn class_prefix(self) -> Option<&'static str> {
        match self {
            ObjectKind::Joker => Some("j"),
            ObjectKind::Consumable => Some("c"),
            ObjectKind::Booster => Some("p"),
            ObjectKind::Enhancement => Some("m"),
            ObjectKind::Seal => None,
            ObjectKind::Edition => Some("e"),
            ObjectKind::Voucher => Some("v"),
        }
    }

    /// Registration call emitted for this kind.
    pub fn smods_class(self) -> &'static str {
        match self {
            ObjectKind::Joker => "SMODS.Joker",
            ObjectKind::Consumable => "SMODS.Consumable",
            ObjectKind::Booster => "SMODS.Booster",
            ObjectKind::Enhancement => "SMODS.Enhancement",
            ObjectKind::Seal => "SMODS.Seal",
            ObjectKind::Edition => "SMODS.Edition",
            ObjectKind::Voucher => "SMODS.Voucher",
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A prefix-namespaced engine key such as `mc_lucky_charm`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EngineKey {
    pub kind: ObjectKind,
    pub prefix: String,
    pub key: String,
}

impl EngineKey {
    pub fn new(kind: ObjectKind, prefix: &str, key: &str) -> Self {
        Self {
            kind,
            prefix: prefix.to_string(),
            key: key.to_string(),
        }
    }

    /// Fully qualified form used when referencing the object from Lua,
    /// e.g. `j_mc_lucky_charm`.
    pub fn qualified(&self) -> String {
        match self.kind.class_prefix() {
            Some(class) => format!("{class}_{}_{}", self.prefix, self.key),
            None => format!("{}_{}", self.prefix, self.key),
        }
    }
}

impl fmt::Display for EngineKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.prefix, self.key)
    }
}
