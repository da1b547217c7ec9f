//! Shared test fixtures for integration tests and benchmarks.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]` so these helpers
//! are available in unit tests, integration tests, and benchmarks (via the
//! `test-utils` feature).

use crate::id::ObjectKind;
use crate::model::*;
use crate::project::Project;
use crate::trigger::Trigger;

// ===========================================================================
// Metadata
// ===========================================================================

/// Valid metadata with prefix `mc`.
pub fn metadata() -> ModMetadata {
    ModMetadata {
        id: "MyCollection".to_string(),
        name: "My Collection".to_string(),
        display_name: "My Collection".to_string(),
        author: vec!["Tester".to_string()],
        description: "Test mod".to_string(),
        prefix: "mc".to_string(),
        ..ModMetadata::default()
    }
}

pub fn empty_project() -> Project {
    Project::new(metadata())
}

// ===========================================================================
// Objects
// ===========================================================================

/// +4 mult on a flush.
pub fn lucky_charm(id: &str) -> GameObject {
    GameObject::new(ObjectKind::Joker, "Lucky Charm")
        .with_id(id)
        .with_rule(
            Rule::new(Trigger::HandPlayed)
                .when(Condition::new("hand_type").with("hand", "Flush"))
                .then(Effect::new("add_mult").with("amount", 4.0)),
        )
}

pub fn joker(id: &str, name: &str) -> GameObject {
    GameObject::new(ObjectKind::Joker, name).with_id(id)
}

/// A joker whose only effect kind is unknown.
pub fn broken_joker(id: &str) -> GameObject {
    GameObject::new(ObjectKind::Joker, "Dragon Tamer")
        .with_id(id)
        .with_rule(Rule::new(Trigger::HandPlayed).then(Effect::new("summon_dragon")))
}

pub fn tarot(id: &str, name: &str) -> GameObject {
    GameObject::new(ObjectKind::Consumable, name)
        .with_id(id)
        .with_rule(Rule::new(Trigger::OnUse).then(Effect::new("add_dollars").with("amount", 3.0)))
}

pub fn seal(id: &str, name: &str) -> GameObject {
    GameObject::new(ObjectKind::Seal, name)
        .with_id(id)
        .with_rule(
            Rule::new(Trigger::CardScored).then(Effect::new("add_chips").with("amount", 20.0)),
        )
}

pub fn voucher(id: &str, name: &str) -> GameObject {
    GameObject::new(ObjectKind::Voucher, name)
        .with_id(id)
        .with_rule(
            Rule::new(Trigger::OnRedeem).then(Effect::new("edit_hand_size").with("amount", 1.0)),
        )
}

// ===========================================================================
// Projects
// ===========================================================================

/// One object of every kind plus a custom rarity and set, all valid.
pub fn full_project() -> Project {
    let mut p = empty_project();
    p.rarities.push(RarityData {
        id: "r1".to_string(),
        name: "Mythic".to_string(),
        default_weight: 0.5,
        ..RarityData::default()
    });
    p.consumable_sets.push(ConsumableSetData {
        id: "set1".to_string(),
        name: "Runes".to_string(),
        shop_rate: 1.0,
        ..ConsumableSetData::default()
    });

    p.add_object(lucky_charm("j1"));
    let mut mythic = joker("j2", "Summoner");
    mythic.data = KindData::Joker(JokerData {
        rarity: RarityRef::Custom("r1".to_string()),
        ..JokerData::default()
    });
    mythic.rules.push(
        Rule::new(Trigger::BlindSelected)
            .when(Condition::new("random_chance").with("denominator", 4.0))
            .then(Effect::new("create_joker").with("joker", "j1")),
    );
    p.add_object(mythic);

    let mut rune = tarot("c1", "Rune of Wealth");
    rune.data = KindData::Consumable(ConsumableData {
        set: SetRef::Custom("set1".to_string()),
        hidden: false,
    });
    p.add_object(rune);

    let mut pack = GameObject::new(ObjectKind::Booster, "Rune Pack").with_id("p1");
    pack.data = KindData::Booster(BoosterData {
        pool: BoosterPool::Consumable {
            set: SetRef::Custom("set1".to_string()),
        },
        ..BoosterData::default()
    });
    p.add_object(pack);

    p.add_object(
        GameObject::new(ObjectKind::Enhancement, "Gilded")
            .with_id("m1")
            .with_rule(
                Rule::new(Trigger::CardHeld).then(Effect::new("add_dollars").with("amount", 1.0)),
            ),
    );
    p.add_object(seal("s1", "Wax Seal"));
    p.add_object(GameObject::new(ObjectKind::Edition, "Shimmer").with_id("e1"));
    p.add_object(voucher("v1", "Big Hands"));
    p
}

/// `count` jokers with a mix of rules, for benchmarks and properties.
pub fn large_project(count: usize) -> Project {
    let mut p = empty_project();
    for i in 0..count {
        let name = format!("Joker {}", i % 50);
        let mut object = joker(&format!("j{i}"), &name);
        object.rules.push(
            Rule::new(Trigger::HandPlayed)
                .when(Condition::new("player_money").with("value", (i % 20) as f64))
                .then(Effect::new("add_mult").with("amount", (i % 7) as f64 + 1.0)),
        );
        object.rules.push(
            Rule::new(Trigger::CardScored)
                .when(Condition::new("card_suit").with("suit", "Hearts"))
                .then(Effect::new("add_chips").with("amount", 10.0)),
        );
        if i > 0 {
            object.rules.push(
                Rule::new(Trigger::RoundEnd)
                    .then(Effect::new("create_joker").with("joker", format!("j{}", i - 1).as_str())),
            );
        }
        p.add_object(object);
    }
    p
}
