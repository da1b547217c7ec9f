//! Per-kind registration templates.
//!
//! Each object compiles to one `do ... end` block holding its trigger
//! callbacks followed by the engine registration call. Scoping every
//! object in its own block keeps the chunk below Lua's local limit.

use super::lua::{LuaWriter, lua_number, lua_string, lua_string_list};
use crate::diagnostic::Problem;
use crate::id::{EngineKey, ObjectKind};
use crate::model::{
    BoosterData, BoosterPool, BuiltinSet, ConsumableData, ConsumableSetData, EditionData,
    EnhancementData, GameObject, JokerData, KindData, RarityData, SealData, SetRef, VoucherData,
};
use crate::nodes::{EmitCtx, helpers};
use crate::trigger::Trigger;
use crate::validation::BoundRule;
use crate::xref::{CrossRefs, RarityValue};
use std::collections::BTreeSet;

/// Lua source for one object plus the helpers it calls.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectSource {
    pub code: String,
    pub helpers: BTreeSet<&'static str>,
}

/// `context` test selecting a trigger inside `calculate`.
pub fn context_guard(trigger: Trigger, kind: ObjectKind) -> Option<&'static str> {
    let card_attached = matches!(
        kind,
        ObjectKind::Enhancement | ObjectKind::Seal | ObjectKind::Edition
    );
    let guard = match (trigger, card_attached) {
        (Trigger::CardScored, true) => "context.main_scoring and context.cardarea == G.play",
        (Trigger::CardHeld, true) => "context.main_scoring and context.cardarea == G.hand",
        (Trigger::CardRepetition, true) => "context.repetition",
        (Trigger::HandPlayed, _) => "context.joker_main",
        (Trigger::CardScored, _) => "context.individual and context.cardarea == G.play",
        (Trigger::CardHeld, _) => {
            "context.individual and context.cardarea == G.hand and not context.end_of_round"
        }
        (Trigger::CardRepetition, _) => "context.repetition and context.cardarea == G.play",
        (Trigger::CardDiscarded, _) => "context.discard",
        (Trigger::BlindSelected, _) => "context.setting_blind",
        (Trigger::RoundEnd, _) => "context.end_of_round and context.main_eval",
        (Trigger::ShopEntered, _) => "context.starting_shop",
        (Trigger::BoosterOpened, _) => "context.open_booster",
        (Trigger::SoldSelf, _) => "context.selling_self",
        (Trigger::OnUse | Trigger::OnRedeem | Trigger::Unknown, _) => return None,
    };
    Some(guard)
}

pub fn callback_name(key: &EngineKey, trigger: Trigger) -> String {
    format!("{key}__{}", trigger.name())
}

fn hex(colour: &str) -> String {
    format!("HEX({})", lua_string(colour))
}

fn rarity_value(value: &RarityValue) -> String {
    match value {
        RarityValue::Builtin(n) => n.to_string(),
        RarityValue::Custom(key) => lua_string(key),
    }
}

/// Rules grouped by trigger in order of first appearance, each group
/// keeping rule order.
pub fn group_by_trigger<'a, 'r>(rules: &'a [BoundRule<'r>]) -> Vec<(Trigger, Vec<&'a BoundRule<'r>>)> {
    let mut groups: Vec<(Trigger, Vec<&BoundRule<'r>>)> = Vec::new();
    for rule in rules {
        match groups.iter_mut().find(|(t, _)| *t == rule.trigger) {
            Some((_, members)) => members.push(rule),
            None => groups.push((rule.trigger, vec![rule])),
        }
    }
    groups
}

fn write_callback(
    w: &mut LuaWriter,
    helpers: &mut BTreeSet<&'static str>,
    key: &EngineKey,
    kind: ObjectKind,
    trigger: Trigger,
    rules: &[&BoundRule<'_>],
) {
    let ctx = EmitCtx {
        object: key,
        kind,
        trigger,
    };

    let mut conditions = Vec::with_capacity(rules.len());
    let mut bodies = Vec::with_capacity(rules.len());
    let mut uses_return = false;
    for rule in rules {
        let guard: Vec<String> = rule
            .conditions
            .iter()
            .map(|node| {
                let fragment = (node.spec.template)(&node.args, &ctx);
                helpers.extend(fragment.helpers.iter().copied());
                if node.negate {
                    format!("not ({})", fragment.code)
                } else {
                    fragment.code
                }
            })
            .collect();
        let body: Vec<String> = rule
            .effects
            .iter()
            .map(|node| {
                let fragment = (node.spec.template)(&node.args, &ctx);
                helpers.extend(fragment.helpers.iter().copied());
                uses_return |= fragment.uses_return;
                fragment.code
            })
            .collect();
        conditions.push(guard);
        bodies.push(body);
    }

    w.open(&format!(
        "local function {}(self, card, context)",
        callback_name(key, trigger)
    ));
    if uses_return {
        w.line("local ret = {}");
    }
    for (guard, body) in conditions.iter().zip(&bodies) {
        if guard.is_empty() {
            w.open("do");
        } else {
            w.open(&format!("if {} then", guard.join(" and ")));
        }
        for statement in body {
            w.line(statement);
        }
        w.close("end");
    }
    if uses_return {
        w.line("if next(ret) then return ret end");
    }
    w.close("end");
}

fn write_common(w: &mut LuaWriter, object: &GameObject, key: &EngineKey) {
    w.field("key", &lua_string(&key.key));
    w.open("loc_txt = {");
    w.field("name", &lua_string(&object.name));
    if object.description.is_empty() {
        w.field("text", "{}");
    } else {
        w.open("text = {");
        for line in &object.description {
            w.line(&format!("{},", lua_string(line)));
        }
        w.close("},");
    }
    w.close("},");
    if let Some(pos) = object.sprite {
        w.field("atlas", &lua_string(object.kind().collection()));
        w.field("pos", &format!("{{ x = {}, y = {} }}", pos.x, pos.y));
    }
}

fn write_unlock(w: &mut LuaWriter, object: &GameObject) {
    w.field("unlocked", &object.unlocked.to_string());
    w.field("discovered", &object.discovered.to_string());
}

fn write_calculate(w: &mut LuaWriter, key: &EngineKey, kind: ObjectKind, triggers: &[Trigger]) {
    let guarded: Vec<(Trigger, &str)> = triggers
        .iter()
        .filter_map(|&t| context_guard(t, kind).map(|g| (t, g)))
        .collect();
    if guarded.is_empty() {
        return;
    }
    w.open("calculate = function(self, card, context)");
    for (trigger, guard) in guarded {
        w.open(&format!("if {guard} then"));
        w.line(&format!(
            "return {}(self, card, context)",
            callback_name(key, trigger)
        ));
        w.close("end");
    }
    w.close("end,");
}

fn write_joker(w: &mut LuaWriter, object: &GameObject, joker: &JokerData, refs: &CrossRefs) -> Result<(), Problem> {
    w.field("rarity", &rarity_value(&refs.resolve_rarity(&joker.rarity)?));
    w.field("cost", &object.cost.to_string());
    write_unlock(w, object);
    w.field("blueprint_compat", &joker.blueprint_compat.to_string());
    w.field("eternal_compat", &joker.eternal_compat.to_string());
    w.field("perishable_compat", &joker.perishable_compat.to_string());
    Ok(())
}

fn write_consumable(
    w: &mut LuaWriter,
    object: &GameObject,
    card: &ConsumableData,
    refs: &CrossRefs,
) -> Result<(), Problem> {
    w.field("set", &lua_string(&refs.resolve_set(&card.set)?));
    w.field("cost", &object.cost.to_string());
    write_unlock(w, object);
    if card.hidden {
        w.field("hidden", "true");
    }
    Ok(())
}

fn booster_group(pool: &BoosterPool, refs: &CrossRefs) -> Result<String, Problem> {
    Ok(match pool {
        BoosterPool::Joker { .. } => "Buffoon".to_string(),
        BoosterPool::Consumable { set: SetRef::Builtin(BuiltinSet::Tarot) } => "Arcana".to_string(),
        BoosterPool::Consumable { set: SetRef::Builtin(BuiltinSet::Planet) } => "Celestial".to_string(),
        BoosterPool::Consumable { set } => refs.resolve_set(set)?,
        BoosterPool::PlayingCard => "Standard".to_string(),
        BoosterPool::Specific { .. } => format!("{}_specific", refs.prefix()),
    })
}

fn write_booster(
    w: &mut LuaWriter,
    object: &GameObject,
    key: &EngineKey,
    booster: &BoosterData,
    refs: &CrossRefs,
) -> Result<(), Problem> {
    w.field("kind", &lua_string(&booster_group(&booster.pool, refs)?));
    w.field("cost", &object.cost.to_string());
    w.field("weight", &lua_number(booster.weight));
    w.field(
        "config",
        &format!("{{ extra = {}, choose = {} }}", booster.extra, booster.choose),
    );
    if booster.draw_hand {
        w.field("draw_hand", "true");
    }
    write_unlock(w, object);

    let seed = lua_string(&key.to_string());
    let common = format!("area = G.pack_cards, skip_materialize = true, key_append = {seed}");
    w.open("create_card = function(self, card, i)");
    match &booster.pool {
        BoosterPool::Joker { rarity } => {
            let rarity = match rarity {
                Some(r) => format!(", rarity = {}", lua_string(refs.resolve_rarity(r)?.pool_name())),
                None => String::new(),
            };
            w.line(&format!("return {{ set = \"Joker\"{rarity}, {common} }}"));
        }
        BoosterPool::Consumable { set } => {
            w.line(&format!(
                "return {{ set = {}, {common} }}",
                lua_string(&refs.resolve_set(set)?)
            ));
        }
        BoosterPool::PlayingCard => {
            w.line(&format!("return {{ set = \"Base\", {common} }}"));
        }
        BoosterPool::Specific { objects } => {
            let keys = objects
                .iter()
                .map(|id| {
                    refs.object(id)
                        .map(|target| target.key.qualified())
                        .ok_or_else(|| Problem::UnresolvedReference {
                            target: id.to_string(),
                            expected: "object",
                        })
                })
                .collect::<Result<Vec<_>, _>>()?;
            w.line(&format!("local keys = {}", lua_string_list(&keys)));
            w.line(&format!(
                "return {{ key = pseudorandom_element(keys, pseudoseed({seed})), {common} }}"
            ));
        }
    }
    w.close("end,");
    Ok(())
}

fn write_enhancement(w: &mut LuaWriter, enh: &EnhancementData) {
    w.field(
        "config",
        &format!(
            "{{ bonus = {}, mult = {}, x_mult = {} }}",
            lua_number(enh.bonus_chips),
            lua_number(enh.bonus_mult),
            lua_number(enh.x_mult)
        ),
    );
    for (name, flag) in [
        ("replace_base_card", enh.replace_base_card),
        ("no_rank", enh.no_rank),
        ("no_suit", enh.no_suit),
        ("always_scores", enh.always_scores),
    ] {
        if flag {
            w.field(name, "true");
        }
    }
    w.field("weight", &lua_number(enh.weight));
}

fn write_seal(w: &mut LuaWriter, seal: &SealData) {
    w.field("badge_colour", &hex(&seal.badge_colour));
}

fn write_edition(w: &mut LuaWriter, edition: &EditionData) {
    w.field(
        "config",
        &format!(
            "{{ chips = {}, mult = {}, x_mult = {} }}",
            lua_number(edition.chips),
            lua_number(edition.mult),
            lua_number(edition.x_mult)
        ),
    );
    match &edition.shader {
        Some(shader) => w.field("shader", &lua_string(shader)),
        None => w.field("shader", "false"),
    };
    w.field("extra_cost", &edition.extra_cost.to_string());
    w.field("weight", &lua_number(edition.weight));
    w.field("in_shop", &edition.in_shop.to_string());
}

fn write_voucher(
    w: &mut LuaWriter,
    object: &GameObject,
    voucher: &VoucherData,
    refs: &CrossRefs,
) -> Result<(), Problem> {
    w.field("cost", &object.cost.to_string());
    write_unlock(w, object);
    if !voucher.requires.is_empty() {
        let keys = voucher
            .requires
            .iter()
            .map(|id| {
                refs.resolve_object(id.as_str(), ObjectKind::Voucher)
                    .map(EngineKey::qualified)
            })
            .collect::<Result<Vec<_>, _>>()?;
        w.field("requires", &lua_string_list(&keys));
    }
    Ok(())
}

fn write_direct_hooks(w: &mut LuaWriter, key: &EngineKey, kind: ObjectKind, triggers: &[Trigger]) {
    match kind {
        ObjectKind::Consumable if triggers.contains(&Trigger::OnUse) => {
            w.open("use = function(self, card, area, copier)");
            w.line(&format!(
                "{}(self, card, {{ area = area, copier = copier }})",
                callback_name(key, Trigger::OnUse)
            ));
            w.close("end,");
            w.open("can_use = function(self, card)");
            w.line("return true");
            w.close("end,");
        }
        ObjectKind::Voucher if triggers.contains(&Trigger::OnRedeem) => {
            w.open("redeem = function(self, card)");
            w.line(&format!(
                "{}(self, card, {{}})",
                callback_name(key, Trigger::OnRedeem)
            ));
            w.close("end,");
        }
        _ => {}
    }
}

/// Lower one validated object.
pub fn render_object(
    object: &GameObject,
    key: &EngineKey,
    rules: &[BoundRule<'_>],
    refs: &CrossRefs,
) -> Result<ObjectSource, Problem> {
    let kind = object.kind();
    let mut helpers = BTreeSet::new();
    let mut w = LuaWriter::new();
    w.open("do");

    let groups = group_by_trigger(rules);
    for (trigger, members) in &groups {
        write_callback(&mut w, &mut helpers, key, kind, *trigger, members);
        w.blank();
    }
    let triggers: Vec<Trigger> = groups.iter().map(|(t, _)| *t).collect();

    w.open(&format!("{} {{", kind.smods_class()));
    write_common(&mut w, object, key);
    match &object.data {
        KindData::Joker(joker) => write_joker(&mut w, object, joker, refs)?,
        KindData::Consumable(card) => write_consumable(&mut w, object, card, refs)?,
        KindData::Booster(booster) => write_booster(&mut w, object, key, booster, refs)?,
        KindData::Enhancement(enh) => write_enhancement(&mut w, enh),
        KindData::Seal(seal) => write_seal(&mut w, seal),
        KindData::Edition(edition) => write_edition(&mut w, edition),
        KindData::Voucher(voucher) => write_voucher(&mut w, object, voucher, refs)?,
    }
    write_calculate(&mut w, key, kind, &triggers);
    write_direct_hooks(&mut w, key, kind, &triggers);
    w.close("}");
    w.close("end");

    Ok(ObjectSource {
        code: w.finish(),
        helpers,
    })
}

pub fn render_rarity(rarity: &RarityData, key: &str) -> String {
    let mut w = LuaWriter::new();
    w.open("SMODS.Rarity {");
    w.field("key", &lua_string(key));
    w.field("loc_txt", &format!("{{ name = {} }}", lua_string(&rarity.name)));
    w.field("badge_colour", &hex(&rarity.badge_colour));
    w.field("default_weight", &lua_number(rarity.default_weight));
    w.field("pools", "{ [\"Joker\"] = true }");
    w.close("}");
    w.finish()
}

pub fn render_consumable_set(set: &ConsumableSetData, key: &str) -> String {
    let mut w = LuaWriter::new();
    w.open("SMODS.ConsumableType {");
    w.field("key", &lua_string(key));
    w.field(
        "loc_txt",
        &format!(
            "{{ name = {}, collection = {} }}",
            lua_string(&set.name),
            lua_string(&set.name)
        ),
    );
    w.field("primary_colour", &hex(&set.primary_colour));
    w.field("secondary_colour", &hex(&set.secondary_colour));
    w.field("shop_rate", &lua_number(set.shop_rate));
    let rows: Vec<String> = set.collection_rows.iter().map(u32::to_string).collect();
    w.field("collection_rows", &format!("{{ {} }}", rows.join(", ")));
    w.close("}");
    w.finish()
}

/// First line of every generated file that calls helpers.
pub fn helper_binding() -> String {
    format!("local {} = SMODS.current_mod.jokerforge_helpers", helpers::TABLE)
}
