//! Built-in effect kinds. Each template yields Lua statements.
//!
//! Inside `calculate` callbacks, score changes and messages go into the
//! callback's `ret` table through `H.merge_return`. Outside scoring
//! (consumable use, voucher redeem) effects act on game state directly.

use super::conditions::{HAND_TRIGGERS, POKER_HANDS};
use super::helpers::{CREATE_CARD, DESTROY_CARD, MERGE_RETURN, MESSAGE};
use super::{Arg, Args, EmitCtx, Fragment, NodeSpec, ParamDefault, ParamSpec, ParamType};
use crate::compiler::lua::{lua_number, lua_string};
use crate::diagnostic::Problem;
use crate::id::ObjectKind;
use crate::trigger::Trigger;

pub const COLOURS: &[&str] = &["white", "red", "blue", "green", "gold", "purple", "attention"];

const SCORING: &[Trigger] = &[Trigger::HandPlayed, Trigger::CardScored, Trigger::CardHeld];
const CARD_EVENTS: &[Trigger] = &[
    Trigger::CardScored,
    Trigger::CardHeld,
    Trigger::CardDiscarded,
];

/// Every hand name plus `played`, meaning the hand being scored.
const HAND_TARGETS: &[&str] = &[
    "played",
    "High Card",
    "Pair",
    "Two Pair",
    "Three of a Kind",
    "Straight",
    "Flush",
    "Full House",
    "Four of a Kind",
    "Straight Flush",
    "Five of a Kind",
    "Flush House",
    "Flush Five",
];

const ANY_NUMBER: ParamType = ParamType::Number {
    min: None,
    max: None,
};

const ANY_INTEGER: ParamType = ParamType::Integer {
    min: None,
    max: None,
};

fn colour(name: &str) -> &'static str {
    match name {
        "red" => "G.C.RED",
        "blue" => "G.C.BLUE",
        "green" => "G.C.GREEN",
        "gold" => "G.C.GOLD",
        "purple" => "G.C.PURPLE",
        "attention" => "G.C.FILTER",
        _ => "G.C.WHITE",
    }
}

fn merge(field: &str, value: &str) -> Fragment {
    Fragment::new(format!("H.merge_return(ret, {{ {field} = {value} }})"))
        .helper(MERGE_RETURN)
        .returning()
}

fn check_hand_target(args: &Args, trigger: Trigger) -> Result<(), Problem> {
    if args.text("hand") == "played" && !HAND_TRIGGERS.contains(&trigger) {
        return Err(Problem::InvalidParam {
            node: "level_up_hand".to_string(),
            param: "hand",
            reason: format!("no hand is being played during '{trigger}'"),
        });
    }
    Ok(())
}

fn check_single_target(args: &Args, _: Trigger) -> Result<(), Problem> {
    if args.is_present("joker") && args.is_present("rarity") {
        return Err(Problem::InvalidParam {
            node: "create_joker".to_string(),
            param: "rarity",
            reason: "cannot be combined with a specific joker".to_string(),
        });
    }
    Ok(())
}

fn check_not_self_use(_: &Args, trigger: Trigger) -> Result<(), Problem> {
    if matches!(trigger, Trigger::OnUse | Trigger::OnRedeem) {
        return Err(Problem::NodeNotAllowed {
            node: "destroy_self".to_string(),
            trigger,
        });
    }
    Ok(())
}

fn slot_change(area: &str, args: &Args) -> Fragment {
    Fragment::new(format!(
        "G.{area}.config.card_limit = G.{area}.config.card_limit + {}",
        args.integer("amount")
    ))
}

pub fn all() -> Vec<NodeSpec> {
    vec![
        NodeSpec::effect("add_chips", |args, _| {
            merge("chips", &lua_number(args.number("amount")))
        })
        .param(ParamSpec::required("amount", ANY_NUMBER))
        .only_under(SCORING),
        NodeSpec::effect("add_mult", |args, _| {
            merge("mult", &lua_number(args.number("amount")))
        })
        .param(ParamSpec::required("amount", ANY_NUMBER))
        .only_under(SCORING),
        NodeSpec::effect("apply_x_mult", |args, _| {
            merge("xmult", &lua_number(args.number("factor")))
        })
        .param(ParamSpec::required(
            "factor",
            ParamType::Number {
                min: Some(0.0),
                max: None,
            },
        ))
        .only_under(SCORING),
        NodeSpec::effect("add_dollars", |args, ctx| {
            let amount = lua_number(args.number("amount"));
            if ctx.trigger.is_scoring() {
                merge("dollars", &amount)
            } else {
                Fragment::new(format!("ease_dollars({amount})"))
            }
        })
        .param(ParamSpec::required("amount", ANY_NUMBER)),
        NodeSpec::effect("level_up_hand", |args, _| {
            let hand = match args.text("hand") {
                "played" => "context.scoring_name".to_string(),
                named => lua_string(named),
            };
            Fragment::new(format!(
                "level_up_hand(card, {hand}, nil, {})",
                args.integer("levels")
            ))
        })
        .param(ParamSpec::with_default(
            "hand",
            ParamType::Choice(HAND_TARGETS),
            ParamDefault::Text("played"),
        ))
        .param(ParamSpec::with_default(
            "levels",
            ParamType::Integer {
                min: Some(1),
                max: None,
            },
            ParamDefault::Number(1.0),
        ))
        .validated_by(check_hand_target),
        NodeSpec::effect("create_joker", |args, _| {
            let target = match (args.object("joker"), args.get("rarity")) {
                (Some(key), _) => format!(", key = {}", lua_string(&key.qualified())),
                (None, Arg::Rarity(rarity)) => {
                    format!(", rarity = {}", lua_string(rarity.pool_name()))
                }
                _ => String::new(),
            };
            Fragment::new(format!("H.create_card({{ set = \"Joker\"{target} }})"))
                .helper(CREATE_CARD)
        })
        .param(ParamSpec::optional("joker", ParamType::Object(ObjectKind::Joker)))
        .param(ParamSpec::optional("rarity", ParamType::Rarity))
        .validated_by(check_single_target),
        NodeSpec::effect("create_consumable", |args, _| {
            let key = args
                .object("consumable")
                .map(|k| format!(", key = {}", lua_string(&k.qualified())))
                .unwrap_or_default();
            Fragment::new(format!(
                "H.create_card({{ set = {}{key} }})",
                lua_string(args.text("set"))
            ))
            .helper(CREATE_CARD)
        })
        .param(ParamSpec::with_default(
            "set",
            ParamType::ConsumableSet,
            ParamDefault::Text("Tarot"),
        ))
        .param(ParamSpec::optional(
            "consumable",
            ParamType::Object(ObjectKind::Consumable),
        )),
        NodeSpec::effect("destroy_self", |_, _| {
            Fragment::new("H.destroy_card(card)").helper(DESTROY_CARD)
        })
        .validated_by(check_not_self_use),
        NodeSpec::effect("destroy_triggering_card", |_, ctx| {
            Fragment::new(format!("H.destroy_card({})", ctx.card())).helper(DESTROY_CARD)
        })
        .needs_card()
        .only_under(CARD_EVENTS),
        NodeSpec::effect("retrigger", |args, _| {
            merge("repetitions", &args.integer("repetitions").to_string())
        })
        .param(ParamSpec::with_default(
            "repetitions",
            ParamType::Integer {
                min: Some(1),
                max: None,
            },
            ParamDefault::Number(1.0),
        ))
        .only_under(&[Trigger::CardRepetition]),
        NodeSpec::effect("edit_hand_size", |args, _| {
            Fragment::new(format!("G.hand:change_size({})", args.integer("amount")))
        })
        .param(ParamSpec::required("amount", ANY_INTEGER)),
        NodeSpec::effect("edit_hands", |args, _| {
            Fragment::new(format!("ease_hands_played({})", args.integer("amount")))
        })
        .param(ParamSpec::required("amount", ANY_INTEGER)),
        NodeSpec::effect("edit_discards", |args, _| {
            Fragment::new(format!("ease_discard({})", args.integer("amount")))
        })
        .param(ParamSpec::required("amount", ANY_INTEGER)),
        NodeSpec::effect("edit_joker_slots", |args, _| slot_change("jokers", args))
            .param(ParamSpec::required("amount", ANY_INTEGER)),
        NodeSpec::effect("edit_consumable_slots", |args, _| {
            slot_change("consumeables", args)
        })
        .param(ParamSpec::required("amount", ANY_INTEGER)),
        NodeSpec::effect("show_message", |args, ctx| {
            let text = lua_string(args.text("text"));
            let colour = colour(args.text("colour"));
            if ctx.returns_effects() {
                merge("message", &text).and(format!("ret.colour = {colour}"))
            } else {
                Fragment::new(format!("H.message(card, {text}, {colour})")).helper(MESSAGE)
            }
        })
        .param(ParamSpec::required("text", ParamType::Text))
        .param(ParamSpec::with_default(
            "colour",
            ParamType::Choice(COLOURS),
            ParamDefault::Text("white"),
        )),
        NodeSpec::effect("set_enhancement", |args, ctx| {
            let key = args.object("enhancement").map(|k| k.qualified());
            Fragment::new(format!(
                "{}:set_ability(G.P_CENTERS[{}], nil, true)",
                ctx.card(),
                lua_string(key.as_deref().unwrap_or_default())
            ))
        })
        .param(ParamSpec::required(
            "enhancement",
            ParamType::Object(ObjectKind::Enhancement),
        ))
        .needs_card(),
        NodeSpec::effect("add_seal", |args, ctx| {
            let key = args.object("seal").map(|k| k.qualified());
            Fragment::new(format!(
                "{}:set_seal({}, nil, true)",
                ctx.card(),
                lua_string(key.as_deref().unwrap_or_default())
            ))
        })
        .param(ParamSpec::required("seal", ParamType::Object(ObjectKind::Seal)))
        .needs_card(),
        NodeSpec::effect("set_edition", |args, ctx| {
            let key = args.object("edition").map(|k| k.qualified());
            Fragment::new(format!(
                "{}:set_edition({}, true)",
                ctx.card(),
                lua_string(key.as_deref().unwrap_or_default())
            ))
        })
        .param(ParamSpec::required(
            "edition",
            ParamType::Object(ObjectKind::Edition),
        ))
        .needs_card(),
    ]
}
