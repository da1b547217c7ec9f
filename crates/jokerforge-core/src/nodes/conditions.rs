//! Built-in condition kinds. Each template yields a Lua boolean expression.

use super::helpers::{BLIND_TYPE, COMPARE};
use super::{Args, EmitCtx, Fragment, NodeSpec, ParamDefault, ParamSpec, ParamType};
use crate::compiler::lua::{lua_number, lua_string};
use crate::diagnostic::Problem;
use crate::id::ObjectKind;
use crate::trigger::Trigger;

pub const POKER_HANDS: &[&str] = &[
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

pub const RANKS: &[&str] = &[
    "2", "3", "4", "5", "6", "7", "8", "9", "10", "Jack", "Queen", "King", "Ace",
];

pub const SUITS: &[&str] = &["Spades", "Hearts", "Clubs", "Diamonds"];

pub const COMPARISONS: &[&str] = &[
    "equals",
    "not_equals",
    "greater_than",
    "less_than",
    "greater_or_equal",
    "less_or_equal",
];

pub const BLINDS: &[&str] = &["small", "big", "boss"];

/// Triggers during which the played hand's name is known.
pub const HAND_TRIGGERS: &[Trigger] = &[
    Trigger::HandPlayed,
    Trigger::CardScored,
    Trigger::CardHeld,
    Trigger::CardRepetition,
];

const COUNT: ParamType = ParamType::Integer {
    min: Some(0),
    max: None,
};

/// Engine rank id: 2..=10 for pips, 11..=14 for Jack..Ace.
fn rank_id(rank: &str) -> i64 {
    RANKS
        .iter()
        .position(|&r| r == rank)
        .map_or(0, |i| i as i64 + 2)
}

fn operator() -> ParamSpec {
    ParamSpec::with_default(
        "operator",
        ParamType::Choice(COMPARISONS),
        ParamDefault::Text("greater_or_equal"),
    )
}

fn comparison(lhs: &str, args: &Args) -> Fragment {
    Fragment::new(format!(
        "H.compare({lhs}, {}, {})",
        lua_string(args.text("operator")),
        lua_number(args.number("value"))
    ))
    .helper(COMPARE)
}

fn numeric(name: &'static str, lhs: fn(&Args, &EmitCtx<'_>) -> Fragment, ty: ParamType) -> NodeSpec {
    NodeSpec::condition(name, lhs)
        .param(operator())
        .param(ParamSpec::required("value", ty))
}

fn check_odds(args: &Args, _: Trigger) -> Result<(), Problem> {
    if args.integer("numerator") > args.integer("denominator") {
        return Err(Problem::InvalidParam {
            node: "random_chance".to_string(),
            param: "numerator",
            reason: "must not exceed the denominator".to_string(),
        });
    }
    Ok(())
}

pub fn all() -> Vec<NodeSpec> {
    vec![
        NodeSpec::condition("hand_type", |args, _| {
            Fragment::new(format!(
                "context.scoring_name == {}",
                lua_string(args.text("hand"))
            ))
        })
        .param(ParamSpec::required("hand", ParamType::Choice(POKER_HANDS)))
        .only_under(HAND_TRIGGERS),
        NodeSpec::condition("card_rank", |args, ctx| {
            Fragment::new(format!(
                "{}:get_id() == {}",
                ctx.card(),
                rank_id(args.text("rank"))
            ))
        })
        .param(ParamSpec::required("rank", ParamType::Choice(RANKS)))
        .needs_card(),
        NodeSpec::condition("card_suit", |args, ctx| {
            Fragment::new(format!(
                "{}:is_suit({})",
                ctx.card(),
                lua_string(args.text("suit"))
            ))
        })
        .param(ParamSpec::required("suit", ParamType::Choice(SUITS)))
        .needs_card(),
        NodeSpec::condition("card_is_face", |_, ctx| {
            Fragment::new(format!("{}:is_face()", ctx.card()))
        })
        .needs_card(),
        NodeSpec::condition("card_enhancement", |args, ctx| {
            let key = args.object("enhancement").map(|k| k.qualified());
            Fragment::new(format!(
                "SMODS.has_enhancement({}, {})",
                ctx.card(),
                lua_string(key.as_deref().unwrap_or_default())
            ))
        })
        .param(ParamSpec::required(
            "enhancement",
            ParamType::Object(ObjectKind::Enhancement),
        ))
        .needs_card(),
        NodeSpec::condition("random_chance", |args, ctx| {
            Fragment::new(format!(
                "pseudorandom({}) < G.GAME.probabilities.normal * {} / {}",
                lua_string(&ctx.object.to_string()),
                args.integer("numerator"),
                args.integer("denominator")
            ))
        })
        .param(ParamSpec::with_default(
            "numerator",
            ParamType::Integer {
                min: Some(1),
                max: None,
            },
            ParamDefault::Number(1.0),
        ))
        .param(ParamSpec::required(
            "denominator",
            ParamType::Integer {
                min: Some(1),
                max: None,
            },
        ))
        .validated_by(check_odds),
        numeric(
            "player_money",
            |args, _| comparison("G.GAME.dollars", args),
            ParamType::Number {
                min: None,
                max: None,
            },
        ),
        numeric(
            "hands_remaining",
            |args, _| comparison("G.GAME.current_round.hands_left", args),
            COUNT,
        ),
        numeric(
            "discards_remaining",
            |args, _| comparison("G.GAME.current_round.discards_left", args),
            COUNT,
        ),
        numeric(
            "joker_count",
            |args, _| comparison("#G.jokers.cards", args),
            COUNT,
        ),
        numeric(
            "ante_level",
            |args, _| comparison("G.GAME.round_resets.ante", args),
            ParamType::Integer {
                min: None,
                max: None,
            },
        ),
        NodeSpec::condition("has_joker", |args, _| {
            let key = args.object("joker").map(|k| k.qualified());
            Fragment::new(format!(
                "next(SMODS.find_card({})) ~= nil",
                lua_string(key.as_deref().unwrap_or_default())
            ))
        })
        .param(ParamSpec::required(
            "joker",
            ParamType::Object(ObjectKind::Joker),
        )),
        NodeSpec::condition("blind_type", |args, _| {
            Fragment::new(format!("H.blind_type() == {}", lua_string(args.text("blind"))))
                .helper(BLIND_TYPE)
        })
        .param(ParamSpec::required("blind", ParamType::Choice(BLINDS))),
        NodeSpec::condition("first_hand", |_, _| {
            Fragment::new("G.GAME.current_round.hands_played == 0")
        }),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::EngineKey;
    use crate::identifiers::KeyTable;
    use crate::model::{GameObject, ModMetadata, ParamValue, Params};
    use crate::nodes::NodeRegistry;
    use crate::project::Project;
    use crate::xref::CrossRefs;

    fn emit(name: &str, kind: ObjectKind, trigger: Trigger, params: &[(&str, ParamValue)]) -> String {
        let mut p = Project::new(ModMetadata {
            prefix: "mc".to_string(),
            ..ModMetadata::default()
        });
        p.add_object(GameObject::new(ObjectKind::Enhancement, "Glass Plus").with_id("m1"));
        let registry = NodeRegistry::builtin();
        let refs = CrossRefs::build(&p, &KeyTable::derive(&p), &registry);
        let spec = registry.condition(name).unwrap();
        let params: Params = params
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();
        let args = spec.bind(&params, &refs).unwrap();
        let key = EngineKey::new(kind, "mc", "thing");
        (spec.template)(
            &args,
            &EmitCtx {
                object: &key,
                kind,
                trigger,
            },
        )
        .code
    }

    #[test]
    fn rank_maps_to_engine_id() {
        assert_eq!(rank_id("2"), 2);
        assert_eq!(rank_id("10"), 10);
        assert_eq!(rank_id("Ace"), 14);
        assert_eq!(
            emit("card_rank", ObjectKind::Joker, Trigger::CardScored, &[("rank", "King".into())]),
            "context.other_card:get_id() == 13"
        );
    }

    #[test]
    fn card_attached_objects_test_themselves() {
        assert_eq!(
            emit("card_suit", ObjectKind::Seal, Trigger::CardScored, &[("suit", "Hearts".into())]),
            "card:is_suit(\"Hearts\")"
        );
    }

    #[test]
    fn enhancement_reference_uses_qualified_key() {
        assert_eq!(
            emit(
                "card_enhancement",
                ObjectKind::Joker,
                Trigger::CardScored,
                &[("enhancement", "m1".into())]
            ),
            "SMODS.has_enhancement(context.other_card, \"m_mc_glass_plus\")"
        );
    }

    #[test]
    fn comparisons_default_to_at_least() {
        assert_eq!(
            emit("player_money", ObjectKind::Joker, Trigger::RoundEnd, &[("value", 10.0.into())]),
            "H.compare(G.GAME.dollars, \"greater_or_equal\", 10)"
        );
    }

    #[test]
    fn chance_is_seeded_by_object_key() {
        assert_eq!(
            emit(
                "random_chance",
                ObjectKind::Joker,
                Trigger::HandPlayed,
                &[("denominator", 4.0.into())]
            ),
            "pseudorandom(\"mc_thing\") < G.GAME.probabilities.normal * 1 / 4"
        );
    }

    #[test]
    fn impossible_odds_are_rejected() {
        let registry = NodeRegistry::builtin();
        let spec = registry.condition("random_chance").unwrap();
        let validator = spec.validator.unwrap();
        let mut params = Params::new();
        params.insert("numerator".into(), 5.0.into());
        params.insert("denominator".into(), 2.0.into());
        let args = spec.bind(&params, &CrossRefs::default()).unwrap();
        assert!(validator(&args, Trigger::HandPlayed).is_err());
    }

    #[test]
    fn hand_type_is_scoring_only() {
        let registry = NodeRegistry::builtin();
        let spec = registry.condition("hand_type").unwrap();
        assert!(spec.check_trigger(Trigger::HandPlayed).is_none());
        assert!(spec.check_trigger(Trigger::ShopEntered).is_some());
    }
}
