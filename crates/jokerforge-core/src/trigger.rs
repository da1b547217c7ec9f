use crate::id::ObjectKind;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A hook point in the engine's event model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trigger {
    /// Main scoring step of a played hand.
    HandPlayed,
    /// Each scoring card in the played hand.
    CardScored,
    /// Each card held in hand during scoring.
    CardHeld,
    /// Repetition step for each scoring card.
    CardRepetition,
    /// Each card being discarded.
    CardDiscarded,
    BlindSelected,
    RoundEnd,
    ShopEntered,
    BoosterOpened,
    /// The object itself is sold.
    SoldSelf,
    /// A consumable is used.
    OnUse,
    /// A voucher is redeemed.
    OnRedeem,
    /// Anything a project file names that this build does not know.
    #[default]
    #[serde(other)]
    Unknown,
}

impl Trigger {
    pub const ALL: [Trigger; 12] = [
        Trigger::HandPlayed,
        Trigger::CardScored,
        Trigger::CardHeld,
        Trigger::CardRepetition,
        Trigger::CardDiscarded,
        Trigger::BlindSelected,
        Trigger::RoundEnd,
        Trigger::ShopEntered,
        Trigger::BoosterOpened,
        Trigger::SoldSelf,
        Trigger::OnUse,
        Trigger::OnRedeem,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Trigger::HandPlayed => "hand_played",
            Trigger::CardScored => "card_scored",
            Trigger::CardHeld => "card_held",
            Trigger::CardRepetition => "card_repetition",
            Trigger::CardDiscarded => "card_discarded",
            Trigger::BlindSelected => "blind_selected",
            Trigger::RoundEnd => "round_end",
            Trigger::ShopEntered => "shop_entered",
            Trigger::BoosterOpened => "booster_opened",
            Trigger::SoldSelf => "sold_self",
            Trigger::OnUse => "on_use",
            Trigger::OnRedeem => "on_redeem",
            Trigger::Unknown => "unknown",
        }
    }

    /// Whether the trigger fires for a specific originating card.
    pub fn has_card(self) -> bool {
        matches!(
            self,
            Trigger::CardScored
                | Trigger::CardHeld
                | Trigger::CardRepetition
                | Trigger::CardDiscarded
        )
    }

    /// Whether the trigger runs inside hand scoring, where returned
    /// chips/mult are applied.
    pub fn is_scoring(self) -> bool {
        matches!(
            self,
            Trigger::HandPlayed | Trigger::CardScored | Trigger::CardHeld
        )
    }

    /// Whether an object of `kind` can carry rules under this trigger.
    pub fn allowed_for(self, kind: ObjectKind) -> bool {
        match kind {
            ObjectKind::Joker => !matches!(
                self,
                Trigger::OnUse | Trigger::OnRedeem | Trigger::Unknown
            ),
            ObjectKind::Consumable => self == Trigger::OnUse,
            ObjectKind::Voucher => self == Trigger::OnRedeem,
            ObjectKind::Enhancement | ObjectKind::Seal | ObjectKind::Edition => matches!(
                self,
                Trigger::CardScored | Trigger::CardHeld | Trigger::CardRepetition
            ),
            ObjectKind::Booster => false,
        }
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_trigger_names_deserialize_to_unknown() {
        let t: Trigger = serde_json::from_str(r#""on_full_moon""#).unwrap();
        assert_eq!(t, Trigger::Unknown);
        let t: Trigger = serde_json::from_str(r#""card_scored""#).unwrap();
        assert_eq!(t, Trigger::CardScored);
    }

    #[test]
    fn names_match_serde_representation() {
        for trigger in Trigger::ALL {
            let json = serde_json::to_string(&trigger).unwrap();
            assert_eq!(json, format!("\"{}\"", trigger.name()));
        }
    }

    #[test]
    fn consumables_only_fire_on_use() {
        for trigger in Trigger::ALL {
            assert_eq!(
                trigger.allowed_for(ObjectKind::Consumable),
                trigger == Trigger::OnUse
            );
        }
    }

    #[test]
    fn boosters_accept_no_triggers() {
        assert!(Trigger::ALL.iter().all(|t| !t.allowed_for(ObjectKind::Booster)));
    }
}
