use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// A named numeric attribute of a speaker.
///
/// Each document name maps to exactly one variant. Some stats can only be
/// read; assigning them is rejected when a document is compiled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stat {
    /// Base strength.
    StrengthBase,
    /// Base dexterity.
    DexterityBase,
    /// Base intelligence.
    IntelligenceBase,
    /// Base perception.
    PerceptionBase,
    /// Debt the NPC owes the other speaker.
    Owed,
    /// Value the speaker has sold.
    Sold,
    /// X coordinate of the position.
    PosX,
    /// Y coordinate of the position.
    PosY,
    /// Z level of the position.
    PosZ,
    /// Pain level.
    Pain,
    /// Bionic power.
    Power,
    /// Bionic power as a percentage of the maximum.
    PowerPercentage,
    /// Maximum bionic power.
    PowerMax,
    /// Focus.
    Focus,
    /// Mana.
    Mana,
    /// Mana as a percentage of the maximum.
    ManaPercentage,
    /// Maximum mana.
    ManaMax,
    /// Hunger.
    Hunger,
    /// Thirst.
    Thirst,
    /// Stored calories.
    StoredKcal,
    /// Stored calories as a percentage of a healthy reserve.
    StoredKcalPercentage,
    /// Stimulant level.
    Stim,
    /// Painkiller level.
    Pkill,
    /// Radiation.
    Rad,
    /// Fatigue.
    Fatigue,
    /// Stamina.
    Stamina,
    /// Sleep deprivation.
    SleepDeprivation,
    /// NPC anger.
    Anger,
    /// Morale level.
    Morale,
    /// NPC friendliness.
    Friendly,
    /// Experience.
    Exp,
    /// Number of allies following the avatar.
    Allies,
    /// Cash on hand.
    Cash,
}

/// Every stat with its document name.
const CATALOG: &[(&str, Stat)] = &[
    ("strength_base", Stat::StrengthBase),
    ("dexterity_base", Stat::DexterityBase),
    ("intelligence_base", Stat::IntelligenceBase),
    ("perception_base", Stat::PerceptionBase),
    ("owed", Stat::Owed),
    ("sold", Stat::Sold),
    ("pos_x", Stat::PosX),
    ("pos_y", Stat::PosY),
    ("pos_z", Stat::PosZ),
    ("pain", Stat::Pain),
    ("power", Stat::Power),
    ("power_percentage", Stat::PowerPercentage),
    ("power_max", Stat::PowerMax),
    ("focus", Stat::Focus),
    ("mana", Stat::Mana),
    ("mana_percentage", Stat::ManaPercentage),
    ("mana_max", Stat::ManaMax),
    ("hunger", Stat::Hunger),
    ("thirst", Stat::Thirst),
    ("stored_kcal", Stat::StoredKcal),
    ("stored_kcal_percentage", Stat::StoredKcalPercentage),
    ("stim", Stat::Stim),
    ("pkill", Stat::Pkill),
    ("rad", Stat::Rad),
    ("fatigue", Stat::Fatigue),
    ("stamina", Stat::Stamina),
    ("sleep_deprivation", Stat::SleepDeprivation),
    ("anger", Stat::Anger),
    ("morale", Stat::Morale),
    ("friendly", Stat::Friendly),
    ("exp", Stat::Exp),
    ("allies", Stat::Allies),
    ("cash", Stat::Cash),
];

impl Stat {
    /// Look up a stat by document name.
    pub fn from_name(name: &str) -> CoreResult<Self> {
        CATALOG
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, s)| *s)
            .ok_or_else(|| CoreError::UnknownStat(name.to_string()))
    }

    /// Look up a stat that is about to be assigned.
    pub fn writable_from_name(name: &str) -> CoreResult<Self> {
        let stat = Self::from_name(name)?;
        if stat.is_writable() {
            Ok(stat)
        } else {
            Err(CoreError::ReadOnlyStat(name.to_string()))
        }
    }

    /// The document name.
    pub fn name(self) -> &'static str {
        CATALOG
            .iter()
            .find(|(_, s)| *s == self)
            .map(|(n, _)| *n)
            .unwrap_or("unknown")
    }

    /// Whether a document may assign this stat.
    pub fn is_writable(self) -> bool {
        !matches!(
            self,
            Self::PowerMax | Self::ManaMax | Self::Hunger | Self::Allies | Self::Cash
        )
    }

    /// All document names, for suggestions.
    pub fn names() -> impl Iterator<Item = &'static str> {
        CATALOG.iter().map(|(n, _)| *n)
    }
}

impl fmt::Display for Stat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_name_round_trips() {
        for name in Stat::names() {
            let stat = Stat::from_name(name).unwrap();
            assert_eq!(stat.name(), name);
        }
    }

    #[test]
    fn unknown_name_is_an_error() {
        assert_eq!(
            Stat::from_name("charisma"),
            Err(CoreError::UnknownStat("charisma".into()))
        );
    }

    #[test]
    fn read_only_stats_reject_assignment() {
        for name in ["cash", "allies", "power_max", "mana_max", "hunger"] {
            assert_eq!(
                Stat::writable_from_name(name),
                Err(CoreError::ReadOnlyStat(name.into()))
            );
        }
        assert_eq!(Stat::writable_from_name("pain"), Ok(Stat::Pain));
    }
}
