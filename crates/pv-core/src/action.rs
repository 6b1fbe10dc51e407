use std::fmt;

use serde::{Deserialize, Serialize};

/// How risky an effect is for the human side, in increasing order.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Consequence {
    /// Nothing notable.
    #[default]
    None,
    /// The NPC does something.
    Action,
    /// The human side is left defenseless.
    Helpless,
    /// The NPC turns hostile.
    Hostile,
}

macro_rules! named_actions {
    ($( $(#[$doc:meta])* $variant:ident => $name:literal ),* $(,)?) => {
        /// A zero-argument action named by a bare string in an effect block.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum NamedAction {
            $( $(#[$doc])* $variant, )*
        }

        const CATALOG: &[(&str, NamedAction)] = &[
            $( ($name, NamedAction::$variant), )*
        ];
    };
}

named_actions! {
    /// Give the selected mission to the human side.
    AssignMission => "assign_mission",
    /// Complete the selected mission successfully.
    MissionSuccess => "mission_success",
    /// Fail the selected mission.
    MissionFailure => "mission_failure",
    /// Forget the selected mission.
    ClearMission => "clear_mission",
    /// Hand out the selected mission's reward.
    MissionReward => "mission_reward",
    /// Open the trade screen.
    StartTrade => "start_trade",
    /// Sort loot into zones.
    SortLoot => "sort_loot",
    /// Look for a mount.
    FindMount => "find_mount",
    /// Get off the mount.
    Dismount => "dismount",
    /// Chop logs into planks.
    DoChopPlank => "do_chop_plank",
    /// Take apart a vehicle.
    DoVehicleDeconstruct => "do_vehicle_deconstruct",
    /// Repair a vehicle.
    DoVehicleRepair => "do_vehicle_repair",
    /// Chop trees.
    DoChopTrees => "do_chop_trees",
    /// Go fishing.
    DoFishing => "do_fishing",
    /// Work on construction.
    DoConstruction => "do_construction",
    /// Mine.
    DoMining => "do_mining",
    /// Mop floors.
    DoMopping => "do_mopping",
    /// Read.
    DoRead => "do_read",
    /// Butcher corpses.
    DoButcher => "do_butcher",
    /// Farm.
    DoFarming => "do_farming",
    /// Stand guard here.
    AssignGuard => "assign_guard",
    /// Join the camp.
    AssignCamp => "assign_camp",
    /// Abandon the camp.
    AbandonCamp => "abandon_camp",
    /// Stop guarding.
    StopGuard => "stop_guard",
    /// Found a camp.
    StartCamp => "start_camp",
    /// Buy a cow.
    BuyCow => "buy_cow",
    /// Buy a chicken.
    BuyChicken => "buy_chicken",
    /// Buy a horse.
    BuyHorse => "buy_horse",
    /// Recover a camp.
    RecoverCamp => "recover_camp",
    /// Remove the camp overseer.
    RemoveOverseer => "remove_overseer",
    /// Open the camp mission menu.
    BasecampMission => "basecamp_mission",
    /// Wake up.
    WakeUp => "wake_up",
    /// Reveal stats to the human side.
    RevealStats => "reveal_stats",
    /// End the conversation on the NPC side.
    EndConversation => "end_conversation",
    /// Start a fight over an insult.
    InsultCombat => "insult_combat",
    /// Hand over equipment.
    GiveEquipment => "give_equipment",
    /// Treat the human side's wounds.
    GiveAid => "give_aid",
    /// Treat everyone's wounds.
    GiveAllAid => "give_all_aid",
    /// Trim a beard.
    BarberBeard => "barber_beard",
    /// Cut hair.
    BarberHair => "barber_hair",
    /// Pay for a haircut.
    BuyHaircut => "buy_haircut",
    /// Pay for a shave.
    BuyShave => "buy_shave",
    /// Chat to lift morale.
    MoraleChat => "morale_chat",
    /// Chat to lift morale as a timed activity.
    MoraleChatActivity => "morale_chat_activity",
    /// Buy ten logs.
    Buy10Logs => "buy_10_logs",
    /// Buy a hundred logs.
    Buy100Logs => "buy_100_logs",
    /// Install a bionic.
    BionicInstall => "bionic_install",
    /// Remove a bionic.
    BionicRemove => "bionic_remove",
    /// Drop carried items where standing.
    DropItemsInPlace => "drop_items_in_place",
    /// Start following.
    Follow => "follow",
    /// Follow without joining.
    FollowOnly => "follow_only",
    /// Refuse to follow.
    DenyFollow => "deny_follow",
    /// Refuse to lead.
    DenyLead => "deny_lead",
    /// Refuse to share equipment.
    DenyEquipment => "deny_equipment",
    /// Refuse to train.
    DenyTrain => "deny_train",
    /// Refuse to share personal information.
    DenyPersonalInfo => "deny_personal_info",
    /// Turn hostile.
    Hostile => "hostile",
    /// Run away.
    Flee => "flee",
    /// Leave.
    Leave => "leave",
    /// Stop following.
    StopFollowing => "stop_following",
    /// Go back to the previous activity.
    RevertActivity => "revert_activity",
    /// Travel to a chosen location.
    GotoLocation => "goto_location",
    /// Become neutral towards a stranger.
    StrangerNeutral => "stranger_neutral",
    /// Start a mugging.
    StartMugging => "start_mugging",
    /// The human side walks away.
    PlayerLeaving => "player_leaving",
    /// Drop the wielded weapon.
    DropWeapon => "drop_weapon",
    /// Drop stolen items.
    DropStolenItem => "drop_stolen_item",
    /// Clear the stolen flag.
    RemoveStolenStatus => "remove_stolen_status",
    /// The human side puts the weapon away.
    PlayerWeaponAway => "player_weapon_away",
    /// The human side drops the weapon.
    PlayerWeaponDrop => "player_weapon_drop",
    /// Lead the human side to safety.
    LeadToSafety => "lead_to_safety",
    /// Start the chosen training.
    StartTraining => "start_training",
    /// Start training the NPC.
    StartTrainingNpc => "start_training_npc",
    /// Start a seminar.
    StartTrainingSeminar => "start_training_seminar",
    /// Copy rules from another follower.
    CopyNpcRules => "copy_npc_rules",
    /// Set the pickup whitelist.
    SetNpcPickup => "set_npc_pickup",
    /// Die.
    NpcDie => "npc_die",
    /// Express thanks.
    NpcThankful => "npc_thankful",
    /// Clear rule overrides.
    ClearOverrides => "clear_overrides",
    /// Disassemble items.
    DoDisassembly => "do_disassembly",
    /// Do nothing.
    Nothing => "nothing",
    /// Open a conversation with the NPC side as a new partner.
    OpenDialogue => "open_dialogue",
    /// The avatar takes control of the NPC.
    TakeControl => "take_control",
    /// Open the menu for choosing an NPC to control.
    TakeControlMenu => "take_control_menu",
}

impl NamedAction {
    /// Look up an action by its document name.
    pub fn from_name(name: &str) -> Option<Self> {
        CATALOG.iter().find(|(n, _)| *n == name).map(|(_, a)| *a)
    }

    /// The document name.
    pub fn name(self) -> &'static str {
        CATALOG
            .iter()
            .find(|(_, a)| *a == self)
            .map(|(n, _)| *n)
            .unwrap_or("nothing")
    }

    /// All document names, for suggestions.
    pub fn names() -> impl Iterator<Item = &'static str> {
        CATALOG.iter().map(|(n, _)| *n)
    }

    /// The guaranteed consequence of performing this action.
    pub fn consequence(self) -> Consequence {
        match self {
            Self::Hostile => Consequence::Hostile,
            Self::PlayerWeaponDrop | Self::PlayerWeaponAway | Self::StartMugging => {
                Consequence::Helpless
            }
            _ => Consequence::None,
        }
    }
}

impl fmt::Display for NamedAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip() {
        for name in NamedAction::names() {
            assert_eq!(NamedAction::from_name(name).unwrap().name(), name);
        }
    }

    #[test]
    fn unknown_name() {
        assert_eq!(NamedAction::from_name("dance"), None);
    }

    #[test]
    fn consequences() {
        assert_eq!(NamedAction::Hostile.consequence(), Consequence::Hostile);
        assert_eq!(
            NamedAction::StartMugging.consequence(),
            Consequence::Helpless
        );
        assert_eq!(NamedAction::Follow.consequence(), Consequence::None);
    }

    #[test]
    fn consequence_order() {
        assert!(Consequence::None < Consequence::Action);
        assert!(Consequence::Action < Consequence::Helpless);
        assert!(Consequence::Helpless < Consequence::Hostile);
    }
}
