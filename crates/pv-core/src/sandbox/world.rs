use std::collections::BTreeMap;

use crate::item::ItemType;
use crate::talker::{Talker, TalkerId};
use crate::time::TimePoint;
use crate::vars::VarStore;
use crate::world::{
    FieldPlacement, GameWorld, MessageKind, MonsterPurchase, MonsterSpawn, QueuedEffect, Sound,
    Tripoint, Weather, WeatherField,
};

/// Something that happened to a [`Sandbox`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorldEvent {
    /// A log message.
    Message(MessageKind, String),
    /// A modal notice.
    Popup(String),
    /// A sound.
    Sound(Sound),
    /// A sound effect: id, variant, volume.
    SoundEffect(String, String, i32),
    /// Monsters spawned.
    Spawn(MonsterSpawn),
    /// Monsters bought.
    MonsterBought(MonsterPurchase),
    /// A field placed.
    Field(FieldPlacement),
    /// A terrain transform: id, radius, center.
    Transform(String, i32, Tripoint),
    /// A map update: id, target.
    Mapgen(String, Tripoint),
    /// A light override: level, until.
    Light(i32, TimePoint),
    /// Lightning struck.
    Lightning,
    /// The weather was rerolled.
    NextWeather,
    /// An effect-on-condition was handed to the scheduler.
    Queued(QueuedEffect),
    /// Faction reputation changed: faction, amount.
    FactionRep(String, i32),
    /// The companion mission menu was opened for a role.
    CompanionMission(String),
}

/// An in-memory world that records every event.
#[derive(Default)]
pub struct Sandbox {
    now: TimePoint,
    weather: Weather,
    globals: VarStore,
    item_types: BTreeMap<String, ItemType>,
    indoors: Vec<Tripoint>,
    npcs: BTreeMap<TalkerId, Box<dyn Talker>>,
    /// NPC roles by id.
    roles: BTreeMap<TalkerId, String>,
    /// Everything that happened, in order.
    pub events: Vec<WorldEvent>,
}

impl Sandbox {
    /// Create an empty world at the start of the game.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start the clock at a point in time.
    pub fn with_time(mut self, now: TimePoint) -> Self {
        self.now = now;
        self
    }

    /// Set the initial weather.
    pub fn with_weather(mut self, weather: Weather) -> Self {
        self.weather = weather;
        self
    }

    /// Register an item type.
    pub fn with_item_type(mut self, item_type: ItemType) -> Self {
        self.item_types.insert(item_type.id.clone(), item_type);
        self
    }

    /// Mark a position as indoors.
    pub fn with_indoor(mut self, pos: Tripoint) -> Self {
        self.indoors.push(pos);
        self
    }

    /// Set a global variable.
    pub fn with_global(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.globals.set(key, value);
        self
    }

    /// Place an NPC in the world, optionally with a role.
    pub fn add_npc(&mut self, npc: Box<dyn Talker>, role: Option<&str>) {
        let id = npc.id();
        if let Some(role) = role {
            self.roles.insert(id, role.to_string());
        }
        self.npcs.insert(id, npc);
    }

    /// An NPC that is currently in the world.
    pub fn npc(&self, id: TalkerId) -> Option<&dyn Talker> {
        self.npcs.get(&id).map(|b| b.as_ref())
    }

    /// Messages logged so far.
    pub fn messages(&self) -> impl Iterator<Item = &str> {
        self.events.iter().filter_map(|e| match e {
            WorldEvent::Message(_, text) => Some(text.as_str()),
            _ => None,
        })
    }

    /// Effects handed to the scheduler so far.
    pub fn queued(&self) -> impl Iterator<Item = &QueuedEffect> {
        self.events.iter().filter_map(|e| match e {
            WorldEvent::Queued(q) => Some(q),
            _ => None,
        })
    }
}

impl GameWorld for Sandbox {
    fn now(&self) -> TimePoint {
        self.now
    }

    fn set_now(&mut self, now: TimePoint) {
        self.now = now;
    }

    fn weather(&self) -> Weather {
        self.weather.clone()
    }

    fn set_weather_field(&mut self, field: WeatherField, value: i64) {
        self.weather.set_field(field, value);
    }

    fn next_weather(&mut self) {
        self.events.push(WorldEvent::NextWeather);
    }

    fn lightning(&mut self) {
        self.events.push(WorldEvent::Lightning);
    }

    fn is_outside(&self, pos: Tripoint) -> bool {
        !self.indoors.contains(&pos)
    }

    fn globals(&self) -> &VarStore {
        &self.globals
    }

    fn globals_mut(&mut self) -> &mut VarStore {
        &mut self.globals
    }

    fn item_type(&self, id: &str) -> Option<ItemType> {
        self.item_types.get(id).cloned()
    }

    fn add_message(&mut self, kind: MessageKind, text: &str) {
        self.events.push(WorldEvent::Message(kind, text.to_string()));
    }

    fn popup(&mut self, text: &str) {
        self.events.push(WorldEvent::Popup(text.to_string()));
    }

    fn sound(&mut self, sound: Sound) {
        self.events.push(WorldEvent::Sound(sound));
    }

    fn sound_effect(&mut self, id: &str, variant: &str, volume: i32) {
        self.events.push(WorldEvent::SoundEffect(
            id.to_string(),
            variant.to_string(),
            volume,
        ));
    }

    fn spawn_monsters(&mut self, spawn: MonsterSpawn) -> usize {
        let count = (spawn.real.max(0) + spawn.hallucinations.max(0)) as usize;
        self.events.push(WorldEvent::Spawn(spawn));
        count
    }

    fn buy_monster(&mut self, purchase: MonsterPurchase) {
        self.events.push(WorldEvent::MonsterBought(purchase));
    }

    fn set_field(&mut self, field: FieldPlacement) {
        self.events.push(WorldEvent::Field(field));
    }

    fn transform_radius(&mut self, transform: &str, radius: i32, center: Tripoint) {
        self.events
            .push(WorldEvent::Transform(transform.to_string(), radius, center));
    }

    fn mapgen_update(&mut self, update: &str, target: Tripoint) {
        self.events
            .push(WorldEvent::Mapgen(update.to_string(), target));
    }

    fn set_light_level(&mut self, level: i32, until: TimePoint) {
        self.events.push(WorldEvent::Light(level, until));
    }

    fn npcs_near(&self, center: Tripoint, range: i32) -> Vec<TalkerId> {
        self.npcs
            .values()
            .filter(|npc| npc.pos().distance(center) <= range)
            .map(|npc| npc.id())
            .collect()
    }

    fn detach_npc(&mut self, id: TalkerId) -> Option<Box<dyn Talker>> {
        self.npcs.remove(&id)
    }

    fn attach_npc(&mut self, npc: Box<dyn Talker>) {
        self.npcs.insert(npc.id(), npc);
    }

    fn role_nearby(&self, pos: Tripoint, role: &str) -> bool {
        self.roles.iter().any(|(id, r)| {
            r == role
                && self
                    .npcs
                    .get(id)
                    .is_some_and(|npc| npc.pos().distance(pos) <= 60)
        })
    }

    fn queue_effect(&mut self, queued: QueuedEffect) {
        self.events.push(WorldEvent::Queued(queued));
    }

    fn adjust_faction_rep(&mut self, faction: &str, amount: i32) {
        self.events
            .push(WorldEvent::FactionRep(faction.to_string(), amount));
    }

    fn companion_mission(&mut self, role: &str) {
        self.events
            .push(WorldEvent::CompanionMission(role.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sandbox::Character;

    #[test]
    fn records_messages_in_order() {
        let mut world = Sandbox::new();
        world.add_message(MessageKind::Good, "first");
        world.popup("stop");
        world.add_message(MessageKind::Bad, "second");
        assert_eq!(world.messages().collect::<Vec<_>>(), vec!["first", "second"]);
        assert_eq!(world.events.len(), 3);
    }

    #[test]
    fn detach_and_attach_npc() {
        let mut world = Sandbox::new();
        let npc = Character::npc("Rex", "TALK_REX");
        let id = npc.id;
        world.add_npc(Box::new(npc), Some("guard"));
        assert_eq!(world.npcs_near(Tripoint::new(5, 5, 0), 10), vec![id]);
        assert!(world.role_nearby(Tripoint::default(), "guard"));

        let detached = world.detach_npc(id).unwrap();
        assert!(world.npc(id).is_none());
        assert!(!world.role_nearby(Tripoint::default(), "guard"));
        world.attach_npc(detached);
        assert_eq!(world.npc(id).unwrap().disp_name(), "Rex");
    }

    #[test]
    fn indoor_positions_are_not_outside() {
        let world = Sandbox::new().with_indoor(Tripoint::new(1, 1, 0));
        assert!(!world.is_outside(Tripoint::new(1, 1, 0)));
        assert!(world.is_outside(Tripoint::new(2, 1, 0)));
        assert!(!world.is_valid_target(Tripoint::new(1, 1, 0), true));
        assert!(world.is_valid_target(Tripoint::new(1, 1, 0), false));
    }
}
