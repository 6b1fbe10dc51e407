//! The world collaborator.
//!
//! Effects that reach beyond the two speakers (weather, sounds, spawning,
//! scheduling, global variables) go through [`GameWorld`].

use std::fmt;
use std::ops::Add;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::item::ItemType;
use crate::talker::{Talker, TalkerId};
use crate::time::{TimeDuration, TimePoint};
use crate::vars::VarStore;

/// A map position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tripoint {
    /// Horizontal coordinate.
    pub x: i32,
    /// Vertical coordinate.
    pub y: i32,
    /// Level, 0 is ground.
    pub z: i32,
}

impl Tripoint {
    /// Create a position.
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Chessboard distance on the same level; other levels are infinitely far.
    pub fn distance(self, other: Self) -> i32 {
        if self.z != other.z {
            return i32::MAX;
        }
        let dx = self.x.abs_diff(other.x).max(self.y.abs_diff(other.y));
        i32::try_from(dx).unwrap_or(i32::MAX)
    }
}

impl Add for Tripoint {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(
            self.x.saturating_add(rhs.x),
            self.y.saturating_add(rhs.y),
            self.z.saturating_add(rhs.z),
        )
    }
}

impl fmt::Display for Tripoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{},{})", self.x, self.y, self.z)
    }
}

impl FromStr for Tripoint {
    type Err = CoreError;

    /// Parse the `(x,y,z)` form produced by `Display`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || CoreError::InvalidPosition(s.to_string());
        let inner = s
            .trim()
            .strip_prefix('(')
            .and_then(|rest| rest.strip_suffix(')'))
            .ok_or_else(invalid)?;
        let mut parts = inner.split(',').map(|p| p.trim().parse::<i32>());
        match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(Ok(x)), Some(Ok(y)), Some(Ok(z)), None) => Ok(Self::new(x, y, z)),
            _ => Err(invalid()),
        }
    }
}

/// One numeric weather field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeatherField {
    /// Temperature.
    Temperature,
    /// Wind power.
    Windpower,
    /// Humidity.
    Humidity,
    /// Pressure.
    Pressure,
}

impl WeatherField {
    /// Look up a field by document name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "temperature" => Some(Self::Temperature),
            "windpower" => Some(Self::Windpower),
            "humidity" => Some(Self::Humidity),
            "pressure" => Some(Self::Pressure),
            _ => None,
        }
    }
}

/// Current weather.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Weather {
    /// Weather type id, e.g. `clear`.
    pub id: String,
    /// Temperature.
    pub temperature: i64,
    /// Wind power.
    pub windpower: i64,
    /// Humidity.
    pub humidity: i64,
    /// Pressure.
    pub pressure: i64,
}

impl Default for Weather {
    fn default() -> Self {
        Self {
            id: "clear".to_string(),
            temperature: 65,
            windpower: 0,
            humidity: 50,
            pressure: 1015,
        }
    }
}

impl Weather {
    /// Read one field.
    pub fn field(&self, field: WeatherField) -> i64 {
        match field {
            WeatherField::Temperature => self.temperature,
            WeatherField::Windpower => self.windpower,
            WeatherField::Humidity => self.humidity,
            WeatherField::Pressure => self.pressure,
        }
    }

    /// Write one field.
    pub fn set_field(&mut self, field: WeatherField, value: i64) {
        match field {
            WeatherField::Temperature => self.temperature = value,
            WeatherField::Windpower => self.windpower = value,
            WeatherField::Humidity => self.humidity = value,
            WeatherField::Pressure => self.pressure = value,
        }
    }
}

/// Tone of a log message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    /// Good news.
    Good,
    /// Plain.
    #[default]
    Neutral,
    /// Bad news.
    Bad,
    /// Mixed news.
    Mixed,
    /// A warning.
    Warning,
    /// Information.
    Info,
    /// Debug output.
    Debug,
    /// A headshot.
    Headshot,
    /// A critical hit.
    Critical,
    /// A grazing hit.
    Grazing,
}

impl MessageKind {
    /// Look up a kind by document name.
    pub fn from_name(name: &str) -> Option<Self> {
        let kind = match name {
            "good" => Self::Good,
            "neutral" => Self::Neutral,
            "bad" => Self::Bad,
            "mixed" => Self::Mixed,
            "warning" => Self::Warning,
            "info" => Self::Info,
            "debug" => Self::Debug,
            "headshot" => Self::Headshot,
            "critical" => Self::Critical,
            "grazing" => Self::Grazing,
            _ => return None,
        };
        Some(kind)
    }
}

/// What made a sound.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SoundKind {
    /// Ambient noise.
    #[default]
    Background,
    /// Weather.
    Weather,
    /// Music.
    Music,
    /// Footsteps and the like.
    Movement,
    /// Speech.
    Speech,
    /// Speech from a device.
    ElectronicSpeech,
    /// Work noise.
    Activity,
    /// Noisy destruction.
    DestructiveActivity,
    /// An alarm.
    Alarm,
    /// Fighting.
    Combat,
    /// A call for attention.
    Alert,
    /// A command.
    Order,
}

impl SoundKind {
    /// Look up a kind by document name.
    pub fn from_name(name: &str) -> Option<Self> {
        let kind = match name {
            "background" => Self::Background,
            "weather" => Self::Weather,
            "music" => Self::Music,
            "movement" => Self::Movement,
            "speech" => Self::Speech,
            "electronic_speech" => Self::ElectronicSpeech,
            "activity" => Self::Activity,
            "destructive_activity" => Self::DestructiveActivity,
            "alarm" => Self::Alarm,
            "combat" => Self::Combat,
            "alert" => Self::Alert,
            "order" => Self::Order,
            _ => return None,
        };
        Some(kind)
    }
}

/// A sound made somewhere on the map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sound {
    /// Where it happens.
    pub pos: Tripoint,
    /// How loud it is.
    pub volume: i32,
    /// What made it.
    pub kind: SoundKind,
    /// Text for those who hear it.
    pub description: String,
}

/// Monsters to spawn around a point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonsterSpawn {
    /// Monster group id.
    pub group: String,
    /// Where to spawn.
    pub pos: Tripoint,
    /// Number of hallucinations.
    pub hallucinations: i32,
    /// Number of real monsters.
    pub real: i32,
    /// How long they live; `None` for forever.
    pub lifespan: Option<TimeDuration>,
}

/// A monster bought from an NPC.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonsterPurchase {
    /// Monster type id.
    pub monster: String,
    /// How many.
    pub count: i32,
    /// Whether they arrive pacified.
    pub pacified: bool,
    /// Name to give them.
    pub name: Option<String>,
}

/// A field placed on the map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPlacement {
    /// Field type id.
    pub field: String,
    /// Center point.
    pub pos: Tripoint,
    /// Intensity.
    pub intensity: i32,
    /// Age of the field on placement.
    pub age: TimeDuration,
    /// Radius around the center.
    pub radius: i32,
    /// Whether the avatar is hit if inside.
    pub hit_player: bool,
}

/// An effect-on-condition submitted for later execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuedEffect {
    /// Effect-on-condition id.
    pub eoc: String,
    /// When to run it.
    pub at: TimePoint,
    /// The alpha role when it runs.
    pub alpha: Option<TalkerId>,
    /// The beta role when it runs.
    pub beta: Option<TalkerId>,
}

/// Game state outside the two speakers.
pub trait GameWorld {
    /// The current point in time.
    fn now(&self) -> TimePoint;

    /// Move the clock.
    fn set_now(&mut self, _now: TimePoint) {}

    /// Current weather.
    fn weather(&self) -> Weather {
        Weather::default()
    }

    /// Change one weather field.
    fn set_weather_field(&mut self, _field: WeatherField, _value: i64) {}

    /// Roll the next weather.
    fn next_weather(&mut self) {}

    /// Strike lightning.
    fn lightning(&mut self) {}

    /// Whether a position is outdoors.
    fn is_outside(&self, _pos: Tripoint) -> bool {
        true
    }

    /// Global variables.
    fn globals(&self) -> &VarStore;

    /// Global variables, mutably.
    fn globals_mut(&mut self) -> &mut VarStore;

    /// Static data about an item type.
    fn item_type(&self, _id: &str) -> Option<ItemType> {
        None
    }

    /// Add a line to the message log.
    fn add_message(&mut self, kind: MessageKind, text: &str);

    /// Show a modal notice.
    fn popup(&mut self, text: &str);

    /// Make a sound.
    fn sound(&mut self, _sound: Sound) {}

    /// Play a sound effect.
    fn sound_effect(&mut self, _id: &str, _variant: &str, _volume: i32) {}

    /// Spawn monsters; returns how many appeared.
    fn spawn_monsters(&mut self, _spawn: MonsterSpawn) -> usize {
        0
    }

    /// Deliver bought monsters.
    fn buy_monster(&mut self, _purchase: MonsterPurchase) {}

    /// Place a field.
    fn set_field(&mut self, _field: FieldPlacement) {}

    /// Apply a terrain transform around a point.
    fn transform_radius(&mut self, _transform: &str, _radius: i32, _center: Tripoint) {}

    /// Apply a map update.
    fn mapgen_update(&mut self, _update: &str, _target: Tripoint) {}

    /// Override ambient light until a point in time.
    fn set_light_level(&mut self, _level: i32, _until: TimePoint) {}

    /// Whether a point can receive a location variable or spawn.
    fn is_valid_target(&self, pos: Tripoint, outdoor_only: bool) -> bool {
        !outdoor_only || self.is_outside(pos)
    }

    /// NPCs within `range` of `center`, as a snapshot.
    fn npcs_near(&self, _center: Tripoint, _range: i32) -> Vec<TalkerId> {
        Vec::new()
    }

    /// Take an NPC out of the world so it can join a conversation.
    fn detach_npc(&mut self, _id: TalkerId) -> Option<Box<dyn Talker>> {
        None
    }

    /// Put a detached NPC back.
    fn attach_npc(&mut self, _npc: Box<dyn Talker>) {}

    /// Whether an NPC with a role is near a point.
    fn role_nearby(&self, _pos: Tripoint, _role: &str) -> bool {
        false
    }

    /// Submit an effect-on-condition to the external scheduler.
    fn queue_effect(&mut self, _queued: QueuedEffect) {}

    /// Change the avatar's reputation with a faction.
    fn adjust_faction_rep(&mut self, _faction: &str, _amount: i32) {}

    /// Open the companion mission menu for a role.
    fn companion_mission(&mut self, _role: &str) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_is_chessboard() {
        let a = Tripoint::new(0, 0, 0);
        assert_eq!(a.distance(Tripoint::new(3, -5, 0)), 5);
        assert_eq!(a.distance(Tripoint::new(1, 1, 1)), i32::MAX);
    }

    #[test]
    fn position_parses_its_display_form() {
        let p = Tripoint::new(-3, 14, 1);
        assert_eq!(p.to_string().parse::<Tripoint>(), Ok(p));
        assert!("(1,2)".parse::<Tripoint>().is_err());
        assert!("1,2,3".parse::<Tripoint>().is_err());
    }

    #[test]
    fn weather_fields() {
        let mut w = Weather::default();
        w.set_field(WeatherField::Humidity, 90);
        assert_eq!(w.field(WeatherField::Humidity), 90);
        assert_eq!(WeatherField::from_name("pressure"), Some(WeatherField::Pressure));
        assert_eq!(WeatherField::from_name("fog"), None);
    }

    #[test]
    fn message_and_sound_names() {
        assert_eq!(MessageKind::from_name("warning"), Some(MessageKind::Warning));
        assert_eq!(SoundKind::from_name("electronic_speech"), Some(SoundKind::ElectronicSpeech));
        assert_eq!(SoundKind::from_name("whisper"), None);
    }
}
