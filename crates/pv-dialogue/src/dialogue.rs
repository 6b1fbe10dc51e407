//! Live conversation state.

use std::cell::RefCell;
use std::sync::Arc;

use pv_core::{GameWorld, MissionId, Role, Talker};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::DialogueConfig;
use crate::error::{DialogueError, DialogueResult};
use crate::registry::TopicRegistry;
use crate::response::TalkResponse;
use crate::topic::TalkTopic;

/// A speaker handle, either borrowed from the caller or owned for the
/// length of a nested conversation.
pub(crate) enum Actor<'a> {
    Borrowed(&'a mut dyn Talker),
    Owned(Box<dyn Talker>),
}

impl Actor<'_> {
    fn get(&self) -> &dyn Talker {
        match self {
            Actor::Borrowed(talker) => &**talker,
            Actor::Owned(talker) => talker.as_ref(),
        }
    }

    fn get_mut(&mut self) -> &mut dyn Talker {
        match self {
            Actor::Borrowed(talker) => &mut **talker,
            Actor::Owned(talker) => talker.as_mut(),
        }
    }
}

/// Which speakers are bound. At least one always is.
enum Cast<'a> {
    Pair { alpha: Actor<'a>, beta: Actor<'a> },
    Solo { role: Role, actor: Actor<'a> },
}

/// The state of one conversation.
///
/// Holds both speaker handles, the topic stack, and the transient reason and
/// item channels that effects use to talk to each other.
pub struct Dialogue<'a> {
    cast: Cast<'a>,
    world: &'a mut dyn GameWorld,
    registry: Arc<TopicRegistry>,
    config: DialogueConfig,
    rng: RefCell<StdRng>,
    pub(crate) topic_stack: Vec<TalkTopic>,
    pub(crate) reason: String,
    pub(crate) cur_item: Option<String>,
    pub(crate) missions_assigned: Vec<MissionId>,
    pub(crate) by_radio: bool,
    pub(crate) responses: Vec<TalkResponse>,
}

impl<'a> Dialogue<'a> {
    /// Start a conversation between two speakers.
    pub fn new(
        alpha: &'a mut dyn Talker,
        beta: &'a mut dyn Talker,
        world: &'a mut dyn GameWorld,
        registry: Arc<TopicRegistry>,
    ) -> Self {
        let cast = Cast::Pair {
            alpha: Actor::Borrowed(alpha),
            beta: Actor::Borrowed(beta),
        };
        Self::from_cast(cast, world, registry, DialogueConfig::default())
    }

    /// Start a conversation where either speaker may be missing.
    pub fn with_speakers(
        alpha: Option<&'a mut dyn Talker>,
        beta: Option<&'a mut dyn Talker>,
        world: &'a mut dyn GameWorld,
        registry: Arc<TopicRegistry>,
    ) -> DialogueResult<Self> {
        let cast = match (alpha, beta) {
            (Some(alpha), Some(beta)) => Cast::Pair {
                alpha: Actor::Borrowed(alpha),
                beta: Actor::Borrowed(beta),
            },
            (Some(alpha), None) => Cast::Solo {
                role: Role::Alpha,
                actor: Actor::Borrowed(alpha),
            },
            (None, Some(beta)) => Cast::Solo {
                role: Role::Beta,
                actor: Actor::Borrowed(beta),
            },
            (None, None) => {
                tracing::warn!("constructed a dialogue with no actors");
                return Err(DialogueError::NoSpeakers);
            }
        };
        Ok(Self::from_cast(
            cast,
            world,
            registry,
            DialogueConfig::default(),
        ))
    }

    fn from_cast(
        cast: Cast<'a>,
        world: &'a mut dyn GameWorld,
        registry: Arc<TopicRegistry>,
        config: DialogueConfig,
    ) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            cast,
            world,
            registry,
            config,
            rng: RefCell::new(rng),
            topic_stack: Vec::new(),
            reason: String::new(),
            cur_item: None,
            missions_assigned: Vec::new(),
            by_radio: false,
            responses: Vec::new(),
        }
    }

    /// Replace the configuration, reseeding the RNG.
    pub fn with_config(mut self, config: DialogueConfig) -> Self {
        if let Some(seed) = config.seed {
            self.rng = RefCell::new(StdRng::seed_from_u64(seed));
        }
        self.config = config;
        self
    }

    /// Mark the conversation as held over the radio.
    pub fn with_radio(mut self, by_radio: bool) -> Self {
        self.by_radio = by_radio;
        self
    }

    fn resolve(&self, role: Role) -> &Actor<'a> {
        match &self.cast {
            Cast::Pair { alpha, beta } => match role {
                Role::Alpha => alpha,
                Role::Beta => beta,
            },
            Cast::Solo { role: bound, actor } => {
                if *bound != role {
                    tracing::warn!(requested = %role, bound = %bound, "role not bound, using the other speaker");
                }
                actor
            }
        }
    }

    /// The speaker in a role.
    ///
    /// If the role is not bound, the other speaker stands in.
    pub fn actor(&self, role: Role) -> &dyn Talker {
        self.resolve(role).get()
    }

    /// The speaker in a role, mutably.
    pub fn actor_mut(&mut self, role: Role) -> &mut dyn Talker {
        match &mut self.cast {
            Cast::Pair { alpha, beta } => match role {
                Role::Alpha => alpha.get_mut(),
                Role::Beta => beta.get_mut(),
            },
            Cast::Solo { role: bound, actor } => {
                if *bound != role {
                    tracing::warn!(requested = %role, bound = %bound, "role not bound, using the other speaker");
                }
                actor.get_mut()
            }
        }
    }

    /// Whether a role is bound.
    pub fn has_actor(&self, role: Role) -> bool {
        match &self.cast {
            Cast::Pair { .. } => true,
            Cast::Solo { role: bound, .. } => *bound == role,
        }
    }

    /// The surrounding game.
    pub fn world(&self) -> &dyn GameWorld {
        &*self.world
    }

    /// The surrounding game, mutably.
    pub fn world_mut(&mut self) -> &mut dyn GameWorld {
        &mut *self.world
    }

    /// The loaded topics.
    pub fn registry(&self) -> &TopicRegistry {
        &self.registry
    }

    pub(crate) fn shared_registry(&self) -> Arc<TopicRegistry> {
        Arc::clone(&self.registry)
    }

    /// Session settings.
    pub fn config(&self) -> &DialogueConfig {
        &self.config
    }

    /// A uniform draw from `lo..=hi`. An empty range yields `lo`.
    pub fn random_range(&self, lo: i64, hi: i64) -> i64 {
        if hi <= lo {
            return lo;
        }
        self.rng.borrow_mut().random_range(lo..=hi)
    }

    /// A uniform index into a collection of `len` elements.
    pub fn random_index(&self, len: usize) -> Option<usize> {
        if len == 0 {
            return None;
        }
        Some(self.rng.borrow_mut().random_range(0..len))
    }

    /// The topic stack, bottom first.
    pub fn topic_stack(&self) -> &[TalkTopic] {
        &self.topic_stack
    }

    /// Push a topic.
    pub fn add_topic(&mut self, topic: impl Into<TalkTopic>) {
        self.topic_stack.push(topic.into());
    }

    /// The current topic.
    pub fn current_topic(&self) -> Option<&TalkTopic> {
        self.topic_stack.last()
    }

    /// The message set by the last effect that explained itself.
    pub fn reason(&self) -> &str {
        &self.reason
    }

    /// Return the reason and clear it.
    pub fn take_reason(&mut self) -> String {
        std::mem::take(&mut self.reason)
    }

    /// The item the current topic is about.
    pub fn current_item(&self) -> Option<&str> {
        self.cur_item.as_deref()
    }

    /// Responses generated for the current topic.
    pub fn responses(&self) -> &[TalkResponse] {
        &self.responses
    }

    /// Missions the beta speaker has handed to the alpha speaker.
    pub fn missions_assigned(&self) -> &[MissionId] {
        &self.missions_assigned
    }

    /// Whether the conversation is held over the radio.
    pub fn is_by_radio(&self) -> bool {
        self.by_radio
    }

    /// Recompute the assigned missions from the beta speaker's records.
    pub fn recompute_missions(&mut self) {
        if !self.has_actor(Role::Beta) {
            self.missions_assigned.clear();
            return;
        }
        let alpha_id = self.actor(Role::Alpha).id();
        let beta = self.actor(Role::Beta);
        let assigned = beta
            .assigned_missions()
            .into_iter()
            .filter(|id| beta.mission(*id).is_some_and(|m| m.is_assigned_to(alpha_id)))
            .collect();
        self.missions_assigned = assigned;
    }

    fn inherit(&mut self) -> Inherited {
        Inherited {
            registry: Arc::clone(&self.registry),
            config: self.config.clone(),
            by_radio: self.by_radio,
            rng: StdRng::seed_from_u64(self.rng.get_mut().random()),
        }
    }

    /// A fresh conversation between the same speakers.
    pub(crate) fn nested(&mut self) -> Dialogue<'_> {
        let inherited = self.inherit();
        let cast = match &mut self.cast {
            Cast::Pair { alpha, beta } => Cast::Pair {
                alpha: Actor::Borrowed(alpha.get_mut()),
                beta: Actor::Borrowed(beta.get_mut()),
            },
            Cast::Solo { role, actor } => Cast::Solo {
                role: *role,
                actor: Actor::Borrowed(actor.get_mut()),
            },
        };
        Dialogue::child(cast, &mut *self.world, inherited)
    }

    /// A fresh conversation with only the alpha speaker bound.
    pub(crate) fn nested_alpha(&mut self) -> Dialogue<'_> {
        let inherited = self.inherit();
        let actor = match &mut self.cast {
            Cast::Pair { alpha, .. } => alpha.get_mut(),
            Cast::Solo { actor, .. } => actor.get_mut(),
        };
        let cast = Cast::Solo {
            role: Role::Alpha,
            actor: Actor::Borrowed(actor),
        };
        Dialogue::child(cast, &mut *self.world, inherited)
    }

    /// A fresh conversation held by a detached NPC in the alpha role.
    pub(crate) fn nested_owned(&mut self, npc: Box<dyn Talker>) -> Dialogue<'_> {
        let inherited = self.inherit();
        let cast = Cast::Solo {
            role: Role::Alpha,
            actor: Actor::Owned(npc),
        };
        Dialogue::child(cast, &mut *self.world, inherited)
    }

    /// Give back an owned speaker once a nested conversation is over.
    pub(crate) fn release(self) -> Option<Box<dyn Talker>> {
        match self.cast {
            Cast::Solo {
                actor: Actor::Owned(npc),
                ..
            } => Some(npc),
            _ => None,
        }
    }
}

/// What a nested conversation takes over from its parent.
struct Inherited {
    registry: Arc<TopicRegistry>,
    config: DialogueConfig,
    by_radio: bool,
    rng: StdRng,
}

impl<'b> Dialogue<'b> {
    fn child(cast: Cast<'b>, world: &'b mut dyn GameWorld, inherited: Inherited) -> Self {
        Self {
            cast,
            world,
            registry: inherited.registry,
            config: inherited.config,
            rng: RefCell::new(inherited.rng),
            topic_stack: Vec::new(),
            reason: String::new(),
            cur_item: None,
            missions_assigned: Vec::new(),
            by_radio: inherited.by_radio,
            responses: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::Fixture;
    use pv_core::sandbox::{Character, Sandbox};
    use pv_core::{Mission, MissionStatus};

    #[test]
    fn no_speakers_is_rejected() {
        let mut world = Sandbox::new();
        let result = Dialogue::with_speakers(None, None, &mut world, Arc::default());
        assert!(matches!(result, Err(DialogueError::NoSpeakers)));
    }

    #[test]
    fn unbound_role_falls_back_to_the_other() {
        let mut npc = Character::npc("Lone", "TALK_LONE");
        let mut world = Sandbox::new();
        let d = Dialogue::with_speakers(
            None,
            Some(&mut npc as &mut dyn Talker),
            &mut world,
            Arc::default(),
        )
        .unwrap();
        assert!(!d.has_actor(Role::Alpha));
        assert_eq!(d.actor(Role::Alpha).disp_name(), "Lone");
    }

    #[test]
    fn seeded_draws_repeat() {
        let mut a = Fixture::new();
        let mut b = Fixture::new();
        let da = a.dialogue();
        let db = b.dialogue();
        let xs: Vec<i64> = (0..8).map(|_| da.random_range(0, 99)).collect();
        let ys: Vec<i64> = (0..8).map(|_| db.random_range(0, 99)).collect();
        assert_eq!(xs, ys);
        assert_eq!(da.random_range(5, 5), 5);
        assert_eq!(da.random_index(0), None);
    }

    #[test]
    fn assigned_missions_are_filtered_by_assignee() {
        let mut fx = Fixture::new();
        let alpha_id = fx.alpha.id;
        let mut mine = Mission::new(MissionId(1), "Find the book", 100);
        mine.status = MissionStatus::InProgress;
        mine.assigned_to = Some(alpha_id);
        let mut theirs = Mission::new(MissionId(2), "Guard", 50);
        theirs.status = MissionStatus::InProgress;
        theirs.assigned_to = Some(pv_core::TalkerId::new());
        fx.beta.missions.push(mine);
        fx.beta.missions.push(theirs);

        let mut d = fx.dialogue();
        d.recompute_missions();
        assert_eq!(d.missions_assigned(), &[MissionId(1)]);
    }

    #[test]
    fn reason_is_taken_once() {
        let mut fx = Fixture::new();
        let mut d = fx.dialogue();
        d.reason = "busy".into();
        assert_eq!(d.take_reason(), "busy");
        assert!(d.reason().is_empty());
    }
}
