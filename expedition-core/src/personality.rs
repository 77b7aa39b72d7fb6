//! Companion personality model.
//!
//! Four traits evolve from classified player interactions. The only way to
//! change them is [`PersonalityModel::apply_interaction`], which clamps every
//! trait to its band after each update, so observers never see an
//! out-of-band value.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::PersonalityConfig;
use crate::observer::{ObserverList, Subscription};

/// Upper bound for `logical_core` and `empathy_level`.
pub const CORE_TRAIT_MAX: f32 = 2.0;
/// Upper bound for `curiosity_level` and `trust_level`.
pub const SOFT_TRAIT_MAX: f32 = 1.0;

const EMPATHY_STEP: f32 = 0.1;
const TRUST_STEP: f32 = 0.05;
const LOGIC_STEP: f32 = 0.05;
const CURIOSITY_STEP: f32 = 0.02;

/// Snapshot of the companion's trait vector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PersonalityState {
    /// Analytical disposition, 0.0–2.0.
    pub logical_core: f32,
    /// Emotional attunement, 0.0–2.0.
    pub empathy_level: f32,
    /// Drive to explore, 0.0–1.0.
    pub curiosity_level: f32,
    /// Trust in the player, 0.0–1.0.
    pub trust_level: f32,
    /// Interactions applied so far.
    pub total_interactions: u64,
}

impl PersonalityState {
    /// Whether empathy currently outweighs logic.
    #[must_use]
    pub fn is_empathy_dominant(&self) -> bool {
        self.empathy_level > self.logical_core
    }

    /// `empathy / (empathy + logic)`, or 0.5 when both are zero.
    #[must_use]
    pub fn personality_balance(&self) -> f32 {
        let total = self.empathy_level + self.logical_core;
        if total <= 0.0 {
            0.5
        } else {
            self.empathy_level / total
        }
    }

    fn clamp(&mut self) {
        self.empathy_level = self.empathy_level.clamp(0.0, CORE_TRAIT_MAX);
        self.logical_core = self.logical_core.clamp(0.0, CORE_TRAIT_MAX);
        self.curiosity_level = self.curiosity_level.clamp(0.0, SOFT_TRAIT_MAX);
        self.trust_level = self.trust_level.clamp(0.0, SOFT_TRAIT_MAX);
    }
}

impl Default for PersonalityState {
    fn default() -> Self {
        PersonalityConfig::default().initial_state()
    }
}

/// Owner of the companion's [`PersonalityState`].
#[derive(Debug, Default)]
pub struct PersonalityModel {
    state: PersonalityState,
    observers: ObserverList<PersonalityState>,
}

impl PersonalityModel {
    /// Create a model from an initial state. The state is clamped on entry.
    #[must_use]
    pub fn new(initial: PersonalityState) -> Self {
        let mut state = initial;
        state.clamp();
        Self {
            state,
            observers: ObserverList::new(),
        }
    }

    /// Current trait values.
    #[must_use]
    pub fn state(&self) -> PersonalityState {
        self.state
    }

    /// Apply one classified interaction and notify observers.
    pub fn apply_interaction(&mut self, is_empathetic: bool) -> PersonalityState {
        let s = &mut self.state;
        s.total_interactions += 1;
        if is_empathetic {
            s.empathy_level += EMPATHY_STEP;
            s.trust_level += TRUST_STEP;
        } else {
            s.logical_core += LOGIC_STEP;
        }
        s.curiosity_level += CURIOSITY_STEP;
        s.clamp();

        debug!(
            is_empathetic,
            empathy = s.empathy_level,
            logic = s.logical_core,
            interactions = s.total_interactions,
            "Companion personality evolved"
        );

        let snapshot = *s;
        self.observers.notify(&snapshot);
        snapshot
    }

    /// See [`PersonalityState::personality_balance`].
    #[must_use]
    pub fn personality_balance(&self) -> f32 {
        self.state.personality_balance()
    }

    /// Subscribe to trait changes.
    #[must_use = "dropping the subscription unsubscribes immediately"]
    pub fn on_change(&self, callback: impl Fn(&PersonalityState) + 'static) -> Subscription {
        self.observers.subscribe(callback)
    }
}
