//! Core type definitions for the expedition engine.
//!
//! All types are serializable. Mission definitions are immutable once
//! loaded; snapshots are immutable once produced.

use std::borrow::Borrow;
use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{EngineError, Result};

// ---------------------------------------------------------------------------
// Identity Types
// ---------------------------------------------------------------------------

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            /// Borrow the identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id! {
    /// Identifier of a mission in the catalog.
    MissionId
}

string_id! {
    /// Identifier of a puzzle type (e.g. `"chrono"`).
    PuzzleType
}

string_id! {
    /// Identifier of an explorable zone.
    ZoneId
}

/// Unique identifier for one run of a mission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(pub Uuid);

impl RunId {
    /// Create a new random run ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Mission Definition
// ---------------------------------------------------------------------------

/// Experience and ship-resource rewards granted on completion.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RewardParameters {
    /// Experience granted with the artifact.
    #[serde(default)]
    pub experience: u32,
    /// Crew morale bonus.
    #[serde(default)]
    pub morale: f32,
    /// Ship power bonus.
    #[serde(default)]
    pub power: f32,
    /// Population bonus.
    #[serde(default)]
    pub population: f32,
    /// Colony progress bonus.
    #[serde(default)]
    pub colony_progress: f32,
}

impl RewardParameters {
    /// The ship-resource portion of the reward.
    #[must_use]
    pub fn resource_deltas(&self) -> ResourceDeltas {
        ResourceDeltas {
            morale: self.morale,
            power: self.power,
            population: self.population,
            colony_progress: self.colony_progress,
        }
    }
}

/// Deltas applied to the ship resource meters.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ResourceDeltas {
    /// Crew morale delta.
    pub morale: f32,
    /// Ship power delta.
    pub power: f32,
    /// Population delta.
    pub population: f32,
    /// Colony progress delta.
    pub colony_progress: f32,
}

/// Template the recovered artifact is built from.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ArtifactTemplate {
    /// Display name.
    pub name: String,
    /// Flavour text.
    #[serde(default)]
    pub description: String,
}

/// The artifact handed to the player when a mission completes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactReward {
    /// Display name.
    pub name: String,
    /// Flavour text.
    pub description: String,
    /// Experience granted.
    pub experience: u32,
}

/// Immutable description of a mission, loaded from configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissionDefinition {
    /// Catalog identifier.
    pub id: MissionId,
    /// Puzzle types that must all be solved to unlock the vault.
    #[serde(default)]
    pub puzzles: Vec<PuzzleType>,
    /// Zones that can be explored.
    #[serde(default)]
    pub zones: Vec<ZoneId>,
    /// Completion rewards.
    #[serde(default)]
    pub rewards: RewardParameters,
    /// Artifact recovered at the end of the mission.
    #[serde(default)]
    pub artifact: ArtifactTemplate,
}

impl MissionDefinition {
    /// Build a definition from plain identifiers with no rewards.
    #[must_use]
    pub fn new<P, Z>(id: &str, puzzles: P, zones: Z) -> Self
    where
        P: IntoIterator,
        P::Item: Into<PuzzleType>,
        Z: IntoIterator,
        Z::Item: Into<ZoneId>,
    {
        Self {
            id: MissionId::from(id),
            puzzles: puzzles.into_iter().map(Into::into).collect(),
            zones: zones.into_iter().map(Into::into).collect(),
            rewards: RewardParameters::default(),
            artifact: ArtifactTemplate::default(),
        }
    }

    /// Replace the reward parameters.
    #[must_use]
    pub fn with_rewards(mut self, rewards: RewardParameters) -> Self {
        self.rewards = rewards;
        self
    }

    /// Replace the artifact template.
    #[must_use]
    pub fn with_artifact(mut self, name: &str, description: &str) -> Self {
        self.artifact = ArtifactTemplate {
            name: name.to_string(),
            description: description.to_string(),
        };
        self
    }

    /// Number of puzzles required to unlock the vault.
    #[must_use]
    pub fn total_puzzles(&self) -> usize {
        self.puzzles.len()
    }

    /// Check that the id is non-empty and that puzzle types and zones are unique.
    ///
    /// # Errors
    /// Returns `EngineError::InvalidMission` describing the first problem found.
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: String| EngineError::InvalidMission {
            mission: self.id.to_string(),
            reason,
        };

        if self.id.as_str().trim().is_empty() {
            return Err(invalid("mission id is empty".to_string()));
        }

        let mut seen = BTreeSet::new();
        for puzzle in &self.puzzles {
            if !seen.insert(puzzle.as_str()) {
                return Err(invalid(format!("duplicate puzzle type '{puzzle}'")));
            }
        }

        let mut seen = BTreeSet::new();
        for zone in &self.zones {
            if !seen.insert(zone.as_str()) {
                return Err(invalid(format!("duplicate zone '{zone}'")));
            }
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Player Choices
// ---------------------------------------------------------------------------

/// Classification label attached to a player choice.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ChoiceType {
    /// Compassionate, people-first choice.
    Empathetic,
    /// Analytical, rule-driven choice.
    Logical,
    /// Inventive, unconventional choice.
    Creative,
    /// Any other label.
    Other(String),
}

impl ChoiceType {
    /// Parse a label; unknown labels become [`ChoiceType::Other`].
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        match label {
            "empathetic" => Self::Empathetic,
            "logical" => Self::Logical,
            "creative" => Self::Creative,
            other => Self::Other(other.to_string()),
        }
    }

    /// The label used for grouping.
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::Empathetic => "empathetic",
            Self::Logical => "logical",
            Self::Creative => "creative",
            Self::Other(label) => label,
        }
    }
}

impl From<String> for ChoiceType {
    fn from(value: String) -> Self {
        Self::from_label(&value)
    }
}

impl From<ChoiceType> for String {
    fn from(value: ChoiceType) -> Self {
        value.label().to_string()
    }
}

impl fmt::Display for ChoiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A choice the player made during a mission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerChoice {
    /// Classification label.
    pub choice_type: ChoiceType,
    /// Free-form context (what was being decided).
    pub context: String,
}

impl PlayerChoice {
    /// Create a new choice record.
    #[must_use]
    pub fn new(choice_type: ChoiceType, context: impl Into<String>) -> Self {
        Self {
            choice_type,
            context: context.into(),
        }
    }
}

/// Metadata reported alongside a puzzle completion signal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PuzzleOutcome {
    /// Attempts taken, including the successful one.
    pub attempts: u32,
    /// Hints requested while solving.
    pub hints_used: u32,
    /// Seconds spent solving.
    pub solve_seconds: f64,
}

impl Default for PuzzleOutcome {
    fn default() -> Self {
        Self {
            attempts: 1,
            hints_used: 0,
            solve_seconds: 0.0,
        }
    }
}

// ---------------------------------------------------------------------------
// Results Snapshot
// ---------------------------------------------------------------------------

/// How many personality interactions a mission feeds to the companion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CompanionEvolution {
    /// Interactions applied with `is_empathetic = true`.
    pub empathetic_interactions: u32,
    /// Interactions applied with `is_empathetic = false`.
    pub logical_interactions: u32,
}

impl CompanionEvolution {
    /// Derive the evolution from a choice sequence.
    #[must_use]
    pub fn from_choices(choices: &[PlayerChoice]) -> Self {
        choices
            .iter()
            .fold(Self::default(), |mut acc, choice| {
                match choice.choice_type {
                    ChoiceType::Empathetic => {
                        acc.empathetic_interactions = acc.empathetic_interactions.saturating_add(1);
                    }
                    ChoiceType::Logical => {
                        acc.logical_interactions = acc.logical_interactions.saturating_add(1);
                    }
                    ChoiceType::Creative | ChoiceType::Other(_) => {}
                }
                acc
            })
    }

    /// Total interactions to apply.
    #[must_use]
    pub fn total(&self) -> u32 {
        self.empathetic_interactions
            .saturating_add(self.logical_interactions)
    }
}

/// Performance counters captured at the end of a mission.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerformanceCounters {
    /// Hints requested.
    pub hints_used: u32,
    /// Mistakes made.
    pub mistakes_made: u32,
    /// Completed puzzles over completed puzzles plus mistakes, 0.0–1.0.
    pub accuracy_rate: f32,
    /// Explored zones over total zones, 0.0–1.0.
    pub exploration_efficiency: f32,
    /// 0.0–1.0.
    pub engagement_level: f32,
    /// 0.0–1.0.
    pub frustration_level: f32,
    /// 0.0–1.0.
    pub confidence_level: f32,
    /// Mean seconds per recorded decision.
    pub average_decision_time: f32,
    /// Accepted over offered companion suggestions, 0.0–1.0.
    pub collaboration_score: f32,
    /// Every zone explored before the vault unlocked, without mistakes.
    pub showed_systematic_approach: bool,
}

impl Default for PerformanceCounters {
    fn default() -> Self {
        Self {
            hints_used: 0,
            mistakes_made: 0,
            accuracy_rate: 1.0,
            exploration_efficiency: 1.0,
            engagement_level: 0.0,
            frustration_level: 0.0,
            confidence_level: 1.0,
            average_decision_time: 0.0,
            collaboration_score: 0.0,
            showed_systematic_approach: false,
        }
    }
}

/// Value object produced exactly once per completed mission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissionResultsSnapshot {
    /// Mission this run belonged to.
    pub mission_id: MissionId,
    /// The run that produced this snapshot.
    pub run_id: RunId,
    /// Whether the mission succeeded.
    pub success: bool,
    /// Whether the artifact was recovered.
    pub artifact_recovered: bool,
    /// Recovered artifact, if any.
    pub artifact: Option<ArtifactReward>,
    /// Seconds from exploration start to artifact recovery.
    pub completion_time: f64,
    /// Puzzles solved.
    pub puzzles_completed: u32,
    /// Puzzles required.
    pub total_puzzles: u32,
    /// Every choice made, in order.
    pub choices: Vec<PlayerChoice>,
    /// Performance counters.
    pub performance: PerformanceCounters,
    /// Ship-resource deltas to apply at the hub.
    pub resource_deltas: ResourceDeltas,
    /// Companion personality deltas to apply at the hub.
    pub companion_evolution: CompanionEvolution,
}

/// Clamp a value to `[0, 1]`, mapping NaN to 0.
#[must_use]
pub fn clamp01(value: f64) -> f64 {
    if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) }
}
