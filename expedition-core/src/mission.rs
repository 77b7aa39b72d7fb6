//! Mission lifecycle state machine.
//!
//! One [`MissionStateMachine`] owns the authoritative state of one mission
//! run:
//!
//! ```text
//! NotStarted → Briefing → Exploring → VaultUnlocked → ArtifactRecovered → Completed
//! ```
//!
//! Zone and puzzle signals arrive in any order while exploring. Every
//! signal is idempotent: the first one takes effect, repeats report
//! [`Outcome::Duplicate`]. Signals that arrive in the wrong state, or name a
//! puzzle or zone the mission does not define, are rejected without
//! touching state.
//!
//! The completed-puzzle counter has a single mutation path
//! ([`MissionStateMachine::complete_puzzle`]) and always equals the number
//! of `true` entries in the puzzle map. Counters fed by the presentation
//! layer (hints, mistakes, decisions, suggestions, the clock) saturate
//! instead of overflowing.
//!
//! The machine does not touch [`EngineCounters`](crate::metrics::EngineCounters).
//! Callers that want per-event counts record the returned [`Outcome`]; the
//! host's event pump does this for every event it applies.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::collaborators::Collaborators;
use crate::config::PacingConfig;
use crate::dialogue::ToneVariant;
use crate::error::{Outcome, Rejection};
use crate::sequence::{Cue, Sequence};
use crate::types::{
    clamp01, ArtifactReward, CompanionEvolution, MissionDefinition, MissionId,
    MissionResultsSnapshot, PerformanceCounters, PlayerChoice, PuzzleOutcome, PuzzleType, RunId,
    ZoneId,
};

/// Lifecycle state of a mission run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MissionState {
    /// Created, nothing shown yet.
    NotStarted,
    /// Briefing sequence is playing.
    Briefing,
    /// Player is exploring and solving puzzles.
    Exploring,
    /// Every required puzzle is solved; the artifact can be recovered.
    VaultUnlocked,
    /// Artifact taken; results are being compiled.
    ArtifactRecovered,
    /// Results snapshot produced.
    Completed,
}

impl MissionState {
    /// Whether zone and puzzle signals are accepted.
    #[must_use]
    pub fn accepts_player_events(self) -> bool {
        matches!(self, Self::Exploring | Self::VaultUnlocked)
    }
}

/// Decisions counted toward full engagement.
const ENGAGED_DECISIONS: f64 = 5.0;

/// State machine for one mission run.
#[derive(Debug)]
pub struct MissionStateMachine {
    definition: MissionDefinition,
    run_id: RunId,
    state: MissionState,
    tone: ToneVariant,
    collaborators: Collaborators,

    puzzles: BTreeMap<PuzzleType, bool>,
    zones: BTreeMap<ZoneId, bool>,
    completed_puzzles: usize,
    /// Set once, when the completion gate fires.
    completed: bool,
    all_zones_explored_at_unlock: bool,

    choices: Vec<PlayerChoice>,
    decision_seconds: f64,
    decisions: u32,
    hints_used: u32,
    mistakes_made: u32,
    suggestions_offered: u32,
    suggestions_accepted: u32,
    elapsed: Duration,

    results: Option<MissionResultsSnapshot>,
}

impl MissionStateMachine {
    /// Create a run for `definition`. Every puzzle and zone starts incomplete.
    #[must_use]
    pub fn new(definition: MissionDefinition, collaborators: Collaborators, tone: ToneVariant) -> Self {
        let puzzles = definition.puzzles.iter().map(|p| (p.clone(), false)).collect();
        let zones = definition.zones.iter().map(|z| (z.clone(), false)).collect();
        Self {
            definition,
            run_id: RunId::new(),
            state: MissionState::NotStarted,
            tone,
            collaborators,
            puzzles,
            zones,
            completed_puzzles: 0,
            completed: false,
            all_zones_explored_at_unlock: false,
            choices: Vec::new(),
            decision_seconds: 0.0,
            decisions: 0,
            hints_used: 0,
            mistakes_made: 0,
            suggestions_offered: 0,
            suggestions_accepted: 0,
            elapsed: Duration::ZERO,
            results: None,
        }
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// `NotStarted → Briefing`.
    pub fn begin_briefing(&mut self) -> Outcome {
        if self.state != MissionState::NotStarted {
            return self.wrong_state("begin_briefing");
        }
        self.transition(MissionState::Briefing);
        let mission = self.definition.id.to_string();
        self.collaborators.analytics(|a| {
            a.log_event("mission_briefing", &mission, "mission", None);
        });
        Outcome::Applied
    }

    /// `Briefing → Exploring`. A mission without puzzles unlocks at once.
    pub fn begin_exploration(&mut self) -> Outcome {
        if self.state != MissionState::Briefing {
            return self.wrong_state("begin_exploration");
        }
        self.transition(MissionState::Exploring);
        self.check_completion_gate();
        Outcome::Applied
    }

    /// Let mission time pass. Only time spent exploring counts.
    pub fn advance_clock(&mut self, dt: Duration) {
        if self.state.accepts_player_events() {
            self.elapsed = self.elapsed.saturating_add(dt);
        }
    }

    // -----------------------------------------------------------------------
    // Player events
    // -----------------------------------------------------------------------

    /// Mark a zone explored. Repeats are no-ops.
    pub fn enter_zone(&mut self, zone_id: &str) -> Outcome {
        if !self.state.accepts_player_events() {
            return self.wrong_state("enter_zone");
        }
        let Some(explored) = self.zones.get_mut(zone_id) else {
            return self.reject(Rejection::UnknownZone(zone_id.to_string()));
        };
        if *explored {
            debug!(zone = zone_id, "Zone already explored");
            return Outcome::Duplicate;
        }
        *explored = true;

        info!(
            run = %self.run_id,
            zone = zone_id,
            explored = self.explored_zone_count(),
            total = self.zones.len(),
            "Zone explored"
        );
        let mission = self.definition.id.as_str();
        self.collaborators.analytics(|a| {
            a.log_event(
                "zone_explored",
                zone_id,
                "exploration",
                Some(&serde_json::json!({ "mission": mission })),
            );
        });
        self.collaborators
            .companion(|c| c.trigger_contextual_comment(zone_id));
        Outcome::Applied
    }

    /// Mark a puzzle complete. Repeats are no-ops; unregistered types are rejected.
    pub fn complete_puzzle(&mut self, puzzle_type: &str, outcome: PuzzleOutcome) -> Outcome {
        if !self.state.accepts_player_events() {
            return self.wrong_state("complete_puzzle");
        }
        let Some(done) = self.puzzles.get_mut(puzzle_type) else {
            return self.reject(Rejection::UnregisteredPuzzle(puzzle_type.to_string()));
        };
        if *done {
            debug!(puzzle = puzzle_type, "Puzzle already completed");
            return Outcome::Duplicate;
        }
        *done = true;
        self.completed_puzzles += 1;
        self.mistakes_made = self
            .mistakes_made
            .saturating_add(outcome.attempts.saturating_sub(1));
        self.hints_used = self.hints_used.saturating_add(outcome.hints_used);

        info!(
            run = %self.run_id,
            puzzle = puzzle_type,
            completed = self.completed_puzzles,
            total = self.puzzles.len(),
            "Puzzle completed"
        );
        self.collaborators.analytics(|a| {
            a.log_event(
                "puzzle_completed",
                puzzle_type,
                "puzzle",
                Some(&serde_json::json!({
                    "attempts": outcome.attempts,
                    "hints_used": outcome.hints_used,
                    "solve_seconds": outcome.solve_seconds,
                })),
            );
        });
        self.collaborators
            .companion(|c| c.react_to_puzzle_completion(puzzle_type, true));

        self.check_completion_gate();
        Outcome::Applied
    }

    /// Record a player decision.
    pub fn record_decision(
        &mut self,
        category: &str,
        choice: PlayerChoice,
        elapsed_seconds: f64,
        available_options: &[String],
    ) -> Outcome {
        if !self.state.accepts_player_events() {
            return self.wrong_state("record_decision");
        }
        let elapsed_seconds = elapsed_seconds.max(0.0);
        self.collaborators.analytics(|a| {
            a.log_decision(category, choice.choice_type.label(), elapsed_seconds, available_options);
        });
        self.decision_seconds += elapsed_seconds;
        self.decisions = self.decisions.saturating_add(1);
        self.choices.push(choice);
        Outcome::Applied
    }

    /// Count a hint request.
    pub fn use_hint(&mut self) -> Outcome {
        if !self.state.accepts_player_events() {
            return self.wrong_state("use_hint");
        }
        self.hints_used = self.hints_used.saturating_add(1);
        Outcome::Applied
    }

    /// Count a mistake.
    pub fn record_mistake(&mut self) -> Outcome {
        if !self.state.accepts_player_events() {
            return self.wrong_state("record_mistake");
        }
        self.mistakes_made = self.mistakes_made.saturating_add(1);
        Outcome::Applied
    }

    /// Count a companion suggestion and whether the player followed it.
    pub fn record_companion_suggestion(&mut self, accepted: bool) -> Outcome {
        if !self.state.accepts_player_events() {
            return self.wrong_state("record_companion_suggestion");
        }
        self.suggestions_offered = self.suggestions_offered.saturating_add(1);
        if accepted {
            self.suggestions_accepted = self.suggestions_accepted.saturating_add(1);
        }
        Outcome::Applied
    }

    /// Take the artifact. Only valid once the vault is unlocked.
    ///
    /// Compiles the results snapshot and finishes the run.
    pub fn recover_artifact(&mut self) -> Outcome {
        if self.state != MissionState::VaultUnlocked {
            return self.wrong_state("recover_artifact");
        }
        self.transition(MissionState::ArtifactRecovered);

        let snapshot = self.compile_results();
        let artifact_name = self.definition.artifact.name.clone();
        self.collaborators.analytics(|a| {
            a.log_event(
                "artifact_recovered",
                &artifact_name,
                "mission",
                Some(&serde_json::json!({
                    "completion_time": snapshot.completion_time,
                    "choices": snapshot.choices.len(),
                })),
            );
        });
        let line = self.tone.dialogue_id("artifact_recovered");
        self.collaborators.companion(|c| c.trigger_dialogue(&line));

        self.results = Some(snapshot);
        self.transition(MissionState::Completed);
        Outcome::Applied
    }

    /// Hand out the results snapshot. Returns `Some` exactly once.
    pub fn take_results(&mut self) -> Option<MissionResultsSnapshot> {
        self.results.take()
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> MissionState {
        self.state
    }

    /// Identifier of this run.
    #[must_use]
    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    /// Mission this run belongs to.
    #[must_use]
    pub fn mission_id(&self) -> &MissionId {
        &self.definition.id
    }

    /// The definition this run was created from.
    #[must_use]
    pub fn definition(&self) -> &MissionDefinition {
        &self.definition
    }

    /// Tone chosen for this run's dialogue.
    #[must_use]
    pub fn tone(&self) -> ToneVariant {
        self.tone
    }

    /// Whether `puzzle_type` has been completed.
    #[must_use]
    pub fn is_puzzle_completed(&self, puzzle_type: &str) -> bool {
        self.puzzles.get(puzzle_type).copied().unwrap_or(false)
    }

    /// Number of distinct puzzles completed.
    #[must_use]
    pub fn completed_count(&self) -> usize {
        self.completed_puzzles
    }

    /// Number of puzzles required.
    #[must_use]
    pub fn total_puzzles(&self) -> usize {
        self.puzzles.len()
    }

    /// Whether every required puzzle is complete.
    #[must_use]
    pub fn can_access_artifact(&self) -> bool {
        self.completed_puzzles == self.puzzles.len()
    }

    /// Whether `zone_id` has been explored.
    #[must_use]
    pub fn is_zone_explored(&self, zone_id: &str) -> bool {
        self.zones.get(zone_id).copied().unwrap_or(false)
    }

    /// Number of zones explored.
    #[must_use]
    pub fn explored_zone_count(&self) -> usize {
        self.zones.values().filter(|explored| **explored).count()
    }

    /// Puzzle completion map.
    #[must_use]
    pub fn puzzle_progress(&self) -> &BTreeMap<PuzzleType, bool> {
        &self.puzzles
    }

    /// Choices recorded so far.
    #[must_use]
    pub fn choices(&self) -> &[PlayerChoice] {
        &self.choices
    }

    /// Mission time elapsed while exploring.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    // -----------------------------------------------------------------------
    // Sequences
    // -----------------------------------------------------------------------

    /// Briefing: intro line, pause, objectives, wait for the player, then explore.
    #[must_use]
    pub fn briefing_sequence(&self, pacing: &PacingConfig) -> Sequence<Cue> {
        Sequence::new(Vec::new())
            .then(Cue::ShowPanel("briefing".to_string()))
            .then_wait(
                Cue::Dialogue(self.tone.dialogue_id("briefing_intro")),
                pacing.briefing_delay(),
            )
            .then_await_advance(Cue::Dialogue(self.tone.dialogue_id("briefing_objectives")))
            .then(Cue::BeginExploration)
    }

    /// Vault ceremony played after the unlock.
    #[must_use]
    pub fn vault_ceremony_sequence(&self, pacing: &PacingConfig) -> Sequence<Cue> {
        Sequence::new(Vec::new())
            .then_wait(Cue::ShowPanel("vault".to_string()), pacing.ceremony_delay())
            .then_await_advance(Cue::Dialogue(self.tone.dialogue_id("vault_ceremony")))
            .then(Cue::ShowPanel("exploration".to_string()))
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn transition(&mut self, next: MissionState) {
        info!(
            run = %self.run_id,
            mission = %self.definition.id,
            from = ?self.state,
            to = ?next,
            "Mission state transition"
        );
        self.state = next;
    }

    fn check_completion_gate(&mut self) {
        if self.completed || !self.can_access_artifact() {
            return;
        }
        self.completed = true;
        self.all_zones_explored_at_unlock = self.zones.values().all(|explored| *explored);
        self.transition(MissionState::VaultUnlocked);

        let mission = self.definition.id.to_string();
        self.collaborators.analytics(|a| {
            a.log_event("vault_unlocked", &mission, "mission", None);
        });
        let line = self.tone.dialogue_id("vault_unlocked");
        self.collaborators.companion(|c| c.trigger_dialogue(&line));
    }

    fn wrong_state(&self, operation: &'static str) -> Outcome {
        self.reject(Rejection::WrongState {
            operation,
            state: self.state,
        })
    }

    fn reject(&self, rejection: Rejection) -> Outcome {
        debug!(run = %self.run_id, reason = %rejection, "Mission event rejected");
        Outcome::Rejected(rejection)
    }

    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
    fn compile_results(&self) -> MissionResultsSnapshot {
        let completed = self.completed_puzzles as f64;
        let mistakes = f64::from(self.mistakes_made);
        let hints = f64::from(self.hints_used);

        let accuracy = if completed + mistakes == 0.0 {
            1.0
        } else {
            completed / (completed + mistakes)
        };
        let exploration = if self.zones.is_empty() {
            1.0
        } else {
            self.explored_zone_count() as f64 / self.zones.len() as f64
        };
        let average_decision_time = if self.decisions == 0 {
            0.0
        } else {
            self.decision_seconds / f64::from(self.decisions)
        };
        let collaboration = if self.suggestions_offered == 0 {
            0.0
        } else {
            f64::from(self.suggestions_accepted) / f64::from(self.suggestions_offered)
        };
        let engagement = clamp01(
            0.4 * exploration
                + 0.3 * (f64::from(self.decisions) / ENGAGED_DECISIONS).min(1.0)
                + 0.3 * collaboration,
        );

        let performance = PerformanceCounters {
            hints_used: self.hints_used,
            mistakes_made: self.mistakes_made,
            accuracy_rate: clamp01(accuracy) as f32,
            exploration_efficiency: clamp01(exploration) as f32,
            engagement_level: engagement as f32,
            frustration_level: clamp01(0.1 * mistakes + 0.05 * hints) as f32,
            confidence_level: clamp01(accuracy - 0.05 * hints) as f32,
            average_decision_time: average_decision_time as f32,
            collaboration_score: clamp01(collaboration) as f32,
            showed_systematic_approach: self.all_zones_explored_at_unlock
                && self.mistakes_made == 0,
        };

        let artifact = ArtifactReward {
            name: self.definition.artifact.name.clone(),
            description: self.definition.artifact.description.clone(),
            experience: self.definition.rewards.experience,
        };

        MissionResultsSnapshot {
            mission_id: self.definition.id.clone(),
            run_id: self.run_id,
            success: true,
            artifact_recovered: true,
            artifact: Some(artifact),
            completion_time: self.elapsed.as_secs_f64(),
            puzzles_completed: u32::try_from(self.completed_puzzles).unwrap_or(u32::MAX),
            total_puzzles: u32::try_from(self.puzzles.len()).unwrap_or(u32::MAX),
            companion_evolution: CompanionEvolution::from_choices(&self.choices),
            choices: self.choices.clone(),
            performance,
            resource_deltas: self.definition.rewards.resource_deltas(),
        }
    }
}
