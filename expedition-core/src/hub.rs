//! Home-base orchestration.
//!
//! The [`HubOrchestrator`] is the engine instance the host's composition
//! root constructs and passes around. It owns everything that outlives a
//! single mission: the catalog, the companion's [`PersonalityModel`], the
//! ship's [`SystemsState`] and the run counters. It allows at most one
//! mission at a time.
//!
//! [`HubOrchestrator::complete_mission`] is all-or-nothing: every check runs
//! before the first effect is applied, and none of the effects can fail.

use std::collections::BTreeMap;

use tracing::{debug, info, info_span, warn, Span};

use crate::collaborators::{Collaborators, ShipSystems, SystemsState};
use crate::config::{ExpeditionConfig, PacingConfig};
use crate::dialogue::{select_variant, ToneVariant};
use crate::error::{Outcome, Rejection};
use crate::metrics::{spans, EngineCounters};
use crate::mission::{MissionState, MissionStateMachine};
use crate::observer::{ObserverList, Subscription};
use crate::personality::{PersonalityModel, PersonalityState};
use crate::results::{self, MissionReport};
use crate::sequence::{Cue, Sequence};
use crate::types::{MissionDefinition, MissionId, MissionResultsSnapshot, ResourceDeltas};

/// Engine instance coordinating missions, ship systems and the companion.
#[derive(Debug)]
pub struct HubOrchestrator<S: SystemsState = ShipSystems> {
    catalog: BTreeMap<MissionId, MissionDefinition>,
    pacing: PacingConfig,
    personality: PersonalityModel,
    systems: S,
    collaborators: Collaborators,

    mission: Option<MissionStateMachine>,
    mission_in_progress: bool,
    total_missions_completed: u32,
    last_report: Option<MissionReport>,

    /// Span covering the active run, from start to completion or abandonment.
    run_span: Span,
    counters: EngineCounters,
    mission_selected: ObserverList<MissionId>,
    systems_updated: ObserverList<ResourceDeltas>,
}

impl HubOrchestrator<ShipSystems> {
    /// Create a hub with default ship systems.
    #[must_use]
    pub fn new(config: &ExpeditionConfig, collaborators: Collaborators) -> Self {
        Self::with_systems(config, collaborators, ShipSystems::default())
    }
}

impl<S: SystemsState> HubOrchestrator<S> {
    /// Create a hub around a caller-supplied systems accumulator.
    #[must_use]
    pub fn with_systems(config: &ExpeditionConfig, collaborators: Collaborators, systems: S) -> Self {
        let catalog = config
            .missions
            .iter()
            .map(|m| (m.id.clone(), m.clone()))
            .collect();
        Self {
            catalog,
            pacing: config.pacing,
            personality: PersonalityModel::new(config.personality.initial_state()),
            systems,
            collaborators,
            mission: None,
            mission_in_progress: false,
            total_missions_completed: 0,
            last_report: None,
            run_span: Span::none(),
            counters: EngineCounters::new(),
            mission_selected: ObserverList::new(),
            systems_updated: ObserverList::new(),
        }
    }

    // -----------------------------------------------------------------------
    // Mission lifecycle
    // -----------------------------------------------------------------------

    /// Launch a mission from the catalog and enter its briefing.
    ///
    /// Refused while another mission is in progress.
    pub fn start_mission(&mut self, mission_id: &str) -> Outcome {
        if self.mission_in_progress {
            return self.reject(Rejection::MissionInProgress);
        }
        let Some(definition) = self.catalog.get(mission_id).cloned() else {
            return self.reject(Rejection::UnknownMission(MissionId::from(mission_id)));
        };

        let tone = self.tone();
        self.collaborators.analytics(|a| {
            a.log_event("mission_started", mission_id, "hub", None);
        });
        let mut mission = MissionStateMachine::new(definition, self.collaborators.clone(), tone);
        let briefing = mission.begin_briefing();
        debug_assert!(briefing.is_applied());

        let run_span = info_span!(spans::MISSION_RUN, mission = mission_id, run = %mission.run_id());
        run_span.in_scope(|| info!(tone = ?tone, "Mission started"));
        self.run_span = run_span;
        let id = mission.mission_id().clone();
        self.mission = Some(mission);
        self.mission_in_progress = true;
        EngineCounters::bump(&self.counters.missions_started);

        let line = tone.dialogue_id("mission_start");
        self.collaborators.companion(|c| c.trigger_dialogue(&line));
        self.mission_selected.notify(&id);
        Outcome::Applied
    }

    /// Apply a finished mission's results.
    ///
    /// Clears the in-progress flag, bumps the completion count, applies the
    /// resource deltas and companion evolution, and evaluates the snapshot.
    /// Either all of that happens or nothing does.
    pub fn complete_mission(&mut self, snapshot: MissionResultsSnapshot) -> Outcome {
        let _span =
            info_span!(parent: &self.run_span, spans::COMPLETE_MISSION, run = %snapshot.run_id).entered();

        let Some(active) = self.mission.as_ref().filter(|_| self.mission_in_progress) else {
            return self.reject(Rejection::NoMissionInProgress);
        };
        if active.run_id() != snapshot.run_id {
            return self.reject(Rejection::RunMismatch {
                expected: active.run_id(),
                actual: snapshot.run_id,
            });
        }
        if active.state() != MissionState::Completed {
            return self.reject(Rejection::ResultsNotReady);
        }

        // Checks passed; from here on nothing can fail.
        self.mission = None;
        self.mission_in_progress = false;
        self.total_missions_completed = self.total_missions_completed.saturating_add(1);

        self.systems.apply_deltas(&snapshot.resource_deltas);
        self.systems_updated.notify(&snapshot.resource_deltas);

        let evolution = snapshot.companion_evolution;
        for _ in 0..evolution.empathetic_interactions {
            self.personality.apply_interaction(true);
        }
        for _ in 0..evolution.logical_interactions {
            self.personality.apply_interaction(false);
        }
        self.counters
            .interactions_applied
            .fetch_add(u64::from(evolution.total()), std::sync::atomic::Ordering::Relaxed);

        let report = results::evaluate(&snapshot);
        info!(
            mission = %snapshot.mission_id,
            score = report.score,
            primary = %report.primary_tendency,
            completed = self.total_missions_completed,
            "Mission completed"
        );
        self.collaborators.analytics(|a| {
            a.log_event(
                "mission_completed",
                snapshot.mission_id.as_str(),
                &report.primary_tendency.to_string(),
                Some(&serde_json::json!({
                    "score": report.score,
                    "completion_time": snapshot.completion_time,
                    "puzzles_completed": snapshot.puzzles_completed,
                    "total_puzzles": snapshot.total_puzzles,
                    "choice_percentages": report.choice_percentages,
                })),
            );
        });
        let line = self.tone().dialogue_id("mission_complete");
        self.collaborators.companion(|c| c.trigger_dialogue(&line));

        EngineCounters::bump(&self.counters.missions_completed);
        self.last_report = Some(report);
        self.run_span = Span::none();
        Outcome::Applied
    }

    /// Take the active mission's results and apply them.
    pub fn collect_results(&mut self) -> Outcome {
        let Some(mission) = self.mission.as_mut() else {
            return self.reject(Rejection::NoMissionInProgress);
        };
        match mission.take_results() {
            Some(snapshot) => self.complete_mission(snapshot),
            None => self.reject(Rejection::ResultsNotReady),
        }
    }

    /// Discard the active mission without committing any of its progress.
    pub fn abandon_mission(&mut self) -> Outcome {
        if !self.mission_in_progress {
            return self.reject(Rejection::NoMissionInProgress);
        }
        let mission = self.mission.take();
        self.mission_in_progress = false;
        EngineCounters::bump(&self.counters.missions_abandoned);

        let run_span = std::mem::replace(&mut self.run_span, Span::none());
        if let Some(mission) = mission {
            run_span.in_scope(|| warn!(state = ?mission.state(), "Mission abandoned"));
            let id = mission.mission_id().to_string();
            self.collaborators.analytics(|a| {
                a.log_event("mission_abandoned", &id, "hub", None);
            });
        }
        Outcome::Applied
    }

    // -----------------------------------------------------------------------
    // Companion
    // -----------------------------------------------------------------------

    /// A hub-side conversation with the companion.
    pub fn converse(&mut self, is_empathetic: bool) -> PersonalityState {
        EngineCounters::bump(&self.counters.interactions_applied);
        self.personality.apply_interaction(is_empathetic)
    }

    /// Tone the companion speaks in right now.
    #[must_use]
    pub fn tone(&self) -> ToneVariant {
        select_variant(&self.personality.state())
    }

    /// Post-mission pipeline: reaction, pause, results panel, wait, back to hub.
    #[must_use]
    pub fn post_mission_sequence(&self, report: &MissionReport) -> Sequence<Cue> {
        let tone = self.tone();
        let reaction = format!(
            "debrief_{}",
            report.primary_tendency.to_string().to_lowercase()
        );
        Sequence::new(Vec::new())
            .then_wait(
                Cue::Dialogue(tone.dialogue_id(&reaction)),
                self.pacing.post_mission_pause(),
            )
            .then_await_advance(Cue::ShowPanel("results".to_string()))
            .then(Cue::ReturnToHub)
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    /// The running mission, if any.
    #[must_use]
    pub fn mission(&self) -> Option<&MissionStateMachine> {
        self.mission.as_ref()
    }

    /// The running mission, for routing player events.
    pub fn mission_mut(&mut self) -> Option<&mut MissionStateMachine> {
        self.mission.as_mut()
    }

    /// Whether a mission is running.
    #[must_use]
    pub fn is_mission_in_progress(&self) -> bool {
        self.mission_in_progress
    }

    /// Missions completed this session.
    #[must_use]
    pub fn total_missions_completed(&self) -> u32 {
        self.total_missions_completed
    }

    /// Report of the most recently completed mission.
    #[must_use]
    pub fn last_report(&self) -> Option<&MissionReport> {
        self.last_report.as_ref()
    }

    /// Companion traits.
    #[must_use]
    pub fn personality(&self) -> PersonalityState {
        self.personality.state()
    }

    /// Ship systems.
    #[must_use]
    pub fn systems(&self) -> &S {
        &self.systems
    }

    /// Sequence pacing.
    #[must_use]
    pub fn pacing(&self) -> &PacingConfig {
        &self.pacing
    }

    /// Collaborator handles shared with missions.
    #[must_use]
    pub fn collaborators(&self) -> &Collaborators {
        &self.collaborators
    }

    /// Span of the active run. Disabled when no mission is running.
    #[must_use]
    pub fn run_span(&self) -> &Span {
        &self.run_span
    }

    /// Run counters.
    #[must_use]
    pub fn counters(&self) -> &EngineCounters {
        &self.counters
    }

    /// Mission ids in the catalog, sorted.
    pub fn mission_ids(&self) -> impl Iterator<Item = &MissionId> {
        self.catalog.keys()
    }

    // -----------------------------------------------------------------------
    // Observers
    // -----------------------------------------------------------------------

    /// Notified with the mission id whenever a mission starts.
    #[must_use = "dropping the subscription unsubscribes immediately"]
    pub fn on_mission_selected(&self, callback: impl Fn(&MissionId) + 'static) -> Subscription {
        self.mission_selected.subscribe(callback)
    }

    /// Notified with the applied deltas whenever ship systems change.
    #[must_use = "dropping the subscription unsubscribes immediately"]
    pub fn on_systems_updated(&self, callback: impl Fn(&ResourceDeltas) + 'static) -> Subscription {
        self.systems_updated.subscribe(callback)
    }

    /// Notified whenever the companion's personality changes.
    #[must_use = "dropping the subscription unsubscribes immediately"]
    pub fn on_personality_change(
        &self,
        callback: impl Fn(&PersonalityState) + 'static,
    ) -> Subscription {
        self.personality.on_change(callback)
    }

    fn reject(&self, rejection: Rejection) -> Outcome {
        debug!(reason = %rejection, "Hub operation rejected");
        let outcome = Outcome::Rejected(rejection);
        self.counters.record_outcome(&outcome);
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::{RecordingAnalytics, RecordingCompanion};
    use crate::types::{ChoiceType, PlayerChoice, PuzzleOutcome, RewardParameters};
    use std::cell::Cell;
    use std::rc::Rc;

    fn config() -> ExpeditionConfig {
        ExpeditionConfig::default()
            .with_mission(
                MissionDefinition::new("archive", ["chrono", "cipher"], ["atrium"])
                    .with_rewards(RewardParameters {
                        experience: 100,
                        morale: 10.0,
                        power: 5.0,
                        population: 0.0,
                        colony_progress: 2.5,
                    })
                    .with_artifact("Chrono Lens", ""),
            )
            .with_mission(MissionDefinition::new("observatory", ["lens"], ["dome"]))
    }

    fn play_through(hub: &mut HubOrchestrator) -> MissionResultsSnapshot {
        let m = hub.mission_mut().unwrap();
        m.begin_exploration();
        m.enter_zone("atrium");
        m.record_decision("a", PlayerChoice::new(ChoiceType::Empathetic, "x"), 1.0, &[]);
        m.record_decision("b", PlayerChoice::new(ChoiceType::Empathetic, "y"), 1.0, &[]);
        m.record_decision("c", PlayerChoice::new(ChoiceType::Logical, "z"), 1.0, &[]);
        m.complete_puzzle("chrono", PuzzleOutcome::default());
        m.complete_puzzle("cipher", PuzzleOutcome::default());
        m.recover_artifact();
        m.take_results().unwrap()
    }

    #[test]
    fn second_start_is_refused() {
        let mut hub = HubOrchestrator::new(&config(), Collaborators::none());
        assert_eq!(hub.start_mission("archive"), Outcome::Applied);
        let run = hub.mission().unwrap().run_id();

        assert_eq!(
            hub.start_mission("observatory"),
            Outcome::Rejected(Rejection::MissionInProgress)
        );
        assert!(hub.is_mission_in_progress());
        assert_eq!(hub.mission().unwrap().run_id(), run);
        assert_eq!(hub.mission().unwrap().mission_id().as_str(), "archive");
    }

    #[test]
    fn run_span_lives_for_one_run() {
        let _guard = tracing::subscriber::set_default(tracing_subscriber::registry());
        let mut hub = HubOrchestrator::new(&config(), Collaborators::none());
        assert!(hub.run_span().is_disabled());

        assert!(hub.start_mission("archive").is_applied());
        assert!(!hub.run_span().is_disabled());
        let snapshot = play_through(&mut hub);
        assert!(hub.complete_mission(snapshot).is_applied());
        assert!(hub.run_span().is_disabled());

        assert!(hub.start_mission("archive").is_applied());
        assert!(!hub.run_span().is_disabled());
        assert!(hub.abandon_mission().is_applied());
        assert!(hub.run_span().is_disabled());
    }

    #[test]
    fn direct_machine_calls_leave_event_counters_alone() {
        let mut hub = HubOrchestrator::new(&config(), Collaborators::none());
        assert!(hub.start_mission("archive").is_applied());
        let snapshot = play_through(&mut hub);
        assert!(hub.complete_mission(snapshot).is_applied());

        let counters = hub.counters().snapshot();
        assert_eq!(counters.missions_started, 1);
        assert_eq!(counters.missions_completed, 1);
        assert_eq!(counters.zones_explored, 0);
        assert_eq!(counters.puzzles_completed, 0);
    }

    #[test]
    fn unknown_mission_is_refused() {
        let mut hub = HubOrchestrator::new(&config(), Collaborators::none());
        assert!(matches!(
            hub.start_mission("nowhere"),
            Outcome::Rejected(Rejection::UnknownMission(_))
        ));
        assert!(!hub.is_mission_in_progress());
    }

    #[test]
    fn completion_applies_all_effects() {
        let analytics = Rc::new(RecordingAnalytics::new());
        let companion = Rc::new(RecordingCompanion::new());
        let mut hub = HubOrchestrator::new(
            &config(),
            Collaborators::none()
                .with_analytics(analytics.clone())
                .with_companion(companion.clone()),
        );
        let before = hub.personality();

        hub.start_mission("archive");
        let snap = play_through(&mut hub);
        assert_eq!(hub.complete_mission(snap), Outcome::Applied);

        assert!(!hub.is_mission_in_progress());
        assert!(hub.mission().is_none());
        assert_eq!(hub.total_missions_completed(), 1);
        assert_eq!(hub.systems().morale, 60.0);
        assert_eq!(hub.systems().colony_progress, 2.5);

        let after = hub.personality();
        assert_eq!(after.total_interactions, before.total_interactions + 3);
        assert!((after.empathy_level - (before.empathy_level + 0.2)).abs() < 1e-5);
        assert!((after.logical_core - (before.logical_core + 0.05)).abs() < 1e-5);

        let report = hub.last_report().unwrap();
        assert!(report.score > 0.0 && report.score <= 100.0);
        assert!(analytics.event_ids().contains(&"mission_completed".to_string()));
        assert_eq!(companion.dialogues().first().unwrap(), "mission_start_logical");
        assert_eq!(hub.counters().snapshot().missions_completed, 1);
    }

    #[test]
    fn completion_without_mission_changes_nothing() {
        let mut hub = HubOrchestrator::new(&config(), Collaborators::none());
        hub.start_mission("archive");
        let snap = play_through(&mut hub);
        hub.complete_mission(snap.clone());

        let personality = hub.personality();
        let systems = *hub.systems();
        assert_eq!(
            hub.complete_mission(snap),
            Outcome::Rejected(Rejection::NoMissionInProgress)
        );
        assert_eq!(hub.total_missions_completed(), 1);
        assert_eq!(hub.personality(), personality);
        assert_eq!(*hub.systems(), systems);
    }

    #[test]
    fn foreign_snapshot_is_refused_atomically() {
        let mut hub = HubOrchestrator::new(&config(), Collaborators::none());
        hub.start_mission("archive");
        let mut snap = play_through(&mut hub);
        snap.run_id = crate::types::RunId::new();

        let personality = hub.personality();
        assert!(matches!(
            hub.complete_mission(snap),
            Outcome::Rejected(Rejection::RunMismatch { .. })
        ));
        assert!(hub.is_mission_in_progress());
        assert_eq!(hub.total_missions_completed(), 0);
        assert_eq!(hub.personality(), personality);
        assert_eq!(*hub.systems(), ShipSystems::default());
        assert!(hub.last_report().is_none());
    }

    #[test]
    fn abandon_discards_progress() {
        let mut hub = HubOrchestrator::new(&config(), Collaborators::none());
        hub.start_mission("archive");
        {
            let m = hub.mission_mut().unwrap();
            m.begin_exploration();
            m.record_decision("a", PlayerChoice::new(ChoiceType::Empathetic, "x"), 1.0, &[]);
            m.complete_puzzle("chrono", PuzzleOutcome::default());
        }
        let personality = hub.personality();
        assert_eq!(hub.abandon_mission(), Outcome::Applied);
        assert!(!hub.is_mission_in_progress());
        assert_eq!(hub.personality(), personality);
        assert_eq!(*hub.systems(), ShipSystems::default());
        assert_eq!(hub.total_missions_completed(), 0);

        // A fresh mission can start afterwards.
        assert!(hub.start_mission("observatory").is_applied());
    }

    #[test]
    fn collect_results_requires_completed_run() {
        let mut hub = HubOrchestrator::new(&config(), Collaborators::none());
        assert_eq!(
            hub.collect_results(),
            Outcome::Rejected(Rejection::NoMissionInProgress)
        );
        hub.start_mission("observatory");
        assert_eq!(hub.collect_results(), Outcome::Rejected(Rejection::ResultsNotReady));

        let m = hub.mission_mut().unwrap();
        m.begin_exploration();
        m.complete_puzzle("lens", PuzzleOutcome::default());
        m.recover_artifact();
        assert_eq!(hub.collect_results(), Outcome::Applied);
        assert_eq!(hub.total_missions_completed(), 1);
    }

    #[test]
    fn observers_follow_subscription_lifetime() {
        let mut hub = HubOrchestrator::new(&config(), Collaborators::none());
        let selected = Rc::new(Cell::new(0));
        let systems = Rc::new(Cell::new(0));
        let personality = Rc::new(Cell::new(0));

        let s1 = Rc::clone(&selected);
        let sub_selected = hub.on_mission_selected(move |_| s1.set(s1.get() + 1));
        let s2 = Rc::clone(&systems);
        let _sub_systems = hub.on_systems_updated(move |_| s2.set(s2.get() + 1));
        let s3 = Rc::clone(&personality);
        let _sub_personality = hub.on_personality_change(move |_| s3.set(s3.get() + 1));

        hub.start_mission("archive");
        let snap = play_through(&mut hub);
        hub.complete_mission(snap);
        assert_eq!(selected.get(), 1);
        assert_eq!(systems.get(), 1);
        assert_eq!(personality.get(), 3);

        drop(sub_selected);
        hub.start_mission("observatory");
        assert_eq!(selected.get(), 1);
    }

    #[test]
    fn converse_evolves_personality_and_tone() {
        let mut hub = HubOrchestrator::new(&config(), Collaborators::none());
        assert_eq!(hub.tone(), ToneVariant::Logical);
        for _ in 0..9 {
            hub.converse(true);
        }
        // empathy 0.2 + 0.9 = 1.1 > logic 1.0
        assert_eq!(hub.tone(), ToneVariant::Empathetic);
        assert_eq!(hub.personality().total_interactions, 9);
    }

    #[test]
    fn post_mission_sequence_reacts_to_primary_tendency() {
        let mut hub = HubOrchestrator::new(&config(), Collaborators::none());
        hub.start_mission("archive");
        let snap = play_through(&mut hub);
        hub.complete_mission(snap);
        let report = hub.last_report().unwrap().clone();

        let mut seq = hub.post_mission_sequence(&report);
        let first = seq.start();
        assert_eq!(first, vec![Cue::Dialogue("debrief_empathetic_logical".to_string())]);
        assert_eq!(
            seq.tick(hub.pacing().post_mission_pause()),
            vec![Cue::ShowPanel("results".to_string())]
        );
        assert_eq!(seq.signal_advance(), vec![Cue::ReturnToHub]);
    }
}
