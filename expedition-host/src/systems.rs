//! Systems that feed host input into the engine.
//!
//! | System        | Runs                                   |
//! |---------------|----------------------------------------|
//! | Event pump    | After every frame / suspension point   |
//! | Cue executor  | For every action a sequence releases   |
//!
//! Player events that arrive while a cooperative sequence is suspended are
//! held in the [`EventPump`] and applied later, synchronously and in the
//! order they arrived. Suspension never reorders state transitions.

use std::collections::VecDeque;

use tracing::{debug, info_span};

use expedition_core::metrics::{spans, EngineCounters};
use expedition_core::sequence::Cue;
use expedition_core::{HubOrchestrator, MissionStateMachine, Outcome, Rejection, SystemsState};

use crate::events::PlayerEvent;

/// Apply one event to a mission.
pub fn apply_event(mission: &mut MissionStateMachine, event: PlayerEvent) -> Outcome {
    match event {
        PlayerEvent::ZoneEntered { zone } => mission.enter_zone(&zone),
        PlayerEvent::PuzzleSolved { puzzle, outcome } => mission.complete_puzzle(&puzzle, outcome),
        PlayerEvent::Decision {
            category,
            choice,
            elapsed_seconds,
            options,
        } => mission.record_decision(&category, choice, elapsed_seconds, &options),
        PlayerEvent::HintUsed => mission.use_hint(),
        PlayerEvent::Mistake => mission.record_mistake(),
        PlayerEvent::CompanionSuggestion { accepted } => mission.record_companion_suggestion(accepted),
        PlayerEvent::ArtifactTouched => mission.recover_artifact(),
        PlayerEvent::ClockTick { elapsed } => {
            mission.advance_clock(elapsed);
            Outcome::Applied
        }
    }
}

/// FIFO of player events waiting to reach the active mission.
#[derive(Debug, Default)]
pub struct EventPump {
    queue: VecDeque<PlayerEvent>,
    held: bool,
}

impl EventPump {
    /// Create an empty, released pump.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an event.
    pub fn push(&mut self, event: PlayerEvent) {
        self.queue.push_back(event);
    }

    /// Stop delivering events until [`EventPump::release`].
    pub fn hold(&mut self) {
        self.held = true;
    }

    /// Resume delivering events.
    pub fn release(&mut self) {
        self.held = false;
    }

    /// Whether delivery is on hold.
    #[must_use]
    pub fn is_held(&self) -> bool {
        self.held
    }

    /// Events waiting.
    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Whether nothing is waiting.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Apply every queued event to the hub's active mission, oldest first.
    ///
    /// Does nothing while held. Without an active mission the events are
    /// consumed and rejected.
    pub fn drain<S: SystemsState>(&mut self, hub: &mut HubOrchestrator<S>) -> Vec<Outcome> {
        if self.held {
            return Vec::new();
        }
        let _span =
            info_span!(parent: hub.run_span(), spans::EVENT_PUMP, queued = self.queue.len()).entered();

        let mut outcomes = Vec::with_capacity(self.queue.len());
        while let Some(event) = self.queue.pop_front() {
            let kind = event.kind();
            let is_zone = matches!(event, PlayerEvent::ZoneEntered { .. });
            let is_puzzle = matches!(event, PlayerEvent::PuzzleSolved { .. });

            let outcome = match hub.mission_mut() {
                Some(mission) => apply_event(mission, event),
                None => Outcome::Rejected(Rejection::NoMissionInProgress),
            };

            let counters = hub.counters();
            counters.record_outcome(&outcome);
            if outcome.is_applied() {
                if is_zone {
                    EngineCounters::bump(&counters.zones_explored);
                }
                if is_puzzle {
                    EngineCounters::bump(&counters.puzzles_completed);
                }
            }
            debug!(event = kind, outcome = ?outcome, "Player event applied");
            outcomes.push(outcome);
        }
        outcomes
    }
}

impl Extend<PlayerEvent> for EventPump {
    fn extend<I: IntoIterator<Item = PlayerEvent>>(&mut self, events: I) {
        self.queue.extend(events);
    }
}

/// Carry out one cue released by a sequence.
pub fn perform_cue<S: SystemsState>(hub: &mut HubOrchestrator<S>, cue: &Cue) {
    debug!(cue = ?cue, "Performing cue");
    match cue {
        Cue::Dialogue(id) => hub.collaborators().companion(|c| c.trigger_dialogue(id)),
        Cue::BeginExploration => {
            let outcome = match hub.mission_mut() {
                Some(mission) => mission.begin_exploration(),
                None => Outcome::Rejected(Rejection::NoMissionInProgress),
            };
            hub.counters().record_outcome(&outcome);
            debug!(outcome = ?outcome, "Exploration cue applied");
        }
        Cue::ShowPanel(panel) => hub
            .collaborators()
            .analytics(|a| a.log_ui_interaction(panel, "show", None)),
        Cue::ReturnToHub => hub
            .collaborators()
            .analytics(|a| a.log_ui_interaction("hub", "return", None)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks;
    use expedition_core::{Collaborators, ExpeditionConfig, MissionDefinition, MissionState};

    fn hub() -> HubOrchestrator {
        let config = ExpeditionConfig::default()
            .with_mission(MissionDefinition::new("archive", ["chrono", "cipher"], ["atrium"]));
        HubOrchestrator::new(&config, Collaborators::none())
    }

    #[test]
    fn held_events_apply_in_arrival_order_on_release() {
        let mut hub = hub();
        hub.start_mission("archive");
        let mut pump = EventPump::new();

        pump.hold();
        pump.push(hooks::on_zone_trigger("atrium"));
        pump.push(hooks::on_puzzle_solved("chrono", 1, 0, 5.0));
        pump.push(hooks::on_puzzle_solved("chrono", 1, 0, 5.0));
        pump.push(hooks::on_puzzle_solved("cipher", 2, 0, 5.0));
        pump.push(PlayerEvent::ArtifactTouched);
        assert!(pump.drain(&mut hub).is_empty());
        assert_eq!(pump.len(), 5);

        perform_cue(&mut hub, &Cue::BeginExploration);
        pump.release();
        let outcomes = pump.drain(&mut hub);
        assert_eq!(
            outcomes,
            vec![
                Outcome::Applied,
                Outcome::Applied,
                Outcome::Duplicate,
                Outcome::Applied,
                Outcome::Applied,
            ]
        );
        assert!(pump.is_empty());

        let mission = hub.mission().unwrap();
        assert_eq!(mission.state(), MissionState::Completed);
        let counters = hub.counters().snapshot();
        assert_eq!(counters.zones_explored, 1);
        assert_eq!(counters.puzzles_completed, 2);
        assert_eq!(counters.duplicate_events, 1);
    }

    #[test]
    fn events_before_exploration_are_rejected() {
        let mut hub = hub();
        hub.start_mission("archive");
        let mut pump = EventPump::new();
        pump.push(hooks::on_puzzle_solved("chrono", 1, 0, 1.0));
        let outcomes = pump.drain(&mut hub);
        assert!(outcomes[0].rejection().is_some());
        assert_eq!(hub.mission().unwrap().completed_count(), 0);
    }

    #[test]
    fn exploration_cue_outcome_is_counted() {
        let mut hub = hub();
        perform_cue(&mut hub, &Cue::BeginExploration);
        assert_eq!(hub.counters().snapshot().rejected_events, 1);

        hub.start_mission("archive");
        perform_cue(&mut hub, &Cue::BeginExploration);
        assert_eq!(hub.mission().unwrap().state(), MissionState::Exploring);
        assert_eq!(hub.counters().snapshot().rejected_events, 1);

        // A second cue arrives after exploration already began.
        perform_cue(&mut hub, &Cue::BeginExploration);
        assert_eq!(hub.counters().snapshot().rejected_events, 2);
    }

    #[test]
    fn events_without_mission_are_consumed() {
        let mut hub = hub();
        let mut pump = EventPump::new();
        pump.push(hooks::on_zone_trigger("atrium"));
        let outcomes = pump.drain(&mut hub);
        assert_eq!(outcomes, vec![Outcome::Rejected(Rejection::NoMissionInProgress)]);
        assert!(pump.is_empty());
        assert_eq!(hub.counters().snapshot().rejected_events, 1);
    }
}
