//! External collaborators the engine talks to.
//!
//! - [`AnalyticsSink`] receives decision, event and UI records.
//! - [`CompanionPresence`] is the companion's dialogue/visual front-end.
//! - [`SystemsState`] accumulates ship resource deltas.
//!
//! Analytics and companion calls are fire-and-forget. Either may be absent;
//! every call site goes through [`Collaborators`], which skips the side
//! effect when the collaborator is missing.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::types::ResourceDeltas;

/// Receiver for analytics records.
pub trait AnalyticsSink {
    /// A player decision among `available_options`.
    fn log_decision(
        &self,
        category: &str,
        chosen_value: &str,
        elapsed_seconds: f64,
        available_options: &[String],
    );

    /// A discrete gameplay event.
    fn log_event(
        &self,
        event_id: &str,
        description: &str,
        classification: &str,
        extra_fields: Option<&serde_json::Value>,
    );

    /// A UI interaction.
    fn log_ui_interaction(&self, element_id: &str, action: &str, duration: Option<f64>);
}

/// Dialogue/visual front-end of the companion.
pub trait CompanionPresence {
    /// Play a dialogue line by id.
    fn trigger_dialogue(&self, dialogue_id: &str);

    /// Comment on the zone the player just entered.
    fn trigger_contextual_comment(&self, zone_id: &str);

    /// React to a solved (or failed) puzzle.
    fn react_to_puzzle_completion(&self, puzzle_type: &str, success: bool);
}

/// Ship resource meters.
pub trait SystemsState {
    /// Add the given deltas to the meters.
    fn apply_deltas(&mut self, deltas: &ResourceDeltas);
}

/// Handles to the optional collaborators, shared by the hub and its missions.
#[derive(Clone, Default)]
pub struct Collaborators {
    analytics: Option<Rc<dyn AnalyticsSink>>,
    companion: Option<Rc<dyn CompanionPresence>>,
}

impl Collaborators {
    /// No collaborators attached.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Attach an analytics sink.
    #[must_use]
    pub fn with_analytics(mut self, sink: Rc<dyn AnalyticsSink>) -> Self {
        self.analytics = Some(sink);
        self
    }

    /// Attach a companion front-end.
    #[must_use]
    pub fn with_companion(mut self, companion: Rc<dyn CompanionPresence>) -> Self {
        self.companion = Some(companion);
        self
    }

    /// Run `f` against the analytics sink if one is attached.
    pub fn analytics(&self, f: impl FnOnce(&dyn AnalyticsSink)) {
        if let Some(sink) = &self.analytics {
            f(sink.as_ref());
        }
    }

    /// Run `f` against the companion if one is attached.
    pub fn companion(&self, f: impl FnOnce(&dyn CompanionPresence)) {
        if let Some(companion) = &self.companion {
            f(companion.as_ref());
        }
    }
}

impl fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collaborators")
            .field("analytics", &self.analytics.is_some())
            .field("companion", &self.companion.is_some())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Ship Systems
// ---------------------------------------------------------------------------

/// Upper bound of every ship meter.
pub const METER_MAX: f32 = 100.0;

/// Default [`SystemsState`]: four meters clamped to `[0, 100]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ShipSystems {
    /// Crew morale.
    pub morale: f32,
    /// Ship power.
    pub power: f32,
    /// Population.
    pub population: f32,
    /// Colony progress.
    pub colony_progress: f32,
}

impl Default for ShipSystems {
    fn default() -> Self {
        Self {
            morale: 50.0,
            power: 50.0,
            population: 50.0,
            colony_progress: 0.0,
        }
    }
}

impl SystemsState for ShipSystems {
    fn apply_deltas(&mut self, deltas: &ResourceDeltas) {
        let bump = |meter: &mut f32, delta: f32| *meter = (*meter + delta).clamp(0.0, METER_MAX);
        bump(&mut self.morale, deltas.morale);
        bump(&mut self.power, deltas.power);
        bump(&mut self.population, deltas.population);
        bump(&mut self.colony_progress, deltas.colony_progress);
    }
}

// ---------------------------------------------------------------------------
// Recording collaborators
// ---------------------------------------------------------------------------

/// One record captured by [`RecordingAnalytics`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnalyticsRecord {
    /// See [`AnalyticsSink::log_decision`].
    Decision {
        /// Decision category.
        category: String,
        /// Value chosen.
        chosen_value: String,
        /// Seconds the player took.
        elapsed_seconds: f64,
        /// Options offered.
        available_options: Vec<String>,
        /// When the record was taken.
        recorded_at: DateTime<Utc>,
    },
    /// See [`AnalyticsSink::log_event`].
    Event {
        /// Event identifier.
        event_id: String,
        /// Human-readable description.
        description: String,
        /// Classification tag.
        classification: String,
        /// Extra structured fields.
        extra_fields: Option<serde_json::Value>,
        /// When the record was taken.
        recorded_at: DateTime<Utc>,
    },
    /// See [`AnalyticsSink::log_ui_interaction`].
    UiInteraction {
        /// UI element.
        element_id: String,
        /// Action performed.
        action: String,
        /// How long the interaction lasted.
        duration: Option<f64>,
        /// When the record was taken.
        recorded_at: DateTime<Utc>,
    },
}

impl AnalyticsRecord {
    /// Event id for `Event` records.
    #[must_use]
    pub fn event_id(&self) -> Option<&str> {
        match self {
            Self::Event { event_id, .. } => Some(event_id),
            _ => None,
        }
    }
}

/// Analytics sink that keeps every record in memory.
#[derive(Debug, Default)]
pub struct RecordingAnalytics {
    records: RefCell<Vec<AnalyticsRecord>>,
}

impl RecordingAnalytics {
    /// Create an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of every record so far.
    #[must_use]
    pub fn records(&self) -> Vec<AnalyticsRecord> {
        self.records.borrow().clone()
    }

    /// Ids of every `Event` record so far, in order.
    #[must_use]
    pub fn event_ids(&self) -> Vec<String> {
        self.records
            .borrow()
            .iter()
            .filter_map(AnalyticsRecord::event_id)
            .map(str::to_string)
            .collect()
    }
}

impl AnalyticsSink for RecordingAnalytics {
    fn log_decision(
        &self,
        category: &str,
        chosen_value: &str,
        elapsed_seconds: f64,
        available_options: &[String],
    ) {
        self.records.borrow_mut().push(AnalyticsRecord::Decision {
            category: category.to_string(),
            chosen_value: chosen_value.to_string(),
            elapsed_seconds,
            available_options: available_options.to_vec(),
            recorded_at: Utc::now(),
        });
    }

    fn log_event(
        &self,
        event_id: &str,
        description: &str,
        classification: &str,
        extra_fields: Option<&serde_json::Value>,
    ) {
        self.records.borrow_mut().push(AnalyticsRecord::Event {
            event_id: event_id.to_string(),
            description: description.to_string(),
            classification: classification.to_string(),
            extra_fields: extra_fields.cloned(),
            recorded_at: Utc::now(),
        });
    }

    fn log_ui_interaction(&self, element_id: &str, action: &str, duration: Option<f64>) {
        self.records.borrow_mut().push(AnalyticsRecord::UiInteraction {
            element_id: element_id.to_string(),
            action: action.to_string(),
            duration,
            recorded_at: Utc::now(),
        });
    }
}

/// A call captured by [`RecordingCompanion`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompanionCall {
    /// `trigger_dialogue`.
    Dialogue(String),
    /// `trigger_contextual_comment`.
    Comment(String),
    /// `react_to_puzzle_completion`.
    PuzzleReaction {
        /// Puzzle solved.
        puzzle_type: String,
        /// Whether it was solved successfully.
        success: bool,
    },
}

/// Companion front-end that records every call.
#[derive(Debug, Default)]
pub struct RecordingCompanion {
    calls: RefCell<Vec<CompanionCall>>,
}

impl RecordingCompanion {
    /// Create an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of every call so far.
    #[must_use]
    pub fn calls(&self) -> Vec<CompanionCall> {
        self.calls.borrow().clone()
    }

    /// Dialogue ids triggered so far, in order.
    #[must_use]
    pub fn dialogues(&self) -> Vec<String> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|c| match c {
                CompanionCall::Dialogue(id) => Some(id.clone()),
                _ => None,
            })
            .collect()
    }
}

impl CompanionPresence for RecordingCompanion {
    fn trigger_dialogue(&self, dialogue_id: &str) {
        self.calls
            .borrow_mut()
            .push(CompanionCall::Dialogue(dialogue_id.to_string()));
    }

    fn trigger_contextual_comment(&self, zone_id: &str) {
        self.calls
            .borrow_mut()
            .push(CompanionCall::Comment(zone_id.to_string()));
    }

    fn react_to_puzzle_completion(&self, puzzle_type: &str, success: bool) {
        self.calls.borrow_mut().push(CompanionCall::PuzzleReaction {
            puzzle_type: puzzle_type.to_string(),
            success,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ship_meters_are_clamped() {
        let mut ship = ShipSystems::default();
        ship.apply_deltas(&ResourceDeltas {
            morale: 80.0,
            power: -70.0,
            population: 5.0,
            colony_progress: 12.5,
        });
        assert_eq!(ship.morale, 100.0);
        assert_eq!(ship.power, 0.0);
        assert_eq!(ship.population, 55.0);
        assert_eq!(ship.colony_progress, 12.5);
    }

    #[test]
    fn absent_collaborators_skip_calls() {
        let collaborators = Collaborators::none();
        let mut called = false;
        collaborators.analytics(|_| called = true);
        collaborators.companion(|_| called = true);
        assert!(!called);
    }

    #[test]
    fn attached_collaborators_receive_calls() {
        let analytics = Rc::new(RecordingAnalytics::new());
        let companion = Rc::new(RecordingCompanion::new());
        let collaborators = Collaborators::none()
            .with_analytics(analytics.clone())
            .with_companion(companion.clone());

        collaborators.analytics(|a| a.log_event("zone_explored", "atrium", "exploration", None));
        collaborators.companion(|c| c.trigger_dialogue("hello"));

        assert_eq!(analytics.event_ids(), vec!["zone_explored".to_string()]);
        assert_eq!(companion.dialogues(), vec!["hello".to_string()]);
    }

    #[test]
    fn records_serialize_with_kind_tag() {
        let analytics = RecordingAnalytics::new();
        analytics.log_ui_interaction("results_panel", "open", Some(1.5));
        let json = serde_json::to_value(&analytics.records()[0]).unwrap();
        assert_eq!(json["kind"], "ui_interaction");
        assert_eq!(json["element_id"], "results_panel");
    }
}
