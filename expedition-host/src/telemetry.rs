//! Collaborators that report through `tracing`.
//!
//! Stand-ins for a real analytics backend and companion front-end: every
//! call becomes a structured event on its own target, so it can be routed
//! or filtered with `RUST_LOG` like the rest of the engine's logs.

use tracing::info;

use expedition_core::{AnalyticsSink, CompanionPresence};

/// Analytics sink writing to the `expedition::analytics` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAnalytics;

impl AnalyticsSink for TracingAnalytics {
    fn log_decision(
        &self,
        category: &str,
        chosen_value: &str,
        elapsed_seconds: f64,
        available_options: &[String],
    ) {
        info!(
            target: "expedition::analytics",
            category,
            chosen = chosen_value,
            elapsed_seconds,
            options = ?available_options,
            "Decision"
        );
    }

    fn log_event(
        &self,
        event_id: &str,
        description: &str,
        classification: &str,
        extra_fields: Option<&serde_json::Value>,
    ) {
        match extra_fields {
            Some(extra) => info!(
                target: "expedition::analytics",
                event_id,
                description,
                classification,
                extra = %extra,
                "Event"
            ),
            None => info!(
                target: "expedition::analytics",
                event_id,
                description,
                classification,
                "Event"
            ),
        }
    }

    fn log_ui_interaction(&self, element_id: &str, action: &str, duration: Option<f64>) {
        info!(
            target: "expedition::analytics",
            element_id,
            action,
            duration = ?duration,
            "UI interaction"
        );
    }
}

/// Companion front-end writing to the `expedition::companion` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingCompanion;

impl CompanionPresence for TracingCompanion {
    fn trigger_dialogue(&self, dialogue_id: &str) {
        info!(target: "expedition::companion", dialogue = dialogue_id, "Companion speaks");
    }

    fn trigger_contextual_comment(&self, zone_id: &str) {
        info!(target: "expedition::companion", zone = zone_id, "Companion comments");
    }

    fn react_to_puzzle_completion(&self, puzzle_type: &str, success: bool) {
        info!(
            target: "expedition::companion",
            puzzle = puzzle_type,
            success,
            "Companion reacts"
        );
    }
}
