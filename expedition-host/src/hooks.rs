//! Hooks for the presentation layer.
//!
//! Triggers, puzzle widgets and dialogue panels call these to turn raw UI
//! signals into [`PlayerEvent`]s for the pump.

use std::time::Duration;

use expedition_core::{ChoiceType, PlayerChoice, PuzzleOutcome};

use crate::events::PlayerEvent;

/// A zone trigger fired.
#[must_use]
pub fn on_zone_trigger(zone: impl Into<String>) -> PlayerEvent {
    PlayerEvent::ZoneEntered { zone: zone.into() }
}

/// A puzzle widget reported success.
#[must_use]
pub fn on_puzzle_solved(
    puzzle: impl Into<String>,
    attempts: u32,
    hints_used: u32,
    solve_seconds: f64,
) -> PlayerEvent {
    PlayerEvent::PuzzleSolved {
        puzzle: puzzle.into(),
        outcome: PuzzleOutcome {
            attempts: attempts.max(1),
            hints_used,
            solve_seconds: solve_seconds.max(0.0),
        },
    }
}

/// The dialogue panel closed on an option.
///
/// `label` is the option's classification tag as authored in the dialogue
/// data (`"empathetic"`, `"logical"`, `"creative"`, or anything else).
#[must_use]
pub fn on_dialogue_choice(
    category: impl Into<String>,
    label: &str,
    context: impl Into<String>,
    elapsed_seconds: f64,
    options: Vec<String>,
) -> PlayerEvent {
    PlayerEvent::Decision {
        category: category.into(),
        choice: PlayerChoice::new(ChoiceType::from_label(label), context),
        elapsed_seconds,
        options,
    }
}

/// The companion's suggestion was answered.
#[must_use]
pub fn on_suggestion_answered(accepted: bool) -> PlayerEvent {
    PlayerEvent::CompanionSuggestion { accepted }
}

/// The frame clock advanced.
#[must_use]
pub fn on_frame(elapsed: Duration) -> PlayerEvent {
    PlayerEvent::ClockTick { elapsed }
}
