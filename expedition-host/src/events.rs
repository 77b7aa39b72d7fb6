//! Player events that drive a mission.
//!
//! The presentation layer (triggers, puzzle widgets, dialogue UI) reports
//! what the player did as [`PlayerEvent`]s. They are queued in the
//! [`EventPump`](crate::systems::EventPump) and applied to the active
//! mission in arrival order.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use expedition_core::{PlayerChoice, PuzzleOutcome};

/// Something the player did during a mission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PlayerEvent {
    /// Player walked into a zone trigger.
    ZoneEntered {
        zone: String,
    },

    /// Player solved a puzzle.
    PuzzleSolved {
        puzzle: String,
        #[serde(default)]
        outcome: PuzzleOutcome,
    },

    /// Player picked a dialogue or story option.
    Decision {
        category: String,
        choice: PlayerChoice,
        elapsed_seconds: f64,
        #[serde(default)]
        options: Vec<String>,
    },

    /// Player asked for a hint.
    HintUsed,

    /// Player made a mistake outside a puzzle attempt.
    Mistake,

    /// Companion offered a suggestion.
    CompanionSuggestion {
        accepted: bool,
    },

    /// Player touched the artifact pedestal.
    ArtifactTouched,

    /// Mission time passed.
    ClockTick {
        #[serde(with = "millis")]
        elapsed: Duration,
    },
}

impl PlayerEvent {
    /// Short name used in logs.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ZoneEntered { .. } => "zone_entered",
            Self::PuzzleSolved { .. } => "puzzle_solved",
            Self::Decision { .. } => "decision",
            Self::HintUsed => "hint_used",
            Self::Mistake => "mistake",
            Self::CompanionSuggestion { .. } => "companion_suggestion",
            Self::ArtifactTouched => "artifact_touched",
            Self::ClockTick { .. } => "clock_tick",
        }
    }

    /// Whether this event changes progress rather than just time.
    #[must_use]
    pub fn is_progress(&self) -> bool {
        !matches!(self, Self::ClockTick { .. })
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    #[allow(clippy::cast_possible_truncation)]
    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use expedition_core::ChoiceType;

    #[test]
    fn events_deserialize_from_tagged_json() {
        let json = r#"[
            {"event": "zone_entered", "zone": "atrium"},
            {"event": "puzzle_solved", "puzzle": "chrono"},
            {"event": "decision", "category": "door",
             "choice": {"choice_type": "logical", "context": "decode"},
             "elapsed_seconds": 2.5},
            {"event": "clock_tick", "elapsed": 1500},
            {"event": "artifact_touched"}
        ]"#;
        let events: Vec<PlayerEvent> = serde_json::from_str(json).unwrap();
        assert_eq!(events.len(), 5);
        assert_eq!(
            events[1],
            PlayerEvent::PuzzleSolved {
                puzzle: "chrono".to_string(),
                outcome: PuzzleOutcome::default(),
            }
        );
        match &events[2] {
            PlayerEvent::Decision { choice, options, .. } => {
                assert_eq!(choice.choice_type, ChoiceType::Logical);
                assert!(options.is_empty());
            }
            other => panic!("unexpected event {other:?}"),
        }
        assert_eq!(
            events[3],
            PlayerEvent::ClockTick {
                elapsed: Duration::from_millis(1500)
            }
        );
        assert!(!events[3].is_progress());
        assert_eq!(events[4].kind(), "artifact_touched");
    }
}
