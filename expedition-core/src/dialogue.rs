//! Companion voice selection.
//!
//! The companion speaks in one of a closed set of tones, picked from which
//! core trait currently dominates.

use serde::{Deserialize, Serialize};

use crate::personality::PersonalityState;

/// Tone variant of a companion dialogue line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToneVariant {
    /// Warm, feeling-first lines.
    Empathetic,
    /// Precise, analytical lines.
    Logical,
    /// Neutral lines.
    #[default]
    Default,
}

impl ToneVariant {
    /// Suffix appended to dialogue ids; empty for the default tone.
    #[must_use]
    pub fn suffix(self) -> &'static str {
        match self {
            Self::Empathetic => "_empathetic",
            Self::Logical => "_logical",
            Self::Default => "",
        }
    }

    /// Dialogue id of `base` in this tone.
    #[must_use]
    pub fn dialogue_id(self, base: &str) -> String {
        format!("{base}{}", self.suffix())
    }
}

/// Pick the tone for the companion's current personality.
#[must_use]
pub fn select_variant(personality: &PersonalityState) -> ToneVariant {
    if personality.empathy_level > personality.logical_core {
        ToneVariant::Empathetic
    } else if personality.logical_core > personality.empathy_level {
        ToneVariant::Logical
    } else {
        ToneVariant::Default
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(empathy: f32, logic: f32) -> PersonalityState {
        PersonalityState {
            logical_core: logic,
            empathy_level: empathy,
            curiosity_level: 0.5,
            trust_level: 0.5,
            total_interactions: 0,
        }
    }

    #[test]
    fn dominant_trait_picks_tone() {
        assert_eq!(select_variant(&state(1.2, 0.4)), ToneVariant::Empathetic);
        assert_eq!(select_variant(&state(0.4, 1.2)), ToneVariant::Logical);
        assert_eq!(select_variant(&state(0.7, 0.7)), ToneVariant::Default);
    }

    #[test]
    fn dialogue_ids_carry_suffix() {
        assert_eq!(ToneVariant::Empathetic.dialogue_id("vault_open"), "vault_open_empathetic");
        assert_eq!(ToneVariant::Logical.dialogue_id("vault_open"), "vault_open_logical");
        assert_eq!(ToneVariant::Default.dialogue_id("vault_open"), "vault_open");
    }
}
