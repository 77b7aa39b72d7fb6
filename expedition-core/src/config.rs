//! Configuration for the expedition engine.
//!
//! Maps directly to `expedition.toml`:
//!
//! ```toml
//! [general]
//! log_level = "info"
//!
//! [personality]
//! logical_core = 1.0
//! empathy_level = 0.2
//!
//! [pacing]
//! briefing_delay_ms = 3000
//!
//! [[missions]]
//! id = "archive"
//! puzzles = ["chrono", "cipher", "resonance"]
//! zones = ["atrium", "stacks"]
//! ```

use std::collections::BTreeSet;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::personality::PersonalityState;
use crate::types::MissionDefinition;

/// Top-level configuration, loadable from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExpeditionConfig {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,
    /// Starting personality of the companion.
    #[serde(default)]
    pub personality: PersonalityConfig,
    /// Timing of cooperative sequences.
    #[serde(default)]
    pub pacing: PacingConfig,
    /// Mission catalog.
    #[serde(default)]
    pub missions: Vec<MissionDefinition>,
}

impl ExpeditionConfig {
    /// Load configuration from a TOML string.
    ///
    /// # Errors
    /// Returns `EngineError::Config` if the TOML is invalid, or
    /// `EngineError::InvalidMission` if a mission fails validation.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(toml_str).map_err(|e| EngineError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Validate every mission and reject duplicate mission ids.
    ///
    /// # Errors
    /// Returns the first validation failure.
    pub fn validate(&self) -> Result<()> {
        let mut ids = BTreeSet::new();
        for mission in &self.missions {
            mission.validate()?;
            if !ids.insert(mission.id.as_str()) {
                return Err(EngineError::InvalidMission {
                    mission: mission.id.to_string(),
                    reason: "mission id appears more than once".to_string(),
                });
            }
        }
        Ok(())
    }

    /// Add a mission to the catalog.
    #[must_use]
    pub fn with_mission(mut self, mission: MissionDefinition) -> Self {
        self.missions.push(mission);
        self
    }
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// General system settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

/// Initial companion traits for a new session.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PersonalityConfig {
    /// Starting analytical disposition.
    #[serde(default = "default_1_0")]
    pub logical_core: f32,
    /// Starting emotional attunement.
    #[serde(default = "default_0_2")]
    pub empathy_level: f32,
    /// Starting curiosity.
    #[serde(default = "default_0_5")]
    pub curiosity_level: f32,
    /// Starting trust.
    #[serde(default = "default_0_3")]
    pub trust_level: f32,
}

impl PersonalityConfig {
    /// Build the initial personality state.
    #[must_use]
    pub fn initial_state(&self) -> PersonalityState {
        PersonalityState {
            logical_core: self.logical_core,
            empathy_level: self.empathy_level,
            curiosity_level: self.curiosity_level,
            trust_level: self.trust_level,
            total_interactions: 0,
        }
    }
}

impl Default for PersonalityConfig {
    fn default() -> Self {
        Self {
            logical_core: 1.0,
            empathy_level: 0.2,
            curiosity_level: 0.5,
            trust_level: 0.3,
        }
    }
}

/// Suspension lengths for briefing, vault ceremony and post-mission pipeline.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PacingConfig {
    /// Pause between the briefing intro and the objectives.
    #[serde(default = "default_3000")]
    pub briefing_delay_ms: u64,
    /// Pause after the vault opens before the artifact is announced.
    #[serde(default = "default_2000")]
    pub ceremony_delay_ms: u64,
    /// Pause after the companion's post-mission reaction.
    #[serde(default = "default_2000")]
    pub post_mission_pause_ms: u64,
}

impl PacingConfig {
    /// Briefing pause as a `Duration`.
    #[must_use]
    pub fn briefing_delay(&self) -> Duration {
        Duration::from_millis(self.briefing_delay_ms)
    }

    /// Vault ceremony pause as a `Duration`.
    #[must_use]
    pub fn ceremony_delay(&self) -> Duration {
        Duration::from_millis(self.ceremony_delay_ms)
    }

    /// Post-mission pause as a `Duration`.
    #[must_use]
    pub fn post_mission_pause(&self) -> Duration {
        Duration::from_millis(self.post_mission_pause_ms)
    }
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            briefing_delay_ms: 3000,
            ceremony_delay_ms: 2000,
            post_mission_pause_ms: 2000,
        }
    }
}

// ---------------------------------------------------------------------------
// Serde default helpers
// ---------------------------------------------------------------------------

fn default_log_level() -> String { "info".to_string() }
fn default_0_2() -> f32 { 0.2 }
fn default_0_3() -> f32 { 0.3 }
fn default_0_5() -> f32 { 0.5 }
fn default_1_0() -> f32 { 1.0 }
fn default_2000() -> u64 { 2000 }
fn default_3000() -> u64 { 3000 }

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"
        [general]
        log_level = "debug"

        [personality]
        empathy_level = 0.6

        [pacing]
        briefing_delay_ms = 10

        [[missions]]
        id = "archive"
        puzzles = ["chrono", "cipher", "resonance"]
        zones = ["atrium", "stacks"]

        [missions.rewards]
        experience = 250
        morale = 5.0
        power = 10.0

        [missions.artifact]
        name = "Chrono Lens"
        description = "Bends a second into an hour."
    "#;

    #[test]
    fn parses_full_document() {
        let config = ExpeditionConfig::from_toml(SAMPLE).unwrap();
        assert_eq!(config.general.log_level, "debug");
        assert!((config.personality.empathy_level - 0.6).abs() < f32::EPSILON);
        assert!((config.personality.logical_core - 1.0).abs() < f32::EPSILON);
        assert_eq!(config.pacing.briefing_delay(), Duration::from_millis(10));
        assert_eq!(config.pacing.ceremony_delay_ms, 2000);

        let mission = &config.missions[0];
        assert_eq!(mission.total_puzzles(), 3);
        assert_eq!(mission.rewards.experience, 250);
        assert_eq!(mission.artifact.name, "Chrono Lens");
    }

    #[test]
    fn empty_document_uses_defaults() {
        let config = ExpeditionConfig::from_toml("").unwrap();
        assert_eq!(config.general.log_level, "info");
        assert!(config.missions.is_empty());
        assert_eq!(config.pacing.post_mission_pause_ms, 2000);
    }

    #[test]
    fn rejects_invalid_toml() {
        let err = ExpeditionConfig::from_toml("[general\nlog_level=").unwrap_err();
        assert!(matches!(err, EngineError::Config(_)));
    }

    #[test]
    fn rejects_duplicate_puzzles() {
        let doc = r#"
            [[missions]]
            id = "m"
            puzzles = ["chrono", "chrono"]
        "#;
        let err = ExpeditionConfig::from_toml(doc).unwrap_err();
        assert!(matches!(err, EngineError::InvalidMission { .. }));
    }

    #[test]
    fn rejects_duplicate_mission_ids() {
        let doc = r#"
            [[missions]]
            id = "m"
            [[missions]]
            id = "m"
        "#;
        assert!(ExpeditionConfig::from_toml(doc).is_err());
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        let config = ExpeditionConfig::from_file(file.path()).unwrap();
        assert_eq!(config.missions.len(), 1);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = ExpeditionConfig::from_file(std::path::Path::new("/nonexistent/expedition.toml"))
            .unwrap_err();
        assert!(matches!(err, EngineError::Io(_)));
    }
}
