//! Results evaluation — score and player-tendency classification.
//!
//! Everything here is a pure function of a [`MissionResultsSnapshot`].
//!
//! ## Score
//!
//! | term | weight |
//! |---|---|
//! | success | 50 |
//! | artifact recovered | 30 |
//! | puzzle completion ratio | 20 |
//! | time bonus `clamp01(1 − t/3600)` | 10 |
//! | accuracy | 10 |
//! | hints used | −2 each |
//! | mistakes made | −1 each |
//! | engagement | 10 |
//!
//! Intermediate sums may leave `[0, 100]`; only the final value is clamped.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, debug_span};

use crate::metrics::spans;
use crate::types::{clamp01, MissionId, MissionResultsSnapshot, RunId};

/// Seconds after which the time bonus reaches zero.
pub const TIME_BONUS_HORIZON_SECS: f64 = 3600.0;

const EMPATHETIC_SHARE: f64 = 40.0;
const LOGICAL_SHARE: f64 = 40.0;
const CREATIVE_SHARE: f64 = 30.0;
const EXPLORATIVE_EFFICIENCY: f32 = 0.7;
const COLLABORATIVE_SCORE: f32 = 0.6;
const CAUTIOUS_DECISION_SECS: f32 = 5.0;
const CONFIDENT_LEVEL: f32 = 0.7;

/// Mission score in `[0, 100]`.
#[must_use]
pub fn score(snapshot: &MissionResultsSnapshot) -> f64 {
    let perf = &snapshot.performance;
    let flag = |b: bool| if b { 1.0 } else { 0.0 };

    let completion_ratio = if snapshot.total_puzzles == 0 {
        0.0
    } else {
        f64::from(snapshot.puzzles_completed) / f64::from(snapshot.total_puzzles)
    };
    let time_bonus = clamp01(1.0 - snapshot.completion_time / TIME_BONUS_HORIZON_SECS);

    let raw = 50.0 * flag(snapshot.success)
        + 30.0 * flag(snapshot.artifact_recovered)
        + 20.0 * completion_ratio
        + 10.0 * time_bonus
        + 10.0 * f64::from(perf.accuracy_rate)
        - 2.0 * f64::from(perf.hints_used)
        - f64::from(perf.mistakes_made)
        + 10.0 * f64::from(perf.engagement_level);

    if raw.is_nan() { 0.0 } else { raw.clamp(0.0, 100.0) }
}

/// Share of each choice label as a percentage. Empty when there are no choices.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn choice_type_percentages(snapshot: &MissionResultsSnapshot) -> BTreeMap<String, f64> {
    let total = snapshot.choices.len();
    if total == 0 {
        return BTreeMap::new();
    }

    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for choice in &snapshot.choices {
        *counts.entry(choice.choice_type.label().to_string()).or_default() += 1;
    }
    counts
        .into_iter()
        .map(|(label, count)| (label, count as f64 * 100.0 / total as f64))
        .collect()
}

/// Independent behavioural predicates over a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct TendencyProfile {
    /// More than 40% empathetic choices.
    pub empathetic: bool,
    /// More than 40% logical choices.
    pub logical: bool,
    /// More than 30% creative choices.
    pub creative: bool,
    /// Systematic approach was observed.
    pub methodical: bool,
    /// Exploration efficiency below 0.7.
    pub explorative: bool,
    /// Collaboration score above 0.6.
    pub collaborative: bool,
    /// Average decision time above five seconds.
    pub cautious: bool,
    /// Confidence above 0.7.
    pub confident: bool,
}

/// Single dominant label derived from a [`TendencyProfile`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrimaryTendency {
    /// Empathetic dominates.
    Empathetic,
    /// Logical dominates.
    Logical,
    /// Creative dominates.
    Creative,
    /// Methodical dominates.
    Methodical,
    /// No dominant tendency.
    Balanced,
}

impl fmt::Display for PrimaryTendency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Empathetic => "Empathetic",
            Self::Logical => "Logical",
            Self::Creative => "Creative",
            Self::Methodical => "Methodical",
            Self::Balanced => "Balanced",
        })
    }
}

impl TendencyProfile {
    /// Fixed-priority pick: empathetic, logical, creative, methodical, else balanced.
    #[must_use]
    pub fn primary(&self) -> PrimaryTendency {
        if self.empathetic {
            PrimaryTendency::Empathetic
        } else if self.logical {
            PrimaryTendency::Logical
        } else if self.creative {
            PrimaryTendency::Creative
        } else if self.methodical {
            PrimaryTendency::Methodical
        } else {
            PrimaryTendency::Balanced
        }
    }
}

/// Evaluate every tendency predicate.
#[must_use]
pub fn classify_tendencies(snapshot: &MissionResultsSnapshot) -> TendencyProfile {
    let shares = choice_type_percentages(snapshot);
    let share = |label: &str| shares.get(label).copied().unwrap_or(0.0);
    let perf = &snapshot.performance;

    TendencyProfile {
        empathetic: share("empathetic") > EMPATHETIC_SHARE,
        logical: share("logical") > LOGICAL_SHARE,
        creative: share("creative") > CREATIVE_SHARE,
        methodical: perf.showed_systematic_approach,
        explorative: perf.exploration_efficiency < EXPLORATIVE_EFFICIENCY,
        collaborative: perf.collaboration_score > COLLABORATIVE_SCORE,
        cautious: perf.average_decision_time > CAUTIOUS_DECISION_SECS,
        confident: perf.confidence_level > CONFIDENT_LEVEL,
    }
}

/// Everything the hub shows and reports about a finished mission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissionReport {
    /// Mission evaluated.
    pub mission_id: MissionId,
    /// Run evaluated.
    pub run_id: RunId,
    /// Score in `[0, 100]`.
    pub score: f64,
    /// Choice label shares in percent.
    pub choice_percentages: BTreeMap<String, f64>,
    /// Tendency predicates.
    pub tendencies: TendencyProfile,
    /// Dominant tendency.
    pub primary_tendency: PrimaryTendency,
}

/// Build the full report for a snapshot.
#[must_use]
pub fn evaluate(snapshot: &MissionResultsSnapshot) -> MissionReport {
    let _span = debug_span!(spans::EVALUATE, run = %snapshot.run_id).entered();
    let tendencies = classify_tendencies(snapshot);
    let report = MissionReport {
        mission_id: snapshot.mission_id.clone(),
        run_id: snapshot.run_id,
        score: score(snapshot),
        choice_percentages: choice_type_percentages(snapshot),
        primary_tendency: tendencies.primary(),
        tendencies,
    };
    debug!(
        mission = %report.mission_id,
        score = report.score,
        primary = %report.primary_tendency,
        "Mission evaluated"
    );
    report
}
