//! Runtime counters and span names.
//!
//! All engine operations emit `tracing` events. This module adds
//! lightweight counters that can be read at runtime or exported as
//! Prometheus text for dashboards.

use std::sync::atomic::{AtomicU64, Ordering};

/// Atomic counters for engine events.
///
/// The hub records mission lifecycle counts itself. Per-event counts
/// (zones, puzzles, duplicates, rejections) are recorded by whoever routes
/// events into a [`MissionStateMachine`](crate::MissionStateMachine), normally
/// the host's event pump; calls made directly on the machine are not counted.
#[derive(Debug)]
pub struct EngineCounters {
    /// Missions started.
    pub missions_started: AtomicU64,
    /// Missions completed and applied at the hub.
    pub missions_completed: AtomicU64,
    /// Missions abandoned before completion.
    pub missions_abandoned: AtomicU64,
    /// Zones explored for the first time.
    pub zones_explored: AtomicU64,
    /// Puzzles completed for the first time.
    pub puzzles_completed: AtomicU64,
    /// Repeated zone/puzzle signals ignored.
    pub duplicate_events: AtomicU64,
    /// Out-of-order operations rejected.
    pub rejected_events: AtomicU64,
    /// Personality interactions applied.
    pub interactions_applied: AtomicU64,
}

impl EngineCounters {
    /// Create a new set of zeroed counters.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            missions_started: AtomicU64::new(0),
            missions_completed: AtomicU64::new(0),
            missions_abandoned: AtomicU64::new(0),
            zones_explored: AtomicU64::new(0),
            puzzles_completed: AtomicU64::new(0),
            duplicate_events: AtomicU64::new(0),
            rejected_events: AtomicU64::new(0),
            interactions_applied: AtomicU64::new(0),
        }
    }

    /// Increment a counter by one.
    pub fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Count an operation outcome as duplicate or rejected where applicable.
    pub fn record_outcome(&self, outcome: &crate::error::Outcome) {
        match outcome {
            crate::error::Outcome::Applied => {}
            crate::error::Outcome::Duplicate => Self::bump(&self.duplicate_events),
            crate::error::Outcome::Rejected(_) => Self::bump(&self.rejected_events),
        }
    }

    /// Snapshot all counters for export.
    #[must_use]
    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            missions_started: self.missions_started.load(Ordering::Relaxed),
            missions_completed: self.missions_completed.load(Ordering::Relaxed),
            missions_abandoned: self.missions_abandoned.load(Ordering::Relaxed),
            zones_explored: self.zones_explored.load(Ordering::Relaxed),
            puzzles_completed: self.puzzles_completed.load(Ordering::Relaxed),
            duplicate_events: self.duplicate_events.load(Ordering::Relaxed),
            rejected_events: self.rejected_events.load(Ordering::Relaxed),
            interactions_applied: self.interactions_applied.load(Ordering::Relaxed),
        }
    }
}

impl Default for EngineCounters {
    fn default() -> Self {
        Self::new()
    }
}

/// A snapshot of counter values at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterSnapshot {
    /// Missions started.
    pub missions_started: u64,
    /// Missions completed.
    pub missions_completed: u64,
    /// Missions abandoned.
    pub missions_abandoned: u64,
    /// Zones explored.
    pub zones_explored: u64,
    /// Puzzles completed.
    pub puzzles_completed: u64,
    /// Duplicate signals ignored.
    pub duplicate_events: u64,
    /// Operations rejected.
    pub rejected_events: u64,
    /// Personality interactions applied.
    pub interactions_applied: u64,
}

impl CounterSnapshot {
    /// Format as Prometheus-compatible text.
    #[must_use]
    pub fn to_prometheus(&self) -> String {
        let rows = [
            ("expedition_missions_started_total", "Missions started", self.missions_started),
            ("expedition_missions_completed_total", "Missions completed", self.missions_completed),
            ("expedition_missions_abandoned_total", "Missions abandoned", self.missions_abandoned),
            ("expedition_zones_explored_total", "Zones explored", self.zones_explored),
            ("expedition_puzzles_completed_total", "Puzzles completed", self.puzzles_completed),
            ("expedition_duplicate_events_total", "Duplicate signals ignored", self.duplicate_events),
            ("expedition_rejected_events_total", "Out-of-order operations rejected", self.rejected_events),
            ("expedition_interactions_applied_total", "Personality interactions applied", self.interactions_applied),
        ];

        let mut out = String::new();
        for (name, help, value) in rows {
            out.push_str(&format!(
                "# HELP {name} {help}\n# TYPE {name} counter\n{name} {value}\n"
            ));
        }
        out
    }
}

// ---------------------------------------------------------------------------
// Tracing Span Names
// ---------------------------------------------------------------------------

/// Span names used with `tracing::span!`.
pub mod spans {
    /// A mission run, from start to completion or abandonment.
    pub const MISSION_RUN: &str = "expedition::mission";
    /// Applying a results snapshot at the hub.
    pub const COMPLETE_MISSION: &str = "expedition::hub::complete";
    /// Results evaluation.
    pub const EVALUATE: &str = "expedition::results::evaluate";
    /// Draining queued player events.
    pub const EVENT_PUMP: &str = "expedition::pump";
}
