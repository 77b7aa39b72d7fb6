//! # Expedition Core Library
//!
//! Engine-agnostic mission progression and player-model engine for
//! narrative expeditions.
//!
//! A hub ([`HubOrchestrator`]) launches timed missions. Each mission is a
//! [`MissionStateMachine`] that walks through a fixed lifecycle:
//!
//! ```text
//! NotStarted → Briefing → Exploring → VaultUnlocked → ArtifactRecovered → Completed
//! ```
//!
//! When the artifact is recovered the machine produces a single
//! [`MissionResultsSnapshot`]. The hub applies it to the ship systems and to
//! the companion's [`PersonalityModel`], and the [`results`] module derives a
//! score and a tendency profile from it.
//!
//! ## Failure model
//!
//! Nothing in this crate is fatal during play. Gameplay operations return an
//! [`Outcome`] instead of an error: out-of-order input from the presentation
//! layer is rejected as a no-op, duplicate signals are ignored. Only
//! configuration loading returns [`EngineError`].

#![deny(clippy::unwrap_used)]
#![deny(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod collaborators;
pub mod config;
pub mod dialogue;
pub mod error;
pub mod hub;
pub mod metrics;
pub mod mission;
pub mod observer;
pub mod personality;
pub mod results;
pub mod sequence;
pub mod types;

pub use collaborators::{AnalyticsSink, Collaborators, CompanionPresence, ShipSystems, SystemsState};
pub use config::ExpeditionConfig;
pub use error::{EngineError, Outcome, Rejection};
pub use hub::HubOrchestrator;
pub use mission::{MissionState, MissionStateMachine};
pub use personality::{PersonalityModel, PersonalityState};
pub use results::MissionReport;
pub use types::*;
