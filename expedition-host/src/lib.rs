//! # expedition-host: Host Integration for the Expedition Engine
//!
//! This crate sits between a presentation layer (scenes, triggers,
//! dialogue UI) and the engine-agnostic `expedition-core` library.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │           Presentation layer             │
//! │  ┌────────────────────────────────────┐  │
//! │  │        expedition-host             │  │
//! │  │  ┌───────────┐   ┌──────────────┐  │  │
//! │  │  │  hooks →  │   │   runner     │  │  │
//! │  │  │  events → │   │ (tokio time, │  │  │
//! │  │  │  pump     │   │  advance,    │  │  │
//! │  │  └─────┬─────┘   │  cancel)     │  │  │
//! │  │        │         └──────┬───────┘  │  │
//! │  │        ▼                ▼          │  │
//! │  │   ┌────────────────────────────┐   │  │
//! │  │   │      expedition-core       │   │  │
//! │  │   └────────────────────────────┘   │  │
//! │  └────────────────────────────────────┘  │
//! └──────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - `events`: player event types
//! - `hooks`: constructors for presentation-layer signals
//! - `systems`: the event pump and the cue executor
//! - `runner`: async driver for cooperative sequences
//! - `telemetry`: `tracing`-backed collaborators
//! - `sim`: seeded end-to-end playthroughs

#![deny(clippy::unwrap_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod events;
pub mod hooks;
pub mod runner;
pub mod sim;
pub mod systems;
pub mod telemetry;
