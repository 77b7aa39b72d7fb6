//! `expedition-sim`: play a mission end to end and print its report.
//!
//! # Startup Sequence
//!
//! 1. Parse arguments
//! 2. Load the catalog (file argument or the built-in default)
//! 3. Initialize structured logging (tracing)
//! 4. Build the hub with tracing-backed collaborators
//! 5. Play the mission with a seeded player
//! 6. Print the `MissionReport` as JSON

use std::path::PathBuf;
use std::rc::Rc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::info;
use tracing_subscriber::EnvFilter;

use expedition_core::config::PacingConfig;
use expedition_core::{Collaborators, ExpeditionConfig, HubOrchestrator};
use expedition_host::sim::{self, DEFAULT_CATALOG};
use expedition_host::telemetry::{TracingAnalytics, TracingCompanion};

#[derive(Parser)]
#[command(name = "expedition-sim")]
#[command(about = "Play an expedition mission with a seeded simulated player")]
#[command(version)]
struct Cli {
    /// Catalog TOML file (defaults to the built-in catalog)
    config: Option<PathBuf>,

    /// Mission to play (defaults to the first mission in the catalog)
    #[arg(short, long)]
    mission: Option<String>,

    /// Seed for the simulated player
    #[arg(short, long, default_value_t = 2024)]
    seed: u64,

    /// Milliseconds the player waits before pressing "continue"
    #[arg(long, default_value_t = 800)]
    advance_ms: u64,

    /// Skip every pause (briefing, ceremony, post-mission)
    #[arg(long)]
    instant: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,

    /// Print engine counters in Prometheus text format to stderr
    #[arg(long)]
    metrics: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => ExpeditionConfig::from_file(path)
            .with_context(|| format!("loading catalog from {}", path.display()))?,
        None => ExpeditionConfig::from_toml(DEFAULT_CATALOG).context("parsing built-in catalog")?,
    };
    if cli.instant {
        config.pacing = PacingConfig {
            briefing_delay_ms: 0,
            ceremony_delay_ms: 0,
            post_mission_pause_ms: 0,
        };
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));
    if cli.json_logs {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).with_target(true).init();
    }

    let mission_id = match cli.mission {
        Some(id) => id,
        None => config
            .missions
            .first()
            .map(|m| m.id.to_string())
            .context("catalog has no missions")?,
    };
    info!(
        mission = %mission_id,
        seed = cli.seed,
        catalog = config.missions.len(),
        "expedition-sim starting"
    );

    let collaborators = Collaborators::none()
        .with_analytics(Rc::new(TracingAnalytics))
        .with_companion(Rc::new(TracingCompanion));
    let mut hub = HubOrchestrator::new(&config, collaborators);
    let _systems = hub.on_systems_updated(|deltas| {
        info!(
            morale = deltas.morale,
            power = deltas.power,
            population = deltas.population,
            colony = deltas.colony_progress,
            "Ship systems updated"
        );
    });

    let mut rng = StdRng::seed_from_u64(cli.seed);
    let advance_after = if cli.instant {
        Duration::ZERO
    } else {
        Duration::from_millis(cli.advance_ms)
    };
    let report = sim::play_mission(&mut hub, &mission_id, &mut rng, advance_after).await?;

    info!(
        systems = ?hub.systems(),
        personality = ?hub.personality(),
        counters = ?hub.counters().snapshot(),
        "Session state"
    );
    if cli.metrics {
        eprint!("{}", hub.counters().snapshot().to_prometheus());
    }
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
