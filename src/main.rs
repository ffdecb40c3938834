//! nav-session: scenario replay for the navigation session core
//!
//! Loads a scenario file, runs a session with logging collaborators and
//! prints every outward navigation event as a JSON line on stdout. Logs go
//! to stderr.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::broadcast;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use nav_session::lifecycle::ShutdownSignal;
use nav_session::location::SimulationMode;
use nav_session::replay::{Replay, Scenario};
use nav_session::{NavigationEvent, SessionConfig};

#[derive(Parser, Debug)]
#[command(name = "nav-session")]
#[command(version, about = "Replay a navigation scenario and print session events as JSON lines")]
struct Args {
    /// Scenario file (route, config overrides and timed script)
    scenario: PathBuf,

    /// Simulation mode, overriding the scenario: on_poor_signal, always or never
    #[arg(long)]
    mode: Option<SimulationMode>,

    /// Simulation speed multiplier, overriding the scenario
    #[arg(long)]
    speed: Option<f64>,

    /// Poor signal patience in milliseconds, overriding the scenario
    #[arg(long = "patience-ms")]
    patience_ms: Option<u64>,
}

impl Args {
    /// Command line values win over the scenario's own overrides
    fn apply_to(&self, scenario: &mut Scenario) {
        let overrides = &mut scenario.config;
        if let Some(mode) = self.mode {
            overrides.simulation_mode = Some(mode);
        }
        if let Some(speed) = self.speed {
            overrides.simulation_speed_multiplier = Some(speed);
        }
        if let Some(ms) = self.patience_ms {
            overrides.poor_signal_patience_ms = Some(ms);
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "nav-session starting");

    let args = Args::parse();
    let path = &args.scenario;

    let mut scenario = Scenario::load(path)
        .with_context(|| format!("failed to load scenario {}", path.display()))?;
    args.apply_to(&mut scenario);
    info!(
        path = %path.display(),
        steps = scenario.script.len(),
        "scenario loaded"
    );

    let config = SessionConfig::load().context("invalid session configuration")?;
    info!(?config, "configuration loaded");

    let mut shutdown = ShutdownSignal::register().context("failed to register signal handlers")?;

    let replay = Replay::new(scenario, config).context("failed to build navigation session")?;
    let (session, player) = replay.into_parts();
    let mut events = player.handle().subscribe();

    let session_task = tokio::spawn(session.run());

    // Print outward events until the session drops its sender
    let printer = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => print_event(&event),
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!(skipped = n, "event printer lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    tokio::select! {
        result = player.play() => {
            if let Err(e) = result {
                error!(error = %e, "script aborted");
            }
        }

        signal = shutdown.wait() => {
            info!(signal, "shutdown signal received");
        }
    }

    // Cleanup
    info!("shutting down...");

    if let Err(e) = player.handle().shutdown().await {
        warn!(error = %e, "session already ended");
    }
    drop(player);
    session_task.await.context("session task panicked")?;
    printer.await.context("event printer panicked")?;

    info!("nav-session stopped");

    Ok(())
}

fn print_event(event: &NavigationEvent) {
    match serde_json::to_string(event) {
        Ok(line) => println!("{line}"),
        Err(e) => error!(error = %e, %event, "failed to encode event"),
    }
}
