//! Headless driver: builds a world, ticks it on a timer and prints a
//! summary when done.

mod config;
mod telemetry;

use anyhow::Result;
use config::CliConfig;
use savanna_world::World;
use std::path::PathBuf;
use tokio::signal;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    telemetry::init_telemetry()?;

    let config = match std::env::args().nth(1).map(PathBuf::from) {
        Some(path) => {
            info!(path = %path.display(), "Loading configuration");
            CliConfig::load(&path)?
        }
        None => CliConfig::default(),
    };

    let registry = config.registry()?;
    let mut world = World::with_registry(config.simulation.clone(), registry)?;

    info!(
        depth = world.field().depth(),
        width = world.field().width(),
        population = world.population(),
        max_steps = config.run.max_steps,
        "Starting savanna simulation"
    );

    let mut ticker = interval(Duration::from_millis(config.run.tick_delay_ms.max(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    while world.step_count() < config.run.max_steps {
        if config.run.stop_when_unviable && !world.is_viable() {
            info!(step = world.step_count(), "Fewer than two species left, stopping");
            break;
        }

        tokio::select! {
            _ = ticker.tick() => {
                world.step();
                debug!(
                    step = world.step_count(),
                    population = world.population(),
                    time = world.clock().describe(),
                    weather = %world.weather(),
                    "Tick"
                );
            }
            _ = &mut shutdown => {
                warn!(step = world.step_count(), "Interrupted, stopping early");
                break;
            }
        }
    }

    let summary = world.summary();
    info!(
        step = summary.step,
        population = summary.total_population,
        species = %summary.population.describe(),
        disease_deaths = summary.disease_deaths,
        "Simulation finished"
    );
    println!("{}", serde_json::to_string_pretty(&summary)?);

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
