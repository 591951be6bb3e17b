mod config;
mod dcf77;
mod error;
mod receiver;
mod sync;

use std::sync::Arc;

use anyhow::Result;
use chrono::Local;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use config::Config;
use receiver::{SimulatedReceiver, SystemClock};
use sync::Synchronizer;

fn main() -> Result<()> {
    // Initialize logging; RUST_LOG overrides the default level
    FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    info!("===========================================");
    info!("   DCF77 Time Signal Synchronizer");
    info!("===========================================");

    let config = Config::from_env();
    info!("Configuration:");
    info!("  Max attempts: {}", config.max_attempts);
    info!("  Time scale: {}x", config.sim_time_scale);
    info!("  Join second: {}", config.sim_start_second);
    info!("  Pulse jitter: +/-{} ms", config.sim_pulse_jitter_ms);

    let clock = Arc::new(SystemClock::accelerated(config.sim_time_scale));
    let receiver = SimulatedReceiver::new(
        clock.clone(),
        config.sim_start_second,
        config.sim_pulse_jitter_ms,
    );
    let mut synchronizer = Synchronizer::new(receiver, clock);

    for attempt in 1..=config.max_attempts {
        info!("Synchronization attempt {}/{}", attempt, config.max_attempts);
        match synchronizer.synchronize() {
            Ok(time) => {
                info!("===========================================");
                info!("  Received time: {}", time);
                info!(
                    "  System clock:  {}",
                    Local::now().format("%a %d.%m.%Y %H:%M:%S")
                );
                info!("===========================================");
                info!("[Stats] {}", synchronizer.stats());
                return Ok(());
            }
            Err(e) => warn!("Attempt {} failed: {}", attempt, e),
        }
    }

    info!("[Stats] {}", synchronizer.stats());
    anyhow::bail!("no valid time signal after {} attempts", config.max_attempts)
}
