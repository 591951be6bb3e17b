//! Configuration loaded from environment variables

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Synchronization attempts before giving up
    pub max_attempts: u32,
    /// Factor by which the simulated broadcast runs faster than real time
    pub sim_time_scale: u32,
    /// Second of the broadcast minute the simulation joins at
    pub sim_start_second: u32,
    /// Pulse width noise amplitude in simulated milliseconds
    pub sim_pulse_jitter_ms: u32,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            max_attempts: std::env::var("SYNC_MAX_ATTEMPTS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(3),
            sim_time_scale: std::env::var("SIM_TIME_SCALE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(20),
            sim_start_second: std::env::var("SIM_START_SECOND")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(56),
            sim_pulse_jitter_ms: std::env::var("SIM_PULSE_JITTER_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(15),
        }
    }
}
