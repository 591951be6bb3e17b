//! Synchronization control loop
//!
//! Owns a receiver and runs blocking attempts against it: poll the edge
//! latch, classify, assemble, and hand the completed frame to the
//! decoder. One attempt spans at most one watchdog window; the caller
//! decides whether to retry.

use tracing::{debug, info, trace, warn};

use crate::dcf77::{classify, decode, DecodedTime, FrameBuffer, PulseClass, FRAME_END_INDEX};
use crate::error::SyncError;
use crate::receiver::{Clock, EdgeLatch, EdgeSource};

/// Classified pulses allowed before an attempt is abandoned. 300 is
/// about five minutes of signal.
const WATCHDOG_LIMIT: u32 = 300;

/// Polling yield between latch checks.
const POLL_INTERVAL_MS: u32 = 1;

/// Counters over the lifetime of one synchronizer.
#[derive(Debug, Default, Clone)]
pub struct SyncStats {
    pub attempts: u64,
    pub pulses: u64,
    pub bits: u64,
    pub frame_starts: u64,
    pub invalid_pulses: u64,
    pub frames_completed: u64,
    pub watchdog_failures: u64,
    pub validation_failures: u64,
}

impl std::fmt::Display for SyncStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Attempts: {}, pulses: {} ({} bits, {} starts, {} invalid), frames completed: {}, failures: {} watchdog / {} validation",
            self.attempts,
            self.pulses,
            self.bits,
            self.frame_starts,
            self.invalid_pulses,
            self.frames_completed,
            self.watchdog_failures,
            self.validation_failures
        )
    }
}

/// Drives one receiver module through blocking synchronization attempts.
pub struct Synchronizer<S: EdgeSource, C: Clock> {
    source: S,
    clock: C,
    stats: SyncStats,
}

impl<S: EdgeSource, C: Clock> Synchronizer<S, C> {
    /// Build a synchronizer and power-cycle its receiver module.
    pub fn new(mut source: S, clock: C) -> Self {
        source.power_on();
        Self {
            source,
            clock,
            stats: SyncStats::default(),
        }
    }

    /// Run one blocking attempt: collect pulses until a frame completes
    /// or the watchdog expires.
    ///
    /// Edge delivery is enabled for the duration of the attempt and
    /// disabled on every exit path. With no pulses arriving at all the
    /// call blocks indefinitely; the watchdog counts classifications,
    /// not time.
    pub fn synchronize(&mut self) -> Result<DecodedTime, SyncError> {
        let latch = EdgeLatch::new();
        let mut frame = FrameBuffer::new();
        let mut watchdog = 0u32;

        self.stats.attempts += 1;
        self.source.enable_edges(latch.clone());
        debug!("attempt {} started, edge delivery enabled", self.stats.attempts);

        loop {
            if !latch.pending() {
                self.clock.sleep_ms(POLL_INTERVAL_MS);
                continue;
            }
            let observed_at = self.clock.now_ms();
            let duration_ms = match latch.take_pulse() {
                Some(d) => d,
                None => continue,
            };

            let class = classify(duration_ms);
            frame.apply(class);
            watchdog += 1;

            self.stats.pulses += 1;
            match class {
                PulseClass::Bit0 | PulseClass::Bit1 => self.stats.bits += 1,
                PulseClass::FrameStart => {
                    self.stats.frame_starts += 1;
                    debug!("frame start after {} pulses", watchdog);
                }
                PulseClass::Invalid => self.stats.invalid_pulses += 1,
            }
            trace!("pulse {} ms -> {:?}, cursor {:?}", duration_ms, class, frame.position());

            if watchdog > WATCHDOG_LIMIT {
                self.source.disable_edges();
                self.stats.watchdog_failures += 1;
                warn!("watchdog expired after {} pulses", watchdog);
                return Err(SyncError::WatchdogExpired(watchdog));
            }

            if frame.position() == Some(FRAME_END_INDEX) {
                self.stats.frames_completed += 1;
                debug!("frame complete after {} pulses", watchdog);

                // Decode first: the boundary alignment inside must run
                // while the final bit slot is still ticking.
                let time = decode(&frame, observed_at, &self.clock);
                self.source.disable_edges();

                return match time.validate() {
                    Ok(()) => {
                        info!("synchronized: {}", time);
                        Ok(time)
                    }
                    Err(e) => {
                        self.stats.validation_failures += 1;
                        warn!("frame rejected: {}", e);
                        Err(e)
                    }
                };
            }
        }
    }

    pub fn stats(&self) -> &SyncStats {
        &self.stats
    }
}
