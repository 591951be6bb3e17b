//! Millisecond clock boundary
//!
//! Every duration in the decode pipeline is measured on a free-running
//! u32 millisecond counter. The counter wraps; consumers subtract with
//! wrapping arithmetic and never compare absolute values.

use std::sync::Arc;
use std::time::{Duration, Instant};

/// Free-running millisecond counter plus a blocking wait.
pub trait Clock {
    /// Milliseconds since an arbitrary epoch, wrapping at u32::MAX.
    fn now_ms(&self) -> u32;

    /// Block the calling thread for the given number of milliseconds.
    fn sleep_ms(&self, ms: u32);
}

impl<C: Clock> Clock for Arc<C> {
    fn now_ms(&self) -> u32 {
        self.as_ref().now_ms()
    }

    fn sleep_ms(&self, ms: u32) {
        self.as_ref().sleep_ms(ms)
    }
}

/// Clock over `Instant`, optionally running faster than real time so
/// simulated transmissions don't take wall-clock minutes.
pub struct SystemClock {
    epoch: Instant,
    scale: u32,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
            scale: 1,
        }
    }

    /// Clock that reports `scale` milliseconds for every real one.
    pub fn accelerated(scale: u32) -> Self {
        Self {
            epoch: Instant::now(),
            scale: scale.max(1),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> u32 {
        let real_us = self.epoch.elapsed().as_micros();
        // Truncating to u32 gives the wrapping counter directly.
        (real_us * self.scale as u128 / 1000) as u32
    }

    fn sleep_ms(&self, ms: u32) {
        std::thread::sleep(Duration::from_micros(ms as u64 * 1000 / self.scale as u64));
    }
}

/// Manually driven clock for tests. `sleep_ms` records the request and
/// advances time by exactly that amount.
#[cfg(test)]
pub struct MockClock {
    now: std::sync::atomic::AtomicU32,
    sleeps: std::sync::Mutex<Vec<u32>>,
}

#[cfg(test)]
impl MockClock {
    pub fn new(start_ms: u32) -> Self {
        Self {
            now: std::sync::atomic::AtomicU32::new(start_ms),
            sleeps: std::sync::Mutex::new(Vec::new()),
        }
    }

    pub fn advance(&self, ms: u32) {
        self.now.fetch_add(ms, std::sync::atomic::Ordering::SeqCst);
    }

    pub fn sleeps(&self) -> Vec<u32> {
        self.sleeps.lock().unwrap().clone()
    }
}

#[cfg(test)]
impl Clock for MockClock {
    fn now_ms(&self) -> u32 {
        self.now.load(std::sync::atomic::Ordering::SeqCst)
    }

    fn sleep_ms(&self, ms: u32) {
        self.sleeps.lock().unwrap().push(ms);
        self.advance(ms);
    }
}
