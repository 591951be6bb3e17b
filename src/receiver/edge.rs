//! Edge capture
//!
//! The receiver module signals by pulling its output line low once per
//! second; an interrupt-style producer reports each level transition
//! with a timestamp. `EdgeLatch` is the handoff between that producer
//! and the polling control loop: two timestamps and a flag, nothing
//! else shared, no locks on either side.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

/// Input line level. The line idles high and goes low for the active
/// phase of each second.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    High,
    Low,
}

/// Single-pulse latch between the edge producer and the control loop.
///
/// The producer overwrites unconsumed timestamps, so a slow consumer
/// loses pulses instead of blocking the producer. The consumer sees at
/// most one pending pulse at a time.
#[derive(Debug)]
pub struct EdgeLatch {
    rising_ms: AtomicU32,
    falling_ms: AtomicU32,
    triggered: AtomicBool,
    // Producer-side only, tracks the last reported level so repeated
    // notifications at the same level are dropped. Starts high (idle).
    last_level: AtomicBool,
}

impl EdgeLatch {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            rising_ms: AtomicU32::new(0),
            falling_ms: AtomicU32::new(0),
            triggered: AtomicBool::new(false),
            last_level: AtomicBool::new(true),
        })
    }

    /// Record one level transition.
    ///
    /// A falling edge opens the low phase; the rising edge that closes
    /// it publishes the pulse. Repeated edges at an unchanged level are
    /// ignored.
    pub fn record_edge(&self, level: Level, timestamp_ms: u32) {
        match level {
            Level::High => {
                if !self.last_level.swap(true, Ordering::Relaxed) {
                    self.rising_ms.store(timestamp_ms, Ordering::Relaxed);
                    self.triggered.store(true, Ordering::Release);
                }
            }
            Level::Low => {
                if self.last_level.swap(false, Ordering::Relaxed) {
                    self.falling_ms.store(timestamp_ms, Ordering::Relaxed);
                }
            }
        }
    }

    /// Take the pending pulse as a signed low-phase duration.
    ///
    /// The difference wraps with the timestamps; an out-of-order pair
    /// comes out negative and is left for the classifier to reject.
    pub fn take_pulse(&self) -> Option<i32> {
        if !self.triggered.swap(false, Ordering::AcqRel) {
            return None;
        }
        let rising = self.rising_ms.load(Ordering::Relaxed);
        let falling = self.falling_ms.load(Ordering::Relaxed);
        Some(rising.wrapping_sub(falling) as i32)
    }

    /// Whether a pulse is waiting to be consumed.
    pub fn pending(&self) -> bool {
        self.triggered.load(Ordering::Acquire)
    }
}

/// Boundary to the receiver module: power control and edge delivery.
pub trait EdgeSource {
    /// Power-cycle the module. Issued once when the synchronizer is built.
    fn power_on(&mut self);

    /// Start reporting level transitions into the latch.
    fn enable_edges(&mut self, latch: Arc<EdgeLatch>);

    /// Stop reporting level transitions.
    fn disable_edges(&mut self);
}
