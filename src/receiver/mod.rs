//! Receiver module boundary
//!
//! The decode pipeline touches hardware through two narrow seams: a
//! wrapping millisecond clock and an edge source that reports line
//! transitions into a single-pulse latch. `SimulatedReceiver` fills the
//! edge-source seam on hosts without the radio module.

pub mod clock;
pub mod edge;
pub mod sim;

pub use clock::{Clock, SystemClock};
pub use edge::{EdgeLatch, EdgeSource, Level};
pub use sim::SimulatedReceiver;
