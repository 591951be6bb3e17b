//! DCF77 decode pipeline
//!
//! A transmission is recovered in stages:
//! 1. Classify each measured low-phase duration (pulse)
//! 2. Assemble classified bits into a 59-bit frame (frame)
//! 3. Extract and range-check the BCD calendar fields (decoder, types)

pub mod decoder;
pub mod frame;
pub mod pulse;
pub mod types;

pub use decoder::{decode, encode_frame};
pub use frame::{FrameBuffer, FRAME_END_INDEX};
pub use pulse::{classify, PulseClass};
pub use types::DecodedTime;
