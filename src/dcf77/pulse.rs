//! Pulse classification
//!
//! The transmitter drops carrier power for 100 or 200 ms at the start
//! of every second; the receiver output is inverted, so what reaches us
//! is the low phase between two pulses: about 900 ms for a zero bit,
//! 800 ms for a one. Second 59 carries no pulse at all, which stretches
//! the final low phase past 1.5 s and marks the start of a new frame.

/// Lower edge of the one-bit band in milliseconds.
pub const BIT1_MIN_MS: i32 = 750;
/// Boundary between the one-bit and zero-bit bands.
pub const BIT0_MIN_MS: i32 = 850;
/// Upper edge of the zero-bit band.
pub const BIT0_MAX_MS: i32 = 950;
/// Durations beyond this are the missing 59th pulse of a minute.
pub const FRAME_START_MIN_MS: i32 = 1500;

/// What one measured low-phase duration means.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PulseClass {
    Bit0,
    Bit1,
    FrameStart,
    Invalid,
}

/// Classify a low-phase duration.
///
/// Durations are signed: wrapped or out-of-order timestamps show up
/// negative and fall through to `Invalid` like any other noise.
pub fn classify(duration_ms: i32) -> PulseClass {
    if duration_ms > FRAME_START_MIN_MS {
        return PulseClass::FrameStart;
    }
    if duration_ms >= BIT1_MIN_MS && duration_ms < BIT0_MIN_MS {
        PulseClass::Bit1
    } else if duration_ms >= BIT0_MIN_MS && duration_ms < BIT0_MAX_MS {
        PulseClass::Bit0
    } else {
        PulseClass::Invalid
    }
}
