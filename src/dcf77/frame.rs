//! Frame assembly
//!
//! Bits arrive one per second and are packed LSB-first into a fixed
//! buffer, so the bit index equals the second of the minute it was
//! transmitted in. The write cursor starts out seeking and drops
//! everything until a frame start rearms it at zero.

use super::pulse::PulseClass;

/// Frame capacity in bits.
pub const FRAME_BITS: usize = 60;

/// Cursor position that marks a finished transmission. The last
/// protocol bit (index 58) is never awaited; the frame is read as soon
/// as the cursor lands here.
pub const FRAME_END_INDEX: usize = 58;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cursor {
    /// Dropping bits until the next frame start.
    Seeking,
    /// The next bit lands at this index.
    At(usize),
}

/// One transmission frame, assembled a pulse at a time.
#[derive(Debug)]
pub struct FrameBuffer {
    bits: [u8; 8],
    cursor: Cursor,
}

impl FrameBuffer {
    pub fn new() -> Self {
        Self {
            bits: [0; 8],
            cursor: Cursor::Seeking,
        }
    }

    /// Apply one classified pulse.
    ///
    /// A frame start rearms the cursor at zero without clearing bits
    /// already collected; the buffer is zeroed per attempt, not per
    /// frame. An invalid pulse drops the cursor back to seeking.
    pub fn apply(&mut self, class: PulseClass) {
        if class == PulseClass::FrameStart {
            self.cursor = Cursor::At(0);
            return;
        }

        let index = match self.cursor {
            Cursor::At(i) if i < FRAME_BITS => i,
            // Seeking, or a frame already filled to capacity.
            _ => return,
        };

        match class {
            PulseClass::Bit1 => {
                self.bits[index / 8] |= 1 << (index % 8);
                self.cursor = Cursor::At(index + 1);
            }
            PulseClass::Bit0 => {
                // The buffer starts zeroed, only the cursor moves.
                self.cursor = Cursor::At(index + 1);
            }
            _ => {
                self.cursor = Cursor::Seeking;
            }
        }
    }

    /// Value of the bit at a frame index.
    pub fn bit(&self, index: usize) -> u8 {
        (self.bits[index / 8] >> (index % 8)) & 1
    }

    /// Current write position, `None` while seeking.
    pub fn position(&self) -> Option<usize> {
        match self.cursor {
            Cursor::At(i) => Some(i),
            Cursor::Seeking => None,
        }
    }
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bits_before_frame_start_are_dropped() {
        let mut frame = FrameBuffer::new();
        frame.apply(PulseClass::Bit1);
        frame.apply(PulseClass::Bit0);
        assert_eq!(frame.position(), None);
        assert_eq!(frame.bit(0), 0);
    }

    #[test]
    fn test_frame_start_rearms_cursor() {
        let mut frame = FrameBuffer::new();
        frame.apply(PulseClass::FrameStart);
        assert_eq!(frame.position(), Some(0));
    }

    #[test]
    fn test_bits_pack_lsb_first() {
        let mut frame = FrameBuffer::new();
        frame.apply(PulseClass::FrameStart);
        frame.apply(PulseClass::Bit1);
        frame.apply(PulseClass::Bit0);
        frame.apply(PulseClass::Bit1);
        assert_eq!(frame.position(), Some(3));
        assert_eq!(frame.bit(0), 1);
        assert_eq!(frame.bit(1), 0);
        assert_eq!(frame.bit(2), 1);
    }

    #[test]
    fn test_invalid_pulse_reseeks() {
        let mut frame = FrameBuffer::new();
        frame.apply(PulseClass::FrameStart);
        frame.apply(PulseClass::Bit1);
        frame.apply(PulseClass::Invalid);
        assert_eq!(frame.position(), None);

        // Bits stay dropped until the next frame start.
        frame.apply(PulseClass::Bit1);
        assert_eq!(frame.position(), None);
        frame.apply(PulseClass::FrameStart);
        assert_eq!(frame.position(), Some(0));
    }

    #[test]
    fn test_frame_start_rearms_without_clearing() {
        let mut frame = FrameBuffer::new();
        frame.apply(PulseClass::FrameStart);
        frame.apply(PulseClass::Bit1);
        frame.apply(PulseClass::FrameStart);
        assert_eq!(frame.position(), Some(0));
        assert_eq!(frame.bit(0), 1);
    }

    #[test]
    fn test_completion_lands_exactly_on_index_58() {
        let mut frame = FrameBuffer::new();
        frame.apply(PulseClass::FrameStart);
        for i in 0..58 {
            assert_ne!(frame.position(), Some(FRAME_END_INDEX), "early at bit {}", i);
            frame.apply(PulseClass::Bit0);
        }
        assert_eq!(frame.position(), Some(FRAME_END_INDEX));
        // A 59th bit moves the cursor straight past the completion index.
        frame.apply(PulseClass::Bit0);
        assert_eq!(frame.position(), Some(59));
    }

    #[test]
    fn test_capacity_bound_drops_extra_bits() {
        let mut frame = FrameBuffer::new();
        frame.apply(PulseClass::FrameStart);
        for _ in 0..FRAME_BITS {
            frame.apply(PulseClass::Bit1);
        }
        assert_eq!(frame.position(), Some(FRAME_BITS));
        frame.apply(PulseClass::Bit1);
        frame.apply(PulseClass::Bit0);
        assert_eq!(frame.position(), Some(FRAME_BITS));
        assert_eq!(frame.bit(FRAME_BITS - 1), 1);
    }
}
