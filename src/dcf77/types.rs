//! Decoded calendar time

use crate::error::{SyncError, TimeField};

/// Calendar time carried by one frame.
///
/// A frame transmits the time of the minute that begins as the frame
/// ends, so these fields describe the instant synchronization
/// completes. Year is the year of the century, weekday runs Monday = 1
/// through Sunday = 7.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodedTime {
    pub minute: u8,
    pub hour: u8,
    pub weekday: u8,
    pub day: u8,
    pub month: u8,
    pub year: u8,
}

impl DecodedTime {
    /// Range-check every field; the first violation wins.
    pub fn validate(&self) -> Result<(), SyncError> {
        if self.minute >= 60 {
            return Err(SyncError::FieldOutOfRange {
                field: TimeField::Minute,
                value: self.minute,
            });
        }
        if self.hour >= 24 {
            return Err(SyncError::FieldOutOfRange {
                field: TimeField::Hour,
                value: self.hour,
            });
        }
        if self.weekday > 7 {
            return Err(SyncError::FieldOutOfRange {
                field: TimeField::Weekday,
                value: self.weekday,
            });
        }
        if self.day > 31 {
            return Err(SyncError::FieldOutOfRange {
                field: TimeField::Day,
                value: self.day,
            });
        }
        if self.month > 12 {
            return Err(SyncError::FieldOutOfRange {
                field: TimeField::Month,
                value: self.month,
            });
        }
        if self.year >= 100 {
            return Err(SyncError::FieldOutOfRange {
                field: TimeField::Year,
                value: self.year,
            });
        }
        Ok(())
    }
}

impl std::fmt::Display for DecodedTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        const DAYS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];
        let day_name = self
            .weekday
            .checked_sub(1)
            .and_then(|i| DAYS.get(i as usize))
            .copied()
            .unwrap_or("???");
        write!(
            f,
            "{} {:02}.{:02}.20{:02} {:02}:{:02}",
            day_name, self.day, self.month, self.year, self.hour, self.minute
        )
    }
}
