//! Synchronization error types

use thiserror::Error;

/// Calendar fields subject to range validation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeField {
    Minute,
    Hour,
    Weekday,
    Day,
    Month,
    Year,
}

impl std::fmt::Display for TimeField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            TimeField::Minute => "minute",
            TimeField::Hour => "hour",
            TimeField::Weekday => "weekday",
            TimeField::Day => "day",
            TimeField::Month => "month",
            TimeField::Year => "year",
        };
        write!(f, "{}", label)
    }
}

/// Errors from a single synchronization attempt
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SyncError {
    /// Too many pulses classified without completing a frame
    #[error("watchdog expired after {0} pulses without a complete frame")]
    WatchdogExpired(u32),

    /// A full frame was collected but a decoded field failed its bound
    #[error("decoded {field} value {value} is out of range")]
    FieldOutOfRange { field: TimeField, value: u8 },
}
