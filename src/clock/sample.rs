use chrono::{DateTime, Utc};
use std::fmt;

/// One reading of the time source, taken on a single tick.
///
/// Samples are immutable; each tick produces a fresh one that supersedes the
/// previous reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ClockSample {
    sequence: u64,
    timestamp: DateTime<Utc>,
}

impl ClockSample {
    pub fn new(sequence: u64, timestamp: DateTime<Utc>) -> Self {
        Self {
            sequence,
            timestamp,
        }
    }

    /// 1-based index of the tick that produced this sample.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn timestamp_millis(&self) -> i64 {
        self.timestamp.timestamp_millis()
    }

    /// Wall-clock time of day, `HH:MM:SS` (UTC).
    pub fn format_time(&self) -> String {
        self.timestamp.format("%H:%M:%S").to_string()
    }
}

impl fmt::Display for ClockSample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} {}", self.sequence, self.format_time())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn formats_time_of_day() {
        let at = Utc.with_ymd_and_hms(2025, 11, 15, 9, 5, 7).unwrap();
        let sample = ClockSample::new(3, at);
        assert_eq!(sample.format_time(), "09:05:07");
        assert_eq!(sample.to_string(), "#3 09:05:07");
        assert_eq!(sample.timestamp_millis(), at.timestamp_millis());
    }
}
