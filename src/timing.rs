//! Elapsed-time value used for the ping session summary

use std::fmt;
use std::time::Duration;
use thiserror::Error;

const SECONDS_PER_MINUTE: u64 = 60;
const SECONDS_PER_HOUR: u64 = 3600;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Seconds value must be between 0 and 59, got {0}")]
    Seconds(u64),

    #[error("Minutes value must be between 0 and 59, got {0}")]
    Minutes(u64),
}

/// A duration split into hours, minutes and seconds.
///
/// Seconds and minutes are always in `0..=59`; hours are unbounded.
/// Equality compares the total number of seconds.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimeInterval {
    seconds: u64,
    minutes: u64,
    hours: u64,
}

impl TimeInterval {
    /// Build an interval from its components, rejecting out-of-range seconds or minutes.
    pub fn new(seconds: u64, minutes: u64, hours: u64) -> Result<Self, ValidationError> {
        if seconds >= SECONDS_PER_MINUTE {
            return Err(ValidationError::Seconds(seconds));
        }
        if minutes >= 60 {
            return Err(ValidationError::Minutes(minutes));
        }
        Ok(Self {
            seconds,
            minutes,
            hours,
        })
    }

    /// Normalize a raw number of elapsed seconds.
    ///
    /// Seconds are rounded to the nearest integer, ties to even (`2.5` is
    /// `2s`, `3.5` is `4s`). A remainder that rounds up
    /// to a full minute carries into minutes (and on into hours), so `59.6`
    /// becomes `1m` rather than an invalid `60s`. Negative and non-finite
    /// inputs are treated as zero.
    pub fn from_duration(seconds: f64) -> Self {
        let total = if seconds.is_finite() && seconds > 0.0 {
            seconds.round_ties_even() as u64
        } else {
            0
        };
        Self::from_total_seconds(total)
    }

    pub fn from_elapsed(elapsed: Duration) -> Self {
        Self::from_duration(elapsed.as_secs_f64())
    }

    fn from_total_seconds(total: u64) -> Self {
        let hours = total / SECONDS_PER_HOUR;
        let remaining = total % SECONDS_PER_HOUR;
        Self {
            seconds: remaining % SECONDS_PER_MINUTE,
            minutes: remaining / SECONDS_PER_MINUTE,
            hours,
        }
    }

    pub fn seconds(&self) -> u64 {
        self.seconds
    }

    pub fn minutes(&self) -> u64 {
        self.minutes
    }

    pub fn hours(&self) -> u64 {
        self.hours
    }

    pub fn total_seconds(&self) -> u64 {
        self.hours * SECONDS_PER_HOUR + self.minutes * SECONDS_PER_MINUTE + self.seconds
    }

    /// Component-wise description, e.g. `<TimeInterval: seconds=1, minutes=1, hours=1>`.
    pub fn describe(&self) -> String {
        format!(
            "<TimeInterval: seconds={}, minutes={}, hours={}>",
            self.seconds, self.minutes, self.hours
        )
    }
}

impl PartialEq for TimeInterval {
    fn eq(&self, other: &Self) -> bool {
        self.total_seconds() == other.total_seconds()
    }
}

impl Eq for TimeInterval {}

impl fmt::Display for TimeInterval {
    /// Only non-zero components are shown, so a zero interval renders empty.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::with_capacity(3);
        if self.hours > 0 {
            parts.push(format!("{}h", self.hours));
        }
        if self.minutes > 0 {
            parts.push(format!("{}m", self.minutes));
        }
        if self.seconds > 0 {
            parts.push(format!("{}s", self.seconds));
        }
        f.write_str(&parts.join(" "))
    }
}
