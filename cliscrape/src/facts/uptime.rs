//! Uptime values in the S300's `D,HH:MM:SS` format.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ParseError;

/// An uptime as reported by `show system`, e.g. `45,23:02:04`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UptimeDuration {
    pub days: u64,
    pub hours: u64,
    pub minutes: u64,
    pub seconds: u64,
}

impl UptimeDuration {
    /// Total uptime in seconds, `None` on overflow.
    pub fn total_seconds(&self) -> Option<u64> {
        self.days
            .checked_mul(86_400)?
            .checked_add(self.hours.checked_mul(3_600)?)?
            .checked_add(self.minutes.checked_mul(60)?)?
            .checked_add(self.seconds)
    }
}

impl FromStr for UptimeDuration {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let input = s.trim();
        let malformed = |reason: &str| ParseError::MalformedUptime {
            input: input.to_string(),
            reason: reason.to_string(),
        };

        let (days, hms) = input
            .split_once(',')
            .ok_or_else(|| malformed("missing ',' between days and time"))?;

        let mut parts = hms.split(':');
        let (Some(hours), Some(minutes), Some(seconds), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(malformed("time must be HH:MM:SS"));
        };

        let component = |name: &str, value: &str| {
            value
                .trim()
                .parse::<u64>()
                .map_err(|_| malformed(&format!("{} '{}' is not a non-negative integer", name, value)))
        };

        Ok(Self {
            days: component("days", days)?,
            hours: component("hours", hours)?,
            minutes: component("minutes", minutes)?,
            seconds: component("seconds", seconds)?,
        })
    }
}

impl fmt::Display for UptimeDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{:02}:{:02}:{:02}",
            self.days, self.hours, self.minutes, self.seconds
        )
    }
}

/// Parse `D,HH:MM:SS` into total seconds.
pub fn parse_uptime(s: &str) -> Result<i64, ParseError> {
    let uptime: UptimeDuration = s.parse()?;
    uptime
        .total_seconds()
        .and_then(|total| i64::try_from(total).ok())
        .ok_or_else(|| ParseError::MalformedUptime {
            input: s.trim().to_string(),
            reason: "uptime out of range".to_string(),
        })
}
