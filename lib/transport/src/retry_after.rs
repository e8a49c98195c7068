//! Parsing of server-supplied retry delay hints.
//!
//! Accepted forms: a relative duration with an `s` suffix (`"5s"`, `"1.5s"`),
//! bare integer seconds, and absolute timestamps (HTTP-date, RFC 3339, or
//! bare epoch seconds).

use chrono::{DateTime, Utc};
use std::time::Duration;

/// Bare integers at or above this value are read as Unix timestamps.
pub const EPOCH_THRESHOLD_SECS: u64 = 1_000_000_000;

/// A parsed retry hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryAfter {
    /// Wait this long.
    Relative(Duration),
    /// Wait until this instant.
    Absolute(DateTime<Utc>),
}

impl RetryAfter {
    /// Parses a hint, returning `None` when it is not usable.
    #[must_use]
    pub fn parse(hint: &str) -> Option<Self> {
        let hint = hint.trim();
        if hint.is_empty() {
            return None;
        }

        if let Some(secs) = hint.strip_suffix('s')
            && let Ok(secs) = secs.trim().parse::<f64>()
        {
            return Duration::try_from_secs_f64(secs.max(0.0)).ok().map(Self::Relative);
        }

        if let Ok(secs) = hint.parse::<i64>() {
            return match u64::try_from(secs) {
                Ok(secs) if secs >= EPOCH_THRESHOLD_SECS => {
                    DateTime::from_timestamp(secs.try_into().ok()?, 0).map(Self::Absolute)
                }
                Ok(secs) => Some(Self::Relative(Duration::from_secs(secs))),
                Err(_) => Some(Self::Relative(Duration::ZERO)),
            };
        }

        DateTime::parse_from_rfc2822(hint)
            .or_else(|_| DateTime::parse_from_rfc3339(hint))
            .ok()
            .map(|at| Self::Absolute(at.with_timezone(&Utc)))
    }

    /// Returns how long to wait from `now`; past instants yield zero.
    #[must_use]
    pub fn delay_from(&self, now: DateTime<Utc>) -> Duration {
        match self {
            Self::Relative(delay) => *delay,
            Self::Absolute(at) => (*at - now).to_std().unwrap_or(Duration::ZERO),
        }
    }
}
