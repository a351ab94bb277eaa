//! Staleness filter for fault timestamps
//!
//! A fault sensor can hold the same code long after the event happened. When
//! the device also reports when the fault was raised, transitions for faults
//! older than the window are suppressed so a host restart does not re-alert on
//! history.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use thiserror::Error;

/// Timestamps that cannot be turned into a point in time
#[derive(Debug, Error, PartialEq)]
pub enum TimestampError {
    #[error("epoch value out of range: {0}")]
    OutOfRange(String),

    #[error("timestamp has no UTC offset: {0}")]
    MissingOffset(String),
}

/// Outcome of a staleness check
#[derive(Debug, Clone, PartialEq)]
pub enum Freshness {
    /// No usable timestamp; the transition is not suppressed
    Unknown,
    Fresh {
        reported_at: DateTime<Utc>,
        age: Duration,
    },
    Stale {
        reported_at: DateTime<Utc>,
        age: Duration,
    },
}

impl Freshness {
    pub fn is_stale(&self) -> bool {
        matches!(self, Freshness::Stale { .. })
    }
}

/// Suppresses faults first reported longer ago than `window`
#[derive(Debug, Clone)]
pub struct StalenessFilter {
    window: Duration,
}

impl StalenessFilter {
    pub fn new(window: Duration) -> Self {
        Self { window }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Classify a raw timestamp value against `now`
    pub fn check(&self, raw: Option<&str>, now: DateTime<Utc>) -> Result<Freshness, TimestampError> {
        let Some(reported_at) = raw.map(parse_timestamp).transpose()?.flatten() else {
            return Ok(Freshness::Unknown);
        };

        let age = now - reported_at;
        if age > self.window {
            Ok(Freshness::Stale { reported_at, age })
        } else {
            Ok(Freshness::Fresh { reported_at, age })
        }
    }
}

impl Default for StalenessFilter {
    fn default() -> Self {
        Self::new(Duration::hours(1))
    }
}

/// Parse an ISO-8601 timestamp or Unix epoch seconds.
///
/// Empty and `none` values, and text that is neither format, yield `Ok(None)`.
/// An ISO-8601 value without an offset cannot be compared with the current
/// UTC time and is an error, so the caller fails open.
pub fn parse_timestamp(raw: &str) -> Result<Option<DateTime<Utc>>, TimestampError> {
    let raw = raw.trim();
    if raw.is_empty() || raw.eq_ignore_ascii_case("none") {
        return Ok(None);
    }

    if let Some(parsed) = parse_iso8601(raw) {
        return Ok(Some(parsed));
    }
    if is_naive_iso8601(raw) {
        return Err(TimestampError::MissingOffset(raw.to_string()));
    }

    match raw.parse::<f64>() {
        Ok(epoch) => epoch_to_utc(epoch)
            .map(Some)
            .ok_or_else(|| TimestampError::OutOfRange(raw.to_string())),
        Err(_) => Ok(None),
    }
}

fn parse_iso8601(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%d %H:%M:%S%.f%:z", "%Y-%m-%dT%H:%M:%S%.f%z", "%Y-%m-%d %H:%M:%S%.f%z"]
        .iter()
        .find_map(|format| DateTime::parse_from_str(raw, format).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

fn is_naive_iso8601(raw: &str) -> bool {
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"]
        .iter()
        .any(|format| NaiveDateTime::parse_from_str(raw, format).is_ok())
        || NaiveDate::parse_from_str(raw, "%Y-%m-%d").is_ok()
}

fn epoch_to_utc(epoch: f64) -> Option<DateTime<Utc>> {
    if !epoch.is_finite() {
        return None;
    }
    let secs = epoch.floor();
    if secs < i64::MIN as f64 || secs > i64::MAX as f64 {
        return None;
    }
    let nanos = ((epoch - secs) * 1e9) as u32;
    DateTime::from_timestamp(secs as i64, nanos.min(999_999_999))
}
