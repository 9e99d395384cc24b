//! Serde helpers for wall-clock times stored as `HH:MM`.

use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Deserializer, Serializer};

/// Display format for scheduled times.
pub const HHMM: &str = "%H:%M";

/// Parse a user-supplied `HH:MM` (or `HH:MM:SS`) time of day.
///
/// Seconds are dropped so the result survives an `HH:MM` round trip.
pub fn parse_hhmm(s: &str) -> Option<NaiveTime> {
    let s = s.trim();
    let time = NaiveTime::parse_from_str(s, HHMM)
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
        .ok()?;
    NaiveTime::from_hms_opt(time.hour(), time.minute(), 0)
}

/// `#[serde(with = "hhmm")]` for `NaiveTime` fields.
pub mod hhmm {
    use super::{parse_hhmm, Deserialize, Deserializer, NaiveTime, Serializer, HHMM};

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&time.format(HHMM))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let s = String::deserialize(deserializer)?;
        parse_hhmm(&s).ok_or_else(|| serde::de::Error::custom(format!("invalid time '{s}', expected HH:MM")))
    }
}
