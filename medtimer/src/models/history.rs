//! History record written each time a dose is marked taken.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

use super::time_format::hhmm;
use super::{MedicationEntry, MedicationForm};

/// Placeholder shown when a dose has no dosage text.
pub const NO_DOSAGE: &str = "-";

/// Immutable log entry for one taken dose.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRecord {
    /// Calendar date the dose was taken.
    pub date: NaiveDate,
    /// Form of the medication at the time it was taken.
    pub form: MedicationForm,
    /// Medicine name at the time it was taken.
    pub medicine_name: String,
    /// Dosage text, or `-` when none was given.
    pub dosage: String,
    /// Scheduled time of the dose.
    #[serde(with = "hhmm")]
    pub scheduled: NaiveTime,
    /// Wall-clock time the dose was marked taken (second precision).
    pub taken_at: NaiveTime,
}

impl HistoryRecord {
    /// Capture an entry's fields at the moment it is marked taken.
    pub fn capture(entry: &MedicationEntry, at: NaiveDateTime) -> Self {
        let time = at.time();
        Self {
            date: at.date(),
            form: entry.form,
            medicine_name: entry.name.clone(),
            dosage: entry
                .dosage
                .clone()
                .unwrap_or_else(|| NO_DOSAGE.to_string()),
            scheduled: entry.scheduled_time,
            taken_at: time.with_nanosecond(0).unwrap_or(time),
        }
    }
}
