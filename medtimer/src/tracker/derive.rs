//! Pure derivations over tracker state.

use chrono::{Datelike, NaiveDate, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::models::{DoseStatus, MedicationEntry, Motivation};

/// Minimum adherence percentage (inclusive) that extends the streak.
pub const STREAK_THRESHOLD: f64 = 80.0;

/// Daily tips, picked by day of month.
pub const TIPS: [&str; 8] = [
    "Take your medicine at the same time each day for best results!",
    "Drinking water helps your body absorb most medicines better.",
    "Consistency builds healthy habits!",
    "You're doing great, every dose counts!",
    "Set reminders on your phone to never miss a dose!",
    "Keep your medications in a visible place as a reminder.",
    "Track your progress - you're building a healthy routine!",
    "Small steps lead to big health improvements!",
];

/// Status of one entry at a given time of day.
///
/// Comparison is same-day only: a dose scheduled earlier on the clock than
/// `now` is missed even if it was meant for after midnight. Seconds on `now`
/// are ignored so a dose is not missed during its own scheduled minute.
pub fn derive_status(entry: &MedicationEntry, now: NaiveTime) -> DoseStatus {
    if entry.taken {
        return DoseStatus::Taken;
    }
    let now = NaiveTime::from_hms_opt(now.hour(), now.minute(), 0).unwrap_or(now);
    if entry.scheduled_time < now {
        DoseStatus::Missed
    } else {
        DoseStatus::Upcoming
    }
}

/// Taken-versus-scheduled counts for today.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Adherence {
    pub taken_count: usize,
    pub total: usize,
    /// Percentage rounded to one decimal place; 0.0 when nothing is scheduled.
    pub percentage: f64,
}

/// Recompute adherence from the current list.
#[allow(clippy::cast_precision_loss)]
pub fn compute_adherence(medications: &[MedicationEntry]) -> Adherence {
    let total = medications.len();
    let taken_count = medications.iter().filter(|m| m.taken).count();
    let percentage = if total == 0 {
        0.0
    } else {
        let raw = taken_count as f64 / total as f64 * 100.0;
        // Halves go to the even neighbour: 6.25 shows as 6.2.
        (raw * 10.0).round_ties_even() / 10.0
    };

    Adherence {
        taken_count,
        total,
        percentage,
    }
}

/// Bucket a percentage into a motivation tier.
pub fn classify_motivation(percentage: f64) -> Motivation {
    if percentage >= 100.0 {
        Motivation::Perfect
    } else if percentage >= STREAK_THRESHOLD {
        Motivation::Great
    } else if percentage >= 50.0 {
        Motivation::Good
    } else {
        Motivation::TryAgain
    }
}

/// Tip of the day. Depends only on the day of month.
pub fn daily_tip(date: NaiveDate) -> &'static str {
    TIPS[date.day() as usize % TIPS.len()]
}
