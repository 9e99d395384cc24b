//! Derived status of a scheduled dose.

use serde::{Deserialize, Serialize};

/// Where a dose stands relative to the current time of day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DoseStatus {
    /// Marked taken today.
    Taken,
    /// Not taken and its scheduled time has passed.
    Missed,
    /// Not taken and still ahead.
    Upcoming,
}

impl DoseStatus {
    /// Convert status to string.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Taken => "taken",
            Self::Missed => "missed",
            Self::Upcoming => "upcoming",
        }
    }

    /// Short label shown in the schedule.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Taken => "Taken",
            Self::Missed => "Missed",
            Self::Upcoming => "Upcoming",
        }
    }
}

impl std::fmt::Display for DoseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
