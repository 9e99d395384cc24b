//! Medication model representing one scheduled dose on today's list.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use super::time_format::hhmm;

/// Physical form of a medication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MedicationForm {
    /// Pill or tablet.
    Pill,
    /// Injection.
    Injection,
    /// Syrup or other liquid.
    Syrup,
    /// Inhaler.
    Inhaler,
    /// Drops.
    Drops,
    /// Patch.
    Patch,
    /// Cream or ointment.
    Cream,
    /// Capsule.
    Capsule,
}

impl MedicationForm {
    /// Every form, in the order the picker offers them.
    pub const ALL: [Self; 8] = [
        Self::Pill,
        Self::Injection,
        Self::Syrup,
        Self::Inhaler,
        Self::Drops,
        Self::Patch,
        Self::Cream,
        Self::Capsule,
    ];

    /// Convert form to its wire string.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pill => "pill",
            Self::Injection => "injection",
            Self::Syrup => "syrup",
            Self::Inhaler => "inhaler",
            Self::Drops => "drops",
            Self::Patch => "patch",
            Self::Cream => "cream",
            Self::Capsule => "capsule",
        }
    }

    /// Parse form from user input, accepting a few common aliases.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "pill" | "tablet" => Some(Self::Pill),
            "injection" => Some(Self::Injection),
            "syrup" | "liquid" => Some(Self::Syrup),
            "inhaler" => Some(Self::Inhaler),
            "drops" => Some(Self::Drops),
            "patch" => Some(Self::Patch),
            "cream" | "ointment" => Some(Self::Cream),
            "capsule" => Some(Self::Capsule),
            _ => None,
        }
    }

    /// Human-readable label shown in the picker.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pill => "Pill/Tablet",
            Self::Injection => "Injection",
            Self::Syrup => "Syrup/Liquid",
            Self::Inhaler => "Inhaler",
            Self::Drops => "Drops",
            Self::Patch => "Patch",
            Self::Cream => "Cream/Ointment",
            Self::Capsule => "Capsule",
        }
    }

    /// Icon shown next to the medicine name and in history rows.
    pub const fn icon(self) -> &'static str {
        match self {
            Self::Pill => "💊",
            Self::Injection => "💉",
            Self::Syrup => "🥤",
            Self::Inhaler => "🌬️",
            Self::Drops => "💧",
            Self::Patch => "🩹",
            Self::Cream => "🧴",
            Self::Capsule => "⚪",
        }
    }
}

impl std::fmt::Display for MedicationForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// User input for a new medication, before validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewMedication {
    /// Display name; must be non-empty once trimmed.
    pub name: String,
    /// Physical form.
    pub form: MedicationForm,
    /// Scheduled time of day.
    #[serde(with = "hhmm")]
    pub time: NaiveTime,
    /// Optional free-text dosage.
    #[serde(default)]
    pub dosage: Option<String>,
}

impl NewMedication {
    /// Create a new medication draft without a dosage.
    pub fn new(name: impl Into<String>, form: MedicationForm, time: NaiveTime) -> Self {
        Self {
            name: name.into(),
            form,
            time,
            dosage: None,
        }
    }

    /// Set the dosage text.
    #[must_use]
    pub fn with_dosage(mut self, dosage: impl Into<String>) -> Self {
        self.dosage = Some(dosage.into());
        self
    }
}

/// A medication on today's schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedicationEntry {
    /// Stable identifier (UUIDv7), survives deletion of other entries.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Scheduled wall-clock time, no date component.
    #[serde(with = "hhmm")]
    pub scheduled_time: NaiveTime,
    /// Physical form.
    pub form: MedicationForm,
    /// Dosage text, `None` when not given.
    pub dosage: Option<String>,
    /// Whether today's dose has been taken.
    pub taken: bool,
}

impl MedicationEntry {
    /// Create an untaken entry from already-validated fields.
    pub const fn new(
        id: String,
        name: String,
        form: MedicationForm,
        scheduled_time: NaiveTime,
        dosage: Option<String>,
    ) -> Self {
        Self {
            id,
            name,
            scheduled_time,
            form,
            dosage,
            taken: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_form_round_trips_through_str() {
        for form in MedicationForm::ALL {
            assert_eq!(MedicationForm::from_str(form.as_str()), Some(form));
        }
        assert_eq!(MedicationForm::from_str("Tablet"), Some(MedicationForm::Pill));
        assert_eq!(MedicationForm::from_str("suppository"), None);
    }

    #[test]
    fn test_entry_serializes_time_as_hhmm() {
        let entry = MedicationEntry::new(
            "id-1".to_string(),
            "Aspirin".to_string(),
            MedicationForm::Pill,
            NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
            Some("100mg".to_string()),
        );

        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["scheduled_time"], "08:00");
        assert_eq!(json["form"], "pill");
        assert_eq!(json["taken"], false);
    }

    #[test]
    fn test_new_medication_rejects_bad_time() {
        let parsed: Result<NewMedication, _> =
            serde_json::from_str(r#"{"name":"X","form":"pill","time":"8 o'clock"}"#);
        assert!(parsed.is_err());

        let parsed: NewMedication =
            serde_json::from_str(r#"{"name":"X","form":"capsule","time":"21:30"}"#).unwrap();
        assert_eq!(parsed.form, MedicationForm::Capsule);
        assert_eq!(parsed.dosage, None);
    }
}
