//! Data models for medtimer entities.

mod history;
mod medication;
mod motivation;
mod status;
pub mod time_format;

pub use history::HistoryRecord;
pub use medication::{MedicationEntry, MedicationForm, NewMedication};
pub use motivation::Motivation;
pub use status::DoseStatus;
