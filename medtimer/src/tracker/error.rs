//! Rejections the tracker hands back instead of mutating state.

use thiserror::Error;

use super::Notice;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TrackerError {
    #[error("Please enter a medicine name!")]
    EmptyName,

    #[error("Add some medicines first!")]
    NoMedications,

    #[error("No medication with id {0}")]
    NotFound(String),
}

impl TrackerError {
    /// The warning the renderer should show for this rejection.
    pub fn notice(&self) -> Notice {
        Notice::warning(self.to_string())
    }
}
