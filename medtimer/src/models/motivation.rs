//! Motivation tier derived from the adherence percentage.

use serde::{Deserialize, Serialize};

/// Encouragement bucket for the motivation panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Motivation {
    /// Every dose taken.
    Perfect,
    /// At least 80%.
    Great,
    /// At least 50%.
    Good,
    /// Below 50%.
    TryAgain,
}

impl Motivation {
    /// Convert tier to string.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Perfect => "perfect",
            Self::Great => "great",
            Self::Good => "good",
            Self::TryAgain => "try_again",
        }
    }

    /// Headline shown in the motivation panel.
    pub const fn headline(self) -> &'static str {
        match self {
            Self::Perfect => "Perfect Adherence!",
            Self::Great => "Great Job!",
            Self::Good => "Keep Going!",
            Self::TryAgain => "Try Again Tomorrow!",
        }
    }
}

impl std::fmt::Display for Motivation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
