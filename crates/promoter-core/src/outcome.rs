//! # Promotion Outcomes
//!
//! Every promotion ends in exactly one of three outcomes. Callers decide how
//! to present them; [`PromotionOutcome::message`] gives the stock wording.

use crate::Role;
use serde::{Deserialize, Serialize};

/// A completed promotion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Promotion {
    /// The promoted username.
    pub username: String,
    /// The role now stored.
    pub role: Role,
    /// Value written to `promotedAt` (Unix milliseconds).
    pub promoted_at: u64,
    /// Whether the local session cache was patched.
    pub session_updated: bool,
}

/// Result of a promotion request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PromotionOutcome {
    /// The record was updated.
    Promoted(Promotion),
    /// No record exists for the username; the store was not written.
    NotFound { username: String },
    /// The store (or the record) could not be processed.
    Failed { username: String, message: String },
}

impl PromotionOutcome {
    /// Build a failure from any displayable error.
    pub fn failed(username: impl Into<String>, error: impl std::fmt::Display) -> Self {
        Self::Failed {
            username: username.into(),
            message: error.to_string(),
        }
    }

    /// Whether the promotion went through.
    #[must_use]
    pub fn is_promoted(&self) -> bool {
        matches!(self, Self::Promoted(_))
    }

    /// The username this outcome refers to.
    #[must_use]
    pub fn username(&self) -> &str {
        match self {
            Self::Promoted(p) => &p.username,
            Self::NotFound { username } | Self::Failed { username, .. } => username,
        }
    }

    /// User-facing message for this outcome.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Promoted(p) => format!("Successfully promoted {} to {}!", p.username, p.role),
            Self::NotFound { username } => format!("User {} not found", username),
            Self::Failed { message, .. } => format!("Error promoting user: {}", message),
        }
    }
}
