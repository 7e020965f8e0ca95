//! # Roles
//!
//! The three roles a registered user can hold. The store enforces no schema,
//! so reading code treats `role` as a free JSON value; this enum is what the
//! promoter writes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A user role as written to the `role` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Default role assigned at registration.
    User,
    /// Elevated role with moderation rights.
    Moderator,
    /// Full administrative role.
    Admin,
}

impl Role {
    /// The wire name stored in the `role` field.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Moderator => "moderator",
            Self::Admin => "admin",
        }
    }

    /// Whether this role counts as privileged (anything but the default).
    #[must_use]
    pub fn is_privileged(&self) -> bool {
        !matches!(self, Self::User)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// TESTS
// =============================================================================
