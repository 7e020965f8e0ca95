//! # Session Identity
//!
//! The caller's own `{username, role, ...}` object, cached locally. It is a
//! denormalized copy with no consistency guarantee against the store; a
//! promotion patches it only when the promoted username is the caller's.

use crate::Role;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Cached identity of the local session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionIdentity {
    fields: Map<String, Value>,
}

impl SessionIdentity {
    /// Create an empty identity (no session cached).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an identity for `username` holding `role`.
    #[must_use]
    pub fn with_user(username: &str, role: Role) -> Self {
        let mut fields = Map::new();
        fields.insert("username".to_string(), Value::from(username));
        fields.insert("role".to_string(), Value::from(role.as_str()));
        Self { fields }
    }

    /// Username of the session, if any.
    #[must_use]
    pub fn username(&self) -> Option<&str> {
        self.fields.get("username").and_then(Value::as_str)
    }

    /// Cached role of the session, if any.
    #[must_use]
    pub fn role(&self) -> Option<&str> {
        self.fields.get("role").and_then(Value::as_str)
    }

    /// Borrow the raw fields.
    #[must_use]
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Mirror a promotion into the cache.
    ///
    /// Returns `true` when `username` is this session's username and the
    /// role was updated. Otherwise the identity is left untouched.
    pub fn apply_promotion(&mut self, username: &str, role: Role) -> bool {
        if self.username() != Some(username) {
            return false;
        }
        self.fields
            .insert("role".to_string(), Value::from(role.as_str()));
        true
    }
}

impl From<Map<String, Value>> for SessionIdentity {
    fn from(fields: Map<String, Value>) -> Self {
        Self { fields }
    }
}
