//! # User Records
//!
//! A record is whatever JSON object the registration flow stored under
//! `registered_users/<username>`. Only `role`, `promotedAt` and `promotedBy`
//! are interpreted; every other field is carried through untouched.

use crate::{Error, PROMOTED_BY, Role, USERS_COLLECTION};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Field holding the role name.
pub const ROLE_FIELD: &str = "role";

/// Field holding the promotion time in Unix milliseconds.
pub const PROMOTED_AT_FIELD: &str = "promotedAt";

/// Field naming the tool that performed the promotion.
pub const PROMOTED_BY_FIELD: &str = "promotedBy";

/// Field holding the registration time.
pub const CREATED_AT_FIELD: &str = "createdAt";

/// Trim a username and reject it when nothing is left.
pub fn normalize_username(username: &str) -> Result<&str, Error> {
    let trimmed = username.trim();
    if trimmed.is_empty() {
        Err(Error::EmptyUsername)
    } else {
        Ok(trimmed)
    }
}

/// Store path of a user's record.
#[must_use]
pub fn user_path(username: &str) -> String {
    format!("{}/{}", USERS_COLLECTION, username)
}

/// A user record as stored in the database.
///
/// Field order is preserved, so writing a record back only moves the fields
/// a promotion adds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserRecord {
    fields: Map<String, Value>,
}

impl UserRecord {
    /// Create an empty record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap a value read from `path`.
    ///
    /// Fails with [`Error::NotAnObject`] for scalars and arrays.
    pub fn from_value(path: &str, value: Value) -> Result<Self, Error> {
        match value {
            Value::Object(fields) => Ok(Self { fields }),
            _ => Err(Error::NotAnObject {
                path: path.to_string(),
            }),
        }
    }

    /// The role string, if present and a string.
    #[must_use]
    pub fn role(&self) -> Option<&str> {
        self.fields.get(ROLE_FIELD).and_then(Value::as_str)
    }

    /// The promotion timestamp, if the record was ever promoted.
    #[must_use]
    pub fn promoted_at(&self) -> Option<u64> {
        self.fields.get(PROMOTED_AT_FIELD).and_then(Value::as_u64)
    }

    /// Look up any field.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Set any field, returning the previous value.
    pub fn insert(&mut self, field: impl Into<String>, value: Value) -> Option<Value> {
        self.fields.insert(field.into(), value)
    }

    /// Shallow-merge the promotion fields over this record.
    ///
    /// Sets `role`, `promotedAt` (Unix milliseconds) and `promotedBy`.
    /// Nothing else is touched.
    pub fn promote(&mut self, role: Role, now_ms: u64) {
        self.fields
            .insert(ROLE_FIELD.to_string(), Value::from(role.as_str()));
        self.fields
            .insert(PROMOTED_AT_FIELD.to_string(), Value::from(now_ms));
        self.fields
            .insert(PROMOTED_BY_FIELD.to_string(), Value::from(PROMOTED_BY));
    }

    /// Borrow the raw fields.
    #[must_use]
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Convert into the JSON value written back to the store.
    #[must_use]
    pub fn into_value(self) -> Value {
        Value::Object(self.fields)
    }
}

impl From<Map<String, Value>> for UserRecord {
    fn from(fields: Map<String, Value>) -> Self {
        Self { fields }
    }
}

// =============================================================================
// TESTS
// =============================================================================
