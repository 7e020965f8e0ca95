//! # Privileged User Listing
//!
//! Projects the whole `registered_users` collection onto the users that hold
//! a role other than the default.

use crate::Role;
use crate::record::{CREATED_AT_FIELD, PROMOTED_AT_FIELD, ROLE_FIELD};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One entry of the privileged listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrivilegedUser {
    /// Collection key of the record.
    pub username: String,
    /// Role exactly as stored. Usually a string, but the store enforces no
    /// schema.
    pub role: Value,
    /// Promotion time, copied verbatim.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promoted_at: Option<Value>,
    /// Registration time, copied verbatim.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Value>,
}

/// Whether a stored role marks its user as privileged.
///
/// Unset-looking values (`null`, `false`, `0`, `""`) and the default role
/// do not. Anything else does, including role names this crate does not
/// know and non-string values.
#[must_use]
pub fn is_privileged_role(role: &Value) -> bool {
    let set = match role {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    };
    set && Role::deserialize(role).map_or(true, |r| r.is_privileged())
}

/// Filter a collection snapshot down to privileged users.
///
/// Entries are kept when their value is an object whose `role` passes
/// [`is_privileged_role`]. Order follows the collection's own enumeration
/// order. A snapshot that is not an object yields nothing.
#[must_use]
pub fn privileged_users(collection: &Value) -> Vec<PrivilegedUser> {
    let Some(entries) = collection.as_object() else {
        return Vec::new();
    };

    entries
        .iter()
        .filter_map(|(username, record)| {
            let record = record.as_object()?;
            let role = record.get(ROLE_FIELD)?;
            if !is_privileged_role(role) {
                return None;
            }
            Some(PrivilegedUser {
                username: username.clone(),
                role: role.clone(),
                promoted_at: record.get(PROMOTED_AT_FIELD).cloned(),
                created_at: record.get(CREATED_AT_FIELD).cloned(),
            })
        })
        .collect()
}

// =============================================================================
// TESTS
// =============================================================================
