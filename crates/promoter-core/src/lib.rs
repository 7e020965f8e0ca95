//! # Promoter Core
//!
//! Pure logic for promoting users stored in a Realtime Database
//! `registered_users` collection.
//!
//! This crate never talks to the store. The app layer reads a record, hands
//! it to [`UserRecord::promote`], and writes the result back. Everything here
//! is synchronous and deterministic: the promotion timestamp is an argument.
//!
//! ## Layout
//!
//! - [`role`]: the role enum and its wire names
//! - [`record`]: user records and the shallow role merge
//! - [`listing`]: projection of the collection onto privileged users
//! - [`session`]: the caller's cached session identity
//! - [`outcome`]: structured results of a promotion

pub mod listing;
pub mod outcome;
pub mod record;
pub mod role;
pub mod session;

pub use listing::{PrivilegedUser, is_privileged_role, privileged_users};
pub use outcome::{Promotion, PromotionOutcome};
pub use record::{UserRecord, normalize_username, user_path};
pub use role::Role;
pub use session::SessionIdentity;

use thiserror::Error;

// =============================================================================
// CONSTANTS
// =============================================================================

/// Collection holding one record per registered username.
pub const USERS_COLLECTION: &str = "registered_users";

/// Value written to `promotedBy` on every promotion.
///
/// This names the tool, not the operator who ran it.
pub const PROMOTED_BY: &str = "AdminPromoter";

/// Key under which the caller's own session identity is cached locally.
pub const SESSION_KEY: &str = "hackconvo_user";

// =============================================================================
// ERROR TYPE
// =============================================================================

/// Errors from the promotion logic.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// The username was empty after trimming.
    #[error("Please enter a username")]
    EmptyUsername,

    /// The stored value is not a JSON object and cannot carry a role.
    #[error("record at {path} is not an object")]
    NotAnObject { path: String },
}
