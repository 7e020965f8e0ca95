//! # Store Module
//!
//! The seam between the promoter and the database holding user records.
//!
//! A store exposes exactly two primitives: read a node together with a
//! revision token, and write a node only if it is still at that revision.
//! Together they make the promotion's read-modify-write safe against
//! concurrent writers.
//!
//! Implementations:
//! - [`FirebaseStore`]: the Realtime Database over REST (ETag revisions)
//! - [`MemoryStore`]: an in-process JSON tree (content-hash revisions)
//! - [`LocalFileStore`]: a [`MemoryStore`] loaded from and saved to a JSON file

mod firebase;
mod local;
mod memory;

pub use firebase::FirebaseStore;
pub use local::LocalFileStore;
pub use memory::MemoryStore;

use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::path::PathBuf;
use thiserror::Error;

// =============================================================================
// TYPES
// =============================================================================

/// Opaque token identifying the version of a node that was read.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Revision(String);

impl Revision {
    /// Wrap a store-specific token.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The raw token.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A present node and the revision it was read at.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub value: Value,
    pub revision: Revision,
}

/// Result of a conditional write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The value was stored.
    Written,
    /// The node moved past the expected revision; nothing was stored.
    Conflict,
}

/// Errors raised by a store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The Realtime Database client failed.
    #[error(transparent)]
    Firebase(#[from] promoter_firebase::Error),

    /// The store cannot serve requests.
    #[error("{0}")]
    Unavailable(String),

    /// The local database file could not be read or written.
    #[error("cannot access local database {path}: {source}")]
    LocalIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The local database file does not hold valid JSON.
    #[error("local database {path} is not valid JSON: {source}")]
    LocalJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

// =============================================================================
// USERSTORE TRAIT
// =============================================================================

/// Record storage addressed by slash-separated paths.
pub trait UserStore {
    /// Read the node at `path`. `None` when nothing is stored there.
    fn read(
        &self,
        path: &str,
    ) -> impl Future<Output = Result<Option<Snapshot>, StoreError>> + Send;

    /// Replace the node at `path` with `value` if it is still at `expected`.
    fn write_if(
        &self,
        path: &str,
        value: &Value,
        expected: &Revision,
    ) -> impl Future<Output = Result<WriteOutcome, StoreError>> + Send;
}

impl<S: UserStore + Sync> UserStore for &S {
    fn read(
        &self,
        path: &str,
    ) -> impl Future<Output = Result<Option<Snapshot>, StoreError>> + Send {
        (**self).read(path)
    }

    fn write_if(
        &self,
        path: &str,
        value: &Value,
        expected: &Revision,
    ) -> impl Future<Output = Result<WriteOutcome, StoreError>> + Send {
        (**self).write_if(path, value, expected)
    }
}
