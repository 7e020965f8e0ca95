//! Realtime Database store.
//!
//! Revisions are the ETags the REST API hands out; conditional writes use
//! `if-match`, so a record changed between read and write is reported as a
//! conflict instead of being overwritten.

use super::{Revision, Snapshot, StoreError, UserStore, WriteOutcome};
use promoter_firebase::{FirebaseClient, PutOutcome};
use serde_json::Value;
use tracing::debug;

/// [`UserStore`] over a [`FirebaseClient`].
#[derive(Debug, Clone)]
pub struct FirebaseStore {
    client: FirebaseClient,
}

impl FirebaseStore {
    /// Wrap a configured client.
    #[must_use]
    pub fn new(client: FirebaseClient) -> Self {
        Self { client }
    }
}

impl UserStore for FirebaseStore {
    async fn read(&self, path: &str) -> Result<Option<Snapshot>, StoreError> {
        let snapshot = self.client.get(path).await?;
        if !snapshot.exists() {
            return Ok(None);
        }
        Ok(Some(Snapshot {
            value: snapshot.value,
            revision: Revision::new(snapshot.etag),
        }))
    }

    async fn write_if(
        &self,
        path: &str,
        value: &Value,
        expected: &Revision,
    ) -> Result<WriteOutcome, StoreError> {
        match self
            .client
            .put_if_match(path, value, expected.as_str())
            .await?
        {
            PutOutcome::Written => Ok(WriteOutcome::Written),
            PutOutcome::PreconditionFailed { current_etag } => {
                debug!(path, expected = %expected, current = ?current_etag, "ETag mismatch");
                Ok(WriteOutcome::Conflict)
            }
        }
    }
}
