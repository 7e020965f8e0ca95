//! In-memory store.
//!
//! Holds the whole database as one JSON tree. Revisions are a hash of the
//! node's serialized content, the same notion of "unchanged" an ETag gives.

use super::{Revision, Snapshot, StoreError, UserStore, WriteOutcome};
use serde_json::{Map, Value};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::{Mutex, MutexGuard};

/// In-process [`UserStore`] backed by a JSON tree.
#[derive(Debug, Default)]
pub struct MemoryStore {
    root: Mutex<Value>,
    failure: Mutex<Option<String>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding `root` as the database root.
    #[must_use]
    pub fn from_value(root: Value) -> Self {
        Self {
            root: Mutex::new(root),
            failure: Mutex::new(None),
        }
    }

    /// Copy of the whole tree.
    pub fn dump(&self) -> Result<Value, StoreError> {
        Ok(self.lock_root()?.clone())
    }

    /// Value at `path`, `None` when absent.
    pub fn get(&self, path: &str) -> Result<Option<Value>, StoreError> {
        let root = self.lock_root()?;
        Ok(node(&root, path).filter(|v| !v.is_null()).cloned())
    }

    /// Unconditionally replace the node at `path`.
    pub fn set(&self, path: &str, value: Value) -> Result<(), StoreError> {
        let mut root = self.lock_root()?;
        *node_mut(&mut root, path) = value;
        Ok(())
    }

    /// Make every subsequent store call fail with `message`.
    pub fn fail_with(&self, message: impl Into<String>) {
        if let Ok(mut failure) = self.failure.lock() {
            *failure = Some(message.into());
        }
    }

    /// Clear a failure set by [`MemoryStore::fail_with`].
    pub fn recover(&self) {
        if let Ok(mut failure) = self.failure.lock() {
            *failure = None;
        }
    }

    fn check_failure(&self) -> Result<(), StoreError> {
        let failure = self
            .failure
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".to_string()))?;
        match failure.as_ref() {
            Some(message) => Err(StoreError::Unavailable(message.clone())),
            None => Ok(()),
        }
    }

    fn lock_root(&self) -> Result<MutexGuard<'_, Value>, StoreError> {
        self.root
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".to_string()))
    }
}

impl UserStore for MemoryStore {
    async fn read(&self, path: &str) -> Result<Option<Snapshot>, StoreError> {
        self.check_failure()?;
        let root = self.lock_root()?;
        Ok(node(&root, path)
            .filter(|v| !v.is_null())
            .map(|value| Snapshot {
                value: value.clone(),
                revision: revision_of(value),
            }))
    }

    async fn write_if(
        &self,
        path: &str,
        value: &Value,
        expected: &Revision,
    ) -> Result<WriteOutcome, StoreError> {
        self.check_failure()?;
        let mut root = self.lock_root()?;
        let current = node(&root, path).cloned().unwrap_or(Value::Null);
        if revision_of(&current) != *expected {
            return Ok(WriteOutcome::Conflict);
        }
        *node_mut(&mut root, path) = value.clone();
        Ok(WriteOutcome::Written)
    }
}

// =============================================================================
// TREE HELPERS
// =============================================================================

fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

fn node<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    segments(path).try_fold(root, |current, segment| current.get(segment))
}

/// Walk to `path`, turning anything in the way into an object.
fn node_mut<'a>(root: &'a mut Value, path: &str) -> &'a mut Value {
    segments(path).fold(root, |current, segment| {
        if !current.is_object() {
            *current = Value::Object(Map::new());
        }
        match current {
            Value::Object(map) => map.entry(segment.to_string()).or_insert(Value::Null),
            // replaced by an object just above
            other => other,
        }
    })
}

fn revision_of(value: &Value) -> Revision {
    let mut hasher = DefaultHasher::new();
    value.to_string().hash(&mut hasher);
    Revision::new(format!("{:016x}", hasher.finish()))
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn seeded() -> MemoryStore {
        MemoryStore::from_value(json!({
            "registered_users": {
                "alice": {"role": "user", "createdAt": 100}
            }
        }))
    }

    #[tokio::test]
    async fn read_present_and_absent() {
        let store = seeded();
        let alice = store.read("registered_users/alice").await.ok().flatten();
        assert_eq!(
            alice.map(|s| s.value),
            Some(json!({"role": "user", "createdAt": 100}))
        );
        let bob = store.read("registered_users/bob").await.ok().flatten();
        assert!(bob.is_none());
    }

    #[tokio::test]
    async fn write_if_matching_revision() {
        let store = seeded();
        let snapshot = store.read("registered_users/alice").await.unwrap().unwrap();
        let outcome = store
            .write_if("registered_users/alice", &json!({"role": "admin"}), &snapshot.revision)
            .await
            .ok();
        assert_eq!(outcome, Some(WriteOutcome::Written));
        assert_eq!(
            store.get("registered_users/alice").ok().flatten(),
            Some(json!({"role": "admin"}))
        );
    }

    #[tokio::test]
    async fn write_if_stale_revision_conflicts() {
        let store = seeded();
        let snapshot = store.read("registered_users/alice").await.unwrap().unwrap();
        let _ = store.set("registered_users/alice/bio", json!("hi"));

        let outcome = store
            .write_if("registered_users/alice", &json!({"role": "admin"}), &snapshot.revision)
            .await
            .ok();
        assert_eq!(outcome, Some(WriteOutcome::Conflict));
        assert_eq!(
            store.get("registered_users/alice/role").ok().flatten(),
            Some(json!("user"))
        );
    }

    #[tokio::test]
    async fn failure_injection() {
        let store = seeded();
        store.fail_with("Permission denied");
        let err = store.read("registered_users").await.err().map(|e| e.to_string());
        assert_eq!(err, Some("Permission denied".to_string()));

        store.recover();
        assert!(store.read("registered_users").await.is_ok());
    }

    #[test]
    fn set_creates_intermediate_objects() {
        let store = MemoryStore::new();
        let _ = store.set("registered_users/zoe", json!({"role": "user"}));
        assert_eq!(
            store.dump().ok(),
            Some(json!({"registered_users": {"zoe": {"role": "user"}}}))
        );
    }

    #[test]
    fn revision_tracks_content() {
        assert_eq!(revision_of(&json!({"a": 1})), revision_of(&json!({"a": 1})));
        assert_ne!(revision_of(&json!({"a": 1})), revision_of(&json!({"a": 2})));
    }
}
