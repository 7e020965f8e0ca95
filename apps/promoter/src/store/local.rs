//! JSON file store.
//!
//! The file holds the whole database root. It is loaded once into a
//! [`MemoryStore`], and every successful conditional write is saved back
//! before `write_if` returns, so a caller that sees `Written` knows the file
//! already holds the new value.

use super::{MemoryStore, Revision, Snapshot, StoreError, UserStore, WriteOutcome};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// [`UserStore`] over a JSON file holding the database root.
#[derive(Debug)]
pub struct LocalFileStore {
    path: PathBuf,
    memory: MemoryStore,
}

impl LocalFileStore {
    /// Load the database root from `path`.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let contents = fs::read_to_string(&path).map_err(|source| StoreError::LocalIo {
            path: path.clone(),
            source,
        })?;
        let root: Value = serde_json::from_str(&contents).map_err(|source| {
            StoreError::LocalJson {
                path: path.clone(),
                source,
            }
        })?;
        Ok(Self {
            path,
            memory: MemoryStore::from_value(root),
        })
    }

    /// Location of the file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save(&self) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(&self.memory.dump()?).map_err(|source| {
            StoreError::LocalJson {
                path: self.path.clone(),
                source,
            }
        })?;
        fs::write(&self.path, json).map_err(|source| StoreError::LocalIo {
            path: self.path.clone(),
            source,
        })
    }
}

impl UserStore for LocalFileStore {
    async fn read(&self, path: &str) -> Result<Option<Snapshot>, StoreError> {
        self.memory.read(path).await
    }

    async fn write_if(
        &self,
        path: &str,
        value: &Value,
        expected: &Revision,
    ) -> Result<WriteOutcome, StoreError> {
        let previous = self.memory.get(path)?;
        let outcome = self.memory.write_if(path, value, expected).await?;
        if outcome == WriteOutcome::Written {
            if let Err(e) = self.save() {
                warn!(path, error = %e, "could not save local database, undoing write");
                self.memory.set(path, previous.unwrap_or(Value::Null))?;
                return Err(e);
            }
            debug!(file = %self.path.display(), "saved local database");
        }
        Ok(outcome)
    }
}
