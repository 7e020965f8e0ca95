//! # Session Cache
//!
//! The caller's own `{username, role, ...}` identity, persisted as a JSON
//! file under the `hackconvo_user` key name. A promotion of the caller's own
//! username patches the cached role so the local session reflects it without
//! a fresh login.

use promoter_core::{Role, SESSION_KEY, SessionIdentity};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors reading or writing the session file.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("cannot access session file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("session file {path} is not valid JSON: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// JSON file holding the cached [`SessionIdentity`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionFile {
    path: PathBuf,
}

impl SessionFile {
    /// Use the session file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<config dir>/promoter/hackconvo_user.json`, if the platform has a config dir.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("promoter").join(format!("{}.json", SESSION_KEY)))
    }

    /// Location of the file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the cached identity.
    ///
    /// A missing or blank file, or a JSON value that is not an object, reads
    /// as an empty identity.
    pub fn load(&self) -> Result<SessionIdentity, SessionError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(SessionIdentity::new()),
            Err(source) => {
                return Err(SessionError::Io {
                    path: self.path.clone(),
                    source,
                });
            }
        };
        if contents.trim().is_empty() {
            return Ok(SessionIdentity::new());
        }

        let value: serde_json::Value =
            serde_json::from_str(&contents).map_err(|source| SessionError::Json {
                path: self.path.clone(),
                source,
            })?;
        Ok(match value {
            serde_json::Value::Object(fields) => SessionIdentity::from(fields),
            _ => SessionIdentity::new(),
        })
    }

    /// Persist `identity`, creating parent directories as needed.
    pub fn save(&self, identity: &SessionIdentity) -> Result<(), SessionError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| SessionError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let json = serde_json::to_string_pretty(identity).map_err(|source| SessionError::Json {
            path: self.path.clone(),
            source,
        })?;
        fs::write(&self.path, json).map_err(|source| SessionError::Io {
            path: self.path.clone(),
            source,
        })
    }

    /// Mirror a promotion into the cached identity.
    ///
    /// Writes the file only when the cached username equals `username`.
    /// Returns whether it did.
    pub fn apply_promotion(&self, username: &str, role: Role) -> Result<bool, SessionError> {
        let mut identity = self.load()?;
        if !identity.apply_promotion(username, role) {
            return Ok(false);
        }
        self.save(&identity)?;
        Ok(true)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn session_in(dir: &TempDir) -> SessionFile {
        SessionFile::new(dir.path().join("nested").join("hackconvo_user.json"))
    }

    #[test]
    fn missing_file_is_empty_identity() {
        let dir = tempfile::tempdir().unwrap();
        let identity = session_in(&dir).load().unwrap();
        assert_eq!(identity, SessionIdentity::new());
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let session = session_in(&dir);
        session
            .save(&SessionIdentity::with_user("alice", Role::User))
            .unwrap();

        let loaded = session.load().unwrap();
        assert_eq!(loaded.username(), Some("alice"));
        assert_eq!(loaded.role(), Some("user"));
    }

    #[test]
    fn apply_promotion_matching_user() {
        let dir = tempfile::tempdir().unwrap();
        let session = session_in(&dir);
        session
            .save(&SessionIdentity::with_user("alice", Role::User))
            .unwrap();

        assert!(session.apply_promotion("alice", Role::Moderator).unwrap());
        assert_eq!(session.load().unwrap().role(), Some("moderator"));
    }

    #[test]
    fn apply_promotion_other_user_leaves_file_alone() {
        let dir = tempfile::tempdir().unwrap();
        let session = session_in(&dir);
        fs::create_dir_all(session.path().parent().unwrap()).unwrap();
        let original = "{\"username\":\"alice\",\"role\":\"user\"}";
        fs::write(session.path(), original).unwrap();

        assert!(!session.apply_promotion("bob", Role::Admin).unwrap());
        assert_eq!(fs::read_to_string(session.path()).unwrap(), original);
    }

    #[test]
    fn apply_promotion_without_file_creates_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let session = session_in(&dir);
        assert!(!session.apply_promotion("alice", Role::Admin).unwrap());
        assert!(!session.path().exists());
    }

    #[test]
    fn non_object_json_is_empty_identity() {
        let dir = tempfile::tempdir().unwrap();
        let session = SessionFile::new(dir.path().join("s.json"));
        fs::write(session.path(), "null").unwrap();
        assert_eq!(session.load().unwrap(), SessionIdentity::new());
    }

    #[test]
    fn invalid_json_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let session = SessionFile::new(dir.path().join("s.json"));
        fs::write(session.path(), "{broken").unwrap();
        assert!(matches!(session.load(), Err(SessionError::Json { .. })));
    }

    #[test]
    fn extra_fields_survive_patch() {
        let dir = tempfile::tempdir().unwrap();
        let session = SessionFile::new(dir.path().join("s.json"));
        fs::write(
            session.path(),
            r#"{"username":"alice","role":"user","displayName":"Alice"}"#,
        )
        .unwrap();

        session.apply_promotion("alice", Role::Admin).unwrap();
        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(session.path()).unwrap()).unwrap();
        assert_eq!(
            value,
            json!({"username": "alice", "role": "admin", "displayName": "Alice"})
        );
    }
}
