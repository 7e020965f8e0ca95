//! # Promoter
//!
//! Role assignment against a [`UserStore`].
//!
//! A promotion is a read-modify-write of `registered_users/<username>`:
//! read the record and its revision, merge the role fields, write back only
//! if the record is still at that revision. A conflict means someone else
//! wrote in between, so the promoter re-reads and merges again, up to
//! [`PromoterConfig::max_attempts`] times. No other failure is retried.

use crate::session::SessionFile;
use crate::store::{StoreError, UserStore, WriteOutcome};
use promoter_core::{
    PrivilegedUser, Promotion, PromotionOutcome, Role, USERS_COLLECTION, UserRecord,
    normalize_username, privileged_users, user_path,
};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// Default number of conditional write attempts per promotion.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Source of promotion timestamps, in Unix milliseconds.
pub type Clock = fn() -> u64;

/// Wall clock in Unix milliseconds.
pub fn system_clock() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Tunables for the promoter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromoterConfig {
    /// Total conditional write attempts before giving up on a contended record.
    pub max_attempts: u32,
}

impl Default for PromoterConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

/// Errors that end a single promotion or listing.
#[derive(Debug, Error)]
pub enum PromoteError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Record(#[from] promoter_core::Error),

    #[error("record at {path} changed concurrently on each of {attempts} attempts")]
    Contended { path: String, attempts: u32 },
}

/// Promotes users held in a [`UserStore`].
#[derive(Debug)]
pub struct Promoter<S> {
    store: S,
    session: Option<SessionFile>,
    clock: Clock,
    config: PromoterConfig,
}

impl<S: UserStore> Promoter<S> {
    /// Create a promoter over a ready store, with no session cache.
    pub fn new(store: S) -> Self {
        Self {
            store,
            session: None,
            clock: system_clock,
            config: PromoterConfig::default(),
        }
    }

    /// Mirror promotions of the caller's own username into `session`.
    #[must_use]
    pub fn with_session(mut self, session: SessionFile) -> Self {
        self.session = Some(session);
        self
    }

    /// Replace the timestamp source.
    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Replace the tunables (write attempts).
    #[must_use]
    pub fn with_config(mut self, config: PromoterConfig) -> Self {
        self.config = config;
        self
    }

    /// Promote `username` to admin.
    pub async fn promote_to_admin(&self, username: &str) -> PromotionOutcome {
        self.promote(username, Role::Admin).await
    }

    /// Promote `username` to moderator.
    pub async fn promote_to_moderator(&self, username: &str) -> PromotionOutcome {
        self.promote(username, Role::Moderator).await
    }

    /// Set `username`'s role to `role`.
    ///
    /// Never fails: store errors become [`PromotionOutcome::Failed`].
    pub async fn promote(&self, username: &str, role: Role) -> PromotionOutcome {
        let username = match normalize_username(username) {
            Ok(username) => username,
            Err(e) => {
                warn!("{}", e);
                return PromotionOutcome::failed(username.trim(), e);
            }
        };

        info!(username, %role, "promoting user");
        match self.try_promote(username, role).await {
            Ok(Some(promotion)) => {
                info!(username, %role, promoted_at = promotion.promoted_at, "promoted user");
                PromotionOutcome::Promoted(promotion)
            }
            Ok(None) => {
                warn!(username, "user not found");
                PromotionOutcome::NotFound {
                    username: username.to_string(),
                }
            }
            Err(e) => {
                error!(username, error = %e, "error promoting user");
                PromotionOutcome::failed(username, e)
            }
        }
    }

    async fn try_promote(
        &self,
        username: &str,
        role: Role,
    ) -> Result<Option<Promotion>, PromoteError> {
        let path = user_path(username);
        let attempts = self.config.max_attempts.max(1);

        for attempt in 1..=attempts {
            let Some(snapshot) = self.store.read(&path).await? else {
                return Ok(None);
            };
            debug!(username, attempt, record = %snapshot.value, "current user data");

            let mut record = UserRecord::from_value(&path, snapshot.value)?;
            let promoted_at = (self.clock)();
            record.promote(role, promoted_at);

            match self
                .store
                .write_if(&path, &record.into_value(), &snapshot.revision)
                .await?
            {
                WriteOutcome::Written => {
                    let session_updated = self.mirror_session(username, role);
                    return Ok(Some(Promotion {
                        username: username.to_string(),
                        role,
                        promoted_at,
                        session_updated,
                    }));
                }
                WriteOutcome::Conflict => {
                    warn!(username, attempt, "record changed during promotion, retrying");
                }
            }
        }

        Err(PromoteError::Contended { path, attempts })
    }

    /// Patch the session cache; a cache failure never fails the promotion.
    fn mirror_session(&self, username: &str, role: Role) -> bool {
        let Some(session) = &self.session else {
            return false;
        };
        match session.apply_promotion(username, role) {
            Ok(true) => {
                info!(username, path = %session.path().display(), "updated current user session");
                true
            }
            Ok(false) => false,
            Err(e) => {
                warn!(username, error = %e, "could not update current user session");
                false
            }
        }
    }

    /// Users whose role is set and not `"user"`, in store order.
    ///
    /// Failures are logged and yield an empty list.
    pub async fn list_privileged_users(&self) -> Vec<PrivilegedUser> {
        match self.try_list_privileged_users().await {
            Ok(users) => users,
            Err(e) => {
                error!(error = %e, "error listing users with roles");
                Vec::new()
            }
        }
    }

    /// Same as [`Promoter::list_privileged_users`], keeping the error.
    pub async fn try_list_privileged_users(&self) -> Result<Vec<PrivilegedUser>, PromoteError> {
        info!("listing all users with roles");
        let Some(snapshot) = self.store.read(USERS_COLLECTION).await? else {
            info!("no users found");
            return Ok(Vec::new());
        };

        let users = privileged_users(&snapshot.value);
        info!(count = users.len(), "current users with roles");
        Ok(users)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use serde_json::json;

    fn fixed_clock() -> u64 {
        1_000
    }

    fn store() -> MemoryStore {
        MemoryStore::from_value(json!({
            "registered_users": {
                "alice": {"role": "user", "createdAt": 100},
                "odd": "not a record"
            }
        }))
    }

    #[tokio::test]
    async fn promotes_existing_user() {
        let store = store();
        let promoter = Promoter::new(&store).with_clock(fixed_clock);
        let outcome = promoter.promote_to_moderator("alice").await;

        assert_eq!(
            outcome,
            PromotionOutcome::Promoted(Promotion {
                username: "alice".to_string(),
                role: Role::Moderator,
                promoted_at: 1_000,
                session_updated: false,
            })
        );
        assert_eq!(
            store.get("registered_users/alice").unwrap(),
            Some(json!({
                "role": "moderator",
                "createdAt": 100,
                "promotedAt": 1_000,
                "promotedBy": "AdminPromoter"
            }))
        );
    }

    #[tokio::test]
    async fn trims_username() {
        let promoter = Promoter::new(store());
        let outcome = promoter.promote_to_admin("  alice  ").await;
        assert!(outcome.is_promoted());
        assert_eq!(outcome.username(), "alice");
    }

    #[tokio::test]
    async fn blank_username_fails_without_store_access() {
        let store = store();
        store.fail_with("must not be called");
        let promoter = Promoter::new(&store);
        let outcome = promoter.promote_to_admin("   ").await;
        assert_eq!(outcome.message(), "Error promoting user: Please enter a username");
    }

    #[tokio::test]
    async fn non_object_record_fails() {
        let store = store();
        let promoter = Promoter::new(&store);
        let outcome = promoter.promote_to_admin("odd").await;
        assert!(matches!(outcome, PromotionOutcome::Failed { .. }));
        assert_eq!(
            store.get("registered_users/odd").unwrap(),
            Some(json!("not a record"))
        );
    }

    #[tokio::test]
    async fn zero_attempts_still_tries_once() {
        let promoter =
            Promoter::new(store()).with_config(PromoterConfig { max_attempts: 0 });
        assert!(promoter.promote_to_admin("alice").await.is_promoted());
    }

    #[tokio::test]
    async fn listing_skips_non_records() {
        let promoter = Promoter::new(store());
        promoter.promote_to_admin("alice").await;
        let users = promoter.list_privileged_users().await;
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].username, "alice");
    }

    #[test]
    fn system_clock_is_after_2020() {
        assert!(system_clock() > 1_577_836_800_000);
    }
}
