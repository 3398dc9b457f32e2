// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Credential store: password verification and group lookup over the
//! forum's user directory.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{debug, error};

use super::{password::password_matches, AuthError};
use crate::storage::{CredentialLookup, CredentialRecord, StorageError, UserDirectory, UserId, UserRecord};

/// Why a password check failed.
///
/// Callers must collapse `UserNotFound` and `InvalidPassword` into
/// [`AuthError::InvalidCredentials`] before anything reaches the user.
#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("username does not exist")]
    UserNotFound,

    #[error("invalid password")]
    InvalidPassword,

    #[error("user directory unavailable: {0}")]
    StoreUnavailable(#[from] StorageError),

    #[error("password hashing task failed: {0}")]
    Hashing(String),
}

impl From<CredentialError> for AuthError {
    fn from(err: CredentialError) -> Self {
        match err {
            CredentialError::UserNotFound | CredentialError::InvalidPassword => {
                AuthError::InvalidCredentials
            }
            CredentialError::StoreUnavailable(_) => AuthError::StoreUnavailable,
            CredentialError::Hashing(msg) => AuthError::InternalError(msg),
        }
    }
}

/// Salt for the digest run against unknown identifiers.
const UNKNOWN_USER_SALT: &str = "unknown-user";

/// Run the password digest on the blocking pool.
async fn digest_matches(password: &str, salt: &str, stored: &str) -> Result<bool, CredentialError> {
    let (password, salt, stored) = (password.to_owned(), salt.to_owned(), stored.to_owned());
    tokio::task::spawn_blocking(move || password_matches(&password, &salt, &stored))
        .await
        .map_err(|e| {
            error!(error = %e, "Password hashing task failed");
            CredentialError::Hashing(e.to_string())
        })
}

/// Read-only access to forum credentials.
#[derive(Clone)]
pub struct CredentialStore {
    directory: Arc<dyn UserDirectory>,
}

impl CredentialStore {
    pub fn new(directory: Arc<dyn UserDirectory>) -> Self {
        Self { directory }
    }

    pub fn directory(&self) -> &Arc<dyn UserDirectory> {
        &self.directory
    }

    /// Check a username (or email address) and password.
    ///
    /// The digest runs on the blocking pool; it is CPU-bound and takes no
    /// locks. Unknown identifiers run the same digest before failing.
    pub async fn verify_password(
        &self,
        identifier: &str,
        password: &str,
    ) -> Result<CredentialRecord, CredentialError> {
        let found = self
            .directory
            .find_credentials(CredentialLookup::from_identifier(identifier))
            .await?;

        let Some(record) = found else {
            digest_matches(password, UNKNOWN_USER_SALT, "").await?;
            return Err(CredentialError::UserNotFound);
        };

        if digest_matches(password, &record.salt, &record.password_hash).await? {
            Ok(record)
        } else {
            debug!(user_id = record.user_id, "Password mismatch");
            Err(CredentialError::InvalidPassword)
        }
    }

    /// Group titles of a user; empty when the user belongs to none.
    pub async fn fetch_groups(&self, user_id: UserId) -> Result<BTreeSet<String>, StorageError> {
        Ok(self
            .directory
            .groups_for_user(user_id)
            .await?
            .into_iter()
            .collect())
    }

    pub async fn find_user(&self, user_id: UserId) -> Result<Option<UserRecord>, StorageError> {
        self.directory.find_user(user_id).await
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::auth::password::hash_password;
    use crate::storage::memory::{MemoryDirectory, MemoryUser};
    use std::time::{Duration, Instant};

    pub(crate) const ALICE_PASSWORD: &str = "correct horse";

    pub(crate) async fn directory_with_alice() -> Arc<MemoryDirectory> {
        let dir = Arc::new(MemoryDirectory::new());
        dir.insert_user(MemoryUser {
            record: UserRecord {
                user_id: 42,
                username: "alice".to_string(),
                email: "alice@example.org".to_string(),
                real_name: "Alice Liddell".to_string(),
                admin: true,
                login_auth: "auth-42".to_string(),
            },
            password_hash: hash_password(ALICE_PASSWORD, "pepper"),
            salt: "pepper".to_string(),
        })
        .await;
        dir.add_group(42, "Moderators").await;
        dir.add_group(42, "Clonk Devs").await;
        dir
    }

    #[tokio::test]
    async fn verify_password_by_username_and_email() {
        let store = CredentialStore::new(directory_with_alice().await);

        let record = store.verify_password("alice", ALICE_PASSWORD).await.unwrap();
        assert_eq!(record.user_id, 42);
        assert_eq!(record.login_auth, "auth-42");

        let record = store
            .verify_password("alice@example.org", ALICE_PASSWORD)
            .await
            .unwrap();
        assert_eq!(record.user_id, 42);
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_user_are_distinct_internally() {
        let store = CredentialStore::new(directory_with_alice().await);

        assert!(matches!(
            store.verify_password("alice", "wrong").await,
            Err(CredentialError::InvalidPassword)
        ));
        assert!(matches!(
            store.verify_password("bob", ALICE_PASSWORD).await,
            Err(CredentialError::UserNotFound)
        ));
    }

    #[tokio::test]
    async fn unknown_user_costs_a_full_digest() {
        let store = CredentialStore::new(directory_with_alice().await);
        let mut unknown = Duration::MAX;
        let mut wrong = Duration::MAX;
        for _ in 0..3 {
            let start = Instant::now();
            let _ = store.verify_password("nobody", "x").await;
            unknown = unknown.min(start.elapsed());

            let start = Instant::now();
            let _ = store.verify_password("alice", "x").await;
            wrong = wrong.min(start.elapsed());
        }
        assert!(unknown * 4 >= wrong, "unknown={unknown:?} wrong={wrong:?}");
    }

    #[tokio::test]
    async fn credential_failures_collapse_for_callers() {
        let store = CredentialStore::new(directory_with_alice().await);
        let wrong: AuthError = store.verify_password("alice", "x").await.unwrap_err().into();
        let unknown: AuthError = store.verify_password("nobody", "x").await.unwrap_err().into();
        assert_eq!(wrong.to_string(), unknown.to_string());
        assert!(matches!(wrong, AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn store_outage_is_reported_as_unavailable() {
        let dir = directory_with_alice().await;
        dir.set_unavailable(true);
        let store = CredentialStore::new(dir);
        let err = store.verify_password("alice", ALICE_PASSWORD).await.unwrap_err();
        assert!(matches!(err, CredentialError::StoreUnavailable(_)));
        assert!(matches!(AuthError::from(err), AuthError::StoreUnavailable));
    }

    #[tokio::test]
    async fn fetch_groups_returns_titles() {
        let store = CredentialStore::new(directory_with_alice().await);
        let groups = store.fetch_groups(42).await.unwrap();
        assert_eq!(groups.len(), 2);
        assert!(groups.contains("Moderators"));
        assert!(store.fetch_groups(99).await.unwrap().is_empty());
    }
}
