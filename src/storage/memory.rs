// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-memory user directory.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{CredentialLookup, CredentialRecord, StorageError, UserDirectory, UserId, UserRecord};

/// One row of the in-memory user table.
#[derive(Debug, Clone)]
pub struct MemoryUser {
    pub record: UserRecord,
    pub password_hash: String,
    pub salt: String,
}

#[derive(Default)]
struct Tables {
    users: BTreeMap<UserId, MemoryUser>,
    memberships: HashMap<UserId, Vec<String>>,
}

/// Mirrors the mwforum tables in process memory.
///
/// Lookups behave like the SQL backend: exact, case-sensitive matches on
/// `userName` or `email`.
#[derive(Default)]
pub struct MemoryDirectory {
    tables: RwLock<Tables>,
    unavailable: AtomicBool,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_user(&self, user: MemoryUser) {
        let mut tables = self.tables.write().await;
        tables.users.insert(user.record.user_id, user);
    }

    pub async fn add_group(&self, user_id: UserId, title: impl Into<String>) {
        let mut tables = self.tables.write().await;
        tables
            .memberships
            .entry(user_id)
            .or_default()
            .push(title.into());
    }

    /// Replace a user's `login_auth`, invalidating their existing cookies.
    pub async fn rotate_login_auth(&self, user_id: UserId, login_auth: impl Into<String>) -> bool {
        let mut tables = self.tables.write().await;
        match tables.users.get_mut(&user_id) {
            Some(user) => {
                user.record.login_auth = login_auth.into();
                true
            }
            None => false,
        }
    }

    /// Simulate a database outage; every query fails while set.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), StorageError> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(StorageError::Connection("directory unavailable".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl UserDirectory for MemoryDirectory {
    async fn find_credentials(
        &self,
        lookup: CredentialLookup<'_>,
    ) -> Result<Option<CredentialRecord>, StorageError> {
        self.check_available()?;
        let tables = self.tables.read().await;
        let found = tables.users.values().find(|user| match lookup {
            CredentialLookup::Email(email) => user.record.email == email,
            CredentialLookup::Username(name) => user.record.username == name,
        });
        Ok(found.map(|user| CredentialRecord {
            user_id: user.record.user_id,
            password_hash: user.password_hash.clone(),
            salt: user.salt.clone(),
            login_auth: user.record.login_auth.clone(),
        }))
    }

    async fn find_user(&self, user_id: UserId) -> Result<Option<UserRecord>, StorageError> {
        self.check_available()?;
        let tables = self.tables.read().await;
        Ok(tables.users.get(&user_id).map(|user| user.record.clone()))
    }

    async fn groups_for_user(&self, user_id: UserId) -> Result<Vec<String>, StorageError> {
        self.check_available()?;
        let tables = self.tables.read().await;
        Ok(tables.memberships.get(&user_id).cloned().unwrap_or_default())
    }

    async fn ping(&self) -> Result<(), StorageError> {
        self.check_available()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> MemoryUser {
        MemoryUser {
            record: UserRecord {
                user_id: 7,
                username: "alice".to_string(),
                email: "alice@example.org".to_string(),
                real_name: "Alice".to_string(),
                admin: false,
                login_auth: "auth-1".to_string(),
            },
            password_hash: "hash".to_string(),
            salt: "salt".to_string(),
        }
    }

    #[tokio::test]
    async fn finds_credentials_by_username_and_email() {
        let dir = MemoryDirectory::new();
        dir.insert_user(sample_user()).await;

        let by_name = dir
            .find_credentials(CredentialLookup::Username("alice"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_name.user_id, 7);

        let by_email = dir
            .find_credentials(CredentialLookup::Email("alice@example.org"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_email.login_auth, "auth-1");

        let missing = dir
            .find_credentials(CredentialLookup::Username("alice@example.org"))
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn groups_default_to_empty() {
        let dir = MemoryDirectory::new();
        dir.insert_user(sample_user()).await;
        assert!(dir.groups_for_user(7).await.unwrap().is_empty());

        dir.add_group(7, "Moderators").await;
        assert_eq!(dir.groups_for_user(7).await.unwrap(), vec!["Moderators"]);
    }

    #[tokio::test]
    async fn rotate_login_auth_updates_row() {
        let dir = MemoryDirectory::new();
        dir.insert_user(sample_user()).await;
        assert!(dir.rotate_login_auth(7, "auth-2").await);
        assert!(!dir.rotate_login_auth(8, "auth-2").await);
        assert_eq!(dir.find_user(7).await.unwrap().unwrap().login_auth, "auth-2");
    }

    #[tokio::test]
    async fn unavailable_directory_fails_every_query() {
        let dir = MemoryDirectory::new();
        dir.set_unavailable(true);
        assert!(matches!(dir.ping().await, Err(StorageError::Connection(_))));
        assert!(dir.find_user(1).await.is_err());
    }
}
