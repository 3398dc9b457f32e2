// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # User Directory
//!
//! Read-only access to the mwforum user table. The bridge never writes to
//! the forum database: `login_auth` is rotated by the forum itself (for
//! example on a password change), which is how previously issued session
//! cookies are revoked.
//!
//! ## Backends
//!
//! - [`MySqlDirectory`] - the production forum database (sqlx, pooled)
//! - [`MemoryDirectory`] - in-process table for tests and local development

pub mod memory;
pub mod mysql;

pub use memory::MemoryDirectory;
pub use mysql::MySqlDirectory;

use async_trait::async_trait;

/// Numeric mwforum user id.
pub type UserId = i64;

/// Error type for user directory operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Invalid table prefix: {0:?}")]
    InvalidTablePrefix(String),
}

/// How a login identifier is matched against the user table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialLookup<'a> {
    Email(&'a str),
    Username(&'a str),
}

impl<'a> CredentialLookup<'a> {
    /// Identifiers containing `@` are email addresses, anything else is a
    /// username.
    pub fn from_identifier(identifier: &'a str) -> Self {
        if identifier.contains('@') {
            CredentialLookup::Email(identifier)
        } else {
            CredentialLookup::Username(identifier)
        }
    }
}

/// Password material for one user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialRecord {
    pub user_id: UserId,
    /// Legacy iterated digest, see [`crate::auth::password::hash_password`]
    pub password_hash: String,
    pub salt: String,
    pub login_auth: String,
}

/// Profile columns needed to build an [`crate::models::Identity`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub user_id: UserId,
    pub username: String,
    pub email: String,
    pub real_name: String,
    pub admin: bool,
    pub login_auth: String,
}

/// Read-only view over the forum's user and group tables.
///
/// Implementations must be safe for concurrent use by many requests.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Look up the password material for a login identifier.
    async fn find_credentials(
        &self,
        lookup: CredentialLookup<'_>,
    ) -> Result<Option<CredentialRecord>, StorageError>;

    /// Look up a user's profile row by id.
    async fn find_user(&self, user_id: UserId) -> Result<Option<UserRecord>, StorageError>;

    /// Titles of all groups the user belongs to. Empty when none.
    async fn groups_for_user(&self, user_id: UserId) -> Result<Vec<String>, StorageError>;

    /// Cheap connectivity check used by the readiness probe.
    async fn ping(&self) -> Result<(), StorageError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifier_with_at_sign_is_email() {
        assert_eq!(
            CredentialLookup::from_identifier("alice@example.org"),
            CredentialLookup::Email("alice@example.org")
        );
    }

    #[test]
    fn plain_identifier_is_username() {
        assert_eq!(
            CredentialLookup::from_identifier("alice"),
            CredentialLookup::Username("alice")
        );
    }
}
