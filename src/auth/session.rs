// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Session validation against the mwforum login cookie.
//!
//! The cookie value is `<user_id>:<login_auth>`. A cookie is valid exactly
//! when its `login_auth` equals the value currently stored for the user, so
//! rotating `login_auth` in the forum revokes every outstanding cookie.
//! Logging out only discards the client's copy.

use std::fmt;

use axum::http::HeaderMap;
use chrono::{Duration, Utc};
use tracing::{error, info};

use super::cookie::{expired_cookie, find_cookie, http_date, secure_cookie};
use super::credentials::CredentialStore;
use super::AuthError;
use crate::models::Identity;
use crate::storage::UserId;

/// Lifetime of a login cookie. Sessions are long-lived "remember me"
/// sessions because mwforum has no server-side session table.
pub const SESSION_LIFETIME: Duration = Duration::days(3650);

/// Parsed `<user_id>:<login_auth>` cookie value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionToken {
    pub user_id: UserId,
    pub login_auth: String,
}

impl SessionToken {
    pub fn parse(value: &str) -> Result<Self, AuthError> {
        let mut parts = value.split(':');
        let (Some(id), Some(login_auth), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(AuthError::MalformedSession);
        };
        if id.is_empty() || !id.bytes().all(|b| b.is_ascii_digit()) || login_auth.is_empty() {
            return Err(AuthError::MalformedSession);
        }
        let user_id = id.parse().map_err(|_| AuthError::MalformedSession)?;
        Ok(Self {
            user_id,
            login_auth: login_auth.to_string(),
        })
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.user_id, self.login_auth)
    }
}

/// Turns login cookies and passwords into identities and sessions.
#[derive(Clone)]
pub struct SessionValidator {
    credentials: CredentialStore,
    cookie_name: String,
}

impl SessionValidator {
    pub fn new(credentials: CredentialStore, cookie_prefix: &str) -> Self {
        Self {
            credentials,
            cookie_name: format!("{cookie_prefix}login"),
        }
    }

    pub fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }

    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    /// Resolve the identity behind a request's login cookie.
    pub async fn authenticate_request(&self, headers: &HeaderMap) -> Result<Identity, AuthError> {
        self.authenticate(find_cookie(headers, &self.cookie_name))
            .await
    }

    /// Resolve the identity behind a login cookie value.
    pub async fn authenticate(&self, cookie_value: Option<&str>) -> Result<Identity, AuthError> {
        let token = SessionToken::parse(cookie_value.ok_or(AuthError::NoSession)?)?;

        let record = self
            .credentials
            .find_user(token.user_id)
            .await
            .map_err(|e| {
                error!(user_id = token.user_id, error = %e, "Failed to fetch user");
                AuthError::StoreUnavailable
            })?
            .ok_or(AuthError::InvalidSession)?;

        if record.login_auth != token.login_auth {
            return Err(AuthError::InvalidSession);
        }

        let groups = self
            .credentials
            .fetch_groups(record.user_id)
            .await
            .map_err(|e| {
                error!(user_id = token.user_id, error = %e, "Failed to fetch groups");
                AuthError::StoreUnavailable
            })?;

        Ok(Identity::from_record(record, groups))
    }

    /// Verify a username/password pair and issue a session token.
    pub async fn login(&self, username: &str, password: &str) -> Result<SessionToken, AuthError> {
        let record = self
            .credentials
            .verify_password(username, password)
            .await
            .map_err(|e| {
                match &e {
                    super::CredentialError::StoreUnavailable(inner) => {
                        error!(error = %inner, "Login failed: user directory unavailable");
                    }
                    other => info!(reason = %other, "Login rejected"),
                }
                AuthError::from(e)
            })?;

        info!(user_id = record.user_id, "User logged in");
        Ok(SessionToken {
            user_id: record.user_id,
            login_auth: record.login_auth,
        })
    }

    /// `Set-Cookie` value carrying a freshly issued session.
    pub fn session_cookie(&self, token: &SessionToken) -> String {
        let expires = http_date(Utc::now() + SESSION_LIFETIME);
        secure_cookie(&self.cookie_name, &token.to_string(), &expires)
    }

    /// `Set-Cookie` value that discards the client's session.
    pub fn logout_cookie(&self) -> String {
        expired_cookie(&self.cookie_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::credentials::tests::{directory_with_alice, ALICE_PASSWORD};
    use axum::http::{header::COOKIE, HeaderValue};

    async fn validator() -> (SessionValidator, std::sync::Arc<crate::storage::MemoryDirectory>) {
        let dir = directory_with_alice().await;
        (
            SessionValidator::new(CredentialStore::new(dir.clone()), "mwf_"),
            dir,
        )
    }

    #[test]
    fn parse_requires_exactly_two_parts() {
        assert_eq!(
            SessionToken::parse("42:auth").unwrap(),
            SessionToken {
                user_id: 42,
                login_auth: "auth".to_string()
            }
        );
        assert!(matches!(SessionToken::parse("42"), Err(AuthError::MalformedSession)));
        assert!(matches!(SessionToken::parse("42:a:b"), Err(AuthError::MalformedSession)));
        assert!(matches!(SessionToken::parse("x:auth"), Err(AuthError::MalformedSession)));
        assert!(matches!(SessionToken::parse("42:"), Err(AuthError::MalformedSession)));
        assert!(matches!(SessionToken::parse("-1:auth"), Err(AuthError::MalformedSession)));
    }

    #[test]
    fn token_display_round_trips_cookie_format() {
        let token = SessionToken {
            user_id: 7,
            login_auth: "abc".to_string(),
        };
        assert_eq!(token.to_string(), "7:abc");
    }

    #[tokio::test]
    async fn authenticate_builds_identity_with_groups() {
        let (sessions, _) = validator().await;
        let identity = sessions.authenticate(Some("42:auth-42")).await.unwrap();
        assert_eq!(identity.id, 42);
        assert_eq!(identity.username, "alice");
        assert_eq!(identity.display_name, "Alice Liddell");
        assert!(identity.is_admin);
        assert!(identity.groups.contains("Clonk Devs"));
    }

    #[tokio::test]
    async fn authenticate_distinguishes_failure_kinds() {
        let (sessions, _) = validator().await;
        assert!(matches!(sessions.authenticate(None).await, Err(AuthError::NoSession)));
        assert!(matches!(
            sessions.authenticate(Some("garbage")).await,
            Err(AuthError::MalformedSession)
        ));
        assert!(matches!(
            sessions.authenticate(Some("42:stale")).await,
            Err(AuthError::InvalidSession)
        ));
        assert!(matches!(
            sessions.authenticate(Some("99:auth-42")).await,
            Err(AuthError::InvalidSession)
        ));
    }

    #[tokio::test]
    async fn rotating_login_auth_revokes_cookies() {
        let (sessions, dir) = validator().await;
        assert!(sessions.authenticate(Some("42:auth-42")).await.is_ok());

        dir.rotate_login_auth(42, "auth-43").await;
        assert!(matches!(
            sessions.authenticate(Some("42:auth-42")).await,
            Err(AuthError::InvalidSession)
        ));
        assert!(sessions.authenticate(Some("42:auth-43")).await.is_ok());
    }

    #[tokio::test]
    async fn store_outage_is_not_a_session_error() {
        let (sessions, dir) = validator().await;
        dir.set_unavailable(true);
        let err = sessions.authenticate(Some("42:auth-42")).await.unwrap_err();
        assert!(matches!(err, AuthError::StoreUnavailable));
        assert!(!err.is_recoverable());
    }

    #[tokio::test]
    async fn authenticate_request_reads_prefixed_cookie() {
        let (sessions, _) = validator().await;
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("login=1:x; mwf_login=42:auth-42"));
        let identity = sessions.authenticate_request(&headers).await.unwrap();
        assert_eq!(identity.email, "alice@example.org");
    }

    #[tokio::test]
    async fn login_issues_token_usable_as_cookie() {
        let (sessions, _) = validator().await;
        let token = sessions.login("alice", ALICE_PASSWORD).await.unwrap();
        assert_eq!(token.to_string(), "42:auth-42");

        let cookie = sessions.session_cookie(&token);
        assert!(cookie.starts_with("mwf_login=42:auth-42;"));
        assert!(cookie.contains("Secure"));
        assert!(cookie.contains("HttpOnly"));
        let year = (Utc::now() + SESSION_LIFETIME).format("%Y").to_string();
        assert!(cookie.contains(&year));

        let identity = sessions.authenticate(Some(&token.to_string())).await.unwrap();
        assert_eq!(identity.id, 42);
    }

    #[tokio::test]
    async fn login_rejects_bad_credentials_generically() {
        let (sessions, _) = validator().await;
        let wrong = sessions.login("alice", "nope").await.unwrap_err();
        let unknown = sessions.login("mallory", "nope").await.unwrap_err();
        assert!(matches!(wrong, AuthError::InvalidCredentials));
        assert!(matches!(unknown, AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn logout_cookie_expires_immediately() {
        let (sessions, _) = validator().await;
        let cookie = sessions.logout_cookie();
        assert!(cookie.starts_with("mwf_login=deleted;"));
        assert!(cookie.contains("1970"));
    }
}
