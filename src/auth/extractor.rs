// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractors for the forum session.
//!
//! ```rust,ignore
//! async fn me(Auth(identity): Auth) -> impl IntoResponse {
//!     // identity is the logged-in forum user
//! }
//! ```

use axum::{extract::FromRequestParts, http::request::Parts};

use super::AuthError;
use crate::models::Identity;
use crate::state::AppState;

/// Extractor that requires a valid login cookie.
///
/// Rejects with the session error (401) or `StoreUnavailable` (503).
pub struct Auth(pub Identity);

impl FromRequestParts<AppState> for Auth {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let identity = state.sessions.authenticate_request(&parts.headers).await?;
        Ok(Auth(identity))
    }
}

/// Session lookup that never rejects; handlers decide between the login
/// page and a hard failure.
pub struct SessionLookup(pub Result<Identity, AuthError>);

impl FromRequestParts<AppState> for SessionLookup {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        match Auth::from_request_parts(parts, state).await {
            Ok(Auth(identity)) => Ok(SessionLookup(Ok(identity))),
            Err(e) => Ok(SessionLookup(Err(e))),
        }
    }
}
