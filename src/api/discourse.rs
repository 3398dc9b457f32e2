// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! `GET /discourse` – Discourse SSO provider endpoint.

use axum::{
    extract::{OriginalUri, Query, State},
    http::{HeaderMap, Method},
    response::Response,
};
use serde::Deserialize;
use tracing::{info, warn};
use utoipa::IntoParams;

use super::{found, login_handoff};
use crate::{auth::AuthError, state::AppState};

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SsoQuery {
    /// Base64 payload from Discourse
    #[serde(default)]
    pub sso: String,
    /// Hex HMAC-SHA256 of `sso`
    #[serde(default)]
    pub sig: String,
}

#[utoipa::path(
    get,
    path = "/discourse",
    tag = "Bridges",
    params(SsoQuery),
    responses(
        (status = 200, description = "Not logged in, login form shown"),
        (status = 302, description = "Signed SSO response, redirect to Discourse"),
        (status = 400, description = "Signature or payload rejected"),
        (status = 404, description = "Discourse SSO not configured")
    )
)]
pub async fn discourse_sso(
    State(state): State<AppState>,
    method: Method,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
    Query(query): Query<SsoQuery>,
) -> Result<Response, AuthError> {
    let bridge = state
        .discourse
        .clone()
        .ok_or(AuthError::BridgeDisabled("Discourse SSO"))?;

    let request = bridge.verify(&query.sso, &query.sig).inspect_err(|e| {
        warn!(error_code = e.error_code(), "Rejected Discourse SSO request");
    })?;

    let identity = match state.sessions.authenticate_request(&headers).await {
        Ok(identity) => identity,
        Err(e) if e.is_recoverable() => return login_handoff(&state, &method, &uri),
        Err(e) => return Err(e),
    };

    let location = bridge.respond(&request, &identity)?;
    info!(user_id = identity.id, "Discourse SSO completed");
    found(&location, None)
}
