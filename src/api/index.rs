// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::State,
    response::{Html, IntoResponse, Response},
    Json,
};

use crate::{
    auth::{Auth, SessionLookup},
    models::Identity,
    render::{IndexPage, LoginPage},
    state::AppState,
};

/// Greeting for a logged-in user, otherwise the bare login form.
pub async fn index(State(state): State<AppState>, SessionLookup(session): SessionLookup) -> Response {
    match session {
        Ok(identity) => state
            .renderer
            .index_page(&IndexPage {
                username: identity.username,
                display_name: identity.display_name,
            })
            .map(Html)
            .into_response(),
        Err(e) if e.is_recoverable() => state
            .renderer
            .login_page(&LoginPage::default())
            .map(Html)
            .into_response(),
        Err(e) => e.into_response(),
    }
}

/// The identity behind the current login cookie.
#[utoipa::path(
    get,
    path = "/me",
    tag = "Session",
    responses(
        (status = 200, description = "Current forum user", body = Identity),
        (status = 401, description = "No valid login cookie"),
        (status = 503, description = "User directory unavailable")
    )
)]
pub async fn me(Auth(identity): Auth) -> Json<Identity> {
    Json(identity)
}
