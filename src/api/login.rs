// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Interactive login and logout.

use axum::{
    extract::{FromRequest, Request, State},
    http::{
        header::{CONTENT_TYPE, SET_COOKIE},
        HeaderMap, StatusCode,
    },
    response::{Html, IntoResponse, Response},
    Form, Json,
};
use serde::Deserialize;

use super::found;
use crate::{
    auth::AuthError,
    bridge::sanitize_return_url,
    error::ApiError,
    models::{LoginFailure, LoginRequest},
    render::LoginPage,
    state::AppState,
};

/// Message shown for any credential failure.
pub const INVALID_CREDENTIALS_MESSAGE: &str = "invalid username or password";

/// Login form fields as posted by the rendered login page.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default, rename = "returnURL")]
    pub return_url: String,
}

/// Media type without parameters, lowercased.
fn content_type_essence(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(CONTENT_TYPE)?.to_str().ok()?;
    let essence = value.split(';').next()?.trim();
    Some(essence.to_ascii_lowercase())
}

pub async fn login_redirect(State(state): State<AppState>) -> Result<Response, AuthError> {
    found(&state.link("/"), None)
}

/// Log in with a username (or email) and password.
#[utoipa::path(
    post,
    path = "/login",
    tag = "Session",
    request_body(content = LoginRequest, description = "JSON credentials, or the same fields (plus `returnURL`) form-encoded"),
    responses(
        (status = 204, description = "Logged in, session cookie set"),
        (status = 302, description = "Form login succeeded, redirect to the return URL"),
        (status = 400, description = "Malformed body"),
        (status = 403, description = "Invalid username or password", body = LoginFailure),
        (status = 415, description = "Unsupported content type"),
        (status = 503, description = "User directory unavailable")
    )
)]
pub async fn login(State(state): State<AppState>, request: Request) -> Response {
    match content_type_essence(request.headers()).as_deref() {
        Some("application/json") => match Json::<LoginRequest>::from_request(request, &state).await {
            Ok(Json(body)) => json_login(&state, body).await,
            Err(rejection) => ApiError::from(rejection).into_response(),
        },
        Some("application/x-www-form-urlencoded") => {
            match Form::<LoginForm>::from_request(request, &state).await {
                Ok(Form(form)) => form_login(&state, form).await.into_response(),
                Err(rejection) => ApiError::from(rejection).into_response(),
            }
        }
        _ => AuthError::UnsupportedMediaType.into_response(),
    }
}

async fn json_login(state: &AppState, body: LoginRequest) -> Response {
    match state.sessions.login(&body.username, &body.password).await {
        Ok(token) => (
            StatusCode::NO_CONTENT,
            [(SET_COOKIE, state.sessions.session_cookie(&token))],
        )
            .into_response(),
        Err(AuthError::InvalidCredentials) => (
            StatusCode::FORBIDDEN,
            Json(LoginFailure {
                message: INVALID_CREDENTIALS_MESSAGE.to_string(),
            }),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}

async fn form_login(state: &AppState, form: LoginForm) -> Result<Response, AuthError> {
    match state.sessions.login(&form.username, &form.password).await {
        Ok(token) => {
            let target = if form.return_url.trim().is_empty() {
                state.link("/")
            } else {
                sanitize_return_url(&form.return_url)
            };
            found(&target, Some(state.sessions.session_cookie(&token)))
        }
        Err(AuthError::InvalidCredentials) => {
            let page = LoginPage {
                username: form.username,
                return_url: Some(form.return_url),
                error: Some(INVALID_CREDENTIALS_MESSAGE.to_string()),
                ..LoginPage::default()
            };
            let html = state.renderer.login_page(&page)?;
            Ok((StatusCode::FORBIDDEN, Html(html)).into_response())
        }
        Err(e) => Err(e),
    }
}

/// Discard the client's session cookie.
#[utoipa::path(
    get,
    path = "/logout",
    tag = "Session",
    responses((status = 302, description = "Cookie expired, redirect to the index"))
)]
pub async fn logout(State(state): State<AppState>) -> Result<Response, AuthError> {
    found(&state.link("/"), Some(state.sessions.logout_cookie()))
}
