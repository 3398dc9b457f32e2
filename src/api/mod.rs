// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    http::{
        header::{LOCATION, SET_COOKIE},
        HeaderName, HeaderValue, Method, StatusCode, Uri,
    },
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::error;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    auth::AuthError,
    bridge::PendingReturn,
    models::{Identity, LoginFailure, LoginRequest},
    render::LoginPage,
    state::AppState,
};

pub mod discourse;
pub mod health;
pub mod index;
pub mod jwt;
pub mod login;

const REQUEST_ID_HEADER: &str = "x-request-id";

pub fn router(state: AppState) -> Router {
    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);

    let routes = Router::new()
        .route("/", get(index::index))
        .route("/me", get(index::me))
        .route("/login", get(login::login_redirect).post(login::login))
        .route("/logout", get(login::logout))
        .route("/discourse", get(discourse::discourse_sso))
        .route("/jwt", get(jwt::jwt_assertion))
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .with_state(state);

    Router::new()
        .merge(routes)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(PropagateRequestIdLayer::new(request_id.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::new(request_id, MakeRequestUuid))
}

fn header_value(name: &HeaderName, value: &str) -> Result<HeaderValue, AuthError> {
    HeaderValue::from_str(value).map_err(|e| {
        error!(header = %name, error = %e, "Refusing to send invalid header value");
        AuthError::InternalError(format!("invalid {name} header"))
    })
}

/// 302 to `location`, optionally setting a cookie.
///
/// Fails instead of sending the redirect when either header value is not
/// representable, so a login never redirects without its cookie.
pub(crate) fn found(location: &str, cookie: Option<String>) -> Result<Response, AuthError> {
    let mut response = StatusCode::FOUND.into_response();
    let headers = response.headers_mut();
    headers.insert(LOCATION, header_value(&LOCATION, location)?);
    if let Some(cookie) = cookie {
        headers.insert(SET_COOKIE, header_value(&SET_COOKIE, &cookie)?);
    }
    Ok(response)
}

/// Show the login form, carrying the current request as the return target.
pub(crate) fn login_handoff(
    state: &AppState,
    method: &Method,
    uri: &Uri,
) -> Result<Response, AuthError> {
    let mut pending = PendingReturn::from_request(method, uri);
    pending.path = state.link(&pending.path);
    let page = state.renderer.login_page(&LoginPage::resuming(pending))?;
    Ok(Html(page).into_response())
}

#[derive(OpenApi)]
#[openapi(
    paths(
        index::me,
        login::login,
        login::logout,
        discourse::discourse_sso,
        jwt::jwt_assertion,
        health::health,
        health::liveness,
        health::readiness
    ),
    components(
        schemas(
            Identity,
            LoginRequest,
            LoginFailure,
            health::HealthResponse,
            health::ReadyResponse,
            health::HealthChecks
        )
    ),
    tags(
        (name = "Session", description = "Forum login sessions"),
        (name = "Bridges", description = "Discourse SSO and JWT assertions"),
        (name = "Health", description = "Liveness and readiness probes")
    )
)]
struct ApiDoc;
