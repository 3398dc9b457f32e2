// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! `GET /jwt?<token>` – signed JWT assertions for registered sites.

use axum::{
    extract::{OriginalUri, RawQuery, State},
    http::{HeaderMap, Method},
    response::Response,
};
use tracing::{info, warn};

use super::{found, login_handoff};
use crate::{auth::AuthError, state::AppState};

#[utoipa::path(
    get,
    path = "/jwt",
    tag = "Bridges",
    responses(
        (status = 200, description = "Not logged in, login form shown"),
        (status = 302, description = "Signed assertion, redirect to the site"),
        (status = 400, description = "Token rejected"),
        (status = 404, description = "JWT bridge not configured"),
        (status = 500, description = "Assertion could not be signed")
    )
)]
pub async fn jwt_assertion(
    State(state): State<AppState>,
    method: Method,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
) -> Result<Response, AuthError> {
    let bridge = state
        .jwt
        .clone()
        .ok_or(AuthError::BridgeDisabled("JWT bridge"))?;

    let token = query.filter(|q| !q.is_empty()).ok_or(AuthError::MalformedToken)?;
    let request = bridge.verify(&token).inspect_err(|e| {
        warn!(error_code = e.error_code(), "Rejected JWT request");
    })?;

    let identity = match state.sessions.authenticate_request(&headers).await {
        Ok(identity) => identity,
        Err(e) if e.is_recoverable() => return login_handoff(&state, &method, &uri),
        Err(e) => return Err(e),
    };

    let location = bridge.respond(&request, &identity)?;
    info!(user_id = identity.id, issuer = %request.issuer, "JWT assertion issued");
    found(&location, None)
}

#[cfg(test)]
mod tests {
    use crate::api::router;
    use crate::bridge::jwt::tests::{request_token, SITE_A_KEY, SITE_A_URL, SITE_B_KEY};
    use crate::bridge::AssertionClaims;
    use crate::state::tests::test_state;
    use axum::{
        body::Body,
        http::{header::LOCATION, Request, StatusCode},
    };
    use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
    use tower::ServiceExt;

    fn jwt_request(token: &str, cookie: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri(format!("/jwt?{token}"));
        if let Some(cookie) = cookie {
            builder = builder.header("Cookie", cookie);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn logged_in_user_receives_assertion() {
        let (state, _) = test_state().await;
        let token = request_token("site-a", "req-1", SITE_A_KEY, Algorithm::HS256);
        let response = router(state)
            .oneshot(jwt_request(&token, Some("mwf_login=42:auth-42")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FOUND);

        let location = response.headers()[LOCATION].to_str().unwrap();
        let assertion = location.strip_prefix(&format!("{SITE_A_URL}?")).unwrap();

        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&["site-a"]);
        let claims = decode::<AssertionClaims>(
            assertion,
            &DecodingKey::from_secret(SITE_A_KEY),
            &validation,
        )
        .unwrap()
        .claims;
        assert_eq!(claims.iss, "auth.example");
        assert_eq!(claims.jti.as_deref(), Some("req-1"));
        assert_eq!(claims.sub, "alice");
        assert_eq!(claims.email, "alice@example.org");
    }

    #[tokio::test]
    async fn token_for_wrong_site_key_is_rejected() {
        let (state, _) = test_state().await;
        let token = request_token("site-a", "req-1", SITE_B_KEY, Algorithm::HS256);
        let response = router(state)
            .oneshot(jwt_request(&token, Some("mwf_login=42:auth-42")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unknown_issuer_is_rejected() {
        let (state, _) = test_state().await;
        let token = request_token("site-z", "req-1", SITE_A_KEY, Algorithm::HS256);
        let response = router(state).oneshot(jwt_request(&token, None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn missing_token_is_rejected() {
        let (state, _) = test_state().await;
        let response = router(state)
            .oneshot(Request::builder().uri("/jwt").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
