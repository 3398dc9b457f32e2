// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication and verification errors.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Authentication error type shared by the session validator and both
/// bridges.
///
/// Session variants are recoverable (the user can log in again); signature
/// and token variants are terminal for the request.
#[derive(Debug)]
pub enum AuthError {
    /// No session cookie present
    NoSession,
    /// Session cookie is not `<id>:<login_auth>`
    MalformedSession,
    /// Session cookie does not match the user's current `login_auth`
    InvalidSession,
    /// Unknown user or wrong password (never distinguished to callers)
    InvalidCredentials,
    /// Caller-supplied HMAC or JWT signature did not verify
    InvalidSignature,
    /// Signed payload could not be decoded
    MalformedPayload(String),
    /// Discourse payload has no nonce
    MissingNonce,
    /// JWT names an issuer that is not registered
    UnknownIssuer(String),
    /// JWT uses an algorithm outside the HMAC family
    AlgorithmMismatch(String),
    /// JWT is not structurally valid
    MalformedToken,
    /// JWT has expired
    TokenExpired,
    /// Login body has an unsupported content type
    UnsupportedMediaType,
    /// The user directory could not be queried
    StoreUnavailable,
    /// Outbound assertion could not be signed
    SigningFailure(String),
    /// The requested bridge is not configured
    BridgeDisabled(&'static str),
    /// Internal error
    InternalError(String),
}

#[derive(Serialize)]
struct AuthErrorBody {
    error: String,
    error_code: String,
}

impl AuthError {
    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::NoSession => "no_session",
            AuthError::MalformedSession => "malformed_session",
            AuthError::InvalidSession => "invalid_session",
            AuthError::InvalidCredentials => "invalid_credentials",
            AuthError::InvalidSignature => "invalid_signature",
            AuthError::MalformedPayload(_) => "malformed_payload",
            AuthError::MissingNonce => "missing_nonce",
            AuthError::UnknownIssuer(_) => "unknown_issuer",
            AuthError::AlgorithmMismatch(_) => "algorithm_mismatch",
            AuthError::MalformedToken => "malformed_token",
            AuthError::TokenExpired => "token_expired",
            AuthError::UnsupportedMediaType => "unsupported_media_type",
            AuthError::StoreUnavailable => "store_unavailable",
            AuthError::SigningFailure(_) => "signing_failure",
            AuthError::BridgeDisabled(_) => "bridge_disabled",
            AuthError::InternalError(_) => "internal_error",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::NoSession | AuthError::MalformedSession | AuthError::InvalidSession => {
                StatusCode::UNAUTHORIZED
            }
            AuthError::InvalidCredentials => StatusCode::FORBIDDEN,
            AuthError::InvalidSignature
            | AuthError::MalformedPayload(_)
            | AuthError::MissingNonce
            | AuthError::UnknownIssuer(_)
            | AuthError::AlgorithmMismatch(_)
            | AuthError::MalformedToken
            | AuthError::TokenExpired => StatusCode::BAD_REQUEST,
            AuthError::UnsupportedMediaType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            AuthError::BridgeDisabled(_) => StatusCode::NOT_FOUND,
            AuthError::StoreUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            AuthError::SigningFailure(_) | AuthError::InternalError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Whether an interactive login can resolve this error.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            AuthError::NoSession | AuthError::MalformedSession | AuthError::InvalidSession
        )
    }
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::NoSession => write!(f, "Not logged in"),
            AuthError::MalformedSession => write!(f, "Login cookie is malformed"),
            AuthError::InvalidSession => write!(f, "Login cookie is no longer valid"),
            AuthError::InvalidCredentials => write!(f, "Invalid username or password"),
            AuthError::InvalidSignature => write!(f, "Invalid signature"),
            AuthError::MalformedPayload(msg) => write!(f, "Malformed payload: {msg}"),
            AuthError::MissingNonce => write!(f, "Payload is missing a nonce"),
            AuthError::UnknownIssuer(iss) => write!(f, "Unknown issuer: {iss}"),
            AuthError::AlgorithmMismatch(alg) => write!(f, "Unexpected signing method: {alg}"),
            AuthError::MalformedToken => write!(f, "Token is malformed"),
            AuthError::TokenExpired => write!(f, "Token has expired"),
            AuthError::UnsupportedMediaType => {
                write!(f, "Expected application/json or application/x-www-form-urlencoded")
            }
            AuthError::StoreUnavailable => write!(f, "Login service temporarily unavailable"),
            AuthError::SigningFailure(_) => write!(f, "Failed to sign response"),
            AuthError::BridgeDisabled(name) => write!(f, "{name} is not configured"),
            AuthError::InternalError(_) => write!(f, "Internal authentication error"),
        }
    }
}

impl std::error::Error for AuthError {}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(AuthErrorBody {
            error: self.to_string(),
            error_code: self.error_code().to_string(),
        });
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[tokio::test]
    async fn invalid_signature_returns_400() {
        let response = AuthError::InvalidSignature.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();
        assert_eq!(body["error_code"], "invalid_signature");
    }

    #[test]
    fn infrastructure_faults_are_5xx() {
        assert_eq!(
            AuthError::StoreUnavailable.status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            AuthError::SigningFailure("bad key".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn only_session_errors_are_recoverable() {
        assert!(AuthError::NoSession.is_recoverable());
        assert!(AuthError::MalformedSession.is_recoverable());
        assert!(AuthError::InvalidSession.is_recoverable());
        assert!(!AuthError::InvalidSignature.is_recoverable());
        assert!(!AuthError::StoreUnavailable.is_recoverable());
    }

    #[test]
    fn internal_details_are_not_displayed() {
        let err = AuthError::SigningFailure("secret key material".into());
        assert!(!err.to_string().contains("secret"));
    }
}
