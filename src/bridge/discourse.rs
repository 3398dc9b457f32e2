// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Discourse single sign-on.
//!
//! See <https://meta.discourse.org/t/official-single-sign-on-for-discourse-sso/13045>.
//!
//! ## Handshake
//!
//! 1. Discourse sends `sso=<base64 payload>&sig=<hex HMAC-SHA256(sso)>`
//! 2. The signature is checked over the still-encoded `sso` text
//! 3. The payload is decoded and its `nonce` extracted
//! 4. A new payload (`nonce`, `email`, `external_id`, `username`, `name`,
//!    `groups`, `admin`) is encoded, signed, and sent back to the
//!    configured return URL

use base64ct::{Base64, Encoding};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use url::form_urlencoded;

use crate::auth::AuthError;
use crate::config::ConfigError;
use crate::models::Identity;

type HmacSha256 = Hmac<Sha256>;

/// Contents of `discourse.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct DiscourseConfig {
    #[serde(alias = "Secret")]
    pub secret: String,
    #[serde(alias = "ReturnURL", alias = "returnURL", alias = "return_sso_url")]
    pub return_url: String,
}

/// A verified inbound SSO request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SsoRequest {
    pub nonce: String,
}

/// Holds the shared secret and the fixed return URL of one Discourse
/// instance. Immutable after startup.
pub struct DiscourseBridge {
    secret: Vec<u8>,
    return_url: String,
}

impl std::fmt::Debug for DiscourseBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscourseBridge")
            .field("return_url", &self.return_url)
            .finish_non_exhaustive()
    }
}

impl DiscourseBridge {
    pub fn new(secret: impl Into<Vec<u8>>, return_url: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            return_url: return_url.into(),
        }
    }

    pub fn from_config(config: DiscourseConfig) -> Result<Self, ConfigError> {
        if config.secret.is_empty() {
            return Err(ConfigError::Invalid("discourse secret must not be empty".into()));
        }
        if config.return_url.is_empty() {
            return Err(ConfigError::Invalid("discourse return_url must not be empty".into()));
        }
        Ok(Self::new(config.secret.into_bytes(), config.return_url))
    }

    pub fn return_url(&self) -> &str {
        &self.return_url
    }

    fn mac(&self) -> Result<HmacSha256, AuthError> {
        HmacSha256::new_from_slice(&self.secret)
            .map_err(|e| AuthError::InternalError(format!("invalid HMAC key: {e}")))
    }

    /// Hex HMAC-SHA256 of `payload` under the shared secret.
    pub fn sign(&self, payload: &str) -> Result<String, AuthError> {
        let mut mac = self.mac()?;
        mac.update(payload.as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    /// Check the inbound signature, then decode the payload.
    pub fn verify(&self, sso: &str, sig: &str) -> Result<SsoRequest, AuthError> {
        let sig = hex::decode(sig.trim()).map_err(|_| AuthError::InvalidSignature)?;

        let mut mac = self.mac()?;
        mac.update(sso.as_bytes());
        mac.verify_slice(&sig)
            .map_err(|_| AuthError::InvalidSignature)?;

        // Older Discourse releases wrap the base64 text at 60 columns.
        let compact: String = sso.chars().filter(|c| !matches!(c, '\r' | '\n')).collect();
        let decoded = Base64::decode_vec(&compact)
            .map_err(|e| AuthError::MalformedPayload(format!("invalid base64 in sso: {e}")))?;

        let nonce = form_urlencoded::parse(&decoded)
            .find(|(key, _)| key == "nonce")
            .map(|(_, value)| value.into_owned())
            .filter(|nonce| !nonce.is_empty())
            .ok_or(AuthError::MissingNonce)?;

        Ok(SsoRequest { nonce })
    }

    /// Build the signed redirect that logs `identity` into Discourse.
    pub fn respond(&self, request: &SsoRequest, identity: &Identity) -> Result<String, AuthError> {
        let groups = identity
            .groups
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(",");
        let external_id = identity.id.to_string();

        let payload = form_urlencoded::Serializer::new(String::new())
            .append_pair("nonce", &request.nonce)
            .append_pair("email", &identity.email)
            .append_pair("external_id", &external_id)
            .append_pair("username", &identity.username)
            .append_pair("name", &identity.display_name)
            .append_pair("groups", &groups)
            .append_pair("admin", if identity.is_admin { "true" } else { "false" })
            .finish();

        let encoded = Base64::encode_string(payload.as_bytes());
        let sig = self.sign(&encoded)?;
        let escaped: String = form_urlencoded::byte_serialize(encoded.as_bytes()).collect();

        Ok(format!("{}?sso={}&sig={}", self.return_url, escaped, sig))
    }
}
