// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Per-site JWT assertions.
//!
//! A site redirects the browser to `/jwt?<token>` where `<token>` is a JWT
//! whose `iss` is the site's registered name, signed with the site's key.
//! The bridge answers by redirecting to the site's URL with a new token
//! signed by the same key:
//!
//! | Claim | Value |
//! |-------|-------|
//! | `iss` | this bridge's issuer name |
//! | `aud` | the requesting site's `iss` |
//! | `iat` / `exp` | now / now + site lifetime |
//! | `jti` | the inbound `jti`, echoed |
//! | `sub` | forum username |
//! | `email` | forum email |

use std::collections::HashMap;
use std::time::Duration;

use base64ct::{Base64, Encoding};
use chrono::{DateTime, Utc};
use jsonwebtoken::{
    decode, decode_header, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header,
    Validation,
};
use serde::{Deserialize, Serialize};

use crate::auth::AuthError;
use crate::config::ConfigError;
use crate::models::Identity;

/// Clock skew tolerance (60 seconds).
const CLOCK_SKEW_LEEWAY: u64 = 60;

/// Contents of `jwt.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    #[serde(alias = "Issuer")]
    pub issuer: String,
    #[serde(default, alias = "Sites")]
    pub sites: HashMap<String, JwtSiteConfig>,
}

/// One `[sites.<issuer>]` table.
#[derive(Debug, Clone, Deserialize)]
pub struct JwtSiteConfig {
    #[serde(alias = "URL", alias = "Url")]
    pub url: String,
    /// Standard base64 HMAC key
    #[serde(alias = "Key")]
    pub key: String,
    /// Token lifetime, e.g. `"1h"`
    #[serde(alias = "Exp")]
    pub exp: String,
}

/// A registered downstream site.
pub struct JwtSite {
    pub response_url: String,
    signing_key: Vec<u8>,
    pub token_lifetime: Duration,
}

impl JwtSite {
    pub fn new(response_url: impl Into<String>, signing_key: Vec<u8>, token_lifetime: Duration) -> Self {
        Self {
            response_url: response_url.into(),
            signing_key,
            token_lifetime,
        }
    }
}

impl std::fmt::Debug for JwtSite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtSite")
            .field("response_url", &self.response_url)
            .field("token_lifetime", &self.token_lifetime)
            .finish_non_exhaustive()
    }
}

/// Issuer name → site, built once at startup and never mutated.
#[derive(Debug)]
pub struct IssuerRegistry {
    issuer: String,
    sites: HashMap<String, JwtSite>,
}

impl IssuerRegistry {
    pub fn new(issuer: impl Into<String>, sites: HashMap<String, JwtSite>) -> Self {
        Self {
            issuer: issuer.into(),
            sites,
        }
    }

    /// Decode keys and lifetimes from the configuration file contents.
    pub fn from_config(config: JwtConfig) -> Result<Self, ConfigError> {
        if config.issuer.is_empty() {
            return Err(ConfigError::Invalid("jwt issuer must not be empty".into()));
        }

        let mut sites = HashMap::with_capacity(config.sites.len());
        for (name, site) in config.sites {
            let key = Base64::decode_vec(site.key.trim())
                .map_err(|e| ConfigError::Invalid(format!("invalid key for {name}: {e}")))?;
            if key.is_empty() {
                return Err(ConfigError::Invalid(format!("empty key for {name}")));
            }
            let lifetime = humantime::parse_duration(site.exp.trim())
                .map_err(|e| ConfigError::Invalid(format!("invalid exp for {name}: {e}")))?;
            sites.insert(name, JwtSite::new(site.url, key, lifetime));
        }

        Ok(Self::new(config.issuer, sites))
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    pub fn site(&self, issuer: &str) -> Option<&JwtSite> {
        self.sites.get(issuer)
    }

    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }
}

/// Claims read from an inbound request token.
#[derive(Debug, Deserialize)]
struct RequestClaims {
    #[serde(default)]
    iss: Option<String>,
    #[serde(default)]
    jti: Option<String>,
}

/// Claims of a minted assertion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssertionClaims {
    pub iss: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,
    pub sub: String,
    pub email: String,
}

/// A request token whose signature checked out under its issuer's key.
#[derive(Debug)]
pub struct VerifiedRequest<'a> {
    pub issuer: String,
    pub jti: Option<String>,
    pub site: &'a JwtSite,
}

fn is_hmac(alg: Algorithm) -> bool {
    matches!(alg, Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512)
}

/// Verifies site requests and mints assertions for them.
#[derive(Debug)]
pub struct JwtBridge {
    registry: IssuerRegistry,
}

impl JwtBridge {
    pub fn new(registry: IssuerRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &IssuerRegistry {
        &self.registry
    }

    /// Verify an inbound token against the key registered for its `iss`.
    pub fn verify<'a>(&'a self, token: &str) -> Result<VerifiedRequest<'a>, AuthError> {
        let header = decode_header(token).map_err(|_| AuthError::MalformedToken)?;

        // Unverified read; only used to pick the key.
        let unverified = jsonwebtoken::dangerous::insecure_decode::<RequestClaims>(token)
            .map_err(|_| AuthError::MalformedToken)?;
        let issuer = unverified.claims.iss.unwrap_or_default();
        let site = self
            .registry
            .site(&issuer)
            .ok_or_else(|| AuthError::UnknownIssuer(issuer.clone()))?;

        if !is_hmac(header.alg) {
            return Err(AuthError::AlgorithmMismatch(format!("{:?}", header.alg)));
        }

        let mut validation = Validation::new(header.alg);
        validation.algorithms = vec![Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];
        validation.leeway = CLOCK_SKEW_LEEWAY;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        let verified = decode::<RequestClaims>(
            token,
            &DecodingKey::from_secret(&site.signing_key),
            &validation,
        )
        .map_err(|e| match e.kind() {
            ErrorKind::InvalidSignature => AuthError::InvalidSignature,
            ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            ErrorKind::InvalidAlgorithm => AuthError::AlgorithmMismatch(format!("{:?}", header.alg)),
            _ => AuthError::MalformedToken,
        })?;

        Ok(VerifiedRequest {
            issuer,
            jti: verified.claims.jti,
            site,
        })
    }

    /// Claims of the assertion answering `request` for `identity`.
    pub fn assertion_claims(
        &self,
        request: &VerifiedRequest<'_>,
        identity: &Identity,
        now: DateTime<Utc>,
    ) -> AssertionClaims {
        let iat = now.timestamp();
        let lifetime = i64::try_from(request.site.token_lifetime.as_secs()).unwrap_or(i64::MAX);
        AssertionClaims {
            iss: self.registry.issuer.clone(),
            aud: request.issuer.clone(),
            iat,
            exp: iat.saturating_add(lifetime),
            jti: request.jti.clone(),
            sub: identity.username.clone(),
            email: identity.email.clone(),
        }
    }

    /// Sign an assertion with the requesting site's key.
    pub fn mint(
        &self,
        request: &VerifiedRequest<'_>,
        identity: &Identity,
        now: DateTime<Utc>,
    ) -> Result<String, AuthError> {
        let claims = self.assertion_claims(request, identity, now);
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(&request.site.signing_key),
        )
        .map_err(|e| AuthError::SigningFailure(e.to_string()))
    }

    /// Build the redirect that delivers a fresh assertion to the site.
    pub fn respond(&self, request: &VerifiedRequest<'_>, identity: &Identity) -> Result<String, AuthError> {
        let token = self.mint(request, identity, Utc::now())?;
        Ok(format!("{}?{}", request.site.response_url, token))
    }
}
