// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Return targets for interrupted handshakes.
//!
//! When a bridge request arrives without a usable session, the original
//! request is captured as a [`PendingReturn`] and carried through the login
//! form. After a successful login the browser is sent back to it and the
//! handshake runs again from the top with the caller's original signed query.

use axum::http::{Method, Uri};
use serde::{Deserialize, Serialize};
use url::Url;

/// Placeholder origin used only to resolve untrusted return URLs.
const RESOLVE_BASE: &str = "http://bridge.invalid/";

/// The request to resume after an interactive login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingReturn {
    pub method: String,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
}

impl PendingReturn {
    pub fn from_request(method: &Method, uri: &Uri) -> Self {
        Self {
            method: method.as_str().to_string(),
            path: uri.path().to_string(),
            query: uri.query().map(str::to_string),
        }
    }

    /// Path and raw query, suitable for the login form's `returnURL` field.
    pub fn target(&self) -> String {
        match &self.query {
            Some(query) => format!("{}?{}", self.path, query),
            None => self.path.clone(),
        }
    }
}

/// Reduce a caller-supplied return URL to a same-origin path.
///
/// Scheme, host, and port are discarded so a login can never redirect off
/// site. Unparseable or empty input yields `/`.
pub fn sanitize_return_url(raw: &str) -> String {
    let raw = raw.trim();
    if raw.is_empty() {
        return "/".to_string();
    }
    let Ok(base) = Url::parse(RESOLVE_BASE) else {
        return "/".to_string();
    };
    let Ok(resolved) = base.join(raw) else {
        return "/".to_string();
    };

    let path = resolved.path();
    if !path.starts_with('/') {
        return "/".to_string();
    }
    // `//host` in a Location header is protocol-relative.
    let mut target = format!("/{}", path.trim_start_matches('/'));
    if let Some(query) = resolved.query() {
        target.push('?');
        target.push_str(query);
    }
    if let Some(fragment) = resolved.fragment() {
        target.push('#');
        target.push_str(fragment);
    }
    target
}
