// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Cookie helpers for the mwforum login cookie.

use axum::http::{header::COOKIE, HeaderMap};
use chrono::{DateTime, Utc};

/// Fixed `Expires` value used to discard a cookie.
pub const EXPIRED_DATE: &str = "Thu, 01 Jan 1970 00:00:00 GMT";

/// Find the first cookie named `name` across all `Cookie` headers.
pub fn find_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| key.trim() == name)
        .map(|(_, value)| strip_quotes(value.trim()))
}

fn strip_quotes(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}

/// Format a timestamp as an IMF-fixdate for the `Expires` attribute.
pub fn http_date(at: DateTime<Utc>) -> String {
    at.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// Build a `Set-Cookie` value restricted to HTTPS and hidden from scripts.
pub fn secure_cookie(name: &str, value: &str, expires: &str) -> String {
    format!("{name}={value}; Path=/; Secure; HttpOnly; Expires={expires}")
}

/// Build a `Set-Cookie` value that makes the client drop `name`.
pub fn expired_cookie(name: &str) -> String {
    secure_cookie(name, "deleted", EXPIRED_DATE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use chrono::TimeZone;

    fn headers(values: &[&str]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for value in values {
            map.append(COOKIE, HeaderValue::from_str(value).unwrap());
        }
        map
    }

    #[test]
    fn finds_cookie_among_others() {
        let map = headers(&["theme=dark; mwf_login=12:abc; other=1"]);
        assert_eq!(find_cookie(&map, "mwf_login"), Some("12:abc"));
        assert_eq!(find_cookie(&map, "missing"), None);
    }

    #[test]
    fn searches_every_cookie_header() {
        let map = headers(&["a=1", "mwf_login=\"5:xyz\""]);
        assert_eq!(find_cookie(&map, "mwf_login"), Some("5:xyz"));
    }

    #[test]
    fn first_matching_cookie_wins() {
        let map = headers(&["mwf_login=1:a; mwf_login=2:b"]);
        assert_eq!(find_cookie(&map, "mwf_login"), Some("1:a"));
    }

    #[test]
    fn prefix_must_match_exactly() {
        let map = headers(&["xmwf_login=1:a"]);
        assert_eq!(find_cookie(&map, "mwf_login"), None);
    }

    #[test]
    fn http_date_is_imf_fixdate() {
        let at = Utc.with_ymd_and_hms(2031, 12, 31, 0, 0, 0).unwrap();
        assert_eq!(http_date(at), "Wed, 31 Dec 2031 00:00:00 GMT");
    }

    #[test]
    fn expired_cookie_is_secure_and_in_the_past() {
        let cookie = expired_cookie("mwf_login");
        assert!(cookie.starts_with("mwf_login=deleted;"));
        assert!(cookie.contains("Secure"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains(EXPIRED_DATE));
    }
}
