// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Trust-Assertion Bridges
//!
//! Both bridges follow the same shape: verify the caller's signature first
//! (fail closed), resolve the local identity through the session validator,
//! then sign an outbound assertion and redirect. A missing session hands off
//! to the login page with a [`PendingReturn`] so the handshake can be
//! retried once the user has logged in.

pub mod discourse;
pub mod jwt;
pub mod pending;

pub use discourse::{DiscourseBridge, DiscourseConfig, SsoRequest};
pub use jwt::{AssertionClaims, IssuerRegistry, JwtBridge, JwtConfig, JwtSite};
pub use pending::{sanitize_return_url, PendingReturn};
