// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Forum Auth Bridge - mwforum sessions as a single sign-on source
//!
//! This crate turns a login session of an mwforum installation into signed
//! trust assertions for other sites: Discourse SSO payloads and per-site
//! HMAC-signed JWTs.
//!
//! ## Modules
//!
//! - `api` - HTTP handlers and router (Axum)
//! - `auth` - Password hashing, login cookies, session validation
//! - `bridge` - Discourse SSO and JWT assertion bridges
//! - `render` - Login and index pages
//! - `storage` - Forum user directory (MySQL, in-memory)

pub mod api;
pub mod auth;
pub mod bridge;
pub mod config;
pub mod error;
pub mod models;
pub mod render;
pub mod state;
pub mod storage;
