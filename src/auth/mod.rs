// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Local forum authentication shared by both trust-assertion bridges.
//!
//! ## Auth Flow
//!
//! 1. The forum (or `POST /login`) sets `<prefix>login=<user_id>:<login_auth>`
//! 2. On each request the session validator:
//!    - Parses the cookie
//!    - Loads the user row and compares `login_auth` exactly
//!    - Loads the user's group titles
//! 3. The resulting [`Identity`](crate::models::Identity) is handed to the
//!    Discourse or JWT bridge
//!
//! ## Security
//!
//! - Passwords use the frozen mwforum digest (see [`password`])
//! - Unknown users and wrong passwords produce the same error
//! - Cookies are `Secure` and `HttpOnly`

pub mod cookie;
pub mod credentials;
pub mod error;
pub mod extractor;
pub mod password;
pub mod session;

pub use credentials::{CredentialError, CredentialStore};
pub use error::AuthError;
pub use extractor::{Auth, SessionLookup};
pub use password::hash_password;
pub use session::{SessionToken, SessionValidator};
