// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! mwforum password hashing.
//!
//! ## On-disk format
//!
//! `base64url_nopad(md5^100000(password || salt))`: the UTF-8 bytes of the
//! password followed by the salt are digested once, and the 16-byte digest
//! is then digested again until 100,000 rounds have been applied.
//!
//! This is frozen: every stored forum credential uses exactly this
//! construction, so the digest, round count, and salt placement must not
//! change.

use base64ct::{Base64UrlUnpadded, Encoding};
use md5::{Digest, Md5};
use subtle::ConstantTimeEq;

/// Total number of digest rounds.
pub const HASH_ROUNDS: usize = 100_000;

/// Hash a password the way mwforum stores it.
pub fn hash_password(password: &str, salt: &str) -> String {
    let mut hasher = Md5::new();
    hasher.update(password.as_bytes());
    hasher.update(salt.as_bytes());
    let mut digest = hasher.finalize();

    for _ in 1..HASH_ROUNDS {
        digest = Md5::digest(&digest[..]);
    }

    Base64UrlUnpadded::encode_string(&digest)
}

/// Compare a password against a stored hash in constant time.
pub fn password_matches(password: &str, salt: &str, stored_hash: &str) -> bool {
    let computed = hash_password(password, salt);
    computed.as_bytes().ct_eq(stored_hash.as_bytes()).into()
}
