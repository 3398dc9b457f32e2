// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! Request and response structures used by the HTTP surface, plus the
//! [`Identity`] handed to both bridges.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::storage::{UserId, UserRecord};

// =============================================================================
// Identity
// =============================================================================

/// The authenticated local forum user.
///
/// Only produced by the session validator, and rebuilt for every request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Identity {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub display_name: String,
    pub is_admin: bool,
    pub groups: BTreeSet<String>,
}

impl Identity {
    pub fn from_record(record: UserRecord, groups: impl IntoIterator<Item = String>) -> Self {
        Self {
            id: record.user_id,
            username: record.username,
            email: record.email,
            display_name: record.real_name,
            is_admin: record.admin,
            groups: groups.into_iter().collect(),
        }
    }
}

// =============================================================================
// Login
// =============================================================================

/// JSON login body. Field names are matched case-insensitively for the
/// common spellings.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct LoginRequest {
    #[serde(default, alias = "Username")]
    pub username: String,
    #[serde(default, alias = "Password")]
    pub password: String,
}

/// Body returned by `POST /login` when JSON credentials are rejected.
#[derive(Debug, Serialize, ToSchema)]
pub struct LoginFailure {
    pub message: String,
}
