// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::auth::SessionValidator;
use crate::bridge::{DiscourseBridge, JwtBridge};
use crate::render::Renderer;

/// Shared, read-only request state. Bridges are `None` when their config
/// file is absent.
#[derive(Clone)]
pub struct AppState {
    pub sessions: SessionValidator,
    pub renderer: Arc<dyn Renderer>,
    pub discourse: Option<Arc<DiscourseBridge>>,
    pub jwt: Option<Arc<JwtBridge>>,
    pub base_path: String,
}

impl AppState {
    pub fn new(sessions: SessionValidator, renderer: Arc<dyn Renderer>) -> Self {
        Self {
            sessions,
            renderer,
            discourse: None,
            jwt: None,
            base_path: String::new(),
        }
    }

    pub fn with_discourse(mut self, bridge: DiscourseBridge) -> Self {
        self.discourse = Some(Arc::new(bridge));
        self
    }

    pub fn with_jwt(mut self, bridge: JwtBridge) -> Self {
        self.jwt = Some(Arc::new(bridge));
        self
    }

    pub fn with_base_path(mut self, base_path: impl Into<String>) -> Self {
        self.base_path = base_path.into();
        self
    }

    /// `path` under the public base path.
    pub fn link(&self, path: &str) -> String {
        format!("{}{}", self.base_path, path)
    }
}
