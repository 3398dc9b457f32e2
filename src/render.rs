// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Page Rendering
//!
//! The service only needs two pages: the login form (optionally carrying a
//! [`PendingReturn`] and an error) and a minimal index page. Rendering sits
//! behind [`Renderer`] so a deployment can swap in forum-styled templates.

use handlebars::{Handlebars, TemplateError};
use serde::Serialize;
use tracing::error;

use crate::{auth::AuthError, bridge::PendingReturn};

const LOGIN_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>Login</title>
</head>
<body>
<h1>Login</h1>
{{#if error}}
<p class="error">{{error}}</p>
{{/if}}
<form method="post" action="{{base_path}}/login">
<label>Username or email <input type="text" name="username" value="{{username}}" autofocus></label>
<label>Password <input type="password" name="password"></label>
{{#if return_url}}
<input type="hidden" name="returnURL" value="{{return_url}}">
{{/if}}
<button type="submit">Log in</button>
</form>
</body>
</html>
"#;

const INDEX_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>Account</title>
</head>
<body>
<h1>Logged in</h1>
<p>Hello, {{name}}.</p>
<p><a href="{{base_path}}/logout">Log out</a></p>
</body>
</html>
"#;

/// Inputs for the login form.
#[derive(Debug, Clone, Default)]
pub struct LoginPage {
    /// Prefilled username after a failed attempt
    pub username: String,
    /// Request to resume after login
    pub pending: Option<PendingReturn>,
    /// Raw `returnURL` echoed from a failed form post
    pub return_url: Option<String>,
    pub error: Option<String>,
}

impl LoginPage {
    pub fn resuming(pending: PendingReturn) -> Self {
        Self {
            pending: Some(pending),
            ..Self::default()
        }
    }

    /// Value for the hidden `returnURL` field.
    pub fn return_target(&self) -> Option<String> {
        match (&self.pending, &self.return_url) {
            (Some(pending), _) => Some(pending.target()),
            (None, Some(url)) if !url.is_empty() => Some(url.clone()),
            _ => None,
        }
    }
}

/// Inputs for the index page.
#[derive(Debug, Clone)]
pub struct IndexPage {
    pub username: String,
    pub display_name: String,
}

pub trait Renderer: Send + Sync {
    fn login_page(&self, page: &LoginPage) -> Result<String, AuthError>;
    fn index_page(&self, page: &IndexPage) -> Result<String, AuthError>;
}

#[derive(Serialize)]
struct LoginContext<'a> {
    base_path: &'a str,
    username: &'a str,
    return_url: Option<String>,
    error: Option<&'a str>,
}

#[derive(Serialize)]
struct IndexContext<'a> {
    base_path: &'a str,
    name: &'a str,
}

/// Handlebars renderer over the built-in templates. Values are HTML-escaped
/// by the registry.
#[derive(Debug, Clone)]
pub struct BasicRenderer {
    handlebars: Handlebars<'static>,
    base_path: String,
}

impl BasicRenderer {
    pub const LOGIN: &'static str = "login";
    pub const INDEX: &'static str = "index";

    pub fn new(base_path: impl Into<String>) -> Result<Self, TemplateError> {
        let mut handlebars = Handlebars::new();
        handlebars.set_strict_mode(false);
        handlebars.register_template_string(Self::LOGIN, LOGIN_TEMPLATE)?;
        handlebars.register_template_string(Self::INDEX, INDEX_TEMPLATE)?;
        Ok(Self {
            handlebars,
            base_path: base_path.into(),
        })
    }

    fn render<T: Serialize>(&self, name: &str, context: &T) -> Result<String, AuthError> {
        self.handlebars.render(name, context).map_err(|e| {
            error!(template = name, error = %e, "Failed to render page");
            AuthError::InternalError(e.to_string())
        })
    }
}

impl Renderer for BasicRenderer {
    fn login_page(&self, page: &LoginPage) -> Result<String, AuthError> {
        let context = LoginContext {
            base_path: &self.base_path,
            username: &page.username,
            return_url: page.return_target(),
            error: page.error.as_deref(),
        };
        self.render(Self::LOGIN, &context)
    }

    fn index_page(&self, page: &IndexPage) -> Result<String, AuthError> {
        let name = if page.display_name.is_empty() {
            &page.username
        } else {
            &page.display_name
        };
        let context = IndexContext {
            base_path: &self.base_path,
            name,
        };
        self.render(Self::INDEX, &context)
    }
}
