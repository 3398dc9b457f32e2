// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Configuration is loaded from the environment and two TOML files once at
//! startup and is read-only afterwards.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `MWFORUM_DB` | MySQL connection string of the forum | `mysql://localhost/mwforum` |
//! | `MWFORUM_COOKIE_PREFIX` | Forum cookie prefix | `mwf_` |
//! | `MWFORUM_TABLE_PREFIX` | Forum table prefix | empty |
//! | `MWFORUM_DB_MAX_CONNECTIONS` | Connection pool size | `10` |
//! | `BASE_PATH` | Public path prefix for rendered links | empty |
//! | `DISCOURSE_CONFIG` | Discourse SSO config file | `discourse.toml` |
//! | `JWT_CONFIG` | JWT site registry file | `jwt.toml` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use tracing::warn;

use crate::bridge::{DiscourseBridge, DiscourseConfig, IssuerRegistry, JwtBridge, JwtConfig};

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const DATABASE_URL_ENV: &str = "MWFORUM_DB";
pub const COOKIE_PREFIX_ENV: &str = "MWFORUM_COOKIE_PREFIX";
pub const TABLE_PREFIX_ENV: &str = "MWFORUM_TABLE_PREFIX";
pub const MAX_CONNECTIONS_ENV: &str = "MWFORUM_DB_MAX_CONNECTIONS";
pub const BASE_PATH_ENV: &str = "BASE_PATH";
pub const DISCOURSE_CONFIG_ENV: &str = "DISCOURSE_CONFIG";
pub const JWT_CONFIG_ENV: &str = "JWT_CONFIG";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_DATABASE_URL: &str = "mysql://localhost/mwforum";
pub const DEFAULT_COOKIE_PREFIX: &str = "mwf_";
pub const DEFAULT_MAX_CONNECTIONS: u32 = 10;
pub const DEFAULT_DISCOURSE_CONFIG: &str = "discourse.toml";
pub const DEFAULT_JWT_CONFIG: &str = "jwt.toml";
pub const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";

/// Startup configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid value for {name}: {value:?}")]
    InvalidEnv { name: &'static str, value: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Process settings taken from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub cookie_prefix: String,
    pub table_prefix: String,
    pub max_connections: u32,
    pub base_path: String,
    pub discourse_config: PathBuf,
    pub jwt_config: PathBuf,
}

impl Settings {
    /// Read settings from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read settings through `lookup`; empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| lookup(name).filter(|v| !v.is_empty());

        let port = match get(PORT_ENV) {
            Some(value) => value.parse().map_err(|_| ConfigError::InvalidEnv {
                name: PORT_ENV,
                value,
            })?,
            None => DEFAULT_PORT,
        };
        let max_connections = match get(MAX_CONNECTIONS_ENV) {
            Some(value) => value.parse().map_err(|_| ConfigError::InvalidEnv {
                name: MAX_CONNECTIONS_ENV,
                value,
            })?,
            None => DEFAULT_MAX_CONNECTIONS,
        };

        Ok(Self {
            host: get(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
            database_url: get(DATABASE_URL_ENV).unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            cookie_prefix: get(COOKIE_PREFIX_ENV).unwrap_or_else(|| DEFAULT_COOKIE_PREFIX.to_string()),
            table_prefix: get(TABLE_PREFIX_ENV).unwrap_or_default(),
            max_connections,
            base_path: normalize_base_path(&get(BASE_PATH_ENV).unwrap_or_default()),
            discourse_config: get(DISCOURSE_CONFIG_ENV)
                .unwrap_or_else(|| DEFAULT_DISCOURSE_CONFIG.to_string())
                .into(),
            jwt_config: get(JWT_CONFIG_ENV)
                .unwrap_or_else(|| DEFAULT_JWT_CONFIG.to_string())
                .into(),
        })
    }

    /// Load the Discourse bridge, or `None` when its file does not exist.
    pub fn load_discourse(&self) -> Result<Option<DiscourseBridge>, ConfigError> {
        read_optional_toml::<DiscourseConfig>(&self.discourse_config)?
            .map(DiscourseBridge::from_config)
            .transpose()
    }

    /// Load the JWT site registry, or `None` when its file does not exist.
    pub fn load_jwt(&self) -> Result<Option<JwtBridge>, ConfigError> {
        Ok(read_optional_toml::<JwtConfig>(&self.jwt_config)?
            .map(IssuerRegistry::from_config)
            .transpose()?
            .map(JwtBridge::new))
    }
}

/// `""`, `"/"` → `""`; `"auth/"` → `"/auth"`.
fn normalize_base_path(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{trimmed}")
    }
}

/// Parse a TOML file; a missing file is `Ok(None)`.
pub fn read_optional_toml<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, ConfigError> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!(path = %path.display(), "Config file not found, bridge disabled");
            return Ok(None);
        }
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    toml::from_str(&contents)
        .map(Some)
        .map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn settings_from(vars: &[(&str, &str)]) -> Result<Settings, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|name| vars.get(name).cloned())
    }

    fn write_file(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn defaults_apply_when_unset() {
        let settings = settings_from(&[]).unwrap();
        assert_eq!(settings.port, DEFAULT_PORT);
        assert_eq!(settings.cookie_prefix, "mwf_");
        assert_eq!(settings.table_prefix, "");
        assert_eq!(settings.jwt_config, PathBuf::from("jwt.toml"));
        assert_eq!(settings.base_path, "");
    }

    #[test]
    fn environment_overrides_defaults() {
        let settings = settings_from(&[
            (PORT_ENV, "9000"),
            (COOKIE_PREFIX_ENV, "forum_"),
            (BASE_PATH_ENV, "auth/"),
            (MAX_CONNECTIONS_ENV, ""),
        ])
        .unwrap();
        assert_eq!(settings.port, 9000);
        assert_eq!(settings.cookie_prefix, "forum_");
        assert_eq!(settings.base_path, "/auth");
        assert_eq!(settings.max_connections, DEFAULT_MAX_CONNECTIONS);
    }

    #[test]
    fn invalid_port_is_reported() {
        let err = settings_from(&[(PORT_ENV, "http")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnv { name: PORT_ENV, .. }));
    }

    #[test]
    fn missing_files_disable_bridges() {
        let settings = settings_from(&[
            (DISCOURSE_CONFIG_ENV, "/nonexistent/discourse.toml"),
            (JWT_CONFIG_ENV, "/nonexistent/jwt.toml"),
        ])
        .unwrap();
        assert!(settings.load_discourse().unwrap().is_none());
        assert!(settings.load_jwt().unwrap().is_none());
    }

    #[test]
    fn loads_discourse_file_with_original_field_names() {
        let file = write_file(
            "Secret = \"s3cret\"\nReturnURL = \"https://forum.example/session/sso_login\"\n",
        );
        let mut settings = settings_from(&[]).unwrap();
        settings.discourse_config = file.path().to_path_buf();

        let bridge = settings.load_discourse().unwrap().unwrap();
        assert_eq!(bridge.return_url(), "https://forum.example/session/sso_login");
    }

    #[test]
    fn loads_jwt_site_table() {
        let file = write_file(
            r#"
issuer = "auth.example"

[sites.wiki]
url = "https://wiki.example/login"
key = "c2VjcmV0"
exp = "10m"
"#,
        );
        let mut settings = settings_from(&[]).unwrap();
        settings.jwt_config = file.path().to_path_buf();

        let bridge = settings.load_jwt().unwrap().unwrap();
        assert_eq!(bridge.registry().issuer(), "auth.example");
        let site = bridge.registry().site("wiki").unwrap();
        assert_eq!(site.token_lifetime, std::time::Duration::from_secs(600));
    }

    #[test]
    fn malformed_file_aborts_startup() {
        let file = write_file("issuer = [unterminated");
        let mut settings = settings_from(&[]).unwrap();
        settings.jwt_config = file.path().to_path_buf();
        assert!(matches!(settings.load_jwt(), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn invalid_duration_aborts_startup() {
        let file = write_file(
            "issuer = \"i\"\n[sites.s]\nurl = \"u\"\nkey = \"c2VjcmV0\"\nexp = \"soon\"\n",
        );
        let mut settings = settings_from(&[]).unwrap();
        settings.jwt_config = file.path().to_path_buf();
        let err = settings.load_jwt().unwrap_err();
        assert!(err.to_string().contains("invalid exp for s"));
    }
}
