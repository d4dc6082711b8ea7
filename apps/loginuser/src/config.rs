//! Server configuration.
//!
//! Built from CLI flags (with `LOGINUSER_*` environment fallbacks, see
//! [`crate::cli::ServeArgs`]) and validated before the server starts.

use crate::auth::DEFAULT_COOKIE_NAME;
use loginuser_core::{DEFAULT_MAX_SESSIONS, FailurePolicy, SessionPolicy};
use std::net::SocketAddr;
use std::path::PathBuf;
use thiserror::Error;

/// Default listen address.
pub const DEFAULT_BIND: &str = "127.0.0.1:8080";

/// Default interval between expired-session sweeps.
pub const DEFAULT_PURGE_INTERVAL_SECS: u64 = 60;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("cookie name {0:?} is not a valid HTTP token")]
    InvalidCookieName(String),

    #[error("session ttl must be greater than zero")]
    ZeroTtl,

    #[error("max sessions must be greater than zero")]
    ZeroCapacity,
}

/// Everything needed to run the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    pub cookie_name: String,
    pub session: SessionPolicy,
    pub failure_policy: FailurePolicy,
    pub max_sessions: usize,
    /// JSON seed file loaded at startup.
    pub seeds: Option<PathBuf>,
    /// Seconds between expired-session sweeps; `0` disables sweeping.
    pub purge_interval_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 8080)),
            cookie_name: DEFAULT_COOKIE_NAME.to_owned(),
            session: SessionPolicy::default(),
            failure_policy: FailurePolicy::default(),
            max_sessions: DEFAULT_MAX_SESSIONS,
            seeds: None,
            purge_interval_secs: DEFAULT_PURGE_INTERVAL_SECS,
        }
    }
}

impl ServerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !is_token(&self.cookie_name) {
            return Err(ConfigError::InvalidCookieName(self.cookie_name.clone()));
        }
        if self.session.ttl_secs == 0 {
            return Err(ConfigError::ZeroTtl);
        }
        if self.max_sessions == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        Ok(())
    }
}

/// RFC 7230 `token`: one or more tchars.
fn is_token(name: &str) -> bool {
    !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        let config = ServerConfig::default();
        assert_eq!(config.validate(), Ok(()));
        assert_eq!(config.bind.to_string(), DEFAULT_BIND);
    }

    #[test]
    fn rejects_bad_cookie_names() {
        for name in ["", "has space", "semi;colon", "eq=ual", "quote\""] {
            let config = ServerConfig {
                cookie_name: name.to_owned(),
                ..ServerConfig::default()
            };
            assert_eq!(
                config.validate(),
                Err(ConfigError::InvalidCookieName(name.to_owned()))
            );
        }
    }

    #[test]
    fn accepts_common_cookie_names() {
        for name in ["SESSION", "JSESSIONID", "__Host-sid", "app.session"] {
            assert!(is_token(name), "{name}");
        }
    }

    #[test]
    fn rejects_zero_ttl_and_capacity() {
        let zero_ttl = ServerConfig {
            session: SessionPolicy {
                ttl_secs: 0,
                sliding: true,
            },
            ..ServerConfig::default()
        };
        assert_eq!(zero_ttl.validate(), Err(ConfigError::ZeroTtl));

        let zero_cap = ServerConfig {
            max_sessions: 0,
            ..ServerConfig::default()
        };
        assert_eq!(zero_cap.validate(), Err(ConfigError::ZeroCapacity));
    }
}
