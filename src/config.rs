//! Configuration Module
//!
//! Handles loading and managing store and server configuration from environment variables.

use std::env;
use std::str::FromStr;

use crate::backend::ClientVariant;

/// Settings consumed by the session store itself.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Backend address, e.g. `redis://127.0.0.1:6379`
    pub backend_address: String,
    /// Logical database index selected after connecting
    pub database_index: u32,
    /// Which client implementation to dial the backend with
    pub client_variant: ClientVariant,
    /// TTL in seconds applied at creation, 0 = sessions never idle out
    pub idle_timeout: u64,
    /// Absolute session lifetime in seconds
    pub max_session_time: u64,
    /// Reject sessions used from a different remote address
    pub check_remote_addr: bool,
    /// Remove the session when the remote address check fails
    pub remove_on_origin_mismatch: bool,
    /// Remove the session when it exceeds the max lifetime
    pub remove_on_expiry: bool,
    /// `SessionSource` value of sessions opened by the internal API
    pub internal_source_marker: String,
}

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// Expired-session sweep interval in seconds
    pub sweep_interval: u64,
    /// Store settings
    pub session: SessionConfig,
}

impl SessionConfig {
    /// Loads the store settings from environment variables.
    ///
    /// # Environment Variables
    /// - `SESSION_REDIS_ADDRESS` - Backend address (default: redis://127.0.0.1:6379)
    /// - `SESSION_REDIS_DATABASE` - Database index (default: 0)
    /// - `SESSION_REDIS_CLIENT` - `fast`, `standard` or `memory` (default: fast)
    /// - `SESSION_MAX_IDLE_TIME` - Idle timeout in seconds (default: 7200)
    /// - `SESSION_MAX_TIME` - Max session lifetime in seconds (default: 57600)
    /// - `SESSION_CHECK_REMOTE_IP` - Origin check (default: true)
    /// - `SESSION_DELETE_IF_NOT_REMOTE_ID` - Remove on origin mismatch (default: true)
    /// - `SESSION_DELETE_IF_TIME_TO_OLD` - Remove on expiry (default: true)
    /// - `SESSION_INTERNAL_SOURCE` - Internal API marker (default: GenericInterface)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            backend_address: env::var("SESSION_REDIS_ADDRESS")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.backend_address),
            database_index: parse_var("SESSION_REDIS_DATABASE").unwrap_or(defaults.database_index),
            client_variant: parse_var("SESSION_REDIS_CLIENT").unwrap_or(defaults.client_variant),
            idle_timeout: parse_var("SESSION_MAX_IDLE_TIME").unwrap_or(defaults.idle_timeout),
            max_session_time: parse_var("SESSION_MAX_TIME").unwrap_or(defaults.max_session_time),
            check_remote_addr: flag_var("SESSION_CHECK_REMOTE_IP")
                .unwrap_or(defaults.check_remote_addr),
            remove_on_origin_mismatch: flag_var("SESSION_DELETE_IF_NOT_REMOTE_ID")
                .unwrap_or(defaults.remove_on_origin_mismatch),
            remove_on_expiry: flag_var("SESSION_DELETE_IF_TIME_TO_OLD")
                .unwrap_or(defaults.remove_on_expiry),
            internal_source_marker: env::var("SESSION_INTERNAL_SOURCE")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.internal_source_marker),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            backend_address: "redis://127.0.0.1:6379".to_string(),
            database_index: 0,
            client_variant: ClientVariant::Fast,
            idle_timeout: 7200,
            max_session_time: 57600,
            check_remote_addr: true,
            remove_on_origin_mismatch: true,
            remove_on_expiry: true,
            internal_source_marker: "GenericInterface".to_string(),
        }
    }
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `SWEEP_INTERVAL` - Expired-session sweep frequency in seconds (default: 60)
    /// - plus everything read by [`SessionConfig::from_env`]
    pub fn from_env() -> Self {
        Self {
            server_port: parse_var("SERVER_PORT").unwrap_or(3000),
            sweep_interval: parse_var("SWEEP_INTERVAL").unwrap_or(60),
            session: SessionConfig::from_env(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 3000,
            sweep_interval: 60,
            session: SessionConfig::default(),
        }
    }
}

fn parse_var<T: FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

// Accepts the usual spellings, including the 0/1 the config files tend to use.
fn flag_var(name: &str) -> Option<bool> {
    let raw = env::var(name).ok()?;
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.sweep_interval, 60);
        assert_eq!(config.session.database_index, 0);
        assert_eq!(config.session.client_variant, ClientVariant::Fast);
        assert_eq!(config.session.idle_timeout, 7200);
        assert_eq!(config.session.max_session_time, 57600);
        assert_eq!(config.session.internal_source_marker, "GenericInterface");
    }

    // Single test so the env mutations cannot race with each other.
    #[test]
    fn test_config_from_env() {
        env::remove_var("SERVER_PORT");
        env::remove_var("SWEEP_INTERVAL");
        env::remove_var("SESSION_REDIS_DATABASE");
        env::remove_var("SESSION_MAX_TIME");

        let config = Config::from_env();
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.sweep_interval, 60);
        assert_eq!(config.session.database_index, 0);

        env::set_var("SESSION_REDIS_CLIENT", "memory");
        env::set_var("SESSION_CHECK_REMOTE_IP", "0");
        env::set_var("SESSION_MAX_IDLE_TIME", "not-a-number");

        let session = SessionConfig::from_env();
        assert_eq!(session.client_variant, ClientVariant::Memory);
        assert!(!session.check_remote_addr);
        assert_eq!(session.idle_timeout, 7200);

        env::remove_var("SESSION_REDIS_CLIENT");
        env::remove_var("SESSION_CHECK_REMOTE_IP");
        env::remove_var("SESSION_MAX_IDLE_TIME");
    }
}
