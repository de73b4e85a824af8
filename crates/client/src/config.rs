//! Endpoint configuration.
//!
//! The server address comes from a single environment-style setting. Users
//! may write it with or without an `http://`/`https://` scheme; the
//! normalized connection target is always the bare `host:port`, which the
//! transport dials as cleartext HTTP/2.

use std::env;
use std::time::Duration;

/// Environment variable naming the server address.
pub const ADDR_ENV: &str = "GRIDFLOW_ADDR";

/// Address used when [`ADDR_ENV`] is unset.
pub const DEFAULT_ADDR: &str = "127.0.0.1:50051";

/// Upper bound applied to every remote call unless overridden.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(30);

/// Resolved client configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Bare `host:port` connection target, scheme already stripped.
    pub target: String,
    /// Per-call timeout for unary calls and individual stream reads.
    pub call_timeout: Duration,
}

impl ClientConfig {
    /// Build a configuration from an explicit address.
    pub fn new(addr: &str) -> Self {
        Self {
            target: normalize_addr(addr),
            call_timeout: DEFAULT_CALL_TIMEOUT,
        }
    }

    /// Build a configuration from [`ADDR_ENV`], falling back to
    /// [`DEFAULT_ADDR`].
    pub fn from_env() -> Self {
        let raw = env::var(ADDR_ENV).unwrap_or_else(|_| DEFAULT_ADDR.to_string());
        Self::new(&raw)
    }

    /// URI handed to the transport. tonic requires a scheme, so the bare
    /// target is dialed as `http://`.
    pub fn endpoint_uri(&self) -> String {
        format!("http://{}", self.target)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_ADDR)
    }
}

/// Strip an optional `http://`/`https://` prefix and trailing slashes,
/// leaving the bare `host:port`.
pub fn normalize_addr(raw: &str) -> String {
    let trimmed = raw.trim();
    let bare = trimmed
        .strip_prefix("http://")
        .or_else(|| trimmed.strip_prefix("https://"))
        .unwrap_or(trimmed);
    bare.trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn https_scheme_is_stripped() {
        assert_eq!(normalize_addr("https://host:1234"), "host:1234");
    }

    #[test]
    fn http_scheme_is_stripped() {
        assert_eq!(normalize_addr("http://127.0.0.1:50051"), "127.0.0.1:50051");
    }

    #[test]
    fn bare_target_passes_through() {
        assert_eq!(normalize_addr("host:1234"), "host:1234");
    }

    #[test]
    fn whitespace_and_trailing_slash_are_trimmed() {
        assert_eq!(normalize_addr(" http://host:1234/ "), "host:1234");
    }

    #[test]
    fn endpoint_uri_restores_a_dialable_scheme() {
        let config = ClientConfig::new("https://host:1234");
        assert_eq!(config.target, "host:1234");
        assert_eq!(config.endpoint_uri(), "http://host:1234");
    }

    #[test]
    fn default_points_at_localhost() {
        assert_eq!(ClientConfig::default().target, DEFAULT_ADDR);
    }
}
