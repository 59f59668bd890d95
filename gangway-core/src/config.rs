//! Remote endpoint configuration

use serde::{Deserialize, Serialize};

/// Companion server base URL used when nothing is configured.
pub const DEFAULT_SERVER_URL: &str = "http://localhost:3001";

/// Event channel URL used when nothing is configured.
pub const DEFAULT_EVENTS_URL: &str = "ws://localhost:3002";

/// Environment variable overriding the companion server base URL.
pub const SERVER_URL_ENV: &str = "GANGWAY_SERVER_URL";

/// Environment variable overriding the event channel URL.
pub const EVENTS_URL_ENV: &str = "GANGWAY_EVENTS_URL";

/// Where the companion server lives when running in remote mode.
///
/// Only meaningful in remote mode; native mode never reads these values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteConfig {
    pub server_url: String,
    pub events_url: String,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            events_url: DEFAULT_EVENTS_URL.to_string(),
        }
    }
}

impl RemoteConfig {
    /// Resolve from the process environment, falling back to the localhost
    /// defaults a local dev companion server listens on.
    pub fn from_env() -> Self {
        Self {
            server_url: std::env::var(SERVER_URL_ENV)
                .unwrap_or_else(|_| DEFAULT_SERVER_URL.to_string()),
            events_url: std::env::var(EVENTS_URL_ENV)
                .unwrap_or_else(|_| DEFAULT_EVENTS_URL.to_string()),
        }
    }
}
