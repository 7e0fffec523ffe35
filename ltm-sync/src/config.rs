//! Runtime configuration.

use std::time::Duration;

/// Default per-request timeout for appliance calls.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default number of delete attempts for a node blocked by pool members.
pub const DEFAULT_MAX_DELETE_ATTEMPTS: u32 = 10;

/// How to reach the appliance.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Hostname, `host:port`, or full base URL.
    pub host: String,
    pub username: String,
    pub password: String,
    /// Accept self-signed certificates.
    pub insecure: bool,
    pub timeout: Duration,
}

impl ConnectionConfig {
    pub fn new(
        host: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            username: username.into(),
            password: password.into(),
            insecure: false,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Knobs for the resource managers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileConfig {
    /// Upper bound on node delete calls, including the first one.
    pub max_delete_attempts: u32,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            max_delete_attempts: DEFAULT_MAX_DELETE_ATTEMPTS,
        }
    }
}
