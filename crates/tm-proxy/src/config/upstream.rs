//! Upstream and connection pool configuration.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UpstreamConfig {
    /// Site proxied when a request carries no (or an empty) `target` parameter.
    #[serde(default = "default_target")]
    pub default_target: String,
    /// Upper bound for one upstream exchange, body included.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            default_target: default_target(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

fn default_target() -> String {
    "https://quarkus.io".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

/// Tuning for the pooled client that talks to target sites.
///
/// Missing keys fall back to [`ConnectionPoolConfig::default`].
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ConnectionPoolConfig {
    /// Idle keep-alive connections retained per target host.
    pub max_idle_per_host: usize,
    /// Seconds an unused pooled connection may sit before it is closed.
    pub idle_timeout_secs: u64,
    /// TCP keepalive probe interval on upstream sockets.
    pub keepalive_timeout_secs: u64,
    /// Seconds allowed for the TCP connect to a target.
    pub connect_timeout_secs: u64,
}

impl Default for ConnectionPoolConfig {
    fn default() -> Self {
        Self {
            max_idle_per_host: 100,
            idle_timeout_secs: 90,
            keepalive_timeout_secs: 60,
            connect_timeout_secs: 5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_partial_override_keeps_other_defaults() {
        let pool: ConnectionPoolConfig =
            serde_yaml::from_str("max_idle_per_host: 4\nconnect_timeout_secs: 2").unwrap();
        assert_eq!(pool.max_idle_per_host, 4);
        assert_eq!(pool.connect_timeout_secs, 2);
        assert_eq!(pool.idle_timeout_secs, 90);
        assert_eq!(pool.keepalive_timeout_secs, 60);
    }

    #[test]
    fn test_upstream_defaults() {
        let upstream: UpstreamConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(upstream.default_target, "https://quarkus.io");
        assert_eq!(upstream.request_timeout_secs, 30);
    }
}
