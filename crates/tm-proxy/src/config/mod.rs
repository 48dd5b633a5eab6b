//! Configuration types for the proxy.

mod listen;
mod rewrite;
mod upstream;

use std::path::Path;

use anyhow::Context;
use hyper::Uri;
use serde::{Deserialize, Serialize};

pub use listen::ListenConfig;
pub use rewrite::RewriteConfig;
pub use upstream::{ConnectionPoolConfig, UpstreamConfig};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub listen: ListenConfig,
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub connection_pool: ConnectionPoolConfig,
    #[serde(default)]
    pub rewrite: RewriteConfig,
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, anyhow::Error> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Config = serde_yaml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.listen.socket_addr()?;

        if !is_http_origin(&self.upstream.default_target) {
            anyhow::bail!(
                "Invalid upstream.default_target '{}': expected an absolute http(s) URI such as https://quarkus.io",
                self.upstream.default_target
            );
        }

        if self.upstream.request_timeout_secs == 0 {
            anyhow::bail!("upstream.request_timeout_secs must be greater than 0");
        }

        if let Some(ref base) = self.rewrite.public_base_uri {
            if !is_http_origin(base) {
                anyhow::bail!(
                    "Invalid rewrite.public_base_uri '{base}': expected an absolute http(s) URI"
                );
            }
        }

        Ok(())
    }
}

/// Absolute `http`/`https` URI with a non-empty host.
fn is_http_origin(value: &str) -> bool {
    let Ok(uri) = value.parse::<Uri>() else {
        return false;
    };
    matches!(uri.scheme_str(), Some("http") | Some("https"))
        && uri.host().is_some_and(|host| !host.is_empty())
}
