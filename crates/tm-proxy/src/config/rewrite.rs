//! Rewrite configuration.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RewriteConfig {
    /// Externally visible proxy root used as the prefix of rewritten links.
    /// When unset it is derived from each request's `Host` header.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_base_uri: Option<String>,
}
