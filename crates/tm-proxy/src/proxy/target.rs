//! Inbound request parsing and upstream URI construction.

use crate::config::Config;
use crate::error::ProxyError;
use crate::rewrite::{strip_trailing_slash, RewriteContext, TARGET_PARAM};
use hyper::header::HOST;
use hyper::{Request, Uri};
use std::net::SocketAddr;

/// Server-wide inputs needed to interpret a request.
#[derive(Debug, Clone)]
pub struct InboundSettings {
    pub default_target: String,
    /// Fixed proxy base URI; derived from `Host` per request when unset.
    pub public_base_uri: Option<String>,
    /// Authority used when a request has no `Host` header.
    pub local_authority: String,
}

impl InboundSettings {
    pub fn new(config: &Config, local_addr: SocketAddr) -> Self {
        Self {
            default_target: config.upstream.default_target.clone(),
            public_base_uri: config.rewrite.public_base_uri.clone(),
            local_authority: local_addr.to_string(),
        }
    }
}

/// One inbound request, reduced to what the proxy needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyRequest {
    /// Upstream origin, without trailing slash.
    pub target: String,
    /// Requested path, as received.
    pub path: String,
    /// Raw query pairs other than `target`, in arrival order.
    pub forwarded_query: Vec<String>,
    /// Externally visible root of this proxy.
    pub base_uri: String,
}

impl ProxyRequest {
    pub fn from_request<B>(req: &Request<B>, settings: &InboundSettings) -> Self {
        let uri = req.uri();
        let (target, forwarded_query) = split_query(uri.query());

        let target = target
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| settings.default_target.clone());
        let target = strip_trailing_slash(&target).to_string();

        let base_uri = match settings.public_base_uri {
            Some(ref base) => base.clone(),
            None => {
                let authority = req
                    .headers()
                    .get(HOST)
                    .and_then(|h| h.to_str().ok())
                    .filter(|h| !h.is_empty())
                    .unwrap_or(&settings.local_authority);
                format!("http://{authority}/")
            }
        };

        Self {
            target,
            path: uri.path().to_string(),
            forwarded_query,
            base_uri,
        }
    }

    /// URI fetched from upstream: target + path + forwarded query.
    pub fn upstream_uri(&self) -> Result<Uri, ProxyError> {
        let mut full = self.target.clone();
        full.push_str(&self.path);
        if !self.forwarded_query.is_empty() {
            full.push('?');
            full.push_str(&self.forwarded_query.join("&"));
        }

        let uri: Uri = full
            .parse()
            .map_err(|e| ProxyError::InvalidTarget(format!("{full}: {e}")))?;
        match uri.scheme_str() {
            Some("http") | Some("https") if uri.host().is_some() => Ok(uri),
            _ => Err(ProxyError::InvalidTarget(format!(
                "{full}: target must be an absolute http(s) URI"
            ))),
        }
    }

    pub fn rewrite_context(&self) -> RewriteContext {
        RewriteContext::new(self.base_uri.as_str(), self.target.as_str())
    }
}

/// Split a raw query into the first decoded `target` value and every other pair.
fn split_query(query: Option<&str>) -> (Option<String>, Vec<String>) {
    let mut target = None;
    let mut forwarded = Vec::new();

    for pair in query.unwrap_or_default().split('&').filter(|p| !p.is_empty()) {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        if form_decode(key) == TARGET_PARAM {
            if target.is_none() {
                target = Some(form_decode(value));
            }
            continue;
        }
        forwarded.push(pair.to_string());
    }

    (target, forwarded)
}

/// `application/x-www-form-urlencoded` decoding: `+` and `%20` both become a space.
fn form_decode(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    String::from_utf8_lossy(&urlencoding::decode_binary(spaced.as_bytes())).into_owned()
}
