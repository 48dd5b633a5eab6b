//! HTML and redirect rewriting.
//!
//! Everything in here is synchronous and works on request-local values only:
//!
//! - `text` - trademark marking of six-letter words
//! - `link` - rewriting `<a href>` values so they route back through the proxy
//! - `redirect` - rewriting upstream `Location` headers with the same convention
//! - `dom` - owned HTML tree, parsing and serialization
//! - `html` - the document pass tying the pieces together

pub mod dom;
pub mod html;
pub mod link;
pub mod redirect;
pub mod text;

/// Query parameter carrying the upstream origin on every proxied URL.
pub const TARGET_PARAM: &str = "target";

/// Per-request addressing information shared by the link and redirect rewriters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteContext {
    proxy_base_uri: String,
    target_domain: String,
}

impl RewriteContext {
    /// Build a context; any query string on `proxy_base_uri` is dropped.
    pub fn new(proxy_base_uri: impl Into<String>, target_domain: impl Into<String>) -> Self {
        let mut proxy_base_uri = proxy_base_uri.into();
        if let Some(idx) = proxy_base_uri.find('?') {
            proxy_base_uri.truncate(idx);
        }
        Self {
            proxy_base_uri,
            target_domain: target_domain.into(),
        }
    }

    pub fn proxy_base_uri(&self) -> &str {
        &self.proxy_base_uri
    }

    pub fn target_domain(&self) -> &str {
        &self.target_domain
    }

    /// Prefix for every rewritten URL: the proxy base without its trailing slash.
    pub fn base(&self) -> &str {
        strip_trailing_slash(&self.proxy_base_uri)
    }
}

/// Remove at most one trailing `/`.
pub fn strip_trailing_slash(uri: &str) -> &str {
    uri.strip_suffix('/').unwrap_or(uri)
}

/// Append `target=<value>` using `&` if `uri` already has a query, `?` otherwise.
fn append_target(uri: &mut String, value: &str) {
    uri.push(if uri.contains('?') { '&' } else { '?' });
    uri.push_str(TARGET_PARAM);
    uri.push('=');
    uri.push_str(value);
}
