//! Rewriting of anchor hrefs so navigation stays on the proxy.

use super::{append_target, RewriteContext};
use hyper::Uri;

/// How an href is handled by [`rewrite`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HrefKind {
    /// `http://...` or `https://...`
    Absolute,
    /// `/path...`, resolved against the current target
    RelativeRooted,
    /// Fragments, `mailto:`, bare relative paths and anything else.
    Other,
}

impl HrefKind {
    pub fn classify(href: &str) -> Self {
        if href.starts_with("http://") || href.starts_with("https://") {
            HrefKind::Absolute
        } else if href.starts_with('/') {
            HrefKind::RelativeRooted
        } else {
            HrefKind::Other
        }
    }
}

/// Pieces of an absolute href needed to re-address it through the proxy.
#[derive(Debug, PartialEq, Eq)]
struct AbsoluteHref {
    /// `scheme://host[:port]`
    origin: String,
    /// Path plus `?query` when the query is non-empty.
    path_and_query: String,
}

impl AbsoluteHref {
    fn parse(href: &str) -> Option<Self> {
        let uri: Uri = href.parse().ok()?;
        let scheme = uri.scheme_str()?;
        let host = uri.host().filter(|h| !h.is_empty())?;

        let origin = match uri.port_u16() {
            Some(port) => format!("{scheme}://{host}:{port}"),
            None => format!("{scheme}://{host}"),
        };
        let path_and_query = match uri.query().filter(|q| !q.is_empty()) {
            Some(query) => format!("{}?{query}", uri.path()),
            None => uri.path().to_string(),
        };

        Some(Self {
            origin,
            path_and_query,
        })
    }
}

/// Rewrite one href.
///
/// Absolute hrefs keep their path and query and carry their own origin in
/// `target`; relative-rooted hrefs carry the current target. Anything else,
/// including absolute hrefs that fail to parse, is returned unchanged.
pub fn rewrite(href: &str, ctx: &RewriteContext) -> String {
    match HrefKind::classify(href) {
        HrefKind::Absolute => match AbsoluteHref::parse(href) {
            Some(parsed) => proxied(ctx, &parsed.path_and_query, &parsed.origin),
            None => href.to_string(),
        },
        HrefKind::RelativeRooted => proxied(ctx, href, ctx.target_domain()),
        HrefKind::Other => href.to_string(),
    }
}

fn proxied(ctx: &RewriteContext, path_and_query: &str, origin: &str) -> String {
    let mut rewritten = String::with_capacity(ctx.base().len() + path_and_query.len() + 64);
    rewritten.push_str(ctx.base());
    rewritten.push_str(path_and_query);
    append_target(&mut rewritten, &urlencoding::encode(origin));
    rewritten
}
