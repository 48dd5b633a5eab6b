//! Rewriting of upstream `Location` headers.
//!
//! Only redirects that stay on the current target are re-addressed through
//! the proxy. The target is appended as-is here, unlike the percent-encoded
//! value the link rewriter produces.

use super::{append_target, RewriteContext};

/// Rewrite a redirect location, or `None` when the redirect must not carry a
/// `Location` at all (empty, or pointing away from the target origin).
pub fn rewrite(location: &str, ctx: &RewriteContext) -> Option<String> {
    let target = ctx.target_domain();
    if location.is_empty() || !location.starts_with(target) {
        return None;
    }

    let mut rewritten = location.replacen(target, ctx.base(), 1);
    append_target(&mut rewritten, target);
    Some(rewritten)
}
