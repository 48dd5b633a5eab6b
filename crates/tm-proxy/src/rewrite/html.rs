//! Document rewrite pass: marks prose text and re-addresses anchor links.

use super::dom::{Document, Element, NodeVisitor};
use super::{link, text, RewriteContext};
use tracing::debug;

/// Rewrite an HTML document for delivery through the proxy.
///
/// The body is decoded as UTF-8 (invalid sequences are replaced), parsed
/// leniently, and serialized again after:
///
/// - every text node whose parent is not `script`/`style` has its six-letter
///   words marked;
/// - every `<a href>` is rewritten with [`link::rewrite`].
///
/// Running the pass on its own output rewrites the links a second time; the
/// proxy is not meant to be chained.
pub fn apply(html: &[u8], ctx: &RewriteContext) -> String {
    let source = String::from_utf8_lossy(html);
    let mut document = Document::parse(&source);

    let mut pass = HtmlRewritePass {
        ctx,
        links_rewritten: 0,
    };
    document.walk_mut(&mut pass);

    debug!(
        "Rewrote {} links for target {}",
        pass.links_rewritten,
        ctx.target_domain()
    );
    document.to_html()
}

/// Tree visitor applying the text and link rewriters.
struct HtmlRewritePass<'a> {
    ctx: &'a RewriteContext,
    links_rewritten: usize,
}

impl NodeVisitor for HtmlRewritePass<'_> {
    fn visit_element(&mut self, element: &mut Element) {
        if !element.name.eq_ignore_ascii_case("a") {
            return;
        }
        let Some(href) = element.attr("href") else {
            return;
        };

        let rewritten = link::rewrite(href, self.ctx);
        if rewritten != href {
            self.links_rewritten += 1;
            element.set_attr("href", rewritten);
        }
    }

    fn visit_text(&mut self, content: &mut String, parent: Option<&str>) {
        if parent.is_some_and(text::is_excluded_parent) {
            return;
        }
        *content = text::transform(content);
    }
}
