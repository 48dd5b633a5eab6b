//! Owned HTML tree used by the rewrite pass.
//!
//! Documents are parsed with html5ever into a `scraper` tree, copied into a
//! plain tagged-variant tree that can be mutated freely, and serialized back
//! following the HTML serialization rules.
//!
//! Parsing runs with scripting disabled, so `<noscript>` content is real
//! markup rather than one opaque text node.

use ego_tree::NodeRef;
use html5ever::driver::{parse_document, ParseOpts};
use html5ever::tendril::TendrilSink;
use html5ever::tree_builder::TreeBuilderOpts;
use html5ever::QualName;
use scraper::{Html, HtmlTreeSink};

/// One node of a parsed document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
    Comment(String),
    Doctype {
        name: String,
        public_id: String,
        system_id: String,
    },
    ProcessingInstruction { target: String, data: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Local tag name, lowercase for HTML elements.
    pub name: String,
    /// Attributes keyed by qualified name (`xlink:href`), in parser order.
    pub attrs: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Replace the value of an existing attribute, or append it.
    pub fn set_attr(&mut self, name: &str, value: String) {
        match self.attrs.iter_mut().find(|(key, _)| key == name) {
            Some((_, existing)) => *existing = value,
            None => self.attrs.push((name.to_string(), value)),
        }
    }
}

/// Callbacks for [`Document::walk_mut`].
pub trait NodeVisitor {
    /// Called before the element's children are visited.
    fn visit_element(&mut self, _element: &mut Element) {}

    /// `parent` is the tag name of the enclosing element, if any.
    fn visit_text(&mut self, _text: &mut String, _parent: Option<&str>) {}
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    pub children: Vec<Node>,
}

impl Document {
    /// Parse a full document. Never fails; malformed markup is repaired the
    /// way browsers do it.
    pub fn parse(html: &str) -> Self {
        let opts = ParseOpts {
            tree_builder: TreeBuilderOpts {
                scripting_enabled: false,
                ..Default::default()
            },
            ..Default::default()
        };
        let parsed = parse_document(HtmlTreeSink::new(Html::new_document()), opts).one(html);
        Self {
            children: convert_children(parsed.tree.root()),
        }
    }

    /// Depth-first pre-order walk over every element and text node.
    pub fn walk_mut<V: NodeVisitor>(&mut self, visitor: &mut V) {
        walk(&mut self.children, None, visitor);
    }

    pub fn to_html(&self) -> String {
        let mut out = String::new();
        for node in &self.children {
            serialize(node, None, &mut out);
        }
        out
    }
}

fn convert_children(node: NodeRef<'_, scraper::Node>) -> Vec<Node> {
    let mut children = Vec::new();
    for child in node.children() {
        match child.value() {
            // `<template>` contents hang off the element as a fragment
            scraper::Node::Fragment => children.extend(convert_children(child)),
            _ => children.extend(convert(child)),
        }
    }
    children
}

fn convert(node: NodeRef<'_, scraper::Node>) -> Option<Node> {
    let converted = match node.value() {
        scraper::Node::Element(element) => Node::Element(Element {
            name: element.name().to_string(),
            attrs: element
                .attrs
                .iter()
                .map(|(name, value)| (qualified_name(name), value.to_string()))
                .collect(),
            children: convert_children(node),
        }),
        scraper::Node::Text(text) => Node::Text(text.text.to_string()),
        scraper::Node::Comment(comment) => Node::Comment(comment.comment.to_string()),
        scraper::Node::Doctype(doctype) => Node::Doctype {
            name: doctype.name().to_string(),
            public_id: doctype.public_id().to_string(),
            system_id: doctype.system_id().to_string(),
        },
        scraper::Node::ProcessingInstruction(pi) => Node::ProcessingInstruction {
            target: pi.target.to_string(),
            data: pi.data.to_string(),
        },
        scraper::Node::Document | scraper::Node::Fragment => return None,
    };
    Some(converted)
}

fn qualified_name(name: &QualName) -> String {
    match name.prefix {
        Some(ref prefix) => format!("{}:{}", prefix, name.local),
        None => name.local.to_string(),
    }
}

fn walk<V: NodeVisitor>(nodes: &mut [Node], parent: Option<&str>, visitor: &mut V) {
    for node in nodes {
        match node {
            Node::Element(element) => {
                visitor.visit_element(element);
                walk(&mut element.children, Some(element.name.as_str()), visitor);
            }
            Node::Text(text) => visitor.visit_text(text, parent),
            Node::Comment(_) | Node::Doctype { .. } | Node::ProcessingInstruction { .. } => {}
        }
    }
}

// Children of these are written verbatim. `noscript` is absent: it is parsed
// as markup.
const RAW_TEXT_ELEMENTS: &[&str] = &[
    "style", "script", "xmp", "iframe", "noembed", "noframes", "plaintext",
];

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "basefont", "bgsound", "br", "col", "embed", "frame", "hr", "img", "input",
    "keygen", "link", "meta", "param", "source", "track", "wbr",
];

fn serialize(node: &Node, parent: Option<&str>, out: &mut String) {
    match node {
        Node::Element(element) => {
            out.push('<');
            out.push_str(&element.name);
            for (key, value) in &element.attrs {
                out.push(' ');
                out.push_str(key);
                out.push_str("=\"");
                escape_into(value, true, out);
                out.push('"');
            }
            out.push('>');

            if VOID_ELEMENTS.contains(&element.name.as_str()) {
                return;
            }
            for child in &element.children {
                serialize(child, Some(element.name.as_str()), out);
            }
            out.push_str("</");
            out.push_str(&element.name);
            out.push('>');
        }
        Node::Text(text) => {
            if parent.is_some_and(|tag| RAW_TEXT_ELEMENTS.contains(&tag)) {
                out.push_str(text);
            } else {
                escape_into(text, false, out);
            }
        }
        Node::Comment(comment) => {
            out.push_str("<!--");
            out.push_str(comment);
            out.push_str("-->");
        }
        Node::Doctype {
            name,
            public_id,
            system_id,
        } => {
            out.push_str("<!DOCTYPE ");
            out.push_str(name);
            if !public_id.is_empty() {
                out.push_str(" PUBLIC \"");
                out.push_str(public_id);
                out.push('"');
                if !system_id.is_empty() {
                    out.push_str(" \"");
                    out.push_str(system_id);
                    out.push('"');
                }
            } else if !system_id.is_empty() {
                out.push_str(" SYSTEM \"");
                out.push_str(system_id);
                out.push('"');
            }
            out.push('>');
        }
        Node::ProcessingInstruction { target, data } => {
            out.push_str("<?");
            out.push_str(target);
            out.push(' ');
            out.push_str(data);
            out.push('>');
        }
    }
}

fn escape_into(text: &str, attr_mode: bool, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            '"' if attr_mode => out.push_str("&quot;"),
            '<' if !attr_mode => out.push_str("&lt;"),
            '>' if !attr_mode => out.push_str("&gt;"),
            c => out.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EMPTY_HEAD: &str = "<html><head></head>";

    #[test]
    fn test_fragment_is_wrapped_in_document() {
        let doc = Document::parse("<p>hello</p>");
        assert_eq!(
            doc.to_html(),
            format!("{EMPTY_HEAD}<body><p>hello</p></body></html>")
        );
    }

    #[test]
    fn test_plain_text_body() {
        let doc = Document::parse("Valid response");
        assert_eq!(
            doc.to_html(),
            format!("{EMPTY_HEAD}<body>Valid response</body></html>")
        );
    }

    #[test]
    fn test_doctype_and_comment_preserved() {
        let doc = Document::parse("<!DOCTYPE html><!-- note --><title>t</title>");
        assert_eq!(
            doc.to_html(),
            "<!DOCTYPE html><!-- note --><html><head><title>t</title></head><body></body></html>"
        );
    }

    #[test]
    fn test_text_is_escaped() {
        let doc = Document::parse("<p>a &amp; b &lt;c&gt;&nbsp;d</p>");
        assert_eq!(
            doc.to_html(),
            format!("{EMPTY_HEAD}<body><p>a &amp; b &lt;c&gt;&nbsp;d</p></body></html>")
        );
    }

    #[test]
    fn test_attributes_are_escaped() {
        let doc = Document::parse(r#"<a title='say "hi"' href="/x?a=1&amp;b=2">x</a>"#);
        let html = doc.to_html();
        assert!(html.contains(r#"title="say &quot;hi&quot;""#));
        assert!(html.contains(r#"href="/x?a=1&amp;b=2""#));
    }

    #[test]
    fn test_void_elements_have_no_end_tag() {
        let doc = Document::parse(r#"<img src="a.png"><br><input type="text">"#);
        assert_eq!(
            doc.to_html(),
            format!("{EMPTY_HEAD}<body><img src=\"a.png\"><br><input type=\"text\"></body></html>")
        );
    }

    #[test]
    fn test_script_content_is_raw() {
        let doc = Document::parse("<script>if (a < b && c) {}</script>");
        assert_eq!(
            doc.to_html(),
            "<html><head><script>if (a < b && c) {}</script></head><body></body></html>"
        );
    }

    #[test]
    fn test_malformed_markup_is_repaired() {
        let doc = Document::parse("<div><p>unclosed<span>deep</div>trailing");
        let html = doc.to_html();
        assert!(html.contains("<div><p>unclosed<span>deep</span></p></div>trailing"));
    }

    #[test]
    fn test_legacy_doctype_identifiers_kept() {
        let doc = Document::parse(
            r#"<!DOCTYPE html PUBLIC "-//W3C//DTD HTML 4.01 Transitional//EN" "http://www.w3.org/TR/html4/loose.dtd"><p>x</p>"#,
        );
        assert!(doc.to_html().starts_with(
            r#"<!DOCTYPE html PUBLIC "-//W3C//DTD HTML 4.01 Transitional//EN" "http://www.w3.org/TR/html4/loose.dtd"><html>"#
        ));
    }

    #[test]
    fn test_system_only_doctype() {
        let doc = Document::parse(r#"<!DOCTYPE html SYSTEM "about:legacy-compat"><p>x</p>"#);
        assert!(doc
            .to_html()
            .starts_with(r#"<!DOCTYPE html SYSTEM "about:legacy-compat"><html>"#));
    }

    #[test]
    fn test_noscript_children_are_elements() {
        let doc = Document::parse(r#"<body><noscript><img src="a.png"> a &lt; b</noscript></body>"#);
        let Node::Element(ref html) = doc.children[0] else {
            panic!("expected <html>");
        };
        let Node::Element(ref body) = html.children[1] else {
            panic!("expected <body>");
        };
        let Node::Element(ref noscript) = body.children[0] else {
            panic!("expected <noscript>");
        };
        assert_eq!(noscript.name, "noscript");
        assert!(matches!(noscript.children[0], Node::Element(ref img) if img.name == "img"));
        assert!(doc
            .to_html()
            .contains(r#"<noscript><img src="a.png"> a &lt; b</noscript>"#));
    }

    #[test]
    fn test_template_content_kept() {
        let doc = Document::parse("<template><p>inside</p></template><p>after</p>");
        let html = doc.to_html();
        assert!(html.contains("<template><p>inside</p></template>"));
        assert!(html.contains("<body><p>after</p></body>"));
    }

    #[test]
    fn test_foreign_attribute_prefix_kept() {
        let doc = Document::parse(r#"<svg viewBox="0 0 1 1"><a xlink:href="/docs">x</a></svg>"#);
        let html = doc.to_html();
        assert!(html.contains(r#"<svg viewBox="0 0 1 1"><a xlink:href="/docs">x</a></svg>"#));
    }

    #[test]
    fn test_attr_lookup_and_update() {
        let mut element = Element {
            name: "a".to_string(),
            attrs: vec![("href".to_string(), "/old".to_string())],
            children: Vec::new(),
        };
        assert_eq!(element.attr("href"), Some("/old"));
        assert_eq!(element.attr("title"), None);

        element.set_attr("href", "/new".to_string());
        element.set_attr("title", "t".to_string());
        assert_eq!(
            element.attrs,
            vec![
                ("href".to_string(), "/new".to_string()),
                ("title".to_string(), "t".to_string()),
            ]
        );
    }

    struct Recorder {
        elements: Vec<String>,
        texts: Vec<(String, Option<String>)>,
    }

    impl NodeVisitor for Recorder {
        fn visit_element(&mut self, element: &mut Element) {
            self.elements.push(element.name.clone());
        }

        fn visit_text(&mut self, text: &mut String, parent: Option<&str>) {
            self.texts.push((text.clone(), parent.map(str::to_string)));
        }
    }

    #[test]
    fn test_walk_is_preorder_with_immediate_parent() {
        let mut doc = Document::parse("<div>one<p>two<b>three</b></p>four</div>");
        let mut recorder = Recorder {
            elements: Vec::new(),
            texts: Vec::new(),
        };
        doc.walk_mut(&mut recorder);

        assert_eq!(recorder.elements, ["html", "head", "body", "div", "p", "b"]);
        assert_eq!(
            recorder.texts,
            vec![
                ("one".to_string(), Some("div".to_string())),
                ("two".to_string(), Some("p".to_string())),
                ("three".to_string(), Some("b".to_string())),
                ("four".to_string(), Some("div".to_string())),
            ]
        );
    }
}
