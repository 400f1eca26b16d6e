//! Minimal document-tree layer over `scraper`.
//!
//! Post bodies arrive as HTML fragments. Two things are ever done with them:
//! rewrite them node by node ([`Fragment::rewrite`]) and flatten them to
//! readable text ([`Fragment::plain_text`]). Both walk the parsed tree once;
//! nothing here knows about censorship or links, that policy is supplied
//! through [`NodeRewriter`].
//!
//! Serialization is done here rather than by the parser crate so that
//! dropped and unwrapped elements never reach the output at all.

use maud::html;
use scraper::{ElementRef, Html, Node};

/// What to do with an element encountered during a rewrite.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementAction {
    /// Emit the element with its attributes and children.
    Keep,
    /// Emit only the children.
    Unwrap,
    /// Emit nothing.
    Drop,
}

/// Per-node policy for [`Fragment::rewrite`].
pub trait NodeRewriter {
    /// `attrs` are in name order.
    fn element(&mut self, name: &str, attrs: &[(&str, &str)]) -> ElementAction;

    /// Whether a kept element carries `attr` into the output.
    fn keep_attribute(&mut self, _element: &str, _attr: &str) -> bool {
        true
    }

    /// Transform the (unescaped) content of a text node.
    fn text(&mut self, text: &str) -> String;
}

/// Elements without a closing tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

/// Elements whose text is emitted verbatim and never rewritten.
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

/// Elements that never contribute readable text.
const NON_TEXT_ELEMENTS: &[&str] = &[
    "img", "script", "style", "iframe", "noscript", "object", "video", "audio", "svg", "template",
];

/// Elements that start a new paragraph in extracted text.
const BLOCK_ELEMENTS: &[&str] = &[
    "address", "article", "aside", "blockquote", "dd", "div", "dl", "dt", "figcaption", "figure",
    "footer", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "li", "main", "nav", "ol", "p",
    "pre", "section", "table", "tr", "ul",
];

/// A parsed HTML fragment.
///
/// Attributes are serialized in name order so the same input always yields
/// byte-identical output.
pub struct Fragment {
    html: Html,
}

impl Fragment {
    pub fn parse(markup: &str) -> Self {
        Self {
            html: Html::parse_fragment(markup),
        }
    }

    /// Serialize the fragment back to markup, consulting `rewriter` for every
    /// element and text node.
    pub fn rewrite(&self, rewriter: &mut impl NodeRewriter) -> String {
        let mut out = String::new();
        write_children(self.html.root_element(), rewriter, false, &mut out);
        out
    }

    /// Readable text: images and scripts removed, block-level elements
    /// separated by blank lines, `<br>` kept as a single newline, runs of
    /// other whitespace collapsed.
    pub fn plain_text(&self) -> String {
        let mut raw = String::new();
        collect_children(self.html.root_element(), &mut raw);
        normalize_paragraphs(&raw)
    }

    /// `src` of the first `<img>` in document order.
    pub fn first_image_src(&self) -> Option<String> {
        self.html
            .root_element()
            .descendants()
            .find_map(|node| match node.value() {
                Node::Element(el) if el.name() == "img" => el.attr("src").map(str::to_string),
                _ => None,
            })
    }
}

fn write_children(
    parent: ElementRef<'_>,
    rewriter: &mut impl NodeRewriter,
    raw: bool,
    out: &mut String,
) {
    for child in parent.children() {
        match child.value() {
            Node::Text(text) if raw => out.push_str(text),
            Node::Text(text) => out.push_str(&escape(&rewriter.text(text))),
            Node::Element(_) => {
                if let Some(el) = ElementRef::wrap(child) {
                    write_element(el, rewriter, raw, out);
                }
            }
            // Comments, doctypes and processing instructions are not carried over.
            _ => {}
        }
    }
}

fn write_element(el: ElementRef<'_>, rewriter: &mut impl NodeRewriter, raw: bool, out: &mut String) {
    let name = el.value().name();
    let mut attrs: Vec<(&str, &str)> = el.value().attrs().collect();
    attrs.sort_by_key(|(attr, _)| *attr);
    match rewriter.element(name, &attrs) {
        ElementAction::Drop => {}
        ElementAction::Unwrap => write_children(el, rewriter, raw, out),
        ElementAction::Keep => {
            out.push('<');
            out.push_str(name);
            for (attr, value) in attrs {
                if !rewriter.keep_attribute(name, attr) {
                    continue;
                }
                out.push(' ');
                out.push_str(attr);
                out.push_str("=\"");
                out.push_str(&escape(value));
                out.push('"');
            }
            out.push('>');
            if VOID_ELEMENTS.contains(&name) {
                return;
            }
            write_children(el, rewriter, RAW_TEXT_ELEMENTS.contains(&name), out);
            out.push_str("</");
            out.push_str(name);
            out.push('>');
        }
    }
}

fn collect_children(parent: ElementRef<'_>, out: &mut String) {
    for child in parent.children() {
        match child.value() {
            Node::Text(text) => push_collapsed(text, out),
            Node::Element(_) => {
                if let Some(el) = ElementRef::wrap(child) {
                    collect_element(el, out);
                }
            }
            _ => {}
        }
    }
}

fn collect_element(el: ElementRef<'_>, out: &mut String) {
    let name = el.value().name();
    if NON_TEXT_ELEMENTS.contains(&name) {
        return;
    }
    if name == "br" {
        out.push('\n');
        return;
    }
    let block = BLOCK_ELEMENTS.contains(&name);
    if block {
        out.push_str("\n\n");
    }
    collect_children(el, out);
    if block {
        out.push_str("\n\n");
    }
}

/// Append a text node with inner whitespace runs collapsed to one space,
/// keeping a single space at either edge when the node had one.
fn push_collapsed(text: &str, out: &mut String) {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() {
        if !text.is_empty() {
            out.push(' ');
        }
        return;
    }
    if text.starts_with(char::is_whitespace) {
        out.push(' ');
    }
    out.push_str(&words.join(" "));
    if text.ends_with(char::is_whitespace) {
        out.push(' ');
    }
}

/// Collapse spaces within every line, drop empty lines inside a paragraph,
/// and join paragraphs with exactly one blank line.
fn normalize_paragraphs(raw: &str) -> String {
    raw.split("\n\n")
        .map(|block| {
            block
                .lines()
                .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
                .filter(|line| !line.is_empty())
                .collect::<Vec<_>>()
                .join("\n")
        })
        .filter(|para| !para.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// HTML-escape text for use in element content or a quoted attribute.
pub fn escape(text: &str) -> String {
    html! { (text) }.into_string()
}
