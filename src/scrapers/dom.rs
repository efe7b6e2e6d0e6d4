//! Element snapshots over a serialized, already rendered DOM.
//!
//! Every element keeps its own outer HTML, so handles are plain owned data
//! that can cross threads and outlive the parse that produced them.

use crate::error::BrowserError;
use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};

/// Elements rendered on their own line
const BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "dd", "div", "dl", "dt", "fieldset",
    "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header",
    "hr", "li", "main", "nav", "ol", "p", "pre", "section", "table", "tr", "ul",
];

/// Snapshot of one element taken from a rendered page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HtmlElement {
    html: String,
}

/// All elements of `document` matching `selector`, in document order
pub fn select_all(document: &str, selector: &str) -> Result<Vec<HtmlElement>, BrowserError> {
    let selector = parse_selector(selector)?;
    let document = Html::parse_document(document);
    Ok(document
        .select(&selector)
        .map(|element| HtmlElement {
            html: element.html(),
        })
        .collect())
}

impl HtmlElement {
    pub fn new(html: impl Into<String>) -> Self {
        Self { html: html.into() }
    }

    pub fn outer_html(&self) -> &str {
        &self.html
    }

    /// First descendant matching `selector`
    pub fn select_first(&self, selector: &str) -> Result<Option<HtmlElement>, BrowserError> {
        let selector = parse_selector(selector)?;
        Ok(self
            .with_root(|root| {
                root.select(&selector)
                    .find(|found| found.id() != root.id())
                    .map(|found| HtmlElement { html: found.html() })
            })
            .flatten())
    }

    pub fn attribute(&self, name: &str) -> Option<String> {
        self.with_root(|root| root.value().attr(name).map(str::to_string))
            .flatten()
    }

    /// Rendered text the way `innerText` reports it: `<br>` and block
    /// boundaries become line breaks, other whitespace runs one space.
    pub fn inner_text(&self) -> String {
        self.with_root(|root| {
            let mut raw = String::new();
            collect_text(root, &mut raw);
            raw.lines()
                .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
                .filter(|line| !line.is_empty())
                .collect::<Vec<_>>()
                .join("\n")
        })
        .unwrap_or_default()
    }

    fn with_root<T>(&self, f: impl FnOnce(ElementRef<'_>) -> T) -> Option<T> {
        let fragment = Html::parse_fragment(&self.html);
        // parse_fragment wraps the markup in a synthetic <html> element
        let root = fragment
            .root_element()
            .children()
            .find_map(ElementRef::wrap)?;
        Some(f(root))
    }
}

fn collect_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            // Source line breaks are plain whitespace once rendered.
            Node::Text(text) => {
                out.extend(text.chars().map(|c| if c == '\n' || c == '\r' { ' ' } else { c }))
            }
            Node::Element(el) if el.name() == "br" => out.push('\n'),
            Node::Element(el) if matches!(el.name(), "script" | "style" | "template") => {}
            Node::Element(el) => {
                let Some(child) = ElementRef::wrap(child) else {
                    continue;
                };
                let block = BLOCK_TAGS.contains(&el.name());
                if block {
                    out.push('\n');
                }
                collect_text(child, out);
                if block {
                    out.push('\n');
                }
            }
            _ => {}
        }
    }
}

fn parse_selector(selector: &str) -> Result<Selector, BrowserError> {
    Selector::parse(selector).map_err(|e| BrowserError::Query {
        selector: selector.to_string(),
        reason: e.to_string(),
    })
}
