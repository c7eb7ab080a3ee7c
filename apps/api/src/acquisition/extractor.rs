//! HTML → plain text for scraped job pages.
//!
//! Walks the `<body>` subtree in document order, keeping text nodes and skipping
//! page chrome (`script`, `style`, `header`, `footer`, `nav`). Whitespace runs collapse
//! to single spaces. Pure: the same HTML always yields the same text.

use std::sync::OnceLock;

use scraper::{ElementRef, Html, Node, Selector};

/// Elements whose subtrees never contribute job content.
const SKIPPED_ELEMENTS: [&str; 5] = ["script", "style", "header", "footer", "nav"];

fn body_selector() -> &'static Selector {
    static BODY: OnceLock<Selector> = OnceLock::new();
    BODY.get_or_init(|| Selector::parse("body").expect("static 'body' CSS selector is valid"))
}

/// Extracts normalized body text from an HTML document.
///
/// Returns `None` for empty input, when no body is present, or when the body
/// holds no visible text.
pub fn extract_text(html: &str) -> Option<String> {
    if html.trim().is_empty() {
        return None;
    }

    let document = Html::parse_document(html);
    let body = document.select(body_selector()).next()?;

    let mut raw = String::new();
    collect_text(body, &mut raw);

    let text = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    (!text.is_empty()).then_some(text)
}

fn collect_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => {
                let trimmed = text.trim();
                if !trimmed.is_empty() {
                    out.push_str(trimmed);
                    out.push(' ');
                }
            }
            Node::Element(el) if SKIPPED_ELEMENTS.contains(&el.name()) => {}
            Node::Element(_) => {
                if let Some(child_element) = ElementRef::wrap(child) {
                    collect_text(child_element, out);
                }
            }
            _ => {}
        }
    }
}
