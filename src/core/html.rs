// src/core/html.rs
//
// Small helpers over `scraper` so the page specs read as selector logic only.

use scraper::{ElementRef, Html, Selector};

use super::sanitize::normalize_ws;

/// Compile a selector that is known-good at build time.
pub fn selector(css: &'static str) -> Selector {
    Selector::parse(css).unwrap_or_else(|e| panic!("bad static selector {css:?}: {e}"))
}

/// Visible text of an element, whitespace-collapsed. Entities are already
/// decoded by the parser.
pub fn text_of(el: &ElementRef) -> String {
    let joined = el.text().collect::<Vec<_>>().join(" ");
    normalize_ws(&joined)
}

/// Lowercased visible text.
pub fn text_lc(el: &ElementRef) -> String {
    text_of(el).to_lowercase()
}

/// Attribute value, `None` if absent or blank.
pub fn attr<'a>(el: &ElementRef<'a>, name: &str) -> Option<&'a str> {
    el.value().attr(name).map(str::trim).filter(|v| !v.is_empty())
}

pub fn has_class(el: &ElementRef, class: &str) -> bool {
    el.value().classes().any(|c| c.eq_ignore_ascii_case(class))
}

pub fn parse(markup: &str) -> Html {
    Html::parse_document(markup)
}
