//! Plain-text extraction from article HTML.

use std::sync::LazyLock;

use scraper::{Html, Selector};

/// Tags whose text is kept. Everything else (navigation, scripts, layout
/// wrappers) is discarded.
const STRUCTURAL_TAGS: &str = "p, article, h1, h2, h3, h4, h5, h6, li";

/// Extract the text of every structural element, in document order, one
/// element per line.
///
/// Each element contributes its full descendant text, so an `<article>`
/// wrapping paragraphs repeats their text after its own line.
pub fn extract_text(html: &str) -> String {
    static STRUCTURAL_SEL: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse(STRUCTURAL_TAGS).expect("valid selector"));

    let doc = Html::parse_document(html);

    doc.select(&STRUCTURAL_SEL)
        .map(|el| el.text().collect::<String>())
        .collect::<Vec<_>>()
        .join("\n")
}
