//! Flattens message bodies into single-line text.

use scraper::{Html, Node};

/// Elements whose text never renders.
const HIDDEN_ELEMENTS: &[&str] = &["head", "script", "style", "noscript", "template"];

/// Strips markup from `body` and collapses all whitespace runs to one space.
///
/// Plain-text bodies go through the same path; the HTML parser is lenient,
/// so this never fails on malformed input.
pub fn normalize(body: &str) -> String {
    if body.is_empty() {
        return String::new();
    }

    let document = Html::parse_document(body);
    let mut visible = Vec::new();

    for node in document.tree.root().descendants() {
        let Node::Text(text) = node.value() else {
            continue;
        };
        let hidden = node.ancestors().any(|ancestor| match ancestor.value() {
            Node::Element(element) => HIDDEN_ELEMENTS.contains(&element.name()),
            _ => false,
        });
        if !hidden {
            visible.push(&**text);
        }
    }

    collapse_whitespace(&visible.join(" "))
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
