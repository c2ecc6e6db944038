//! Visual decoration of matched questions and answer options.
//!
//! Highlighting is idempotent: marker classes gate every mutation, so running
//! the same comparison twice leaves a single tooltip, a single badge, and one
//! set of style properties. `clear_all` undoes exactly what this module adds
//! and nothing else.

use crate::dom::{Document, NodeId};

pub const QUESTION_MARK_CLASS: &str = "ql-question-highlight";
pub const ANSWER_MARK_CLASS: &str = "ql-answer-highlight";
pub const TOOLTIP_CLASS: &str = "ql-tooltip";
pub const BADGE_CLASS: &str = "ql-badge";
pub const HOVER_ATTR: &str = "data-ql-hover";

const QUESTION_STYLE: &[(&str, &str)] = &[
    ("background-color", "#fff8dc"),
    ("border-left", "4px solid #ffc107"),
    ("border-radius", "4px"),
    ("padding", "2px 6px"),
];

const ANSWER_STYLE: &[(&str, &str)] = &[
    ("background-color", "#e8f5e9"),
    ("border-left", "3px solid #4caf50"),
    ("border-radius", "4px"),
    ("font-weight", "bold"),
];

/// Mark a question node and attach a hidden tooltip carrying the answer text.
/// A node already carrying the marker class is left untouched.
pub fn highlight_question(doc: &mut Document, node: NodeId, answer_text: &str) {
    if doc.has_class(node, QUESTION_MARK_CLASS) {
        return;
    }
    doc.add_class(node, QUESTION_MARK_CLASS);
    for (prop, value) in QUESTION_STYLE {
        doc.set_style_prop(node, prop, value);
    }
    doc.set_attr(node, HOVER_ATTR, "1");

    let tooltip = doc.create_element("span");
    doc.add_class(tooltip, TOOLTIP_CLASS);
    doc.set_style_prop(tooltip, "display", "none");
    let label = doc.create_element("strong");
    doc.append_text(label, "Đáp án:");
    doc.append_child(tooltip, label);
    doc.append_text(tooltip, &format!(" {answer_text}"));
    doc.append_child(node, tooltip);
}

/// Mark an answer-option node and prefix a check badge. Idempotent in the
/// same way as question highlighting.
pub fn highlight_answer(doc: &mut Document, node: NodeId) {
    if doc.has_class(node, ANSWER_MARK_CLASS) {
        return;
    }
    doc.add_class(node, ANSWER_MARK_CLASS);
    for (prop, value) in ANSWER_STYLE {
        doc.set_style_prop(node, prop, value);
    }
    let has_badge = doc
        .children(node)
        .iter()
        .any(|&c| doc.has_class(c, BADGE_CLASS));
    if !has_badge {
        let badge = doc.create_element("span");
        doc.add_class(badge, BADGE_CLASS);
        doc.append_text(badge, "✓ ");
        doc.prepend_child(node, badge);
    }
}

/// Remove every trace of prior highlighting from the whole document. Safe on
/// documents that were never highlighted.
pub fn clear_all(doc: &mut Document) {
    let injected: Vec<NodeId> = doc
        .elements()
        .into_iter()
        .filter(|&n| doc.has_class(n, TOOLTIP_CLASS) || doc.has_class(n, BADGE_CLASS))
        .collect();
    for n in injected {
        doc.detach(n);
    }

    let questions: Vec<NodeId> = doc
        .elements()
        .into_iter()
        .filter(|&n| doc.has_class(n, QUESTION_MARK_CLASS))
        .collect();
    for n in questions {
        doc.remove_class(n, QUESTION_MARK_CLASS);
        for (prop, _) in QUESTION_STYLE {
            doc.remove_style_prop(n, prop);
        }
        doc.remove_attr(n, HOVER_ATTR);
    }

    let answers: Vec<NodeId> = doc
        .elements()
        .into_iter()
        .filter(|&n| doc.has_class(n, ANSWER_MARK_CLASS))
        .collect();
    for n in answers {
        doc.remove_class(n, ANSWER_MARK_CLASS);
        for (prop, _) in ANSWER_STYLE {
            doc.remove_style_prop(n, prop);
        }
    }
}

/// True when `node` is, or sits inside, an injected tooltip or badge. Text
/// extraction and scanning must never see these.
pub fn is_decoration(doc: &Document, node: NodeId) -> bool {
    let owned = |n: NodeId| doc.has_class(n, TOOLTIP_CLASS) || doc.has_class(n, BADGE_CLASS);
    owned(node) || doc.ancestors(node).into_iter().any(owned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Document;

    fn single_div(doc: &Document) -> NodeId {
        doc.elements()
            .into_iter()
            .find(|&n| doc.tag(n) == Some("div"))
            .unwrap()
    }

    #[test]
    fn question_highlight_attaches_tooltip_with_answer() {
        let mut doc = Document::parse("<body><div>Q?</div></body>");
        let q = single_div(&doc);
        highlight_question(&mut doc, q, "Hà Nội");
        assert!(doc.has_class(q, QUESTION_MARK_CLASS));
        assert_eq!(doc.attr(q, HOVER_ATTR), Some("1"));
        assert_eq!(doc.style_prop(q, "background-color").as_deref(), Some("#fff8dc"));
        let tooltip = doc
            .children(q)
            .iter()
            .copied()
            .find(|&c| doc.has_class(c, TOOLTIP_CLASS))
            .unwrap();
        assert!(doc.text(tooltip).contains("Hà Nội"));
        assert_eq!(doc.style_prop(tooltip, "display").as_deref(), Some("none"));
    }

    #[test]
    fn double_highlight_is_a_no_op() {
        let mut doc = Document::parse("<body><div>Q?</div></body>");
        let q = single_div(&doc);
        highlight_question(&mut doc, q, "x");
        highlight_question(&mut doc, q, "x");
        let tooltips = doc
            .children(q)
            .iter()
            .copied()
            .filter(|&c| doc.has_class(c, TOOLTIP_CLASS))
            .count();
        assert_eq!(tooltips, 1);

        highlight_answer(&mut doc, q);
        highlight_answer(&mut doc, q);
        let badges = doc
            .children(q)
            .iter()
            .copied()
            .filter(|&c| doc.has_class(c, BADGE_CLASS))
            .count();
        assert_eq!(badges, 1);
    }

    #[test]
    fn badge_is_prepended_before_the_option_text() {
        let mut doc = Document::parse("<body><div>A. Huế</div></body>");
        let a = single_div(&doc);
        highlight_answer(&mut doc, a);
        assert!(doc.text(a).starts_with('✓'));
    }

    #[test]
    fn clear_all_restores_preexisting_inline_style() {
        let mut doc = Document::parse(r#"<body><div style="color: red;">Q?</div></body>"#);
        let q = single_div(&doc);
        highlight_question(&mut doc, q, "ans");
        highlight_answer(&mut doc, q);
        clear_all(&mut doc);
        assert!(!doc.has_class(q, QUESTION_MARK_CLASS));
        assert!(!doc.has_class(q, ANSWER_MARK_CLASS));
        assert_eq!(doc.attr(q, HOVER_ATTR), None);
        assert_eq!(doc.style_prop(q, "color").as_deref(), Some("red"));
        assert_eq!(doc.style_prop(q, "background-color"), None);
        assert!(doc.children(q).iter().all(|&c| !doc.is_element(c)));
    }

    #[test]
    fn clear_all_on_a_clean_document_is_safe() {
        let mut doc = Document::parse("<body><div>Q?</div></body>");
        clear_all(&mut doc);
        clear_all(&mut doc);
        let q = single_div(&doc);
        assert_eq!(doc.text(q), "Q?");
    }

    #[test]
    fn decorations_are_recognized_at_any_depth() {
        let mut doc = Document::parse("<body><div>Q?</div></body>");
        let q = single_div(&doc);
        highlight_question(&mut doc, q, "ans");
        let tooltip = doc
            .children(q)
            .iter()
            .copied()
            .find(|&c| doc.has_class(c, TOOLTIP_CLASS))
            .unwrap();
        assert!(is_decoration(&doc, tooltip));
        let label = doc.children(tooltip)[0];
        assert!(is_decoration(&doc, label));
        assert!(!is_decoration(&doc, q));
    }
}
