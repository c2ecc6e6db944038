//! Answer-option localization for a matched question.
//!
//! Scopes are tried in strict priority order and the first matching option
//! anywhere wins; there is no cross-scope ranking. Finding nothing is an
//! expected outcome, not an error: the question still gets highlighted.

use std::sync::OnceLock;

use regex::Regex;

use crate::dom::{Document, NodeId};
use crate::extract::QUESTION_CONTAINER_CLASSES;
use crate::highlight;
use crate::normalize::{self, norm_ws, ANSWER_TEXT_CLASSES};
use crate::similarity;

/// Classes that mark a single answer option.
const OPTION_CLASSES: &[&str] = &["answer", "option", "answer-option", "choice"];

/// Generic block ancestors used as the third search scope.
const BLOCK_TAGS: &[&str] = &["div", "section", "article", "form", "li", "table"];

/// Vertical window (px) below the question for the geometry fallback.
const PROXIMITY_PX: f64 = 300.0;

struct Patterns {
    option_marker: Regex,
    leading_option: Regex,
    leading_number: Regex,
    answer_label: Regex,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| Patterns {
        option_marker: Regex::new(
            r"(?i)^\s*([a-d][.)]\s+|[1-9][0-9]?[.)]\s+|đáp án\s*[a-d]\b)",
        )
        .unwrap(),
        leading_option: Regex::new(r"^\s*[A-Da-d][.)]\s*").unwrap(),
        leading_number: Regex::new(r"^\s*[1-9][0-9]?[.)]\s+").unwrap(),
        answer_label: Regex::new(
            r"(?i)^\s*(đáp án|trả lời|kết quả|phương án|chọn|lựa chọn)\s*:\s*",
        )
        .unwrap(),
    })
}

/// Strip option markers ("A.", "1)") and answer labels ("Đáp án:") from the
/// front, then case-fold and collapse whitespace.
pub fn clean_answer_text(text: &str) -> String {
    let p = patterns();
    let s = p.answer_label.replace(text, "");
    let s = p.leading_option.replace(&s, "");
    let s = p.leading_number.replace(&s, "");
    norm_ws(&s.to_lowercase())
}

/// Locate the answer-option node for a matched question, or `None`.
pub fn find_answer_node(
    doc: &Document,
    question: NodeId,
    answer: &str,
    threshold: f64,
) -> Option<NodeId> {
    let cleaned_answer = clean_answer_text(answer);
    if cleaned_answer.is_empty() {
        return None;
    }

    for scope in scopes(doc, question) {
        if let Some(found) = scan_scope(doc, scope, question, &cleaned_answer, threshold) {
            return Some(found);
        }
    }

    if let Some(found) = proximity_fallback(doc, question, &cleaned_answer, threshold) {
        return Some(found);
    }

    containment_fallback(doc, question, &cleaned_answer)
}

/// Scopes (1)-(3): immediate parent, closest question-container ancestor,
/// closest generic block ancestor.
fn scopes(doc: &Document, question: NodeId) -> Vec<NodeId> {
    let mut out = Vec::new();
    if let Some(parent) = doc.parent(question) {
        out.push(parent);
    }
    let ancestors = doc.ancestors(question);
    if let Some(&container) = ancestors.iter().find(|&&a| {
        QUESTION_CONTAINER_CLASSES
            .iter()
            .any(|c| doc.has_class(a, c))
    }) {
        out.push(container);
    }
    if let Some(&block) = ancestors.iter().find(|&&a| {
        doc.tag(a).map(|t| BLOCK_TAGS.contains(&t)).unwrap_or(false)
    }) {
        out.push(block);
    }
    out
}

fn is_excluded(doc: &Document, node: NodeId, question: NodeId) -> bool {
    node == question
        || doc.is_descendant_of(node, question)
        || highlight::is_decoration(doc, node)
}

fn is_option_candidate(doc: &Document, node: NodeId, text: &str) -> bool {
    if patterns().option_marker.is_match(text) {
        return true;
    }
    if OPTION_CLASSES.iter().any(|c| doc.has_class(node, c)) {
        return true;
    }
    doc.ancestors(node).iter().any(|&a| {
        ANSWER_TEXT_CLASSES.iter().any(|c| doc.has_class(a, c))
    })
}

fn scan_scope(
    doc: &Document,
    scope: NodeId,
    question: NodeId,
    cleaned_answer: &str,
    threshold: f64,
) -> Option<NodeId> {
    for node in doc.descendants(scope) {
        if !doc.is_element(node) || is_excluded(doc, node, question) {
            continue;
        }
        let text = normalize::subtree_text(doc, node);
        if text.is_empty() {
            continue;
        }
        if !is_option_candidate(doc, node, &text) {
            continue;
        }
        let cleaned = clean_answer_text(&text);
        if similarity::similar(&cleaned, cleaned_answer, similarity::LENGTH_GATE, threshold) {
            return Some(node);
        }
    }
    None
}

/// Scope (4): document-wide, but only text-bearing elements whose top edge
/// falls within the proximity window below the question. Nodes without host
/// geometry are invisible here.
fn proximity_fallback(
    doc: &Document,
    question: NodeId,
    cleaned_answer: &str,
    threshold: f64,
) -> Option<NodeId> {
    let q_bottom = doc.rect(question)?.bottom;
    for node in doc.elements() {
        if is_excluded(doc, node, question) {
            continue;
        }
        let Some(rect) = doc.rect(node) else {
            continue;
        };
        if rect.top < q_bottom || rect.top > q_bottom + PROXIMITY_PX {
            continue;
        }
        let text = normalize::subtree_text(doc, node);
        if text.is_empty() || !is_option_candidate(doc, node, &text) {
            continue;
        }
        let cleaned = clean_answer_text(&text);
        if similarity::similar(&cleaned, cleaned_answer, similarity::LENGTH_GATE, threshold) {
            return Some(node);
        }
    }
    None
}

/// Last resort: first element whose cleaned text contains the cleaned answer
/// and still scores a high ratio (near-equality).
fn containment_fallback(
    doc: &Document,
    question: NodeId,
    cleaned_answer: &str,
) -> Option<NodeId> {
    for node in doc.elements() {
        if is_excluded(doc, node, question) {
            continue;
        }
        let text = normalize::subtree_text(doc, node);
        if text.is_empty() {
            continue;
        }
        let cleaned = clean_answer_text(&text);
        if cleaned.contains(cleaned_answer)
            && similarity::ratio(&cleaned, cleaned_answer) > 0.8
        {
            return Some(node);
        }
    }
    None
}
