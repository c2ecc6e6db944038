//! Candidate extraction: one full-document scan per call.
//!
//! Nothing here is memoized; the page can mutate between runs, so every call
//! re-reads the live tree from scratch and builds fresh candidates.

use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

use crate::dom::{Document, NodeId};
use crate::highlight;
use crate::normalize::{self, norm_ws};

/// Why a node was classified as question-like. Predicates are evaluated in
/// a fixed priority order and the first satisfied one is recorded; the tag is
/// diagnostic only and never drives matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CandidateReason {
    PatternMatch,
    ClassNameHint,
    ParentContainerHint,
    KeywordHint,
    QuestionMarkHint,
    StructuralHeuristic,
}

/// A node classified as likely containing a question. Holds a weak node
/// handle, never an owning reference; created fresh every run.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub node: NodeId,
    pub raw_text: String,
    pub normalized_text: String,
    pub reason: CandidateReason,
    pub sequence_index: usize,
}

/// Classes that mark a question container (ancestor hint for the extractor,
/// search scope for the answer locator).
pub const QUESTION_CONTAINER_CLASSES: &[&str] = &[
    "que",
    "question",
    "question-item",
    "question-block",
    "question-container",
    "quiz-question",
];

/// Tags worth reading text from during the primary scan.
const TEXT_TAGS: &[&str] = &[
    "div", "p", "span", "li", "td", "th", "label", "h1", "h2", "h3", "h4", "h5", "h6",
];

/// Fixed interrogative keywords (Vietnamese).
const QUESTION_KEYWORDS: &[&str] = &[
    "là gì",
    "là ai",
    "như thế nào",
    "thế nào",
    "tại sao",
    "vì sao",
    "khi nào",
    "ở đâu",
    "bao nhiêu",
    "có phải",
    "có đúng",
];

struct Patterns {
    numbered_marker: Regex,
    list_marker: Regex,
    trailing_question: Regex,
    interrogative_tail: Regex,
    bare_question_label: Regex,
    bare_option_label: Regex,
    bare_number_label: Regex,
    has_letter: Regex,
    marker_prefix: Regex,
    leading_list: Regex,
    leading_option: Regex,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| Patterns {
        numbered_marker: Regex::new(r"(?i)^(câu|bài|question)\s*\d+[:.)\s]").unwrap(),
        list_marker: Regex::new(r"^\d+[.)]\s").unwrap(),
        trailing_question: Regex::new(r"[?？]\s*$").unwrap(),
        interrogative_tail: Regex::new(
            r"(?i)\s(là gì|là ai|như thế nào|thế nào|tại sao|vì sao)\s*[?？]?\s*$",
        )
        .unwrap(),
        bare_question_label: Regex::new(r"(?i)^(câu|bài|question)\s*\d+\s*[:.)]*\s*$").unwrap(),
        bare_option_label: Regex::new(r"^[A-Da-d][.)]\s*$").unwrap(),
        bare_number_label: Regex::new(r"^\d+\s*[:.)]*\s*$").unwrap(),
        has_letter: Regex::new(r"[A-Za-zÀ-ỹ]").unwrap(),
        marker_prefix: Regex::new(r"(?i)(câu\s*(hỏi\s*)?|bài\s*(tập\s*)?|question\s*)\d+\s*[:.)\s]*")
            .unwrap(),
        leading_list: Regex::new(r"^\s*\d+[.)]\s*").unwrap(),
        leading_option: Regex::new(r"^\s*[A-Da-d][.)\-]\s+").unwrap(),
    })
}

/// Strip question-number markers and option prefixes, then case-fold and
/// collapse whitespace. This is the "normalized" form candidates and corpus
/// questions are compared in.
pub fn clean_question_text(text: &str) -> String {
    let p = patterns();
    let s = p.marker_prefix.replace_all(text, "");
    let s = p.leading_list.replace(&s, "");
    let s = p.leading_option.replace(&s, "");
    norm_ws(&s.to_lowercase())
}

/// Scan the whole document for question-like nodes, in document order.
pub fn extract_candidates(doc: &Document) -> Vec<Candidate> {
    let p = patterns();
    let mut out: Vec<Candidate> = Vec::new();

    for node in doc.elements() {
        if highlight::is_decoration(doc, node) {
            continue;
        }
        let tag_ok = doc
            .tag(node)
            .map(|t| TEXT_TAGS.contains(&t))
            .unwrap_or(false);
        let class_hint = has_class_hint(doc, node);
        if !tag_ok && !class_hint {
            continue;
        }

        let raw = normalize::subtree_text(doc, node);
        let len = raw.chars().count();
        if !(5..1000).contains(&len) || !p.has_letter.is_match(&raw) {
            continue;
        }
        // Bare labels ("Câu 3", "B.", "12)") carry no question content.
        if p.bare_question_label.is_match(&raw)
            || p.bare_option_label.is_match(&raw)
            || p.bare_number_label.is_match(&raw)
        {
            continue;
        }

        if let Some(reason) = classify(doc, node, &raw) {
            let normalized = clean_question_text(&raw);
            if normalized.chars().count() < 5 {
                continue;
            }
            out.push(Candidate {
                node,
                raw_text: raw,
                normalized_text: normalized,
                reason,
                sequence_index: out.len(),
            });
        }
    }

    // Secondary pass: dedicated question-text nodes, appended when their
    // exact text is not already present. Dedup is by exact text equality
    // only; near-duplicates stay separate on purpose.
    for node in doc.elements() {
        if !doc.has_class(node, "question-text") || highlight::is_decoration(doc, node) {
            continue;
        }
        let raw = normalize::subtree_text(doc, node);
        if raw.is_empty() || out.iter().any(|c| c.raw_text == raw) {
            continue;
        }
        let normalized = clean_question_text(&raw);
        out.push(Candidate {
            node,
            raw_text: raw,
            normalized_text: normalized,
            reason: CandidateReason::ClassNameHint,
            sequence_index: out.len(),
        });
    }

    out
}

fn has_class_hint(doc: &Document, node: NodeId) -> bool {
    let hinted = ["question", "cau", "bai"]
        .iter()
        .any(|h| doc.class_contains(node, h));
    let excluded = ["number", "label", "so", "stt"]
        .iter()
        .any(|h| doc.class_contains(node, h));
    hinted && !excluded
}

fn classify(doc: &Document, node: NodeId, text: &str) -> Option<CandidateReason> {
    let p = patterns();

    if p.numbered_marker.is_match(text)
        || p.list_marker.is_match(text)
        || p.trailing_question.is_match(text)
        || p.interrogative_tail.is_match(text)
    {
        return Some(CandidateReason::PatternMatch);
    }

    if has_class_hint(doc, node) {
        return Some(CandidateReason::ClassNameHint);
    }

    if doc.ancestors(node).iter().any(|&a| {
        QUESTION_CONTAINER_CLASSES
            .iter()
            .any(|c| doc.has_class(a, c))
    }) {
        return Some(CandidateReason::ParentContainerHint);
    }

    let lower = text.to_lowercase();
    if QUESTION_KEYWORDS.iter().any(|k| lower.contains(k)) {
        return Some(CandidateReason::KeywordHint);
    }

    if text.contains('?') || text.contains('？') {
        return Some(CandidateReason::QuestionMarkHint);
    }

    let len = text.chars().count();
    if (20..300).contains(&len) {
        let starts_upper = text.chars().next().map(char::is_uppercase).unwrap_or(false);
        let sentences = text
            .split(['.', '!', '?'])
            .filter(|s| !s.trim().is_empty())
            .count();
        if starts_upper && sentences <= 3 {
            return Some(CandidateReason::StructuralHeuristic);
        }
    }

    None
}
