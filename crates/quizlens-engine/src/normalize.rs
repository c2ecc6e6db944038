//! Image-aware text extraction from a DOM subtree.
//!
//! All substitution happens on a private deep clone, so the live document is
//! read-only during extraction. Content images (those served from the media
//! server's question/answer paths) become inline URL text; everything else
//! image-shaped is dropped without a placeholder.

use crate::dom::{Document, NodeId};
use crate::highlight;

/// Prioritized source attributes: direct first, then common lazy-load
/// fallbacks.
const IMAGE_SRC_ATTRS: &[&str] = &["src", "data-src", "data-original", "data-lazy-src"];

/// Classes marking question-text containers.
pub const QUESTION_TEXT_CLASSES: &[&str] =
    &["qtext", "questiontext", "question-content", "question-text"];

/// Classes marking answer-option containers.
pub const ANSWER_TEXT_CLASSES: &[&str] = &[
    "answer",
    "answers",
    "choices",
    "options",
    "answer-container",
    "qanswers",
];

/// Tags whose content is never part of the comparable text.
const NOISE_TAGS: &[&str] = &[
    "input", "svg", "button", "script", "style", "audio", "source", "iframe", "noscript",
];

const IMAGE_DELIM: &str = "\"";

/// Extract the normalized comparable text of the subtree rooted at `node`.
pub fn subtree_text(doc: &Document, node: NodeId) -> String {
    let mut clone = doc.clone_subtree(node);
    let root = clone.root();
    rewrite_images(&mut clone, root);
    strip_noise(&mut clone, root);
    norm_ws(&clone.text(root))
}

/// Collapse all whitespace runs (including blank lines) to single spaces.
pub fn norm_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// A content image is one served from the media server under a
/// question/answer subpath; anything else is an icon or decoration.
fn is_content_image(url: &str) -> bool {
    url.contains("pluginfile.php")
        && (url.contains("/question/answer/")
            || url.contains("/question/questiontext/")
            || url.contains("/question/"))
}

/// Resolve against the page origin; on failure, hand back the input rather
/// than erroring. Already-absolute URLs pass through.
fn absolute_url(doc: &Document, src: &str) -> String {
    if src.starts_with("http://") || src.starts_with("https://") {
        return src.to_string();
    }
    match doc.origin() {
        Some(origin) => match origin.join(src) {
            Ok(u) => u.to_string(),
            Err(_) => src.to_string(),
        },
        None => src.to_string(),
    }
}

fn resolve_src(doc: &Document, img: NodeId) -> Option<String> {
    for attr in IMAGE_SRC_ATTRS {
        if let Some(v) = doc.attr(img, attr) {
            let v = v.trim();
            if !v.is_empty() {
                return Some(absolute_url(doc, v));
            }
        }
    }
    None
}

/// Images to consider, in document order. When the subtree contains
/// question/answer-class containers, only their images count; otherwise every
/// image in the subtree does.
fn collect_images(doc: &Document, root: NodeId) -> Vec<NodeId> {
    let mut all = Vec::new();
    if doc.tag(root) == Some("img") {
        all.push(root);
    }
    for n in doc.descendants(root) {
        if doc.tag(n) == Some("img") {
            all.push(n);
        }
    }

    let mut containers = Vec::new();
    for n in std::iter::once(root).chain(doc.descendants(root)) {
        if !doc.is_element(n) {
            continue;
        }
        let scoped = QUESTION_TEXT_CLASSES
            .iter()
            .chain(ANSWER_TEXT_CLASSES.iter())
            .any(|c| doc.has_class(n, c));
        if scoped {
            containers.push(n);
        }
    }
    if containers.is_empty() {
        return all;
    }
    all.into_iter()
        .filter(|&img| {
            containers
                .iter()
                .any(|&c| img == c || doc.is_descendant_of(img, c))
        })
        .collect()
}

fn rewrite_images(doc: &mut Document, root: NodeId) {
    let mut first_full_url_used = false;
    for img in collect_images(doc, root) {
        let Some(url) = resolve_src(doc, img) else {
            // No resolvable source: never leave a broken placeholder behind.
            doc.detach(img);
            continue;
        };
        if !is_content_image(&url) {
            doc.detach(img);
            continue;
        }
        // First content image keeps full fidelity; later ones shrink to
        // `..../filename` so the flattened text stays compact.
        let rendered = if first_full_url_used {
            let filename = url.rsplit('/').next().unwrap_or("image.png");
            format!("{IMAGE_DELIM}..../{filename}{IMAGE_DELIM}")
        } else {
            first_full_url_used = true;
            format!("{IMAGE_DELIM}{url}{IMAGE_DELIM}")
        };
        doc.replace_with_text(img, &rendered);
    }
}

fn strip_noise(doc: &mut Document, root: NodeId) {
    let doomed: Vec<NodeId> = doc
        .descendants(root)
        .into_iter()
        .filter(|&n| {
            if !doc.is_element(n) {
                return false;
            }
            let noisy = doc
                .tag(n)
                .map(|t| NOISE_TAGS.contains(&t))
                .unwrap_or(false);
            noisy || highlight::is_decoration(doc, n)
        })
        .collect();
    for n in doomed {
        doc.detach(n);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc_with(html: &str) -> (Document, NodeId) {
        let doc =
            Document::parse_with_origin(html, "https://lms.example.edu/quiz/attempt").unwrap();
        let root = doc
            .elements()
            .into_iter()
            .find(|&n| doc.tag(n) == Some("body"))
            .unwrap();
        (doc, root)
    }

    #[test]
    fn first_image_keeps_full_url_later_ones_shrink() {
        let (doc, body) = doc_with(concat!(
            r#"<body><div class="qtext">Pick the diagram "#,
            r#"<img src="https://lms.example.edu/pluginfile.php/1/question/questiontext/img1.png">"#,
            r#"<img src="https://lms.example.edu/pluginfile.php/1/question/questiontext/img2.png">"#,
            r#"</div></body>"#,
        ));
        let text = subtree_text(&doc, body);
        assert!(
            text.contains("\"https://lms.example.edu/pluginfile.php/1/question/questiontext/img1.png\""),
            "full url expected, got: {text}"
        );
        assert!(text.contains("\"..../img2.png\""), "got: {text}");
        let full = text.find("img1.png").unwrap();
        let short = text.find("..../img2.png").unwrap();
        assert!(full < short);
    }

    #[test]
    fn non_allowlisted_image_is_dropped_without_placeholder() {
        let (doc, body) = doc_with(
            r#"<body><div class="qtext">Q <img src="https://cdn.example.com/icons/tick.png"></div></body>"#,
        );
        let text = subtree_text(&doc, body);
        assert_eq!(text, "Q");
    }

    #[test]
    fn relative_urls_resolve_against_the_page_origin() {
        let (doc, body) = doc_with(
            r#"<body><div class="qtext"><img src="/pluginfile.php/9/question/answer/x.png"> opt</div></body>"#,
        );
        let text = subtree_text(&doc, body);
        assert!(
            text.contains("\"https://lms.example.edu/pluginfile.php/9/question/answer/x.png\""),
            "got: {text}"
        );
    }

    #[test]
    fn image_without_source_is_removed() {
        let (doc, body) = doc_with(r#"<body><div class="qtext">Q <img alt="x"></div></body>"#);
        assert_eq!(subtree_text(&doc, body), "Q");
    }

    #[test]
    fn lazy_load_attributes_are_fallbacks() {
        let (doc, body) = doc_with(
            r#"<body><div class="qtext"><img data-src="/pluginfile.php/1/question/q.png"> Q</div></body>"#,
        );
        let text = subtree_text(&doc, body);
        assert!(text.contains("/pluginfile.php/1/question/q.png"), "got: {text}");
    }

    #[test]
    fn images_outside_question_containers_are_ignored_when_containers_exist() {
        let (doc, body) = doc_with(concat!(
            r#"<body><img src="https://lms.example.edu/pluginfile.php/1/question/outside.png">"#,
            r#"<div class="qtext">Q</div></body>"#,
        ));
        assert_eq!(subtree_text(&doc, body), "Q");
    }

    #[test]
    fn noise_elements_are_stripped() {
        let (doc, body) = doc_with(
            r#"<body><div>Q<script>var x=1;</script><button>Check</button><input value="v"></div></body>"#,
        );
        assert_eq!(subtree_text(&doc, body), "Q");
    }

    #[test]
    fn whitespace_collapses_to_single_spaces() {
        let (doc, body) = doc_with("<body><div>  a \n\n b\t c  </div></body>");
        assert_eq!(subtree_text(&doc, body), "a b c");
    }
}
