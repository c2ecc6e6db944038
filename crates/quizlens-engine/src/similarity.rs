//! Tiered string similarity for question and answer matching.
//!
//! Callers pre-normalize case and whitespace; this module only compares.
//! Tiers short-circuit from cheap to expensive: exact equality, equality
//! after punctuation stripping, containment (long strings only), then a
//! normalized Levenshtein ratio.

/// Minimum length both sides must exceed before containment counts as a match.
pub const LENGTH_GATE: usize = 20;
/// Acceptance threshold for question matching.
pub const QUESTION_THRESHOLD: f64 = 0.8;
/// Acceptance threshold for answer-option matching. Looser than the question
/// threshold; both values are empirically tuned and deliberately kept as
/// separate knobs.
pub const ANSWER_THRESHOLD: f64 = 0.7;

pub fn similar(a: &str, b: &str, length_gate: usize, threshold: f64) -> bool {
    if a == b {
        return true;
    }
    let sa = strip_non_word(a);
    let sb = strip_non_word(b);
    if !sa.is_empty() && sa == sb {
        return true;
    }
    // Containment is a cheap escape that avoids edit distance on long strings.
    if a.chars().count() > length_gate
        && b.chars().count() > length_gate
        && (a.contains(b) || b.contains(a))
    {
        return true;
    }
    ratio(a, b) > threshold
}

/// Normalized Levenshtein similarity in [0, 1].
pub fn ratio(a: &str, b: &str) -> f64 {
    let la = a.chars().count();
    let lb = b.chars().count();
    let max = la.max(lb);
    if max == 0 {
        return 1.0;
    }
    (max - levenshtein(a, b)) as f64 / max as f64
}

/// Unit-cost edit distance over chars. Rolling two-row variant of the classic
/// DP matrix; numerically identical to the full-matrix form.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut cur = vec![0usize; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        cur[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            cur[j + 1] = (prev[j] + cost)
                .min(prev[j + 1] + 1)
                .min(cur[j] + 1);
        }
        std::mem::swap(&mut prev, &mut cur);
    }
    prev[b.len()]
}

fn strip_non_word(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect()
}
