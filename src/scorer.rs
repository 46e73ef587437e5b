//! Fuzzy similarity scoring between normalized strings.
//!
//! The base primitive is `rapidfuzz::fuzz::ratio` (normalized Indel
//! similarity). On top of it the composite score takes the best of the plain
//! ratio, a partial (best-window) ratio, a token-sort ratio and a token-set
//! ratio, so the metric is robust to word reordering and partial overlap:
//! "area finanza" scores highly against "finanza area spa", unrelated
//! strings score near 0.

use rapidfuzz::fuzz;

use crate::normalizer::NormalizedText;

/// Similarity between two normalized strings, 0..=100.
///
/// Boundary properties: `score(x, x) == 100` for any non-empty `x`;
/// `score(x, "") == 0` for non-empty `x`.
pub fn score(a: &NormalizedText, b: &NormalizedText) -> u8 {
    score_str(a.as_str(), b.as_str())
}

fn score_str(a: &str, b: &str) -> u8 {
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    if a == b {
        return 100;
    }

    let candidates = [
        ratio(a, b),
        partial_ratio(a, b),
        token_sort_ratio(a, b),
        token_set_ratio(a, b),
    ];

    let best = candidates.into_iter().fold(0.0_f64, f64::max);
    best.round().clamp(0.0, 100.0) as u8
}

/// Raw alias score used by the matcher: exact equality pins 100 and
/// substring containment of one side in the other earns a small bonus,
/// since a configured alias appearing verbatim inside a filename is much
/// stronger evidence than the character overlap alone suggests.
pub fn alias_score(text: &NormalizedText, alias: &NormalizedText) -> u8 {
    if text.is_empty() || alias.is_empty() {
        return 0;
    }
    if text == alias {
        return 100;
    }

    let base = score(text, alias);
    if text.as_str().contains(alias.as_str()) || alias.as_str().contains(text.as_str()) {
        base.saturating_add(10).min(100)
    } else {
        base
    }
}

fn ratio(a: &str, b: &str) -> f64 {
    // rapidfuzz reports normalized similarity in 0.0..=1.0.
    fuzz::ratio(a.chars(), b.chars()) * 100.0
}

/// Best alignment of the shorter string against a same-length character
/// window of the longer one.
fn partial_ratio(a: &str, b: &str) -> f64 {
    let (short, long) = if a.chars().count() <= b.chars().count() {
        (a, b)
    } else {
        (b, a)
    };
    let short_len = short.chars().count();
    let long_chars: Vec<char> = long.chars().collect();

    if short_len == 0 || short_len >= long_chars.len() {
        return ratio(a, b);
    }

    let mut best = 0.0_f64;
    for window in long_chars.windows(short_len) {
        let slice: String = window.iter().collect();
        best = best.max(ratio(short, &slice));
        if best >= 100.0 {
            break;
        }
    }
    best
}

/// Ratio after sorting tokens alphabetically, neutralizing word order.
fn token_sort_ratio(a: &str, b: &str) -> f64 {
    ratio(&sorted_tokens(a).join(" "), &sorted_tokens(b).join(" "))
}

/// Ratio over the token intersection and differences, neutralizing both
/// word order and one-sided extra tokens.
fn token_set_ratio(a: &str, b: &str) -> f64 {
    let tokens_a = sorted_tokens(a);
    let tokens_b = sorted_tokens(b);

    let intersection: Vec<&str> = tokens_a
        .iter()
        .filter(|t| tokens_b.contains(t))
        .copied()
        .collect();
    let only_a: Vec<&str> = tokens_a
        .iter()
        .filter(|t| !tokens_b.contains(t))
        .copied()
        .collect();
    let only_b: Vec<&str> = tokens_b
        .iter()
        .filter(|t| !tokens_a.contains(t))
        .copied()
        .collect();

    let base = intersection.join(" ");
    let combined_a = join_nonempty(&base, &only_a.join(" "));
    let combined_b = join_nonempty(&base, &only_b.join(" "));

    [
        ratio(&base, &combined_a),
        ratio(&base, &combined_b),
        ratio(&combined_a, &combined_b),
    ]
    .into_iter()
    .fold(0.0_f64, f64::max)
}

fn sorted_tokens(s: &str) -> Vec<&str> {
    let mut tokens: Vec<&str> = s.split_whitespace().collect();
    tokens.sort_unstable();
    tokens.dedup();
    tokens
}

fn join_nonempty(a: &str, b: &str) -> String {
    match (a.is_empty(), b.is_empty()) {
        (true, _) => b.to_string(),
        (_, true) => a.to_string(),
        _ => format!("{a} {b}"),
    }
}
