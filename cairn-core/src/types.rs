//! Small shared types and pure helpers used across the retrieval pipeline.

use serde::{Deserialize, Serialize};

/// A project identifier. `__global__` is reserved: rule-type memories stored
/// there are visible from every other project.
pub const GLOBAL_PROJECT: &str = "__global__";

/// Clamp a float into `[0.0, 1.0]`, used for importance and router confidence.
#[must_use]
pub fn clamp01(value: f32) -> f32 {
    value.clamp(0.0, 1.0)
}

/// Truncate a fact string to at most `max_words` words (spec: statements are
/// truncated, never rejected, past 20 words).
#[must_use]
pub fn truncate_words(text: &str, max_words: usize) -> String {
    let mut words = text.split_whitespace();
    let truncated: Vec<&str> = (&mut words).take(max_words).collect();
    truncated.join(" ")
}

/// Lowercase, dedup, and cap a tag list at `max_tags` entries, preserving
/// first-seen order.
#[must_use]
pub fn normalize_tags(tags: impl IntoIterator<Item = impl Into<String>>, max_tags: usize) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();
    for tag in tags {
        let tag = tag.into().trim().to_lowercase();
        if tag.is_empty() || !seen.insert(tag.clone()) {
            continue;
        }
        out.push(tag);
        if out.len() >= max_tags {
            break;
        }
    }
    out
}

/// Estimate token count for token-budget trimming: `ceil(chars / 4)`.
#[must_use]
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count().div_ceil(4)
}

/// Cosine similarity between two equal-length vectors. Returns 0.0 for
/// mismatched lengths or zero-norm vectors rather than panicking, since
/// callers treat similarity as a ranking signal, not an invariant.
#[must_use]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// L2-normalize a vector in place. Embedders must return unit-normalized vectors; this is the
/// shared implementation they call.
pub fn l2_normalize(vector: &mut [f32]) {
    let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in vector.iter_mut() {
            *x /= norm;
        }
    }
}

/// Reciprocal Rank Fusion contribution for a single signal at a given
/// 1-based rank. `rank = None` means the item was absent from that signal
/// and contributes 0.
#[must_use]
pub fn rrf_contribution(k: f64, rank: Option<usize>, weight: f64) -> f64 {
    match rank {
        Some(r) => weight * (1.0 / (k + r as f64)),
        None => 0.0,
    }
}

/// Health state derived from the last five outcomes of a backend call, ("Model-call statistics").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum BackendHealth {
    #[default]
    Unknown,
    Healthy,
    Degraded,
    Unhealthy,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_words_caps_at_twenty() {
        let long = (0..30).map(|i| format!("w{i}")).collect::<Vec<_>>().join(" ");
        let truncated = truncate_words(&long, 20);
        assert_eq!(truncated.split_whitespace().count(), 20);
    }

    #[test]
    fn normalize_tags_lowercases_dedups_and_caps() {
        let tags = normalize_tags(["Rust", "rust", "DB", "  ", "x1", "x2", "x3", "x4", "x5", "x6", "x7"], 10);
        assert_eq!(tags.len(), 10);
        assert_eq!(tags[0], "rust");
        assert!(tags.iter().filter(|t| *t == "rust").count() == 1);
    }

    #[test]
    fn rrf_strictly_decreasing_in_rank() {
        let r1 = rrf_contribution(60.0, Some(1), 1.0);
        let r2 = rrf_contribution(60.0, Some(2), 1.0);
        assert!(r1 > r2);
    }

    #[test]
    fn rrf_absent_signal_contributes_zero() {
        assert_eq!(rrf_contribution(60.0, None, 1.0), 0.0);
    }

    #[test]
    fn cosine_similarity_identical_vectors_is_one() {
        let v = vec![0.6, 0.8];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
    }
}
