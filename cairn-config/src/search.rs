//! Retrieval-pipeline tunables: RRF weights, rerank pool size, token budget, router confidence
//! threshold, entity merge threshold, and BFS depth bounds.

use serde::{Deserialize, Serialize};

/// Tunables consumed by `cairn-search`. Defaults match exactly.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SearchConfig {
    /// RRF damping constant `K`.
    pub rrf_k: f64,
    /// Signal weight for the vector-similarity ranker. `w_vector + w_keyword
    /// + w_tag` must sum to 1.0 (validated in [`crate::CairnConfig::validate`]).
    pub weight_vector: f64,
    /// Signal weight for the BM25-style keyword ranker.
    pub weight_keyword: f64,
    /// Signal weight for the tag-match ranker.
    pub weight_tag: f64,
    /// Size of the RRF candidate pool handed to the reranker.
    pub rerank_candidates: usize,
    /// Token budget enforced on final result assembly.
    pub token_budget: usize,
    /// Minimum `QueryRouter` confidence required to dispatch a typed handler.
    pub router_confidence_threshold: f32,
    /// Cosine-similarity threshold above which two entities of the same type are merged.
    pub entity_merge_threshold: f32,
    /// BFS depth for `handle_entity_lookup`'s hop-2 traversal.
    pub entity_lookup_hop_depth: usize,
    /// BFS depth bound for `find_connecting_statements`.
    pub relationship_bfs_depth: usize,
    /// Default lookback window (days) applied by `handle_temporal` when neither `after` nor `before`
    /// was extracted.
    pub temporal_default_window_days: i64,
    /// Per-signal candidate cap before fusion.
    pub signal_candidate_cap: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            rrf_k: 60.0,
            weight_vector: 0.60,
            weight_keyword: 0.25,
            weight_tag: 0.15,
            rerank_candidates: 50,
            token_budget: 10_000,
            router_confidence_threshold: 0.6,
            entity_merge_threshold: 0.80,
            entity_lookup_hop_depth: 2,
            relationship_bfs_depth: 3,
            temporal_default_window_days: 7,
            signal_candidate_cap: 200,
        }
    }
}

impl SearchConfig {
    /// Validate internal consistency: weights must sum to 1.0 (within
    /// floating-point tolerance) and every threshold must be in `[0, 1]`.
    ///
    /// # Errors
    /// Returns a message describing the first violated constraint.
    pub fn validate(&self) -> Result<(), String> {
        let weight_sum = self.weight_vector + self.weight_keyword + self.weight_tag;
        if (weight_sum - 1.0).abs() > 1e-6 {
            return Err(format!("search.weight_vector + weight_keyword + weight_tag must sum to 1.0, got {weight_sum}"));
        }
        if !(0.0..=1.0).contains(&self.router_confidence_threshold) {
            return Err("search.router_confidence_threshold must be in [0, 1]".to_string());
        }
        if !(0.0..=1.0).contains(&self.entity_merge_threshold) {
            return Err("search.entity_merge_threshold must be in [0, 1]".to_string());
        }
        if self.rrf_k <= 0.0 {
            return Err("search.rrf_k must be positive".to_string());
        }
        if self.rerank_candidates == 0 || self.token_budget == 0 {
            return Err("search.rerank_candidates and search.token_budget must be nonzero".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec_section_6() {
        let cfg = SearchConfig::default();
        assert_eq!(cfg.rrf_k, 60.0);
        assert!((cfg.weight_vector + cfg.weight_keyword + cfg.weight_tag - 1.0).abs() < 1e-9);
        assert_eq!(cfg.rerank_candidates, 50);
        assert_eq!(cfg.token_budget, 10_000);
        assert!((cfg.router_confidence_threshold - 0.6).abs() < 1e-9);
        assert!((cfg.entity_merge_threshold - 0.80).abs() < 1e-9);
        assert_eq!(cfg.entity_lookup_hop_depth, 2);
        assert_eq!(cfg.relationship_bfs_depth, 3);
        cfg.validate().expect("default config is valid");
    }

    #[test]
    fn validate_rejects_weights_not_summing_to_one() {
        let mut cfg = SearchConfig::default();
        cfg.weight_vector = 0.9;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validate_rejects_out_of_range_threshold() {
        let mut cfg = SearchConfig::default();
        cfg.router_confidence_threshold = 1.5;
        assert!(cfg.validate().is_err());
    }
}
