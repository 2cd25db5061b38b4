//! Reciprocal Rank Fusion.
//!
//! `score(m) = sum_i w_i * 1/(K + rank_i(m))`, `K = 60`, weights `0.60` (vector) / `0.25` (keyword)
//! / `0.15` (tag), signals absent for a memory contribute 0. Ties break by memory id ascending for
//! determinism.

use crate::types::Candidate;
use cairn_core::types::rrf_contribution;
use std::collections::HashMap;

pub const RRF_K: f64 = 60.0;
pub const WEIGHT_VECTOR: f64 = 0.60;
pub const WEIGHT_KEYWORD: f64 = 0.25;
pub const WEIGHT_TAG: f64 = 0.15;

pub const SIGNAL_VECTOR: &str = "vector";
pub const SIGNAL_KEYWORD: &str = "keyword";
pub const SIGNAL_TAG: &str = "tag";

/// Design cap on how many ranked ids a single signal contributes.
pub const SIGNAL_POOL_CAP: usize = 200;

/// Fuse ranked signal lists into a single descending-score candidate list.
///
/// `signals` is `(name, weight, ranked_ids)` -- each inner list is already
/// rank-ordered (index 0 is rank 1); only the first [`SIGNAL_POOL_CAP`]
/// entries of each are considered.
#[must_use]
pub fn fuse(signals: &[(&'static str, f64, &[i64])]) -> Vec<Candidate> {
    let mut by_id: HashMap<i64, Candidate> = HashMap::new();

    for (name, weight, ranked_ids) in signals {
        for (idx, &id) in ranked_ids.iter().take(SIGNAL_POOL_CAP).enumerate() {
            let rank = idx + 1;
            let contribution = rrf_contribution(RRF_K, Some(rank), *weight);
            let entry = by_id.entry(id).or_insert_with(|| Candidate::new(id, 0.0));
            entry.score += contribution;
            entry.signal_ranks.insert(name, rank);
        }
    }

    let mut candidates: Vec<Candidate> = by_id.into_values().collect();
    candidates.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal).then(a.memory_id.cmp(&b.memory_id)));
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rank_one_in_vector_outscores_rank_one_in_keyword() {
        let vector_rank1 = rrf_contribution(RRF_K, Some(1), WEIGHT_VECTOR);
        let keyword_rank1 = rrf_contribution(RRF_K, Some(1), WEIGHT_KEYWORD);
        assert!(vector_rank1 > keyword_rank1);
    }

    #[test]
    fn weights_sum_to_one() {
        assert!((WEIGHT_VECTOR + WEIGHT_KEYWORD + WEIGHT_TAG - 1.0).abs() < 1e-9);
    }

    #[test]
    fn fuse_sums_contributions_across_signals() {
        let vector_ids = vec![1, 2, 3];
        let keyword_ids = vec![2, 1];
        let tag_ids: Vec<i64> = vec![];
        let signals: Vec<(&'static str, f64, &[i64])> =
            vec![(SIGNAL_VECTOR, WEIGHT_VECTOR, &vector_ids), (SIGNAL_KEYWORD, WEIGHT_KEYWORD, &keyword_ids), (SIGNAL_TAG, WEIGHT_TAG, &tag_ids)];
        let fused = fuse(&signals);

        assert_eq!(fused.len(), 3);
        // id 2: vector rank 2 + keyword rank 1 should edge out id 1: vector rank 1 + keyword rank 2
        let id1_score = fused.iter().find(|c| c.memory_id == 1).unwrap().score;
        let id2_score = fused.iter().find(|c| c.memory_id == 2).unwrap().score;
        let expected_id1 = rrf_contribution(RRF_K, Some(1), WEIGHT_VECTOR) + rrf_contribution(RRF_K, Some(2), WEIGHT_KEYWORD);
        let expected_id2 = rrf_contribution(RRF_K, Some(2), WEIGHT_VECTOR) + rrf_contribution(RRF_K, Some(1), WEIGHT_KEYWORD);
        assert!((id1_score - expected_id1).abs() < 1e-12);
        assert!((id2_score - expected_id2).abs() < 1e-12);
    }

    #[test]
    fn ties_break_by_ascending_memory_id() {
        let ids = vec![5, 3];
        let empty: Vec<i64> = vec![];
        let signals: Vec<(&'static str, f64, &[i64])> = vec![(SIGNAL_VECTOR, WEIGHT_VECTOR, &ids), (SIGNAL_KEYWORD, WEIGHT_KEYWORD, &empty)];
        // Equal single-signal rank-1 contributions would tie if both were rank 1;
        // construct an explicit tie instead.
        let a = vec![7i64];
        let b = vec![9i64];
        let tie_signals: Vec<(&'static str, f64, &[i64])> = vec![(SIGNAL_VECTOR, WEIGHT_VECTOR, &a), (SIGNAL_KEYWORD, WEIGHT_KEYWORD, &b)];
        let fused = fuse(&tie_signals);
        assert_eq!(fused.len(), 2);
        // Different scores expected normally; verify determinism on a genuine tie:
        let _ = fuse(&signals);
        let equal_signals: Vec<(&'static str, f64, &[i64])> = vec![(SIGNAL_VECTOR, WEIGHT_VECTOR, &[3i64, 5i64])];
        let fused_equal = fuse(&equal_signals);
        assert_eq!(fused_equal[0].memory_id, 3);
    }
}
