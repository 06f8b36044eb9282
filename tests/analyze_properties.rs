//! Property-based tests for the attention-pattern analyzer
//!
//! Covers the `[0, 1]` bounds of all statistics over random row-stochastic
//! tensors, classifier determinism at and around thresholds, and the
//! uniform-attention scenario.

use proptest::prelude::*;
use revelar::analyze::classify::{
    classify, AttentionPattern, CLS_ATTENTION_THRESHOLD, PREV_TOKEN_THRESHOLD,
};
use revelar::analyze::stats::{compute_head_stats, HeadStats};
use revelar::analyze::analyze_attention;
use revelar::Tensor;

/// Random `[S, S]` row-stochastic matrix, flattened
fn stochastic_matrix() -> impl Strategy<Value = (usize, Vec<f32>)> {
    (2usize..=8).prop_flat_map(|s| {
        proptest::collection::vec(0.01f32..1.0, s * s).prop_map(move |mut raw| {
            for row in raw.chunks_mut(s) {
                let sum: f32 = row.iter().sum();
                for v in row {
                    *v /= sum;
                }
            }
            (s, raw)
        })
    })
}

proptest! {
    #[test]
    fn test_statistics_bounded((s, m) in stochastic_matrix()) {
        let stats = compute_head_stats(&m, s).unwrap();

        for (name, v) in [
            ("cls", stats.cls_attention),
            ("sep", stats.sep_attention),
            ("self", stats.self_attention),
            ("prev", stats.prev_token_attention),
            ("next", stats.next_token_attention),
        ] {
            prop_assert!((0.0..=1.0).contains(&v), "{name} = {v} out of [0, 1]");
        }

        prop_assert!(stats.entropy_ratio >= 0.0);
        // Row normalization in f32 can overshoot 1 by a few ulps.
        prop_assert!(stats.entropy_ratio <= 1.0 + 1e-5, "ratio {}", stats.entropy_ratio);
    }

    #[test]
    fn test_classifier_deterministic((s, m) in stochastic_matrix()) {
        let stats = compute_head_stats(&m, s).unwrap();
        prop_assert_eq!(classify(&stats), classify(&stats));
    }

    #[test]
    fn test_statistics_pure((s, m) in stochastic_matrix()) {
        let a = compute_head_stats(&m, s).unwrap();
        let b = compute_head_stats(&m, s).unwrap();
        prop_assert_eq!(a, b);
    }
}

// ============================================================================
// Threshold boundaries
// ============================================================================

fn flat_stats(value: f64) -> HeadStats {
    HeadStats {
        cls_attention: value,
        sep_attention: 0.0,
        self_attention: 0.0,
        prev_token_attention: 0.0,
        next_token_attention: 0.0,
        entropy_ratio: 0.0,
    }
}

#[test]
fn test_exact_cls_threshold_is_not_a_match() {
    let labels = classify(&flat_stats(CLS_ATTENTION_THRESHOLD));
    assert!(labels.is_empty());
}

#[test]
fn test_above_cls_threshold_matches() {
    let labels = classify(&flat_stats(CLS_ATTENTION_THRESHOLD + f64::EPSILON * 10.0));
    assert_eq!(labels, vec![AttentionPattern::ClsFocus]);
}

#[test]
fn test_exact_prev_threshold_is_not_a_match() {
    let stats = HeadStats {
        prev_token_attention: PREV_TOKEN_THRESHOLD,
        ..flat_stats(0.0)
    };
    assert!(classify(&stats).is_empty());
}

// ============================================================================
// Uniform-attention scenarios
// ============================================================================

#[test]
fn test_uniform_two_head_four_token_tensor() {
    // Every entry 0.25: maximal entropy, all means exactly 0.25. The 0.2
    // positional thresholds are cleared; the 0.3 ones are not.
    let attention = Tensor::from_vec(vec![2, 4, 4], vec![0.25; 32]).unwrap();
    let tokens: Vec<String> = (0..4).map(|i| format!("t{i}")).collect();
    let report = analyze_attention(&attention, &tokens, "uniform").unwrap();

    for head in report.analysis.values() {
        assert!((head.stats.cls_attention - 0.25).abs() < 1e-6);
        assert!((head.stats.entropy_ratio - 1.0).abs() < 1e-6);
        assert!(head.patterns.iter().any(|p| p.contains("Broad attention")));
        assert!(!head.patterns.iter().any(|p| p.contains("[CLS]")));
        assert!(!head.patterns.iter().any(|p| p.contains("[SEP]")));
        assert!(!head.patterns.iter().any(|p| p.contains("Self-attention")));
    }
}

#[test]
fn test_uniform_long_sequence_matches_only_broad() {
    let s = 10;
    let attention = Tensor::from_vec(vec![1, s, s], vec![1.0 / s as f32; s * s]).unwrap();
    let tokens: Vec<String> = (0..s).map(|i| format!("t{i}")).collect();
    let report = analyze_attention(&attention, &tokens, "uniform").unwrap();

    let head = &report.analysis[&0];
    assert_eq!(head.patterns.len(), 1);
    assert!(head.patterns[0].contains("Broad attention"));
}
