//! Attention-pattern analysis pipeline
//!
//! Takes one layer's `[H, S, S]` attention-probability tensor and produces
//! a per-head report: five scalar statistics and the matched behavior
//! labels. The report echoes the input text, tokens, and raw tensor so it
//! can be diffed against a reference implementation's output.
//!
//! ## Example
//!
//! ```
//! use revelar::analyze::analyze_attention;
//! use revelar::Tensor;
//!
//! // Two heads over a 4-token sequence, both uniform.
//! let attention = Tensor::from_vec(vec![2, 4, 4], vec![0.25; 32]).unwrap();
//! let tokens: Vec<String> = ["[CLS]", "the", "cat", "[SEP]"]
//!     .iter()
//!     .map(|s| s.to_string())
//!     .collect();
//!
//! let report = analyze_attention(&attention, &tokens, "the cat").unwrap();
//! assert_eq!(report.analysis.len(), 2);
//! let head = &report.analysis[&0];
//! assert!(head.patterns.iter().any(|p| p.contains("Broad attention")));
//! ```

pub mod classify;
pub mod stats;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Result, RevelarError};
use crate::tensor::Tensor;

pub use classify::{classify, AttentionPattern};
pub use stats::{compute_head_stats, HeadStats};

/// Statistics and matched labels for one head
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeadReport {
    /// Head index within the layer
    pub head_idx: usize,
    /// Human-readable matched labels, in classifier order
    pub patterns: Vec<String>,
    /// Raw statistics behind the labels
    pub stats: HeadStats,
}

/// Full analysis output for one layer's attention tensor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// The text the model was run on
    pub input_text: String,
    /// Token strings, length `S`
    pub tokens: Vec<String>,
    /// The raw `[H][S][S]` attention tensor, echoed for diffing
    pub attention_weights: Vec<Vec<Vec<f32>>>,
    /// Per-head reports keyed by head index
    pub analysis: BTreeMap<usize, HeadReport>,
}

impl AnalysisReport {
    /// Serialize to compact JSON
    ///
    /// # Errors
    ///
    /// Returns `Serialize` on a JSON encoding failure.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Analyze every head of a `[H, S, S]` attention tensor
///
/// # Errors
///
/// - `ShapeMismatch` if the tensor is not 3-D, its two trailing dimensions
///   differ, or the token count differs from `S`
/// - `DegenerateSequence` if `S < 2`
/// - `InvalidInput` if any probability is non-finite
pub fn analyze_attention(
    attention: &Tensor,
    tokens: &[String],
    input_text: &str,
) -> Result<AnalysisReport> {
    let shape = attention.shape();
    if shape.len() != 3 || shape[1] != shape[2] {
        return Err(RevelarError::ShapeMismatch {
            reason: format!("expected a [heads, seq, seq] tensor, got {shape:?}"),
        });
    }

    let num_heads = shape[0];
    let seq_len = shape[1];

    if tokens.len() != seq_len {
        return Err(RevelarError::ShapeMismatch {
            reason: format!(
                "{} tokens do not match attention seq_len {seq_len}",
                tokens.len()
            ),
        });
    }

    let data = attention.data();
    let head_size = seq_len * seq_len;

    let mut analysis = BTreeMap::new();
    let mut echoed = Vec::with_capacity(num_heads);
    for h in 0..num_heads {
        let head_attn = &data[h * head_size..(h + 1) * head_size];
        let stats = compute_head_stats(head_attn, seq_len)?;
        let patterns: Vec<String> = classify(&stats)
            .iter()
            .map(|p| p.describe(&stats))
            .collect();

        analysis.insert(
            h,
            HeadReport {
                head_idx: h,
                patterns,
                stats,
            },
        );

        echoed.push(
            head_attn
                .chunks(seq_len)
                .map(<[f32]>::to_vec)
                .collect::<Vec<_>>(),
        );
    }

    Ok(AnalysisReport {
        input_text: input_text.to_string(),
        tokens: tokens.to_vec(),
        attention_weights: echoed,
        analysis,
    })
}
