//! Per-head attention statistics
//!
//! Five scalar statistics computed from one head's `[S, S]` row-stochastic
//! attention matrix, plus a normalized entropy. Accumulation happens in
//! f64; the input matrix is never mutated.

use serde::{Deserialize, Serialize};

use crate::error::{Result, RevelarError};

/// Stabilizer added inside the logarithm so zero probabilities stay finite
pub const ENTROPY_EPSILON: f64 = 1e-10;

/// Scalar statistics of one attention head
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeadStats {
    /// Mean probability mass on key position 0, over all query positions
    pub cls_attention: f64,
    /// Mean probability mass on the last key position
    pub sep_attention: f64,
    /// Mean of the matrix diagonal
    pub self_attention: f64,
    /// Mean mass on key `i-1` for queries `i = 1..S-1`
    pub prev_token_attention: f64,
    /// Mean mass on key `i+1` for queries `i = 0..S-2`
    pub next_token_attention: f64,
    /// Mean row entropy divided by `ln(S)`, the uniform-distribution maximum
    pub entropy_ratio: f64,
}

/// Compute the five statistics for one head
///
/// `head_attn` is the head's `[S, S]` matrix flattened row-major; row `i`
/// is query position `i`'s distribution over key positions.
///
/// # Errors
///
/// - `ShapeMismatch` if `head_attn.len() != seq_len * seq_len`
/// - `DegenerateSequence` if `seq_len < 2`; the previous/next-token means
///   would be averages over an empty or meaningless index range
/// - `InvalidInput` if any probability is non-finite
pub fn compute_head_stats(head_attn: &[f32], seq_len: usize) -> Result<HeadStats> {
    if seq_len < 2 {
        return Err(RevelarError::DegenerateSequence { seq_len });
    }

    if head_attn.len() != seq_len * seq_len {
        return Err(RevelarError::ShapeMismatch {
            reason: format!(
                "attention matrix has {} values, expected {} for seq_len {}",
                head_attn.len(),
                seq_len * seq_len,
                seq_len
            ),
        });
    }

    if let Some((i, &v)) = head_attn.iter().enumerate().find(|(_, v)| !v.is_finite()) {
        return Err(RevelarError::InvalidInput {
            reason: format!("non-finite probability {v} at index {i}"),
        });
    }

    let s = seq_len;
    let at = |i: usize, j: usize| f64::from(head_attn[i * s + j]);

    let mut cls = 0.0;
    let mut sep = 0.0;
    let mut diag = 0.0;
    let mut entropy = 0.0;
    for i in 0..s {
        cls += at(i, 0);
        sep += at(i, s - 1);
        diag += at(i, i);

        let mut row_entropy = 0.0;
        for j in 0..s {
            let p = at(i, j);
            row_entropy -= p * (p + ENTROPY_EPSILON).ln();
        }
        entropy += row_entropy;
    }

    let mut prev = 0.0;
    for i in 1..s {
        prev += at(i, i - 1);
    }

    let mut next = 0.0;
    for i in 0..s - 1 {
        next += at(i, i + 1);
    }

    let n = s as f64;
    // The epsilon term can nudge a one-hot row's entropy slightly below
    // zero; floor the mean so the ratio honors its [0, 1] range.
    let mean_entropy = (entropy / n).max(0.0);

    Ok(HeadStats {
        cls_attention: cls / n,
        sep_attention: sep / n,
        self_attention: diag / n,
        prev_token_attention: prev / (n - 1.0),
        next_token_attention: next / (n - 1.0),
        entropy_ratio: mean_entropy / n.ln(),
    })
}
