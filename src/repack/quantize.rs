//! Head-subset selection and decimal quantization
//!
//! Reduces an `H`-head projection set to the first `H_kept` heads and
//! rounds every numeric value to a fixed number of decimal digits.
//!
//! The selection policy is "first `H_kept` heads in index order". This is a
//! deterministic simplification, not a ranking: no claim is made that the
//! leading heads are the most informative ones.
//!
//! Rounding uses **half away from zero** (`f64::round` semantics),
//! computed in f64 to avoid double-rounding artifacts from the f32
//! intermediate. Downstream consumers compare rounded values bit-for-bit,
//! so the tie-breaking rule is part of the output contract and is covered
//! by tests at exactly representable tie points.

use crate::error::{Result, RevelarError};
use crate::repack::reshape::HeadProjection;
use crate::tensor::Tensor;

/// Decimal digits for the compact artifact tier
pub const COMPACT_PRECISION: u32 = 3;

/// Decimal digits for the synthetic demo tier
pub const DEMO_PRECISION: u32 = 4;

/// Round a value to `digits` decimal places, half away from zero
///
/// # Examples
///
/// ```
/// use revelar::repack::round_to;
///
/// assert_eq!(round_to(0.123_456, 3), 0.123);
/// assert_eq!(round_to(1.25, 1), 1.3);
/// assert_eq!(round_to(-1.25, 1), -1.3);
/// ```
#[must_use]
pub fn round_to(value: f32, digits: u32) -> f32 {
    let factor = 10f64.powi(digits as i32);
    ((f64::from(value) * factor).round() / factor) as f32
}

/// Round a slice of values, rejecting non-finite input
///
/// # Errors
///
/// Returns `InvalidInput` if any value is NaN or infinite; such values
/// indicate upstream model corruption and must not reach an artifact.
pub fn quantize_values(values: &[f32], digits: u32) -> Result<Vec<f32>> {
    for (i, &v) in values.iter().enumerate() {
        if !v.is_finite() {
            return Err(RevelarError::InvalidInput {
                reason: format!("non-finite value {v} at index {i}"),
            });
        }
    }

    Ok(values.iter().map(|&v| round_to(v, digits)).collect())
}

/// Round a tensor's values, preserving its shape
fn quantize_tensor(t: &Tensor, digits: u32) -> Result<Tensor> {
    Tensor::from_vec(t.shape().to_vec(), quantize_values(t.data(), digits)?)
}

/// Quantize every tensor and bias of one head projection
///
/// # Errors
///
/// Returns `InvalidInput` if any value is non-finite.
pub fn quantize_head(head: &HeadProjection, digits: u32) -> Result<HeadProjection> {
    Ok(HeadProjection {
        wq: quantize_tensor(&head.wq, digits)?,
        wk: quantize_tensor(&head.wk, digits)?,
        wv: quantize_tensor(&head.wv, digits)?,
        bq: quantize_values(&head.bq, digits)?,
        bk: quantize_values(&head.bk, digits)?,
        bv: quantize_values(&head.bv, digits)?,
        wo: quantize_tensor(&head.wo, digits)?,
    })
}

/// Keep the first `keep` heads in index order
///
/// # Errors
///
/// Returns `InvalidHeadCount` if `keep` is zero or exceeds the available
/// head count. Rejected before any computation; no partial output.
pub fn select_heads(mut heads: Vec<HeadProjection>, keep: usize) -> Result<Vec<HeadProjection>> {
    if keep == 0 || keep > heads.len() {
        return Err(RevelarError::InvalidHeadCount {
            requested: keep,
            available: heads.len(),
        });
    }

    heads.truncate(keep);
    Ok(heads)
}
