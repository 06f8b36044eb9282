//! Head-partitioning reshaper
//!
//! Splits a combined `[E, E]` projection matrix (or `[E]` bias) into `H`
//! per-head tensors. The split is pure index arithmetic; reconstructing the
//! original matrix from the parts reproduces it exactly.
//!
//! Axis choice follows the `y = x @ W` convention:
//!
//! - Query/key/value weights partition along **columns**. A projection's
//!   output columns are independent of one another, so slicing columns is
//!   equivalent to computing each head's projection separately.
//! - The output projection partitions along **rows**. It consumes the
//!   concatenation of all heads' value-weighted outputs, and row block
//!   `h*D..(h+1)*D` is exactly the sub-matrix multiplying head `h`'s
//!   contribution before the sum `output = sum_h (head_h @ Wo_h) + bo`.
//! - The output bias is never partitioned; it is added once, after the sum
//!   over heads.

use crate::error::{Result, RevelarError};
use crate::model::AttentionLayerParams;
use crate::tensor::Tensor;

/// One head's slice of an attention layer
///
/// Query/key/value projections of shape `[E, D]` with length-`D` biases,
/// and the `[D, E]` output-projection block. The shared output bias lives
/// outside this struct.
#[derive(Debug, Clone, PartialEq)]
pub struct HeadProjection {
    /// Query projection `[E, D]`
    pub wq: Tensor,
    /// Key projection `[E, D]`
    pub wk: Tensor,
    /// Value projection `[E, D]`
    pub wv: Tensor,
    /// Query bias `[D]`
    pub bq: Vec<f32>,
    /// Key bias `[D]`
    pub bk: Vec<f32>,
    /// Value bias `[D]`
    pub bv: Vec<f32>,
    /// Output-projection block `[D, E]`
    pub wo: Tensor,
}

/// Check the declared dimensions against a combined matrix
fn validate_split(
    w: &Tensor,
    embed_dim: usize,
    num_heads: usize,
    head_dim: usize,
) -> Result<()> {
    if head_dim == 0 || !embed_dim.is_multiple_of(head_dim) || num_heads * head_dim != embed_dim {
        return Err(RevelarError::ShapeMismatch {
            reason: format!(
                "embed_dim {embed_dim} is not num_heads {num_heads} * head_dim {head_dim}"
            ),
        });
    }

    if w.shape() != [embed_dim, embed_dim] {
        return Err(RevelarError::ShapeMismatch {
            reason: format!(
                "expected [{embed_dim}, {embed_dim}] matrix, got {:?}",
                w.shape()
            ),
        });
    }

    Ok(())
}

/// Partition a `[E, E]` query/key/value weight into `H` column blocks
///
/// Head `h` receives columns `h*D..(h+1)*D`, producing a `[E, D]` tensor.
///
/// # Errors
///
/// Returns `ShapeMismatch` if `E != H * D` or the matrix is not `[E, E]`.
pub fn split_columns(
    w: &Tensor,
    embed_dim: usize,
    num_heads: usize,
    head_dim: usize,
) -> Result<Vec<Tensor>> {
    validate_split(w, embed_dim, num_heads, head_dim)?;

    let data = w.data();
    let mut heads = Vec::with_capacity(num_heads);
    for h in 0..num_heads {
        let offset = h * head_dim;
        let mut block = Vec::with_capacity(embed_dim * head_dim);
        for row in 0..embed_dim {
            let start = row * embed_dim + offset;
            block.extend_from_slice(&data[start..start + head_dim]);
        }
        heads.push(Tensor::from_vec(vec![embed_dim, head_dim], block)?);
    }

    Ok(heads)
}

/// Partition a `[E, E]` output-projection weight into `H` row blocks
///
/// Head `h` receives rows `h*D..(h+1)*D`, producing a `[D, E]` tensor.
/// Row blocks are contiguous in row-major storage, so each block is a
/// straight slice copy.
///
/// # Errors
///
/// Returns `ShapeMismatch` if `E != H * D` or the matrix is not `[E, E]`.
pub fn split_rows(
    w: &Tensor,
    embed_dim: usize,
    num_heads: usize,
    head_dim: usize,
) -> Result<Vec<Tensor>> {
    validate_split(w, embed_dim, num_heads, head_dim)?;

    let data = w.data();
    let block_len = head_dim * embed_dim;
    let mut heads = Vec::with_capacity(num_heads);
    for h in 0..num_heads {
        let start = h * block_len;
        heads.push(Tensor::from_vec(
            vec![head_dim, embed_dim],
            data[start..start + block_len].to_vec(),
        )?);
    }

    Ok(heads)
}

/// Partition a length-`E` query/key/value bias into `H` chunks of length `D`
///
/// # Errors
///
/// Returns `ShapeMismatch` if `E != H * D` or the bias length differs from
/// the declared `E`.
pub fn split_bias(
    b: &[f32],
    embed_dim: usize,
    num_heads: usize,
    head_dim: usize,
) -> Result<Vec<Vec<f32>>> {
    if head_dim == 0 || !embed_dim.is_multiple_of(head_dim) || num_heads * head_dim != embed_dim {
        return Err(RevelarError::ShapeMismatch {
            reason: format!(
                "embed_dim {embed_dim} is not num_heads {num_heads} * head_dim {head_dim}"
            ),
        });
    }

    if b.len() != embed_dim {
        return Err(RevelarError::ShapeMismatch {
            reason: format!("expected bias of length {embed_dim}, got {}", b.len()),
        });
    }

    Ok(b.chunks(head_dim).map(<[f32]>::to_vec).collect())
}

/// Partition a full attention layer into its `H` head projections
///
/// The shared output bias is deliberately absent from the result; callers
/// carry `params.bo` alongside the heads.
///
/// # Errors
///
/// Returns `ShapeMismatch` if any tensor disagrees with the layer config.
pub fn partition_heads(params: &AttentionLayerParams) -> Result<Vec<HeadProjection>> {
    let e = params.config.embed_dim;
    let h = params.config.num_heads;
    let d = params.config.head_dim;

    let wq = split_columns(&params.wq, e, h, d)?;
    let wk = split_columns(&params.wk, e, h, d)?;
    let wv = split_columns(&params.wv, e, h, d)?;
    let wo = split_rows(&params.wo, e, h, d)?;
    let bq = split_bias(&params.bq, e, h, d)?;
    let bk = split_bias(&params.bk, e, h, d)?;
    let bv = split_bias(&params.bv, e, h, d)?;

    let mut heads = Vec::with_capacity(h);
    for (((((wq, wk), wv), wo), bq), (bk, bv)) in wq
        .into_iter()
        .zip(wk)
        .zip(wv)
        .zip(wo)
        .zip(bq)
        .zip(bk.into_iter().zip(bv))
    {
        heads.push(HeadProjection {
            wq,
            wk,
            wv,
            bq,
            bk,
            bv,
            wo,
        });
    }

    Ok(heads)
}
