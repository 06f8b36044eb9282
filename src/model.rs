//! Attention-layer parameter model
//!
//! One attention layer's learned parameters, normalized into a single shape
//! regardless of whether the source model stores query/key/value as three
//! separate linear layers or as one fused QKV layer. All weight matrices
//! follow the `y = x @ W` convention: shape `[in, out]`, output along
//! columns.

use serde::{Deserialize, Serialize};

use crate::error::{Result, RevelarError};
use crate::tensor::Tensor;

/// Dimensional configuration of one attention layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerConfig {
    /// Embedding width `E`
    pub embed_dim: usize,
    /// Head count `H`
    pub num_heads: usize,
    /// Per-head dimension `D`
    pub head_dim: usize,
    /// Vocabulary size of the source model
    pub vocab_size: usize,
    /// Which layer these parameters came from
    pub layer_idx: usize,
}

impl LayerConfig {
    /// Validate the `E = H * D` invariant
    ///
    /// # Errors
    ///
    /// Returns `ShapeMismatch` if any dimension is zero or the factoring
    /// does not hold.
    pub fn validate(&self) -> Result<()> {
        if self.embed_dim == 0 || self.num_heads == 0 || self.head_dim == 0 {
            return Err(RevelarError::ShapeMismatch {
                reason: format!(
                    "embed_dim={}, num_heads={}, head_dim={} must all be > 0",
                    self.embed_dim, self.num_heads, self.head_dim
                ),
            });
        }

        if !self.embed_dim.is_multiple_of(self.head_dim)
            || self.num_heads * self.head_dim != self.embed_dim
        {
            return Err(RevelarError::ShapeMismatch {
                reason: format!(
                    "embed_dim {} must equal num_heads {} * head_dim {}",
                    self.embed_dim, self.num_heads, self.head_dim
                ),
            });
        }

        Ok(())
    }
}

/// Special-token identifiers carried through from the tokenizer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecialTokens {
    /// Classification token id ([CLS] for BERT-family models)
    pub cls_id: Option<u32>,
    /// Separator token id ([SEP])
    pub sep_id: Option<u32>,
    /// Padding token id ([PAD])
    pub pad_id: Option<u32>,
}

/// The learned parameters of one attention layer
///
/// Four `[E, E]` projection matrices and four length-`E` bias vectors. The
/// query/key/value matrices are column-partitioned into heads; the output
/// projection is row-partitioned; the output bias is shared across heads.
#[derive(Debug, Clone)]
pub struct AttentionLayerParams {
    /// Layer dimensions
    pub config: LayerConfig,
    /// Query projection `[E, E]`
    pub wq: Tensor,
    /// Key projection `[E, E]`
    pub wk: Tensor,
    /// Value projection `[E, E]`
    pub wv: Tensor,
    /// Output projection `[E, E]`
    pub wo: Tensor,
    /// Query bias `[E]`
    pub bq: Vec<f32>,
    /// Key bias `[E]`
    pub bk: Vec<f32>,
    /// Value bias `[E]`
    pub bv: Vec<f32>,
    /// Output bias `[E]`, added once after summing head contributions
    pub bo: Vec<f32>,
    /// Tokenizer special-token ids, if the provider supplied them
    pub special_tokens: Option<SpecialTokens>,
}

impl AttentionLayerParams {
    /// Assemble parameters from three separate Q/K/V projections
    ///
    /// # Errors
    ///
    /// Returns `ShapeMismatch` if the config invariant fails, any weight
    /// matrix is not `[E, E]`, or any bias is not length `E`.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: LayerConfig,
        wq: Tensor,
        wk: Tensor,
        wv: Tensor,
        wo: Tensor,
        bq: Vec<f32>,
        bk: Vec<f32>,
        bv: Vec<f32>,
        bo: Vec<f32>,
    ) -> Result<Self> {
        config.validate()?;

        let e = config.embed_dim;
        for (name, w) in [("Wq", &wq), ("Wk", &wk), ("Wv", &wv), ("Wo", &wo)] {
            if w.shape() != [e, e] {
                return Err(RevelarError::ShapeMismatch {
                    reason: format!("{name} must be [{e}, {e}], got {:?}", w.shape()),
                });
            }
        }

        for (name, b) in [("bq", &bq), ("bk", &bk), ("bv", &bv), ("bo", &bo)] {
            if b.len() != e {
                return Err(RevelarError::ShapeMismatch {
                    reason: format!("{name} must have length {e}, got {}", b.len()),
                });
            }
        }

        Ok(Self {
            config,
            wq,
            wk,
            wv,
            wo,
            bq,
            bk,
            bv,
            bo,
            special_tokens: None,
        })
    }

    /// Assemble parameters from a fused QKV projection
    ///
    /// Some model families store query/key/value as one `[E, 3E]` linear
    /// layer whose column blocks are `[Q | K | V]`, with a matching `[3E]`
    /// bias. This adapter splits the fused layer into the three separate
    /// matrices before the usual validation.
    ///
    /// # Errors
    ///
    /// Returns `ShapeMismatch` if `w_qkv` is not `[E, 3E]`, `b_qkv` is not
    /// length `3E`, or the assembled parameters fail validation.
    pub fn from_fused(
        config: LayerConfig,
        w_qkv: &Tensor,
        b_qkv: &[f32],
        wo: Tensor,
        bo: Vec<f32>,
    ) -> Result<Self> {
        config.validate()?;

        let e = config.embed_dim;
        if w_qkv.shape() != [e, 3 * e] {
            return Err(RevelarError::ShapeMismatch {
                reason: format!(
                    "fused QKV weight must be [{e}, {}], got {:?}",
                    3 * e,
                    w_qkv.shape()
                ),
            });
        }
        if b_qkv.len() != 3 * e {
            return Err(RevelarError::ShapeMismatch {
                reason: format!(
                    "fused QKV bias must have length {}, got {}",
                    3 * e,
                    b_qkv.len()
                ),
            });
        }

        // Column blocks: columns 0..E are Q, E..2E are K, 2E..3E are V.
        let data = w_qkv.data();
        let mut q = Vec::with_capacity(e * e);
        let mut k = Vec::with_capacity(e * e);
        let mut v = Vec::with_capacity(e * e);
        for row in 0..e {
            let base = row * 3 * e;
            q.extend_from_slice(&data[base..base + e]);
            k.extend_from_slice(&data[base + e..base + 2 * e]);
            v.extend_from_slice(&data[base + 2 * e..base + 3 * e]);
        }

        Self::new(
            config,
            Tensor::from_vec(vec![e, e], q)?,
            Tensor::from_vec(vec![e, e], k)?,
            Tensor::from_vec(vec![e, e], v)?,
            wo,
            b_qkv[..e].to_vec(),
            b_qkv[e..2 * e].to_vec(),
            b_qkv[2 * e..].to_vec(),
            bo,
        )
    }

    /// Attach tokenizer special-token ids
    #[must_use]
    pub fn with_special_tokens(mut self, tokens: SpecialTokens) -> Self {
        self.special_tokens = Some(tokens);
        self
    }
}
