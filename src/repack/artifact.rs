//! Compact artifact assembly and serialization
//!
//! The artifact is the document a lightweight consumer loads: model
//! identity, the kept-head configuration, per-head weight blocks, and the
//! shared output bias. Construction quantizes on the way in; the document
//! is immutable afterwards.
//!
//! Serialization is compact JSON (no extraneous whitespace) with a gzip
//! sibling for delivery. At a fixed precision the bytes are reproducible
//! run over run, which downstream regression tests rely on.

use std::io::Write;

use flate2::write::GzEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::AttentionLayerParams;
use crate::repack::quantize::{quantize_head, quantize_values, select_heads};
use crate::repack::reshape::{partition_heads, HeadProjection};

/// Kept-head configuration of a compact artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactConfig {
    /// Embedding width `E`
    pub embed_dim: usize,
    /// Number of heads present in the artifact
    pub num_heads: usize,
    /// Per-head dimension `D`
    pub head_dim: usize,
    /// Head count of the source layer before selection
    pub original_num_heads: usize,
}

/// One head's weight block as it appears in the artifact
///
/// Matrices serialize as nested row arrays so consumers can index them
/// without knowing this crate's tensor layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeadWeights {
    /// Query projection `[E, D]`
    #[serde(rename = "Wq")]
    pub wq: Vec<Vec<f32>>,
    /// Key projection `[E, D]`
    #[serde(rename = "Wk")]
    pub wk: Vec<Vec<f32>>,
    /// Value projection `[E, D]`
    #[serde(rename = "Wv")]
    pub wv: Vec<Vec<f32>>,
    /// Query bias `[D]`
    pub bq: Vec<f32>,
    /// Key bias `[D]`
    pub bk: Vec<f32>,
    /// Value bias `[D]`
    pub bv: Vec<f32>,
    /// Output-projection block `[D, E]`
    #[serde(rename = "Wo")]
    pub wo: Vec<Vec<f32>>,
}

impl HeadWeights {
    fn from_projection(head: &HeadProjection) -> Result<Self> {
        Ok(Self {
            wq: head.wq.to_rows()?,
            wk: head.wk.to_rows()?,
            wv: head.wv.to_rows()?,
            bq: head.bq.clone(),
            bk: head.bk.clone(),
            bv: head.bv.clone(),
            wo: head.wo.to_rows()?,
        })
    }
}

/// Compact, precision-reduced per-head representation of one attention layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompactArtifact {
    /// Source model name (e.g. `distilbert-base-uncased`)
    pub model_name: String,
    /// Architecture tag (e.g. `distilbert`, `bert`, `demo`)
    pub model_type: String,
    /// Kept-head configuration
    pub config: ArtifactConfig,
    /// Per-head weight blocks, in original head order
    pub heads: Vec<HeadWeights>,
    /// Shared output bias `[E]`, applied once after summing heads
    pub bo: Vec<f32>,
}

impl CompactArtifact {
    /// Build an artifact from a full attention layer
    ///
    /// Partitions the layer into heads, keeps the first `keep` heads, and
    /// rounds every value to `precision` decimal digits.
    ///
    /// # Errors
    ///
    /// Returns `ShapeMismatch` if the layer fails partitioning,
    /// `InvalidHeadCount` for a bad `keep`, or `InvalidInput` for
    /// non-finite weights.
    pub fn build(
        params: &AttentionLayerParams,
        model_name: &str,
        model_type: &str,
        keep: usize,
        precision: u32,
    ) -> Result<Self> {
        let heads = select_heads(partition_heads(params)?, keep)?;
        Self::from_heads(
            model_name,
            model_type,
            &heads,
            &params.bo,
            params.config.num_heads,
            precision,
        )
    }

    /// Build an artifact from already-partitioned heads
    ///
    /// Used by the synthetic generator, where no combined layer exists.
    ///
    /// # Errors
    ///
    /// Returns `InvalidHeadCount` if `heads` is empty, `ShapeMismatch` if
    /// head shapes disagree, or `InvalidInput` for non-finite values.
    pub fn from_heads(
        model_name: &str,
        model_type: &str,
        heads: &[HeadProjection],
        bo: &[f32],
        original_num_heads: usize,
        precision: u32,
    ) -> Result<Self> {
        if heads.is_empty() {
            return Err(crate::error::RevelarError::InvalidHeadCount {
                requested: 0,
                available: original_num_heads,
            });
        }

        let embed_dim = heads[0].wq.shape()[0];
        let head_dim = heads[0].wq.shape()[1];

        let mut blocks = Vec::with_capacity(heads.len());
        for head in heads {
            blocks.push(HeadWeights::from_projection(&quantize_head(head, precision)?)?);
        }

        Ok(Self {
            model_name: model_name.to_string(),
            model_type: model_type.to_string(),
            config: ArtifactConfig {
                embed_dim,
                num_heads: heads.len(),
                head_dim,
                original_num_heads,
            },
            heads: blocks,
            bo: quantize_values(bo, precision)?,
        })
    }

    /// Serialize to compact JSON (no extraneous whitespace)
    ///
    /// # Errors
    ///
    /// Returns `Serialize` on a JSON encoding failure.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Serialize to gzip-compressed compact JSON
    ///
    /// # Errors
    ///
    /// Returns `Serialize` on encoding failure or `Io` on a compression
    /// failure.
    pub fn to_gzip(&self) -> Result<Vec<u8>> {
        let json = self.to_json()?;
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(json.as_bytes())?;
        Ok(encoder.finish()?)
    }
}
