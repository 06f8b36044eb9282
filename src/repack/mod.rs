//! Weight repackaging pipeline
//!
//! Converts one attention layer's combined projection matrices into a
//! compact, precision-reduced per-head artifact:
//!
//! 1. [`reshape`] partitions the `[E, E]` projections into per-head
//!    tensors without changing the computation they represent.
//! 2. [`quantize`] keeps the first `H_kept` heads and rounds every value
//!    to a fixed decimal precision.
//! 3. [`artifact`] assembles the serializable document.
//!
//! ## Example
//!
//! ```
//! use revelar::model::{AttentionLayerParams, LayerConfig};
//! use revelar::repack::artifact::CompactArtifact;
//! use revelar::Tensor;
//!
//! let e = 8;
//! let config = LayerConfig {
//!     embed_dim: e,
//!     num_heads: 2,
//!     head_dim: 4,
//!     vocab_size: 100,
//!     layer_idx: 0,
//! };
//! let w = || Tensor::from_vec(vec![e, e], vec![0.125; e * e]).unwrap();
//! let b = || vec![0.0; e];
//! let params =
//!     AttentionLayerParams::new(config, w(), w(), w(), w(), b(), b(), b(), b()).unwrap();
//!
//! let artifact = CompactArtifact::build(&params, "demo", "demo", 2, 3).unwrap();
//! assert_eq!(artifact.heads.len(), 2);
//! assert_eq!(artifact.config.original_num_heads, 2);
//! ```

pub mod artifact;
pub mod quantize;
pub mod reshape;

pub use artifact::{ArtifactConfig, CompactArtifact, HeadWeights};
pub use quantize::{quantize_head, quantize_values, round_to, select_heads};
pub use reshape::{partition_heads, split_bias, split_columns, split_rows, HeadProjection};
