//! Synthetic weight generators
//!
//! Deterministic per-head weight generation for reproducible fixtures and
//! instant-loading demo artifacts. The values are coherent-looking but
//! untrained; this is a smoke-testing aid for downstream consumers, not a
//! stand-in for correctness testing of the reshape or quantization paths.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::Result;
use crate::repack::artifact::CompactArtifact;
use crate::repack::quantize::DEMO_PRECISION;
use crate::repack::reshape::HeadProjection;
use crate::tensor::Tensor;

/// Default dimensions of the tiny demo artifact
pub const DEMO_EMBED_DIM: usize = 64;
/// Default head count of the tiny demo artifact
pub const DEMO_NUM_HEADS: usize = 4;
/// Default per-head dimension of the tiny demo artifact
pub const DEMO_HEAD_DIM: usize = 16;

/// Deterministic per-head weight generator
///
/// Weights draw uniformly from `[-s, s]` with a Xavier-style scale
/// `s = sqrt(2 / (fan_in + fan_out))`; all biases are zero. A fixed seed
/// produces identical output on every invocation.
///
/// # Example
///
/// ```
/// use revelar::testing::SyntheticHeadGenerator;
///
/// let gen = SyntheticHeadGenerator::new(42);
/// let a = gen.generate_heads(64, 4, 16).unwrap();
/// let b = gen.generate_heads(64, 4, 16).unwrap();
/// assert_eq!(a[0].wq.data(), b[0].wq.data());
/// ```
pub struct SyntheticHeadGenerator {
    seed: u64,
}

impl SyntheticHeadGenerator {
    /// Create a generator with a specific seed
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// Generate `num_heads` head projections for the given dimensions
    ///
    /// # Errors
    ///
    /// Returns `ShapeMismatch` if `embed_dim != num_heads * head_dim`.
    pub fn generate_heads(
        &self,
        embed_dim: usize,
        num_heads: usize,
        head_dim: usize,
    ) -> Result<Vec<HeadProjection>> {
        if num_heads * head_dim != embed_dim || embed_dim == 0 {
            return Err(crate::error::RevelarError::ShapeMismatch {
                reason: format!(
                    "embed_dim {embed_dim} must equal num_heads {num_heads} * head_dim {head_dim}"
                ),
            });
        }

        let mut rng = StdRng::seed_from_u64(self.seed);

        let scale_qkv = (2.0 / (embed_dim + head_dim) as f32).sqrt();
        let scale_o = (2.0 / (head_dim + embed_dim) as f32).sqrt();

        let mut heads = Vec::with_capacity(num_heads);
        for _ in 0..num_heads {
            let mut matrix = |rows: usize, cols: usize, scale: f32| -> Result<Tensor> {
                let data: Vec<f32> = (0..rows * cols)
                    .map(|_| rng.gen_range(-scale..scale))
                    .collect();
                Tensor::from_vec(vec![rows, cols], data)
            };

            heads.push(HeadProjection {
                wq: matrix(embed_dim, head_dim, scale_qkv)?,
                wk: matrix(embed_dim, head_dim, scale_qkv)?,
                wv: matrix(embed_dim, head_dim, scale_qkv)?,
                bq: vec![0.0; head_dim],
                bk: vec![0.0; head_dim],
                bv: vec![0.0; head_dim],
                wo: matrix(head_dim, embed_dim, scale_o)?,
            });
        }

        Ok(heads)
    }

    /// Build the tiny demo artifact (64-wide, 4 heads of 16)
    ///
    /// Small enough for instant loading; does not show real model
    /// behavior.
    ///
    /// # Errors
    ///
    /// Propagates artifact-assembly errors, which cannot occur for the
    /// fixed demo dimensions.
    pub fn demo_artifact(&self) -> Result<CompactArtifact> {
        let heads = self.generate_heads(DEMO_EMBED_DIM, DEMO_NUM_HEADS, DEMO_HEAD_DIM)?;
        let bo = vec![0.0; DEMO_EMBED_DIM];
        CompactArtifact::from_heads(
            "demo-tiny",
            "demo",
            &heads,
            &bo,
            DEMO_NUM_HEADS,
            DEMO_PRECISION,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deterministic_for_fixed_seed() {
        let gen = SyntheticHeadGenerator::new(42);
        let a = gen.generate_heads(16, 2, 8).unwrap();
        let b = gen.generate_heads(16, 2, 8).unwrap();

        for (ha, hb) in a.iter().zip(&b) {
            assert_eq!(ha.wq.data(), hb.wq.data());
            assert_eq!(ha.wo.data(), hb.wo.data());
        }
    }

    #[test]
    fn test_different_seeds_differ() {
        let a = SyntheticHeadGenerator::new(1).generate_heads(16, 2, 8).unwrap();
        let b = SyntheticHeadGenerator::new(2).generate_heads(16, 2, 8).unwrap();
        assert_ne!(a[0].wq.data(), b[0].wq.data());
    }

    #[test]
    fn test_shapes_and_zero_biases() {
        let heads = SyntheticHeadGenerator::new(0).generate_heads(64, 4, 16).unwrap();

        assert_eq!(heads.len(), 4);
        for head in &heads {
            assert_eq!(head.wq.shape(), &[64, 16]);
            assert_eq!(head.wo.shape(), &[16, 64]);
            assert!(head.bq.iter().all(|&b| b == 0.0));
            assert!(head.bk.iter().all(|&b| b == 0.0));
            assert!(head.bv.iter().all(|&b| b == 0.0));
        }
    }

    #[test]
    fn test_values_within_xavier_scale() {
        let heads = SyntheticHeadGenerator::new(7).generate_heads(64, 4, 16).unwrap();
        let scale = (2.0f32 / (64 + 16) as f32).sqrt();

        for head in &heads {
            assert!(head.wq.data().iter().all(|v| v.abs() <= scale));
            assert!(head.wo.data().iter().all(|v| v.abs() <= scale));
        }
    }

    #[test]
    fn test_rejects_bad_factoring() {
        let result = SyntheticHeadGenerator::new(0).generate_heads(60, 4, 16);
        assert!(result.is_err());
    }

    #[test]
    fn test_demo_artifact_shape() {
        let artifact = SyntheticHeadGenerator::new(42).demo_artifact().unwrap();

        assert_eq!(artifact.model_name, "demo-tiny");
        assert_eq!(artifact.model_type, "demo");
        assert_eq!(artifact.config.embed_dim, 64);
        assert_eq!(artifact.config.num_heads, 4);
        assert_eq!(artifact.config.head_dim, 16);
        assert_eq!(artifact.heads.len(), 4);
        assert!(artifact.bo.iter().all(|&b| b == 0.0));
    }

    #[test]
    fn test_demo_artifact_reproducible_bytes() {
        let a = SyntheticHeadGenerator::new(42).demo_artifact().unwrap();
        let b = SyntheticHeadGenerator::new(42).demo_artifact().unwrap();
        assert_eq!(a.to_json().unwrap(), b.to_json().unwrap());
    }
}
