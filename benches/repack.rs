//! Benchmark suite for the repackaging and analysis hot paths
//!
//! Measures head partitioning and artifact assembly at DistilBERT-like
//! dimensions (768 wide, 12 heads of 64) and per-head statistics over a
//! typical short sequence.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use revelar::analyze::analyze_attention;
use revelar::model::{AttentionLayerParams, LayerConfig};
use revelar::repack::{partition_heads, CompactArtifact};
use revelar::Tensor;

fn distilbert_like_params() -> AttentionLayerParams {
    let e = 768;
    let config = LayerConfig {
        embed_dim: e,
        num_heads: 12,
        head_dim: 64,
        vocab_size: 30522,
        layer_idx: 0,
    };
    let w = |phase: f32| {
        let data: Vec<f32> = (0..e * e)
            .map(|i| ((i as f32 + phase) * 0.001).sin() * 0.02)
            .collect();
        Tensor::from_vec(vec![e, e], data).unwrap()
    };
    let b = || vec![0.01; e];
    AttentionLayerParams::new(config, w(0.0), w(1.0), w(2.0), w(3.0), b(), b(), b(), b())
        .unwrap()
}

fn bench_partition_heads(c: &mut Criterion) {
    let params = distilbert_like_params();
    c.bench_function("partition_heads_768x12", |b| {
        b.iter(|| partition_heads(black_box(&params)).unwrap());
    });
}

fn bench_build_artifact(c: &mut Criterion) {
    let params = distilbert_like_params();
    c.bench_function("build_artifact_4head_p3", |b| {
        b.iter(|| CompactArtifact::build(black_box(&params), "bench", "bert", 4, 3).unwrap());
    });
}

fn bench_analyze(c: &mut Criterion) {
    let s = 16;
    let attention =
        Tensor::from_vec(vec![12, s, s], vec![1.0 / s as f32; 12 * s * s]).unwrap();
    let tokens: Vec<String> = (0..s).map(|i| format!("tok{i}")).collect();

    c.bench_function("analyze_12head_16tok", |b| {
        b.iter(|| analyze_attention(black_box(&attention), &tokens, "bench").unwrap());
    });
}

criterion_group!(
    benches,
    bench_partition_heads,
    bench_build_artifact,
    bench_analyze
);
criterion_main!(benches);
