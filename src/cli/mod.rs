//! CLI command implementations (extracted for testability)
//!
//! Thin glue around the two pipelines: parse an input document, run the
//! transform, hand results to the storage collaborator, print a summary.
//! The document shapes mirror what the extraction step emits.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::analyze::{analyze_attention, AnalysisReport};
use crate::error::{Result, RevelarError};
use crate::model::{AttentionLayerParams, LayerConfig, SpecialTokens};
use crate::repack::artifact::CompactArtifact;
use crate::storage::{ArtifactStore, DirectoryStore};
use crate::tensor::Tensor;
use crate::testing::SyntheticHeadGenerator;

/// Weights document produced by the extraction step
///
/// The `attention` block carries one layer's combined projections; the
/// optional `tokenizer_config` carries special-token ids.
#[derive(Debug, Deserialize)]
pub struct WeightsDocument {
    /// Source model name
    pub model_name: String,
    /// Architecture tag
    pub model_type: String,
    /// Layer dimensions
    pub config: LayerConfigDoc,
    /// Combined projection matrices and biases
    pub attention: AttentionWeightsDoc,
    /// Tokenizer special-token ids, if present
    #[serde(default)]
    pub tokenizer_config: Option<TokenizerConfigDoc>,
}

/// Layer dimensions as serialized by the extraction step
#[derive(Debug, Deserialize)]
pub struct LayerConfigDoc {
    /// Embedding width `E`
    pub embed_dim: usize,
    /// Head count `H`
    pub num_heads: usize,
    /// Per-head dimension `D`
    pub head_dim: usize,
    /// Vocabulary size
    #[serde(default)]
    pub vocab_size: usize,
    /// Source layer index
    #[serde(default)]
    pub layer_idx: usize,
}

/// Combined projection block of a weights document
#[derive(Debug, Deserialize)]
pub struct AttentionWeightsDoc {
    /// Query projection `[E, E]`
    #[serde(rename = "Wq")]
    pub wq: Vec<Vec<f32>>,
    /// Key projection `[E, E]`
    #[serde(rename = "Wk")]
    pub wk: Vec<Vec<f32>>,
    /// Value projection `[E, E]`
    #[serde(rename = "Wv")]
    pub wv: Vec<Vec<f32>>,
    /// Output projection `[E, E]`
    #[serde(rename = "Wo")]
    pub wo: Vec<Vec<f32>>,
    /// Query bias `[E]`
    pub bq: Vec<f32>,
    /// Key bias `[E]`
    pub bk: Vec<f32>,
    /// Value bias `[E]`
    pub bv: Vec<f32>,
    /// Output bias `[E]`
    pub bo: Vec<f32>,
}

/// Tokenizer ids as serialized by the extraction step
#[derive(Debug, Deserialize)]
pub struct TokenizerConfigDoc {
    /// Classification token id
    #[serde(default)]
    pub cls_token_id: Option<u32>,
    /// Separator token id
    #[serde(default)]
    pub sep_token_id: Option<u32>,
    /// Padding token id
    #[serde(default)]
    pub pad_token_id: Option<u32>,
}

impl WeightsDocument {
    /// Load and parse a weights document from disk
    ///
    /// # Errors
    ///
    /// Returns `Io` if the file cannot be read or `Serialize` if it is not
    /// a valid weights document.
    pub fn from_path(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Convert the document into validated layer parameters
    ///
    /// # Errors
    ///
    /// Returns `ShapeMismatch` if the matrices disagree with the declared
    /// config.
    pub fn to_params(&self) -> Result<AttentionLayerParams> {
        let config = LayerConfig {
            embed_dim: self.config.embed_dim,
            num_heads: self.config.num_heads,
            head_dim: self.config.head_dim,
            vocab_size: self.config.vocab_size,
            layer_idx: self.config.layer_idx,
        };

        let params = AttentionLayerParams::new(
            config,
            Tensor::from_rows(&self.attention.wq)?,
            Tensor::from_rows(&self.attention.wk)?,
            Tensor::from_rows(&self.attention.wv)?,
            Tensor::from_rows(&self.attention.wo)?,
            self.attention.bq.clone(),
            self.attention.bk.clone(),
            self.attention.bv.clone(),
            self.attention.bo.clone(),
        )?;

        Ok(match &self.tokenizer_config {
            Some(tok) => params.with_special_tokens(SpecialTokens {
                cls_id: tok.cls_token_id,
                sep_id: tok.sep_token_id,
                pad_id: tok.pad_token_id,
            }),
            None => params,
        })
    }
}

/// Attention dump produced by a model run with attention outputs enabled
#[derive(Debug, Deserialize)]
pub struct AttentionDump {
    /// The text the model was run on
    #[serde(default)]
    pub input_text: String,
    /// Token strings, length `S`
    pub tokens: Vec<String>,
    /// `[H][S][S]` attention probabilities
    pub attention_weights: Vec<Vec<Vec<f32>>>,
}

impl AttentionDump {
    /// Load and parse an attention dump from disk
    ///
    /// # Errors
    ///
    /// Returns `Io` if the file cannot be read or `Serialize` if it is not
    /// a valid dump.
    pub fn from_path(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Flatten the nested tensor into a `[H, S, S]` tensor
    ///
    /// # Errors
    ///
    /// Returns `ShapeMismatch` if the nesting is ragged or empty.
    pub fn to_tensor(&self) -> Result<Tensor> {
        let h = self.attention_weights.len();
        if h == 0 {
            return Err(RevelarError::ShapeMismatch {
                reason: "attention dump has no heads".to_string(),
            });
        }

        let s = self.attention_weights[0].len();
        let mut data = Vec::with_capacity(h * s * s);
        for (hi, head) in self.attention_weights.iter().enumerate() {
            if head.len() != s {
                return Err(RevelarError::ShapeMismatch {
                    reason: format!("head {hi} has {} rows, expected {s}", head.len()),
                });
            }
            for (ri, row) in head.iter().enumerate() {
                if row.len() != s {
                    return Err(RevelarError::ShapeMismatch {
                        reason: format!(
                            "head {hi} row {ri} has {} values, expected {s}",
                            row.len()
                        ),
                    });
                }
                data.extend_from_slice(row);
            }
        }

        Tensor::from_vec(vec![h, s, s], data)
    }
}

/// Repackage a weights document into compact per-head artifacts
///
/// Writes one artifact per entry in `tiers` (e.g. `[4, 2, 1]`), named
/// `<model_type>-<N>head`, into `out_dir`.
///
/// # Errors
///
/// Propagates parse, transform, and storage errors.
pub fn run_repack(
    input: &Path,
    out_dir: &Path,
    tiers: &[usize],
    precision: u32,
) -> Result<Vec<PathBuf>> {
    let doc = WeightsDocument::from_path(input)?;
    let params = doc.to_params()?;

    let store = DirectoryStore::new(out_dir);
    let mut written = Vec::with_capacity(tiers.len());
    for &keep in tiers {
        let artifact =
            CompactArtifact::build(&params, &doc.model_name, &doc.model_type, keep, precision)?;
        let name = format!("{}-{keep}head", doc.model_type);
        let path = store.write(&name, &artifact)?;
        println!(
            "Saved {} ({} of {} heads, {} decimal digits)",
            path.display(),
            keep,
            params.config.num_heads,
            precision
        );
        written.push(path);
    }

    Ok(written)
}

/// Write the deterministic tiny demo artifact
///
/// # Errors
///
/// Propagates storage errors.
pub fn run_demo(out_dir: &Path, seed: u64) -> Result<PathBuf> {
    let artifact = SyntheticHeadGenerator::new(seed).demo_artifact()?;
    let store = DirectoryStore::new(out_dir);
    let path = store.write("demo-tiny-weights", &artifact)?;
    println!("Saved {} (seed {seed})", path.display());
    Ok(path)
}

/// Analyze an attention dump and print per-head patterns
///
/// Writes the full report as JSON to `output` when given. With
/// `show_matrices`, also prints the first four heads' matrices.
///
/// # Errors
///
/// Propagates parse, analysis, and write errors.
pub fn run_analyze(
    input: &Path,
    output: Option<&Path>,
    show_matrices: bool,
) -> Result<AnalysisReport> {
    let dump = AttentionDump::from_path(input)?;
    let attention = dump.to_tensor()?;
    let report = analyze_attention(&attention, &dump.tokens, &dump.input_text)?;

    for (idx, head) in &report.analysis {
        println!("head_{idx}:");
        if head.patterns.is_empty() {
            println!("  No strong patterns detected");
        } else {
            for pattern in &head.patterns {
                println!("  {pattern}");
            }
        }
    }

    if show_matrices {
        for (idx, _head) in report.analysis.iter().take(4) {
            println!();
            print!(
                "{}",
                format_attention_matrix(&report.attention_weights[*idx], &report.tokens, *idx)
            );
        }
    }

    if let Some(path) = output {
        fs::write(path, report.to_json()?)?;
        println!("Report saved to {}", path.display());
    }

    Ok(report)
}

/// Render one head's attention matrix as an aligned text table
#[must_use]
pub fn format_attention_matrix(matrix: &[Vec<f32>], tokens: &[String], head_idx: usize) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Head {head_idx} attention matrix");

    let short = |t: &str, n: usize| t.chars().take(n).collect::<String>();

    let mut header = String::from("         ");
    for token in tokens {
        let _ = write!(header, "{:>7} ", short(token, 6));
    }
    let _ = writeln!(out, "{}", header.trim_end());

    for (i, token) in tokens.iter().enumerate() {
        let mut line = String::new();
        let _ = write!(line, "{:>8} ", short(token, 8));
        for value in &matrix[i] {
            let _ = write!(line, "{value:7.3} ");
        }
        let _ = writeln!(out, "{}", line.trim_end());
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn weights_json(e: usize, h: usize) -> String {
        let matrix: Vec<Vec<f32>> = (0..e).map(|_| (0..e).map(|j| j as f32).collect()).collect();
        let bias: Vec<f32> = vec![0.5; e];
        serde_json::json!({
            "model_name": "test-model",
            "model_type": "bert",
            "config": {
                "embed_dim": e,
                "num_heads": h,
                "head_dim": e / h,
                "vocab_size": 100,
                "layer_idx": 0
            },
            "attention": {
                "Wq": matrix.clone(), "Wk": matrix.clone(), "Wv": matrix.clone(), "Wo": matrix,
                "bq": bias.clone(), "bk": bias.clone(), "bv": bias.clone(), "bo": bias
            },
            "tokenizer_config": {
                "cls_token_id": 101,
                "sep_token_id": 102,
                "pad_token_id": 0
            }
        })
        .to_string()
    }

    #[test]
    fn test_weights_document_to_params() {
        let doc: WeightsDocument = serde_json::from_str(&weights_json(8, 2)).unwrap();
        let params = doc.to_params().unwrap();

        assert_eq!(params.config.embed_dim, 8);
        assert_eq!(params.wq.shape(), &[8, 8]);
        assert_eq!(params.special_tokens.unwrap().cls_id, Some(101));
    }

    #[test]
    fn test_weights_document_without_tokenizer_config() {
        let mut value: serde_json::Value = serde_json::from_str(&weights_json(4, 2)).unwrap();
        value.as_object_mut().unwrap().remove("tokenizer_config");
        let doc: WeightsDocument = serde_json::from_value(value).unwrap();
        assert!(doc.to_params().unwrap().special_tokens.is_none());
    }

    #[test]
    fn test_run_repack_writes_tiers() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("weights.json");
        fs::write(&input, weights_json(8, 4)).unwrap();

        let out_dir = dir.path().join("models");
        let written = run_repack(&input, &out_dir, &[4, 2, 1], 3).unwrap();

        assert_eq!(written.len(), 3);
        assert!(written[0].ends_with("bert-4head.json"));
        assert!(written[2].ends_with("bert-1head.json"));
        assert!(out_dir.join("bert-2head.json.gz").exists());
    }

    #[test]
    fn test_run_repack_rejects_oversized_tier() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("weights.json");
        fs::write(&input, weights_json(8, 4)).unwrap();

        let result = run_repack(&input, &dir.path().join("m"), &[8], 3);
        assert!(matches!(
            result.unwrap_err(),
            RevelarError::InvalidHeadCount { .. }
        ));
    }

    #[test]
    fn test_run_demo_deterministic() {
        let dir = tempfile::tempdir().unwrap();
        let a = run_demo(&dir.path().join("a"), 42).unwrap();
        let b = run_demo(&dir.path().join("b"), 42).unwrap();
        assert_eq!(fs::read(a).unwrap(), fs::read(b).unwrap());
    }

    #[test]
    fn test_attention_dump_to_tensor() {
        let dump = AttentionDump {
            input_text: "hi".to_string(),
            tokens: vec!["a".to_string(), "b".to_string()],
            attention_weights: vec![vec![vec![0.5, 0.5], vec![0.25, 0.75]]],
        };
        let tensor = dump.to_tensor().unwrap();
        assert_eq!(tensor.shape(), &[1, 2, 2]);
        assert_eq!(tensor.data()[3], 0.75);
    }

    #[test]
    fn test_attention_dump_rejects_ragged() {
        let dump = AttentionDump {
            input_text: String::new(),
            tokens: vec!["a".to_string(), "b".to_string()],
            attention_weights: vec![vec![vec![0.5, 0.5]]],
        };
        assert!(dump.to_tensor().is_err());
    }

    #[test]
    fn test_run_analyze_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("dump.json");
        let row = vec![0.2f32; 5];
        let dump = serde_json::json!({
            "input_text": "the cat sat",
            "tokens": ["[CLS]", "the", "cat", "sat", "[SEP]"],
            "attention_weights": [vec![row; 5]]
        });
        fs::write(&input, dump.to_string()).unwrap();

        let report_path = dir.path().join("report.json");
        let report = run_analyze(&input, Some(&report_path), false).unwrap();

        assert_eq!(report.analysis.len(), 1);
        assert!(report_path.exists());
        let reparsed: AnalysisReport =
            serde_json::from_str(&fs::read_to_string(&report_path).unwrap()).unwrap();
        assert_eq!(reparsed, report);
    }

    #[test]
    fn test_format_attention_matrix_alignment() {
        let tokens: Vec<String> = vec!["[CLS]".to_string(), "extraordinary".to_string()];
        let matrix = vec![vec![0.9, 0.1], vec![0.4, 0.6]];
        let rendered = format_attention_matrix(&matrix, &tokens, 0);

        assert!(rendered.starts_with("Head 0"));
        // Long tokens are truncated, values render at three decimals.
        assert!(rendered.contains("extraor"));
        assert!(rendered.contains("0.900"));
        assert!(!rendered.contains("extraordinary"));
    }
}
