//! Threshold classification of attention-head behavior
//!
//! Maps a head's statistics to qualitative labels using fixed thresholds.
//! The checks are independent: a head may match zero, one, or several
//! labels. All comparisons are strict (`>`), so a statistic sitting
//! exactly on a threshold does not match.
//!
//! The thresholds are tunable policy constants, chosen to match a
//! reference analysis of BERT-family layer-0 heads. They are not learned
//! and carry no physical meaning.

use serde::{Deserialize, Serialize};

use crate::analyze::stats::HeadStats;

/// Minimum mean first-token mass for the CLS label
pub const CLS_ATTENTION_THRESHOLD: f64 = 0.3;

/// Minimum mean last-token mass for the SEP label
pub const SEP_ATTENTION_THRESHOLD: f64 = 0.3;

/// Minimum mean diagonal mass for the self-attention label
pub const SELF_ATTENTION_THRESHOLD: f64 = 0.3;

/// Minimum mean `i-1` mass for the previous-token label
pub const PREV_TOKEN_THRESHOLD: f64 = 0.2;

/// Minimum mean `i+1` mass for the next-token label
pub const NEXT_TOKEN_THRESHOLD: f64 = 0.2;

/// Minimum entropy ratio for the broad-attention label
pub const ENTROPY_RATIO_THRESHOLD: f64 = 0.8;

/// Qualitative attention-head behavior labels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttentionPattern {
    /// Mass concentrates on the first (classification) token
    ClsFocus,
    /// Mass concentrates on the last (separator) token
    SepFocus,
    /// Each position attends mostly to itself
    SelfFocus,
    /// Each position attends to its predecessor
    PrevToken,
    /// Each position attends to its successor
    NextToken,
    /// Mass spreads near-uniformly over the sequence
    Broad,
}

impl AttentionPattern {
    /// Human-readable label with the triggering statistic at two decimals
    #[must_use]
    pub fn describe(&self, stats: &HeadStats) -> String {
        match self {
            Self::ClsFocus => format!("Attends to [CLS] (avg: {:.2})", stats.cls_attention),
            Self::SepFocus => format!("Attends to [SEP] (avg: {:.2})", stats.sep_attention),
            Self::SelfFocus => format!("Self-attention (avg: {:.2})", stats.self_attention),
            Self::PrevToken => {
                format!("Previous token (avg: {:.2})", stats.prev_token_attention)
            }
            Self::NextToken => format!("Next token (avg: {:.2})", stats.next_token_attention),
            Self::Broad => format!("Broad attention (entropy ratio: {:.2})", stats.entropy_ratio),
        }
    }
}

/// Derive the matched labels for one head's statistics
///
/// Labels appear in a fixed order (CLS, SEP, self, previous, next, broad)
/// so identical statistics always yield an identical sequence.
#[must_use]
pub fn classify(stats: &HeadStats) -> Vec<AttentionPattern> {
    let mut patterns = Vec::new();

    if stats.cls_attention > CLS_ATTENTION_THRESHOLD {
        patterns.push(AttentionPattern::ClsFocus);
    }
    if stats.sep_attention > SEP_ATTENTION_THRESHOLD {
        patterns.push(AttentionPattern::SepFocus);
    }
    if stats.self_attention > SELF_ATTENTION_THRESHOLD {
        patterns.push(AttentionPattern::SelfFocus);
    }
    if stats.prev_token_attention > PREV_TOKEN_THRESHOLD {
        patterns.push(AttentionPattern::PrevToken);
    }
    if stats.next_token_attention > NEXT_TOKEN_THRESHOLD {
        patterns.push(AttentionPattern::NextToken);
    }
    if stats.entropy_ratio > ENTROPY_RATIO_THRESHOLD {
        patterns.push(AttentionPattern::Broad);
    }

    patterns
}
