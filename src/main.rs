//! Revelar CLI - attention weight repackaging and pattern diagnostics
//!
//! # Commands
//!
//! - `repack` - Convert an extracted weights document into compact per-head artifacts
//! - `demo` - Emit the deterministic tiny demo artifact
//! - `analyze` - Classify attention-head behavior from an attention dump

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use revelar::cli;
use revelar::error::Result;
use revelar::repack::quantize::COMPACT_PRECISION;

/// Revelar - per-head attention weight repackaging and diagnostics
#[derive(Parser)]
#[command(name = "revelar")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Repackage an extracted weights document into per-head artifacts
    ///
    /// Examples:
    ///   revelar repack distilbert-attention.json
    ///   revelar repack weights.json --heads 4,2,1 --precision 3 -o models
    Repack {
        /// Path to the extracted weights document
        #[arg(value_name = "WEIGHTS")]
        input: PathBuf,

        /// Head counts to keep, one artifact per entry
        #[arg(long, value_delimiter = ',', default_value = "4,2,1")]
        heads: Vec<usize>,

        /// Decimal digits to keep per value
        #[arg(short, long, default_value_t = COMPACT_PRECISION)]
        precision: u32,

        /// Output directory
        #[arg(short, long, default_value = "models")]
        output: PathBuf,
    },
    /// Emit the deterministic tiny demo artifact (64 wide, 4 heads)
    Demo {
        /// Output directory
        #[arg(short, long, default_value = "models")]
        output: PathBuf,

        /// Generator seed
        #[arg(long, default_value_t = 42)]
        seed: u64,
    },
    /// Classify attention-head behavior from an attention dump
    ///
    /// Examples:
    ///   revelar analyze validation_output.json
    ///   revelar analyze dump.json --report report.json --matrices
    Analyze {
        /// Path to the attention dump
        #[arg(value_name = "DUMP")]
        input: PathBuf,

        /// Write the full report as JSON to this path
        #[arg(short, long)]
        report: Option<PathBuf>,

        /// Print the first four heads' attention matrices
        #[arg(long)]
        matrices: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Repack {
            input,
            heads,
            precision,
            output,
        } => {
            cli::run_repack(&input, &output, &heads, precision)?;
        }
        Commands::Demo { output, seed } => {
            cli::run_demo(&output, seed)?;
        }
        Commands::Analyze {
            input,
            report,
            matrices,
        } => {
            cli::run_analyze(&input, report.as_deref(), matrices)?;
        }
    }

    Ok(())
}
