//! Canonicalization CLI
//!
//! Reads a provider `ExtractionResult` as JSON and prints the canonical
//! record, confidence and provenance as JSON.
//!
//! # Usage
//!
//! ```bash
//! # From a file
//! canon_cli --input scan.json
//!
//! # From stdin, merged into a stored record
//! cat scan.json | canon_cli --previous record.json
//!
//! # With an override table
//! canon_cli --input scan.json --config my_tables.yaml
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use std::io::{self, Read};
use std::path::PathBuf;
use vessel_canon::{CanonicalRecord, CanonicalizationEngine, EngineConfig, ExtractionResult};

#[derive(Parser)]
#[command(name = "canon_cli")]
#[command(version = "0.1.0")]
#[command(about = "Canonicalize a vessel registration extraction")]
struct Cli {
    /// ExtractionResult JSON (reads stdin if not provided)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Previously stored canonical record JSON to merge into
    #[arg(short, long)]
    previous: Option<PathBuf>,

    /// Override YAML tables (defaults to VESSEL_CANON_CONFIG, then bundled)
    #[arg(short, long, env = "VESSEL_CANON_CONFIG")]
    config: Option<PathBuf>,

    /// Print only the record, without the report
    #[arg(long)]
    record_only: bool,

    /// Compact single-line JSON
    #[arg(long)]
    compact: bool,
}

fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Logs go to stderr so stdout stays valid JSON
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => EngineConfig::load_from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => EngineConfig::default_config()?,
    };
    let engine = CanonicalizationEngine::new(&config).context("building engine")?;

    let raw = match &cli.input {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?,
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("reading stdin")?;
            buf
        }
    };
    let extraction: ExtractionResult =
        serde_json::from_str(&raw).context("parsing ExtractionResult JSON")?;

    let previous: Option<CanonicalRecord> = match &cli.previous {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            Some(serde_json::from_str(&content).context("parsing previous record JSON")?)
        }
        None => None,
    };

    let result = engine.canonicalize_with_previous(&extraction, previous.as_ref());

    let output = if cli.record_only {
        serde_json::to_value(&result.record)?
    } else {
        serde_json::to_value(&result)?
    };
    let text = if cli.compact {
        serde_json::to_string(&output)?
    } else {
        serde_json::to_string_pretty(&output)?
    };
    println!("{}", text);

    Ok(())
}
