//! Command-line interface for clauseguard.
//!
//! Provides commands for segmenting contracts, listing detected
//! sections, verifying extracted obligations against the source text,
//! checking a single quote, and showing the resolved configuration.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::config::{self, ResolvedConfig};
use crate::document::{load_document, Document};
use crate::segment::{Segmenter, SegmenterConfig};

pub mod verify;

/// clauseguard - Contract segmentation and source-attribution verification
#[derive(Parser, Debug)]
#[command(name = "clauseguard")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Split a contract into overlapping chunks
    Segment {
        /// Contract file (.txt, .text or .json page map)
        file: PathBuf,

        /// Target chunk size in characters
        #[arg(long)]
        chunk_size: Option<usize>,

        /// Overlap carried between chunks, in characters
        #[arg(long)]
        overlap: Option<usize>,

        /// Print the chunks as JSON
        #[arg(long)]
        json: bool,
    },

    /// List section headings detected in a contract
    Sections {
        /// Contract file
        file: PathBuf,
    },

    /// Verify extracted obligations against the contract text
    Verify {
        /// Contract file the obligations were extracted from
        file: PathBuf,

        /// Obligations JSON (array, or object with an "obligations" array)
        #[arg(short = 'b', long)]
        obligations: PathBuf,

        /// Report path (default: <stem>_verification.json)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Minimum similarity for a fuzzy match
        #[arg(long)]
        fuzzy_threshold: Option<f64>,

        /// Minimum similarity for a partial match
        #[arg(long)]
        partial_threshold: Option<f64>,

        /// Print the report as JSON instead of a summary
        #[arg(long)]
        json: bool,
    },

    /// Check whether a single quote appears in a contract
    Check {
        /// Contract file
        file: PathBuf,

        /// Quoted text to look for
        #[arg(short, long)]
        quote: String,

        /// Location hint reported when the quote is found
        #[arg(short, long)]
        location: Option<String>,
    },

    /// Show resolved configuration (debug)
    Config,
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        match self.command {
            Commands::Segment {
                file,
                chunk_size,
                overlap,
                json,
            } => segment_document(&file, chunk_size, overlap, json).await,
            Commands::Sections { file } => list_sections(&file).await,
            Commands::Verify {
                file,
                obligations,
                output,
                fuzzy_threshold,
                partial_threshold,
                json,
            } => {
                let thresholds = verify::ThresholdOverrides {
                    fuzzy: fuzzy_threshold,
                    partial: partial_threshold,
                };
                verify::execute_verify(&file, &obligations, output, thresholds, json).await
            }
            Commands::Check {
                file,
                quote,
                location,
            } => verify::execute_check(&file, &quote, location).await,
            Commands::Config => show_config().await,
        }
    }
}

/// Load a contract, attaching the path to any error
pub(crate) async fn load(path: &Path) -> Result<Document> {
    let owned = path.to_path_buf();
    tokio::task::spawn_blocking(move || load_document(&owned))
        .await
        .context("Document loading task failed")?
        .with_context(|| format!("Failed to load contract: {}", path.display()))
}

/// Apply command-line overrides on top of the configured segmenter
fn segmenter_settings(
    cfg: &ResolvedConfig,
    chunk_size: Option<usize>,
    overlap: Option<usize>,
) -> SegmenterConfig {
    SegmenterConfig {
        target_chunk_size: chunk_size.unwrap_or(cfg.segmenter.target_chunk_size),
        overlap_size: overlap.unwrap_or(cfg.segmenter.overlap_size),
    }
}

/// Segment a document and print the chunk summary
async fn segment_document(
    path: &Path,
    chunk_size: Option<usize>,
    overlap: Option<usize>,
    json: bool,
) -> Result<()> {
    let cfg = config::config()?;
    let segmenter = Segmenter::new(segmenter_settings(cfg, chunk_size, overlap))
        .context("Invalid segmenter settings")?;

    let document = load(path).await?;
    let chunks = segmenter.segment(&document);

    if chunks.is_empty() {
        anyhow::bail!(
            "No chunks produced for {}: the document has no non-blank paragraphs",
            path.display()
        );
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&chunks)?);
        return Ok(());
    }

    println!("Document: {}", path.display());
    println!(
        "Pages: {}  Characters: {}  Sections: {}",
        document.page_count(),
        document.char_count(),
        document.sections.len()
    );
    println!(
        "Chunks: {} (target {} chars, overlap {})",
        chunks.len(),
        segmenter.config().target_chunk_size,
        segmenter.config().overlap_size
    );
    println!();

    for chunk in &chunks {
        println!(
            "  [{}/{}] {:<12} {:>6} chars  overlap {:>4}",
            chunk.index + 1,
            chunk.total_chunks,
            chunk.source_location(),
            chunk.char_count(),
            chunk.overlap_len
        );
        if !chunk.sections.is_empty() {
            println!("         sections: {}", chunk.sections.join(", "));
        }
    }

    Ok(())
}

/// List detected section markers
async fn list_sections(path: &Path) -> Result<()> {
    let document = load(path).await?;

    if document.sections.is_empty() {
        println!("No section headings detected in {}", path.display());
        return Ok(());
    }

    println!("{} sections in {}:", document.sections.len(), path.display());
    println!();
    for marker in &document.sections {
        println!("  Page {:>3}  line {:>4}  {}", marker.page, marker.line + 1, marker.name);
    }

    Ok(())
}

/// Show resolved configuration
async fn show_config() -> Result<()> {
    let cfg = config::config()?;

    println!("{}", "=".repeat(60));
    println!("  clauseguard Configuration");
    println!("{}", "=".repeat(60));
    println!();
    println!(
        "Config file: {}",
        cfg.config_file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(none - using defaults)".to_string())
    );
    println!();
    println!("Paths:");
    println!("  Home (run log): {}", cfg.home.display());
    println!("  Run log:        {}", cfg.run_log_path().display());
    println!(
        "  Reports:        {}",
        cfg.output
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(next to the input file)".to_string())
    );
    println!();
    println!("Segmenter:");
    println!("  Target chunk size: {} chars", cfg.segmenter.target_chunk_size);
    println!("  Overlap:           {} chars", cfg.segmenter.overlap_size);
    println!();
    println!("Verifier:");
    println!("  Fuzzy threshold:   {:.2}", cfg.verifier.fuzzy_threshold);
    println!("  Partial threshold: {:.2}", cfg.verifier.partial_threshold);
    println!("  Min claim length:  {} chars", cfg.verifier.min_claim_chars);
    println!("  Max key phrases:   {}", cfg.verifier.max_key_phrases);

    Ok(())
}
