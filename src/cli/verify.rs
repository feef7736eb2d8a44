//! Verification subcommands.
//!
//! - `verify`: check every extracted obligation against the contract,
//!   write the JSON report and append a run-log event
//! - `check`: check one quote and print the outcome

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use fs2::FileExt;

use super::load;
use crate::config;
use crate::evidence::{
    load_obligations, to_claims, AttributionClaim, DocumentVerificationSummary, VerificationEvent,
    VerificationOutcome, Verifier, VerifierConfig,
};

/// Exit status when likely hallucinations were found
const HALLUCINATION_EXIT_CODE: i32 = 2;

/// Partial matches listed in the summary
const PARTIAL_PREVIEW: usize = 5;

/// Threshold flags given on the command line
#[derive(Debug, Clone, Copy, Default)]
pub struct ThresholdOverrides {
    pub fuzzy: Option<f64>,
    pub partial: Option<f64>,
}

impl ThresholdOverrides {
    fn apply(self, base: &VerifierConfig) -> VerifierConfig {
        VerifierConfig {
            fuzzy_threshold: self.fuzzy.unwrap_or(base.fuzzy_threshold),
            partial_threshold: self.partial.unwrap_or(base.partial_threshold),
            ..base.clone()
        }
    }
}

/// Append an event to the run log with file locking
fn append_event(log_path: &Path, event: &VerificationEvent) -> Result<()> {
    if let Some(parent) = log_path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
        .with_context(|| format!("Failed to open run log: {}", log_path.display()))?;

    file.lock_exclusive()
        .context("Failed to acquire file lock on verifications.jsonl")?;

    let json = serde_json::to_string(event).context("Failed to serialize event")?;

    let mut file = file;
    writeln!(file, "{}", json).context("Failed to write event")?;
    file.flush().context("Failed to flush event")?;

    // Lock is released when file is dropped
    Ok(())
}

/// Execute the `verify` command
pub async fn execute_verify(
    path: &Path,
    obligations_path: &Path,
    output: Option<PathBuf>,
    thresholds: ThresholdOverrides,
    json: bool,
) -> Result<()> {
    let cfg = config::config()?;
    let verifier = Verifier::new(thresholds.apply(&cfg.verifier)).context("Invalid verifier thresholds")?;

    let document = load(path).await?;
    let obligations = load_obligations(obligations_path)
        .with_context(|| format!("Failed to load obligations: {}", obligations_path.display()))?;
    let claims = to_claims(&obligations);

    let summary = tokio::task::spawn_blocking(move || verifier.verify_document(&claims, &document))
        .await
        .context("Verification task failed")?;

    let report_path = output.unwrap_or_else(|| cfg.report_path(path));
    write_report(&report_path, &summary)?;
    append_event(&cfg.run_log_path(), &summary.to_event())?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        display_summary(&summary);
        println!();
        println!("Full report saved to: {}", report_path.display());
    }

    if summary.has_hallucinations {
        std::process::exit(HALLUCINATION_EXIT_CODE);
    }

    Ok(())
}

fn write_report(report_path: &Path, summary: &DocumentVerificationSummary) -> Result<()> {
    if let Some(parent) = report_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    let json = serde_json::to_string_pretty(summary).context("Failed to serialize report")?;
    fs::write(report_path, json)
        .with_context(|| format!("Failed to write report: {}", report_path.display()))
}

/// Print the human-readable verification summary
fn display_summary(summary: &DocumentVerificationSummary) {
    println!("{}", "=".repeat(60));
    println!("VERIFICATION REPORT");
    println!("{}", "=".repeat(60));
    println!();
    println!("File: {}", summary.document);
    println!("Total Obligations: {}", summary.total_claims);
    println!();
    println!("Verification Results:");
    println!("  Verified:   {}", summary.verified_count);
    println!("  Partial:    {}", summary.partial_count);
    println!("  Unverified: {}", summary.unverified_count);
    println!("  Empty:      {}", summary.empty_count);
    if summary.skipped_count > 0 {
        println!("  Skipped:    {}", summary.skipped_count);
    }
    println!();
    println!("Verification Rate: {:.1}%", summary.verification_rate * 100.0);

    if summary.has_hallucinations {
        println!();
        println!("{}", "=".repeat(60));
        println!("WARNING: POSSIBLE HALLUCINATIONS DETECTED");
        println!("{}", "=".repeat(60));
        for outcome in summary.hallucinations() {
            println!();
            display_outcome(outcome);
        }
    } else {
        println!();
        println!("No hallucinations detected.");
    }

    let partial: Vec<&VerificationOutcome> = summary.partial_matches().take(PARTIAL_PREVIEW).collect();
    if !partial.is_empty() {
        println!();
        println!("{}", "=".repeat(60));
        println!("PARTIAL MATCHES (Review Recommended)");
        println!("{}", "=".repeat(60));
        for outcome in partial {
            println!();
            println!("  [{}] Confidence: {:.1}%", outcome.claim_id, outcome.confidence * 100.0);
            for issue in &outcome.issues {
                println!("    - {}", issue);
            }
        }
    }
}

/// Print one outcome in detail
fn display_outcome(outcome: &VerificationOutcome) {
    println!("  [{}]", outcome.claim_id);
    println!("    Status:     {}", outcome.status);
    println!("    Confidence: {:.1}%", outcome.confidence * 100.0);
    println!("    Source Text: \"{}\"", preview(&outcome.quoted_text, 100));

    if let Some(matched) = &outcome.matched_text {
        println!("    Matched:     \"{}\"", preview(matched, 100));
    }
    if let Some(location) = &outcome.matched_location {
        println!("    Location:    {}", location);
    }
    if let Some(span) = &outcome.span {
        println!(
            "    Bytes:       {} - {} (line {}, col {})",
            span.start(),
            span.end(),
            span.line,
            span.col
        );
    }
    for issue in &outcome.issues {
        println!("    - {}", issue);
    }
}

/// First `max` characters, with an ellipsis when cut
fn preview(text: &str, max: usize) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(max).collect();
    if chars.next().is_some() {
        format!("{}...", head)
    } else {
        head
    }
}

/// Execute the `check` command
pub async fn execute_check(path: &Path, quote: &str, location: Option<String>) -> Result<()> {
    let cfg = config::config()?;
    let verifier = Verifier::new(cfg.verifier.clone()).context("Invalid verifier thresholds")?;
    let document = load(path).await?;

    let mut claim = AttributionClaim::new("quote", quote);
    claim.location_hint = location;

    let outcome = verifier.verify_text(&claim, &document.raw_text());
    display_outcome(&outcome);

    if outcome.is_hallucination {
        std::process::exit(HALLUCINATION_EXIT_CODE);
    }

    Ok(())
}
