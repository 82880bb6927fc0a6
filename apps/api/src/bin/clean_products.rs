//! Offline repair tool for malformed or mis-encoded product JSON files.
//!
//! Scans the input for suspicious non-ASCII characters, attempts a
//! structured clean (Unicode normalization + JSON repair + product
//! filtering), and falls back to raw text normalization when the input is
//! too broken to parse. Re-validates the output at the end.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use serde_json::Value;

use querygen_api::textclean::{clean_file, detect_anomalies, Anomaly, CharClass, CleanOutcome};

#[derive(Parser, Debug)]
#[command(
    name = "clean-products",
    about = "Repair malformed or mis-encoded product JSON files"
)]
struct Args {
    /// Input JSON file
    #[arg(long, default_value = "data/merged_products.json")]
    input: PathBuf,

    /// Output path for the cleaned file
    #[arg(long, default_value = "data/merged_products_clean.json")]
    output: PathBuf,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let original = std::fs::read_to_string(&args.input)
        .with_context(|| format!("Failed to read {}", args.input.display()))?;

    let anomalies = detect_anomalies(&original);
    report_anomalies(&anomalies);

    println!("\nCleaning {} ...", args.input.display());
    match clean_file(&args.input, &args.output)? {
        CleanOutcome::Structured(summary) => {
            println!(
                "Cleaned file saved to {} (products kept: {} / {})",
                args.output.display(),
                summary.products_kept,
                summary.products_before
            );
        }
        CleanOutcome::Fallback(reason) => {
            println!(
                "JSON-based cleaning failed: {reason}\n\
                 Fell back to text normalization (quotes may still break JSON)."
            );
            println!("Fallback cleaned file saved to {}", args.output.display());
        }
    }

    validate_output(&args.output)?;

    let cleaned_text = std::fs::read_to_string(&args.output)?;
    let remaining = detect_anomalies(&cleaned_text);
    println!(
        "Summary: original anomalies={}, cleaned anomalies={}",
        anomalies.len(),
        remaining.len()
    );
    Ok(())
}

fn report_anomalies(anomalies: &[Anomaly]) {
    if anomalies.is_empty() {
        println!("No non-ASCII characters found.");
        return;
    }

    let benign = anomalies.iter().filter(|a| a.class == CharClass::Benign).count();
    let cleaning: Vec<&Anomaly> = anomalies
        .iter()
        .filter(|a| a.class == CharClass::NeedsCleaning)
        .collect();
    let other = anomalies.len() - benign - cleaning.len();

    println!("Detected {} non-ASCII characters:", anomalies.len());
    println!("  benign: {benign}");
    println!("  needs cleaning: {}", cleaning.len());
    println!("  other/unclassified: {other}");

    if !cleaning.is_empty() {
        println!("\nCharacters that need cleaning (first 30 shown):");
        for anomaly in cleaning.iter().take(30) {
            println!(
                "Line {:<6} Col {:<4} Char: {:?}",
                anomaly.line, anomaly.column, anomaly.ch
            );
        }
        if cleaning.len() > 30 {
            println!("...and {} more.", cleaning.len() - 30);
        }
    }
}

/// Re-parses the cleaned file so a silently-broken output never goes
/// unnoticed.
fn validate_output(path: &Path) -> Result<()> {
    let text = std::fs::read_to_string(path)?;
    match serde_json::from_str::<Value>(&text) {
        Ok(data) => {
            let products = data
                .get("products")
                .and_then(Value::as_array)
                .map(Vec::len)
                .unwrap_or(0);
            println!("Validation: cleaned JSON parsed OK. products={products}");
        }
        Err(e) => println!("Validation: cleaned JSON still invalid: {e}"),
    }
    Ok(())
}
