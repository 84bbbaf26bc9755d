//! Batch command - merge several statements into one ledger.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use serde::Serialize;
use tracing::{error, warn};

use bankflow_core::store::ParseInfo;
use bankflow_core::{StatementPipeline, Summary, Transaction, TransactionStore};

use super::{INPUT_EXTENSIONS, load_config, parse_file, resolve_institution};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Input files or glob pattern
    #[arg(required = true)]
    input: String,

    /// Institution key applied to every file
    #[arg(short, long)]
    institution: Option<String>,

    /// Write the merged ledger as JSON
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,
}

/// Outcome of one file in the batch.
struct FileResult {
    path: PathBuf,
    added: usize,
    error: Option<String>,
}

/// Merged ledger as written to `--output`.
#[derive(Serialize)]
struct LedgerOutput<'a> {
    parse_info: Option<&'a ParseInfo>,
    summary: Summary,
    transactions: &'a [Transaction],
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    let mut files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| {
            let ext = p.extension().and_then(|e| e.to_str()).unwrap_or("");
            INPUT_EXTENSIONS.contains(&ext.to_lowercase().as_str())
        })
        .collect();
    files.sort();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    println!(
        "{} Found {} files to process",
        style("ℹ").blue(),
        files.len()
    );

    let pipeline = StatementPipeline::from_config(&config);
    let institution = resolve_institution(&pipeline, args.institution.as_deref())?;
    let mut store = TransactionStore::new(pipeline.registry().calculator());
    let mut results = Vec::with_capacity(files.len());

    for path in files {
        match parse_file(&pipeline, &path, institution.as_ref()).await {
            Ok(result) => {
                let found = result.transactions.len();
                // The first document sets the account; later ones only merge.
                let added = if store.parse_info().is_none() {
                    store.load_parse_result(result);
                    found
                } else {
                    store.append_transactions(result.transactions)
                };
                println!(
                    "  {} {}: {} transactions, {} new",
                    style("✓").green(),
                    path.display(),
                    found,
                    added
                );
                results.push(FileResult { path, added, error: None });
            }
            Err(e) => {
                let error_msg = e.to_string();
                if args.continue_on_error {
                    warn!("Failed to process {}: {}", path.display(), error_msg);
                    println!("  {} {}: {}", style("✗").red(), path.display(), error_msg);
                    results.push(FileResult {
                        path,
                        added: 0,
                        error: Some(error_msg),
                    });
                } else {
                    error!("Failed to process {}: {}", path.display(), error_msg);
                    anyhow::bail!("Processing failed: {}", error_msg);
                }
            }
        }
    }

    let summary = store.summary();

    if let Some(output_path) = &args.output {
        let ledger = LedgerOutput {
            parse_info: store.parse_info(),
            summary: summary.clone(),
            transactions: store.transactions(),
        };
        fs::write(output_path, serde_json::to_string_pretty(&ledger)?)?;
        println!(
            "{} Ledger written to {}",
            style("✓").green(),
            output_path.display()
        );
    }

    let failed: Vec<_> = results.iter().filter(|r| r.error.is_some()).collect();
    let added: usize = results.iter().map(|r| r.added).sum();

    println!();
    println!(
        "{} Processed {} files in {:?}",
        style("✓").green(),
        results.len(),
        start.elapsed()
    );
    println!(
        "   {} transactions held ({} added), {} failed",
        style(store.len()).green(),
        added,
        style(failed.len()).red()
    );
    println!(
        "   income {}, expense {}, net {}",
        summary.total_income, summary.total_expense, summary.balance
    );
    if let Some((first, last)) = store.date_range() {
        println!("   covering {} to {}", first, last);
    }

    if !failed.is_empty() {
        println!();
        println!("{}", style("Failed files:").red());
        for result in &failed {
            println!(
                "  - {}: {}",
                result.path.display(),
                result.error.as_deref().unwrap_or("unknown error")
            );
        }
    }

    Ok(())
}
