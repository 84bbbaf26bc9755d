//! Parse command - recover the ledger of a single statement.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use console::style;
use tracing::{debug, info};

use bankflow_core::{Diagnostic, ParseResult, StatementPipeline};

use super::{load_config, parse_file, resolve_institution};

/// Arguments for the parse command.
#[derive(Args)]
pub struct ParseArgs {
    /// Input file (.json fragment dump or .txt statement text)
    #[arg(required = true)]
    input: PathBuf,

    /// Institution key, skips detection (see `bankflow institutions`)
    #[arg(short, long)]
    institution: Option<String>,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Keep the reconstructed statement text in JSON output
    #[arg(long)]
    raw_text: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// Plain text ledger
    Text,
}

pub async fn run(args: ParseArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    let pipeline = StatementPipeline::from_config(&config);
    let institution = resolve_institution(&pipeline, args.institution.as_deref())?;

    info!("Parsing file: {}", args.input.display());
    let mut result = parse_file(&pipeline, &args.input, institution.as_ref()).await?;
    if !args.raw_text {
        result.raw_text.clear();
    }

    let output = match args.format {
        OutputFormat::Json => serde_json::to_string_pretty(&result)?,
        OutputFormat::Text => format_text(&result),
    };

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    if !result.diagnostics.is_empty() {
        eprintln!(
            "{} {} diagnostics, rerun with -v for details",
            style("⚠").yellow(),
            result.diagnostics.len()
        );
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}

pub fn format_text(result: &ParseResult) -> String {
    let account = &result.account_info;
    let mut output = String::new();

    output.push_str(&format!("Institution: {}\n", result.institution_name));
    if !account.account_name.is_empty() {
        output.push_str(&format!("Account: {} {}\n", account.account_name, account.account_number));
    }
    if let Some(period) = &account.period {
        output.push_str(&format!("Period: {} - {}\n", period.start, period.end));
    }
    if let Some(strategy) = &result.strategy {
        output.push_str(&format!("Strategy: {}\n", strategy));
    }
    output.push('\n');

    for t in &result.transactions {
        let sign = if t.is_income() { "+" } else { "-" };
        output.push_str(&format!(
            "{} {}  {}{:>12}  {:<8}  {}",
            t.date, t.time, sign, t.amount, t.category_info.label, t.description
        ));
        if !t.counterparty.is_empty() {
            output.push_str(&format!("  ({})", t.counterparty));
        }
        output.push('\n');
    }
    output.push('\n');

    let summary = &result.summary;
    let currency = &account.currency;
    output.push_str("Summary:\n");
    output.push_str(&format!("  Income:  {} {} ({})\n", summary.total_income, currency, summary.income_count));
    output.push_str(&format!("  Expense: {} {} ({})\n", summary.total_expense, currency, summary.expense_count));
    output.push_str(&format!("  Net:     {} {}\n", summary.balance, currency));

    if !result.diagnostics.is_empty() {
        output.push_str("\nDiagnostics:\n");
        for diagnostic in &result.diagnostics {
            output.push_str(&format!("  - {}\n", describe(diagnostic)));
        }
    }

    output
}

fn describe(diagnostic: &Diagnostic) -> String {
    match diagnostic {
        Diagnostic::SkippedLine { line, reason } => format!("skipped '{}': {}", line, reason),
        Diagnostic::ColumnCountMismatch {
            dates,
            times,
            descriptions,
            balances,
            counterparties,
        } => format!(
            "column counts differ: {} dates, {} times, {} descriptions, {} balances, {} counterparties",
            dates, times, descriptions, balances, counterparties
        ),
        Diagnostic::BalanceDeltaMismatch {
            index,
            stated,
            computed,
        } => format!(
            "row {}: statement shows {}, balances give {}",
            index + 1,
            stated,
            computed
        ),
    }
}
