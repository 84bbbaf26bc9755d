//! Config command - inspect and create the configuration file.

use std::fs;
use std::path::PathBuf;

use clap::{Args, Subcommand};
use console::style;

use bankflow_core::models::config::BankflowConfig;

use super::{default_config_path, load_config};

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommand,
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Print the configuration the other commands would use
    Show,

    /// Write a configuration file with default values
    Init(InitArgs),

    /// Print which configuration file is in effect
    Path,
}

#[derive(Args)]
struct InitArgs {
    /// Where to write the file (default: --config, then the platform path)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Replace an existing file
    #[arg(long)]
    force: bool,
}

pub async fn run(args: ConfigArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let target = config_path.map_or_else(default_config_path, PathBuf::from);

    match args.command {
        ConfigCommand::Show => {
            let config = load_config(config_path)?;
            // Provenance goes to stderr so stdout stays valid JSON.
            if target.exists() {
                eprintln!("{} Loaded {}", style("ℹ").blue(), target.display());
            } else {
                eprintln!("{} No file at {}, using defaults", style("ℹ").blue(), target.display());
            }
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        ConfigCommand::Init(init) => {
            let destination = init.output.unwrap_or(target);
            if destination.exists() && !init.force {
                anyhow::bail!(
                    "{} already exists, pass --force to replace it",
                    destination.display()
                );
            }
            if let Some(dir) = destination.parent().filter(|d| !d.as_os_str().is_empty()) {
                fs::create_dir_all(dir)?;
            }
            BankflowConfig::default().save(&destination)?;
            println!("{} Wrote {}", style("✓").green(), destination.display());
        }
        ConfigCommand::Path => {
            let status = if target.exists() {
                style("exists").green()
            } else {
                style("missing, defaults apply").yellow()
            };
            println!("{} ({})", target.display(), status);
        }
    }

    Ok(())
}
