//! Subcommands and the input handling they share.

pub mod batch;
pub mod config;
pub mod institutions;
pub mod parse;

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use bankflow_core::models::config::BankflowConfig;
use bankflow_core::{
    InstitutionId, ParseResult, PositionedFragment, StatementDocument, StatementPipeline,
};

/// Extensions accepted as statement input.
pub const INPUT_EXTENSIONS: &[&str] = &["json", "txt"];

pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("bankflow")
        .join("config.json")
}

/// `--config` if given, else the platform config file if present, else defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<BankflowConfig> {
    if let Some(path) = config_path {
        return Ok(BankflowConfig::from_file(Path::new(path))?);
    }

    let default_path = default_config_path();
    if default_path.exists() {
        debug!("Using config at {}", default_path.display());
        Ok(BankflowConfig::from_file(&default_path)?)
    } else {
        Ok(BankflowConfig::default())
    }
}

/// Fragment dumps come either wrapped with a name or as bare pages.
#[derive(Deserialize)]
#[serde(untagged)]
enum FragmentDump {
    Document(StatementDocument),
    Pages(Vec<Vec<PositionedFragment>>),
}

/// Read one statement from disk and parse it.
///
/// `.json` files hold rendered fragments and go through layout
/// reconstruction; `.txt` files hold already assembled text.
pub async fn parse_file(
    pipeline: &StatementPipeline,
    path: &Path,
    institution: Option<&InstitutionId>,
) -> anyhow::Result<ParseResult> {
    let name = path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("statement")
        .to_string();

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match extension.as_str() {
        "json" => {
            let data = tokio::fs::read_to_string(path).await?;
            let document = match serde_json::from_str::<FragmentDump>(&data)? {
                FragmentDump::Document(document) => document,
                FragmentDump::Pages(pages) => StatementDocument { name, pages },
            };
            Ok(pipeline.process_as(&document, institution)?)
        }
        "txt" => {
            let text = tokio::fs::read_to_string(path).await?;
            Ok(pipeline.process_text(Some(&name), &text, institution)?)
        }
        _ => anyhow::bail!("Unsupported file format: {}", extension),
    }
}

/// Resolve an `--institution` key against the registry.
pub fn resolve_institution(
    pipeline: &StatementPipeline,
    key: Option<&str>,
) -> anyhow::Result<Option<InstitutionId>> {
    match key {
        None => Ok(None),
        Some(key) => match pipeline.registry().profile_by_key(key) {
            Some(profile) => Ok(Some(profile.id.clone())),
            None => anyhow::bail!(
                "Unknown institution '{}'. Run 'bankflow institutions' to list supported keys.",
                key
            ),
        },
    }
}
