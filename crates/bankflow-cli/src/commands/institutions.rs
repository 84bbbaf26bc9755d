//! Institutions command - list the statement formats the registry knows.

use console::style;

use bankflow_core::StatementPipeline;

use super::load_config;

pub async fn run(config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let pipeline = StatementPipeline::from_config(&config);

    println!("{}", style("Supported institutions:").bold());
    for profile in pipeline.registry().profiles() {
        println!(
            "  {:<10} {}  (row tolerance {})",
            style(profile.id.as_str()).cyan(),
            profile.name,
            profile.row_tolerance
        );
    }
    println!();
    println!("Statements from other banks are read with the generic line parser.");

    Ok(())
}
