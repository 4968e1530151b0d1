//! Init command - write an example riskplan.toml

use anyhow::{Context, Result};
use console::style;
use riskplan::config::EXAMPLE_CONFIG;
use std::path::Path;

/// Run the init command
pub fn run(path: &Path) -> Result<()> {
    let dir = path
        .canonicalize()
        .with_context(|| format!("Path does not exist: {}", path.display()))?;

    let config_path = dir.join("riskplan.toml");
    if config_path.exists() {
        anyhow::bail!(
            "{} already exists; remove it first to regenerate",
            config_path.display()
        );
    }

    std::fs::write(&config_path, EXAMPLE_CONFIG)
        .with_context(|| "Failed to create config file")?;
    println!(
        "{} Created {}",
        style("✓").green(),
        style(config_path.display()).cyan()
    );
    println!(
        "\nNext: {}",
        style("riskplan prioritize <candidates.json> --policy sprint").bold()
    );
    Ok(())
}
