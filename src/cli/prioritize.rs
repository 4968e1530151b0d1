//! Prioritize command - build a plan from a candidates file

use super::load_candidates;
use anyhow::{Context, Result};
use console::style;
use riskplan::reporters::{self, OutputFormat};
use riskplan::{prioritize, prioritize_with_policy, EngineConfig, StrategyParameters};
use std::path::Path;

pub fn run(
    input: &Path,
    strategy: &str,
    policy: Option<&str>,
    params: &StrategyParameters,
    format: &str,
    output: Option<&Path>,
    config: &EngineConfig,
) -> Result<()> {
    let format: OutputFormat = format.parse()?;
    let candidates = load_candidates(input)?;

    let plan = match policy {
        Some(name) => prioritize_with_policy(&candidates, name, params, config)?,
        None => prioritize(&candidates, strategy, params, config)?,
    };
    let rendered = reporters::render_plan(&plan, format)?;

    match output {
        Some(path) => {
            std::fs::write(path, &rendered)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!(
                "{} Wrote {} entries to {}",
                style("✓").green(),
                plan.len(),
                style(path.display()).cyan()
            );
        }
        None => println!("{}", rendered),
    }
    Ok(())
}
