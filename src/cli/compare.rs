//! Compare command - run every strategy over one candidates file

use super::load_candidates;
use anyhow::Result;
use riskplan::reporters::{self, OutputFormat};
use riskplan::{compare_strategies_against, EngineConfig, GroundTruth, StrategyParameters};
use std::path::Path;

pub fn run(
    input: &Path,
    params: &StrategyParameters,
    truth: &GroundTruth,
    format: &str,
    config: &EngineConfig,
) -> Result<()> {
    let format: OutputFormat = format.parse()?;
    let candidates = load_candidates(input)?;
    let rows = compare_strategies_against(&candidates, params, truth, config)?;
    println!("{}", reporters::render_comparison(&rows, format)?);
    Ok(())
}
