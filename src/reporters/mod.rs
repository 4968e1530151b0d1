//! Output reporters for plans and strategy comparisons
//!
//! Supports two output formats:
//! - `text` - Terminal output with colors
//! - `json` - Machine-readable JSON

mod json;
mod text;

use crate::engine::StrategyComparison;
use crate::models::PrioritizationPlan;
use anyhow::{anyhow, Result};
use std::str::FromStr;

/// Supported output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "txt" | "terminal" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(anyhow!("Unknown format '{}'. Valid formats: text, json", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// Render a plan in the specified format
pub fn render_plan(plan: &PrioritizationPlan, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => text::render_plan(plan),
        OutputFormat::Json => json::render(plan),
    }
}

/// Render a strategy comparison in the specified format
pub fn render_comparison(rows: &[StrategyComparison], format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => text::render_comparison(rows),
        OutputFormat::Json => json::render(&rows),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::models::Candidate;
    use crate::strategy::StrategyParameters;

    /// A small plan over mixed-criticality candidates
    pub(crate) fn test_plan() -> PrioritizationPlan {
        let candidates = vec![
            Candidate::new("AuthService", 0.9, 200, 3).with_module("auth/service"),
            Candidate::new("OrderController", 0.6, 300, 14).with_module("web/controller"),
            Candidate::new("StringUtil", 0.2, 50, 1).with_module("util"),
        ];
        crate::prioritize(
            &candidates,
            "maximize_popt20",
            &StrategyParameters::default(),
            &EngineConfig::default(),
        )
        .expect("prioritize test plan")
    }

    #[test]
    fn test_output_format_parse() {
        assert_eq!("TEXT".parse::<OutputFormat>().unwrap(), OutputFormat::Text);
        assert_eq!("json".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert!("sarif".parse::<OutputFormat>().is_err());
        assert_eq!(OutputFormat::Json.to_string(), "json");
    }
}
