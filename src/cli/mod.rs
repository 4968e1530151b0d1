//! CLI command definitions and handlers

mod compare;
mod init;
mod prioritize;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use riskplan::{
    load_engine_config, Candidate, DefectLabel, EngineConfig, GroundTruth, StrategyParameters,
};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// riskplan - effort-aware test prioritization
#[derive(Parser, Debug)]
#[command(name = "riskplan")]
#[command(
    version,
    about = "Turn risk-scored classes into an ordered, budget-constrained testing plan",
    after_help = "\
Examples:
  riskplan prioritize risks.json                                  Rank everything by effort-aware score
  riskplan prioritize risks.json --strategy top_k_coverage --k 10
  riskplan prioritize risks.json --strategy budget_optimization --budget-hours 16
  riskplan prioritize risks.json --policy sprint --format json    Use a policy from riskplan.toml
  riskplan compare risks.json --budget-hours 24                   Compare all five strategies
  riskplan compare risks.json --defects bugs.json                 Score against observed defects
  riskplan init                                                   Write an example riskplan.toml"
)]
pub struct Cli {
    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "warn", value_parser = ["error", "warn", "info", "debug", "trace"])]
    pub log_level: String,

    /// Config file (default: riskplan.toml or .riskplanrc.json in the current directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Strategy parameter flags shared by `prioritize` and `compare`
#[derive(Args, Debug, Clone, Default)]
pub struct ParameterArgs {
    /// Entries kept by top_k_coverage (default: 20)
    #[arg(long, allow_negative_numbers = true)]
    pub k: Option<i64>,

    /// Effort budget in hours (default: 40)
    #[arg(long, allow_negative_numbers = true)]
    pub budget_hours: Option<f64>,

    /// Share of total risk to cover, in (0, 1] (default: 0.8)
    #[arg(long, allow_negative_numbers = true)]
    pub target_coverage: Option<f64>,

    /// Maximum number of classes for multi_objective (default: unbounded)
    #[arg(long, allow_negative_numbers = true)]
    pub max_classes: Option<i64>,
}

impl ParameterArgs {
    pub fn to_parameters(&self) -> StrategyParameters {
        StrategyParameters {
            k: self.k,
            budget_hours: self.budget_hours,
            target_coverage: self.target_coverage,
            max_classes: self.max_classes,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize a riskplan.toml config file with example settings
    Init,

    /// Build a prioritized testing plan
    #[command(after_help = "\
Strategies:
  maximize_popt20         Every class, ranked by effort-aware score (default)
  top_k_coverage          First --k classes of that ranking
  budget_optimization     Most risk within --budget-hours
  coverage_optimization   Least effort reaching --target-coverage
  multi_objective         Most risk within budget, coverage and --max-classes")]
    Prioritize {
        /// JSON file with a candidate array or {\"candidates\": [...]}
        input: PathBuf,

        /// Strategy name
        #[arg(long, short = 's', default_value = "maximize_popt20", conflicts_with = "policy")]
        strategy: String,

        /// Named policy from the config file
        #[arg(long, short = 'p')]
        policy: Option<String>,

        #[command(flatten)]
        params: ParameterArgs,

        /// Output format: text, json
        #[arg(long, short = 'f', default_value = "text", value_parser = ["text", "json"])]
        format: String,

        /// Output file (default: stdout)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// Run every strategy on the same input and compare their metrics
    Compare {
        /// JSON file with a candidate array or {\"candidates\": [...]}
        input: PathBuf,

        #[command(flatten)]
        params: ParameterArgs,

        /// JSON file of observed defects: [{\"class_name\": ..., \"has_defect\": true}]
        #[arg(long)]
        defects: Option<PathBuf>,

        /// Existing coverage share; report coverage gain over it
        #[arg(long, allow_negative_numbers = true)]
        baseline_coverage: Option<f64>,

        /// Output format: text, json
        #[arg(long, short = 'f', default_value = "text", value_parser = ["text", "json"])]
        format: String,
    },
}

/// Run the CLI command
pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Init => init::run(Path::new(".")),

        Commands::Prioritize {
            input,
            strategy,
            policy,
            params,
            format,
            output,
        } => {
            let config = resolve_config(cli.config.as_deref())?;
            prioritize::run(
                &input,
                &strategy,
                policy.as_deref(),
                &params.to_parameters(),
                &format,
                output.as_deref(),
                &config,
            )
        }

        Commands::Compare {
            input,
            params,
            defects,
            baseline_coverage,
            format,
        } => {
            let config = resolve_config(cli.config.as_deref())?;
            let mut truth = GroundTruth::new();
            if let Some(path) = defects {
                truth = truth.with_defects(load_defects(&path)?);
            }
            if let Some(baseline) = baseline_coverage {
                truth = truth.with_baseline_coverage(baseline);
            }
            compare::run(&input, &params.to_parameters(), &truth, &format, &config)
        }
    }
}

/// An explicit `--config` must load; discovery falls back to defaults
fn resolve_config(path: Option<&Path>) -> Result<EngineConfig> {
    match path {
        Some(path) => EngineConfig::from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display())),
        None => Ok(load_engine_config(Path::new("."))),
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CandidateFile {
    List(Vec<Candidate>),
    Wrapped { candidates: Vec<Candidate> },
}

/// Read candidates from a JSON array or a `{"candidates": [...]}` object
pub fn load_candidates(path: &Path) -> Result<Vec<Candidate>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let file: CandidateFile = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse candidates from {}", path.display()))?;
    let candidates = match file {
        CandidateFile::List(candidates) => candidates,
        CandidateFile::Wrapped { candidates } => candidates,
    };
    debug!("Loaded {} candidates from {}", candidates.len(), path.display());
    Ok(candidates)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DefectFile {
    List(Vec<DefectLabel>),
    Wrapped { defects: Vec<DefectLabel> },
}

/// Read defect labels from a JSON array or a `{"defects": [...]}` object
pub fn load_defects(path: &Path) -> Result<Vec<DefectLabel>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let file: DefectFile = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse defect labels from {}", path.display()))?;
    let labels = match file {
        DefectFile::List(labels) => labels,
        DefectFile::Wrapped { defects } => defects,
    };
    debug!("Loaded {} defect labels from {}", labels.len(), path.display());
    Ok(labels)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_prioritize() {
        let cli = Cli::parse_from([
            "riskplan",
            "prioritize",
            "risks.json",
            "--strategy",
            "budget_optimization",
            "--budget-hours",
            "12.5",
            "--format",
            "json",
        ]);
        match cli.command {
            Commands::Prioritize {
                strategy, params, format, ..
            } => {
                assert_eq!(strategy, "budget_optimization");
                assert_eq!(params.budget_hours, Some(12.5));
                assert_eq!(format, "json");
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_cli_rejects_strategy_with_policy() {
        let result = Cli::try_parse_from([
            "riskplan",
            "prioritize",
            "risks.json",
            "--strategy",
            "top_k_coverage",
            "--policy",
            "sprint",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_load_candidates_both_shapes() {
        let dir = tempfile::tempdir().unwrap();
        let list = dir.path().join("list.json");
        std::fs::write(&list, r#"[{"id": "A", "risk_score": 0.5, "loc": 10}]"#).unwrap();
        let wrapped = dir.path().join("wrapped.json");
        std::fs::write(
            &wrapped,
            r#"{"candidates": [{"id": "A", "risk_score": 0.5}, {"id": "B", "risk_score": 0.1}]}"#,
        )
        .unwrap();

        assert_eq!(load_candidates(&list).unwrap().len(), 1);
        assert_eq!(load_candidates(&wrapped).unwrap().len(), 2);
        assert!(load_candidates(&dir.path().join("missing.json")).is_err());
    }

    #[test]
    fn test_load_defects() {
        let dir = tempfile::tempdir().unwrap();
        let list = dir.path().join("bugs.json");
        std::fs::write(
            &list,
            r#"[{"class_name": "A", "has_defect": true}, {"id": "B"}]"#,
        )
        .unwrap();
        let labels = load_defects(&list).unwrap();
        assert_eq!(labels, vec![DefectLabel::new("A", true), DefectLabel::new("B", false)]);

        let wrapped = dir.path().join("wrapped.json");
        std::fs::write(&wrapped, r#"{"defects": [{"class_name": "A", "has_defect": true}]}"#)
            .unwrap();
        assert_eq!(load_defects(&wrapped).unwrap().len(), 1);

        std::fs::write(&list, r#"{"labels": []}"#).unwrap();
        assert!(load_defects(&list).is_err());
    }
}
