//! Engine configuration support
//!
//! Loads engine configuration from `riskplan.toml` or `.riskplanrc.json`.
//! Every component receives the configuration explicitly; nothing is read
//! from process-wide state.
//!
//! # Configuration Format
//!
//! ```toml
//! # riskplan.toml
//!
//! [effort]
//! loc_per_hour = 50.0
//! min_effort_hours = 0.5
//! max_effort_hours = 40.0
//! tiers = [
//!     { min_complexity = 0, multiplier = 1.0 },
//!     { min_complexity = 11, multiplier = 1.25 },
//!     { min_complexity = 21, multiplier = 1.5 },
//! ]
//!
//! [criticality]
//! weights = { high = 1.5, medium = 1.2, low = 1.0 }
//! rules = [{ pattern = "auth|payment|security", level = "high" }]
//!
//! [solver]
//! timeout_ms = 2000
//!
//! [policies.sprint]
//! strategy = "budget_optimization"
//! budget_hours = 40.0
//! ```

use crate::error::{PrioritizeError, Result};
use crate::models::Criticality;
use crate::strategy::StrategyParameters;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, warn};

/// Config file names, searched in this order
pub const CONFIG_FILE_NAMES: &[&str] = &["riskplan.toml", ".riskplanrc.json"];

/// Engine configuration loaded from riskplan.toml or similar
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
pub struct EngineConfig {
    /// Effort estimation constants
    #[serde(default)]
    pub effort: EffortConfig,

    /// Module criticality rules and weights
    #[serde(default)]
    pub criticality: CriticalityConfig,

    /// Optimization solver limits
    #[serde(default)]
    pub solver: SolverConfig,

    /// Ranking metric windows
    #[serde(default)]
    pub metrics: MetricsConfig,

    /// Named strategy presets
    #[serde(default)]
    pub policies: BTreeMap<String, Policy>,
}

/// Effort estimation constants
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct EffortConfig {
    /// Lines of code tested per hour (default: 50)
    #[serde(default = "default_loc_per_hour")]
    pub loc_per_hour: f64,

    /// Effort floor in hours (default: 0.5)
    #[serde(default = "default_min_effort_hours")]
    pub min_effort_hours: f64,

    /// Effort ceiling in hours (default: 40)
    #[serde(default = "default_max_effort_hours")]
    pub max_effort_hours: f64,

    /// Mock setup cost per declared dependency (default: 0.05h)
    #[serde(default = "default_hours_per_dependency")]
    pub hours_per_dependency: f64,

    /// Extra cost per declared method (default: 0.1h)
    #[serde(default = "default_hours_per_method")]
    pub hours_per_method: f64,

    /// Complexity bands, ordered by `min_complexity`
    #[serde(default = "default_tiers")]
    pub tiers: Vec<ComplexityTier>,
}

impl Default for EffortConfig {
    fn default() -> Self {
        Self {
            loc_per_hour: default_loc_per_hour(),
            min_effort_hours: default_min_effort_hours(),
            max_effort_hours: default_max_effort_hours(),
            hours_per_dependency: default_hours_per_dependency(),
            hours_per_method: default_hours_per_method(),
            tiers: default_tiers(),
        }
    }
}

fn default_loc_per_hour() -> f64 {
    50.0
}
fn default_min_effort_hours() -> f64 {
    0.5
}
fn default_max_effort_hours() -> f64 {
    40.0
}
fn default_hours_per_dependency() -> f64 {
    0.05
}
fn default_hours_per_method() -> f64 {
    0.1
}
fn default_tiers() -> Vec<ComplexityTier> {
    vec![
        ComplexityTier {
            min_complexity: 0,
            multiplier: 1.0,
        },
        ComplexityTier {
            min_complexity: 11,
            multiplier: 1.25,
        },
        ComplexityTier {
            min_complexity: 21,
            multiplier: 1.5,
        },
    ]
}

/// One complexity band: applies from `min_complexity` up to the next band
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq)]
pub struct ComplexityTier {
    pub min_complexity: u32,
    pub multiplier: f64,
}

/// Module criticality rules and weights
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct CriticalityConfig {
    #[serde(default)]
    pub weights: CriticalityWeights,

    /// Level used when no rule matches (default: low)
    #[serde(default)]
    pub default_level: Criticality,

    /// Ordered rules; first match wins
    #[serde(default = "default_rules")]
    pub rules: Vec<CriticalityRule>,
}

impl Default for CriticalityConfig {
    fn default() -> Self {
        Self {
            weights: CriticalityWeights::default(),
            default_level: Criticality::Low,
            rules: default_rules(),
        }
    }
}

fn default_rules() -> Vec<CriticalityRule> {
    vec![
        CriticalityRule::new(
            "auth|security|payment|billing|transaction",
            Criticality::High,
        ),
        CriticalityRule::new(
            r"database|\bdb\b|persistence|api|controller|service",
            Criticality::Medium,
        ),
        CriticalityRule::new("util|helper|common|shared", Criticality::Low),
    ]
}

/// A case-insensitive regex tested against the module path
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct CriticalityRule {
    pub pattern: String,
    pub level: Criticality,
}

impl CriticalityRule {
    pub fn new(pattern: impl Into<String>, level: Criticality) -> Self {
        Self {
            pattern: pattern.into(),
            level,
        }
    }
}

/// Multiplicative weight per criticality level
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct CriticalityWeights {
    #[serde(default = "default_high_weight")]
    pub high: f64,
    #[serde(default = "default_medium_weight")]
    pub medium: f64,
    #[serde(default = "default_low_weight")]
    pub low: f64,
}

impl Default for CriticalityWeights {
    fn default() -> Self {
        Self {
            high: default_high_weight(),
            medium: default_medium_weight(),
            low: default_low_weight(),
        }
    }
}

fn default_high_weight() -> f64 {
    1.5
}
fn default_medium_weight() -> f64 {
    1.2
}
fn default_low_weight() -> f64 {
    1.0
}

impl CriticalityWeights {
    pub fn weight(&self, level: Criticality) -> f64 {
        match level {
            Criticality::High => self.high,
            Criticality::Medium => self.medium,
            Criticality::Low => self.low,
        }
    }
}

/// Optimization solver limits
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct SolverConfig {
    /// Try the exact branch-and-bound solve before the greedy heuristic
    #[serde(default = "default_exact_enabled")]
    pub exact_enabled: bool,

    /// Wall-clock limit for the exact solve (default: 2000ms)
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Above this many candidates the exact solver reports itself unavailable
    #[serde(default = "default_max_exact_candidates")]
    pub max_exact_candidates: usize,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            exact_enabled: default_exact_enabled(),
            timeout_ms: default_timeout_ms(),
            max_exact_candidates: default_max_exact_candidates(),
        }
    }
}

fn default_exact_enabled() -> bool {
    true
}
fn default_timeout_ms() -> u64 {
    2000
}
fn default_max_exact_candidates() -> usize {
    256
}

impl SolverConfig {
    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.timeout_ms)
    }
}

/// Ranking metric windows
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct MetricsConfig {
    /// Share of total plan effort inspected by Popt (default: 0.2)
    #[serde(default = "default_popt_effort_fraction")]
    pub popt_effort_fraction: f64,

    /// Number of leading plan entries inspected by recall (default: 20)
    #[serde(default = "default_recall_window")]
    pub recall_window: usize,

    /// Share of candidates, by risk value, counted as high-risk (default: 0.2)
    #[serde(default = "default_recall_top_fraction")]
    pub recall_top_fraction: f64,

    /// Coverage gain window: 0 = whole plan, N = first N entries only
    #[serde(default)]
    pub coverage_window: usize,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            popt_effort_fraction: default_popt_effort_fraction(),
            recall_window: default_recall_window(),
            recall_top_fraction: default_recall_top_fraction(),
            coverage_window: 0,
        }
    }
}

fn default_popt_effort_fraction() -> f64 {
    0.2
}
fn default_recall_window() -> usize {
    20
}
fn default_recall_top_fraction() -> f64 {
    0.2
}

/// A named strategy preset
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct Policy {
    pub strategy: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(flatten)]
    pub parameters: StrategyParameters,
}

impl Policy {
    /// Strategy name and raw parameters, resolved like a request
    pub fn strategy_parameters(&self) -> (&str, &StrategyParameters) {
        (&self.strategy, &self.parameters)
    }
}

impl EngineConfig {
    /// Load configuration from an explicit file path.
    ///
    /// The format is picked from the extension (`.json` → JSON, otherwise TOML).
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let config = if path.extension().and_then(|e| e.to_str()) == Some("json") {
            load_json_config(path)?
        } else {
            load_toml_config(path)?
        };
        config.validate()?;
        Ok(config)
    }

    /// Look up a named policy
    pub fn policy(&self, name: &str) -> Result<&Policy> {
        self.policies.get(name).ok_or_else(|| {
            let known: Vec<&str> = self.policies.keys().map(String::as_str).collect();
            PrioritizeError::invalid_parameter(
                "policy",
                if known.is_empty() {
                    format!("no policy named '{}' (none configured)", name)
                } else {
                    format!("no policy named '{}'. Known: {}", name, known.join(", "))
                },
            )
        })
    }

    /// Check all constants for internal consistency
    pub fn validate(&self) -> Result<()> {
        let e = &self.effort;
        if !(e.loc_per_hour.is_finite() && e.loc_per_hour > 0.0) {
            return Err(config_error("effort.loc_per_hour must be > 0"));
        }
        if !(e.min_effort_hours.is_finite() && e.min_effort_hours > 0.0) {
            return Err(config_error("effort.min_effort_hours must be > 0"));
        }
        if !(e.max_effort_hours.is_finite() && e.max_effort_hours >= e.min_effort_hours) {
            return Err(config_error(
                "effort.max_effort_hours must be >= effort.min_effort_hours",
            ));
        }
        for (name, hours) in [
            ("hours_per_dependency", e.hours_per_dependency),
            ("hours_per_method", e.hours_per_method),
        ] {
            if !(hours.is_finite() && hours >= 0.0) {
                return Err(config_error(&format!(
                    "effort.{} must be a finite value >= 0, got {}",
                    name, hours
                )));
            }
        }
        if e.tiers.is_empty() {
            return Err(config_error("effort.tiers must contain at least one tier"));
        }
        for pair in e.tiers.windows(2) {
            if pair[1].min_complexity <= pair[0].min_complexity {
                return Err(config_error(
                    "effort.tiers must be sorted by strictly increasing min_complexity",
                ));
            }
            if pair[1].multiplier < pair[0].multiplier {
                return Err(config_error(
                    "effort.tiers multipliers must not decrease with complexity",
                ));
            }
        }
        if e.tiers.iter().any(|t| !(t.multiplier.is_finite() && t.multiplier > 0.0)) {
            return Err(config_error("effort.tiers multipliers must be > 0"));
        }

        let w = &self.criticality.weights;
        for (name, weight) in [("high", w.high), ("medium", w.medium), ("low", w.low)] {
            if !(weight.is_finite() && weight > 0.0) {
                return Err(config_error(&format!(
                    "criticality.weights.{} must be > 0, got {}",
                    name, weight
                )));
            }
        }
        for rule in &self.criticality.rules {
            if let Err(e) = regex::Regex::new(&rule.pattern) {
                return Err(config_error(&format!(
                    "criticality rule '{}' is not a valid regex: {}",
                    rule.pattern, e
                )));
            }
        }

        if self.solver.timeout_ms == 0 {
            return Err(config_error("solver.timeout_ms must be > 0"));
        }

        let m = &self.metrics;
        for (name, fraction) in [
            ("popt_effort_fraction", m.popt_effort_fraction),
            ("recall_top_fraction", m.recall_top_fraction),
        ] {
            if !(fraction > 0.0 && fraction <= 1.0) {
                return Err(config_error(&format!(
                    "metrics.{} must be in (0, 1], got {}",
                    name, fraction
                )));
            }
        }
        if m.recall_window == 0 {
            return Err(config_error("metrics.recall_window must be >= 1"));
        }

        Ok(())
    }
}

fn config_error(message: &str) -> PrioritizeError {
    PrioritizeError::Config(message.to_string())
}

/// Load engine configuration from a directory.
///
/// Searches for configuration files in this order:
/// 1. `riskplan.toml`
/// 2. `.riskplanrc.json`
///
/// Returns default configuration if no usable config file is found.
pub fn load_engine_config(dir: &Path) -> EngineConfig {
    for name in CONFIG_FILE_NAMES {
        let path = dir.join(name);
        if !path.exists() {
            continue;
        }
        match EngineConfig::from_file(&path) {
            Ok(config) => {
                debug!("Loaded engine config from {}", path.display());
                return config;
            }
            Err(e) => {
                warn!("Failed to load {}: {}", path.display(), e);
            }
        }
    }

    debug!("No engine config found, using defaults");
    EngineConfig::default()
}

/// Load configuration from a TOML file
fn load_toml_config(path: &Path) -> anyhow::Result<EngineConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: EngineConfig = toml::from_str(&content)?;
    Ok(config)
}

/// Load configuration from a JSON file
fn load_json_config(path: &Path) -> anyhow::Result<EngineConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: EngineConfig = serde_json::from_str(&content)?;
    Ok(config)
}

/// Example file written by `riskplan init`
pub const EXAMPLE_CONFIG: &str = r#"# riskplan configuration

[effort]
# Lines of code a tester covers per hour
loc_per_hour = 50.0
min_effort_hours = 0.5
max_effort_hours = 40.0
# Mock setup cost per dependency, extra cost per method
hours_per_dependency = 0.05
hours_per_method = 0.1
# Complexity multiplier bands (must not decrease)
tiers = [
    { min_complexity = 0, multiplier = 1.0 },
    { min_complexity = 11, multiplier = 1.25 },
    { min_complexity = 21, multiplier = 1.5 },
]

[criticality]
default_level = "low"
weights = { high = 1.5, medium = 1.2, low = 1.0 }
# Case-insensitive regexes tested against module_path, first match wins
rules = [
    { pattern = "auth|security|payment|billing|transaction", level = "high" },
    { pattern = 'database|\bdb\b|persistence|api|controller|service', level = "medium" },
    { pattern = "util|helper|common|shared", level = "low" },
]

[solver]
exact_enabled = true
timeout_ms = 2000
max_exact_candidates = 256

[metrics]
popt_effort_fraction = 0.2
recall_window = 20
recall_top_fraction = 0.2
# 0 = coverage gain over the whole plan, N = first N entries only
coverage_window = 0

[policies.sprint]
strategy = "budget_optimization"
description = "Fit one sprint of testing effort"
budget_hours = 40.0

[policies.release]
strategy = "multi_objective"
budget_hours = 80.0
target_coverage = 0.8
max_classes = 30
"#;
