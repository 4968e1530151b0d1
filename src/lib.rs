//! riskplan - effort- and criticality-aware test prioritization
//!
//! Turns risk-scored classes into an ordered testing plan. Risk scores are
//! consumed as input; the engine estimates effort, weights module
//! criticality, selects a subset with one of five strategies and measures
//! the plan's ranking quality.
//!
//! ```no_run
//! use riskplan::{prioritize, Candidate, EngineConfig, StrategyParameters};
//!
//! let candidates = vec![
//!     Candidate::new("AuthService", 0.9, 200, 3).with_module("auth/service"),
//!     Candidate::new("StringUtil", 0.2, 50, 1).with_module("util"),
//! ];
//! let params = StrategyParameters { budget_hours: Some(8.0), ..Default::default() };
//! let plan = prioritize(&candidates, "budget_optimization", &params, &EngineConfig::default())?;
//! for entry in &plan.entries {
//!     println!("{}. {} ({})", entry.priority, entry.enriched.id(), entry.reason);
//! }
//! # Ok::<(), riskplan::PrioritizeError>(())
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod metrics;
pub mod models;
pub mod plan;
pub mod reporters;
pub mod scoring;
pub mod solver;
pub mod strategy;

pub use config::{load_engine_config, EngineConfig};
pub use engine::{
    compare_strategies, compare_strategies_against, prioritize, prioritize_with_policy,
    StrategyComparison,
};
pub use metrics::GroundTruth;
pub use error::{PrioritizeError, Result};
pub use models::{
    Candidate, Criticality, CriticalityStats, DefectLabel, EnrichedCandidate, MetricsBasis,
    PlanMetrics, PrioritizationPlan, PrioritizedEntry, SolverPath,
};
pub use strategy::{Strategy, StrategyParameters, STRATEGY_NAMES};
