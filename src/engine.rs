//! Engine boundary: validation, enrichment, strategy dispatch, assembly
//!
//! Every call is independent. The engine keeps no state between calls, so
//! concurrent requests need no coordination.

use crate::config::EngineConfig;
use crate::error::{PrioritizeError, Result};
use crate::metrics::GroundTruth;
use crate::models::{
    Candidate, EnrichedCandidate, MetricsBasis, PlanMetrics, PrioritizationPlan, SolverPath,
};
use crate::plan::PlanAssembler;
use crate::scoring::Enricher;
use crate::strategy::{Strategy, StrategyParameters, STRATEGY_NAMES};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{error, info};

/// Rank `candidates` with the named strategy.
///
/// An empty candidate set yields an empty plan with zero-valued metrics.
/// No partial plan is ever returned: any failure, including a panic while
/// solving, surfaces as an error.
pub fn prioritize(
    candidates: &[Candidate],
    strategy: &str,
    params: &StrategyParameters,
    config: &EngineConfig,
) -> Result<PrioritizationPlan> {
    config.validate()?;
    let strategy = Strategy::resolve(strategy, params)?;
    validate_candidates(candidates)?;

    if candidates.is_empty() {
        info!("No candidates, returning empty {} plan", strategy.name());
        return Ok(PrioritizationPlan::empty(strategy.name()));
    }

    let enriched = Enricher::new(config)?.enrich(candidates);
    info!("Prioritizing {} candidates with {}", enriched.len(), strategy);
    let plan = guarded(strategy.name(), || {
        run_strategy(&strategy, &enriched, config, None)
    })?;
    info!(
        "Plan: {} entries, {:.1}h, coverage {:.1}%, popt20 {:.3} ({})",
        plan.len(),
        plan.metrics.total_effort_hours,
        plan.metrics.estimated_coverage_gain * 100.0,
        plan.metrics.popt20_score,
        plan.solver
    );
    Ok(plan)
}

/// Rank `candidates` with a named policy from the configuration.
///
/// Parameters in `overrides` take precedence over the policy's own.
pub fn prioritize_with_policy(
    candidates: &[Candidate],
    policy: &str,
    overrides: &StrategyParameters,
    config: &EngineConfig,
) -> Result<PrioritizationPlan> {
    let policy = config.policy(policy)?;
    let (strategy, params) = policy.strategy_parameters();
    prioritize(candidates, strategy, &overrides.or(params), config)
}

/// Outcome of one strategy in [`compare_strategies`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyComparison {
    pub strategy: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<PlanMetrics>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub solver: Option<SolverPath>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StrategyComparison {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Run every strategy over the same candidates with the same parameters.
///
/// Fails only for invalid configuration or candidates; a strategy that
/// rejects its parameters or finds its constraints infeasible is reported
/// in its own row.
pub fn compare_strategies(
    candidates: &[Candidate],
    params: &StrategyParameters,
    config: &EngineConfig,
) -> Result<Vec<StrategyComparison>> {
    compare_strategies_against(candidates, params, &GroundTruth::default(), config)
}

/// [`compare_strategies`], measuring every plan against `truth`
pub fn compare_strategies_against(
    candidates: &[Candidate],
    params: &StrategyParameters,
    truth: &GroundTruth,
    config: &EngineConfig,
) -> Result<Vec<StrategyComparison>> {
    config.validate()?;
    truth.validate()?;
    validate_candidates(candidates)?;
    let enriched = Enricher::new(config)?.enrich(candidates);
    info!(
        "Comparing {} strategies over {} candidates",
        STRATEGY_NAMES.len(),
        enriched.len()
    );

    let rows: Vec<StrategyComparison> = STRATEGY_NAMES
        .par_iter()
        .map(|&name| {
            let outcome = Strategy::resolve(name, params).and_then(|strategy| {
                if enriched.is_empty() {
                    let mut plan = PrioritizationPlan::empty(name);
                    if truth.has_defects() {
                        plan.metrics.basis = MetricsBasis::Defects;
                    }
                    return Ok(plan);
                }
                guarded(name, || run_strategy(&strategy, &enriched, config, Some(truth)))
            });
            match outcome {
                Ok(plan) => StrategyComparison {
                    strategy: name.to_string(),
                    metrics: Some(plan.metrics),
                    solver: Some(plan.solver),
                    error: None,
                },
                Err(e) => StrategyComparison {
                    strategy: name.to_string(),
                    metrics: None,
                    solver: None,
                    error: Some(e.to_string()),
                },
            }
        })
        .collect();
    Ok(rows)
}

fn run_strategy(
    strategy: &Strategy,
    enriched: &[EnrichedCandidate],
    config: &EngineConfig,
    truth: Option<&GroundTruth>,
) -> Result<PrioritizationPlan> {
    let selection = strategy.apply(enriched, &config.solver)?;
    let mut assembler = PlanAssembler::new(&config.metrics);
    if let Some(truth) = truth {
        assembler = assembler.with_ground_truth(truth);
    }
    assembler.assemble(
        strategy.name(),
        enriched,
        selection.entries,
        selection.solver,
        strategy.permits_empty(enriched),
    )
}

/// Turn a panic inside `f` into [`PrioritizeError::Internal`]
fn guarded<T>(strategy: &str, f: impl FnOnce() -> Result<T>) -> Result<T> {
    match std::panic::catch_unwind(std::panic::AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(panic_info) => {
            let panic_msg = if let Some(s) = panic_info.downcast_ref::<&str>() {
                s.to_string()
            } else if let Some(s) = panic_info.downcast_ref::<String>() {
                s.clone()
            } else {
                "Unknown panic".to_string()
            };
            error!("Strategy {} panicked: {}", strategy, panic_msg);
            Err(PrioritizeError::Internal(format!(
                "{} failed: {}",
                strategy, panic_msg
            )))
        }
    }
}

/// Reject malformed candidates before any scoring
pub fn validate_candidates(candidates: &[Candidate]) -> Result<()> {
    let mut seen = HashSet::with_capacity(candidates.len());
    for c in candidates {
        if c.id.trim().is_empty() {
            return Err(PrioritizeError::InvalidCandidate {
                id: c.id.clone(),
                reason: "id must not be empty".to_string(),
            });
        }
        if !c.risk_score.is_finite() || !(0.0..=1.0).contains(&c.risk_score) {
            return Err(PrioritizeError::InvalidCandidate {
                id: c.id.clone(),
                reason: format!("risk_score must be within [0, 1], got {}", c.risk_score),
            });
        }
        if !seen.insert(c.id.as_str()) {
            return Err(PrioritizeError::InvalidCandidate {
                id: c.id.clone(),
                reason: "duplicate id".to_string(),
            });
        }
    }
    Ok(())
}
