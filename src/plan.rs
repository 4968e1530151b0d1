//! Plan assembly: priorities, reasons and metrics

use crate::config::MetricsConfig;
use crate::error::{PrioritizeError, Result};
use crate::metrics::{GroundTruth, RankingMetrics};
use crate::models::{
    CriticalityStats, EnrichedCandidate, PrioritizationPlan, PrioritizedEntry, SolverPath,
};

pub struct PlanAssembler<'a> {
    metrics: RankingMetrics<'a>,
}

/// `"{criticality} criticality, risk {risk:.2} ({strategy})"`
pub fn reason(candidate: &EnrichedCandidate, strategy: &str) -> String {
    format!(
        "{} criticality, risk {:.2} ({})",
        candidate.module_criticality,
        candidate.risk_score(),
        strategy
    )
}

impl<'a> PlanAssembler<'a> {
    pub fn new(config: &'a MetricsConfig) -> Self {
        Self {
            metrics: RankingMetrics::new(config),
        }
    }

    /// Measure plans against observed outcomes
    pub fn with_ground_truth(mut self, truth: &'a GroundTruth) -> Self {
        self.metrics = self.metrics.with_ground_truth(truth);
        self
    }

    /// Number the ordered selection `1..=N` and attach metrics.
    ///
    /// An empty selection from a non-empty candidate set is an error unless
    /// `permits_empty` is set.
    pub fn assemble(
        &self,
        strategy: &str,
        all: &[EnrichedCandidate],
        ordered: Vec<EnrichedCandidate>,
        solver: SolverPath,
        permits_empty: bool,
    ) -> Result<PrioritizationPlan> {
        if ordered.is_empty() && !all.is_empty() && !permits_empty {
            return Err(PrioritizeError::EmptyPlan {
                strategy: strategy.to_string(),
            });
        }

        let metrics = self.metrics.compute(all, &ordered);
        let entries = ordered
            .into_iter()
            .enumerate()
            .map(|(i, enriched)| PrioritizedEntry {
                reason: reason(&enriched, strategy),
                enriched,
                priority: i + 1,
                strategy: strategy.to_string(),
            })
            .collect();

        Ok(PrioritizationPlan {
            strategy: strategy.to_string(),
            entries,
            metrics,
            criticality: CriticalityStats::from_candidates(all),
            solver,
        })
    }
}
