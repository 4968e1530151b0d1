//! Plan-quality metrics
//!
//! All measures are pure functions of the full candidate set and the plan
//! order, independent of which strategy produced the plan.
//!
//! - **Popt@20**: share of plan risk captured within the first 20% of plan
//!   effort, interpolating inside the entry that crosses the cutoff.
//! - **Recall@Top20**: share of high-risk candidates (top 20% by risk value,
//!   ties included) that appear among the first 20 plan entries.
//! - **Coverage gain**: selected risk over total risk of all candidates.
//!
//! With observed defect labels ([`GroundTruth`]) Popt@20 and Recall@Top20
//! count labelled defects instead of risk. Popt@20 then counts only entries
//! that fit entirely within the effort cutoff. A baseline coverage turns the
//! coverage figure into the gain over that baseline.

use crate::config::MetricsConfig;
use crate::error::{PrioritizeError, Result};
use crate::models::{DefectLabel, EnrichedCandidate, MetricsBasis, PlanMetrics};
use std::collections::{HashMap, HashSet};

/// Observed outcomes measured against instead of predicted risk
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroundTruth {
    defects: Option<HashMap<String, bool>>,
    baseline_coverage: Option<f64>,
}

impl GroundTruth {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use defect labels; a later label for the same class wins
    pub fn with_defects(mut self, labels: impl IntoIterator<Item = DefectLabel>) -> Self {
        self.defects = Some(
            labels
                .into_iter()
                .map(|label| (label.class_name, label.has_defect))
                .collect(),
        );
        self
    }

    /// Report coverage as the gain over `baseline`, a share in [0, 1]
    pub fn with_baseline_coverage(mut self, baseline: f64) -> Self {
        self.baseline_coverage = Some(baseline);
        self
    }

    pub fn has_defects(&self) -> bool {
        self.defects.is_some()
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(baseline) = self.baseline_coverage {
            if !(baseline.is_finite() && (0.0..=1.0).contains(&baseline)) {
                return Err(PrioritizeError::invalid_parameter(
                    "baseline_coverage",
                    format!("must be within [0, 1], got {}", baseline),
                ));
            }
        }
        Ok(())
    }

    fn is_defective(&self, id: &str) -> bool {
        self.defects
            .as_ref()
            .and_then(|defects| defects.get(id))
            .copied()
            .unwrap_or(false)
    }

    fn defect_count(&self) -> usize {
        self.defects
            .as_ref()
            .map_or(0, |defects| defects.values().filter(|&&d| d).count())
    }
}

/// Computes [`PlanMetrics`] with configured windows
pub struct RankingMetrics<'a> {
    config: &'a MetricsConfig,
    truth: Option<&'a GroundTruth>,
}

impl<'a> RankingMetrics<'a> {
    pub fn new(config: &'a MetricsConfig) -> Self {
        Self {
            config,
            truth: None,
        }
    }

    /// Measure against observed outcomes instead of the risk proxy
    pub fn with_ground_truth(mut self, truth: &'a GroundTruth) -> Self {
        self.truth = Some(truth);
        self
    }

    pub fn compute(&self, all: &[EnrichedCandidate], plan: &[EnrichedCandidate]) -> PlanMetrics {
        let total_effort_hours: f64 = plan.iter().map(|c| c.effort_hours).sum();
        let total_risk_selected: f64 = plan.iter().map(|c| c.risk_score()).sum();
        let total_risk_all: f64 = all.iter().map(|c| c.risk_score()).sum();
        let avg_effort_aware_score = if plan.is_empty() {
            0.0
        } else {
            plan.iter().map(|c| c.effort_aware_score).sum::<f64>() / plan.len() as f64
        };

        let mut coverage = coverage_gain(all, plan, self.config.coverage_window);
        if let Some(baseline) = self.truth.and_then(|t| t.baseline_coverage) {
            coverage = (coverage - baseline).max(0.0);
        }

        let (basis, popt20_score, recall_top20) = match self.truth.filter(|t| t.has_defects()) {
            Some(truth) => (
                MetricsBasis::Defects,
                popt_defects(plan, self.config.popt_effort_fraction, truth),
                recall_defects(plan, self.config.recall_window, truth),
            ),
            None => (
                MetricsBasis::RiskProxy,
                popt(plan, self.config.popt_effort_fraction),
                recall(
                    all,
                    plan,
                    self.config.recall_window,
                    self.config.recall_top_fraction,
                ),
            ),
        };

        PlanMetrics {
            basis,
            total_effort_hours,
            total_risk_selected,
            total_risk_all,
            estimated_coverage_gain: coverage,
            popt20_score,
            recall_top20,
            selected_count: plan.len(),
            candidate_count: all.len(),
            avg_effort_aware_score,
        }
    }
}

/// Share of plan risk captured within `effort_fraction` of plan effort
pub fn popt(plan: &[EnrichedCandidate], effort_fraction: f64) -> f64 {
    let total_effort: f64 = plan.iter().map(|c| c.effort_hours).sum();
    let total_risk: f64 = plan.iter().map(|c| c.risk_score()).sum();
    if total_effort <= 0.0 || total_risk <= 0.0 {
        return 0.0;
    }

    let cutoff = total_effort * effort_fraction;
    let mut effort = 0.0;
    let mut risk = 0.0;
    for c in plan {
        if effort + c.effort_hours >= cutoff {
            let share = (cutoff - effort) / c.effort_hours;
            risk += c.risk_score() * share;
            break;
        }
        effort += c.effort_hours;
        risk += c.risk_score();
    }

    (risk / total_risk).clamp(0.0, 1.0)
}

/// Ids of the high-risk candidates: risk at or above the value of the
/// `ceil(top_fraction × n)`-th riskiest, excluding zero-risk ones
pub fn high_risk_ids(all: &[EnrichedCandidate], top_fraction: f64) -> HashSet<&str> {
    if all.is_empty() {
        return HashSet::new();
    }
    let mut risks: Vec<f64> = all.iter().map(|c| c.risk_score()).collect();
    risks.sort_by(|a, b| b.total_cmp(a));
    let cut = ((top_fraction * all.len() as f64).ceil() as usize).clamp(1, all.len());
    let threshold = risks[cut - 1];

    all.iter()
        .filter(|c| c.risk_score() > 0.0 && c.risk_score() >= threshold)
        .map(|c| c.id())
        .collect()
}

/// Share of high-risk candidates found in the first `window` plan entries
pub fn recall(
    all: &[EnrichedCandidate],
    plan: &[EnrichedCandidate],
    window: usize,
    top_fraction: f64,
) -> f64 {
    let high = high_risk_ids(all, top_fraction);
    if high.is_empty() {
        return 0.0;
    }
    let hits = plan
        .iter()
        .take(window)
        .filter(|c| high.contains(c.id()))
        .count();
    hits as f64 / high.len() as f64
}

/// Selected risk over total risk; `window > 0` counts only the first
/// `window` plan entries
pub fn coverage_gain(all: &[EnrichedCandidate], plan: &[EnrichedCandidate], window: usize) -> f64 {
    let total: f64 = all.iter().map(|c| c.risk_score()).sum();
    if total <= 0.0 {
        return 0.0;
    }
    let take = if window == 0 { plan.len() } else { window };
    let selected: f64 = plan.iter().take(take).map(|c| c.risk_score()).sum();
    (selected / total).clamp(0.0, 1.0)
}

/// Share of labelled defects in entries that fit within `effort_fraction`
/// of plan effort
pub fn popt_defects(plan: &[EnrichedCandidate], effort_fraction: f64, truth: &GroundTruth) -> f64 {
    let total_defects = truth.defect_count();
    let total_effort: f64 = plan.iter().map(|c| c.effort_hours).sum();
    if total_defects == 0 || total_effort <= 0.0 {
        return 0.0;
    }

    let cutoff = total_effort * effort_fraction;
    let mut effort = 0.0;
    let mut found = 0;
    for c in plan {
        if effort + c.effort_hours > cutoff + 1e-9 {
            break;
        }
        effort += c.effort_hours;
        if truth.is_defective(c.id()) {
            found += 1;
        }
    }
    found as f64 / total_defects as f64
}

/// Share of labelled defects found in the first `window` plan entries
pub fn recall_defects(plan: &[EnrichedCandidate], window: usize, truth: &GroundTruth) -> f64 {
    let total_defects = truth.defect_count();
    if total_defects == 0 {
        return 0.0;
    }
    let found = plan
        .iter()
        .take(window)
        .filter(|c| truth.is_defective(c.id()))
        .count();
    found as f64 / total_defects as f64
}
