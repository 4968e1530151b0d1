//! 0/1 selection solver
//!
//! The constrained strategies are modelled as a single [`Formulation`]: one
//! binary decision per candidate, up to three linear constraints (effort
//! budget, risk floor, cardinality cap) and an objective (maximize selected
//! risk, or minimize selected effort).
//!
//! Two [`SelectionSolver`] implementations answer a formulation:
//!
//! - [`BranchAndBound`]: exact depth-first search with relaxation bounds
//! - [`Greedy`]: deterministic heuristic over the canonical ranking order
//!
//! [`SolverFacade`] runs the exact solver on a worker thread under a
//! wall-clock timeout and falls back to greedy when the exact path is
//! disabled, too large, or too slow. Every returned selection has passed
//! [`Formulation::check`].
//!
//! Items are always passed in canonical ranking order (effort-aware score
//! descending), and selections are returned as ascending indices into that
//! order.

mod exact;
mod greedy;

pub use exact::BranchAndBound;
pub use greedy::Greedy;

use crate::config::SolverConfig;
use crate::error::{PrioritizeError, Result};
use crate::models::{EnrichedCandidate, SolverPath};
use crossbeam_channel::{bounded, RecvTimeoutError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Risk and effort of one candidate, as seen by the solver
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Item {
    pub risk: f64,
    pub effort: f64,
}

impl From<&EnrichedCandidate> for Item {
    fn from(c: &EnrichedCandidate) -> Self {
        Self {
            risk: c.risk_score(),
            effort: c.effort_hours,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Objective {
    MaximizeRisk,
    MinimizeEffort,
}

/// A 0/1 selection problem over a list of [`Item`]s
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Formulation {
    pub objective: Objective,
    /// `sum(effort) <= budget_hours`
    pub budget_hours: Option<f64>,
    /// `sum(risk) >= min_risk`
    pub min_risk: Option<f64>,
    /// `count <= max_count`
    pub max_count: Option<usize>,
}

/// Slack allowed on every constraint: relative 1e-9, absolute near zero
pub(crate) fn tolerance(bound: f64) -> f64 {
    1e-9 * bound.abs().max(1.0)
}

impl Formulation {
    /// Maximize risk within an effort budget
    pub fn budget(budget_hours: f64) -> Self {
        Self {
            objective: Objective::MaximizeRisk,
            budget_hours: Some(budget_hours),
            min_risk: None,
            max_count: None,
        }
    }

    /// Minimize effort while reaching a risk floor
    pub fn coverage(min_risk: f64) -> Self {
        Self {
            objective: Objective::MinimizeEffort,
            budget_hours: None,
            min_risk: Some(min_risk),
            max_count: None,
        }
    }

    /// Maximize risk under a budget, a risk floor and an optional size cap
    pub fn multi(budget_hours: f64, min_risk: f64, max_count: Option<usize>) -> Self {
        Self {
            objective: Objective::MaximizeRisk,
            budget_hours: Some(budget_hours),
            min_risk: Some(min_risk),
            max_count,
        }
    }

    pub fn within_budget(&self, effort: f64) -> bool {
        self.budget_hours
            .map_or(true, |budget| effort <= budget + tolerance(budget))
    }

    pub fn meets_risk(&self, risk: f64) -> bool {
        self.min_risk
            .map_or(true, |floor| risk >= floor - tolerance(floor))
    }

    pub fn within_count(&self, count: usize) -> bool {
        self.max_count.map_or(true, |cap| count <= cap)
    }

    /// Verify that `selection` satisfies every active constraint
    pub fn check(&self, items: &[Item], selection: &[usize]) -> Result<()> {
        let effort: f64 = selection.iter().map(|&i| items[i].effort).sum();
        let risk: f64 = selection.iter().map(|&i| items[i].risk).sum();

        if !self.within_budget(effort) {
            return Err(PrioritizeError::infeasible(
                "budget_hours",
                format!(
                    "selection needs {:.2}h, budget is {:.2}h",
                    effort,
                    self.budget_hours.unwrap_or_default()
                ),
            ));
        }
        if !self.meets_risk(risk) {
            return Err(PrioritizeError::infeasible(
                "target_coverage",
                format!(
                    "selection covers risk {:.4}, required {:.4}",
                    risk,
                    self.min_risk.unwrap_or_default()
                ),
            ));
        }
        if !self.within_count(selection.len()) {
            return Err(PrioritizeError::infeasible(
                "max_classes",
                format!(
                    "selection has {} classes, cap is {}",
                    selection.len(),
                    self.max_count.unwrap_or_default()
                ),
            ));
        }
        Ok(())
    }

    /// Reject problems that no selection can satisfy, before searching
    pub fn precheck(&self, items: &[Item]) -> Result<()> {
        if items.is_empty() {
            return Ok(());
        }
        if let Some(budget) = self.budget_hours {
            let cheapest = items
                .iter()
                .map(|item| item.effort)
                .fold(f64::INFINITY, f64::min);
            if !self.within_budget(cheapest) {
                return Err(PrioritizeError::infeasible(
                    "budget_hours",
                    format!(
                        "budget of {:.2}h is below the cheapest candidate ({:.2}h)",
                        budget, cheapest
                    ),
                ));
            }
        }
        if let Some(floor) = self.min_risk {
            let total: f64 = items.iter().map(|item| item.risk).sum();
            if !self.meets_risk(total) {
                return Err(PrioritizeError::infeasible(
                    "target_coverage",
                    format!(
                        "required risk {:.4} exceeds the total available ({:.4})",
                        floor, total
                    ),
                ));
            }
        }
        Ok(())
    }

    /// Name the constraint that makes the risk floor unreachable
    pub(crate) fn infeasibility(&self, items: &[Item]) -> PrioritizeError {
        let floor = self.min_risk.unwrap_or_default();
        if let Some(cap) = self.max_count {
            let mut risks: Vec<f64> = items.iter().map(|item| item.risk).collect();
            risks.sort_by(|a, b| b.total_cmp(a));
            let best: f64 = risks.iter().take(cap).sum();
            if !self.meets_risk(best) {
                return PrioritizeError::infeasible(
                    "max_classes",
                    format!(
                        "the {} riskiest classes cover {:.4}, required {:.4}",
                        cap, best, floor
                    ),
                );
            }
        }
        PrioritizeError::infeasible(
            "budget_hours",
            format!(
                "no selection within {:.2}h reaches the required risk {:.4}",
                self.budget_hours.unwrap_or_default(),
                floor
            ),
        )
    }
}

/// Cooperative stop condition polled by long-running solvers
#[derive(Debug, Clone, Default)]
pub struct StopSignal {
    cancel: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl StopSignal {
    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            cancel: Arc::new(AtomicBool::new(false)),
            deadline: Some(deadline),
        }
    }

    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }

    pub fn should_stop(&self) -> bool {
        self.cancel.load(Ordering::Relaxed)
            || self.deadline.is_some_and(|d| Instant::now() >= d)
    }
}

/// Why a solver returned without a selection
#[derive(Error, Debug)]
pub enum SolveError {
    #[error("solve interrupted before completion")]
    Interrupted,

    #[error(transparent)]
    Failed(#[from] PrioritizeError),
}

/// A strategy for answering a [`Formulation`]
pub trait SelectionSolver {
    fn name(&self) -> &'static str;

    /// Ascending indices of the selected items
    fn solve(
        &self,
        items: &[Item],
        formulation: &Formulation,
        stop: &StopSignal,
    ) -> std::result::Result<Vec<usize>, SolveError>;
}

/// Picks the exact or greedy path and enforces the exact-solve timeout
pub struct SolverFacade<'a> {
    config: &'a SolverConfig,
}

impl<'a> SolverFacade<'a> {
    pub fn new(config: &'a SolverConfig) -> Self {
        Self { config }
    }

    pub fn solve(
        &self,
        items: &[Item],
        formulation: &Formulation,
    ) -> Result<(Vec<usize>, SolverPath)> {
        formulation.precheck(items)?;

        if !self.config.exact_enabled {
            info!("Exact solver disabled, using greedy heuristic");
            return self.greedy(items, formulation, SolverPath::GreedyUnavailable);
        }
        if items.len() > self.config.max_exact_candidates {
            info!(
                "Exact solver unavailable for {} candidates (limit {}), using greedy heuristic",
                items.len(),
                self.config.max_exact_candidates
            );
            return self.greedy(items, formulation, SolverPath::GreedyUnavailable);
        }

        let timeout = self.config.timeout();
        let stop = StopSignal::with_deadline(Instant::now() + timeout);
        let (tx, rx) = bounded(1);
        {
            let items = items.to_vec();
            let formulation = *formulation;
            let stop = stop.clone();
            std::thread::spawn(move || {
                let result = BranchAndBound.solve(&items, &formulation, &stop);
                // Receiver is gone if the facade already timed out
                let _ = tx.send(result);
            });
        }

        match rx.recv_timeout(timeout + Duration::from_millis(50)) {
            Ok(Ok(selection)) => {
                formulation.check(items, &selection)?;
                debug!(
                    "{} selected {} of {}",
                    BranchAndBound.name(),
                    selection.len(),
                    items.len()
                );
                Ok((selection, SolverPath::Exact))
            }
            Ok(Err(SolveError::Failed(e))) => Err(e),
            Ok(Err(SolveError::Interrupted)) | Err(RecvTimeoutError::Timeout) => {
                stop.cancel();
                warn!(
                    "Exact solve exceeded {}ms, falling back to greedy heuristic",
                    timeout.as_millis()
                );
                self.greedy(items, formulation, SolverPath::GreedyTimeout)
            }
            Err(RecvTimeoutError::Disconnected) => Err(PrioritizeError::Internal(
                "exact solver worker terminated unexpectedly".to_string(),
            )),
        }
    }

    fn greedy(
        &self,
        items: &[Item],
        formulation: &Formulation,
        path: SolverPath,
    ) -> Result<(Vec<usize>, SolverPath)> {
        let selection = match Greedy.solve(items, formulation, &StopSignal::default()) {
            Ok(selection) => selection,
            Err(SolveError::Failed(e)) => return Err(e),
            Err(SolveError::Interrupted) => {
                return Err(PrioritizeError::Internal(
                    "greedy heuristic interrupted".to_string(),
                ))
            }
        };
        formulation.check(items, &selection)?;
        debug!(
            "{} selected {} of {} ({})",
            Greedy.name(),
            selection.len(),
            items.len(),
            path
        );
        Ok((selection, path))
    }
}
