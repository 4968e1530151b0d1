//! Selection strategies
//!
//! A request names a strategy and carries a loose parameter map
//! ([`StrategyParameters`]). [`Strategy::resolve`] validates both once and
//! produces a closed [`Strategy`] value whose variants hold only the
//! parameters they use; nothing downstream re-parses names or options.
//!
//! | Strategy | Parameters | Selection |
//! |---|---|---|
//! | `maximize_popt20` | none | every candidate, ranked |
//! | `top_k_coverage` | `k` (20) | first `k` ranked |
//! | `budget_optimization` | `budget_hours` (40) | max risk within budget |
//! | `coverage_optimization` | `target_coverage` (0.8) | min effort reaching coverage |
//! | `multi_objective` | all three + `max_classes` | max risk under every cap |

use crate::config::SolverConfig;
use crate::error::{PrioritizeError, Result};
use crate::models::{EnrichedCandidate, SolverPath};
use crate::solver::{Formulation, Item, SolverFacade};
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const DEFAULT_K: usize = 20;
pub const DEFAULT_BUDGET_HOURS: f64 = 40.0;
pub const DEFAULT_TARGET_COVERAGE: f64 = 0.8;

/// Canonical strategy names, in comparison order
pub const STRATEGY_NAMES: [&str; 5] = [
    "maximize_popt20",
    "top_k_coverage",
    "budget_optimization",
    "coverage_optimization",
    "multi_objective",
];

/// Raw, unvalidated strategy knobs as received from a caller
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StrategyParameters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub k: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget_hours: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_coverage: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_classes: Option<i64>,
}

impl StrategyParameters {
    /// Values set here win; unset ones come from `base`
    pub fn or(&self, base: &StrategyParameters) -> StrategyParameters {
        StrategyParameters {
            k: self.k.or(base.k),
            budget_hours: self.budget_hours.or(base.budget_hours),
            target_coverage: self.target_coverage.or(base.target_coverage),
            max_classes: self.max_classes.or(base.max_classes),
        }
    }

    fn k(&self) -> Result<usize> {
        match self.k {
            None => Ok(DEFAULT_K),
            Some(k) if k >= 1 => Ok(k as usize),
            Some(k) => Err(PrioritizeError::invalid_parameter(
                "k",
                format!("must be an integer >= 1, got {}", k),
            )),
        }
    }

    fn budget_hours(&self) -> Result<f64> {
        match self.budget_hours {
            None => Ok(DEFAULT_BUDGET_HOURS),
            Some(b) if b.is_finite() && b > 0.0 => Ok(b),
            Some(b) => Err(PrioritizeError::invalid_parameter(
                "budget_hours",
                format!("must be a finite number > 0, got {}", b),
            )),
        }
    }

    fn target_coverage(&self) -> Result<f64> {
        match self.target_coverage {
            None => Ok(DEFAULT_TARGET_COVERAGE),
            Some(t) if t.is_finite() && t > 1.0 => Err(PrioritizeError::infeasible(
                "target_coverage",
                format!("cannot cover more than all risk, got {}", t),
            )),
            Some(t) if t.is_finite() && t > 0.0 => Ok(t),
            Some(t) => Err(PrioritizeError::invalid_parameter(
                "target_coverage",
                format!("must be in (0, 1], got {}", t),
            )),
        }
    }

    fn max_classes(&self) -> Result<Option<usize>> {
        match self.max_classes {
            None => Ok(None),
            Some(m) if m >= 1 => Ok(Some(m as usize)),
            Some(m) => Err(PrioritizeError::invalid_parameter(
                "max_classes",
                format!("must be an integer >= 1, got {}", m),
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TopKParams {
    pub k: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BudgetParams {
    pub budget_hours: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoverageParams {
    pub target_coverage: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MultiObjectiveParams {
    pub budget_hours: f64,
    pub target_coverage: f64,
    pub max_classes: Option<usize>,
}

/// A validated strategy
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Strategy {
    MaximizePopt20,
    TopKCoverage(TopKParams),
    BudgetOptimization(BudgetParams),
    CoverageOptimization(CoverageParams),
    MultiObjective(MultiObjectiveParams),
}

/// Ordered output of a strategy
#[derive(Debug, Clone)]
pub struct Selection {
    pub entries: Vec<EnrichedCandidate>,
    pub solver: SolverPath,
}

/// Lowercase and accept `kebab-case` spellings
pub fn normalize_strategy_name(name: &str) -> String {
    name.trim().to_lowercase().replace('-', "_")
}

impl Strategy {
    /// Validate a strategy name and its parameters
    pub fn resolve(name: &str, params: &StrategyParameters) -> Result<Self> {
        let strategy = match normalize_strategy_name(name).as_str() {
            "maximize_popt20" => Strategy::MaximizePopt20,
            "top_k_coverage" => Strategy::TopKCoverage(TopKParams { k: params.k()? }),
            "budget_optimization" => Strategy::BudgetOptimization(BudgetParams {
                budget_hours: params.budget_hours()?,
            }),
            "coverage_optimization" => Strategy::CoverageOptimization(CoverageParams {
                target_coverage: params.target_coverage()?,
            }),
            "multi_objective" => Strategy::MultiObjective(MultiObjectiveParams {
                budget_hours: params.budget_hours()?,
                target_coverage: params.target_coverage()?,
                max_classes: params.max_classes()?,
            }),
            _ => return Err(PrioritizeError::UnknownStrategy(name.to_string())),
        };
        Ok(strategy)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Strategy::MaximizePopt20 => STRATEGY_NAMES[0],
            Strategy::TopKCoverage(_) => STRATEGY_NAMES[1],
            Strategy::BudgetOptimization(_) => STRATEGY_NAMES[2],
            Strategy::CoverageOptimization(_) => STRATEGY_NAMES[3],
            Strategy::MultiObjective(_) => STRATEGY_NAMES[4],
        }
    }

    /// Whether an empty selection from a non-empty set is a legitimate answer.
    ///
    /// Only coverage-driven strategies over a set with no risk at all can
    /// meet their target by selecting nothing.
    pub fn permits_empty(&self, candidates: &[EnrichedCandidate]) -> bool {
        match self {
            Strategy::CoverageOptimization(_) | Strategy::MultiObjective(_) => {
                candidates.iter().all(|c| c.risk_score() <= 0.0)
            }
            _ => false,
        }
    }

    fn formulation(&self, total_risk: f64) -> Option<Formulation> {
        match *self {
            Strategy::MaximizePopt20 | Strategy::TopKCoverage(_) => None,
            Strategy::BudgetOptimization(p) => Some(Formulation::budget(p.budget_hours)),
            Strategy::CoverageOptimization(p) => {
                Some(Formulation::coverage(p.target_coverage * total_risk))
            }
            Strategy::MultiObjective(p) => Some(Formulation::multi(
                p.budget_hours,
                p.target_coverage * total_risk,
                p.max_classes,
            )),
        }
    }

    /// Rank the candidates and select the subset this strategy calls for.
    ///
    /// Output is always in canonical ranking order.
    pub fn apply(&self, enriched: &[EnrichedCandidate], solver: &SolverConfig) -> Result<Selection> {
        let mut ranked = enriched.to_vec();
        ranked.sort_by(|a, b| a.rank_cmp(b));

        let total_risk: f64 = ranked.iter().map(|c| c.risk_score()).sum();
        let Some(formulation) = self.formulation(total_risk) else {
            if let Strategy::TopKCoverage(p) = self {
                ranked.truncate(p.k);
            }
            return Ok(Selection {
                entries: ranked,
                solver: SolverPath::Ranking,
            });
        };

        let items: Vec<Item> = ranked.iter().map(Item::from).collect();
        let (indices, path) = SolverFacade::new(solver).solve(&items, &formulation)?;
        debug!(
            "{} selected {} of {} via {}",
            self.name(),
            indices.len(),
            ranked.len(),
            path
        );

        let entries = indices.into_iter().map(|i| ranked[i].clone()).collect();
        Ok(Selection {
            entries,
            solver: path,
        })
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Strategy::MaximizePopt20 => write!(f, "{}", self.name()),
            Strategy::TopKCoverage(p) => write!(f, "{} (k={})", self.name(), p.k),
            Strategy::BudgetOptimization(p) => {
                write!(f, "{} (budget={}h)", self.name(), p.budget_hours)
            }
            Strategy::CoverageOptimization(p) => {
                write!(f, "{} (target={})", self.name(), p.target_coverage)
            }
            Strategy::MultiObjective(p) => {
                write!(
                    f,
                    "{} (budget={}h, target={}",
                    self.name(),
                    p.budget_hours,
                    p.target_coverage
                )?;
                match p.max_classes {
                    Some(m) => write!(f, ", max_classes={})", m),
                    None => write!(f, ")"),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::models::Candidate;
    use crate::scoring::Enricher;

    fn params() -> StrategyParameters {
        StrategyParameters::default()
    }

    fn enriched(candidates: &[Candidate]) -> Vec<EnrichedCandidate> {
        let config = EngineConfig::default();
        Enricher::new(&config).unwrap().enrich(candidates)
    }

    fn ids(selection: &Selection) -> Vec<&str> {
        selection.entries.iter().map(|c| c.id()).collect()
    }

    #[test]
    fn test_resolve_defaults() {
        assert_eq!(
            Strategy::resolve("top_k_coverage", &params()).unwrap(),
            Strategy::TopKCoverage(TopKParams { k: 20 })
        );
        assert_eq!(
            Strategy::resolve("Multi-Objective", &params()).unwrap(),
            Strategy::MultiObjective(MultiObjectiveParams {
                budget_hours: 40.0,
                target_coverage: 0.8,
                max_classes: None,
            })
        );
    }

    #[test]
    fn test_resolve_rejects_bad_parameters() {
        let bad_k = StrategyParameters { k: Some(0), ..params() };
        assert!(matches!(
            Strategy::resolve("top_k_coverage", &bad_k),
            Err(PrioritizeError::InvalidParameter { ref name, .. }) if name == "k"
        ));
        // Irrelevant parameters are ignored
        assert!(Strategy::resolve("maximize_popt20", &bad_k).is_ok());

        let bad_budget = StrategyParameters { budget_hours: Some(-1.0), ..params() };
        assert!(Strategy::resolve("budget_optimization", &bad_budget).is_err());
        let nan_budget = StrategyParameters { budget_hours: Some(f64::NAN), ..params() };
        assert!(Strategy::resolve("multi_objective", &nan_budget).is_err());

        let zero_target = StrategyParameters { target_coverage: Some(0.0), ..params() };
        assert!(matches!(
            Strategy::resolve("coverage_optimization", &zero_target),
            Err(PrioritizeError::InvalidParameter { .. })
        ));
        let over_target = StrategyParameters { target_coverage: Some(1.5), ..params() };
        assert!(matches!(
            Strategy::resolve("coverage_optimization", &over_target),
            Err(PrioritizeError::InfeasibleConstraints { ref constraint, .. }) if constraint == "target_coverage"
        ));

        let bad_cap = StrategyParameters { max_classes: Some(0), ..params() };
        assert!(Strategy::resolve("multi_objective", &bad_cap).is_err());
    }

    #[test]
    fn test_unknown_strategy() {
        assert_eq!(
            Strategy::resolve("random", &params()),
            Err(PrioritizeError::UnknownStrategy("random".to_string()))
        );
    }

    #[test]
    fn test_parameter_override() {
        let policy = StrategyParameters {
            k: Some(5),
            budget_hours: Some(10.0),
            ..params()
        };
        let request = StrategyParameters { k: Some(3), ..params() };
        let merged = request.or(&policy);
        assert_eq!(merged.k, Some(3));
        assert_eq!(merged.budget_hours, Some(10.0));
        assert_eq!(merged.target_coverage, None);
    }

    #[test]
    fn test_names_round_trip() {
        for name in STRATEGY_NAMES {
            assert_eq!(Strategy::resolve(name, &params()).unwrap().name(), name);
        }
    }

    #[test]
    fn test_apply_ranking_and_top_k() {
        let candidates = enriched(&[
            Candidate::new("Util", 0.2, 50, 1).with_module("util"),
            Candidate::new("Auth", 0.9, 200, 3).with_module("auth/service"),
            Candidate::new("Api", 0.5, 100, 12).with_module("api"),
        ]);
        let solver = SolverConfig::default();

        let all = Strategy::MaximizePopt20.apply(&candidates, &solver).unwrap();
        assert_eq!(ids(&all), vec!["Auth", "Api", "Util"]);
        assert_eq!(all.solver, SolverPath::Ranking);

        let top = Strategy::TopKCoverage(TopKParams { k: 2 })
            .apply(&candidates, &solver)
            .unwrap();
        assert_eq!(ids(&top), vec!["Auth", "Api"]);

        let wide = Strategy::TopKCoverage(TopKParams { k: 50 })
            .apply(&candidates, &solver)
            .unwrap();
        assert_eq!(wide.entries.len(), 3);
    }

    #[test]
    fn test_apply_optimization_uses_solver() {
        let candidates = enriched(&[
            Candidate::new("Auth", 0.9, 200, 3).with_module("auth/service"),
            Candidate::new("Util", 0.2, 50, 1).with_module("util"),
        ]);
        let solver = SolverConfig::default();

        let budget = Strategy::BudgetOptimization(BudgetParams { budget_hours: 4.0 })
            .apply(&candidates, &solver)
            .unwrap();
        assert_eq!(ids(&budget), vec!["Auth"]);
        assert_eq!(budget.solver, SolverPath::Exact);

        let cover = Strategy::CoverageOptimization(CoverageParams { target_coverage: 1.0 })
            .apply(&candidates, &solver)
            .unwrap();
        assert_eq!(ids(&cover), vec!["Auth", "Util"]);
    }

    #[test]
    fn test_permits_empty_only_without_risk() {
        let riskless = enriched(&[Candidate::new("A", 0.0, 10, 1)]);
        let risky = enriched(&[Candidate::new("A", 0.1, 10, 1)]);
        let cover = Strategy::CoverageOptimization(CoverageParams { target_coverage: 0.5 });
        assert!(cover.permits_empty(&riskless));
        assert!(!cover.permits_empty(&risky));
        assert!(!Strategy::MaximizePopt20.permits_empty(&riskless));
    }
}
