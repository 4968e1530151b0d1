//! Error taxonomy for the prioritization engine

use thiserror::Error;

/// Errors surfaced to callers of [`crate::prioritize`]
///
/// Solver unavailability and exact-solve timeouts are not listed here: they
/// are recovered inside the solver by falling back to the greedy heuristic.
/// An empty candidate set is not an error either; it yields an empty plan.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PrioritizeError {
    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("Unknown strategy '{0}'. Valid strategies: maximize_popt20, top_k_coverage, budget_optimization, coverage_optimization, multi_objective")]
    UnknownStrategy(String),

    #[error("Infeasible constraints ({constraint}): {detail}")]
    InfeasibleConstraints { constraint: String, detail: String },

    #[error("Invalid candidate '{id}': {reason}")]
    InvalidCandidate { id: String, reason: String },

    #[error("Strategy '{strategy}' selected nothing from a non-empty candidate set")]
    EmptyPlan { strategy: String },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl PrioritizeError {
    pub(crate) fn invalid_parameter(name: &str, reason: impl Into<String>) -> Self {
        PrioritizeError::InvalidParameter {
            name: name.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn infeasible(constraint: &str, detail: impl Into<String>) -> Self {
        PrioritizeError::InfeasibleConstraints {
            constraint: constraint.to_string(),
            detail: detail.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PrioritizeError>;
