//! Core data models for riskplan
//!
//! These models flow through the whole engine: candidates come in from the
//! risk-prediction service, get enriched with effort and criticality, and
//! leave as an ordered plan with metrics.

use serde::{Deserialize, Serialize};

/// Module criticality levels
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Criticality {
    #[default]
    Low,
    Medium,
    High,
}

impl Criticality {
    pub fn all() -> [Criticality; 3] {
        [Criticality::High, Criticality::Medium, Criticality::Low]
    }
}

impl std::fmt::Display for Criticality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Criticality::High => write!(f, "high"),
            Criticality::Medium => write!(f, "medium"),
            Criticality::Low => write!(f, "low"),
        }
    }
}

impl std::str::FromStr for Criticality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "high" => Ok(Criticality::High),
            "medium" => Ok(Criticality::Medium),
            "low" => Ok(Criticality::Low),
            other => Err(format!(
                "invalid criticality '{}': expected high, medium or low",
                other
            )),
        }
    }
}

/// A code unit (class) eligible for prioritization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Candidate {
    pub id: String,
    /// Risk in [0, 1], supplied by the risk-prediction service. Never recomputed.
    pub risk_score: f64,
    #[serde(default)]
    pub loc: u32,
    #[serde(default)]
    pub complexity: u32,
    #[serde(default)]
    pub module_path: String,
    #[serde(default)]
    pub dependency_count: Option<u32>,
    #[serde(default)]
    pub method_count: Option<u32>,
}

impl Candidate {
    pub fn new(id: impl Into<String>, risk_score: f64, loc: u32, complexity: u32) -> Self {
        Self {
            id: id.into(),
            risk_score,
            loc,
            complexity,
            ..Default::default()
        }
    }

    pub fn with_module(mut self, module_path: impl Into<String>) -> Self {
        self.module_path = module_path.into();
        self
    }

    pub fn with_dependencies(mut self, count: u32) -> Self {
        self.dependency_count = Some(count);
        self
    }
}

/// A candidate with effort and criticality attached
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedCandidate {
    #[serde(flatten)]
    pub candidate: Candidate,
    /// Always > 0: zero-LOC units are floored to the minimum effort.
    pub effort_hours: f64,
    /// `(risk_score / effort_hours) * criticality_weight`
    pub effort_aware_score: f64,
    pub module_criticality: Criticality,
    pub criticality_weight: f64,
}

impl EnrichedCandidate {
    pub fn id(&self) -> &str {
        &self.candidate.id
    }

    pub fn risk_score(&self) -> f64 {
        self.candidate.risk_score
    }

    /// Canonical ranking order: effort-aware score descending, then risk
    /// descending, then id ascending.
    pub fn rank_cmp(&self, other: &Self) -> std::cmp::Ordering {
        other
            .effort_aware_score
            .total_cmp(&self.effort_aware_score)
            .then_with(|| other.risk_score().total_cmp(&self.risk_score()))
            .then_with(|| self.id().cmp(other.id()))
    }
}

/// One ranked entry of a plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrioritizedEntry {
    #[serde(flatten)]
    pub enriched: EnrichedCandidate,
    /// 1 = do first; contiguous within a plan
    pub priority: usize,
    pub strategy: String,
    pub reason: String,
}

/// How the selection behind a plan was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SolverPath {
    /// Plain ordering, no optimization involved
    #[default]
    Ranking,
    /// Exact branch-and-bound solve
    Exact,
    /// Greedy heuristic because the exact solver was disabled or the input too large
    GreedyUnavailable,
    /// Greedy heuristic because the exact solve ran out of time
    GreedyTimeout,
}

impl std::fmt::Display for SolverPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SolverPath::Ranking => write!(f, "ranking"),
            SolverPath::Exact => write!(f, "exact"),
            SolverPath::GreedyUnavailable => write!(f, "greedy (exact solver unavailable)"),
            SolverPath::GreedyTimeout => write!(f, "greedy (exact solver timed out)"),
        }
    }
}

/// Observed defect outcome for one class
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefectLabel {
    #[serde(alias = "id")]
    pub class_name: String,
    #[serde(default)]
    pub has_defect: bool,
}

impl DefectLabel {
    pub fn new(class_name: impl Into<String>, has_defect: bool) -> Self {
        Self {
            class_name: class_name.into(),
            has_defect,
        }
    }
}

/// What Popt@20 and Recall@Top20 were measured against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricsBasis {
    /// Predicted risk scores stand in for defects
    #[default]
    RiskProxy,
    /// Observed defect labels
    Defects,
}

impl std::fmt::Display for MetricsBasis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MetricsBasis::RiskProxy => write!(f, "risk proxy"),
            MetricsBasis::Defects => write!(f, "defect labels"),
        }
    }
}

/// Quality measures of a plan
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlanMetrics {
    #[serde(default)]
    pub basis: MetricsBasis,
    pub total_effort_hours: f64,
    pub total_risk_selected: f64,
    pub total_risk_all: f64,
    pub estimated_coverage_gain: f64,
    pub popt20_score: f64,
    pub recall_top20: f64,
    pub selected_count: usize,
    pub candidate_count: usize,
    pub avg_effort_aware_score: f64,
}

/// Count of candidates per criticality level
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CriticalityStats {
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    pub total: usize,
}

impl CriticalityStats {
    pub fn from_candidates(candidates: &[EnrichedCandidate]) -> Self {
        let mut stats = Self::default();
        for c in candidates {
            match c.module_criticality {
                Criticality::High => stats.high += 1,
                Criticality::Medium => stats.medium += 1,
                Criticality::Low => stats.low += 1,
            }
            stats.total += 1;
        }
        stats
    }

    pub fn count(&self, level: Criticality) -> usize {
        match level {
            Criticality::High => self.high,
            Criticality::Medium => self.medium,
            Criticality::Low => self.low,
        }
    }

    /// Share of candidates at `level`, in percent (0 for an empty set)
    pub fn percent(&self, level: Criticality) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.count(level) as f64 / self.total as f64 * 100.0
    }
}

/// The engine's output: an ordered plan plus its metrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrioritizationPlan {
    pub strategy: String,
    pub entries: Vec<PrioritizedEntry>,
    pub metrics: PlanMetrics,
    pub criticality: CriticalityStats,
    pub solver: SolverPath,
}

impl PrioritizationPlan {
    /// Plan for an empty candidate set: no entries, zero-valued metrics
    pub fn empty(strategy: &str) -> Self {
        Self {
            strategy: strategy.to_string(),
            entries: Vec::new(),
            metrics: PlanMetrics::default(),
            criticality: CriticalityStats::default(),
            solver: SolverPath::Ranking,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn ids(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.enriched.id()).collect()
    }
}
