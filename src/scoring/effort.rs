//! Remediation effort estimation

use crate::config::EffortConfig;
use crate::models::Candidate;

/// Converts size and complexity into estimated testing hours
pub struct EffortModel<'a> {
    config: &'a EffortConfig,
}

impl<'a> EffortModel<'a> {
    pub fn new(config: &'a EffortConfig) -> Self {
        Self { config }
    }

    /// Multiplier of the highest tier whose threshold `complexity` reaches
    pub fn complexity_multiplier(&self, complexity: u32) -> f64 {
        self.config
            .tiers
            .iter()
            .take_while(|tier| tier.min_complexity <= complexity)
            .last()
            .map(|tier| tier.multiplier)
            .unwrap_or(1.0)
    }

    /// Estimated hours, always within `[min_effort_hours, max_effort_hours]`
    pub fn estimate(&self, candidate: &Candidate) -> f64 {
        let c = self.config;
        let base = candidate.loc as f64 / c.loc_per_hour
            * self.complexity_multiplier(candidate.complexity);
        let mocking = candidate.dependency_count.unwrap_or(0) as f64 * c.hours_per_dependency;
        let methods = candidate.method_count.unwrap_or(0) as f64 * c.hours_per_method;

        (base + mocking + methods).clamp(c.min_effort_hours, c.max_effort_hours)
    }
}
