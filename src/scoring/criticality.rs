//! Module criticality classification

use crate::config::{CriticalityConfig, CriticalityWeights};
use crate::error::{PrioritizeError, Result};
use crate::models::Criticality;
use regex::{Regex, RegexBuilder};

/// Ordered regex rules over module paths; first match wins
pub struct CriticalityModel {
    rules: Vec<(Regex, Criticality)>,
    default_level: Criticality,
    weights: CriticalityWeights,
}

impl CriticalityModel {
    /// Compile the configured rules (case-insensitive)
    pub fn new(config: &CriticalityConfig) -> Result<Self> {
        let rules = config
            .rules
            .iter()
            .map(|rule| {
                RegexBuilder::new(&rule.pattern)
                    .case_insensitive(true)
                    .build()
                    .map(|re| (re, rule.level))
                    .map_err(|e| {
                        PrioritizeError::Config(format!(
                            "criticality rule '{}' is not a valid regex: {}",
                            rule.pattern, e
                        ))
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            rules,
            default_level: config.default_level,
            weights: config.weights.clone(),
        })
    }

    pub fn level(&self, module_path: &str) -> Criticality {
        self.rules
            .iter()
            .find(|(re, _)| re.is_match(module_path))
            .map(|(_, level)| *level)
            .unwrap_or(self.default_level)
    }

    pub fn classify(&self, module_path: &str) -> (Criticality, f64) {
        let level = self.level(module_path);
        (level, self.weights.weight(level))
    }
}
