//! Candidate enrichment

use super::{CriticalityModel, EffortModel};
use crate::config::EngineConfig;
use crate::error::Result;
use crate::models::{Candidate, EnrichedCandidate};
use rayon::prelude::*;
use tracing::debug;

/// Composes effort and criticality over a candidate set
pub struct Enricher<'a> {
    effort: EffortModel<'a>,
    criticality: CriticalityModel,
}

impl<'a> Enricher<'a> {
    pub fn new(config: &'a EngineConfig) -> Result<Self> {
        Ok(Self {
            effort: EffortModel::new(&config.effort),
            criticality: CriticalityModel::new(&config.criticality)?,
        })
    }

    pub fn enrich_one(&self, candidate: &Candidate) -> EnrichedCandidate {
        let effort_hours = self.effort.estimate(candidate);
        let (module_criticality, criticality_weight) =
            self.criticality.classify(&candidate.module_path);

        EnrichedCandidate {
            candidate: candidate.clone(),
            effort_hours,
            effort_aware_score: candidate.risk_score / effort_hours * criticality_weight,
            module_criticality,
            criticality_weight,
        }
    }

    /// Enrich in parallel; output order matches input order
    pub fn enrich(&self, candidates: &[Candidate]) -> Vec<EnrichedCandidate> {
        let enriched: Vec<EnrichedCandidate> = candidates
            .par_iter()
            .map(|c| self.enrich_one(c))
            .collect();
        debug!("Enriched {} candidates", enriched.len());
        enriched
    }
}
