//! Effort- and criticality-aware scoring
//!
//! Each candidate is enriched in two independent steps:
//!
//! ```text
//! effort_hours = clamp(loc / loc_per_hour × tier_multiplier(complexity)
//!                      + dependencies × hours_per_dependency
//!                      + methods × hours_per_method,
//!                      min_effort_hours, max_effort_hours)
//!
//! effort_aware_score = risk_score / effort_hours × criticality_weight
//! ```
//!
//! The criticality weight comes from the first rule whose regex matches the
//! candidate's module path (high 1.5, medium 1.2, low 1.0 by default).

mod criticality;
mod effort;
mod enrich;

pub use criticality::CriticalityModel;
pub use effort::EffortModel;
pub use enrich::Enricher;
