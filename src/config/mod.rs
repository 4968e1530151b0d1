//! Configuration module for riskplan
//!
//! This module handles:
//! - Engine configuration (riskplan.toml / .riskplanrc.json)
//! - Effort constants and complexity tiers
//! - Criticality rules and weights
//! - Solver limits and metric windows
//! - Named strategy policies

mod engine_config;

pub use engine_config::{
    load_engine_config,
    ComplexityTier,
    CriticalityConfig,
    CriticalityRule,
    CriticalityWeights,
    EffortConfig,
    EngineConfig,
    MetricsConfig,
    Policy,
    SolverConfig,
    CONFIG_FILE_NAMES,
    EXAMPLE_CONFIG,
};
