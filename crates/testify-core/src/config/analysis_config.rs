//! Analysis configuration.

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_MAX_BUNDLE_DEPTH;

/// Configuration for the analysis and reification subsystems.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Upper bound on memoized descriptors per cache. Default: unbounded.
    /// With a bound, an evicted class is analysed again on its next lookup
    /// and yields a new descriptor instance, so repeated lookups are only
    /// guaranteed to share one instance while it stays cached.
    pub cache_capacity: Option<u64>,
    /// Maximum nesting depth when expanding bundle annotations. Default: 8.
    pub max_bundle_depth: Option<u32>,
    /// Let role-marked test fields fall back to type-only matching. Default: true.
    pub loose_matching: Option<bool>,
}

impl AnalysisConfig {
    /// Returns the effective bundle depth, defaulting to 8.
    pub fn effective_max_bundle_depth(&self) -> u32 {
        self.max_bundle_depth.unwrap_or(DEFAULT_MAX_BUNDLE_DEPTH)
    }

    /// Returns whether loose (type-only) matching is enabled, defaulting to true.
    pub fn effective_loose_matching(&self) -> bool {
        self.loose_matching.unwrap_or(true)
    }
}
