//! Configuration types for the optimizer and solver backend.

use crate::error::RosterError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::{Duration, Instant};

/// Options handed to HiGHS for every placement solve.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BackendConfig {
    /// Limited to 1 by default for reproducibility.
    pub threads: u32,
    pub random_seed: u32,
    /// Per-solve wall clock limit in seconds.
    pub time_limit_secs: Option<f64>,
    /// Relative MIP gap; 0 asks for proven optimality.
    pub mip_rel_gap: f64,
    pub log_to_console: bool,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            threads: 1,
            random_seed: 1234,
            time_limit_secs: None,
            mip_rel_gap: 0.0,
            log_to_console: false,
        }
    }
}

/// Top-level optimizer configuration.
///
/// Loaded from JSON at runtime or embedded in a solve request.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OptimizerConfig {
    /// Wall clock budget for the whole search, in seconds.
    pub time_limit_secs: Option<f64>,
    /// Stop after evaluating this many placements.
    pub max_placements: Option<usize>,
    /// Threads evaluating placements concurrently.
    pub workers: usize,
    pub solver: BackendConfig,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            time_limit_secs: None,
            max_placements: None,
            workers: 1,
            solver: BackendConfig::default(),
        }
    }
}

impl OptimizerConfig {
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, RosterError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| RosterError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Limits measured from now.
    pub fn limits(&self) -> SearchLimits {
        SearchLimits {
            // limits too large to represent mean no deadline
            deadline: self
                .time_limit_secs
                .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
                .and_then(|limit| Instant::now().checked_add(limit)),
            max_placements: self.max_placements,
        }
    }
}

/// Caps on the outer search. Unset fields mean exhaustive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchLimits {
    pub deadline: Option<Instant>,
    pub max_placements: Option<usize>,
}

impl SearchLimits {
    pub fn unlimited() -> Self {
        Self::default()
    }

    pub fn with_max_placements(mut self, max: usize) -> Self {
        self.max_placements = Some(max);
        self
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Whether the search must stop before evaluating another placement.
    pub fn reached(&self, evaluated: usize) -> bool {
        self.max_placements.is_some_and(|max| evaluated >= max)
            || self.deadline.is_some_and(|deadline| Instant::now() >= deadline)
    }
}
