//! Core configuration for sequent-compose-core.

use serde::{Deserialize, Serialize};

/// Configuration for engine sizing and scheduling knobs.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// Initial capacity hint for the per-step contribution buffer.
    pub scratch_contributions: usize,

    /// Initial capacity hint for the per-step accumulator map.
    pub scratch_targets: usize,

    /// Minimum number of scatter jobs before the step uses the parallel
    /// path; below this the rayon fork/join overhead dominates.
    pub parallel_scatter_threshold: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            scratch_contributions: 1024,
            scratch_targets: 256,
            parallel_scatter_threshold: 64,
        }
    }
}
