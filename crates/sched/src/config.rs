//! Loop configuration.

use serde::Deserialize;

/// Behavioral toggles for an [`UpdateLoop`](crate::UpdateLoop).
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct LoopConfig {
    /// Remove empty non-permanent entries at the end of each tick.
    pub prune_empty: bool,
    /// Log entry creation and pruning at debug level.
    pub verbose: bool,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            prune_empty: true,
            verbose: false,
        }
    }
}
