//! Manager tuning knobs.
//!
//! Embedded as the `[manager]` table of the `input-sync` configuration file,
//! so every field has a serde default and an empty table is valid.

use serde::{Deserialize, Serialize};

fn default_queue_warn_threshold() -> usize {
    4096
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagerConfig {
    /// Display width in pixels, for backends that normalize pointer
    /// coordinates.  0 means unknown.
    #[serde(default)]
    pub display_width: u32,

    #[serde(default)]
    pub display_height: u32,

    /// Log per-button deltas even when no listener is registered.
    ///
    /// Off by default: with no listener nobody can observe the deltas, so
    /// devices are updated without a delta log.  State contents are the same
    /// either way.
    #[serde(default)]
    pub record_deltas_without_listeners: bool,

    /// A single drain larger than this logs a warning.
    #[serde(default = "default_queue_warn_threshold")]
    pub queue_warn_threshold: usize,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            display_width: 0,
            display_height: 0,
            record_deltas_without_listeners: false,
            queue_warn_threshold: default_queue_warn_threshold(),
        }
    }
}
