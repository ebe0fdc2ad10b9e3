//! Retention sweeper configuration.

use serde::{Deserialize, Serialize};

/// Retention sweeper configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweeperConfig {
    /// Whether the sweeper is scheduled at all.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Six-field cron expression (seconds first).
    #[serde(default = "default_schedule")]
    pub schedule: String,
}

impl Default for SweeperConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            schedule: default_schedule(),
        }
    }
}

fn default_enabled() -> bool {
    true
}

fn default_schedule() -> String {
    "0 */30 * * * *".to_string()
}
