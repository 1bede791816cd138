//! Scheduler configuration

use serde::{Deserialize, Serialize};

/// Scheduler configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Whether scheduled jobs run at all
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Cron schedule for the soft search-index update
    #[serde(default = "default_search_update_schedule")]
    pub search_update_schedule: String,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            search_update_schedule: default_search_update_schedule(),
        }
    }
}

fn default_enabled() -> bool {
    true
}

fn default_search_update_schedule() -> String {
    // Daily at 04:00 UTC
    "0 0 4 * * *".to_string()
}
