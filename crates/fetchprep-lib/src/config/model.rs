use crate::download::TransferConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Engine defaults as they appear in a settings file. Every field is
/// optional in the file; CLI flags override whatever the file supplies.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct Settings {
    pub max_retries: u32,
    pub retry_delay_secs: f64,
    pub retry_backoff: f64,
    pub timeout_secs: u64,
    pub chunk_size: usize,
    pub show_progress: bool,
    pub max_parallel: usize,
    pub user_agent: String,
}

impl Default for Settings {
    fn default() -> Self {
        let defaults = TransferConfig::default();
        Self {
            max_retries: defaults.max_retries,
            retry_delay_secs: defaults.retry_delay.as_secs_f64(),
            retry_backoff: defaults.retry_backoff,
            timeout_secs: defaults.timeout.as_secs(),
            chunk_size: defaults.chunk_size,
            show_progress: defaults.show_progress,
            max_parallel: defaults.max_parallel,
            user_agent: defaults.user_agent,
        }
    }
}

impl From<Settings> for TransferConfig {
    fn from(settings: Settings) -> Self {
        TransferConfig {
            max_retries: settings.max_retries,
            retry_delay: Duration::from_secs_f64(settings.retry_delay_secs.max(0.0)),
            retry_backoff: settings.retry_backoff,
            timeout: Duration::from_secs(settings.timeout_secs),
            chunk_size: settings.chunk_size,
            show_progress: settings.show_progress,
            max_parallel: settings.max_parallel,
            user_agent: settings.user_agent,
        }
    }
}
