use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

pub const SPARSITY_THRESHOLD_ENV: &str = "AUTOQUERY_SPARSITY_THRESHOLD";
pub const FETCH_TIMEOUT_ENV: &str = "AUTOQUERY_FETCH_TIMEOUT_MS";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Secondary indexes holding less than this fraction of the table's items are sparse. Applied when a table's
    /// catalog is first built. The default marks every composite secondary index sparse.
    pub sparsity_threshold: f64,
    /// Deadline for each metadata and page fetch.
    pub fetch_timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self { Self { sparsity_threshold: 1.1, fetch_timeout: None } }
}

impl ClientConfig {
    pub fn with_sparsity_threshold(mut self, threshold: f64) -> Self {
        self.sparsity_threshold = threshold;
        self
    }

    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = Some(timeout);
        self
    }

    /// Defaults overridden by the environment. Unparseable values are ignored with a warning.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(raw) = std::env::var(SPARSITY_THRESHOLD_ENV) {
            match raw.parse::<f64>() {
                Ok(threshold) => config.sparsity_threshold = threshold,
                Err(e) => warn!("Ignoring {}={:?}: {}", SPARSITY_THRESHOLD_ENV, raw, e),
            }
        }
        if let Ok(raw) = std::env::var(FETCH_TIMEOUT_ENV) {
            match raw.parse::<u64>() {
                Ok(ms) => config.fetch_timeout = Some(Duration::from_millis(ms)),
                Err(e) => warn!("Ignoring {}={:?}: {}", FETCH_TIMEOUT_ENV, raw, e),
            }
        }
        config
    }
}
