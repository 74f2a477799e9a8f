use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Bounds on gate waits.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    /// Maximum time a caller waits for any permit, in milliseconds.
    pub timeout_ms: u64,
    /// Upper bound on a single condition-variable wait, in milliseconds.
    /// Waiters re-check their condition at least this often.
    pub poll_interval_ms: u64,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 30_000,
            poll_interval_ms: 500,
        }
    }
}

impl GateConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    /// Override the permit timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.timeout_ms == 0 {
            return Err("gate timeout_ms must be > 0".into());
        }
        if self.poll_interval_ms == 0 {
            return Err("gate poll_interval_ms must be > 0".into());
        }
        Ok(())
    }
}
