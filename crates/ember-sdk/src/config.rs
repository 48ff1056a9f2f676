//! Event pump tuning, read from the host configuration.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{EmberError, EmberResult};
use crate::host::Host;

/// Host configuration key holding a JSON [`PumpConfig`].
pub const CONFIG_KEY: &str = "event_pump";

/// Events dispatched per pump invocation before returning.
pub const DEFAULT_BATCH_LIMIT: u32 = 5;

/// Suspend time after an invocation that dispatched nothing.
pub const DEFAULT_IDLE_BACKOFF_MS: u32 = 10;

/// Limits applied by [`crate::EventPump`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PumpConfig {
    /// Well-formed events processed per invocation. Must be at least 1.
    pub batch_limit: u32,
    /// Idle suspend, in milliseconds.
    pub idle_backoff_ms: u32,
}

impl Default for PumpConfig {
    fn default() -> Self {
        Self {
            batch_limit: DEFAULT_BATCH_LIMIT,
            idle_backoff_ms: DEFAULT_IDLE_BACKOFF_MS,
        }
    }
}

impl PumpConfig {
    /// Check field constraints.
    ///
    /// # Errors
    ///
    /// Returns [`EmberError::InvalidConfig`] if `batch_limit` is zero.
    pub fn validate(&self) -> EmberResult<()> {
        if self.batch_limit == 0 {
            return Err(EmberError::InvalidConfig {
                field: "batch_limit".to_owned(),
                message: "must be at least 1".to_owned(),
            });
        }
        Ok(())
    }

    /// Decode and validate a JSON payload.
    ///
    /// # Errors
    ///
    /// Returns [`EmberError::JsonError`] for malformed JSON and
    /// [`EmberError::InvalidConfig`] for out-of-range values.
    pub fn from_json(bytes: &[u8]) -> EmberResult<Self> {
        let config: Self = serde_json::from_slice(bytes)?;
        config.validate()?;
        Ok(config)
    }

    /// Read [`CONFIG_KEY`] from the host, falling back to defaults when it is
    /// unset or unusable.
    #[must_use]
    pub fn load(host: &(impl Host + ?Sized)) -> Self {
        let Some(bytes) = host.get_config(CONFIG_KEY) else {
            return Self::default();
        };
        match Self::from_json(&bytes) {
            Ok(config) => {
                debug!(
                    batch_limit = config.batch_limit,
                    idle_backoff_ms = config.idle_backoff_ms,
                    "Loaded event pump config"
                );
                config
            },
            Err(e) => {
                warn!(key = CONFIG_KEY, error = %e, "Ignoring event pump config");
                Self::default()
            },
        }
    }
}
