//! Roster configuration.

use crate::error::{Error, Result};
use crate::status::Bucket;
use serde::{Deserialize, Serialize};

/// Default interval between waiting-time sweeps.
pub const DEFAULT_TICK_INTERVAL_SECS: u64 = 60;

/// Per-venue settings read by entries and collections.
///
/// Missing fields fall back to their defaults, so `{}` is a valid config.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaitlistConfig {
    /// Whether guest text replies are surfaced on entries.
    pub two_way_text: bool,
    /// Seconds between waiting-time sweeps.
    pub tick_interval_secs: u64,
    /// Bucket rendered into the live list.
    pub visible_bucket: Bucket,
}

impl Default for WaitlistConfig {
    fn default() -> Self {
        Self {
            two_way_text: false,
            tick_interval_secs: DEFAULT_TICK_INTERVAL_SECS,
            visible_bucket: Bucket::Waiting,
        }
    }
}

impl WaitlistConfig {
    /// Parses and validates a JSON config document.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: WaitlistConfig =
            serde_json::from_str(json).map_err(|e| Error::invalid_config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.tick_interval_secs == 0 {
            return Err(Error::invalid_config("tick_interval_secs must be positive"));
        }
        Ok(())
    }

    pub fn with_two_way_text(mut self, enabled: bool) -> Self {
        self.two_way_text = enabled;
        self
    }

    pub fn with_tick_interval_secs(mut self, secs: u64) -> Self {
        self.tick_interval_secs = secs;
        self
    }
}
