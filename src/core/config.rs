/*!
 * Table Configuration
 *
 * Runtime settings for an emulated file table, loadable from defaults,
 * environment variables or JSON
 */

use super::errors::{EmuError, EmuResult};
use super::limits::{
    DESCRIPTOR_BASE, ENV_DESCRIPTOR_BASE, ENV_LOCK_TIMEOUT_MS, ENV_LOG_REGISTRATIONS,
    MIN_DESCRIPTOR_BASE,
};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DurationMilliSeconds};
use std::time::Duration;

/// Emulated file table configuration
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableConfig {
    /// Descriptor assigned to slot 0
    pub descriptor_base: i32,
    /// Upper bound on blocking per-slot lock acquisition (None waits forever)
    #[serde_as(as = "Option<DurationMilliSeconds<u64>>")]
    #[serde(rename = "lock_timeout_ms")]
    pub lock_timeout: Option<Duration>,
    /// Emit a debug event for every register/unregister
    pub log_registrations: bool,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            descriptor_base: DESCRIPTOR_BASE,
            lock_timeout: None,
            log_registrations: true,
        }
    }
}

impl TableConfig {
    pub fn with_descriptor_base(mut self, base: i32) -> Self {
        self.descriptor_base = base;
        self
    }

    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = Some(timeout);
        self
    }

    pub fn with_log_registrations(mut self, enabled: bool) -> Self {
        self.log_registrations = enabled;
        self
    }

    /// Load configuration from the environment, starting from defaults
    ///
    /// Environment variables:
    /// - EMUFILE_DESCRIPTOR_BASE: descriptor base, decimal or 0x-prefixed hex
    /// - EMUFILE_LOCK_TIMEOUT_MS: per-slot lock timeout (0 disables)
    /// - EMUFILE_LOG_REGISTRATIONS: 1/true/yes to enable, anything else disables
    pub fn from_env() -> EmuResult<Self> {
        let mut config = Self::default();

        if let Ok(raw) = std::env::var(ENV_DESCRIPTOR_BASE) {
            config.descriptor_base = parse_descriptor_base(&raw)?;
        }

        if let Ok(raw) = std::env::var(ENV_LOCK_TIMEOUT_MS) {
            let millis: u64 = raw.trim().parse().map_err(|e| {
                EmuError::Config(format!("{}={:?}: {}", ENV_LOCK_TIMEOUT_MS, raw, e))
            })?;
            config.lock_timeout = (millis > 0).then(|| Duration::from_millis(millis));
        }

        if let Ok(raw) = std::env::var(ENV_LOG_REGISTRATIONS) {
            config.log_registrations = matches!(raw.trim(), "1" | "true" | "yes");
        }

        Ok(config)
    }

    /// Parse configuration from JSON; missing fields take their defaults
    pub fn from_json(json: &str) -> EmuResult<Self> {
        serde_json::from_str(json).map_err(|e| EmuError::Config(e.to_string()))
    }

    /// Check the descriptor range for a table of `capacity` slots
    ///
    /// The base must clear MIN_DESCRIPTOR_BASE and the last descriptor
    /// must still fit in an i32.
    pub fn validate(&self, capacity: usize) -> EmuResult<()> {
        if self.descriptor_base < MIN_DESCRIPTOR_BASE {
            return Err(EmuError::Config(format!(
                "descriptor base {:#x} overlaps OS descriptors (minimum {:#x})",
                self.descriptor_base, MIN_DESCRIPTOR_BASE
            )));
        }

        let last = i64::from(self.descriptor_base) + capacity as i64 - 1;
        if last > i64::from(i32::MAX) {
            return Err(EmuError::Config(format!(
                "descriptor range {:#x}+{} overflows i32",
                self.descriptor_base, capacity
            )));
        }

        Ok(())
    }
}

fn parse_descriptor_base(raw: &str) -> EmuResult<i32> {
    let trimmed = raw.trim();
    let parsed = match trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        Some(hex) => i32::from_str_radix(hex, 16),
        None => trimmed.parse(),
    };
    parsed.map_err(|e| EmuError::Config(format!("{}={:?}: {}", ENV_DESCRIPTOR_BASE, raw, e)))
}
