//! Runtime configuration, overridable from the environment.
//!
//! The wire protocol itself has no negotiation step, so the only
//! knobs a deployment can turn are local ones: how often the list
//! phase re-enumerates readers, and how large a single frame is
//! allowed to get before it's treated as a framing violation.

use cardbridge_core::constants::{DEFAULT_LIST_TICK_MS, MAX_PRACTICAL_FRAME_LEN};
use std::time::Duration;
use tracing::warn;

const POLL_MS_VAR: &str = "CARDBRIDGE_POLL_MS";
const MAX_FRAME_BYTES_VAR: &str = "CARDBRIDGE_MAX_FRAME_BYTES";

#[derive(Debug, Clone)]
pub struct Config {
    pub list_tick: Duration,
    pub max_frame_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            list_tick: Duration::from_millis(DEFAULT_LIST_TICK_MS),
            max_frame_bytes: MAX_PRACTICAL_FRAME_LEN,
        }
    }
}

impl Config {
    /// Build a config from defaults, applying any recognized
    /// environment overrides. A malformed override is logged and
    /// ignored rather than treated as a startup failure.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(raw) = std::env::var(POLL_MS_VAR) {
            match raw.parse::<u64>() {
                Ok(ms) if ms > 0 => config.list_tick = Duration::from_millis(ms),
                _ => warn!(value = %raw, var = POLL_MS_VAR, "ignoring malformed override"),
            }
        }

        if let Ok(raw) = std::env::var(MAX_FRAME_BYTES_VAR) {
            match raw.parse::<usize>() {
                Ok(bytes) if bytes > 0 => config.max_frame_bytes = bytes,
                _ => warn!(value = %raw, var = MAX_FRAME_BYTES_VAR, "ignoring malformed override"),
            }
        }

        config
    }
}
