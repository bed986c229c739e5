//! Input configuration types
//!
//! The only knobs the input exposes are the pre-stream level of each channel
//! and an optional cap on the number of emitted windows. The sample rate is
//! fixed for Logic 2 exports.

use crate::types::{Result, Sample, TraceError, MAX_CHANNELS};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Samples per second used to convert export timestamps
pub const SAMPLE_RATE: u64 = 500_000_000;

/// Configuration for a capture input
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputConfig {
    /// Optional: channel index -> level (0/1) before the first row
    #[serde(default)]
    pub initial_state: Option<BTreeMap<usize, u8>>,

    /// Optional: number of windows to emit before reporting end of stream
    #[serde(default)]
    pub sample_budget: Option<u64>,
}

impl InputConfig {
    /// Create a new input configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: set the level of one channel before the first row
    pub fn with_initial_level(mut self, channel: usize, level: u8) -> Self {
        self.initial_state
            .get_or_insert_with(BTreeMap::new)
            .insert(channel, level);
        self
    }

    /// Builder method: replace the whole initial state mapping
    pub fn with_initial_state(mut self, state: BTreeMap<usize, u8>) -> Self {
        self.initial_state = Some(state);
        self
    }

    /// Builder method: cap the number of emitted windows
    pub fn with_sample_budget(mut self, budget: u64) -> Self {
        self.sample_budget = Some(budget);
        self
    }

    /// Effective budget; zero means unlimited
    pub fn budget(&self) -> Option<u64> {
        self.sample_budget.filter(|&budget| budget > 0)
    }

    /// Pre-stream bitmask for a capture with `channels` logic channels
    pub fn seed(&self, channels: usize) -> Result<Sample> {
        let Some(state) = &self.initial_state else {
            return Ok(Sample::default());
        };

        let mut bits = 0u64;
        for (&channel, &level) in state {
            if channel >= channels.min(MAX_CHANNELS) {
                return Err(TraceError::InvalidConfig(format!(
                    "initial state names channel {} but the capture has {} channels",
                    channel, channels
                )));
            }
            match level {
                0 => {}
                1 => bits |= 1u64 << channel,
                other => {
                    return Err(TraceError::InvalidConfig(format!(
                        "initial level for channel {} must be 0 or 1, got {}",
                        channel, other
                    )))
                }
            }
        }
        Ok(Sample(bits))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_config_builder() {
        let config = InputConfig::new()
            .with_initial_level(0, 1)
            .with_initial_level(2, 1)
            .with_sample_budget(10);

        assert_eq!(config.budget(), Some(10));
        assert_eq!(config.seed(3).unwrap(), Sample(0b101));
    }

    #[test]
    fn test_zero_budget_is_unlimited() {
        let config = InputConfig::new().with_sample_budget(0);
        assert_eq!(config.budget(), None);
        assert_eq!(InputConfig::new().budget(), None);
    }

    #[test]
    fn test_seed_defaults_to_zero() {
        assert_eq!(InputConfig::new().seed(4).unwrap(), Sample(0));
    }

    #[test]
    fn test_seed_rejects_bad_levels() {
        let config = InputConfig::new().with_initial_level(0, 2);
        assert!(matches!(config.seed(2), Err(TraceError::InvalidConfig(_))));

        let config = InputConfig::new().with_initial_level(5, 1);
        assert!(matches!(config.seed(2), Err(TraceError::InvalidConfig(_))));
    }
}
