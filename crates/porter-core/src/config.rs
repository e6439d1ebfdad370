//! Engine configuration.

use std::time::Duration;

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

/// Tuning knobs shared by the filesystem primitives and the task layer.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into))]
pub struct EngineConfig {
    /// Period of the per-file byte-delta ticker during stream copies.
    #[builder(default = "Duration::from_secs(1)")]
    #[serde(default = "default_delta_tick")]
    pub delta_tick: Duration,

    /// Period of the speed-sampling ticker in task aggregators.
    #[builder(default = "Duration::from_secs(2)")]
    #[serde(default = "default_speed_tick")]
    pub speed_tick: Duration,

    /// Buffer size of the progress channels between a work loop and its
    /// aggregator.
    #[builder(default = "100")]
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

fn default_delta_tick() -> Duration {
    Duration::from_secs(1)
}

fn default_speed_tick() -> Duration {
    Duration::from_secs(2)
}

fn default_channel_capacity() -> usize {
    100
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            delta_tick: default_delta_tick(),
            speed_tick: default_speed_tick(),
            channel_capacity: default_channel_capacity(),
        }
    }
}

impl EngineConfig {
    /// Start building a configuration.
    pub fn builder() -> EngineConfigBuilder {
        EngineConfigBuilder::default()
    }
}
