use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{PlayerError, PlayerResult};

pub const DEFAULT_BAR_COUNT: usize = 300;
pub const DEFAULT_SAMPLE_INTERVAL_MS: u64 = 50;

/// Tunables for waveform extraction, position sampling and drawing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Upper bound on the number of amplitude bars per recording.
    pub bar_count: usize,
    /// Period of the playback position sampler.
    pub sample_interval_ms: u64,
    pub bar_width: f32,
    pub bar_spacing: f32,
    /// Height of a bar with amplitude 1.0.
    pub bar_max_height: f32,
    pub indicator_height: f32,
    /// Width of the grab area around the position indicator.
    pub indicator_hitbox: f32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            bar_count: DEFAULT_BAR_COUNT,
            sample_interval_ms: DEFAULT_SAMPLE_INTERVAL_MS,
            bar_width: 2.0,
            bar_spacing: 2.0,
            bar_max_height: 50.0,
            indicator_height: 60.0,
            indicator_hitbox: 30.0,
        }
    }
}

impl PlayerConfig {
    /// Load a JSON config file, or the defaults when no path is given.
    pub fn load(path: Option<&Path>) -> PlayerResult<Self> {
        let config = match path {
            Some(path) => {
                let raw = fs::read_to_string(path)?;
                serde_json::from_str::<PlayerConfig>(&raw)?
            }
            None => PlayerConfig::default(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> PlayerResult<()> {
        if self.bar_count == 0 {
            return Err(PlayerError::Config("bar_count must be at least 1".into()));
        }
        if self.sample_interval_ms == 0 {
            return Err(PlayerError::Config(
                "sample_interval_ms must be greater than 0".into(),
            ));
        }
        Ok(())
    }

    pub fn sample_interval(&self) -> Duration {
        Duration::from_millis(self.sample_interval_ms)
    }
}
