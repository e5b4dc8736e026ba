use std::time::Duration;

use crate::config::Config;
use crate::error::ConfigError;

/// Timing knobs for one game session
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    /// Gap between successive lamp activations
    pub lamp_interval: Duration,
    /// Bounds of the randomized hold after the last lamp
    pub hold_min: Duration,
    pub hold_max: Duration,
    pub debounce: Duration,
    pub result_cooldown: Duration,
    pub history_capacity: usize,
    pub elite_threshold_secs: f64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for SessionConfig {
    fn from(cfg: &Config) -> Self {
        Self {
            lamp_interval: Duration::from_millis(cfg.lamp_interval_ms),
            hold_min: Duration::from_millis(cfg.hold_min_ms),
            hold_max: Duration::from_millis(cfg.hold_max_ms),
            debounce: Duration::from_millis(cfg.debounce_ms),
            result_cooldown: Duration::from_millis(cfg.result_cooldown_ms),
            history_capacity: cfg.history_capacity,
            elite_threshold_secs: cfg.elite_threshold_secs,
        }
    }
}

/// Upper bound for the lamp interval and the hold
pub const MAX_TIMING: Duration = Duration::from_secs(60);

fn within_limit(field: &'static str, value: Duration) -> Result<(), ConfigError> {
    if value > MAX_TIMING {
        return Err(ConfigError::TimingTooLong {
            field,
            ms: u64::try_from(value.as_millis()).unwrap_or(u64::MAX),
            max_ms: MAX_TIMING.as_millis() as u64,
        });
    }
    Ok(())
}

impl SessionConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.lamp_interval.is_zero() {
            return Err(ConfigError::ZeroLampInterval);
        }
        within_limit("lamp interval", self.lamp_interval)?;
        within_limit("maximum hold", self.hold_max)?;
        if self.hold_min > self.hold_max {
            return Err(ConfigError::InvertedHoldRange {
                min_ms: self.hold_min.as_millis() as u64,
                max_ms: self.hold_max.as_millis() as u64,
            });
        }
        if self.history_capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        if !(self.elite_threshold_secs > 0.0) {
            return Err(ConfigError::InvalidEliteThreshold(self.elite_threshold_secs));
        }
        Ok(())
    }
}
