//! Run configuration

use std::time::Duration;

use crate::error::ConfigError;

pub const MIN_TIMEOUT_SECS: u64 = 5;
pub const MAX_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_TIMEOUT_SECS: u64 = 25;

pub const MIN_DELAY_SECS: f64 = 0.0;
pub const MAX_DELAY_SECS: f64 = 10.0;

/// Per-batch settings: request timeout and pause between URLs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunConfig {
    pub timeout: Duration,
    pub delay: Duration,
}

impl RunConfig {
    pub fn new(timeout_secs: u64, delay_secs: f64) -> Result<Self, ConfigError> {
        if !(MIN_TIMEOUT_SECS..=MAX_TIMEOUT_SECS).contains(&timeout_secs) {
            return Err(ConfigError::TimeoutOutOfRange {
                value: timeout_secs,
                min: MIN_TIMEOUT_SECS,
                max: MAX_TIMEOUT_SECS,
            });
        }
        // NaN fails the range check too
        if !(MIN_DELAY_SECS..=MAX_DELAY_SECS).contains(&delay_secs) {
            return Err(ConfigError::DelayOutOfRange {
                value: delay_secs,
                min: MIN_DELAY_SECS,
                max: MAX_DELAY_SECS,
            });
        }

        Ok(Self {
            timeout: Duration::from_secs(timeout_secs),
            delay: Duration::from_secs_f64(delay_secs),
        })
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            delay: Duration::ZERO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RunConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(25));
        assert_eq!(config.delay, Duration::ZERO);
        assert_eq!(RunConfig::new(25, 0.0), Ok(config));
    }

    #[test]
    fn test_bounds_are_inclusive() {
        assert!(RunConfig::new(5, 0.0).is_ok());
        assert!(RunConfig::new(120, 10.0).is_ok());
        assert_eq!(
            RunConfig::new(30, 1.5).unwrap().delay,
            Duration::from_millis(1500)
        );
    }

    #[test]
    fn test_out_of_range() {
        assert!(matches!(
            RunConfig::new(4, 0.0),
            Err(ConfigError::TimeoutOutOfRange { value: 4, .. })
        ));
        assert!(matches!(
            RunConfig::new(121, 0.0),
            Err(ConfigError::TimeoutOutOfRange { .. })
        ));
        assert!(matches!(
            RunConfig::new(25, 10.5),
            Err(ConfigError::DelayOutOfRange { .. })
        ));
        assert!(matches!(
            RunConfig::new(25, -0.1),
            Err(ConfigError::DelayOutOfRange { .. })
        ));
        assert!(RunConfig::new(25, f64::NAN).is_err());
    }
}
