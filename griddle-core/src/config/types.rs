//! Configuration type definitions

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::hardware::HardwareConfig;

/// Complete cell configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CellConfig {
    /// Robot controller connection
    pub robot: RobotConfig,
    /// Patty recipe timings and thresholds
    pub recipe: RecipeConfig,
    /// Control loop cadence
    pub control: ControlConfig,
    /// Mezzanine pin and bus assignments
    pub hardware: HardwareConfig,
    /// Vision detector invocation
    pub detector: DetectorConfig,
}

/// Configuration problems found by [`CellConfig::validate`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("control.tick_interval must be greater than zero")]
    ZeroTickInterval,

    #[error("robot.poll_interval must be greater than zero")]
    ZeroPollInterval,

    #[error("detector.command must not be empty")]
    EmptyDetectorCommand,

    #[error("robot.address must not be empty")]
    EmptyRobotAddress,

    #[error("GPIO {gpio} is assigned to both {first} and {second}")]
    DuplicateGpio {
        gpio: u32,
        first: &'static str,
        second: &'static str,
    },

    #[error("recipe.done_temperature_c must be a finite number")]
    InvalidThreshold,
}

impl CellConfig {
    /// Check cross-field constraints serde cannot express
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.control.tick_interval.is_zero() {
            return Err(ValidationError::ZeroTickInterval);
        }
        if self.robot.poll_interval.is_zero() {
            return Err(ValidationError::ZeroPollInterval);
        }
        if self.robot.address.trim().is_empty() {
            return Err(ValidationError::EmptyRobotAddress);
        }
        if self.detector.command.trim().is_empty() {
            return Err(ValidationError::EmptyDetectorCommand);
        }
        if !self.recipe.done_temperature_c.is_finite() {
            return Err(ValidationError::InvalidThreshold);
        }

        let mut seen: Vec<(&'static str, u32)> = Vec::new();
        for (name, gpio) in self.hardware.gpio_assignments() {
            if let Some((first, _)) = seen.iter().find(|(_, g)| *g == gpio) {
                return Err(ValidationError::DuplicateGpio {
                    gpio,
                    first: *first,
                    second: name,
                });
            }
            seen.push((name, gpio));
        }

        Ok(())
    }
}

/// Robot controller connection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RobotConfig {
    /// Controller IP address or hostname
    pub address: String,
    /// Modbus/TCP port
    pub port: u16,
    /// Modbus unit identifier
    pub unit_id: u8,
    /// Sleep after every busy-flag read while claiming
    #[serde(with = "humantime_serde")]
    pub poll_interval: Duration,
    /// Socket read timeout for one request
    #[serde(with = "humantime_serde")]
    pub response_timeout: Duration,
    /// Give up waiting for a command to finish after this long
    ///
    /// Unset means wait forever.
    #[serde(with = "humantime_serde")]
    pub completion_timeout: Option<Duration>,
}

impl Default for RobotConfig {
    fn default() -> Self {
        Self {
            address: "192.168.10.10".into(),
            port: 502,
            unit_id: 0xFF,
            poll_interval: Duration::from_millis(10),
            response_timeout: Duration::from_millis(500),
            completion_timeout: None,
        }
    }
}

/// Patty recipe timings and thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecipeConfig {
    /// Longest the first side cooks before flipping
    #[serde(with = "humantime_serde")]
    pub flip_after: Duration,
    /// Time on the second side before removal
    #[serde(with = "humantime_serde")]
    pub remove_after: Duration,
    /// Surface temperature at which the first side is done
    pub done_temperature_c: f64,
    /// How long the conveyor runs after a deposit
    #[serde(with = "humantime_serde")]
    pub conveyor_run: Duration,
}

impl Default for RecipeConfig {
    fn default() -> Self {
        Self {
            flip_after: Duration::from_secs(60),
            remove_after: Duration::from_secs(5),
            done_temperature_c: 27.0,
            conveyor_run: Duration::from_secs(3),
        }
    }
}

/// Control loop cadence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlConfig {
    /// Sleep between scheduler ticks
    #[serde(with = "humantime_serde")]
    pub tick_interval: Duration,
    /// How often to refresh the robot session while cooking
    #[serde(with = "humantime_serde")]
    pub refresh_interval: Duration,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(250),
            refresh_interval: Duration::from_secs(5),
        }
    }
}

/// Vision detector invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Program that captures a frame and prints one `x y` line per item
    pub command: String,
    /// Arguments passed to the program
    pub args: Vec<String>,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            command: "detect-patties".into(),
            args: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = CellConfig::default();
        assert_eq!(config.validate(), Ok(()));
        assert_eq!(config.robot.port, 502);
        assert_eq!(config.recipe.flip_after, Duration::from_secs(60));
        assert_eq!(config.recipe.remove_after, Duration::from_secs(5));
        assert_eq!(config.recipe.done_temperature_c, 27.0);
        assert_eq!(config.robot.completion_timeout, None);
    }

    #[test]
    fn test_zero_tick_rejected() {
        let mut config = CellConfig::default();
        config.control.tick_interval = Duration::ZERO;
        assert_eq!(config.validate(), Err(ValidationError::ZeroTickInterval));
    }

    #[test]
    fn test_empty_detector_rejected() {
        let mut config = CellConfig::default();
        config.detector.command = "  ".into();
        assert_eq!(config.validate(), Err(ValidationError::EmptyDetectorCommand));
    }

    #[test]
    fn test_duplicate_gpio_rejected() {
        let mut config = CellConfig::default();
        config.hardware.stop_gpio = config.hardware.hotplate_gpio;
        assert_eq!(
            config.validate(),
            Err(ValidationError::DuplicateGpio {
                gpio: 68,
                first: "hotplate",
                second: "stop button",
            })
        );
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: CellConfig = toml::from_str(
            r#"
            [robot]
            address = "10.0.0.5"
            completion_timeout = "2m"

            [recipe]
            flip_after = "90s"
            "#,
        )
        .unwrap();

        assert_eq!(config.robot.address, "10.0.0.5");
        assert_eq!(config.robot.port, 502);
        assert_eq!(config.robot.completion_timeout, Some(Duration::from_secs(120)));
        assert_eq!(config.recipe.flip_after, Duration::from_secs(90));
        assert_eq!(config.recipe.remove_after, Duration::from_secs(5));
        assert_eq!(config.hardware, HardwareConfig::default());
    }
}
