//! Scene configuration
//!
//! Viewport and projection parameters plus the frame-pacing multiplier,
//! loadable from TOML for applications that keep display settings in a
//! file. All fields have sensible defaults; `SceneConfig::default()` is a
//! complete working configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Errors raised while loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    /// The config file is not valid TOML for this schema
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A field value is outside its legal range
    #[error("Invalid config value: {0}")]
    Invalid(String),
}

/// Scene construction parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Viewport width in points
    pub width: f32,
    /// Viewport height in points
    pub height: f32,
    /// Fixed vertical field of view in degrees
    pub fov_degrees: f32,
    /// Near clip plane distance
    pub near_plane: f32,
    /// Far clip plane, as a multiple of the derived camera distance
    pub far_plane_factor: f32,
    /// Uniform buffers in flight per drawable (triple-buffering headroom)
    pub inflight_multiplier: usize,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
            fov_degrees: 85.0,
            near_plane: 0.1,
            far_plane_factor: 10.5,
            inflight_multiplier: 3,
        }
    }
}

impl SceneConfig {
    /// Default configuration at an explicit viewport size
    pub fn with_viewport(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Check field ranges
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width <= 0.0 || self.height <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "viewport must be positive, got {}x{}",
                self.width, self.height
            )));
        }
        if !(0.0..180.0).contains(&self.fov_degrees) || self.fov_degrees == 0.0 {
            return Err(ConfigError::Invalid(format!(
                "field of view must be in (0, 180) degrees, got {}",
                self.fov_degrees
            )));
        }
        if self.near_plane <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "near plane must be positive, got {}",
                self.near_plane
            )));
        }
        if self.inflight_multiplier == 0 {
            return Err(ConfigError::Invalid(
                "inflight_multiplier must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(SceneConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: SceneConfig = toml::from_str("width = 1920.0\nheight = 1080.0").unwrap();
        assert_eq!(config.width, 1920.0);
        assert_eq!(config.height, 1080.0);
        assert_eq!(config.fov_degrees, 85.0);
        assert_eq!(config.inflight_multiplier, 3);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let zero_viewport = SceneConfig {
            width: 0.0,
            ..SceneConfig::default()
        };
        assert!(zero_viewport.validate().is_err());

        let wild_fov = SceneConfig {
            fov_degrees: 200.0,
            ..SceneConfig::default()
        };
        assert!(wild_fov.validate().is_err());

        let no_headroom = SceneConfig {
            inflight_multiplier: 0,
            ..SceneConfig::default()
        };
        assert!(no_headroom.validate().is_err());
    }
}
