//! Physics settings
//!
//! Loaded from the `[physics]` table of a TOML file; missing keys fall back to
//! the defaults below.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::breadcrumb::DEFAULT_BREADCRUMB_CAPACITY;
use crate::error::ConfigError;
use crate::swept::PLATFORM_TOLERANCE;

/// Tunables for collision and breadcrumb handling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Height of the band above a platform's top that still counts as standing on it
    pub platform_tolerance: f32,
    /// Edge length of one map tile; breadcrumbs snap to tile centers
    pub tile_size: f32,
    /// Breadcrumbs kept per body
    pub breadcrumb_capacity: usize,
    /// Normal warp exponent for contact estimation (1 = box, >1 = capsule-like)
    pub contact_exponent: f32,
    /// Ticks after which a breadcrumb is recorded even without a grid change (0 = never)
    pub breadcrumb_min_age: u32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            platform_tolerance: PLATFORM_TOLERANCE,
            tile_size: 128.0,
            breadcrumb_capacity: DEFAULT_BREADCRUMB_CAPACITY,
            contact_exponent: 1.0,
            breadcrumb_min_age: 0,
        }
    }
}

impl PhysicsConfig {
    /// Parse settings from TOML text and validate them
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: PhysicsConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load settings from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Check every setting is within its allowed range
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.platform_tolerance >= 0.0) {
            return Err(invalid("platform_tolerance", "must be zero or positive"));
        }
        if !(self.tile_size > 0.0) || !self.tile_size.is_finite() {
            return Err(invalid("tile_size", "must be positive"));
        }
        if self.breadcrumb_capacity == 0 {
            return Err(invalid("breadcrumb_capacity", "must be at least 1"));
        }
        if !(self.contact_exponent >= 1.0) || !self.contact_exponent.is_finite() {
            return Err(invalid("contact_exponent", "must be at least 1"));
        }
        Ok(())
    }
}

fn invalid(field: &'static str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field,
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = PhysicsConfig::default();
        assert_eq!(config.platform_tolerance, 50.0);
        assert_eq!(config.tile_size, 128.0);
        assert_eq!(config.breadcrumb_capacity, 32);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = PhysicsConfig::from_toml_str("contact_exponent = 2.0").unwrap();
        assert_eq!(config.contact_exponent, 2.0);
        assert_eq!(config.tile_size, 128.0);
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(matches!(
            PhysicsConfig::from_toml_str("tile_size = 0.0"),
            Err(ConfigError::InvalidValue { field: "tile_size", .. })
        ));
        assert!(matches!(
            PhysicsConfig::from_toml_str("breadcrumb_capacity = 0"),
            Err(ConfigError::InvalidValue { field: "breadcrumb_capacity", .. })
        ));
        assert!(matches!(
            PhysicsConfig::from_toml_str("contact_exponent = 0.5"),
            Err(ConfigError::InvalidValue { field: "contact_exponent", .. })
        ));
        assert!(matches!(
            PhysicsConfig::from_toml_str("platform_tolerance = -1.0"),
            Err(ConfigError::InvalidValue { field: "platform_tolerance", .. })
        ));
    }

    #[test]
    fn test_parse_error() {
        assert!(matches!(
            PhysicsConfig::from_toml_str("tile_size = \"big\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "platform_tolerance = 12.5").unwrap();
        let config = PhysicsConfig::load(file.path()).unwrap();
        assert_eq!(config.platform_tolerance, 12.5);
    }

    #[test]
    fn test_load_missing_file() {
        assert!(matches!(
            PhysicsConfig::load("/nonexistent/physics.toml"),
            Err(ConfigError::Io(_))
        ));
    }
}
