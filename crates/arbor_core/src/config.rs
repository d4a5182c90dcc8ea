//! # Registry Configuration
//!
//! Capacity hints and validation limits. Loaded once at startup, either
//! from code or from a TOML file.
//!
//! ```toml
//! initial_objects = 65536
//! initial_hierarchy_nodes = 8192
//! initial_names = 4096
//! max_hierarchy_depth = 256
//! ```

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Registry configuration.
///
/// Capacities are reservations, not limits: every table grows past them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Object slots reserved up front.
    pub initial_objects: usize,
    /// Hierarchy nodes reserved up front.
    pub initial_hierarchy_nodes: usize,
    /// Name records reserved up front.
    pub initial_names: usize,
    /// Deepest parent chain `check_hierarchy` accepts.
    pub max_hierarchy_depth: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            initial_objects: 1024,
            initial_hierarchy_nodes: 256,
            initial_names: 256,
            max_hierarchy_depth: 256,
        }
    }
}

impl RegistryConfig {
    /// Sizing for a full game scene.
    #[must_use]
    pub fn production() -> Self {
        Self {
            initial_objects: 65_536,
            initial_hierarchy_nodes: 8_192,
            initial_names: 4_096,
            ..Self::default()
        }
    }

    /// Parses a config from TOML text. Missing keys take their defaults.
    ///
    /// # Errors
    ///
    /// Returns error if the text is not valid TOML or a value is out of range.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// Returns error if `max_hierarchy_depth` is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_hierarchy_depth == 0 {
            return Err(ConfigError::Invalid(
                "max_hierarchy_depth must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
