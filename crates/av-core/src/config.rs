//! Viewer configuration structures
//!
//! Settings for exploded-view interpolation and inference ingestion that can
//! be serialized and loaded from RON configuration files.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_CONFIDENCE_THRESHOLD, DEFAULT_EXPLODE_DISTANCE, DEFAULT_EXPLODE_SPEED,
    EXPLODE_DISTANCE_STEP,
};

/// Exploded-view defaults
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ExplodeConfig {
    /// Distance per assembly-order index for parts without a distance
    pub distance_step: f32,
    /// Distance for parts with neither a distance nor an order index
    pub default_distance: f32,
    /// Speed for parts without a speed
    pub default_speed: f32,
    /// Unscrew turns for threaded parts without their own value
    pub default_unscrew_turns: Option<f32>,
}

impl Default for ExplodeConfig {
    fn default() -> Self {
        Self {
            distance_step: EXPLODE_DISTANCE_STEP,
            default_distance: DEFAULT_EXPLODE_DISTANCE,
            default_speed: DEFAULT_EXPLODE_SPEED,
            default_unscrew_turns: None,
        }
    }
}

/// Inference ingestion settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct InferenceConfig {
    /// Inferred placements below this confidence are ignored
    pub confidence_threshold: f32,
    /// Replace part constraints with inferred ones
    pub apply_constraints: bool,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            apply_constraints: true,
        }
    }
}

/// Complete viewer configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ViewerConfig {
    pub explode: ExplodeConfig,
    pub inference: InferenceConfig,
    /// Machine catalog file
    pub catalog_path: Option<PathBuf>,
}

impl ViewerConfig {
    /// Load configuration from a RON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content =
            std::fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io(e.to_string()))?;
        Self::from_ron(&content)
    }

    /// Parse configuration from RON text
    pub fn from_ron(content: &str) -> Result<Self, ConfigError> {
        ron::from_str(content).map_err(|e| ConfigError::Deserialize(e.to_string()))
    }

    /// Save configuration to a RON file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let content = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| ConfigError::Serialize(e.to_string()))?;
        std::fs::write(path.as_ref(), content).map_err(|e| ConfigError::Io(e.to_string()))
    }
}

/// Configuration-related errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Serialization error: {0}")]
    Serialize(String),
    #[error("Deserialization error: {0}")]
    Deserialize(String),
}
