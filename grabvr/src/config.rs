use std::{collections::HashSet, fmt, fs, io, path::Path};

use cgmath::{Vector3, vec3};
use serde::{Deserialize, Serialize};

use crate::teleport::TeleportConfig;

/// Tunables for grabbing, throwing, highlighting, cleanup and teleporting.
///
/// Every field has a default, so a config file only needs the values it overrides:
///
/// ```json
/// { "throw_velocity_multiplier": 2.0, "excluded_names": ["floor"] }
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractionConfig {
    /// Scales the tracked controller velocity when it is handed to a released body.
    pub throw_velocity_multiplier: f32,
    /// World-owned entities whose height drops below this are despawned.
    pub floor_threshold: f32,
    /// Longest distance a controller ray can pick or aim at.
    pub ray_max_distance: f32,
    /// Ray indicator length when nothing is pointed at.
    pub default_ray_length: f32,
    /// Emissive color put on the cloned material of a held entity.
    pub highlight_emissive: Vector3<f32>,
    /// Node names that can be hit by rays but never grabbed or highlighted.
    pub excluded_names: HashSet<String>,
    pub gravity: Vector3<f32>,
    pub teleport: TeleportConfig,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        InteractionConfig {
            throw_velocity_multiplier: 1.5,
            floor_threshold: -5.0,
            ray_max_distance: 50.0,
            default_ray_length: 5.0,
            highlight_emissive: vec3(0.25, 0.25, 0.25),
            excluded_names: HashSet::new(),
            gravity: vec3(0.0, -9.81, 0.0),
            teleport: TeleportConfig::default(),
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: String,
        source: io::Error,
    },
    Parse(serde_json::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io { path, source } => {
                write!(f, "failed to read config '{}': {}", path, source)
            }
            ConfigError::Parse(source) => write!(f, "invalid interaction config: {}", source),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io { source, .. } => Some(source),
            ConfigError::Parse(source) => Some(source),
        }
    }
}

impl InteractionConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(ConfigError::Parse)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&contents)
    }

    pub fn is_excluded(&self, name: &str) -> bool {
        self.excluded_names.contains(name)
    }
}
