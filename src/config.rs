//! Configuration for the pitch speed service.

use serde::{Deserialize, Serialize};

use crate::reference::{HistoryOrder, MAX_REFERENCE_ROWS};

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Artifact locations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceConfig {
    #[serde(default = "default_model_path")]
    pub model_path: String,
    #[serde(default = "default_mapping_path")]
    pub mapping_path: String,
    #[serde(default = "default_history_path")]
    pub history_path: String,
}

fn default_model_path() -> String {
    "data/models/first_pitch_speed.onnx".to_string()
}

fn default_mapping_path() -> String {
    "data/feature_mappings.json".to_string()
}

fn default_history_path() -> String {
    "data/historical_pitches.csv".to_string()
}

impl Default for ResourceConfig {
    fn default() -> Self {
        Self {
            model_path: default_model_path(),
            mapping_path: default_mapping_path(),
            history_path: default_history_path(),
        }
    }
}

/// Historical reference configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Reference rows per response, capped at 5
    #[serde(default = "default_history_limit")]
    pub limit: usize,
    #[serde(default)]
    pub order: HistoryOrder,
}

fn default_history_limit() -> usize {
    MAX_REFERENCE_ROWS
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            limit: default_history_limit(),
            order: HistoryOrder::default(),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub resources: ResourceConfig,
    #[serde(default)]
    pub history: HistoryConfig,
}

impl AppConfig {
    /// Load configuration from environment and config file
    pub fn load() -> anyhow::Result<Self> {
        let config = config::Config::builder()
            // Start with defaults
            .add_source(config::Config::try_from(&AppConfig::default())?)
            // Add config file if exists
            .add_source(config::File::with_name("config").required(false))
            // Override with environment variables (PITCHSPEED_RESOURCES__MODEL_PATH, etc.)
            .add_source(
                config::Environment::with_prefix("PITCHSPEED")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(config.try_deserialize()?)
    }
}
