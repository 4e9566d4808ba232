//! Engine configuration.
//!
//! Parameters can be loaded from YAML or JSON. Circuits themselves are
//! built through the API; the file only tunes the engine.
//!
//! # Configuration File Structure
//!
//! ```yaml
//! simulation:
//!   log_level: info
//!   max_visits_per_pass: 1000
//!   slack: 100
//!   unconnected_input: low
//!   start_paused: false
//!   verify_combinational: false
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::recalc::DEFAULT_MAX_VISITS;
use crate::resolver::UnconnectedInput;
use crate::timeline::{TimelineConfig, DEFAULT_SLACK};
use crate::types::SimTime;

/// Errors that can occur during configuration loading.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unknown file format: {0}")]
    UnknownFormat(String),
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Engine parameters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationParams {
    /// Logging level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Evaluations of one component allowed in a single recalculation pass
    #[serde(default = "default_max_visits")]
    pub max_visits_per_pass: u32,

    /// Lateness tolerated before the timeline shifts its epoch
    #[serde(default = "default_slack")]
    pub slack: SimTime,

    /// What an input with no wires reads
    #[serde(default)]
    pub unconnected_input: UnconnectedInput,

    /// Start with the timeline paused
    #[serde(default)]
    pub start_paused: bool,

    /// Evaluate combinational components twice and flag differing results
    #[serde(default)]
    pub verify_combinational: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_visits() -> u32 {
    DEFAULT_MAX_VISITS
}

fn default_slack() -> SimTime {
    DEFAULT_SLACK
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            max_visits_per_pass: default_max_visits(),
            slack: default_slack(),
            unconnected_input: UnconnectedInput::default(),
            start_paused: false,
            verify_combinational: false,
        }
    }
}

impl SimulationParams {
    /// Timeline parameters derived from these settings.
    pub fn timeline_config(&self) -> TimelineConfig {
        TimelineConfig {
            slack: self.slack,
            start_paused: self.start_paused,
        }
    }

    /// Validates the parameters.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.max_visits_per_pass == 0 {
            return Err(ConfigError::Validation(
                "max_visits_per_pass must be at least 1".to_string(),
            ));
        }
        if !LOG_LEVELS.contains(&self.log_level.to_lowercase().as_str()) {
            return Err(ConfigError::Validation(format!(
                "Unknown log level: {}",
                self.log_level
            )));
        }
        if self.slack == 0 {
            tracing::warn!("slack is 0, every late batch will shift the epoch");
        }
        Ok(())
    }
}

/// Complete configuration file.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimConfig {
    /// Engine parameters
    #[serde(default)]
    pub simulation: SimulationParams,
}

impl SimConfig {
    /// Creates a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a YAML file.
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Loads configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> ConfigResult<Self> {
        let config: SimConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from a JSON file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Loads configuration from a JSON string.
    pub fn from_json(json: &str) -> ConfigResult<Self> {
        let config: SimConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from a file, auto-detecting format.
    pub fn from_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let path = path.as_ref();
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

        match ext.to_lowercase().as_str() {
            "yaml" | "yml" => Self::from_yaml_file(path),
            "json" => Self::from_json_file(path),
            _ => Err(ConfigError::UnknownFormat(ext.to_string())),
        }
    }

    /// Validates the entire configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        self.simulation.validate()
    }

    /// Saves configuration to a YAML file.
    pub fn to_yaml_file<P: AsRef<Path>>(&self, path: P) -> ConfigResult<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Saves configuration to a JSON file.
    pub fn to_json_file<P: AsRef<Path>>(&self, path: P) -> ConfigResult<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Converts to YAML string.
    pub fn to_yaml(&self) -> ConfigResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Converts to JSON string.
    pub fn to_json(&self) -> ConfigResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Builder for creating SimConfig programmatically.
#[derive(Default)]
pub struct SimConfigBuilder {
    config: SimConfig,
}

impl SimConfigBuilder {
    /// Starts from the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the log level.
    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.config.simulation.log_level = level.into();
        self
    }

    /// Sets the per-pass visit bound.
    pub fn max_visits_per_pass(mut self, visits: u32) -> Self {
        self.config.simulation.max_visits_per_pass = visits;
        self
    }

    /// Sets the tolerated lateness.
    pub fn slack(mut self, slack: SimTime) -> Self {
        self.config.simulation.slack = slack;
        self
    }

    /// Sets what unconnected inputs read.
    pub fn unconnected_input(mut self, policy: UnconnectedInput) -> Self {
        self.config.simulation.unconnected_input = policy;
        self
    }

    /// Starts the timeline paused.
    pub fn start_paused(mut self, paused: bool) -> Self {
        self.config.simulation.start_paused = paused;
        self
    }

    /// Enables the double-evaluation purity check.
    pub fn verify_combinational(mut self, enable: bool) -> Self {
        self.config.simulation.verify_combinational = enable;
        self
    }

    /// Builds and validates the configuration.
    pub fn build(self) -> ConfigResult<SimConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SimConfig::new();
        assert_eq!(config.simulation.max_visits_per_pass, 1000);
        assert_eq!(config.simulation.slack, 100);
        assert_eq!(config.simulation.unconnected_input, UnconnectedInput::Low);
        assert!(!config.simulation.start_paused);
    }

    #[test]
    fn test_yaml_parsing() {
        let yaml = r#"
simulation:
  log_level: debug
  max_visits_per_pass: 50
  slack: 20
  unconnected_input: highz
  start_paused: true
"#;

        let config = SimConfig::from_yaml(yaml).unwrap();
        let params = &config.simulation;
        assert_eq!(params.log_level, "debug");
        assert_eq!(params.max_visits_per_pass, 50);
        assert_eq!(params.unconnected_input, UnconnectedInput::HighZ);
        assert_eq!(
            params.timeline_config(),
            TimelineConfig {
                slack: 20,
                start_paused: true
            }
        );
        assert!(!params.verify_combinational);
    }

    #[test]
    fn test_json_parsing() {
        let json = r#"{
            "simulation": {
                "slack": 5,
                "verify_combinational": true
            }
        }"#;

        let config = SimConfig::from_json(json).unwrap();
        assert_eq!(config.simulation.slack, 5);
        assert!(config.simulation.verify_combinational);
        assert_eq!(config.simulation.log_level, "info");
    }

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = SimConfig::from_json("{}").unwrap();
        assert_eq!(config, SimConfig::default());
    }

    #[test]
    fn test_builder() {
        let config = SimConfigBuilder::new()
            .log_level("warn")
            .max_visits_per_pass(10)
            .unconnected_input(UnconnectedInput::HighZ)
            .start_paused(true)
            .build()
            .unwrap();

        assert_eq!(config.simulation.max_visits_per_pass, 10);
        assert!(config.simulation.start_paused);
    }

    #[test]
    fn test_validation_zero_visits() {
        let yaml = "simulation:\n  max_visits_per_pass: 0\n";
        assert!(matches!(
            SimConfig::from_yaml(yaml),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_validation_unknown_log_level() {
        let result = SimConfigBuilder::new().log_level("loud").build();
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_policy_rejected_by_parser() {
        let yaml = "simulation:\n  unconnected_input: floating\n";
        assert!(matches!(SimConfig::from_yaml(yaml), Err(ConfigError::Yaml(_))));
    }

    #[test]
    fn test_unknown_extension() {
        let err = SimConfig::from_file("engine.toml").unwrap_err();
        assert!(matches!(err, ConfigError::UnknownFormat(ext) if ext == "toml"));
    }

    #[test]
    fn test_serialization_roundtrip() {
        let config = SimConfigBuilder::new()
            .slack(250)
            .verify_combinational(true)
            .build()
            .unwrap();

        let yaml = config.to_yaml().unwrap();
        assert_eq!(SimConfig::from_yaml(&yaml).unwrap(), config);
    }
}
