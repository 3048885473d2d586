//! Configuration management for the ledger host
//!
//! Only host concerns live here. Protocol constants are compiled in so every
//! replica computes the same transitions.

use std::path::Path;

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Ledger host configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct LedgerConfig {
    pub logging: LoggingConfig,
    pub service: ServiceConfig,
    pub report: ReportConfig,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Default level for `oracle_ledger` targets
    pub level: String,

    /// Emit JSON lines instead of the human-readable format
    pub json: bool,
}

/// Single-writer actor settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ServiceConfig {
    /// Bounded command queue length per market
    pub channel_capacity: usize,
}

/// Where settlement reports go
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SinkKind {
    Log,
    Stdout,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ReportConfig {
    pub sink: SinkKind,

    /// Pretty-print JSON reports
    pub pretty: bool,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            logging: LoggingConfig {
                level: "info".to_string(),
                json: false,
            },
            service: ServiceConfig {
                channel_capacity: 1024,
            },
            report: ReportConfig {
                sink: SinkKind::Log,
                pretty: false,
            },
        }
    }
}

impl LedgerConfig {
    /// Layer defaults, `config/default`, an optional file and `ORACLE__*` variables
    pub fn load(path: Option<&str>) -> Result<Self> {
        let mut builder = Config::builder()
            .add_source(Config::try_from(&Self::default())?)
            .add_source(File::with_name("config/default").required(false));

        if let Some(path) = path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        let config: Self = builder
            .add_source(Environment::with_prefix("ORACLE").separator("__"))
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a YAML file (for `--generate-config`)
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.service.channel_capacity == 0 {
            return Err(ConfigError::Message(
                "service.channel_capacity must be greater than 0".into(),
            ));
        }

        if self.logging.level.parse::<tracing::Level>().is_err() {
            return Err(ConfigError::Message(format!(
                "Invalid log level: {}",
                self.logging.level
            )));
        }

        Ok(())
    }
}
