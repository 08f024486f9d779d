//! CLI configuration

use crate::error::{CliError, Result};
use serde::{Deserialize, Serialize};

/// Program output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// One disassembled instruction per line
    #[default]
    Text,
    /// Pretty-printed JSON program
    Json,
    /// YAML program
    Yaml,
}

/// CLI configuration
///
/// Command-line flags take precedence over these values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CliConfig {
    /// Log level for the bitmm crates
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Output format when `--format` is not given
    #[serde(default)]
    pub default_format: OutputFormat,

    /// Replay generated programs through the stream validator
    #[serde(default = "default_verify_protocol")]
    pub verify_protocol: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_verify_protocol() -> bool {
    true
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            default_format: OutputFormat::default(),
            verify_protocol: default_verify_protocol(),
        }
    }
}

impl CliConfig {
    /// Load configuration from `config/bitmm.*` and `BITMM_*` environment variables
    pub fn load() -> Result<Self> {
        // Load .env file if exists
        dotenvy::dotenv().ok();
        Self::load_from("config/bitmm")
    }

    /// Load configuration from an optional file (extension may be omitted)
    /// layered under `BITMM_*` environment variables
    ///
    /// A missing file yields the defaults; an unreadable or malformed one is
    /// an error, left to the caller to report.
    pub fn load_from(file: &str) -> Result<Self> {
        let config_result = config::Config::builder()
            .add_source(config::File::with_name(file).required(false))
            .add_source(config::Environment::with_prefix("BITMM"))
            .build();

        config_result
            .map_err(|e| CliError::Config(format!("Failed to read config: {}", e)))?
            .try_deserialize()
            .map_err(|e| CliError::Config(format!("Failed to deserialize config: {}", e)))
    }

    /// Tracing filter directive for the configured log level
    pub fn filter_directive(&self) -> String {
        format!(
            "bitmm={lvl},bitmm_cli={lvl},bitmm_compiler={lvl}",
            lvl = self.log_level
        )
    }
}
