//! bitmm CLI
//!
//! Loads tile-job descriptors from YAML or JSON files and prints the
//! generated instruction streams.

pub mod commands;
pub mod config;
pub mod error;

pub use config::{CliConfig, OutputFormat};
pub use error::{CliError, Result};
