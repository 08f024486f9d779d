//! CLI error types

use bitmm_compiler::CompileError;
use bitmm_core::CoreError;
use std::path::PathBuf;
use thiserror::Error;

/// CLI error type
#[derive(Error, Debug)]
pub enum CliError {
    /// Descriptor or output file could not be accessed
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Descriptor file could not be parsed
    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: CoreError,
    },

    /// Generation failed
    #[error(transparent)]
    Compile(#[from] CompileError),

    /// Output could not be serialized
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Configuration could not be loaded
    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, CliError>;
