//! CLI commands
//!
//! Each command returns its output as a string so `main` decides where it goes.

use crate::config::OutputFormat;
use crate::error::{CliError, Result};
use bitmm_compiler::{Compiler, CompilerOptions};
use bitmm_core::{Program, TileJobDescriptor};
use std::path::Path;

/// Read a descriptor file, YAML for `.yaml`/`.yml` and JSON otherwise
pub fn load_descriptor(path: &Path) -> Result<TileJobDescriptor> {
    let content = std::fs::read_to_string(path).map_err(|e| CliError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;

    let is_yaml = matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some("yaml") | Some("yml")
    );
    let parsed = if is_yaml {
        TileJobDescriptor::from_yaml(&content)
    } else {
        TileJobDescriptor::from_json(&content)
    };

    parsed.map_err(|e| CliError::Parse {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Render a program in the requested format
pub fn render(program: &Program, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(program.disassemble()),
        OutputFormat::Json => Ok(program.to_json()?),
        OutputFormat::Yaml => Ok(program.to_yaml()?),
    }
}

/// Generate the instruction stream for a descriptor file
pub fn generate(path: &Path, format: OutputFormat, options: CompilerOptions) -> Result<String> {
    let dscr = load_descriptor(path)?;
    tracing::info!("Loaded descriptor from {}: {}", path.display(), dscr);

    let program = Compiler::with_options(options).compile(&dscr)?;
    tracing::info!("Generated {} instructions", program.instruction_count());

    render(&program, format)
}

/// Parse a `KEY=VALUE` metadata pair
pub fn parse_key_value(arg: &str) -> std::result::Result<(String, String), String> {
    match arg.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected KEY=VALUE, got '{}'", arg)),
    }
}

/// Validate a descriptor file and report the stream size it would produce
pub fn check(path: &Path) -> Result<String> {
    let dscr = load_descriptor(path)?;
    count(&dscr)
}

/// Validate a descriptor and report the stream size it would produce
pub fn count(dscr: &TileJobDescriptor) -> Result<String> {
    Compiler::new().check(dscr)?;

    Ok(format!(
        "{}: {} result tiles x {} bit pairs -> {} instructions\n",
        dscr,
        dscr.result_tiles(),
        dscr.bit_pairs(),
        dscr.expected_instruction_count()
    ))
}

/// Write command output to a file, or stdout when no file is given
pub fn emit_output(output: &str, file: Option<&Path>) -> Result<()> {
    match file {
        Some(path) => std::fs::write(path, output).map_err(|e| CliError::Io {
            path: path.to_path_buf(),
            source: e,
        }),
        None => {
            print!("{}", output);
            Ok(())
        }
    }
}
