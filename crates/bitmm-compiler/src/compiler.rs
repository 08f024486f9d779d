//! Main compiler
//!
//! Provides a unified interface for turning tile-job descriptors into
//! instruction streams.

use crate::codegen::ExecInstructionGenerator;
use crate::error::{CompileError, Result};
use crate::semantic::DescriptorAnalyzer;
use crate::sink::InstructionSink;
use crate::validator::StreamValidator;
use bitmm_core::ir::{Program, ProgramMetadata};
use bitmm_core::TileJobDescriptor;

/// Compiler options
#[derive(Debug, Clone)]
pub struct CompilerOptions {
    /// Replay generated programs through the stream validator
    pub verify_protocol: bool,
    /// Name recorded in program metadata
    pub program_name: Option<String>,
    /// Extra key/value pairs recorded in program metadata
    pub custom_metadata: Vec<(String, String)>,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self {
            verify_protocol: true,
            program_name: None,
            custom_metadata: Vec::new(),
        }
    }
}

/// The main bitmm compiler
///
/// Descriptor analysis is owned by [`ExecInstructionGenerator`], which runs
/// it before every emission; the compiler only reports the outcome.
#[derive(Debug, Clone, Default)]
pub struct Compiler {
    /// Compiler options
    options: CompilerOptions,
}

impl Compiler {
    /// Create a new compiler instance with default options
    pub fn new() -> Self {
        Self::with_options(CompilerOptions::default())
    }

    /// Create a new compiler instance with custom options
    pub fn with_options(options: CompilerOptions) -> Self {
        Self { options }
    }

    /// Check a descriptor without generating anything
    pub fn check(&self, dscr: &TileJobDescriptor) -> Result<()> {
        DescriptorAnalyzer::new()
            .analyze(dscr)
            .map_err(|e| Self::report(dscr, e))
    }

    /// Compile a descriptor into a program
    pub fn compile(&self, dscr: &TileJobDescriptor) -> Result<Program> {
        let program = ExecInstructionGenerator::generate_program_with(dscr, self.metadata(dscr))
            .map_err(|e| Self::report(dscr, e))?;

        if self.options.verify_protocol {
            let report = StreamValidator::validate_program(&program)?;
            tracing::debug!(
                result_tiles = report.result_tiles,
                exec = report.exec_count,
                sync = report.sync_count,
                "Program passed protocol validation"
            );
        }

        Ok(program)
    }

    /// Compile a descriptor straight into a sink
    ///
    /// Streams are not replayed through the validator; nothing is written
    /// when the descriptor is rejected.
    pub fn compile_into<S: InstructionSink>(&self, dscr: &TileJobDescriptor, sink: S) -> Result<usize> {
        ExecInstructionGenerator::generate(dscr, sink).map_err(|e| Self::report(dscr, e))
    }

    /// Get a reference to the options
    pub fn options(&self) -> &CompilerOptions {
        &self.options
    }

    fn metadata(&self, dscr: &TileJobDescriptor) -> ProgramMetadata {
        let mut metadata = ProgramMetadata::for_descriptor(*dscr);
        if let Some(name) = &self.options.program_name {
            metadata = metadata.with_name(name.clone());
        }
        for (key, value) in &self.options.custom_metadata {
            metadata = metadata.with_custom(key.clone(), value.clone());
        }
        metadata
    }

    fn report(dscr: &TileJobDescriptor, error: CompileError) -> CompileError {
        match &error {
            CompileError::SinkClosed => tracing::warn!("Sink closed while generating {}", dscr),
            _ => tracing::warn!("Rejected descriptor ({}): {}", dscr, error),
        }
        error
    }
}
