//! bitmm Compiler - tile-job descriptor to instruction stream
//!
//! This crate turns a [`TileJobDescriptor`](bitmm_core::TileJobDescriptor) into
//! the execute-stage instruction stream of a bit-serial matrix multiply.

pub mod error;
pub mod compiler;
pub mod codegen;
pub mod semantic;
pub mod sink;
pub mod validator;

// Re-export main types
pub use error::{CompileError, Result};
pub use compiler::{Compiler, CompilerOptions};

pub use codegen::ExecInstructionGenerator;
pub use semantic::DescriptorAnalyzer;
pub use sink::InstructionSink;
pub use validator::{StreamValidator, ValidationReport};
