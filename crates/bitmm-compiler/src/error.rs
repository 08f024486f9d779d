//! Compiler error types

use bitmm_core::{CoreError, Operand};
use thiserror::Error;

/// Compiler error
#[derive(Error, Debug)]
pub enum CompileError {
    /// Single-bit signed operands would need a bipolar encoding
    #[error("Unsupported precision: {operand} is 1-bit signed (bipolar encoding is not supported)")]
    SignedSingleBit { operand: Operand },

    /// A tile count, bit-width or buffer count is zero
    #[error("Invalid descriptor: {field} must be nonzero")]
    ZeroDimension { field: &'static str },

    /// An operand offset does not fit the instruction field
    #[error("Offset overflow: {operand} offsets reach {max}, beyond the 32-bit offset field")]
    OffsetOverflow { operand: Operand, max: u64 },

    /// The consumer of the instruction stream went away
    #[error("Instruction sink closed")]
    SinkClosed,

    /// A generated stream breaks the buffering protocol
    #[error("Protocol violation at instruction {index}: {message}")]
    ProtocolViolation { index: usize, message: String },

    /// Error from core types
    #[error(transparent)]
    Core(#[from] CoreError),
}

/// Result type for compiler operations
pub type Result<T> = std::result::Result<T, CompileError>;
