//! bitmm Core - Core types for the bit-serial matrix-multiply instruction generator
//!
//! This crate provides the fundamental types shared by the generator and its front ends:
//! - The tile-job descriptor that parameterizes one matrix-multiply job
//! - IR (instruction records and programs) consumed by the execution pipeline
//! - Error types

pub mod descriptor;
pub mod error;
pub mod ir;

// Re-export commonly used types
pub use descriptor::{Operand, TileJobDescriptor};
pub use error::CoreError;
pub use ir::{Channel, ExecInstruction, Instruction, Program, ProgramMetadata, TargetStage};
