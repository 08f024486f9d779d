//! Intermediate Representation (IR) for bitmm
//!
//! The IR is the instruction stream handed to the accelerator's execution
//! pipeline. It is the target of generation from a tile-job descriptor.

pub mod instruction;
pub mod program;

pub use instruction::{Channel, ExecInstruction, Instruction, TargetStage};
pub use program::{Program, ProgramMetadata};
