//! Instruction sinks
//!
//! Ordered, unbounded destinations for generated instructions.

use crate::error::{CompileError, Result};
use bitmm_core::{Instruction, Program};
use std::sync::mpsc::Sender;

/// Destination of an instruction stream
///
/// Implementations must preserve write order: the consumer executes
/// instructions exactly in the order they are written.
pub trait InstructionSink {
    /// Append one instruction to the stream
    fn write(&mut self, instruction: Instruction) -> Result<()>;
}

impl InstructionSink for Vec<Instruction> {
    fn write(&mut self, instruction: Instruction) -> Result<()> {
        self.push(instruction);
        Ok(())
    }
}

impl InstructionSink for Program {
    fn write(&mut self, instruction: Instruction) -> Result<()> {
        self.push_instruction(instruction);
        Ok(())
    }
}

impl InstructionSink for Sender<Instruction> {
    fn write(&mut self, instruction: Instruction) -> Result<()> {
        self.send(instruction).map_err(|_| CompileError::SinkClosed)
    }
}

impl<S: InstructionSink + ?Sized> InstructionSink for &mut S {
    fn write(&mut self, instruction: Instruction) -> Result<()> {
        (**self).write(instruction)
    }
}
