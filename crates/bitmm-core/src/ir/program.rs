//! IR Program
//!
//! A program is the full instruction stream generated for one tile job,
//! with the descriptor it was generated from.

use crate::descriptor::TileJobDescriptor;
use crate::error::{CoreError, Result};
use crate::ir::{ExecInstruction, Instruction};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// An instruction stream ready for the execution pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    /// The sequence of instructions, in execution order
    pub instructions: Vec<Instruction>,

    /// Program metadata
    pub metadata: ProgramMetadata,
}

/// Metadata associated with a program
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramMetadata {
    /// Descriptor the program was generated from
    pub descriptor: TileJobDescriptor,

    /// Optional name
    pub name: Option<String>,

    /// Custom metadata fields
    #[serde(default)]
    pub custom: HashMap<String, String>,

    /// Version of the generator that produced this
    pub compiler_version: String,
}

impl Program {
    /// Create a new program
    pub fn new(instructions: Vec<Instruction>, metadata: ProgramMetadata) -> Self {
        Self {
            instructions,
            metadata,
        }
    }

    /// Get the number of instructions
    pub fn instruction_count(&self) -> usize {
        self.instructions.len()
    }

    /// Check if program is empty
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Add an instruction to the end
    pub fn push_instruction(&mut self, instruction: Instruction) {
        self.instructions.push(instruction);
    }

    /// Get instruction at index
    pub fn get_instruction(&self, index: usize) -> Option<&Instruction> {
        self.instructions.get(index)
    }

    /// Iterate over instructions in order
    pub fn iter(&self) -> std::slice::Iter<'_, Instruction> {
        self.instructions.iter()
    }

    /// Synchronization instructions, in order
    pub fn sync_instructions(&self) -> impl Iterator<Item = &Instruction> {
        self.instructions.iter().filter(|i| i.is_sync())
    }

    /// Compute steps, in order
    pub fn exec_instructions(&self) -> impl Iterator<Item = &ExecInstruction> {
        self.instructions.iter().filter_map(Instruction::as_exec)
    }

    /// One disassembled line per instruction
    pub fn disassemble(&self) -> String {
        let mut out = String::new();
        for (idx, instr) in self.instructions.iter().enumerate() {
            out.push_str(&format!("{:>6}: {}\n", idx, instr));
        }
        out
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| CoreError::Serialization(e.to_string()))
    }

    /// Serialize to YAML
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(|e| CoreError::Serialization(e.to_string()))
    }
}

impl<'a> IntoIterator for &'a Program {
    type Item = &'a Instruction;
    type IntoIter = std::slice::Iter<'a, Instruction>;

    fn into_iter(self) -> Self::IntoIter {
        self.instructions.iter()
    }
}

impl ProgramMetadata {
    /// Create metadata for a program generated from `descriptor`
    pub fn for_descriptor(descriptor: TileJobDescriptor) -> Self {
        Self {
            descriptor,
            name: None,
            custom: HashMap::new(),
            compiler_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// Set the name
    pub fn with_name(mut self, name: String) -> Self {
        self.name = Some(name);
        self
    }

    /// Add a custom metadata field
    pub fn with_custom(mut self, key: String, value: String) -> Self {
        self.custom.insert(key, value);
        self
    }
}
