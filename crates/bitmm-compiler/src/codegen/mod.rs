//! Code generation module
//!
//! This module contains the generators that turn tile-job descriptors into IR.

pub mod exec_codegen;

pub use exec_codegen::ExecInstructionGenerator;
