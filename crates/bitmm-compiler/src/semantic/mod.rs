//! Semantic analysis module
//!
//! Checks tile-job descriptors before any instruction is generated.

pub mod analyzer;

pub use analyzer::DescriptorAnalyzer;
