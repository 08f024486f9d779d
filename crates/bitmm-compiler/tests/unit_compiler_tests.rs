//! Unit tests for compiler components
//!
//! Tests the descriptor analyzer, execute-stage codegen, sinks, stream
//! validator and the compiler façade through the public API.

use bitmm_compiler::*;
use bitmm_core::ir::{Channel, Instruction, TargetStage};
use bitmm_core::{Operand, TileJobDescriptor};
use std::sync::mpsc;

fn exec_steps(instructions: &[Instruction]) -> Vec<bitmm_core::ExecInstruction> {
    instructions.iter().filter_map(Instruction::as_exec).copied().collect()
}

// =============================================================================
// Analyzer Tests
// =============================================================================

#[test]
fn test_analyzer_accepts_minimal() {
    let dscr = TileJobDescriptor::new(1, 1, 1);
    assert!(DescriptorAnalyzer::new().analyze(&dscr).is_ok());
}

#[test]
fn test_analyzer_accepts_two_bit_signed() {
    let dscr = TileJobDescriptor::new(1, 1, 1)
        .with_lhs_bits(2, true)
        .with_rhs_bits(2, true);
    assert!(DescriptorAnalyzer::new().analyze(&dscr).is_ok());
}

#[test]
fn test_analyzer_error_messages() {
    let err = DescriptorAnalyzer::new()
        .analyze(&TileJobDescriptor::new(1, 1, 1).with_rhs_bits(1, true))
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Unsupported precision: rhs is 1-bit signed (bipolar encoding is not supported)"
    );

    let err = DescriptorAnalyzer::new()
        .analyze(&TileJobDescriptor::new(1, 1, 0))
        .unwrap_err();
    assert_eq!(err.to_string(), "Invalid descriptor: tiles_n must be nonzero");
}

#[test]
fn test_analyzer_offset_bound_with_base() {
    // 1-bit right operand with one tile: the largest offset is its base
    let dscr = TileJobDescriptor::new(1, 1, 1).with_operand_bases(0, u16::MAX);
    assert_eq!(
        DescriptorAnalyzer::max_operand_offset(&dscr, Operand::Right),
        u64::from(u16::MAX)
    );
    assert!(DescriptorAnalyzer::new().analyze(&dscr).is_ok());
}

// =============================================================================
// Codegen Tests
// =============================================================================

#[test]
fn test_codegen_concrete_scenario() {
    let dscr = TileJobDescriptor {
        tiles_m: 2,
        tiles_k: 1,
        tiles_n: 1,
        bits_l: 2,
        bits_r: 1,
        signed_l: true,
        signed_r: false,
        base_l: 0,
        base_r: 0,
        base_res: 0,
        nbufs_res: 2,
    };

    let program = ExecInstructionGenerator::generate_program(&dscr).unwrap();
    assert_eq!(program.instruction_count(), 10);

    let steps = exec_steps(&program.instructions);
    assert_eq!(steps.len(), 4);

    assert!(!steps[0].negate);
    assert!(steps[0].clear_before_first_accumulation);
    assert!(!steps[0].write_en);

    assert!(steps[1].negate);
    assert!(steps[1].write_en);
    assert!(!steps[1].clear_before_first_accumulation);
}

#[test]
fn test_codegen_sequence_shape() {
    let dscr = TileJobDescriptor::new(1, 2, 2).with_lhs_bits(2, false);
    let program = ExecInstructionGenerator::generate_program(&dscr).unwrap();

    let shape: Vec<&str> = program
        .iter()
        .map(|i| match i {
            Instruction::Sync { is_send_token: false, channel: Channel::OperandBuffers, .. } => "acq_op",
            Instruction::Sync { is_send_token: true, channel: Channel::OperandBuffers, .. } => "rel_op",
            Instruction::Sync { is_send_token: false, channel: Channel::ResultBuffer, .. } => "acq_res",
            Instruction::Sync { is_send_token: true, channel: Channel::ResultBuffer, .. } => "rel_res",
            Instruction::Exec(_) => "exec",
        })
        .collect();

    assert_eq!(
        shape,
        vec![
            "acq_op", "acq_res", "exec", "exec", "rel_res", "acq_res", "exec", "exec", "rel_res",
            "rel_op"
        ]
    );
}

#[test]
fn test_codegen_all_execute_stage() {
    let dscr = TileJobDescriptor::new(2, 2, 2).with_lhs_bits(3, true);
    let program = ExecInstructionGenerator::generate_program(&dscr).unwrap();

    assert!(program.iter().all(|i| i.target_stage() == TargetStage::Execute));
    assert!(program.sync_instructions().all(|i| !i.is_run_cfg()));
    assert!(program.iter().filter(|i| i.is_exec()).all(|i| i.is_run_cfg()));
}

#[test]
fn test_codegen_rotation_spans_tiles() {
    let dscr = TileJobDescriptor::new(1, 1, 3).with_result_buffers(8, 2);
    let program = ExecInstructionGenerator::generate_program(&dscr).unwrap();

    let addrs: Vec<u16> = program.exec_instructions().map(|e| e.write_addr).collect();
    assert_eq!(addrs, vec![9, 8, 9]);
}

#[test]
fn test_codegen_unsigned_never_negates() {
    let dscr = TileJobDescriptor::new(2, 2, 2)
        .with_lhs_bits(4, false)
        .with_rhs_bits(3, false);
    let program = ExecInstructionGenerator::generate_program(&dscr).unwrap();

    assert!(program.exec_instructions().all(|e| !e.negate));
}

#[test]
fn test_codegen_signed_rhs_only() {
    let dscr = TileJobDescriptor::new(1, 1, 1)
        .with_lhs_bits(2, false)
        .with_rhs_bits(3, true);
    let program = ExecInstructionGenerator::generate_program(&dscr).unwrap();

    let negates: Vec<bool> = program.exec_instructions().map(|e| e.negate).collect();
    assert_eq!(negates, vec![false, false, true, false, false, true]);
}

// =============================================================================
// Sink Tests
// =============================================================================

#[test]
fn test_sink_channel_preserves_order() {
    let dscr = TileJobDescriptor::new(2, 1, 2).with_lhs_bits(2, true);
    let (tx, rx) = mpsc::channel();

    let written = ExecInstructionGenerator::generate(&dscr, tx).unwrap();
    let received: Vec<Instruction> = rx.iter().collect();

    assert_eq!(written, received.len());
    assert_eq!(
        received,
        ExecInstructionGenerator::generate_program(&dscr).unwrap().instructions
    );
}

#[test]
fn test_sink_closed_aborts() {
    let dscr = TileJobDescriptor::new(1, 1, 1);
    let (tx, rx) = mpsc::channel::<Instruction>();
    drop(rx);

    let result = ExecInstructionGenerator::generate(&dscr, tx);
    assert!(matches!(result, Err(CompileError::SinkClosed)));
}

#[test]
fn test_sink_rejection_sends_nothing() {
    let dscr = TileJobDescriptor::new(1, 1, 1).with_lhs_bits(1, true);
    let (tx, rx) = mpsc::channel();

    assert!(ExecInstructionGenerator::generate(&dscr, tx).is_err());
    assert!(rx.try_recv().is_err());
}

// =============================================================================
// Validator Tests
// =============================================================================

#[test]
fn test_validator_rejects_missing_release() {
    let dscr = TileJobDescriptor::new(1, 1, 1);
    let mut stream = ExecInstructionGenerator::generate_program(&dscr)
        .unwrap()
        .instructions;
    // keep the count right but drop the result release
    stream[3] = Instruction::acquire(TargetStage::Execute, Channel::ResultBuffer);

    let result = StreamValidator::new(&dscr).validate(&stream);
    assert!(matches!(
        result,
        Err(CompileError::ProtocolViolation { index: 3, .. })
    ));
}

#[test]
fn test_validator_rejects_exec_outside_bracket() {
    let dscr = TileJobDescriptor::new(1, 1, 1);
    let mut stream = ExecInstructionGenerator::generate_program(&dscr)
        .unwrap()
        .instructions;
    // move the compute step ahead of the result acquire
    stream.swap(1, 2);

    let result = StreamValidator::new(&dscr).validate(&stream);
    assert!(matches!(
        result,
        Err(CompileError::ProtocolViolation { index: 1, .. })
    ));
}

// =============================================================================
// Compiler Tests
// =============================================================================

#[test]
fn test_compiler_default_verifies() {
    let compiler = Compiler::default();
    assert!(compiler.options().verify_protocol);

    let program = compiler
        .compile(&TileJobDescriptor::new(3, 2, 1).with_rhs_bits(2, true))
        .unwrap();
    assert_eq!(program.instruction_count() as u64, program.metadata.descriptor.expected_instruction_count());
}

#[test]
fn test_compiler_program_serde() -> anyhow::Result<()> {
    let program = Compiler::new().compile(&TileJobDescriptor::new(1, 1, 1).with_lhs_bits(2, true))?;

    let json = program.to_json()?;
    let back: bitmm_core::Program = serde_json::from_str(&json)?;
    assert_eq!(back, program);
    Ok(())
}

#[test]
fn test_compiler_metadata_options() -> anyhow::Result<()> {
    let compiler = Compiler::with_options(CompilerOptions {
        program_name: Some("fc2".to_string()),
        custom_metadata: vec![
            ("layer".to_string(), "2".to_string()),
            ("model".to_string(), "lenet".to_string()),
        ],
        ..CompilerOptions::default()
    });
    let dscr = TileJobDescriptor::new(2, 1, 2).with_rhs_bits(2, false);

    let program = compiler.compile(&dscr)?;

    assert_eq!(program.metadata.descriptor, dscr);
    assert_eq!(program.metadata.name.as_deref(), Some("fc2"));
    assert_eq!(program.metadata.custom.len(), 2);
    assert_eq!(program.metadata.custom["model"], "lenet");
    assert_eq!(
        program.instructions,
        ExecInstructionGenerator::generate_program(&dscr)?.instructions
    );
    Ok(())
}

#[test]
fn test_compiler_concurrent_invocations() {
    let handles: Vec<_> = (1u16..=4)
        .map(|m| {
            std::thread::spawn(move || {
                let dscr = TileJobDescriptor::new(m, 2, 2).with_lhs_bits(2, true);
                Compiler::new().compile(&dscr).map(|p| p.instruction_count())
            })
        })
        .collect();

    for (m, handle) in (1u64..=4).zip(handles) {
        let count = handle.join().unwrap().unwrap() as u64;
        assert_eq!(count, 2 + m * 2 * (2 + 2));
    }
}
