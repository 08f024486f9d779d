//! Execute-stage code generation
//!
//! Decomposes a multi-bit signed matrix product into `bits_l * bits_r`
//! single-bit partial products per result tile, each shifted by its bit
//! weight and negated when exactly one operand contributes its sign bit.

use crate::error::Result;
use crate::semantic::DescriptorAnalyzer;
use crate::sink::InstructionSink;
use bitmm_core::ir::{Channel, ExecInstruction, Instruction, Program, ProgramMetadata, TargetStage};
use bitmm_core::TileJobDescriptor;

/// Execute-stage instruction generator
pub struct ExecInstructionGenerator;

impl ExecInstructionGenerator {
    /// Generate the instruction stream for `dscr` into `sink`
    ///
    /// The descriptor is analyzed first; nothing is written if it is rejected.
    /// Returns the number of instructions written.
    pub fn generate<S: InstructionSink>(dscr: &TileJobDescriptor, mut sink: S) -> Result<usize> {
        DescriptorAnalyzer::new().analyze(dscr)?;

        tracing::debug!(
            tiles_m = dscr.tiles_m,
            tiles_k = dscr.tiles_k,
            tiles_n = dscr.tiles_n,
            bits_l = dscr.bits_l,
            bits_r = dscr.bits_r,
            signed_l = dscr.signed_l,
            signed_r = dscr.signed_r,
            nbufs_res = dscr.nbufs_res,
            "Generating execute-stage instructions"
        );

        let stage = TargetStage::Execute;
        let mut written = 0usize;
        let mut emit = |instruction: Instruction| -> Result<()> {
            sink.write(instruction)?;
            written += 1;
            Ok(())
        };

        // operand buffers stay acquired for the whole job
        emit(Instruction::acquire(stage, Channel::OperandBuffers))?;

        let tiles_m = u64::from(dscr.tiles_m);
        let tiles_n = u64::from(dscr.tiles_n);
        let tiles_k = u64::from(dscr.tiles_k);
        let bits_l = u16::from(dscr.bits_l);
        let bits_r = u16::from(dscr.bits_r);
        let nbufs_res = u16::from(dscr.nbufs_res);

        // last result buffer written, shared across all result tiles
        let mut offset_res: u16 = 0;

        for m in 0..tiles_m {
            for n in 0..tiles_n {
                tracing::trace!(m, n, "Result tile");
                emit(Instruction::acquire(stage, Channel::ResultBuffer))?;

                for l in 0..bits_l {
                    for r in 0..bits_r {
                        let tile_first = l == 0 && r == 0;
                        let tile_last = l == bits_l - 1 && r == bits_r - 1;
                        let neg_l = l == bits_l - 1 && dscr.signed_l;
                        let neg_r = r == bits_r - 1 && dscr.signed_r;

                        // bounded by DescriptorAnalyzer::max_operand_offset
                        let offset_l = tiles_k * (m + u64::from(l) * tiles_m);
                        let offset_r = tiles_k * (n + u64::from(r) * tiles_n);
                        let lhs_offset = (u64::from(dscr.base_l) + offset_l) as u32;
                        let rhs_offset = (u64::from(dscr.base_r) + offset_r) as u32;

                        offset_res = (offset_res + 1) % nbufs_res;

                        let exec = ExecInstruction::new(lhs_offset, rhs_offset, dscr.tiles_k)
                            .with_shift(l + r)
                            .with_negate(neg_l ^ neg_r)
                            .with_clear(tile_first)
                            .with_write(tile_last, u16::from(dscr.base_res) + offset_res);
                        emit(exec.into())?;
                    }
                }

                emit(Instruction::release(stage, Channel::ResultBuffer))?;
            }
        }

        emit(Instruction::release(stage, Channel::OperandBuffers))?;

        tracing::debug!(instructions = written, "Generated execute-stage instructions");
        Ok(written)
    }

    /// Generate the instruction stream for `dscr` as a program
    pub fn generate_program(dscr: &TileJobDescriptor) -> Result<Program> {
        Self::generate_program_with(dscr, ProgramMetadata::for_descriptor(*dscr))
    }

    /// Generate the instruction stream for `dscr` into a program carrying `metadata`
    pub fn generate_program_with(
        dscr: &TileJobDescriptor,
        metadata: ProgramMetadata,
    ) -> Result<Program> {
        let mut program = Program::new(Vec::new(), metadata);
        Self::generate(dscr, &mut program)?;

        Ok(program)
    }
}
