//! Instruction stream validation
//!
//! Replays an instruction stream against the buffering protocol it must
//! follow for a given descriptor: balanced, well-nested token brackets,
//! compute steps only inside both brackets, one clear and one write per
//! result tile, and the exact operand offsets, shifts, negations and
//! round-robin result addresses the descriptor implies.

use crate::error::{CompileError, Result};
use crate::semantic::DescriptorAnalyzer;
use bitmm_core::ir::{Channel, ExecInstruction, Instruction, Program, TargetStage};
use bitmm_core::TileJobDescriptor;

/// Summary of a stream that passed validation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationReport {
    /// Result tiles bracketed by the stream
    pub result_tiles: u64,
    /// Compute steps
    pub exec_count: u64,
    /// Token instructions
    pub sync_count: u64,
}

/// Where the replay currently is in the protocol
#[derive(Debug, Default)]
struct ReplayState {
    operand_held: bool,
    operand_released: bool,
    result_held: bool,
    /// Result tiles completed so far
    tile: u64,
    /// Compute steps seen in the current result tile
    step: u64,
    /// Last result buffer written
    offset_res: u64,
    exec_count: u64,
    sync_count: u64,
}

/// Checks generated streams against the buffering protocol
pub struct StreamValidator<'a> {
    dscr: &'a TileJobDescriptor,
}

impl<'a> StreamValidator<'a> {
    /// Create a validator for streams generated from `dscr`
    pub fn new(dscr: &'a TileJobDescriptor) -> Self {
        Self { dscr }
    }

    /// Validate a program against the descriptor recorded in its metadata
    pub fn validate_program(program: &Program) -> Result<ValidationReport> {
        StreamValidator::new(&program.metadata.descriptor).validate(&program.instructions)
    }

    /// Validate an instruction stream
    pub fn validate(&self, instructions: &[Instruction]) -> Result<ValidationReport> {
        DescriptorAnalyzer::new().analyze(self.dscr)?;

        let expected = self.dscr.expected_instruction_count();
        if instructions.len() as u64 != expected {
            return Err(violation(
                instructions.len(),
                format!(
                    "stream has {} instructions, descriptor implies {}",
                    instructions.len(),
                    expected
                ),
            ));
        }

        let mut state = ReplayState::default();
        for (index, instruction) in instructions.iter().enumerate() {
            if instruction.target_stage() != TargetStage::Execute {
                return Err(violation(
                    index,
                    format!("targets {} stage instead of exec", instruction.target_stage()),
                ));
            }

            match instruction {
                Instruction::Sync {
                    is_send_token,
                    channel,
                    ..
                } => {
                    state.sync_count += 1;
                    self.check_sync(index, *channel, *is_send_token, &mut state)?;
                }
                Instruction::Exec(exec) => {
                    state.exec_count += 1;
                    self.check_exec(index, exec, &mut state)?;
                }
            }
        }

        if !state.operand_released {
            return Err(violation(instructions.len(), "operand buffers never released"));
        }
        if state.tile != self.dscr.result_tiles() {
            return Err(violation(
                instructions.len(),
                format!(
                    "{} result tiles bracketed, descriptor implies {}",
                    state.tile,
                    self.dscr.result_tiles()
                ),
            ));
        }

        Ok(ValidationReport {
            result_tiles: state.tile,
            exec_count: state.exec_count,
            sync_count: state.sync_count,
        })
    }

    fn check_sync(
        &self,
        index: usize,
        channel: Channel,
        release: bool,
        state: &mut ReplayState,
    ) -> Result<()> {
        match (channel, release) {
            (Channel::OperandBuffers, false) => {
                if state.operand_held || state.operand_released {
                    return Err(violation(index, "operand buffers acquired twice"));
                }
                state.operand_held = true;
            }
            (Channel::OperandBuffers, true) => {
                if !state.operand_held {
                    return Err(violation(index, "operand buffers released before acquire"));
                }
                if state.result_held {
                    return Err(violation(
                        index,
                        "operand buffers released inside a result bracket",
                    ));
                }
                state.operand_held = false;
                state.operand_released = true;
            }
            (Channel::ResultBuffer, false) => {
                if !state.operand_held {
                    return Err(violation(
                        index,
                        "result buffer acquired outside the operand bracket",
                    ));
                }
                if state.result_held {
                    return Err(violation(index, "result buffer acquired twice"));
                }
                state.result_held = true;
                state.step = 0;
            }
            (Channel::ResultBuffer, true) => {
                if !state.result_held {
                    return Err(violation(index, "result buffer released before acquire"));
                }
                if state.step != self.dscr.bit_pairs() {
                    return Err(violation(
                        index,
                        format!(
                            "result tile released after {} of {} steps",
                            state.step,
                            self.dscr.bit_pairs()
                        ),
                    ));
                }
                state.result_held = false;
                state.tile += 1;
            }
        }
        Ok(())
    }

    fn check_exec(
        &self,
        index: usize,
        exec: &ExecInstruction,
        state: &mut ReplayState,
    ) -> Result<()> {
        if !state.operand_held || !state.result_held {
            return Err(violation(index, "compute step outside its buffer brackets"));
        }

        let dscr = self.dscr;
        let bit_pairs = dscr.bit_pairs();
        if state.step >= bit_pairs {
            return Err(violation(index, "more compute steps than bit pairs in result tile"));
        }

        let bits_l = u64::from(dscr.bits_l);
        let bits_r = u64::from(dscr.bits_r);
        let tiles_n = u64::from(dscr.tiles_n);
        let (l, r) = (state.step / bits_r, state.step % bits_r);
        let (m, n) = (state.tile / tiles_n, state.tile % tiles_n);

        let neg_l = l == bits_l - 1 && dscr.signed_l;
        let neg_r = r == bits_r - 1 && dscr.signed_r;
        if exec.negate != (neg_l ^ neg_r) {
            return Err(violation(index, format!("wrong negate flag for bit pair ({}, {})", l, r)));
        }
        if u64::from(exec.shift_amount) != l + r {
            return Err(violation(
                index,
                format!("shift {} for bit pair ({}, {})", exec.shift_amount, l, r),
            ));
        }
        if exec.clear_before_first_accumulation != (state.step == 0) {
            return Err(violation(index, "clear flag not on the first step of the tile"));
        }
        if exec.write_en != (state.step == bit_pairs - 1) {
            return Err(violation(index, "write flag not on the last step of the tile"));
        }
        if exec.num_tiles != dscr.tiles_k {
            return Err(violation(index, format!("num_tiles {} != tiles_k", exec.num_tiles)));
        }

        let tiles_k = u64::from(dscr.tiles_k);
        let lhs = u64::from(dscr.base_l) + tiles_k * (m + l * u64::from(dscr.tiles_m));
        let rhs = u64::from(dscr.base_r) + tiles_k * (n + r * tiles_n);
        if u64::from(exec.lhs_offset) != lhs || u64::from(exec.rhs_offset) != rhs {
            return Err(violation(
                index,
                format!(
                    "operand offsets ({}, {}) expected ({}, {})",
                    exec.lhs_offset, exec.rhs_offset, lhs, rhs
                ),
            ));
        }

        state.offset_res = (state.offset_res + 1) % u64::from(dscr.nbufs_res);
        let write_addr = u64::from(dscr.base_res) + state.offset_res;
        if u64::from(exec.write_addr) != write_addr {
            return Err(violation(
                index,
                format!("write address {} breaks rotation, expected {}", exec.write_addr, write_addr),
            ));
        }

        state.step += 1;
        Ok(())
    }
}

fn violation(index: usize, message: impl Into<String>) -> CompileError {
    CompileError::ProtocolViolation {
        index,
        message: message.into(),
    }
}
