//! IR Instructions
//!
//! Control instructions for the accelerator's execution pipeline. An
//! instruction either moves a synchronization token on a channel or
//! configures one bit-serial compute step.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Pipeline stage that consumes an instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetStage {
    /// Moves operand data from memory into the on-chip buffers
    Fetch = 0,
    /// Runs bit-serial partial products on the operand buffers
    Execute = 1,
    /// Drains result buffers back to memory
    Result = 2,
}

impl TargetStage {
    /// Numeric stage identifier seen by the executor
    pub fn id(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for TargetStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetStage::Fetch => write!(f, "fetch"),
            TargetStage::Execute => write!(f, "exec"),
            TargetStage::Result => write!(f, "result"),
        }
    }
}

/// Synchronization channel, one per shared buffer resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    /// Operand (left and right) tile buffers
    OperandBuffers = 0,
    /// Result tile buffer
    ResultBuffer = 1,
}

impl Channel {
    /// Numeric channel identifier seen by the executor
    pub fn id(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Channel::OperandBuffers => write!(f, "operand"),
            Channel::ResultBuffer => write!(f, "result"),
        }
    }
}

/// A single bit-serial compute step
///
/// Accumulates the AND-popcount of one left bit-plane against one right
/// bit-plane, shifted left by `shift_amount` and optionally negated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExecInstruction {
    /// Stage that executes this step
    pub target_stage: TargetStage,
    /// Left operand buffer offset
    pub lhs_offset: u32,
    /// Right operand buffer offset
    pub rhs_offset: u32,
    /// Number of tiles along the shared dimension
    pub num_tiles: u16,
    /// Left shift applied to the partial product before accumulation
    pub shift_amount: u16,
    /// Subtract instead of add
    pub negate: bool,
    /// Reset the accumulator before this step
    pub clear_before_first_accumulation: bool,
    /// Commit the accumulator to `write_addr` after this step
    pub write_en: bool,
    /// Result buffer address written when `write_en` is set
    pub write_addr: u16,
}

impl ExecInstruction {
    /// Create an execute-stage step with all flags cleared
    pub fn new(lhs_offset: u32, rhs_offset: u32, num_tiles: u16) -> Self {
        Self {
            target_stage: TargetStage::Execute,
            lhs_offset,
            rhs_offset,
            num_tiles,
            shift_amount: 0,
            negate: false,
            clear_before_first_accumulation: false,
            write_en: false,
            write_addr: 0,
        }
    }

    /// Set the accumulation shift
    pub fn with_shift(mut self, shift_amount: u16) -> Self {
        self.shift_amount = shift_amount;
        self
    }

    /// Set the negate flag
    pub fn with_negate(mut self, negate: bool) -> Self {
        self.negate = negate;
        self
    }

    /// Set the clear-before-accumulate flag
    pub fn with_clear(mut self, clear: bool) -> Self {
        self.clear_before_first_accumulation = clear;
        self
    }

    /// Set the write flag and result address
    pub fn with_write(mut self, write_en: bool, write_addr: u16) -> Self {
        self.write_en = write_en;
        self.write_addr = write_addr;
        self
    }
}

/// A single IR instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Instruction {
    /// Send or wait for a token on a channel
    Sync {
        /// Stage that handles the token
        target_stage: TargetStage,
        /// `true` releases (sends) a token, `false` acquires (waits for) one
        is_send_token: bool,
        /// Resource the token refers to
        channel: Channel,
    },

    /// Run one bit-serial compute step
    Exec(ExecInstruction),
}

impl Instruction {
    /// Acquire a token on `channel`
    pub fn acquire(target_stage: TargetStage, channel: Channel) -> Self {
        Instruction::Sync {
            target_stage,
            is_send_token: false,
            channel,
        }
    }

    /// Release a token on `channel`
    pub fn release(target_stage: TargetStage, channel: Channel) -> Self {
        Instruction::Sync {
            target_stage,
            is_send_token: true,
            channel,
        }
    }

    /// Stage that consumes this instruction
    pub fn target_stage(&self) -> TargetStage {
        match self {
            Instruction::Sync { target_stage, .. } => *target_stage,
            Instruction::Exec(exec) => exec.target_stage,
        }
    }

    /// Whether this is a configuration record rather than a synchronization one
    pub fn is_run_cfg(&self) -> bool {
        matches!(self, Instruction::Exec(_))
    }

    pub fn is_sync(&self) -> bool {
        matches!(self, Instruction::Sync { .. })
    }

    pub fn is_exec(&self) -> bool {
        matches!(self, Instruction::Exec(_))
    }

    pub fn is_acquire(&self) -> bool {
        matches!(
            self,
            Instruction::Sync {
                is_send_token: false,
                ..
            }
        )
    }

    pub fn is_release(&self) -> bool {
        matches!(
            self,
            Instruction::Sync {
                is_send_token: true,
                ..
            }
        )
    }

    /// Channel of a sync instruction
    pub fn channel(&self) -> Option<Channel> {
        match self {
            Instruction::Sync { channel, .. } => Some(*channel),
            Instruction::Exec(_) => None,
        }
    }

    /// Compute step of an exec instruction
    pub fn as_exec(&self) -> Option<&ExecInstruction> {
        match self {
            Instruction::Exec(exec) => Some(exec),
            Instruction::Sync { .. } => None,
        }
    }
}

impl From<ExecInstruction> for Instruction {
    fn from(exec: ExecInstruction) -> Self {
        Instruction::Exec(exec)
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::Sync {
                target_stage,
                is_send_token,
                channel,
            } => write!(
                f,
                "{}.{} chan={}",
                target_stage,
                if *is_send_token { "release" } else { "acquire" },
                channel
            ),
            Instruction::Exec(exec) => write!(
                f,
                "{}.run lhs={} rhs={} tiles={} shift={} neg={} clr={} wr={} waddr={}",
                exec.target_stage,
                exec.lhs_offset,
                exec.rhs_offset,
                exec.num_tiles,
                exec.shift_amount,
                u8::from(exec.negate),
                u8::from(exec.clear_before_first_accumulation),
                u8::from(exec.write_en),
                exec.write_addr
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acquire_release() {
        let acq = Instruction::acquire(TargetStage::Execute, Channel::OperandBuffers);
        let rel = Instruction::release(TargetStage::Execute, Channel::OperandBuffers);

        assert!(acq.is_sync());
        assert!(acq.is_acquire());
        assert!(!acq.is_release());
        assert!(rel.is_release());
        assert!(!acq.is_run_cfg());
        assert_eq!(acq.channel(), Some(Channel::OperandBuffers));
        assert_eq!(rel.target_stage(), TargetStage::Execute);
    }

    #[test]
    fn test_exec_builder() {
        let exec = ExecInstruction::new(4, 8, 2)
            .with_shift(3)
            .with_negate(true)
            .with_clear(true)
            .with_write(true, 5);
        let instr = Instruction::from(exec);

        assert!(instr.is_run_cfg());
        assert!(!instr.is_acquire());
        assert!(instr.channel().is_none());
        assert_eq!(instr.target_stage(), TargetStage::Execute);

        let exec = instr.as_exec().unwrap();
        assert_eq!(exec.lhs_offset, 4);
        assert_eq!(exec.rhs_offset, 8);
        assert_eq!(exec.num_tiles, 2);
        assert_eq!(exec.shift_amount, 3);
        assert!(exec.negate);
        assert!(exec.clear_before_first_accumulation);
        assert!(exec.write_en);
        assert_eq!(exec.write_addr, 5);
    }

    #[test]
    fn test_ids() {
        assert_eq!(Channel::OperandBuffers.id(), 0);
        assert_eq!(Channel::ResultBuffer.id(), 1);
        assert_eq!(TargetStage::Fetch.id(), 0);
        assert_eq!(TargetStage::Execute.id(), 1);
        assert_eq!(TargetStage::Result.id(), 2);
    }

    #[test]
    fn test_display() {
        let acq = Instruction::acquire(TargetStage::Execute, Channel::ResultBuffer);
        assert_eq!(acq.to_string(), "exec.acquire chan=result");

        let exec: Instruction = ExecInstruction::new(0, 2, 1)
            .with_shift(1)
            .with_write(true, 1)
            .into();
        assert_eq!(
            exec.to_string(),
            "exec.run lhs=0 rhs=2 tiles=1 shift=1 neg=0 clr=0 wr=1 waddr=1"
        );
    }

    #[test]
    fn test_serde_tagging() {
        let rel = Instruction::release(TargetStage::Execute, Channel::OperandBuffers);
        let json = serde_json::to_value(rel).unwrap();

        assert_eq!(json["kind"], "sync");
        assert_eq!(json["channel"], "operand_buffers");
        assert_eq!(json["is_send_token"], true);

        let exec: Instruction = ExecInstruction::new(1, 2, 3).into();
        let json = serde_json::to_value(exec).unwrap();
        assert_eq!(json["kind"], "exec");
        assert_eq!(json["target_stage"], "execute");
        assert_eq!(json["num_tiles"], 3);
    }
}
