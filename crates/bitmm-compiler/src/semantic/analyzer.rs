//! Descriptor analyzer
//!
//! Rejects descriptors the generator cannot turn into a valid stream. All
//! checks run before the first instruction is emitted, so a rejected
//! descriptor never produces partial output.

use crate::error::{CompileError, Result};
use bitmm_core::{Operand, TileJobDescriptor};

/// Descriptor analyzer
#[derive(Debug, Clone, Copy, Default)]
pub struct DescriptorAnalyzer;

impl DescriptorAnalyzer {
    /// Create a new descriptor analyzer
    pub fn new() -> Self {
        Self
    }

    /// Analyze a descriptor, returning the first violated precondition
    pub fn analyze(&self, dscr: &TileJobDescriptor) -> Result<()> {
        self.check_nonzero(dscr)?;

        for operand in [Operand::Left, Operand::Right] {
            // a single signed bit would mean bipolar {-1, +1}, which the
            // execute stage cannot represent
            if dscr.bits(operand) == 1 && dscr.is_signed(operand) {
                return Err(CompileError::SignedSingleBit { operand });
            }
        }

        for operand in [Operand::Left, Operand::Right] {
            let max = Self::max_operand_offset(dscr, operand);
            if max > u64::from(u32::MAX) {
                return Err(CompileError::OffsetOverflow { operand, max });
            }
        }

        Ok(())
    }

    /// Largest buffer offset the generator will address for an operand
    ///
    /// Bit-plane `bits - 1`, tile `tiles - 1`, relative to the operand base.
    pub fn max_operand_offset(dscr: &TileJobDescriptor, operand: Operand) -> u64 {
        let tiles = u64::from(dscr.tiles(operand));
        let bits = u64::from(dscr.bits(operand));
        let last_tile = tiles.saturating_sub(1) + bits.saturating_sub(1) * tiles;

        u64::from(dscr.base(operand)) + u64::from(dscr.tiles_k) * last_tile
    }

    fn check_nonzero(&self, dscr: &TileJobDescriptor) -> Result<()> {
        let fields: [(&'static str, u64); 6] = [
            ("tiles_m", u64::from(dscr.tiles_m)),
            ("tiles_k", u64::from(dscr.tiles_k)),
            ("tiles_n", u64::from(dscr.tiles_n)),
            ("bits_l", u64::from(dscr.bits_l)),
            ("bits_r", u64::from(dscr.bits_r)),
            ("nbufs_res", u64::from(dscr.nbufs_res)),
        ];

        match fields.iter().find(|(_, value)| *value == 0) {
            Some((field, _)) => Err(CompileError::ZeroDimension { field: *field }),
            None => Ok(()),
        }
    }
}
