//! Tile-job descriptor
//!
//! Describes a single bit-serial matrix-multiply tile job. Tile counts are
//! expressed in units of the accelerator's native tile size.

use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One side of the matrix product
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operand {
    /// Left-hand operand (M x K)
    Left,
    /// Right-hand operand (N x K)
    Right,
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Left => write!(f, "lhs"),
            Operand::Right => write!(f, "rhs"),
        }
    }
}

/// Parameters of a single bit-serial matrix multiply
///
/// Operand tiles are laid out as `bits x tiles x tiles_k` contiguous blocks,
/// one bit-plane after another, starting at `base_l` / `base_r`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileJobDescriptor {
    /// Tiles along the rows of the left operand
    pub tiles_m: u16,
    /// Tiles along the shared (reduction) dimension
    pub tiles_k: u16,
    /// Tiles along the rows of the right operand
    pub tiles_n: u16,

    /// Bit-width of the left operand
    pub bits_l: u8,
    /// Bit-width of the right operand
    pub bits_r: u8,

    /// Whether the left operand MSB is a sign bit
    #[serde(default)]
    pub signed_l: bool,
    /// Whether the right operand MSB is a sign bit
    #[serde(default)]
    pub signed_r: bool,

    /// Base address of the left operand tiles
    #[serde(default)]
    pub base_l: u16,
    /// Base address of the right operand tiles
    #[serde(default)]
    pub base_r: u16,
    /// Base address of the result buffers
    #[serde(default)]
    pub base_res: u8,

    /// Number of result buffers for latency hiding
    #[serde(default = "default_nbufs_res")]
    pub nbufs_res: u8,
}

fn default_nbufs_res() -> u8 {
    1
}

impl TileJobDescriptor {
    /// Create a descriptor for 1-bit unsigned operands with all bases at zero
    pub fn new(tiles_m: u16, tiles_k: u16, tiles_n: u16) -> Self {
        Self {
            tiles_m,
            tiles_k,
            tiles_n,
            bits_l: 1,
            bits_r: 1,
            signed_l: false,
            signed_r: false,
            base_l: 0,
            base_r: 0,
            base_res: 0,
            nbufs_res: default_nbufs_res(),
        }
    }

    /// Set the left operand precision
    pub fn with_lhs_bits(mut self, bits: u8, signed: bool) -> Self {
        self.bits_l = bits;
        self.signed_l = signed;
        self
    }

    /// Set the right operand precision
    pub fn with_rhs_bits(mut self, bits: u8, signed: bool) -> Self {
        self.bits_r = bits;
        self.signed_r = signed;
        self
    }

    /// Set the operand base addresses
    pub fn with_operand_bases(mut self, base_l: u16, base_r: u16) -> Self {
        self.base_l = base_l;
        self.base_r = base_r;
        self
    }

    /// Set the result base address and buffer count
    pub fn with_result_buffers(mut self, base_res: u8, nbufs_res: u8) -> Self {
        self.base_res = base_res;
        self.nbufs_res = nbufs_res;
        self
    }

    /// Bit-width of an operand
    pub fn bits(&self, operand: Operand) -> u8 {
        match operand {
            Operand::Left => self.bits_l,
            Operand::Right => self.bits_r,
        }
    }

    /// Signedness of an operand
    pub fn is_signed(&self, operand: Operand) -> bool {
        match operand {
            Operand::Left => self.signed_l,
            Operand::Right => self.signed_r,
        }
    }

    /// Base address of an operand
    pub fn base(&self, operand: Operand) -> u16 {
        match operand {
            Operand::Left => self.base_l,
            Operand::Right => self.base_r,
        }
    }

    /// Tile count along the non-shared dimension of an operand
    pub fn tiles(&self, operand: Operand) -> u16 {
        match operand {
            Operand::Left => self.tiles_m,
            Operand::Right => self.tiles_n,
        }
    }

    /// Number of result tiles (`tiles_m * tiles_n`)
    pub fn result_tiles(&self) -> u64 {
        u64::from(self.tiles_m) * u64::from(self.tiles_n)
    }

    /// Number of single-bit partial products per result tile
    pub fn bit_pairs(&self) -> u64 {
        u64::from(self.bits_l) * u64::from(self.bits_r)
    }

    /// Number of instructions a generation run emits for this descriptor
    pub fn expected_instruction_count(&self) -> u64 {
        2 + self.result_tiles() * (2 + self.bit_pairs())
    }

    /// Parse a descriptor from JSON
    pub fn from_json(input: &str) -> Result<Self> {
        serde_json::from_str(input).map_err(|e| CoreError::Serialization(e.to_string()))
    }

    /// Parse a descriptor from YAML
    pub fn from_yaml(input: &str) -> Result<Self> {
        serde_yaml::from_str(input).map_err(|e| CoreError::Serialization(e.to_string()))
    }
}

impl fmt::Display for TileJobDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}x{}x{} tiles, lhs {}b{}, rhs {}b{}, nbufs_res={}",
            self.tiles_m,
            self.tiles_k,
            self.tiles_n,
            self.bits_l,
            if self.signed_l { "s" } else { "u" },
            self.bits_r,
            if self.signed_r { "s" } else { "u" },
            self.nbufs_res
        )
    }
}
