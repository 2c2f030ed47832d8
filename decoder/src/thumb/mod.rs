//! # T-Mode Decoding (16-bit)
//!
//! Compact variable-width encoding: every instruction is one half-word
//! except the BL/BLX prefix/suffix pair, which the decoder consumes as a
//! single 32-bit unit. Bits 15-13 select the top-level group.

pub mod instruction;

use serde::{Deserialize, Serialize};

/// How many half-words a decoded T-mode instruction consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ThumbSize {
    /// One half-word.
    Size16,
    /// Two half-words (the BL/BLX pair).
    Size32,
}

impl ThumbSize {
    #[must_use]
    pub const fn halfwords(self) -> u32 {
        match self {
            Self::Size16 => 1,
            Self::Size32 => 2,
        }
    }
}
