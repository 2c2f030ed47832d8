//! Small field types decoded from single bits or two-bit codes of an
//! instruction word, shared by the ARM-mode and T-mode classifiers.

use serde::{Deserialize, Serialize};

use crate::bitwise::Bits;

/// Whether a memory operation is a load (read) or store (write).
///
/// Determined by the L bit (bit 20 in ARM mode, bit 11 in most Thumb
/// load/store formats).
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum LoadStore {
    /// Write a register value to memory.
    Store,
    /// Read a value from memory into a register.
    Load,
}

impl From<bool> for LoadStore {
    fn from(b: bool) -> Self {
        if b { Self::Load } else { Self::Store }
    }
}

/// When the offset is applied in indexed addressing modes (P bit).
///
/// Post-indexed addressing always writes the computed address back, so its
/// W bit is free to mean something else (it must be zero for the extra
/// load/stores, and selects the translation forms for word/byte transfers).
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum Indexing {
    /// Use the base for the transfer, then apply the offset.
    Post,
    /// Apply the offset before the transfer.
    Pre,
}

impl From<bool> for Indexing {
    fn from(state: bool) -> Self {
        if state { Self::Pre } else { Self::Post }
    }
}

/// Direction of the offset in indexed addressing modes (U bit).
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum Offsetting {
    /// Subtract the offset from the base address.
    Down,
    /// Add the offset to the base address.
    Up,
}

impl From<bool> for Offsetting {
    fn from(state: bool) -> Self {
        if state { Self::Up } else { Self::Down }
    }
}

impl Offsetting {
    /// Sign prefix in front of an immediate offset; always explicit.
    pub const fn immediate_sign(self) -> &'static str {
        match self {
            Self::Up => "+",
            Self::Down => "-",
        }
    }

    /// Sign prefix in front of a register offset; `+` is implicit.
    pub const fn register_sign(self) -> &'static str {
        match self {
            Self::Up => "",
            Self::Down => "-",
        }
    }
}

/// The shift applied by the barrel shifter (bits 6-5 in ARM mode).
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum ShiftKind {
    /// Logical shift left, zeros fill from the right.
    Lsl,
    /// Logical shift right, zeros fill from the left.
    Lsr,
    /// Arithmetic shift right, the sign bit fills from the left.
    Asr,
    /// Rotate right.
    Ror,
}

impl From<u32> for ShiftKind {
    fn from(op: u32) -> Self {
        match op {
            0 => Self::Lsl,
            1 => Self::Lsr,
            2 => Self::Asr,
            3 => Self::Ror,
            _ => unreachable!(),
        }
    }
}

impl From<u16> for ShiftKind {
    fn from(op: u16) -> Self {
        Self::from(u32::from(op))
    }
}

impl std::fmt::Display for ShiftKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Lsl => f.write_str("lsl"),
            Self::Lsr => f.write_str("lsr"),
            Self::Asr => f.write_str("asr"),
            Self::Ror => f.write_str("ror"),
        }
    }
}

/// Which program status register MRS and MSR access (bit 22).
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum PsrKind {
    /// Current program status register.
    Cpsr,
    /// Saved program status register, banked per exception mode.
    Spsr,
}

impl From<bool> for PsrKind {
    fn from(value: bool) -> Self {
        if value { Self::Spsr } else { Self::Cpsr }
    }
}

impl std::fmt::Display for PsrKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cpsr => f.write_str("cpsr"),
            Self::Spsr => f.write_str("spsr"),
        }
    }
}

/// Load/store-multiple addressing mode, from the P and U bits.
///
/// Appended to the `ldm`/`stm` mnemonic.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum BlockMode {
    /// Decrement after.
    Da,
    /// Increment after.
    Ia,
    /// Decrement before.
    Db,
    /// Increment before.
    Ib,
}

impl BlockMode {
    /// Decode from the P:U two-bit code at bits 24-23.
    pub fn decode(word: u32) -> Self {
        match word.get_bits(23..=24) {
            0b00 => Self::Da,
            0b01 => Self::Ia,
            0b10 => Self::Db,
            0b11 => Self::Ib,
            _ => unreachable!(),
        }
    }
}

impl std::fmt::Display for BlockMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Da => f.write_str("da"),
            Self::Ia => f.write_str("ia"),
            Self::Db => f.write_str("db"),
            Self::Ib => f.write_str("ib"),
        }
    }
}

/// The MSR field mask (bits 19-16), rendered as the `_<fields>` suffix of
/// the status register operand: bit 3 is `f`, bit 2 `s`, bit 1 `x`,
/// bit 0 `c`.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct PsrFields(pub u32);

const FIELD_SUFFIXES: [&str; 16] = [
    "", "c", "x", "xc", "s", "sc", "sx", "sxc", "f", "fc", "fx", "fxc", "fs", "fsc", "fsx", "fsxc",
];

impl std::fmt::Display for PsrFields {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(FIELD_SUFFIXES[(self.0 & 0xF) as usize])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn block_mode_from_pu_bits() {
        // P=1 U=0 (stmdb-style encodings)
        assert_eq!(BlockMode::decode(0xE92D_4010), BlockMode::Db);
        // P=0 U=1
        assert_eq!(BlockMode::decode(0xE8BD_4010), BlockMode::Ia);
    }

    #[test]
    fn psr_field_suffixes() {
        assert_eq!(PsrFields(0b0000).to_string(), "");
        assert_eq!(PsrFields(0b1001).to_string(), "fc");
        assert_eq!(PsrFields(0b1111).to_string(), "fsxc");
        assert_eq!(PsrFields(0b0110).to_string(), "sx");
    }

    #[test]
    fn shift_kind_names() {
        assert_eq!(ShiftKind::from(0_u32).to_string(), "lsl");
        assert_eq!(ShiftKind::from(3_u32).to_string(), "ror");
    }
}
