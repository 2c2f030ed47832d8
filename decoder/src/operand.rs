//! # Operand and Addressing-Mode Rendering
//!
//! The flexible second operand of the data-processing instructions and the
//! bracketed address forms of the memory instructions. Decoding extracts the
//! fields once into these types; `Display` produces the exact assembler
//! syntax.
//!
//! Shifter-operand special cases (immediate shift form):
//!
//! - `lsl #0` leaves the value untouched and is omitted entirely;
//! - `lsr #0` and `asr #0` encode a shift of 32 and render as `#32`;
//! - `ror #0` encodes rotate-right-extended and renders as `rrx`;
//! - register shifts render literally (`lsl r4`), with no zero special case.

use serde::{Deserialize, Serialize};

use crate::bitwise::Bits;
use crate::flags::{Indexing, Offsetting, ShiftKind};
use crate::register::Register;

/// How the barrel shifter input is shifted: by a 5-bit immediate or by the
/// bottom byte of a register.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum ShiftBy {
    /// Shift by an immediate amount (1-32 after decoding the 0-as-32 forms).
    Immediate { kind: ShiftKind, amount: u32 },
    /// Shift by a register.
    Register { kind: ShiftKind, rs: Register },
}

impl ShiftBy {
    /// Decode the immediate-shift fields at bits 11-7 (amount) and 6-5
    /// (kind), applying the convention that LSR/ASR encode a shift of 32
    /// as 0.
    #[must_use]
    pub fn decode_immediate(word: u32) -> Self {
        let kind = ShiftKind::from(word.get_bits(5..=6));
        let mut amount = word.get_bits(7..=11);
        if matches!(kind, ShiftKind::Lsr | ShiftKind::Asr) && amount == 0 {
            amount = 32;
        }
        Self::Immediate { kind, amount }
    }

    /// Decode the register-shift fields at bits 11-8 (Rs) and 6-5 (kind).
    #[must_use]
    pub fn decode_register(word: u32) -> Self {
        Self::Register {
            kind: ShiftKind::from(word.get_bits(5..=6)),
            rs: Register(word.get_bits(8..=11)),
        }
    }

    /// `lsl #0`: the no-op shift, omitted from renderings.
    #[must_use]
    pub const fn is_identity(&self) -> bool {
        matches!(
            self,
            Self::Immediate {
                kind: ShiftKind::Lsl,
                amount: 0
            }
        )
    }
}

impl std::fmt::Display for ShiftBy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Immediate {
                kind: ShiftKind::Ror,
                amount: 0,
            } => f.write_str("rrx"),
            Self::Immediate { kind, amount } => write!(f, "{kind} #{amount}"),
            Self::Register { kind, rs } => write!(f, "{kind} {rs}"),
        }
    }
}

/// The shifter operand of a data-processing instruction.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum ShifterOperand {
    /// 8-bit immediate rotated right by twice the 4-bit rotation field.
    Immediate { base: u32, rotate: u32 },
    /// A register with a shift applied.
    Register { rm: Register, shift: ShiftBy },
}

impl ShifterOperand {
    /// Decode the immediate form at bits 7-0 (value) and 11-8 (rotation).
    #[must_use]
    pub fn decode_immediate(word: u32) -> Self {
        Self::Immediate {
            base: word.get_bits(0..=7),
            rotate: 2 * word.get_bits(8..=11),
        }
    }

    /// Decode the immediate-shift register form.
    #[must_use]
    pub fn decode_immediate_shift(word: u32) -> Self {
        Self::Register {
            rm: Register(word.get_bits(0..=3)),
            shift: ShiftBy::decode_immediate(word),
        }
    }

    /// Decode the register-shift register form.
    #[must_use]
    pub fn decode_register_shift(word: u32) -> Self {
        Self::Register {
            rm: Register(word.get_bits(0..=3)),
            shift: ShiftBy::decode_register(word),
        }
    }
}

impl std::fmt::Display for ShifterOperand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Immediate { base, rotate } => {
                write!(f, "#0x{:X}", base.rotate_right(*rotate))
            }
            Self::Register { rm, shift } => {
                if shift.is_identity() {
                    write!(f, "{rm}")
                } else {
                    write!(f, "{rm}, {shift}")
                }
            }
        }
    }
}

/// Offset of the extra load/stores (LDRH/STRH/LDRSB/LDRSH/LDRD/STRD): an
/// 8-bit immediate split across bits 11-8 and 3-0, or a plain register.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum ExtraOffset {
    Immediate(u32),
    Register(Register),
}

/// Address operand of the extra load/stores.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ExtraAddress {
    pub base: Register,
    pub offset: ExtraOffset,
    pub offsetting: Offsetting,
    pub indexing: Indexing,
    pub writeback: bool,
}

impl ExtraAddress {
    /// Decode the addressing half of an extra load/store. `None` when a
    /// should-be-zero field is violated: the register form requires bits
    /// 11-8 clear, and post-indexing requires W clear.
    #[must_use]
    pub fn decode(word: u32) -> Option<Self> {
        let indexing = Indexing::from(word.get_bit(24));
        let writeback = word.get_bit(21);
        if indexing == Indexing::Post && writeback {
            return None;
        }
        let offset = if word.get_bit(22) {
            ExtraOffset::Immediate((word.get_bits(8..=11) << 4) | word.get_bits(0..=3))
        } else {
            if word.get_bits(8..=11) != 0 {
                return None;
            }
            ExtraOffset::Register(Register(word.get_bits(0..=3)))
        };
        Some(Self {
            base: Register(word.get_bits(16..=19)),
            offset,
            offsetting: word.get_bit(23).into(),
            indexing,
            writeback,
        })
    }
}

impl std::fmt::Display for ExtraAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let base = self.base;
        match (self.indexing, self.offset) {
            (Indexing::Pre, ExtraOffset::Immediate(offset)) => {
                let sign = self.offsetting.immediate_sign();
                let writeback = if self.writeback { "!" } else { "" };
                write!(f, "[{base}, #{sign}0x{offset:X}]{writeback}")
            }
            (Indexing::Pre, ExtraOffset::Register(rm)) => {
                let sign = self.offsetting.register_sign();
                let writeback = if self.writeback { "!" } else { "" };
                write!(f, "[{base}, {sign}{rm}]{writeback}")
            }
            (Indexing::Post, ExtraOffset::Immediate(offset)) => {
                let sign = self.offsetting.immediate_sign();
                write!(f, "[{base}], #{sign}0x{offset:X}")
            }
            (Indexing::Post, ExtraOffset::Register(rm)) => {
                let sign = self.offsetting.register_sign();
                write!(f, "[{base}], {sign}{rm}")
            }
        }
    }
}

/// Offset of a word/byte load/store: a 12-bit immediate or a register with
/// an immediate shift.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum TransferOffset {
    Immediate(u32),
    Register { rm: Register, shift: ShiftBy },
}

/// Address operand of a word/byte load/store (and of PLD, which only uses
/// the offset form).
///
/// In the post-indexed form the W bit does not mean writeback (writeback is
/// implied); it selects the translation mnemonics instead, which the
/// instruction rendering handles.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct TransferAddress {
    pub base: Register,
    pub offset: TransferOffset,
    pub offsetting: Offsetting,
    pub indexing: Indexing,
    pub writeback: bool,
}

impl TransferAddress {
    /// Decode with the 12-bit immediate offset form.
    #[must_use]
    pub fn decode_immediate(word: u32) -> Self {
        Self {
            base: Register(word.get_bits(16..=19)),
            offset: TransferOffset::Immediate(word.get_bits(0..=11)),
            offsetting: word.get_bit(23).into(),
            indexing: word.get_bit(24).into(),
            writeback: word.get_bit(21),
        }
    }

    /// Decode with the scaled register offset form.
    #[must_use]
    pub fn decode_register(word: u32) -> Self {
        Self {
            base: Register(word.get_bits(16..=19)),
            offset: TransferOffset::Register {
                rm: Register(word.get_bits(0..=3)),
                shift: ShiftBy::decode_immediate(word),
            },
            offsetting: word.get_bit(23).into(),
            indexing: word.get_bit(24).into(),
            writeback: word.get_bit(21),
        }
    }

    /// Whether this is the post-indexed translation form (LDRT/STRT family).
    #[must_use]
    pub fn is_translation(&self) -> bool {
        self.indexing == Indexing::Post && self.writeback
    }
}

impl std::fmt::Display for TransferAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let base = self.base;
        match (self.indexing, self.offset) {
            (Indexing::Pre, TransferOffset::Immediate(offset)) => {
                let sign = self.offsetting.immediate_sign();
                let writeback = if self.writeback { "!" } else { "" };
                write!(f, "[{base}, #{sign}0x{offset:X}]{writeback}")
            }
            (Indexing::Pre, TransferOffset::Register { rm, shift }) => {
                let sign = self.offsetting.register_sign();
                let writeback = if self.writeback { "!" } else { "" };
                if shift.is_identity() {
                    write!(f, "[{base}, {sign}{rm}]{writeback}")
                } else {
                    write!(f, "[{base}, {sign}{rm}, {shift}]{writeback}")
                }
            }
            (Indexing::Post, TransferOffset::Immediate(offset)) => {
                let sign = self.offsetting.immediate_sign();
                write!(f, "[{base}], #{sign}0x{offset:X}")
            }
            (Indexing::Post, TransferOffset::Register { rm, shift }) => {
                let sign = self.offsetting.register_sign();
                if shift.is_identity() {
                    write!(f, "[{base}], {sign}{rm}")
                } else {
                    write!(f, "[{base}], {sign}{rm}, {shift}")
                }
            }
        }
    }
}

/// Address operand of a coprocessor load/store. The 8-bit immediate is
/// scaled by 4 except in the unindexed form, where it passes through as the
/// coprocessor option field.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct CoprocessorAddress {
    pub base: Register,
    pub offset: u32,
    pub offsetting: Offsetting,
    pub indexing: Indexing,
    pub writeback: bool,
}

impl CoprocessorAddress {
    #[must_use]
    pub fn decode(word: u32) -> Self {
        Self {
            base: Register(word.get_bits(16..=19)),
            offset: word.get_bits(0..=7),
            offsetting: word.get_bit(23).into(),
            indexing: word.get_bit(24).into(),
            writeback: word.get_bit(21),
        }
    }
}

impl std::fmt::Display for CoprocessorAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let base = self.base;
        let sign = self.offsetting.immediate_sign();
        let scaled = 4 * self.offset;
        match (self.indexing, self.writeback) {
            (Indexing::Post, false) => write!(f, "[{base}], {{0x{:X}}}", self.offset),
            (Indexing::Post, true) => write!(f, "[{base}], #{sign}0x{scaled:X}"),
            (Indexing::Pre, false) => write!(f, "[{base}, #{sign}0x{scaled:X}]"),
            (Indexing::Pre, true) => write!(f, "[{base}, #{sign}0x{scaled:X}]!"),
        }
    }
}
