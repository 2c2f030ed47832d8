//! # Thumb Instruction Decoding
//!
//! Decodes a 16-bit half-word (with one half-word of lookahead for the
//! BL/BLX pair) into [`ThumbInstruction`].
//!
//! Bits 15-13 select the top-level group:
//!
//! ```text
//! 000  Shift by immediate; add/subtract register or 3-bit immediate
//! 001  MOV/CMP/ADD/SUB with an 8-bit immediate
//! 010  Data processing, high-register operations, BX/BLX,
//!      literal-pool load, load/store register offset
//! 011  Load/store word or byte, immediate offset
//! 100  Load/store halfword; load/store stack-relative
//! 101  Add to SP or PC; SP adjust, PUSH/POP, BKPT
//! 110  LDMIA/STMIA, conditional branch, UDF, SWI
//! 111  Unconditional branch, BL/BLX prefix and suffix
//! ```
//!
//! The ARM v4T profile decodes Thumb version 1 only: the MOV-register alias
//! of `lsl #0`, high-register ADD/CMP, the stack-relative loads and stores,
//! BKPT and BLX are rejected under it.

use serde::{Deserialize, Serialize};

use crate::arch::ArmArch;
use crate::bitwise::Bits;
use crate::condition::Condition;
use crate::flags::{LoadStore, ShiftKind};
use crate::register::{HighSlot, Register, ThumbRegisterList};
use crate::thumb::ThumbSize;

/// The 16 two-register data-processing operations at bits 9-6 of the
/// `010000` group.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
pub enum ThumbAluOp {
    And = 0x0,
    Eor = 0x1,
    Lsl = 0x2,
    Lsr = 0x3,
    Asr = 0x4,
    Adc = 0x5,
    Sbc = 0x6,
    Ror = 0x7,
    Tst = 0x8,
    Rsb = 0x9,
    Cmp = 0xA,
    Cmn = 0xB,
    Orr = 0xC,
    Mul = 0xD,
    Bic = 0xE,
    Mvn = 0xF,
}

impl From<u16> for ThumbAluOp {
    fn from(opcode: u16) -> Self {
        match opcode {
            0x0 => Self::And,
            0x1 => Self::Eor,
            0x2 => Self::Lsl,
            0x3 => Self::Lsr,
            0x4 => Self::Asr,
            0x5 => Self::Adc,
            0x6 => Self::Sbc,
            0x7 => Self::Ror,
            0x8 => Self::Tst,
            0x9 => Self::Rsb,
            0xA => Self::Cmp,
            0xB => Self::Cmn,
            0xC => Self::Orr,
            0xD => Self::Mul,
            0xE => Self::Bic,
            0xF => Self::Mvn,
            _ => unreachable!(),
        }
    }
}

impl std::fmt::Display for ThumbAluOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::And => f.write_str("and"),
            Self::Eor => f.write_str("eor"),
            Self::Lsl => f.write_str("lsl"),
            Self::Lsr => f.write_str("lsr"),
            Self::Asr => f.write_str("asr"),
            Self::Adc => f.write_str("adc"),
            Self::Sbc => f.write_str("sbc"),
            Self::Ror => f.write_str("ror"),
            Self::Tst => f.write_str("tst"),
            Self::Rsb => f.write_str("rsb"),
            Self::Cmp => f.write_str("cmp"),
            Self::Cmn => f.write_str("cmn"),
            Self::Orr => f.write_str("orr"),
            Self::Mul => f.write_str("mul"),
            Self::Bic => f.write_str("bic"),
            Self::Mvn => f.write_str("mvn"),
        }
    }
}

/// MOV/CMP/ADD/SUB with an 8-bit immediate (bits 12-11 of group 001).
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
pub enum ImmediateOp {
    Mov,
    Cmp,
    Add,
    Sub,
}

impl From<u16> for ImmediateOp {
    fn from(opcode: u16) -> Self {
        match opcode {
            0 => Self::Mov,
            1 => Self::Cmp,
            2 => Self::Add,
            3 => Self::Sub,
            _ => unreachable!(),
        }
    }
}

impl std::fmt::Display for ImmediateOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Mov => f.write_str("mov"),
            Self::Cmp => f.write_str("cmp"),
            Self::Add => f.write_str("add"),
            Self::Sub => f.write_str("sub"),
        }
    }
}

/// The eight register-offset transfers at bits 11-9 of the `0101` group.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
pub enum RegisterTransfer {
    Str,
    Strh,
    Strb,
    Ldrsb,
    Ldr,
    Ldrh,
    Ldrb,
    Ldrsh,
}

impl From<u16> for RegisterTransfer {
    fn from(opcode: u16) -> Self {
        match opcode {
            0 => Self::Str,
            1 => Self::Strh,
            2 => Self::Strb,
            3 => Self::Ldrsb,
            4 => Self::Ldr,
            5 => Self::Ldrh,
            6 => Self::Ldrb,
            7 => Self::Ldrsh,
            _ => unreachable!(),
        }
    }
}

impl std::fmt::Display for RegisterTransfer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Str => f.write_str("str"),
            Self::Strh => f.write_str("strh"),
            Self::Strb => f.write_str("strb"),
            Self::Ldrsb => f.write_str("ldrsb"),
            Self::Ldr => f.write_str("ldr"),
            Self::Ldrh => f.write_str("ldrh"),
            Self::Ldrb => f.write_str("ldrb"),
            Self::Ldrsh => f.write_str("ldrsh"),
        }
    }
}

/// Second operand of the three-register add/subtract: a register or a
/// 3-bit immediate.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
pub enum AddSubOperand {
    Immediate(u32),
    Register(Register),
}

/// A fully decoded T-mode instruction.
///
/// `None` from [`ThumbInstruction::decode`] means the half-word is not a
/// recognized encoding under the given profile (including a BL/BLX prefix
/// whose lookahead is not a valid suffix).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ThumbInstruction {
    /// LSL/LSR/ASR by a 5-bit immediate.
    ShiftImmediate {
        op: ShiftKind,
        rd: Register,
        rm: Register,
        immediate: u32,
    },
    /// The Thumb v2 reading of `lsl rd, rm, #0`.
    MoveRegister { rd: Register, rm: Register },
    /// Three-register or 3-bit-immediate ADD/SUB.
    AddSubtract {
        subtract: bool,
        rd: Register,
        rm: Register,
        operand: AddSubOperand,
    },
    /// MOV/CMP/ADD/SUB with an 8-bit immediate.
    ImmediateOperation {
        op: ImmediateOp,
        rd: Register,
        immediate: u32,
    },
    /// Two-register data processing.
    AluOperation {
        op: ThumbAluOp,
        rd: Register,
        rm: Register,
    },
    /// High-register ADD (Thumb v2). With SP as the source the rendering
    /// takes the `add rd, sp, rd` form.
    HighRegisterAdd { rd: Register, rm: Register },
    /// High-register CMP (Thumb v2).
    HighRegisterCompare { rn: Register, rm: Register },
    /// High-register MOV.
    HighRegisterMove { rd: Register, rm: Register },
    /// BX.
    BranchExchange { rm: Register },
    /// BLX register form (Thumb v2).
    BranchLinkExchangeRegister { rm: Register },
    /// PC-relative literal-pool load.
    LoadLiteral { rd: Register, offset: u32 },
    /// Load/store with a register offset.
    LoadStoreRegisterOffset {
        op: RegisterTransfer,
        rd: Register,
        rn: Register,
        rm: Register,
    },
    /// Load/store word or byte with a scaled immediate offset.
    LoadStoreImmediateOffset {
        load_store: LoadStore,
        byte: bool,
        rd: Register,
        rn: Register,
        offset: u32,
    },
    /// Load/store halfword with a scaled immediate offset.
    LoadStoreHalfword {
        load_store: LoadStore,
        rd: Register,
        rn: Register,
        offset: u32,
    },
    /// Stack-relative load/store (Thumb v2).
    LoadStoreStack {
        load_store: LoadStore,
        rd: Register,
        offset: u32,
    },
    /// ADD rd, sp, #imm.
    AddToSp { rd: Register, offset: u32 },
    /// ADR (ADD rd, pc, #imm).
    AddToPc { rd: Register, offset: u32 },
    /// ADD/SUB sp, sp, #imm.
    AdjustStackPointer { subtract: bool, offset: u32 },
    /// PUSH/POP. An empty register list is unpredictable and rejected.
    PushPop {
        pop: bool,
        registers: ThumbRegisterList,
    },
    /// BKPT (Thumb v2).
    Breakpoint { immediate: u32 },
    /// LDMIA/STMIA. An empty register list is unpredictable and rejected.
    LoadStoreMultiple {
        load_store: LoadStore,
        rn: Register,
        registers: ThumbRegisterList,
    },
    /// Conditional branch. The target includes the +4 prefetch adjustment.
    ConditionalBranch { condition: Condition, target: i32 },
    /// SWI.
    SoftwareInterrupt { comment: u32 },
    /// Unconditional branch. The target includes the +4 prefetch
    /// adjustment.
    UnconditionalBranch { target: i32 },
    /// The two-halfword BL/BLX pair, decoded as a unit.
    BranchWithLink { exchange: bool, target: i32 },
}

impl ThumbInstruction {
    /// Decode the low half-word of `word`; the high half-word is the
    /// lookahead, consumed only when the low one is a BL/BLX prefix.
    #[must_use]
    pub fn decode(word: u32, arch: ArmArch) -> Option<Self> {
        let half = (word & 0xFFFF) as u16;
        match half >> 13 {
            0b000 => Self::decode_shift_add_subtract(half, arch),
            0b001 => Some(Self::ImmediateOperation {
                op: ImmediateOp::from(half.get_bits(11..=12)),
                rd: Register::from(half.get_bits(8..=10)),
                immediate: u32::from(half.get_bits(0..=7)),
            }),
            0b010 => Self::decode_data_processing_and_transfers(half, arch),
            0b011 => Some(Self::decode_load_store_word_byte(half)),
            0b100 => Self::decode_halfword_and_stack(half, arch),
            0b101 => Self::decode_sp_pc_and_misc(half, arch),
            0b110 => Self::decode_multiple_and_conditional(half),
            0b111 => Self::decode_branches(word, half, arch),
            _ => unreachable!(),
        }
    }

    /// Half-words consumed by this instruction.
    #[must_use]
    pub const fn size(&self) -> ThumbSize {
        match self {
            Self::BranchWithLink { .. } => ThumbSize::Size32,
            _ => ThumbSize::Size16,
        }
    }

    fn decode_shift_add_subtract(half: u16, arch: ArmArch) -> Option<Self> {
        let rd = Register::from(half.get_bits(0..=2));
        let rm = Register::from(half.get_bits(3..=5));
        match half.get_bits(11..=12) {
            0b00 => {
                let immediate = u32::from(half.get_bits(6..=10));
                // Thumb v2 reads lsl #0 as a plain register move
                if arch >= ArmArch::Armv5Te && immediate == 0 {
                    Some(Self::MoveRegister { rd, rm })
                } else {
                    Some(Self::ShiftImmediate {
                        op: ShiftKind::Lsl,
                        rd,
                        rm,
                        immediate,
                    })
                }
            }
            0b01 => Some(Self::ShiftImmediate {
                op: ShiftKind::Lsr,
                rd,
                rm,
                immediate: u32::from(half.get_bits(6..=10)),
            }),
            0b10 => Some(Self::ShiftImmediate {
                op: ShiftKind::Asr,
                rd,
                rm,
                immediate: u32::from(half.get_bits(6..=10)),
            }),
            0b11 => {
                let value = half.get_bits(6..=8);
                let operand = if half.get_bit(10) {
                    AddSubOperand::Immediate(u32::from(value))
                } else {
                    AddSubOperand::Register(Register::from(value))
                };
                Some(Self::AddSubtract {
                    subtract: half.get_bit(9),
                    rd,
                    rm,
                    operand,
                })
            }
            _ => unreachable!(),
        }
    }

    fn decode_data_processing_and_transfers(half: u16, arch: ArmArch) -> Option<Self> {
        match half.get_bits(10..=12) {
            0b001 => {
                let rd = Register::from((half.get_bits(7..=7) << 3) | half.get_bits(0..=2));
                let rm = Register::from(half.get_bits(3..=6));
                match half.get_bits(8..=9) {
                    0b00 => {
                        if arch < ArmArch::Armv5Te {
                            return None;
                        }
                        Some(Self::HighRegisterAdd { rd, rm })
                    }
                    0b01 => {
                        if arch < ArmArch::Armv5Te {
                            return None;
                        }
                        Some(Self::HighRegisterCompare { rn: rd, rm })
                    }
                    0b10 => Some(Self::HighRegisterMove { rd, rm }),
                    0b11 => {
                        if half.get_bits(0..=2) != 0 {
                            // Should-Be-Zero
                            return None;
                        }
                        if half.get_bit(7) {
                            if arch < ArmArch::Armv5Te {
                                return None;
                            }
                            Some(Self::BranchLinkExchangeRegister { rm })
                        } else {
                            Some(Self::BranchExchange { rm })
                        }
                    }
                    _ => unreachable!(),
                }
            }
            0b000 => Some(Self::AluOperation {
                op: ThumbAluOp::from(half.get_bits(6..=9)),
                rd: Register::from(half.get_bits(0..=2)),
                rm: Register::from(half.get_bits(3..=5)),
            }),
            _ => {
                if half.get_bit(12) {
                    Some(Self::LoadStoreRegisterOffset {
                        op: RegisterTransfer::from(half.get_bits(9..=11)),
                        rd: Register::from(half.get_bits(0..=2)),
                        rn: Register::from(half.get_bits(3..=5)),
                        rm: Register::from(half.get_bits(6..=8)),
                    })
                } else {
                    Some(Self::LoadLiteral {
                        rd: Register::from(half.get_bits(8..=10)),
                        offset: 4 * u32::from(half.get_bits(0..=7)),
                    })
                }
            }
        }
    }

    fn decode_load_store_word_byte(half: u16) -> Self {
        let byte = half.get_bit(12);
        let scale = if byte { 1 } else { 4 };
        Self::LoadStoreImmediateOffset {
            load_store: half.get_bit(11).into(),
            byte,
            rd: Register::from(half.get_bits(0..=2)),
            rn: Register::from(half.get_bits(3..=5)),
            offset: scale * u32::from(half.get_bits(6..=10)),
        }
    }

    fn decode_halfword_and_stack(half: u16, arch: ArmArch) -> Option<Self> {
        if half.get_bit(12) {
            if arch < ArmArch::Armv5Te {
                return None;
            }
            Some(Self::LoadStoreStack {
                load_store: half.get_bit(11).into(),
                rd: Register::from(half.get_bits(8..=10)),
                offset: 4 * u32::from(half.get_bits(0..=7)),
            })
        } else {
            Some(Self::LoadStoreHalfword {
                load_store: half.get_bit(11).into(),
                rd: Register::from(half.get_bits(0..=2)),
                rn: Register::from(half.get_bits(3..=5)),
                offset: 2 * u32::from(half.get_bits(6..=10)),
            })
        }
    }

    fn decode_sp_pc_and_misc(half: u16, arch: ArmArch) -> Option<Self> {
        if !half.get_bit(12) {
            let rd = Register::from(half.get_bits(8..=10));
            let offset = 4 * u32::from(half.get_bits(0..=7));
            return Some(if half.get_bit(11) {
                Self::AddToSp { rd, offset }
            } else {
                Self::AddToPc { rd, offset }
            });
        }
        match half.get_bits(8..=11) {
            0b0000 => Some(Self::AdjustStackPointer {
                subtract: half.get_bit(7),
                offset: 4 * u32::from(half.get_bits(0..=6)),
            }),
            0b0100 | 0b0101 | 0b1100 | 0b1101 => {
                let pop = half.get_bit(11);
                let high = if pop { HighSlot::Pc } else { HighSlot::Lr };
                let registers = ThumbRegisterList::push_pop(half.get_bits(0..=8), high);
                if registers.count() == 0 {
                    // UNPREDICTABLE with an empty list
                    return None;
                }
                Some(Self::PushPop { pop, registers })
            }
            0b1110 => {
                if arch < ArmArch::Armv5Te {
                    return None;
                }
                Some(Self::Breakpoint {
                    immediate: u32::from(half.get_bits(0..=7)),
                })
            }
            _ => None,
        }
    }

    fn decode_multiple_and_conditional(half: u16) -> Option<Self> {
        if half.get_bit(12) {
            return match half.get_bits(8..=11) {
                // permanently undefined space, left unrendered
                0b1110 => None,
                0b1111 => Some(Self::SoftwareInterrupt {
                    comment: u32::from(half.get_bits(0..=7)),
                }),
                condition => Some(Self::ConditionalBranch {
                    condition: Condition::from(u32::from(condition)),
                    target: 4 + 2 * half.get_bits(0..=7).sign_extended(8),
                }),
            };
        }
        let registers = ThumbRegisterList::plain(half.get_bits(0..=7));
        if registers.count() == 0 {
            // UNPREDICTABLE with an empty list
            return None;
        }
        Some(Self::LoadStoreMultiple {
            load_store: half.get_bit(11).into(),
            rn: Register::from(half.get_bits(8..=10)),
            registers,
        })
    }

    fn decode_branches(word: u32, half: u16, arch: ArmArch) -> Option<Self> {
        match half.get_bits(11..=12) {
            0b00 => Some(Self::UnconditionalBranch {
                target: 4 + 2 * half.get_bits(0..=10).sign_extended(11),
            }),
            0b10 => {
                // BL/BLX prefix: the lookahead half-word must be a suffix
                let next = (word >> 16) as u16;
                if next >> 13 != 0b111 {
                    return None;
                }
                match next.get_bits(11..=12) {
                    0b01 => {
                        // BLX suffix: bit 0 must be clear, target word-aligned
                        if next.get_bit(0) || arch < ArmArch::Armv5Te {
                            return None;
                        }
                        let offset = ((u32::from(half.get_bits(0..=9)) << 10)
                            | u32::from(next.get_bits(1..=10)))
                            << 2;
                        Some(Self::BranchWithLink {
                            exchange: true,
                            target: 4 + offset.sign_extended(22),
                        })
                    }
                    0b11 => {
                        let offset = ((u32::from(half.get_bits(0..=9)) << 11)
                            | u32::from(next.get_bits(0..=10)))
                            << 1;
                        Some(Self::BranchWithLink {
                            exchange: false,
                            target: 4 + offset.sign_extended(22),
                        })
                    }
                    _ => None,
                }
            }
            // a lone suffix (or the undefined 01 slot) never decodes
            _ => None,
        }
    }

    /// Render the instruction in assembler syntax. Registers are spelled
    /// `r<n>` except where the encoding itself is SP- or PC-implicit; the
    /// caller runs the special-register post-pass over the result.
    #[must_use]
    pub fn disassembler(&self) -> String {
        match self {
            Self::ShiftImmediate {
                op,
                rd,
                rm,
                immediate,
            } => {
                format!("{op} {rd}, {rm}, #0x{immediate:X}")
            }
            Self::MoveRegister { rd, rm } => format!("mov {rd}, {rm}"),
            Self::AddSubtract {
                subtract,
                rd,
                rm,
                operand,
            } => {
                let op = if *subtract { "sub" } else { "add" };
                match operand {
                    AddSubOperand::Immediate(value) => format!("{op} {rd}, {rm}, #0x{value:X}"),
                    AddSubOperand::Register(rn) => format!("{op} {rd}, {rm}, {rn}"),
                }
            }
            Self::ImmediateOperation { op, rd, immediate } => {
                format!("{op} {rd}, #0x{immediate:X}")
            }
            Self::AluOperation { op, rd, rm } => format!("{op} {rd}, {rm}"),
            Self::HighRegisterAdd { rd, rm } => {
                if *rm == Register::SP {
                    format!("add {rd}, sp, {rd}")
                } else {
                    format!("add {rd}, {rm}")
                }
            }
            Self::HighRegisterCompare { rn, rm } => format!("cmp {rn}, {rm}"),
            Self::HighRegisterMove { rd, rm } => format!("mov {rd}, {rm}"),
            Self::BranchExchange { rm } => format!("bx {rm}"),
            Self::BranchLinkExchangeRegister { rm } => format!("blx {rm}"),
            Self::LoadLiteral { rd, offset } => format!("ldr {rd}, [pc, #0x{offset:X}]"),
            Self::LoadStoreRegisterOffset { op, rd, rn, rm } => {
                format!("{op} {rd}, [{rn}, {rm}]")
            }
            Self::LoadStoreImmediateOffset {
                load_store,
                byte,
                rd,
                rn,
                offset,
            } => {
                let op = match load_store {
                    LoadStore::Load => "ldr",
                    LoadStore::Store => "str",
                };
                let b = if *byte { "b" } else { "" };
                format!("{op}{b} {rd}, [{rn}, #0x{offset:X}]")
            }
            Self::LoadStoreHalfword {
                load_store,
                rd,
                rn,
                offset,
            } => {
                let op = match load_store {
                    LoadStore::Load => "ldrh",
                    LoadStore::Store => "strh",
                };
                format!("{op} {rd}, [{rn}, #0x{offset:X}]")
            }
            Self::LoadStoreStack {
                load_store,
                rd,
                offset,
            } => {
                let op = match load_store {
                    LoadStore::Load => "ldr",
                    LoadStore::Store => "str",
                };
                format!("{op} {rd}, [sp, #0x{offset:X}]")
            }
            Self::AddToSp { rd, offset } => format!("add {rd}, sp, #0x{offset:X}"),
            Self::AddToPc { rd, offset } => format!("adr {rd}, #0x{offset:X}"),
            Self::AdjustStackPointer { subtract, offset } => {
                let op = if *subtract { "sub" } else { "add" };
                format!("{op} sp, sp, #0x{offset:X}")
            }
            Self::PushPop { pop, registers } => {
                let op = if *pop { "pop" } else { "push" };
                format!("{op} {{{registers}}}")
            }
            Self::Breakpoint { immediate } => format!("bkpt #0x{immediate:X}"),
            Self::LoadStoreMultiple {
                load_store,
                rn,
                registers,
            } => match load_store {
                LoadStore::Load => {
                    // writeback is skipped when the base is also loaded
                    let writeback = if registers.contains(rn.0) { "" } else { "!" };
                    format!("ldmia {rn}{writeback}, {{{registers}}}")
                }
                LoadStore::Store => format!("stmia {rn}!, {{{registers}}}"),
            },
            Self::ConditionalBranch { condition, target } => {
                format!("b{condition} #0x{:X}", *target as u32)
            }
            Self::SoftwareInterrupt { comment } => format!("swi #0x{comment:X}"),
            Self::UnconditionalBranch { target } => format!("b #0x{:X}", *target as u32),
            Self::BranchWithLink { exchange, target } => {
                let x = if *exchange { "x" } else { "" };
                format!("bl{x} #0x{:X}", *target as u32)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const V5: ArmArch = ArmArch::Armv5Te;
    const V4: ArmArch = ArmArch::Armv4T;

    fn disassemble(word: u32) -> String {
        ThumbInstruction::decode(word, V5)
            .map(|instruction| instruction.disassembler())
            .unwrap_or_else(|| panic!("half-word 0x{word:04X} did not decode"))
    }

    #[test]
    fn decode_shift_immediate() {
        assert_eq!(disassemble(0x0088), "lsl r0, r1, #0x2");
        assert_eq!(disassemble(0x0888), "lsr r0, r1, #0x2");
        assert_eq!(disassemble(0x1088), "asr r0, r1, #0x2");
    }

    #[test]
    fn lsl_zero_is_mov_only_in_thumb_v2() {
        let output = ThumbInstruction::decode(0x0008, V5).unwrap();
        assert_eq!(
            output,
            ThumbInstruction::MoveRegister {
                rd: Register(0),
                rm: Register(1),
            }
        );
        assert_eq!(output.disassembler(), "mov r0, r1");

        let output = ThumbInstruction::decode(0x0008, V4).unwrap();
        assert_eq!(output.disassembler(), "lsl r0, r1, #0x0");
    }

    #[test]
    fn decode_add_subtract() {
        assert_eq!(disassemble(0x1888), "add r0, r1, r2");
        assert_eq!(disassemble(0x1A88), "sub r0, r1, r2");
        assert_eq!(disassemble(0x1C88), "add r0, r1, #0x2");
        assert_eq!(disassemble(0x1E88), "sub r0, r1, #0x2");
    }

    #[test]
    fn decode_immediate_operations() {
        assert_eq!(disassemble(0x2042), "mov r0, #0x42");
        assert_eq!(disassemble(0x2842), "cmp r0, #0x42");
        assert_eq!(disassemble(0x3042), "add r0, #0x42");
        assert_eq!(disassemble(0x3842), "sub r0, #0x42");
    }

    #[test]
    fn decode_alu_operations() {
        assert_eq!(disassemble(0x4048), "eor r0, r1");
        assert_eq!(disassemble(0x4248), "rsb r0, r1");
        assert_eq!(disassemble(0x4348), "mul r0, r1");
        assert_eq!(disassemble(0x43C8), "mvn r0, r1");
        assert_eq!(disassemble(0x4208), "tst r0, r1");
    }

    #[test]
    fn decode_high_register_operations() {
        assert_eq!(disassemble(0x4448), "add r0, r9");
        assert_eq!(disassemble(0x4548), "cmp r0, r9");
        assert_eq!(disassemble(0x4648), "mov r0, r9");
        assert_eq!(disassemble(0x46C0), "mov r8, r8");
        // ADD with SP as the source takes the sp-relative form
        assert_eq!(disassemble(0x4468), "add r0, sp, r0");
    }

    #[test]
    fn high_register_add_cmp_are_thumb_v2() {
        assert_eq!(ThumbInstruction::decode(0x4448, V4), None);
        assert_eq!(ThumbInstruction::decode(0x4548, V4), None);
        // MOV stays valid in v4T
        assert!(ThumbInstruction::decode(0x4648, V4).is_some());
    }

    #[test]
    fn decode_branch_exchange() {
        let output = ThumbInstruction::decode(0x4770, V5).unwrap();
        assert_eq!(
            output,
            ThumbInstruction::BranchExchange { rm: Register(14) }
        );
        assert_eq!(output.disassembler(), "bx r14");

        assert_eq!(disassemble(0x47F0), "blx r14");
        // BLX register is Thumb v2
        assert_eq!(ThumbInstruction::decode(0x47F0, V4), None);
        // bits 2-0 are Should-Be-Zero
        assert_eq!(ThumbInstruction::decode(0x4771, V5), None);
    }

    #[test]
    fn decode_literal_pool_load() {
        assert_eq!(disassemble(0x4801), "ldr r0, [pc, #0x4]");
        assert_eq!(disassemble(0x4A40), "ldr r2, [pc, #0x100]");
    }

    #[test]
    fn decode_load_store_register_offset() {
        assert_eq!(disassemble(0x5088), "str r0, [r1, r2]");
        assert_eq!(disassemble(0x5288), "strh r0, [r1, r2]");
        assert_eq!(disassemble(0x5488), "strb r0, [r1, r2]");
        assert_eq!(disassemble(0x5688), "ldrsb r0, [r1, r2]");
        assert_eq!(disassemble(0x5888), "ldr r0, [r1, r2]");
        assert_eq!(disassemble(0x5A88), "ldrh r0, [r1, r2]");
        assert_eq!(disassemble(0x5C88), "ldrb r0, [r1, r2]");
        assert_eq!(disassemble(0x5E88), "ldrsh r0, [r1, r2]");
    }

    #[test]
    fn decode_load_store_immediate_offset() {
        // word offsets scale by 4, byte offsets by 1
        assert_eq!(disassemble(0x6088), "str r0, [r1, #0x8]");
        assert_eq!(disassemble(0x6888), "ldr r0, [r1, #0x8]");
        assert_eq!(disassemble(0x7088), "strb r0, [r1, #0x2]");
        assert_eq!(disassemble(0x7888), "ldrb r0, [r1, #0x2]");
    }

    #[test]
    fn decode_load_store_halfword() {
        assert_eq!(disassemble(0x8088), "strh r0, [r1, #0x4]");
        assert_eq!(disassemble(0x8888), "ldrh r0, [r1, #0x4]");
    }

    #[test]
    fn decode_stack_relative_load_store() {
        assert_eq!(disassemble(0x9801), "ldr r0, [sp, #0x4]");
        assert_eq!(disassemble(0x9001), "str r0, [sp, #0x4]");
        // stack-relative forms are Thumb v2
        assert_eq!(ThumbInstruction::decode(0x9801, V4), None);
    }

    #[test]
    fn decode_add_to_sp_or_pc() {
        assert_eq!(disassemble(0xA001), "adr r0, #0x4");
        assert_eq!(disassemble(0xA801), "add r0, sp, #0x4");
    }

    #[test]
    fn decode_stack_adjust() {
        assert_eq!(disassemble(0xB004), "add sp, sp, #0x10");
        assert_eq!(disassemble(0xB084), "sub sp, sp, #0x10");
    }

    #[test]
    fn decode_push_pop() {
        let output = ThumbInstruction::decode(0xB500, V5).unwrap();
        assert_eq!(output.disassembler(), "push {lr}");
        assert_eq!(disassemble(0xB510), "push {r4,lr}");
        assert_eq!(disassemble(0xBD01), "pop {r0,pc}");
        assert_eq!(disassemble(0xBC01), "pop {r0}");
        // empty register lists are unpredictable
        assert_eq!(ThumbInstruction::decode(0xB400, V5), None);
        assert_eq!(ThumbInstruction::decode(0xBC00, V5), None);
    }

    #[test]
    fn decode_breakpoint() {
        assert_eq!(disassemble(0xBE42), "bkpt #0x42");
        assert_eq!(ThumbInstruction::decode(0xBE42, V4), None);
        // neighbouring miscellaneous slots stay undefined
        assert_eq!(ThumbInstruction::decode(0xB600, V5), None);
    }

    #[test]
    fn decode_load_store_multiple() {
        assert_eq!(disassemble(0xC806), "ldmia r0!, {r1,r2}");
        // no writeback marker when the base register is in the list
        assert_eq!(disassemble(0xC903), "ldmia r1, {r0,r1}");
        assert_eq!(disassemble(0xC103), "stmia r1!, {r0,r1}");
        assert_eq!(ThumbInstruction::decode(0xC800, V5), None);
        assert_eq!(ThumbInstruction::decode(0xC000, V5), None);
    }

    #[test]
    fn decode_conditional_branch() {
        assert_eq!(disassemble(0xD0FE), "beq #0x0");
        assert_eq!(disassemble(0xD100), "bne #0x4");
        assert_eq!(disassemble(0xDC01), "bgt #0x6");
    }

    #[test]
    fn conditional_branch_sign_extension_boundaries() {
        // displacement 0x80 is the most negative 9-bit offset
        assert_eq!(disassemble(0xD080), "beq #0xFFFFFF04");
        // displacement 0x7F is the most positive
        assert_eq!(disassemble(0xD07F), "beq #0x102");
    }

    #[test]
    fn undefined_and_swi_slots() {
        // condition 14 in the branch slot is the permanently undefined space
        assert_eq!(ThumbInstruction::decode(0xDEF0, V5), None);
        assert_eq!(disassemble(0xDF42), "swi #0x42");
    }

    #[test]
    fn decode_unconditional_branch() {
        assert_eq!(disassemble(0xE7FE), "b #0x0");
        assert_eq!(disassemble(0xE001), "b #0x6");
    }

    #[test]
    fn decode_branch_with_link() {
        let output = ThumbInstruction::decode(0xF800_F000, V5).unwrap();
        assert_eq!(
            output,
            ThumbInstruction::BranchWithLink {
                exchange: false,
                target: 4,
            }
        );
        assert_eq!(output.disassembler(), "bl #0x4");
        assert_eq!(output.size(), ThumbSize::Size32);

        assert_eq!(disassemble(0xF801_F000), "bl #0x6");
        assert_eq!(disassemble(0xFFFE_F7FF), "bl #0x0");
        assert_eq!(disassemble(0xE800_F000), "blx #0x4");
    }

    #[test]
    fn branch_with_link_rejects_bad_suffixes() {
        // no suffix in the lookahead
        assert_eq!(ThumbInstruction::decode(0x0000_F000, V5), None);
        // BLX suffix with bit 0 set
        assert_eq!(ThumbInstruction::decode(0xE801_F000, V5), None);
        // BLX is Thumb v2
        assert_eq!(ThumbInstruction::decode(0xE800_F000, V4), None);
        // a lone suffix never decodes
        assert_eq!(ThumbInstruction::decode(0xF800, V5), None);
        // the 01 slot of group 111 is undefined
        assert_eq!(ThumbInstruction::decode(0xE800, V5), None);
    }

    #[test]
    fn sixteen_bit_instructions_report_one_halfword() {
        let output = ThumbInstruction::decode(0x4770, V5).unwrap();
        assert_eq!(output.size(), ThumbSize::Size16);
    }
}
