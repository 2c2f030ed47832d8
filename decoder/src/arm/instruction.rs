//! # ARM Instruction Decoding
//!
//! Decodes a 32-bit ARM word into [`ArmInstruction`], a tagged value carrying
//! the already-extracted fields, then renders it with
//! [`ArmInstruction::disassembler`].
//!
//! Bits 27-25 determine the basic category:
//!
//! ```text
//! 000  Data processing (register operand), multiplies, extra load/store,
//!      swap, DSP arithmetic, MRS/MSR/BX/BLX/CLZ/BKPT
//! 001  Data processing (immediate operand), MSR immediate
//! 010  Load/store word or byte, immediate offset
//! 011  Load/store word or byte, register offset
//! 100  Load/store multiple
//! 101  Branch (B/BL); BLX immediate in the NV space
//! 110  Coprocessor load/store, MCRR/MRRC
//! 111  SWI, coprocessor data processing and register transfer
//! ```
//!
//! A condition field of NV selects the ARM v5 unconditional space instead
//! (BLX immediate, PLD, the coprocessor `2` forms); everywhere else NV is
//! undefined and decoding fails. Decoding also fails on violated
//! should-be-zero/one fields, which disambiguate overlapping patterns; the
//! caller reports those words as not recognized.

use serde::{Deserialize, Serialize};

use crate::arch::ArmArch;
use crate::bitwise::Bits;
use crate::condition::Condition;
use crate::flags::{BlockMode, LoadStore, PsrFields, PsrKind};
use crate::operand::{CoprocessorAddress, ExtraAddress, ShifterOperand, TransferAddress};
use crate::register::{Register, RegisterList};

/// The 16 data-processing opcodes at bits 24-21.
///
/// The comparison group (TST/TEQ/CMP/CMN) always updates the flags and never
/// takes the `s` suffix or a destination; MOV and MVN take no first source
/// register.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
pub enum AluOpcode {
    And = 0x0,
    Eor = 0x1,
    Sub = 0x2,
    Rsb = 0x3,
    Add = 0x4,
    Adc = 0x5,
    Sbc = 0x6,
    Rsc = 0x7,
    Tst = 0x8,
    Teq = 0x9,
    Cmp = 0xA,
    Cmn = 0xB,
    Orr = 0xC,
    Mov = 0xD,
    Bic = 0xE,
    Mvn = 0xF,
}

impl From<u32> for AluOpcode {
    fn from(opcode: u32) -> Self {
        match opcode {
            0x0 => Self::And,
            0x1 => Self::Eor,
            0x2 => Self::Sub,
            0x3 => Self::Rsb,
            0x4 => Self::Add,
            0x5 => Self::Adc,
            0x6 => Self::Sbc,
            0x7 => Self::Rsc,
            0x8 => Self::Tst,
            0x9 => Self::Teq,
            0xA => Self::Cmp,
            0xB => Self::Cmn,
            0xC => Self::Orr,
            0xD => Self::Mov,
            0xE => Self::Bic,
            0xF => Self::Mvn,
            _ => unreachable!(),
        }
    }
}

impl AluOpcode {
    /// TST/TEQ/CMP/CMN: flags only, no destination register.
    #[must_use]
    pub const fn is_comparison(self) -> bool {
        matches!(self, Self::Tst | Self::Teq | Self::Cmp | Self::Cmn)
    }

    /// MOV/MVN: destination and shifter operand only.
    #[must_use]
    pub const fn is_unary(self) -> bool {
        matches!(self, Self::Mov | Self::Mvn)
    }
}

impl std::fmt::Display for AluOpcode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::And => f.write_str("and"),
            Self::Eor => f.write_str("eor"),
            Self::Sub => f.write_str("sub"),
            Self::Rsb => f.write_str("rsb"),
            Self::Add => f.write_str("add"),
            Self::Adc => f.write_str("adc"),
            Self::Sbc => f.write_str("sbc"),
            Self::Rsc => f.write_str("rsc"),
            Self::Tst => f.write_str("tst"),
            Self::Teq => f.write_str("teq"),
            Self::Cmp => f.write_str("cmp"),
            Self::Cmn => f.write_str("cmn"),
            Self::Orr => f.write_str("orr"),
            Self::Mov => f.write_str("mov"),
            Self::Bic => f.write_str("bic"),
            Self::Mvn => f.write_str("mvn"),
        }
    }
}

/// The four long multiplies at bits 22-21 of the multiply extension space.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
pub enum MultiplyLongOp {
    Umull,
    Umlal,
    Smull,
    Smlal,
}

impl From<u32> for MultiplyLongOp {
    fn from(opcode: u32) -> Self {
        match opcode {
            0b00 => Self::Umull,
            0b01 => Self::Umlal,
            0b10 => Self::Smull,
            0b11 => Self::Smlal,
            _ => unreachable!(),
        }
    }
}

impl std::fmt::Display for MultiplyLongOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Umull => f.write_str("umull"),
            Self::Umlal => f.write_str("umlal"),
            Self::Smull => f.write_str("smull"),
            Self::Smlal => f.write_str("smlal"),
        }
    }
}

/// The DSP saturating arithmetic group (ARM v5TE).
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
pub enum SaturatingOp {
    Qadd,
    Qsub,
    Qdadd,
    Qdsub,
}

impl From<u32> for SaturatingOp {
    fn from(opcode: u32) -> Self {
        match opcode {
            0b00 => Self::Qadd,
            0b01 => Self::Qsub,
            0b10 => Self::Qdadd,
            0b11 => Self::Qdsub,
            _ => unreachable!(),
        }
    }
}

impl std::fmt::Display for SaturatingOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Qadd => f.write_str("qadd"),
            Self::Qsub => f.write_str("qsub"),
            Self::Qdadd => f.write_str("qdadd"),
            Self::Qdsub => f.write_str("qdsub"),
        }
    }
}

/// The DSP 16-bit signed multiplies (ARM v5TE). The `x`/`y` operand-half
/// selectors render as `b`/`t` suffixes on the mnemonic.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
pub enum SignedMultiplyOp {
    Smla,
    Smlaw,
    Smulw,
    Smlal,
    Smul,
}

/// The extra load/stores: halfword, signed byte/halfword and doubleword.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
pub enum ExtraTransfer {
    Strh,
    Ldrh,
    Ldrsb,
    Ldrsh,
    Ldrd,
    Strd,
}

impl std::fmt::Display for ExtraTransfer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Strh => f.write_str("strh"),
            Self::Ldrh => f.write_str("ldrh"),
            Self::Ldrsb => f.write_str("ldrsb"),
            Self::Ldrsh => f.write_str("ldrsh"),
            Self::Ldrd => f.write_str("ldrd"),
            Self::Strd => f.write_str("strd"),
        }
    }
}

/// A fully decoded ARM-mode instruction.
///
/// [`ArmInstruction::decode`] extracts every field once; the variants carry
/// only what the rendering needs. `None` from `decode` means the word is not
/// a recognized encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArmInstruction {
    /// ALU operations in all three shifter-operand forms.
    DataProcessing {
        condition: Condition,
        opcode: AluOpcode,
        set_flags: bool,
        rd: Register,
        rn: Register,
        op2: ShifterOperand,
    },
    /// MUL and MLA.
    Multiply {
        condition: Condition,
        accumulate: bool,
        set_flags: bool,
        rd: Register,
        rm: Register,
        rs: Register,
        rn: Register,
    },
    /// UMULL/UMLAL/SMULL/SMLAL.
    MultiplyLong {
        condition: Condition,
        op: MultiplyLongOp,
        set_flags: bool,
        rdlo: Register,
        rdhi: Register,
        rm: Register,
        rs: Register,
    },
    /// The SMLA/SMLAW/SMULW/SMLAL/SMUL halfword multiplies. For the long
    /// form `rn` is RdLo and `rd` is RdHi.
    SignedMultiply {
        condition: Condition,
        op: SignedMultiplyOp,
        x: bool,
        y: bool,
        rd: Register,
        rm: Register,
        rs: Register,
        rn: Register,
    },
    /// QADD/QSUB/QDADD/QDSUB.
    SaturatingAddSubtract {
        condition: Condition,
        op: SaturatingOp,
        rd: Register,
        rm: Register,
        rn: Register,
    },
    /// SWP and SWPB.
    Swap {
        condition: Condition,
        byte: bool,
        rd: Register,
        rm: Register,
        rn: Register,
    },
    /// BX.
    BranchExchange { condition: Condition, rm: Register },
    /// BLX (register form).
    BranchLinkExchangeRegister { condition: Condition, rm: Register },
    /// CLZ.
    CountLeadingZeros {
        condition: Condition,
        rd: Register,
        rm: Register,
    },
    /// BKPT. The immediate is split across bits 19-8 and 3-0.
    Breakpoint { immediate: u32 },
    /// MRS.
    ReadStatus {
        condition: Condition,
        psr: PsrKind,
        rd: Register,
    },
    /// MSR, register operand.
    WriteStatus {
        condition: Condition,
        psr: PsrKind,
        fields: PsrFields,
        rm: Register,
    },
    /// MSR, rotated 8-bit immediate operand.
    WriteStatusImmediate {
        condition: Condition,
        psr: PsrKind,
        fields: PsrFields,
        immediate: u32,
    },
    /// LDRH/STRH/LDRSB/LDRSH/LDRD/STRD.
    ExtraLoadStore {
        condition: Condition,
        op: ExtraTransfer,
        rd: Register,
        address: ExtraAddress,
    },
    /// LDR/STR and the byte and translation variants.
    LoadStore {
        condition: Condition,
        load_store: LoadStore,
        byte: bool,
        rd: Register,
        address: TransferAddress,
    },
    /// PLD cache hint (NV space, offset addressing only).
    Preload { address: TransferAddress },
    /// LDM/STM.
    LoadStoreMultiple {
        condition: Condition,
        load_store: LoadStore,
        mode: BlockMode,
        writeback: bool,
        user_registers: bool,
        rn: Register,
        registers: RegisterList,
    },
    /// B and BL. The target already includes the +8 prefetch adjustment.
    Branch {
        condition: Condition,
        link: bool,
        target: i32,
    },
    /// BLX (immediate form, NV space).
    BranchLinkExchange { target: i32 },
    /// SWI.
    SoftwareInterrupt { condition: Condition, comment: u32 },
    /// LDC/STC; `condition` of `None` selects the LDC2/STC2 forms.
    CoprocessorLoadStore {
        condition: Option<Condition>,
        load_store: LoadStore,
        long: bool,
        coprocessor: u32,
        crd: u32,
        address: CoprocessorAddress,
    },
    /// MCRR/MRRC; `condition` of `None` selects the `2` forms.
    CoprocessorRegisterPair {
        condition: Option<Condition>,
        load_store: LoadStore,
        coprocessor: u32,
        opcode: u32,
        rd: Register,
        rn: Register,
        crm: u32,
    },
    /// MCR/MRC; `condition` of `None` selects the `2` forms.
    CoprocessorRegisterTransfer {
        condition: Option<Condition>,
        load_store: LoadStore,
        coprocessor: u32,
        opcode1: u32,
        rd: Register,
        crn: u32,
        crm: u32,
        opcode2: u32,
    },
    /// CDP; `condition` of `None` selects CDP2.
    CoprocessorDataOperation {
        condition: Option<Condition>,
        coprocessor: u32,
        opcode1: u32,
        crd: u32,
        crn: u32,
        crm: u32,
        opcode2: u32,
    },
}

impl ArmInstruction {
    /// Decode a 32-bit word. `None` means the encoding is not recognized:
    /// either a hole in the instruction space or a violated
    /// should-be-zero/one field.
    #[must_use]
    pub fn decode(word: u32, arch: ArmArch) -> Option<Self> {
        let condition = Condition::from(word.get_bits(28..=31));
        if condition == Condition::NV {
            return Self::decode_unconditional(word, arch);
        }
        match word.get_bits(25..=27) {
            0b000 => Self::decode_misc_or_register_operand(word, condition),
            0b001 => Self::decode_immediate_operand(word, condition),
            0b010 => Some(Self::decode_load_store(
                word,
                condition,
                TransferAddress::decode_immediate(word),
            )),
            0b011 => {
                // bit 4 set in the register-offset space is undefined
                if word.get_bit(4) {
                    return None;
                }
                Some(Self::decode_load_store(
                    word,
                    condition,
                    TransferAddress::decode_register(word),
                ))
            }
            0b100 => Some(Self::LoadStoreMultiple {
                condition,
                load_store: word.get_bit(20).into(),
                mode: BlockMode::decode(word),
                writeback: word.get_bit(21),
                user_registers: word.get_bit(22),
                rn: Register(word.get_bits(16..=19)),
                registers: RegisterList(word.get_bits(0..=15) as u16),
            }),
            0b101 => Some(Self::Branch {
                condition,
                link: word.get_bit(24),
                target: 8 + 4 * word.get_bits(0..=23).sign_extended(24),
            }),
            0b110 => Some(Self::decode_coprocessor_load_store(word, Some(condition))),
            0b111 => {
                if word.get_bit(24) {
                    Some(Self::SoftwareInterrupt {
                        condition,
                        comment: word.get_bits(0..=23),
                    })
                } else {
                    Some(Self::decode_coprocessor_operation(word, Some(condition)))
                }
            }
            _ => unreachable!(),
        }
    }

    /// The NV space: undefined before ARM v5, re-encoded from v5TE on as
    /// BLX immediate, PLD and the coprocessor `2` forms.
    fn decode_unconditional(word: u32, arch: ArmArch) -> Option<Self> {
        if arch < ArmArch::Armv5Te {
            return None;
        }
        if word & 0xFD70_F000 == 0xF550_F000 {
            // PLD only has the offset addressing modes
            let address = if word.get_bit(25) {
                TransferAddress::decode_register(word)
            } else {
                TransferAddress::decode_immediate(word)
            };
            return Some(Self::Preload { address });
        }
        match word.get_bits(25..=27) {
            0b101 => Some(Self::BranchLinkExchange {
                target: 8
                    + 4 * word.get_bits(0..=23).sign_extended(24)
                    + 2 * i32::from(word.get_bit(24)),
            }),
            0b110 => Some(Self::decode_coprocessor_load_store(word, None)),
            0b111 if !word.get_bit(24) => Some(Self::decode_coprocessor_operation(word, None)),
            _ => None,
        }
    }

    /// Class 000: data processing with a register operand, plus everything
    /// tucked into its holes (bits 7 and 4, and the opcode-with-S-clear
    /// miscellaneous region).
    fn decode_misc_or_register_operand(word: u32, condition: Condition) -> Option<Self> {
        let misc_region = word.get_bits(23..=24) == 0b10 && !word.get_bit(20);
        if word.get_bit(4) {
            if word.get_bit(7) {
                return match word.get_bits(5..=6) {
                    0b00 => Self::decode_multiply_or_swap(word, condition),
                    oplo => Self::decode_extra_load_store(word, condition, oplo),
                };
            }
            if misc_region {
                return Self::decode_miscellaneous(word, condition);
            }
            return Some(Self::data_processing(
                word,
                condition,
                ShifterOperand::decode_register_shift(word),
            ));
        }
        if misc_region {
            if word.get_bit(7) {
                return Self::decode_signed_multiply(word, condition);
            }
            return Self::decode_status_transfer(word, condition);
        }
        Some(Self::data_processing(
            word,
            condition,
            ShifterOperand::decode_immediate_shift(word),
        ))
    }

    fn data_processing(word: u32, condition: Condition, op2: ShifterOperand) -> Self {
        Self::DataProcessing {
            condition,
            opcode: AluOpcode::from(word.get_bits(21..=24)),
            set_flags: word.get_bit(20),
            rd: Register(word.get_bits(12..=15)),
            rn: Register(word.get_bits(16..=19)),
            op2,
        }
    }

    /// Bits 7,4 = 1,1 with bits 6-5 = 00: the multiply extension space and
    /// the swaps, split on bits 24-22.
    fn decode_multiply_or_swap(word: u32, condition: Condition) -> Option<Self> {
        let set_flags = word.get_bit(20);
        let rm = Register(word.get_bits(0..=3));
        let rs = Register(word.get_bits(8..=11));
        if word.get_bits(22..=24) == 0 {
            let accumulate = word.get_bit(21);
            let rn = Register(word.get_bits(12..=15));
            if !accumulate && rn.0 != 0 {
                // Should-Be-Zero
                return None;
            }
            Some(Self::Multiply {
                condition,
                accumulate,
                set_flags,
                rd: Register(word.get_bits(16..=19)),
                rm,
                rs,
                rn,
            })
        } else if word.get_bit(23) {
            Some(Self::MultiplyLong {
                condition,
                op: MultiplyLongOp::from(word.get_bits(21..=22)),
                set_flags,
                rdlo: Register(word.get_bits(12..=15)),
                rdhi: Register(word.get_bits(16..=19)),
                rm,
                rs,
            })
        } else {
            if rs.0 != 0 {
                // Should-Be-Zero
                return None;
            }
            Some(Self::Swap {
                condition,
                byte: word.get_bit(22),
                rd: Register(word.get_bits(12..=15)),
                rm,
                rn: Register(word.get_bits(16..=19)),
            })
        }
    }

    fn decode_extra_load_store(word: u32, condition: Condition, oplo: u32) -> Option<Self> {
        let load = word.get_bit(20);
        let op = match (oplo, load) {
            (0b01, false) => ExtraTransfer::Strh,
            (0b01, true) => ExtraTransfer::Ldrh,
            (0b10, false) => ExtraTransfer::Ldrd,
            (0b10, true) => ExtraTransfer::Ldrsb,
            (0b11, false) => ExtraTransfer::Strd,
            (0b11, true) => ExtraTransfer::Ldrsh,
            _ => unreachable!(),
        };
        // the doubleword transfers need an even Rd
        if matches!(op, ExtraTransfer::Ldrd | ExtraTransfer::Strd) && word.get_bit(12) {
            return None;
        }
        Some(Self::ExtraLoadStore {
            condition,
            op,
            rd: Register(word.get_bits(12..=15)),
            address: ExtraAddress::decode(word)?,
        })
    }

    /// The bit-4-set half of the miscellaneous region: BX, BLX register,
    /// CLZ, the saturating arithmetic and BKPT, keyed on bits 6-5 with
    /// bits 22-21 as a secondary opcode.
    fn decode_miscellaneous(word: u32, condition: Condition) -> Option<Self> {
        let ophi = word.get_bits(21..=22);
        match word.get_bits(5..=6) {
            0b00 => match ophi {
                0b01 => {
                    if word.get_bits(8..=19) != 0xFFF {
                        // Should-Be-One
                        return None;
                    }
                    Some(Self::BranchExchange {
                        condition,
                        rm: Register(word.get_bits(0..=3)),
                    })
                }
                0b11 => {
                    if word.get_bits(16..=19) != 0xF || word.get_bits(8..=11) != 0xF {
                        // Should-Be-One
                        return None;
                    }
                    Some(Self::CountLeadingZeros {
                        condition,
                        rd: Register(word.get_bits(12..=15)),
                        rm: Register(word.get_bits(0..=3)),
                    })
                }
                _ => None,
            },
            0b01 => {
                if ophi != 0b01 || word.get_bits(8..=19) != 0xFFF {
                    return None;
                }
                Some(Self::BranchLinkExchangeRegister {
                    condition,
                    rm: Register(word.get_bits(0..=3)),
                })
            }
            0b10 => {
                if word.get_bits(8..=11) != 0 {
                    // Should-Be-Zero
                    return None;
                }
                Some(Self::SaturatingAddSubtract {
                    condition,
                    op: SaturatingOp::from(ophi),
                    rd: Register(word.get_bits(12..=15)),
                    rm: Register(word.get_bits(0..=3)),
                    rn: Register(word.get_bits(16..=19)),
                })
            }
            0b11 => {
                if ophi != 0b01 {
                    return None;
                }
                Some(Self::Breakpoint {
                    immediate: (word.get_bits(8..=19) << 4) | word.get_bits(0..=3),
                })
            }
            _ => unreachable!(),
        }
    }

    /// The bit-7-set, bit-4-clear half of the miscellaneous region: the DSP
    /// halfword multiplies, keyed on bits 22-21 with the `x`/`y` half
    /// selectors at bits 5 and 6.
    fn decode_signed_multiply(word: u32, condition: Condition) -> Option<Self> {
        let x = word.get_bit(5);
        let y = word.get_bit(6);
        let rm = Register(word.get_bits(0..=3));
        let rs = Register(word.get_bits(8..=11));
        let rn = Register(word.get_bits(12..=15));
        let rd = Register(word.get_bits(16..=19));
        let op = match word.get_bits(21..=22) {
            0b00 => SignedMultiplyOp::Smla,
            0b01 => {
                if x {
                    if rn.0 != 0 {
                        // Should-Be-Zero
                        return None;
                    }
                    SignedMultiplyOp::Smulw
                } else {
                    SignedMultiplyOp::Smlaw
                }
            }
            0b10 => SignedMultiplyOp::Smlal,
            0b11 => {
                if rn.0 != 0 {
                    // Should-Be-Zero
                    return None;
                }
                SignedMultiplyOp::Smul
            }
            _ => unreachable!(),
        };
        Some(Self::SignedMultiply {
            condition,
            op,
            x,
            y,
            rd,
            rm,
            rs,
            rn,
        })
    }

    /// MRS and the register form of MSR. Anything else in this corner of
    /// the miscellaneous region is undefined.
    fn decode_status_transfer(word: u32, condition: Condition) -> Option<Self> {
        let psr = PsrKind::from(word.get_bit(22));
        if word.get_bits(0..=11) == 0 && word.get_bits(16..=19) == 0xF {
            Some(Self::ReadStatus {
                condition,
                psr,
                rd: Register(word.get_bits(12..=15)),
            })
        } else if word.get_bits(12..=15) == 0xF && word.get_bits(4..=11) == 0 && word.get_bit(21) {
            Some(Self::WriteStatus {
                condition,
                psr,
                fields: PsrFields(word.get_bits(16..=19)),
                rm: Register(word.get_bits(0..=3)),
            })
        } else {
            None
        }
    }

    /// Class 001: data processing with a rotated immediate, and the
    /// immediate form of MSR hiding in the comparison-with-S-clear space.
    fn decode_immediate_operand(word: u32, condition: Condition) -> Option<Self> {
        let opcode = AluOpcode::from(word.get_bits(21..=24));
        let set_flags = word.get_bit(20);
        if opcode.is_comparison() && !set_flags {
            if word.get_bit(21) && word.get_bits(12..=15) == 0xF {
                let immediate = word.get_bits(0..=7).rotate_right(2 * word.get_bits(8..=11));
                return Some(Self::WriteStatusImmediate {
                    condition,
                    psr: PsrKind::from(word.get_bit(22)),
                    fields: PsrFields(word.get_bits(16..=19)),
                    immediate,
                });
            }
            return None;
        }
        Some(Self::data_processing(
            word,
            condition,
            ShifterOperand::decode_immediate(word),
        ))
    }

    fn decode_load_store(word: u32, condition: Condition, address: TransferAddress) -> Self {
        Self::LoadStore {
            condition,
            load_store: word.get_bit(20).into(),
            byte: word.get_bit(22),
            rd: Register(word.get_bits(12..=15)),
            address,
        }
    }

    fn decode_coprocessor_load_store(word: u32, condition: Option<Condition>) -> Self {
        if word.get_bits(21..=24) == 0b0010 {
            return Self::CoprocessorRegisterPair {
                condition,
                load_store: word.get_bit(20).into(),
                coprocessor: word.get_bits(8..=11),
                opcode: word.get_bits(4..=7),
                rd: Register(word.get_bits(12..=15)),
                rn: Register(word.get_bits(16..=19)),
                crm: word.get_bits(0..=3),
            };
        }
        Self::CoprocessorLoadStore {
            condition,
            load_store: word.get_bit(20).into(),
            long: word.get_bit(22),
            coprocessor: word.get_bits(8..=11),
            crd: word.get_bits(12..=15),
            address: CoprocessorAddress::decode(word),
        }
    }

    fn decode_coprocessor_operation(word: u32, condition: Option<Condition>) -> Self {
        if word.get_bit(4) {
            Self::CoprocessorRegisterTransfer {
                condition,
                load_store: word.get_bit(20).into(),
                coprocessor: word.get_bits(8..=11),
                opcode1: word.get_bits(21..=23),
                rd: Register(word.get_bits(12..=15)),
                crn: word.get_bits(16..=19),
                crm: word.get_bits(0..=3),
                opcode2: word.get_bits(5..=7),
            }
        } else {
            Self::CoprocessorDataOperation {
                condition,
                coprocessor: word.get_bits(8..=11),
                opcode1: word.get_bits(20..=23),
                crd: word.get_bits(12..=15),
                crn: word.get_bits(16..=19),
                crm: word.get_bits(0..=3),
                opcode2: word.get_bits(5..=7),
            }
        }
    }

    /// Render the instruction in assembler syntax. Registers are spelled
    /// `r<n>`; the caller runs the special-register post-pass over the
    /// result.
    #[must_use]
    pub fn disassembler(&self) -> String {
        match self {
            Self::DataProcessing {
                condition,
                opcode,
                set_flags,
                rd,
                rn,
                op2,
            } => {
                let s = if *set_flags { "s" } else { "" };
                if opcode.is_comparison() {
                    format!("{opcode}{condition} {rn}, {op2}")
                } else if opcode.is_unary() {
                    format!("{opcode}{s}{condition} {rd}, {op2}")
                } else {
                    format!("{opcode}{s}{condition} {rd}, {rn}, {op2}")
                }
            }
            Self::Multiply {
                condition,
                accumulate,
                set_flags,
                rd,
                rm,
                rs,
                rn,
            } => {
                let s = if *set_flags { "s" } else { "" };
                if *accumulate {
                    format!("mla{s}{condition} {rd}, {rm}, {rs}, {rn}")
                } else {
                    format!("mul{s}{condition} {rd}, {rm}, {rs}")
                }
            }
            Self::MultiplyLong {
                condition,
                op,
                set_flags,
                rdlo,
                rdhi,
                rm,
                rs,
            } => {
                let s = if *set_flags { "s" } else { "" };
                format!("{op}{s}{condition} {rdlo}, {rdhi}, {rm}, {rs}")
            }
            Self::SignedMultiply {
                condition,
                op,
                x,
                y,
                rd,
                rm,
                rs,
                rn,
            } => {
                let x = half_selector(*x);
                let y = half_selector(*y);
                match op {
                    SignedMultiplyOp::Smla => {
                        format!("smla{x}{y}{condition} {rd}, {rm}, {rs}, {rn}")
                    }
                    SignedMultiplyOp::Smlaw => format!("smlaw{y}{condition} {rd}, {rm}, {rs}, {rn}"),
                    SignedMultiplyOp::Smulw => format!("smulw{y}{condition} {rd}, {rm}, {rs}"),
                    SignedMultiplyOp::Smlal => {
                        format!("smlal{x}{y}{condition} {rn}, {rd}, {rm}, {rs}")
                    }
                    SignedMultiplyOp::Smul => format!("smul{x}{y}{condition} {rd}, {rm}, {rs}"),
                }
            }
            Self::SaturatingAddSubtract {
                condition,
                op,
                rd,
                rm,
                rn,
            } => {
                format!("{op}{condition} {rd}, {rm}, {rn}")
            }
            Self::Swap {
                condition,
                byte,
                rd,
                rm,
                rn,
            } => {
                let b = if *byte { "b" } else { "" };
                format!("swp{b}{condition} {rd}, {rm}, [{rn}]")
            }
            Self::BranchExchange { condition, rm } => format!("bx{condition} {rm}"),
            Self::BranchLinkExchangeRegister { condition, rm } => format!("blx{condition} {rm}"),
            Self::CountLeadingZeros { condition, rd, rm } => {
                format!("clz{condition} {rd}, {rm}")
            }
            Self::Breakpoint { immediate } => format!("bkpt #0x{immediate:X}"),
            Self::ReadStatus { condition, psr, rd } => format!("mrs{condition} {rd}, {psr}"),
            Self::WriteStatus {
                condition,
                psr,
                fields,
                rm,
            } => {
                format!("msr{condition} {psr}_{fields}, {rm}")
            }
            Self::WriteStatusImmediate {
                condition,
                psr,
                fields,
                immediate,
            } => {
                format!("msr{condition} {psr}_{fields}, #0x{immediate:X}")
            }
            Self::ExtraLoadStore {
                condition,
                op,
                rd,
                address,
            } => {
                format!("{op}{condition} {rd}, {address}")
            }
            Self::LoadStore {
                condition,
                load_store,
                byte,
                rd,
                address,
            } => {
                let op = match load_store {
                    LoadStore::Load => "ldr",
                    LoadStore::Store => "str",
                };
                let b = if *byte { "b" } else { "" };
                let t = if address.is_translation() { "t" } else { "" };
                format!("{op}{b}{t}{condition} {rd}, {address}")
            }
            Self::Preload { address } => format!("pld {address}"),
            Self::LoadStoreMultiple {
                condition,
                load_store,
                mode,
                writeback,
                user_registers,
                rn,
                registers,
            } => {
                let op = match load_store {
                    LoadStore::Load => "ldm",
                    LoadStore::Store => "stm",
                };
                let w = if *writeback { "!" } else { "" };
                let s = if *user_registers { "^" } else { "" };
                format!("{op}{condition}{mode} {rn}{w}, {{{registers}}}{s}")
            }
            Self::Branch {
                condition,
                link,
                target,
            } => {
                let l = if *link { "l" } else { "" };
                format!("b{l}{condition} #0x{:X}", *target as u32)
            }
            Self::BranchLinkExchange { target } => format!("blx #0x{:X}", *target as u32),
            Self::SoftwareInterrupt { condition, comment } => {
                format!("swi{condition} #0x{comment:X}")
            }
            Self::CoprocessorLoadStore {
                condition,
                load_store,
                long,
                coprocessor,
                crd,
                address,
            } => {
                let op = match load_store {
                    LoadStore::Load => "ldc",
                    LoadStore::Store => "stc",
                };
                let l = if *long { "l" } else { "" };
                match condition {
                    Some(condition) => {
                        format!("{op}{l}{condition} p{coprocessor}, c{crd}, {address}")
                    }
                    None => format!("{op}2{l} p{coprocessor}, c{crd}, {address}"),
                }
            }
            Self::CoprocessorRegisterPair {
                condition,
                load_store,
                coprocessor,
                opcode,
                rd,
                rn,
                crm,
            } => {
                let op = match load_store {
                    LoadStore::Load => "mrrc",
                    LoadStore::Store => "mcrr",
                };
                let suffix = coprocessor_suffix(*condition);
                format!("{op}{suffix} p{coprocessor}, #0x{opcode:X}, {rd}, {rn}, c{crm}")
            }
            Self::CoprocessorRegisterTransfer {
                condition,
                load_store,
                coprocessor,
                opcode1,
                rd,
                crn,
                crm,
                opcode2,
            } => {
                let op = match load_store {
                    LoadStore::Load => "mrc",
                    LoadStore::Store => "mcr",
                };
                let suffix = coprocessor_suffix(*condition);
                format!(
                    "{op}{suffix} p{coprocessor}, #0x{opcode1:X}, {rd}, c{crn}, c{crm}, #0x{opcode2:X}"
                )
            }
            Self::CoprocessorDataOperation {
                condition,
                coprocessor,
                opcode1,
                crd,
                crn,
                crm,
                opcode2,
            } => {
                let suffix = coprocessor_suffix(*condition);
                format!(
                    "cdp{suffix} p{coprocessor}, #0x{opcode1:X}, c{crd}, c{crn}, c{crm}, #0x{opcode2:X}"
                )
            }
        }
    }
}

/// The `x`/`y` operand-half selector of the DSP multiplies.
const fn half_selector(top: bool) -> char {
    if top { 't' } else { 'b' }
}

/// Condition suffix of the coprocessor mnemonics; the NV space renders as
/// the `2` extension instead.
fn coprocessor_suffix(condition: Option<Condition>) -> String {
    condition.map_or_else(|| "2".to_owned(), |condition| condition.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flags::{Indexing, Offsetting};
    use crate::operand::ExtraOffset;
    use pretty_assertions::assert_eq;

    const ARCH: ArmArch = ArmArch::Armv5Te;

    fn disassemble(word: u32) -> String {
        ArmInstruction::decode(word, ARCH)
            .map(|instruction| instruction.disassembler())
            .unwrap_or_else(|| panic!("word 0x{word:08X} did not decode"))
    }

    #[test]
    fn decode_mov_immediate() {
        let output = ArmInstruction::decode(0xE3A0_0001, ARCH).unwrap();
        assert_eq!(
            output,
            ArmInstruction::DataProcessing {
                condition: Condition::AL,
                opcode: AluOpcode::Mov,
                set_flags: false,
                rd: Register(0),
                rn: Register(0),
                op2: ShifterOperand::Immediate { base: 1, rotate: 0 },
            }
        );
        assert_eq!(output.disassembler(), "mov r0, #0x1");
    }

    #[test]
    fn decode_data_processing_three_operand() {
        assert_eq!(disassemble(0xE082_1003), "add r1, r2, r3");
        assert_eq!(disassemble(0xE092_1003), "adds r1, r2, r3");
        assert_eq!(disassemble(0x1082_1003), "addne r1, r2, r3");
    }

    #[test]
    fn shifter_operand_special_cases() {
        // lsl #0 is omitted
        assert_eq!(disassemble(0xE1A0_0001), "mov r0, r1");
        // lsr #0 renders as lsr #32
        assert_eq!(disassemble(0xE1A0_0021), "mov r0, r1, lsr #32");
        // asr #0 renders as asr #32
        assert_eq!(disassemble(0xE1A0_0041), "mov r0, r1, asr #32");
        // ror #0 renders as rrx
        assert_eq!(disassemble(0xE1A0_0061), "mov r0, r1, rrx");
        // plain immediate shift
        assert_eq!(disassemble(0xE1A0_0181), "mov r0, r1, lsl #3");
    }

    #[test]
    fn comparison_register_shift_has_no_destination() {
        assert_eq!(disassemble(0xE111_0312), "tst r1, r2, lsl r3");
        assert_eq!(disassemble(0xE151_0312), "cmp r1, r2, lsl r3");
    }

    #[test]
    fn comparison_without_s_is_not_recognized() {
        // tst with S=0 outside the MSR patterns
        assert_eq!(ArmInstruction::decode(0xE300_0001, ARCH), None);
    }

    #[test]
    fn decode_multiply() {
        assert_eq!(disassemble(0xE001_0392), "mul r1, r2, r3");
        assert_eq!(disassemble(0xE011_0392), "muls r1, r2, r3");
        assert_eq!(disassemble(0xE021_4392), "mla r1, r2, r3, r4");
        // MUL with a nonzero accumulate field is unpredictable
        assert_eq!(ArmInstruction::decode(0xE001_4392, ARCH), None);
    }

    #[test]
    fn decode_multiply_long() {
        assert_eq!(disassemble(0xE082_1493), "umull r1, r2, r3, r4");
        assert_eq!(disassemble(0xE0E2_1493), "smlal r1, r2, r3, r4");
    }

    #[test]
    fn decode_swap() {
        let output = ArmInstruction::decode(0xE103_1092, ARCH).unwrap();
        assert_eq!(
            output,
            ArmInstruction::Swap {
                condition: Condition::AL,
                byte: false,
                rd: Register(1),
                rm: Register(2),
                rn: Register(3),
            }
        );
        assert_eq!(output.disassembler(), "swp r1, r2, [r3]");
        assert_eq!(disassemble(0xE143_1092), "swpb r1, r2, [r3]");
        // bits 11-8 are Should-Be-Zero
        assert_eq!(ArmInstruction::decode(0xE103_1192, ARCH), None);
    }

    #[test]
    fn decode_branch_exchange() {
        let output = ArmInstruction::decode(0xE12F_FF1E, ARCH).unwrap();
        assert_eq!(
            output,
            ArmInstruction::BranchExchange {
                condition: Condition::AL,
                rm: Register(14),
            }
        );
        assert_eq!(output.disassembler(), "bx r14");
        assert_eq!(disassemble(0x012F_FF12), "bxeq r2");
        assert_eq!(disassemble(0xE12F_FF32), "blx r2");
        // bits 19-8 are Should-Be-One
        assert_eq!(ArmInstruction::decode(0xE12F_0F1E, ARCH), None);
    }

    #[test]
    fn decode_count_leading_zeros() {
        assert_eq!(disassemble(0xE16F_0F11), "clz r0, r1");
        assert_eq!(ArmInstruction::decode(0xE160_0F11, ARCH), None);
        assert_eq!(ArmInstruction::decode(0xE16F_0011, ARCH), None);
    }

    #[test]
    fn decode_breakpoint() {
        // bkpt #0x1234: immediate split across bits 19-8 and 3-0
        assert_eq!(disassemble(0xE121_2374), "bkpt #0x1234");
    }

    #[test]
    fn decode_saturating_arithmetic() {
        assert_eq!(disassemble(0xE103_0052), "qadd r0, r2, r3");
        assert_eq!(disassemble(0xE163_0052), "qdsub r0, r2, r3");
        // bits 11-8 are Should-Be-Zero
        assert_eq!(ArmInstruction::decode(0xE103_0152, ARCH), None);
    }

    #[test]
    fn decode_signed_multiplies() {
        // smlabb r1, r2, r3, r4
        assert_eq!(disassemble(0xE101_4382), "smlabb r1, r2, r3, r4");
        // smlatt r1, r2, r3, r4
        assert_eq!(disassemble(0xE101_43E2), "smlatt r1, r2, r3, r4");
        // smulwb r1, r2, r3
        assert_eq!(disassemble(0xE121_03A2), "smulwb r1, r2, r3");
        // smlawt r1, r2, r3, r4
        assert_eq!(disassemble(0xE121_43C2), "smlawt r1, r2, r3, r4");
        // smlalbt r1, r2, r3, r4
        assert_eq!(disassemble(0xE142_14C3), "smlalbt r1, r2, r3, r4");
        // smultt r1, r2, r3
        assert_eq!(disassemble(0xE161_03E2), "smultt r1, r2, r3");
        // smul with a nonzero Rn field is Should-Be-Zero
        assert_eq!(ArmInstruction::decode(0xE161_43E2, ARCH), None);
    }

    #[test]
    fn decode_status_register_transfers() {
        assert_eq!(disassemble(0xE10F_1000), "mrs r1, cpsr");
        assert_eq!(disassemble(0xE14F_1000), "mrs r1, spsr");
        assert_eq!(disassemble(0xE129_F001), "msr cpsr_fc, r1");
        assert_eq!(disassemble(0xE169_F001), "msr spsr_fc, r1");
        assert_eq!(disassemble(0xE329_F001), "msr cpsr_fc, #0x1");
        assert_eq!(disassemble(0xE328_F10F), "msr cpsr_f, #0xC0000003");
    }

    #[test]
    fn decode_extra_load_store() {
        let output = ArmInstruction::decode(0xE1C1_01B0, ARCH).unwrap();
        assert_eq!(
            output,
            ArmInstruction::ExtraLoadStore {
                condition: Condition::AL,
                op: ExtraTransfer::Strh,
                rd: Register(0),
                address: ExtraAddress {
                    base: Register(1),
                    offset: ExtraOffset::Immediate(0x10),
                    offsetting: Offsetting::Up,
                    indexing: Indexing::Pre,
                    writeback: false,
                },
            }
        );
        assert_eq!(output.disassembler(), "strh r0, [r1, #+0x10]");

        assert_eq!(disassemble(0xE1D1_00B0), "ldrh r0, [r1, #+0x0]");
        assert_eq!(disassemble(0xE1D1_00D4), "ldrsb r0, [r1, #+0x4]");
        assert_eq!(disassemble(0xE1D1_00F4), "ldrsh r0, [r1, #+0x4]");
        assert_eq!(disassemble(0xE1C1_00D8), "ldrd r0, [r1, #+0x8]");
        assert_eq!(disassemble(0xE1C1_00F8), "strd r0, [r1, #+0x8]");
        // register offset, post-indexed, down
        assert_eq!(disassemble(0xE011_00B2), "ldrh r0, [r1], -r2");
        // doubleword with odd Rd is undefined
        assert_eq!(ArmInstruction::decode(0xE1C1_10D8, ARCH), None);
        // post-indexed with W set is unpredictable
        assert_eq!(ArmInstruction::decode(0xE0E1_01B0, ARCH), None);
    }

    #[test]
    fn decode_load_store_word_byte() {
        assert_eq!(disassemble(0xE591_0004), "ldr r0, [r1, #+0x4]");
        assert_eq!(disassemble(0xE511_0004), "ldr r0, [r1, #-0x4]");
        assert_eq!(disassemble(0xE5B1_0004), "ldr r0, [r1, #+0x4]!");
        assert_eq!(disassemble(0xE5C1_0004), "strb r0, [r1, #+0x4]");
        assert_eq!(disassemble(0xE491_0004), "ldr r0, [r1], #+0x4");
        // post-indexed with W selects the translation forms
        assert_eq!(disassemble(0xE4B1_0004), "ldrt r0, [r1], #+0x4");
        assert_eq!(disassemble(0xE4E1_0004), "strbt r0, [r1], #+0x4");
        // register offset with a scaled index
        assert_eq!(disassemble(0xE711_0222), "ldr r0, [r1, -r2, lsr #4]");
        assert_eq!(disassemble(0xE791_0002), "ldr r0, [r1, r2]");
        // bit 4 set in the register-offset space is undefined
        assert_eq!(ArmInstruction::decode(0xE791_0012, ARCH), None);
    }

    #[test]
    fn decode_block_transfer() {
        let output = ArmInstruction::decode(0xE92D_4010, ARCH).unwrap();
        assert_eq!(
            output,
            ArmInstruction::LoadStoreMultiple {
                condition: Condition::AL,
                load_store: LoadStore::Store,
                mode: BlockMode::Db,
                writeback: true,
                user_registers: false,
                rn: Register(13),
                registers: RegisterList(0x4010),
            }
        );
        assert_eq!(output.disassembler(), "stmdb r13!, {r4,r14}");
        assert_eq!(disassemble(0xE8BD_4010), "ldmia r13!, {r4,r14}");
        assert_eq!(disassemble(0xE9C0_0006), "stmib r0, {r1,r2}^");
    }

    #[test]
    fn decode_branches() {
        assert_eq!(disassemble(0xEAFF_FFFE), "b #0x0");
        assert_eq!(disassemble(0xEB00_0000), "bl #0x8");
        assert_eq!(disassemble(0x0A00_000F), "beq #0x44");
        // NV re-encodes as BLX immediate, the H bit adding 2
        assert_eq!(disassemble(0xFA00_0000), "blx #0x8");
        assert_eq!(disassemble(0xFB00_0000), "blx #0xA");
    }

    #[test]
    fn nv_space_requires_v5() {
        assert_eq!(ArmInstruction::decode(0xFA00_0000, ArmArch::Armv4T), None);
        assert_eq!(ArmInstruction::decode(0xF5D1_F004, ArmArch::Armv4T), None);
    }

    #[test]
    fn decode_software_interrupt() {
        assert_eq!(disassemble(0xEF00_0042), "swi #0x42");
        assert_eq!(disassemble(0x1F00_0042), "swine #0x42");
        // SWI has no NV form
        assert_eq!(ArmInstruction::decode(0xFF00_0042, ARCH), None);
    }

    #[test]
    fn decode_preload() {
        assert_eq!(disassemble(0xF5D1_F004), "pld [r1, #+0x4]");
        assert_eq!(disassemble(0xF551_F004), "pld [r1, #-0x4]");
        assert_eq!(disassemble(0xF7D1_F002), "pld [r1, r2]");
        assert_eq!(disassemble(0xF751_F222), "pld [r1, -r2, lsr #4]");
    }

    #[test]
    fn decode_coprocessor_load_store() {
        assert_eq!(disassemble(0xED91_0500), "ldc p5, c0, [r1, #+0x0]");
        assert_eq!(disassemble(0xEDD1_0501), "ldcl p5, c0, [r1, #+0x4]");
        assert_eq!(disassemble(0xED81_0501), "stc p5, c0, [r1, #+0x4]");
        // post-indexed and unindexed forms
        assert_eq!(disassemble(0xECB1_0501), "ldc p5, c0, [r1], #+0x4");
        assert_eq!(disassemble(0xEC91_0501), "ldc p5, c0, [r1], {0x1}");
        // NV selects the 2 forms, the length suffix moving after the 2
        assert_eq!(disassemble(0xFD91_0500), "ldc2 p5, c0, [r1, #+0x0]");
        assert_eq!(disassemble(0xFDD1_0500), "ldc2l p5, c0, [r1, #+0x0]");
    }

    #[test]
    fn decode_coprocessor_register_transfers() {
        assert_eq!(disassemble(0xEE01_0F11), "mcr p15, #0x0, r0, c1, c1, #0x0");
        assert_eq!(disassemble(0xEE11_0F11), "mrc p15, #0x0, r0, c1, c1, #0x0");
        assert_eq!(disassemble(0xFE11_0F11), "mrc2 p15, #0x0, r0, c1, c1, #0x0");
        assert_eq!(disassemble(0xEC42_1503), "mcrr p5, #0x0, r1, r2, c3");
        assert_eq!(disassemble(0xEC52_1503), "mrrc p5, #0x0, r1, r2, c3");
        assert_eq!(disassemble(0xFC42_1503), "mcrr2 p5, #0x0, r1, r2, c3");
    }

    #[test]
    fn decode_coprocessor_data_operation() {
        assert_eq!(disassemble(0xEE11_0102), "cdp p1, #0x1, c0, c1, c2, #0x0");
        assert_eq!(disassemble(0xFE11_0102), "cdp2 p1, #0x1, c0, c1, c2, #0x0");
    }

    #[test]
    fn condition_suffix_follows_the_s_flag() {
        assert_eq!(disassemble(0x1091_0002), "addsne r0, r1, r2");
    }

    #[test]
    fn conditional_forms() {
        assert_eq!(disassemble(0x3A00_0000), "bcc #0x8");
        assert_eq!(disassemble(0xD3A0_0001), "movle r0, #0x1");
    }
}
