//! Register operand rendering.
//!
//! Formatters always emit the plain `r<n>` spelling; the post-pass in
//! [`crate::alias`] rewrites `r13`/`r14`/`r15` to `sp`/`lr`/`pc` once the
//! whole line is assembled. The only aliasing done at this stage is the
//! pc/lr slot of the Thumb push/pop register list, which has no numeric
//! spelling in the encoding. `r12` is deliberately not aliased to `ip`.

use serde::{Deserialize, Serialize};

use crate::bitwise::Bits;

/// A general-purpose register operand (r0-r15).
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Register(pub u32);

impl From<u32> for Register {
    fn from(index: u32) -> Self {
        Self(index)
    }
}

impl From<u16> for Register {
    fn from(index: u16) -> Self {
        Self(u32::from(index))
    }
}

impl Register {
    /// The stack pointer, r13.
    pub const SP: Self = Self(13);
}

impl std::fmt::Display for Register {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "r{}", self.0)
    }
}

/// The 16-bit register mask of an ARM-mode load/store multiple.
///
/// Renders low-to-high as a comma separated sequence with no spaces,
/// e.g. `r0,r4,r14`.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct RegisterList(pub u16);

impl RegisterList {
    #[must_use]
    pub const fn count(self) -> u32 {
        self.0.count_ones()
    }

    /// Whether the register with the given index is in the list.
    #[must_use]
    pub const fn contains(self, index: u32) -> bool {
        index < 16 && (self.0 >> index) & 1 != 0
    }
}

impl std::fmt::Display for RegisterList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for i in 0..16 {
            if self.0.get_bit(i) {
                if !first {
                    f.write_str(",")?;
                }
                write!(f, "r{i}")?;
                first = false;
            }
        }
        Ok(())
    }
}

/// What bit 8 of a Thumb register list stands for.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum HighSlot {
    /// POP: bit 8 is the program counter.
    Pc,
    /// PUSH: bit 8 is the link register.
    Lr,
}

/// The 9-bit register mask of the Thumb push/pop and load/store multiple
/// encodings. Bit 8 renders as `pc` or `lr` depending on context and is
/// unused for LDMIA/STMIA.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ThumbRegisterList {
    pub mask: u16,
    pub high: Option<HighSlot>,
}

impl ThumbRegisterList {
    /// List for PUSH/POP: the low 9 bits of the half-word.
    #[must_use]
    pub fn push_pop(mask: u16, high: HighSlot) -> Self {
        Self {
            mask: mask & 0x1FF,
            high: Some(high),
        }
    }

    /// List for LDMIA/STMIA: 8 bits, no special slot.
    #[must_use]
    pub fn plain(mask: u16) -> Self {
        Self {
            mask: mask & 0xFF,
            high: None,
        }
    }

    /// Population count; a count of zero makes the instruction
    /// unpredictable and the decoders suppress it.
    #[must_use]
    pub const fn count(self) -> u32 {
        self.mask.count_ones()
    }

    #[must_use]
    pub const fn contains(self, index: u32) -> bool {
        index < 9 && (self.mask >> index) & 1 != 0
    }
}

impl std::fmt::Display for ThumbRegisterList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for i in 0..8 {
            if self.mask.get_bit(i) {
                if !first {
                    f.write_str(",")?;
                }
                write!(f, "r{i}")?;
                first = false;
            }
        }
        if self.mask.get_bit(8) {
            if let Some(high) = self.high {
                if !first {
                    f.write_str(",")?;
                }
                f.write_str(match high {
                    HighSlot::Pc => "pc",
                    HighSlot::Lr => "lr",
                })?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn plain_register_names() {
        assert_eq!(Register(0).to_string(), "r0");
        assert_eq!(Register(12).to_string(), "r12");
        assert_eq!(Register(15).to_string(), "r15");
    }

    #[test]
    fn arm_list_is_comma_separated() {
        assert_eq!(RegisterList(0x4010).to_string(), "r4,r14");
        assert_eq!(RegisterList(0x0007).to_string(), "r0,r1,r2");
        assert_eq!(RegisterList(0x8000).to_string(), "r15");
        assert_eq!(RegisterList(0).to_string(), "");
    }

    #[test]
    fn arm_list_count() {
        assert_eq!(RegisterList(0x4010).count(), 2);
        assert!(RegisterList(0x4010).contains(14));
        assert!(!RegisterList(0x4010).contains(0));
    }

    #[test]
    fn thumb_push_list_names_lr() {
        let list = ThumbRegisterList::push_pop(0x110, HighSlot::Lr);
        assert_eq!(list.to_string(), "r4,lr");
        assert_eq!(list.count(), 2);
    }

    #[test]
    fn thumb_pop_list_names_pc() {
        let list = ThumbRegisterList::push_pop(0x101, HighSlot::Pc);
        assert_eq!(list.to_string(), "r0,pc");
    }

    #[test]
    fn thumb_plain_list_ignores_bit_8() {
        let list = ThumbRegisterList::plain(0x1A0);
        assert_eq!(list.to_string(), "r5,r7");
        assert_eq!(list.count(), 2);
    }

    #[test]
    fn empty_list_counts_zero() {
        assert_eq!(ThumbRegisterList::plain(0).count(), 0);
    }
}
