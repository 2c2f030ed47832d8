//! # ARM-Mode Decoding (32-bit)
//!
//! Fixed-width 32-bit instruction words. Bits 27-25 select the top-level
//! class; the densely packed class 000 is further disambiguated by bits 7
//! and 4 and several should-be-zero/one fields.

#[allow(clippy::cast_possible_truncation)]
#[allow(clippy::cast_possible_wrap)]
#[allow(clippy::cast_sign_loss)]
#[allow(clippy::too_many_lines)]
pub mod instruction;
