use serde::{Deserialize, Serialize};

/// Architecture profile selector.
///
/// Only the 32-bit legacy profiles with Thumb support are represented.
/// The ordering matters: `Armv5Te >= Armv4T` gates the Thumb version 2
/// instruction forms and the ARM v5 extensions (BLX, PLD, the coprocessor
/// `2` variants). The profile is supplied per decode call and carries no
/// state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ArmArch {
    /// ARM v4, Thumb v1.
    Armv4T,
    /// ARM v5, Thumb v2. Adds the DSP enhancement and BLX.
    Armv5Te,
    /// ARM v6, Thumb v3. Its additions stay outside the decode path.
    Armv6,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_ordering() {
        assert!(ArmArch::Armv5Te >= ArmArch::Armv4T);
        assert!(ArmArch::Armv6 >= ArmArch::Armv5Te);
        assert!(ArmArch::Armv4T < ArmArch::Armv5Te);
    }
}
