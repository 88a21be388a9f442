use ethereum_types::H256;
use serde::{Deserialize, Serialize};
use typenum::U1;

use crate::{
    error::Error,
    merkle_tree::{depth_for_chunks, merkleize_chunks, mix_in_length},
    porcelain::SszHash,
};

/// A byte list of votes, one bit per committee member, least significant bit first.
#[derive(Clone, PartialEq, Eq, Hash, Default, Debug, Deserialize, Serialize)]
#[serde(transparent)]
pub struct Bitfield(#[serde(with = "hex::serde")] Vec<u8>);

impl From<Vec<u8>> for Bitfield {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for Bitfield {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl SszHash for Bitfield {
    type PackingFactor = U1;

    fn hash_tree_root(&self) -> H256 {
        let chunks = u8::chunks(&self.0);
        let depth = depth_for_chunks(chunks.len());
        mix_in_length(merkleize_chunks(chunks, depth), self.0.len())
    }
}

impl Bitfield {
    /// Creates a bitfield with room for `bit_count` bits, all unset.
    #[must_use]
    pub fn with_length(bit_count: usize) -> Self {
        Self(vec![0; bit_count.div_ceil(8)])
    }

    #[must_use]
    pub fn from_bits(bits: impl IntoIterator<Item = bool>) -> Self {
        let mut bytes = vec![];

        for (position, bit) in bits.into_iter().enumerate() {
            if position % 8 == 0 {
                bytes.push(0);
            }

            if bit {
                if let Some(byte) = bytes.last_mut() {
                    *byte |= 1 << (position % 8);
                }
            }
        }

        Self(bytes)
    }

    /// Sets the bit at `position`.
    ///
    /// # Panics
    ///
    /// Panics if `position` is not covered by the stored bytes.
    pub fn set(&mut self, position: usize) {
        self.0[position / 8] |= 1 << (position % 8);
    }

    /// Bits beyond the stored bytes read as unset.
    #[must_use]
    pub fn has_voted(&self, position: usize) -> bool {
        self.0
            .get(position / 8)
            .is_some_and(|byte| (byte >> (position % 8)) & 1 == 1)
    }

    /// Checks that the bitfield describes exactly `bit_count` bits.
    pub fn validate(&self, bit_count: usize) -> Result<(), Error> {
        let expected = bit_count.div_ceil(8);
        let actual = self.0.len();

        if actual != expected {
            return Err(Error::BitfieldLengthMismatch { expected, actual });
        }

        let padding_set = (bit_count..expected * 8).any(|position| self.has_voted(position));

        if padding_set {
            return Err(Error::BitfieldPaddingSet { bit_count });
        }

        Ok(())
    }

    #[must_use]
    pub fn byte_len(&self) -> usize {
        self.0.len()
    }

    pub fn set_positions(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.0.len() * 8).filter(|position| self.has_voted(*position))
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use test_case::test_case;

    use super::*;

    #[test]
    fn bits_are_stored_least_significant_first() {
        let bitfield = Bitfield::from_bits([true, false, true, true]);

        assert_eq!(bitfield.as_ref(), [0b1101]);
        assert!(bitfield.has_voted(0));
        assert!(!bitfield.has_voted(1));
        assert!(bitfield.has_voted(2));
        assert!(bitfield.has_voted(3));
        assert!(!bitfield.has_voted(100));
    }

    #[test]
    fn set_matches_from_bits() {
        let mut bitfield = Bitfield::with_length(10);
        bitfield.set(9);

        let mut bits = [false; 10];
        bits[9] = true;

        assert_eq!(bitfield, Bitfield::from_bits(bits));
        assert_eq!(bitfield.set_positions().collect::<Vec<_>>(), [9]);
    }

    #[test_case(4, vec![0b1011] => Ok(()))]
    #[test_case(8, vec![0xff] => Ok(()))]
    #[test_case(9, vec![0xff, 0x01] => Ok(()))]
    #[test_case(0, vec![] => Ok(()))]
    #[test_case(4, vec![] => Err(Error::BitfieldLengthMismatch { expected: 1, actual: 0 }))]
    #[test_case(8, vec![0, 0] => Err(Error::BitfieldLengthMismatch { expected: 1, actual: 2 }))]
    #[test_case(4, vec![0b1_0000] => Err(Error::BitfieldPaddingSet { bit_count: 4 }))]
    fn validate_checks_length_and_padding(bit_count: usize, bytes: Vec<u8>) -> Result<(), Error> {
        Bitfield::from(bytes).validate(bit_count)
    }

    #[test]
    fn serializes_as_hex() -> Result<()> {
        let bitfield = Bitfield::from(vec![0x0b, 0xff]);
        let json = serde_json::to_string(&bitfield)?;

        assert_eq!(json, r#""0bff""#);
        assert_eq!(serde_json::from_str::<Bitfield>(&json)?, bitfield);

        Ok(())
    }
}
