//! Flat bitset over the padded voxel lattice.

use bitvec::prelude::{BitVec, Msb0};
use kerf_core::{Error, Result};

/// One bit per voxel, packed eight to a byte with the first voxel in the
/// most significant bit. The packed bytes are the on-disk representation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VoxelBits {
    bits: BitVec<u8, Msb0>,
}

impl VoxelBits {
    /// A bitset of `len` bits, all set to `value`.
    pub fn repeat(value: bool, len: usize) -> Self {
        Self {
            bits: BitVec::repeat(value, len),
        }
    }

    /// Rebuild from packed bytes. Extra trailing bits in the last byte are
    /// ignored; too few bytes is an error.
    pub fn from_packed(bytes: Vec<u8>, len: usize) -> Result<Self> {
        let needed = len.div_ceil(8);
        if bytes.len() < needed {
            return Err(Error::InvalidData(format!(
                "{} packed bytes cannot hold {len} voxels",
                bytes.len()
            )));
        }
        let mut bits = BitVec::<u8, Msb0>::from_vec(bytes);
        bits.truncate(len);
        Ok(Self { bits })
    }

    /// Packed bytes, unused bits of the last byte cleared.
    pub fn to_packed(&self) -> Vec<u8> {
        let mut bytes = self.bits.as_raw_slice().to_vec();
        let dead = bytes.len() * 8 - self.bits.len();
        if let Some(last) = bytes.last_mut() {
            if dead > 0 {
                *last &= 0xffu8 << dead;
            }
        }
        bytes
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// Bit at `offset`. Panics past the end.
    #[inline]
    pub fn get(&self, offset: usize) -> bool {
        self.bits[offset]
    }

    #[inline]
    pub fn set(&mut self, offset: usize, value: bool) {
        self.bits.set(offset, value);
    }

    /// Store `value` and return the previous bit.
    #[inline]
    pub fn replace(&mut self, offset: usize, value: bool) -> bool {
        self.bits.replace(offset, value)
    }

    /// Set every bit to `value`
    pub fn fill(&mut self, value: bool) {
        self.bits.fill(value);
    }

    /// Number of set bits
    pub fn count_ones(&self) -> usize {
        self.bits.count_ones()
    }

    /// Offsets of all set bits
    pub fn iter_ones(&self) -> impl Iterator<Item = usize> + '_ {
        self.bits.iter_ones()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_bit_is_most_significant() {
        let mut bits = VoxelBits::repeat(false, 16);
        bits.set(0, true);
        bits.set(9, true);
        assert_eq!(bits.to_packed(), vec![0x80, 0x40]);
    }

    #[test]
    fn unused_tail_bits_are_cleared() {
        let bits = VoxelBits::repeat(true, 11);
        assert_eq!(bits.to_packed(), vec![0xff, 0xe0]);
    }

    #[test]
    fn from_packed_ignores_tail() {
        let bits = VoxelBits::from_packed(vec![0b1010_0000, 0xff], 10).unwrap();
        assert_eq!(bits.len(), 10);
        assert!(bits.get(0));
        assert!(!bits.get(1));
        assert!(bits.get(2));
        assert!(bits.get(8));
        assert!(bits.get(9));
        assert_eq!(bits.count_ones(), 4);
    }

    #[test]
    fn from_packed_rejects_short_input() {
        assert!(matches!(
            VoxelBits::from_packed(vec![0; 2], 17),
            Err(Error::InvalidData(_))
        ));
    }

    #[test]
    fn replace_reports_previous_value() {
        let mut bits = VoxelBits::repeat(false, 4);
        assert!(!bits.replace(2, true));
        assert!(bits.replace(2, true));
        assert_eq!(bits.iter_ones().collect::<Vec<_>>(), vec![2]);
    }
}
