// SPDX-License-Identifier: MIT

//! Bit-level helpers over byte slices.
//!
//! Bit `i` lives in byte `i / 8` at position `i % 8`, least significant bit
//! first. This is the order of the on-disk block bitmap.

pub trait BitmapOps {
    /// Sets or clears bit `bit`. Out of range bits are ignored.
    fn set_bit(&mut self, bit: usize, value: bool);

    /// Value of bit `bit`; `false` when out of range.
    fn get_bit(&self, bit: usize) -> bool;

    /// Number of set bits in `[start, end)`.
    fn count_ones_in_range(&self, start: usize, end: usize) -> usize;

    /// First clear bit at or after `start`.
    fn find_first_zero(&self, start: usize) -> Option<usize>;

    /// Number of set bits in the whole slice.
    fn count_ones(&self) -> usize;
}

/// Position of `bit` as `(byte index, mask)`.
#[inline(always)]
pub fn bit_position(bit: usize) -> (usize, u8) {
    (bit / 8, 1u8 << (bit % 8))
}

impl BitmapOps for [u8] {
    #[inline]
    fn set_bit(&mut self, bit: usize, value: bool) {
        let (idx, mask) = bit_position(bit);
        let Some(byte) = self.get_mut(idx) else {
            return;
        };
        if value {
            *byte |= mask;
        } else {
            *byte &= !mask;
        }
    }

    #[inline]
    fn get_bit(&self, bit: usize) -> bool {
        let (idx, mask) = bit_position(bit);
        self.get(idx).is_some_and(|b| b & mask != 0)
    }

    fn count_ones_in_range(&self, start: usize, end: usize) -> usize {
        let end = end.min(self.len() * 8);
        (start..end).filter(|&i| self.get_bit(i)).count()
    }

    fn find_first_zero(&self, start: usize) -> Option<usize> {
        let first_byte = start / 8;
        for (idx, &byte) in self.iter().enumerate().skip(first_byte) {
            if byte == 0xFF {
                continue;
            }
            let from = if idx == first_byte { start % 8 } else { 0 };
            if let Some(bit) = (from..8).find(|b| byte & (1 << b) == 0) {
                return Some(idx * 8 + bit);
            }
        }
        None
    }

    fn count_ones(&self) -> usize {
        self.iter().map(|b| b.count_ones() as usize).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lsb_first_order() {
        let mut bitmap = [0u8; 2];
        bitmap.set_bit(0, true);
        bitmap.set_bit(9, true);
        assert_eq!(bitmap, [0b0000_0001, 0b0000_0010]);

        // Same rule as `(byte >> (i % 8)) & 1`.
        for i in 0..16 {
            let expected = (bitmap[i / 8] >> (i % 8)) & 1 == 1;
            assert_eq!(bitmap.get_bit(i), expected, "bit {i}");
        }

        bitmap.set_bit(0, false);
        assert_eq!(bitmap[0], 0);
    }

    #[test]
    fn test_out_of_range() {
        let mut bitmap = [0u8; 1];
        bitmap.set_bit(8, true);
        assert_eq!(bitmap, [0]);
        assert!(!bitmap.get_bit(64));
    }

    #[test]
    fn test_counts() {
        let bitmap = [0b1000_0001u8, 0xFF, 0b0000_0110];
        assert_eq!(bitmap.count_ones(), 12);
        assert_eq!(bitmap.count_ones_in_range(0, 8), 2);
        assert_eq!(bitmap.count_ones_in_range(16, 100), 2);
    }

    #[test]
    fn test_find_first_zero() {
        let bitmap = [0xFFu8, 0b0000_0111, 0];
        assert_eq!(bitmap.find_first_zero(0), Some(11));
        assert_eq!(bitmap.find_first_zero(12), Some(12));
        assert_eq!([0xFFu8; 3].find_first_zero(0), None);
        assert_eq!([0u8; 1].find_first_zero(9), None);
    }
}
