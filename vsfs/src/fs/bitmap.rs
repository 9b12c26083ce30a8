// SPDX-License-Identifier: MIT

use vsio::prelude::*;

use crate::core::errors::FsParsingResult;
use crate::core::utils::bitmap::BitmapOps;
use crate::fs::constant::BSIZE;
use crate::fs::meta::VsfsMeta;

/// Owned copy of the on-disk free-block bitmap.
#[derive(Debug, Clone)]
pub struct BlockBitmap {
    bytes: Vec<u8>,
    total_blocks: u32,
}

impl BlockBitmap {
    pub fn load<IO: ImageIO + ?Sized>(io: &mut IO, meta: &VsfsMeta) -> FsParsingResult<Self> {
        let mut bytes = vec![0u8; meta.bitmap_len()];
        let (offset, _) = meta.bit_of(0);
        io.read_in_chunks(offset, &mut bytes, BSIZE)?;
        Ok(Self {
            bytes,
            total_blocks: meta.total_blocks,
        })
    }

    /// Bit for `block`; blocks past the image read as free.
    #[inline]
    pub fn is_allocated(&self, block: u32) -> bool {
        block < self.total_blocks && self.bytes.get_bit(block as usize)
    }

    pub fn allocated_count(&self) -> usize {
        self.bytes.count_ones_in_range(0, self.total_blocks as usize)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_lsb_first() {
        let meta = VsfsMeta::new(64, 8);
        let mut img = vec![0u8; meta.required_len() as usize];
        let (off, _) = meta.bit_of(0);
        img[off as usize] = 0b0000_0101;
        img[off as usize + 7] = 0b1000_0000;

        let mut io = MemImageIO::new(&img);
        let bitmap = BlockBitmap::load(&mut io, &meta).unwrap();

        assert!(bitmap.is_allocated(0));
        assert!(!bitmap.is_allocated(1));
        assert!(bitmap.is_allocated(2));
        assert!(bitmap.is_allocated(63));
        assert!(!bitmap.is_allocated(64));
        assert_eq!(bitmap.allocated_count(), 3);
    }
}
