// SPDX-License-Identifier: MIT

use crate::{ImageIO, ImageIOResult};

/// In-memory implementation of `ImageIO`.
///
/// Wraps a borrowed byte slice holding the whole image. Used by the CLI once
/// the image file has been loaded, and by tests.
#[derive(Debug, Clone, Copy)]
pub struct MemImageIO<'a> {
    buffer: &'a [u8],
}

impl<'a> MemImageIO<'a> {
    #[inline]
    pub fn new(buffer: &'a [u8]) -> Self {
        Self { buffer }
    }

    /// Borrowed view of the whole image.
    #[inline]
    pub fn as_bytes(&self) -> &'a [u8] {
        self.buffer
    }
}

impl<'a> ImageIO for MemImageIO<'a> {
    #[inline(always)]
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> ImageIOResult {
        self.check_bounds(offset, buf.len())?;
        let start = offset as usize;
        buf.copy_from_slice(&self.buffer[start..start + buf.len()]);
        Ok(())
    }

    #[inline]
    fn len(&self) -> u64 {
        self.buffer.len() as u64
    }
}
