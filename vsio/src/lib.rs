// SPDX-License-Identifier: MIT
#![cfg_attr(not(feature = "std"), no_std)]

// Core modules
pub mod errors;
pub mod stats;

// Backend modules
#[cfg(feature = "mem")]
mod mem;

#[cfg(feature = "std")]
mod std;

// Prelude re-exports (central entrypoint)
pub mod prelude {
    pub use super::ImageIO;
    pub use super::ImageIOExt;
    pub use super::ImageIOStructExt;
    pub use super::errors::*;
    pub use super::stats::*;

    #[cfg(feature = "mem")]
    pub use super::mem::MemImageIO;

    #[cfg(feature = "std")]
    pub use super::std::StdImageIO;
}

// Internal use
use errors::*;

// Constants

/// Maximum size of internal scratch buffer (used for chunked and struct reads).
/// 4 KiB = typical page size, several image blocks at once.
pub const BLOCK_BUF_SIZE: usize = 4096;

// Traits

/// Read-only image access trait.
///
/// An image is an immutable byte sequence of known length. Every read is
/// bounds-checked against that length: a read running past the end fails with
/// [`ImageIOError::OutOfBounds`] instead of returning short data.
/// No mutation operation is exposed.
pub trait ImageIO {
    /// Reads `buf.len()` bytes into `buf` from `offset` (absolute).
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> ImageIOResult;

    /// Total image length in bytes.
    fn len(&self) -> u64;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Fails with `OutOfBounds` unless `[offset, offset + len)` lies inside the image.
    #[inline]
    fn check_bounds(&self, offset: u64, len: usize) -> ImageIOResult {
        let end = offset
            .checked_add(len as u64)
            .ok_or(ImageIOError::OutOfBounds { offset, len })?;
        if end > self.len() {
            return Err(ImageIOError::OutOfBounds { offset, len });
        }
        Ok(())
    }
}

/// Extension helpers for ImageIO.
///
/// Provides chunked reads and whole-block reads.
pub trait ImageIOExt: ImageIO {
    /// Reads `buf.len()` bytes from `offset` in chunks of `chunk_size` or less.
    #[inline(always)]
    fn read_in_chunks(&mut self, offset: u64, buf: &mut [u8], chunk_size: usize) -> ImageIOResult {
        if chunk_size == 0 {
            return Err(ImageIOError::Other("read_in_chunks: chunk_size == 0"));
        }
        self.check_bounds(offset, buf.len())?;

        let mut remaining = buf.len();
        let mut off = offset;
        let mut pos = 0;

        while remaining > 0 {
            let to_read = remaining.min(chunk_size);
            self.read_at(off, &mut buf[pos..pos + to_read])?;
            off += to_read as u64;
            pos += to_read;
            remaining -= to_read;
        }

        Ok(())
    }

    /// Reads block number `block` (of `block_size` bytes) into `buf`.
    ///
    /// `buf` must be exactly one block long.
    #[inline(always)]
    fn read_block(&mut self, block: u32, block_size: usize, buf: &mut [u8]) -> ImageIOResult {
        if buf.len() != block_size {
            return Err(ImageIOError::Other("read_block: buffer length mismatch"));
        }
        self.read_at(block as u64 * block_size as u64, buf)
    }
}

impl<T: ImageIO + ?Sized> ImageIOExt for T {}

/// Extension trait for reading structs using zerocopy.
///
/// Provides a typed, bounds-checked view of a record at a given offset.
/// Requires the struct to implement zerocopy traits for safe conversion.
pub trait ImageIOStructExt: ImageIO {
    /// Reads a struct of type `T` from the given offset.
    fn read_struct<T: zerocopy::FromBytes + zerocopy::KnownLayout + zerocopy::Immutable>(
        &mut self,
        offset: u64,
    ) -> ImageIOResult<T> {
        let size = core::mem::size_of::<T>();
        if size > BLOCK_BUF_SIZE {
            return Err(ImageIOError::Other("read_struct: type too large"));
        }
        let mut buf = [0u8; BLOCK_BUF_SIZE];
        self.read_at(offset, &mut buf[..size])?;
        T::read_from_bytes(&buf[..size]).map_err(|_| ImageIOError::Other("read_struct failed"))
    }
}

impl<T: ImageIO + ?Sized> ImageIOStructExt for T {}
