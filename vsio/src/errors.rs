// SPDX-License-Identifier: MIT

use core::fmt;

/// Result type for ImageIO operations.
pub type ImageIOResult<T = ()> = core::result::Result<T, ImageIOError>;

/// Error type for ImageIO operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageIOError {
    Other(&'static str),
    /// A read of `len` bytes at `offset` would run past the end of the image.
    OutOfBounds { offset: u64, len: usize },
    Unsupported,
}

impl ImageIOError {
    pub fn msg(&self) -> &'static str {
        match self {
            ImageIOError::Other(msg) => msg,
            ImageIOError::OutOfBounds { .. } => "Out of bounds",
            ImageIOError::Unsupported => "Unsupported operation",
        }
    }
}

impl From<&'static str> for ImageIOError {
    #[inline]
    fn from(msg: &'static str) -> Self {
        ImageIOError::Other(msg)
    }
}

impl fmt::Display for ImageIOError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.msg())?;
        if let ImageIOError::OutOfBounds { offset, len } = self {
            write!(f, " (read of {len} bytes at offset {offset})")?;
        }
        Ok(())
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ImageIOError {}
