// SPDX-License-Identifier: MIT

use std::io::{Error, Read, Seek, SeekFrom};

use crate::{ImageIO, ImageIOError, ImageIOResult};

/// Streaming implementation of `ImageIO` over any `Read + Seek` handle.
///
/// The image length is taken once at construction; reads past it fail with
/// `OutOfBounds` before touching the handle.
#[derive(Debug)]
pub struct StdImageIO<'a, T: Read + Seek> {
    io: &'a mut T,
    len: u64,
}

impl<'a, T: Read + Seek> StdImageIO<'a, T> {
    pub fn new(io: &'a mut T) -> ImageIOResult<Self> {
        let len = io.seek(SeekFrom::End(0))?;
        io.seek(SeekFrom::Start(0))?;
        Ok(Self { io, len })
    }
}

impl<'a, T: Read + Seek> ImageIO for StdImageIO<'a, T> {
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> ImageIOResult {
        self.check_bounds(offset, buf.len())?;
        self.io.seek(SeekFrom::Start(offset))?;
        self.io.read_exact(buf)?;
        Ok(())
    }

    #[inline]
    fn len(&self) -> u64 {
        self.len
    }
}

impl From<Error> for ImageIOError {
    #[cold]
    #[inline(never)]
    fn from(e: Error) -> Self {
        // Leak the string to produce a 'static str. Acceptable for error mapping.
        let leaked_str: &'static str = Box::leak(e.to_string().into_boxed_str());
        ImageIOError::Other(leaked_str)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::prelude::*;
    use std::io::{Cursor, Write};
    use tempfile::tempfile;

    #[test]
    fn test_read_file() {
        let mut file = tempfile().unwrap();
        file.write_all(&(0..100u8).collect::<Vec<_>>()).unwrap();

        let mut io = StdImageIO::new(&mut file).unwrap();
        assert_eq!(io.len(), 100);

        let mut output = [0u8; 4];
        io.read_at(10, &mut output).unwrap();
        assert_eq!(output, [10, 11, 12, 13]);
    }

    #[test]
    fn test_read_past_end() {
        let mut cursor = Cursor::new(vec![0u8; 512]);
        let mut io = StdImageIO::new(&mut cursor).unwrap();

        let mut block = [0u8; 512];
        io.read_block(0, 512, &mut block).unwrap();
        assert_eq!(
            io.read_block(1, 512, &mut block),
            Err(ImageIOError::OutOfBounds {
                offset: 512,
                len: 512
            })
        );
    }

    #[test]
    fn test_empty_image() {
        let mut cursor = Cursor::new(Vec::<u8>::new());
        let mut io = StdImageIO::new(&mut cursor).unwrap();
        assert!(io.is_empty());

        let mut one = [0u8; 1];
        assert!(io.read_at(0, &mut one).is_err());
    }

    #[test]
    fn test_read_struct_le() {
        let mut data = vec![0u8; 16];
        data[4..8].copy_from_slice(&0xDEADBEEFu32.to_le_bytes());
        let mut cursor = Cursor::new(data);
        let mut io = StdImageIO::new(&mut cursor).unwrap();

        let v: u32 = io.read_struct(4).unwrap();
        assert_eq!(v, 0xDEADBEEF);
    }
}
