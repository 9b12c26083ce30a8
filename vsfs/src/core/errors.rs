// SPDX-License-Identifier: MIT

use core::fmt;

pub use vsio::errors::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsParsingError {
    IO(ImageIOError),
    Corrupted,
    Invalid(&'static str),
    Other(&'static str),
}

impl FsParsingError {
    pub fn msg(&self) -> &'static str {
        match self {
            FsParsingError::IO(_) => "IO error",
            FsParsingError::Corrupted => "Corrupted record",
            FsParsingError::Invalid(msg) => msg,
            FsParsingError::Other(msg) => msg,
        }
    }

    pub fn source(&self) -> Option<FsError> {
        match self {
            FsParsingError::IO(e) => Some(FsError::IO(*e)),
            _ => None,
        }
    }
}

impl fmt::Display for FsParsingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.msg())?;
        let mut current = self.source();
        while let Some(src) = current {
            write!(f, "\n  caused by: {}", src.msg())?;
            current = src.source();
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsCheckerError {
    IO(ImageIOError),
    Parsing(FsParsingError),
    /// Fail-fast stop: the report already holds the violation.
    Halted,
    Invalid(&'static str),
    Other(&'static str),
}

impl FsCheckerError {
    pub fn msg(&self) -> &'static str {
        match self {
            FsCheckerError::IO(_) => "IO error",
            FsCheckerError::Parsing(_) => "Parsing error",
            FsCheckerError::Halted => "Check halted on first violation",
            FsCheckerError::Invalid(msg) => msg,
            FsCheckerError::Other(msg) => msg,
        }
    }

    pub fn source(&self) -> Option<FsError> {
        match self {
            FsCheckerError::IO(e) => Some(FsError::IO(*e)),
            FsCheckerError::Parsing(e) => Some(FsError::Parsing(*e)),
            _ => None,
        }
    }

    /// The failed read, when this error comes from a read past the end of the image.
    pub fn out_of_bounds(&self) -> Option<(u64, usize)> {
        match self {
            FsCheckerError::IO(ImageIOError::OutOfBounds { offset, len })
            | FsCheckerError::Parsing(FsParsingError::IO(ImageIOError::OutOfBounds {
                offset,
                len,
            })) => Some((*offset, *len)),
            _ => None,
        }
    }
}

impl fmt::Display for FsCheckerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.msg())?;
        let mut current = self.source();
        while let Some(src) = current {
            write!(f, "\n  caused by: {}", src.msg())?;
            current = src.source();
        }
        Ok(())
    }
}

/// Top-level error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsError {
    IO(ImageIOError),
    Parsing(FsParsingError),
    Checker(FsCheckerError),
    Other(&'static str),
}

impl fmt::Display for FsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.msg())?;
        let mut current = self.source();
        while let Some(src) = current {
            write!(f, "\n  caused by: {}", src.msg())?;
            current = src.source();
        }
        Ok(())
    }
}

impl FsError {
    pub fn msg(&self) -> &'static str {
        match self {
            FsError::IO(e) => e.msg(),
            FsError::Parsing(e) => e.msg(),
            FsError::Checker(e) => e.msg(),
            FsError::Other(msg) => msg,
        }
    }

    pub fn source(&self) -> Option<FsError> {
        match self {
            FsError::Parsing(e) => e.source(),
            FsError::Checker(e) => e.source(),
            FsError::IO(_) => None,
            FsError::Other(_) => None,
        }
    }
}

impl std::error::Error for FsError {}
impl std::error::Error for FsCheckerError {}
impl std::error::Error for FsParsingError {}

// === type Fs*Result ===

pub type FsResult<T = ()> = Result<T, FsError>;
pub type FsParsingResult<T = ()> = Result<T, FsParsingError>;
pub type FsCheckerResult<T = ()> = Result<T, FsCheckerError>;

crate::fs_error_wiring! {
    top => FsError {
        ImageIOError   : IO,
        FsParsingError : Parsing,
        FsCheckerError : Checker,
    },
    str_into => [
        FsParsingError,
        FsCheckerError,
    ],
    sub => {
        ImageIOError   => [ FsParsingError::IO, FsCheckerError::IO ],
        FsParsingError => [ FsCheckerError::Parsing ],
    },
}
