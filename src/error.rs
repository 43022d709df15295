use std::fmt;
use thiserror::Error;

/// Direction of a transfer that ended early.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Reading,
    Writing,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Reading => f.write_str("reading"),
            Phase::Writing => f.write_str("writing"),
        }
    }
}

/// Custom error types for the bufchain library.
#[derive(Error, Debug)]
pub enum Error {
    /// Underlying I/O errors from the terminal resource.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A contiguous slice larger than the whole buffer was requested.
    #[error("Underflow: requested {requested} contiguous bytes from a {capacity}-byte buffer")]
    Underflow { requested: usize, capacity: usize },

    /// `reserve` must leave at least one byte of room for unread content.
    #[error("Reserve of {requested} bytes must be smaller than the {capacity}-byte buffer")]
    ReserveExceedsCapacity { requested: usize, capacity: usize },

    /// The buffer is full and the scanner still has not found the end of its token.
    #[error("Token does not fit in a {capacity}-byte buffer")]
    TokenTooLarge { capacity: usize },

    /// A scanner reported a token end beyond the window it was shown.
    #[error("Scanner returned offset {offset} past the {available} bytes available")]
    ScannerOverrun { offset: usize, available: usize },

    /// The neighbor reported end-of-data before a mandated transfer completed.
    #[error("Eof whilst {phase}: transferred {transferred} of {requested} bytes")]
    Eof {
        phase: Phase,
        requested: usize,
        transferred: usize,
    },

    /// A frame payload does not fit the 32-bit length header.
    #[error("Frame payload of {len} bytes exceeds the {limit}-byte header limit")]
    FrameTooLarge { len: usize, limit: usize },

    /// A filter's mutable and immutable neighbor accessors disagree.
    #[error("Inconsistent stream chain at depth {depth}")]
    InconsistentChain { depth: usize },
}

impl Error {
    /// Create an `Eof` error for the read side.
    pub fn eof_reading(requested: usize, transferred: usize) -> Self {
        Self::Eof {
            phase: Phase::Reading,
            requested,
            transferred,
        }
    }

    /// Create an `Eof` error for the write side.
    pub fn eof_writing(requested: usize, transferred: usize) -> Self {
        Self::Eof {
            phase: Phase::Writing,
            requested,
            transferred,
        }
    }

    /// Returns true for errors caused by a request that can never succeed
    /// with the buffer's capacity, as opposed to the data running out.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Error::Underflow { .. }
                | Error::ReserveExceedsCapacity { .. }
                | Error::TokenTooLarge { .. }
                | Error::ScannerOverrun { .. }
                | Error::FrameTooLarge { .. }
        )
    }
}

impl From<Error> for std::io::Error {
    fn from(err: Error) -> Self {
        use std::io::ErrorKind;
        match err {
            Error::Io(e) => e,
            Error::Eof { .. } => std::io::Error::new(ErrorKind::UnexpectedEof, err),
            other if other.is_configuration() => std::io::Error::new(ErrorKind::InvalidInput, other),
            other => std::io::Error::other(other),
        }
    }
}

/// Result type alias for the library operations.
pub type Result<T> = std::result::Result<T, Error>;
