//! Our errors.

use crate::RecordKind;
use thiserror::Error;

/// Crate-specific errors.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// The underlying stream ended in the middle of a field or a datagram.
    #[error("unexpected end of stream inside a datagram")]
    Eof,

    /// Wraps `std::io::Error`.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// A structural invariant of an otherwise well-framed datagram was
    /// violated, e.g. too many beams, inconsistent timestamps, or
    /// non-monotonic beam numbers. The offending record has been consumed
    /// from the stream, so the read loop may continue.
    #[error("unintelligible datagram: {0}")]
    Unintelligible(String),

    /// The type byte is not in the valid set even though the sonar id is.
    ///
    /// The record has been skipped; the read loop may continue.
    #[error("invalid datagram type: {0:#04x}")]
    BadDatagram(u8),

    /// The underlying sink accepted fewer bytes than the encoder produced.
    #[error("short write to the underlying sink")]
    WriteFail,

    /// The writer was asked to emit a record kind the store holds no data
    /// for. This is a programmer error, not a data error.
    #[error("no data in the store for record kind {0:?}")]
    BadKind(RecordKind),

    /// The record is a comment, not survey data.
    ///
    /// Surfaced from depth and attitude extractors to indicate they have
    /// nothing to return; it is informational rather than a failure.
    #[error("the record is a comment")]
    Comment,
}

impl Error {
    /// Returns true if the read loop may skip the current record and
    /// continue with the next one.
    ///
    /// # Examples
    ///
    /// ```
    /// use swath::Error;
    /// assert!(Error::BadDatagram(0x42).is_recoverable());
    /// assert!(!Error::Eof.is_recoverable());
    /// ```
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::Unintelligible(_) | Error::BadDatagram(_))
    }
}
