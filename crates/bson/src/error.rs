//! BSON codec error type.

use schematic_buffers::BufferError;
use thiserror::Error;

/// Error type for BSON encoding and decoding operations.
///
/// Every failure mode is a distinct variant; none is retried internally.
/// A failed decode leaves no partial document, and a failed encode's
/// partial buffer is discarded when the writer drops.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BsonError {
    /// The source ended before a declared length was satisfied.
    #[error("unexpected end of input")]
    UnexpectedEof,
    /// A declared byte length disagrees with the content actually read.
    #[error("declared length {declared} but {actual} bytes were spanned")]
    FramingMismatch { declared: i64, actual: i64 },
    /// The tag byte is not in the supported type table.
    #[error("unsupported BSON element type: 0x{0:02x}")]
    UnsupportedType(u8),
    /// A string payload or field name contained malformed UTF-8.
    #[error("invalid UTF-8")]
    InvalidUtf8,
    /// A value required more buffer space than the pool allows.
    #[error("value of {required} bytes exceeds the buffer limit of {limit}")]
    CapacityExceeded { required: usize, limit: usize },
    /// The source stream failed with a non-EOF i/o error.
    #[error("i/o failure reading source: {0:?}")]
    Io(std::io::ErrorKind),
}

impl From<BufferError> for BsonError {
    fn from(err: BufferError) -> Self {
        match err {
            BufferError::EndOfBuffer => BsonError::UnexpectedEof,
            BufferError::InvalidUtf8 => BsonError::InvalidUtf8,
            BufferError::CapacityExceeded { required, limit } => {
                BsonError::CapacityExceeded { required, limit }
            }
            BufferError::Io(kind) => BsonError::Io(kind),
        }
    }
}
