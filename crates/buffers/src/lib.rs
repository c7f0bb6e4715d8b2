//! Pooled binary buffer utilities for the schematic codecs.
//!
//! The [`BufferPool`] hands out exclusively owned, growable byte buffers
//! that return to the pool when dropped. [`StreamReader`] and [`Writer`]
//! drive decoding and encoding over those buffers.

pub mod pool;
pub mod reader;
pub mod writer;

pub use pool::{BufferPool, PooledBuffer, MINIMUM_SIZE};
pub use reader::StreamReader;
pub use writer::Writer;

use thiserror::Error;

/// Error type for buffer operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BufferError {
    /// The source ended while more bytes were still required.
    #[error("unexpected end of input")]
    EndOfBuffer,
    /// A UTF-8 payload contained a malformed byte sequence.
    #[error("invalid UTF-8")]
    InvalidUtf8,
    /// A buffer would have to grow past the pool's configured ceiling.
    #[error("required capacity {required} exceeds the buffer limit of {limit}")]
    CapacityExceeded { required: usize, limit: usize },
    /// The underlying source failed with a non-EOF i/o error.
    #[error("i/o failure: {0:?}")]
    Io(std::io::ErrorKind),
}
