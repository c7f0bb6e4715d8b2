//! BSON (Binary JSON) encoding and decoding.
//!
//! The wire format is the BSON specification: little-endian multi-byte
//! integers and floats, NUL-terminated names and regex fields, i32
//! length prefixes that include their own four bytes and (for documents)
//! the terminating NUL. A document is a `Vec<(String, BsonValue)>` —
//! field order is significant and survives a full encode/decode cycle.
//!
//! Buffers come from a shared [`BufferPool`]: concurrent encode and
//! decode calls check storage out and in, so they reuse allocations
//! without ever observing each other's bytes.

pub mod decoder;
pub mod encoder;
pub mod error;
pub mod tag;
pub mod values;

pub use decoder::BsonDecoder;
pub use encoder::BsonEncoder;
pub use error::BsonError;
pub use tag::Tag;
pub use values::{
    BsonBinary, BsonJavascriptCode, BsonJavascriptCodeWithScope, BsonObjectId, BsonSymbol,
    BsonTimestamp, BsonValue,
};

pub use schematic_buffers::{BufferPool, MINIMUM_SIZE};

use std::io::Read;

/// Encodes a BSON document to bytes with a default-sized pool.
pub fn encode(fields: &[(String, BsonValue)]) -> Result<Vec<u8>, BsonError> {
    BsonEncoder::new().encode(fields)
}

/// Decodes a BSON document from a byte source with a default-sized pool.
pub fn decode<R: Read>(source: R) -> Result<Vec<(String, BsonValue)>, BsonError> {
    BsonDecoder::new().decode(source)
}
