//! BSON document decoder.
//!
//! BSON is a little-endian binary format. The decoder is a recursive
//! descent over the document grammar: an i32 total length (which counts
//! itself and the terminating NUL), a run of tagged elements, a NUL.
//! Every declared length is checked against the bytes actually consumed.

use std::io::Read;
use std::sync::Arc;

use schematic_buffers::{BufferPool, StreamReader};

use crate::error::BsonError;
use crate::tag::Tag;
use crate::values::{
    BsonBinary, BsonJavascriptCode, BsonJavascriptCodeWithScope, BsonObjectId, BsonSymbol,
    BsonTimestamp, BsonValue,
};

/// Streaming BSON document decoder.
///
/// A decoder is stateless between calls: each `decode` checks a buffer
/// out of the pool and returns it when the call finishes, on success or
/// error, so one decoder can serve many threads at once.
pub struct BsonDecoder {
    pool: Arc<BufferPool>,
}

impl Default for BsonDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl BsonDecoder {
    /// Creates a decoder with its own default-sized pool.
    pub fn new() -> Self {
        Self {
            pool: BufferPool::new(),
        }
    }

    /// Creates a decoder that checks buffers out of the given pool.
    pub fn with_pool(pool: Arc<BufferPool>) -> Self {
        Self { pool }
    }

    /// Decodes a BSON document from a byte source, returning an error on
    /// malformed input.
    pub fn decode<R: Read>(&self, source: R) -> Result<Vec<(String, BsonValue)>, BsonError> {
        let mut reader = StreamReader::new(self.pool.acquire(), source);
        self.read_document(&mut reader)
    }

    fn read_document<R: Read>(
        &self,
        r: &mut StreamReader<R>,
    ) -> Result<Vec<(String, BsonValue)>, BsonError> {
        let start = r.consumed();
        let size = r.i32_le()?;
        // The smallest document is its own length plus the terminator.
        if size < 5 {
            return Err(BsonError::FramingMismatch {
                declared: size as i64,
                actual: 4,
            });
        }
        let mut fields: Vec<(String, BsonValue)> = Vec::new();
        loop {
            let byte = r.u8()?;
            if byte == 0 {
                break;
            }
            let tag = Tag::from_u8(byte).ok_or(BsonError::UnsupportedType(byte))?;
            let key = r.cstring()?;
            let value = self.read_element_value(r, tag)?;
            fields.push((key, value));
        }
        let actual = (r.consumed() - start) as i64;
        if actual != size as i64 {
            return Err(BsonError::FramingMismatch {
                declared: size as i64,
                actual,
            });
        }
        Ok(fields)
    }

    fn read_element_value<R: Read>(
        &self,
        r: &mut StreamReader<R>,
        tag: Tag,
    ) -> Result<BsonValue, BsonError> {
        match tag {
            Tag::Double => Ok(BsonValue::Float(r.f64_le()?)),
            Tag::String => Ok(BsonValue::Str(self.read_string(r)?)),
            Tag::Document => Ok(BsonValue::Document(self.read_document(r)?)),
            Tag::Array => Ok(BsonValue::Array(self.read_array(r)?)),
            Tag::Binary => self.read_binary(r),
            Tag::ObjectId => Ok(BsonValue::ObjectId(self.read_object_id(r)?)),
            Tag::Boolean => Ok(BsonValue::Boolean(r.u8()? == 1)),
            Tag::DateTime => Ok(BsonValue::DateTime(r.i64_le()?)),
            Tag::Null => Ok(BsonValue::Null),
            Tag::Regex => {
                let pattern = r.cstring()?;
                let flags = r.cstring()?;
                Ok(BsonValue::Regex(pattern, flags))
            }
            Tag::JavaScript => Ok(BsonValue::JavaScriptCode(BsonJavascriptCode {
                code: self.read_string(r)?,
            })),
            Tag::Symbol => Ok(BsonValue::Symbol(BsonSymbol {
                symbol: self.read_string(r)?,
            })),
            Tag::JavaScriptWithScope => self.read_code_with_scope(r),
            Tag::Int32 => Ok(BsonValue::Int32(r.i32_le()?)),
            Tag::Timestamp => {
                let increment = r.i32_le()?;
                let timestamp = r.i32_le()?;
                Ok(BsonValue::Timestamp(BsonTimestamp {
                    increment,
                    timestamp,
                }))
            }
            Tag::Int64 => Ok(BsonValue::Int64(r.i64_le()?)),
            Tag::MinKey => Ok(BsonValue::MinKey),
            Tag::MaxKey => Ok(BsonValue::MaxKey),
        }
    }

    /// Reads a length-prefixed string: the i32 length counts the UTF-8
    /// bytes plus the trailing NUL.
    fn read_string<R: Read>(&self, r: &mut StreamReader<R>) -> Result<String, BsonError> {
        let length = r.i32_le()?;
        if length < 1 {
            return Err(BsonError::FramingMismatch {
                declared: length as i64,
                actual: 0,
            });
        }
        let s = r.utf8(length as usize - 1)?;
        r.u8()?; // trailing NUL
        Ok(s)
    }

    /// Arrays share document framing; the numeric keys are dropped and
    /// read order is authoritative, whatever the keys said.
    fn read_array<R: Read>(&self, r: &mut StreamReader<R>) -> Result<Vec<BsonValue>, BsonError> {
        let fields = self.read_document(r)?;
        Ok(fields.into_iter().map(|(_, v)| v).collect())
    }

    fn read_binary<R: Read>(&self, r: &mut StreamReader<R>) -> Result<BsonValue, BsonError> {
        let length = r.i32_le()?;
        if length < 0 {
            return Err(BsonError::FramingMismatch {
                declared: length as i64,
                actual: 0,
            });
        }
        let subtype = r.u8()?;
        let data = r.bytes(length as usize)?;
        Ok(BsonValue::Binary(BsonBinary { subtype, data }))
    }

    /// Reads the 12-byte legacy ObjectId: time, machine, increment, each
    /// big-endian.
    fn read_object_id<R: Read>(&self, r: &mut StreamReader<R>) -> Result<BsonObjectId, BsonError> {
        let bytes = r.bytes(12)?;
        let time = i32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        let machine = i32::from_be_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
        let inc = i32::from_be_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]);
        Ok(BsonObjectId { time, machine, inc })
    }

    /// Code-with-scope carries its own total length covering the length
    /// field, the code string and the scope document.
    fn read_code_with_scope<R: Read>(
        &self,
        r: &mut StreamReader<R>,
    ) -> Result<BsonValue, BsonError> {
        let start = r.consumed();
        let total = r.i32_le()?;
        let code = self.read_string(r)?;
        let scope = self.read_document(r)?;
        let actual = (r.consumed() - start) as i64;
        if actual != total as i64 {
            return Err(BsonError::FramingMismatch {
                declared: total as i64,
                actual,
            });
        }
        Ok(BsonValue::JavaScriptCodeWithScope(
            BsonJavascriptCodeWithScope { code, scope },
        ))
    }
}
