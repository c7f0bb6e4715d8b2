//! BSON document encoder.
//!
//! BSON is a little-endian binary format. All multi-byte integers are
//! written in little-endian byte order. Every length prefix is only
//! known after its body: the encoder reserves a 4-byte placeholder,
//! emits the body, then patches the computed length back in. Nesting
//! makes this recursive, with the pending positions living on the call
//! stack.

use std::sync::Arc;

use schematic_buffers::{BufferPool, Writer};

use crate::error::BsonError;
use crate::tag::Tag;
use crate::values::{BsonObjectId, BsonValue};

/// Encodes a BSON document (a slice of key-value pairs) to bytes.
///
/// The top-level must always be a document; BSON has no scalar top-level
/// encoding. Like [`crate::BsonDecoder`], an encoder is stateless per
/// call and safe to share across threads: each `encode` checks a buffer
/// out of the pool and returns it when the call finishes.
pub struct BsonEncoder {
    pool: Arc<BufferPool>,
}

impl Default for BsonEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl BsonEncoder {
    /// Creates an encoder with its own default-sized pool.
    pub fn new() -> Self {
        Self {
            pool: BufferPool::new(),
        }
    }

    /// Creates an encoder that checks buffers out of the given pool.
    pub fn with_pool(pool: Arc<BufferPool>) -> Self {
        Self { pool }
    }

    /// Encodes a BSON document to bytes.
    pub fn encode(&self, fields: &[(String, BsonValue)]) -> Result<Vec<u8>, BsonError> {
        let mut writer = Writer::new(self.pool.acquire());
        self.write_document(&mut writer, fields)?;
        Ok(writer.flush())
    }

    fn write_document(
        &self,
        w: &mut Writer,
        fields: &[(String, BsonValue)],
    ) -> Result<(), BsonError> {
        let len_pos = w.reserve(4)?;
        for (key, value) in fields {
            self.write_key_value(w, key, value)?;
        }
        w.u8(0)?; // terminating NUL
        w.patch_i32_le(len_pos, (w.pos() - len_pos) as i32);
        Ok(())
    }

    fn write_key_value(&self, w: &mut Writer, key: &str, value: &BsonValue) -> Result<(), BsonError> {
        w.u8(Tag::of(value) as u8)?;
        self.write_cstring(w, key)?;
        match value {
            BsonValue::Float(f) => w.f64_le(*f)?,
            BsonValue::Str(s) => self.write_string(w, s)?,
            BsonValue::Document(fields) => self.write_document(w, fields)?,
            BsonValue::Array(arr) => self.write_array(w, arr)?,
            BsonValue::Binary(bin) => {
                w.i32_le(bin.data.len() as i32)?;
                w.u8(bin.subtype)?;
                w.buf(&bin.data)?;
            }
            BsonValue::ObjectId(id) => self.write_object_id(w, id)?,
            BsonValue::Boolean(b) => w.u8(u8::from(*b))?,
            BsonValue::DateTime(ms) => w.i64_le(*ms)?,
            BsonValue::Null => {}
            BsonValue::Regex(pattern, flags) => {
                self.write_cstring(w, pattern)?;
                self.write_cstring(w, flags)?;
            }
            BsonValue::JavaScriptCode(jsc) => self.write_string(w, &jsc.code)?,
            BsonValue::Symbol(sym) => self.write_string(w, &sym.symbol)?,
            BsonValue::JavaScriptCodeWithScope(jscws) => {
                // The total length covers the length field itself, the
                // code string and the scope document.
                let len_pos = w.reserve(4)?;
                self.write_string(w, &jscws.code)?;
                self.write_document(w, &jscws.scope)?;
                w.patch_i32_le(len_pos, (w.pos() - len_pos) as i32);
            }
            BsonValue::Int32(i) => w.i32_le(*i)?,
            BsonValue::Timestamp(ts) => {
                w.i32_le(ts.increment)?;
                w.i32_le(ts.timestamp)?;
            }
            BsonValue::Int64(i) => w.i64_le(*i)?,
            BsonValue::MinKey | BsonValue::MaxKey => {}
        }
        Ok(())
    }

    /// Array elements are written as a document whose keys are the dense
    /// decimal strings "0", "1", … in sequence order.
    fn write_array(&self, w: &mut Writer, values: &[BsonValue]) -> Result<(), BsonError> {
        let len_pos = w.reserve(4)?;
        for (i, value) in values.iter().enumerate() {
            self.write_key_value(w, &i.to_string(), value)?;
        }
        w.u8(0)?;
        w.patch_i32_le(len_pos, (w.pos() - len_pos) as i32);
        Ok(())
    }

    /// Writes a NUL-terminated C-string. Stops at any NUL byte in the
    /// input.
    fn write_cstring(&self, w: &mut Writer, s: &str) -> Result<(), BsonError> {
        let bytes = s.as_bytes();
        let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
        w.buf(&bytes[..end])?;
        w.u8(0)?;
        Ok(())
    }

    /// Writes a BSON string: little-endian i32 (byte count + 1 for the
    /// trailing NUL), UTF-8 bytes, NUL.
    fn write_string(&self, w: &mut Writer, s: &str) -> Result<(), BsonError> {
        w.i32_le(s.len() as i32 + 1)?;
        w.utf8(s)?;
        w.u8(0)?;
        Ok(())
    }

    /// Writes the 12-byte legacy ObjectId: time, machine, increment, each
    /// big-endian.
    fn write_object_id(&self, w: &mut Writer, id: &BsonObjectId) -> Result<(), BsonError> {
        w.buf(&id.time.to_be_bytes())?;
        w.buf(&id.machine.to_be_bytes())?;
        w.buf(&id.inc.to_be_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::BsonDecoder;

    #[test]
    fn encodes_the_reference_hello_world_stream() {
        let encoder = BsonEncoder::new();
        let fields = vec![("hello".to_string(), BsonValue::Str("world".to_string()))];
        let bytes = encoder.encode(&fields).unwrap();
        assert_eq!(
            bytes,
            [
                0x16, 0x00, 0x00, 0x00, 0x02, b'h', b'e', b'l', b'l', b'o', 0x00, 0x06, 0x00,
                0x00, 0x00, b'w', b'o', b'r', b'l', b'd', 0x00, 0x00
            ]
        );
    }

    #[test]
    fn encodes_an_empty_document_as_five_bytes() {
        let encoder = BsonEncoder::new();
        let bytes = encoder.encode(&[]).unwrap();
        assert_eq!(bytes, [0x05, 0x00, 0x00, 0x00, 0x00]);
    }

    #[test]
    fn nested_document_lengths_are_patched_inside_out() {
        let encoder = BsonEncoder::new();
        let inner = vec![("a".to_string(), BsonValue::Int32(1))];
        let fields = vec![("d".to_string(), BsonValue::Document(inner))];
        let bytes = encoder.encode(&fields).unwrap();
        // Outer length covers everything; inner length starts at offset 7.
        assert_eq!(bytes[0] as usize, bytes.len());
        let inner_len = i32::from_le_bytes([bytes[7], bytes[8], bytes[9], bytes[10]]) as usize;
        assert_eq!(inner_len, bytes.len() - 7 - 1);
    }

    #[test]
    fn key_with_embedded_nul_is_truncated_at_the_nul() {
        let encoder = BsonEncoder::new();
        let fields = vec![("a\0b".to_string(), BsonValue::Null)];
        let bytes = encoder.encode(&fields).unwrap();
        let decoded = BsonDecoder::new().decode(&bytes[..]).unwrap();
        assert_eq!(decoded, vec![("a".to_string(), BsonValue::Null)]);
    }

    #[test]
    fn int64_values_keep_the_wide_tag() {
        let encoder = BsonEncoder::new();
        let fields = vec![("n".to_string(), BsonValue::Int64(3))];
        let bytes = encoder.encode(&fields).unwrap();
        assert_eq!(bytes[4], 0x12);
    }
}
