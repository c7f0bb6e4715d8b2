//! BSON element type tags.

use crate::values::BsonValue;

/// One-byte BSON element type tag.
///
/// The table is the full supported set. `from_u8` and `of` are the two
/// directions of the mapping; both match exhaustively, so extending one
/// without the other does not compile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Tag {
    Double = 0x01,
    String = 0x02,
    Document = 0x03,
    Array = 0x04,
    Binary = 0x05,
    ObjectId = 0x07,
    Boolean = 0x08,
    DateTime = 0x09,
    Null = 0x0A,
    Regex = 0x0B,
    JavaScript = 0x0D,
    Symbol = 0x0E,
    JavaScriptWithScope = 0x0F,
    Int32 = 0x10,
    Timestamp = 0x11,
    Int64 = 0x12,
    MaxKey = 0x7F,
    MinKey = 0xFF,
}

impl Tag {
    /// Decodes a wire tag byte. `None` for any byte outside the supported
    /// set, including the deprecated 0x06 undefined, 0x0C DBPointer and
    /// 0x13 decimal128 tags.
    pub fn from_u8(byte: u8) -> Option<Tag> {
        match byte {
            0x01 => Some(Tag::Double),
            0x02 => Some(Tag::String),
            0x03 => Some(Tag::Document),
            0x04 => Some(Tag::Array),
            0x05 => Some(Tag::Binary),
            0x07 => Some(Tag::ObjectId),
            0x08 => Some(Tag::Boolean),
            0x09 => Some(Tag::DateTime),
            0x0A => Some(Tag::Null),
            0x0B => Some(Tag::Regex),
            0x0D => Some(Tag::JavaScript),
            0x0E => Some(Tag::Symbol),
            0x0F => Some(Tag::JavaScriptWithScope),
            0x10 => Some(Tag::Int32),
            0x11 => Some(Tag::Timestamp),
            0x12 => Some(Tag::Int64),
            0x7F => Some(Tag::MaxKey),
            0xFF => Some(Tag::MinKey),
            _ => None,
        }
    }

    /// The tag a value encodes under.
    pub fn of(value: &BsonValue) -> Tag {
        match value {
            BsonValue::Float(_) => Tag::Double,
            BsonValue::Str(_) => Tag::String,
            BsonValue::Document(_) => Tag::Document,
            BsonValue::Array(_) => Tag::Array,
            BsonValue::Binary(_) => Tag::Binary,
            BsonValue::ObjectId(_) => Tag::ObjectId,
            BsonValue::Boolean(_) => Tag::Boolean,
            BsonValue::DateTime(_) => Tag::DateTime,
            BsonValue::Null => Tag::Null,
            BsonValue::Regex(_, _) => Tag::Regex,
            BsonValue::JavaScriptCode(_) => Tag::JavaScript,
            BsonValue::Symbol(_) => Tag::Symbol,
            BsonValue::JavaScriptCodeWithScope(_) => Tag::JavaScriptWithScope,
            BsonValue::Int32(_) => Tag::Int32,
            BsonValue::Timestamp(_) => Tag::Timestamp,
            BsonValue::Int64(_) => Tag::Int64,
            BsonValue::MinKey => Tag::MinKey,
            BsonValue::MaxKey => Tag::MaxKey,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::values::{BsonBinary, BsonObjectId, BsonTimestamp};

    #[test]
    fn wire_bytes_round_trip_through_the_registry() {
        let tags = [
            Tag::Double,
            Tag::String,
            Tag::Document,
            Tag::Array,
            Tag::Binary,
            Tag::ObjectId,
            Tag::Boolean,
            Tag::DateTime,
            Tag::Null,
            Tag::Regex,
            Tag::JavaScript,
            Tag::Symbol,
            Tag::JavaScriptWithScope,
            Tag::Int32,
            Tag::Timestamp,
            Tag::Int64,
            Tag::MaxKey,
            Tag::MinKey,
        ];
        for tag in tags {
            assert_eq!(Tag::from_u8(tag as u8), Some(tag));
        }
    }

    #[test]
    fn unsupported_bytes_are_rejected() {
        for byte in [0x00, 0x06, 0x0C, 0x13, 0x14, 0x42, 0x80, 0xFE] {
            assert_eq!(Tag::from_u8(byte), None, "byte 0x{byte:02x}");
        }
    }

    #[test]
    fn values_pick_their_table_tag() {
        assert_eq!(Tag::of(&BsonValue::Float(1.0)) as u8, 0x01);
        assert_eq!(Tag::of(&BsonValue::Str("s".into())) as u8, 0x02);
        assert_eq!(Tag::of(&BsonValue::Binary(BsonBinary::new(vec![]))) as u8, 0x05);
        assert_eq!(
            Tag::of(&BsonValue::ObjectId(BsonObjectId {
                time: 0,
                machine: 0,
                inc: 0
            })) as u8,
            0x07
        );
        assert_eq!(
            Tag::of(&BsonValue::Timestamp(BsonTimestamp {
                increment: 0,
                timestamp: 0
            })) as u8,
            0x11
        );
        assert_eq!(Tag::of(&BsonValue::Int64(1)) as u8, 0x12);
        assert_eq!(Tag::of(&BsonValue::MaxKey) as u8, 0x7F);
        assert_eq!(Tag::of(&BsonValue::MinKey) as u8, 0xFF);
    }
}
