//! BSON-specific value types.

/// BSON ObjectId in the legacy three-field layout: time, machine and
/// increment, each written as a big-endian 4-byte group (12 bytes on the
/// wire). All three fields round-trip exactly; no byte is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BsonObjectId {
    pub time: i32,
    pub machine: i32,
    pub inc: i32,
}

/// BSON JavaScript code (without scope).
#[derive(Debug, Clone, PartialEq)]
pub struct BsonJavascriptCode {
    pub code: String,
}

/// BSON Symbol (deprecated BSON type).
#[derive(Debug, Clone, PartialEq)]
pub struct BsonSymbol {
    pub symbol: String,
}

/// BSON JavaScript code with scope (deprecated).
#[derive(Debug, Clone, PartialEq)]
pub struct BsonJavascriptCodeWithScope {
    pub code: String,
    pub scope: Vec<(String, BsonValue)>,
}

/// BSON Timestamp (replication timestamp: increment + seconds).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BsonTimestamp {
    pub increment: i32,
    pub timestamp: i32,
}

/// BSON Binary data (subtype + raw bytes).
///
/// The subtype byte is carried verbatim in both directions, including
/// subtypes the codec does not interpret. Reconstructing a higher-level
/// type (a UUID, say) from the bytes is the consumer's decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BsonBinary {
    pub subtype: u8,
    pub data: Vec<u8>,
}

impl BsonBinary {
    pub const SUBTYPE_GENERIC: u8 = 0x00;
    pub const SUBTYPE_FUNCTION: u8 = 0x01;
    pub const SUBTYPE_BINARY_OLD: u8 = 0x02;
    pub const SUBTYPE_UUID_OLD: u8 = 0x03;
    pub const SUBTYPE_UUID: u8 = 0x04;
    pub const SUBTYPE_MD5: u8 = 0x05;
    pub const SUBTYPE_USER_DEFINED: u8 = 0x80;

    /// Generic binary data (subtype 0x00).
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            subtype: Self::SUBTYPE_GENERIC,
            data,
        }
    }

    /// A UUID carried as binary subtype 0x04, bytes preserved verbatim.
    pub fn uuid(bytes: [u8; 16]) -> Self {
        Self {
            subtype: Self::SUBTYPE_UUID,
            data: bytes.to_vec(),
        }
    }
}

/// A BSON value that can appear as a document field value.
///
/// The variant set is closed: both the encoder and the decoder match on
/// it exhaustively, so a new variant cannot be added without updating
/// both directions.
#[derive(Debug, Clone, PartialEq)]
pub enum BsonValue {
    /// BSON double (0x01)
    Float(f64),
    /// BSON UTF-8 string (0x02)
    Str(String),
    /// Embedded BSON document (0x03)
    Document(Vec<(String, BsonValue)>),
    /// BSON array (0x04)
    Array(Vec<BsonValue>),
    /// BSON binary data (0x05)
    Binary(BsonBinary),
    /// BSON ObjectId (0x07)
    ObjectId(BsonObjectId),
    /// BSON boolean (0x08)
    Boolean(bool),
    /// BSON UTC datetime, milliseconds since epoch (0x09)
    DateTime(i64),
    /// BSON null (0x0a)
    Null,
    /// BSON regular expression: pattern and flags (0x0b)
    Regex(String, String),
    /// BSON JavaScript code (0x0d)
    JavaScriptCode(BsonJavascriptCode),
    /// BSON Symbol (deprecated) (0x0e)
    Symbol(BsonSymbol),
    /// BSON JavaScript code with scope (deprecated) (0x0f)
    JavaScriptCodeWithScope(BsonJavascriptCodeWithScope),
    /// BSON int32 (0x10)
    Int32(i32),
    /// BSON Timestamp (0x11)
    Timestamp(BsonTimestamp),
    /// BSON int64 (0x12)
    Int64(i64),
    /// BSON MinKey (0xFF)
    MinKey,
    /// BSON MaxKey (0x7F)
    MaxKey,
}

impl From<bool> for BsonValue {
    fn from(value: bool) -> Self {
        BsonValue::Boolean(value)
    }
}

impl From<i32> for BsonValue {
    fn from(value: i32) -> Self {
        BsonValue::Int32(value)
    }
}

/// Integral values that fit in 32 bits encode as Int32, wider values as
/// Int64. A value built as `Int64` directly keeps its width regardless
/// of magnitude.
impl From<i64> for BsonValue {
    fn from(value: i64) -> Self {
        match i32::try_from(value) {
            Ok(narrow) => BsonValue::Int32(narrow),
            Err(_) => BsonValue::Int64(value),
        }
    }
}

impl From<f64> for BsonValue {
    fn from(value: f64) -> Self {
        BsonValue::Float(value)
    }
}

impl From<&str> for BsonValue {
    fn from(value: &str) -> Self {
        BsonValue::Str(value.to_string())
    }
}

impl From<String> for BsonValue {
    fn from(value: String) -> Self {
        BsonValue::Str(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn i64_conversion_narrows_when_it_fits() {
        assert_eq!(BsonValue::from(3i64), BsonValue::Int32(3));
        assert_eq!(BsonValue::from(-3i64), BsonValue::Int32(-3));
        assert_eq!(BsonValue::from(i32::MAX as i64), BsonValue::Int32(i32::MAX));
    }

    #[test]
    fn i64_conversion_keeps_wide_values_wide() {
        let wide = i32::MAX as i64 + 1;
        assert_eq!(BsonValue::from(wide), BsonValue::Int64(wide));
        assert_eq!(BsonValue::from(i64::MIN), BsonValue::Int64(i64::MIN));
    }

    #[test]
    fn uuid_binary_uses_the_uuid_subtype() {
        let bin = BsonBinary::uuid([7u8; 16]);
        assert_eq!(bin.subtype, BsonBinary::SUBTYPE_UUID);
        assert_eq!(bin.data.len(), 16);
    }
}
