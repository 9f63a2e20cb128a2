//! Typed payload fields.
//!
//! A field encodes to a fixed 1, 2 or 4 bytes (big-endian) or to a raw byte
//! run for strings and byte arrays. Nothing on the wire records the type;
//! readers pick the interpretation.

use crate::error::{MessageError, Result};

/// One scalar or byte-run value destined for a payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Field {
    /// 1 byte.
    U8(u8),
    /// 1 byte, 0 or 1.
    Bool(bool),
    /// 1 byte.
    Char(u8),
    /// 2 bytes, big-endian.
    U16(u16),
    /// 2 bytes, big-endian two's complement.
    I16(i16),
    /// 4 bytes, big-endian.
    U32(u32),
    /// 4 bytes, big-endian two's complement.
    I32(i32),
    /// Raw UTF-8 bytes, no terminator.
    Str(String),
    /// Raw bytes.
    Bytes(Vec<u8>),
}

impl Field {
    /// Pick the narrowest width for an integer.
    ///
    /// `[0, 255]` → 1 byte, `[0, 65535]` → unsigned 2 bytes,
    /// `[-32768, -1]` → signed 2 bytes, rest of the `i32` range → 4 bytes.
    pub fn auto(value: i64) -> Result<Self> {
        if let Ok(v) = u8::try_from(value) {
            return Ok(Field::U8(v));
        }
        if let Ok(v) = u16::try_from(value) {
            return Ok(Field::U16(v));
        }
        if let Ok(v) = i16::try_from(value) {
            return Ok(Field::I16(v));
        }
        i32::try_from(value)
            .map(Field::I32)
            .map_err(|_| MessageError::IntegerOutOfRange(value))
    }

    /// Legacy float encoding: the value truncated toward zero into 4 bytes.
    ///
    /// The fractional part is lost; there is no IEEE-754 field type.
    pub fn truncated_float(value: f64) -> Result<Self> {
        let truncated = value.trunc();
        if !truncated.is_finite()
            || truncated < f64::from(i32::MIN)
            || truncated > f64::from(i32::MAX)
        {
            return Err(MessageError::FloatOutOfRange(value));
        }
        Ok(Field::I32(truncated as i32))
    }

    /// Encoded width in bytes, before delimiter escaping.
    pub fn width(&self) -> usize {
        match self {
            Field::U8(_) | Field::Bool(_) | Field::Char(_) => 1,
            Field::U16(_) | Field::I16(_) => 2,
            Field::U32(_) | Field::I32(_) => 4,
            Field::Str(s) => s.len(),
            Field::Bytes(b) => b.len(),
        }
    }

    /// Append the unescaped encoding to `dst`.
    pub fn encode_into(&self, dst: &mut Vec<u8>) {
        match self {
            Field::U8(v) | Field::Char(v) => dst.push(*v),
            Field::Bool(v) => dst.push(u8::from(*v)),
            Field::U16(v) => dst.extend_from_slice(&v.to_be_bytes()),
            Field::I16(v) => dst.extend_from_slice(&v.to_be_bytes()),
            Field::U32(v) => dst.extend_from_slice(&v.to_be_bytes()),
            Field::I32(v) => dst.extend_from_slice(&v.to_be_bytes()),
            Field::Str(s) => dst.extend_from_slice(s.as_bytes()),
            Field::Bytes(b) => dst.extend_from_slice(b),
        }
    }

    /// Short type name for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Field::U8(_) => "u8",
            Field::Bool(_) => "bool",
            Field::Char(_) => "char",
            Field::U16(_) => "u16",
            Field::I16(_) => "i16",
            Field::U32(_) => "u32",
            Field::I32(_) => "i32",
            Field::Str(_) => "str",
            Field::Bytes(_) => "bytes",
        }
    }
}

impl From<u8> for Field {
    fn from(v: u8) -> Self {
        Field::U8(v)
    }
}

impl From<bool> for Field {
    fn from(v: bool) -> Self {
        Field::Bool(v)
    }
}

impl From<u16> for Field {
    fn from(v: u16) -> Self {
        Field::U16(v)
    }
}

impl From<i16> for Field {
    fn from(v: i16) -> Self {
        Field::I16(v)
    }
}

impl From<u32> for Field {
    fn from(v: u32) -> Self {
        Field::U32(v)
    }
}

impl From<i32> for Field {
    fn from(v: i32) -> Self {
        Field::I32(v)
    }
}

impl From<&str> for Field {
    fn from(v: &str) -> Self {
        Field::Str(v.to_string())
    }
}

impl From<String> for Field {
    fn from(v: String) -> Self {
        Field::Str(v)
    }
}

impl From<Vec<u8>> for Field {
    fn from(v: Vec<u8>) -> Self {
        Field::Bytes(v)
    }
}

impl From<&[u8]> for Field {
    fn from(v: &[u8]) -> Self {
        Field::Bytes(v.to_vec())
    }
}
