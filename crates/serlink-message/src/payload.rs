use std::ops::Range;

use tracing::trace;

use crate::config::{MessageConfig, OVERHEAD};
use crate::error::{MessageError, Result};
use crate::field::Field;

/// Delimiter-separated field storage for one message.
///
/// Bytes are kept in wire form. A field byte equal to the delimiter or the
/// escape byte is written as `escape, byte`, so a bare delimiter is always a
/// field boundary. Payloads with neither byte in their data are identical to
/// the unescaped legacy layout.
///
/// A legacy sender does not escape, so a raw escape byte in its data (for
/// example the `u16` value `0x1B41`) is read here as an escape sequence and
/// the field comes out one byte short. Such payloads still pass the checksum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload {
    bytes: Vec<u8>,
    capacity: usize,
    delimiter: u8,
    escape: u8,
}

impl Payload {
    /// Create an empty payload sized for `config`.
    pub fn new(config: &MessageConfig) -> Self {
        Self {
            bytes: Vec::with_capacity(config.payload_capacity()),
            capacity: config.payload_capacity(),
            delimiter: config.delimiter,
            escape: config.escape,
        }
    }

    /// Adopt payload bytes received off the wire.
    pub(crate) fn from_wire(bytes: &[u8], config: &MessageConfig) -> Self {
        let mut payload = Self::new(config);
        payload.bytes.extend_from_slice(bytes);
        payload
    }

    /// Wire-form bytes (this is `data[0..dataSize)`).
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// `dataSize`.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Largest `dataSize` this payload accepts.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.bytes.clear();
    }

    /// Append one field, inserting a delimiter when fields already exist.
    ///
    /// Fails without mutation if the result would exceed the capacity.
    pub fn append(&mut self, field: &Field) -> Result<()> {
        let mut raw = Vec::with_capacity(field.width());
        field.encode_into(&mut raw);
        if raw.is_empty() {
            return Err(MessageError::EmptyValue);
        }

        let escaped = self.escape_bytes(&raw);
        let separator = usize::from(!self.bytes.is_empty());
        let new_len = self.bytes.len() + separator + escaped.len();
        if new_len > self.capacity {
            return Err(MessageError::Oversize {
                size: OVERHEAD + new_len,
                max: OVERHEAD + self.capacity,
            });
        }

        if separator == 1 {
            self.bytes.push(self.delimiter);
        }
        self.bytes.extend_from_slice(&escaped);
        trace!(kind = field.kind(), data_size = self.bytes.len(), "appended field");
        Ok(())
    }

    /// Number of fields: unescaped delimiters plus one, or zero when empty.
    pub fn field_count(&self) -> usize {
        if self.bytes.is_empty() {
            return 0;
        }
        self.delimiter_positions().len() + 1
    }

    /// Byte range of field `index` within [`Payload::as_bytes`].
    pub fn locate(&self, index: usize) -> Option<Range<usize>> {
        if self.bytes.is_empty() {
            return None;
        }
        let positions = self.delimiter_positions();
        if index > positions.len() {
            return None;
        }
        let start = if index == 0 {
            0
        } else {
            positions[index - 1] + 1
        };
        let end = positions.get(index).copied().unwrap_or(self.bytes.len());
        Some(start..end)
    }

    /// Unescaped bytes of field `index`.
    pub fn field(&self, index: usize) -> Result<Vec<u8>> {
        let range = self
            .locate(index)
            .ok_or_else(|| MessageError::FieldNotFound {
                index,
                count: self.field_count(),
            })?;
        Ok(self.unescape_bytes(&self.bytes[range]))
    }

    /// Unescaped bytes of every field, in order.
    pub fn fields(&self) -> Vec<Vec<u8>> {
        (0..self.field_count())
            .filter_map(|index| self.field(index).ok())
            .collect()
    }

    pub fn read_u8(&self, index: usize) -> Result<u8> {
        let bytes = self.field(index)?;
        match bytes.as_slice() {
            [b] => Ok(*b),
            _ => Err(width_error(index, bytes.len(), "u8")),
        }
    }

    pub fn read_bool(&self, index: usize) -> Result<bool> {
        let bytes = self.field(index)?;
        match bytes.as_slice() {
            [b] => Ok(*b != 0),
            _ => Err(width_error(index, bytes.len(), "bool")),
        }
    }

    /// A single byte as a Latin-1 character.
    pub fn read_char(&self, index: usize) -> Result<char> {
        let bytes = self.field(index)?;
        match bytes.as_slice() {
            [b] => Ok(char::from(*b)),
            _ => Err(width_error(index, bytes.len(), "char")),
        }
    }

    /// Big-endian unsigned value of a field up to 4 bytes wide.
    pub fn read_uint(&self, index: usize) -> Result<u32> {
        self.read_unsigned(index, 4, "unsigned integer")
    }

    pub fn read_u16(&self, index: usize) -> Result<u16> {
        let value = self.read_unsigned(index, 2, "u16")?;
        u16::try_from(value).map_err(|_| width_error(index, 4, "u16"))
    }

    pub fn read_u32(&self, index: usize) -> Result<u32> {
        self.read_unsigned(index, 4, "u32")
    }

    fn read_unsigned(&self, index: usize, max_width: usize, requested: &'static str) -> Result<u32> {
        let bytes = self.field(index)?;
        if bytes.is_empty() || bytes.len() > max_width {
            return Err(width_error(index, bytes.len(), requested));
        }
        Ok(bytes
            .iter()
            .fold(0u32, |acc, &b| (acc << 8) | u32::from(b)))
    }

    /// Signed value: 2-byte fields are sign-extended, 1-byte fields are
    /// unsigned.
    pub fn read_i16(&self, index: usize) -> Result<i16> {
        let bytes = self.field(index)?;
        match bytes.as_slice() {
            [b] => Ok(i16::from(*b)),
            [hi, lo] => Ok(i16::from_be_bytes([*hi, *lo])),
            _ => Err(width_error(index, bytes.len(), "i16")),
        }
    }

    /// Signed value: 4- and 2-byte fields are sign-extended from their width,
    /// 1-byte fields are unsigned.
    pub fn read_i32(&self, index: usize) -> Result<i32> {
        let bytes = self.field(index)?;
        match bytes.as_slice() {
            [b] => Ok(i32::from(*b)),
            [hi, lo] => Ok(i32::from(i16::from_be_bytes([*hi, *lo]))),
            [a, b, c, d] => Ok(i32::from_be_bytes([*a, *b, *c, *d])),
            _ => Err(width_error(index, bytes.len(), "i32")),
        }
    }

    pub fn read_str(&self, index: usize) -> Result<String> {
        String::from_utf8(self.field(index)?).map_err(|_| MessageError::InvalidUtf8 { index })
    }

    /// Every byte as a Latin-1 character.
    pub fn read_chars(&self, index: usize) -> Result<Vec<char>> {
        Ok(self.field(index)?.into_iter().map(char::from).collect())
    }

    pub fn read_bytes(&self, index: usize) -> Result<Vec<u8>> {
        self.field(index)
    }

    fn delimiter_positions(&self) -> Vec<usize> {
        let mut positions = Vec::new();
        let mut i = 0;
        while i < self.bytes.len() {
            let byte = self.bytes[i];
            if byte == self.escape {
                i += 2;
                continue;
            }
            if byte == self.delimiter {
                positions.push(i);
            }
            i += 1;
        }
        positions
    }

    fn escape_bytes(&self, raw: &[u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity(raw.len());
        for &byte in raw {
            if byte == self.delimiter || byte == self.escape {
                out.push(self.escape);
            }
            out.push(byte);
        }
        out
    }

    fn unescape_bytes(&self, wire: &[u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity(wire.len());
        let mut iter = wire.iter().copied();
        while let Some(byte) = iter.next() {
            if byte == self.escape {
                // A trailing escape has nothing to protect; keep it literally.
                out.push(iter.next().unwrap_or(byte));
            } else {
                out.push(byte);
            }
        }
        out
    }
}

fn width_error(index: usize, width: usize, requested: &'static str) -> MessageError {
    MessageError::FieldWidth {
        index,
        width,
        requested,
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::config::{FIELD_DELIMITER, FIELD_ESCAPE};

    fn payload() -> Payload {
        Payload::new(&MessageConfig::default())
    }

    #[test]
    fn first_field_has_no_leading_delimiter() {
        let mut p = payload();
        p.append(&Field::U8(42)).unwrap();
        assert_eq!(p.as_bytes(), &[42]);
        assert_eq!(p.field_count(), 1);
    }

    #[test]
    fn fields_are_joined_by_delimiter() {
        let mut p = payload();
        p.append(&Field::U8(1)).unwrap();
        p.append(&Field::from("ab")).unwrap();
        p.append(&Field::U16(300)).unwrap();

        assert_eq!(
            p.as_bytes(),
            &[1, FIELD_DELIMITER, b'a', b'b', FIELD_DELIMITER, 0x01, 0x2C]
        );
        assert_eq!(p.field_count(), 3);
        assert_eq!(p.read_u8(0).unwrap(), 1);
        assert_eq!(p.read_str(1).unwrap(), "ab");
        assert_eq!(p.read_u16(2).unwrap(), 300);
    }

    #[test]
    fn empty_payload_has_no_fields() {
        let p = payload();
        assert_eq!(p.field_count(), 0);
        assert_eq!(p.locate(0), None);
        assert!(matches!(
            p.read_u8(0),
            Err(MessageError::FieldNotFound { index: 0, count: 0 })
        ));
    }

    #[test]
    fn unescaped_legacy_escape_byte_shortens_field() {
        let p = Payload::from_wire(&[FIELD_ESCAPE, 0x41], &MessageConfig::default());
        assert_eq!(p.field_count(), 1);
        assert_eq!(p.read_bytes(0).unwrap(), vec![0x41]);
        assert_eq!(p.read_u16(0).unwrap(), 0x41);
    }

    #[test]
    fn locate_returns_segment_ranges() {
        let mut p = payload();
        p.append(&Field::from("abc")).unwrap();
        p.append(&Field::U8(7)).unwrap();

        assert_eq!(p.locate(0), Some(0..3));
        assert_eq!(p.locate(1), Some(4..5));
        assert_eq!(p.locate(2), None);
    }

    #[test]
    fn index_past_last_field_fails() {
        let mut p = payload();
        p.append(&Field::U8(1)).unwrap();
        p.append(&Field::U8(2)).unwrap();
        assert!(matches!(
            p.read_u8(5),
            Err(MessageError::FieldNotFound { index: 5, count: 2 })
        ));
    }

    #[test]
    fn delimiter_valued_bytes_are_escaped() {
        let mut p = payload();
        p.append(&Field::U8(FIELD_DELIMITER)).unwrap();
        p.append(&Field::U16(u16::from_be_bytes([FIELD_ESCAPE, FIELD_DELIMITER])))
            .unwrap();

        assert_eq!(
            p.as_bytes(),
            &[
                FIELD_ESCAPE,
                FIELD_DELIMITER,
                FIELD_DELIMITER,
                FIELD_ESCAPE,
                FIELD_ESCAPE,
                FIELD_ESCAPE,
                FIELD_DELIMITER
            ]
        );
        assert_eq!(p.field_count(), 2);
        assert_eq!(p.read_u8(0).unwrap(), FIELD_DELIMITER);
        assert_eq!(
            p.read_u16(1).unwrap(),
            u16::from_be_bytes([FIELD_ESCAPE, FIELD_DELIMITER])
        );
    }

    #[test]
    fn oversize_append_leaves_payload_unchanged() {
        let cfg = MessageConfig {
            max_size: 8 + 5,
            ..MessageConfig::default()
        };
        let mut p = Payload::new(&cfg);
        p.append(&Field::U8(1)).unwrap();
        p.append(&Field::U16(2)).unwrap();
        assert_eq!(p.len(), 4);

        let err = p.append(&Field::U8(3)).unwrap_err();
        assert_eq!(err, MessageError::Oversize { size: 14, max: 13 });
        assert_eq!(p.len(), 4);
        assert_eq!(p.field_count(), 2);
    }

    #[test]
    fn fill_until_capacity_then_reject() {
        let mut p = payload();
        let mut accepted = 0;
        while p.append(&Field::U8(9)).is_ok() {
            accepted += 1;
        }
        // n one-byte fields take 2n - 1 bytes.
        assert_eq!(accepted, (p.capacity() + 1) / 2);
        let before = p.len();
        assert!(p.append(&Field::U8(9)).is_err());
        assert_eq!(p.len(), before);
    }

    #[test]
    fn empty_values_are_rejected() {
        let mut p = payload();
        assert_eq!(p.append(&Field::from("")), Err(MessageError::EmptyValue));
        assert!(p.is_empty());
    }

    #[test]
    fn typed_readers_check_width() {
        let mut p = payload();
        p.append(&Field::from("hello")).unwrap();
        assert!(matches!(
            p.read_u8(0),
            Err(MessageError::FieldWidth { width: 5, .. })
        ));
        assert!(p.read_uint(0).is_err());
        assert_eq!(
            p.read_chars(0).unwrap(),
            vec!['h', 'e', 'l', 'l', 'o']
        );
    }

    #[test]
    fn signed_readers_sign_extend() {
        let mut p = payload();
        p.append(&Field::auto(-5).unwrap()).unwrap();
        p.append(&Field::I32(-70_000)).unwrap();
        p.append(&Field::auto(200).unwrap()).unwrap();

        assert_eq!(p.read_i16(0).unwrap(), -5);
        assert_eq!(p.read_i32(0).unwrap(), -5);
        assert_eq!(p.read_i32(1).unwrap(), -70_000);
        assert_eq!(p.read_i32(2).unwrap(), 200);
        assert_eq!(p.read_u16(0).unwrap(), 0xFFFB);
    }

    #[test]
    fn wire_payload_with_bare_delimiters_splits() {
        let p = Payload::from_wire(b"ab|cd|e", &MessageConfig::default());
        assert_eq!(p.field_count(), 3);
        assert_eq!(p.read_str(1).unwrap(), "cd");
        assert_eq!(p.read_char(2).unwrap(), 'e');
    }

    fn boundary_u32() -> impl Strategy<Value = u32> {
        prop_oneof![
            Just(0u32),
            Just(255),
            Just(256),
            Just(65_535),
            Just(65_536),
            Just(u32::MAX),
            any::<u32>(),
        ]
    }

    fn boundary_i32() -> impl Strategy<Value = i32> {
        prop_oneof![
            Just(i32::MIN),
            Just(-32_768),
            Just(-1),
            Just(0),
            Just(32_767),
            Just(i32::MAX),
            any::<i32>(),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(256))]

        #[test]
        fn u8_roundtrip(v in any::<u8>()) {
            let mut p = payload();
            p.append(&Field::U8(0)).unwrap();
            p.append(&Field::U8(v)).unwrap();
            prop_assert_eq!(p.read_u8(1).unwrap(), v);
        }

        #[test]
        fn u16_roundtrip(v in any::<u16>()) {
            let mut p = payload();
            p.append(&Field::U16(v)).unwrap();
            p.append(&Field::U8(FIELD_DELIMITER)).unwrap();
            prop_assert_eq!(p.read_u16(0).unwrap(), v);
            prop_assert_eq!(p.field_count(), 2);
        }

        #[test]
        fn i16_roundtrip(v in any::<i16>()) {
            let mut p = payload();
            p.append(&Field::I16(v)).unwrap();
            prop_assert_eq!(p.read_i16(0).unwrap(), v);
        }

        #[test]
        fn u32_roundtrip(v in boundary_u32()) {
            let mut p = payload();
            p.append(&Field::from("x")).unwrap();
            p.append(&Field::U32(v)).unwrap();
            prop_assert_eq!(p.read_u32(1).unwrap(), v);
        }

        #[test]
        fn i32_roundtrip(v in boundary_i32()) {
            let mut p = payload();
            p.append(&Field::I32(v)).unwrap();
            prop_assert_eq!(p.read_i32(0).unwrap(), v);
        }

        #[test]
        fn auto_roundtrip_through_matching_reader(v in boundary_i32()) {
            let field = Field::auto(i64::from(v)).unwrap();
            let mut p = payload();
            p.append(&field).unwrap();
            let decoded = match field {
                Field::U8(_) => i64::from(p.read_u8(0).unwrap()),
                Field::U16(_) => i64::from(p.read_u16(0).unwrap()),
                Field::I16(_) => i64::from(p.read_i16(0).unwrap()),
                Field::I32(_) => i64::from(p.read_i32(0).unwrap()),
                other => panic!("unexpected auto field {other:?}"),
            };
            prop_assert_eq!(decoded, i64::from(v));
        }

        #[test]
        fn bool_roundtrip(v in any::<bool>()) {
            let mut p = payload();
            p.append(&Field::Bool(v)).unwrap();
            prop_assert_eq!(p.read_bool(0).unwrap(), v);
        }

        #[test]
        fn string_roundtrip(s in "[ -~]{1,40}") {
            let mut p = payload();
            p.append(&Field::U8(1)).unwrap();
            p.append(&Field::from(s.as_str())).unwrap();
            p.append(&Field::U8(2)).unwrap();
            prop_assert_eq!(p.read_str(1).unwrap(), s);
            prop_assert_eq!(p.field_count(), 3);
        }

        #[test]
        fn bytes_roundtrip(b in proptest::collection::vec(any::<u8>(), 1..40)) {
            let mut p = payload();
            p.append(&Field::Bytes(b.clone())).unwrap();
            p.append(&Field::U8(0)).unwrap();
            prop_assert_eq!(p.read_bytes(0).unwrap(), b);
        }
    }
}
