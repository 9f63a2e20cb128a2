use bytes::{BufMut, Bytes, BytesMut};
use tracing::{debug, trace};

use crate::checksum::{self, SEED_INVERSE};
use crate::config::{MessageConfig, HEADER_SIZE, OVERHEAD};
use crate::cursor::FieldCursor;
use crate::error::{AuthError, MessageError, Result};
use crate::field::Field;
use crate::payload::Payload;
use crate::status::CommandStatus;

const DATA_SIZE_OFFSET: usize = 5;

/// One protocol message: header, field payload and checksum.
///
/// Outbound messages are filled with [`append`](Message::append) and
/// serialized with [`build`](Message::build). Inbound messages come from
/// [`parse`](Message::parse) or [`load`](Message::load) and are read with the
/// typed `read_*` accessors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    config: MessageConfig,
    version: u8,
    msg_type: u8,
    status: CommandStatus,
    message_number: u8,
    total_quantity: u8,
    payload: Payload,
    cursor: FieldCursor,
    checksum: u16,
}

impl Message {
    /// Empty message with the default configuration.
    pub fn new() -> Self {
        Self::with_config(MessageConfig::default())
    }

    pub fn with_config(config: MessageConfig) -> Self {
        let payload = Payload::new(&config);
        Self {
            version: config.version,
            msg_type: 0,
            status: CommandStatus::default(),
            message_number: 1,
            total_quantity: 1,
            payload,
            cursor: FieldCursor::new(),
            checksum: 0,
            config,
        }
    }

    /// Reset header, payload, cursor and checksum to their empty state.
    pub fn clear(&mut self) {
        self.version = self.config.version;
        self.msg_type = 0;
        self.status = CommandStatus::default();
        self.message_number = 1;
        self.total_quantity = 1;
        self.payload.clear();
        self.cursor.reset();
        self.checksum = 0;
    }

    pub fn config(&self) -> &MessageConfig {
        &self.config
    }

    pub fn version(&self) -> u8 {
        self.version
    }

    pub fn set_version(&mut self, version: u8) {
        self.version = version;
    }

    pub fn msg_type(&self) -> u8 {
        self.msg_type
    }

    pub fn set_msg_type(&mut self, msg_type: u8) {
        self.msg_type = msg_type;
    }

    pub fn status(&self) -> CommandStatus {
        self.status
    }

    pub fn set_status(&mut self, status: CommandStatus) {
        self.status = status;
    }

    pub fn task_value(&self) -> u8 {
        self.status.task_value()
    }

    pub fn succeeded(&self) -> bool {
        self.status.succeeded()
    }

    pub fn message_number(&self) -> u8 {
        self.message_number
    }

    pub fn set_message_number(&mut self, number: u8) {
        self.message_number = number;
    }

    pub fn total_quantity(&self) -> u8 {
        self.total_quantity
    }

    pub fn set_total_quantity(&mut self, total: u8) {
        self.total_quantity = total;
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// `dataSize` header byte.
    pub fn data_size(&self) -> u8 {
        // Payload capacity never exceeds 255.
        u8::try_from(self.payload.len()).unwrap_or(u8::MAX)
    }

    /// Full wire length, `8 + dataSize`.
    pub fn size(&self) -> usize {
        OVERHEAD + self.payload.len()
    }

    pub fn checksum(&self) -> u16 {
        self.checksum
    }

    pub fn checksum_high(&self) -> u8 {
        self.checksum.to_be_bytes()[0]
    }

    pub fn checksum_low(&self) -> u8 {
        self.checksum.to_be_bytes()[1]
    }

    /// Recompute and store the checksum over header and payload.
    pub fn set_checksum(&mut self) -> u16 {
        let mut acc = checksum::inverse(SEED_INVERSE, &self.header_bytes());
        acc = checksum::inverse(acc, self.payload.as_bytes());
        self.checksum = acc;
        acc
    }

    /// The six header bytes in wire order.
    pub fn header_bytes(&self) -> [u8; HEADER_SIZE] {
        [
            self.version,
            self.msg_type,
            self.status.raw(),
            self.message_number,
            self.total_quantity,
            self.data_size(),
        ]
    }

    /// Serialize with the currently stored checksum.
    pub fn to_bytes(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.size());
        buf.put_slice(&self.header_bytes());
        buf.put_slice(self.payload.as_bytes());
        buf.put_u16(self.checksum);
        buf.freeze()
    }

    /// Append a field, inserting a delimiter after the first.
    pub fn append(&mut self, value: impl Into<Field>) -> Result<()> {
        self.payload.append(&value.into())?;
        self.cursor.reset();
        Ok(())
    }

    /// Append an integer at the narrowest width its value allows.
    pub fn append_auto(&mut self, value: i64) -> Result<()> {
        self.append(Field::auto(value)?)
    }

    /// Append a float using the legacy truncated 4-byte encoding.
    pub fn append_truncated_float(&mut self, value: f64) -> Result<()> {
        self.append(Field::truncated_float(value)?)
    }

    /// Fill the header, checksum the message and return its raw bytes.
    pub fn build(
        &mut self,
        task_value: u8,
        succeeded: bool,
        message_number: u8,
        total_quantity: u8,
    ) -> Result<Bytes> {
        if self.size() > self.config.max_size {
            return Err(MessageError::Oversize {
                size: self.size(),
                max: self.config.max_size,
            });
        }
        self.status = CommandStatus::new(task_value, succeeded);
        self.message_number = message_number;
        self.total_quantity = total_quantity;
        let crc = self.set_checksum();
        trace!(
            task_value = self.task_value(),
            succeeded,
            data_size = self.payload.len(),
            checksum = crc,
            "built message"
        );
        Ok(self.to_bytes())
    }

    /// Checksum over the header and payload of the message at `start`.
    pub fn compute_checksum(bytes: &[u8], start: usize) -> Result<u16> {
        let end = covered_end(bytes, start)?;
        Ok(checksum::inverse(SEED_INVERSE, &bytes[start..end]))
    }

    /// True when the trailer of the message at `start` matches its content.
    pub fn verify(bytes: &[u8], start: usize) -> bool {
        let Ok(computed) = Self::compute_checksum(bytes, start) else {
            return false;
        };
        let Ok(end) = covered_end(bytes, start) else {
            return false;
        };
        match bytes.get(end..end + 2) {
            Some(&[high, low]) => u16::from_be_bytes([high, low]) == computed,
            _ => false,
        }
    }

    /// Decode raw message bytes, checking length, version and checksum.
    ///
    /// Bytes past `8 + dataSize` are ignored.
    pub fn parse(raw: &[u8], config: &MessageConfig) -> Result<Self> {
        if raw.len() < OVERHEAD {
            return Err(AuthError::Truncated {
                len: raw.len(),
                needed: OVERHEAD,
            }
            .into());
        }
        let data_size = usize::from(raw[DATA_SIZE_OFFSET]);
        let needed = OVERHEAD + data_size;
        if raw.len() < needed {
            return Err(AuthError::Truncated {
                len: raw.len(),
                needed,
            }
            .into());
        }
        if data_size > config.payload_capacity() {
            return Err(MessageError::Oversize {
                size: needed,
                max: config.max_size,
            });
        }
        if raw[0] != config.version {
            return Err(AuthError::VersionMismatch {
                expected: config.version,
                found: raw[0],
            }
            .into());
        }

        let payload_end = HEADER_SIZE + data_size;
        let transmitted = u16::from_be_bytes([raw[payload_end], raw[payload_end + 1]]);
        let computed = checksum::inverse(SEED_INVERSE, &raw[..payload_end]);
        if transmitted != computed {
            return Err(AuthError::ChecksumMismatch {
                transmitted,
                computed,
            }
            .into());
        }

        Ok(Self {
            config: config.clone(),
            version: raw[0],
            msg_type: raw[1],
            status: CommandStatus::from_raw(raw[2]),
            message_number: raw[3],
            total_quantity: raw[4],
            payload: Payload::from_wire(&raw[HEADER_SIZE..payload_end], config),
            cursor: FieldCursor::new(),
            checksum: transmitted,
        })
    }

    /// Parse `raw` into this message. On failure the message is cleared.
    pub fn load(&mut self, raw: &[u8]) -> Result<()> {
        match Self::parse(raw, &self.config) {
            Ok(parsed) => {
                *self = parsed;
                Ok(())
            }
            Err(err) => {
                debug!(error = %err, "discarding inbound message");
                self.clear();
                Err(err)
            }
        }
    }

    pub fn field_count(&self) -> usize {
        self.payload.field_count()
    }

    pub fn first_field(&mut self) -> Option<usize> {
        self.cursor.to_first(&self.payload)
    }

    pub fn last_field(&mut self) -> Option<usize> {
        self.cursor.to_last(&self.payload)
    }

    pub fn next_field(&mut self) -> Option<usize> {
        self.cursor.advance(&self.payload)
    }

    pub fn prev_field(&mut self) -> Option<usize> {
        self.cursor.retreat(&self.payload)
    }

    pub fn read_u8(&self, index: usize) -> Result<u8> {
        self.payload.read_u8(index)
    }

    pub fn read_bool(&self, index: usize) -> Result<bool> {
        self.payload.read_bool(index)
    }

    pub fn read_char(&self, index: usize) -> Result<char> {
        self.payload.read_char(index)
    }

    pub fn read_u16(&self, index: usize) -> Result<u16> {
        self.payload.read_u16(index)
    }

    pub fn read_i16(&self, index: usize) -> Result<i16> {
        self.payload.read_i16(index)
    }

    pub fn read_u32(&self, index: usize) -> Result<u32> {
        self.payload.read_u32(index)
    }

    pub fn read_i32(&self, index: usize) -> Result<i32> {
        self.payload.read_i32(index)
    }

    pub fn read_uint(&self, index: usize) -> Result<u32> {
        self.payload.read_uint(index)
    }

    pub fn read_str(&self, index: usize) -> Result<String> {
        self.payload.read_str(index)
    }

    pub fn read_chars(&self, index: usize) -> Result<Vec<char>> {
        self.payload.read_chars(index)
    }

    pub fn read_bytes(&self, index: usize) -> Result<Vec<u8>> {
        self.payload.read_bytes(index)
    }
}

impl Default for Message {
    fn default() -> Self {
        Self::new()
    }
}

fn covered_end(bytes: &[u8], start: usize) -> Result<usize> {
    let data_size = bytes
        .get(start + DATA_SIZE_OFFSET)
        .copied()
        .ok_or(AuthError::Truncated {
            len: bytes.len(),
            needed: start + HEADER_SIZE,
        })?;
    let end = start + HEADER_SIZE + usize::from(data_size);
    if bytes.len() < end {
        return Err(AuthError::Truncated {
            len: bytes.len(),
            needed: end,
        }
        .into());
    }
    Ok(end)
}
