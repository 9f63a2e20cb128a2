//! The packed commandStatus header byte.

const SUCCESS_BIT: u8 = 7;

/// Largest task value representable in the low seven bits.
pub const MAX_TASK_VALUE: u8 = 0x7F;

/// A 7-bit task value plus a success flag in bit 7.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct CommandStatus(u8);

impl CommandStatus {
    /// Pack a task value and success flag. Task values above 127 clamp to 127.
    pub fn new(task_value: u8, succeeded: bool) -> Self {
        Self(write_bit(
            task_value.min(MAX_TASK_VALUE),
            SUCCESS_BIT,
            succeeded,
        ))
    }

    /// Wrap a raw header byte.
    pub const fn from_raw(raw: u8) -> Self {
        Self(raw)
    }

    /// The raw header byte.
    pub const fn raw(self) -> u8 {
        self.0
    }

    pub fn task_value(self) -> u8 {
        clear_bit(self.0, SUCCESS_BIT)
    }

    pub fn succeeded(self) -> bool {
        read_bit(self.0, SUCCESS_BIT)
    }
}

impl From<u8> for CommandStatus {
    fn from(raw: u8) -> Self {
        Self::from_raw(raw)
    }
}

fn read_bit(value: u8, bit: u8) -> bool {
    value & (1 << bit) != 0
}

fn set_bit(value: u8, bit: u8) -> u8 {
    value | (1 << bit)
}

fn clear_bit(value: u8, bit: u8) -> u8 {
    value & !(1 << bit)
}

fn write_bit(value: u8, bit: u8, on: bool) -> u8 {
    if on {
        set_bit(value, bit)
    } else {
        clear_bit(value, bit)
    }
}
