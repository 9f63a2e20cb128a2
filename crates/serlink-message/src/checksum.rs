//! CRC16 engines.
//!
//! Both functions take a running accumulator so a byte sequence can be fed in
//! one or more calls. Callers pick the seed: [`SEED_NORMAL`] for the
//! MSB-first (XMODEM) variant, [`SEED_INVERSE`] for the LSB-first (CCITT)
//! variant. Message checksums always use [`inverse`] seeded with
//! [`SEED_INVERSE`].

/// Generator polynomial for the MSB-first variant.
pub const POLY_NORMAL: u16 = 0x1021;

/// Bit-reversed generator polynomial for the LSB-first variant.
pub const POLY_INVERSE: u16 = 0x8408;

/// Seed for [`normal`].
pub const SEED_NORMAL: u16 = 0x0000;

/// Seed for [`inverse`].
pub const SEED_INVERSE: u16 = 0xFFFF;

/// MSB-first CRC16 update (XMODEM convention).
pub fn normal(acc: u16, bytes: &[u8]) -> u16 {
    bytes.iter().fold(acc, |acc, &byte| {
        let mut crc = acc ^ (u16::from(byte) << 8);
        for _ in 0..8 {
            crc = if crc & 0x8000 != 0 {
                (crc << 1) ^ POLY_NORMAL
            } else {
                crc << 1
            };
        }
        crc
    })
}

/// LSB-first CRC16 update (CCITT convention).
pub fn inverse(acc: u16, bytes: &[u8]) -> u16 {
    bytes.iter().fold(acc, |acc, &byte| {
        let mut crc = acc ^ u16::from(byte);
        for _ in 0..8 {
            crc = if crc & 0x0001 != 0 {
                (crc >> 1) ^ POLY_INVERSE
            } else {
                crc >> 1
            };
        }
        crc
    })
}
