//! Frame checksum (CRC-16/MCRF4XX)
//!
//! Seeded X.25 variant without the final inversion, the checksum MAVLink
//! v1 frames carry. It covers every frame byte after the magic, plus one
//! trailing seed byte per message type so two message definitions with
//! the same layout still fail each other's checksum.

/// Initial accumulator value
pub const CRC_INIT: u16 = 0xFFFF;

/// Fold one byte into the accumulator
pub fn accumulate(byte: u8, crc: u16) -> u16 {
    let mut tmp = byte ^ (crc & 0xFF) as u8;
    tmp ^= tmp << 4;
    (crc >> 8) ^ ((tmp as u16) << 8) ^ ((tmp as u16) << 3) ^ ((tmp as u16) >> 4)
}

/// Checksum a buffer and the per-message seed byte
pub fn checksum(bytes: &[u8], seed: u8) -> u16 {
    let mut crc = CRC_INIT;
    for &byte in bytes {
        crc = accumulate(byte, crc);
    }
    accumulate(seed, crc)
}
