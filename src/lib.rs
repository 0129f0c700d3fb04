#![doc = include_str!("../README.md")]
mod error;
mod protocol;
mod render;
pub mod parser;
pub mod stream;

pub use error::*;
pub use protocol::*;
pub use render::*;
pub use stream::PromptPayStream;

/// CCITT CRC16 Algorithm
///
/// Uses 0x1021 polynomial, 0xFFFF initial value, no reflection and no final xor
/// (CRC-16/CCITT-FALSE, the variant required by EMVCo QR payloads)
pub fn crc16(data: &[u8]) -> u16 {
    let mut crc: u16 = 0xFFFF;
    for &byte in data {
        crc ^= (byte as u16) << 8;
        for _bit in 0..8 {
            if crc & 0x8000 != 0 {
                crc = (crc << 1) ^ 0x1021;
            } else {
                crc <<= 1;
            }
        }
    }
    crc
}

/// Checksum of a checksum-free payload as 4 uppercase hex digits
pub fn checksum(payload: &str) -> String {
    let crc = crc16(payload.as_bytes());
    log::trace!("crc16 over {payload:?} = {crc:04X}");
    format!("{crc:04X}")
}

/// Appends the checksum value to a checksum-free payload
///
/// The payload must already end with the checksum tag and length (`6304`).
pub fn finalize(payload: &str) -> String {
    let mut out = String::with_capacity(payload.len() + 4);
    out.push_str(payload);
    out.push_str(&checksum(payload));
    out
}
