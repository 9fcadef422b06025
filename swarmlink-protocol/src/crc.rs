//! CRC16 checksum shared by both links
//!
//! Reflected CRC16 with polynomial 0xA001 and seed 0xFFFF (the MODBUS
//! variant). Every peer on the network computes it the same way, so the
//! constants here are part of the wire format.

/// Reflected polynomial
pub const CRC16_POLY: u16 = 0xA001;

/// Initial register value
pub const CRC16_SEED: u16 = 0xFFFF;

/// Incremental CRC16 hasher
///
/// Lets the stream framer checksum the header and payload buffers without
/// copying them into one contiguous frame first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Crc16 {
    state: u16,
}

impl Default for Crc16 {
    fn default() -> Self {
        Self::new()
    }
}

impl Crc16 {
    /// Start a new checksum
    pub const fn new() -> Self {
        Self { state: CRC16_SEED }
    }

    /// Feed more bytes
    pub fn update(&mut self, data: &[u8]) -> &mut Self {
        for &byte in data {
            self.state ^= byte as u16;
            for _ in 0..8 {
                if self.state & 1 != 0 {
                    self.state = (self.state >> 1) ^ CRC16_POLY;
                } else {
                    self.state >>= 1;
                }
            }
        }
        self
    }

    /// Current checksum value
    pub fn finish(&self) -> u16 {
        self.state
    }
}

/// CRC16 over every byte of `data`
pub fn crc16(data: &[u8]) -> u16 {
    Crc16::new().update(data).finish()
}

/// Checksum of a complete frame, excluding its own trailing 2-byte field
///
/// Returns 0 for inputs shorter than 3 bytes. That is a guard against a
/// mis-sliced buffer, not a checksum outcome; real frames are always at
/// least a header plus the checksum field.
pub fn frame_checksum(frame: &[u8]) -> u16 {
    if frame.len() < 3 {
        return 0;
    }
    crc16(&frame[..frame.len() - 2])
}

/// Checksum stored in the last two bytes of a frame (little-endian)
pub fn embedded_checksum(frame: &[u8]) -> Option<u16> {
    let n = frame.len();
    if n < 2 {
        return None;
    }
    Some(u16::from_le_bytes([frame[n - 2], frame[n - 1]]))
}

/// Compute the frame checksum and write it into the trailing 2 bytes
pub fn seal(frame: &mut [u8]) {
    let n = frame.len();
    if n < 3 {
        return;
    }
    let crc = frame_checksum(frame);
    frame[n - 2..].copy_from_slice(&crc.to_le_bytes());
}
