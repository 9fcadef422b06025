//! Frame validation and stream resynchronization
//!
//! Frame format (little-endian):
//! - PREAMBLE (2 bytes): 0xAA55, transmitted as `55 AA`
//! - PAYLOAD_SIZE (1 byte): bytes after the header, checksum included (2-128)
//! - TYPE (1 byte): packet kind code
//! - NETWORK_ID (1 byte): logical partition of the swarm
//! - BODY (0-126 bytes): type-specific data
//! - CRC16 (2 bytes): over header and body

use core::fmt;

use heapless::Vec;

use crate::crc::{self, Crc16};
use crate::kind::PacketKind;

/// Frame synchronization marker
pub const PREAMBLE: u16 = 0xAA55;

/// Preamble as it appears on the wire
pub const PREAMBLE_BYTES: [u8; 2] = PREAMBLE.to_le_bytes();

/// Fixed header size (preamble, payload size, type, network id)
pub const HEADER_SIZE: usize = 5;

/// Width of the trailing checksum
pub const CRC_SIZE: usize = 2;

/// Largest `PAYLOAD_SIZE` a header may declare
pub const MAX_PAYLOAD_SIZE: usize = 128;

/// Smallest `PAYLOAD_SIZE` a header may declare (room for the checksum)
pub const MIN_PAYLOAD_SIZE: usize = CRC_SIZE;

/// Largest body a frame can carry
pub const MAX_BODY_SIZE: usize = MAX_PAYLOAD_SIZE - CRC_SIZE;

/// Largest complete frame
pub const MAX_FRAME_SIZE: usize = HEADER_SIZE + MAX_PAYLOAD_SIZE;

/// Default payload accumulation capacity of the stream framer
pub const RX_BUFFER_SIZE: usize = 256;

/// Errors that can occur during frame validation or encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    /// Fewer bytes than a header
    TooShort,
    /// Preamble does not match
    BadPreamble,
    /// Declared payload size outside 2..=128
    PayloadSizeOutOfRange(u8),
    /// Declared payload size disagrees with the buffer length
    LengthMismatch { declared: u8, actual: usize },
    /// Payload did not fit the accumulation buffer
    Overflow,
    /// Checksum mismatch
    ChecksumMismatch { computed: u16, received: u16 },
    /// Payload size does not match the fixed layout of a known kind
    LayoutMismatch {
        kind: PacketKind,
        expected: u8,
        actual: u8,
    },
    /// Buffer too small for encoding
    BufferTooSmall,
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameError::TooShort => write!(f, "frame shorter than header"),
            FrameError::BadPreamble => write!(f, "bad preamble"),
            FrameError::PayloadSizeOutOfRange(n) => write!(f, "payload size {} out of range", n),
            FrameError::LengthMismatch { declared, actual } => {
                write!(f, "declared payload {} but {} bytes follow header", declared, actual)
            }
            FrameError::Overflow => write!(f, "payload buffer overflow"),
            FrameError::ChecksumMismatch { computed, received } => write!(
                f,
                "crc mismatch: computed {:#06x}, received {:#06x}",
                computed, received
            ),
            FrameError::LayoutMismatch {
                kind,
                expected,
                actual,
            } => write!(
                f,
                "{} frame declares payload {} (expected {})",
                kind.name(),
                actual,
                expected
            ),
            FrameError::BufferTooSmall => write!(f, "buffer too small"),
        }
    }
}

/// Decoded frame header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FrameHeader {
    /// Bytes following the header, checksum included
    pub payload_size: u8,
    /// Raw packet kind code
    pub packet_type: u8,
    /// Network partition
    pub network_id: u8,
}

impl FrameHeader {
    /// Parse the header at the front of `bytes`
    ///
    /// Only checks that a header is present and the preamble matches; size
    /// checks belong to [`Frame::from_bytes`].
    pub fn parse(bytes: &[u8]) -> Result<Self, FrameError> {
        if bytes.len() < HEADER_SIZE {
            return Err(FrameError::TooShort);
        }
        if bytes[..2] != PREAMBLE_BYTES {
            return Err(FrameError::BadPreamble);
        }
        Ok(Self {
            payload_size: bytes[2],
            packet_type: bytes[3],
            network_id: bytes[4],
        })
    }

    /// Encode this header into its wire bytes
    pub fn encode(&self) -> [u8; HEADER_SIZE] {
        [
            PREAMBLE_BYTES[0],
            PREAMBLE_BYTES[1],
            self.payload_size,
            self.packet_type,
            self.network_id,
        ]
    }

    /// Packet kind, if the type code is known
    pub fn kind(&self) -> Option<PacketKind> {
        PacketKind::from_byte(self.packet_type)
    }

    fn check_payload_size(&self) -> Result<(), FrameError> {
        let size = self.payload_size as usize;
        if !(MIN_PAYLOAD_SIZE..=MAX_PAYLOAD_SIZE).contains(&size) {
            return Err(FrameError::PayloadSizeOutOfRange(self.payload_size));
        }
        Ok(())
    }
}

/// A complete frame: header, body and checksum as raw wire bytes
///
/// Construction guarantees the shape (preamble, declared size matches the
/// length). The checksum and per-kind layout are checked separately so that
/// callers can apply their own ordering of rejections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    bytes: Vec<u8, MAX_FRAME_SIZE>,
}

impl Frame {
    /// Validate the shape of a whole frame received as one buffer
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, FrameError> {
        let header = FrameHeader::parse(bytes)?;
        let actual = bytes.len() - HEADER_SIZE;
        if actual != header.payload_size as usize {
            return Err(FrameError::LengthMismatch {
                declared: header.payload_size,
                actual,
            });
        }
        header.check_payload_size()?;

        let mut vec = Vec::new();
        vec.extend_from_slice(bytes)
            .map_err(|_| FrameError::BufferTooSmall)?;
        Ok(Self { bytes: vec })
    }

    /// Build a sealed frame around `body`
    pub fn build(packet_type: u8, network_id: u8, body: &[u8]) -> Result<Self, FrameError> {
        if body.len() > MAX_BODY_SIZE {
            return Err(FrameError::BufferTooSmall);
        }
        let header = FrameHeader {
            payload_size: (body.len() + CRC_SIZE) as u8,
            packet_type,
            network_id,
        };

        let mut bytes = Vec::new();
        bytes
            .extend_from_slice(&header.encode())
            .map_err(|_| FrameError::BufferTooSmall)?;
        bytes
            .extend_from_slice(body)
            .map_err(|_| FrameError::BufferTooSmall)?;
        bytes
            .extend_from_slice(&[0, 0])
            .map_err(|_| FrameError::BufferTooSmall)?;
        crc::seal(&mut bytes);

        Ok(Self { bytes })
    }

    /// Join an already-validated header and payload
    fn assemble(header: &[u8; HEADER_SIZE], payload: &[u8]) -> Result<Self, FrameError> {
        let mut bytes = Vec::new();
        bytes
            .extend_from_slice(header)
            .map_err(|_| FrameError::BufferTooSmall)?;
        bytes
            .extend_from_slice(payload)
            .map_err(|_| FrameError::BufferTooSmall)?;
        Ok(Self { bytes })
    }

    /// Decoded header
    pub fn header(&self) -> FrameHeader {
        FrameHeader {
            payload_size: self.bytes[2],
            packet_type: self.bytes[3],
            network_id: self.bytes[4],
        }
    }

    /// Packet kind, if the type code is known
    pub fn kind(&self) -> Option<PacketKind> {
        PacketKind::from_byte(self.bytes[3])
    }

    /// Raw type code
    pub fn packet_type(&self) -> u8 {
        self.bytes[3]
    }

    /// Network partition
    pub fn network_id(&self) -> u8 {
        self.bytes[4]
    }

    /// Type-specific body between header and checksum
    pub fn body(&self) -> &[u8] {
        &self.bytes[HEADER_SIZE..self.bytes.len() - CRC_SIZE]
    }

    /// Checksum carried in the frame
    pub fn checksum(&self) -> u16 {
        // Frames always end in the checksum field
        crc::embedded_checksum(&self.bytes).unwrap_or_default()
    }

    /// Whole frame as wire bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Frame length in bytes
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Always false: a frame holds at least a header and checksum
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Recompute the checksum and compare it with the embedded one
    pub fn verify_checksum(&self) -> Result<(), FrameError> {
        let computed = crc::frame_checksum(&self.bytes);
        let received = self.checksum();
        if computed != received {
            return Err(FrameError::ChecksumMismatch { computed, received });
        }
        Ok(())
    }

    /// Check the declared size against the fixed layout of a known kind
    ///
    /// Unknown kinds and [`PacketKind::BulkData`] pass; routing decides what
    /// to do with them.
    pub fn check_layout(&self) -> Result<(), FrameError> {
        let header = self.header();
        if let Some(kind) = header.kind() {
            if let Some(expected) = kind.payload_size() {
                if expected != header.payload_size {
                    return Err(FrameError::LayoutMismatch {
                        kind,
                        expected,
                        actual: header.payload_size,
                    });
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParseState {
    /// Sliding a 2-byte window over the input
    SearchingPreamble,
    /// Preamble found, collecting the rest of the header
    ReadingHeader,
    /// Collecting `payload_size` bytes
    ReadingPayload,
}

/// State machine that extracts verified frames from an unframed byte stream
///
/// `N` is the payload accumulation capacity. A header that declares more
/// payload than `N` resets the framer once the buffer fills, so memory stays
/// bounded under line noise.
#[derive(Debug, Clone)]
pub struct StreamFramer<const N: usize = RX_BUFFER_SIZE> {
    state: ParseState,
    header: [u8; HEADER_SIZE],
    header_len: usize,
    payload: Vec<u8, N>,
}

impl<const N: usize> Default for StreamFramer<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> StreamFramer<N> {
    /// Create a new framer
    pub fn new() -> Self {
        Self {
            state: ParseState::SearchingPreamble,
            header: [0; HEADER_SIZE],
            header_len: 0,
            payload: Vec::new(),
        }
    }

    /// Discard everything accumulated and search for the next preamble
    pub fn reset(&mut self) {
        self.state = ParseState::SearchingPreamble;
        self.header_len = 0;
        self.payload.clear();
    }

    /// True when no partial frame is buffered
    pub fn is_idle(&self) -> bool {
        self.state == ParseState::SearchingPreamble && self.header_len == 0
    }

    /// Feed a single byte to the framer
    ///
    /// Returns `Ok(Some(frame))` for a checksum-verified frame, `Ok(None)`
    /// when more bytes are needed, or `Err` when a partial frame was
    /// discarded. Every `Err` corresponds to exactly one rejected frame and
    /// leaves the framer searching again.
    pub fn feed(&mut self, byte: u8) -> Result<Option<Frame>, FrameError> {
        match self.state {
            ParseState::SearchingPreamble => {
                if self.header_len == 0 {
                    self.header[0] = byte;
                    self.header_len = 1;
                } else if [self.header[0], byte] == PREAMBLE_BYTES {
                    self.header[1] = byte;
                    self.header_len = 2;
                    self.state = ParseState::ReadingHeader;
                } else {
                    // Shift the window by one byte
                    self.header[0] = byte;
                }
                Ok(None)
            }
            ParseState::ReadingHeader => {
                self.header[self.header_len] = byte;
                self.header_len += 1;
                if self.header_len == HEADER_SIZE {
                    let size = self.header[2] as usize;
                    if !(MIN_PAYLOAD_SIZE..=MAX_PAYLOAD_SIZE).contains(&size) {
                        self.reset();
                        return Err(FrameError::PayloadSizeOutOfRange(size as u8));
                    }
                    self.payload.clear();
                    self.state = ParseState::ReadingPayload;
                }
                Ok(None)
            }
            ParseState::ReadingPayload => {
                if self.payload.push(byte).is_err() {
                    self.reset();
                    return Err(FrameError::Overflow);
                }
                if self.payload.len() < self.header[2] as usize {
                    return Ok(None);
                }
                let result = self.complete();
                self.reset();
                result.map(Some)
            }
        }
    }

    /// Feed a block of bytes, yielding every terminal outcome in order
    ///
    /// Feeding a stream one byte at a time or in arbitrary chunks produces
    /// the same sequence of outcomes.
    pub fn feed_all<'a>(&'a mut self, bytes: &'a [u8]) -> Frames<'a, N> {
        Frames {
            framer: self,
            bytes: bytes.iter(),
        }
    }

    fn complete(&self) -> Result<Frame, FrameError> {
        let split = self.payload.len() - CRC_SIZE;
        let computed = Crc16::new()
            .update(&self.header)
            .update(&self.payload[..split])
            .finish();
        let received = crc::embedded_checksum(&self.payload).unwrap_or_default();
        if computed != received {
            return Err(FrameError::ChecksumMismatch { computed, received });
        }

        let frame = Frame::assemble(&self.header, &self.payload)?;
        frame.check_layout()?;
        Ok(frame)
    }
}

/// Iterator over the outcomes produced by [`StreamFramer::feed_all`]
pub struct Frames<'a, const N: usize> {
    framer: &'a mut StreamFramer<N>,
    bytes: core::slice::Iter<'a, u8>,
}

impl<const N: usize> Iterator for Frames<'_, N> {
    type Item = Result<Frame, FrameError>;

    fn next(&mut self) -> Option<Self::Item> {
        for &byte in self.bytes.by_ref() {
            match self.framer.feed(byte) {
                Ok(None) => continue,
                Ok(Some(frame)) => return Some(Ok(frame)),
                Err(e) => return Some(Err(e)),
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn telemetry_body() -> [u8; 25] {
        let mut body = [0u8; 25];
        body[0] = 7;
        for (i, b) in body.iter_mut().enumerate().skip(1) {
            *b = i as u8;
        }
        body
    }

    fn telemetry_frame() -> Frame {
        Frame::build(PacketKind::Telemetry.to_byte(), 0x12, &telemetry_body()).unwrap()
    }

    fn collect(
        framer: &mut StreamFramer,
        bytes: &[u8],
    ) -> std::vec::Vec<Result<Frame, FrameError>> {
        framer.feed_all(bytes).collect()
    }

    #[test]
    fn test_telemetry_header_bytes() {
        let frame = telemetry_frame();
        assert_eq!(&frame.as_bytes()[..5], &[0x55, 0xAA, 0x1B, 0x01, 0x12]);
        assert_eq!(frame.len(), 32);
        assert_eq!(frame.body(), &telemetry_body());
    }

    #[test]
    fn test_parse_telemetry_frame() {
        let frame = telemetry_frame();
        let mut framer = StreamFramer::<RX_BUFFER_SIZE>::new();
        let out = collect(&mut framer, frame.as_bytes());

        assert_eq!(out, std::vec![Ok(frame.clone())]);
        assert_eq!(out[0].as_ref().unwrap().kind(), Some(PacketKind::Telemetry));
        assert_eq!(out[0].as_ref().unwrap().network_id(), 0x12);
        assert!(framer.is_idle());
    }

    #[test]
    fn test_altered_crc_byte_rejected() {
        for idx in [30, 31] {
            let mut bytes = std::vec::Vec::from(telemetry_frame().as_bytes());
            bytes[idx] ^= 0x01;

            let mut framer = StreamFramer::<RX_BUFFER_SIZE>::new();
            let out = collect(&mut framer, &bytes);
            assert_eq!(out.len(), 1);
            assert!(matches!(out[0], Err(FrameError::ChecksumMismatch { .. })));
        }
    }

    #[test]
    fn test_resync_after_garbage() {
        let frame = telemetry_frame();
        let mut data = std::vec![0x00, 0xFF, 0x55, 0x12, 0xAA, 0x55];
        data.extend_from_slice(frame.as_bytes());

        let mut framer = StreamFramer::<RX_BUFFER_SIZE>::new();
        let out = collect(&mut framer, &data);
        assert_eq!(out.last(), Some(&Ok(frame)));
    }

    #[test]
    fn test_preamble_inside_payload_does_not_resync() {
        let mut body = telemetry_body();
        body[3] = 0x55;
        body[4] = 0xAA;
        body[5] = 0x04;
        let frame = Frame::build(PacketKind::Telemetry.to_byte(), 0x12, &body).unwrap();

        let mut framer = StreamFramer::<RX_BUFFER_SIZE>::new();
        let out = collect(&mut framer, frame.as_bytes());
        assert_eq!(out, std::vec![Ok(frame)]);
    }

    #[test]
    fn test_payload_size_out_of_range() {
        let mut framer = StreamFramer::<RX_BUFFER_SIZE>::new();
        let out = collect(&mut framer, &[0x55, 0xAA, 0x81, 0x01, 0x12]);
        assert_eq!(out, std::vec![Err(FrameError::PayloadSizeOutOfRange(0x81))]);

        let out = collect(&mut framer, &[0x55, 0xAA, 0x01, 0x01, 0x12]);
        assert_eq!(out, std::vec![Err(FrameError::PayloadSizeOutOfRange(0x01))]);
        assert!(framer.is_idle());
    }

    #[test]
    fn test_overflow_resets_once() {
        // 16-byte accumulator, header declares 40 bytes of payload
        let mut framer = StreamFramer::<16>::new();
        let mut data = std::vec![0x55, 0xAA, 40, PacketKind::BulkData.to_byte(), 0x12];
        data.extend(std::iter::repeat(0x11).take(17));

        let out: std::vec::Vec<_> = framer.feed_all(&data).collect();
        assert_eq!(out, std::vec![Err(FrameError::Overflow)]);
        assert!(framer.is_idle());

        // Nothing leaks into the next frame
        let next = Frame::build(PacketKind::Ping.to_byte(), 0x12, &[1, 2, 3, 4]).unwrap();
        let out: std::vec::Vec<_> = framer.feed_all(next.as_bytes()).collect();
        assert_eq!(out, std::vec![Ok(next)]);
    }

    #[test]
    fn test_layout_mismatch_rejected() {
        // Command body is 4 bytes; send 5
        let frame = Frame::build(PacketKind::Command.to_byte(), 0x12, &[1, 2, 3, 4, 5]).unwrap();
        let mut framer = StreamFramer::<RX_BUFFER_SIZE>::new();
        let out = collect(&mut framer, frame.as_bytes());
        assert_eq!(
            out,
            std::vec![Err(FrameError::LayoutMismatch {
                kind: PacketKind::Command,
                expected: 6,
                actual: 7,
            })]
        );
    }

    #[test]
    fn test_unknown_kind_passes_framer() {
        let frame = Frame::build(0x42, 0x12, &[9, 9]).unwrap();
        let mut framer = StreamFramer::<RX_BUFFER_SIZE>::new();
        let out = collect(&mut framer, frame.as_bytes());
        assert_eq!(out, std::vec![Ok(frame)]);
    }

    #[test]
    fn test_back_to_back_frames() {
        let a = telemetry_frame();
        let b = Frame::build(PacketKind::Ack.to_byte(), 0x12, &[1, 2, 0, 0]).unwrap();
        let mut data = std::vec::Vec::from(a.as_bytes());
        data.extend_from_slice(b.as_bytes());

        let mut framer = StreamFramer::<RX_BUFFER_SIZE>::new();
        assert_eq!(collect(&mut framer, &data), std::vec![Ok(a), Ok(b)]);
    }

    #[test]
    fn test_from_bytes_shape_checks() {
        let frame = telemetry_frame();
        let bytes = frame.as_bytes();

        assert_eq!(Frame::from_bytes(&bytes[..4]), Err(FrameError::TooShort));
        assert_eq!(
            Frame::from_bytes(&bytes[..20]),
            Err(FrameError::LengthMismatch {
                declared: 27,
                actual: 15
            })
        );

        let mut bad = std::vec::Vec::from(bytes);
        bad[0] = 0x56;
        assert_eq!(Frame::from_bytes(&bad), Err(FrameError::BadPreamble));

        let parsed = Frame::from_bytes(bytes).unwrap();
        assert_eq!(parsed, frame);
        assert_eq!(parsed.verify_checksum(), Ok(()));
    }

    #[test]
    fn test_checksum_is_little_endian_trailer() {
        let frame = telemetry_frame();
        let bytes = frame.as_bytes();
        let n = bytes.len();
        assert_eq!(frame.checksum(), crc::frame_checksum(bytes));
        assert_eq!(frame.checksum().to_le_bytes(), [bytes[n - 2], bytes[n - 1]]);
    }

    #[test]
    fn test_build_rejects_oversized_body() {
        let body = [0u8; MAX_BODY_SIZE + 1];
        assert_eq!(Frame::build(6, 0x12, &body), Err(FrameError::BufferTooSmall));
    }

    fn stream_strategy() -> impl Strategy<Value = std::vec::Vec<u8>> {
        let frame = (prop::collection::vec(any::<u8>(), 0..=MAX_BODY_SIZE), any::<u8>())
            .prop_map(|(body, net)| {
                std::vec::Vec::from(
                    Frame::build(PacketKind::BulkData.to_byte(), net, &body)
                        .unwrap()
                        .as_bytes(),
                )
            });
        let garbage = prop::collection::vec(any::<u8>(), 0..16);
        prop::collection::vec(prop_oneof![frame, garbage], 0..8).prop_map(|parts| parts.concat())
    }

    proptest! {
        #[test]
        fn prop_chunking_does_not_change_outcomes(
            stream in stream_strategy(),
            chunk in 1usize..64,
        ) {
            let mut bytewise = StreamFramer::<RX_BUFFER_SIZE>::new();
            let expected: std::vec::Vec<_> =
                stream.iter().filter_map(|&b| bytewise.feed(b).transpose()).collect();

            let mut chunked = StreamFramer::<RX_BUFFER_SIZE>::new();
            let mut actual = std::vec::Vec::new();
            for part in stream.chunks(chunk) {
                actual.extend(chunked.feed_all(part));
            }

            let mut whole = StreamFramer::<RX_BUFFER_SIZE>::new();
            let block: std::vec::Vec<_> = whole.feed_all(&stream).collect();

            prop_assert_eq!(&expected, &actual);
            prop_assert_eq!(&expected, &block);
        }

        #[test]
        fn prop_resync_after_garbage(
            garbage in prop::collection::vec(any::<u8>(), 0..64),
            body in prop::collection::vec(any::<u8>(), 0..=MAX_BODY_SIZE),
        ) {
            let frame = Frame::build(PacketKind::BulkData.to_byte(), 0x12, &body).unwrap();
            // An idle line longer than one maximum frame closes any false
            // header the garbage may have opened.
            let mut data = garbage.clone();
            data.extend(std::iter::repeat(0u8).take(MAX_FRAME_SIZE));
            data.extend_from_slice(frame.as_bytes());

            let mut framer = StreamFramer::<RX_BUFFER_SIZE>::new();
            let accepted: std::vec::Vec<_> =
                framer.feed_all(&data).filter_map(Result::ok).collect();
            prop_assert!(accepted.contains(&frame));
        }

        #[test]
        fn prop_single_bit_flip_is_detected(
            body in prop::collection::vec(any::<u8>(), 1..=MAX_BODY_SIZE),
            bit in any::<prop::sample::Index>(),
        ) {
            let frame = Frame::build(PacketKind::BulkData.to_byte(), 0x12, &body).unwrap();
            let mut bytes = std::vec::Vec::from(frame.as_bytes());
            let bit = bit.index(body.len() * 8);
            bytes[HEADER_SIZE + bit / 8] ^= 1 << (bit % 8);

            let parsed = Frame::from_bytes(&bytes).unwrap();
            let is_mismatch = matches!(
                parsed.verify_checksum(),
                Err(FrameError::ChecksumMismatch { .. })
            );
            prop_assert!(is_mismatch);
        }
    }
}
