//! Swarm Link Wire Protocol
//!
//! This crate defines the binary frame format spoken on both sides of the
//! bridge: the UART link to the companion computer and the broadcast radio
//! link between swarm units. Both links carry byte-identical frames.
//!
//! # Frame Layout
//!
//! All multi-byte fields are little-endian:
//! ```text
//! ┌──────────┬──────────────┬──────┬────────────┬─────────────┬─────────┐
//! │ PREAMBLE │ PAYLOAD_SIZE │ TYPE │ NETWORK_ID │ BODY        │ CRC16   │
//! │ 2B 55 AA │ 1B           │ 1B   │ 1B         │ 0..126B     │ 2B      │
//! └──────────┴──────────────┴──────┴────────────┴─────────────┴─────────┘
//! ```
//!
//! `PAYLOAD_SIZE` counts everything after the 5-byte header, including the
//! trailing checksum. The CRC16 (reflected, polynomial 0xA001, seed 0xFFFF)
//! covers the header and body.
//!
//! The UART side has no framing of its own, so [`StreamFramer`] resynchronizes
//! on the preamble. Radio datagrams arrive whole and are checked with
//! [`Frame::from_bytes`].

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod crc;
pub mod frame;
pub mod kind;
pub mod packets;

pub use crc::{crc16, frame_checksum, Crc16};
pub use frame::{
    Frame, FrameError, FrameHeader, StreamFramer, CRC_SIZE, HEADER_SIZE, MAX_BODY_SIZE,
    MAX_FRAME_SIZE, MAX_PAYLOAD_SIZE, PREAMBLE, RX_BUFFER_SIZE,
};
pub use kind::PacketKind;
pub use packets::{
    Ack, Command, ConfigRequest, CredentialField, CredentialUpdate, FieldError, Packet,
    PacketError, Ping, SensorReading, Status, Telemetry, UpdateFlags, NETWORK_NAME_MAX,
    SECRET_MAX, UPDATE_URL_MAX,
};
