//! Typed packet bodies
//!
//! Each kind has a fixed little-endian layout (except bulk data). Decoding
//! works on byte slices with explicit offsets; nothing relies on memory
//! layout or alignment.

use core::fmt;

use bitflags::bitflags;
use heapless::{String, Vec};

use crate::frame::{Frame, FrameError, MAX_BODY_SIZE};
use crate::kind::PacketKind;

/// Longest network name a credential update may carry
pub const NETWORK_NAME_MAX: usize = 23;

/// Longest secret a credential update may carry
pub const SECRET_MAX: usize = 31;

/// Longest update-source URL a credential update may carry
pub const UPDATE_URL_MAX: usize = 47;

/// Size of the opaque custom message blob
pub const CUSTOM_MESSAGE_SIZE: usize = 126;

// Terminated field widths on the wire
const NETWORK_NAME_FIELD: usize = NETWORK_NAME_MAX + 1;
const SECRET_FIELD: usize = SECRET_MAX + 1;
const UPDATE_URL_FIELD: usize = UPDATE_URL_MAX + 1;

bitflags! {
    /// Actions requested by a credential update
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct UpdateFlags: u8 {
        /// Fetch and install firmware from the update URL
        const UPDATE_PENDING = 0b0000_0001;
        /// The name/secret fields carry network credentials
        const CREDENTIALS = 0b0000_0010;
        /// Restart once the update has been stored
        const RESTART = 0b0000_0100;
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for UpdateFlags {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "UpdateFlags({=u8:#x})", self.bits());
    }
}

/// Bounded string field of a credential update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CredentialField {
    NetworkName,
    Secret,
    UpdateUrl,
}

/// Field-level validation failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FieldError {
    /// No terminator within the usable length of the field
    TooLong(CredentialField),
    /// Field bytes are not UTF-8
    InvalidUtf8(CredentialField),
}

/// Errors decoding or encoding a typed packet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PacketError {
    /// Type code outside the known set
    UnknownKind(u8),
    /// Frame shape or layout problem
    Frame(FrameError),
    /// Field validation failed
    Field(FieldError),
}

impl From<FrameError> for PacketError {
    fn from(e: FrameError) -> Self {
        PacketError::Frame(e)
    }
}

impl From<FieldError> for PacketError {
    fn from(e: FieldError) -> Self {
        PacketError::Field(e)
    }
}

impl fmt::Display for PacketError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PacketError::UnknownKind(code) => write!(f, "unknown packet type {}", code),
            PacketError::Frame(e) => write!(f, "{}", e),
            PacketError::Field(FieldError::TooLong(field)) => {
                write!(f, "{:?} field is unterminated or too long", field)
            }
            PacketError::Field(FieldError::InvalidUtf8(field)) => {
                write!(f, "{:?} field is not valid UTF-8", field)
            }
        }
    }
}

/// Drone position and velocity
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Telemetry {
    pub drone_id: u8,
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub vx: f32,
    pub vy: f32,
    pub vz: f32,
}

/// Command for a target drone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Command {
    pub command_id: u8,
    pub target_id: u8,
    pub param: u16,
}

/// Drone health summary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Status {
    pub drone_id: u8,
    pub status_code: u8,
    pub battery_mv: u16,
    pub error_flags: u16,
}

/// Three-axis sensor sample
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SensorReading {
    pub sensor_id: u8,
    pub values: [f32; 3],
}

/// Radio reconfiguration request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ConfigRequest {
    pub network_id: u8,
    pub channel: u8,
    pub tx_power: u8,
}

/// Liveness probe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Ping {
    pub timestamp: u32,
}

/// Acknowledgement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Ack {
    pub ack_type: u8,
    pub ack_id: u8,
    pub status: u16,
}

/// Network credentials plus firmware-update trigger
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CredentialUpdate {
    pub drone_id: u8,
    pub flags: UpdateFlags,
    pub network_name: String<NETWORK_NAME_MAX>,
    pub secret: String<SECRET_MAX>,
    pub update_url: String<UPDATE_URL_MAX>,
}

/// A decoded packet of any kind
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Packet {
    Telemetry(Telemetry),
    Command(Command),
    Status(Status),
    Sensor(SensorReading),
    Config(ConfigRequest),
    BulkData(Vec<u8, MAX_BODY_SIZE>),
    Ping(Ping),
    Ack(Ack),
    CustomMessage([u8; CUSTOM_MESSAGE_SIZE]),
    CredentialUpdate(CredentialUpdate),
}

impl Packet {
    /// Kind of this packet
    pub fn kind(&self) -> PacketKind {
        match self {
            Packet::Telemetry(_) => PacketKind::Telemetry,
            Packet::Command(_) => PacketKind::Command,
            Packet::Status(_) => PacketKind::Status,
            Packet::Sensor(_) => PacketKind::Sensor,
            Packet::Config(_) => PacketKind::Config,
            Packet::BulkData(_) => PacketKind::BulkData,
            Packet::Ping(_) => PacketKind::Ping,
            Packet::Ack(_) => PacketKind::Ack,
            Packet::CustomMessage(_) => PacketKind::CustomMessage,
            Packet::CredentialUpdate(_) => PacketKind::CredentialUpdate,
        }
    }

    /// Parse a packet from a frame
    ///
    /// Checks the kind and its layout size; the checksum is the receiver's
    /// job and is assumed to have been verified already.
    pub fn from_frame(frame: &Frame) -> Result<Self, PacketError> {
        let kind = frame
            .kind()
            .ok_or(PacketError::UnknownKind(frame.packet_type()))?;
        frame.check_layout()?;
        let body = frame.body();

        let packet = match kind {
            PacketKind::Telemetry => {
                let b: &[u8; 25] = fixed(body)?;
                Packet::Telemetry(Telemetry {
                    drone_id: b[0],
                    x: f32_at(b, 1),
                    y: f32_at(b, 5),
                    z: f32_at(b, 9),
                    vx: f32_at(b, 13),
                    vy: f32_at(b, 17),
                    vz: f32_at(b, 21),
                })
            }
            PacketKind::Command => {
                let b: &[u8; 4] = fixed(body)?;
                Packet::Command(Command {
                    command_id: b[0],
                    target_id: b[1],
                    param: u16_at(b, 2),
                })
            }
            PacketKind::Status => {
                let b: &[u8; 6] = fixed(body)?;
                Packet::Status(Status {
                    drone_id: b[0],
                    status_code: b[1],
                    battery_mv: u16_at(b, 2),
                    error_flags: u16_at(b, 4),
                })
            }
            PacketKind::Sensor => {
                let b: &[u8; 13] = fixed(body)?;
                Packet::Sensor(SensorReading {
                    sensor_id: b[0],
                    values: [f32_at(b, 1), f32_at(b, 5), f32_at(b, 9)],
                })
            }
            PacketKind::Config => {
                let b: &[u8; 3] = fixed(body)?;
                Packet::Config(ConfigRequest {
                    network_id: b[0],
                    channel: b[1],
                    tx_power: b[2],
                })
            }
            PacketKind::BulkData => {
                let mut data = Vec::new();
                data.extend_from_slice(body)
                    .map_err(|_| FrameError::BufferTooSmall)?;
                Packet::BulkData(data)
            }
            PacketKind::Ping => {
                let b: &[u8; 4] = fixed(body)?;
                Packet::Ping(Ping {
                    timestamp: u32::from_le_bytes(*b),
                })
            }
            PacketKind::Ack => {
                let b: &[u8; 4] = fixed(body)?;
                Packet::Ack(Ack {
                    ack_type: b[0],
                    ack_id: b[1],
                    status: u16_at(b, 2),
                })
            }
            PacketKind::CustomMessage => {
                let b: &[u8; CUSTOM_MESSAGE_SIZE] = fixed(body)?;
                Packet::CustomMessage(*b)
            }
            PacketKind::CredentialUpdate => {
                let b: &[u8; 106] = fixed(body)?;
                let name_end = 2 + NETWORK_NAME_FIELD;
                let secret_end = name_end + SECRET_FIELD;
                Packet::CredentialUpdate(CredentialUpdate {
                    drone_id: b[0],
                    flags: UpdateFlags::from_bits_retain(b[1]),
                    network_name: read_str(&b[2..name_end], CredentialField::NetworkName)?,
                    secret: read_str(&b[name_end..secret_end], CredentialField::Secret)?,
                    update_url: read_str(
                        &b[secret_end..secret_end + UPDATE_URL_FIELD],
                        CredentialField::UpdateUrl,
                    )?,
                })
            }
        };
        Ok(packet)
    }

    /// Encode this packet into a sealed frame
    pub fn to_frame(&self, network_id: u8) -> Result<Frame, PacketError> {
        let kind = self.kind().to_byte();
        let frame = match self {
            Packet::Telemetry(t) => {
                let mut b = [0u8; 25];
                b[0] = t.drone_id;
                for (i, v) in [t.x, t.y, t.z, t.vx, t.vy, t.vz].iter().enumerate() {
                    b[1 + i * 4..5 + i * 4].copy_from_slice(&v.to_le_bytes());
                }
                Frame::build(kind, network_id, &b)
            }
            Packet::Command(c) => {
                let p = c.param.to_le_bytes();
                Frame::build(kind, network_id, &[c.command_id, c.target_id, p[0], p[1]])
            }
            Packet::Status(s) => {
                let mv = s.battery_mv.to_le_bytes();
                let ef = s.error_flags.to_le_bytes();
                Frame::build(
                    kind,
                    network_id,
                    &[s.drone_id, s.status_code, mv[0], mv[1], ef[0], ef[1]],
                )
            }
            Packet::Sensor(s) => {
                let mut b = [0u8; 13];
                b[0] = s.sensor_id;
                for (i, v) in s.values.iter().enumerate() {
                    b[1 + i * 4..5 + i * 4].copy_from_slice(&v.to_le_bytes());
                }
                Frame::build(kind, network_id, &b)
            }
            Packet::Config(c) => {
                Frame::build(kind, network_id, &[c.network_id, c.channel, c.tx_power])
            }
            Packet::BulkData(data) => Frame::build(kind, network_id, data),
            Packet::Ping(p) => Frame::build(kind, network_id, &p.timestamp.to_le_bytes()),
            Packet::Ack(a) => {
                let s = a.status.to_le_bytes();
                Frame::build(kind, network_id, &[a.ack_type, a.ack_id, s[0], s[1]])
            }
            Packet::CustomMessage(data) => Frame::build(kind, network_id, data),
            Packet::CredentialUpdate(c) => {
                let mut b = [0u8; 106];
                let name_end = 2 + NETWORK_NAME_FIELD;
                let secret_end = name_end + SECRET_FIELD;
                b[0] = c.drone_id;
                b[1] = c.flags.bits();
                write_str(&mut b[2..name_end], &c.network_name);
                write_str(&mut b[name_end..secret_end], &c.secret);
                write_str(&mut b[secret_end..], &c.update_url);
                Frame::build(kind, network_id, &b)
            }
        };
        frame.map_err(PacketError::from)
    }
}

fn fixed<const N: usize>(body: &[u8]) -> Result<&[u8; N], FrameError> {
    body.try_into().map_err(|_| FrameError::BufferTooSmall)
}

fn u16_at(b: &[u8], off: usize) -> u16 {
    u16::from_le_bytes([b[off], b[off + 1]])
}

fn f32_at(b: &[u8], off: usize) -> f32 {
    f32::from_le_bytes([b[off], b[off + 1], b[off + 2], b[off + 3]])
}

/// Read a NUL-terminated string that must end inside its field
fn read_str<const N: usize>(
    field: &[u8],
    which: CredentialField,
) -> Result<String<N>, FieldError> {
    let len = field
        .iter()
        .position(|&b| b == 0)
        .ok_or(FieldError::TooLong(which))?;
    if len > N {
        return Err(FieldError::TooLong(which));
    }
    let text = core::str::from_utf8(&field[..len]).map_err(|_| FieldError::InvalidUtf8(which))?;

    let mut out = String::new();
    out.push_str(text).map_err(|_| FieldError::TooLong(which))?;
    Ok(out)
}

/// Write a string into a zero-padded field; the field is one byte wider
/// than the string capacity so a terminator always fits.
fn write_str(field: &mut [u8], text: &str) {
    let len = text.len().min(field.len().saturating_sub(1));
    field[..len].copy_from_slice(&text.as_bytes()[..len]);
    field[len..].fill(0);
}
