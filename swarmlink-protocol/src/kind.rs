//! Packet kinds carried in the header `TYPE` byte

/// Closed set of packet kinds known to the swarm network
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PacketKind {
    /// Position and velocity of one drone
    Telemetry,
    /// Command addressed to a target drone
    Command,
    /// Health summary (battery, status code, error bitmask)
    Status,
    /// Raw sensor reading
    Sensor,
    /// Radio reconfiguration request
    Config,
    /// Opaque variable-length data
    BulkData,
    /// Timestamped liveness probe
    Ping,
    /// Acknowledgement
    Ack,
    /// Fixed-size opaque application message
    CustomMessage,
    /// Network credentials and firmware-update trigger
    CredentialUpdate,
}

// Wire format values
const KIND_TELEMETRY: u8 = 1;
const KIND_COMMAND: u8 = 2;
const KIND_STATUS: u8 = 3;
const KIND_SENSOR: u8 = 4;
const KIND_CONFIG: u8 = 5;
const KIND_BULK_DATA: u8 = 6;
const KIND_PING: u8 = 7;
const KIND_ACK: u8 = 8;
const KIND_CUSTOM_MESSAGE: u8 = 9;
const KIND_CREDENTIAL_UPDATE: u8 = 10;

impl PacketKind {
    /// Number of kinds; the last kind has the highest index
    pub const COUNT: usize = PacketKind::CredentialUpdate.index() + 1;

    /// Every kind, in wire-code order
    pub const ALL: [PacketKind; Self::COUNT] = [
        PacketKind::Telemetry,
        PacketKind::Command,
        PacketKind::Status,
        PacketKind::Sensor,
        PacketKind::Config,
        PacketKind::BulkData,
        PacketKind::Ping,
        PacketKind::Ack,
        PacketKind::CustomMessage,
        PacketKind::CredentialUpdate,
    ];

    /// Parse a kind from its wire format byte
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            KIND_TELEMETRY => Some(PacketKind::Telemetry),
            KIND_COMMAND => Some(PacketKind::Command),
            KIND_STATUS => Some(PacketKind::Status),
            KIND_SENSOR => Some(PacketKind::Sensor),
            KIND_CONFIG => Some(PacketKind::Config),
            KIND_BULK_DATA => Some(PacketKind::BulkData),
            KIND_PING => Some(PacketKind::Ping),
            KIND_ACK => Some(PacketKind::Ack),
            KIND_CUSTOM_MESSAGE => Some(PacketKind::CustomMessage),
            KIND_CREDENTIAL_UPDATE => Some(PacketKind::CredentialUpdate),
            _ => None,
        }
    }

    /// Convert to wire format byte
    pub fn to_byte(self) -> u8 {
        match self {
            PacketKind::Telemetry => KIND_TELEMETRY,
            PacketKind::Command => KIND_COMMAND,
            PacketKind::Status => KIND_STATUS,
            PacketKind::Sensor => KIND_SENSOR,
            PacketKind::Config => KIND_CONFIG,
            PacketKind::BulkData => KIND_BULK_DATA,
            PacketKind::Ping => KIND_PING,
            PacketKind::Ack => KIND_ACK,
            PacketKind::CustomMessage => KIND_CUSTOM_MESSAGE,
            PacketKind::CredentialUpdate => KIND_CREDENTIAL_UPDATE,
        }
    }

    /// Dense index in `0..COUNT`, for per-kind tables
    pub const fn index(self) -> usize {
        match self {
            PacketKind::Telemetry => 0,
            PacketKind::Command => 1,
            PacketKind::Status => 2,
            PacketKind::Sensor => 3,
            PacketKind::Config => 4,
            PacketKind::BulkData => 5,
            PacketKind::Ping => 6,
            PacketKind::Ack => 7,
            PacketKind::CustomMessage => 8,
            PacketKind::CredentialUpdate => 9,
        }
    }

    /// Size of the type-specific body, excluding header and checksum
    ///
    /// `None` for [`PacketKind::BulkData`], which has no fixed layout.
    pub fn body_size(self) -> Option<usize> {
        match self {
            PacketKind::Telemetry => Some(25),
            PacketKind::Command => Some(4),
            PacketKind::Status => Some(6),
            PacketKind::Sensor => Some(13),
            PacketKind::Config => Some(3),
            PacketKind::BulkData => None,
            PacketKind::Ping => Some(4),
            PacketKind::Ack => Some(4),
            PacketKind::CustomMessage => Some(126),
            PacketKind::CredentialUpdate => Some(106),
        }
    }

    /// Value the header `PAYLOAD_SIZE` must carry for this kind (body + CRC)
    pub fn payload_size(self) -> Option<u8> {
        self.body_size().map(|n| (n + crate::frame::CRC_SIZE) as u8)
    }

    /// Short human-readable name
    pub fn name(self) -> &'static str {
        match self {
            PacketKind::Telemetry => "telemetry",
            PacketKind::Command => "command",
            PacketKind::Status => "status",
            PacketKind::Sensor => "sensor",
            PacketKind::Config => "config",
            PacketKind::BulkData => "bulk",
            PacketKind::Ping => "ping",
            PacketKind::Ack => "ack",
            PacketKind::CustomMessage => "custom",
            PacketKind::CredentialUpdate => "credential-update",
        }
    }
}

// `ALL` lists every index exactly once, in order
const _: () = {
    let mut i = 0;
    while i < PacketKind::COUNT {
        assert!(PacketKind::ALL[i].index() == i);
        i += 1;
    }
};
