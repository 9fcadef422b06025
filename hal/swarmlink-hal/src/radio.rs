//! Broadcast radio abstraction
//!
//! Models a connectionless datagram radio (ESP-NOW style): a flat peer
//! list, best-effort sends that only report local acceptance, and receive
//! and delivery-status callbacks that the board wires to the bridge.

/// Hardware address of a radio peer
pub type MacAddress = [u8; 6];

/// Address that reaches every listener on the channel
pub const BROADCAST_ADDRESS: MacAddress = [0xFF; 6];

/// Largest datagram the radio can carry
pub const MAX_DATAGRAM_SIZE: usize = 250;

/// Peer registration parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PeerInfo {
    /// Peer hardware address
    pub address: MacAddress,
    /// Channel to reach the peer on (0 = current channel)
    pub channel: u8,
    /// Encrypt traffic to this peer
    pub encrypt: bool,
}

impl PeerInfo {
    /// Broadcast entry on the given channel
    pub fn broadcast(channel: u8, encrypt: bool) -> Self {
        Self {
            address: BROADCAST_ADDRESS,
            channel,
            encrypt,
        }
    }
}

/// Radio driver
///
/// Initialization is split into the same steps the hardware performs so
/// that the caller can tell which one failed.
pub trait RadioDriver {
    /// Driver-specific error
    type Error: core::fmt::Debug;

    /// Power up the network interface in station mode
    fn bring_up(&mut self) -> Result<(), Self::Error>;

    /// Tune to a channel (1-13)
    fn set_channel(&mut self, channel: u8) -> Result<(), Self::Error>;

    /// Set maximum transmit power in dBm
    fn set_tx_power(&mut self, dbm: u8) -> Result<(), Self::Error>;

    /// Start the datagram protocol stack and its callbacks
    fn start_protocol(&mut self) -> Result<(), Self::Error>;

    /// Register a peer with the protocol stack
    fn add_peer(&mut self, peer: &PeerInfo) -> Result<(), Self::Error>;

    /// Remove a registered peer
    fn remove_peer(&mut self, address: &MacAddress) -> Result<(), Self::Error>;

    /// Queue a datagram for transmission
    ///
    /// `Ok` means the stack accepted the datagram, not that it was delivered.
    fn send(&mut self, address: &MacAddress, data: &[u8]) -> Result<(), Self::Error>;
}
