//! Radio peer table

use core::fmt;

use heapless::Vec;
use swarmlink_hal::radio::{MacAddress, PeerInfo, BROADCAST_ADDRESS};

/// Peer table capacity, broadcast entry included
pub const MAX_PEERS: usize = 20;

/// Peer management errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PeerError {
    /// No free slot
    TableFull,
    /// Address already registered
    Duplicate,
    /// The broadcast entry cannot be removed
    BroadcastPinned,
    /// Address not registered
    NotFound,
    /// The radio driver refused the change
    Driver,
}

impl fmt::Display for PeerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            PeerError::TableFull => "peer table full",
            PeerError::Duplicate => "peer already registered",
            PeerError::BroadcastPinned => "broadcast peer cannot be removed",
            PeerError::NotFound => "peer not registered",
            PeerError::Driver => "radio driver rejected peer change",
        };
        f.write_str(msg)
    }
}

/// Registered peers; entry 0 is always the broadcast address
#[derive(Debug, Clone)]
pub struct PeerTable {
    peers: Vec<PeerInfo, MAX_PEERS>,
}

impl PeerTable {
    /// Table holding only the broadcast entry
    pub fn new(channel: u8, encrypt: bool) -> Self {
        let mut peers = Vec::new();
        // Capacity is at least one
        let _ = peers.push(PeerInfo::broadcast(channel, encrypt));
        Self { peers }
    }

    /// Add a peer
    pub fn insert(&mut self, peer: PeerInfo) -> Result<(), PeerError> {
        if self.contains(&peer.address) {
            return Err(PeerError::Duplicate);
        }
        self.peers.push(peer).map_err(|_| PeerError::TableFull)
    }

    /// Remove a peer, returning its entry
    pub fn remove(&mut self, address: &MacAddress) -> Result<PeerInfo, PeerError> {
        if *address == BROADCAST_ADDRESS {
            return Err(PeerError::BroadcastPinned);
        }
        let idx = self
            .peers
            .iter()
            .position(|p| p.address == *address)
            .ok_or(PeerError::NotFound)?;
        Ok(self.peers.remove(idx))
    }

    /// True if `address` has an entry
    pub fn contains(&self, address: &MacAddress) -> bool {
        self.peers.iter().any(|p| p.address == *address)
    }

    /// Move the broadcast entry to a new channel
    pub fn retune(&mut self, channel: u8) {
        if let Some(broadcast) = self.peers.first_mut() {
            broadcast.channel = channel;
        }
    }

    /// Set the encryption flag of the broadcast entry
    pub fn set_encrypt(&mut self, encrypt: bool) {
        if let Some(broadcast) = self.peers.first_mut() {
            broadcast.encrypt = encrypt;
        }
    }

    /// Entries in registration order, broadcast first
    pub fn iter(&self) -> impl Iterator<Item = &PeerInfo> {
        self.peers.iter()
    }

    /// Number of entries, broadcast included
    pub fn len(&self) -> usize {
        self.peers.len()
    }

    /// Never true; the broadcast entry is pinned
    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }
}
