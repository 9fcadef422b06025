//! Radio transport
//!
//! Owns the radio driver: bring-up with distinct failure causes, the peer
//! table, broadcast sends with bounded retry, and validation of inbound
//! datagrams.

use core::fmt;

use embedded_hal::delay::DelayNs;
use heapless::Vec;
use swarmlink_hal::radio::{MacAddress, PeerInfo, RadioDriver, BROADCAST_ADDRESS};
use swarmlink_protocol::{Frame, FrameError, FrameHeader};

use super::inbox::InboundFrame;
use super::peers::{PeerError, PeerTable, MAX_PEERS};
use crate::config::{validate_channel, validate_tx_power, ConfigError, RadioConfig};
use crate::stats::{Link, Statistics};

/// Attempts per send before giving up
pub const SEND_RETRIES: u8 = 3;

/// Pause between send attempts
pub const RETRY_DELAY_MS: u32 = 10;

/// Bring-up attempts before running without the radio
pub const INIT_ATTEMPTS: u8 = 5;

/// Pause between bring-up attempts
pub const INIT_BACKOFF_MS: u32 = 1_000;

/// Radio initialization failures, one per bring-up step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InitError {
    /// Configuration failed validation
    InvalidConfig(ConfigError),
    /// Network interface did not come up
    InterfaceBringUp,
    /// Driver rejected the channel
    ChannelRejected,
    /// Driver rejected the transmit power
    TxPowerRejected,
    /// Datagram protocol stack failed to start
    ProtocolInit,
    /// A peer could not be registered
    PeerRegistration,
}

impl fmt::Display for InitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InitError::InvalidConfig(e) => write!(f, "invalid radio config: {}", e),
            InitError::InterfaceBringUp => write!(f, "interface bring-up failed"),
            InitError::ChannelRejected => write!(f, "channel rejected"),
            InitError::TxPowerRejected => write!(f, "tx power rejected"),
            InitError::ProtocolInit => write!(f, "protocol init failed"),
            InitError::PeerRegistration => write!(f, "peer registration failed"),
        }
    }
}

/// Send failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SendError {
    /// The radio is not initialized
    NotInitialized,
    /// Buffer is not a well-formed frame
    MalformedFrame(FrameError),
    /// Every attempt was refused by the driver
    Exhausted { attempts: u8 },
}

impl fmt::Display for SendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SendError::NotInitialized => write!(f, "radio not initialized"),
            SendError::MalformedFrame(e) => write!(f, "malformed frame: {}", e),
            SendError::Exhausted { attempts } => {
                write!(f, "send failed after {} attempts", attempts)
            }
        }
    }
}

/// Outcome of validating an inbound datagram
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reception {
    /// Valid frame for this network
    Accepted(Frame),
    /// Frame for another network partition; not an error
    Filtered { network_id: u8 },
    /// Malformed or corrupted datagram
    Rejected(FrameError),
}

/// Broadcast radio transport
pub struct RadioTransport<R, D> {
    driver: R,
    delay: D,
    config: RadioConfig,
    peers: PeerTable,
    /// Addresses the driver currently holds
    registered: Vec<MacAddress, MAX_PEERS>,
    initialized: bool,
    send_failures: u32,
}

impl<R, D> RadioTransport<R, D>
where
    R: RadioDriver,
    D: DelayNs,
{
    /// Wrap a driver; nothing is sent to the hardware until
    /// [`initialize`](Self::initialize)
    pub fn new(driver: R, delay: D) -> Self {
        let config = RadioConfig::default();
        Self {
            driver,
            delay,
            peers: PeerTable::new(config.channel, config.encrypt),
            config,
            registered: Vec::new(),
            initialized: false,
            send_failures: 0,
        }
    }

    /// Bring the radio up with `config`
    ///
    /// Registers the broadcast peer and any peers added earlier. Does not
    /// retry; see [`initialize_with_retry`](Self::initialize_with_retry).
    pub fn initialize(&mut self, config: RadioConfig) -> Result<(), InitError> {
        config.validate().map_err(InitError::InvalidConfig)?;
        self.initialized = false;
        self.config = config;
        self.peers.retune(config.channel);
        self.peers.set_encrypt(config.encrypt);

        self.driver
            .bring_up()
            .map_err(|_| InitError::InterfaceBringUp)?;
        self.driver
            .set_channel(config.channel)
            .map_err(|_| InitError::ChannelRejected)?;
        self.driver
            .set_tx_power(config.tx_power_dbm)
            .map_err(|_| InitError::TxPowerRejected)?;
        self.driver
            .start_protocol()
            .map_err(|_| InitError::ProtocolInit)?;
        self.unregister_all();
        for peer in self.peers.iter() {
            self.driver
                .add_peer(peer)
                .map_err(|_| InitError::PeerRegistration)?;
            // Same capacity as the table
            let _ = self.registered.push(peer.address);
        }

        self.initialized = true;
        crate::log_info!(
            "radio up: channel {}, {} dBm, network {}",
            config.channel,
            config.tx_power_dbm,
            config.network_id
        );
        Ok(())
    }

    /// Initialize, retrying up to [`INIT_ATTEMPTS`] times
    ///
    /// Returns the last error when every attempt failed; the caller then
    /// runs with the radio disabled.
    pub fn initialize_with_retry(&mut self, config: RadioConfig) -> Result<(), InitError> {
        let mut attempt = 1;
        loop {
            match self.initialize(config) {
                Ok(()) => return Ok(()),
                // Retrying cannot fix a bad config
                Err(e @ InitError::InvalidConfig(_)) => return Err(e),
                Err(e) if attempt >= INIT_ATTEMPTS => {
                    crate::log_error!("radio init failed after {} attempts: {}", attempt, e);
                    return Err(e);
                }
                Err(e) => {
                    crate::log_warn!(
                        "radio init failed ({}), retry {}/{}",
                        e,
                        attempt,
                        INIT_ATTEMPTS
                    );
                    attempt += 1;
                    self.delay.delay_ms(INIT_BACKOFF_MS);
                }
            }
        }
    }

    /// Drop every peer an earlier bring-up left in the driver
    fn unregister_all(&mut self) {
        for address in self.registered.iter() {
            if self.driver.remove_peer(address).is_err() {
                crate::log_debug!("driver no longer held peer {:?}", address);
            }
        }
        self.registered.clear();
    }

    /// True once [`initialize`](Self::initialize) has succeeded
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Active radio configuration
    pub fn config(&self) -> &RadioConfig {
        &self.config
    }

    /// Peer table, broadcast entry first
    pub fn peers(&self) -> &PeerTable {
        &self.peers
    }

    /// Sends that failed before or after retrying
    pub fn send_failures(&self) -> u32 {
        self.send_failures
    }

    /// Underlying radio driver
    pub fn driver(&self) -> &R {
        &self.driver
    }

    /// Register a unicast peer on the current channel
    pub fn add_peer(&mut self, address: MacAddress) -> Result<(), PeerError> {
        let peer = PeerInfo {
            address,
            channel: 0,
            encrypt: false,
        };
        self.peers.insert(peer)?;
        if self.initialized {
            if self.driver.add_peer(&peer).is_err() {
                // Keep the table in step with the driver
                let _ = self.peers.remove(&address);
                return Err(PeerError::Driver);
            }
            let _ = self.registered.push(address);
        }
        Ok(())
    }

    /// Remove a unicast peer; the broadcast entry stays
    pub fn remove_peer(&mut self, address: &MacAddress) -> Result<(), PeerError> {
        if *address == BROADCAST_ADDRESS {
            return Err(PeerError::BroadcastPinned);
        }
        if !self.peers.contains(address) {
            return Err(PeerError::NotFound);
        }
        if let Some(idx) = self.registered.iter().position(|a| a == address) {
            self.driver
                .remove_peer(address)
                .map_err(|_| PeerError::Driver)?;
            self.registered.swap_remove(idx);
        }
        self.peers.remove(address).map(|_| ())
    }

    /// Retune to another channel; applies to the next send
    pub fn set_channel(&mut self, channel: u8) -> Result<(), InitError> {
        validate_channel(channel).map_err(InitError::InvalidConfig)?;
        if self.initialized {
            self.driver
                .set_channel(channel)
                .map_err(|_| InitError::ChannelRejected)?;
        }
        self.config.channel = channel;
        self.peers.retune(channel);
        Ok(())
    }

    /// Change transmit power; applies to the next send
    pub fn set_tx_power(&mut self, dbm: u8) -> Result<(), InitError> {
        validate_tx_power(dbm).map_err(InitError::InvalidConfig)?;
        if self.initialized {
            self.driver
                .set_tx_power(dbm)
                .map_err(|_| InitError::TxPowerRejected)?;
        }
        self.config.tx_power_dbm = dbm;
        Ok(())
    }

    /// Broadcast a frame, trying up to `retries` times
    ///
    /// The frame shape is checked before the first attempt. Success means
    /// the driver accepted the datagram; delivery is not confirmed.
    pub fn send(
        &mut self,
        frame: &[u8],
        retries: u8,
        stats: &mut Statistics,
    ) -> Result<(), SendError> {
        if !self.initialized {
            self.count_failure(stats);
            return Err(SendError::NotInitialized);
        }
        let kind = match Frame::from_bytes(frame) {
            Ok(f) => f.kind(),
            Err(e) => {
                self.count_failure(stats);
                return Err(SendError::MalformedFrame(e));
            }
        };

        for attempt in 0..retries {
            match self.driver.send(&BROADCAST_ADDRESS, frame) {
                Ok(()) => {
                    stats.record_sent(Link::Radio, kind, frame.len());
                    return Ok(());
                }
                Err(_) => {
                    if attempt + 1 < retries {
                        self.delay.delay_ms(RETRY_DELAY_MS);
                    }
                }
            }
        }

        self.count_failure(stats);
        crate::log_warn!("radio send failed after {} attempts", retries);
        Err(SendError::Exhausted { attempts: retries })
    }

    fn count_failure(&mut self, stats: &mut Statistics) {
        self.send_failures = self.send_failures.wrapping_add(1);
        stats.record_send_failure(Link::Radio);
    }

    /// Validate a datagram taken from the inbox
    ///
    /// Checks run in a fixed order: header length, preamble, network
    /// partition, declared length, checksum, kind layout. Frames for
    /// another partition are dropped without touching any counter; every
    /// other rejection counts as corruption.
    pub fn receive(&self, inbound: &InboundFrame, stats: &mut Statistics) -> Reception {
        let reception = self.classify(inbound);
        match &reception {
            Reception::Accepted(frame) => {
                stats.record_received(Link::Radio, frame.kind(), frame.len());
            }
            Reception::Filtered { network_id } => {
                crate::log_trace!(
                    "dropping frame from network {} (expected {})",
                    network_id,
                    self.config.network_id
                );
            }
            Reception::Rejected(e) => {
                stats.record_corrupted(Link::Radio);
                crate::log_debug!("radio frame rejected: {}", e);
            }
        }
        reception
    }

    fn classify(&self, inbound: &InboundFrame) -> Reception {
        let header = match FrameHeader::parse(&inbound.data) {
            Ok(header) => header,
            Err(e) => return Reception::Rejected(e),
        };
        if header.network_id != self.config.network_id {
            return Reception::Filtered {
                network_id: header.network_id,
            };
        }
        if inbound.truncated {
            return Reception::Rejected(FrameError::LengthMismatch {
                declared: header.payload_size,
                actual: inbound.data.len() - swarmlink_protocol::HEADER_SIZE,
            });
        }

        let checked = Frame::from_bytes(&inbound.data).and_then(|frame| {
            frame.verify_checksum()?;
            frame.check_layout()?;
            Ok(frame)
        });
        match checked {
            Ok(frame) => Reception::Accepted(frame),
            Err(e) => Reception::Rejected(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockDelay, MockRadio, RadioStep};
    use proptest::prelude::*;
    use swarmlink_protocol::PacketKind;

    const OTHER: MacAddress = [0x24, 0x6F, 0x28, 0x01, 0x02, 0x03];

    fn transport() -> RadioTransport<MockRadio, MockDelay> {
        RadioTransport::new(MockRadio::new(), MockDelay::new())
    }

    fn ready() -> RadioTransport<MockRadio, MockDelay> {
        let mut t = transport();
        t.initialize(RadioConfig::default()).unwrap();
        t
    }

    fn ping(network_id: u8) -> Frame {
        Frame::build(PacketKind::Ping.to_byte(), network_id, &[1, 0, 0, 0]).unwrap()
    }

    fn inbound(bytes: &[u8]) -> InboundFrame {
        InboundFrame::copy_from(&OTHER, bytes)
    }

    #[test]
    fn test_initialize_registers_broadcast() {
        let t = ready();
        assert!(t.is_initialized());
        let radio = t.driver();
        assert_eq!(radio.channel, Some(1));
        assert_eq!(radio.tx_power, Some(11));
        assert_eq!(radio.peers.len(), 1);
        assert_eq!(radio.peers[0].address, BROADCAST_ADDRESS);
    }

    #[test]
    fn test_initialize_reports_failing_step() {
        let cases = [
            (RadioStep::BringUp, InitError::InterfaceBringUp),
            (RadioStep::Channel, InitError::ChannelRejected),
            (RadioStep::TxPower, InitError::TxPowerRejected),
            (RadioStep::Protocol, InitError::ProtocolInit),
            (RadioStep::AddPeer, InitError::PeerRegistration),
        ];
        for (step, expected) in cases {
            let mut radio = MockRadio::new();
            radio.fail_step = Some(step);
            let mut t = RadioTransport::new(radio, MockDelay::new());
            assert_eq!(t.initialize(RadioConfig::default()), Err(expected));
            assert!(!t.is_initialized());
        }
    }

    #[test]
    fn test_initialize_rejects_invalid_config() {
        let mut t = transport();
        let config = RadioConfig {
            channel: 14,
            ..RadioConfig::default()
        };
        assert_eq!(
            t.initialize(config),
            Err(InitError::InvalidConfig(ConfigError::InvalidChannel(14)))
        );
        assert_eq!(t.driver().bring_up_calls, 0);
    }

    #[test]
    fn test_initialize_with_retry_gives_up() {
        let mut radio = MockRadio::new();
        radio.fail_step = Some(RadioStep::Protocol);
        let mut t = RadioTransport::new(radio, MockDelay::new());

        assert_eq!(
            t.initialize_with_retry(RadioConfig::default()),
            Err(InitError::ProtocolInit)
        );
        assert_eq!(t.driver().bring_up_calls, INIT_ATTEMPTS as u32);
        assert_eq!(
            t.delay.calls_ms,
            std::vec![INIT_BACKOFF_MS; INIT_ATTEMPTS as usize - 1]
        );
    }

    #[test]
    fn test_initialize_with_retry_recovers() {
        let mut radio = MockRadio::new();
        radio.fail_step = Some(RadioStep::BringUp);
        radio.fail_step_times = 2;
        let mut t = RadioTransport::new(radio, MockDelay::new());

        assert_eq!(t.initialize_with_retry(RadioConfig::default()), Ok(()));
        assert_eq!(t.driver().bring_up_calls, 3);
    }

    #[test]
    fn test_send_first_try() {
        let mut t = ready();
        let mut stats = Statistics::new(0);
        let frame = ping(0x12);

        assert_eq!(t.send(frame.as_bytes(), SEND_RETRIES, &mut stats), Ok(()));
        assert_eq!(t.driver().send_attempts, 1);
        assert_eq!(t.driver().sent[0].0, BROADCAST_ADDRESS);
        assert!(t.delay.calls_ms.is_empty());

        let radio_stats = stats.link(Link::Radio);
        assert_eq!(radio_stats.packets_sent, 1);
        assert_eq!(radio_stats.bytes_sent, frame.len() as u32);
        assert_eq!(radio_stats.by_kind.get(PacketKind::Ping).packets_sent, 1);
    }

    #[test]
    fn test_send_exhausts_retries() {
        let mut t = ready();
        t.driver.refuse_sends = u32::MAX;
        let mut stats = Statistics::new(0);

        assert_eq!(
            t.send(ping(0x12).as_bytes(), 3, &mut stats),
            Err(SendError::Exhausted { attempts: 3 })
        );
        assert_eq!(t.driver().send_attempts, 3);
        // Delay between attempts, not after the last
        assert_eq!(t.delay.calls_ms, std::vec![RETRY_DELAY_MS, RETRY_DELAY_MS]);
        assert_eq!(t.send_failures(), 1);
        assert_eq!(stats.link(Link::Radio).packets_sent, 0);
        assert_eq!(stats.link(Link::Radio).send_failures, 1);
    }

    #[test]
    fn test_send_succeeds_on_retry() {
        let mut t = ready();
        t.driver.refuse_sends = 1;
        let mut stats = Statistics::new(0);

        assert_eq!(t.send(ping(0x12).as_bytes(), 3, &mut stats), Ok(()));
        assert_eq!(t.driver().send_attempts, 2);
        assert_eq!(stats.link(Link::Radio).packets_sent, 1);
    }

    #[test]
    fn test_send_validates_before_transmitting() {
        let mut t = ready();
        let mut stats = Statistics::new(0);
        let bytes = ping(0x12);
        let short = &bytes.as_bytes()[..bytes.len() - 1];

        assert!(matches!(
            t.send(short, 3, &mut stats),
            Err(SendError::MalformedFrame(FrameError::LengthMismatch { .. }))
        ));
        assert_eq!(t.driver().send_attempts, 0);
        assert_eq!(t.send_failures(), 1);
    }

    #[test]
    fn test_send_requires_initialization() {
        let mut t = transport();
        let mut stats = Statistics::new(0);
        assert_eq!(
            t.send(ping(0x12).as_bytes(), 3, &mut stats),
            Err(SendError::NotInitialized)
        );
        assert_eq!(t.driver().send_attempts, 0);
    }

    #[test]
    fn test_receive_accepts_valid_frame() {
        let t = ready();
        let mut stats = Statistics::new(0);
        let frame = ping(0x12);

        assert_eq!(
            t.receive(&inbound(frame.as_bytes()), &mut stats),
            Reception::Accepted(frame.clone())
        );
        let radio = stats.link(Link::Radio);
        assert_eq!(radio.packets_received, 1);
        assert_eq!(radio.bytes_received, frame.len() as u32);
        assert_eq!(radio.by_kind.get(PacketKind::Ping).packets_received, 1);
    }

    #[test]
    fn test_foreign_network_filtered_silently() {
        let t = ready();
        let mut stats = Statistics::new(0);

        assert_eq!(
            t.receive(&inbound(ping(0x34).as_bytes()), &mut stats),
            Reception::Filtered { network_id: 0x34 }
        );
        assert_eq!(stats.link(Link::Radio).packets_received, 0);
        assert_eq!(stats.link(Link::Radio).packets_corrupted, 0);
    }

    #[test]
    fn test_filter_precedes_length_and_crc_checks() {
        let t = ready();
        let mut stats = Statistics::new(0);
        let mut bytes = std::vec::Vec::from(ping(0x34).as_bytes());
        bytes.pop();

        assert!(matches!(
            t.receive(&inbound(&bytes), &mut stats),
            Reception::Filtered { .. }
        ));
        assert_eq!(stats.link(Link::Radio).packets_corrupted, 0);
    }

    fn rejection(
        t: &RadioTransport<MockRadio, MockDelay>,
        stats: &mut Statistics,
        bytes: &[u8],
    ) -> FrameError {
        match t.receive(&inbound(bytes), stats) {
            Reception::Rejected(e) => e,
            other => panic!("expected rejection, got {:?}", other),
        }
    }

    #[test]
    fn test_rejections_count_as_corrupted() {
        let t = ready();
        let mut stats = Statistics::new(0);
        let good = std::vec::Vec::from(ping(0x12).as_bytes());

        assert_eq!(rejection(&t, &mut stats, &good[..4]), FrameError::TooShort);

        let mut bad_preamble = good.clone();
        bad_preamble[1] = 0xAB;
        assert_eq!(
            rejection(&t, &mut stats, &bad_preamble),
            FrameError::BadPreamble
        );

        let mut long = good.clone();
        long.push(0);
        assert!(matches!(
            rejection(&t, &mut stats, &long),
            FrameError::LengthMismatch { .. }
        ));

        let mut bad_crc = good.clone();
        let last = bad_crc.len() - 1;
        bad_crc[last] ^= 0xFF;
        assert!(matches!(
            rejection(&t, &mut stats, &bad_crc),
            FrameError::ChecksumMismatch { .. }
        ));

        let wrong_layout = Frame::build(PacketKind::Ping.to_byte(), 0x12, &[1, 2]).unwrap();
        assert!(matches!(
            rejection(&t, &mut stats, wrong_layout.as_bytes()),
            FrameError::LayoutMismatch { .. }
        ));

        assert_eq!(stats.link(Link::Radio).packets_corrupted, 5);
        assert_eq!(stats.link(Link::Radio).packets_received, 0);
    }

    #[test]
    fn test_truncated_datagram_rejected() {
        let t = ready();
        let mut stats = Statistics::new(0);
        let mut frame = InboundFrame::copy_from(&OTHER, ping(0x12).as_bytes());
        frame.truncated = true;

        assert!(matches!(
            t.receive(&frame, &mut stats),
            Reception::Rejected(FrameError::LengthMismatch { .. })
        ));
    }

    #[test]
    fn test_peer_management() {
        let mut t = ready();
        t.add_peer(OTHER).unwrap();
        assert_eq!(t.add_peer(OTHER), Err(PeerError::Duplicate));
        assert_eq!(t.driver().peers.len(), 2);

        assert_eq!(
            t.remove_peer(&BROADCAST_ADDRESS),
            Err(PeerError::BroadcastPinned)
        );
        t.remove_peer(&OTHER).unwrap();
        assert_eq!(t.remove_peer(&OTHER), Err(PeerError::NotFound));
        assert_eq!(t.driver().peers.len(), 1);
    }

    #[test]
    fn test_peers_added_before_init_are_registered() {
        let mut t = transport();
        t.add_peer(OTHER).unwrap();
        assert!(t.driver().peers.is_empty());

        t.initialize(RadioConfig::default()).unwrap();
        assert_eq!(t.driver().peers.len(), 2);
    }

    #[test]
    fn test_reinitialize_registers_broadcast_once() {
        let mut t = ready();
        t.add_peer(OTHER).unwrap();

        let mut config = RadioConfig::default();
        config.channel = 6;
        assert_eq!(t.initialize(config), Ok(()));

        let peers = &t.driver().peers;
        assert_eq!(peers.len(), 2);
        let broadcasts = peers
            .iter()
            .filter(|p| p.address == BROADCAST_ADDRESS)
            .count();
        assert_eq!(broadcasts, 1);
        assert_eq!(peers[0].channel, 6);
    }

    #[test]
    fn test_retry_after_partial_peer_registration() {
        let mut t = transport();
        t.add_peer(OTHER).unwrap();
        t.driver.refuse_peer = Some(OTHER);

        assert_eq!(t.initialize_with_retry(RadioConfig::default()), Ok(()));
        assert_eq!(t.driver().bring_up_calls, 2);
        assert_eq!(t.driver().peers.len(), 2);
        assert_eq!(t.driver().peers[0].address, BROADCAST_ADDRESS);
    }

    #[test]
    fn test_driver_peer_failure_rolls_back() {
        let mut t = ready();
        t.driver.fail_step = Some(RadioStep::AddPeer);
        assert_eq!(t.add_peer(OTHER), Err(PeerError::Driver));
        assert!(!t.peers().contains(&OTHER));
    }

    #[test]
    fn test_retune() {
        let mut t = ready();
        t.set_channel(6).unwrap();
        t.set_tx_power(20).unwrap();
        assert_eq!(t.config().channel, 6);
        assert_eq!(t.config().tx_power_dbm, 20);
        assert_eq!(t.driver().channel, Some(6));
        assert_eq!(t.driver().tx_power, Some(20));
        assert_eq!(t.peers().iter().next().unwrap().channel, 6);

        assert_eq!(
            t.set_channel(0),
            Err(InitError::InvalidConfig(ConfigError::InvalidChannel(0)))
        );
        assert_eq!(
            t.set_tx_power(21),
            Err(InitError::InvalidConfig(ConfigError::InvalidTxPower(21)))
        );
        assert_eq!(t.config().channel, 6);
    }

    proptest! {
        #[test]
        fn prop_send_attempts_are_bounded(retries in 1u8..6, refusals in 0u32..8) {
            let mut t = ready();
            t.driver.refuse_sends = refusals;
            let mut stats = Statistics::new(0);

            let result = t.send(ping(0x12).as_bytes(), retries, &mut stats);

            let attempts = (refusals + 1).min(retries as u32);
            prop_assert_eq!(t.driver().send_attempts, attempts);
            prop_assert_eq!(result.is_ok(), refusals < retries as u32);
            // Delays only separate attempts
            prop_assert_eq!(t.delay.calls_ms.len() as u32, attempts - 1);
            prop_assert!(t.delay.calls_ms.iter().all(|&ms| ms == RETRY_DELAY_MS));
            let radio = stats.link(Link::Radio);
            prop_assert_eq!(radio.packets_sent + radio.send_failures, 1);
        }
    }
}
