//! Mock collaborators for host tests

use std::collections::VecDeque;
use std::string::String;
use std::vec::Vec;

use embedded_hal::delay::DelayNs;
use swarmlink_hal::radio::{MacAddress, PeerInfo, RadioDriver};
use swarmlink_hal::uart::{UartRx, UartTx};

use crate::config::{RadioConfig, StoredConfig, WifiCredentials};
use crate::traits::{ConfigStore, StoreError, UpdateError, UpdateExecutor};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockError;

/// Serial port backed by in-memory buffers
#[derive(Debug, Default)]
pub struct MockUart {
    pub rx: VecDeque<u8>,
    pub tx: Vec<u8>,
    pub flushes: u32,
    pub fail_writes: bool,
}

impl MockUart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inject(&mut self, bytes: &[u8]) {
        self.rx.extend(bytes.iter().copied());
    }
}

impl UartRx for MockUart {
    type Error = MockError;

    fn read_available(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        let mut n = 0;
        while n < buf.len() {
            match self.rx.pop_front() {
                Some(byte) => {
                    buf[n] = byte;
                    n += 1;
                }
                None => break,
            }
        }
        Ok(n)
    }
}

impl UartTx for MockUart {
    type Error = MockError;

    fn write_blocking(&mut self, data: &[u8]) -> Result<(), Self::Error> {
        if self.fail_writes {
            return Err(MockError);
        }
        self.tx.extend_from_slice(data);
        Ok(())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        self.flushes += 1;
        Ok(())
    }
}

/// Bring-up steps a [`MockRadio`] can be told to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RadioStep {
    BringUp,
    Channel,
    TxPower,
    Protocol,
    AddPeer,
}

/// Radio driver that records every call
#[derive(Debug)]
pub struct MockRadio {
    pub fail_step: Option<RadioStep>,
    /// How many times `fail_step` fails before succeeding
    pub fail_step_times: u32,
    /// Sends refused before the driver starts accepting
    pub refuse_sends: u32,
    /// Peer refused once, after the peers before it were accepted
    pub refuse_peer: Option<MacAddress>,
    pub bring_up_calls: u32,
    pub send_attempts: u32,
    pub channel: Option<u8>,
    pub tx_power: Option<u8>,
    pub peers: Vec<PeerInfo>,
    pub sent: Vec<(MacAddress, Vec<u8>)>,
}

impl MockRadio {
    pub fn new() -> Self {
        Self {
            fail_step: None,
            fail_step_times: u32::MAX,
            refuse_sends: 0,
            refuse_peer: None,
            bring_up_calls: 0,
            send_attempts: 0,
            channel: None,
            tx_power: None,
            peers: Vec::new(),
            sent: Vec::new(),
        }
    }

    fn step(&mut self, step: RadioStep) -> Result<(), MockError> {
        if self.fail_step == Some(step) && self.fail_step_times > 0 {
            self.fail_step_times -= 1;
            return Err(MockError);
        }
        Ok(())
    }
}

impl RadioDriver for MockRadio {
    type Error = MockError;

    fn bring_up(&mut self) -> Result<(), Self::Error> {
        self.bring_up_calls += 1;
        self.step(RadioStep::BringUp)
    }

    fn set_channel(&mut self, channel: u8) -> Result<(), Self::Error> {
        self.step(RadioStep::Channel)?;
        self.channel = Some(channel);
        Ok(())
    }

    fn set_tx_power(&mut self, dbm: u8) -> Result<(), Self::Error> {
        self.step(RadioStep::TxPower)?;
        self.tx_power = Some(dbm);
        Ok(())
    }

    fn start_protocol(&mut self) -> Result<(), Self::Error> {
        self.step(RadioStep::Protocol)
    }

    fn add_peer(&mut self, peer: &PeerInfo) -> Result<(), Self::Error> {
        self.step(RadioStep::AddPeer)?;
        if self.refuse_peer == Some(peer.address) {
            self.refuse_peer = None;
            return Err(MockError);
        }
        // Real stacks reject an address they already hold
        if self.peers.iter().any(|p| p.address == peer.address) {
            return Err(MockError);
        }
        self.peers.push(*peer);
        Ok(())
    }

    fn remove_peer(&mut self, address: &MacAddress) -> Result<(), Self::Error> {
        let before = self.peers.len();
        self.peers.retain(|p| p.address != *address);
        if self.peers.len() == before {
            return Err(MockError);
        }
        Ok(())
    }

    fn send(&mut self, address: &MacAddress, data: &[u8]) -> Result<(), Self::Error> {
        self.send_attempts += 1;
        if self.refuse_sends > 0 {
            self.refuse_sends -= 1;
            return Err(MockError);
        }
        self.sent.push((*address, data.to_vec()));
        Ok(())
    }
}

/// Delay that returns immediately and records what was asked
#[derive(Debug, Default)]
pub struct MockDelay {
    pub calls_ms: Vec<u32>,
    pub total_ns: u64,
}

impl MockDelay {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DelayNs for MockDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.total_ns += ns as u64;
    }

    fn delay_ms(&mut self, ms: u32) {
        self.calls_ms.push(ms);
        self.total_ns += ms as u64 * 1_000_000;
    }
}

/// Configuration store keeping everything in memory
#[derive(Debug, Default)]
pub struct MockStore {
    pub stored: StoredConfig,
    pub load_fails: bool,
    pub fail_writes: bool,
    pub saved_credentials: Option<WifiCredentials>,
    pub saved_radio: Option<RadioConfig>,
    pub saved_url: Option<String>,
    pub update_pending: bool,
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn write(&self) -> Result<(), StoreError> {
        if self.fail_writes {
            return Err(StoreError::Io);
        }
        Ok(())
    }
}

impl ConfigStore for MockStore {
    fn load(&mut self) -> Result<StoredConfig, StoreError> {
        if self.load_fails {
            return Err(StoreError::Corrupted);
        }
        Ok(self.stored.clone())
    }

    fn save_credentials(&mut self, credentials: &WifiCredentials) -> Result<(), StoreError> {
        self.write()?;
        self.saved_credentials = Some(credentials.clone());
        Ok(())
    }

    fn save_radio_config(&mut self, config: &RadioConfig) -> Result<(), StoreError> {
        self.write()?;
        self.saved_radio = Some(*config);
        Ok(())
    }

    fn save_update_url(&mut self, url: &str) -> Result<(), StoreError> {
        self.write()?;
        self.saved_url = Some(url.to_string());
        Ok(())
    }

    fn mark_update_pending(&mut self) -> Result<(), StoreError> {
        self.write()?;
        self.update_pending = true;
        Ok(())
    }
}

/// Update executor that counts triggers
#[derive(Debug, Default)]
pub struct MockUpdater {
    pub triggered: u32,
    pub fail: bool,
}

impl MockUpdater {
    pub fn new() -> Self {
        Self::default()
    }
}

impl UpdateExecutor for MockUpdater {
    fn trigger_pending_update(&mut self) -> Result<(), UpdateError> {
        self.triggered += 1;
        if self.fail {
            return Err(UpdateError::Failed);
        }
        Ok(())
    }
}
