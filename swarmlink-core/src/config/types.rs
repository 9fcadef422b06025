//! Configuration type definitions
//!
//! These types are what the configuration store persists. With the `serde`
//! feature they can be serialized by a flash-backed store.

use core::fmt;

use heapless::String;
use swarmlink_protocol::packets::{ConfigRequest, NETWORK_NAME_MAX, SECRET_MAX, UPDATE_URL_MAX};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Lowest usable radio channel
pub const MIN_CHANNEL: u8 = 1;

/// Highest usable radio channel
pub const MAX_CHANNEL: u8 = 13;

/// Transmit power ceiling in dBm
pub const MAX_TX_POWER_DBM: u8 = 20;

pub const DEFAULT_CHANNEL: u8 = 1;
pub const DEFAULT_TX_POWER_DBM: u8 = 11;
pub const DEFAULT_NETWORK_ID: u8 = 0x12;
pub const DEFAULT_DRONE_ID: u8 = 1;

/// Update source URL
pub type UpdateUrl = String<UPDATE_URL_MAX>;

/// Configuration validation errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Channel outside 1..=13
    InvalidChannel(u8),
    /// Power above 20 dBm
    InvalidTxPower(u8),
    /// Network id 0 is reserved
    InvalidNetworkId,
    /// Credentials without a network name
    EmptyNetworkName,
    /// String longer than its field
    FieldTooLong,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidChannel(ch) => {
                write!(f, "channel {} outside {}..={}", ch, MIN_CHANNEL, MAX_CHANNEL)
            }
            ConfigError::InvalidTxPower(p) => {
                write!(f, "tx power {} dBm above {}", p, MAX_TX_POWER_DBM)
            }
            ConfigError::InvalidNetworkId => write!(f, "network id 0 is reserved"),
            ConfigError::EmptyNetworkName => write!(f, "network name is empty"),
            ConfigError::FieldTooLong => write!(f, "field too long"),
        }
    }
}

/// Radio link parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RadioConfig {
    /// Channel (1-13)
    pub channel: u8,
    /// Maximum transmit power (dBm)
    pub tx_power_dbm: u8,
    /// Network partition; frames from other partitions are dropped
    pub network_id: u8,
    /// Encrypt peer traffic
    pub encrypt: bool,
}

impl Default for RadioConfig {
    fn default() -> Self {
        Self {
            channel: DEFAULT_CHANNEL,
            tx_power_dbm: DEFAULT_TX_POWER_DBM,
            network_id: DEFAULT_NETWORK_ID,
            encrypt: false,
        }
    }
}

impl RadioConfig {
    /// Apply a reconfiguration request, keeping the encryption setting
    pub fn with_request(&self, request: &ConfigRequest) -> Self {
        Self {
            channel: request.channel,
            tx_power_dbm: request.tx_power,
            network_id: request.network_id,
            encrypt: self.encrypt,
        }
    }

    /// Check every parameter against its allowed range
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_channel(self.channel)?;
        validate_tx_power(self.tx_power_dbm)?;
        if self.network_id == 0 {
            return Err(ConfigError::InvalidNetworkId);
        }
        Ok(())
    }
}

pub(crate) fn validate_channel(channel: u8) -> Result<(), ConfigError> {
    if !(MIN_CHANNEL..=MAX_CHANNEL).contains(&channel) {
        return Err(ConfigError::InvalidChannel(channel));
    }
    Ok(())
}

pub(crate) fn validate_tx_power(dbm: u8) -> Result<(), ConfigError> {
    if dbm > MAX_TX_POWER_DBM {
        return Err(ConfigError::InvalidTxPower(dbm));
    }
    Ok(())
}

/// Station credentials used by the update executor
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WifiCredentials {
    pub network_name: String<NETWORK_NAME_MAX>,
    pub secret: String<SECRET_MAX>,
}

impl WifiCredentials {
    /// Build credentials, rejecting an empty or over-long name
    pub fn new(network_name: &str, secret: &str) -> Result<Self, ConfigError> {
        if network_name.is_empty() {
            return Err(ConfigError::EmptyNetworkName);
        }
        let mut creds = Self::default();
        creds
            .network_name
            .push_str(network_name)
            .map_err(|_| ConfigError::FieldTooLong)?;
        creds
            .secret
            .push_str(secret)
            .map_err(|_| ConfigError::FieldTooLong)?;
        Ok(creds)
    }
}

/// Everything the configuration store holds
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StoredConfig {
    /// Identity of this unit in heartbeat output
    pub drone_id: u8,
    pub radio: RadioConfig,
    pub credentials: Option<WifiCredentials>,
    pub update_url: Option<UpdateUrl>,
}

impl Default for StoredConfig {
    fn default() -> Self {
        Self {
            drone_id: DEFAULT_DRONE_ID,
            radio: RadioConfig::default(),
            credentials: None,
            update_url: None,
        }
    }
}
