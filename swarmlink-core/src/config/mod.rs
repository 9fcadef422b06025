//! Configuration types
//!
//! Radio parameters, network credentials and the update source, plus the
//! validation rules applied before anything is persisted.

mod types;

pub use types::{
    ConfigError, RadioConfig, StoredConfig, UpdateUrl, WifiCredentials, DEFAULT_CHANNEL,
    DEFAULT_DRONE_ID, DEFAULT_NETWORK_ID, DEFAULT_TX_POWER_DBM, MAX_CHANNEL, MAX_TX_POWER_DBM,
    MIN_CHANNEL,
};

pub(crate) use types::{validate_channel, validate_tx_power};
