//! Configuration persistence trait

use core::fmt;

use crate::config::{RadioConfig, StoredConfig, WifiCredentials};

/// Errors reported by a configuration store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StoreError {
    /// Nothing stored yet
    NotFound,
    /// Underlying storage failed
    Io,
    /// Stored data could not be decoded
    Corrupted,
    /// Storage is full
    Full,
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            StoreError::NotFound => "not found",
            StoreError::Io => "storage i/o failed",
            StoreError::Corrupted => "stored data corrupted",
            StoreError::Full => "storage full",
        };
        f.write_str(msg)
    }
}

/// Non-volatile configuration store
///
/// Writes may block on flash; the bridge only calls them from its control
/// loop, never from the radio callback.
pub trait ConfigStore {
    /// Load the stored configuration
    fn load(&mut self) -> Result<StoredConfig, StoreError>;

    /// Persist station credentials
    fn save_credentials(&mut self, credentials: &WifiCredentials) -> Result<(), StoreError>;

    /// Persist radio parameters, applied on the next start
    fn save_radio_config(&mut self, config: &RadioConfig) -> Result<(), StoreError>;

    /// Persist the firmware update source
    fn save_update_url(&mut self, url: &str) -> Result<(), StoreError>;

    /// Record that an update should run, so it survives a restart
    fn mark_update_pending(&mut self) -> Result<(), StoreError>;
}
