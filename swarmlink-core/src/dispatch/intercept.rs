//! Handling of intercepted configuration frames
//!
//! Everything is validated before the first write, so a rejected frame
//! leaves the store untouched.

use core::fmt;

use swarmlink_protocol::{Frame, Packet, PacketError, UpdateFlags};

use crate::config::{ConfigError, RadioConfig, WifiCredentials};
use crate::traits::{ConfigStore, StoreError};

/// Why an intercepted frame was not applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InterceptError {
    /// Values out of range
    Validation(ConfigError),
    /// Frame could not be decoded
    Packet(PacketError),
    /// The store failed to persist
    Store(StoreError),
}

impl From<ConfigError> for InterceptError {
    fn from(e: ConfigError) -> Self {
        InterceptError::Validation(e)
    }
}

impl From<PacketError> for InterceptError {
    fn from(e: PacketError) -> Self {
        InterceptError::Packet(e)
    }
}

impl From<StoreError> for InterceptError {
    fn from(e: StoreError) -> Self {
        InterceptError::Store(e)
    }
}

impl fmt::Display for InterceptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InterceptError::Validation(e) => write!(f, "validation failed: {}", e),
            InterceptError::Packet(e) => write!(f, "bad packet: {}", e),
            InterceptError::Store(e) => write!(f, "store failed: {}", e),
        }
    }
}

/// Follow-up actions requested by an intercepted frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Interception {
    /// Restart once the control loop iteration completes
    pub restart: bool,
    /// Start the pending firmware update
    pub trigger_update: bool,
}

/// Persist a radio reconfiguration request
///
/// A valid request always ends in a restart, which is how the new
/// parameters take effect.
pub fn apply_config<S: ConfigStore>(
    frame: &Frame,
    current: &RadioConfig,
    store: &mut S,
) -> Result<Interception, InterceptError> {
    let request = match Packet::from_frame(frame)? {
        Packet::Config(request) => request,
        other => return Err(PacketError::UnknownKind(other.kind().to_byte()).into()),
    };

    let next = current.with_request(&request);
    next.validate()?;
    store.save_radio_config(&next)?;

    crate::log_info!(
        "radio config stored: network {}, channel {}, {} dBm",
        next.network_id,
        next.channel,
        next.tx_power_dbm
    );
    Ok(Interception {
        restart: true,
        trigger_update: false,
    })
}

/// Persist the credentials and update source of a credential update
pub fn apply_credential_update<S: ConfigStore>(
    frame: &Frame,
    store: &mut S,
) -> Result<Interception, InterceptError> {
    // Decoding enforces the terminated field lengths
    let update = match Packet::from_frame(frame)? {
        Packet::CredentialUpdate(update) => update,
        other => return Err(PacketError::UnknownKind(other.kind().to_byte()).into()),
    };

    let credentials = if update.flags.contains(UpdateFlags::CREDENTIALS) {
        Some(WifiCredentials::new(&update.network_name, &update.secret)?)
    } else {
        None
    };

    if let Some(credentials) = &credentials {
        store.save_credentials(credentials)?;
        crate::log_info!(
            "credentials stored for network {}",
            credentials.network_name.as_str()
        );
    }
    if !update.update_url.is_empty() {
        store.save_update_url(&update.update_url)?;
        crate::log_info!("update source stored: {}", update.update_url.as_str());
    }

    let trigger_update = update.flags.contains(UpdateFlags::UPDATE_PENDING);
    if trigger_update {
        store.mark_update_pending()?;
    }

    Ok(Interception {
        restart: update.flags.contains(UpdateFlags::RESTART),
        trigger_update,
    })
}
