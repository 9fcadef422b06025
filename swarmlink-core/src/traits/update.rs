//! Firmware update trigger

use core::fmt;

/// Errors reported by the update executor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum UpdateError {
    /// An update is already running
    Busy,
    /// No credentials or update source stored
    NotConfigured,
    /// The executor could not start the update
    Failed,
}

impl fmt::Display for UpdateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            UpdateError::Busy => "update already running",
            UpdateError::NotConfigured => "update not configured",
            UpdateError::Failed => "update failed to start",
        };
        f.write_str(msg)
    }
}

/// Firmware update executor
///
/// Joins the stored network, downloads the image and flashes it. The bridge
/// calls it from the control loop after the update request was persisted.
pub trait UpdateExecutor {
    /// Start the update recorded by the configuration store
    fn trigger_pending_update(&mut self) -> Result<(), UpdateError>;
}
