//! Routing rule keyed on packet kind

use swarmlink_protocol::PacketKind;

/// What to do with a verified frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Route {
    /// Forward to the other link and log it
    Forward,
    /// Forward to the other link without logging
    ForwardQuiet,
    /// Hand to the configuration collaborator instead of forwarding
    Intercept,
    /// Unknown kind; drop and report
    Drop,
}

/// Route a frame by its kind
pub fn route(kind: Option<PacketKind>) -> Route {
    match kind {
        Some(PacketKind::Telemetry)
        | Some(PacketKind::Command)
        | Some(PacketKind::Status)
        | Some(PacketKind::CustomMessage) => Route::Forward,
        // High-rate kinds with little diagnostic value
        Some(PacketKind::Sensor)
        | Some(PacketKind::Ping)
        | Some(PacketKind::Ack)
        | Some(PacketKind::BulkData) => Route::ForwardQuiet,
        Some(PacketKind::Config) | Some(PacketKind::CredentialUpdate) => Route::Intercept,
        None => Route::Drop,
    }
}
