//! Board-agnostic core logic for the swarm link bridge
//!
//! This crate contains everything between the two links that does not
//! depend on a particular board:
//!
//! - Radio transport (bring-up, peers, bounded retries, inbound checks)
//! - Callback inbox shared with the radio driver
//! - Per-link statistics and periodic summaries
//! - Dispatch policy and intercepted configuration packets
//! - Configuration types and the storage/update collaborator traits
//! - The [`Bridge`] control loop tying them together

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod logging;

pub mod bridge;
pub mod config;
pub mod dispatch;
pub mod radio;
pub mod stats;
pub mod traits;

#[cfg(test)]
pub(crate) mod testing;

pub use bridge::{Bridge, Control, HEARTBEAT_INTERVAL_MS, SERIAL_READ_BUDGET};
