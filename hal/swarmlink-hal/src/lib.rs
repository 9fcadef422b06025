//! Swarm Link Hardware Abstraction Layer
//!
//! This crate defines the traits the bridge core needs from the board: a
//! serial link to the companion computer and a broadcast radio. A board
//! crate implements them on top of its vendor SDK, so the same bridge logic
//! runs on hardware and in host tests.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  swarmlink-core (bridge, transport)     │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  swarmlink-hal (this crate - traits)    │
//! └─────────────────────────────────────────┘
//!                     │
//!         ┌───────────┴───────────┐
//!         ▼                       ▼
//! ┌───────────────┐       ┌───────────────┐
//! │  board UART   │       │ board radio   │
//! │    driver     │       │    driver     │
//! └───────────────┘       └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`uart::UartTx`], [`uart::UartRx`] - Serial link to the companion computer
//! - [`radio::RadioDriver`] - Broadcast datagram radio

#![no_std]
#![deny(unsafe_code)]

pub mod radio;
pub mod uart;

// Re-export key traits at crate root for convenience
pub use radio::{MacAddress, PeerInfo, RadioDriver, BROADCAST_ADDRESS, MAX_DATAGRAM_SIZE};
pub use uart::{Uart, UartRx, UartTx};
