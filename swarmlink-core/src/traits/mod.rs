//! Collaborator traits
//!
//! Persistence and firmware update run outside the bridge core; these
//! traits are the seam a board crate implements.

pub mod store;
pub mod update;

pub use store::{ConfigStore, StoreError};
pub use update::{UpdateError, UpdateExecutor};
