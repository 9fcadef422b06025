//! Broadcast radio link
//!
//! - [`RadioInbox`]: callback-side queue
//! - [`RadioTransport`]: bring-up, peers, sends and inbound validation
//! - [`PeerTable`]: registered peers

pub mod inbox;
pub mod peers;
pub mod transport;

pub use inbox::{InboundFrame, RadioInbox, INBOX_DEPTH};
pub use peers::{PeerError, PeerTable, MAX_PEERS};
pub use transport::{
    InitError, RadioTransport, Reception, SendError, INIT_ATTEMPTS, INIT_BACKOFF_MS,
    RETRY_DELAY_MS, SEND_RETRIES,
};
