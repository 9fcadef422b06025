//! Hand-off from the radio callback to the control loop
//!
//! The driver's receive callback runs outside the control loop. It only
//! copies the datagram into a bounded queue; validation, statistics and
//! routing happen when the control loop drains the queue. The only state
//! the callback touches directly is a pair of atomic counters.

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::channel::Channel;
use heapless::Vec;
use portable_atomic::{AtomicU32, Ordering};
use swarmlink_hal::radio::{MacAddress, MAX_DATAGRAM_SIZE};

/// Queue depth between the radio callback and the control loop
pub const INBOX_DEPTH: usize = 16;

/// A datagram received by the radio
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundFrame {
    /// Sender address
    pub src: MacAddress,
    /// Datagram bytes, cut at the radio's maximum size
    pub data: Vec<u8, MAX_DATAGRAM_SIZE>,
    /// The datagram was longer than the radio's maximum size
    pub truncated: bool,
}

impl InboundFrame {
    /// Copy a datagram out of the driver's buffer
    pub fn copy_from(src: &MacAddress, bytes: &[u8]) -> Self {
        let len = bytes.len().min(MAX_DATAGRAM_SIZE);
        let mut data = Vec::new();
        // len never exceeds capacity
        let _ = data.extend_from_slice(&bytes[..len]);
        Self {
            src: *src,
            data,
            truncated: len < bytes.len(),
        }
    }
}

/// Bounded single-consumer queue fed by the radio callbacks
///
/// Typically a `static` with `CriticalSectionRawMutex`, registered with the
/// driver by reference.
pub struct RadioInbox<M: RawMutex, const N: usize = INBOX_DEPTH> {
    queue: Channel<M, InboundFrame, N>,
    overflow: AtomicU32,
    delivery_failures: AtomicU32,
}

impl<M: RawMutex, const N: usize> RadioInbox<M, N> {
    /// Create an empty inbox
    pub const fn new() -> Self {
        Self {
            queue: Channel::new(),
            overflow: AtomicU32::new(0),
            delivery_failures: AtomicU32::new(0),
        }
    }

    /// Receive callback: queue a datagram without blocking
    ///
    /// Returns false when the queue was full and the datagram was dropped.
    pub fn on_receive(&self, src: &MacAddress, data: &[u8]) -> bool {
        match self.queue.try_send(InboundFrame::copy_from(src, data)) {
            Ok(()) => true,
            Err(_) => {
                self.overflow.fetch_add(1, Ordering::Relaxed);
                false
            }
        }
    }

    /// Send-status callback
    pub fn on_send_status(&self, _dst: &MacAddress, delivered: bool) {
        if !delivered {
            self.delivery_failures.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Take the oldest queued datagram
    pub fn try_take(&self) -> Option<InboundFrame> {
        self.queue.try_receive().ok()
    }

    /// Number of queued datagrams
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// True when nothing is queued
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Datagrams dropped because the queue was full
    pub fn overflow_count(&self) -> u32 {
        self.overflow.load(Ordering::Relaxed)
    }

    /// Sends the driver reported as undelivered
    pub fn delivery_failures(&self) -> u32 {
        self.delivery_failures.load(Ordering::Relaxed)
    }
}

impl<M: RawMutex, const N: usize> Default for RadioInbox<M, N> {
    fn default() -> Self {
        Self::new()
    }
}
