//! Per-link counters

use swarmlink_protocol::PacketKind;

use super::rate::RateEstimator;

/// Counters for one packet kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct KindCounters {
    pub packets_sent: u32,
    pub packets_received: u32,
    pub bytes_sent: u32,
    pub bytes_received: u32,
}

/// Counters for every known kind, indexed by [`PacketKind`]
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct KindTable {
    entries: [KindCounters; PacketKind::COUNT],
}

impl KindTable {
    /// Counters for one kind
    pub fn get(&self, kind: PacketKind) -> &KindCounters {
        &self.entries[kind.index()]
    }

    fn get_mut(&mut self, kind: PacketKind) -> &mut KindCounters {
        &mut self.entries[kind.index()]
    }

    /// Kinds with any traffic, in wire-code order
    pub fn active(&self) -> impl Iterator<Item = (PacketKind, &KindCounters)> {
        PacketKind::ALL
            .iter()
            .map(move |&kind| (kind, self.get(kind)))
            .filter(|(_, c)| c.packets_sent > 0 || c.packets_received > 0)
    }
}

/// Traffic counters for one link
///
/// Totals only grow; they wrap rather than saturate on overflow, like the
/// hardware counters they are compared against.
#[derive(Debug, Clone, Default)]
pub struct InterfaceStats {
    pub packets_sent: u32,
    pub packets_received: u32,
    /// Frames rejected by framing, length, checksum or layout checks
    pub packets_corrupted: u32,
    pub bytes_sent: u32,
    pub bytes_received: u32,
    /// Sends that were dropped or exhausted their retries
    pub send_failures: u32,
    pub by_kind: KindTable,
    pub(crate) rate: RateEstimator,
}

impl InterfaceStats {
    pub(crate) fn record_sent(&mut self, kind: Option<PacketKind>, bytes: usize) {
        let bytes = bytes as u32;
        self.packets_sent = self.packets_sent.wrapping_add(1);
        self.bytes_sent = self.bytes_sent.wrapping_add(bytes);
        self.rate.count_sent();
        if let Some(kind) = kind {
            let entry = self.by_kind.get_mut(kind);
            entry.packets_sent = entry.packets_sent.wrapping_add(1);
            entry.bytes_sent = entry.bytes_sent.wrapping_add(bytes);
        }
    }

    pub(crate) fn record_received(&mut self, kind: Option<PacketKind>, bytes: usize) {
        let bytes = bytes as u32;
        self.packets_received = self.packets_received.wrapping_add(1);
        self.bytes_received = self.bytes_received.wrapping_add(bytes);
        self.rate.count_received();
        if let Some(kind) = kind {
            let entry = self.by_kind.get_mut(kind);
            entry.packets_received = entry.packets_received.wrapping_add(1);
            entry.bytes_received = entry.bytes_received.wrapping_add(bytes);
        }
    }

    pub(crate) fn record_corrupted(&mut self) {
        self.packets_corrupted = self.packets_corrupted.wrapping_add(1);
    }

    pub(crate) fn record_send_failure(&mut self) {
        self.send_failures = self.send_failures.wrapping_add(1);
    }

    /// Fraction of inbound frames that were rejected
    ///
    /// `None` until something has arrived.
    pub fn error_rate(&self) -> Option<f32> {
        let total = self.packets_received as u64 + self.packets_corrupted as u64;
        if total == 0 {
            return None;
        }
        Some(self.packets_corrupted as f32 / total as f32)
    }

    /// Most recent one-second rates as (tx, rx) packets per second
    pub fn current_pps(&self) -> (f32, f32) {
        self.rate.current()
    }
}
