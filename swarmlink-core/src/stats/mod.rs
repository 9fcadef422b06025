//! Link statistics
//!
//! Counters for both links, a one-second rate window and a ten-second
//! summary. The engine only counts; it never influences routing.

mod counters;
mod rate;
mod report;

use core::fmt;

use swarmlink_protocol::PacketKind;

pub use counters::{InterfaceStats, KindCounters, KindTable};
pub use rate::{RateEstimator, RATE_WINDOW_MS};
pub use report::{LinkReport, Report};

/// Interval between summaries
pub const SUMMARY_INTERVAL_MS: u32 = 10_000;

/// The two links of the bridge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Link {
    /// Wired link to the companion computer
    Serial,
    /// Broadcast radio link
    Radio,
}

impl Link {
    /// The link a frame arriving on this one is forwarded to
    pub fn opposite(self) -> Self {
        match self {
            Link::Serial => Link::Radio,
            Link::Radio => Link::Serial,
        }
    }
}

impl fmt::Display for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Link::Serial => f.write_str("serial"),
            Link::Radio => f.write_str("radio"),
        }
    }
}

/// Statistics for both links
#[derive(Debug, Clone)]
pub struct Statistics {
    serial: InterfaceStats,
    radio: InterfaceStats,
    start_ms: u32,
    last_rollover_ms: u32,
    last_summary_ms: u32,
}

impl Statistics {
    /// Zeroed statistics starting at `now_ms`
    pub fn new(now_ms: u32) -> Self {
        let mut serial = InterfaceStats::default();
        serial.rate = RateEstimator::new(now_ms);
        let mut radio = InterfaceStats::default();
        radio.rate = RateEstimator::new(now_ms);
        Self {
            serial,
            radio,
            start_ms: now_ms,
            last_rollover_ms: now_ms,
            last_summary_ms: now_ms,
        }
    }

    /// Counters for one link
    pub fn link(&self, link: Link) -> &InterfaceStats {
        match link {
            Link::Serial => &self.serial,
            Link::Radio => &self.radio,
        }
    }

    fn link_mut(&mut self, link: Link) -> &mut InterfaceStats {
        match link {
            Link::Serial => &mut self.serial,
            Link::Radio => &mut self.radio,
        }
    }

    /// Count a frame handed to a link
    pub fn record_sent(&mut self, link: Link, kind: Option<PacketKind>, bytes: usize) {
        self.link_mut(link).record_sent(kind, bytes);
    }

    /// Count an accepted inbound frame
    pub fn record_received(&mut self, link: Link, kind: Option<PacketKind>, bytes: usize) {
        self.link_mut(link).record_received(kind, bytes);
    }

    /// Count a rejected inbound frame
    pub fn record_corrupted(&mut self, link: Link) {
        self.link_mut(link).record_corrupted();
    }

    /// Count a frame that could not be sent
    pub fn record_send_failure(&mut self, link: Link) {
        self.link_mut(link).record_send_failure();
    }

    /// Roll the rate window if a full window has elapsed
    ///
    /// Returns true when a rollover happened.
    pub fn tick(&mut self, now_ms: u32) -> bool {
        if now_ms.wrapping_sub(self.last_rollover_ms) < RATE_WINDOW_MS {
            return false;
        }
        self.serial.rate.rollover(now_ms);
        self.radio.rate.rollover(now_ms);
        self.last_rollover_ms = now_ms;
        true
    }

    /// Produce a summary once per summary interval
    ///
    /// Resets the averaged rates after each summary; totals keep growing.
    pub fn summarize(&mut self, now_ms: u32) -> Option<Report> {
        self.tick(now_ms);
        if now_ms.wrapping_sub(self.last_summary_ms) < SUMMARY_INTERVAL_MS {
            return None;
        }

        let report = Report {
            uptime_ms: now_ms.wrapping_sub(self.start_ms),
            serial: LinkReport::capture(Link::Serial, &self.serial),
            radio: LinkReport::capture(Link::Radio, &self.radio),
            inbox_overflow: 0,
            delivery_failures: 0,
        };

        self.serial.rate.reset_average();
        self.radio.rate.reset_average();
        self.last_summary_ms = now_ms;
        Some(report)
    }
}
