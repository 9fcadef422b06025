//! Periodic statistics summary

use core::fmt;

use super::counters::InterfaceStats;
use super::Link;

/// Snapshot of one link for a summary period
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinkReport {
    pub link: Link,
    pub packets_sent: u32,
    pub packets_received: u32,
    pub packets_corrupted: u32,
    pub bytes_sent: u32,
    pub bytes_received: u32,
    pub send_failures: u32,
    /// Average transmit rate over the period
    pub tx_pps: f32,
    /// Average receive rate over the period
    pub rx_pps: f32,
    /// Rejected share of inbound frames, if any arrived
    pub error_rate: Option<f32>,
}

impl LinkReport {
    pub(crate) fn capture(link: Link, stats: &InterfaceStats) -> Self {
        let (tx_pps, rx_pps) = stats.rate.average();
        Self {
            link,
            packets_sent: stats.packets_sent,
            packets_received: stats.packets_received,
            packets_corrupted: stats.packets_corrupted,
            bytes_sent: stats.bytes_sent,
            bytes_received: stats.bytes_received,
            send_failures: stats.send_failures,
            tx_pps,
            rx_pps,
            error_rate: stats.error_rate(),
        }
    }
}

impl fmt::Display for LinkReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "--- {} ---\nTX: {} packets, {} bytes, {} failed\nRX: {} packets, {} bytes, {} corrupted",
            self.link,
            self.packets_sent,
            self.bytes_sent,
            self.send_failures,
            self.packets_received,
            self.bytes_received,
            self.packets_corrupted
        )?;
        write!(f, "Rates: TX={:.1} pps, RX={:.1} pps", self.tx_pps, self.rx_pps)?;
        if let Some(rate) = self.error_rate {
            write!(f, "\nError rate: {:.2}%", rate * 100.0)?;
        }
        Ok(())
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for LinkReport {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(
            f,
            "{}: tx {} pkts/{} B ({} failed), rx {} pkts/{} B ({} corrupted), {} tx pps, {} rx pps",
            self.link,
            self.packets_sent,
            self.bytes_sent,
            self.send_failures,
            self.packets_received,
            self.bytes_received,
            self.packets_corrupted,
            self.tx_pps,
            self.rx_pps
        );
        if let Some(rate) = self.error_rate {
            defmt::write!(f, ", error rate {}%", rate * 100.0);
        }
    }
}

/// Summary of both links
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Report {
    /// Time since the statistics were created
    pub uptime_ms: u32,
    pub serial: LinkReport,
    pub radio: LinkReport,
    /// Radio frames dropped because the receive queue was full
    pub inbox_overflow: u32,
    /// Radio sends the driver later reported as undelivered
    pub delivery_failures: u32,
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== bridge statistics ===")?;
        writeln!(f, "Uptime: {} ms", self.uptime_ms)?;
        writeln!(f, "{}", self.serial)?;
        writeln!(f, "{}", self.radio)?;
        write!(
            f,
            "Radio queue overflow: {}, delivery failures: {}",
            self.inbox_overflow, self.delivery_failures
        )
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Report {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(
            f,
            "stats uptime {} ms | {} | {} | queue overflow {}, delivery failures {}",
            self.uptime_ms,
            self.serial,
            self.radio,
            self.inbox_overflow,
            self.delivery_failures
        );
    }
}
