//! Packets-per-second estimation
//!
//! Rates are measured over one-second windows and averaged over the
//! summary period, so a burst does not dominate the reported figure.

/// Rate window length
pub const RATE_WINDOW_MS: u32 = 1_000;

/// Windowed tx/rx packet-rate estimator
#[derive(Debug, Clone, Default)]
pub struct RateEstimator {
    sent_in_window: u32,
    received_in_window: u32,
    window_start_ms: u32,
    tx_pps: f32,
    rx_pps: f32,
    tx_pps_sum: f32,
    rx_pps_sum: f32,
    samples: u32,
}

impl RateEstimator {
    /// Start the first window at `now_ms`
    pub fn new(now_ms: u32) -> Self {
        Self {
            window_start_ms: now_ms,
            ..Self::default()
        }
    }

    /// Count one transmitted packet in the current window
    pub fn count_sent(&mut self) {
        self.sent_in_window = self.sent_in_window.wrapping_add(1);
    }

    /// Count one received packet in the current window
    pub fn count_received(&mut self) {
        self.received_in_window = self.received_in_window.wrapping_add(1);
    }

    /// Close the current window and open a new one at `now_ms`
    ///
    /// The rate is computed from the actual window length, so a late
    /// rollover does not inflate it.
    pub fn rollover(&mut self, now_ms: u32) {
        let interval = now_ms.wrapping_sub(self.window_start_ms);
        if interval > 0 {
            self.tx_pps = self.sent_in_window as f32 * 1000.0 / interval as f32;
            self.rx_pps = self.received_in_window as f32 * 1000.0 / interval as f32;
            self.tx_pps_sum += self.tx_pps;
            self.rx_pps_sum += self.rx_pps;
            self.samples += 1;
        }
        self.sent_in_window = 0;
        self.received_in_window = 0;
        self.window_start_ms = now_ms;
    }

    /// Rates of the last closed window
    pub fn current(&self) -> (f32, f32) {
        (self.tx_pps, self.rx_pps)
    }

    /// Average (tx, rx) rate over the windows closed since the last reset
    pub fn average(&self) -> (f32, f32) {
        if self.samples == 0 {
            return (0.0, 0.0);
        }
        let n = self.samples as f32;
        (self.tx_pps_sum / n, self.rx_pps_sum / n)
    }

    /// Number of windows in the running average
    pub fn samples(&self) -> u32 {
        self.samples
    }

    /// Clear the running average; the open window is kept
    pub fn reset_average(&mut self) {
        self.tx_pps_sum = 0.0;
        self.rx_pps_sum = 0.0;
        self.samples = 0;
    }
}
