//! Bridge control loop
//!
//! One [`Bridge::poll`] call is one bounded iteration of the main loop:
//! drain some serial bytes, drain the radio inbox, do the periodic
//! bookkeeping, then run deferred collaborator work. Nothing in an
//! iteration waits on the network or on storage except the intercepted
//! configuration writes.

use embassy_sync::blocking_mutex::raw::RawMutex;
use embedded_hal::delay::DelayNs;
use swarmlink_hal::radio::RadioDriver;
use swarmlink_hal::uart::Uart;
use swarmlink_protocol::{Frame, PacketKind, StreamFramer};

use crate::config::StoredConfig;
use crate::dispatch::{apply_config, apply_credential_update, route, Interception, Route};
use crate::radio::{RadioInbox, RadioTransport, Reception, SEND_RETRIES};
use crate::stats::{Link, Report, Statistics};
use crate::traits::{ConfigStore, UpdateExecutor};

/// Serial bytes consumed per poll
pub const SERIAL_READ_BUDGET: usize = 256;

/// Interval between liveness log lines
pub const HEARTBEAT_INTERVAL_MS: u32 = 5_000;

/// What the caller should do after a poll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Control {
    /// Keep polling
    Continue,
    /// A validated configuration change was stored; restart the unit
    Restart,
}

/// Serial/radio bridge
///
/// Owns the serial port, the radio transport and the collaborators. The
/// radio callbacks only see `inbox`.
pub struct Bridge<'a, U, R, D, S, X, M: RawMutex, const N: usize> {
    uart: U,
    radio: RadioTransport<R, D>,
    store: S,
    updater: X,
    inbox: &'a RadioInbox<M, N>,
    framer: StreamFramer,
    stats: Statistics,
    config: StoredConfig,
    started_ms: u32,
    last_heartbeat_ms: u32,
    last_report: Option<Report>,
    update_pending: bool,
    restart_requested: bool,
}

impl<'a, U, R, D, S, X, M, const N: usize> Bridge<'a, U, R, D, S, X, M, N>
where
    U: Uart,
    R: RadioDriver,
    D: DelayNs,
    S: ConfigStore,
    X: UpdateExecutor,
    M: RawMutex,
{
    /// Assemble the bridge and load the stored configuration
    ///
    /// Falls back to defaults when the store has nothing usable.
    pub fn new(
        uart: U,
        radio: RadioTransport<R, D>,
        mut store: S,
        updater: X,
        inbox: &'a RadioInbox<M, N>,
        now_ms: u32,
    ) -> Self {
        let config = match store.load() {
            Ok(config) => config,
            Err(e) => {
                crate::log_warn!("using default config: {}", e);
                StoredConfig::default()
            }
        };

        Self {
            uart,
            radio,
            store,
            updater,
            inbox,
            framer: StreamFramer::new(),
            stats: Statistics::new(now_ms),
            config,
            started_ms: now_ms,
            last_heartbeat_ms: now_ms,
            last_report: None,
            update_pending: false,
            restart_requested: false,
        }
    }

    /// Bring the radio up, retrying a bounded number of times
    ///
    /// Returns false when the bridge continues with the radio disabled.
    /// Frames bound for the radio are then counted as send failures.
    pub fn start(&mut self) -> bool {
        if let Err(e) = self.radio.initialize_with_retry(self.config.radio) {
            crate::log_warn!("continuing without radio: {}", e);
        }
        crate::log_info!(
            "drone {} ready, radio {}",
            self.config.drone_id,
            self.radio_state()
        );
        self.radio.is_initialized()
    }

    /// Run one iteration of the control loop
    pub fn poll(&mut self, now_ms: u32) -> Control {
        self.poll_serial();
        self.poll_radio();
        self.housekeeping(now_ms);

        if self.update_pending {
            self.update_pending = false;
            match self.updater.trigger_pending_update() {
                Ok(()) => crate::log_info!("firmware update started"),
                Err(e) => crate::log_error!("firmware update not started: {}", e),
            }
        }

        if self.restart_requested {
            return Control::Restart;
        }
        Control::Continue
    }

    fn poll_serial(&mut self) {
        let mut buf = [0u8; SERIAL_READ_BUDGET];
        let n = match self.uart.read_available(&mut buf) {
            Ok(n) => n.min(buf.len()),
            Err(_) => {
                crate::log_warn!("serial read failed");
                return;
            }
        };

        for &byte in &buf[..n] {
            // Nothing goes out under a config that is about to be replaced
            if self.restart_requested {
                break;
            }
            match self.framer.feed(byte) {
                Ok(None) => {}
                Ok(Some(frame)) => {
                    self.stats
                        .record_received(Link::Serial, frame.kind(), frame.len());
                    self.dispatch(Link::Serial, frame);
                }
                Err(e) => {
                    self.stats.record_corrupted(Link::Serial);
                    crate::log_debug!("serial frame rejected: {}", e);
                }
            }
        }
    }

    fn poll_radio(&mut self) {
        for _ in 0..N {
            if self.restart_requested {
                break;
            }
            let Some(inbound) = self.inbox.try_take() else {
                break;
            };
            if let Reception::Accepted(frame) = self.radio.receive(&inbound, &mut self.stats) {
                self.dispatch(Link::Radio, frame);
            }
        }
    }

    fn housekeeping(&mut self, now_ms: u32) {
        if let Some(mut report) = self.stats.summarize(now_ms) {
            report.inbox_overflow = self.inbox.overflow_count();
            report.delivery_failures = self.inbox.delivery_failures();
            crate::log_info!("{}", report);
            self.last_report = Some(report);
        }

        if now_ms.wrapping_sub(self.last_heartbeat_ms) >= HEARTBEAT_INTERVAL_MS {
            crate::log_info!(
                "heartbeat: drone {}, uptime {} ms, radio {}",
                self.config.drone_id,
                now_ms.wrapping_sub(self.started_ms),
                self.radio_state()
            );
            self.last_heartbeat_ms = now_ms;
        }
    }

    fn dispatch(&mut self, source: Link, frame: Frame) {
        let kind = frame.kind();
        match route(kind) {
            Route::Forward => {
                crate::log_debug!(
                    "{} -> {}: {} ({} bytes)",
                    source,
                    source.opposite(),
                    kind_name(kind),
                    frame.len()
                );
                self.forward(source, &frame, true);
            }
            Route::ForwardQuiet => self.forward(source, &frame, false),
            Route::Intercept => self.intercept(source, &frame),
            Route::Drop => {
                crate::log_warn!(
                    "dropping unknown packet type {} from {}",
                    frame.packet_type(),
                    source
                );
            }
        }
    }

    fn forward(&mut self, source: Link, frame: &Frame, verbose: bool) {
        match source.opposite() {
            Link::Radio => {
                let sent = self
                    .radio
                    .send(frame.as_bytes(), SEND_RETRIES, &mut self.stats);
                if let Err(e) = sent {
                    if verbose {
                        crate::log_error!(
                            "failed to forward {} to radio: {}",
                            kind_name(frame.kind()),
                            e
                        );
                    }
                }
            }
            Link::Serial => {
                let bytes = frame.as_bytes();
                let written = self
                    .uart
                    .write_blocking(bytes)
                    .and_then(|()| self.uart.flush());
                match written {
                    Ok(()) => {
                        self.stats
                            .record_sent(Link::Serial, frame.kind(), bytes.len())
                    }
                    Err(_) => {
                        self.stats.record_send_failure(Link::Serial);
                        crate::log_warn!(
                            "failed to forward {} to serial",
                            kind_name(frame.kind())
                        );
                    }
                }
            }
        }
    }

    fn intercept(&mut self, source: Link, frame: &Frame) {
        let result = match frame.kind() {
            Some(PacketKind::Config) => {
                apply_config(frame, &self.config.radio, &mut self.store)
            }
            _ => apply_credential_update(frame, &mut self.store),
        };

        match result {
            Ok(Interception {
                restart,
                trigger_update,
            }) => {
                if trigger_update {
                    crate::log_info!("firmware update scheduled");
                }
                if restart {
                    crate::log_info!(
                        "restart requested by {} from {}",
                        kind_name(frame.kind()),
                        source
                    );
                }
                self.update_pending |= trigger_update;
                self.restart_requested |= restart;
            }
            Err(e) => {
                crate::log_warn!(
                    "rejected {} from {}: {}",
                    kind_name(frame.kind()),
                    source,
                    e
                );
            }
        }
    }

    fn radio_state(&self) -> &'static str {
        if self.radio.is_initialized() {
            "up"
        } else {
            "disabled"
        }
    }

    /// Counters for both links
    pub fn stats(&self) -> &Statistics {
        &self.stats
    }

    /// Most recent periodic summary
    pub fn last_report(&self) -> Option<&Report> {
        self.last_report.as_ref()
    }

    /// Configuration loaded at construction
    pub fn config(&self) -> &StoredConfig {
        &self.config
    }

    /// Radio transport
    pub fn radio(&self) -> &RadioTransport<R, D> {
        &self.radio
    }

    /// Radio transport, for peer management and retuning
    pub fn radio_mut(&mut self) -> &mut RadioTransport<R, D> {
        &mut self.radio
    }

    /// Serial port
    pub fn uart(&self) -> &U {
        &self.uart
    }

    /// Serial port, mutably
    pub fn uart_mut(&mut self) -> &mut U {
        &mut self.uart
    }

    /// Configuration store
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Firmware update executor
    pub fn updater(&self) -> &X {
        &self.updater
    }
}

fn kind_name(kind: Option<PacketKind>) -> &'static str {
    kind.map_or("unknown", PacketKind::name)
}
