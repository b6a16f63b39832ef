//! The probe measurement loop
//!
//! A single cooperative loop interleaves three duties per iteration: emit
//! at most one paced probe, poll the socket for echoes with a bounded
//! timeout, and let the reporter fire on its own schedule. The bounded
//! receive timeout caps how long one iteration can stall, so the
//! scheduler's absolute-deadline pacing holds even when no traffic comes
//! back. All aggregator state is owned by the session, so nothing needs a
//! lock.
//!
//! One-way delay is taken as RTT/2 under a symmetric-path assumption.
//! True asymmetric-path delay is unmeasurable without clock
//! synchronization between the endpoints; no correction is attempted.

use std::collections::VecDeque;
use std::io::ErrorKind;
use std::net::UdpSocket;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info, trace, warn};

use crate::config::ProbeConfig;
use crate::error::ProbeError;
use crate::metrics::codec::{profile_for, CodecProfile};
use crate::metrics::jitter::JitterEstimator;
use crate::metrics::loss::SlidingWindow;
use crate::metrics::mos::{self, MosEstimate};
use crate::net::correlation::{CorrelationStore, Resolution};
use crate::net::packet::ProbePacket;
use crate::net::scheduler::ProbeScheduler;
use crate::net::unix_now_ns;
use crate::report::csv::{CsvSink, SampleRow};
use crate::report::{Reporter, RunningTotals};

/// Receive buffer size; probe packets are 16 bytes but the socket may see
/// arbitrary noise
const RECV_BUF_LEN: usize = 2048;

/// Minimum one-way samples before a MOS estimate is released
const MIN_MOS_SAMPLES: u64 = 3;

/// Lifecycle of a probe session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Constructed, socket bound, loop not yet entered
    Init,
    /// Looping over send / receive / report
    Running,
    /// Duration expired or cancellation observed; no more sends
    Stopping,
    /// Sink flushed and closed
    Closed,
}

/// End-of-run snapshot returned by [`ProbeSession::run`]
#[derive(Debug, Clone)]
pub struct SessionSummary {
    pub sent: u64,
    pub received: u64,
    pub cumulative_loss_pct: f64,
    pub window_loss_pct: f64,
    pub mean_rtt_ms: f64,
    pub mean_oneway_ms: f64,
    pub min_rtt_ms: Option<f64>,
    pub max_rtt_ms: Option<f64>,
    pub jitter_ms: f64,
    /// Aggregate MOS from the window loss and whole-run mean one-way
    /// delay; `None` if no probe ever resolved
    pub mos: Option<MosEstimate>,
    pub elapsed: Duration,
}

/// One probe run against an echo responder
///
/// Owns the socket and every piece of aggregator state for the run's
/// duration; everything is destroyed at loop exit after the CSV sink has
/// been flushed and closed.
pub struct ProbeSession {
    socket: UdpSocket,
    config: ProbeConfig,
    codec: CodecProfile,
    state: SessionState,
    scheduler: ProbeScheduler,
    correlation: CorrelationStore,
    window: SlidingWindow,
    jitter: JitterEstimator,
    totals: RunningTotals,
    reporter: Reporter,
    csv: Option<CsvSink>,
    /// Most recent one-way samples, roughly one second at the target rate
    recent_oneway_ms: VecDeque<f64>,
    cancel: Arc<AtomicBool>,
}

impl ProbeSession {
    /// Bind the socket, open the CSV sink if configured, and prepare all
    /// aggregators
    pub fn new(config: ProbeConfig, cancel: Arc<AtomicBool>) -> Result<Self, ProbeError> {
        let socket = UdpSocket::bind("0.0.0.0:0").map_err(|source| ProbeError::Bind {
            addr: "0.0.0.0:0".to_string(),
            source,
        })?;
        let target = format!("{}:{}", config.host, config.port);
        socket
            .connect((config.host.as_str(), config.port))
            .map_err(|source| ProbeError::Connect {
                addr: target,
                source,
            })?;
        socket
            .set_read_timeout(Some(Duration::from_millis(config.timeout_ms.max(1))))
            .map_err(ProbeError::Socket)?;

        let csv = match &config.csv_path {
            Some(path) => Some(CsvSink::create(path)?),
            None => None,
        };

        let codec = profile_for(&config.codec);

        Ok(Self {
            socket,
            codec,
            state: SessionState::Init,
            scheduler: ProbeScheduler::new(config.pps),
            correlation: CorrelationStore::new(),
            window: SlidingWindow::for_rate(config.pps),
            jitter: JitterEstimator::new(),
            totals: RunningTotals::new(),
            reporter: Reporter::new(Duration::from_secs(config.report_interval_secs.max(1))),
            csv,
            recent_oneway_ms: VecDeque::with_capacity(config.pps.max(1) as usize),
            cancel,
            config,
        })
    }

    /// Current lifecycle state
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Drive the measurement loop to completion
    ///
    /// Returns the end-of-run summary once the configured duration
    /// expires or cancellation is observed. The CSV sink is flushed and
    /// closed on every exit path.
    pub fn run(mut self) -> Result<SessionSummary, ProbeError> {
        self.state = SessionState::Running;
        info!(
            host = %self.config.host,
            port = self.config.port,
            pps = self.config.pps,
            codec = %self.config.codec,
            "probe_started"
        );
        println!(
            "[probe] sending to {}:{} @ {} pps (codec={})",
            self.config.host, self.config.port, self.config.pps, self.config.codec
        );
        if let Some(secs) = self.config.duration_secs {
            println!("[probe] duration: {}s", secs);
        }

        let start = Instant::now();
        let mut buf = [0u8; RECV_BUF_LEN];

        while self.state == SessionState::Running {
            let now = Instant::now();

            if self.cancel.load(Ordering::SeqCst) {
                info!("probe_cancelled");
                self.state = SessionState::Stopping;
                break;
            }
            if let Some(limit) = self.config.duration_secs {
                if now.duration_since(start) >= Duration::from_secs(limit) {
                    debug!("duration_expired");
                    self.state = SessionState::Stopping;
                    break;
                }
            }

            if let Some(seq) = self.scheduler.poll(now) {
                self.send_probe(seq);
            }

            match self.socket.recv(&mut buf) {
                Ok(len) => {
                    let recv_ns = unix_now_ns();
                    self.handle_datagram(&buf[..len], recv_ns, start);
                }
                Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {}
                Err(e) => warn!(error = %e, "recv_failed"),
            }

            self.maybe_report(start);
        }

        self.close(start)
    }

    /// Emit one probe; a failed send is logged and skipped, never counted
    /// as sent
    fn send_probe(&mut self, seq: u32) {
        let send_ns = unix_now_ns();
        let packet = ProbePacket {
            seq,
            send_time_ns: send_ns,
        };
        match self.socket.send(&packet.encode()) {
            Ok(_) => {
                self.correlation.record_sent(seq, send_ns);
                self.window.record_sent(seq);
                self.totals.record_sent();
                trace!(seq, "probe_sent");
            }
            Err(e) => {
                // The sequence counter already advanced in the scheduler;
                // this number was simply never on the wire.
                warn!(seq, error = %e, "send_failed");
            }
        }
    }

    /// Validate, correlate, and aggregate one received datagram
    fn handle_datagram(&mut self, data: &[u8], recv_ns: u64, start: Instant) {
        let Some(packet) = ProbePacket::decode(data) else {
            trace!(len = data.len(), "noise_datagram_dropped");
            return;
        };

        match self.correlation.resolve(packet.seq, recv_ns) {
            Resolution::Duplicate => {
                trace!(seq = packet.seq, "duplicate_dropped");
            }
            Resolution::Unmatched => {
                // Pending entry consumed, evicted, or a wrap collision;
                // credited for duplicate suppression only.
                debug!(seq = packet.seq, "unmatched_echo");
            }
            Resolution::Resolved { rtt_ns } => {
                let rtt_ms = rtt_ns as f64 / 1e6;
                let oneway_ms = rtt_ms / 2.0;
                self.totals.record_resolved(rtt_ms, oneway_ms);

                if self.recent_oneway_ms.len() >= self.config.pps.max(1) as usize {
                    self.recent_oneway_ms.pop_front();
                }
                self.recent_oneway_ms.push_back(oneway_ms);

                // Transit from the echoed wire timestamp; any clock
                // offset cancels in the jitter delta.
                let transit_ms = recv_ns.saturating_sub(packet.send_time_ns) as f64 / 1e6;
                let jitter_ms = self.jitter.update(transit_ms);

                let window_loss = self.window_loss_pct();
                let mos = self.gated_mos(start, window_loss);

                debug!(
                    seq = packet.seq,
                    rtt_ms,
                    jitter_ms,
                    loss_pct = window_loss,
                    "probe_resolved"
                );

                if let Some(sink) = self.csv.as_mut() {
                    let row = SampleRow {
                        seq: packet.seq,
                        rtt_ms,
                        oneway_ms,
                        jitter_ms,
                        loss_pct_window: window_loss,
                        mos,
                    };
                    if let Err(e) = sink.append(&row) {
                        warn!(error = %e, "csv_append_failed");
                    }
                }
            }
        }
    }

    /// Loss over the sequences currently resident in the sliding window
    fn window_loss_pct(&self) -> f64 {
        let correlation = &self.correlation;
        self.window.loss_pct(|seq| correlation.is_received(seq))
    }

    /// MOS from the rolling one-way mean, withheld until warm-up has
    /// elapsed and enough samples exist
    fn gated_mos(&self, start: Instant, window_loss_pct: f64) -> Option<MosEstimate> {
        let warmed = start.elapsed() > Duration::from_secs(self.config.warmup_secs);
        if !warmed || self.totals.received() < MIN_MOS_SAMPLES {
            return None;
        }
        let mean =
            self.recent_oneway_ms.iter().sum::<f64>() / self.recent_oneway_ms.len().max(1) as f64;
        Some(mos::estimate(
            mean,
            window_loss_pct,
            self.codec,
            self.config.burst_r,
        ))
    }

    /// Fire the periodic summary if due; stale pending entries are swept
    /// on the same cadence
    fn maybe_report(&mut self, _start: Instant) {
        let window_loss = self.window_loss_pct();
        let fired = self.reporter.maybe_report(
            Instant::now(),
            &self.totals,
            window_loss,
            &self.jitter,
            self.codec,
            self.config.burst_r,
        );
        if fired {
            self.correlation.evict_stale(unix_now_ns());
        }
    }

    /// Flush and close the sink, then produce the end-of-run summary
    fn close(mut self, start: Instant) -> Result<SessionSummary, ProbeError> {
        if let Some(mut sink) = self.csv.take() {
            sink.flush()?;
        }
        self.state = SessionState::Closed;

        let window_loss_pct = self.window_loss_pct();
        let mos = (self.totals.received() > 0).then(|| {
            mos::estimate(
                self.totals.mean_oneway_ms(),
                window_loss_pct,
                self.codec,
                self.config.burst_r,
            )
        });
        let summary = SessionSummary {
            sent: self.totals.sent(),
            received: self.totals.received(),
            cumulative_loss_pct: self.totals.cumulative_loss_pct(),
            window_loss_pct,
            mean_rtt_ms: self.totals.mean_rtt_ms(),
            mean_oneway_ms: self.totals.mean_oneway_ms(),
            min_rtt_ms: self.totals.min_rtt_ms(),
            max_rtt_ms: self.totals.max_rtt_ms(),
            jitter_ms: self.jitter.jitter_ms(),
            mos,
            elapsed: start.elapsed(),
        };
        info!(
            sent = summary.sent,
            received = summary.received,
            loss_pct = summary.cumulative_loss_pct,
            "probe_stopped"
        );
        Ok(summary)
    }
}
