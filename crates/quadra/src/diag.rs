//! Diagnostics sender: ships sprite pipeline metrics to `quadra-telemetry`
//! over UDP.
//!
//! Enabled by the `diagnostics` feature flag. The runner owns a
//! [`DiagSender`], feeds it every frame's [`FrameStats`], and calls
//! [`DiagSender::send`] once per frame. Sends are throttled to 10 Hz; the
//! frames in between are summed so the TUI sees totals for the whole window
//! as well as the latest frame.
//!
//! ```text
//!  frame N   ──record()──┐
//!  frame N+1 ──record()──┤  window totals
//!  ...                   │
//!  frame N+k ──send()────┴──► JSON datagram ──► 127.0.0.1:9100
//!                               │
//!                               ├── fps, delta, frame count
//!                               ├── last frame's FrameStats
//!                               ├── window totals + frame count
//!                               ├── update / draw budget
//!                               └── up to 50 captured log lines
//! ```
//!
//! Nothing listens? The datagram is dropped. The socket is nonblocking and
//! send errors are ignored, so the game never waits on the TUI.

use std::net::{ToSocketAddrs, UdpSocket};
use std::sync::{Mutex, OnceLock};
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::sprite::FrameStats;
use crate::time::Time;

/// Where `quadra-telemetry` listens.
pub const DEFAULT_ADDR: &str = "127.0.0.1:9100";

const SEND_INTERVAL: Duration = Duration::from_millis(100);
const MAX_LOGS_PER_SEND: usize = 50;
const LOG_RING_CAPACITY: usize = 500;

// ── DiagSender ───────────────────────────────────────────────────────────

/// Owns the outbound UDP socket and throttling state.
pub struct DiagSender {
    socket: UdpSocket,
    last_send: Instant,
    last_frame: FrameStats,
    window: FrameStats,
    window_frames: u32,
}

impl DiagSender {
    /// Connect to the default telemetry address.
    pub fn new() -> Option<Self> {
        Self::connect(DEFAULT_ADDR)
    }

    /// Connect to a telemetry listener at `addr`. `None` if no local socket
    /// could be set up.
    pub fn connect(addr: impl ToSocketAddrs) -> Option<Self> {
        let socket = UdpSocket::bind("127.0.0.1:0").ok()?;
        socket.connect(addr).ok()?;
        socket.set_nonblocking(true).ok()?;

        Some(Self {
            socket,
            // send on the first frame
            last_send: Instant::now() - Duration::from_secs(1),
            last_frame: FrameStats::default(),
            window: FrameStats::default(),
            window_frames: 0,
        })
    }

    /// Add one frame's counters.
    pub fn record(&mut self, stats: &FrameStats) {
        self.last_frame = *stats;
        self.window.accumulate(stats);
        self.window_frames += 1;
    }

    /// Send a snapshot if at least 100 ms passed since the last one.
    /// Returns whether a datagram went out.
    pub fn send(&mut self, time: &Time, budget: FrameBudget, textures_loaded: usize) -> bool {
        let now = Instant::now();
        if now.duration_since(self.last_send) < SEND_INTERVAL {
            return false;
        }
        self.last_send = now;

        let snapshot = self.snapshot(time, budget, textures_loaded, drain_captured_logs(MAX_LOGS_PER_SEND));
        self.window = FrameStats::default();
        self.window_frames = 0;

        match serde_json::to_vec(&snapshot) {
            Ok(bytes) => {
                // No listener is fine.
                let _ = self.socket.send(&bytes);
                true
            }
            Err(e) => {
                log::debug!("diagnostics snapshot failed to serialize: {e}");
                false
            }
        }
    }

    fn snapshot(
        &self,
        time: &Time,
        budget: FrameBudget,
        textures_loaded: usize,
        logs: Vec<CapturedLog>,
    ) -> DiagSnapshot {
        DiagSnapshot {
            fps: time.fps(),
            delta_ms: time.delta_secs() * 1000.0,
            frame_count: time.frame_count(),
            elapsed_secs: time.elapsed_secs(),
            frame: self.last_frame,
            window: WindowSnapshot {
                frames: self.window_frames,
                totals: self.window,
            },
            budget,
            textures_loaded,
            logs: logs.into_iter().map(LogEntrySnapshot::from).collect(),
        }
    }
}

// ── Snapshot types (wire format) ────────────────────────────────────────

#[derive(Serialize)]
struct DiagSnapshot {
    fps: f32,
    delta_ms: f32,
    frame_count: u64,
    elapsed_secs: f32,
    /// Most recent frame.
    frame: FrameStats,
    /// Everything since the previous datagram.
    window: WindowSnapshot,
    budget: FrameBudget,
    textures_loaded: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    logs: Vec<LogEntrySnapshot>,
}

#[derive(Serialize)]
struct WindowSnapshot {
    frames: u32,
    totals: FrameStats,
}

/// CPU time the last frame spent in game update and in sprite drawing.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct FrameBudget {
    pub update_ms: f32,
    pub draw_ms: f32,
}

#[derive(Serialize)]
struct LogEntrySnapshot {
    level: String,
    target: String,
    message: String,
    timestamp_secs: f32,
}

impl From<CapturedLog> for LogEntrySnapshot {
    fn from(entry: CapturedLog) -> Self {
        Self {
            level: entry.level.to_string(),
            target: entry.target,
            message: entry.message,
            timestamp_secs: entry.timestamp_secs,
        }
    }
}

// ── Log Capture ──────────────────────────────────────────────────────────

struct CapturedLog {
    level: log::Level,
    target: String,
    message: String,
    timestamp_secs: f32,
}

/// Oldest entries fall off once the ring is full.
struct LogRing {
    entries: Vec<CapturedLog>,
    capacity: usize,
}

impl LogRing {
    fn new(capacity: usize) -> Self {
        Self {
            entries: Vec::new(),
            capacity,
        }
    }

    fn push(&mut self, entry: CapturedLog) {
        if self.entries.len() >= self.capacity {
            self.entries.remove(0);
        }
        self.entries.push(entry);
    }

    fn drain(&mut self, max: usize) -> Vec<CapturedLog> {
        let n = self.entries.len().min(max);
        self.entries.drain(..n).collect()
    }
}

static LOG_RING: Mutex<Option<LogRing>> = Mutex::new(None);
static LOG_START: OnceLock<Instant> = OnceLock::new();

/// Captures records into [`LOG_RING`] and passes them on to env_logger for
/// stderr.
struct DiagLogger {
    inner: env_logger::Logger,
}

impl log::Log for DiagLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        self.inner.enabled(metadata) || metadata.level() <= log::Level::Info
    }

    fn log(&self, record: &log::Record) {
        if self.inner.enabled(record.metadata()) {
            self.inner.log(record);
        }
        if record.level() > log::Level::Info {
            return;
        }

        let timestamp_secs = LOG_START.get().map_or(0.0, |s| s.elapsed().as_secs_f32());
        let entry = CapturedLog {
            level: record.level(),
            target: record.target().to_string(),
            message: record.args().to_string(),
            timestamp_secs,
        };
        if let Ok(mut guard) = LOG_RING.lock()
            && let Some(ring) = guard.as_mut()
        {
            ring.push(entry);
        }
    }

    fn flush(&self) {
        self.inner.flush();
    }
}

static DIAG_LOGGER: OnceLock<DiagLogger> = OnceLock::new();

/// Install the capturing logger. Info and above are kept for the TUI;
/// stderr output follows `RUST_LOG` as usual.
///
/// Call before anything logs.
pub fn init_logger() {
    if let Ok(mut ring) = LOG_RING.lock() {
        *ring = Some(LogRing::new(LOG_RING_CAPACITY));
    }
    LOG_START.get_or_init(Instant::now);

    let inner = env_logger::Builder::new().parse_default_env().build();
    let max_level = inner.filter();
    let logger = DIAG_LOGGER.get_or_init(|| DiagLogger { inner });

    if log::set_logger(logger).is_err() {
        eprintln!("[quadra] a logger is already set; log capture disabled");
        return;
    }
    log::set_max_level(max_level.max(log::LevelFilter::Info));
}

fn drain_captured_logs(max: usize) -> Vec<CapturedLog> {
    let Ok(mut guard) = LOG_RING.lock() else {
        return Vec::new();
    };
    guard.as_mut().map_or_else(Vec::new, |ring| ring.drain(max))
}
