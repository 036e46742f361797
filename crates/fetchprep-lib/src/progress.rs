use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Mutex;
use std::time::{Duration, Instant};

const BAR_TEMPLATE: &str =
    "{spinner:.blue} [{elapsed_precise}] {wide_bar:.cyan/blue} {bytes}/{total_bytes} ({bytes_per_sec}, {eta})";

const SPINNER_TEMPLATE: &str =
    "{spinner:.blue} [{elapsed_precise}] {bytes} ({bytes_per_sec})";

/// Minimum wall time between display refreshes, regardless of how often
/// the I/O path calls [`ProgressTracker::advance`].
const EMIT_INTERVAL: Duration = Duration::from_secs(1);

struct ProgressState {
    transferred: u64,
    last_emit: Option<Instant>,
}

/// Thread-safe byte accumulator for one transfer.
///
/// `advance` is called from the transfer's I/O loop after every chunk; reads
/// (snapshots, display refreshes) may happen concurrently, hence the mutex.
/// Display output is rate-limited to [`EMIT_INTERVAL`].
pub struct ProgressTracker {
    total: Option<u64>,
    started: Instant,
    state: Mutex<ProgressState>,
    bar: Option<ProgressBar>,
}

/// Point-in-time view of a transfer, with derived metrics.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProgressSnapshot {
    pub transferred: u64,
    pub total: Option<u64>,
    pub elapsed: Duration,
}

impl ProgressSnapshot {
    /// Percentage complete; `None` when the total size is unknown.
    pub fn percentage(&self) -> Option<f64> {
        match self.total {
            Some(total) if total > 0 => Some(self.transferred as f64 / total as f64 * 100.0),
            Some(_) => Some(100.0),
            None => None,
        }
    }

    /// Bytes per second since the transfer started.
    pub fn throughput(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.transferred as f64 / secs
        } else {
            0.0
        }
    }

    /// Estimated time remaining; `None` when the total size is unknown or
    /// no bytes have moved yet.
    pub fn eta(&self) -> Option<Duration> {
        let total = self.total?;
        let throughput = self.throughput();
        if throughput <= 0.0 {
            return None;
        }
        let remaining = total.saturating_sub(self.transferred) as f64;
        Some(Duration::from_secs_f64(remaining / throughput))
    }
}

impl ProgressTracker {
    pub fn new(total: Option<u64>, show_progress: bool) -> Self {
        let bar = show_progress.then(|| {
            let bar = match total {
                Some(len) => ProgressBar::new(len),
                None => ProgressBar::no_length(),
            };
            let template = if total.is_some() {
                BAR_TEMPLATE
            } else {
                SPINNER_TEMPLATE
            };
            let style = ProgressStyle::with_template(template)
                .map(|style| style.progress_chars("█▓▒░  "))
                .unwrap_or_else(|_| ProgressStyle::default_bar());
            bar.set_style(style);
            bar
        });

        Self {
            total,
            started: Instant::now(),
            state: Mutex::new(ProgressState {
                transferred: 0,
                last_emit: None,
            }),
            bar,
        }
    }

    /// Record `bytes` more transferred. Refreshes the display at most once
    /// per [`EMIT_INTERVAL`].
    pub fn advance(&self, bytes: u64) {
        let mut state = self.state.lock().expect("progress state poisoned");
        state.transferred += bytes;

        let Some(bar) = &self.bar else {
            return;
        };
        let now = Instant::now();
        let due = state
            .last_emit
            .is_none_or(|last| now.duration_since(last) >= EMIT_INTERVAL);
        if due {
            state.last_emit = Some(now);
            bar.set_position(state.transferred);
        }
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        let state = self.state.lock().expect("progress state poisoned");
        ProgressSnapshot {
            transferred: state.transferred,
            total: self.total,
            elapsed: self.started.elapsed(),
        }
    }

    /// Final display update; leaves the terminal on a clean line.
    pub fn finish(&self) {
        if let Some(bar) = &self.bar {
            let state = self.state.lock().expect("progress state poisoned");
            bar.set_position(state.transferred);
            bar.finish_and_clear();
        }
    }
}
