//! Filesystem watching with debounce and a lossy bounded queue.
//!
//! The notify watcher delivers events on its own thread; the debounce
//! gate and a `try_send` into the bounded channel are the only work done
//! there. Bursts of editor saves collapse to at most one accepted event
//! per window, and events arriving while the queue is full are dropped
//! rather than queued indefinitely.

use crate::LiveError;
use notify::{RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Minimum interval between two *accepted* change notifications.
pub const DEBOUNCE_WINDOW: Duration = Duration::from_millis(500);

/// Capacity of the pending-change queue; newest events are dropped when
/// it is full.
pub const CHANGE_QUEUE_CAPACITY: usize = 100;

/// Tracks the last accepted event time for one watched path.
#[derive(Debug)]
pub struct DebounceGate {
    window: Duration,
    last_accepted: Option<Instant>,
}

impl DebounceGate {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_accepted: None,
        }
    }

    /// Accepts the event unless it falls inside the debounce window of
    /// the previously accepted one. Rejected events leave the window
    /// anchor untouched.
    pub fn accept(&mut self, now: Instant) -> bool {
        match self.last_accepted {
            Some(previous) if now.duration_since(previous) < self.window => false,
            _ => {
                self.last_accepted = Some(now);
                true
            }
        }
    }
}

/// Start watching the input file's parent directory. The returned
/// watcher must be kept alive for the duration of the live session;
/// dropping it stops event delivery.
pub fn spawn_watcher(
    input: &Path,
    queue: mpsc::Sender<PathBuf>,
) -> Result<notify::RecommendedWatcher, LiveError> {
    let target = input
        .canonicalize()
        .unwrap_or_else(|_| input.to_path_buf());
    let watch_dir = target
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));

    let mut gate = DebounceGate::new(DEBOUNCE_WINDOW);
    let watched = target.clone();
    let mut watcher = notify::recommended_watcher(move |result: notify::Result<notify::Event>| {
        let event = match result {
            Ok(event) => event,
            Err(error) => {
                warn!(%error, "filesystem observer error");
                return;
            }
        };
        if !event.kind.is_modify() {
            return;
        }
        if !event.paths.iter().any(|path| path == &watched) {
            return;
        }
        if !gate.accept(Instant::now()) {
            return;
        }
        match queue.try_send(watched.clone()) {
            Ok(()) => debug!(path = %watched.display(), "change notification enqueued"),
            Err(mpsc::error::TrySendError::Full(_)) => {
                debug!("change queue full; dropping notification")
            }
            // Receiver gone means the worker is shutting down.
            Err(mpsc::error::TrySendError::Closed(_)) => {}
        }
    })
    .map_err(|source| LiveError::Watch {
        path: target.clone(),
        source,
    })?;

    watcher
        .watch(&watch_dir, RecursiveMode::NonRecursive)
        .map_err(|source| LiveError::Watch {
            path: watch_dir.clone(),
            source,
        })?;

    info!(path = %target.display(), "watching for changes");
    Ok(watcher)
}
