//! Live preview: convert once up front, then watch the input file and
//! push a reload to connected browsers after every successful
//! re-conversion.
//!
//! The moving parts are deliberately small. A notify watcher thread
//! debounces raw filesystem events and feeds a bounded queue; one worker
//! task drains the queue and runs conversions one at a time; the axum
//! server serves the output page and fans the reload signal out over
//! websockets. Ctrl-C cancels a shared token that winds all of it down.

pub mod clients;
pub mod inject;
pub mod server;
pub mod watch;

pub use clients::{ConnectionSet, RELOAD_TEXT};
pub use inject::inject_live_page;

use std::path::PathBuf;
use std::sync::Arc;
use tagdown_engine::{ConvertError, Converter};
use tokio::net::TcpListener;
use tokio::sync::{Mutex, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

#[derive(Debug, thiserror::Error)]
pub enum LiveError {
    /// The conversion that seeds the preview failed; there is nothing to
    /// serve, so the session does not start.
    #[error("initial conversion failed: {0}")]
    InitialConversion(#[source] ConvertError),
    #[error("failed to watch {path}: {source}")]
    Watch {
        path: PathBuf,
        source: notify::Error,
    },
    #[error("failed to bind port {port}: {source}")]
    Bind {
        port: u16,
        source: std::io::Error,
    },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// One live editing session over a single input/output pair.
pub struct LiveEditor {
    converter: Arc<Converter>,
    input: PathBuf,
    output: PathBuf,
    port: u16,
}

impl LiveEditor {
    pub fn new(converter: Converter, input: PathBuf, output: PathBuf, port: u16) -> Self {
        Self {
            converter: Arc::new(converter),
            input,
            output,
            port,
        }
    }

    /// Run the session until Ctrl-C. Performs the initial conversion,
    /// starts the watcher and the conversion worker, and serves the
    /// preview on localhost.
    pub async fn start(self) -> Result<(), LiveError> {
        self.converter
            .convert_async(&self.input, &self.output)
            .await
            .map_err(LiveError::InitialConversion)?;

        let shutdown = CancellationToken::new();
        let clients = Arc::new(ConnectionSet::new());
        let (change_tx, change_rx) = mpsc::channel(watch::CHANGE_QUEUE_CAPACITY);

        // Dropping the watcher stops event delivery; hold it across the
        // whole session.
        let _watcher = watch::spawn_watcher(&self.input, change_tx)?;

        let worker = tokio::spawn(process_changes(
            Arc::clone(&self.converter),
            self.input.clone(),
            self.output.clone(),
            change_rx,
            Arc::clone(&clients),
            shutdown.clone(),
        ));

        let state = server::ServerState {
            output: self.output.clone(),
            clients: Arc::clone(&clients),
            shutdown: shutdown.clone(),
        };
        let app = server::router(state, self.converter.config());

        let listener = TcpListener::bind(("127.0.0.1", self.port))
            .await
            .map_err(|source| LiveError::Bind {
                port: self.port,
                source,
            })?;
        info!(port = self.port, "live preview at http://127.0.0.1:{}/", self.port);

        tokio::spawn(cancel_on_ctrl_c(shutdown.clone()));

        let serve_token = shutdown.clone();
        axum::serve(listener, app)
            .with_graceful_shutdown(async move { serve_token.cancelled().await })
            .await?;

        shutdown.cancel();
        // An in-flight conversion does not observe the token; abort so a
        // wedged conversion cannot block process exit.
        worker.abort();
        let _ = worker.await;
        info!("live session ended");
        Ok(())
    }
}

async fn cancel_on_ctrl_c(token: CancellationToken) {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutdown requested");
    }
    token.cancel();
}

/// Drain the change queue, one conversion at a time. A failed conversion
/// is logged and the session continues serving the last good output; a
/// successful one broadcasts the reload signal.
async fn process_changes(
    converter: Arc<Converter>,
    input: PathBuf,
    output: PathBuf,
    mut changes: mpsc::Receiver<PathBuf>,
    clients: Arc<ConnectionSet>,
    shutdown: CancellationToken,
) {
    // Single-flight: overlapping notifications queue behind the lock
    // instead of converting concurrently.
    let in_flight = Mutex::new(());

    loop {
        let changed = tokio::select! {
            _ = shutdown.cancelled() => break,
            changed = changes.recv() => match changed {
                Some(changed) => changed,
                None => break,
            },
        };
        // The select can hand out a queued change in the same poll that
        // cancellation fires; never start a conversion after shutdown.
        if shutdown.is_cancelled() {
            break;
        }

        let _guard = in_flight.lock().await;
        info!(path = %changed.display(), "input changed; reconverting");
        match converter.convert_async(&input, &output).await {
            Ok(()) => {
                let delivered = clients.broadcast_reload();
                info!(clients = delivered, "reload signal sent");
            }
            Err(e) => {
                error!(error = %e, "conversion failed; keeping previous output");
            }
        }
    }

    if !changes.is_empty() {
        warn!("discarding pending change notifications on shutdown");
    }
}
