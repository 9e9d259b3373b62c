//! HTTP and websocket surface of the live session.
//!
//! `/` serves the freshly injected output page, `/ws` upgrades to the
//! reload channel, and the three asset directories are served straight
//! from their configured source locations so edits to stylesheets show
//! up without a copy step.

use crate::clients::ConnectionSet;
use crate::inject;
use axum::Router;
use axum::extract::State;
use axum::extract::ws::{CloseFrame, Message, Utf8Bytes, WebSocket, WebSocketUpgrade, close_code};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tagdown_config::Config;
use tokio::sync::mpsc;
use tokio::time::{Instant, interval_at};
use tokio_util::sync::CancellationToken;
use tower_http::services::ServeDir;
use tracing::{debug, error};

/// Interval between keep-alive pings on each websocket.
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Clone)]
pub struct ServerState {
    pub output: PathBuf,
    pub clients: Arc<ConnectionSet>,
    pub shutdown: CancellationToken,
}

pub fn router(state: ServerState, config: &Config) -> Router {
    Router::new()
        .route("/", get(serve_output))
        .route("/ws", get(ws_upgrade))
        .nest_service("/assets/css", ServeDir::new(&config.assets.css))
        .nest_service("/assets/js", ServeDir::new(&config.assets.js))
        .nest_service("/assets/images", ServeDir::new(&config.assets.images))
        .with_state(state)
}

/// Read the converted page from disk on every request and splice in the
/// live additions. Reading per-request means a reload always observes
/// the latest conversion.
async fn serve_output(State(state): State<ServerState>) -> Response {
    match tokio::fs::read_to_string(&state.output).await {
        Ok(page) => Html(inject::inject_live_page(&page)).into_response(),
        Err(error) => {
            error!(path = %state.output.display(), %error, "failed to read output page");
            (StatusCode::INTERNAL_SERVER_ERROR, "Error loading content").into_response()
        }
    }
}

async fn ws_upgrade(State(state): State<ServerState>, upgrade: WebSocketUpgrade) -> Response {
    upgrade.on_upgrade(move |socket| client_loop(socket, state))
}

/// Per-client task: forward queued messages, keep the connection alive
/// with periodic pings, and unregister on any exit path.
async fn client_loop(mut socket: WebSocket, state: ServerState) {
    let (sender, mut outbound) = mpsc::unbounded_channel::<Message>();
    let id = state.clients.insert(sender);
    debug!(id, connected = state.clients.len(), "client connected");

    let mut heartbeat = interval_at(
        Instant::now() + HEARTBEAT_INTERVAL,
        HEARTBEAT_INTERVAL,
    );

    loop {
        tokio::select! {
            _ = state.shutdown.cancelled() => {
                // Tell the browser this is a deliberate shutdown, not a
                // dropped connection.
                let _ = socket.send(shutdown_close_message()).await;
                break;
            }
            queued = outbound.recv() => {
                let Some(message) = queued else { break };
                if socket.send(message).await.is_err() {
                    break;
                }
            }
            _ = heartbeat.tick() => {
                if socket.send(Message::Ping(Vec::new().into())).await.is_err() {
                    break;
                }
            }
            inbound = socket.recv() => {
                match inbound {
                    // Inbound text is ignored; the channel is one-way.
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    state.clients.remove(id);
    debug!(id, connected = state.clients.len(), "client disconnected");
}

fn shutdown_close_message() -> Message {
    Message::Close(Some(CloseFrame {
        code: close_code::NORMAL,
        reason: Utf8Bytes::from_static("server shutdown"),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_shutdown_close_frame_is_a_normal_closure() {
        match shutdown_close_message() {
            Message::Close(Some(frame)) => {
                assert_eq!(frame.code, close_code::NORMAL);
                assert_eq!(frame.reason.as_str(), "server shutdown");
            }
            other => panic!("expected a close frame, got {other:?}"),
        }
    }
}
