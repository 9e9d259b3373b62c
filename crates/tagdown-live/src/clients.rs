//! The set of connected browser clients.
//!
//! Each websocket task registers an unbounded sender here; the worker
//! broadcasts through the set. Broadcasts iterate over a snapshot and
//! prune failed channels only after the full pass, so one dead browser
//! never blocks delivery to the rest.

use axum::extract::ws::{Message, Utf8Bytes};
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;
use tracing::warn;

/// The fixed signal browsers react to.
pub const RELOAD_TEXT: &str = "reload";

#[derive(Debug, Default)]
pub struct ConnectionSet {
    next_id: AtomicU64,
    inner: Mutex<HashMap<u64, mpsc::UnboundedSender<Message>>>,
}

impl ConnectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, sender: mpsc::UnboundedSender<Message>) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.lock().insert(id, sender);
        id
    }

    pub fn remove(&self, id: u64) {
        self.lock().remove(&id);
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Send the reload signal to every connected client. Returns the
    /// number of clients the signal was handed to.
    pub fn broadcast_reload(&self) -> usize {
        self.broadcast(Message::Text(Utf8Bytes::from_static(RELOAD_TEXT)))
    }

    /// Snapshot-then-prune fan-out: the live map is never mutated while
    /// being iterated, and failed channels are removed after the pass.
    pub fn broadcast(&self, message: Message) -> usize {
        let snapshot: Vec<(u64, mpsc::UnboundedSender<Message>)> = self
            .lock()
            .iter()
            .map(|(id, sender)| (*id, sender.clone()))
            .collect();

        let mut dead = Vec::new();
        for (id, sender) in &snapshot {
            if sender.send(message.clone()).is_err() {
                warn!(id, "failed to notify client; pruning connection");
                dead.push(*id);
            }
        }

        if !dead.is_empty() {
            let mut clients = self.lock();
            for id in &dead {
                clients.remove(id);
            }
        }

        snapshot.len() - dead.len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<u64, mpsc::UnboundedSender<Message>>> {
        self.inner.lock().expect("connection set mutex poisoned")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn text_of(message: Message) -> String {
        match message {
            Message::Text(text) => text.to_string(),
            other => panic!("expected a text frame, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_broadcast_reaches_every_client() {
        let clients = ConnectionSet::new();
        let (tx_a, mut rx_a) = mpsc::unbounded_channel();
        let (tx_b, mut rx_b) = mpsc::unbounded_channel();
        clients.insert(tx_a);
        clients.insert(tx_b);

        let delivered = clients.broadcast_reload();

        assert_eq!(delivered, 2);
        assert_eq!(text_of(rx_a.recv().await.unwrap()), "reload");
        assert_eq!(text_of(rx_b.recv().await.unwrap()), "reload");
    }

    #[tokio::test]
    async fn test_failed_channel_is_isolated_and_pruned() {
        let clients = ConnectionSet::new();
        let (tx_a, mut rx_a) = mpsc::unbounded_channel();
        let (tx_dead, rx_dead) = mpsc::unbounded_channel();
        let (tx_b, mut rx_b) = mpsc::unbounded_channel();
        clients.insert(tx_a);
        clients.insert(tx_dead);
        clients.insert(tx_b);
        drop(rx_dead);

        let delivered = clients.broadcast_reload();

        // The dead channel neither aborts the pass nor stays registered.
        assert_eq!(delivered, 2);
        assert_eq!(clients.len(), 2);
        assert_eq!(text_of(rx_a.recv().await.unwrap()), "reload");
        assert_eq!(text_of(rx_b.recv().await.unwrap()), "reload");
    }

    #[tokio::test]
    async fn test_disconnect_removes_only_that_client() {
        let clients = ConnectionSet::new();
        let (tx_a, _rx_a) = mpsc::unbounded_channel();
        let (tx_b, _rx_b) = mpsc::unbounded_channel();
        let id_a = clients.insert(tx_a);
        clients.insert(tx_b);

        clients.remove(id_a);

        assert_eq!(clients.len(), 1);
    }

}
