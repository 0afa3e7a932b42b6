//! Connected live clients.

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use serde::Serialize;
use thiserror::Error;

pub type ClientId = u64;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("client disconnected")]
    Disconnected,

    #[error(transparent)]
    WebSocket(#[from] tungstenite::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientStatus {
    Open,
    Closed,
}

/// One end of a live connection to a browser.
pub trait LiveClient: Send {
    fn send_text(&mut self, text: &str) -> Result<(), ClientError>;

    /// Drain pending input and report whether the peer is still there.
    fn poll(&mut self) -> ClientStatus {
        ClientStatus::Open
    }

    fn close(&mut self) {}
}

/// The set of connected clients.
///
/// Clients whose send fails are dropped during [`broadcast`]; delivery to
/// the remaining clients continues.
///
/// [`broadcast`]: LiveClients::broadcast
#[derive(Default)]
pub struct LiveClients {
    clients: Mutex<FxHashMap<ClientId, Box<dyn LiveClient>>>,
    next_id: AtomicU64,
}

impl LiveClients {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, client: Box<dyn LiveClient>) -> ClientId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let mut clients = self.clients.lock();
        clients.insert(id, client);
        crate::debug!("ws"; "client {} connected (total: {})", id, clients.len());
        id
    }

    pub fn unregister(&self, id: ClientId) -> bool {
        self.clients.lock().remove(&id).is_some()
    }

    /// Serialize `payload` once and send it to every client.
    ///
    /// Returns the number of clients the message reached.
    pub fn broadcast<T: Serialize>(&self, payload: &T) -> usize {
        match serde_json::to_string(payload) {
            Ok(text) => self.broadcast_text(&text),
            Err(e) => {
                crate::log!("ws"; "failed to serialize broadcast: {}", e);
                0
            }
        }
    }

    pub fn broadcast_text(&self, text: &str) -> usize {
        let mut clients = self.clients.lock();
        let before = clients.len();
        clients.retain(|id, client| match client.send_text(text) {
            Ok(()) => true,
            Err(e) => {
                crate::debug!("ws"; "dropping client {}: {}", id, e);
                false
            }
        });
        let delivered = clients.len();
        if delivered < before {
            crate::debug!("ws"; "{} client(s) dropped during broadcast", before - delivered);
        }
        delivered
    }

    /// Remove clients that have gone away. Returns how many were removed.
    pub fn poll_disconnects(&self) -> usize {
        let mut clients = self.clients.lock();
        let before = clients.len();
        clients.retain(|_, client| client.poll() == ClientStatus::Open);
        before - clients.len()
    }

    pub fn close_all(&self) {
        let mut clients = self.clients.lock();
        for client in clients.values_mut() {
            client.close();
        }
        clients.clear();
    }

    pub fn len(&self) -> usize {
        self.clients.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.lock().is_empty()
    }
}
