//! Shared state of one chart service.
//!
//! [`ServiceState`] is the single structure every websocket task and the
//! session orchestrator touch: the figure under a lock, the outbound
//! broadcast channel, the connection registry, the received-image buffer,
//! and the three rendezvous gates. The registry is the only structure
//! mutated concurrently from multiple client tasks and is synchronized
//! accordingly.

use std::collections::BTreeSet;
use std::sync::Arc;

use plotline_model::Figure;
use plotline_protocol::{ConnectionId, ServerMessage};
use tokio::sync::{Mutex, Notify, broadcast};
use tracing::{debug, info};

use crate::gate::Gate;

/// Capacity of the outbound broadcast channel.
///
/// A client that falls behind by more than this many messages skips to
/// the newest one; snapshots are self-contained, so nothing is lost.
const BROADCAST_CAPACITY: usize = 256;

/// Shared state for one chart service.
pub struct ServiceState {
    /// The figure this session displays. Mutated by the caller between
    /// shows and by interactive updates on the service runtime.
    pub figure: Arc<Mutex<Figure>>,
    /// Identifiers of currently attached clients.
    pub connections: Mutex<BTreeSet<ConnectionId>>,
    /// Outbound message fan-out to every attached client.
    pub outbound: broadcast::Sender<ServerMessage>,
    /// Signaled when a client acknowledges a pushed snapshot.
    pub render_acked: Gate,
    /// Signaled when a capture response has been decoded and buffered.
    pub image_received: Gate,
    /// Signaled when at least one client attaches.
    pub client_connected: Gate,
    /// The most recently received capture, decoded.
    pub image_data: Mutex<Option<Vec<u8>>>,
    /// Trips the server accept loop and every socket task on shutdown.
    pub shutdown: Notify,
    /// The session access token carried in the page URL.
    pub token: String,
}

impl ServiceState {
    /// Create service state around a fresh figure.
    pub fn new(token: impl Into<String>) -> Self {
        let (outbound, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self {
            figure: Arc::new(Mutex::new(Figure::new())),
            connections: Mutex::new(BTreeSet::new()),
            outbound,
            render_acked: Gate::new(),
            image_received: Gate::new(),
            client_connected: Gate::new(),
            image_data: Mutex::new(None),
            shutdown: Notify::new(),
            token: token.into(),
        }
    }

    /// Subscribe to the outbound message stream.
    pub fn subscribe(&self) -> broadcast::Receiver<ServerMessage> {
        self.outbound.subscribe()
    }

    /// Send a message to every attached client.
    ///
    /// Returns the number of receivers. Zero means no client is attached,
    /// which is not an error here; the awaiting gate reports it as a
    /// timeout.
    pub fn broadcast(&self, message: ServerMessage) -> usize {
        // send errs only when there are zero receivers, which is normal
        // before the first client attaches.
        self.outbound.send(message).unwrap_or(0)
    }

    /// Record an attached client and signal the connect gate.
    pub async fn register_connection(&self, connection: ConnectionId) {
        let count = {
            let mut connections = self.connections.lock().await;
            connections.insert(connection);
            connections.len()
        };
        info!(%connection, clients = count, "client attached");
        self.client_connected.signal();
    }

    /// Drop a detached client from the registry.
    pub async fn remove_connection(&self, connection: ConnectionId) {
        let count = {
            let mut connections = self.connections.lock().await;
            connections.remove(&connection);
            connections.len()
        };
        debug!(%connection, clients = count, "client detached");
    }

    /// Number of currently attached clients.
    pub async fn connection_count(&self) -> usize {
        self.connections.lock().await.len()
    }
}
