//! Connection manager for tracking and managing client connections.
//!
//! This module provides the bookkeeping for every accepted socket: participant
//! id assignment, the connection limit, and which room each connection ended
//! up in.

use super::{client::ClientConnection, ParticipantId};
use crate::game::room::RoomId;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

/// Central manager for all client connections.
///
/// The `ConnectionManager` tracks active connections, assigns unique ids and
/// enforces `max_connections`. It uses async-safe data structures to handle
/// concurrent access from multiple connection handlers.
///
/// # Architecture
///
/// * Uses `RwLock<HashMap>` for thread-safe connection storage
/// * Implements atomic participant id generation
#[derive(Debug)]
pub struct ConnectionManager {
    /// Map of participant id to client connection information
    connections: Arc<RwLock<HashMap<ParticipantId, ClientConnection>>>,

    /// Atomic counter for generating unique participant ids
    next_id: Arc<AtomicUsize>,

    /// Connections beyond this count are refused
    max_connections: usize,
}

impl ConnectionManager {
    /// Creates a new connection manager.
    ///
    /// # Arguments
    ///
    /// * `max_connections` - Upper bound on simultaneously tracked connections
    pub fn new(max_connections: usize) -> Self {
        Self {
            connections: Arc::new(RwLock::new(HashMap::new())),
            next_id: Arc::new(AtomicUsize::new(1)),
            max_connections,
        }
    }

    /// Adds a new connection and returns its unique id.
    ///
    /// # Arguments
    ///
    /// * `remote_addr` - The network address of the connecting client
    ///
    /// # Returns
    ///
    /// A fresh `ParticipantId`, or `None` if the server is at capacity.
    pub async fn add_connection(&self, remote_addr: SocketAddr) -> Option<ParticipantId> {
        let mut connections = self.connections.write().await;
        if connections.len() >= self.max_connections {
            warn!(
                "🚫 Refusing connection from {}: {} connections active",
                remote_addr,
                connections.len()
            );
            return None;
        }

        let participant_id = self.next_id.fetch_add(1, Ordering::Relaxed);
        connections.insert(participant_id, ClientConnection::new(remote_addr));
        info!("🔗 Connection {} from {}", participant_id, remote_addr);
        Some(participant_id)
    }

    /// Records the room a connection was seated in.
    pub async fn set_room(&self, participant_id: ParticipantId, room_id: RoomId) {
        let mut connections = self.connections.write().await;
        if let Some(connection) = connections.get_mut(&participant_id) {
            connection.room_id = Some(room_id);
        }
    }

    /// Removes a connection from the manager.
    ///
    /// This should be called when a client disconnects, whatever the reason.
    pub async fn remove_connection(&self, participant_id: ParticipantId) {
        let mut connections = self.connections.write().await;
        if let Some(connection) = connections.remove(&participant_id) {
            let duration = connection
                .connected_at
                .elapsed()
                .map(|d| d.as_secs())
                .unwrap_or_default();
            match connection.room_id {
                Some(room_id) => info!(
                    "❌ Connection {} from {} left room {} after {}s",
                    participant_id, connection.remote_addr, room_id, duration
                ),
                None => info!(
                    "❌ Connection {} from {} disconnected unseated after {}s",
                    participant_id, connection.remote_addr, duration
                ),
            }
        }
    }

    /// Number of currently tracked connections.
    pub async fn active_count(&self) -> usize {
        self.connections.read().await.len()
    }
}
