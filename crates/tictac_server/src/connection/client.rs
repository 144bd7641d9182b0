//! Client connection representation.
//!
//! This module defines what the server knows about one connected client: the
//! bookkeeping entry kept by the connection manager, and the cloneable
//! [`Participant`] handle rooms use to queue outbound messages for it.

use super::ParticipantId;
use crate::game::room::RoomId;
use crate::messaging::ServerMessage;
use std::net::SocketAddr;
use std::time::SystemTime;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, warn};

/// Represents an individual client connection to the server.
///
/// # Fields
///
/// * `remote_addr` - The network address of the connected client
/// * `connected_at` - Timestamp when the connection was established
/// * `room_id` - The room the client was seated in (None until seated)
#[derive(Debug)]
pub struct ClientConnection {
    /// The remote network address of the client
    pub remote_addr: SocketAddr,

    /// When this connection was established
    pub connected_at: SystemTime,

    /// The room this connection was seated in
    pub room_id: Option<RoomId>,
}

impl ClientConnection {
    /// Creates a new, not yet seated, client connection.
    pub fn new(remote_addr: SocketAddr) -> Self {
        Self {
            remote_addr,
            connected_at: SystemTime::now(),
            room_id: None,
        }
    }
}

/// A room's handle on one connected client.
///
/// Sending never blocks: messages go into the connection's bounded outbox and
/// the connection's own write task puts them on the wire. A full outbox means
/// the client is not reading, and the message is dropped rather than stalling
/// the room.
#[derive(Debug, Clone)]
pub struct Participant {
    id: ParticipantId,
    outbox: mpsc::Sender<ServerMessage>,
}

impl Participant {
    pub fn new(id: ParticipantId, outbox: mpsc::Sender<ServerMessage>) -> Self {
        Self { id, outbox }
    }

    pub fn id(&self) -> ParticipantId {
        self.id
    }

    /// Queues `message` for delivery. Returns false if it was dropped.
    pub fn send(&self, message: ServerMessage) -> bool {
        match self.outbox.try_send(message) {
            Ok(()) => true,
            Err(TrySendError::Full(message)) => {
                warn!(
                    participant = self.id,
                    "📪 Outbox full, dropping {:?}", message
                );
                false
            }
            Err(TrySendError::Closed(_)) => {
                debug!(participant = self.id, "Outbox closed, connection already gone");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_outbox_drops_instead_of_blocking() {
        let (tx, mut rx) = mpsc::channel(1);
        let participant = Participant::new(7, tx);

        assert!(participant.send(ServerMessage::Exit));
        assert!(!participant.send(ServerMessage::RoomAssigned(1)));
        assert_eq!(rx.try_recv().ok(), Some(ServerMessage::Exit));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn closed_outbox_reports_failure() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        assert!(!Participant::new(1, tx).send(ServerMessage::Exit));
    }
}
