//! Connection handling logic for TCP clients.
//!
//! This module contains the core connection handling logic that manages the
//! lifecycle of individual client connections: admission, seating, reading
//! moves, writing queued messages, and cleanup.

use crate::{
    config::ServerConfig,
    connection::{ConnectionManager, Participant},
    error::{ConnectionError, RoomError, ServerError},
    game::SessionRegistry,
    messaging::{read_line, route_client_message, write_message, RouteOutcome, ServerMessage},
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::time::{timeout, Duration};
use tracing::{debug, trace, warn};

/// Handles a single client connection from establishment to cleanup.
///
/// # Connection Flow
///
/// 1. Register with the connection manager, or send `exit` if at capacity
/// 2. Seat the participant through the session registry, or send `exit` if
///    the server is shutting down
/// 3. Run the incoming and outgoing halves concurrently
/// 4. Leave the room, which may tear it down and send `exit` to the opponent
/// 5. Flush a final `exit` to this client if the server did not already
///
/// # Arguments
///
/// * `stream` - The TCP stream for the client connection
/// * `addr` - The remote address of the client
/// * `config` - Limits and timings for the connection
/// * `connection_manager` - Manager for tracking connections
/// * `registry` - Registry that seats the participant in a room
///
/// # Message Handling
///
/// * **Incoming half**: reads lines and routes them into the room
/// * **Outgoing half**: drains the participant's outbox onto the socket
///
/// Whichever half finishes first ends the session.
pub async fn handle_connection(
    mut stream: TcpStream,
    addr: SocketAddr,
    config: Arc<ServerConfig>,
    connection_manager: Arc<ConnectionManager>,
    registry: Arc<SessionRegistry>,
) -> Result<(), ServerError> {
    let Some(participant_id) = connection_manager.add_connection(addr).await else {
        refuse(&mut stream).await;
        return Ok(());
    };

    let (outbox, mut inbox) = mpsc::channel(config.outbox_capacity.max(1));
    let own_handle = Participant::new(participant_id, outbox);
    let seating = match registry.connect(own_handle.clone()).await {
        Ok(seating) => seating,
        Err(RoomError::ShuttingDown) => {
            debug!("Client {} arrived during shutdown", participant_id);
            connection_manager.remove_connection(participant_id).await;
            refuse(&mut stream).await;
            return Ok(());
        }
        Err(e) => {
            connection_manager.remove_connection(participant_id).await;
            return Err(ServerError::Internal(format!(
                "could not seat connection {participant_id}: {e}"
            )));
        }
    };
    connection_manager
        .set_room(participant_id, seating.room_id)
        .await;

    let (read_half, mut write_half) = stream.into_split();
    let max_message_size = config.max_message_size;
    let room = seating.room;

    // Incoming task - routes lines into the room
    let incoming_task = async move {
        let mut reader = BufReader::new(read_half);
        loop {
            let line = match read_line(&mut reader, max_message_size).await {
                Ok(Some(line)) => line,
                Ok(None) => {
                    debug!("🔌 Client {} closed the connection", participant_id);
                    break;
                }
                Err(ConnectionError::MalformedMessage(reason)) => {
                    warn!("Dropping client {}: {}", participant_id, reason);
                    break;
                }
                Err(e) => {
                    debug!("Read failed for client {}: {}", participant_id, e);
                    break;
                }
            };

            match route_client_message(&line, participant_id, &room).await {
                Ok(RouteOutcome::Continue) => {}
                Ok(RouteOutcome::Exit) => {
                    debug!("👋 Client {} sent exit", participant_id);
                    break;
                }
                Err(e) => {
                    warn!("Dropping client {}: {}", participant_id, e);
                    break;
                }
            }
        }
    };

    // Outgoing task - drains the outbox until `exit` or the room lets go
    let outgoing_task = async move {
        while let Some(message) = inbox.recv().await {
            trace!("📤 To client {}: {:?}", participant_id, message);
            if let Err(e) = write_message(&mut write_half, &message).await {
                debug!("Write failed for client {}: {}", participant_id, e);
                break;
            }
            if message.is_exit() {
                break;
            }
        }
        let _ = write_half.shutdown().await;
    };

    tokio::pin!(incoming_task);
    tokio::pin!(outgoing_task);

    // Run both halves concurrently until one completes
    let outgoing_finished = tokio::select! {
        _ = &mut incoming_task => false,
        _ = &mut outgoing_task => true,
    };

    registry.disconnect(seating.room_id, participant_id).await;

    if !outgoing_finished {
        own_handle.send(ServerMessage::Exit);
        drop(own_handle);
        let grace = Duration::from_millis(config.shutdown_grace_ms);
        if timeout(grace, outgoing_task).await.is_err() {
            debug!("Client {} did not drain its outbox in time", participant_id);
        }
    }

    connection_manager.remove_connection(participant_id).await;
    Ok(())
}

/// Tells a client that will not be seated to `exit` and closes the stream.
async fn refuse(stream: &mut TcpStream) {
    // Best effort: the client may already be gone.
    let _ = write_message(stream, &ServerMessage::Exit).await;
    let _ = stream.shutdown().await;
}
