//! Dispatches inbound client lines to the participant's room.

use crate::connection::ParticipantId;
use crate::error::{ConnectionError, RoomError};
use crate::game::SharedRoom;
use crate::messaging::ClientMessage;
use tracing::{trace, warn};

/// What the connection's read loop should do after a line was routed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteOutcome {
    /// Keep reading
    Continue,
    /// The client sent `exit`; stop reading and leave the room
    Exit,
}

/// Routes one raw line from a client.
///
/// Moves are applied under the room lock, which is released before this
/// returns; the room queues broadcasts without touching the network. A
/// rejected move is not an error for the connection.
///
/// # Arguments
///
/// * `line` - One inbound line, terminator already stripped
/// * `participant` - The sending connection
/// * `room` - The room the sender is seated in
///
/// # Returns
///
/// [`ConnectionError::MalformedMessage`] if the line is not a valid message,
/// which ends the connection.
pub async fn route_client_message(
    line: &str,
    participant: ParticipantId,
    room: &SharedRoom,
) -> Result<RouteOutcome, ConnectionError> {
    match ClientMessage::parse(line)? {
        ClientMessage::Exit => {
            trace!(participant, "Client requested exit");
            Ok(RouteOutcome::Exit)
        }
        ClientMessage::Move(request) => {
            let result = room.lock().await.handle_move(participant, request);
            if let Err(RoomError::NotSeated) = result {
                warn!(participant, "Move from a participant without a seat");
            }
            Ok(RouteOutcome::Continue)
        }
    }
}
