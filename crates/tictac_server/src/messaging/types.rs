//! Message type definitions for client-server communication.
//!
//! Every message is newline-terminated text. Client messages are always a
//! single line; the server's board message is exactly three lines.
//!
//! ```text
//! client -> server   X,1,2            move: symbol, row, col
//! client -> server   exit             intentional disconnect
//! server -> client   3                room id, on join
//! server -> client   O                assigned symbol, once the room fills
//! server -> client    , , \n ,X, ...  board after every accepted move
//! server -> client   error wrong_turn rejected move (notify mode only)
//! server -> client   exit             the server is closing this connection
//! ```

use crate::error::{ConnectionError, RejectReason};
use crate::game::board::{Board, Symbol};
use crate::game::room::RoomId;

/// Token either side sends before closing its end.
pub const EXIT_TOKEN: &str = "exit";

/// Prefix of a rejection line.
pub const ERROR_PREFIX: &str = "error ";

/// A move as submitted by a client.
///
/// Coordinates are kept as `usize`; negative or huge values on the wire are
/// carried as `usize::MAX`, which the board classifies as out of range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveRequest {
    /// The symbol the client claims to be playing
    pub symbol: Symbol,
    pub row: usize,
    pub col: usize,
}

/// A message sent from a client to the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientMessage {
    Move(MoveRequest),
    Exit,
}

impl ClientMessage {
    /// Parses one inbound line.
    ///
    /// Surrounding whitespace (including a trailing `\r`) is ignored. Anything
    /// that is neither `exit` nor `symbol,row,col` with integer coordinates is
    /// a [`ConnectionError::MalformedMessage`].
    pub fn parse(line: &str) -> Result<Self, ConnectionError> {
        let line = line.trim();
        if line == EXIT_TOKEN {
            return Ok(ClientMessage::Exit);
        }

        let malformed = || ConnectionError::MalformedMessage(format!("unparseable move '{line}'"));
        let mut fields = line.split(',').map(str::trim);
        let (Some(symbol), Some(row), Some(col), None) =
            (fields.next(), fields.next(), fields.next(), fields.next())
        else {
            return Err(malformed());
        };

        let symbol: Symbol = symbol.parse().map_err(|_| malformed())?;
        let row = parse_coordinate(row).ok_or_else(malformed)?;
        let col = parse_coordinate(col).ok_or_else(malformed)?;
        Ok(ClientMessage::Move(MoveRequest { symbol, row, col }))
    }

    /// Encodes the message as a newline-terminated line.
    pub fn encode(&self) -> String {
        match self {
            ClientMessage::Move(mv) => format!("{},{},{}\n", mv.symbol, mv.row, mv.col),
            ClientMessage::Exit => format!("{EXIT_TOKEN}\n"),
        }
    }
}

fn parse_coordinate(text: &str) -> Option<usize> {
    let value: i64 = text.parse().ok()?;
    Some(usize::try_from(value).unwrap_or(usize::MAX))
}

/// A message sent from the server to a client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerMessage {
    /// The room the client was placed in
    RoomAssigned(RoomId),
    /// The client's symbol, sent once both seats are filled
    Seated(Symbol),
    /// The board after an accepted move
    Board(Board),
    /// The client's last move was not applied
    Rejected(RejectReason),
    /// The server is closing the connection
    Exit,
}

impl ServerMessage {
    /// Encodes the message in its wire form, newline-terminated.
    pub fn encode(&self) -> String {
        match self {
            ServerMessage::RoomAssigned(room_id) => format!("{room_id}\n"),
            ServerMessage::Seated(symbol) => format!("{symbol}\n"),
            ServerMessage::Board(board) => board.serialize(),
            ServerMessage::Rejected(reason) => format!("{ERROR_PREFIX}{reason}\n"),
            ServerMessage::Exit => format!("{EXIT_TOKEN}\n"),
        }
    }

    pub fn is_exit(&self) -> bool {
        matches!(self, ServerMessage::Exit)
    }
}
