//! Error types and handling for the room server.
//!
//! This module defines the error types that can occur during server operations,
//! split by the layer that produces them: board placement, room arbitration,
//! the per-connection transport, and the server itself.

use crate::game::board::Symbol;
use std::fmt;
use std::str::FromStr;

/// Enumeration of possible server errors.
///
/// Categorizes errors into network-related and internal server errors
/// to help with debugging and error handling.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Network-related errors such as binding failures or connection issues
    #[error("Network error: {0}")]
    Network(String),

    /// Internal server errors including registry and room bookkeeping failures
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Rejection reasons produced by the board itself.
///
/// The board knows nothing about turns; it only classifies whether a cell
/// exists and whether it is still empty. A rejected placement never mutates
/// the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PlacementError {
    /// Row or column outside `0..3`
    #[error("cell ({row}, {col}) is outside the 3x3 board")]
    OutOfRange { row: usize, col: usize },

    /// The cell already holds a symbol
    #[error("cell ({row}, {col}) is already taken by {by}")]
    CellOccupied { row: usize, col: usize, by: Symbol },
}

/// Errors returned by room operations (`join`, `submit_move`).
///
/// Everything except `RoomFull`, `NotSeated` and `ShuttingDown` is a local
/// move rejection: the move is not applied and, depending on the rejection
/// mode, the mover is told why.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RoomError {
    /// Row or column outside `0..3`
    #[error("cell ({row}, {col}) is outside the 3x3 board")]
    OutOfRange { row: usize, col: usize },

    /// The target cell is already occupied
    #[error("cell ({row}, {col}) is already taken by {by}")]
    CellOccupied { row: usize, col: usize, by: Symbol },

    /// The mover's symbol is not the one the turn indicator allows
    #[error("it is {expected}'s turn")]
    WrongTurn { expected: Symbol },

    /// The room already seats two participants or has been sealed
    #[error("room is full")]
    RoomFull,

    /// The game reached a win, a draw or was abandoned
    #[error("game is over")]
    GameOver,

    /// A move arrived before the second participant was seated
    #[error("waiting for an opponent to join")]
    WaitingForOpponent,

    /// The participant does not hold a seat in this room
    #[error("participant is not seated in this room")]
    NotSeated,

    /// The server is shutting down and seats no one
    #[error("server is shutting down")]
    ShuttingDown,
}

impl From<PlacementError> for RoomError {
    fn from(err: PlacementError) -> Self {
        match err {
            PlacementError::OutOfRange { row, col } => RoomError::OutOfRange { row, col },
            PlacementError::CellOccupied { row, col, by } => {
                RoomError::CellOccupied { row, col, by }
            }
        }
    }
}

impl RoomError {
    /// The reason reported to a client whose move was rejected.
    ///
    /// Returns `None` for errors that never originate from a client move.
    pub fn reject_reason(&self) -> Option<RejectReason> {
        match self {
            RoomError::OutOfRange { .. } => Some(RejectReason::OutOfRange),
            RoomError::CellOccupied { .. } => Some(RejectReason::CellOccupied),
            RoomError::WrongTurn { .. } => Some(RejectReason::WrongTurn),
            RoomError::GameOver => Some(RejectReason::GameOver),
            RoomError::WaitingForOpponent => Some(RejectReason::WaitingForOpponent),
            RoomError::RoomFull | RoomError::NotSeated | RoomError::ShuttingDown => None,
        }
    }
}

/// Wire-level classification of a rejected move, sent as `error <reason>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    OutOfRange,
    CellOccupied,
    WrongTurn,
    GameOver,
    WaitingForOpponent,
}

impl RejectReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectReason::OutOfRange => "out_of_range",
            RejectReason::CellOccupied => "cell_occupied",
            RejectReason::WrongTurn => "wrong_turn",
            RejectReason::GameOver => "game_over",
            RejectReason::WaitingForOpponent => "waiting_for_opponent",
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RejectReason {
    type Err = ConnectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "out_of_range" => Ok(RejectReason::OutOfRange),
            "cell_occupied" => Ok(RejectReason::CellOccupied),
            "wrong_turn" => Ok(RejectReason::WrongTurn),
            "game_over" => Ok(RejectReason::GameOver),
            "waiting_for_opponent" => Ok(RejectReason::WaitingForOpponent),
            other => Err(ConnectionError::MalformedMessage(format!(
                "unknown rejection reason '{other}'"
            ))),
        }
    }
}

/// Errors that end a connection handler's read loop.
///
/// Both variants are fatal to the connection: the handler exits and the
/// participant leaves its room.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    /// The peer sent text that is not a valid message
    #[error("malformed message: {0}")]
    MalformedMessage(String),

    /// Reading from or writing to the transport failed
    #[error("connection lost: {0}")]
    ConnectionLost(#[from] std::io::Error),
}

/// Errors from decoding the three-line board text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseBoardError {
    #[error("expected 3 rows, found {0}")]
    RowCount(usize),

    #[error("row {row} has {found} cells, expected 3")]
    CellCount { row: usize, found: usize },

    #[error("row {row} holds invalid cell '{cell}'")]
    InvalidCell { row: usize, cell: String },
}
