//! Game state: the board, the rooms that arbitrate it and the registry that
//! owns the rooms.

pub mod board;
pub mod registry;
pub mod room;

pub use board::{Board, BoardStatus, Cell, Symbol, BOARD_SIZE};
pub use registry::{RegistryStats, Seating, SessionRegistry, SharedRoom};
pub use room::{MoveOutcome, Outcome, Room, RoomId, RoomPolicy, RoomState};
