//! A room: one board, at most two seated participants, and the authority on
//! whose move is legal.
//!
//! The room is the only thing that mutates its board. Every accepted move is
//! followed, before the room is released, by queuing the new board to every
//! seated participant, so all clients observe moves in the order they were
//! applied.
//!
//! A room moves through `Open` (0 or 1 seats) to `Playing` (2 seats) to
//! `Finished`. Nothing moves a room backwards.

use crate::config::{RejectionMode, ServerConfig};
use crate::connection::{Participant, ParticipantId};
use crate::error::RoomError;
use crate::game::board::{Board, BoardStatus, Symbol};
use crate::messaging::{MoveRequest, ServerMessage};
use tracing::{debug, info};

/// Process-unique room identifier; allocated in increasing order.
pub type RoomId = u64;

/// Symbols handed out in join order: the first joiner plays O, the second
/// plays X and therefore moves first.
const SEAT_SYMBOLS: [Symbol; 2] = [Symbol::O, Symbol::X];

/// How a finished game ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Won(Symbol),
    Draw,
    /// A participant left while the game was still being played
    Abandoned,
}

/// Lifecycle state of a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomState {
    /// Fewer than two seats filled; eligible for a new joiner
    Open,
    /// Both seats filled and the game is in progress
    Playing,
    /// No further moves are accepted
    Finished(Outcome),
}

/// Behaviour switches every room of a server shares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoomPolicy {
    pub rejection_mode: RejectionMode,
    pub close_room_on_leave: bool,
}

impl Default for RoomPolicy {
    fn default() -> Self {
        Self {
            rejection_mode: RejectionMode::Notify,
            close_room_on_leave: true,
        }
    }
}

impl From<&ServerConfig> for RoomPolicy {
    fn from(config: &ServerConfig) -> Self {
        Self {
            rejection_mode: config.rejection_mode,
            close_room_on_leave: config.close_room_on_leave,
        }
    }
}

#[derive(Debug)]
struct Seat {
    participant: Participant,
    symbol: Symbol,
}

/// Result of an accepted move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveOutcome {
    pub symbol: Symbol,
    pub status: BoardStatus,
}

/// An isolated game session.
#[derive(Debug)]
pub struct Room {
    id: RoomId,
    board: Board,
    turn: Symbol,
    seats: [Option<Seat>; 2],
    state: RoomState,
    policy: RoomPolicy,
}

impl Room {
    pub fn new(id: RoomId, policy: RoomPolicy) -> Self {
        Self {
            id,
            board: Board::new(),
            turn: Symbol::X,
            seats: [None, None],
            state: RoomState::Open,
            policy,
        }
    }

    pub fn id(&self) -> RoomId {
        self.id
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    /// The symbol allowed to move next.
    pub fn turn(&self) -> Symbol {
        self.turn
    }

    pub fn state(&self) -> RoomState {
        self.state
    }

    pub fn participant_count(&self) -> usize {
        self.seats.iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.participant_count() == 0
    }

    /// True while the room can take another joiner.
    pub fn is_open(&self) -> bool {
        self.state == RoomState::Open && self.participant_count() < SEAT_SYMBOLS.len()
    }

    /// The symbol seated for `participant`, if it holds a seat here.
    pub fn symbol_of(&self, participant: ParticipantId) -> Option<Symbol> {
        self.seat_of(participant).map(|seat| seat.symbol)
    }

    fn seat_of(&self, participant: ParticipantId) -> Option<&Seat> {
        self.seats
            .iter()
            .flatten()
            .find(|seat| seat.participant.id() == participant)
    }

    /// Seats a participant and tells it which room it is in.
    ///
    /// The first joiner gets O, the second X. Filling the second seat moves
    /// the room to `Playing` and sends each participant its symbol.
    ///
    /// # Errors
    ///
    /// [`RoomError::RoomFull`] if both seats are taken or the room has left
    /// the `Open` state.
    pub fn join(&mut self, participant: Participant) -> Result<Symbol, RoomError> {
        if !self.is_open() {
            return Err(RoomError::RoomFull);
        }
        let index = self
            .seats
            .iter()
            .position(Option::is_none)
            .ok_or(RoomError::RoomFull)?;
        let symbol = SEAT_SYMBOLS[index];

        participant.send(ServerMessage::RoomAssigned(self.id));
        info!(
            room = self.id,
            participant = participant.id(),
            %symbol,
            "🪑 Participant seated"
        );
        self.seats[index] = Some(Seat {
            participant,
            symbol,
        });

        if self.participant_count() == SEAT_SYMBOLS.len() {
            self.state = RoomState::Playing;
            for seat in self.seats.iter().flatten() {
                seat.participant.send(ServerMessage::Seated(seat.symbol));
            }
            info!(room = self.id, "🎮 Room full, game started");
        }
        Ok(symbol)
    }

    /// Applies a move for `participant` at `(row, col)`.
    ///
    /// Checks, in order: the participant is seated, the game is not over,
    /// both seats are filled, it is the participant's turn, and the board
    /// accepts the cell. On success the turn passes to the other symbol and
    /// the new board is queued to every seated participant. A rejected move
    /// leaves the room exactly as it was.
    pub fn submit_move(
        &mut self,
        participant: ParticipantId,
        row: usize,
        col: usize,
    ) -> Result<MoveOutcome, RoomError> {
        let symbol = self.symbol_of(participant).ok_or(RoomError::NotSeated)?;
        match self.state {
            RoomState::Finished(_) => return Err(RoomError::GameOver),
            RoomState::Open => return Err(RoomError::WaitingForOpponent),
            RoomState::Playing => {}
        }
        if symbol != self.turn {
            return Err(RoomError::WrongTurn { expected: self.turn });
        }

        let status = self.board.place(row, col, symbol)?;
        self.turn = symbol.opponent();
        match status {
            BoardStatus::InProgress => {}
            BoardStatus::Won(winner) => self.state = RoomState::Finished(Outcome::Won(winner)),
            BoardStatus::Draw => self.state = RoomState::Finished(Outcome::Draw),
        }

        self.broadcast(&ServerMessage::Board(self.board.clone()));
        debug!(room = self.id, %symbol, row, col, ?status, "Move applied");
        if let RoomState::Finished(outcome) = self.state {
            info!(room = self.id, ?outcome, "🏁 Game finished");
        }
        Ok(MoveOutcome { symbol, status })
    }

    /// Handles a move exactly as a client submitted it.
    ///
    /// The seat, not the message, decides who is moving: a message claiming
    /// the other symbol is rejected as [`RoomError::WrongTurn`]. Rejections
    /// are echoed to the mover unless the room runs in silent mode.
    pub fn handle_move(
        &mut self,
        participant: ParticipantId,
        request: MoveRequest,
    ) -> Result<MoveOutcome, RoomError> {
        let result = match self.symbol_of(participant) {
            Some(seated) if seated != request.symbol => {
                Err(RoomError::WrongTurn { expected: self.turn })
            }
            _ => self.submit_move(participant, request.row, request.col),
        };

        if let Err(err) = &result {
            debug!(room = self.id, participant, %err, "Move rejected");
            if self.policy.rejection_mode == RejectionMode::Notify {
                let reason = err.reject_reason();
                if let (Some(reason), Some(seat)) = (reason, self.seat_of(participant)) {
                    seat.participant.send(ServerMessage::Rejected(reason));
                }
            }
        }
        result
    }

    /// Removes a participant from its seat.
    ///
    /// Leaving a game in progress finishes it as abandoned. If the room was
    /// past `Open` and `close_room_on_leave` is set, the remaining participant
    /// is sent `exit`.
    ///
    /// # Returns
    ///
    /// The number of participants still seated; zero means the room should be
    /// torn down.
    pub fn leave(&mut self, participant: ParticipantId) -> usize {
        let Some(index) = self.seats.iter().position(|seat| {
            seat.as_ref()
                .is_some_and(|s| s.participant.id() == participant)
        }) else {
            return self.participant_count();
        };
        if let Some(left) = self.seats[index].take() {
            info!(room = self.id, participant, symbol = %left.symbol, "🚪 Participant left");
        }

        if self.state == RoomState::Playing {
            self.state = RoomState::Finished(Outcome::Abandoned);
        }

        if self.state != RoomState::Open && self.policy.close_room_on_leave {
            self.broadcast(&ServerMessage::Exit);
        }
        self.participant_count()
    }

    /// Sends `exit` to everyone and empties the room. Used on server shutdown.
    ///
    /// # Returns
    ///
    /// How many participants were notified.
    pub fn close(&mut self) -> usize {
        self.broadcast(&ServerMessage::Exit);
        let notified = self.participant_count();
        self.seats = [None, None];
        if self.state == RoomState::Playing {
            self.state = RoomState::Finished(Outcome::Abandoned);
        }
        notified
    }

    fn broadcast(&self, message: &ServerMessage) {
        for seat in self.seats.iter().flatten() {
            seat.participant.send(message.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RejectReason;
    use tokio::sync::mpsc;

    fn participant(id: ParticipantId) -> (Participant, mpsc::Receiver<ServerMessage>) {
        let (tx, rx) = mpsc::channel(32);
        (Participant::new(id, tx), rx)
    }

    fn drain(rx: &mut mpsc::Receiver<ServerMessage>) -> Vec<ServerMessage> {
        let mut messages = Vec::new();
        while let Ok(message) = rx.try_recv() {
            messages.push(message);
        }
        messages
    }

    fn full_room() -> (Room, mpsc::Receiver<ServerMessage>, mpsc::Receiver<ServerMessage>) {
        let mut room = Room::new(1, RoomPolicy::default());
        let (a, mut rx_a) = participant(1);
        let (b, mut rx_b) = participant(2);
        room.join(a).expect("first seat");
        room.join(b).expect("second seat");
        drain(&mut rx_a);
        drain(&mut rx_b);
        (room, rx_a, rx_b)
    }

    #[test]
    fn first_joiner_is_o_and_second_is_x() {
        let mut room = Room::new(5, RoomPolicy::default());
        let (a, mut rx_a) = participant(1);
        let (b, mut rx_b) = participant(2);

        assert_eq!(room.join(a), Ok(Symbol::O));
        assert_eq!(room.state(), RoomState::Open);
        assert_eq!(drain(&mut rx_a), vec![ServerMessage::RoomAssigned(5)]);

        assert_eq!(room.join(b), Ok(Symbol::X));
        assert_eq!(room.state(), RoomState::Playing);
        assert_eq!(drain(&mut rx_a), vec![ServerMessage::Seated(Symbol::O)]);
        assert_eq!(
            drain(&mut rx_b),
            vec![
                ServerMessage::RoomAssigned(5),
                ServerMessage::Seated(Symbol::X)
            ]
        );
    }

    #[test]
    fn third_joiner_gets_room_full() {
        let (mut room, _rx_a, _rx_b) = full_room();
        let (c, mut rx_c) = participant(3);
        assert_eq!(room.join(c), Err(RoomError::RoomFull));
        assert_eq!(room.participant_count(), 2);
        assert!(drain(&mut rx_c).is_empty());
    }

    #[test]
    fn moves_wait_for_an_opponent() {
        let mut room = Room::new(1, RoomPolicy::default());
        let (a, _rx) = participant(1);
        room.join(a).expect("seat");
        assert_eq!(room.submit_move(1, 0, 0), Err(RoomError::WaitingForOpponent));
        assert_eq!(room.board(), &Board::new());
    }

    #[test]
    fn wrong_turn_never_mutates() {
        let (mut room, _rx_a, _rx_b) = full_room();
        // Participant 1 is O; X moves first.
        assert_eq!(
            room.submit_move(1, 0, 0),
            Err(RoomError::WrongTurn { expected: Symbol::X })
        );
        assert_eq!(room.board(), &Board::new());
        assert_eq!(room.turn(), Symbol::X);
    }

    #[test]
    fn occupied_cell_never_mutates() {
        let (mut room, _rx_a, _rx_b) = full_room();
        room.submit_move(2, 1, 1).expect("X takes the centre");
        let before = room.board().clone();
        assert!(matches!(
            room.submit_move(1, 1, 1),
            Err(RoomError::CellOccupied { row: 1, col: 1, by: Symbol::X })
        ));
        assert_eq!(room.board(), &before);
        assert_eq!(room.turn(), Symbol::O);
    }

    #[test]
    fn accepted_move_flips_turn_and_reaches_both_players() {
        let (mut room, mut rx_a, mut rx_b) = full_room();
        let outcome = room.submit_move(2, 1, 1).expect("X moves");
        assert_eq!(outcome.symbol, Symbol::X);
        assert_eq!(outcome.status, BoardStatus::InProgress);
        assert_eq!(room.turn(), Symbol::O);

        let expected: Board = " , , \n ,X, \n , , \n".parse().expect("board");
        assert_eq!(drain(&mut rx_a), vec![ServerMessage::Board(expected.clone())]);
        assert_eq!(drain(&mut rx_b), vec![ServerMessage::Board(expected)]);
    }

    #[test]
    fn claimed_symbol_must_match_the_seat() {
        let (mut room, _rx_a, mut rx_b) = full_room();
        // Participant 2 is X but claims to be O.
        let request = MoveRequest {
            symbol: Symbol::O,
            row: 0,
            col: 0,
        };
        assert_eq!(
            room.handle_move(2, request),
            Err(RoomError::WrongTurn { expected: Symbol::X })
        );
        assert_eq!(room.board(), &Board::new());
        assert_eq!(
            drain(&mut rx_b),
            vec![ServerMessage::Rejected(RejectReason::WrongTurn)]
        );
    }

    #[test]
    fn silent_mode_sends_no_rejection() {
        let policy = RoomPolicy {
            rejection_mode: RejectionMode::Silent,
            ..Default::default()
        };
        let mut room = Room::new(1, policy);
        let (a, mut rx_a) = participant(1);
        let (b, _rx_b) = participant(2);
        room.join(a).expect("seat");
        room.join(b).expect("seat");
        drain(&mut rx_a);

        let request = MoveRequest {
            symbol: Symbol::O,
            row: 0,
            col: 0,
        };
        assert!(room.handle_move(1, request).is_err());
        assert!(drain(&mut rx_a).is_empty());
    }

    #[test]
    fn win_finishes_the_room() {
        let (mut room, _rx_a, _rx_b) = full_room();
        room.submit_move(2, 1, 1).expect("X");
        room.submit_move(1, 0, 0).expect("O");
        room.submit_move(2, 1, 0).expect("X");
        room.submit_move(1, 0, 1).expect("O");
        let last = room.submit_move(2, 1, 2).expect("X completes the middle row");

        assert_eq!(last.status, BoardStatus::Won(Symbol::X));
        assert_eq!(room.board().winner(), Some(Symbol::X));
        assert_eq!(room.state(), RoomState::Finished(Outcome::Won(Symbol::X)));
        assert_eq!(room.submit_move(1, 2, 2), Err(RoomError::GameOver));
    }

    #[test]
    fn leaving_a_game_abandons_it_and_closes_the_other_seat() {
        let (mut room, _rx_a, mut rx_b) = full_room();
        assert_eq!(room.leave(1), 1);
        assert_eq!(room.state(), RoomState::Finished(Outcome::Abandoned));
        assert_eq!(drain(&mut rx_b), vec![ServerMessage::Exit]);
        assert!(!room.is_open());
        assert_eq!(room.submit_move(2, 0, 0), Err(RoomError::GameOver));
        assert_eq!(room.leave(2), 0);
        assert!(room.is_empty());
    }

    #[test]
    fn leaving_an_open_room_empties_it() {
        let mut room = Room::new(1, RoomPolicy::default());
        let (a, _rx) = participant(1);
        room.join(a).expect("seat");
        assert_eq!(room.leave(1), 0);
        assert_eq!(room.state(), RoomState::Open);
        // Unknown participants are ignored.
        assert_eq!(room.leave(42), 0);
    }

    #[test]
    fn leave_does_not_resurrect_a_finished_game() {
        let (mut room, _rx_a, _rx_b) = full_room();
        room.submit_move(2, 0, 0).expect("X");
        room.submit_move(1, 1, 0).expect("O");
        room.submit_move(2, 0, 1).expect("X");
        room.submit_move(1, 1, 1).expect("O");
        room.submit_move(2, 0, 2).expect("X wins the top row");
        room.leave(1);
        assert_eq!(room.state(), RoomState::Finished(Outcome::Won(Symbol::X)));
    }

    #[test]
    fn close_notifies_everyone() {
        let (mut room, mut rx_a, mut rx_b) = full_room();
        assert_eq!(room.close(), 2);
        assert!(room.is_empty());
        assert_eq!(drain(&mut rx_a), vec![ServerMessage::Exit]);
        assert_eq!(drain(&mut rx_b), vec![ServerMessage::Exit]);
    }
}
