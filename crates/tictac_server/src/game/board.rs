//! The 3x3 board: cell occupancy, win and draw detection, and the text
//! encoding that doubles as the wire format.
//!
//! The board stores cells only. Winner and fullness are always derived from
//! the cells so they can never disagree with them.

use crate::error::{ParseBoardError, PlacementError};
use std::fmt;
use std::str::FromStr;

/// Side length of the board.
pub const BOARD_SIZE: usize = 3;

/// Every line that wins, scanned rows first, then columns, then diagonals.
const LINES: [[(usize, usize); 3]; 8] = [
    [(0, 0), (0, 1), (0, 2)],
    [(1, 0), (1, 1), (1, 2)],
    [(2, 0), (2, 1), (2, 2)],
    [(0, 0), (1, 0), (2, 0)],
    [(0, 1), (1, 1), (2, 1)],
    [(0, 2), (1, 2), (2, 2)],
    [(0, 0), (1, 1), (2, 2)],
    [(0, 2), (1, 1), (2, 0)],
];

/// A player's mark. X always moves first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Symbol {
    X,
    O,
}

impl Symbol {
    /// Returns the other symbol.
    pub fn opponent(self) -> Self {
        match self {
            Symbol::X => Symbol::O,
            Symbol::O => Symbol::X,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            Symbol::X => 'X',
            Symbol::O => 'O',
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

impl FromStr for Symbol {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "X" => Ok(Symbol::X),
            "O" => Ok(Symbol::O),
            other => Err(format!("'{other}' is not a player symbol")),
        }
    }
}

/// One square of the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Cell {
    #[default]
    Empty,
    Occupied(Symbol),
}

impl Cell {
    /// Character used in the text encoding; a space for an empty cell.
    pub fn as_char(self) -> char {
        match self {
            Cell::Empty => ' ',
            Cell::Occupied(symbol) => symbol.as_char(),
        }
    }
}

/// State of the game as seen from the board alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardStatus {
    InProgress,
    Won(Symbol),
    Draw,
}

/// 3x3 grid of cells, row-major.
///
/// A cell goes from `Empty` to `Occupied` at most once; nothing on this type
/// clears a cell.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Board {
    cells: [[Cell; BOARD_SIZE]; BOARD_SIZE],
}

impl Board {
    /// Creates an empty board.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cell at `(row, col)`, or `None` when off the board.
    pub fn cell(&self, row: usize, col: usize) -> Option<Cell> {
        self.cells.get(row).and_then(|r| r.get(col)).copied()
    }

    /// Places `symbol` at `(row, col)`.
    ///
    /// Succeeds iff the coordinates are on the board and the cell is empty.
    /// Turn order is not checked here; the room does that before calling.
    ///
    /// # Returns
    ///
    /// The board status after the placement, or the reason it was refused.
    /// A refused placement leaves the board untouched.
    pub fn place(
        &mut self,
        row: usize,
        col: usize,
        symbol: Symbol,
    ) -> Result<BoardStatus, PlacementError> {
        let cell = self
            .cells
            .get_mut(row)
            .and_then(|r| r.get_mut(col))
            .ok_or(PlacementError::OutOfRange { row, col })?;

        if let Cell::Occupied(by) = *cell {
            return Err(PlacementError::CellOccupied { row, col, by });
        }

        *cell = Cell::Occupied(symbol);
        Ok(self.status())
    }

    /// The symbol holding a complete row, column or diagonal, if any.
    ///
    /// Lines are scanned rows, columns, diagonals and the first complete one
    /// wins, which keeps the answer deterministic on boards that were not
    /// reached by legal play.
    pub fn winner(&self) -> Option<Symbol> {
        LINES.iter().find_map(|line| {
            let [a, b, c] = line.map(|(row, col)| self.cells[row][col]);
            match a {
                Cell::Occupied(symbol) if a == b && b == c => Some(symbol),
                _ => None,
            }
        })
    }

    /// True iff no empty cell remains.
    pub fn is_full(&self) -> bool {
        self.cells
            .iter()
            .flatten()
            .all(|cell| *cell != Cell::Empty)
    }

    /// Win takes precedence over a full board.
    pub fn status(&self) -> BoardStatus {
        match self.winner() {
            Some(symbol) => BoardStatus::Won(symbol),
            None if self.is_full() => BoardStatus::Draw,
            None => BoardStatus::InProgress,
        }
    }

    /// Number of occupied cells.
    pub fn occupied(&self) -> usize {
        self.cells
            .iter()
            .flatten()
            .filter(|cell| **cell != Cell::Empty)
            .count()
    }

    /// Coordinates of every empty cell in row-major order.
    pub fn empty_cells(&self) -> Vec<(usize, usize)> {
        (0..BOARD_SIZE)
            .flat_map(|row| (0..BOARD_SIZE).map(move |col| (row, col)))
            .filter(|&(row, col)| self.cells[row][col] == Cell::Empty)
            .collect()
    }

    /// Renders the board as three newline-terminated rows of comma-joined
    /// cells, a space standing for an empty cell. This is the wire encoding.
    pub fn serialize(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in &self.cells {
            let [a, b, c] = row.map(Cell::as_char);
            writeln!(f, "{a},{b},{c}")?;
        }
        Ok(())
    }
}

impl FromStr for Board {
    type Err = ParseBoardError;

    /// Parses the output of [`Board::serialize`]. The trailing newline is
    /// optional, `\r\n` line endings are accepted and padding around a cell
    /// is ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rows: Vec<&str> = s
            .strip_suffix('\n')
            .unwrap_or(s)
            .split('\n')
            .map(|line| line.strip_suffix('\r').unwrap_or(line))
            .collect();
        if rows.len() != BOARD_SIZE {
            return Err(ParseBoardError::RowCount(rows.len()));
        }

        let mut board = Board::new();
        for (row, line) in rows.iter().enumerate() {
            let cells: Vec<&str> = line.split(',').collect();
            if cells.len() != BOARD_SIZE {
                return Err(ParseBoardError::CellCount {
                    row,
                    found: cells.len(),
                });
            }
            for (col, text) in cells.iter().enumerate() {
                board.cells[row][col] = match text.trim() {
                    "" => Cell::Empty,
                    "X" => Cell::Occupied(Symbol::X),
                    "O" => Cell::Occupied(Symbol::O),
                    other => {
                        return Err(ParseBoardError::InvalidCell {
                            row,
                            cell: other.to_string(),
                        })
                    }
                };
            }
        }
        Ok(board)
    }
}
