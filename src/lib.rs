//! Gomoku (five-in-a-row) rules engine.
//!
//! The engine owns the board, the side to move, and the winner, and it
//! notifies subscribers synchronously for every accepted move. Rendering
//! and input handling live outside this crate.
//!
//! # Coordinates
//!
//! ```text
//! x in [0, column), y in [0, row)
//!
//!        x=0   x=1   x=2
//!   y=0 (0,0) (1,0) (2,0)
//!   y=1 (0,1) (1,1) (2,1)
//!   y=2 (0,2) (1,2) (2,2)
//! ```
//!
//! Cells are stored column-major (`index = x * row + y`), so a column is a
//! contiguous slice and `board.column(x)[y]` addresses a cell the same way
//! a `cells[x][y]` matrix would.
//!
//! # Win Detection
//!
//! ```text
//! Line          step     checked
//! Vertical      (0, 1)   1st
//! Horizontal    (1, 0)   2nd
//! AntiDiagonal  (1, -1)  3rd
//! MainDiagonal  (1, 1)   4th
//! ```
//!
//! Only the lines through the stone just placed are inspected, each over a
//! window of 9 cells centred on it.

mod error;

#[cfg(feature = "wasm")]
pub mod wasm;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize, Serializer};
use tracing::{debug, trace};

pub use error::GomokuError;

/// Stones in a row needed to win.
pub const WIN_LENGTH: usize = 5;

/// Cells inspected per line: the placed stone plus `WIN_LENGTH - 1` either side.
const WINDOW: usize = 2 * WIN_LENGTH - 1;

/// Board size the reference game starts with.
pub const DEFAULT_SIZE: usize = 12;

/// Contents of a single cell.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum CellStatus {
    #[default]
    Empty = 0,
    Black = 1,
    White = 2,
}

impl CellStatus {
    /// The player owning this cell, if any.
    #[inline]
    pub fn player(self) -> Option<Player> {
        match self {
            CellStatus::Empty => None,
            CellStatus::Black => Some(Player::Black),
            CellStatus::White => Some(Player::White),
        }
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self == CellStatus::Empty
    }
}

impl fmt::Display for CellStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellStatus::Empty => f.write_str("Empty"),
            CellStatus::Black => f.write_str("Black"),
            CellStatus::White => f.write_str("White"),
        }
    }
}

/// Stone colour. Black always moves first.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Player {
    Black = 1,
    White = 2,
}

impl Player {
    /// Get the opponent player.
    #[inline]
    pub fn opponent(self) -> Player {
        match self {
            Player::Black => Player::White,
            Player::White => Player::Black,
        }
    }

    /// The cell status a stone of this colour leaves behind.
    #[inline]
    pub fn status(self) -> CellStatus {
        match self {
            Player::Black => CellStatus::Black,
            Player::White => CellStatus::White,
        }
    }
}

impl From<Player> for CellStatus {
    fn from(player: Player) -> CellStatus {
        player.status()
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.status().fmt(f)
    }
}

/// A board coordinate. May lie off the board until checked.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    #[inline]
    pub const fn new(x: i32, y: i32) -> Position {
        Position { x, y }
    }

    /// Step `k` times along `line` (negative `k` walks backwards).
    ///
    /// Saturates at the `i32` limits, which always lie off the board.
    #[inline]
    pub fn offset(self, line: Line, k: i32) -> Position {
        let (dx, dy) = line.step();
        Position::new(
            self.x.saturating_add(dx.saturating_mul(k)),
            self.y.saturating_add(dy.saturating_mul(k)),
        )
    }
}

/// A completed move: where the stone went and whose it is.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, Serialize, Deserialize)]
pub struct Cell {
    pub x: i32,
    pub y: i32,
    pub status: CellStatus,
}

impl Cell {
    #[inline]
    pub fn position(&self) -> Position {
        Position::new(self.x, self.y)
    }
}

/// Board dimensions. Both are positive and addressable by `i32` coordinates.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawSize")]
pub struct Size {
    column: usize,
    row: usize,
}

#[derive(Deserialize)]
struct RawSize {
    column: usize,
    row: usize,
}

impl TryFrom<RawSize> for Size {
    type Error = GomokuError;

    fn try_from(raw: RawSize) -> Result<Size, GomokuError> {
        Size::new(raw.column, raw.row)
    }
}

impl Size {
    const MAX_DIMENSION: usize = i32::MAX as usize;

    /// Validate a `column x row` size.
    pub fn new(column: usize, row: usize) -> Result<Size, GomokuError> {
        let valid = |n: usize| (1..=Self::MAX_DIMENSION).contains(&n);
        if valid(column) && valid(row) && column.checked_mul(row).is_some() {
            Ok(Size { column, row })
        } else {
            Err(GomokuError::InvalidSize { column, row })
        }
    }

    /// Number of columns (x extent).
    #[inline]
    pub fn column(&self) -> usize {
        self.column
    }

    /// Number of rows (y extent).
    #[inline]
    pub fn row(&self) -> usize {
        self.row
    }

    /// Total cells. Cannot overflow: `Size::new` rejects such sizes.
    #[inline]
    pub fn cell_count(&self) -> usize {
        self.column * self.row
    }

    /// Check whether a position lies on a board of this size.
    #[inline]
    pub fn contains(&self, pos: Position) -> bool {
        // Dimensions fit in i32, so the casts below are lossless.
        pos.x >= 0 && pos.y >= 0 && (pos.x as usize) < self.column && (pos.y as usize) < self.row
    }
}

impl Default for Size {
    fn default() -> Self {
        Size {
            column: DEFAULT_SIZE,
            row: DEFAULT_SIZE,
        }
    }
}

// ============================================================================
// Lines
// ============================================================================

/// The four directions a winning run can take through a cell.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum Line {
    Vertical,
    Horizontal,
    /// Rising x with falling y.
    AntiDiagonal,
    /// Rising x with rising y.
    MainDiagonal,
}

impl Line {
    /// All lines, in the order win detection checks them.
    pub const ALL: [Line; 4] = [
        Line::Vertical,
        Line::Horizontal,
        Line::AntiDiagonal,
        Line::MainDiagonal,
    ];

    /// Unit step `(dx, dy)` along the line.
    #[inline]
    pub const fn step(self) -> (i32, i32) {
        match self {
            Line::Vertical => (0, 1),
            Line::Horizontal => (1, 0),
            Line::AntiDiagonal => (1, -1),
            Line::MainDiagonal => (1, 1),
        }
    }
}

// ============================================================================
// Board
// ============================================================================

/// Fixed-size grid of cell statuses, stored column-major.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Board {
    size: Size,
    cells: Vec<CellStatus>,
}

impl Board {
    /// Create an empty board.
    pub fn new(size: Size) -> Board {
        Board {
            size,
            cells: vec![CellStatus::Empty; size.cell_count()],
        }
    }

    #[inline]
    pub fn size(&self) -> Size {
        self.size
    }

    #[inline]
    pub fn contains(&self, x: i32, y: i32) -> bool {
        self.size.contains(Position::new(x, y))
    }

    #[inline]
    fn index(&self, pos: Position) -> Option<usize> {
        if self.size.contains(pos) {
            Some(pos.x as usize * self.size.row + pos.y as usize)
        } else {
            None
        }
    }

    /// Status at `(x, y)`, or `None` when off the board.
    #[inline]
    pub fn get(&self, x: i32, y: i32) -> Option<CellStatus> {
        self.index(Position::new(x, y)).map(|idx| self.cells[idx])
    }

    /// All cells of column `x`, indexed by `y`.
    pub fn column(&self, x: usize) -> Option<&[CellStatus]> {
        if x < self.size.column {
            let start = x * self.size.row;
            Some(&self.cells[start..start + self.size.row])
        } else {
            None
        }
    }

    /// Iterate over columns in x order.
    pub fn columns(&self) -> impl Iterator<Item = &[CellStatus]> + '_ {
        self.cells.chunks(self.size.row)
    }

    /// Iterate over every cell, column by column.
    pub fn iter(&self) -> impl Iterator<Item = (Position, CellStatus)> + '_ {
        let row = self.size.row;
        self.cells.iter().enumerate().map(move |(idx, &status)| {
            (Position::new((idx / row) as i32, (idx % row) as i32), status)
        })
    }

    /// Number of stones on the board.
    pub fn stone_count(&self) -> usize {
        self.cells.iter().filter(|status| !status.is_empty()).count()
    }

    /// Write a status. Writes off the board are dropped.
    #[inline]
    fn set(&mut self, pos: Position, status: CellStatus) {
        if let Some(idx) = self.index(pos) {
            self.cells[idx] = status;
        }
    }

    // ========== Win Detection ==========

    /// Find a run of at least `WIN_LENGTH` along `line` through `center`.
    ///
    /// Looks at the cells up to `WIN_LENGTH - 1` steps either side of
    /// `center`, drops the ones off the board, trims empties from both
    /// ends and scans what remains for a long enough run of one colour.
    /// Returns the owner and the run's positions in line order.
    pub fn winning_run(&self, center: Position, line: Line) -> Option<(Player, Vec<Position>)> {
        let reach = (WIN_LENGTH - 1) as i32;
        let mut window = [(center, CellStatus::Empty); WINDOW];
        let mut len = 0;

        for k in -reach..=reach {
            let pos = center.offset(line, k);
            if let Some(status) = self.index(pos).map(|idx| self.cells[idx]) {
                window[len] = (pos, status);
                len += 1;
            }
        }

        let window = &window[..len];
        let first = window.iter().position(|(_, status)| !status.is_empty())?;
        let last = window.iter().rposition(|(_, status)| !status.is_empty())?;
        let trimmed = &window[first..=last];

        let mut start = 0;
        for end in 1..=trimmed.len() {
            if end < trimmed.len() && trimmed[end].1 == trimmed[start].1 {
                continue;
            }
            let run = &trimmed[start..end];
            if let Some(player) = run[0].1.player() {
                if run.len() >= WIN_LENGTH {
                    return Some((player, run.iter().map(|(pos, _)| *pos).collect()));
                }
            }
            start = end;
        }
        None
    }

    /// Check every line through `center`, stopping at the first win.
    pub fn find_winner(&self, center: Position) -> Option<(Player, Vec<Position>)> {
        Line::ALL
            .iter()
            .find_map(|&line| self.winning_run(center, line))
    }
}

impl Serialize for Board {
    /// Serialized as a `cells[x][y]` matrix.
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.columns())
    }
}

// ============================================================================
// Engine
// ============================================================================

/// Callback run after every accepted move with the move and the cell's
/// previous status.
pub type Listener = Box<dyn FnMut(Cell, CellStatus)>;

/// Source of engine ids, so a handle only ever matches the engine that issued it.
static NEXT_ENGINE: AtomicU64 = AtomicU64::new(0);

/// Handle returned by [`Gomoku::subscribe`]; pass it to
/// [`Gomoku::unsubscribe`] on the same engine to stop notifications.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub struct Subscription {
    engine: u64,
    id: u64,
}

/// Read-only snapshot of the game.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct State<'a> {
    pub cells: &'a Board,
    pub player: Player,
    pub winner: Option<Player>,
}

/// Why a move attempt was ignored.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum Rejection {
    /// A winner has already been decided.
    GameOver,
    OutOfBounds,
    Occupied,
}

/// Result of [`Gomoku::attempt_move`].
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum MoveOutcome {
    /// Stone placed; the turn passed to the opponent.
    Placed(Cell),
    /// Stone placed and it completed a winning run.
    Won(Cell),
    /// Nothing changed.
    Ignored(Rejection),
}

impl MoveOutcome {
    #[inline]
    pub fn is_accepted(&self) -> bool {
        !matches!(self, MoveOutcome::Ignored(_))
    }

    /// The placed stone, if the move was accepted.
    #[inline]
    pub fn cell(&self) -> Option<Cell> {
        match self {
            MoveOutcome::Placed(cell) | MoveOutcome::Won(cell) => Some(*cell),
            MoveOutcome::Ignored(_) => None,
        }
    }
}

/// The game engine: board, turn, winner and move subscribers.
pub struct Gomoku {
    board: Board,
    player: Player,
    winner: Option<Player>,
    winning_line: Option<Vec<Position>>,
    engine: u64,
    listeners: BTreeMap<u64, Listener>,
    next_subscription: u64,
}

impl Gomoku {
    /// Start a game on an empty board with Black to move.
    pub fn new(size: Size) -> Gomoku {
        Gomoku {
            board: Board::new(size),
            player: Player::Black,
            winner: None,
            winning_line: None,
            engine: NEXT_ENGINE.fetch_add(1, Ordering::Relaxed),
            listeners: BTreeMap::new(),
            next_subscription: 0,
        }
    }

    /// Start a game on a `column x row` board.
    pub fn with_size(column: usize, row: usize) -> Result<Gomoku, GomokuError> {
        Ok(Gomoku::new(Size::new(column, row)?))
    }

    /// Current board, side to move and winner.
    pub fn state(&self) -> State<'_> {
        State {
            cells: &self.board,
            player: self.player,
            winner: self.winner,
        }
    }

    #[inline]
    pub fn size(&self) -> Size {
        self.board.size()
    }

    #[inline]
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// The player who places the next stone.
    ///
    /// Once the game is decided this stays on the winner.
    #[inline]
    pub fn player(&self) -> Player {
        self.player
    }

    #[inline]
    pub fn winner(&self) -> Option<Player> {
        self.winner
    }

    #[inline]
    pub fn is_over(&self) -> bool {
        self.winner.is_some()
    }

    /// Positions of the run that decided the game.
    pub fn winning_line(&self) -> Option<&[Position]> {
        self.winning_line.as_deref()
    }

    #[inline]
    pub fn cell(&self, x: i32, y: i32) -> Option<CellStatus> {
        self.board.get(x, y)
    }

    #[inline]
    pub fn stone_count(&self) -> usize {
        self.board.stone_count()
    }

    /// Place the current player's stone at `(x, y)`.
    ///
    /// Attempts after the game is decided, off the board, or on an occupied
    /// cell are ignored without touching state or notifying anyone.
    /// Otherwise the stone is placed, the winner or next player is settled,
    /// and every subscriber is called in subscription order.
    pub fn attempt_move(&mut self, x: i32, y: i32) -> MoveOutcome {
        if let Some(winner) = self.winner {
            trace!(x, y, %winner, "move ignored: game over");
            return MoveOutcome::Ignored(Rejection::GameOver);
        }

        let pos = Position::new(x, y);
        let prev_status = match self.board.get(x, y) {
            Some(status) => status,
            None => {
                trace!(x, y, "move ignored: out of bounds");
                return MoveOutcome::Ignored(Rejection::OutOfBounds);
            }
        };
        if !prev_status.is_empty() {
            trace!(x, y, occupant = %prev_status, "move ignored: occupied");
            return MoveOutcome::Ignored(Rejection::Occupied);
        }

        let mover = self.player;
        let cell = Cell {
            x,
            y,
            status: mover.status(),
        };
        self.board.set(pos, cell.status);

        let outcome = match self.board.find_winner(pos) {
            Some((winner, line)) => {
                debug_assert_eq!(winner, mover);
                debug!(x, y, %winner, "game won");
                self.winner = Some(winner);
                self.winning_line = Some(line);
                MoveOutcome::Won(cell)
            }
            None => {
                self.player = mover.opponent();
                debug!(x, y, player = %mover, "stone placed");
                MoveOutcome::Placed(cell)
            }
        };

        for listener in self.listeners.values_mut() {
            listener(cell, prev_status);
        }
        outcome
    }

    /// Register a callback for accepted moves.
    pub fn subscribe<F>(&mut self, listener: F) -> Subscription
    where
        F: FnMut(Cell, CellStatus) + 'static,
    {
        let subscription = Subscription {
            engine: self.engine,
            id: self.next_subscription,
        };
        self.next_subscription += 1;
        self.listeners.insert(subscription.id, Box::new(listener));
        trace!(id = subscription.id, "listener subscribed");
        subscription
    }

    /// Remove a callback. Returns `false` if it was already removed or the
    /// handle came from another engine.
    pub fn unsubscribe(&mut self, subscription: Subscription) -> bool {
        if subscription.engine != self.engine {
            trace!(id = subscription.id, "unsubscribe ignored: foreign handle");
            return false;
        }
        let removed = self.listeners.remove(&subscription.id).is_some();
        if removed {
            trace!(id = subscription.id, "listener unsubscribed");
        }
        removed
    }

    #[inline]
    pub fn subscriber_count(&self) -> usize {
        self.listeners.len()
    }
}

impl Default for Gomoku {
    fn default() -> Self {
        Self::new(Size::default())
    }
}

impl fmt::Debug for Gomoku {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Gomoku")
            .field("size", &self.board.size())
            .field("player", &self.player)
            .field("winner", &self.winner)
            .field("stones", &self.board.stone_count())
            .field("subscribers", &self.listeners.len())
            .finish()
    }
}
