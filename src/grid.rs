//! # Colored-Block Grid
//!
//! This module implements the board the solver searches over: a fixed-size
//! rectangle of cells, each empty or holding one of four colors.
//!
//! ## Rules
//! - A move removes a whole connected group of same-colored cells
//!   (4-directional adjacency)
//! - Remaining cells in each affected column fall down to fill the gaps
//! - Optionally, empty columns are closed by shifting later columns left
//! - The puzzle is solved when every cell is empty
//!
//! The board is stored as a flat row-major `Vec<u8>` (row 0 is the top) so that
//! the gravity and compaction passes from `former_shared` can work on it directly.

use crate::error::{CellParseError, GridError};
use crate::moves::GridMove;
use crate::PuzzleState;
use former_shared::{self as shared, EMPTY};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Largest supported side length.
pub const MAX_SIDE: usize = 255;

/// One of the four block colors.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Color {
    Blue = 1,
    Green = 2,
    Purple = 3,
    Orange = 4,
}

impl Color {
    pub const ALL: [Color; 4] = [Color::Blue, Color::Green, Color::Purple, Color::Orange];

    /// Text symbol used in board files.
    pub fn symbol(self) -> char {
        match self {
            Color::Blue => 'B',
            Color::Green => 'G',
            Color::Purple => 'P',
            Color::Orange => 'O',
        }
    }

    pub fn from_symbol(symbol: char) -> Option<Self> {
        match symbol {
            'B' => Some(Color::Blue),
            'G' => Some(Color::Green),
            'P' => Some(Color::Purple),
            'O' => Some(Color::Orange),
            _ => None,
        }
    }

    fn code(self) -> u8 {
        self as u8
    }

    fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(Color::Blue),
            2 => Some(Color::Green),
            3 => Some(Color::Purple),
            4 => Some(Color::Orange),
            _ => None,
        }
    }
}

/// Symbol for an empty cell in board text.
pub const EMPTY_SYMBOL: char = '.';

/// A cell coordinate. Ordering is row-major, which is also the canonical
/// order used to pick a group's representative cell.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, PartialOrd, Ord)]
pub struct Cell {
    pub row: usize,
    pub col: usize,
}

impl Cell {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

impl FromStr for Cell {
    type Err = CellParseError;

    /// Parses `row,col`, optionally wrapped in parentheses.
    ///
    /// # Examples
    /// ```
    /// use former::grid::Cell;
    /// let cell: Cell = "(2, 3)".parse().unwrap();
    /// assert_eq!(cell, Cell::new(2, 3));
    /// ```
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let inner = s
            .trim()
            .trim_start_matches('(')
            .trim_end_matches(')');
        let (row, col) = inner
            .split_once(',')
            .ok_or_else(|| CellParseError::Format(s.to_string()))?;
        let parse = |part: &str| {
            part.trim()
                .parse::<usize>()
                .map_err(|_| CellParseError::Number(part.trim().to_string()))
        };
        Ok(Cell::new(parse(row)?, parse(col)?))
    }
}

/// What happens to columns after a group is removed.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollapsePolicy {
    /// Cells fall inside their own column; columns never move.
    #[default]
    Gravity,
    /// Gravity, then empty columns are closed by shifting later columns left.
    GravityAndShift,
}

/// The complete state of a puzzle board.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct Grid {
    /// Cells as a flat vector (row-major), `EMPTY` or a color code
    cells: Vec<u8>,
    width: usize,
    height: usize,
    collapse: CollapsePolicy,
}

impl Grid {
    /// Creates an all-empty grid.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            cells: vec![EMPTY; width * height],
            width,
            height,
            collapse: CollapsePolicy::default(),
        }
    }

    /// Builds a grid from text rows, one symbol per cell.
    pub fn from_rows<S: AsRef<str>>(rows: &[S]) -> Result<Self, GridError> {
        let height = rows.len();
        let width = rows
            .first()
            .map(|row| row.as_ref().chars().count())
            .ok_or(GridError::Empty)?;
        if width == 0 {
            return Err(GridError::Empty);
        }
        if width > MAX_SIDE || height > MAX_SIDE {
            return Err(GridError::TooLarge { width, height });
        }

        let mut grid = Grid::new(width, height);
        for (row, line) in rows.iter().enumerate() {
            let line = line.as_ref();
            let found = line.chars().count();
            if found != width {
                return Err(GridError::RaggedRow {
                    row,
                    expected: width,
                    found,
                });
            }
            for (col, symbol) in line.chars().enumerate() {
                grid.cells[row * width + col] = match symbol {
                    EMPTY_SYMBOL => EMPTY,
                    _ => Color::from_symbol(symbol)
                        .ok_or(GridError::UnknownSymbol { row, col, symbol })?
                        .code(),
                };
            }
        }
        Ok(grid)
    }

    /// Fills every cell with a uniformly chosen color.
    pub fn random<R: Rng + ?Sized>(width: usize, height: usize, rng: &mut R) -> Self {
        let mut grid = Grid::new(width, height);
        for cell in &mut grid.cells {
            *cell = Color::ALL[rng.random_range(0..Color::ALL.len())].code();
        }
        grid
    }

    pub fn with_collapse(mut self, collapse: CollapsePolicy) -> Self {
        self.collapse = collapse;
        self
    }

    pub fn collapse(&self) -> CollapsePolicy {
        self.collapse
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the color at `cell`, or `None` if it is empty or out of bounds.
    pub fn cell(&self, cell: Cell) -> Option<Color> {
        if !self.in_bounds(cell) {
            return None;
        }
        Color::from_code(self.cells[self.index(cell)])
    }

    pub fn in_bounds(&self, cell: Cell) -> bool {
        cell.row < self.height && cell.col < self.width
    }

    /// Number of non-empty cells.
    pub fn remaining_block_count(&self) -> usize {
        shared::count_blocks(&self.cells)
    }

    /// True iff every cell is empty.
    pub fn is_terminal(&self) -> bool {
        self.cells.iter().all(|&c| c == EMPTY)
    }

    /// All cells of the group containing `cell`, sorted row-major.
    ///
    /// Returns `None` if `cell` is empty or out of bounds: an empty cell is not
    /// a valid move origin.
    pub fn connected_group(&self, cell: Cell) -> Option<Vec<Cell>> {
        if self.cell(cell).is_none() {
            return None;
        }
        let mut visited = vec![false; self.cells.len()];
        let mut group = Vec::new();
        self.flood(self.index(cell), &mut visited, |idx| group.push(idx));
        let mut group: Vec<Cell> = group.into_iter().map(|idx| self.cell_at(idx)).collect();
        group.sort_unstable();
        Some(group)
    }

    /// The canonical move for the group containing `cell`.
    pub fn canonical_move(&self, cell: Cell) -> Option<GridMove> {
        let group = self.connected_group(cell)?;
        Some(GridMove::new(group[0], group.len()))
    }

    /// One canonical cell per connected group, in row-major order of first
    /// appearance. Empty iff the grid is terminal.
    pub fn legal_move_origins(&self) -> Vec<Cell> {
        self.legal_moves().into_iter().map(|mv| mv.origin).collect()
    }

    /// Enumerates one move per distinct group.
    ///
    /// A row-major scan reaches every group first at its smallest cell, which
    /// is the same representative [`Grid::canonical_move`] picks.
    pub fn legal_moves(&self) -> Vec<GridMove> {
        let mut visited = vec![false; self.cells.len()];
        let mut moves = Vec::new();
        for idx in 0..self.cells.len() {
            if visited[idx] || self.cells[idx] == EMPTY {
                continue;
            }
            let mut size = 0;
            self.flood(idx, &mut visited, |_| size += 1);
            moves.push(GridMove::new(self.cell_at(idx), size));
        }
        moves
    }

    /// Removes every cell in `group`, then collapses the board.
    ///
    /// Callers that need the pre-move state must clone first.
    pub fn apply_move(&mut self, group: &[Cell]) {
        let mut touched = vec![false; self.width];
        for &cell in group {
            if !self.in_bounds(cell) {
                continue;
            }
            let idx = self.index(cell);
            self.cells[idx] = EMPTY;
            touched[cell.col] = true;
        }
        for col in (0..self.width).filter(|&col| touched[col]) {
            shared::settle_column(&mut self.cells, self.width, self.height, col);
        }
        if self.collapse == CollapsePolicy::GravityAndShift {
            shared::compact_columns(&mut self.cells, self.width, self.height);
        }
    }

    /// Removes the group containing `cell`.
    ///
    /// # Returns
    /// The number of cells removed, or `None` if `cell` is empty (the grid is
    /// left unchanged).
    pub fn remove_group_at(&mut self, cell: Cell) -> Option<usize> {
        let group = self.connected_group(cell)?;
        self.apply_move(&group);
        Some(group.len())
    }

    fn index(&self, cell: Cell) -> usize {
        cell.row * self.width + cell.col
    }

    fn cell_at(&self, idx: usize) -> Cell {
        Cell::new(idx / self.width, idx % self.width)
    }

    /// Depth-first fill over same-colored neighbours of `start`, marking
    /// `visited` and reporting each cell index once.
    fn flood(&self, start: usize, visited: &mut [bool], mut visit: impl FnMut(usize)) {
        let color = self.cells[start];
        let mut stack = vec![start];
        visited[start] = true;
        while let Some(idx) = stack.pop() {
            visit(idx);
            let (row, col) = (idx / self.width, idx % self.width);
            let neighbours = [
                (row > 0).then(|| idx - self.width),
                (row + 1 < self.height).then(|| idx + self.width),
                (col > 0).then(|| idx - 1),
                (col + 1 < self.width).then(|| idx + 1),
            ];
            for next in neighbours.into_iter().flatten() {
                if !visited[next] && self.cells[next] == color {
                    visited[next] = true;
                    stack.push(next);
                }
            }
        }
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..self.height {
            for col in 0..self.width {
                let symbol = self
                    .cell(Cell::new(row, col))
                    .map_or(EMPTY_SYMBOL, Color::symbol);
                write!(f, "{}", symbol)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

impl FromStr for Grid {
    type Err = GridError;

    /// Parses a board: one row per line, surrounding whitespace and blank
    /// lines ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rows: Vec<&str> = s
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect();
        Grid::from_rows(&rows)
    }
}

impl PuzzleState for Grid {
    type Move = GridMove;

    fn legal_moves(&self) -> Vec<Self::Move> {
        Grid::legal_moves(self)
    }

    fn apply(&mut self, mv: &Self::Move) {
        let removed = self.remove_group_at(mv.origin);
        debug_assert!(removed.is_some(), "move {} has an empty origin", mv);
    }

    fn is_terminal(&self) -> bool {
        Grid::is_terminal(self)
    }

    fn remaining(&self) -> usize {
        self.remaining_block_count()
    }

    fn move_bound(&self) -> usize {
        self.width * self.height
    }

    fn move_weight(&self, mv: &Self::Move) -> u32 {
        mv.size as u32
    }
}
