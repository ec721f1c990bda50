//! Error types shared by the grid model, the search and the solver.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Rejections raised while turning text into a [`crate::grid::Grid`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GridError {
    #[error("invalid board: no rows")]
    Empty,

    #[error("invalid board: row {row} has {found} cells, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("invalid board: unknown symbol {symbol:?} at row {row}, column {col}")]
    UnknownSymbol { row: usize, col: usize, symbol: char },

    #[error("invalid board: {width}x{height} exceeds the 255x255 limit")]
    TooLarge { width: usize, height: usize },
}

/// Failures surfaced by the search tree and the solver.
#[derive(Debug, Error)]
pub enum SolveError<M: fmt::Debug> {
    /// A non-terminal state offered no legal move.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    /// The top-level move cap was reached with blocks still on the board.
    #[error("no solution within {limit} moves ({} moves played)", .partial.len())]
    SearchBudgetExhaustedWithoutSolution { limit: usize, partial: Vec<M> },

    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Errors from loading or validating a [`crate::config::SolverConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Errors from parsing a `row,col` cell coordinate.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CellParseError {
    #[error("expected `row,col`, got {0:?}")]
    Format(String),

    #[error("invalid coordinate {0:?}")]
    Number(String),
}
