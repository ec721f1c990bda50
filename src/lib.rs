//! # Single-Player MCTS Puzzle Solver
//!
//! This crate finds short move sequences that clear a colored-block grid.
//! A move removes a connected same-colored group; the remaining blocks fall
//! down. The search is single-player Monte Carlo Tree Search (SP-MCTS): UCT
//! with an extra variance bonus, random playouts, and a solver loop that
//! commits one move at a time and re-roots the tree.
//!
//! ## Layout
//! - [`grid`]: board representation, connectivity, removal and collapse
//! - [`moves`]: canonical move identity
//! - [`playout`]: random rollouts and the reward model
//! - [`tree`]: the search tree (selection, expansion, simulation, backpropagation)
//! - [`solver`]: the top-level move-commit loop and root-parallel solving
//! - [`config`]: solver configuration
//! - [`error`]: error taxonomy
//!
//! ## Usage
//! ```
//! use former::{grid::Grid, Solver, SolverConfig};
//!
//! // No two same-colored cells touch, and fixed columns keep them apart.
//! let grid: Grid = "PGPG".parse().unwrap();
//! let solver = Solver::new(SolverConfig::for_testing());
//! let solution = solver.solve_seeded(&grid, 42).unwrap();
//! assert_eq!(solution.len(), 4);
//! ```

pub mod config;
pub mod error;
pub mod grid;
pub mod moves;
pub mod playout;
pub mod solver;
pub mod tree;

pub use config::{SearchBudget, SolverConfig, TreePolicy};
pub use error::{ConfigError, GridError, SolveError};
pub use grid::{Cell, CollapsePolicy, Color, Grid};
pub use moves::GridMove;
pub use playout::{RewardModel, RolloutPolicy};
pub use solver::{ParallelSolution, Solution, Solver};
pub use tree::{NodeStats, RootChildStats, SearchProgress, SearchStats, SearchTree};

/// A single-player puzzle state. Must be cloneable so the search can explore
/// hypothetical futures on private copies.
/// `Send` and `Sync` are required for root-parallel solving.
pub trait PuzzleState: Clone + Send + Sync {
    /// The type of a move in the puzzle.
    type Move: Clone + Eq + std::hash::Hash + std::fmt::Debug + Send + Sync;

    /// Returns every legal move, in a stable order, one per distinct outcome.
    fn legal_moves(&self) -> Vec<Self::Move>;
    /// Applies a move to the state, modifying it.
    fn apply(&mut self, mv: &Self::Move);
    /// Returns true if the puzzle is solved.
    fn is_terminal(&self) -> bool;
    /// Progress measure: how much is left to clear.
    fn remaining(&self) -> usize;
    /// Upper bound on the number of moves any solution can take.
    fn move_bound(&self) -> usize;
    /// Relative weight of a move for size-weighted rollouts.
    fn move_weight(&self, _mv: &Self::Move) -> u32 {
        1
    }
}
