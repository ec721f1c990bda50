//! Move identity for the grid puzzle.
//!
//! A move names a connected group by its canonical cell: the row-major-first
//! cell of the group. Because every enumerated move is canonical, comparing
//! origins is the same as comparing groups, as long as both moves come from
//! the same state.

use crate::error::CellParseError;
use crate::grid::{Cell, Grid};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// Removal of one connected group.
///
/// Equality and hashing use only `origin`; `size` is carried along for
/// rollout weighting and reporting.
#[derive(Clone, Copy, Debug)]
pub struct GridMove {
    /// Canonical representative cell of the group
    pub origin: Cell,
    /// Number of cells in the group when the move was generated
    pub size: usize,
}

impl GridMove {
    pub fn new(origin: Cell, size: usize) -> Self {
        Self { origin, size }
    }

    /// Resolves the move to its group in `grid`.
    ///
    /// Returns `None` when the origin is empty there, which means the move
    /// does not belong to this state.
    pub fn resolve(&self, grid: &Grid) -> Option<Vec<Cell>> {
        grid.connected_group(self.origin)
    }
}

impl PartialEq for GridMove {
    fn eq(&self, other: &Self) -> bool {
        self.origin == other.origin
    }
}

impl Eq for GridMove {}

impl Hash for GridMove {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.origin.hash(state);
    }
}

impl fmt::Display for GridMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.origin)
    }
}

impl FromStr for GridMove {
    type Err = CellParseError;

    /// Parses the origin cell (`"row,col"`). The size is left at 0; it does
    /// not take part in equality.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(GridMove::new(s.parse()?, 0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_equality_ignores_size() {
        let a = GridMove::new(Cell::new(1, 2), 4);
        let b = GridMove::new(Cell::new(1, 2), 0);
        assert_eq!(a, b);
        let set: HashSet<_> = [a, b].into_iter().collect();
        assert_eq!(set.len(), 1);
        assert_ne!(a, GridMove::new(Cell::new(2, 1), 4));
    }

    #[test]
    fn test_cells_of_one_group_share_a_move() {
        let grid: Grid = "PPG\nGPG".parse().unwrap();
        let from_corner = grid.canonical_move(Cell::new(1, 1)).unwrap();
        let from_origin = grid.canonical_move(Cell::new(0, 0)).unwrap();
        assert_eq!(from_corner, from_origin);
        assert_eq!(from_corner.size, 3);
        let group = from_corner.resolve(&grid).unwrap();
        assert!(group.contains(&Cell::new(0, 1)));
        assert!(!group.contains(&Cell::new(0, 2)));
    }

    #[test]
    fn test_resolve_in_foreign_state() {
        let mv = GridMove::new(Cell::new(0, 0), 1);
        let grid: Grid = ".B\nBB".parse().unwrap();
        assert!(mv.resolve(&grid).is_none());
    }

    #[test]
    fn test_parse_matches_enumerated_move() {
        let grid: Grid = "PPG\nGPG".parse().unwrap();
        let parsed: GridMove = "(0, 2)".parse().unwrap();
        assert_eq!(parsed.size, 0);
        assert!(grid.legal_moves().contains(&parsed));
        assert!("0;2".parse::<GridMove>().is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(GridMove::new(Cell::new(3, 0), 2).to_string(), "(3, 0)");
    }
}
