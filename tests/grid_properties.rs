//! State-transition properties checked over seeded random boards.

use former::{CollapsePolicy, Grid, PuzzleState};
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;

fn boards(policy: CollapsePolicy) -> impl Iterator<Item = Grid> {
    (0..40u64).map(move |seed| {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
        let width = rng.random_range(1..=7);
        let height = rng.random_range(1..=9);
        Grid::random(width, height, &mut rng).with_collapse(policy)
    })
}

/// Plays random legal moves until the board is clear, checking every step.
fn walk_to_terminal(mut grid: Grid, rng: &mut Xoshiro256PlusPlus) {
    let (width, height) = (grid.width(), grid.height());
    let mut steps = 0;
    while !grid.is_terminal() {
        let moves = grid.legal_moves();
        assert!(!moves.is_empty(), "non-terminal board without moves:\n{grid}");

        let before = grid.remaining_block_count();
        let mv = moves[rng.random_range(0..moves.len())];
        grid.apply(&mv);

        assert_eq!(grid.remaining_block_count(), before - mv.size);
        assert!(grid.remaining_block_count() < before);
        assert_eq!((grid.width(), grid.height()), (width, height));
        steps += 1;
        assert!(steps <= width * height);
    }
    assert_eq!(grid.remaining_block_count(), 0);
    assert!(grid.legal_moves().is_empty());
}

#[test]
fn every_move_strictly_reduces_blocks() {
    for grid in boards(CollapsePolicy::Gravity) {
        for mv in grid.legal_moves() {
            let mut next = grid.clone();
            next.apply(&mv);
            assert!(next.remaining_block_count() < grid.remaining_block_count());
        }
    }
}

#[test]
fn random_walks_reach_terminal_with_gravity() {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(100);
    for grid in boards(CollapsePolicy::Gravity) {
        walk_to_terminal(grid, &mut rng);
    }
}

#[test]
fn random_walks_reach_terminal_with_column_shift() {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(200);
    for grid in boards(CollapsePolicy::GravityAndShift) {
        walk_to_terminal(grid, &mut rng);
    }
}

#[test]
fn groups_partition_the_blocks() {
    for grid in boards(CollapsePolicy::Gravity) {
        let moves = grid.legal_moves();
        let total: usize = moves.iter().map(|mv| mv.size).sum();
        assert_eq!(total, grid.remaining_block_count());
        for mv in &moves {
            let group = mv.resolve(&grid).unwrap();
            assert_eq!(group.len(), mv.size);
            assert_eq!(group[0], mv.origin);
            // Every member canonicalizes back to the same move.
            for &cell in &group {
                assert_eq!(grid.canonical_move(cell), Some(*mv));
            }
        }
    }
}

#[test]
fn settled_columns_have_no_floating_blocks() {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(300);
    for mut grid in boards(CollapsePolicy::Gravity) {
        while !grid.is_terminal() {
            let moves = grid.legal_moves();
            grid.apply(&moves[rng.random_range(0..moves.len())]);
            for col in 0..grid.width() {
                let mut seen_block = false;
                for row in 0..grid.height() {
                    let filled = grid.cell(former::Cell::new(row, col)).is_some();
                    assert!(!seen_block || filled, "gap under a block in column {col}:\n{grid}");
                    seen_block |= filled;
                }
            }
        }
    }
}

#[test]
fn text_round_trip() {
    for grid in boards(CollapsePolicy::Gravity) {
        let parsed: Grid = grid.to_string().parse().unwrap();
        assert_eq!(parsed, grid);
    }
}
