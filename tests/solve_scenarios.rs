//! End-to-end solver scenarios.

use former::{
    Cell, CollapsePolicy, Grid, GridMove, PuzzleState, SearchBudget, SearchTree, SolveError,
    Solver, SolverConfig, TreePolicy,
};
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;

fn grid(text: &str) -> Grid {
    text.parse().unwrap()
}

fn assert_clears(board: &Grid, moves: &[GridMove]) {
    let mut state = board.clone();
    for mv in moves {
        assert!(state.legal_moves().contains(mv), "illegal move {mv} on\n{state}");
        state.apply(mv);
    }
    assert!(state.is_terminal(), "board not cleared:\n{state}");
}

#[test]
fn one_color_square_takes_one_move() {
    let board = grid("PP\nPP");
    let solution = Solver::new(SolverConfig::for_testing())
        .solve_seeded(&board, 0)
        .unwrap();
    assert_eq!(solution.moves, vec![GridMove::new(Cell::new(0, 0), 4)]);
}

#[test]
fn isolated_cells_take_one_move_each_for_any_budget() {
    let board = grid("PGPG");
    for iterations in [1, 10, 500] {
        let config = SolverConfig::for_testing().with_iterations(iterations);
        let solution = Solver::new(config).solve_seeded(&board, 7).unwrap();
        assert_eq!(solution.len(), 4);
        assert_clears(&board, &solution.moves);
    }
}

#[test]
fn checkerboard_square_uses_gravity_to_merge() {
    // Removing the bottom-right P drops the top-right G next to the other G,
    // so three moves are enough.
    let board = grid("PG\nGP");
    let solution = Solver::new(SolverConfig::for_testing())
        .solve_seeded(&board, 3)
        .unwrap();
    assert_eq!(solution.len(), 3);
    assert_clears(&board, &solution.moves);

    let quick = Solver::new(SolverConfig::for_testing().with_iterations(1))
        .solve_seeded(&board, 3)
        .unwrap();
    assert!((3..=4).contains(&quick.len()));
    assert_clears(&board, &quick.moves);
}

#[test]
fn zero_move_cap_reports_exhaustion() {
    let board = grid("BGPO\nOPGB");
    let solver = Solver::new(SolverConfig::for_testing().with_max_top_level_moves(0));
    match solver.solve_seeded(&board, 0) {
        Err(SolveError::SearchBudgetExhaustedWithoutSolution { limit, partial }) => {
            assert_eq!(limit, 0);
            assert!(partial.is_empty());
        }
        other => panic!("expected exhaustion, got {other:?}"),
    }
}

#[test]
fn reference_size_board_is_cleared() {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(2024);
    let board = Grid::random(7, 9, &mut rng);
    for policy in [TreePolicy::Reuse, TreePolicy::Rebuild] {
        let config = SolverConfig::for_testing()
            .with_iterations(100)
            .with_tree_policy(policy);
        let solution = Solver::new(config).solve_seeded(&board, 1).unwrap();
        assert!(!solution.is_empty());
        assert!(solution.len() <= 63);
        assert_clears(&board, &solution.moves);
    }
}

#[test]
fn column_shift_boards_are_cleared() {
    let board = grid("BGO\nBGO\nOPB").with_collapse(CollapsePolicy::GravityAndShift);
    let solution = Solver::new(SolverConfig::for_testing())
        .solve_seeded(&board, 9)
        .unwrap();
    assert_clears(&board, &solution.moves);
}

#[test]
fn reroot_preserves_child_visits() {
    let board = grid("BGPOB\nGPOBG\nPOBGP");
    let config = SolverConfig::for_testing();
    let mut tree = SearchTree::new(board, 0, &config).unwrap();
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(8);
    tree.search(&mut rng, |p| p.iterations >= 300).unwrap();

    let mv = tree.best_move().copied().unwrap();
    let visits = tree.child_stats(&mv).unwrap().visits;
    tree.advance_root(&mv).unwrap();
    assert_eq!(tree.root_stats().visits, visits);

    // Searching on continues from the inherited statistics.
    tree.search(&mut rng, |p| p.iterations >= 10).unwrap();
    assert_eq!(tree.root_stats().visits, visits + 10);
}

#[test]
fn time_budget_solves() {
    let board = grid("BGPO\nOPGB\nBGPO");
    let config = SolverConfig::for_testing().with_time_limit(std::time::Duration::from_millis(5));
    assert_eq!(config.budget, SearchBudget::Millis(5));
    let solution = Solver::new(config).solve_seeded(&board, 4).unwrap();
    assert_clears(&board, &solution.moves);
}

#[test]
fn parallel_solve_matches_best_worker() {
    let board = grid("BGPOB\nGPOBG\nPOBGP\nBBGPO");
    let solver = Solver::new(SolverConfig::for_testing().with_seed(20));
    let merged = solver.solve_parallel(&board, 4).unwrap();
    assert_eq!(merged.solved, 4);
    assert_clears(&board, &merged.best.moves);
    let shortest = (0..4)
        .map(|w| solver.solve_seeded(&board, 20 + w).unwrap().len())
        .min()
        .unwrap();
    assert_eq!(merged.best.len(), shortest);
}
