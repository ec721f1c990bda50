//! The top-level solving loop.
//!
//! For every real move the solver searches from the current position, commits
//! the most visited root child, applies it to the authoritative state and
//! either re-roots or rebuilds the tree. It stops when the board is clear or
//! the move cap is reached.

use crate::config::{SolverConfig, TreePolicy};
use crate::error::SolveError;
use crate::tree::SearchTree;
use crate::PuzzleState;
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use tracing::{debug, info, warn};

/// An ordered list of moves that clears the puzzle.
#[derive(Debug, Clone, PartialEq)]
pub struct Solution<M> {
    pub moves: Vec<M>,
    /// Search iterations spent across all decisions
    pub iterations: u64,
    /// Number of top-level searches run
    pub decisions: usize,
}

impl<M> Solution<M> {
    pub fn len(&self) -> usize {
        self.moves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }
}

/// The merged result of [`Solver::solve_parallel`].
#[derive(Debug, Clone)]
pub struct ParallelSolution<M> {
    pub best: Solution<M>,
    /// Index of the worker that produced `best`
    pub worker: usize,
    /// Workers that found any solution
    pub solved: usize,
    pub workers: usize,
}

/// Drives repeated searches until the puzzle is solved.
#[derive(Debug, Clone)]
pub struct Solver {
    config: SolverConfig,
}

impl Solver {
    pub fn new(config: SolverConfig) -> Self {
        Self { config }
    }

    /// Solves with a generator seeded from `seed`.
    pub fn solve_seeded<S: PuzzleState>(
        &self,
        initial: &S,
        seed: u64,
    ) -> Result<Solution<S::Move>, SolveError<S::Move>> {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
        self.solve(initial, &mut rng)
    }

    /// Solves `initial`, drawing every random choice from `rng`.
    ///
    /// The returned moves are the committed sequence, unless some search saw a
    /// complete line that is shorter; that line is replayed from `initial`
    /// before it is preferred.
    ///
    /// # Errors
    /// - [`SolveError::SearchBudgetExhaustedWithoutSolution`] when
    ///   `max_top_level_moves` moves were committed, the board is not clear and
    ///   no observed line fits within the cap; carries the partial sequence
    /// - [`SolveError::InvariantViolation`] if the state model is inconsistent
    pub fn solve<S, R>(
        &self,
        initial: &S,
        rng: &mut R,
    ) -> Result<Solution<S::Move>, SolveError<S::Move>>
    where
        S: PuzzleState,
        R: Rng + ?Sized,
    {
        let limit = self.config.max_top_level_moves;
        let budget = self.config.budget;
        let mut state = initial.clone();
        let mut committed: Vec<S::Move> = Vec::new();
        let mut shortest: Option<Vec<S::Move>> = None;
        let mut reused: Option<SearchTree<S>> = None;
        let mut iterations = 0;
        let mut decisions = 0;

        while !state.is_terminal() {
            if committed.len() >= limit {
                if let Some(line) = shortest
                    .take()
                    .filter(|l| l.len() <= limit && replays(initial, l))
                {
                    info!(moves = line.len(), "move cap reached, using best observed line");
                    return Ok(Solution {
                        moves: line,
                        iterations,
                        decisions,
                    });
                }
                warn!(
                    limit,
                    remaining = state.remaining(),
                    "move cap reached without clearing the board"
                );
                return Err(SolveError::SearchBudgetExhaustedWithoutSolution {
                    limit,
                    partial: committed,
                });
            }

            let mut tree = match reused.take() {
                Some(tree) => tree,
                None => SearchTree::new(state.clone(), committed.len(), &self.config)?,
            };
            // At least one iteration, so the root always has a child to commit.
            let stats = tree.search(rng, |p| p.iterations > 0 && budget.is_exhausted(p))?;
            iterations += stats.iterations;
            decisions += 1;

            if let Some(line) = tree.best_line() {
                let total = committed.len() + line.len();
                if shortest.as_ref().map_or(true, |s| total < s.len()) {
                    let mut candidate = committed.clone();
                    candidate.extend_from_slice(line);
                    shortest = Some(candidate);
                }
            }

            let mv = tree.best_move().cloned().ok_or_else(|| {
                SolveError::InvariantViolation(format!(
                    "search from a non-terminal state at move {} produced no children",
                    committed.len()
                ))
            })?;
            let child = tree.child_stats(&mv).unwrap_or_default();
            debug!(
                decision = decisions,
                mv = ?mv,
                visits = child.visits,
                mean_reward = child.mean(),
                iterations = stats.iterations,
                nodes = stats.total_nodes,
                "committed move"
            );

            state.apply(&mv);
            committed.push(mv.clone());
            if self.config.tree_policy == TreePolicy::Reuse {
                tree.advance_root(&mv)?;
                reused = Some(tree);
            }
        }

        let moves = match shortest {
            Some(line) if line.len() < committed.len() && replays(initial, &line) => {
                debug!(
                    committed = committed.len(),
                    shortcut = line.len(),
                    "best observed line beats committed sequence"
                );
                line
            }
            _ => committed,
        };
        info!(moves = moves.len(), iterations, decisions, "puzzle solved");
        Ok(Solution {
            moves,
            iterations,
            decisions,
        })
    }

    /// Root parallelization: runs `workers` independent solvers with seeds
    /// `config.seed`, `config.seed + 1`, ... and keeps the shortest solution
    /// (ties go to the lowest worker index). Fails only if every worker fails,
    /// returning the first worker's error.
    pub fn solve_parallel<S: PuzzleState>(
        &self,
        initial: &S,
        workers: usize,
    ) -> Result<ParallelSolution<S::Move>, SolveError<S::Move>> {
        let workers = workers.max(1);
        let pool = ThreadPoolBuilder::new().num_threads(workers).build()?;
        let results: Vec<_> = pool.install(|| {
            (0..workers)
                .into_par_iter()
                .map(|w| self.solve_seeded(initial, self.config.seed.wrapping_add(w as u64)))
                .collect()
        });

        let mut best: Option<(usize, Solution<S::Move>)> = None;
        let mut first_error = None;
        let mut solved = 0;
        for (w, result) in results.into_iter().enumerate() {
            match result {
                Ok(solution) => {
                    solved += 1;
                    if best.as_ref().map_or(true, |(_, b)| solution.len() < b.len()) {
                        best = Some((w, solution));
                    }
                }
                Err(e) => {
                    debug!(worker = w, error = %e, "worker found no solution");
                    first_error.get_or_insert(e);
                }
            }
        }

        match (best, first_error) {
            (Some((worker, best)), _) => {
                info!(worker, moves = best.len(), solved, workers, "parallel solve finished");
                Ok(ParallelSolution {
                    best,
                    worker,
                    solved,
                    workers,
                })
            }
            (None, Some(e)) => Err(e),
            (None, None) => Err(SolveError::InvariantViolation(
                "parallel solve ran no workers".to_string(),
            )),
        }
    }
}

/// True if every move of `line` is legal in turn and the last one clears `initial`.
fn replays<S: PuzzleState>(initial: &S, line: &[S::Move]) -> bool {
    let mut state = initial.clone();
    for mv in line {
        if !state.legal_moves().contains(mv) {
            return false;
        }
        state.apply(mv);
    }
    state.is_terminal()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SearchBudget;
    use crate::grid::{Cell, Grid};
    use std::time::Duration;

    fn grid(text: &str) -> Grid {
        text.parse().unwrap()
    }

    #[test]
    fn test_terminal_start_needs_no_moves() {
        let solver = Solver::new(SolverConfig::for_testing());
        let solution = solver.solve_seeded(&Grid::new(7, 9), 0).unwrap();
        assert!(solution.is_empty());
        assert_eq!(solution.iterations, 0);
        assert_eq!(solution.decisions, 0);
    }

    #[test]
    fn test_single_group_solves_in_one_move() {
        let solver = Solver::new(SolverConfig::for_testing());
        let solution = solver.solve_seeded(&grid("PP\nPP"), 1).unwrap();
        assert_eq!(solution.len(), 1);
        assert_eq!(solution.moves[0].origin, Cell::new(0, 0));
        assert_eq!(solution.decisions, 1);
    }

    #[test]
    fn test_zero_move_cap_fails_with_empty_partial() {
        let solver = Solver::new(SolverConfig::for_testing().with_max_top_level_moves(0));
        match solver.solve_seeded(&grid("PP\nPP"), 1) {
            Err(SolveError::SearchBudgetExhaustedWithoutSolution { limit, partial }) => {
                assert_eq!(limit, 0);
                assert!(partial.is_empty());
            }
            other => panic!("expected budget exhaustion, got {other:?}"),
        }
    }

    #[test]
    fn test_cap_below_minimum_fails_with_partial() {
        // Four isolated cells need four moves.
        let solver = Solver::new(SolverConfig::for_testing().with_max_top_level_moves(2));
        match solver.solve_seeded(&grid("PGPG"), 1) {
            Err(SolveError::SearchBudgetExhaustedWithoutSolution { partial, .. }) => {
                assert_eq!(partial.len(), 2);
            }
            other => panic!("expected budget exhaustion, got {other:?}"),
        }
    }

    #[test]
    fn test_rebuild_policy_solves() {
        let config = SolverConfig::for_testing().with_tree_policy(TreePolicy::Rebuild);
        let solution = Solver::new(config).solve_seeded(&grid("PGPG"), 3).unwrap();
        assert_eq!(solution.len(), 4);
        assert_eq!(solution.decisions, 4);
    }

    #[test]
    fn test_time_budget_runs_at_least_one_iteration() {
        let config = SolverConfig::for_testing().with_time_limit(Duration::ZERO);
        assert_eq!(config.budget, SearchBudget::Millis(0));
        let solution = Solver::new(config).solve_seeded(&grid("PGPG"), 3).unwrap();
        assert_eq!(solution.len(), 4);
        assert!(solution.iterations >= 4);
    }

    #[test]
    fn test_same_seed_same_solution() {
        let board = grid("BGPOB\nGPOBG\nPOBGP\nBBGPO");
        let solver = Solver::new(SolverConfig::for_testing());
        let a = solver.solve_seeded(&board, 11).unwrap();
        let b = solver.solve_seeded(&board, 11).unwrap();
        assert_eq!(a.moves, b.moves);
        assert!(replays(&board, &a.moves));
    }

    #[test]
    fn test_parallel_keeps_shortest() {
        let board = grid("BGPOB\nGPOBG\nPOBGP\nBBGPO");
        let solver = Solver::new(SolverConfig::for_testing().with_seed(5));
        let merged = solver.solve_parallel(&board, 3).unwrap();
        assert_eq!(merged.workers, 3);
        assert_eq!(merged.solved, 3);

        for w in 0..3 {
            let single = solver.solve_seeded(&board, 5 + w as u64).unwrap();
            assert!(merged.best.len() <= single.len());
        }
        let winner = solver
            .solve_seeded(&board, 5 + merged.worker as u64)
            .unwrap();
        assert_eq!(winner.moves, merged.best.moves);
    }

    #[test]
    fn test_parallel_reports_error_when_all_fail() {
        let solver = Solver::new(SolverConfig::for_testing().with_max_top_level_moves(0));
        let result = solver.solve_parallel(&grid("PGPG"), 2);
        assert!(matches!(
            result,
            Err(SolveError::SearchBudgetExhaustedWithoutSolution { .. })
        ));
    }

    #[test]
    fn test_replays_rejects_foreign_lines() {
        let board = grid("PGPG");
        let moves = board.legal_moves();
        assert!(!replays(&board, &moves[..2]));
        assert!(replays(&board, &moves));
        let bogus = vec![crate::moves::GridMove::new(Cell::new(5, 5), 1)];
        assert!(!replays(&board, &bogus));
    }
}
