//! Random playouts and the reward they produce.
//!
//! A rollout drives a private copy of a state to the end with an uninformed
//! policy. Its reward only depends on how many moves the whole line took, so
//! shorter clears score higher.

use crate::error::SolveError;
use crate::PuzzleState;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// How a rollout picks its next move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RolloutPolicy {
    /// Every legal move is equally likely.
    #[default]
    Uniform,
    /// Moves are weighted by [`PuzzleState::move_weight`]; for the grid this
    /// is the same as picking a random non-empty cell.
    SizeWeighted,
}

/// The outcome of one rollout.
#[derive(Debug, Clone)]
pub struct Playout<M> {
    /// Moves played, in order
    pub moves: Vec<M>,
    /// Whether the rollout reached a terminal state (false if the cap hit first)
    pub terminal: bool,
}

/// Maps line lengths to bounded rewards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RewardModel {
    /// Points per move saved
    pub scale: f64,
    /// The longest line that still scores above zero
    pub move_bound: usize,
}

impl RewardModel {
    pub fn new(scale: f64, move_bound: usize) -> Self {
        Self { scale, move_bound }
    }

    /// Reward for clearing the board in `total_moves` moves from the start.
    #[inline]
    pub fn score(&self, total_moves: usize) -> f64 {
        self.scale * self.move_bound.saturating_sub(total_moves) as f64
    }
}

/// Plays random moves from a copy of `state` until it is terminal or
/// `max_moves` moves have been made. `state` itself is never touched.
///
/// # Errors
/// [`SolveError::InvariantViolation`] if a non-terminal state has no legal move.
pub fn rollout<S, R>(
    state: &S,
    policy: RolloutPolicy,
    max_moves: usize,
    rng: &mut R,
) -> Result<Playout<S::Move>, SolveError<S::Move>>
where
    S: PuzzleState,
    R: Rng + ?Sized,
{
    let mut sim_state = state.clone();
    let mut moves = Vec::new();
    while !sim_state.is_terminal() {
        if moves.len() >= max_moves {
            return Ok(Playout {
                moves,
                terminal: false,
            });
        }
        let legal = sim_state.legal_moves();
        if legal.is_empty() {
            return Err(SolveError::InvariantViolation(format!(
                "rollout reached a non-terminal state with no legal moves ({} remaining)",
                sim_state.remaining()
            )));
        }
        let mv = match policy {
            RolloutPolicy::Uniform => legal[rng.random_range(0..legal.len())].clone(),
            RolloutPolicy::SizeWeighted => pick_weighted(&sim_state, &legal, rng).clone(),
        };
        sim_state.apply(&mv);
        moves.push(mv);
    }
    Ok(Playout {
        moves,
        terminal: true,
    })
}

fn pick_weighted<'a, S, R>(state: &S, legal: &'a [S::Move], rng: &mut R) -> &'a S::Move
where
    S: PuzzleState,
    R: Rng + ?Sized,
{
    let total: u64 = legal.iter().map(|mv| state.move_weight(mv) as u64).sum();
    if total == 0 {
        return &legal[rng.random_range(0..legal.len())];
    }
    let mut ticket = rng.random_range(0..total);
    for mv in legal {
        let weight = state.move_weight(mv) as u64;
        if ticket < weight {
            return mv;
        }
        ticket -= weight;
    }
    &legal[legal.len() - 1]
}
