//! Single-player MCTS search tree.
//!
//! Each node owns its children outright; a child never points back at its
//! parent. An iteration records the child indices it descends through and
//! replays that path from the root to backpropagate, so updates reach every
//! ancestor without shared ownership.
//!
//! One iteration:
//! 1. **Selection**: from the root, while the node is fully expanded and not
//!    terminal, descend to the child with the best SP-UCT score
//! 2. **Expansion**: if the node still has untried moves, expand the first one
//! 3. **Simulation**: random rollout from the new node
//! 4. **Backpropagation**: add the reward (and its square) to every node on the path

use crate::config::SolverConfig;
use crate::error::SolveError;
use crate::playout::{rollout, RewardModel, RolloutPolicy};
use crate::PuzzleState;
use rand::Rng;
use std::time::{Duration, Instant};
use tracing::trace;

/// Visit and reward totals of one node.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct NodeStats {
    pub visits: u32,
    pub reward_sum: f64,
    pub reward_sq_sum: f64,
}

impl NodeStats {
    /// Mean reward, 0.0 if never visited.
    #[inline]
    pub fn mean(&self) -> f64 {
        if self.visits == 0 {
            0.0
        } else {
            self.reward_sum / self.visits as f64
        }
    }

    /// Empirical variance of the observed rewards, clamped at zero.
    #[inline]
    pub fn variance(&self) -> f64 {
        if self.visits == 0 {
            return 0.0;
        }
        let mean = self.mean();
        (self.reward_sq_sum / self.visits as f64 - mean * mean).max(0.0)
    }

    fn record(&mut self, reward: f64) {
        self.visits += 1;
        self.reward_sum += reward;
        self.reward_sq_sum += reward * reward;
    }
}

/// Statistics for one child of the root.
#[derive(Debug, Clone)]
pub struct RootChildStats<M> {
    pub mv: M,
    pub visits: u32,
    pub mean_reward: f64,
    pub std_dev: f64,
}

/// Progress handed to the stop predicate between iterations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SearchProgress {
    pub iterations: u64,
    pub elapsed: Duration,
}

/// Summary of one call to [`SearchTree::search`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SearchStats {
    pub iterations: u64,
    pub elapsed: Duration,
    /// Nodes in the tree after the search
    pub total_nodes: usize,
    /// Deepest node below the root
    pub max_depth: usize,
    pub root_visits: u32,
}

/// The SP-UCT selection rule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UctParams {
    pub exploration: f64,
    pub variance_weight: f64,
    pub variance_bias: f64,
    pub selection_threshold: u32,
}

impl UctParams {
    pub fn from_config(config: &SolverConfig) -> Self {
        Self {
            exploration: config.exploration,
            variance_weight: config.variance_weight,
            variance_bias: config.variance_bias,
            selection_threshold: config.selection_threshold,
        }
    }

    /// Single-player UCT score of a child:
    /// `mean + C * sqrt(ln(N_parent) / n) + D * sqrt(variance + C2 / n)`.
    /// Unvisited children score infinity.
    pub fn score(&self, child: &NodeStats, parent_visits: u32) -> f64 {
        if child.visits == 0 {
            return f64::INFINITY;
        }
        let n = child.visits as f64;
        let parent = (parent_visits.max(1)) as f64;
        let explore = self.exploration * (parent.ln() / n).sqrt();
        let spread = self.variance_weight * (child.variance() + self.variance_bias / n).sqrt();
        child.mean() + explore + spread
    }
}

struct Node<S: PuzzleState> {
    state: S,
    /// Every legal move from `state`; `children[i]` is the result of `moves[i]`
    moves: Vec<S::Move>,
    children: Vec<Node<S>>,
    /// Moves from the start of the puzzle to this node
    depth: usize,
    stats: NodeStats,
}

impl<S: PuzzleState> Node<S> {
    fn new(state: S, depth: usize) -> Result<Self, SolveError<S::Move>> {
        let moves = state.legal_moves();
        if moves.is_empty() && !state.is_terminal() {
            return Err(SolveError::InvariantViolation(format!(
                "non-terminal state at depth {} has no legal moves ({} remaining)",
                depth,
                state.remaining()
            )));
        }
        Ok(Node {
            state,
            moves,
            children: Vec::new(),
            depth,
            stats: NodeStats::default(),
        })
    }

    fn is_terminal(&self) -> bool {
        self.moves.is_empty()
    }

    fn is_fully_expanded(&self) -> bool {
        self.children.len() == self.moves.len()
    }

    fn count(&self) -> usize {
        1 + self.children.iter().map(Node::count).sum::<usize>()
    }

    fn height(&self) -> usize {
        self.children.iter().map(|c| 1 + c.height()).max().unwrap_or(0)
    }
}

fn descend<'a, S: PuzzleState>(root: &'a Node<S>, path: &[usize]) -> &'a Node<S> {
    path.iter().fold(root, |node, &i| &node.children[i])
}

fn descend_mut<'a, S: PuzzleState>(root: &'a mut Node<S>, path: &[usize]) -> &'a mut Node<S> {
    path.iter().fold(root, |node, &i| &mut node.children[i])
}

/// The search tree for one top-level move decision.
pub struct SearchTree<S: PuzzleState> {
    root: Node<S>,
    params: UctParams,
    reward: RewardModel,
    rollout_policy: RolloutPolicy,
    max_rollout_moves: usize,
    /// Shortest complete line from the root seen so far (tree path + rollout)
    best_line: Option<Vec<S::Move>>,
    total_nodes: usize,
}

impl<S: PuzzleState> SearchTree<S> {
    /// Creates a tree rooted at `state`, which is `depth` moves into the puzzle.
    pub fn new(state: S, depth: usize, config: &SolverConfig) -> Result<Self, SolveError<S::Move>> {
        let reward = RewardModel::new(config.reward_scale, state.move_bound());
        Ok(Self {
            root: Node::new(state, depth)?,
            params: UctParams::from_config(config),
            reward,
            rollout_policy: config.rollout_policy,
            max_rollout_moves: config.max_rollout_moves,
            best_line: None,
            total_nodes: 1,
        })
    }

    pub fn root_state(&self) -> &S {
        &self.root.state
    }

    pub fn root_depth(&self) -> usize {
        self.root.depth
    }

    pub fn root_stats(&self) -> NodeStats {
        self.root.stats
    }

    pub fn total_nodes(&self) -> usize {
        self.total_nodes
    }

    pub fn reward_model(&self) -> RewardModel {
        self.reward
    }

    /// Statistics of the root's child reached by `mv`, if it was expanded.
    pub fn child_stats(&self, mv: &S::Move) -> Option<NodeStats> {
        self.child_index(mv).map(|i| self.root.children[i].stats)
    }

    /// Shortest complete line from the root observed so far.
    pub fn best_line(&self) -> Option<&[S::Move]> {
        self.best_line.as_deref()
    }

    /// Returns statistics for the expanded children of the root, in move order.
    pub fn root_children_stats(&self) -> Vec<RootChildStats<S::Move>> {
        self.root
            .moves
            .iter()
            .zip(&self.root.children)
            .map(|(mv, child)| RootChildStats {
                mv: mv.clone(),
                visits: child.stats.visits,
                mean_reward: child.stats.mean(),
                std_dev: child.stats.variance().sqrt(),
            })
            .collect()
    }

    /// The most visited root child; ties go to the earliest move.
    pub fn best_move(&self) -> Option<&S::Move> {
        let mut best: Option<(usize, u32)> = None;
        for (i, child) in self.root.children.iter().enumerate() {
            if best.map_or(true, |(_, visits)| child.stats.visits > visits) {
                best = Some((i, child.stats.visits));
            }
        }
        best.map(|(i, _)| &self.root.moves[i])
    }

    /// Runs iterations until `should_stop` returns true.
    ///
    /// The predicate is checked before every iteration, so an iteration always
    /// completes and statistics are never left half-updated. A terminal root
    /// runs zero iterations.
    pub fn search<R, F>(
        &mut self,
        rng: &mut R,
        mut should_stop: F,
    ) -> Result<SearchStats, SolveError<S::Move>>
    where
        R: Rng + ?Sized,
        F: FnMut(&SearchProgress) -> bool,
    {
        let started = Instant::now();
        let mut progress = SearchProgress::default();
        let mut max_depth = 0;

        if !self.root.is_terminal() {
            while !should_stop(&progress) {
                let depth = self.iterate(rng)?;
                max_depth = max_depth.max(depth);
                progress.iterations += 1;
                progress.elapsed = started.elapsed();
            }
        }

        let stats = SearchStats {
            iterations: progress.iterations,
            elapsed: started.elapsed(),
            total_nodes: self.total_nodes,
            max_depth: max_depth.max(self.root.height()),
            root_visits: self.root.stats.visits,
        };
        trace!(
            iterations = stats.iterations,
            nodes = stats.total_nodes,
            max_depth = stats.max_depth,
            root_visits = stats.root_visits,
            "search finished"
        );
        Ok(stats)
    }

    /// Runs one select, expand, simulate, backpropagate cycle.
    ///
    /// # Returns
    /// The depth (below the root) of the node the rollout started from
    pub fn iterate<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<usize, SolveError<S::Move>> {
        // --- Selection ---
        let mut path = Vec::new();
        let mut node = &self.root;
        while !node.is_terminal() && node.is_fully_expanded() {
            let i = self.select_child(node, rng);
            path.push(i);
            node = &node.children[i];
        }

        // --- Expansion ---
        let leaf = descend_mut(&mut self.root, &path);
        if !leaf.is_terminal() {
            let mv = leaf.moves[leaf.children.len()].clone();
            let mut state = leaf.state.clone();
            state.apply(&mv);
            let child = Node::new(state, leaf.depth + 1)?;
            leaf.children.push(child);
            path.push(leaf.children.len() - 1);
            self.total_nodes += 1;
        }

        // --- Simulation ---
        let leaf = descend(&self.root, &path);
        let playout = rollout(&leaf.state, self.rollout_policy, self.max_rollout_moves, rng)?;
        let reward = if playout.terminal {
            self.reward.score(leaf.depth + playout.moves.len())
        } else {
            0.0
        };
        if playout.terminal {
            self.offer_line(&path, playout.moves);
        }

        // --- Backpropagation ---
        let mut node = &mut self.root;
        node.stats.record(reward);
        for &i in &path {
            node = &mut node.children[i];
            node.stats.record(reward);
        }

        Ok(path.len())
    }

    /// Re-roots the tree at the child reached by `mv`, keeping its subtree and
    /// statistics. If that move was never expanded, a fresh root is built.
    ///
    /// # Errors
    /// [`SolveError::InvariantViolation`] if `mv` is not legal at the root.
    pub fn advance_root(&mut self, mv: &S::Move) -> Result<(), SolveError<S::Move>> {
        let new_root = match self.child_index(mv) {
            Some(i) => {
                let mut children = std::mem::take(&mut self.root.children);
                children.swap_remove(i)
            }
            None if !self.root.moves.contains(mv) => {
                return Err(SolveError::InvariantViolation(format!(
                    "cannot advance root at depth {} with {:?}: not a legal move",
                    self.root.depth, mv
                )));
            }
            None => {
                let mut state = self.root.state.clone();
                state.apply(mv);
                Node::new(state, self.root.depth + 1)?
            }
        };
        self.root = new_root;
        self.total_nodes = self.root.count();
        self.best_line = match self.best_line.take() {
            Some(line) if line.first() == Some(mv) => Some(line[1..].to_vec()),
            _ => None,
        };
        Ok(())
    }

    fn child_index(&self, mv: &S::Move) -> Option<usize> {
        self.root.moves[..self.root.children.len()]
            .iter()
            .position(|m| m == mv)
    }

    fn select_child<R: Rng + ?Sized>(&self, node: &Node<S>, rng: &mut R) -> usize {
        if node.stats.visits < self.params.selection_threshold {
            return rng.random_range(0..node.children.len());
        }
        let mut best = 0;
        let mut best_score = f64::NEG_INFINITY;
        for (i, child) in node.children.iter().enumerate() {
            let score = self.params.score(&child.stats, node.stats.visits);
            if score > best_score {
                best = i;
                best_score = score;
            }
        }
        best
    }

    /// Keeps `path + tail` as the best line if it is shorter than the current one.
    fn offer_line(&mut self, path: &[usize], tail: Vec<S::Move>) {
        let len = path.len() + tail.len();
        if self.best_line.as_ref().is_some_and(|best| best.len() <= len) {
            return;
        }
        let mut line = Vec::with_capacity(len);
        let mut node = &self.root;
        for &i in path {
            line.push(node.moves[i].clone());
            node = &node.children[i];
        }
        line.extend(tail);
        self.best_line = Some(line);
    }
}
