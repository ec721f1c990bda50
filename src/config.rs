//! Solver configuration parameters.

use crate::error::ConfigError;
use crate::playout::RolloutPolicy;
use crate::tree::SearchProgress;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// How much searching happens before each committed move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchBudget {
    /// A fixed number of search iterations.
    Iterations(u64),
    /// A wall-clock limit in milliseconds.
    Millis(u64),
}

impl SearchBudget {
    pub fn time(limit: Duration) -> Self {
        SearchBudget::Millis(limit.as_millis().min(u64::MAX as u128) as u64)
    }

    /// True once `progress` has used up the budget. Checked between iterations.
    pub fn is_exhausted(&self, progress: &SearchProgress) -> bool {
        match *self {
            SearchBudget::Iterations(n) => progress.iterations >= n,
            SearchBudget::Millis(ms) => progress.elapsed >= Duration::from_millis(ms),
        }
    }
}

/// What happens to the tree after a move is committed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TreePolicy {
    /// Re-root at the committed child and keep its statistics.
    #[default]
    Reuse,
    /// Discard the tree and start fresh from the new state.
    Rebuild,
}

/// Configuration for the single-player search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// UCT exploration constant (C).
    /// Scale with the reward range: rewards here span hundreds of points.
    pub exploration: f64,

    /// Weight of the single-player variance bonus (D).
    pub variance_weight: f64,

    /// Constant added to the variance before dividing by the child's visit
    /// count, keeping the bonus large for rarely visited children.
    pub variance_bias: f64,

    /// Below this many parent visits, children are picked uniformly at random
    /// instead of by UCT score. 0 disables it.
    pub selection_threshold: u32,

    /// Search effort per committed move.
    pub budget: SearchBudget,

    /// Safety bound on committed moves.
    pub max_top_level_moves: usize,

    /// Safety bound on moves inside one rollout.
    pub max_rollout_moves: usize,

    /// Reward points per move saved against the move bound.
    pub reward_scale: f64,

    pub rollout_policy: RolloutPolicy,

    pub tree_policy: TreePolicy,

    /// Seed for the search's random generator.
    pub seed: u64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            exploration: 10.0,
            variance_weight: 1.0,
            variance_bias: 1.0,
            selection_threshold: 0,
            budget: SearchBudget::Iterations(10_000),
            max_top_level_moves: 63,
            max_rollout_moves: 10_000,
            reward_scale: 10.0,
            rollout_policy: RolloutPolicy::Uniform,
            tree_policy: TreePolicy::Reuse,
            seed: 0,
        }
    }
}

impl SolverConfig {
    /// Create a fast config for testing.
    pub fn for_testing() -> Self {
        Self {
            budget: SearchBudget::Iterations(200),
            ..Self::default()
        }
    }

    /// Builder pattern: set iterations per move.
    pub fn with_iterations(mut self, n: u64) -> Self {
        self.budget = SearchBudget::Iterations(n);
        self
    }

    /// Builder pattern: set a wall-clock limit per move.
    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.budget = SearchBudget::time(limit);
        self
    }

    /// Builder pattern: set the exploration constant C.
    pub fn with_exploration(mut self, c: f64) -> Self {
        self.exploration = c;
        self
    }

    /// Builder pattern: set the variance weight D.
    pub fn with_variance_weight(mut self, d: f64) -> Self {
        self.variance_weight = d;
        self
    }

    /// Builder pattern: set the top-level move cap.
    pub fn with_max_top_level_moves(mut self, n: usize) -> Self {
        self.max_top_level_moves = n;
        self
    }

    pub fn with_tree_policy(mut self, policy: TreePolicy) -> Self {
        self.tree_policy = policy;
        self
    }

    pub fn with_rollout_policy(mut self, policy: RolloutPolicy) -> Self {
        self.rollout_policy = policy;
        self
    }

    pub fn with_selection_threshold(mut self, threshold: u32) -> Self {
        self.selection_threshold = threshold;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Rejects constants that would make the UCT score meaningless.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let constants = [
            ("exploration", self.exploration),
            ("variance_weight", self.variance_weight),
            ("variance_bias", self.variance_bias),
            ("reward_scale", self.reward_scale),
        ];
        for (name, value) in constants {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be finite and non-negative, got {value}"
                )));
            }
        }
        if self.budget == SearchBudget::Iterations(0) {
            return Err(ConfigError::Invalid(
                "iteration budget must be at least 1".to_string(),
            ));
        }
        if self.max_rollout_moves == 0 {
            return Err(ConfigError::Invalid(
                "max_rollout_moves must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Load configuration from a TOML file. Missing keys take their defaults.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: SolverConfig = toml::from_str(&content)?;
        config.validate()?;
        info!("Loaded solver config from {}", path.display());
        Ok(config)
    }
}
