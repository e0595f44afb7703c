// rust/engine/src/engine/constants.rs
#![forbid(unsafe_code)]

/// Number of movement actions (UP, RIGHT, DOWN, LEFT).
pub const ACTION_DIM: usize = 4;

/// Confusion weights must sum to 1.0 within this tolerance.
pub const WEIGHT_TOLERANCE: f64 = 1e-6;

/// Max steps in one learning episode (safety valve for cyclic stochastic mazes).
pub const T_MAX: u32 = 200;

/// Max number of learning episodes.
pub const MAX_EPISODES: u32 = 1000;

pub const DEFAULT_REWARD_GOAL: f64 = 1.0;
pub const DEFAULT_REWARD_DANGER: f64 = -1.0;
pub const DEFAULT_REWARD_NORMAL: f64 = -0.04;

pub const DEFAULT_GAMMA: f64 = 0.9;
pub const DEFAULT_ALPHA: f64 = 0.1;
pub const DEFAULT_EPSILON: f64 = 1.0;
pub const DEFAULT_EPSILON_MIN: f64 = 0.01;
pub const DEFAULT_EPSILON_DECAY: f64 = 0.995;

/**
 * Early-stop heuristic: learning is considered converged once the last
 * `DEFAULT_CONVERGENCE_WINDOW` episode rewards are identical and the 0-based
 * episode index is past `DEFAULT_MIN_EPISODES` (so at least 202 episodes ran).
 */
pub const DEFAULT_CONVERGENCE_WINDOW: usize = 100;
pub const DEFAULT_MIN_EPISODES: u32 = 200;
