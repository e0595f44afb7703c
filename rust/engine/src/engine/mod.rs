// rust/engine/src/engine/mod.rs
#![forbid(unsafe_code)]

mod confusion;
mod constants;
mod geometry;
mod grid;
mod mdp;
mod render;
mod rl;
mod search;

/**
 * Curated engine public API.
 *
 * Internal implementation modules remain private; only stable items are re-exported here.
 */
pub use confusion::{ActionDistribution, ActionModel, ConfusionWeights, StochasticActions};
pub use constants::{
    ACTION_DIM, DEFAULT_ALPHA, DEFAULT_CONVERGENCE_WINDOW, DEFAULT_EPSILON, DEFAULT_EPSILON_DECAY,
    DEFAULT_EPSILON_MIN, DEFAULT_GAMMA, DEFAULT_MIN_EPISODES, DEFAULT_REWARD_DANGER,
    DEFAULT_REWARD_GOAL, DEFAULT_REWARD_NORMAL, MAX_EPISODES, T_MAX, WEIGHT_TOLERANCE,
};
pub use geometry::{Action, Confusion, State};
pub use grid::{GridModel, Map, Role};
pub use mdp::{Mdp, Rewards};
pub use render::{render_ascii, render_policy_ascii, render_values_ascii};
pub use rl::{RlProblem, StepOutcome};
pub use search::{RoleCosts, SearchProblem};
