// rust/engine/src/policy/mod.rs
#![forbid(unsafe_code)]

mod base;
mod planning;
mod qlearning;
mod random;
mod table;

/**
 * Curated policy public API.
 *
 * Internal implementation modules remain private; only stable policy entrypoints are re-exported.
 */
pub use base::Policy;
pub use planning::{PlanningResult, action_values, next_state_distribution, value_iteration};
pub use qlearning::{QLearningAgent, QLearningConfig};
pub use random::RandomPolicy;
pub use table::{ActionValues, PolicyTable, QTable, TablePolicy, VTable, argmax};
