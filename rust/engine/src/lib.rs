// rust/engine/src/lib.rs
#![forbid(unsafe_code)]

//! Grid-world maze environments for three classic AI paradigms: deterministic search,
//! Markov decision processes and tabular reinforcement learning, plus a reference
//! Q-learning agent.

pub mod engine;
pub mod error;
pub mod policy;
pub mod rollout;

pub use engine::{
    Action, ActionModel, Confusion, ConfusionWeights, GridModel, Map, Mdp, Rewards, RlProblem,
    Role, RoleCosts, SearchProblem, State, StepOutcome,
};
pub use error::MazeError;
pub use policy::{
    Policy, PolicyTable, QLearningAgent, QLearningConfig, QTable, RandomPolicy, TablePolicy,
    VTable, value_iteration,
};
pub use rollout::{EpisodeRow, NoopSink, StepEvent, TrainingSink};
