// rust/engine/src/rollout/mod.rs
#![forbid(unsafe_code)]

mod runner;
mod sink;
mod stats;

pub use runner::{EpisodeOutcome, EvaluationReport, evaluate_policy, rollout_episode};
pub use sink::{EpisodeRow, NoopSink, RecordingSink, StepEvent, TrainingSink};
pub use stats::LearningStats;
