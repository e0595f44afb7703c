// rust/engine/src/rollout/sink.rs
#![forbid(unsafe_code)]

use crate::engine::{Action, State};

/// One environment step as seen by the learner.
#[derive(Clone, Copy, Debug)]
pub struct StepEvent<'a> {
    pub episode: u64,
    /// 1-based step index within the episode.
    pub t: u32,
    pub state: State,
    pub action: Action,
    pub reward: f64,
    pub next_state: Option<State>,
    /// States visited so far in this episode, start included.
    pub path: &'a [State],
}

/// Emitted once per finished learning episode.
///
/// Transport struct: the learner computes fields, sinks only format/emit.
#[derive(Clone, Debug, PartialEq)]
pub struct EpisodeRow {
    pub episode: u64,
    pub steps: u32,
    pub total_reward: f64,
    /// False if the step cap was hit first.
    pub finished: bool,
    /// Exploration rate after the end-of-episode decay.
    pub epsilon: f64,
    /// Mean reward over the convergence window.
    pub avg_recent_reward: f64,
    pub best_reward: f64,
}

/// Notification hook for visualization, progress reporting and logging.
///
/// Called synchronously from the learning loop; implementations should return promptly.
pub trait TrainingSink {
    fn on_step(&mut self, _event: &StepEvent<'_>) {}

    fn on_episode_end(&mut self, _row: &EpisodeRow) {}
}

/// Default sink: does nothing.
#[derive(Default)]
pub struct NoopSink;

impl TrainingSink for NoopSink {}

/// Keeps every episode row in memory.
#[derive(Default, Debug)]
pub struct RecordingSink {
    pub steps: u64,
    pub rows: Vec<EpisodeRow>,
}

impl TrainingSink for RecordingSink {
    fn on_step(&mut self, _event: &StepEvent<'_>) {
        self.steps += 1;
    }

    fn on_episode_end(&mut self, row: &EpisodeRow) {
        self.rows.push(row.clone());
    }
}
