// src/rollout/stats.rs
#![forbid(unsafe_code)]

use maze_engine::rollout::{EpisodeRow, EvaluationReport, LearningStats};

use super::runner::Algo;

/// One-line progress-bar message for the latest learning episode.
pub fn live_msg(stats: &LearningStats, row: &EpisodeRow) -> String {
    format!(
        "eps={:.3} avg_r={:.3} best_r={:.3} avg_len={:.1} max_len={} fin={}/{} sps={:.0}",
        row.epsilon,
        row.avg_recent_reward,
        row.best_reward,
        stats.avg_ep_len(),
        stats.episode_len_max,
        stats.episodes_finished,
        stats.episodes,
        stats.steps_per_sec(),
    )
}

/// End-of-run summary, printed as the DONE line.
#[derive(Clone, Debug)]
pub struct FinalReport {
    pub algo: Algo,

    pub elapsed_s: f64,

    // learning (zero for value iteration)
    pub episodes: u64,
    pub episodes_finished: u64,
    pub steps_done: u64,
    pub steps_per_s: f64,
    pub avg_reward: f64,
    pub best_reward: f64,
    pub final_epsilon: f64,

    // planning (zero for q-learning)
    pub iterations: u32,
    pub planning_converged: bool,

    // greedy evaluation
    pub eval_episodes: u32,
    pub eval_finish_rate: f64,
    pub eval_avg_reward: f64,
    pub eval_avg_len: f64,
}

impl FinalReport {
    pub fn from_learning(
        stats: &LearningStats,
        final_epsilon: f64,
        eval: &EvaluationReport,
    ) -> Self {
        Self {
            elapsed_s: stats.elapsed_secs(),
            episodes: stats.episodes,
            episodes_finished: stats.episodes_finished,
            steps_done: stats.steps_done,
            steps_per_s: stats.steps_per_sec(),
            avg_reward: stats.avg_reward(),
            best_reward: if stats.episodes > 0 { stats.best_reward } else { 0.0 },
            final_epsilon,
            ..Self::evaluation_only(Algo::QLearning, eval)
        }
    }

    pub fn from_planning(
        elapsed_s: f64,
        iterations: u32,
        converged: bool,
        eval: &EvaluationReport,
    ) -> Self {
        Self {
            elapsed_s,
            iterations,
            planning_converged: converged,
            ..Self::evaluation_only(Algo::ValueIteration, eval)
        }
    }

    fn evaluation_only(algo: Algo, eval: &EvaluationReport) -> Self {
        Self {
            algo,
            elapsed_s: 0.0,
            episodes: 0,
            episodes_finished: 0,
            steps_done: 0,
            steps_per_s: 0.0,
            avg_reward: 0.0,
            best_reward: 0.0,
            final_epsilon: 0.0,
            iterations: 0,
            planning_converged: false,
            eval_episodes: eval.episodes,
            eval_finish_rate: eval.finish_rate(),
            eval_avg_reward: eval.avg_reward,
            eval_avg_len: eval.avg_ep_len,
        }
    }

    pub fn done_line(&self) -> String {
        let head = match self.algo {
            Algo::QLearning => format!(
                "algo={} episodes={} finished={} steps_done={} elapsed={:.3}s steps/s={:.1} avg_reward={:.4} best_reward={:.4} epsilon={:.4}",
                self.algo,
                self.episodes,
                self.episodes_finished,
                self.steps_done,
                self.elapsed_s,
                self.steps_per_s,
                self.avg_reward,
                self.best_reward,
                self.final_epsilon,
            ),
            Algo::ValueIteration => format!(
                "algo={} iterations={} converged={} elapsed={:.3}s",
                self.algo, self.iterations, self.planning_converged, self.elapsed_s,
            ),
        };
        format!(
            "DONE: {head} eval_episodes={} eval_finish_rate={:.3} eval_avg_reward={:.4} eval_avg_len={:.2}",
            self.eval_episodes, self.eval_finish_rate, self.eval_avg_reward, self.eval_avg_len,
        )
    }
}
