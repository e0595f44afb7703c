// rust/engine/src/rollout/stats.rs
#![forbid(unsafe_code)]

use std::collections::VecDeque;
use std::time::Instant;

/// Running statistics over learning episodes.
#[derive(Clone, Debug)]
pub struct LearningStats {
    pub episodes: u64,
    pub episodes_finished: u64,
    pub steps_done: u64,
    pub episode_len_max: u64,

    pub reward_sum: f64,
    pub best_reward: f64,

    // sliding window used by the convergence heuristic
    window: usize,
    recent: VecDeque<f64>,

    t0: Instant,
}

impl LearningStats {
    pub fn new(window: usize) -> Self {
        let window = window.max(1);
        Self {
            episodes: 0,
            episodes_finished: 0,
            steps_done: 0,
            episode_len_max: 0,
            reward_sum: 0.0,
            best_reward: f64::NEG_INFINITY,
            window,
            recent: VecDeque::with_capacity(window),
            t0: Instant::now(),
        }
    }

    /// Call once per episode.
    pub fn record(&mut self, total_reward: f64, steps: u32, finished: bool) {
        self.episodes += 1;
        if finished {
            self.episodes_finished += 1;
        }
        self.steps_done += u64::from(steps);
        self.episode_len_max = self.episode_len_max.max(u64::from(steps));

        self.reward_sum += total_reward;
        self.best_reward = self.best_reward.max(total_reward);

        if self.recent.len() == self.window {
            self.recent.pop_front();
        }
        self.recent.push_back(total_reward);
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.t0.elapsed().as_secs_f64()
    }

    pub fn steps_per_sec(&self) -> f64 {
        let dt = self.elapsed_secs();
        if dt > 0.0 {
            self.steps_done as f64 / dt
        } else {
            0.0
        }
    }

    pub fn avg_reward(&self) -> f64 {
        if self.episodes > 0 {
            self.reward_sum / self.episodes as f64
        } else {
            0.0
        }
    }

    pub fn avg_recent_reward(&self) -> f64 {
        if self.recent.is_empty() {
            0.0
        } else {
            self.recent.iter().sum::<f64>() / self.recent.len() as f64
        }
    }

    pub fn avg_ep_len(&self) -> f64 {
        if self.episodes > 0 {
            self.steps_done as f64 / self.episodes as f64
        } else {
            0.0
        }
    }

    /// True once the window is full of identical episode rewards and the 0-based
    /// index of the latest episode is past `min_episodes`.
    pub fn converged(&self, min_episodes: u64) -> bool {
        let past_min = self.episodes.saturating_sub(1) > min_episodes;
        if !past_min || self.recent.len() < self.window {
            return false;
        }
        let first = self.recent[0];
        self.recent.iter().all(|&r| (r - first).abs() <= 1e-12)
    }
}
