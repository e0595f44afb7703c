// rust/engine/src/rollout/runner.rs
#![forbid(unsafe_code)]

use tracing::warn;

use crate::engine::{GridModel, RlProblem, State};
use crate::error::MazeError;
use crate::policy::Policy;

/// Result of a single episode.
#[derive(Clone, Debug, PartialEq)]
pub struct EpisodeOutcome {
    pub steps: u32,
    pub total_reward: f64,
    /// False if the step cap was hit first.
    pub finished: bool,
    pub path: Vec<State>,
}

/// Aggregate over several evaluation episodes.
#[derive(Clone, Debug, PartialEq)]
pub struct EvaluationReport {
    pub episodes: u32,
    pub episodes_finished: u32,
    pub avg_reward: f64,
    pub avg_ep_len: f64,
}

impl EvaluationReport {
    pub fn finish_rate(&self) -> f64 {
        if self.episodes > 0 {
            f64::from(self.episodes_finished) / f64::from(self.episodes)
        } else {
            0.0
        }
    }
}

/// Run one episode of `policy` without learning.
///
/// `start` is passed to [`RlProblem::reset_with`]; the loop stops when the environment
/// reports the episode finished or after `t_max` steps.
pub fn rollout_episode<G: GridModel>(
    env: &mut RlProblem<G>,
    policy: &mut dyn Policy,
    start: Option<State>,
    random_start: bool,
    t_max: u32,
) -> Result<EpisodeOutcome, MazeError> {
    let mut state = env.reset_with(start, random_start)?;
    let mut path = vec![state];
    let mut total_reward = 0.0;
    let mut steps = 0u32;
    let mut finished = false;

    while !finished && steps < t_max {
        steps += 1;
        let action = policy.choose_action(state);
        let out = env.step(action)?;
        total_reward += out.reward;
        finished = out.finished;
        match out.next_state {
            Some(next) => {
                path.push(next);
                state = next;
            }
            None => break,
        }
    }

    if !finished {
        warn!(steps, start = %path[0], "rollout hit the step cap before finishing");
    }

    Ok(EpisodeOutcome {
        steps,
        total_reward,
        finished,
        path,
    })
}

/// Average return of `policy` over `episodes` rollouts.
pub fn evaluate_policy<G: GridModel>(
    env: &mut RlProblem<G>,
    policy: &mut dyn Policy,
    episodes: u32,
    random_start: bool,
    t_max: u32,
) -> Result<EvaluationReport, MazeError> {
    let mut finished = 0u32;
    let mut reward_sum = 0.0;
    let mut len_sum = 0u64;

    for _ in 0..episodes {
        let out = rollout_episode(env, policy, None, random_start, t_max)?;
        if out.finished {
            finished += 1;
        }
        reward_sum += out.total_reward;
        len_sum += u64::from(out.steps);
    }

    let n = f64::from(episodes.max(1));
    Ok(EvaluationReport {
        episodes,
        episodes_finished: finished,
        avg_reward: reward_sum / n,
        avg_ep_len: len_sum as f64 / n,
    })
}
