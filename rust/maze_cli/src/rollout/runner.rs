// src/rollout/runner.rs
#![forbid(unsafe_code)]

use std::fmt;
use std::time::Instant;

use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use maze_engine::engine::{Map, render_policy_ascii, render_values_ascii};
use maze_engine::policy::{TablePolicy, value_iteration};
use maze_engine::rollout::{EvaluationReport, TrainingSink, evaluate_policy};
use maze_engine::{
    ConfusionWeights, MazeError, PolicyTable, QLearningAgent, QLearningConfig, Rewards, RlProblem,
    VTable,
};

use super::sinks::CliSink;
use super::stats::FinalReport;

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum Algo {
    #[value(name = "qlearning")]
    QLearning,
    #[value(name = "value-iteration")]
    ValueIteration,
}

impl fmt::Display for Algo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::QLearning => "qlearning",
            Self::ValueIteration => "value-iteration",
        })
    }
}

#[derive(Clone, Debug)]
pub struct RunnerConfig {
    // ---------------- problem ----------------
    pub map: Map,
    /// `None` means deterministic actions.
    pub weights: Option<ConfusionWeights>,
    pub rewards: Rewards,

    // ---------------- algorithm ----------------
    pub algo: Algo,
    /// Q-learning hyper-parameters; `gamma` is shared with value iteration.
    pub learning: QLearningConfig,
    pub tolerance: f64,
    pub max_iterations: u32,

    /// Base seed: environment uses it as is, the agent and evaluation derive from it.
    pub base_seed: u64,

    /// Greedy evaluation rollouts after learning/planning (0 disables).
    pub eval_episodes: u32,

    // ---------------- output ----------------
    /// 0 = final summary only
    /// 1 = progress bar
    /// 2 = progress bar + periodic table (via sink)
    pub verbosity: u8,
    /// Table row every N episodes (only used when verbosity == 2). 0 disables.
    pub report_every: u64,

    // ---------------- rendering ----------------
    /// If Some(ms): render every learning step; sleep ms between frames (0 = no sleep).
    pub render_ms: Option<u64>,
}

/// What the run produced, for display.
pub struct RunOutput {
    pub policy: PolicyTable,
    pub values: VTable,
    pub report: FinalReport,
}

impl RunOutput {
    pub fn policy_ascii(&self, map: &Map) -> String {
        render_policy_ascii(map, &self.policy)
    }

    pub fn values_ascii(&self, map: &Map) -> String {
        render_values_ascii(map, &self.values)
    }
}

pub struct Runner {
    cfg: RunnerConfig,
    sink: Box<dyn TrainingSink>,
}

impl Runner {
    pub fn new(cfg: RunnerConfig, sink: Box<dyn TrainingSink>) -> Self {
        Self { cfg, sink }
    }

    pub fn run(&mut self) -> Result<RunOutput, MazeError> {
        match self.cfg.algo {
            Algo::QLearning => self.run_qlearning(),
            Algo::ValueIteration => self.run_value_iteration(),
        }
    }

    fn env(&self, seed: u64) -> Result<RlProblem, MazeError> {
        RlProblem::with_seed(self.cfg.map.clone(), self.cfg.weights, self.cfg.rewards, seed)
    }

    fn progress_bar(&self) -> Option<ProgressBar> {
        if self.cfg.verbosity == 0 {
            return None;
        }
        let pb = ProgressBar::new(u64::from(self.cfg.learning.max_episodes));
        if let Ok(style) = ProgressStyle::with_template(
            "{bar:40.cyan/blue} {pos:>7}/{len:<7}  {percent:>3}%  {elapsed_precise}  {msg}",
        ) {
            pb.set_style(style.progress_chars("=>-"));
        }
        Some(pb)
    }

    fn run_qlearning(&mut self) -> Result<RunOutput, MazeError> {
        let cfg = self.cfg.clone();

        let env = self.env(cfg.base_seed)?;
        let mut agent =
            QLearningAgent::with_seed(env, cfg.learning.clone(), cfg.base_seed.wrapping_add(999))?;

        // The table is fed through CliSink; verbosity < 2 turns it off.
        let report_every = if cfg.verbosity >= 2 { cfg.report_every } else { 0 };
        let pb = self.progress_bar();
        let mut sink = CliSink::new(
            &mut *self.sink,
            pb,
            cfg.learning.convergence_window,
            report_every,
            &cfg.map,
            cfg.render_ms,
        );
        let policy = agent.learn_with(&mut sink)?;
        sink.finish();

        let values = agent.values();
        let final_epsilon = agent.epsilon();
        let stats = agent.stats().clone();

        let eval = self.evaluate(&policy)?;
        Ok(RunOutput {
            report: FinalReport::from_learning(&stats, final_epsilon, &eval),
            policy,
            values,
        })
    }

    fn run_value_iteration(&mut self) -> Result<RunOutput, MazeError> {
        let t0 = Instant::now();
        let env = self.env(self.cfg.base_seed)?;
        let planned = value_iteration(
            env.mdp(),
            self.cfg.learning.gamma,
            self.cfg.tolerance,
            self.cfg.max_iterations,
        )?;
        info!(
            iterations = planned.iterations,
            converged = planned.converged,
            "planning completed"
        );
        let elapsed = t0.elapsed().as_secs_f64();

        let eval = self.evaluate(&planned.policy)?;
        Ok(RunOutput {
            report: FinalReport::from_planning(elapsed, planned.iterations, planned.converged, &eval),
            policy: planned.policy,
            values: planned.values,
        })
    }

    /// Greedy rollouts of `policy` on a fresh environment.
    fn evaluate(&self, policy: &PolicyTable) -> Result<EvaluationReport, MazeError> {
        let mut env = self.env(self.cfg.base_seed.wrapping_add(1))?;
        let mut greedy = TablePolicy::new(policy.clone());
        evaluate_policy(
            &mut env,
            &mut greedy,
            self.cfg.eval_episodes,
            self.cfg.learning.random_start,
            self.cfg.learning.t_max,
        )
    }
}
