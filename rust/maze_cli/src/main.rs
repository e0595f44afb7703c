// src/main.rs
#![forbid(unsafe_code)]

mod rollout;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use thiserror::Error;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt};

use crate::rollout::{Algo, Runner, RunnerConfig, TableSink};
use maze_engine::engine::{
    DEFAULT_ALPHA, DEFAULT_EPSILON, DEFAULT_EPSILON_DECAY, DEFAULT_EPSILON_MIN, DEFAULT_GAMMA,
    DEFAULT_REWARD_DANGER, DEFAULT_REWARD_GOAL, DEFAULT_REWARD_NORMAL, MAX_EPISODES, T_MAX,
};
use maze_engine::rollout::NoopSink;
use maze_engine::{ConfusionWeights, Map, MazeError, QLearningConfig, Rewards, TrainingSink};

const DEMO_MAP: &str = "...G\n.#.D\nS...";

#[derive(Parser, Debug)]
#[command(name = "maze_cli")]
struct Args {
    // ---------------- maze ----------------
    /// Read the maze from a text file (S start, G goal, D danger, # wall, . empty).
    #[arg(long, conflicts_with = "map_str")]
    map: Option<PathBuf>,

    /// Inline maze text, rows separated by newlines or '/'. Defaults to a 3x4 demo maze.
    #[arg(long)]
    map_str: Option<String>,

    // ---------------- action confusion ----------------
    /**
     * Confusion weights. Omit all four for deterministic actions.
     * Missing side weights default to 0; a missing --forward takes the remainder.
     * Examples:
     *   --left 0.1 --right 0.1            (forward 0.8)
     *   --forward 0.7 --left 0.1 --right 0.1 --backward 0.1
     */
    #[arg(long)]
    forward: Option<f64>,
    #[arg(long)]
    left: Option<f64>,
    #[arg(long)]
    right: Option<f64>,
    #[arg(long)]
    backward: Option<f64>,

    // ---------------- rewards ----------------
    /// Reward for leaving a goal cell.
    #[arg(long, default_value_t = DEFAULT_REWARD_GOAL, allow_negative_numbers = true)]
    goal: f64,
    /// Reward for leaving a danger cell.
    #[arg(long, default_value_t = DEFAULT_REWARD_DANGER, allow_negative_numbers = true)]
    danger: f64,
    /// Reward for leaving any other cell.
    #[arg(long, default_value_t = DEFAULT_REWARD_NORMAL, allow_negative_numbers = true)]
    normal: f64,

    // ---------------- algorithm ----------------
    #[arg(long, value_enum, default_value_t = Algo::QLearning)]
    algo: Algo,

    #[arg(long, default_value_t = DEFAULT_GAMMA)]
    gamma: f64,
    #[arg(long, default_value_t = DEFAULT_ALPHA)]
    alpha: f64,

    /// Max learning episodes.
    #[arg(long, default_value_t = MAX_EPISODES)]
    episodes: u32,
    /// Step cap per episode.
    #[arg(long, default_value_t = T_MAX)]
    t_max: u32,

    #[arg(long, default_value_t = DEFAULT_EPSILON)]
    epsilon: f64,
    #[arg(long, default_value_t = DEFAULT_EPSILON_MIN)]
    epsilon_min: f64,
    #[arg(long, default_value_t = DEFAULT_EPSILON_DECAY)]
    epsilon_decay: f64,

    /// Value-iteration stopping threshold on the max value change.
    #[arg(long, default_value_t = 1e-9)]
    tolerance: f64,
    #[arg(long, default_value_t = 10_000)]
    max_iterations: u32,

    /// Base RNG seed. If omitted, a fixed default is used.
    #[arg(long)]
    seed: Option<u64>,

    /// Start episodes from a uniformly random free cell instead of S.
    #[arg(long, default_value_t = false)]
    random_start: bool,

    /// Greedy evaluation episodes after training (0 disables).
    #[arg(long, default_value_t = 100)]
    eval_episodes: u32,

    // ---------------- visualization ----------------
    /**
     * Render the maze as ASCII every learning step; value is sleep in ms. Omit to disable.
     * Examples:
     *   --render 0    (render as fast as possible)
     *   --render 30   (sleep 30ms between frames)
     */
    #[arg(long, value_name = "ms")]
    render: Option<u64>,

    // ---------------- output / reporting ----------------
    /// Verbosity: 0=silent (final summary only), 1=progress bar, 2=progress bar + periodic table.
    #[arg(long, default_value_t = 1)]
    verbosity: u8,

    /// Print a table row every N episodes (only used with --verbosity 2).
    #[arg(long, default_value_t = 50)]
    report_every: u64,
}

#[derive(Error, Debug)]
enum CliError {
    #[error("cannot read map file {path}: {source}")]
    MapFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Maze(#[from] MazeError),
}

const DEFAULT_LOG_FILTER: &str = "maze_engine=info,maze_cli=info";

/// `RUST_LOG` wins when set and parseable; otherwise the crate targets log at info.
fn log_filter(rust_log: Option<&str>) -> EnvFilter {
    rust_log
        .filter(|s| !s.trim().is_empty())
        .and_then(|s| EnvFilter::try_new(s).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_FILTER))
}

fn init_logging() {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = log_filter(rust_log.as_deref());
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

impl Args {
    fn load_map(&self) -> Result<Map, CliError> {
        let text = match (&self.map, &self.map_str) {
            (Some(path), _) => std::fs::read_to_string(path).map_err(|source| CliError::MapFile {
                path: path.clone(),
                source,
            })?,
            (None, Some(inline)) => inline.replace('/', "\n"),
            (None, None) => DEMO_MAP.to_string(),
        };
        Ok(Map::from_string(&text)?)
    }

    /// `None` when no weight flag was given.
    fn weights(&self) -> Option<ConfusionWeights> {
        if self.forward.is_none()
            && self.left.is_none()
            && self.right.is_none()
            && self.backward.is_none()
        {
            return None;
        }
        let left = self.left.unwrap_or(0.0);
        let right = self.right.unwrap_or(0.0);
        let backward = self.backward.unwrap_or(0.0);
        let forward = self.forward.unwrap_or(1.0 - left - right - backward);
        Some(ConfusionWeights::new(forward, left, right, backward))
    }

    fn learning(&self) -> QLearningConfig {
        QLearningConfig {
            gamma: self.gamma,
            alpha: self.alpha,
            epsilon: self.epsilon,
            epsilon_min: self.epsilon_min,
            epsilon_decay: self.epsilon_decay,
            t_max: self.t_max,
            max_episodes: self.episodes,
            random_start: self.random_start,
            // Progress goes through the CLI sinks instead of library log lines.
            report_every: 0,
            ..QLearningConfig::default()
        }
    }
}

fn run(args: &Args) -> Result<(), CliError> {
    let map = args.load_map()?;
    info!(
        width = map.width(),
        height = map.height(),
        free = map.number_of_accessible_states(),
        algo = %args.algo,
        "maze loaded"
    );

    // Runner configuration (data only; no logic).
    let cfg = RunnerConfig {
        map: map.clone(),
        weights: args.weights(),
        rewards: Rewards::new(args.goal, args.danger, args.normal),

        algo: args.algo,
        learning: args.learning(),
        tolerance: args.tolerance,
        max_iterations: args.max_iterations,

        base_seed: args.seed.unwrap_or(12345),
        eval_episodes: args.eval_episodes,

        verbosity: args.verbosity,
        report_every: args.report_every,

        render_ms: args.render,
    };

    // Reporting sink:
    // - verbosity 2 => periodic table (unless report_every == 0)
    // - otherwise   => no-op
    let sink: Box<dyn TrainingSink> = if cfg.verbosity >= 2 && cfg.report_every > 0 {
        Box::new(TableSink::new(20))
    } else {
        Box::new(NoopSink)
    };

    let mut runner = Runner::new(cfg, sink);
    let out = runner.run()?;

    println!("policy:\n{}", out.policy_ascii(&map));
    println!("values:\n{}", out.values_ascii(&map));

    // Final one-line summary (useful for logs / grep).
    println!("{}", out.report.done_line());
    Ok(())
}

fn main() -> ExitCode {
    init_logging();
    let args = Args::parse();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "run failed");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
