// rust/engine/src/policy/qlearning.rs
#![forbid(unsafe_code)]

use rand::prelude::*;
use tracing::{debug, info};

use crate::engine::{
    Action, DEFAULT_ALPHA, DEFAULT_CONVERGENCE_WINDOW, DEFAULT_EPSILON, DEFAULT_EPSILON_DECAY,
    DEFAULT_EPSILON_MIN, DEFAULT_GAMMA, DEFAULT_MIN_EPISODES, GridModel, MAX_EPISODES, Map,
    RlProblem, State, T_MAX,
};
use crate::error::MazeError;
use crate::rollout::{EpisodeOutcome, EpisodeRow, LearningStats, NoopSink, StepEvent, TrainingSink};

use super::base::Policy;
use super::table::{PolicyTable, QTable, VTable};

/// Hyper-parameters of tabular Q-learning.
#[derive(Clone, Debug, PartialEq)]
pub struct QLearningConfig {
    /// Discount factor in `[0, 1]`.
    pub gamma: f64,
    /// Learning rate in `(0, 1]`.
    pub alpha: f64,

    /// Initial exploration rate.
    pub epsilon: f64,
    /// Exploration floor.
    pub epsilon_min: f64,
    /// Geometric decay applied after each episode.
    pub epsilon_decay: f64,

    /// Step cap per episode.
    pub t_max: u32,
    /// Episode cap for `learn`.
    pub max_episodes: u32,

    /// Early stop once this many consecutive episode rewards are identical...
    pub convergence_window: usize,
    /// ...and the 0-based episode index is past this.
    pub min_episodes: u32,

    /// Start every episode from a uniformly random free state instead of the map start.
    pub random_start: bool,

    /// Emit an `info!` progress line every N episodes (0 disables).
    pub report_every: u32,
}

impl Default for QLearningConfig {
    fn default() -> Self {
        Self {
            gamma: DEFAULT_GAMMA,
            alpha: DEFAULT_ALPHA,
            epsilon: DEFAULT_EPSILON,
            epsilon_min: DEFAULT_EPSILON_MIN,
            epsilon_decay: DEFAULT_EPSILON_DECAY,
            t_max: T_MAX,
            max_episodes: MAX_EPISODES,
            convergence_window: DEFAULT_CONVERGENCE_WINDOW,
            min_episodes: DEFAULT_MIN_EPISODES,
            random_start: false,
            report_every: 100,
        }
    }
}

impl QLearningConfig {
    pub fn validate(&self) -> Result<(), MazeError> {
        let unit = |x: f64| (0.0..=1.0).contains(&x);
        if !unit(self.gamma) {
            return Err(MazeError::validation(format!("gamma must be in [0, 1], got {}", self.gamma)));
        }
        if !(self.alpha > 0.0 && self.alpha <= 1.0) {
            return Err(MazeError::validation(format!("alpha must be in (0, 1], got {}", self.alpha)));
        }
        if !unit(self.epsilon) || !unit(self.epsilon_min) {
            return Err(MazeError::validation(format!(
                "epsilon and epsilon_min must be in [0, 1], got {} and {}",
                self.epsilon, self.epsilon_min
            )));
        }
        if !(self.epsilon_decay > 0.0 && self.epsilon_decay <= 1.0) {
            return Err(MazeError::validation(format!(
                "epsilon_decay must be in (0, 1], got {}",
                self.epsilon_decay
            )));
        }
        if self.t_max == 0 {
            return Err(MazeError::validation("t_max must be positive"));
        }
        if self.convergence_window == 0 {
            return Err(MazeError::validation("convergence_window must be positive"));
        }
        Ok(())
    }
}

/// Tabular Q-learning agent with epsilon-greedy exploration.
///
/// The agent owns its environment; the Q-table covers every free state of the maze
/// from construction on.
pub struct QLearningAgent<G: GridModel = Map> {
    env: RlProblem<G>,
    cfg: QLearningConfig,
    q_table: QTable,
    current_epsilon: f64,
    rng: StdRng,
    stats: LearningStats,
}

impl<G: GridModel> QLearningAgent<G> {
    /// Agent with an entropy-seeded exploration RNG.
    pub fn new(env: RlProblem<G>, cfg: QLearningConfig) -> Result<Self, MazeError> {
        Self::with_rng(env, cfg, StdRng::from_entropy())
    }

    pub fn with_seed(env: RlProblem<G>, cfg: QLearningConfig, seed: u64) -> Result<Self, MazeError> {
        Self::with_rng(env, cfg, StdRng::seed_from_u64(seed))
    }

    pub fn with_rng(env: RlProblem<G>, cfg: QLearningConfig, rng: StdRng) -> Result<Self, MazeError> {
        cfg.validate()?;
        let q_table = QTable::new(env.get_states());
        let stats = LearningStats::new(cfg.convergence_window);
        Ok(Self {
            current_epsilon: cfg.epsilon,
            env,
            cfg,
            q_table,
            rng,
            stats,
        })
    }

    /// Reset every Q-value to zero.
    pub fn init_q_table(&mut self) {
        self.q_table = QTable::new(self.env.get_states());
    }

    pub fn config(&self) -> &QLearningConfig {
        &self.cfg
    }

    pub fn env(&self) -> &RlProblem<G> {
        &self.env
    }

    pub fn env_mut(&mut self) -> &mut RlProblem<G> {
        &mut self.env
    }

    pub fn into_env(self) -> RlProblem<G> {
        self.env
    }

    pub fn q_table(&self) -> &QTable {
        &self.q_table
    }

    /// State values derived from the Q-table.
    pub fn values(&self) -> VTable {
        self.q_table.values()
    }

    pub fn epsilon(&self) -> f64 {
        self.current_epsilon
    }

    pub fn set_epsilon(&mut self, epsilon: f64) {
        self.current_epsilon = epsilon.clamp(0.0, 1.0);
    }

    pub fn stats(&self) -> &LearningStats {
        &self.stats
    }

    /// Greedy action under the current Q-table; `None` for states without a row.
    pub fn best_action(&self, state: State) -> Option<Action> {
        self.q_table.best_action(state)
    }

    /// Epsilon-greedy: explore uniformly with probability `epsilon`, otherwise greedy.
    pub fn choose_action(&mut self, state: State) -> Action {
        let explore = self.rng.r#gen::<f64>() < self.current_epsilon;
        let greedy = if explore { None } else { self.best_action(state) };
        match greedy {
            Some(a) => a,
            None => *Action::ALL.choose(&mut self.rng).unwrap_or(&Action::Up),
        }
    }

    /// TD(0) update of exactly one entry; returns the new value.
    ///
    /// `next_state = None` marks a transition out of a terminal state (no bootstrap).
    pub fn update(
        &mut self,
        state: State,
        action: Action,
        reward: f64,
        next_state: Option<State>,
    ) -> Result<f64, MazeError> {
        let current = self
            .q_table
            .get(state, action)
            .ok_or(MazeError::UnknownState { state })?;

        let bootstrap = match next_state {
            None => 0.0,
            Some(next) => self
                .q_table
                .max_value(next)
                .ok_or(MazeError::UnknownState { state: next })?,
        };

        let td_target = reward + self.cfg.gamma * bootstrap;
        let value = current + self.cfg.alpha * (td_target - current);
        self.q_table.set(state, action, value)?;
        Ok(value)
    }

    pub fn decay_epsilon(&mut self) {
        self.current_epsilon = (self.current_epsilon * self.cfg.epsilon_decay).max(self.cfg.epsilon_min);
    }

    /// Run one learning episode and return its total reward.
    pub fn run_episode(&mut self) -> Result<f64, MazeError> {
        Ok(self.run_episode_with(0, &mut NoopSink)?.total_reward)
    }

    /// Run one learning episode, reporting every step to `sink`.
    pub fn run_episode_with(
        &mut self,
        episode: u64,
        sink: &mut dyn TrainingSink,
    ) -> Result<EpisodeOutcome, MazeError> {
        let mut state = self.env.reset_with(None, self.cfg.random_start)?;
        let mut path = vec![state];
        let mut total_reward = 0.0;
        let mut t = 0u32;
        let mut finished = false;

        while !finished && t < self.cfg.t_max {
            t += 1;

            let action = self.choose_action(state);
            let out = self.env.step(action)?;
            total_reward += out.reward;
            finished = out.finished;

            if let Some(next) = out.next_state {
                path.push(next);
            }

            self.update(state, action, out.reward, out.next_state)?;

            sink.on_step(&StepEvent {
                episode,
                t,
                state,
                action,
                reward: out.reward,
                next_state: out.next_state,
                path: &path,
            });

            match out.next_state {
                Some(next) => state = next,
                None => break,
            }
        }

        if !finished {
            debug!(episode, t, "episode hit the step cap");
        }

        Ok(EpisodeOutcome {
            steps: t,
            total_reward,
            finished,
            path,
        })
    }

    /// Learn with the default no-op sink.
    pub fn learn(&mut self) -> Result<PolicyTable, MazeError> {
        self.learn_with(&mut NoopSink)
    }

    /// Run up to `max_episodes` learning episodes and return the greedy policy.
    ///
    /// Epsilon decays geometrically after each episode. Learning stops early once the
    /// last `convergence_window` episode rewards are identical.
    pub fn learn_with(&mut self, sink: &mut dyn TrainingSink) -> Result<PolicyTable, MazeError> {
        self.stats = LearningStats::new(self.cfg.convergence_window);

        for episode in 0..self.cfg.max_episodes {
            let out = self.run_episode_with(u64::from(episode), sink)?;
            self.decay_epsilon();
            self.stats.record(out.total_reward, out.steps, out.finished);

            sink.on_episode_end(&EpisodeRow {
                episode: u64::from(episode),
                steps: out.steps,
                total_reward: out.total_reward,
                finished: out.finished,
                epsilon: self.current_epsilon,
                avg_recent_reward: self.stats.avg_recent_reward(),
                best_reward: self.stats.best_reward,
            });

            if self.cfg.report_every > 0 && episode % self.cfg.report_every == 0 {
                info!(
                    episode,
                    max_episodes = self.cfg.max_episodes,
                    epsilon = self.current_epsilon,
                    avg_reward = self.stats.avg_recent_reward(),
                    best_reward = self.stats.best_reward,
                    "learning progress"
                );
            }

            if self.stats.converged(u64::from(self.cfg.min_episodes)) {
                info!(episodes = episode + 1, "converged");
                break;
            }
        }

        info!(
            episodes = self.stats.episodes,
            steps = self.stats.steps_done,
            "training completed"
        );
        Ok(self.extract_policy())
    }

    /// Greedy action for every state of the environment. Pure function of the Q-table.
    pub fn extract_policy(&self) -> PolicyTable {
        self.q_table.greedy_policy(self.env.get_states())
    }
}

impl<G: GridModel> Policy for QLearningAgent<G> {
    fn choose_action(&mut self, state: State) -> Action {
        QLearningAgent::choose_action(self, state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Rewards;
    use crate::rollout::RecordingSink;

    fn agent(map: &str, cfg: QLearningConfig) -> QLearningAgent {
        let map = Map::from_string(map).unwrap();
        let env = RlProblem::with_seed(map, None, Rewards::new(10.0, -10.0, -1.0), 5).unwrap();
        QLearningAgent::with_seed(env, cfg, 17).unwrap()
    }

    #[test]
    fn q_table_covers_every_free_state() {
        let a = agent("S.#\n.DG", QLearningConfig::default());
        assert_eq!(a.q_table().len(), 5);
        for &s in a.env().get_states() {
            assert_eq!(a.q_table().row(s), Some(&[0.0; 4]));
        }
        assert!(!a.q_table().contains(State::new(0, 2)));
    }

    #[test]
    fn update_applies_td_rule() {
        let cfg = QLearningConfig {
            gamma: 0.5,
            alpha: 0.5,
            ..QLearningConfig::default()
        };
        let mut a = agent("S.G", cfg);
        let s = State::new(0, 0);
        let n = State::new(0, 1);

        // terminal bootstrap is zero
        let v = a.update(State::new(0, 2), Action::Up, 10.0, None).unwrap();
        assert_eq!(v, 5.0);

        a.update(n, Action::Right, 4.0, Some(State::new(0, 2))).unwrap();
        // Q(n, RIGHT) = 0 + 0.5 * (4 + 0.5 * 5 - 0) = 3.25
        assert_eq!(a.q_table().get(n, Action::Right), Some(3.25));

        let v = a.update(s, Action::Right, -1.0, Some(n)).unwrap();
        // 0 + 0.5 * (-1 + 0.5 * 3.25) = 0.3125
        assert_eq!(v, 0.3125);
    }

    #[test]
    fn update_rejects_unknown_states() {
        let mut a = agent("S.G", QLearningConfig::default());
        assert_eq!(
            a.update(State::new(5, 5), Action::Up, 1.0, None),
            Err(MazeError::UnknownState {
                state: State::new(5, 5)
            })
        );
        assert_eq!(
            a.update(State::new(0, 0), Action::Up, 1.0, Some(State::new(-1, 0))),
            Err(MazeError::UnknownState {
                state: State::new(-1, 0)
            })
        );
        assert_eq!(a.q_table().get(State::new(0, 0), Action::Up), Some(0.0));
    }

    #[test]
    fn greedy_when_epsilon_is_zero() {
        let mut a = agent("S.G", QLearningConfig::default());
        a.set_epsilon(0.0);
        let s = State::new(0, 1);
        a.update(s, Action::Left, 2.0, None).unwrap();
        for _ in 0..50 {
            assert_eq!(a.choose_action(s), Action::Left);
        }
    }

    #[test]
    fn epsilon_decays_to_floor() {
        let cfg = QLearningConfig {
            epsilon: 0.5,
            epsilon_min: 0.2,
            epsilon_decay: 0.5,
            ..QLearningConfig::default()
        };
        let mut a = agent("SG", cfg);
        a.decay_epsilon();
        assert_eq!(a.epsilon(), 0.25);
        a.decay_epsilon();
        assert_eq!(a.epsilon(), 0.2);
    }

    #[test]
    fn run_episode_on_two_cells() {
        let cfg = QLearningConfig {
            epsilon: 0.0,
            epsilon_min: 0.0,
            ..QLearningConfig::default()
        };
        let mut a = agent("SG", cfg);
        let s = State::new(0, 0);
        let g = State::new(0, 1);

        // UP wins the all-zero tie and bumps the border, then RIGHT reaches G,
        // then UP wins the tie on G and leaves it.
        let out = a.run_episode_with(0, &mut NoopSink).unwrap();
        assert!(out.finished);
        assert_eq!(out.steps, 3);
        assert_eq!(out.total_reward, -1.0 - 1.0 + 10.0);
        assert_eq!(out.path, vec![s, s, g]);

        assert_eq!(a.q_table().row(s), Some(&[-0.1, -0.1, 0.0, 0.0]));
        assert_eq!(a.q_table().row(g), Some(&[1.0, 0.0, 0.0, 0.0]));
        assert!(a.env().is_finished());
    }

    #[test]
    fn init_q_table_zeroes_every_row() {
        let mut a = agent("S.G", QLearningConfig::default());
        a.run_episode().unwrap();
        let zero = [0.0; 4];
        assert!(a.env().get_states().iter().any(|&s| a.q_table().row(s) != Some(&zero)));

        a.init_q_table();
        assert_eq!(a.q_table().len(), 3);
        for &s in a.env().get_states() {
            assert_eq!(a.q_table().row(s), Some(&zero));
        }
    }

    #[test]
    fn env_mut_drives_the_owned_environment() {
        let mut a = agent("S.G", QLearningConfig::default());
        let g = State::new(0, 2);
        a.env_mut().reset_with(Some(g), false).unwrap();
        let out = a.env_mut().step(Action::Left).unwrap();
        assert_eq!(out.reward, 10.0);
        assert!(a.env().is_finished());
    }

    #[test]
    fn early_stop_waits_past_min_episode_index() {
        let cfg = QLearningConfig {
            convergence_window: 1,
            min_episodes: 3,
            max_episodes: 50,
            report_every: 0,
            ..QLearningConfig::default()
        };
        let mut a = agent("SG", cfg);
        let mut rec = RecordingSink::default();
        a.learn_with(&mut rec).unwrap();
        // episode indices 0..=4; index 4 is the first past 3
        assert_eq!(a.stats().episodes, 5);
        assert_eq!(rec.rows.last().map(|r| r.episode), Some(4));
    }

    #[test]
    fn invalid_config_is_rejected() {
        let map = Map::from_string("SG").unwrap();
        let env = RlProblem::with_seed(map, None, Rewards::default(), 1).unwrap();
        let cfg = QLearningConfig {
            alpha: 0.0,
            ..QLearningConfig::default()
        };
        assert!(matches!(
            QLearningAgent::with_seed(env, cfg, 1),
            Err(MazeError::Validation { .. })
        ));
    }
}
