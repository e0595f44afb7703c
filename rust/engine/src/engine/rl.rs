// rust/engine/src/engine/rl.rs
#![forbid(unsafe_code)]

use rand::distributions::WeightedIndex;
use rand::prelude::*;
use tracing::debug;

use crate::engine::confusion::ConfusionWeights;
use crate::engine::constants::WEIGHT_TOLERANCE;
use crate::engine::geometry::{Action, State};
use crate::engine::grid::{GridModel, Map};
use crate::engine::mdp::{Mdp, Rewards};
use crate::error::MazeError;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StepOutcome {
    /// `None` once the agent has left a terminal state.
    pub next_state: Option<State>,
    /// Reward for leaving the state the step started from.
    pub reward: f64,
    /// True iff this step departed from a terminal state; `reset` is required next.
    pub finished: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    AwaitingReset,
    Running,
}

/// Fully observable RL problem: the observation is the actual state.
///
/// Transitions are sampled from the MDP's action model, one episode at a time.
#[derive(Clone, Debug)]
pub struct RlProblem<G: GridModel = Map> {
    mdp: Mdp<G>,
    current: Option<State>,
    phase: Phase,
    rng: StdRng,
}

impl<G: GridModel> RlProblem<G> {
    /// Environment with an entropy-seeded RNG. `weights = None` means deterministic actions.
    pub fn new(
        grid: G,
        weights: Option<ConfusionWeights>,
        rewards: Rewards,
    ) -> Result<Self, MazeError> {
        Ok(Self::from_mdp(Mdp::new(grid, weights, rewards)?, StdRng::from_entropy()))
    }

    /// Same as [`RlProblem::new`] with a reproducible RNG.
    pub fn with_seed(
        grid: G,
        weights: Option<ConfusionWeights>,
        rewards: Rewards,
        seed: u64,
    ) -> Result<Self, MazeError> {
        Ok(Self::from_mdp(
            Mdp::new(grid, weights, rewards)?,
            StdRng::seed_from_u64(seed),
        ))
    }

    pub fn from_mdp(mdp: Mdp<G>, rng: StdRng) -> Self {
        Self {
            mdp,
            current: None,
            phase: Phase::AwaitingReset,
            rng,
        }
    }

    pub fn mdp(&self) -> &Mdp<G> {
        &self.mdp
    }

    pub fn get_states(&self) -> &[State] {
        self.mdp.states()
    }

    pub fn get_action_space(&self) -> [Action; 4] {
        Action::ALL
    }

    pub fn current_state(&self) -> Option<State> {
        self.current
    }

    /// True until the next successful `reset`.
    pub fn is_finished(&self) -> bool {
        self.phase == Phase::AwaitingReset
    }

    /// Start an episode at the map's start square.
    pub fn reset(&mut self) -> Result<State, MazeError> {
        self.reset_with(None, false)
    }

    /// Start a new episode, abandoning any running one.
    ///
    /// The initial state is, in priority order: `state`, a uniformly random free state
    /// (terminals included) when `random_start` is set, or the map's start square.
    pub fn reset_with(
        &mut self,
        state: Option<State>,
        random_start: bool,
    ) -> Result<State, MazeError> {
        let start = if let Some(s) = state {
            if !self.mdp.contains(s) {
                return Err(MazeError::reset_impossible(format!(
                    "requested start {s} is not a free cell"
                )));
            }
            s
        } else if random_start {
            *self.mdp.states().choose(&mut self.rng).ok_or_else(|| {
                MazeError::reset_impossible("the maze has no free cell to start from")
            })?
        } else {
            self.mdp.grid().designated_start().ok_or_else(|| {
                MazeError::reset_impossible(
                    "specify a particular state, define a start state on the map, \
                     or set random_start",
                )
            })?
        };

        self.current = Some(start);
        self.phase = Phase::Running;
        debug!(%start, random_start, "episode reset");
        Ok(start)
    }

    /// Take one step with the *intended* action.
    ///
    /// The reward belongs to the state being left. Stepping out of a terminal state
    /// yields its reward, the `None` sentinel, and finishes the episode.
    pub fn step(&mut self, action: Action) -> Result<StepOutcome, MazeError> {
        if self.phase != Phase::Running {
            return Err(MazeError::NeedsReset);
        }
        let state = self.current.ok_or(MazeError::NeedsReset)?;

        let reward = self.mdp.reward(state);
        let finished = self.mdp.is_terminal(state);

        let next_state = if finished {
            None
        } else {
            let actual = self.mdp.action_model().sample(action, &mut self.rng);
            self.mdp.next_state(state, actual)
        };

        self.current = next_state;
        if finished {
            self.phase = Phase::AwaitingReset;
        }

        Ok(StepOutcome {
            next_state,
            reward,
            finished,
        })
    }

    /// Uniformly random action from the action space.
    pub fn sample_action(&mut self) -> Action {
        *Action::ALL.choose(&mut self.rng).unwrap_or(&Action::Up)
    }

    /// Random action drawn from a caller-given distribution that must sum to 1.
    pub fn sample_action_from(&mut self, distribution: &[(Action, f64)]) -> Result<Action, MazeError> {
        let total: f64 = distribution.iter().map(|(_, p)| p).sum();
        if distribution.is_empty() || (1.0 - total).abs() >= WEIGHT_TOLERANCE {
            return Err(MazeError::validation(format!(
                "action probabilities must sum to 1.0, got {total}"
            )));
        }
        let index = WeightedIndex::new(distribution.iter().map(|(_, p)| *p))
            .map_err(|e| MazeError::validation(format!("action probabilities: {e}")))?;
        Ok(distribution[index.sample(&mut self.rng)].0)
    }
}
