// rust/engine/src/engine/mdp.rs
#![forbid(unsafe_code)]

use rustc_hash::FxHashSet;

use crate::engine::confusion::{ActionModel, ConfusionWeights};
use crate::engine::constants::{DEFAULT_REWARD_DANGER, DEFAULT_REWARD_GOAL, DEFAULT_REWARD_NORMAL};
use crate::engine::geometry::{Action, State};
use crate::engine::grid::{GridModel, Map};
use crate::error::MazeError;

/// Reward obtained when *leaving* a state of the given role.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rewards {
    pub goal: f64,
    pub danger: f64,
    pub normal: f64,
}

impl Rewards {
    pub fn new(goal: f64, danger: f64, normal: f64) -> Self {
        Self {
            goal,
            danger,
            normal,
        }
    }
}

impl Default for Rewards {
    fn default() -> Self {
        Self::new(DEFAULT_REWARD_GOAL, DEFAULT_REWARD_DANGER, DEFAULT_REWARD_NORMAL)
    }
}

/// MDP defined over a maze with deterministic or stochastic actions.
///
/// Terminal states (goals, dangers) have no successor: applying any action to them
/// yields `None`, the "episode ended" sentinel.
#[derive(Clone, Debug)]
pub struct Mdp<G: GridModel = Map> {
    grid: G,
    action_model: ActionModel,
    rewards: Rewards,

    states: Vec<State>,
    goals: FxHashSet<State>,
    dangers: FxHashSet<State>,
}

impl<G: GridModel> Mdp<G> {
    /// `weights = None` selects deterministic actions.
    ///
    /// Malformed weights fail here, not at first use.
    pub fn new(
        grid: G,
        weights: Option<ConfusionWeights>,
        rewards: Rewards,
    ) -> Result<Self, MazeError> {
        let action_model = ActionModel::from_weights(weights)?;
        Ok(Self::with_action_model(grid, action_model, rewards))
    }

    pub fn with_action_model(grid: G, action_model: ActionModel, rewards: Rewards) -> Self {
        let states = grid.all_free_states();
        let goals = grid.goal_states().iter().copied().collect();
        let dangers = grid.danger_states().iter().copied().collect();
        Self {
            grid,
            action_model,
            rewards,
            states,
            goals,
            dangers,
        }
    }

    pub fn grid(&self) -> &G {
        &self.grid
    }

    pub fn action_model(&self) -> &ActionModel {
        &self.action_model
    }

    pub fn rewards(&self) -> Rewards {
        self.rewards
    }

    /// All free states, terminals included. Order is fixed per instance.
    pub fn states(&self) -> &[State] {
        &self.states
    }

    pub fn non_terminal_states(&self) -> Vec<State> {
        self.states
            .iter()
            .copied()
            .filter(|&s| !self.is_terminal(s))
            .collect()
    }

    /// Every action is available everywhere; the grid decides what is blocked.
    pub fn actions(&self, _state: State) -> [Action; 4] {
        Action::ALL
    }

    pub fn is_goal(&self, state: State) -> bool {
        self.goals.contains(&state)
    }

    pub fn is_danger(&self, state: State) -> bool {
        self.dangers.contains(&state)
    }

    pub fn is_terminal(&self, state: State) -> bool {
        self.is_goal(state) || self.is_danger(state)
    }

    pub fn contains(&self, state: State) -> bool {
        self.grid.is_free(state)
    }

    /// Reward for leaving `state`; depends only on its role.
    pub fn reward(&self, state: State) -> f64 {
        if self.is_goal(state) {
            self.rewards.goal
        } else if self.is_danger(state) {
            self.rewards.danger
        } else {
            self.rewards.normal
        }
    }

    /// Apply an *actually executed* action. Terminal states yield `None`.
    pub fn next_state(&self, state: State, action: Action) -> Option<State> {
        if self.is_terminal(state) {
            return None;
        }
        Some(self.grid.apply(state, action))
    }

    /// Possible next states with their probabilities after *intending* `action`.
    ///
    /// Terminal states return `[(None, 1.0)]`. Otherwise there is one entry per
    /// confusion outcome; outcomes landing on the same state are not merged.
    pub fn transition(&self, state: State, action: Action) -> Vec<(Option<State>, f64)> {
        if self.is_terminal(state) {
            return vec![(None, 1.0)];
        }
        self.action_model
            .probabilities(action)
            .into_iter()
            .map(|(actual, p)| (Some(self.grid.apply(state, actual)), p))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mdp(map: &str, weights: Option<ConfusionWeights>) -> Mdp {
        let map = Map::from_string(map).unwrap();
        Mdp::new(map, weights, Rewards::new(10.0, -10.0, -1.0)).unwrap()
    }

    #[test]
    fn states_and_non_terminals() {
        let m = mdp("S.G\n#.D", None);
        assert_eq!(m.states().len(), 5);
        let nt = m.non_terminal_states();
        assert_eq!(nt, vec![State::new(0, 0), State::new(0, 1), State::new(1, 1)]);
    }

    #[test]
    fn reward_is_by_role_of_departed_state() {
        let m = mdp("S.G\n#.D", None);
        assert_eq!(m.reward(State::new(0, 2)), 10.0);
        assert_eq!(m.reward(State::new(1, 2)), -10.0);
        assert_eq!(m.reward(State::new(0, 0)), -1.0);
        assert_eq!(m.reward(State::new(0, 1)), -1.0);
    }

    #[test]
    fn terminal_transition_is_sentinel() {
        let m = mdp("SG", Some(ConfusionWeights::new(0.8, 0.1, 0.1, 0.0)));
        assert_eq!(m.transition(State::new(0, 1), Action::Left), vec![(None, 1.0)]);
        assert_eq!(m.next_state(State::new(0, 1), Action::Left), None);
    }

    #[test]
    fn stochastic_transitions_keep_duplicates() {
        let m = mdp("S.G", Some(ConfusionWeights::new(0.8, 0.1, 0.1, 0.0)));
        let t = m.transition(State::new(0, 1), Action::Right);
        assert_eq!(t.len(), 4);
        let total: f64 = t.iter().map(|(_, p)| p).sum();
        assert!((total - 1.0).abs() < 1e-12);
        // Slipping up or down hits the border: both stay in place.
        let stays = t
            .iter()
            .filter(|(s, p)| *s == Some(State::new(0, 1)) && *p > 0.0)
            .count();
        assert_eq!(stays, 2);
    }

    #[test]
    fn malformed_weights_fail_at_construction() {
        let map = Map::from_string("SG").unwrap();
        let r = Mdp::new(map, Some(ConfusionWeights::new(0.5, 0.1, 0.1, 0.0)), Rewards::default());
        assert!(matches!(r, Err(MazeError::Validation { .. })));
    }
}
