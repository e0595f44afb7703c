// rust/engine/src/engine/search.rs
#![forbid(unsafe_code)]

use rustc_hash::FxHashSet;

use crate::engine::geometry::{Action, State};
use crate::engine::grid::{GridModel, Map, Role};

/// Cost of leaving a cell with a given role.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RoleCosts {
    pub empty: f64,
    pub start: f64,
    pub goal: f64,
    pub danger: f64,
    pub wall: f64,
}

impl RoleCosts {
    pub fn cost(&self, role: Role) -> f64 {
        match role {
            Role::Empty => self.empty,
            Role::Start => self.start,
            Role::Goal => self.goal,
            Role::Danger => self.danger,
            Role::Wall => self.wall,
        }
    }
}

impl Default for RoleCosts {
    fn default() -> Self {
        Self {
            empty: 1.0,
            start: 1.0,
            goal: 0.0,
            danger: 10.0,
            wall: f64::INFINITY,
        }
    }
}

/// Deterministic search problem over a [`Map`].
///
/// Tracks visited states: the start once requested, and every successor produced
/// by [`SearchProblem::transition_result`].
#[derive(Clone, Debug)]
pub struct SearchProblem {
    map: Map,
    costs: RoleCosts,
    visited: FxHashSet<State>,
}

impl SearchProblem {
    pub fn new(map: Map, costs: RoleCosts) -> Self {
        Self {
            map,
            costs,
            visited: FxHashSet::default(),
        }
    }

    pub fn map(&self) -> &Map {
        &self.map
    }

    pub fn start(&mut self) -> Option<State> {
        let start = self.map.designated_start()?;
        self.visited.insert(start);
        Some(start)
    }

    pub fn goals(&self) -> &[State] {
        self.map.goal_states()
    }

    pub fn is_goal(&self, state: State) -> bool {
        self.map.is_goal(state)
    }

    /// All four moves on a free cell, none on a wall.
    pub fn actions(&self, state: State) -> Vec<Action> {
        if self.map.is_free(state) {
            Action::ALL.to_vec()
        } else {
            Vec::new()
        }
    }

    /// Successor and the cost of leaving `state`. Blocked moves stay in place.
    pub fn transition_result(&mut self, state: State, action: Action) -> (State, f64) {
        let next = self.map.apply(state, action);
        self.visited.insert(next);
        (next, self.costs.cost(self.map.role(state)))
    }

    pub fn visited(&self) -> &FxHashSet<State> {
        &self.visited
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn problem() -> SearchProblem {
        let map = Map::from_string("S.D\n#.G").unwrap();
        SearchProblem::new(map, RoleCosts::default())
    }

    #[test]
    fn costs_follow_departed_role() {
        let mut p = problem();
        let s = p.start().unwrap();
        assert_eq!(p.transition_result(s, Action::Right), (State::new(0, 1), 1.0));
        assert_eq!(
            p.transition_result(State::new(0, 2), Action::Down),
            (State::new(1, 2), 10.0)
        );
        assert_eq!(
            p.transition_result(State::new(1, 2), Action::Left),
            (State::new(1, 1), 0.0)
        );
    }

    #[test]
    fn visited_tracks_start_and_successors() {
        let mut p = problem();
        assert!(p.visited().is_empty());
        let s = p.start().unwrap();
        let _ = p.transition_result(s, Action::Down);
        assert_eq!(p.visited().len(), 1, "blocked move stays at start");
        let _ = p.transition_result(s, Action::Right);
        assert!(p.visited().contains(&State::new(0, 1)));
    }

    #[test]
    fn walls_have_no_actions() {
        let p = problem();
        assert!(p.actions(State::new(1, 0)).is_empty());
        assert_eq!(p.actions(State::new(0, 0)).len(), 4);
        assert!(p.is_goal(State::new(1, 2)));
        assert_eq!(p.goals(), &[State::new(1, 2)]);
    }
}
