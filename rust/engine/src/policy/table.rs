// rust/engine/src/policy/table.rs
#![forbid(unsafe_code)]

use rustc_hash::FxHashMap;

use crate::engine::{ACTION_DIM, Action, State};
use crate::error::MazeError;
use crate::policy::base::Policy;

/// One Q-table row, indexed by [`Action::idx`].
pub type ActionValues = [f64; ACTION_DIM];

/// Tabular state values.
pub type VTable = FxHashMap<State, f64>;

/// Deterministic policy: one action per state.
pub type PolicyTable = FxHashMap<State, Action>;

/// Greedy action of a row. Ties go to the first action in UP, RIGHT, DOWN, LEFT order.
#[inline]
pub fn argmax(row: &ActionValues) -> Action {
    let mut best = 0usize;
    for i in 1..ACTION_DIM {
        if row[i] > row[best] {
            best = i;
        }
    }
    Action::from_idx(best)
}

/// Tabular action-value function.
///
/// Rows are created once for a fixed set of states and never added or removed;
/// updates overwrite single entries in place.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct QTable {
    rows: FxHashMap<State, ActionValues>,
}

impl QTable {
    /// Zero-initialized table covering `states` and every action.
    pub fn new(states: &[State]) -> Self {
        Self {
            rows: states.iter().map(|&s| (s, [0.0; ACTION_DIM])).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn contains(&self, state: State) -> bool {
        self.rows.contains_key(&state)
    }

    pub fn row(&self, state: State) -> Option<&ActionValues> {
        self.rows.get(&state)
    }

    pub fn get(&self, state: State, action: Action) -> Option<f64> {
        self.rows.get(&state).map(|row| row[action.idx()])
    }

    /// Overwrite one entry. Unknown states are rejected; the table never grows.
    pub fn set(&mut self, state: State, action: Action, value: f64) -> Result<(), MazeError> {
        let row = self
            .rows
            .get_mut(&state)
            .ok_or(MazeError::UnknownState { state })?;
        row[action.idx()] = value;
        Ok(())
    }

    pub fn max_value(&self, state: State) -> Option<f64> {
        self.rows
            .get(&state)
            .map(|row| row.iter().copied().fold(f64::NEG_INFINITY, f64::max))
    }

    pub fn best_action(&self, state: State) -> Option<Action> {
        self.rows.get(&state).map(argmax)
    }

    /// State values `V(s) = max_a Q(s, a)`.
    pub fn values(&self) -> VTable {
        self.rows
            .iter()
            .map(|(&s, row)| (s, row.iter().copied().fold(f64::NEG_INFINITY, f64::max)))
            .collect()
    }

    /// Greedy action for each of `states` that has a row.
    pub fn greedy_policy(&self, states: &[State]) -> PolicyTable {
        states
            .iter()
            .filter_map(|&s| self.best_action(s).map(|a| (s, a)))
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&State, &ActionValues)> {
        self.rows.iter()
    }
}

/// Follows a fixed [`PolicyTable`]; states missing from the table fall back to `fallback`.
#[derive(Clone, Debug)]
pub struct TablePolicy {
    table: PolicyTable,
    fallback: Action,
}

impl TablePolicy {
    pub fn new(table: PolicyTable) -> Self {
        Self {
            table,
            fallback: Action::Up,
        }
    }

    pub fn with_fallback(mut self, fallback: Action) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn table(&self) -> &PolicyTable {
        &self.table
    }
}

impl Policy for TablePolicy {
    fn choose_action(&mut self, state: State) -> Action {
        self.table.get(&state).copied().unwrap_or(self.fallback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn argmax_prefers_first_on_ties() {
        assert_eq!(argmax(&[0.0; 4]), Action::Up);
        assert_eq!(argmax(&[0.0, 1.0, 1.0, 0.5]), Action::Right);
        assert_eq!(argmax(&[-3.0, -2.0, -1.0, -1.0]), Action::Down);
    }

    #[test]
    fn set_rejects_unknown_states() {
        let mut q = QTable::new(&[State::new(0, 0)]);
        assert_eq!(q.len(), 1);
        assert!(q.set(State::new(0, 0), Action::Left, 2.5).is_ok());
        assert_eq!(q.get(State::new(0, 0), Action::Left), Some(2.5));
        assert_eq!(
            q.set(State::new(4, 4), Action::Up, 1.0),
            Err(MazeError::UnknownState {
                state: State::new(4, 4)
            })
        );
        assert_eq!(q.len(), 1);
    }

    #[test]
    fn values_and_greedy_policy() {
        let a = State::new(0, 0);
        let b = State::new(0, 1);
        let mut q = QTable::new(&[a, b]);
        q.set(a, Action::Down, 3.0).unwrap();
        q.set(b, Action::Up, -1.0).unwrap();

        let v = q.values();
        assert_eq!(v[&a], 3.0);
        assert_eq!(v[&b], 0.0);

        let p = q.greedy_policy(&[a, b, State::new(9, 9)]);
        assert_eq!(p.len(), 2);
        assert_eq!(p[&a], Action::Down);
        assert_eq!(p[&b], Action::Right);
    }

    #[test]
    fn table_policy_falls_back() {
        let mut table = PolicyTable::default();
        table.insert(State::new(1, 1), Action::Left);
        let mut p = TablePolicy::new(table).with_fallback(Action::Down);
        assert_eq!(p.choose_action(State::new(1, 1)), Action::Left);
        assert_eq!(p.choose_action(State::new(0, 0)), Action::Down);
    }
}
