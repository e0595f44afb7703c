// rust/engine/src/policy/planning.rs
#![forbid(unsafe_code)]

use tracing::debug;

use crate::engine::{ACTION_DIM, Action, GridModel, Mdp, State};
use crate::error::MazeError;

use super::table::{ActionValues, PolicyTable, VTable, argmax};

#[derive(Clone, Debug, PartialEq)]
pub struct PlanningResult {
    pub values: VTable,
    pub policy: PolicyTable,
    pub iterations: u32,
    /// False if `max_iterations` was reached before the tolerance.
    pub converged: bool,
}

/// Distribution over distinct next states: duplicate confusion outcomes are summed,
/// first-seen order is kept.
pub fn next_state_distribution<G: GridModel>(
    mdp: &Mdp<G>,
    state: State,
    action: Action,
) -> Vec<(Option<State>, f64)> {
    let mut out: Vec<(Option<State>, f64)> = Vec::with_capacity(ACTION_DIM);
    for (next, p) in mdp.transition(state, action) {
        match out.iter_mut().find(|(s, _)| *s == next) {
            Some(entry) => entry.1 += p,
            None => out.push((next, p)),
        }
    }
    out
}

/// Expected return of intending each action in `state` under `values`.
pub fn action_values<G: GridModel>(
    mdp: &Mdp<G>,
    values: &VTable,
    state: State,
    gamma: f64,
) -> ActionValues {
    let reward = mdp.reward(state);
    Action::ALL.map(|a| {
        let expected: f64 = next_state_distribution(mdp, state, a)
            .iter()
            .map(|(next, p)| p * next.and_then(|n| values.get(&n).copied()).unwrap_or(0.0))
            .sum();
        reward + gamma * expected
    })
}

/// Synchronous value iteration over every state of `mdp`.
///
/// A terminal state is worth its own reward: leaving it pays out and ends the episode.
pub fn value_iteration<G: GridModel>(
    mdp: &Mdp<G>,
    gamma: f64,
    tolerance: f64,
    max_iterations: u32,
) -> Result<PlanningResult, MazeError> {
    if !(0.0..=1.0).contains(&gamma) {
        return Err(MazeError::validation(format!("gamma must be in [0, 1], got {gamma}")));
    }
    if !(tolerance > 0.0) {
        return Err(MazeError::validation(format!(
            "tolerance must be positive, got {tolerance}"
        )));
    }

    let states = mdp.states();
    let mut values: VTable = states.iter().map(|&s| (s, 0.0)).collect();
    let mut iterations = 0u32;
    let mut converged = false;

    while iterations < max_iterations {
        iterations += 1;
        let mut next = values.clone();
        let mut delta = 0.0f64;

        for &s in states {
            let v = if mdp.is_terminal(s) {
                mdp.reward(s)
            } else {
                action_values(mdp, &values, s, gamma)
                    .iter()
                    .copied()
                    .fold(f64::NEG_INFINITY, f64::max)
            };
            delta = delta.max((v - values.get(&s).copied().unwrap_or(0.0)).abs());
            next.insert(s, v);
        }

        values = next;
        if delta < tolerance {
            converged = true;
            break;
        }
    }

    debug!(iterations, converged, "value iteration done");

    let policy = states
        .iter()
        .map(|&s| (s, argmax(&action_values(mdp, &values, s, gamma))))
        .collect();

    Ok(PlanningResult {
        values,
        policy,
        iterations,
        converged,
    })
}
