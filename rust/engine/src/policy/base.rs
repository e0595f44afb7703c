// rust/engine/src/policy/base.rs
#![forbid(unsafe_code)]

use crate::engine::{Action, State};

/// Policy chooses the intended action for the current state.
///
/// Object-safe so it can be used as `Box<dyn Policy>`.
pub trait Policy {
    fn choose_action(&mut self, state: State) -> Action;
}
