// rust/engine/src/engine/geometry.rs
#![forbid(unsafe_code)]

use std::fmt;

use crate::engine::constants::ACTION_DIM;

/// A maze coordinate `(r, c)`: row grows downwards, column grows to the right.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct State {
    pub r: i32,
    pub c: i32,
}

impl State {
    #[inline]
    pub const fn new(r: i32, c: i32) -> Self {
        Self { r, c }
    }

    /// Coordinate reached by moving one cell in `action`'s direction (no wall checks).
    #[inline]
    pub fn offset(self, action: Action) -> Self {
        let (dr, dc) = action.delta();
        Self::new(self.r + dr, self.c + dc)
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S({},{})", self.r, self.c)
    }
}

/// Movement action. The discriminant order (0..3) is the rotation order used by [`Confusion`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Action {
    Up = 0,
    Right = 1,
    Down = 2,
    Left = 3,
}

impl Action {
    pub const ALL: [Action; ACTION_DIM] = [Action::Up, Action::Right, Action::Down, Action::Left];

    #[inline]
    pub fn idx(self) -> usize {
        self as usize
    }

    /// Inverse of [`Action::idx`], taken modulo 4.
    #[inline]
    pub fn from_idx(i: usize) -> Self {
        Self::ALL[i % ACTION_DIM]
    }

    /// `(dr, dc)` coordinate delta.
    #[inline]
    pub fn delta(self) -> (i32, i32) {
        match self {
            Action::Up => (-1, 0),
            Action::Right => (0, 1),
            Action::Down => (1, 0),
            Action::Left => (0, -1),
        }
    }

    pub fn glyph(self) -> char {
        match self {
            Action::Up => '^',
            Action::Right => '>',
            Action::Down => 'v',
            Action::Left => '<',
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Action::Up => "UP",
            Action::Right => "RIGHT",
            Action::Down => "DOWN",
            Action::Left => "LEFT",
        };
        f.write_str(name)
    }
}

/// Rotation of the intended action, relative to the direction the agent wanted to go.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Confusion {
    None = 0,
    Right = 1,
    Backward = 2,
    Left = 3,
}

impl Confusion {
    pub const ALL: [Confusion; ACTION_DIM] = [
        Confusion::None,
        Confusion::Right,
        Confusion::Backward,
        Confusion::Left,
    ];

    /// Action actually executed when `self` hits an intended `action` (modulo-4 rotation).
    #[inline]
    pub fn apply_to(self, action: Action) -> Action {
        Action::from_idx(action.idx() + self as usize)
    }
}
