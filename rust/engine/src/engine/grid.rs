// rust/engine/src/engine/grid.rs
#![forbid(unsafe_code)]

use std::fmt;

use crate::engine::geometry::{Action, State};
use crate::error::MazeError;

/// The maze topology consumed by the MDP and RL environments.
///
/// Implementations decide which moves are physically blocked; `apply` returns the
/// unchanged state for a blocked move. Free states must be reported in a stable order.
pub trait GridModel {
    fn is_free(&self, state: State) -> bool;

    fn apply(&self, state: State, action: Action) -> State;

    fn all_free_states(&self) -> Vec<State>;

    fn designated_start(&self) -> Option<State>;

    fn goal_states(&self) -> &[State];

    fn danger_states(&self) -> &[State];

    fn is_goal(&self, state: State) -> bool {
        self.goal_states().contains(&state)
    }

    fn is_danger(&self, state: State) -> bool {
        self.danger_states().contains(&state)
    }

    fn is_terminal(&self, state: State) -> bool {
        self.is_goal(state) || self.is_danger(state)
    }
}

/// Role of a map cell; the text form uses one character per role.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Role {
    Empty,
    Wall,
    Start,
    Goal,
    Danger,
}

impl Role {
    pub fn from_char(ch: char) -> Option<Self> {
        match ch {
            '.' => Some(Role::Empty),
            '#' => Some(Role::Wall),
            'S' => Some(Role::Start),
            'G' => Some(Role::Goal),
            'D' => Some(Role::Danger),
            _ => None,
        }
    }

    pub fn glyph(self) -> char {
        match self {
            Role::Empty => '.',
            Role::Wall => '#',
            Role::Start => 'S',
            Role::Goal => 'G',
            Role::Danger => 'D',
        }
    }

    #[inline]
    pub fn is_free(self) -> bool {
        self != Role::Wall
    }

    #[inline]
    pub fn is_terminal(self) -> bool {
        matches!(self, Role::Goal | Role::Danger)
    }
}

/// Rectangular maze with row-major cell storage.
///
/// Coordinates outside the rectangle behave as walls, so the border of the map
/// blocks movement the same way an interior wall does.
#[derive(Clone, Debug, PartialEq)]
pub struct Map {
    width: usize,
    height: usize,
    roles: Vec<Role>,
    start: Option<State>,
    goals: Vec<State>,
    dangers: Vec<State>,
}

impl Map {
    /// Build a map from rows of roles. Short rows are padded with walls.
    pub fn from_roles(rows: Vec<Vec<Role>>) -> Result<Self, MazeError> {
        let height = rows.len().max(1);
        let width = rows.iter().map(Vec::len).max().unwrap_or(0).max(1);

        let mut roles = vec![Role::Wall; width * height];
        if rows.is_empty() {
            // Degenerate input: a single empty square.
            roles[0] = Role::Empty;
        }

        let mut start: Option<State> = None;
        let mut goals = Vec::new();
        let mut dangers = Vec::new();

        for (r, row) in rows.iter().enumerate() {
            for (c, &role) in row.iter().enumerate() {
                roles[r * width + c] = role;
                let pos = State::new(r as i32, c as i32);
                match role {
                    Role::Start => {
                        if let Some(first) = start {
                            return Err(MazeError::MultipleStarts { first, second: pos });
                        }
                        start = Some(pos);
                    }
                    Role::Goal => goals.push(pos),
                    Role::Danger => dangers.push(pos),
                    Role::Empty | Role::Wall => {}
                }
            }
        }

        Ok(Self {
            width,
            height,
            roles,
            start,
            goals,
            dangers,
        })
    }

    /// Parse the text form, e.g.
    ///
    /// ```text
    /// ...G
    /// .#.D
    /// S...
    /// ```
    ///
    /// Blank lines and surrounding whitespace on each row are ignored.
    pub fn from_string(input: &str) -> Result<Self, MazeError> {
        let mut rows = Vec::new();
        for line in input.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let r = rows.len();
            let mut row = Vec::with_capacity(line.len());
            for (c, ch) in line.chars().enumerate() {
                let role = Role::from_char(ch).ok_or(MazeError::MapParse { row: r, col: c, ch })?;
                row.push(role);
            }
            rows.push(row);
        }
        Self::from_roles(rows)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    fn idx(&self, state: State) -> Option<usize> {
        if state.r < 0 || state.c < 0 {
            return None;
        }
        let (r, c) = (state.r as usize, state.c as usize);
        (r < self.height && c < self.width).then(|| r * self.width + c)
    }

    /// Role at `state`; anything outside the map is a wall.
    pub fn role(&self, state: State) -> Role {
        self.idx(state).map_or(Role::Wall, |i| self.roles[i])
    }

    /// Every coordinate of the rectangle (walls included), row-major.
    pub fn all_positions(&self) -> impl Iterator<Item = State> + '_ {
        (0..self.height).flat_map(move |r| {
            (0..self.width).map(move |c| State::new(r as i32, c as i32))
        })
    }

    pub fn number_of_accessible_states(&self) -> usize {
        self.roles.iter().filter(|r| r.is_free()).count()
    }

    /// True iff moving from `state` in `action`'s direction is not blocked.
    pub fn transition_possible(&self, state: State, action: Action) -> bool {
        self.role(state).is_free() && self.role(state.offset(action)).is_free()
    }

    pub fn accessible_neighbor_states(&self, state: State) -> Vec<State> {
        Action::ALL
            .iter()
            .filter(|&&a| self.transition_possible(state, a))
            .map(|&a| state.offset(a))
            .collect()
    }
}

impl GridModel for Map {
    fn is_free(&self, state: State) -> bool {
        self.role(state).is_free()
    }

    fn apply(&self, state: State, action: Action) -> State {
        if self.transition_possible(state, action) {
            state.offset(action)
        } else {
            state
        }
    }

    fn all_free_states(&self) -> Vec<State> {
        self.all_positions().filter(|&s| self.is_free(s)).collect()
    }

    fn designated_start(&self) -> Option<State> {
        self.start
    }

    fn goal_states(&self) -> &[State] {
        &self.goals
    }

    fn danger_states(&self) -> &[State] {
        &self.dangers
    }

    fn is_goal(&self, state: State) -> bool {
        self.role(state) == Role::Goal
    }

    fn is_danger(&self, state: State) -> bool {
        self.role(state) == Role::Danger
    }
}

impl fmt::Display for Map {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for r in 0..self.height {
            if r > 0 {
                f.write_str("\n")?;
            }
            for c in 0..self.width {
                write!(f, "{}", self.roles[r * self.width + c].glyph())?;
            }
        }
        Ok(())
    }
}
