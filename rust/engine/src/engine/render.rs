// rust/engine/src/engine/render.rs
#![forbid(unsafe_code)]

use rustc_hash::FxHashMap;

use crate::engine::geometry::{Action, State};
use crate::engine::grid::{Map, Role};

fn framed(map: &Map, mut cell: impl FnMut(State) -> String) -> String {
    let inner: usize = (0..map.width())
        .map(|c| cell(State::new(0, c as i32)).chars().count())
        .sum();
    let border = format!("+{}+\n", "-".repeat(inner));

    let mut s = String::new();
    s.push_str(&border);
    for r in 0..map.height() {
        s.push('|');
        for c in 0..map.width() {
            s.push_str(&cell(State::new(r as i32, c as i32)));
        }
        s.push_str("|\n");
    }
    s.push_str(&border);
    s
}

/// Map with the agent (`@`) and the visited path (`*`) overlaid.
pub fn render_ascii(map: &Map, agent: Option<State>, path: &[State]) -> String {
    framed(map, |s| {
        let role = map.role(s);
        let ch = if Some(s) == agent {
            '@'
        } else if role == Role::Empty && path.contains(&s) {
            '*'
        } else {
            role.glyph()
        };
        ch.to_string()
    })
}

/// Map with one arrow per non-terminal free cell.
pub fn render_policy_ascii(map: &Map, policy: &FxHashMap<State, Action>) -> String {
    framed(map, |s| {
        let role = map.role(s);
        let ch = match policy.get(&s) {
            Some(a) if role.is_free() && !role.is_terminal() => a.glyph(),
            _ => role.glyph(),
        };
        ch.to_string()
    })
}

/// Fixed-width value grid; walls and states without a value are blank.
pub fn render_values_ascii(map: &Map, values: &FxHashMap<State, f64>) -> String {
    framed(map, |s| match values.get(&s) {
        Some(v) if map.role(s).is_free() => format!("{v:>8.3}"),
        _ if map.role(s) == Role::Wall => format!("{:>8}", "####"),
        _ => format!("{:>8}", ""),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policy_arrows_skip_terminals_and_walls() {
        let map = Map::from_string("S.G\n.#D").unwrap();
        let mut policy = FxHashMap::default();
        for s in [State::new(0, 0), State::new(0, 1), State::new(0, 2), State::new(1, 0)] {
            policy.insert(s, Action::Right);
        }
        let out = render_policy_ascii(&map, &policy);
        assert_eq!(out, "+---+\n|>>G|\n|>#D|\n+---+\n");
    }

    #[test]
    fn agent_and_path_overlay() {
        let map = Map::from_string("S..G").unwrap();
        let path = [State::new(0, 0), State::new(0, 1), State::new(0, 2)];
        let out = render_ascii(&map, Some(State::new(0, 2)), &path);
        assert_eq!(out, "+----+\n|S*@G|\n+----+\n");
    }

    #[test]
    fn values_are_fixed_width() {
        let map = Map::from_string("S#").unwrap();
        let mut values = FxHashMap::default();
        values.insert(State::new(0, 0), 0.5);
        let out = render_values_ascii(&map, &values);
        assert_eq!(out, "+----------------+\n|   0.500    ####|\n+----------------+\n");
    }
}
