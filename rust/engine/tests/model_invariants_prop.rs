// rust/engine/tests/model_invariants_prop.rs
#![forbid(unsafe_code)]

/**
 * Property/invariant tests for the action model and the MDP core.
 *
 * Purpose:
 * - Cover generated weight tuples, maps and action sequences instead of hand-picked cases.
 * - Lock invariants that every learner and planner built on top relies on.
 *
 * Invariants covered:
 * - Stochastic `probabilities` has exactly four entries summing to 1.
 * - Deterministic `probabilities`/`sample` are the identity.
 * - Seeded `sample` frequencies follow `probabilities`.
 * - BACKWARD applied twice is the identity; rotations compose modulo 4.
 * - `reward(state)` depends on the state's role only, never on the action.
 * - `transition` probabilities sum to 1 and every target is free (or the sentinel).
 */
use maze_engine::{
    Action, ActionModel, Confusion, ConfusionWeights, GridModel, Map, Mdp, Rewards, RlProblem,
    Role, State,
};
use proptest::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;

fn action_strategy() -> impl Strategy<Value = Action> {
    (0usize..4).prop_map(Action::from_idx)
}

fn confusion_strategy() -> impl Strategy<Value = Confusion> {
    (0usize..4).prop_map(|i| Confusion::ALL[i])
}

/// Four non-negative weights normalized to sum to 1.
fn weights_strategy() -> impl Strategy<Value = ConfusionWeights> {
    (0.0f64..1.0, 0.0f64..1.0, 0.0f64..1.0, 0.01f64..1.0).prop_map(|(l, r, b, f)| {
        let total = f + l + r + b;
        ConfusionWeights::new(f / total, l / total, r / total, b / total)
    })
}

/// Small random maps; every row is padded to the same width by the parser.
fn map_strategy() -> impl Strategy<Value = Map> {
    let cell = prop::sample::select(vec!['.', '.', '.', '.', '#', 'G', 'D']);
    (1usize..5, 1usize..6)
        .prop_flat_map(move |(h, w)| {
            prop::collection::vec(cell.clone(), h * w).prop_map(move |cells| (w, cells))
        })
        .prop_map(|(w, cells)| {
            let mut rows: Vec<String> = cells
                .chunks(w)
                .map(|row| row.iter().collect())
                .collect();
            // Put the start on the top-left cell.
            rows[0].replace_range(0..1, "S");
            Map::from_string(&rows.join("\n")).expect("generated map is well formed")
        })
}

#[test]
fn backward_twice_is_identity() {
    for a in Action::ALL {
        assert_eq!(
            Confusion::Backward.apply_to(Confusion::Backward.apply_to(a)),
            a
        );
    }
}

#[test]
fn deterministic_model_is_identity() {
    let m = ActionModel::Deterministic;
    let mut rng = StdRng::seed_from_u64(20261019);
    for a in Action::ALL {
        assert_eq!(m.probabilities(a), vec![(a, 1.0)]);
        for _ in 0..16 {
            assert_eq!(m.sample(a, &mut rng), a);
        }
    }
}

#[test]
fn sample_frequencies_follow_confusion_weights() {
    const DRAWS: u32 = 100_000;
    let weights = ConfusionWeights::new(0.6, 0.1, 0.25, 0.05);
    let model = ActionModel::from_weights(Some(weights)).unwrap();
    let mut rng = StdRng::seed_from_u64(20261019);

    for intended in Action::ALL {
        let mut counts = [0u32; 4];
        for _ in 0..DRAWS {
            counts[model.sample(intended, &mut rng).idx()] += 1;
        }
        for (actual, p) in model.probabilities(intended) {
            let freq = f64::from(counts[actual.idx()]) / f64::from(DRAWS);
            assert!(
                (freq - p).abs() < 0.01,
                "intended {intended:?}, actual {actual:?}: freq {freq} vs p {p}"
            );
        }
    }

    // UP slips right to RIGHT and left to LEFT.
    let up = model.probabilities(Action::Up);
    let p = |a: Action| up.iter().find(|(x, _)| *x == a).map(|(_, p)| *p).unwrap();
    assert!((p(Action::Up) - 0.6).abs() < 1e-12);
    assert!((p(Action::Right) - 0.25).abs() < 1e-12);
    assert!((p(Action::Down) - 0.05).abs() < 1e-12);
    assert!((p(Action::Left) - 0.1).abs() < 1e-12);
}

proptest! {
    #[test]
    fn stochastic_probabilities_cover_four_rotations(
        weights in weights_strategy(),
        intended in action_strategy(),
    ) {
        let model = ActionModel::from_weights(Some(weights)).unwrap();
        let probs = model.probabilities(intended);

        prop_assert_eq!(probs.len(), 4);
        let total: f64 = probs.iter().map(|(_, p)| p).sum();
        prop_assert!((total - 1.0).abs() < 1e-9, "total = {}", total);
        prop_assert!(probs.iter().all(|(_, p)| *p >= 0.0));

        // Each actual action appears once: the four rotations are distinct.
        let mut seen = [false; 4];
        for (a, _) in &probs {
            prop_assert!(!seen[a.idx()]);
            seen[a.idx()] = true;
        }
        prop_assert_eq!(probs[0].0, intended);
    }

    #[test]
    fn stochastic_samples_only_positive_outcomes(
        weights in weights_strategy(),
        intended in action_strategy(),
        seed in any::<u64>(),
    ) {
        let model = ActionModel::from_weights(Some(weights)).unwrap();
        let probs = model.probabilities(intended);
        let mut rng = StdRng::seed_from_u64(seed);
        for _ in 0..32 {
            let actual = model.sample(intended, &mut rng);
            let p = probs.iter().find(|(a, _)| *a == actual).map(|(_, p)| *p).unwrap();
            prop_assert!(p > 0.0);
        }
    }

    #[test]
    fn rotations_compose_modulo_four(
        a in action_strategy(),
        c1 in confusion_strategy(),
        c2 in confusion_strategy(),
    ) {
        let composed = Confusion::ALL[(c1 as usize + c2 as usize) % 4];
        prop_assert_eq!(c2.apply_to(c1.apply_to(a)), composed.apply_to(a));
    }

    #[test]
    fn reward_depends_on_role_only(
        map in map_strategy(),
        a1 in action_strategy(),
        a2 in action_strategy(),
        seed in any::<u64>(),
    ) {
        let rewards = Rewards::new(2.5, -3.5, -0.25);
        let mut env = RlProblem::with_seed(map, None, rewards, seed).unwrap();
        let states = env.get_states().to_vec();

        for s in states {
            let expected = match env.mdp().grid().role(s) {
                Role::Goal => rewards.goal,
                Role::Danger => rewards.danger,
                _ => rewards.normal,
            };
            prop_assert_eq!(env.mdp().reward(s), expected);

            env.reset_with(Some(s), false).unwrap();
            let r1 = env.step(a1).unwrap().reward;
            env.reset_with(Some(s), false).unwrap();
            let r2 = env.step(a2).unwrap().reward;
            prop_assert_eq!(r1, expected);
            prop_assert_eq!(r2, expected);
        }
    }

    #[test]
    fn transitions_are_distributions_over_free_cells(
        map in map_strategy(),
        weights in weights_strategy(),
        a in action_strategy(),
    ) {
        let mdp = Mdp::new(map, Some(weights), Rewards::default()).unwrap();
        for &s in mdp.states() {
            let t = mdp.transition(s, a);
            let total: f64 = t.iter().map(|(_, p)| p).sum();
            prop_assert!((total - 1.0).abs() < 1e-9);

            if mdp.is_terminal(s) {
                prop_assert_eq!(t, vec![(None, 1.0)]);
            } else {
                prop_assert_eq!(t.len(), 4);
                for (next, _) in t {
                    let next: State = next.unwrap();
                    prop_assert!(mdp.grid().is_free(next));
                    prop_assert!(mdp.contains(next));
                }
            }
        }
    }

    #[test]
    fn states_partition_into_terminal_and_non_terminal(map in map_strategy()) {
        let mdp = Mdp::new(map, None, Rewards::default()).unwrap();
        let non_terminal = mdp.non_terminal_states();
        let terminal = mdp.states().iter().filter(|&&s| mdp.is_terminal(s)).count();
        prop_assert_eq!(non_terminal.len() + terminal, mdp.states().len());
        prop_assert!(non_terminal.iter().all(|s| !mdp.is_terminal(*s)));
        prop_assert_eq!(mdp.states().len(), mdp.grid().number_of_accessible_states());
    }
}
