// rust/engine/src/engine/confusion.rs
#![forbid(unsafe_code)]

use rand::Rng;
use rand::distributions::{Distribution, WeightedIndex};

use crate::engine::constants::{ACTION_DIM, WEIGHT_TOLERANCE};
use crate::engine::geometry::{Action, Confusion};
use crate::error::MazeError;

/// Distribution over actually executed actions, in [`Confusion`] order.
pub type ActionDistribution = Vec<(Action, f64)>;

/// Probabilities of executing the intended action or one of its rotations.
///
/// The four weights must be non-negative and sum to 1.0 (within 1e-6).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ConfusionWeights {
    pub forward: f64,
    pub left: f64,
    pub right: f64,
    pub backward: f64,
}

impl ConfusionWeights {
    pub fn new(forward: f64, left: f64, right: f64, backward: f64) -> Self {
        Self {
            forward,
            left,
            right,
            backward,
        }
    }

    pub fn deterministic() -> Self {
        Self::new(1.0, 0.0, 0.0, 0.0)
    }

    pub fn total(&self) -> f64 {
        self.forward + self.left + self.right + self.backward
    }
}

impl Default for ConfusionWeights {
    fn default() -> Self {
        Self::deterministic()
    }
}

/// Stochastic action model: the agent sometimes slips left, right or backwards.
#[derive(Clone, Debug)]
pub struct StochasticActions {
    /// Indexed by `Confusion as usize`.
    probs: [f64; ACTION_DIM],
    sampler: WeightedIndex<f64>,
}

impl StochasticActions {
    pub fn new(weights: ConfusionWeights) -> Result<Self, MazeError> {
        let ConfusionWeights {
            forward,
            left,
            right,
            backward,
        } = weights;
        if [forward, left, right, backward]
            .iter()
            .any(|w| !w.is_finite() || *w < 0.0)
        {
            return Err(MazeError::validation(format!(
                "confusion weights must be finite and non-negative: {weights:?}"
            )));
        }

        let total = weights.total();
        if (1.0 - total).abs() >= WEIGHT_TOLERANCE {
            return Err(MazeError::validation(format!(
                "sum of confusion probabilities must be 1.0, got {total}"
            )));
        }

        // Renormalize; forward absorbs the rounding drift.
        let (left, right, backward) = (left / total, right / total, backward / total);
        let forward = (1.0 - left - right - backward).max(0.0);

        let mut probs = [0.0; ACTION_DIM];
        probs[Confusion::None as usize] = forward;
        probs[Confusion::Right as usize] = right;
        probs[Confusion::Backward as usize] = backward;
        probs[Confusion::Left as usize] = left;

        let sampler = WeightedIndex::new(probs)
            .map_err(|e| MazeError::validation(format!("confusion weights: {e}")))?;

        Ok(Self { probs, sampler })
    }

    pub fn confusion_probs(&self) -> [(Confusion, f64); ACTION_DIM] {
        Confusion::ALL.map(|c| (c, self.probs[c as usize]))
    }

    pub fn sample_confusion<R: Rng + ?Sized>(&self, rng: &mut R) -> Confusion {
        Confusion::ALL[self.sampler.sample(rng)]
    }
}

/// Maps an intended action to the distribution of actually executed actions.
#[derive(Clone, Debug, Default)]
pub enum ActionModel {
    #[default]
    Deterministic,
    Stochastic(StochasticActions),
}

impl ActionModel {
    /// `None` selects deterministic actions.
    pub fn from_weights(weights: Option<ConfusionWeights>) -> Result<Self, MazeError> {
        match weights {
            None => Ok(Self::Deterministic),
            Some(w) => Ok(Self::Stochastic(StochasticActions::new(w)?)),
        }
    }

    pub fn is_deterministic(&self) -> bool {
        matches!(self, Self::Deterministic)
    }

    /// Actually executed actions with their probabilities.
    ///
    /// Deterministic: exactly `[(intended, 1.0)]`. Stochastic: one entry per confusion.
    pub fn probabilities(&self, intended: Action) -> ActionDistribution {
        match self {
            Self::Deterministic => vec![(intended, 1.0)],
            Self::Stochastic(s) => s
                .confusion_probs()
                .iter()
                .map(|&(c, p)| (c.apply_to(intended), p))
                .collect(),
        }
    }

    /// Draw one actually executed action.
    pub fn sample<R: Rng + ?Sized>(&self, intended: Action, rng: &mut R) -> Action {
        match self {
            Self::Deterministic => intended,
            Self::Stochastic(s) => s.sample_confusion(rng).apply_to(intended),
        }
    }
}
