use rand::Rng;

use crate::{
    algo::QTable,
    decay::Decay,
    env::{Action, State},
    Result,
};

use super::Choice;

/// Epsilon greedy exploration policy with time-decaying epsilon threshold
///
/// Epsilon is a pure function of the episode index, so it can be recomputed from the
/// episode count and the decay strategy alone. The random source is always supplied by
/// the caller, which keeps action selection reproducible under a fixed seed.
#[derive(Debug, Clone)]
pub struct EpsilonGreedy<D: Decay> {
    epsilon: D,
}

impl<D: Decay> EpsilonGreedy<D> {
    /// Initialize epsilon greedy policy with a decay strategy
    pub fn new(decay: D) -> Self {
        Self { epsilon: decay }
    }

    /// Exploration probability for the given episode
    pub fn epsilon(&self, episode: u32) -> f32 {
        self.epsilon.evaluate(episode as f32).max(0.0)
    }

    /// Decide between exploring and exploiting, drawing one uniform number from `rng`
    pub fn choose<R: Rng + ?Sized>(&self, epsilon: f32, rng: &mut R) -> Choice {
        if rng.gen::<f32>() < epsilon {
            Choice::Explore
        } else {
            Choice::Exploit
        }
    }

    /// Pick an action for `state`
    ///
    /// With probability `epsilon` this is uniform over the whole action space, otherwise
    /// it is the table's [best action](QTable::best_action).
    pub fn select<R: Rng + ?Sized>(
        &self,
        table: &QTable,
        state: State,
        epsilon: f32,
        rng: &mut R,
    ) -> Result<Action> {
        match self.choose(epsilon, rng) {
            Choice::Explore => Ok(rng.gen_range(0..table.n_actions())),
            Choice::Exploit => table.best_action(state),
        }
    }
}
