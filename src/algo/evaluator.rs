use log::{debug, warn};

use crate::{env::Environment, Error, Result};

use super::QTable;

/// Result of one greedy evaluation episode
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpisodeOutcome {
    pub steps_taken: u32,
    pub total_reward: f32,
    /// The total reward was strictly positive
    pub success: bool,
}

/// Greedy rollouts against a frozen [`QTable`]
///
/// The evaluator only reads the table and never explores: every action is the table's
/// best action. It works with any table, trained or not, so it does not depend on a
/// [`Trainer`](super::Trainer).
#[derive(Debug, Clone, Copy)]
pub struct Evaluator<'a> {
    table: &'a QTable,
}

impl<'a> Evaluator<'a> {
    pub fn new(table: &'a QTable) -> Self {
        Self { table }
    }

    /// Run `episode_count` greedy episodes in `env`
    ///
    /// Each episode stops when the environment terminates or truncates, or after
    /// `max_steps_per_episode` steps, whichever comes first. The cap guards against a
    /// policy that never reaches an absorbing state.
    pub fn evaluate<E: Environment>(
        &self,
        env: &mut E,
        episode_count: u32,
        max_steps_per_episode: u32,
    ) -> Result<Vec<EpisodeOutcome>> {
        let found = (env.state_count(), env.action_count());
        if found != self.table.dims() {
            return Err(Error::DimensionMismatch {
                expected: self.table.dims(),
                found,
            });
        }

        (0..episode_count)
            .map(|episode| {
                let outcome = self.rollout(env, max_steps_per_episode)?;
                debug!(
                    "evaluation episode {episode}: {} steps, reward {}, success: {}",
                    outcome.steps_taken, outcome.total_reward, outcome.success
                );
                Ok(outcome)
            })
            .collect()
    }

    fn rollout<E: Environment>(&self, env: &mut E, max_steps: u32) -> Result<EpisodeOutcome> {
        let mut state = env.reset().map_err(Error::environment)?;
        let mut total_reward = 0.0;
        let mut steps_taken = 0;

        let capped = loop {
            if steps_taken >= max_steps {
                break true;
            }

            let action = self.table.best_action(state)?;
            let transition = env.step(action).map_err(Error::environment)?;
            steps_taken += 1;
            total_reward += transition.reward;

            if transition.terminated || transition.truncated {
                break false;
            }
            state = transition.next_state;
        };

        if capped {
            warn!("evaluation episode hit the step cap of {max_steps}");
        }

        Ok(EpisodeOutcome {
            steps_taken,
            total_reward,
            success: total_reward > 0.0,
        })
    }
}
