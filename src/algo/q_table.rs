use std::fmt;

use crate::{
    env::{Action, State},
    error::IndexKind,
    Error, Result,
};

/// A dense table of state-action value estimates
///
/// The table has `n_states * n_actions` entries stored row by row, all starting at `0.0`.
/// Its dimensions are fixed at construction, so every state-action pair always has a value.
///
/// [`update`](QTable::update) is the only way to change an entry.
#[derive(Debug, Clone, PartialEq)]
pub struct QTable {
    values: Vec<f32>,
    n_states: usize,
    n_actions: usize,
}

impl QTable {
    /// Create a zeroed table
    ///
    /// **Errors** if either dimension is zero
    pub fn new(n_states: usize, n_actions: usize) -> Result<Self> {
        if n_states == 0 || n_actions == 0 {
            return Err(Error::Config(format!(
                "Q-table dimensions must be non-zero, got {n_states} states and {n_actions} actions"
            )));
        }

        Ok(Self {
            values: vec![0.0; n_states * n_actions],
            n_states,
            n_actions,
        })
    }

    pub fn n_states(&self) -> usize {
        self.n_states
    }

    pub fn n_actions(&self) -> usize {
        self.n_actions
    }

    /// `(n_states, n_actions)`
    pub fn dims(&self) -> (usize, usize) {
        (self.n_states, self.n_actions)
    }

    /// All values, row by row
    pub fn as_slice(&self) -> &[f32] {
        &self.values
    }

    fn check_state(&self, state: State) -> Result<()> {
        (state < self.n_states).then_some(()).ok_or(Error::OutOfRange {
            kind: IndexKind::State,
            index: state,
            bound: self.n_states,
        })
    }

    fn check_action(&self, action: Action) -> Result<()> {
        (action < self.n_actions)
            .then_some(())
            .ok_or(Error::OutOfRange {
                kind: IndexKind::Action,
                index: action,
                bound: self.n_actions,
            })
    }

    fn index(&self, state: State, action: Action) -> Result<usize> {
        self.check_state(state)?;
        self.check_action(action)?;
        Ok(state * self.n_actions + action)
    }

    /// The current estimate for taking `action` in `state`
    pub fn value(&self, state: State, action: Action) -> Result<f32> {
        self.index(state, action).map(|ix| self.values[ix])
    }

    /// The values of every action in `state`
    pub fn row(&self, state: State) -> Result<&[f32]> {
        self.check_state(state)?;
        let start = state * self.n_actions;
        Ok(&self.values[start..start + self.n_actions])
    }

    /// The largest action value in `state`
    pub fn max_value(&self, state: State) -> Result<f32> {
        let row = self.row(state)?;
        Ok(row.iter().copied().fold(f32::NEG_INFINITY, f32::max))
    }

    /// The action with the largest value in `state`
    ///
    /// Ties go to the lowest action index.
    pub fn best_action(&self, state: State) -> Result<Action> {
        self.row(state).map(argmax)
    }

    /// The Bellman optimality target for a transition
    ///
    /// `reward + gamma * max_a' Q(next_state, a')`, or just `reward` if the transition
    /// terminated, since nothing follows an absorbing state.
    pub fn target(&self, reward: f32, next_state: State, terminated: bool, gamma: f32) -> Result<f32> {
        let bootstrap = self.max_value(next_state)?;
        Ok(if terminated {
            reward
        } else {
            reward + gamma * bootstrap
        })
    }

    /// Move the entry for `(state, action)` towards `target` by a step of size `alpha`
    ///
    /// Q(s,a) ← Q(s,a) + α(target - Q(s,a))
    pub fn update(&mut self, state: State, action: Action, target: f32, alpha: f32) -> Result<()> {
        let ix = self.index(state, action)?;
        let old = self.values[ix];
        self.values[ix] = old + alpha * (target - old);
        Ok(())
    }

    /// The best action for every state
    pub fn greedy_policy(&self) -> Vec<Action> {
        self.values.chunks_exact(self.n_actions).map(argmax).collect()
    }
}

/// Index of the largest value, preferring the lowest index on ties
fn argmax(row: &[f32]) -> Action {
    row.iter()
        .enumerate()
        .skip(1)
        .fold((0, row[0]), |(best, best_value), (action, &value)| {
            if value > best_value {
                (action, value)
            } else {
                (best, best_value)
            }
        })
        .0
}

impl fmt::Display for QTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "state")?;
        for action in 0..self.n_actions {
            write!(f, " | {:>6}", format!("a{action}"))?;
        }
        writeln!(f)?;

        for (state, row) in self.values.chunks_exact(self.n_actions).enumerate() {
            write!(f, "{state:5}")?;
            for value in row {
                write!(f, " | {value:6.3}")?;
            }
            writeln!(f)?;
        }

        Ok(())
    }
}
