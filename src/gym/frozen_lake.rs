use strum::{FromRepr, VariantArray};
use thiserror::Error;

use crate::env::{Action, Environment, State, Transition};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Square {
    Start,
    Frozen,
    Hole,
    Goal,
}

impl TryFrom<char> for Square {
    type Error = FrozenLakeError;

    fn try_from(value: char) -> Result<Self, Self::Error> {
        match value {
            'S' => Ok(Self::Start),
            'F' => Ok(Self::Frozen),
            'H' => Ok(Self::Hole),
            'G' => Ok(Self::Goal),
            c => Err(FrozenLakeError::UnknownSquare(c)),
        }
    }
}

/// Actions for the [`FrozenLake`] environment, in gymnasium's order
#[derive(FromRepr, VariantArray, Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum FLAction {
    Left = 0,
    Down = 1,
    Right = 2,
    Up = 3,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FrozenLakeError {
    #[error("invalid action {0}, must be less than 4")]
    InvalidAction(usize),
    #[error("unknown map square {0:?}, expected one of S, F, H, G")]
    UnknownSquare(char),
    #[error("map must be a non-empty rectangle")]
    Ragged,
    #[error("map must have exactly one start square, found {0}")]
    Start(usize),
}

/// The 4x4 map used by gymnasium's `FrozenLake-v1`
pub const MAP_4X4: [&str; 4] = ["SFFF", "FHFH", "FFFH", "HFFG"];

/// Default step limit, matching gymnasium's 4x4 time limit
pub const DEFAULT_STEP_LIMIT: u32 = 100;

/// A very simple RL environment taken from Python [gymnasium](https://gymnasium.farama.org/)
///
/// This is the deterministic (non-slippery) variant: the agent always moves where it is told,
/// and stays in place when it walks into the edge of the map. Falling into a hole or reaching
/// the goal terminates the episode; only the goal gives a reward, of `1.0`. Episodes are
/// truncated after a step limit.
///
/// States are map positions, numbered row by row.
#[derive(Debug, Clone)]
pub struct FrozenLake {
    map: Vec<Square>,
    ncol: usize,
    start: usize,
    pos: usize,
    steps: u32,
    step_limit: u32,
}

impl FrozenLake {
    /// The 4x4 map with a step limit of 100
    pub fn new() -> Self {
        Self::from_rows(&MAP_4X4).expect("the built-in map is valid")
    }

    /// Build a lake from rows of `S`, `F`, `H` and `G` squares
    pub fn from_rows<S: AsRef<str>>(rows: &[S]) -> Result<Self, FrozenLakeError> {
        let ncol = rows.first().map_or(0, |r| r.as_ref().chars().count());
        if ncol == 0 || rows.iter().any(|r| r.as_ref().chars().count() != ncol) {
            return Err(FrozenLakeError::Ragged);
        }

        let map = rows
            .iter()
            .flat_map(|r| r.as_ref().chars())
            .map(Square::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        let starts = map
            .iter()
            .enumerate()
            .filter(|(_, &s)| s == Square::Start)
            .map(|(i, _)| i)
            .collect::<Vec<_>>();
        let [start] = starts[..] else {
            return Err(FrozenLakeError::Start(starts.len()));
        };

        Ok(Self {
            map,
            ncol,
            start,
            pos: start,
            steps: 0,
            step_limit: DEFAULT_STEP_LIMIT,
        })
    }

    /// Set the number of steps after which an episode is truncated
    pub fn with_step_limit(mut self, step_limit: u32) -> Self {
        self.step_limit = step_limit;
        self
    }

    pub fn nrow(&self) -> usize {
        self.map.len() / self.ncol
    }

    pub fn ncol(&self) -> usize {
        self.ncol
    }

    /// Current position
    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn square(&self, state: State) -> Option<Square> {
        self.map.get(state).copied()
    }

    fn moved(&self, action: FLAction) -> usize {
        let (row, col) = (self.pos / self.ncol, self.pos % self.ncol);
        let (row, col) = match action {
            FLAction::Left => (row, col.saturating_sub(1)),
            FLAction::Down => ((row + 1).min(self.nrow() - 1), col),
            FLAction::Right => (row, (col + 1).min(self.ncol - 1)),
            FLAction::Up => (row.saturating_sub(1), col),
        };
        row * self.ncol + col
    }
}

impl Default for FrozenLake {
    fn default() -> Self {
        Self::new()
    }
}

impl Environment for FrozenLake {
    type Error = FrozenLakeError;

    fn state_count(&self) -> usize {
        self.map.len()
    }

    fn action_count(&self) -> usize {
        FLAction::VARIANTS.len()
    }

    fn reset(&mut self) -> Result<State, Self::Error> {
        self.pos = self.start;
        self.steps = 0;
        Ok(self.pos)
    }

    fn step(&mut self, action: Action) -> Result<Transition, Self::Error> {
        let action = FLAction::from_repr(action).ok_or(FrozenLakeError::InvalidAction(action))?;

        self.steps += 1;
        self.pos = self.moved(action);

        let square = self.map[self.pos];
        let terminated = matches!(square, Square::Hole | Square::Goal);
        Ok(Transition {
            next_state: self.pos,
            reward: if square == Square::Goal { 1.0 } else { 0.0 },
            terminated,
            truncated: !terminated && self.steps >= self.step_limit,
        })
    }
}
