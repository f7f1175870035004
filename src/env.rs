/// A state of a discrete environment, as an index in `[0, state_count)`
pub type State = usize;

/// An action of a discrete environment, as an index in `[0, action_count)`
pub type Action = usize;

/// The result of a single environment step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transition {
    /// The state after the action is taken
    pub next_state: State,
    /// The reward received for the action
    pub reward: f32,
    /// The episode ended naturally (goal reached or absorbing failure state)
    pub terminated: bool,
    /// The episode was cut off externally, e.g. by a step limit
    pub truncated: bool,
}

impl Transition {
    /// Whether this transition ends the episode, for either reason
    pub fn is_done(&self) -> bool {
        self.terminated || self.truncated
    }
}

/// Represents a Markov decision process, defining the dynamics of an environment
/// in which an agent can operate.
///
/// States and actions are dense indices, so the environment must be discrete and fully
/// observable. `state_count` and `action_count` are queried once at setup and must not change.
pub trait Environment {
    /// The error produced when the environment fails. Use
    /// [`Infallible`](std::convert::Infallible) for environments that cannot fail.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Number of distinct states
    fn state_count(&self) -> usize;

    /// Number of distinct actions, all of which are available in every state
    fn action_count(&self) -> usize;

    /// Reset the environment to an initial state
    ///
    /// **Returns** the state
    fn reset(&mut self) -> Result<State, Self::Error>;

    /// Update the environment in response to an action taken by an agent
    fn step(&mut self, action: Action) -> Result<Transition, Self::Error>;
}
