use std::fmt;

use thiserror::Error;

/// Boxed error produced by an [`Environment`](crate::env::Environment)
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub type Result<T> = std::result::Result<T, Error>;

/// Which index of the table was out of range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexKind {
    State,
    Action,
}

impl fmt::Display for IndexKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::State => f.write_str("state"),
            Self::Action => f.write_str("action"),
        }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    /// An invalid hyperparameter or table dimension, raised at construction
    #[error("invalid configuration: {0}")]
    Config(String),

    /// A state or action outside the table's dimensions
    #[error("{kind} index {index} out of range (must be less than {bound})")]
    OutOfRange {
        kind: IndexKind,
        index: usize,
        bound: usize,
    },

    /// An environment whose state/action counts differ from the table's
    #[error("environment has {found:?} (states, actions) but the table has {expected:?}")]
    DimensionMismatch {
        expected: (usize, usize),
        found: (usize, usize),
    },

    /// A failure reported by the environment itself, passed through as is
    #[error(transparent)]
    Environment(BoxError),
}

impl Error {
    pub(crate) fn environment<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Environment(Box::new(err))
    }
}
