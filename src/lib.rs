/// Tabular learners and their greedy evaluation
pub mod algo;

/// Implementations of strategies for time-decaying hyperparameters
pub mod decay;

/// Environment
pub mod env;

/// Crate error type
pub mod error;

/// Exploration policies
pub mod exploration;

/// Summaries of training and evaluation runs
pub mod stats;

/// Testing environments
#[cfg(feature = "gym")]
pub mod gym;

mod util;

pub use algo::{Evaluator, QTable, Trainer, TrainingConfig};
pub use error::{Error, Result};
