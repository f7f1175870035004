pub mod evaluator;
pub mod q_table;
pub mod trainer;

pub use evaluator::{EpisodeOutcome, Evaluator};
pub use q_table::QTable;
pub use trainer::{EpisodeEnd, EpisodeRecord, EpsilonDecay, Trainer, TrainingConfig};
