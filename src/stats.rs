use crate::algo::{EpisodeOutcome, EpisodeRecord};

/// Mean of the most recent values, over a fixed-size window
///
/// Backed by a ring buffer that overwrites the oldest value once full.
#[derive(Debug, Default, Clone)]
pub struct RollingMean {
    buffer: Vec<f32>,
    ix: usize,
    capacity: usize,
}

impl RollingMean {
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
            ix: 0,
            capacity: capacity.max(1),
        }
    }

    /// Number of values currently held
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Insert a value, overwriting the oldest one once the window is full
    pub fn push(&mut self, value: f32) {
        if self.ix >= self.buffer.len() {
            self.buffer.push(value);
        } else {
            self.buffer[self.ix] = value;
        }
        self.ix = (self.ix + 1) % self.capacity;
    }

    /// Mean of the values in the window, `0.0` when empty
    pub fn mean(&self) -> f32 {
        mean(&self.buffer)
    }
}

fn mean(values: &[f32]) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f32>() / values.len() as f32
}

fn tail<T>(items: &[T], n: usize) -> &[T] {
    &items[items.len().saturating_sub(n)..]
}

/// Aggregate view of a training run
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingSummary {
    pub episodes: usize,
    /// Mean total reward over the last 100 episodes
    pub mean_reward_last_100: f32,
    /// Mean total reward over the last 1000 episodes
    pub mean_reward_last_1000: f32,
    /// Highest total reward of any episode
    pub max_reward: f32,
    /// Fraction of the last 1000 episodes with a positive total reward
    pub success_rate_last_1000: f32,
}

impl TrainingSummary {
    pub fn from_records(records: &[EpisodeRecord]) -> Self {
        let rewards = records.iter().map(|r| r.total_reward).collect::<Vec<_>>();
        let last_1000 = tail(&rewards, 1000);
        let successes = last_1000.iter().filter(|&&r| r > 0.0).count();

        Self {
            episodes: records.len(),
            mean_reward_last_100: mean(tail(&rewards, 100)),
            mean_reward_last_1000: mean(last_1000),
            max_reward: rewards.iter().copied().fold(f32::NEG_INFINITY, f32::max),
            success_rate_last_1000: if last_1000.is_empty() {
                0.0
            } else {
                successes as f32 / last_1000.len() as f32
            },
        }
    }
}

/// Fraction of evaluation episodes that succeeded, `0.0` for none
pub fn success_rate(outcomes: &[EpisodeOutcome]) -> f32 {
    if outcomes.is_empty() {
        return 0.0;
    }
    outcomes.iter().filter(|o| o.success).count() as f32 / outcomes.len() as f32
}
