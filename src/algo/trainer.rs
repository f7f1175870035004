use log::{debug, info, trace};
use rand::Rng;

use crate::{
    decay,
    ensure_interval,
    env::Environment,
    exploration::EpsilonGreedy,
    stats::RollingMean,
    Error, Result,
};

use super::QTable;

/// Number of recent episodes averaged in progress logs
const PROGRESS_WINDOW: usize = 100;

/// Shape of the epsilon schedule
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EpsilonDecay {
    /// ε(n) = max(ε<sub>min</sub>, ε<sub>start</sub> - n * step)
    #[default]
    Linear,
    /// ε(n) = ε<sub>min</sub> + (ε<sub>start</sub> - ε<sub>min</sub>) * e<sup>-step * n</sup>
    Exponential,
}

/// Configuration for the [`Trainer`]
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingConfig {
    /// Number of episodes to train for. There is no early stopping.
    ///
    /// **Default**: `20000`
    pub episode_count: u32,
    /// The learning rate α, in `(0, 1]`
    ///
    /// **Default**: `0.1`
    pub learning_rate: f32,
    /// The discount factor γ, in `[0, 1]`
    ///
    /// **Default**: `0.99`
    pub discount_factor: f32,
    /// Exploration probability for the first episode, in `[0, 1]`
    ///
    /// **Default**: `1.0`
    pub epsilon_start: f32,
    /// Lowest exploration probability, in `[0, epsilon_start]`
    ///
    /// **Default**: `0.01`
    pub epsilon_min: f32,
    /// Per-episode decrement for [`EpsilonDecay::Linear`], or the rate for
    /// [`EpsilonDecay::Exponential`]
    ///
    /// **Default**: `0.0001`
    pub epsilon_decay_step: f32,
    /// **Default**: [`EpsilonDecay::Linear`]
    pub epsilon_decay: EpsilonDecay,
    /// Log progress every this many episodes, `0` to disable
    ///
    /// **Default**: `1000`
    pub log_interval: u32,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            episode_count: 20_000,
            learning_rate: 0.1,
            discount_factor: 0.99,
            epsilon_start: 1.0,
            epsilon_min: 0.01,
            epsilon_decay_step: 0.0001,
            epsilon_decay: EpsilonDecay::Linear,
            log_interval: 1000,
        }
    }
}

impl TrainingConfig {
    /// Check every hyperparameter range
    pub fn validate(&self) -> Result<()> {
        let &Self {
            learning_rate,
            discount_factor,
            epsilon_start,
            epsilon_min,
            epsilon_decay_step,
            ..
        } = self;

        ensure_interval!(learning_rate, 0.0, 1.0);
        if learning_rate == 0.0 {
            return Err(Error::Config(String::from(
                "Invalid value for `learning_rate`. Must be in the interval (0, 1].",
            )));
        }
        ensure_interval!(discount_factor, 0.0, 1.0);
        ensure_interval!(epsilon_start, 0.0, 1.0);
        ensure_interval!(epsilon_min, 0.0, epsilon_start);
        ensure_interval!(epsilon_decay_step, 0.0, f32::MAX);
        Ok(())
    }

    /// The decay strategy described by this configuration
    ///
    /// A zero decay step keeps epsilon at `epsilon_start` for the whole run.
    pub fn schedule(&self) -> Result<decay::Schedule> {
        let &Self {
            epsilon_start: vi,
            epsilon_min: vf,
            epsilon_decay_step: rate,
            ..
        } = self;
        if rate == 0.0 {
            return Ok(decay::Schedule::Constant(decay::Constant::new(vi)));
        }
        Ok(match self.epsilon_decay {
            EpsilonDecay::Linear => decay::Schedule::Linear(decay::Linear::new(rate, vi, vf)?),
            EpsilonDecay::Exponential => {
                decay::Schedule::Exponential(decay::Exponential::new(rate, vi, vf)?)
            }
        })
    }
}

/// How an episode came to an end
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EpisodeEnd {
    /// The environment reached an absorbing state
    Terminated,
    /// The environment cut the episode off
    Truncated,
}

/// Bookkeeping for one completed training episode
#[derive(Debug, Clone, PartialEq)]
pub struct EpisodeRecord {
    /// Zero-based episode index
    pub episode: u32,
    /// Sum of rewards received during the episode
    pub total_reward: f32,
    /// Epsilon after the schedule advanced past this episode
    pub epsilon: f32,
    pub steps: u32,
    pub end: EpisodeEnd,
}

/// Q-learning trainer
///
/// Owns the [`QTable`] for the whole run and updates it after every environment step with
/// the Bellman optimality rule. Exploration is epsilon-greedy, with epsilon fixed for the
/// duration of an episode and advanced once the episode ends.
///
/// The trainer does not hold the environment or the random source. Both are passed to
/// [`train`](Trainer::train) so that a seeded generator gives a reproducible run.
#[derive(Debug, Clone)]
pub struct Trainer {
    config: TrainingConfig,
    table: QTable,
    exploration: EpsilonGreedy<decay::Schedule>,
    records: Vec<EpisodeRecord>,
    recent_rewards: RollingMean,
    episode: u32,
}

impl Trainer {
    /// Initialize a trainer with a zeroed table sized for `env`
    ///
    /// **Errors** if the configuration is invalid or the environment has no states or actions
    pub fn new<E: Environment>(config: TrainingConfig, env: &E) -> Result<Self> {
        config.validate()?;
        let exploration = EpsilonGreedy::new(config.schedule()?);
        let table = QTable::new(env.state_count(), env.action_count())?;

        debug!(
            "trainer ready: {} states, {} actions, {:?}",
            table.n_states(),
            table.n_actions(),
            config
        );

        Ok(Self {
            records: Vec::new(),
            recent_rewards: RollingMean::new(PROGRESS_WINDOW),
            config,
            table,
            exploration,
            episode: 0,
        })
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    pub fn q_table(&self) -> &QTable {
        &self.table
    }

    /// Records of every completed episode, in order
    pub fn records(&self) -> &[EpisodeRecord] {
        &self.records
    }

    /// Number of completed episodes
    pub fn episode(&self) -> u32 {
        self.episode
    }

    /// Epsilon for the next episode
    pub fn epsilon(&self) -> f32 {
        self.exploration.epsilon(self.episode)
    }

    pub fn is_finished(&self) -> bool {
        self.episode >= self.config.episode_count
    }

    /// Take the learned table and the episode records
    pub fn into_parts(self) -> (QTable, Vec<EpisodeRecord>) {
        (self.table, self.records)
    }

    /// Run a single episode from reset until the environment terminates or truncates
    pub fn run_episode<E, R>(&mut self, env: &mut E, rng: &mut R) -> Result<&EpisodeRecord>
    where
        E: Environment,
        R: Rng + ?Sized,
    {
        self.check_env(env)?;

        let epsilon = self.exploration.epsilon(self.episode);
        let alpha = self.config.learning_rate;
        let gamma = self.config.discount_factor;

        let mut state = env.reset().map_err(Error::environment)?;
        let mut total_reward = 0.0;
        let mut steps = 0;

        let end = loop {
            let action = self.exploration.select(&self.table, state, epsilon, rng)?;
            let transition = env.step(action).map_err(Error::environment)?;
            steps += 1;
            total_reward += transition.reward;

            let target = self.table.target(
                transition.reward,
                transition.next_state,
                transition.terminated,
                gamma,
            )?;
            self.table.update(state, action, target, alpha)?;
            trace!(
                "episode {} step {steps}: s={state} a={action} r={} s'={}",
                self.episode,
                transition.reward,
                transition.next_state
            );

            if transition.terminated {
                break EpisodeEnd::Terminated;
            }
            if transition.truncated {
                break EpisodeEnd::Truncated;
            }
            state = transition.next_state;
        };

        let episode = self.episode;
        self.episode += 1;
        self.recent_rewards.push(total_reward);
        let ix = self.records.len();
        self.records.push(EpisodeRecord {
            episode,
            total_reward,
            epsilon: self.exploration.epsilon(self.episode),
            steps,
            end,
        });

        let interval = self.config.log_interval;
        if interval > 0 && self.episode % interval == 0 {
            info!(
                "episode {}/{}, mean reward (last {}): {:.2}, epsilon: {:.4}",
                self.episode,
                self.config.episode_count,
                self.recent_rewards.len(),
                self.recent_rewards.mean(),
                self.epsilon()
            );
        }

        Ok(&self.records[ix])
    }

    /// Run the remaining episodes up to the configured episode count
    ///
    /// A trainer that already ran some episodes picks up where it stopped.
    pub fn train<E, R>(&mut self, env: &mut E, rng: &mut R) -> Result<&[EpisodeRecord]>
    where
        E: Environment,
        R: Rng + ?Sized,
    {
        while !self.is_finished() {
            self.run_episode(env, rng)?;
        }

        info!(
            "training finished after {} episodes, mean reward (last {}): {:.2}",
            self.episode,
            self.recent_rewards.len(),
            self.recent_rewards.mean()
        );
        Ok(&self.records)
    }

    /// [`train`](Trainer::train) with the thread-local generator, seeded from the OS
    ///
    /// Runs are not reproducible; pass a seeded generator to `train` for that.
    pub fn train_unseeded<E: Environment>(&mut self, env: &mut E) -> Result<&[EpisodeRecord]> {
        self.train(env, &mut rand::thread_rng())
    }

    fn check_env<E: Environment>(&self, env: &E) -> Result<()> {
        let found = (env.state_count(), env.action_count());
        if found != self.table.dims() {
            return Err(Error::DimensionMismatch {
                expected: self.table.dims(),
                found,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, SeedableRng};

    use super::*;
    use crate::env::tests::{BrokenEnv, Corridor, LoopEnv, SensorOffline};

    fn config(episode_count: u32) -> TrainingConfig {
        TrainingConfig {
            episode_count,
            learning_rate: 0.5,
            discount_factor: 0.9,
            epsilon_start: 1.0,
            epsilon_min: 0.05,
            epsilon_decay_step: 0.01,
            epsilon_decay: EpsilonDecay::Linear,
            log_interval: 0,
        }
    }

    #[test]
    fn invalid_config_rejected() {
        let env = LoopEnv::new(10);
        let bad = [
            TrainingConfig {
                learning_rate: 0.0,
                ..config(1)
            },
            TrainingConfig {
                learning_rate: 1.5,
                ..config(1)
            },
            TrainingConfig {
                discount_factor: -0.1,
                ..config(1)
            },
            TrainingConfig {
                epsilon_start: 0.1,
                epsilon_min: 0.2,
                ..config(1)
            },
            TrainingConfig {
                epsilon_decay_step: -1.0,
                ..config(1)
            },
            TrainingConfig {
                discount_factor: f32::NAN,
                ..config(1)
            },
        ];
        for config in bad {
            assert!(
                matches!(Trainer::new(config.clone(), &env), Err(Error::Config(_))),
                "{config:?} rejected"
            );
        }

        assert!(Trainer::new(TrainingConfig::default(), &env).is_ok());
        assert!(Trainer::new(
            TrainingConfig {
                learning_rate: 1.0,
                discount_factor: 0.0,
                epsilon_start: 0.0,
                epsilon_min: 0.0,
                ..config(1)
            },
            &env
        )
        .is_ok());
    }

    #[test]
    fn one_episode_single_terminating_step() {
        let mut env = LoopEnv::new(1000);
        let mut trainer = Trainer::new(config(1), &env).unwrap();
        let mut rng = StdRng::seed_from_u64(42);

        let record = trainer.run_episode(&mut env, &mut rng).unwrap().clone();
        let table = trainer.q_table();

        // every loop step bootstraps from Q(0, 1) == 0 until the goal is reached
        assert_eq!(table.value(0, 1).unwrap(), 0.5);
        assert_eq!(table.value(0, 0).unwrap(), 0.0);
        assert_eq!(record.total_reward, 1.0);
        assert_eq!(record.end, EpisodeEnd::Terminated);
        assert_eq!(record.episode, 0);
    }

    #[test]
    fn runs_exactly_episode_count() {
        let mut env = Corridor::<5>::new(50);
        let mut trainer = Trainer::new(config(37), &env).unwrap();
        let mut rng = StdRng::seed_from_u64(1);

        let records = trainer.train(&mut env, &mut rng).unwrap();
        assert_eq!(records.len(), 37);
        assert!(
            records.iter().enumerate().all(|(i, r)| r.episode == i as u32),
            "Records ordered by episode"
        );
        assert_eq!(trainer.episode(), 37);
        assert!(trainer.is_finished());

        let records = trainer.train(&mut env, &mut rng).unwrap();
        assert_eq!(records.len(), 37, "Finished trainer runs nothing more");
    }

    #[test]
    fn epsilon_advances_per_episode() {
        let mut env = Corridor::<4>::new(20);
        let mut trainer = Trainer::new(config(10), &env).unwrap();
        let mut rng = StdRng::seed_from_u64(5);
        assert_eq!(trainer.epsilon(), 1.0);

        trainer.train(&mut env, &mut rng).unwrap();
        for record in trainer.records() {
            let expected = (1.0 - 0.01 * (record.episode + 1) as f32).max(0.05);
            assert_eq!(record.epsilon, expected);
        }
    }

    #[test]
    fn zero_decay_step_keeps_epsilon() {
        let flat = TrainingConfig {
            epsilon_start: 0.3,
            epsilon_decay_step: 0.0,
            ..config(1)
        };
        let schedule = flat.schedule().unwrap();
        assert_eq!(schedule, decay::Schedule::Constant(decay::Constant::new(0.3)));

        let exponential = TrainingConfig {
            epsilon_decay: EpsilonDecay::Exponential,
            ..config(1)
        };
        assert!(matches!(
            exponential.schedule().unwrap(),
            decay::Schedule::Exponential(_)
        ));
    }

    #[test]
    fn truncation_ends_episode() {
        let mut env = LoopEnv::new(3);
        let config = TrainingConfig {
            epsilon_start: 0.0,
            epsilon_min: 0.0,
            ..config(1)
        };
        let mut trainer = Trainer::new(config, &env).unwrap();
        let mut rng = StdRng::seed_from_u64(0);

        // greedy on a zeroed table always picks action 0, which loops
        let record = trainer.run_episode(&mut env, &mut rng).unwrap();
        assert_eq!(record.end, EpisodeEnd::Truncated);
        assert_eq!(record.steps, 3);
        assert_eq!(record.total_reward, 0.0);
    }

    #[test]
    fn truncated_step_still_bootstraps() {
        // LoopEnv truncates on the first step, landing back in state 0
        let mut env = LoopEnv::new(1);
        let config = TrainingConfig {
            epsilon_start: 0.0,
            epsilon_min: 0.0,
            ..config(2)
        };
        let mut trainer = Trainer::new(config, &env).unwrap();
        let mut rng = StdRng::seed_from_u64(0);

        // episode 0: greedy picks action 0, Q(0,0) = 0.5 * (0 + 0.9 * 0) = 0
        trainer.run_episode(&mut env, &mut rng).unwrap();
        assert_eq!(trainer.q_table().value(0, 0).unwrap(), 0.0);

        // give row 0 a non-zero maximum through the only mutation path
        trainer.table.update(0, 0, 2.0, 1.0).unwrap();

        let record = trainer.run_episode(&mut env, &mut rng).unwrap();
        assert_eq!(record.end, EpisodeEnd::Truncated);
        // Q(0,0) = 2.0 + 0.5 * (0 + 0.9 * 2.0 - 2.0)
        let expected = 2.0 + 0.5 * (0.9 * 2.0 - 2.0);
        let value = trainer.q_table().value(0, 0).unwrap();
        assert!(
            (value - expected).abs() < 1e-6,
            "Truncation bootstraps: {value} != {expected}"
        );
    }

    #[test]
    fn episode_explores_with_epsilon_before_decay() {
        // epsilon is 1.0 for episode 0 and 0.0 from episode 1 on
        let config = TrainingConfig {
            epsilon_start: 1.0,
            epsilon_min: 0.0,
            epsilon_decay_step: 1.0,
            ..config(1)
        };
        let mut env = LoopEnv::new(200);
        let mut trainer = Trainer::new(config, &env).unwrap();
        let mut rng = StdRng::seed_from_u64(13);

        // a greedy agent on a zeroed table only ever picks action 0 and gets truncated,
        // so reaching the goal means episode 0 explored
        let record = trainer.run_episode(&mut env, &mut rng).unwrap();
        assert_eq!(record.end, EpisodeEnd::Terminated, "Episode 0 explored");
        assert_eq!(record.total_reward, 1.0);
        assert_eq!(record.epsilon, 0.0, "Schedule advanced after the episode");
        assert_eq!(trainer.epsilon(), 0.0);
    }

    #[test]
    fn huge_episode_count_constructs() {
        let env = LoopEnv::new(10);
        let config = TrainingConfig {
            episode_count: u32::MAX,
            log_interval: 0,
            ..Default::default()
        };
        let trainer = Trainer::new(config, &env).unwrap();
        assert!(trainer.records().is_empty());
        assert!(!trainer.is_finished());
    }

    #[test]
    fn training_is_deterministic() {
        let run = || {
            let mut env = Corridor::<6>::new(40);
            let mut trainer = Trainer::new(config(200), &env).unwrap();
            let mut rng = StdRng::seed_from_u64(2024);
            trainer.train(&mut env, &mut rng).unwrap();
            trainer.into_parts()
        };

        let (table_a, records_a) = run();
        let (table_b, records_b) = run();
        assert_eq!(table_a, table_b, "Identical tables");
        assert_eq!(records_a, records_b, "Identical records");
    }

    #[test]
    fn resumed_training_matches_uninterrupted() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut env = Corridor::<5>::new(30);
        let mut whole = Trainer::new(config(60), &env).unwrap();
        whole.train(&mut env, &mut rng).unwrap();

        let mut rng = StdRng::seed_from_u64(9);
        let mut env = Corridor::<5>::new(30);
        let mut split = Trainer::new(config(60), &env).unwrap();
        for _ in 0..25 {
            split.run_episode(&mut env, &mut rng).unwrap();
        }
        split.train(&mut env, &mut rng).unwrap();

        assert_eq!(whole.q_table(), split.q_table());
        assert_eq!(whole.records(), split.records());
    }

    #[test]
    fn learns_corridor() {
        let mut env = Corridor::<6>::new(50);
        let mut trainer = Trainer::new(config(300), &env).unwrap();
        let mut rng = StdRng::seed_from_u64(77);
        trainer.train(&mut env, &mut rng).unwrap();

        let policy = trainer.q_table().greedy_policy();
        assert!(
            policy[..5].iter().all(|&a| a == 1),
            "Moves right everywhere: {policy:?}"
        );
    }

    #[test]
    fn environment_errors_propagate() {
        let mut env = BrokenEnv;
        let mut trainer = Trainer::new(config(5), &env).unwrap();
        let mut rng = StdRng::seed_from_u64(0);

        let err = trainer.train(&mut env, &mut rng).unwrap_err();
        let Error::Environment(inner) = err else {
            panic!("expected an environment error");
        };
        assert!(inner.downcast_ref::<SensorOffline>().is_some());
        assert!(trainer.records().is_empty(), "Failed episode is not recorded");
    }

    #[test]
    fn mismatched_environment_rejected() {
        let env = LoopEnv::new(10);
        let mut trainer = Trainer::new(config(1), &env).unwrap();
        let mut other = Corridor::<9>::new(10);
        let mut rng = StdRng::seed_from_u64(0);
        assert!(matches!(
            trainer.run_episode(&mut other, &mut rng),
            Err(Error::DimensionMismatch { .. })
        ));
    }
}
