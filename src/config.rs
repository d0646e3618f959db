use crate::game::MAX_PLAYERS;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Reasons a game or training run can't be set up.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("invalid number of players ({0}), expected 2 to 8")]
    Players(usize),
    #[error("{name} must be positive, got {value}")]
    NonPositive { name: &'static str, value: i64 },
    #[error("epsilon must lie in [0, 1], got {0}")]
    Epsilon(f64),
    #[error("number of episodes must be positive")]
    Episodes,
    #[error("batch size must be positive")]
    Batch,
    #[error("step cap must be positive")]
    StepCap,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
/// Parameters of a single game.
pub struct GameConfig {
    /// The number of players seated, between 2 and `MAX_PLAYERS`.
    pub players: usize,
    /// Cash each player starts with.
    pub start_money: i64,
    /// Cash (and reward) for passing 'Go'.
    pub go_reward: i64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            players: 2,
            start_money: 1500,
            go_reward: 200,
        }
    }
}

impl GameConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(2..=MAX_PLAYERS).contains(&self.players) {
            return Err(ConfigError::Players(self.players));
        }
        if self.start_money <= 0 {
            return Err(ConfigError::NonPositive {
                name: "start_money",
                value: self.start_money,
            });
        }
        if self.go_reward <= 0 {
            return Err(ConfigError::NonPositive {
                name: "go_reward",
                value: self.go_reward,
            });
        }
        Ok(())
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
/// How episodes are simulated.
pub enum Mode {
    #[default]
    /// One worker, updating the table after every episode.
    Sequential,
    /// Batches of independent workers, folded into the table after each batch.
    Parallel,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
/// What parallel workers do when they exploit rather than explore.
pub enum WorkerPolicy {
    #[default]
    /// Act greedily on the table as it stood when the batch started.
    Snapshot,
    /// Always buy.
    Eager,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
/// Parameters of a training run.
pub struct TrainConfig {
    pub episodes: usize,
    /// Probability of picking a random action at a decision point.
    pub epsilon: f64,
    /// Seed of every random stream in the run.
    pub seed: u64,
    pub mode: Mode,
    /// Episodes simulated concurrently before each aggregation pass.
    pub batch: usize,
    pub policy: WorkerPolicy,
    /// Steps after which an episode is cut off.
    pub step_cap: usize,
    /// Traces kept per episode before further ones are dropped.
    pub trace_capacity: usize,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            episodes: 500,
            epsilon: 0.1,
            seed: rand::random(),
            mode: Mode::Sequential,
            batch: 1024,
            policy: WorkerPolicy::Snapshot,
            step_cap: 500,
            trace_capacity: 1000,
        }
    }
}

impl TrainConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.episodes == 0 {
            return Err(ConfigError::Episodes);
        }
        if self.batch == 0 {
            return Err(ConfigError::Batch);
        }
        if self.step_cap == 0 {
            return Err(ConfigError::StepCap);
        }
        if !(0.0..=1.0).contains(&self.epsilon) {
            return Err(ConfigError::Epsilon(self.epsilon));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
/// Everything a run needs, as read from a JSON file.
pub struct Settings {
    pub game: GameConfig,
    pub train: TrainConfig,
}

impl Settings {
    /// Read settings from a JSON file. Missing fields take their defaults.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        use anyhow::Context;
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parse config {}", path.display()))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.game.validate()?;
        self.train.validate()
    }
}
