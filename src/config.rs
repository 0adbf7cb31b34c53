//! Hyperparameters and experiment files.
//!
//! Every struct deserialises with serde defaults, so an experiment file only
//! needs the fields it overrides:
//!
//! ```json
//! {
//!   "agent": { "batch_size": 64, "target_update_freq": 500 },
//!   "train": { "num_frames": 50000 }
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::env::CartPoleConfig;
use crate::error::{DqnError, Result};
use crate::schedule::EpsilonSchedule;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptimizerKind {
    Adam,
    Sgd,
}

/// Agent hyperparameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DqnConfig {
    pub buffer_capacity: usize,
    pub batch_size: usize,
    pub learning_rate: f32,
    /// Discount factor.
    pub gamma: f32,
    pub epsilon_start: f64,
    pub epsilon_final: f64,
    pub epsilon_decay: f64,
    /// Learner updates between hard target syncs.
    pub target_update_freq: usize,
    pub seed: u64,
    pub hidden_sizes: Vec<usize>,
    pub optimizer: OptimizerKind,
}

impl Default for DqnConfig {
    fn default() -> Self {
        DqnConfig {
            buffer_capacity: 10_000,
            batch_size: 32,
            learning_rate: 1e-3,
            gamma: 0.99,
            epsilon_start: 1.0,
            epsilon_final: 0.01,
            epsilon_decay: 500.0,
            target_update_freq: 1000,
            seed: 0,
            hidden_sizes: vec![64, 64],
            optimizer: OptimizerKind::Adam,
        }
    }
}

impl DqnConfig {
    pub fn buffer_capacity(mut self, capacity: usize) -> Self {
        self.buffer_capacity = capacity;
        self
    }

    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn learning_rate(mut self, learning_rate: f32) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    pub fn gamma(mut self, gamma: f32) -> Self {
        self.gamma = gamma;
        self
    }

    pub fn epsilon(mut self, start: f64, end: f64, decay: f64) -> Self {
        self.epsilon_start = start;
        self.epsilon_final = end;
        self.epsilon_decay = decay;
        self
    }

    pub fn epsilon_decay(mut self, decay: f64) -> Self {
        self.epsilon_decay = decay;
        self
    }

    pub fn target_update_freq(mut self, freq: usize) -> Self {
        self.target_update_freq = freq;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn hidden_sizes(mut self, sizes: &[usize]) -> Self {
        self.hidden_sizes = sizes.to_vec();
        self
    }

    pub fn optimizer(mut self, optimizer: OptimizerKind) -> Self {
        self.optimizer = optimizer;
        self
    }

    pub fn schedule(&self) -> EpsilonSchedule {
        EpsilonSchedule::new(self.epsilon_start, self.epsilon_final, self.epsilon_decay)
    }

    pub fn validate(&self) -> Result<()> {
        if self.buffer_capacity == 0 {
            return Err(DqnError::invalid_parameter("buffer_capacity", "must be positive"));
        }
        if self.batch_size == 0 {
            return Err(DqnError::invalid_parameter("batch_size", "must be positive"));
        }
        if self.batch_size > self.buffer_capacity {
            return Err(DqnError::invalid_parameter(
                "batch_size",
                "must not exceed buffer_capacity",
            ));
        }
        if !(self.learning_rate > 0.0) {
            return Err(DqnError::invalid_parameter("learning_rate", "must be positive"));
        }
        if !(0.0..=1.0).contains(&self.gamma) {
            return Err(DqnError::invalid_parameter("gamma", "must lie in [0, 1]"));
        }
        if !(0.0..=1.0).contains(&self.epsilon_start) || !(0.0..=1.0).contains(&self.epsilon_final) {
            return Err(DqnError::invalid_parameter("epsilon", "bounds must lie in [0, 1]"));
        }
        if self.epsilon_start < self.epsilon_final {
            return Err(DqnError::invalid_parameter(
                "epsilon_start",
                "must not be below epsilon_final",
            ));
        }
        if !(self.epsilon_decay > 0.0) {
            return Err(DqnError::invalid_parameter("epsilon_decay", "must be positive"));
        }
        if self.target_update_freq == 0 {
            return Err(DqnError::invalid_parameter("target_update_freq", "must be positive"));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainConfig {
    pub num_frames: usize,
    /// Frames between progress reports.
    pub eval_interval: usize,
}

impl Default for TrainConfig {
    fn default() -> Self {
        TrainConfig {
            num_frames: 20_000,
            eval_interval: 1000,
        }
    }
}

/// Everything a training run needs, as read from an experiment file.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    pub env: CartPoleConfig,
    pub agent: DqnConfig,
    pub train: TrainConfig,
}

impl ExperimentConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| DqnError::Config(e.to_string()))
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .map_err(|e| DqnError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&contents)
    }
}
