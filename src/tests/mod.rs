pub mod test_network;
pub mod test_replay_buffer;
pub mod test_schedule;

use ndarray::{array, Array1};

use crate::env::{BoxSpace, Discrete, Environment, Info, Step};
use crate::error::{DqnError, Result};

/// Deterministic fixed-length episode: action 1 pays 1.0, anything else 0.0.
/// Observation is `[progress, 1.0]`.
pub struct ChainEnv {
    length: usize,
    position: Option<usize>,
    action_space: Discrete,
    observation_space: BoxSpace,
}

impl ChainEnv {
    pub fn new(length: usize) -> Self {
        ChainEnv {
            length,
            position: None,
            action_space: Discrete::new(3),
            observation_space: BoxSpace::new(array![0.0, 0.0], array![1.0, 1.0]),
        }
    }

    fn observation(&self, position: usize) -> Array1<f32> {
        array![position as f32 / self.length as f32, 1.0]
    }
}

impl Environment for ChainEnv {
    fn reset(&mut self, _seed: Option<u64>) -> Result<(Array1<f32>, Info)> {
        self.position = Some(0);
        Ok((self.observation(0), Info::new()))
    }

    fn step(&mut self, action: usize) -> Result<Step> {
        let position = self
            .position
            .ok_or_else(|| DqnError::Environment("episode over".to_string()))?
            + 1;
        let done = position >= self.length;
        self.position = if done { None } else { Some(position) };
        Ok(Step {
            observation: self.observation(position),
            reward: if action == 1 { 1.0 } else { 0.0 },
            done,
            truncated: false,
            info: Info::new(),
        })
    }

    fn action_space(&self) -> &Discrete {
        &self.action_space
    }

    fn action_space_mut(&mut self) -> &mut Discrete {
        &mut self.action_space
    }

    fn observation_space(&self) -> &BoxSpace {
        &self.observation_space
    }

    fn observation_space_mut(&mut self) -> &mut BoxSpace {
        &mut self.observation_space
    }
}
