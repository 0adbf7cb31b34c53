//! # Environment collaborator
//!
//! The agent drives any type implementing [`Environment`]: gymnasium-style
//! `reset`/`step` over `f32` observation vectors and a discrete action set.
//! [`CartPole`] is the bundled implementation used by the binary and tests.

pub mod cartpole;
pub mod spaces;

pub use cartpole::{CartPole, CartPoleConfig};
pub use spaces::{BoxSpace, Discrete};

use ndarray::Array1;

use crate::error::Result;

/// Auxiliary data reported alongside observations. Opaque to the learner.
pub type Info = serde_json::Map<String, serde_json::Value>;

/// Outcome of a single environment step.
#[derive(Clone, Debug, PartialEq)]
pub struct Step {
    pub observation: Array1<f32>,
    pub reward: f32,
    /// The episode reached a terminal state.
    pub done: bool,
    /// The episode was cut short (e.g. a time limit) without terminating.
    pub truncated: bool,
    pub info: Info,
}

impl Step {
    pub fn is_episode_end(&self) -> bool {
        self.done || self.truncated
    }
}

pub trait Environment {
    /// Starts a new episode. `Some(seed)` reseeds the environment's RNG first.
    fn reset(&mut self, seed: Option<u64>) -> Result<(Array1<f32>, Info)>;

    fn step(&mut self, action: usize) -> Result<Step>;

    fn action_space(&self) -> &Discrete;

    fn action_space_mut(&mut self) -> &mut Discrete;

    fn observation_space(&self) -> &BoxSpace;

    fn observation_space_mut(&mut self) -> &mut BoxSpace;
}
