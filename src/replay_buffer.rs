use ndarray::Array1;
use rand::Rng;
use std::collections::VecDeque;

use crate::env::Info;
use crate::error::{DqnError, Result};

/// One recorded step of environment interaction.
///
/// `extra` carries whatever auxiliary data the environment reported; the
/// learner never reads it.
#[derive(Clone, Debug, PartialEq)]
pub struct Transition {
    pub state: Array1<f32>,
    pub action: usize,
    pub reward: f32,
    pub next_state: Array1<f32>,
    pub done: bool,
    pub extra: Info,
}

impl Transition {
    pub fn new(
        state: Array1<f32>,
        action: usize,
        reward: f32,
        next_state: Array1<f32>,
        done: bool,
    ) -> Self {
        Transition {
            state,
            action,
            reward,
            next_state,
            done,
            extra: Info::new(),
        }
    }

    pub fn with_extra(mut self, extra: Info) -> Self {
        self.extra = extra;
        self
    }
}

/// Fixed-capacity ring of transitions with uniform sampling.
///
/// Once full, every `add` evicts the oldest transition; retained transitions
/// keep their insertion order.
#[derive(Clone, Debug)]
pub struct ReplayBuffer {
    buffer: VecDeque<Transition>,
    capacity: usize,
}

impl ReplayBuffer {
    pub fn new(capacity: usize) -> Self {
        ReplayBuffer {
            buffer: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn add(&mut self, transition: Transition) {
        if self.capacity == 0 {
            return;
        }
        if self.buffer.len() == self.capacity {
            self.buffer.pop_front();
        }
        self.buffer.push_back(transition);
    }

    /// Draws `batch_size` transitions uniformly, with replacement.
    pub fn sample<R: Rng + ?Sized>(&self, batch_size: usize, rng: &mut R) -> Result<Vec<&Transition>> {
        if batch_size > self.buffer.len() {
            return Err(DqnError::InsufficientData {
                requested: batch_size,
                available: self.buffer.len(),
            });
        }
        let len = self.buffer.len();
        Ok((0..batch_size)
            .map(|_| &self.buffer[rng.gen_range(0..len)])
            .collect())
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Oldest retained transition.
    pub fn oldest(&self) -> Option<&Transition> {
        self.buffer.front()
    }

    /// Retained transitions, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &Transition> {
        self.buffer.iter()
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}
