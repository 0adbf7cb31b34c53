//! # deepq - Deep Q-learning for discrete-action environments
//!
//! deepq trains a value-based agent through repeated interaction with an
//! environment: transitions are stored in a replay buffer, actions are chosen
//! epsilon-greedily from an online Q-approximator, and the approximator is
//! regressed onto bootstrapped targets produced by a periodically
//! hard-synced target approximator.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use deepq::agent::DqnAgent;
//! use deepq::config::DqnConfig;
//! use deepq::env::CartPole;
//!
//! let mut agent = DqnAgent::new(CartPole::default(), DqnConfig::default()).unwrap();
//! agent.train(20_000, 1000).unwrap();
//! agent.history().write_csv("dqn_training_curve.csv").unwrap();
//! ```
//!
//! ## Module Organization
//!
//! - [`agent`] - The DQN agent: action selection, learner, training loop, persistence
//! - [`config`] - Hyperparameters and JSON experiment files
//! - [`env`] - Environment interface, spaces and a CartPole implementation
//! - [`error`] - Error types and result handling
//! - [`history`] - Training curve and CSV export
//! - [`network`] - The Q-function interface and an MLP implementing it
//! - [`optimizer`] - SGD and Adam
//! - [`replay_buffer`] - Transitions and the ring replay buffer
//! - [`schedule`] - Exponential epsilon decay
//! - [`seeding`] - Single-seed fan-out to every RNG stream

pub mod agent;
pub mod config;
pub mod env;
pub mod error;
pub mod history;
pub mod network;
pub mod optimizer;
pub mod replay_buffer;
pub mod schedule;
pub mod seeding;

#[cfg(test)]
mod tests;
