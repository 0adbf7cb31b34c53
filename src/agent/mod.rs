//! # Deep Q-learning agent
//!
//! [`DqnAgent`] ties the pieces of the crate into one learning loop:
//!
//! - **Action selection**: epsilon-greedy over the online approximator, with
//!   epsilon decaying exponentially in the number of learner updates
//! - **Experience replay**: every environment step is stored in a fixed-size
//!   ring buffer and learning batches are drawn from it uniformly
//! - **Learner**: one optimizer step per frame on the mean squared error
//!   between `Q(s, a)` and the bootstrapped target computed by the target
//!   approximator
//! - **Target synchronisation**: the target approximator is overwritten by the
//!   online one every `target_update_freq` updates
//! - **Reporting**: the mean episode reward is recorded every `eval_interval`
//!   frames
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use deepq::agent::DqnAgent;
//! use deepq::config::DqnConfig;
//! use deepq::env::CartPole;
//!
//! let config = DqnConfig::default()
//!     .buffer_capacity(10_000)
//!     .batch_size(32)
//!     .target_update_freq(1000)
//!     .seed(42);
//! let mut agent = DqnAgent::new(CartPole::default(), config).unwrap();
//!
//! agent.train(50_000, 1000).unwrap();
//! println!("greedy reward: {}", agent.evaluate(10).unwrap());
//! ```

mod dqn;
pub use dqn::{argmax, DqnAgent};
