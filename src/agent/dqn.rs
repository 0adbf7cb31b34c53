use log::{debug, info};
use ndarray::{Array1, Array2, ArrayView1, Axis};
use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::VecDeque;
use std::fs;
use std::path::Path;

use crate::config::{DqnConfig, OptimizerKind};
use crate::env::{Environment, Step};
use crate::error::{DqnError, Result};
use crate::history::TrainingHistory;
use crate::network::{NeuralNetwork, Parameters, QFunction};
use crate::optimizer::{Adam, Optimizer, OptimizerWrapper, SGD};
use crate::replay_buffer::{ReplayBuffer, Transition};
use crate::schedule::EpsilonSchedule;
use crate::seeding::seed_all;

/// On-disk artifact written by [`DqnAgent::save`].
#[derive(Serialize, Deserialize)]
struct Checkpoint {
    parameters: Parameters,
    optimizer: OptimizerWrapper,
}

/// Deep Q-Network agent with experience replay and a hard-synced target network.
///
/// The agent owns its environment, replay buffer, the online and target
/// approximators, the optimizer and the training curve. `total_steps` counts
/// learner updates; it drives both the exploration schedule and target
/// synchronisation.
///
/// # Example
///
/// ```rust,no_run
/// use deepq::agent::DqnAgent;
/// use deepq::config::DqnConfig;
/// use deepq::env::CartPole;
///
/// let config = DqnConfig::default().batch_size(64).target_update_freq(500);
/// let mut agent = DqnAgent::new(CartPole::default(), config).unwrap();
///
/// agent.train(20_000, 1000).unwrap();
/// agent.save("dqn_cartpole.bin").unwrap();
///
/// for (frame, mean_reward) in agent.history().iter() {
///     println!("{} {}", frame, mean_reward);
/// }
/// ```
pub struct DqnAgent<E, Q = NeuralNetwork> {
    env: E,
    config: DqnConfig,
    schedule: EpsilonSchedule,
    buffer: ReplayBuffer,
    q_network: Q,
    target_network: Q,
    optimizer: OptimizerWrapper,
    total_steps: usize,
    rng: StdRng,
    history: TrainingHistory,
}

impl<E: Environment> DqnAgent<E, NeuralNetwork> {
    /// Seeds everything from `config.seed` and builds an MLP sized from the
    /// environment's observation and action spaces.
    pub fn new(mut env: E, config: DqnConfig) -> Result<Self> {
        config.validate()?;
        let mut rngs = seed_all(config.seed, &mut env)?;
        let q_network = NeuralNetwork::q_network(
            env.observation_space().shape(),
            &config.hidden_sizes,
            env.action_space().n(),
            &mut rngs.init,
        )?;
        Self::assemble(env, config, q_network, rngs.numeric)
    }
}

impl<E: Environment, Q: QFunction + Clone> DqnAgent<E, Q> {
    /// Uses a caller-built online approximator. The target starts as an
    /// exact copy of it.
    pub fn with_network(mut env: E, config: DqnConfig, q_network: Q) -> Result<Self> {
        config.validate()?;
        let rngs = seed_all(config.seed, &mut env)?;
        Self::assemble(env, config, q_network, rngs.numeric)
    }

    fn assemble(env: E, config: DqnConfig, q_network: Q, rng: StdRng) -> Result<Self> {
        let obs_dim = env.observation_space().shape();
        let num_actions = env.action_space().n();
        if q_network.input_dim() != obs_dim || q_network.num_actions() != num_actions {
            return Err(DqnError::shape_mismatch(
                format!("approximator {} -> {}", obs_dim, num_actions),
                format!("approximator {} -> {}", q_network.input_dim(), q_network.num_actions()),
            ));
        }

        let optimizer = match config.optimizer {
            OptimizerKind::Adam => {
                OptimizerWrapper::Adam(Adam::default(q_network.parameters(), config.learning_rate))
            }
            OptimizerKind::Sgd => OptimizerWrapper::SGD(SGD::new(config.learning_rate)),
        };

        Ok(DqnAgent {
            env,
            schedule: config.schedule(),
            buffer: ReplayBuffer::new(config.buffer_capacity),
            target_network: q_network.clone(),
            q_network,
            optimizer,
            total_steps: 0,
            rng,
            history: TrainingHistory::new(),
            config,
        })
    }

    /// Current exploration probability.
    pub fn epsilon(&self) -> f64 {
        self.schedule.value(self.total_steps)
    }

    /// Epsilon-greedy action for `state`; purely greedy when `evaluate` is set.
    pub fn predict_action(&mut self, state: ArrayView1<f32>, evaluate: bool) -> Result<usize> {
        self.check_state(&state)?;
        if evaluate {
            return self.greedy_action(state);
        }
        let u: f64 = self.rng.gen();
        if u < self.epsilon() {
            Ok(self.env.action_space_mut().sample())
        } else {
            self.greedy_action(state)
        }
    }

    fn greedy_action(&self, state: ArrayView1<f32>) -> Result<usize> {
        let q_values = self.q_network.predict(state.insert_axis(Axis(0)))?;
        Ok(argmax(q_values.row(0)))
    }

    /// Bootstrapped regression targets `r + (1 - done) * gamma * max_a Q_target(s', a)`.
    ///
    /// Only the target approximator is consulted and nothing is cached for
    /// backpropagation. Non-finite target values are not masked: a NaN in a
    /// row yields a NaN target, terminal or not.
    pub fn compute_targets<T: Borrow<Transition>>(&self, batch: &[T]) -> Result<Array1<f32>> {
        let next_states = self.stack_states(batch, |t| &t.next_state)?;
        let next_q_values = self.target_network.predict(next_states.view())?;
        let gamma = self.config.gamma;

        Ok(batch
            .iter()
            .zip(next_q_values.rows())
            .map(|(t, row)| {
                let t = t.borrow();
                let not_done = if t.done { 0.0 } else { 1.0 };
                t.reward + not_done * gamma * nan_max(row)
            })
            .collect())
    }

    /// One optimisation step on `batch`; returns the mean squared TD error.
    ///
    /// Every `target_update_freq` updates the target approximator becomes an
    /// exact copy of the online one.
    pub fn update_agent<T: Borrow<Transition>>(&mut self, batch: &[T]) -> Result<f32> {
        if batch.is_empty() {
            return Err(DqnError::invalid_parameter("batch", "must contain at least one transition"));
        }
        let num_actions = self.q_network.num_actions();
        let actions: Vec<usize> = batch.iter().map(|t| t.borrow().action).collect();
        if let Some(&action) = actions.iter().find(|&&a| a >= num_actions) {
            return Err(DqnError::shape_mismatch(
                format!("action index below {}", num_actions),
                format!("action index {}", action),
            ));
        }

        let states = self.stack_states(batch, |t| &t.state)?;
        let targets = self.compute_targets(batch)?;

        let q_values = self.q_network.forward_train(states.view())?;
        let predicted: Array1<f32> = actions
            .iter()
            .enumerate()
            .map(|(i, &a)| q_values[[i, a]])
            .collect();

        let td_errors = &predicted - &targets;
        let batch_size = batch.len() as f32;
        let loss = td_errors.mapv(|e| e * e).sum() / batch_size;

        // d(mean squared error)/dQ is non-zero only at the taken actions
        let mut output_grad = Array2::<f32>::zeros(q_values.dim());
        for (i, &a) in actions.iter().enumerate() {
            output_grad[[i, a]] = 2.0 * td_errors[i] / batch_size;
        }
        let grads = self.q_network.backward(output_grad.view())?;
        self.optimizer.step(self.q_network.parameters_mut(), &grads)?;

        self.total_steps += 1;
        if self.total_steps % self.config.target_update_freq == 0 {
            self.sync_target()?;
            debug!("Synced target network at update {}", self.total_steps);
        }

        Ok(loss)
    }

    /// Hard copy of the online parameters into the target approximator.
    pub fn sync_target(&mut self) -> Result<()> {
        self.target_network.set_parameters(self.q_network.parameters())
    }

    /// Samples a batch and updates once, if the buffer holds enough transitions.
    fn learn(&mut self) -> Result<Option<f32>> {
        if self.buffer.len() < self.config.batch_size {
            return Ok(None);
        }
        let batch: Vec<Transition> = self
            .buffer
            .sample(self.config.batch_size, &mut self.rng)?
            .into_iter()
            .cloned()
            .collect();
        self.update_agent(&batch).map(Some)
    }

    /// Interacts with the environment for exactly `num_frames` steps.
    ///
    /// Every step is stored in the replay buffer and followed by one learner
    /// update once the buffer holds a full batch. Every `eval_interval`
    /// frames the mean reward of the last `eval_interval` completed episodes
    /// (0.0 before the first one completes) is appended to the history and
    /// reported. Any error aborts the run.
    pub fn train(&mut self, num_frames: usize, eval_interval: usize) -> Result<()> {
        if eval_interval == 0 {
            return Err(DqnError::invalid_parameter("eval_interval", "must be positive"));
        }

        let (mut state, _) = self.env.reset(None)?;
        let mut episode_reward = 0.0f32;
        let mut recent_rewards: VecDeque<f32> = VecDeque::with_capacity(eval_interval);

        for frame in 1..=num_frames {
            let action = self.predict_action(state.view(), false)?;
            let Step {
                observation,
                reward,
                done,
                truncated,
                info,
            } = self.env.step(action)?;
            let episode_end = done || truncated;

            self.buffer.add(
                Transition::new(state, action, reward, observation.clone(), episode_end)
                    .with_extra(info),
            );
            state = observation;
            episode_reward += reward;

            self.learn()?;

            if episode_end {
                state = self.env.reset(None)?.0;
                if recent_rewards.len() == eval_interval {
                    recent_rewards.pop_front();
                }
                recent_rewards.push_back(episode_reward);
                debug!(
                    "Episode finished at frame {} with reward {:.2} (epsilon {:.3})",
                    frame,
                    episode_reward,
                    self.epsilon()
                );
                episode_reward = 0.0;
            }

            if frame % eval_interval == 0 {
                let mean_reward = if recent_rewards.is_empty() {
                    0.0
                } else {
                    recent_rewards.iter().sum::<f32>() / recent_rewards.len() as f32
                };
                self.history.push(frame, mean_reward);
                info!(
                    "Frame {:>7}, mean reward (last {} frames): {:.2}",
                    frame, eval_interval, mean_reward
                );
            }
        }

        info!("Training complete.");
        Ok(())
    }

    /// Mean undiscounted reward of `num_episodes` greedy episodes.
    ///
    /// Leaves the buffer, counters and training curve untouched.
    pub fn evaluate(&mut self, num_episodes: usize) -> Result<f32> {
        if num_episodes == 0 {
            return Err(DqnError::invalid_parameter("num_episodes", "must be positive"));
        }
        let mut total = 0.0f32;
        for _ in 0..num_episodes {
            let (mut state, _) = self.env.reset(None)?;
            loop {
                let action = self.predict_action(state.view(), true)?;
                let step = self.env.step(action)?;
                total += step.reward;
                if step.is_episode_end() {
                    break;
                }
                state = step.observation;
            }
        }
        Ok(total / num_episodes as f32)
    }

    /// Writes online parameters and optimizer state to `path`.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let checkpoint = Checkpoint {
            parameters: self.q_network.parameters().clone(),
            optimizer: self.optimizer.clone(),
        };
        let serialized = bincode::serialize(&checkpoint)?;
        fs::write(path, serialized)?;
        info!("Saved checkpoint to {}", path.display());
        Ok(())
    }

    /// Restores online parameters and optimizer state from `path`.
    ///
    /// Nothing is modified unless the whole checkpoint matches this agent's
    /// architecture.
    pub fn load<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let path = path.as_ref();
        let data = fs::read(path)?;
        let checkpoint: Checkpoint = bincode::deserialize(&data)?;

        self.q_network
            .parameters()
            .check_same_shape(&checkpoint.parameters)
            .and_then(|_| checkpoint.optimizer.check_compatible(&checkpoint.parameters))
            .map_err(|e| DqnError::Persistence(format!("{}: {}", path.display(), e)))?;

        self.q_network.set_parameters(&checkpoint.parameters)?;
        self.optimizer = checkpoint.optimizer;
        info!("Loaded checkpoint from {}", path.display());
        Ok(())
    }

    fn check_state(&self, state: &ArrayView1<f32>) -> Result<()> {
        let expected = self.q_network.input_dim();
        if state.len() != expected {
            return Err(DqnError::shape_mismatch(
                format!("state dimension {}", expected),
                format!("state dimension {}", state.len()),
            ));
        }
        Ok(())
    }

    fn stack_states<T, F>(&self, batch: &[T], select: F) -> Result<Array2<f32>>
    where
        T: Borrow<Transition>,
        F: Fn(&Transition) -> &Array1<f32>,
    {
        let dim = self.q_network.input_dim();
        let mut states = Array2::zeros((batch.len(), dim));
        for (i, t) in batch.iter().enumerate() {
            let state = select(t.borrow());
            if state.len() != dim {
                return Err(DqnError::shape_mismatch(
                    format!("state dimension {}", dim),
                    format!("state dimension {}", state.len()),
                ));
            }
            states.row_mut(i).assign(state);
        }
        Ok(states)
    }

    pub fn total_steps(&self) -> usize {
        self.total_steps
    }

    pub fn config(&self) -> &DqnConfig {
        &self.config
    }

    pub fn buffer(&self) -> &ReplayBuffer {
        &self.buffer
    }

    pub fn buffer_mut(&mut self) -> &mut ReplayBuffer {
        &mut self.buffer
    }

    pub fn online(&self) -> &Q {
        &self.q_network
    }

    pub fn online_mut(&mut self) -> &mut Q {
        &mut self.q_network
    }

    pub fn target(&self) -> &Q {
        &self.target_network
    }

    pub fn optimizer(&self) -> &OptimizerWrapper {
        &self.optimizer
    }

    pub fn history(&self) -> &TrainingHistory {
        &self.history
    }

    pub fn frame_history(&self) -> &[usize] {
        &self.history.frames
    }

    pub fn mean_reward_history(&self) -> &[f32] {
        &self.history.mean_rewards
    }

    pub fn env(&self) -> &E {
        &self.env
    }

    pub fn env_mut(&mut self) -> &mut E {
        &mut self.env
    }
}

/// Largest value of `values`, or NaN if any value is NaN.
fn nan_max(values: ArrayView1<f32>) -> f32 {
    values.fold(f32::NEG_INFINITY, |max, &v| if v.is_nan() || v > max { v } else { max })
}

/// Index of the largest value; ties go to the lowest index.
pub fn argmax(values: ArrayView1<f32>) -> usize {
    let mut best = 0;
    for (i, &v) in values.iter().enumerate().skip(1) {
        if v > values[best] {
            best = i;
        }
    }
    best
}
