use ndarray::{array, Array1};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::{BoxSpace, Discrete, Environment, Info, Step};
use crate::error::{DqnError, Result};

const GRAVITY: f32 = 9.8;
const MASS_CART: f32 = 1.0;
const MASS_POLE: f32 = 0.1;
const TOTAL_MASS: f32 = MASS_CART + MASS_POLE;
/// Half the pole's length.
const LENGTH: f32 = 0.5;
const POLE_MASS_LENGTH: f32 = MASS_POLE * LENGTH;
const FORCE_MAG: f32 = 10.0;
const TAU: f32 = 0.02;
const THETA_THRESHOLD: f32 = 12.0 * 2.0 * std::f32::consts::PI / 360.0;
const X_THRESHOLD: f32 = 2.4;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CartPoleConfig {
    /// Steps after which an episode is truncated.
    pub max_episode_steps: usize,
}

impl Default for CartPoleConfig {
    fn default() -> Self {
        CartPoleConfig {
            max_episode_steps: 500,
        }
    }
}

/// Pole balanced on a cart moving along a frictionless track.
///
/// Observation: `[x, x_dot, theta, theta_dot]`. Actions: `0` pushes left,
/// `1` pushes right. Every step yields reward `1.0`; the episode terminates
/// once the cart leaves `±2.4` or the pole tilts beyond 12 degrees.
#[derive(Clone, Debug)]
pub struct CartPole {
    config: CartPoleConfig,
    state: Option<[f32; 4]>,
    elapsed_steps: usize,
    rng: StdRng,
    action_space: Discrete,
    observation_space: BoxSpace,
}

impl CartPole {
    pub fn new(config: CartPoleConfig) -> Self {
        let high = array![
            X_THRESHOLD * 2.0,
            f32::INFINITY,
            THETA_THRESHOLD * 2.0,
            f32::INFINITY
        ];
        CartPole {
            config,
            state: None,
            elapsed_steps: 0,
            rng: StdRng::from_entropy(),
            action_space: Discrete::new(2),
            observation_space: BoxSpace::new(-&high, high),
        }
    }

    pub fn config(&self) -> &CartPoleConfig {
        &self.config
    }

    pub fn elapsed_steps(&self) -> usize {
        self.elapsed_steps
    }

    fn observation(state: &[f32; 4]) -> Array1<f32> {
        Array1::from_vec(state.to_vec())
    }
}

impl Default for CartPole {
    fn default() -> Self {
        Self::new(CartPoleConfig::default())
    }
}

impl Environment for CartPole {
    fn reset(&mut self, seed: Option<u64>) -> Result<(Array1<f32>, Info)> {
        if let Some(seed) = seed {
            self.rng = StdRng::seed_from_u64(seed);
        }
        let mut state = [0.0f32; 4];
        for value in state.iter_mut() {
            *value = self.rng.gen_range(-0.05..0.05);
        }
        self.state = Some(state);
        self.elapsed_steps = 0;
        Ok((Self::observation(&state), Info::new()))
    }

    fn step(&mut self, action: usize) -> Result<Step> {
        if !self.action_space.contains(action) {
            return Err(DqnError::InvalidAction {
                action,
                num_actions: self.action_space.n(),
            });
        }
        let [x, x_dot, theta, theta_dot] = self.state.ok_or_else(|| {
            DqnError::Environment("step called before reset or after the episode ended".to_string())
        })?;

        let force = if action == 1 { FORCE_MAG } else { -FORCE_MAG };
        let (sin_theta, cos_theta) = theta.sin_cos();

        let temp = (force + POLE_MASS_LENGTH * theta_dot * theta_dot * sin_theta) / TOTAL_MASS;
        let theta_acc = (GRAVITY * sin_theta - cos_theta * temp)
            / (LENGTH * (4.0 / 3.0 - MASS_POLE * cos_theta * cos_theta / TOTAL_MASS));
        let x_acc = temp - POLE_MASS_LENGTH * theta_acc * cos_theta / TOTAL_MASS;

        let next = [
            x + TAU * x_dot,
            x_dot + TAU * x_acc,
            theta + TAU * theta_dot,
            theta_dot + TAU * theta_acc,
        ];
        self.elapsed_steps += 1;

        let done = next[0].abs() > X_THRESHOLD || next[2].abs() > THETA_THRESHOLD;
        let truncated = self.elapsed_steps >= self.config.max_episode_steps;
        self.state = if done || truncated { None } else { Some(next) };

        let mut info = Info::new();
        info.insert("elapsed_steps".to_string(), self.elapsed_steps.into());

        Ok(Step {
            observation: Self::observation(&next),
            reward: 1.0,
            done,
            truncated,
            info,
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_is_reproducible_with_seed() {
        let mut a = CartPole::default();
        let mut b = CartPole::default();
        let (obs_a, _) = a.reset(Some(7)).unwrap();
        let (obs_b, _) = b.reset(Some(7)).unwrap();
        assert_eq!(obs_a, obs_b);
        assert!(obs_a.iter().all(|v| v.abs() <= 0.05));
    }

    #[test]
    fn test_pushing_one_way_terminates() {
        let mut env = CartPole::default();
        env.reset(Some(0)).unwrap();
        let mut steps = 0;
        loop {
            let step = env.step(1).unwrap();
            steps += 1;
            assert_eq!(step.reward, 1.0);
            if step.done {
                break;
            }
            assert!(steps < 500, "pole should fall well before the time limit");
        }
        assert!(env.step(1).is_err());
    }

    #[test]
    fn test_truncation_at_time_limit() {
        let mut env = CartPole::new(CartPoleConfig { max_episode_steps: 3 });
        env.reset(Some(1)).unwrap();
        // Alternate pushes to stay balanced for a few steps
        assert!(!env.step(0).unwrap().truncated);
        assert!(!env.step(1).unwrap().truncated);
        let last = env.step(0).unwrap();
        assert!(last.truncated);
        assert!(last.is_episode_end());
    }

    #[test]
    fn test_invalid_action() {
        let mut env = CartPole::default();
        env.reset(None).unwrap();
        match env.step(2) {
            Err(DqnError::InvalidAction { action, num_actions }) => {
                assert_eq!(action, 2);
                assert_eq!(num_actions, 2);
            }
            other => panic!("expected InvalidAction, got {:?}", other),
        }
    }
}
