use ndarray::{Array1, Array2, Zip};
use serde::{Deserialize, Serialize};

use crate::error::{DqnError, Result};
use crate::network::Parameters;

pub trait Optimizer {
    /// Applies one update to `params` from gradients laid out like `params`.
    fn step(&mut self, params: &mut Parameters, grads: &Parameters) -> Result<()>;

    fn learning_rate(&self) -> f32;

    /// Checks that the internal state can drive updates of `params`.
    fn check_compatible(&self, params: &Parameters) -> Result<()>;
}

/// Serialisable optimizer, stored inside checkpoints.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub enum OptimizerWrapper {
    SGD(SGD),
    Adam(Adam),
}

impl OptimizerWrapper {
    pub fn name(&self) -> &'static str {
        match self {
            OptimizerWrapper::SGD(_) => "sgd",
            OptimizerWrapper::Adam(_) => "adam",
        }
    }
}

impl Optimizer for OptimizerWrapper {
    fn step(&mut self, params: &mut Parameters, grads: &Parameters) -> Result<()> {
        match self {
            OptimizerWrapper::SGD(optimizer) => optimizer.step(params, grads),
            OptimizerWrapper::Adam(optimizer) => optimizer.step(params, grads),
        }
    }

    fn learning_rate(&self) -> f32 {
        match self {
            OptimizerWrapper::SGD(optimizer) => optimizer.learning_rate(),
            OptimizerWrapper::Adam(optimizer) => optimizer.learning_rate(),
        }
    }

    fn check_compatible(&self, params: &Parameters) -> Result<()> {
        match self {
            OptimizerWrapper::SGD(optimizer) => optimizer.check_compatible(params),
            OptimizerWrapper::Adam(optimizer) => optimizer.check_compatible(params),
        }
    }
}

/// Plain gradient descent.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct SGD {
    pub learning_rate: f32,
}

impl SGD {
    pub fn new(learning_rate: f32) -> SGD {
        SGD { learning_rate }
    }
}

impl Optimizer for SGD {
    fn step(&mut self, params: &mut Parameters, grads: &Parameters) -> Result<()> {
        params.check_same_shape(grads)?;
        let lr = self.learning_rate;
        for (layer, grad) in params.layers.iter_mut().zip(&grads.layers) {
            layer.weights.zip_mut_with(&grad.weights, |w, &g| *w -= lr * g);
            layer.biases.zip_mut_with(&grad.biases, |b, &g| *b -= lr * g);
        }
        Ok(())
    }

    fn learning_rate(&self) -> f32 {
        self.learning_rate
    }

    fn check_compatible(&self, _params: &Parameters) -> Result<()> {
        Ok(())
    }
}

/// Adam with bias correction. First and second moment estimates are kept
/// per parameter tensor; `t` counts completed steps.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Adam {
    pub learning_rate: f32,
    pub beta1: f32,
    pub beta2: f32,
    pub epsilon: f32,
    m_weights: Vec<Array2<f32>>,
    v_weights: Vec<Array2<f32>>,
    m_biases: Vec<Array1<f32>>,
    v_biases: Vec<Array1<f32>>,
    pub t: u64,
}

impl Adam {
    pub fn new(params: &Parameters, learning_rate: f32, beta1: f32, beta2: f32, epsilon: f32) -> Self {
        let zeros = Parameters::zeros_like(params);
        Adam {
            learning_rate,
            beta1,
            beta2,
            epsilon,
            m_weights: zeros.layers.iter().map(|l| l.weights.clone()).collect(),
            v_weights: zeros.layers.iter().map(|l| l.weights.clone()).collect(),
            m_biases: zeros.layers.iter().map(|l| l.biases.clone()).collect(),
            v_biases: zeros.layers.iter().map(|l| l.biases.clone()).collect(),
            t: 0,
        }
    }

    pub fn default(params: &Parameters, learning_rate: f32) -> Self {
        Self::new(params, learning_rate, 0.9, 0.999, 1e-8)
    }

    fn moment_shapes(weights: &[Array2<f32>], biases: &[Array1<f32>]) -> Vec<((usize, usize), usize)> {
        let mut shapes: Vec<_> = weights.iter().zip(biases).map(|(w, b)| (w.dim(), b.len())).collect();
        // A length mismatch between the two lists must not be hidden by zip
        if weights.len() != biases.len() {
            shapes.push(((weights.len(), 0), biases.len()));
        }
        shapes
    }
}

impl Optimizer for Adam {
    fn step(&mut self, params: &mut Parameters, grads: &Parameters) -> Result<()> {
        params.check_same_shape(grads)?;
        self.check_compatible(params)?;

        self.t += 1;
        let (beta1, beta2, eps, lr) = (self.beta1, self.beta2, self.epsilon, self.learning_rate);
        let bias1 = 1.0 - beta1.powi(self.t as i32);
        let bias2 = 1.0 - beta2.powi(self.t as i32);

        for (i, (layer, grad)) in params.layers.iter_mut().zip(&grads.layers).enumerate() {
            Zip::from(&mut layer.weights)
                .and(&grad.weights)
                .and(&mut self.m_weights[i])
                .and(&mut self.v_weights[i])
                .for_each(|w, &g, m, v| {
                    *m = beta1 * *m + (1.0 - beta1) * g;
                    *v = beta2 * *v + (1.0 - beta2) * g * g;
                    *w -= lr * (*m / bias1) / ((*v / bias2).sqrt() + eps);
                });
            Zip::from(&mut layer.biases)
                .and(&grad.biases)
                .and(&mut self.m_biases[i])
                .and(&mut self.v_biases[i])
                .for_each(|b, &g, m, v| {
                    *m = beta1 * *m + (1.0 - beta1) * g;
                    *v = beta2 * *v + (1.0 - beta2) * g * g;
                    *b -= lr * (*m / bias1) / ((*v / bias2).sqrt() + eps);
                });
        }
        Ok(())
    }

    fn learning_rate(&self) -> f32 {
        self.learning_rate
    }

    fn check_compatible(&self, params: &Parameters) -> Result<()> {
        let expected = params.shapes();
        let moments = [
            ("first", Self::moment_shapes(&self.m_weights, &self.m_biases)),
            ("second", Self::moment_shapes(&self.v_weights, &self.v_biases)),
        ];
        for (order, actual) in moments {
            if expected != actual {
                return Err(DqnError::shape_mismatch(
                    format!("{} moment estimates {:?}", order, expected),
                    format!("{} moment estimates {:?}", order, actual),
                ));
            }
        }
        Ok(())
    }
}
