//! # Function approximator
//!
//! A small fully connected network mapping a batch of states to per-action
//! value estimates, plus the [`QFunction`] interface the agent is written
//! against. The online and target approximators are two owned instances of
//! the same `QFunction` type; the target is refreshed by copying
//! [`Parameters`] across.

use ndarray::{Array1, Array2, ArrayView2, Axis};
use ndarray_rand::rand_distr::Uniform;
use ndarray_rand::RandomExt;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{DqnError, Result};

/// Weights and biases of one dense layer. Weights are `(fan_in, fan_out)`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LayerParams {
    pub weights: Array2<f32>,
    pub biases: Array1<f32>,
}

/// Every trainable parameter of an approximator, in layer order.
///
/// Gradients share this layout so optimizers can walk both in lockstep.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Parameters {
    pub layers: Vec<LayerParams>,
}

impl Parameters {
    pub fn zeros_like(other: &Parameters) -> Self {
        Parameters {
            layers: other
                .layers
                .iter()
                .map(|layer| LayerParams {
                    weights: Array2::zeros(layer.weights.dim()),
                    biases: Array1::zeros(layer.biases.dim()),
                })
                .collect(),
        }
    }

    /// `(weights shape, bias length)` per layer.
    pub fn shapes(&self) -> Vec<((usize, usize), usize)> {
        self.layers
            .iter()
            .map(|layer| (layer.weights.dim(), layer.biases.len()))
            .collect()
    }

    pub fn num_parameters(&self) -> usize {
        self.layers
            .iter()
            .map(|layer| layer.weights.len() + layer.biases.len())
            .sum()
    }

    /// Fails with `ShapeMismatch` unless `other` has exactly the same layout.
    pub fn check_same_shape(&self, other: &Parameters) -> Result<()> {
        let expected = self.shapes();
        let actual = other.shapes();
        if expected != actual {
            return Err(DqnError::shape_mismatch(
                format!("{:?}", expected),
                format!("{:?}", actual),
            ));
        }
        Ok(())
    }
}

/// Activation applied after a dense layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Activation {
    Relu,
    Linear,
}

impl Activation {
    fn apply_batch(&self, inputs: &mut Array2<f32>) {
        match self {
            Activation::Relu => inputs.mapv_inplace(|v| v.max(0.0)),
            Activation::Linear => {}
        }
    }

    fn derivative_batch(&self, inputs: ArrayView2<f32>) -> Array2<f32> {
        match self {
            Activation::Relu => inputs.mapv(|v| if v > 0.0 { 1.0 } else { 0.0 }),
            Activation::Linear => Array2::ones(inputs.dim()),
        }
    }
}

/// The capability both the online and the target approximator provide.
pub trait QFunction {
    /// Length of a single state vector.
    fn input_dim(&self) -> usize;

    /// Number of discrete actions (width of every output row).
    fn num_actions(&self) -> usize;

    /// Pure inference: `(batch, input_dim) -> (batch, num_actions)`.
    fn predict(&self, states: ArrayView2<f32>) -> Result<Array2<f32>>;

    /// Forward pass that records what [`QFunction::backward`] needs.
    fn forward_train(&mut self, states: ArrayView2<f32>) -> Result<Array2<f32>>;

    /// Gradients of the loss w.r.t. every parameter, given the loss gradient
    /// w.r.t. the outputs of the last `forward_train` call.
    fn backward(&self, output_grad: ArrayView2<f32>) -> Result<Parameters>;

    fn parameters(&self) -> &Parameters;

    fn parameters_mut(&mut self) -> &mut Parameters;

    /// Overwrites every parameter with an exact copy of `params`.
    fn set_parameters(&mut self, params: &Parameters) -> Result<()> {
        self.parameters().check_same_shape(params)?;
        self.parameters_mut().clone_from(params);
        Ok(())
    }
}

#[derive(Clone, Debug)]
struct LayerCache {
    inputs: Array2<f32>,
    pre_activation: Array2<f32>,
}

/// Multi-layer perceptron with ReLU hidden layers and a linear output.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NeuralNetwork {
    params: Parameters,
    activations: Vec<Activation>,
    #[serde(skip)]
    cache: Vec<LayerCache>,
}

impl NeuralNetwork {
    /// Builds a network from explicit layer sizes and one activation per layer.
    ///
    /// Weights and biases are drawn from `U(-1/sqrt(fan_in), 1/sqrt(fan_in))`
    /// using `rng`, so two networks built from identically seeded RNGs are
    /// identical.
    pub fn new<R: Rng + ?Sized>(
        layer_sizes: &[usize],
        activations: &[Activation],
        rng: &mut R,
    ) -> Result<Self> {
        if layer_sizes.len() < 2 {
            return Err(DqnError::invalid_parameter(
                "layer_sizes",
                "must contain at least input and output sizes",
            ));
        }
        if layer_sizes.iter().any(|&size| size == 0) {
            return Err(DqnError::invalid_parameter(
                "layer_sizes",
                "every layer must have at least one unit",
            ));
        }
        if activations.len() != layer_sizes.len() - 1 {
            return Err(DqnError::invalid_parameter(
                "activations",
                "need exactly one activation per layer",
            ));
        }

        let layers = layer_sizes
            .windows(2)
            .map(|window| {
                let (fan_in, fan_out) = (window[0], window[1]);
                let bound = 1.0 / (fan_in as f32).sqrt();
                let dist = Uniform::new(-bound, bound);
                LayerParams {
                    weights: Array2::random_using((fan_in, fan_out), dist, rng),
                    biases: Array1::random_using(fan_out, dist, rng),
                }
            })
            .collect();

        Ok(NeuralNetwork {
            params: Parameters { layers },
            activations: activations.to_vec(),
            cache: Vec::new(),
        })
    }

    /// State-to-action-values network: `input_dim -> hidden... -> num_actions`.
    pub fn q_network<R: Rng + ?Sized>(
        input_dim: usize,
        hidden_sizes: &[usize],
        num_actions: usize,
        rng: &mut R,
    ) -> Result<Self> {
        let mut sizes = Vec::with_capacity(hidden_sizes.len() + 2);
        sizes.push(input_dim);
        sizes.extend_from_slice(hidden_sizes);
        sizes.push(num_actions);

        let mut activations = vec![Activation::Relu; hidden_sizes.len()];
        activations.push(Activation::Linear);

        Self::new(&sizes, &activations, rng)
    }

    pub fn activations(&self) -> &[Activation] {
        &self.activations
    }

    fn check_input(&self, states: &ArrayView2<f32>) -> Result<()> {
        let expected = self.input_dim();
        if states.ncols() != expected {
            return Err(DqnError::shape_mismatch(
                format!("state dimension {}", expected),
                format!("state dimension {}", states.ncols()),
            ));
        }
        Ok(())
    }
}

impl QFunction for NeuralNetwork {
    fn input_dim(&self) -> usize {
        self.params.layers.first().map_or(0, |layer| layer.weights.nrows())
    }

    fn num_actions(&self) -> usize {
        self.params.layers.last().map_or(0, |layer| layer.biases.len())
    }

    fn predict(&self, states: ArrayView2<f32>) -> Result<Array2<f32>> {
        self.check_input(&states)?;
        let mut current = states.to_owned();
        for (layer, activation) in self.params.layers.iter().zip(&self.activations) {
            let mut outputs = current.dot(&layer.weights) + &layer.biases;
            activation.apply_batch(&mut outputs);
            current = outputs;
        }
        Ok(current)
    }

    fn forward_train(&mut self, states: ArrayView2<f32>) -> Result<Array2<f32>> {
        self.check_input(&states)?;
        self.cache.clear();
        let mut current = states.to_owned();
        for (layer, activation) in self.params.layers.iter().zip(&self.activations) {
            let pre_activation = current.dot(&layer.weights) + &layer.biases;
            let mut outputs = pre_activation.clone();
            activation.apply_batch(&mut outputs);
            self.cache.push(LayerCache {
                inputs: current,
                pre_activation,
            });
            current = outputs;
        }
        Ok(current)
    }

    fn backward(&self, output_grad: ArrayView2<f32>) -> Result<Parameters> {
        if self.cache.is_empty() || self.cache.len() != self.params.layers.len() {
            return Err(DqnError::shape_mismatch(
                "activations cached by forward_train",
                "no cached forward pass",
            ));
        }
        let expected = (self.cache[self.cache.len() - 1].pre_activation.nrows(), self.num_actions());
        if output_grad.dim() != expected {
            return Err(DqnError::shape_mismatch(
                format!("output gradient {:?}", expected),
                format!("output gradient {:?}", output_grad.dim()),
            ));
        }

        let mut grads = Vec::with_capacity(self.params.layers.len());
        let mut error = output_grad.to_owned();
        for i in (0..self.params.layers.len()).rev() {
            let cache = &self.cache[i];
            let delta = &error * &self.activations[i].derivative_batch(cache.pre_activation.view());
            grads.push(LayerParams {
                weights: cache.inputs.t().dot(&delta),
                biases: delta.sum_axis(Axis(0)),
            });
            if i > 0 {
                error = delta.dot(&self.params.layers[i].weights.t());
            }
        }
        grads.reverse();

        Ok(Parameters { layers: grads })
    }

    fn parameters(&self) -> &Parameters {
        &self.params
    }

    fn parameters_mut(&mut self) -> &mut Parameters {
        &mut self.params
    }
}
