use ndarray::{arr2, Array2};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::error::DqnError;
use crate::network::{Activation, NeuralNetwork, QFunction};

fn rng() -> StdRng {
    StdRng::seed_from_u64(42)
}

#[test]
fn test_neural_network_creation() {
    let network = NeuralNetwork::q_network(3, &[4], 2, &mut rng()).unwrap();
    let params = network.parameters();

    assert_eq!(params.layers.len(), 2);
    assert_eq!(params.layers[0].weights.shape(), [3, 4]);
    assert_eq!(params.layers[0].biases.shape(), [4]);
    assert_eq!(params.layers[1].weights.shape(), [4, 2]);
    assert_eq!(params.layers[1].biases.shape(), [2]);
    assert_eq!(network.activations(), &[Activation::Relu, Activation::Linear]);
    assert_eq!(network.input_dim(), 3);
    assert_eq!(network.num_actions(), 2);
    assert_eq!(params.num_parameters(), 3 * 4 + 4 + 4 * 2 + 2);
}

#[test]
fn test_initialisation_bounds() {
    let network = NeuralNetwork::q_network(16, &[8], 2, &mut rng()).unwrap();
    let bound = 1.0 / 16f32.sqrt();
    let first = &network.parameters().layers[0];
    assert!(first.weights.iter().all(|w| w.abs() <= bound));
    assert!(first.biases.iter().all(|b| b.abs() <= bound));
}

#[test]
fn test_same_seed_same_network() {
    let a = NeuralNetwork::q_network(4, &[8, 8], 2, &mut rng()).unwrap();
    let b = NeuralNetwork::q_network(4, &[8, 8], 2, &mut rng()).unwrap();
    assert_eq!(a.parameters(), b.parameters());
}

#[test]
fn test_invalid_architectures() {
    assert!(NeuralNetwork::new(&[4], &[], &mut rng()).is_err());
    assert!(NeuralNetwork::new(&[4, 0, 2], &[Activation::Relu, Activation::Linear], &mut rng()).is_err());
    assert!(NeuralNetwork::new(&[4, 2], &[Activation::Relu, Activation::Linear], &mut rng()).is_err());
}

#[test]
fn test_predict_batch_shape_and_purity() {
    let mut network = NeuralNetwork::q_network(3, &[5], 2, &mut rng()).unwrap();
    let inputs = arr2(&[[1.0, 2.0, 3.0], [0.5, -0.5, 0.0], [0.0, 0.0, 0.0]]);

    let predicted = network.predict(inputs.view()).unwrap();
    assert_eq!(predicted.shape(), [3, 2]);

    let trained = network.forward_train(inputs.view()).unwrap();
    assert_eq!(predicted, trained);
    assert_eq!(network.predict(inputs.view()).unwrap(), predicted);
}

#[test]
fn test_predict_rejects_wrong_state_dim() {
    let network = NeuralNetwork::q_network(3, &[5], 2, &mut rng()).unwrap();
    let inputs = Array2::<f32>::zeros((1, 4));
    assert!(matches!(
        network.predict(inputs.view()),
        Err(DqnError::ShapeMismatch { .. })
    ));
}

#[test]
fn test_backward_requires_forward_train() {
    let network = NeuralNetwork::q_network(3, &[5], 2, &mut rng()).unwrap();
    let grad = Array2::<f32>::zeros((1, 2));
    assert!(network.backward(grad.view()).is_err());
}

#[test]
fn test_backward_matches_finite_differences() {
    // Linear layers only, so the probe below is exactly linear in each parameter
    let mut network = NeuralNetwork::new(
        &[3, 4, 2],
        &[Activation::Linear, Activation::Linear],
        &mut rng(),
    )
    .unwrap();
    let inputs = arr2(&[[0.3, -0.2, 0.5], [1.0, 0.1, -0.4]]);
    let output_grad = arr2(&[[1.0, -0.5], [0.25, 2.0]]);

    network.forward_train(inputs.view()).unwrap();
    let grads = network.backward(output_grad.view()).unwrap();

    // L(theta) = sum(output * output_grad)  =>  dL/dtheta == backward(output_grad)
    let probe = |net: &NeuralNetwork| -> f32 {
        (&net.predict(inputs.view()).unwrap() * &output_grad).sum()
    };

    let eps = 1e-2;
    for layer in 0..2 {
        let (rows, cols) = network.parameters().layers[layer].weights.dim();
        for r in 0..rows {
            for c in 0..cols {
                let mut plus = network.clone();
                plus.parameters_mut().layers[layer].weights[[r, c]] += eps;
                let mut minus = network.clone();
                minus.parameters_mut().layers[layer].weights[[r, c]] -= eps;
                let numeric = (probe(&plus) - probe(&minus)) / (2.0 * eps);
                let analytic = grads.layers[layer].weights[[r, c]];
                assert!(
                    (numeric - analytic).abs() < 1e-2,
                    "layer {} weight [{}, {}]: numeric {} analytic {}",
                    layer, r, c, numeric, analytic
                );
            }
        }
        for j in 0..network.parameters().layers[layer].biases.len() {
            let mut plus = network.clone();
            plus.parameters_mut().layers[layer].biases[j] += eps;
            let mut minus = network.clone();
            minus.parameters_mut().layers[layer].biases[j] -= eps;
            let numeric = (probe(&plus) - probe(&minus)) / (2.0 * eps);
            let analytic = grads.layers[layer].biases[j];
            assert!((numeric - analytic).abs() < 1e-2);
        }
    }
}

#[test]
fn test_set_parameters_copies_exactly() {
    let source = NeuralNetwork::q_network(4, &[8], 3, &mut StdRng::seed_from_u64(1)).unwrap();
    let mut dest = NeuralNetwork::q_network(4, &[8], 3, &mut StdRng::seed_from_u64(2)).unwrap();
    assert_ne!(source.parameters(), dest.parameters());

    dest.set_parameters(source.parameters()).unwrap();
    assert_eq!(source.parameters(), dest.parameters());
}

#[test]
fn test_set_parameters_rejects_other_shapes() {
    let source = NeuralNetwork::q_network(4, &[16], 3, &mut rng()).unwrap();
    let mut dest = NeuralNetwork::q_network(4, &[8], 3, &mut rng()).unwrap();
    let before = dest.parameters().clone();

    assert!(matches!(
        dest.set_parameters(source.parameters()),
        Err(DqnError::ShapeMismatch { .. })
    ));
    assert_eq!(dest.parameters(), &before);
}
