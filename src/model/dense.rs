//! Fully connected layer

use ndarray::{Array1, Array2, Axis, Ix1, Ix2};
use ndarray_rand::RandomExt;
use ndarray_rand::rand_distr::Uniform;
use rand::Rng;

use super::optimizer::{Adam, Moments};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    Linear,
    ReLU,
}

impl Activation {
    fn apply(self, z: &Array2<f64>) -> Array2<f64> {
        match self {
            Activation::Linear => z.clone(),
            Activation::ReLU => z.mapv(|v| v.max(0.0)),
        }
    }

    fn derivative(self, z: &Array2<f64>) -> Array2<f64> {
        match self {
            Activation::Linear => Array2::ones(z.raw_dim()),
            Activation::ReLU => z.mapv(|v| if v > 0.0 { 1.0 } else { 0.0 }),
        }
    }
}

/// Gradients of a dense layer for one mini-batch
#[derive(Debug, Clone)]
pub struct DenseGrads {
    pub weights: Array2<f64>,
    pub biases: Array1<f64>,
}

/// `y = act(x · W + b)` with `W` of shape `(inputs, outputs)`
#[derive(Debug, Clone)]
pub struct Dense {
    pub weights: Array2<f64>,
    pub biases: Array1<f64>,
    pub activation: Activation,
    m_weights: Moments<Ix2>,
    m_biases: Moments<Ix1>,
}

impl Dense {
    /// Glorot-uniform weights, zero biases
    pub fn new<R: Rng + ?Sized>(
        inputs: usize,
        outputs: usize,
        activation: Activation,
        rng: &mut R,
    ) -> Self {
        let limit = (6.0 / (inputs + outputs) as f64).sqrt();
        let weights = Array2::random_using((inputs, outputs), Uniform::new(-limit, limit), rng);
        let biases = Array1::zeros(outputs);
        Self {
            m_weights: Moments::zeros_like(&weights),
            m_biases: Moments::zeros_like(&biases),
            weights,
            biases,
            activation,
        }
    }

    pub fn outputs(&self) -> usize {
        self.biases.len()
    }

    /// Returns `(activation, pre-activation)`; the latter is needed for backward
    pub fn forward(&self, x: &Array2<f64>) -> (Array2<f64>, Array2<f64>) {
        let z = x.dot(&self.weights) + &self.biases;
        (self.activation.apply(&z), z)
    }

    /// Backpropagate `dy` through the layer, returning the input gradient
    pub fn backward(
        &self,
        x: &Array2<f64>,
        z: &Array2<f64>,
        dy: &Array2<f64>,
    ) -> (Array2<f64>, DenseGrads) {
        let dz = dy * &self.activation.derivative(z);
        let grads = DenseGrads {
            weights: x.t().dot(&dz),
            biases: dz.sum_axis(Axis(0)),
        };
        (dz.dot(&self.weights.t()), grads)
    }

    pub fn apply(&mut self, grads: &DenseGrads, adam: &Adam) {
        self.m_weights.step(adam, &mut self.weights, &grads.weights);
        self.m_biases.step(adam, &mut self.biases, &grads.biases);
    }
}
