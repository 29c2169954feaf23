//! Adam (Adaptive Moment Estimation)

use ndarray::{Array, Dimension, Zip};
use serde::{Deserialize, Serialize};

/// Shared Adam hyperparameters and step counter.
///
/// The step counter advances once per mini-batch; every parameter tensor is
/// then updated with the same bias correction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Adam {
    pub learning_rate: f64,
    pub beta1: f64,
    pub beta2: f64,
    pub epsilon: f64,
    #[serde(skip)]
    t: u64,
}

impl Adam {
    pub fn new(learning_rate: f64) -> Self {
        Self {
            learning_rate,
            beta1: 0.9,
            beta2: 0.999,
            epsilon: 1e-7,
            t: 0,
        }
    }

    /// Begin a new update step
    pub fn tick(&mut self) {
        self.t += 1;
    }

    pub fn steps(&self) -> u64 {
        self.t
    }

    fn bias_corrections(&self) -> (f64, f64) {
        let t = self.t.max(1) as i32;
        (1.0 - self.beta1.powi(t), 1.0 - self.beta2.powi(t))
    }
}

/// First and second moment estimates for one parameter tensor
#[derive(Debug, Clone)]
pub struct Moments<D: Dimension> {
    m: Array<f64, D>,
    v: Array<f64, D>,
}

impl<D: Dimension> Moments<D> {
    pub fn zeros_like(param: &Array<f64, D>) -> Self {
        Self {
            m: Array::zeros(param.raw_dim()),
            v: Array::zeros(param.raw_dim()),
        }
    }

    /// Apply one Adam update of `param` along `grad`
    pub fn step(&mut self, adam: &Adam, param: &mut Array<f64, D>, grad: &Array<f64, D>) {
        let (b1, b2) = (adam.beta1, adam.beta2);
        let (bc1, bc2) = adam.bias_corrections();
        let (lr, eps) = (adam.learning_rate, adam.epsilon);

        Zip::from(param)
            .and(&mut self.m)
            .and(&mut self.v)
            .and(grad)
            .for_each(|p, m, v, &g| {
                *m = b1 * *m + (1.0 - b1) * g;
                *v = b2 * *v + (1.0 - b2) * g * g;
                let m_hat = *m / bc1;
                let v_hat = *v / bc2;
                *p -= lr * m_hat / (v_hat.sqrt() + eps);
            });
    }
}
