//! LSTM layer with backpropagation through time.
//!
//! Gate order inside the packed weight matrices is input, forget, cell
//! candidate, output.

use ndarray::{Array1, Array2, Axis, Ix1, Ix2, s};
use ndarray_rand::RandomExt;
use ndarray_rand::rand_distr::Uniform;
use rand::Rng;

use super::optimizer::{Adam, Moments};

fn sigmoid(v: f64) -> f64 {
    1.0 / (1.0 + (-v).exp())
}

/// Activations of one time step, kept for the backward pass
#[derive(Debug, Clone)]
struct StepCache {
    x: Array2<f64>,
    h_prev: Array2<f64>,
    c_prev: Array2<f64>,
    i: Array2<f64>,
    f: Array2<f64>,
    g: Array2<f64>,
    o: Array2<f64>,
    tanh_c: Array2<f64>,
}

/// Forward-pass record of one batch; empty when run in inference mode
#[derive(Debug, Clone, Default)]
pub struct LstmCache {
    steps: Vec<StepCache>,
}

#[derive(Debug, Clone)]
pub struct LstmGrads {
    pub kernel: Array2<f64>,
    pub recurrent: Array2<f64>,
    pub bias: Array1<f64>,
}

#[derive(Debug, Clone)]
pub struct LstmLayer {
    pub input_size: usize,
    pub hidden_size: usize,
    /// `(input_size, 4 * hidden)`
    kernel: Array2<f64>,
    /// `(hidden, 4 * hidden)`
    recurrent: Array2<f64>,
    /// `(4 * hidden)`
    bias: Array1<f64>,
    m_kernel: Moments<Ix2>,
    m_recurrent: Moments<Ix2>,
    m_bias: Moments<Ix1>,
}

impl LstmLayer {
    pub fn new<R: Rng + ?Sized>(input_size: usize, hidden_size: usize, rng: &mut R) -> Self {
        let gates = 4 * hidden_size;
        let k_limit = (6.0 / (input_size + gates) as f64).sqrt();
        let r_limit = (6.0 / (hidden_size + gates) as f64).sqrt();

        let kernel = Array2::random_using((input_size, gates), Uniform::new(-k_limit, k_limit), rng);
        let recurrent =
            Array2::random_using((hidden_size, gates), Uniform::new(-r_limit, r_limit), rng);
        let mut bias = Array1::<f64>::zeros(gates);
        // forget gate starts open
        bias.slice_mut(s![hidden_size..2 * hidden_size]).fill(1.0);

        Self {
            input_size,
            hidden_size,
            m_kernel: Moments::zeros_like(&kernel),
            m_recurrent: Moments::zeros_like(&recurrent),
            m_bias: Moments::zeros_like(&bias),
            kernel,
            recurrent,
            bias,
        }
    }

    /// Run the layer over a sequence of `(batch, input_size)` steps.
    ///
    /// Returns the hidden state at every step. With `training` set, the
    /// activations needed by [`LstmLayer::backward`] are recorded.
    pub fn forward(&self, inputs: &[Array2<f64>], training: bool) -> (Vec<Array2<f64>>, LstmCache) {
        let h = self.hidden_size;
        let batch = inputs.first().map_or(0, |x| x.nrows());

        let mut h_prev = Array2::<f64>::zeros((batch, h));
        let mut c_prev = Array2::<f64>::zeros((batch, h));
        let mut outputs = Vec::with_capacity(inputs.len());
        let mut cache = LstmCache::default();

        for x in inputs {
            let z = x.dot(&self.kernel) + h_prev.dot(&self.recurrent) + &self.bias;
            let i = z.slice(s![.., 0..h]).mapv(sigmoid);
            let f = z.slice(s![.., h..2 * h]).mapv(sigmoid);
            let g = z.slice(s![.., 2 * h..3 * h]).mapv(f64::tanh);
            let o = z.slice(s![.., 3 * h..4 * h]).mapv(sigmoid);

            let c = &f * &c_prev + &i * &g;
            let tanh_c = c.mapv(f64::tanh);
            let h_next = &o * &tanh_c;

            if training {
                cache.steps.push(StepCache {
                    x: x.clone(),
                    h_prev: h_prev.clone(),
                    c_prev: c_prev.clone(),
                    i,
                    f,
                    g,
                    o,
                    tanh_c,
                });
            }

            outputs.push(h_next.clone());
            h_prev = h_next;
            c_prev = c;
        }

        (outputs, cache)
    }

    /// Backpropagate through time.
    ///
    /// `d_outputs[t]` is the loss gradient with respect to the hidden state
    /// emitted at step `t`. Returns the gradient for each input step and the
    /// parameter gradients.
    pub fn backward(&self, cache: &LstmCache, d_outputs: &[Array2<f64>]) -> (Vec<Array2<f64>>, LstmGrads) {
        let h = self.hidden_size;
        let steps = cache.steps.len();
        let batch = cache.steps.first().map_or(0, |st| st.x.nrows());

        let mut grads = LstmGrads {
            kernel: Array2::zeros(self.kernel.raw_dim()),
            recurrent: Array2::zeros(self.recurrent.raw_dim()),
            bias: Array1::zeros(self.bias.raw_dim()),
        };
        let mut d_inputs: Vec<Array2<f64>> = vec![Array2::zeros((batch, self.input_size)); steps];
        let mut dh_next = Array2::<f64>::zeros((batch, h));
        let mut dc_next = Array2::<f64>::zeros((batch, h));

        for t in (0..steps).rev() {
            let st = &cache.steps[t];
            let dh = &d_outputs[t] + &dh_next;

            let d_o = &dh * &st.tanh_c;
            let dc = &dc_next + &(&dh * &st.o * &st.tanh_c.mapv(|v| 1.0 - v * v));
            let d_i = &dc * &st.g;
            let d_g = &dc * &st.i;
            let d_f = &dc * &st.c_prev;
            dc_next = &dc * &st.f;

            let mut dz = Array2::<f64>::zeros((batch, 4 * h));
            dz.slice_mut(s![.., 0..h])
                .assign(&(&d_i * &st.i.mapv(|v| v * (1.0 - v))));
            dz.slice_mut(s![.., h..2 * h])
                .assign(&(&d_f * &st.f.mapv(|v| v * (1.0 - v))));
            dz.slice_mut(s![.., 2 * h..3 * h])
                .assign(&(&d_g * &st.g.mapv(|v| 1.0 - v * v)));
            dz.slice_mut(s![.., 3 * h..4 * h])
                .assign(&(&d_o * &st.o.mapv(|v| v * (1.0 - v))));

            grads.kernel += &st.x.t().dot(&dz);
            grads.recurrent += &st.h_prev.t().dot(&dz);
            grads.bias += &dz.sum_axis(Axis(0));

            d_inputs[t] = dz.dot(&self.kernel.t());
            dh_next = dz.dot(&self.recurrent.t());
        }

        (d_inputs, grads)
    }

    pub fn apply(&mut self, grads: &LstmGrads, adam: &Adam) {
        self.m_kernel.step(adam, &mut self.kernel, &grads.kernel);
        self.m_recurrent.step(adam, &mut self.recurrent, &grads.recurrent);
        self.m_bias.step(adam, &mut self.bias, &grads.bias);
    }
}
