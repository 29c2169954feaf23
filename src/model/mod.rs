//! Stacked-LSTM sequence regressor.
//!
//! Layout: LSTM layers (each followed by dropout, the last one emitting only
//! its final hidden state) → dense ReLU layer → single linear output unit.
//!
//! ```rust,no_run
//! use aqi_forecast::{RegressorConfig, SequenceRegressor};
//! # fn demo(train: &aqi_forecast::Dataset, test: &aqi_forecast::Dataset) -> aqi_forecast::Result<()> {
//! let mut model = SequenceRegressor::new(RegressorConfig::default().with_seed(Some(7)))?;
//! let history = model.fit(train, Some(test), 100, 16)?;
//! let y_pred = model.predict(&test.windows)?;
//! # Ok(())
//! # }
//! ```

mod config;
mod dense;
mod lstm;
mod optimizer;

pub use config::RegressorConfig;
pub use dense::{Activation, Dense, DenseGrads};
pub use lstm::{LstmCache, LstmGrads, LstmLayer};
pub use optimizer::{Adam, Moments};

use log::{debug, info};
use matlib::{dropout_keep, seeded_rng, shuffled_indices};
use ndarray::{Array1, Array2, Array3, Axis, s};
use rand::rngs::StdRng;
use serde::Serialize;

use crate::error::{ForecastError, Result};
use crate::window::Dataset;

/// Losses recorded at the end of one epoch
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EpochLoss {
    pub epoch: usize,
    pub train_loss: f64,
    pub val_loss: Option<f64>,
}

/// Per-epoch losses of one `fit` call
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TrainingHistory {
    pub epochs: Vec<EpochLoss>,
}

impl TrainingHistory {
    pub fn final_train_loss(&self) -> Option<f64> {
        self.epochs.last().map(|e| e.train_loss)
    }

    pub fn final_val_loss(&self) -> Option<f64> {
        self.epochs.last().and_then(|e| e.val_loss)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegressorState {
    /// Constructed, parameters still at their random initialisation
    Untrained,
    /// At least one `fit` call has completed
    Trained,
}

/// Operations the cross-validation loop needs from a model
pub trait SequenceModel {
    fn fit(
        &mut self,
        train: &Dataset,
        validation: Option<&Dataset>,
        epochs: usize,
        batch_size: usize,
    ) -> Result<TrainingHistory>;

    fn predict(&self, windows: &Array3<f64>) -> Result<Array1<f64>>;

    fn evaluate(&self, data: &Dataset) -> Result<f64>;
}

// Everything the backward pass needs from one training forward pass.
struct ForwardTrace {
    caches: Vec<LstmCache>,
    masks: Vec<Vec<Array2<f64>>>,
    dense_input: Array2<f64>,
    hidden_pre: Array2<f64>,
    hidden_out: Array2<f64>,
    output_pre: Array2<f64>,
}

#[derive(Debug)]
pub struct SequenceRegressor {
    config: RegressorConfig,
    lstm: Vec<LstmLayer>,
    hidden: Dense,
    output: Dense,
    adam: Adam,
    rng: StdRng,
    epochs_trained: usize,
}

impl SequenceRegressor {
    /// Build an untrained model with freshly initialised parameters
    pub fn new(config: RegressorConfig) -> Result<Self> {
        config.validate()?;
        let mut rng = seeded_rng(config.seed);

        let mut lstm = Vec::with_capacity(config.lstm_units.len());
        let mut input_size = config.feature_count;
        for &units in &config.lstm_units {
            lstm.push(LstmLayer::new(input_size, units, &mut rng));
            input_size = units;
        }
        let hidden = Dense::new(input_size, config.dense_units, Activation::ReLU, &mut rng);
        let output = Dense::new(config.dense_units, 1, Activation::Linear, &mut rng);

        debug!(
            "regressor: lstm {:?}, dropout {}, dense {}, lr {}",
            config.lstm_units, config.dropout, config.dense_units, config.learning_rate
        );

        Ok(Self {
            adam: Adam::new(config.learning_rate),
            config,
            lstm,
            hidden,
            output,
            rng,
            epochs_trained: 0,
        })
    }

    pub fn config(&self) -> &RegressorConfig {
        &self.config
    }

    pub fn state(&self) -> RegressorState {
        if self.epochs_trained == 0 {
            RegressorState::Untrained
        } else {
            RegressorState::Trained
        }
    }

    /// Total epochs run across every `fit` call
    pub fn epochs_trained(&self) -> usize {
        self.epochs_trained
    }

    fn check_windows(&self, windows: &Array3<f64>) -> Result<()> {
        let shape = windows.shape();
        if shape[1] != self.config.sequence_length || shape[2] != self.config.feature_count {
            return Err(ForecastError::Shape(format!(
                "expected windows of shape (_, {}, {}), got ({}, {}, {})",
                self.config.sequence_length,
                self.config.feature_count,
                shape[0],
                shape[1],
                shape[2]
            )));
        }
        if shape[0] == 0 {
            return Err(ForecastError::EmptyInput("no windows".to_string()));
        }
        Ok(())
    }

    fn check_dataset(&self, data: &Dataset) -> Result<()> {
        self.check_windows(&data.windows)?;
        if data.labels.len() != data.windows.len_of(Axis(0)) {
            return Err(ForecastError::Shape(format!(
                "{} windows but {} labels",
                data.windows.len_of(Axis(0)),
                data.labels.len()
            )));
        }
        Ok(())
    }

    // Split `(batch, steps, features)` into one `(batch, features)` matrix per step.
    fn steps_of(windows: &Array3<f64>) -> Vec<Array2<f64>> {
        (0..windows.len_of(Axis(1)))
            .map(|t| windows.slice(s![.., t, ..]).to_owned())
            .collect()
    }

    fn forward_train(&mut self, windows: &Array3<f64>) -> (Array1<f64>, ForwardTrace) {
        let mut seq = Self::steps_of(windows);
        let mut caches = Vec::with_capacity(self.lstm.len());
        let mut masks = Vec::with_capacity(self.lstm.len());
        let last_layer = self.lstm.len() - 1;

        for (l, layer) in self.lstm.iter().enumerate() {
            let (mut hs, cache) = layer.forward(&seq, true);
            if l == last_layer {
                hs = hs.split_off(hs.len() - 1);
            }
            let mut layer_masks = Vec::new();
            let rate = self.config.dropout;
            if rate > 0.0 {
                for h in hs.iter_mut() {
                    let mask = Array2::from_shape_fn(h.raw_dim(), |_| {
                        dropout_keep(&mut self.rng, rate)
                    });
                    *h *= &mask;
                    layer_masks.push(mask);
                }
            }
            caches.push(cache);
            masks.push(layer_masks);
            seq = hs;
        }

        let dense_input = seq.pop().unwrap_or_default();
        let (hidden_out, hidden_pre) = self.hidden.forward(&dense_input);
        let (y, output_pre) = self.output.forward(&hidden_out);
        let y = y.column(0).to_owned();

        (
            y,
            ForwardTrace {
                caches,
                masks,
                dense_input,
                hidden_pre,
                hidden_out,
                output_pre,
            },
        )
    }

    // Gradient step on one mini-batch; returns the batch MSE before the update.
    fn train_batch(&mut self, windows: &Array3<f64>, labels: &Array1<f64>) -> f64 {
        let (pred, trace) = self.forward_train(windows);
        let batch = labels.len() as f64;
        let err = &pred - labels;
        let loss = err.mapv(|e| e * e).sum() / batch;

        let d_pred = (err * (2.0 / batch)).insert_axis(Axis(1));
        let (d_hidden, g_output) = self.output.backward(&trace.hidden_out, &trace.output_pre, &d_pred);
        let (d_last, g_hidden) = self.hidden.backward(&trace.dense_input, &trace.hidden_pre, &d_hidden);

        let steps = self.config.sequence_length;
        let mut lstm_grads = Vec::with_capacity(self.lstm.len());
        // gradient w.r.t. the (dropped-out) outputs of the layer being processed
        let mut d_seq: Vec<Array2<f64>> = vec![d_last];

        for l in (0..self.lstm.len()).rev() {
            let layer = &self.lstm[l];
            for (d, mask) in d_seq.iter_mut().zip(&trace.masks[l]) {
                *d *= mask;
            }
            if d_seq.len() < steps {
                // final layer: only its last hidden state feeds forward
                let zeros = Array2::zeros((labels.len(), layer.hidden_size));
                let mut full = vec![zeros; steps - d_seq.len()];
                full.append(&mut d_seq);
                d_seq = full;
            }
            let (d_inputs, grads) = layer.backward(&trace.caches[l], &d_seq);
            lstm_grads.push(grads);
            d_seq = d_inputs;
        }

        self.adam.tick();
        self.output.apply(&g_output, &self.adam);
        self.hidden.apply(&g_hidden, &self.adam);
        for (layer, grads) in self.lstm.iter_mut().rev().zip(&lstm_grads) {
            layer.apply(grads, &self.adam);
        }

        loss
    }

    /// Train with mini-batch Adam on mean-squared error.
    ///
    /// Batch order is reshuffled every epoch. Losses are logged and returned
    /// per epoch; the training loss is the size-weighted mean over batches.
    pub fn fit(
        &mut self,
        train: &Dataset,
        validation: Option<&Dataset>,
        epochs: usize,
        batch_size: usize,
    ) -> Result<TrainingHistory> {
        if epochs == 0 {
            return Err(ForecastError::InvalidConfig("epochs must be greater than 0".to_string()));
        }
        if batch_size == 0 {
            return Err(ForecastError::InvalidConfig(
                "batch_size must be greater than 0".to_string(),
            ));
        }
        self.check_dataset(train)?;
        if let Some(val) = validation {
            self.check_dataset(val)?;
        }

        let n = train.len();
        let mut history = TrainingHistory::default();

        for epoch in 1..=epochs {
            let order = shuffled_indices(&mut self.rng, n);
            let mut loss_sum = 0.0;

            for chunk in order.chunks(batch_size) {
                let x = train.windows.select(Axis(0), chunk);
                let y = train.labels.select(Axis(0), chunk);
                loss_sum += self.train_batch(&x, &y) * chunk.len() as f64;
            }

            let train_loss = loss_sum / n as f64;
            let val_loss = validation.map(|v| self.evaluate(v)).transpose()?;
            self.epochs_trained += 1;

            match val_loss {
                Some(vl) => info!(
                    "epoch {}/{} - loss: {:.6} - val_loss: {:.6}",
                    epoch, epochs, train_loss, vl
                ),
                None => info!("epoch {}/{} - loss: {:.6}", epoch, epochs, train_loss),
            }
            history.epochs.push(EpochLoss {
                epoch,
                train_loss,
                val_loss,
            });
        }

        Ok(history)
    }

    /// Forecast one value per window. Dropout is disabled.
    pub fn predict(&self, windows: &Array3<f64>) -> Result<Array1<f64>> {
        self.check_windows(windows)?;

        let mut seq = Self::steps_of(windows);
        let last_layer = self.lstm.len() - 1;
        for (l, layer) in self.lstm.iter().enumerate() {
            let (mut hs, _) = layer.forward(&seq, false);
            if l == last_layer {
                hs = hs.split_off(hs.len() - 1);
            }
            seq = hs;
        }
        let dense_input = seq.pop().unwrap_or_default();
        let (hidden_out, _) = self.hidden.forward(&dense_input);
        let (y, _) = self.output.forward(&hidden_out);
        Ok(y.column(0).to_owned())
    }

    /// Mean-squared error of [`SequenceRegressor::predict`] against the labels
    pub fn evaluate(&self, data: &Dataset) -> Result<f64> {
        self.check_dataset(data)?;
        let pred = self.predict(&data.windows)?;
        Ok(stats::mean_squared_diff(&pred.to_vec(), &data.labels.to_vec()))
    }
}

impl SequenceModel for SequenceRegressor {
    fn fit(
        &mut self,
        train: &Dataset,
        validation: Option<&Dataset>,
        epochs: usize,
        batch_size: usize,
    ) -> Result<TrainingHistory> {
        SequenceRegressor::fit(self, train, validation, epochs, batch_size)
    }

    fn predict(&self, windows: &Array3<f64>) -> Result<Array1<f64>> {
        SequenceRegressor::predict(self, windows)
    }

    fn evaluate(&self, data: &Dataset) -> Result<f64> {
        SequenceRegressor::evaluate(self, data)
    }
}
