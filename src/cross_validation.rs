//! Randomised k-fold cross-validation over a windowed dataset.

use log::info;
use matlib::{seeded_rng, shuffled_indices};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{ForecastError, Result};
use crate::model::SequenceModel;
use crate::window::Dataset;

/// Whether folds share one model instance
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FoldMode {
    /// New model from the factory for every fold
    #[default]
    Fresh,
    /// One model, trained on fold after fold; later folds see weights
    /// already fitted on their own validation examples
    Reuse,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrossValidationOptions {
    pub k: usize,
    pub epochs: usize,
    pub batch_size: usize,
    /// Seed of the fold shuffle; `None` draws a new partition every run
    pub seed: Option<u64>,
    pub fold_mode: FoldMode,
}

impl Default for CrossValidationOptions {
    fn default() -> Self {
        Self {
            k: 5,
            epochs: 10,
            batch_size: 16,
            seed: None,
            fold_mode: FoldMode::Fresh,
        }
    }
}

impl CrossValidationOptions {
    /// Check the options against a dataset of `n` examples
    pub fn validate(&self, n: usize) -> Result<()> {
        self.validate_settings()?;
        if self.k > n {
            return Err(ForecastError::InvalidConfig(format!(
                "k = {} exceeds the {} available examples",
                self.k, n
            )));
        }
        Ok(())
    }

    /// Checks that do not depend on the dataset size
    pub fn validate_settings(&self) -> Result<()> {
        if self.k < 2 {
            return Err(ForecastError::InvalidConfig(format!(
                "k must be at least 2, got {}",
                self.k
            )));
        }
        if self.epochs == 0 {
            return Err(ForecastError::InvalidConfig("epochs must be greater than 0".to_string()));
        }
        if self.batch_size == 0 {
            return Err(ForecastError::InvalidConfig(
                "batch_size must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Per-fold validation losses, in fold order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrossValidation {
    pub fold_losses: Vec<f64>,
    pub fold_sizes: Vec<usize>,
}

impl CrossValidation {
    pub fn mean(&self) -> f64 {
        stats::mean(&self.fold_losses)
    }

    /// Sample standard deviation of the fold losses
    pub fn std_dev(&self) -> f64 {
        stats::std_dev(&self.fold_losses)
    }
}

/// Partition `0..n` into `k` disjoint shuffled groups.
///
/// Group sizes differ by at most one; the larger groups come last.
pub fn fold_assignment<R: Rng + ?Sized>(n: usize, k: usize, rng: &mut R) -> Vec<Vec<usize>> {
    if k == 0 {
        return Vec::new();
    }
    let order = shuffled_indices(rng, n);
    let mut folds = Vec::with_capacity(k);
    let mut start = 0;
    for i in 0..k {
        let len = (n - start) / (k - i);
        folds.push(order[start..start + len].to_vec());
        start += len;
    }
    folds
}

fn complement(n: usize, excluded: &[usize]) -> Vec<usize> {
    let mut keep = vec![true; n];
    for &i in excluded {
        keep[i] = false;
    }
    (0..n).filter(|&i| keep[i]).collect()
}

/// Train on `k - 1` folds and score MSE on the held-out fold, once per fold.
///
/// # Arguments
/// * `dataset` - Full windowed dataset; fold membership ignores time order
/// * `model_factory` - Builds an untrained model; called once per fold in
///   [`FoldMode::Fresh`], once in total in [`FoldMode::Reuse`]
/// * `options` - Fold count, training length and fold mode
pub fn cross_validate<M, F>(
    dataset: &Dataset,
    mut model_factory: F,
    options: &CrossValidationOptions,
) -> Result<CrossValidation>
where
    M: SequenceModel,
    F: FnMut() -> Result<M>,
{
    let n = dataset.len();
    options.validate(n)?;

    let mut rng = seeded_rng(options.seed);
    let folds = fold_assignment(n, options.k, &mut rng);

    let mut shared = match options.fold_mode {
        FoldMode::Reuse => Some(model_factory()?),
        FoldMode::Fresh => None,
    };

    let mut fold_losses = Vec::with_capacity(folds.len());
    let mut fold_sizes = Vec::with_capacity(folds.len());

    for (f, fold) in folds.iter().enumerate() {
        let train = dataset.select(&complement(n, fold));
        let validation = dataset.select(fold);

        let loss = match shared.as_mut() {
            Some(model) => train_and_score(model, &train, &validation, options)?,
            None => {
                let mut model = model_factory()?;
                train_and_score(&mut model, &train, &validation, options)?
            }
        };

        info!(
            "fold {}/{}: train {} / validation {} - val_loss: {:.6}",
            f + 1,
            folds.len(),
            train.len(),
            validation.len(),
            loss
        );
        fold_losses.push(loss);
        fold_sizes.push(validation.len());
    }

    let result = CrossValidation {
        fold_losses,
        fold_sizes,
    };
    info!(
        "cross-validation: mean loss {:.6}, std {:.6}",
        result.mean(),
        result.std_dev()
    );
    Ok(result)
}

fn train_and_score<M: SequenceModel>(
    model: &mut M,
    train: &Dataset,
    validation: &Dataset,
    options: &CrossValidationOptions,
) -> Result<f64> {
    model.fit(train, Some(validation), options.epochs, options.batch_size)?;
    model.evaluate(validation)
}
