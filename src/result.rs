//! Predictions collected over the samples of a run.

use std::fmt;

use crate::config::TensorConfig;
use crate::model::SubModel;
use crate::PVec;

/// Prediction for a single cell of a tensor.
///
/// The prediction is updated with the model of each sample. It tracks the
/// prediction of the latest sample and the running mean and variance across
/// all samples.
#[derive(Clone, Debug, PartialEq)]
pub struct Prediction {
    coords: PVec,

    /// True value, or NaN if not known.
    val: f64,

    nsamples: usize,
    pred_1sample: f64,
    pred_avg: f64,

    /// Sum of squared deviations from the running mean.
    m2: f64,

    /// Prediction of every sample, if recorded.
    pred_all: Option<Vec<f64>>,
}

impl Prediction {
    pub fn new(coords: PVec, val: f64) -> Prediction {
        Prediction {
            coords,
            val,
            nsamples: 0,
            pred_1sample: f64::NAN,
            pred_avg: f64::NAN,
            m2: 0.,
            pred_all: None,
        }
    }

    /// Create a prediction for every stored entry of `config`, with the
    /// entry's value as true value.
    ///
    /// If `save_samples` is true, every sample's prediction is recorded.
    pub fn from_config(config: &TensorConfig, save_samples: bool) -> Vec<Prediction> {
        config
            .entries()
            .map(|(coords, val)| {
                let mut pred = Prediction::new(coords, val);
                if save_samples {
                    pred.pred_all = Some(Vec::new());
                }
                pred
            })
            .collect()
    }

    pub fn coords(&self) -> &PVec {
        &self.coords
    }

    pub fn val(&self) -> f64 {
        self.val
    }

    pub fn nsamples(&self) -> usize {
        self.nsamples
    }

    /// Prediction using only the latest sample.
    pub fn pred_1sample(&self) -> f64 {
        self.pred_1sample
    }

    /// Mean prediction across all samples.
    pub fn pred_avg(&self) -> f64 {
        self.pred_avg
    }

    /// Sample variance of the predictions, or NaN if there are none.
    pub fn var(&self) -> f64 {
        match self.nsamples {
            0 => f64::NAN,
            1 => 0.,
            n => self.m2 / (n - 1) as f64,
        }
    }

    /// Recorded per-sample predictions, if enabled.
    pub fn pred_all(&self) -> Option<&[f64]> {
        self.pred_all.as_deref()
    }

    /// Add the prediction of a new sample.
    pub fn add_sample(&mut self, pred: f64) {
        self.nsamples += 1;
        if self.nsamples == 1 {
            self.pred_avg = pred;
            self.m2 = 0.;
        } else {
            let delta = pred - self.pred_avg;
            self.pred_avg += delta / self.nsamples as f64;
            self.m2 += delta * (pred - self.pred_avg);
        }
        self.pred_1sample = pred;
        if let Some(all) = self.pred_all.as_mut() {
            all.push(pred);
        }
    }

    /// Add the prediction of `model` at this cell.
    pub fn add_model_sample(&mut self, model: &SubModel) {
        let pred = model.predict(&self.coords);
        self.add_sample(pred);
    }
}

impl fmt::Display for Prediction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {:.2} | 1sample: {:.2} | avg: {:.2} | var: {:.2}",
            self.coords,
            self.val,
            self.pred_1sample,
            self.pred_avg,
            self.var()
        )
    }
}

/// Root mean squared difference between the true values and the mean
/// predictions.
///
/// Returns NaN if `predictions` is empty.
pub fn calc_rmse(predictions: &[Prediction]) -> f64 {
    if predictions.is_empty() {
        return f64::NAN;
    }
    let sumsq: f64 = predictions
        .iter()
        .map(|p| (p.val - p.pred_avg) * (p.val - p.pred_avg))
        .sum();
    (sumsq / predictions.len() as f64).sqrt()
}
