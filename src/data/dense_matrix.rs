use rten_tensor::prelude::*;
use rten_tensor::NdTensor;

use super::linalg::{add_matrix, add_scaled, column, gram};
use super::{check_model, check_mu_lambda_args, nobs, Data, Noise};
use crate::config::MatrixConfig;
use crate::errors::DataError;
use crate::model::SubModel;
use crate::PVec;

/// A fully observed matrix.
#[derive(Clone, Debug)]
pub struct DenseMatrixData {
    y: NdTensor<f64, 2>,
    noise: Noise,
    sum: f64,
    var_total: f64,

    /// Gram matrix of the factors of the _other_ mode, computed by
    /// `update_pnm` for each mode. Cleared by `update`.
    gram: [Option<NdTensor<f64, 2>>; 2],
}

impl DenseMatrixData {
    pub fn new(config: &MatrixConfig) -> DenseMatrixData {
        let [nrow, ncol] = [config.nrow() as usize, config.ncol() as usize];
        let mut y = NdTensor::zeros([nrow, ncol]);
        for (coords, value) in config.tensor().entries() {
            y[[coords[0], coords[1]]] = value;
        }

        let n = (nrow * ncol) as f64;
        let sum: f64 = y.iter().sum();
        let mean = sum / n;
        let var_total = y.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n;

        DenseMatrixData {
            y,
            noise: Noise::new(config.tensor().noise_config().clone()),
            sum,
            var_total,
            gram: [None, None],
        }
    }

    /// Observed value at `(row, col)`.
    pub fn value(&self, row: usize, col: usize) -> f64 {
        self.y[[row, col]]
    }

    /// Value at position `i` along `mode` and `j` along the other mode.
    fn value_along(&self, mode: usize, i: usize, j: usize) -> f64 {
        if mode == 0 {
            self.y[[i, j]]
        } else {
            self.y[[j, i]]
        }
    }
}

impl Data for DenseMatrixData {
    fn name(&self) -> &str {
        "DenseMatrixData"
    }

    fn dim(&self) -> PVec {
        PVec::from(self.y.shape())
    }

    fn nnz(&self) -> u64 {
        self.y.len() as u64
    }

    fn nna(&self) -> u64 {
        0
    }

    fn sum(&self) -> f64 {
        self.sum
    }

    fn sumsq(&self, model: &SubModel) -> Result<f64, DataError> {
        check_model(model, &self.dim())?;
        let [nrow, ncol] = self.y.shape();
        let mut sumsq = 0.;
        for i in 0..nrow {
            for j in 0..ncol {
                let diff = self.y[[i, j]] - model.predict(&PVec::from([i, j]));
                sumsq += diff * diff;
            }
        }
        Ok(sumsq)
    }

    fn var_total(&self) -> f64 {
        self.var_total
    }

    fn train_rmse(&self, model: &SubModel) -> Result<f64, DataError> {
        let n = nobs(self)?;
        Ok((self.sumsq(model)? / n as f64).sqrt())
    }

    fn update(&mut self, model: &SubModel) -> Result<(), DataError> {
        let sumsq = self.sumsq(model)?;
        let n = nobs(self)?;
        self.noise.update(sumsq, n);
        self.gram = [None, None];
        Ok(())
    }

    fn update_pnm(&mut self, model: &SubModel, mode: usize) -> Result<(), DataError> {
        check_model(model, &self.dim())?;
        if mode > 1 {
            return Err(DataError::invariant(format!("invalid matrix mode {}", mode)));
        }
        self.gram[mode] = Some(gram(&model.u(1 - mode)));
        Ok(())
    }

    fn get_mu_lambda(
        &self,
        model: &SubModel,
        mode: usize,
        pos: usize,
        rr: &mut NdTensor<f64, 1>,
        mm: &mut NdTensor<f64, 2>,
    ) -> Result<(), DataError> {
        let dims = self.dim();
        check_model(model, &dims)?;
        check_mu_lambda_args(&dims, model.num_latent(), mode, pos, rr, mm)?;

        let alpha = self.noise.alpha();
        let other = model.u(1 - mode);
        let mut v = vec![0.; model.num_latent()];
        for j in 0..dims[1 - mode] {
            column(&other, j, &mut v);
            add_scaled(rr, &v, alpha * self.value_along(mode, pos, j));
        }

        let k = model.num_latent();
        match &self.gram[mode] {
            Some(vv) if vv.shape() == [k, k] => add_matrix(mm, vv, alpha),
            _ => add_matrix(mm, &gram(&other), alpha),
        }
        Ok(())
    }

    fn noise(&self) -> Option<&Noise> {
        Some(&self.noise)
    }

    fn noise_mut(&mut self) -> Option<&mut Noise> {
        Some(&mut self.noise)
    }
}
