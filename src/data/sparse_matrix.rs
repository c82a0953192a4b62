use rten_tensor::prelude::*;
use rten_tensor::NdTensor;

use super::linalg::{add_matrix, frobenius_dot, gram};
use super::sparse_entries::SparseEntries;
use super::{check_model, check_mu_lambda_args, nobs, Data, Noise};
use crate::config::MatrixConfig;
use crate::errors::DataError;
use crate::model::SubModel;
use crate::PVec;

/// A matrix stored as a list of entries.
///
/// If the matrix is _scarce_, cells without an entry are missing. Otherwise
/// they are observed zeros, which contribute to the statistics and to the
/// posterior of every latent vector.
#[derive(Clone, Debug)]
pub struct SparseMatrixData {
    entries: SparseEntries,
    is_scarce: bool,
    noise: Noise,
    sum: f64,
    var_total: f64,

    /// Gram matrix of the other mode's factors, for full matrices. Filled by
    /// `update_pnm` and cleared by `update`.
    gram: [Option<NdTensor<f64, 2>>; 2],
}

impl SparseMatrixData {
    pub fn new(config: &MatrixConfig) -> SparseMatrixData {
        let entries = SparseEntries::new(config.tensor());
        let is_scarce = config.is_scarce();

        let sum: f64 = entries.values().sum();
        let sum_sq: f64 = entries.values().map(|v| v * v).sum();
        let n = if is_scarce {
            entries.nnz() as f64
        } else {
            entries.dims().product() as f64
        };
        let mean = sum / n;
        let var_total = sum_sq / n - mean * mean;

        SparseMatrixData {
            entries,
            is_scarce,
            noise: Noise::new(config.tensor().noise_config().clone()),
            sum,
            var_total,
            gram: [None, None],
        }
    }

    pub fn is_scarce(&self) -> bool {
        self.is_scarce
    }
}

impl Data for SparseMatrixData {
    fn name(&self) -> &str {
        if self.is_scarce {
            "ScarceMatrixData"
        } else {
            "SparseMatrixData"
        }
    }

    fn dim(&self) -> PVec {
        self.entries.dims().clone()
    }

    fn nnz(&self) -> u64 {
        self.entries.nnz() as u64
    }

    fn nna(&self) -> u64 {
        if self.is_scarce {
            self.size() - self.nnz()
        } else {
            0
        }
    }

    fn sum(&self) -> f64 {
        self.sum
    }

    fn sumsq(&self, model: &SubModel) -> Result<f64, DataError> {
        check_model(model, &self.dim())?;
        let (sumsq, predsq) = self.entries.residuals(model);
        if self.is_scarce {
            return Ok(sumsq);
        }

        // Cells without an entry are zeros, whose residual is the prediction.
        // Sum the squared predictions over all cells and remove those of the
        // stored entries.
        let all_predsq = frobenius_dot(&gram(&model.u(0)), &gram(&model.u(1)));
        Ok(sumsq + all_predsq - predsq)
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
        if !self.is_scarce {
            self.gram[mode] = Some(gram(&model.u(1 - mode)));
        }
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
        if self.is_scarce {
            self.entries.accumulate(model, mode, pos, alpha, rr, Some(mm));
            return Ok(());
        }

        // Every cell is observed, so the precision is the same for all
        // positions. Zeros add nothing to the mean.
        self.entries.accumulate(model, mode, pos, alpha, rr, None);
        let k = model.num_latent();
        match &self.gram[mode] {
            Some(vv) if vv.shape() == [k, k] => add_matrix(mm, vv, alpha),
            _ => add_matrix(mm, &gram(&model.u(1 - mode)), alpha),
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
