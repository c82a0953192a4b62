use rten_tensor::NdTensor;

use super::sparse_entries::SparseEntries;
use super::{check_model, check_mu_lambda_args, nobs, Data, Noise};
use crate::config::TensorConfig;
use crate::errors::DataError;
use crate::model::SubModel;
use crate::PVec;

/// An N-mode tensor stored as a list of entries. Cells without an entry are
/// missing.
#[derive(Clone, Debug)]
pub struct SparseTensorData {
    entries: SparseEntries,
    noise: Noise,
    sum: f64,
    var_total: f64,
}

impl SparseTensorData {
    pub fn new(config: &TensorConfig) -> SparseTensorData {
        let entries = SparseEntries::new(config);
        let n = entries.nnz() as f64;
        let sum: f64 = entries.values().sum();
        let mean = sum / n;
        let var_total = entries
            .values()
            .map(|v| (v - mean) * (v - mean))
            .sum::<f64>()
            / n;

        SparseTensorData {
            entries,
            noise: Noise::new(config.noise_config().clone()),
            sum,
            var_total,
        }
    }
}

impl Data for SparseTensorData {
    fn name(&self) -> &str {
        "SparseTensorData"
    }

    fn dim(&self) -> PVec {
        self.entries.dims().clone()
    }

    fn nnz(&self) -> u64 {
        self.entries.nnz() as u64
    }

    fn nna(&self) -> u64 {
        self.size() - self.nnz()
    }

    fn sum(&self) -> f64 {
        self.sum
    }

    fn sumsq(&self, model: &SubModel) -> Result<f64, DataError> {
        check_model(model, &self.dim())?;
        Ok(self.entries.residuals(model).0)
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
        Ok(())
    }

    fn update_pnm(&mut self, model: &SubModel, mode: usize) -> Result<(), DataError> {
        check_model(model, &self.dim())?;
        if mode >= self.nmode() {
            return Err(DataError::invariant(format!(
                "invalid mode {} for {}-mode tensor",
                mode,
                self.nmode()
            )));
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
        self.entries
            .accumulate(model, mode, pos, self.noise.alpha(), rr, Some(mm));
        Ok(())
    }

    fn noise(&self) -> Option<&Noise> {
        Some(&self.noise)
    }

    fn noise_mut(&mut self) -> Option<&mut Noise> {
        Some(&mut self.noise)
    }
}
