//! Data containers that expose observations to a sampler.
//!
//! Every container implements [`Data`]. Leaf containers hold observations
//! directly ([`DenseMatrixData`], [`SparseMatrixData`], [`SparseTensorData`]).
//! [`MatricesData`] is a composite which tiles other containers over a
//! two-mode coordinate space and implements the same trait by delegating to
//! them.
//!
//! The lifecycle of a container is:
//!
//! 1. Construction (for composites, followed by [`MatricesData::add`] for each
//!    block).
//! 2. [`Data::init_pre`], which resolves geometry.
//! 3. [`Data::init_post`], which initializes the noise models.
//! 4. Repeated sampling steps, calling [`Data::update_pnm`],
//!    [`Data::get_mu_lambda`] and [`Data::update`].

use std::fmt;

use rten_tensor::NdTensor;

use crate::errors::DataError;
use crate::model::SubModel;
use crate::PVec;

mod dense_matrix;
mod linalg;
mod matrices;
mod noise;
mod sparse_entries;
mod sparse_matrix;
mod sparse_tensor;

pub use dense_matrix::DenseMatrixData;
pub use matrices::{Block, MatricesData};
pub use noise::Noise;
pub use sparse_matrix::SparseMatrixData;
pub use sparse_tensor::SparseTensorData;

/// Interface between observed data and a Gibbs sampler.
///
/// All positions passed to a container are relative to the container itself,
/// and the [`SubModel`] passed to it must cover exactly the container's
/// extent. Composites translate both before delegating to their blocks.
pub trait Data: fmt::Debug + Send + Sync {
    /// Short name of the kind of container, used in diagnostics.
    fn name(&self) -> &str;

    /// Resolve geometry that depends on other containers. Called once before
    /// sampling starts.
    fn init_pre(&mut self) -> Result<(), DataError> {
        Ok(())
    }

    /// Finish initialization. The default implementation initializes the
    /// noise model from the variance of the observed values.
    fn init_post(&mut self) -> Result<(), DataError> {
        let var_total = self.var_total();
        if let Some(noise) = self.noise_mut() {
            noise.init(var_total);
        }
        Ok(())
    }

    /// Extent of each mode.
    fn dim(&self) -> PVec;

    /// Extent of `mode`.
    fn dim_at(&self, mode: usize) -> usize {
        self.dim()[mode]
    }

    fn nmode(&self) -> usize {
        self.dim().len()
    }

    /// Number of cells, observed or not.
    fn size(&self) -> u64 {
        self.dim().product()
    }

    /// Number of stored entries.
    fn nnz(&self) -> u64;

    /// Number of missing (unobserved) cells.
    fn nna(&self) -> u64;

    /// Sum of the stored values.
    fn sum(&self) -> f64;

    /// Sum of squared residuals over the non-missing cells.
    fn sumsq(&self, model: &SubModel) -> Result<f64, DataError>;

    /// Variance of the non-missing values.
    fn var_total(&self) -> f64;

    /// Root mean squared residual over the non-missing cells.
    fn train_rmse(&self, model: &SubModel) -> Result<f64, DataError>;

    /// Update internal state (eg. the noise model) after the model changed.
    fn update(&mut self, model: &SubModel) -> Result<(), DataError>;

    /// Precompute the statistics needed to sample the latent vectors of
    /// `mode`. Called by a prior before it samples each row of that mode.
    fn update_pnm(&mut self, model: &SubModel, mode: usize) -> Result<(), DataError>;

    /// Add the contributions of the observations at position `pos` of `mode`
    /// to the mean vector `rr` and precision matrix `mm` of that position's
    /// latent vector.
    fn get_mu_lambda(
        &self,
        model: &SubModel,
        mode: usize,
        pos: usize,
        rr: &mut NdTensor<f64, 1>,
        mm: &mut NdTensor<f64, 2>,
    ) -> Result<(), DataError>;

    /// The noise model, if this container has its own.
    fn noise(&self) -> Option<&Noise>;

    fn noise_mut(&mut self) -> Option<&mut Noise>;

    /// Write a description of the container.
    fn info(&self, out: &mut dyn fmt::Write, indent: &str) -> fmt::Result {
        write_summary(self, out, indent)
    }

    /// Write a one-line summary of the sampling state.
    fn status(&self, out: &mut dyn fmt::Write, indent: &str) -> fmt::Result {
        match self.noise() {
            Some(noise) => writeln!(out, "{}{}: {}", indent, self.name(), noise.status()),
            None => writeln!(out, "{}{}", indent, self.name()),
        }
    }
}

/// Write the statistics shared by the `info` dumps of all containers.
fn write_summary<D: Data + ?Sized>(
    data: &D,
    out: &mut dyn fmt::Write,
    indent: &str,
) -> fmt::Result {
    writeln!(out, "{}Type: {}", indent, data.name())?;
    writeln!(out, "{}Size: {} {}", indent, data.size(), data.dim())?;
    writeln!(
        out,
        "{}NNZ: {}, NA: {}, sum: {:.4}",
        indent,
        data.nnz(),
        data.nna(),
        data.sum()
    )?;
    writeln!(out, "{}Variance: {:.4}", indent, data.var_total())?;
    if let Some(noise) = data.noise() {
        writeln!(out, "{}Noise: {}", indent, noise.status())?;
    }
    Ok(())
}

/// Check that the view passed to a leaf container matches its extent.
fn check_model(model: &SubModel, dims: &PVec) -> Result<(), DataError> {
    if model.dims() != dims {
        return Err(DataError::invariant(format!(
            "model of size {} does not match data of size {}",
            model.dims(),
            dims
        )));
    }
    Ok(())
}

/// Check that `rr` and `mm` are sized for `num_latent` latent dimensions
/// and that `pos` is in range for `mode`.
fn check_mu_lambda_args(
    dims: &PVec,
    num_latent: usize,
    mode: usize,
    pos: usize,
    rr: &NdTensor<f64, 1>,
    mm: &NdTensor<f64, 2>,
) -> Result<(), DataError> {
    use rten_tensor::Layout;

    if mode >= dims.len() || pos >= dims[mode] {
        return Err(DataError::invariant(format!(
            "position {} of mode {} is outside data of size {}",
            pos, mode, dims
        )));
    }
    if rr.size(0) != num_latent || mm.shape() != [num_latent, num_latent] {
        return Err(DataError::invariant(format!(
            "accumulators must have {} latent dimensions",
            num_latent
        )));
    }
    Ok(())
}

/// Non-missing cell count, which must be positive for averaged statistics.
fn nobs(data: &dyn Data) -> Result<u64, DataError> {
    let n = data.size() - data.nna();
    if n == 0 {
        return Err(DataError::invariant("data has no observed cells"));
    }
    Ok(n)
}
