//! Global latent-factor model and offset views over it.

use rten_tensor::prelude::*;
use rten_tensor::{NdTensor, RandomSource};

use crate::PVec;

mod sub_model;

pub use sub_model::{SubModel, SubModelMut};

/// Latent factor matrices for every mode of a tensor.
///
/// The factors for mode `m` are stored as a `num_latent x dim(m)` matrix
/// whose column `j` is the latent vector of entity `j` in that mode. The
/// prediction for a cell is the sum over latent dimensions of the product of
/// the cell's factor entries in each mode.
///
/// A sampler owns the model and writes new factor columns into it, either
/// directly or through [`SubModelMut`] views. Data containers only read it,
/// through [`SubModel`] views.
#[derive(Clone, Debug)]
pub struct Model {
    num_latent: usize,
    factors: Vec<NdTensor<f64, 2>>,
}

impl Model {
    /// Create a model with all factors set to zero.
    pub fn zeros(num_latent: usize, dims: &PVec) -> Model {
        Model {
            num_latent,
            factors: dims
                .iter()
                .map(|dim| NdTensor::zeros([num_latent, dim]))
                .collect(),
        }
    }

    /// Create a model with factors drawn from `rng`.
    pub fn rand<R: RandomSource<f64>>(num_latent: usize, dims: &PVec, rng: &mut R) -> Model {
        Model {
            num_latent,
            factors: dims
                .iter()
                .map(|dim| NdTensor::rand([num_latent, dim], rng))
                .collect(),
        }
    }

    pub fn num_latent(&self) -> usize {
        self.num_latent
    }

    pub fn nmodes(&self) -> usize {
        self.factors.len()
    }

    /// Extents of the model, ie. the number of factor columns in each mode.
    pub fn dims(&self) -> PVec {
        self.factors.iter().map(|u| u.size(1)).collect()
    }

    /// Factor matrix for `mode`.
    pub fn u(&self, mode: usize) -> &NdTensor<f64, 2> {
        &self.factors[mode]
    }

    /// Mutable factor matrix for `mode`.
    pub fn u_mut(&mut self, mode: usize) -> &mut NdTensor<f64, 2> {
        &mut self.factors[mode]
    }

    /// Return a view over the whole model.
    pub fn view(&self) -> SubModel<'_> {
        SubModel::new(self)
    }

    /// Return a mutable view over the whole model.
    pub fn view_mut(&mut self) -> SubModelMut<'_> {
        SubModelMut::new(self)
    }

    /// Predicted value at global coordinates `coords`.
    pub fn predict(&self, coords: &PVec) -> f64 {
        self.view().predict(coords)
    }
}
