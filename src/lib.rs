//! tenfac is the data layer of a Bayesian tensor factorization sampler.
//!
//! It describes observed matrices and tensors and exposes the statistics a
//! Gibbs sampler needs to draw the latent factors of each mode.
//!
//! # Describing data
//!
//! Observations are described by an immutable [`TensorConfig`], or by a
//! [`MatrixConfig`] for the two-mode case. Configs are created from raw
//! arrays: dense values, or coordinates plus optional values for sparse data.
//! Each config carries a [`NoiseConfig`] which selects the noise model of the
//! observations.
//!
//! # Data containers
//!
//! [`TensorConfig::create_data`] turns a config into a container that
//! implements the [`Data`] trait. Large matrices can be assembled from
//! independently stored blocks using [`MatricesData`], which tiles its blocks
//! over a grid and implements [`Data`] by delegating to them.
//!
//! ```
//! use tenfac::{Data, MatricesData, MatrixConfig, Model, NoiseConfig, PVec};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let top = MatrixConfig::dense(2, 3, vec![1.0; 6], NoiseConfig::default())?;
//! let bottom = MatrixConfig::dense(3, 3, vec![2.0; 9], NoiseConfig::default())?;
//!
//! let mut data = MatricesData::new();
//! data.add(PVec::from([0, 0]), top.create_data())?;
//! data.add(PVec::from([1, 0]), bottom.create_data())?;
//! data.init_pre()?;
//! data.init_post()?;
//! assert_eq!(data.dim(), PVec::from([5, 3]));
//!
//! let model = Model::zeros(4, &data.dim());
//! let rmse = data.train_rmse(&model.view())?;
//! # let _ = rmse;
//! # Ok(())
//! # }
//! ```
//!
//! # Models
//!
//! The latent factors are held in a [`Model`]. Containers read it through
//! [`SubModel`] views, which restrict the model to a region without copying
//! it. Samplers write factors of a region through [`SubModelMut`].
//!
//! ## Threading
//!
//! Composites update their blocks in parallel using a Rayon thread pool sized
//! to the number of physical cores (see [`threading::thread_pool`]). Set
//! `TENFAC_NUM_THREADS` to change the pool size, or
//! `TENFAC_PARALLEL_BLOCKS=0` to update blocks on the calling thread.

mod config;
mod data;
mod env;
mod errors;
mod model;
mod pvec;

pub mod matrix_utils;
pub mod result;
pub mod threading;

pub use config::{IntoShared, MatrixConfig, NoiseConfig, TensorConfig};
pub use data::{
    Block, Data, DenseMatrixData, MatricesData, Noise, SparseMatrixData, SparseTensorData,
};
pub use errors::{ConfigError, DataError, LayoutError};
pub use model::{Model, SubModel, SubModelMut};
pub use pvec::PVec;
