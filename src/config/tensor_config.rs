use std::fmt;
use std::sync::Arc;

use super::{IntoShared, MatrixConfig, NoiseConfig};
use crate::data::{Data, SparseTensorData};
use crate::errors::ConfigError;
use crate::PVec;

/// Immutable description of an N-mode tensor.
///
/// A tensor is either _dense_, in which case every cell has a value, or
/// _sparse_, in which case only the stored entries are known. Sparse tensors
/// are either _binary_ (every stored entry has the value 1) or carry one value
/// per entry.
///
/// Sparse coordinates are stored mode-major: `columns[m * nnz + i]` is the
/// coordinate of entry `i` in mode `m`. Dense values are stored with the first
/// mode varying fastest, ie. the value at `(c0, c1, ...)` is at offset
/// `c0 + d0 * (c1 + d1 * (...))`.
///
/// Cloning a config is cheap. The raw arrays are shared between clones.
#[derive(Clone, Debug)]
pub struct TensorConfig {
    is_dense: bool,
    is_binary: bool,
    nmodes: usize,
    nnz: usize,
    dims: Arc<Vec<u64>>,
    columns: Option<Arc<Vec<u32>>>,
    values: Option<Arc<Vec<f64>>>,
    noise_config: NoiseConfig,
}

impl TensorConfig {
    /// Create a dense tensor from its extents and values.
    pub fn dense(
        dims: impl IntoShared<u64>,
        values: impl IntoShared<f64>,
        noise_config: NoiseConfig,
    ) -> Result<TensorConfig, ConfigError> {
        let dims = dims.into_shared();
        let values = values.into_shared();
        let nmodes = check_dims(&dims)?;

        let size: u64 = dims.iter().product();
        if values.len() as u64 != size {
            return Err(ConfigError::ValuesLengthMismatch {
                expected: size as usize,
                actual: values.len(),
            });
        }

        Ok(TensorConfig {
            is_dense: true,
            is_binary: false,
            nmodes,
            nnz: values.len(),
            dims,
            columns: None,
            values: Some(values),
            noise_config,
        })
    }

    /// Create a sparse tensor with one value per stored entry.
    pub fn sparse(
        dims: impl IntoShared<u64>,
        columns: impl IntoShared<u32>,
        values: impl IntoShared<f64>,
        noise_config: NoiseConfig,
    ) -> Result<TensorConfig, ConfigError> {
        let values = values.into_shared();
        let mut config = Self::sparse_binary(dims, columns, noise_config)?;
        if values.len() != config.nnz {
            return Err(ConfigError::ValuesLengthMismatch {
                expected: config.nnz,
                actual: values.len(),
            });
        }
        config.is_binary = false;
        config.values = Some(values);
        Ok(config)
    }

    /// Create a sparse tensor whose stored entries all have the value 1.
    pub fn sparse_binary(
        dims: impl IntoShared<u64>,
        columns: impl IntoShared<u32>,
        noise_config: NoiseConfig,
    ) -> Result<TensorConfig, ConfigError> {
        let dims = dims.into_shared();
        let columns = columns.into_shared();
        let nmodes = check_dims(&dims)?;

        if columns.len() % nmodes != 0 {
            return Err(ConfigError::ColumnsLengthMismatch {
                len: columns.len(),
                nmodes,
            });
        }
        let nnz = columns.len() / nmodes;

        for (mode, &dim) in dims.iter().enumerate() {
            let mode_coords = &columns[mode * nnz..(mode + 1) * nnz];
            if let Some(entry) = mode_coords.iter().position(|&c| c as u64 >= dim) {
                return Err(ConfigError::CoordOutOfRange {
                    mode,
                    entry,
                    coord: mode_coords[entry],
                    dim,
                });
            }
        }

        Ok(TensorConfig {
            is_dense: false,
            is_binary: true,
            nmodes,
            nnz,
            dims,
            columns: Some(columns),
            values: None,
            noise_config,
        })
    }

    /// Return a copy of this config with a different noise model. The raw
    /// arrays are shared with `self`.
    pub fn with_noise_config(&self, noise_config: NoiseConfig) -> TensorConfig {
        TensorConfig {
            noise_config,
            ..self.clone()
        }
    }

    pub fn noise_config(&self) -> &NoiseConfig {
        &self.noise_config
    }

    pub fn is_dense(&self) -> bool {
        self.is_dense
    }

    pub fn is_binary(&self) -> bool {
        self.is_binary
    }

    pub fn nmodes(&self) -> usize {
        self.nmodes
    }

    /// Number of stored entries. For dense tensors this is the product of the
    /// dimensions.
    pub fn nnz(&self) -> usize {
        self.nnz
    }

    pub fn dims(&self) -> &[u64] {
        &self.dims
    }

    /// Extents as a position vector.
    pub fn dims_pvec(&self) -> PVec {
        self.dims.iter().map(|&d| d as usize).collect()
    }

    /// Mode-major coordinate array, or `None` for dense tensors.
    pub fn columns(&self) -> Option<&[u32]> {
        self.columns.as_deref().map(|c| c.as_slice())
    }

    /// Entry values, or `None` for binary tensors.
    pub fn values(&self) -> Option<&[f64]> {
        self.values.as_deref().map(|v| v.as_slice())
    }

    pub fn dims_ptr(&self) -> Arc<Vec<u64>> {
        Arc::clone(&self.dims)
    }

    pub fn columns_ptr(&self) -> Option<Arc<Vec<u32>>> {
        self.columns.clone()
    }

    pub fn values_ptr(&self) -> Option<Arc<Vec<f64>>> {
        self.values.clone()
    }

    /// Return the coordinate of entry `entry` in `mode`.
    pub fn coord(&self, mode: usize, entry: usize) -> usize {
        match self.columns() {
            Some(columns) => columns[mode * self.nnz + entry] as usize,
            None => {
                let inner: u64 = self.dims[..mode].iter().product();
                ((entry as u64 / inner) % self.dims[mode]) as usize
            }
        }
    }

    /// Return the value of entry `entry`.
    pub fn value(&self, entry: usize) -> f64 {
        self.values().map(|v| v[entry]).unwrap_or(1.0)
    }

    /// Iterate over `(coordinates, value)` for every stored entry.
    pub fn entries(&self) -> impl Iterator<Item = (PVec, f64)> + '_ {
        (0..self.nnz).map(move |i| {
            let coords: PVec = (0..self.nmodes).map(|m| self.coord(m, i)).collect();
            (coords, self.value(i))
        })
    }

    /// Create the [`Data`] container that exposes this tensor to a sampler.
    ///
    /// Two-mode tensors produce matrix data. Sparse two-mode tensors are
    /// treated as scarce, ie. unstored cells are missing.
    pub fn create_data(&self) -> Result<Box<dyn Data>, ConfigError> {
        if self.nmodes == 2 {
            let matrix = MatrixConfig::from_tensor(self.clone(), !self.is_dense)?;
            Ok(matrix.create_data())
        } else {
            Ok(Box::new(SparseTensorData::new(self)))
        }
    }
}

/// Return the mode count for a dims array.
fn check_dims(dims: &[u64]) -> Result<usize, ConfigError> {
    if dims.is_empty() {
        return Err(ConfigError::NoModes);
    }
    Ok(dims.len())
}

impl fmt::Display for TensorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match (self.is_dense, self.is_binary) {
            (true, _) => "dense",
            (false, true) => "sparse binary",
            (false, false) => "sparse",
        };
        let dims: Vec<String> = self.dims.iter().map(|d| d.to_string()).collect();
        write!(
            f,
            "{} {}-mode tensor [{}], nnz: {}, noise: {}",
            kind,
            self.nmodes,
            dims.join(" x "),
            self.nnz,
            self.noise_config.name()
        )
    }
}
