use std::sync::OnceLock;

use super::{IntoShared, NoiseConfig, TensorConfig};
use crate::data::{Data, DenseMatrixData, SparseMatrixData};
use crate::errors::ConfigError;

/// Immutable description of a matrix, ie. a two-mode [`TensorConfig`].
///
/// A matrix can be built from five raw input shapes:
///
/// - Dense values in column-major order ([`dense`](MatrixConfig::dense))
/// - Parallel row, column and value arrays ([`sparse`](MatrixConfig::sparse))
/// - Parallel row and column arrays ([`sparse_binary`](MatrixConfig::sparse_binary))
/// - A tensor-style mode-major coordinate array with values
///   ([`from_columns`](MatrixConfig::from_columns))
/// - A tensor-style coordinate array without values
///   ([`from_columns_binary`](MatrixConfig::from_columns_binary))
///
/// Sparse matrices are either _scarce_, meaning unstored cells are unknown, or
/// _full_, meaning unstored cells are observed zeros.
///
/// The row and column index arrays are derived from the coordinate array on
/// first access and cached.
#[derive(Clone, Debug)]
pub struct MatrixConfig {
    tensor: TensorConfig,
    is_scarce: bool,
    rows: OnceLock<Vec<u32>>,
    cols: OnceLock<Vec<u32>>,
}

impl MatrixConfig {
    /// Create a dense matrix from values in column-major order.
    pub fn dense(
        nrow: u64,
        ncol: u64,
        values: impl IntoShared<f64>,
        noise_config: NoiseConfig,
    ) -> Result<MatrixConfig, ConfigError> {
        let tensor = TensorConfig::dense(vec![nrow, ncol], values, noise_config)?;
        Self::from_tensor(tensor, false)
    }

    /// Create a sparse matrix from parallel row, column and value arrays.
    pub fn sparse(
        nrow: u64,
        ncol: u64,
        rows: &[u32],
        cols: &[u32],
        values: impl IntoShared<f64>,
        noise_config: NoiseConfig,
        is_scarce: bool,
    ) -> Result<MatrixConfig, ConfigError> {
        let columns = concat_rows_cols(rows, cols)?;
        let tensor = TensorConfig::sparse(vec![nrow, ncol], columns, values, noise_config)?;
        Self::from_tensor(tensor, is_scarce)
    }

    /// Create a sparse binary matrix from parallel row and column arrays.
    pub fn sparse_binary(
        nrow: u64,
        ncol: u64,
        rows: &[u32],
        cols: &[u32],
        noise_config: NoiseConfig,
        is_scarce: bool,
    ) -> Result<MatrixConfig, ConfigError> {
        let columns = concat_rows_cols(rows, cols)?;
        let tensor = TensorConfig::sparse_binary(vec![nrow, ncol], columns, noise_config)?;
        Self::from_tensor(tensor, is_scarce)
    }

    /// Create a sparse matrix from a mode-major coordinate array, where the
    /// first half holds row indices and the second half column indices.
    pub fn from_columns(
        nrow: u64,
        ncol: u64,
        columns: impl IntoShared<u32>,
        values: impl IntoShared<f64>,
        noise_config: NoiseConfig,
        is_scarce: bool,
    ) -> Result<MatrixConfig, ConfigError> {
        let tensor = TensorConfig::sparse(vec![nrow, ncol], columns, values, noise_config)?;
        Self::from_tensor(tensor, is_scarce)
    }

    /// Binary variant of [`from_columns`](MatrixConfig::from_columns).
    pub fn from_columns_binary(
        nrow: u64,
        ncol: u64,
        columns: impl IntoShared<u32>,
        noise_config: NoiseConfig,
        is_scarce: bool,
    ) -> Result<MatrixConfig, ConfigError> {
        let tensor = TensorConfig::sparse_binary(vec![nrow, ncol], columns, noise_config)?;
        Self::from_tensor(tensor, is_scarce)
    }

    /// Wrap a two-mode tensor config. `is_scarce` is ignored for dense
    /// tensors.
    pub fn from_tensor(tensor: TensorConfig, is_scarce: bool) -> Result<MatrixConfig, ConfigError> {
        if tensor.nmodes() != 2 {
            return Err(ConfigError::NotAMatrix {
                nmodes: tensor.nmodes(),
            });
        }
        Ok(MatrixConfig {
            is_scarce: is_scarce && !tensor.is_dense(),
            tensor,
            rows: OnceLock::new(),
            cols: OnceLock::new(),
        })
    }

    pub fn tensor(&self) -> &TensorConfig {
        &self.tensor
    }

    pub fn nrow(&self) -> u64 {
        self.tensor.dims()[0]
    }

    pub fn ncol(&self) -> u64 {
        self.tensor.dims()[1]
    }

    pub fn is_scarce(&self) -> bool {
        self.is_scarce
    }

    /// Row index of each stored entry. Empty for dense matrices.
    pub fn rows(&self) -> &[u32] {
        self.rows.get_or_init(|| self.mode_coords(0))
    }

    /// Column index of each stored entry. Empty for dense matrices.
    pub fn cols(&self) -> &[u32] {
        self.cols.get_or_init(|| self.mode_coords(1))
    }

    fn mode_coords(&self, mode: usize) -> Vec<u32> {
        let nnz = self.tensor.nnz();
        self.tensor
            .columns()
            .map(|columns| columns[mode * nnz..(mode + 1) * nnz].to_vec())
            .unwrap_or_default()
    }

    /// Create the [`Data`] container for this matrix.
    pub fn create_data(&self) -> Box<dyn Data> {
        if self.tensor.is_dense() {
            Box::new(DenseMatrixData::new(self))
        } else {
            Box::new(SparseMatrixData::new(self))
        }
    }
}

impl TryFrom<TensorConfig> for MatrixConfig {
    type Error = ConfigError;

    /// Convert a two-mode tensor. Sparse tensors become scarce matrices.
    fn try_from(tensor: TensorConfig) -> Result<MatrixConfig, ConfigError> {
        let is_scarce = !tensor.is_dense();
        MatrixConfig::from_tensor(tensor, is_scarce)
    }
}

impl AsRef<TensorConfig> for MatrixConfig {
    fn as_ref(&self) -> &TensorConfig {
        &self.tensor
    }
}

fn concat_rows_cols(rows: &[u32], cols: &[u32]) -> Result<Vec<u32>, ConfigError> {
    if rows.len() != cols.len() {
        return Err(ConfigError::IndexLengthMismatch {
            rows: rows.len(),
            cols: cols.len(),
        });
    }
    let mut columns = Vec::with_capacity(rows.len() * 2);
    columns.extend_from_slice(rows);
    columns.extend_from_slice(cols);
    Ok(columns)
}

#[cfg(test)]
mod tests {
    use super::MatrixConfig;
    use crate::config::{NoiseConfig, TensorConfig};
    use crate::errors::ConfigError;

    #[test]
    fn test_rows_cols_from_columns() {
        let config = MatrixConfig::from_columns(
            3,
            4,
            vec![0u32, 2, 1, 3, 0, 1],
            vec![1.0, 2.0, 3.0],
            NoiseConfig::default(),
            true,
        )
        .unwrap();
        assert_eq!(config.nrow(), 3);
        assert_eq!(config.ncol(), 4);
        assert_eq!(config.rows(), &[0, 2, 1]);
        assert_eq!(config.cols(), &[3, 0, 1]);

        // Second access returns the cached arrays.
        assert!(std::ptr::eq(config.rows(), config.rows()));
    }

    #[test]
    fn test_sparse_matches_from_columns() {
        let a = MatrixConfig::sparse(
            3,
            4,
            &[0, 2],
            &[3, 0],
            vec![1.0, 2.0],
            NoiseConfig::default(),
            true,
        )
        .unwrap();
        let b = MatrixConfig::from_columns(
            3,
            4,
            vec![0u32, 2, 3, 0],
            vec![1.0, 2.0],
            NoiseConfig::default(),
            true,
        )
        .unwrap();
        assert_eq!(a.tensor().columns(), b.tensor().columns());
        assert_eq!(a.rows(), b.rows());
        assert_eq!(a.cols(), b.cols());
    }

    #[test]
    fn test_binary_matrices() {
        let a = MatrixConfig::sparse_binary(2, 2, &[0, 1], &[1, 1], NoiseConfig::default(), false)
            .unwrap();
        assert!(a.tensor().is_binary());
        assert!(!a.is_scarce());

        let b = MatrixConfig::from_columns_binary(
            2,
            2,
            vec![0u32, 1, 1, 1],
            NoiseConfig::default(),
            true,
        )
        .unwrap();
        assert!(b.is_scarce());
        assert_eq!(a.tensor().columns(), b.tensor().columns());
    }

    #[test]
    fn test_dense() {
        let config =
            MatrixConfig::dense(2, 2, vec![1.0, 2.0, 3.0, 4.0], NoiseConfig::default()).unwrap();
        assert!(config.tensor().is_dense());
        assert!(!config.is_scarce());
        assert!(config.rows().is_empty());
        assert_eq!(config.tensor().nnz(), 4);
    }

    #[test]
    fn test_invalid() {
        let err = MatrixConfig::sparse(2, 2, &[0, 1], &[0], vec![1.0], NoiseConfig::default(), true)
            .err();
        assert_eq!(
            err,
            Some(ConfigError::IndexLengthMismatch { rows: 2, cols: 1 })
        );
        assert_eq!(
            err.map(|e| e.to_string()).as_deref(),
            Some("found 2 row indices but 1 column indices")
        );

        let err = MatrixConfig::sparse(
            2,
            2,
            &[0, 1],
            &[0, 1],
            vec![1.0],
            NoiseConfig::default(),
            true,
        )
        .err();
        assert_eq!(
            err,
            Some(ConfigError::ValuesLengthMismatch {
                expected: 2,
                actual: 1
            })
        );

        let tensor =
            TensorConfig::sparse_binary(vec![2u64, 2, 2], vec![0u32, 0, 0], NoiseConfig::default())
                .unwrap();
        assert_eq!(
            MatrixConfig::try_from(tensor).err(),
            Some(ConfigError::NotAMatrix { nmodes: 3 })
        );
    }
}
