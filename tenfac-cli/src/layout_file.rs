//! JSON description of a block-composed matrix.
//!
//! ```json
//! {
//!   "blocks": [
//!     { "pos": [0, 0], "matrix": { "kind": "dense", "nrow": 2, "ncol": 2, "values": [1, 2, 3, 4] } },
//!     {
//!       "pos": [1, 0],
//!       "matrix": { "kind": "sparse", "nrow": 3, "ncol": 2, "rows": [0, 2], "cols": [1, 0], "scarce": true },
//!       "noise": { "kind": "adaptive_gaussian", "sn_init": 1.0, "sn_max": 10.0 }
//!     }
//!   ]
//! }
//! ```

use std::error::Error;
use std::fs;

use serde::Deserialize;
use tenfac::{MatricesData, MatrixConfig, NoiseConfig, PVec};

/// Matrix stored in one block.
#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MatrixDef {
    /// Dense matrix with values in column-major order.
    Dense {
        nrow: u64,
        ncol: u64,
        values: Vec<f64>,
    },

    /// Sparse matrix given as parallel row, column and value arrays. Without
    /// values the matrix is binary.
    Sparse {
        nrow: u64,
        ncol: u64,
        rows: Vec<u32>,
        cols: Vec<u32>,
        values: Option<Vec<f64>>,
        #[serde(default)]
        scarce: bool,
    },
}

#[derive(Debug, Deserialize)]
pub struct BlockDef {
    /// Tile position of the block.
    pub pos: [usize; 2],
    pub matrix: MatrixDef,
    #[serde(default)]
    pub noise: NoiseConfig,
}

#[derive(Debug, Deserialize)]
pub struct LayoutFile {
    pub blocks: Vec<BlockDef>,
}

impl LayoutFile {
    pub fn load(path: &str) -> Result<LayoutFile, Box<dyn Error>> {
        let json = fs::read_to_string(path)?;
        Self::parse(&json)
    }

    pub fn parse(json: &str) -> Result<LayoutFile, Box<dyn Error>> {
        Ok(serde_json::from_str(json)?)
    }

    /// Create the composite described by this file.
    ///
    /// The layout is not resolved. Call `init_pre` on the result.
    pub fn build(&self) -> Result<MatricesData, Box<dyn Error>> {
        let mut data = MatricesData::new();
        for block in &self.blocks {
            let config = block.matrix_config()?;
            log::debug!("block {:?}: {}", block.pos, config.tensor());
            data.add(PVec::from(block.pos), config.create_data())?;
        }
        Ok(data)
    }
}

impl BlockDef {
    fn matrix_config(&self) -> Result<MatrixConfig, Box<dyn Error>> {
        let noise = self.noise.clone();
        let config = match &self.matrix {
            MatrixDef::Dense { nrow, ncol, values } => {
                MatrixConfig::dense(*nrow, *ncol, values, noise)?
            }
            MatrixDef::Sparse {
                nrow,
                ncol,
                rows,
                cols,
                values: Some(values),
                scarce,
            } => MatrixConfig::sparse(*nrow, *ncol, rows, cols, values, noise, *scarce)?,
            MatrixDef::Sparse {
                nrow,
                ncol,
                rows,
                cols,
                values: None,
                scarce,
            } => MatrixConfig::sparse_binary(*nrow, *ncol, rows, cols, noise, *scarce)?,
        };
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use tenfac::{Data, NoiseConfig, PVec};

    use super::LayoutFile;

    const LAYOUT: &str = r#"{
        "blocks": [
            { "pos": [0, 0], "matrix": { "kind": "dense", "nrow": 2, "ncol": 2, "values": [1, 2, 3, 4] } },
            {
                "pos": [1, 0],
                "matrix": { "kind": "sparse", "nrow": 3, "ncol": 2, "rows": [0, 2], "cols": [1, 0], "scarce": true },
                "noise": { "kind": "adaptive_gaussian", "sn_init": 1.0, "sn_max": 10.0 }
            }
        ]
    }"#;

    #[test]
    fn test_parse_and_build() {
        let layout = LayoutFile::parse(LAYOUT).unwrap();
        assert_eq!(layout.blocks.len(), 2);
        assert_eq!(layout.blocks[0].noise, NoiseConfig::default());

        let mut data = layout.build().unwrap();
        data.init_pre().unwrap();
        assert_eq!(data.dim(), PVec::from([5, 2]));
        assert_eq!(data.nnz(), 6);
        assert_eq!(data.nna(), 4);
        assert_eq!(data.sum(), 12.0);
        assert_eq!(data.blocks()[1].data().name(), "ScarceMatrixData");
    }

    #[test]
    fn test_invalid_block() {
        let layout = LayoutFile::parse(
            r#"{ "blocks": [ { "pos": [0, 0], "matrix": { "kind": "dense", "nrow": 2, "ncol": 2, "values": [1] } } ] }"#,
        )
        .unwrap();
        assert!(layout.build().is_err());
    }
}
