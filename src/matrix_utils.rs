//! Utilities for inspecting tensor configurations as matrices.

use std::error::Error;
use std::fmt::{Display, Formatter};

use rten_tensor::prelude::*;
use rten_tensor::{NdTensor, NdTensorView};
use rustc_hash::FxHashMap;

use crate::config::TensorConfig;

/// Errors reported by [`slice`].
#[derive(Clone, Debug, PartialEq)]
pub enum SliceError {
    /// The two free modes are the same.
    SameFreeModes { mode: usize },

    /// A free or fixed mode index is not a mode of the tensor.
    ModeOutOfRange { mode: usize, nmodes: usize },

    /// A fixed coordinate was given for one of the free modes.
    FreeModeFixed { mode: usize },

    /// More than one fixed coordinate was given for a mode.
    DuplicateFixedMode { mode: usize },

    /// A mode which is not free has no fixed coordinate.
    MissingFixedMode { mode: usize },

    /// A fixed coordinate is outside the extent of its mode.
    CoordOutOfRange { mode: usize, coord: u32, dim: u64 },
}

impl Display for SliceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            SliceError::SameFreeModes { mode } => {
                write!(f, "free modes must differ but both are {}", mode)
            }
            SliceError::ModeOutOfRange { mode, nmodes } => {
                write!(f, "mode {} is out of range for {}-mode tensor", mode, nmodes)
            }
            SliceError::FreeModeFixed { mode } => {
                write!(f, "free mode {} has a fixed coordinate", mode)
            }
            SliceError::DuplicateFixedMode { mode } => {
                write!(f, "mode {} has more than one fixed coordinate", mode)
            }
            SliceError::MissingFixedMode { mode } => {
                write!(f, "mode {} has no fixed coordinate", mode)
            }
            SliceError::CoordOutOfRange { mode, coord, dim } => write!(
                f,
                "fixed coordinate {} is out of range for mode {} with size {}",
                coord, mode, dim
            ),
        }
    }
}

impl Error for SliceError {}

/// Extract a matrix from `config` by fixing the coordinates of all modes
/// except `free_modes`.
///
/// Element `[i, j]` of the result is the value of the tensor at the point
/// whose coordinate is `i` in `free_modes[0]`, `j` in `free_modes[1]` and
/// the coordinate given in `fixed` for every other mode. Cells without a
/// stored entry are zero.
pub fn slice(
    config: &TensorConfig,
    free_modes: [usize; 2],
    fixed: &[(usize, u32)],
) -> Result<NdTensor<f64, 2>, SliceError> {
    let nmodes = config.nmodes();
    let dims = config.dims();

    let [row_mode, col_mode] = free_modes;
    if row_mode == col_mode {
        return Err(SliceError::SameFreeModes { mode: row_mode });
    }
    for mode in free_modes {
        if mode >= nmodes {
            return Err(SliceError::ModeOutOfRange { mode, nmodes });
        }
    }

    let mut fixed_coords = FxHashMap::default();
    for &(mode, coord) in fixed {
        if mode >= nmodes {
            return Err(SliceError::ModeOutOfRange { mode, nmodes });
        }
        if free_modes.contains(&mode) {
            return Err(SliceError::FreeModeFixed { mode });
        }
        if coord as u64 >= dims[mode] {
            return Err(SliceError::CoordOutOfRange {
                mode,
                coord,
                dim: dims[mode],
            });
        }
        if fixed_coords.insert(mode, coord as usize).is_some() {
            return Err(SliceError::DuplicateFixedMode { mode });
        }
    }
    if let Some(mode) =
        (0..nmodes).find(|m| !free_modes.contains(m) && !fixed_coords.contains_key(m))
    {
        return Err(SliceError::MissingFixedMode { mode });
    }

    let mut out = NdTensor::zeros([dims[row_mode] as usize, dims[col_mode] as usize]);
    for (coords, value) in config.entries() {
        let selected = fixed_coords
            .iter()
            .all(|(&mode, &coord)| coords[mode] == coord);
        if selected {
            out[[coords[row_mode], coords[col_mode]]] = value;
        }
    }
    Ok(out)
}

/// Return true if `a` and `b` have the same shape and each pair of elements
/// differs by at most `precision`, relative to the larger magnitude when that
/// exceeds 1.
pub fn equals(a: NdTensorView<f64, 2>, b: NdTensorView<f64, 2>, precision: f64) -> bool {
    a.shape() == b.shape()
        && a.iter().zip(b.iter()).all(|(&x, &y)| {
            let scale = x.abs().max(y.abs()).max(1.0);
            (x - y).abs() <= precision * scale
        })
}

#[cfg(test)]
mod tests {
    use rten_tensor::prelude::*;
    use rten_tensor::NdTensor;
    use tenfac_testing::TestCases;

    use super::{equals, slice, SliceError};
    use crate::config::{NoiseConfig, TensorConfig};

    // Sparse 2 x 3 x 4 tensor where the value at (i, j, k) is
    // `6 * k + 3 * i + j`.
    fn tensor_3d() -> TensorConfig {
        let mut c0 = Vec::new();
        let mut c1 = Vec::new();
        let mut c2 = Vec::new();
        let mut values = Vec::new();
        for k in 0..4u32 {
            for j in 0..3u32 {
                for i in 0..2u32 {
                    c0.push(i);
                    c1.push(j);
                    c2.push(k);
                    values.push((6 * k + 3 * i + j) as f64);
                }
            }
        }
        let columns: Vec<u32> = [c0, c1, c2].concat();
        TensorConfig::sparse(vec![2u64, 3, 4], columns, values, NoiseConfig::default()).unwrap()
    }

    #[test]
    fn test_slice() {
        #[derive(Debug)]
        struct Case {
            free_modes: [usize; 2],
            fixed: Vec<(usize, u32)>,
            expected: NdTensor<f64, 2>,
        }

        let cases = [
            Case {
                free_modes: [0, 1],
                fixed: vec![(2, 3)],
                expected: NdTensor::from([[18., 19., 20.], [21., 22., 23.]]),
            },
            Case {
                free_modes: [1, 0],
                fixed: vec![(2, 3)],
                expected: NdTensor::from([[18., 21.], [19., 22.], [20., 23.]]),
            },
            Case {
                free_modes: [1, 2],
                fixed: vec![(0, 1)],
                expected: NdTensor::from([
                    [3., 9., 15., 21.],
                    [4., 10., 16., 22.],
                    [5., 11., 17., 23.],
                ]),
            },
            Case {
                free_modes: [2, 1],
                fixed: vec![(0, 1)],
                expected: NdTensor::from([
                    [3., 4., 5.],
                    [9., 10., 11.],
                    [15., 16., 17.],
                    [21., 22., 23.],
                ]),
            },
            Case {
                free_modes: [0, 2],
                fixed: vec![(1, 1)],
                expected: NdTensor::from([[1., 7., 13., 19.], [4., 10., 16., 22.]]),
            },
            Case {
                free_modes: [2, 0],
                fixed: vec![(1, 1)],
                expected: NdTensor::from([[1., 4.], [7., 10.], [13., 16.], [19., 22.]]),
            },
        ];

        cases.test_each(|case| {
            let config = tensor_3d();
            let actual = slice(&config, case.free_modes, &case.fixed).unwrap();
            assert!(
                equals(actual.view(), case.expected.view(), 1e-12),
                "{:?} != {:?}",
                actual,
                case.expected
            );
        })
    }

    #[test]
    fn test_slice_missing_entries_are_zero() {
        let config = TensorConfig::sparse(
            vec![2u64, 2, 2],
            vec![1u32, 0, 1],
            vec![5.0],
            NoiseConfig::default(),
        )
        .unwrap();
        let actual = slice(&config, [0, 2], &[(1, 0)]).unwrap();
        assert_eq!(actual, NdTensor::from([[0., 0.], [0., 5.]]));

        let actual = slice(&config, [0, 2], &[(1, 1)]).unwrap();
        assert_eq!(actual, NdTensor::zeros([2, 2]));
    }

    #[test]
    fn test_slice_dense() {
        // 2 x 3 matrix [[1, 2, 3], [4, 5, 6]] in column-major order.
        let config = TensorConfig::dense(
            vec![2u64, 3],
            vec![1., 4., 2., 5., 3., 6.],
            NoiseConfig::default(),
        )
        .unwrap();
        let actual = slice(&config, [1, 0], &[]).unwrap();
        assert_eq!(
            actual,
            NdTensor::from([[1., 4.], [2., 5.], [3., 6.]])
        );
    }

    #[test]
    fn test_slice_invalid() {
        #[derive(Debug)]
        struct Case {
            free_modes: [usize; 2],
            fixed: Vec<(usize, u32)>,
            expected: SliceError,
        }

        let cases = [
            Case {
                free_modes: [0, 0],
                fixed: vec![(1, 0), (2, 1)],
                expected: SliceError::SameFreeModes { mode: 0 },
            },
            Case {
                free_modes: [9, 0],
                fixed: vec![(1, 0), (2, 1)],
                expected: SliceError::ModeOutOfRange { mode: 9, nmodes: 4 },
            },
            Case {
                free_modes: [0, 1],
                fixed: vec![(2, 0)],
                expected: SliceError::MissingFixedMode { mode: 3 },
            },
            Case {
                free_modes: [0, 1],
                fixed: vec![(2, 0), (4, 2)],
                expected: SliceError::ModeOutOfRange { mode: 4, nmodes: 4 },
            },
            Case {
                free_modes: [0, 1],
                fixed: vec![(2, 100), (3, 1)],
                expected: SliceError::CoordOutOfRange {
                    mode: 2,
                    coord: 100,
                    dim: 4,
                },
            },
            Case {
                free_modes: [0, 1],
                fixed: vec![(1, 0), (3, 1)],
                expected: SliceError::FreeModeFixed { mode: 1 },
            },
            Case {
                free_modes: [0, 1],
                fixed: vec![(2, 0), (3, 1), (2, 1)],
                expected: SliceError::DuplicateFixedMode { mode: 2 },
            },
        ];

        cases.test_each(|case| {
            // Dense 2 x 3 x 4 x 2 tensor.
            let values: Vec<f64> = (0..48).map(|v| v as f64).collect();
            let config =
                TensorConfig::dense(vec![2u64, 3, 4, 2], values, NoiseConfig::default()).unwrap();
            assert_eq!(
                slice(&config, case.free_modes, &case.fixed),
                Err(case.expected.clone())
            );
        })
    }

    #[test]
    fn test_equals() {
        let a = NdTensor::from([[1.0, 2.0], [3.0, 4.0]]);
        let b = NdTensor::from([[1.0, 2.0], [3.0, 4.0 + 1e-14]]);
        let c = NdTensor::from([[1.0, 2.0, 3.0]]);
        assert!(equals(a.view(), b.view(), 1e-12));
        assert!(!equals(a.view(), b.view(), 1e-16));
        assert!(!equals(a.view(), c.view(), 1e-12));
    }
}
