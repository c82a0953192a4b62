//! Error types reported by the data layer.

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Errors that can occur when constructing a tensor or matrix configuration
/// from raw arrays.
#[derive(Clone, Debug, PartialEq)]
pub enum ConfigError {
    /// The configuration has no modes.
    NoModes,

    /// A matrix was expected but the configuration has a different number of
    /// modes.
    NotAMatrix { nmodes: usize },

    /// The length of the coordinate array is not a multiple of the mode count.
    ColumnsLengthMismatch { len: usize, nmodes: usize },

    /// The value array does not have one value per entry.
    ValuesLengthMismatch { expected: usize, actual: usize },

    /// The row and column index arrays of a sparse matrix differ in length.
    IndexLengthMismatch { rows: usize, cols: usize },

    /// A coordinate is outside the extent of its mode.
    CoordOutOfRange {
        mode: usize,
        entry: usize,
        coord: u32,
        dim: u64,
    },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::NoModes => write!(f, "tensor must have at least one mode"),
            ConfigError::NotAMatrix { nmodes } => {
                write!(f, "expected 2 modes for a matrix but found {}", nmodes)
            }
            ConfigError::ColumnsLengthMismatch { len, nmodes } => write!(
                f,
                "coordinate array length {} is not a multiple of mode count {}",
                len, nmodes
            ),
            ConfigError::ValuesLengthMismatch { expected, actual } => {
                write!(f, "expected {} values but found {}", expected, actual)
            }
            ConfigError::IndexLengthMismatch { rows, cols } => write!(
                f,
                "found {} row indices but {} column indices",
                rows, cols
            ),
            ConfigError::CoordOutOfRange {
                mode,
                entry,
                coord,
                dim,
            } => write!(
                f,
                "coordinate {} of entry {} is out of range for mode {} with size {}",
                coord, entry, mode, dim
            ),
        }
    }
}

impl Error for ConfigError {}

/// Errors in the geometry of a block-composed container.
#[derive(Clone, Debug, PartialEq)]
pub enum LayoutError {
    /// A tile position or block has a different number of modes than the
    /// container.
    ModeCountMismatch { expected: usize, actual: usize },

    /// A block has zero extent along a mode.
    EmptyBlock { block: usize, mode: usize },

    /// Two blocks at the same tile position of a mode report different sizes
    /// for that mode.
    ExtentMismatch {
        mode: usize,
        pos: usize,
        expected: usize,
        actual: usize,
    },

    /// A tile position is larger than the number of blocks allows.
    TilePositionOutOfRange { mode: usize, pos: usize },
}

impl Display for LayoutError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            LayoutError::ModeCountMismatch { expected, actual } => write!(
                f,
                "expected {} modes but block has {}",
                expected, actual
            ),
            LayoutError::EmptyBlock { block, mode } => {
                write!(f, "block {} has zero size in mode {}", block, mode)
            }
            LayoutError::ExtentMismatch {
                mode,
                pos,
                expected,
                actual,
            } => write!(
                f,
                "blocks at tile position {} of mode {} disagree on size ({} vs {})",
                pos, mode, expected, actual
            ),
            LayoutError::TilePositionOutOfRange { mode, pos } => write!(
                f,
                "tile position {} in mode {} exceeds the number of blocks",
                pos, mode
            ),
        }
    }
}

impl Error for LayoutError {}

/// Errors reported by [`Data`](crate::Data) operations.
#[derive(Clone, Debug, PartialEq)]
pub enum DataError {
    /// The configuration used to create the data is invalid.
    Config(ConfigError),

    /// The block layout of a composite is invalid.
    Layout(LayoutError),

    /// An internal invariant of the data layer was violated.
    InvariantViolated(String),

    /// The operation is not supported by this kind of data.
    NotImplemented(&'static str),
}

impl DataError {
    pub(crate) fn invariant(msg: impl Into<String>) -> DataError {
        DataError::InvariantViolated(msg.into())
    }
}

impl Display for DataError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            DataError::Config(err) => write!(f, "invalid config: {}", err),
            DataError::Layout(err) => write!(f, "invalid layout: {}", err),
            DataError::InvariantViolated(msg) => write!(f, "invariant violated: {}", msg),
            DataError::NotImplemented(op) => write!(f, "{} is not implemented", op),
        }
    }
}

impl Error for DataError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            DataError::Config(err) => Some(err),
            DataError::Layout(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ConfigError> for DataError {
    fn from(val: ConfigError) -> Self {
        DataError::Config(val)
    }
}

impl From<LayoutError> for DataError {
    fn from(val: LayoutError) -> Self {
        DataError::Layout(val)
    }
}
