//! Immutable descriptions of the raw tensors and matrices that are factorized.
//!
//! A configuration is built once from caller-supplied arrays and never
//! modified. The arrays are held behind reference counts so that several
//! components can share the same raw data without copying it.

mod matrix_config;
mod noise_config;
mod shared;
mod tensor_config;

pub use matrix_config::MatrixConfig;
pub use noise_config::NoiseConfig;
pub use shared::IntoShared;
pub use tensor_config::TensorConfig;
