#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]
//!
//! Every operation here takes its inputs by reference and returns a tensor
//! backed by newly allocated storage; sources are never modified.

/// Binary elementwise operations with broadcasting.
///
/// The right hand side is an [`Operand`]: a scalar, a slice of length 1,
/// `cols` or `rows * cols`, or a tensor of identical shape.
pub mod arithmetic;

/// Unary elementwise math and clipping.
pub mod basic_math;

/// Error types for tensor operations.
///
/// Defines [`TensorOpsError`] for handling failures during tensor computations.
pub mod error;

/// Transpose, matrix multiplication, norms and Householder QR.
pub mod linalg;

/// Axis reductions.
pub mod reduce;

/// Padding, diagonal expansion, stacking and reversal.
pub mod transform;

pub use arithmetic::Operand;
pub use error::TensorOpsError;
pub use linalg::NormOrd;
