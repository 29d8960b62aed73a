use gridwise_kernels::KernelError;
use gridwise_tensor::TensorError;
use thiserror::Error;

/// An error type for tensor operations.
#[derive(Error, Debug, PartialEq)]
pub enum TensorOpsError {
    /// Two tensors that must have the same shape differ.
    #[error("Shape mismatch: {0:?} != {1:?}")]
    ShapeMismatch(Vec<usize>, Vec<usize>),

    /// A broadcast operand length is neither 1, `cols` nor `rows * cols`.
    #[error("Cannot broadcast {len} values over a {rows}x{cols} tensor. Expected 1, {cols} or rows * cols values")]
    BroadcastMismatch {
        /// Number of values provided
        len: usize,
        /// Rows of the tensor
        rows: usize,
        /// Columns of the tensor
        cols: usize,
    },

    /// The inner dimensions of a matrix product disagree.
    #[error("Tensor shapes are incompatible for multiplication: {lhs:?} x {rhs:?}")]
    MatmulMismatch {
        /// Shape of the left operand
        lhs: [usize; 2],
        /// Shape of the right operand
        rhs: [usize; 2],
    },

    /// The extents of a result do not fit in `usize`.
    #[error("Result shape of {op} overflows usize")]
    ShapeOverflow {
        /// Operation producing the result
        op: &'static str,
    },

    /// Stacking needs at least one tensor.
    #[error("Cannot stack an empty list of tensors")]
    EmptyStack,

    /// Tensor error
    #[error("Error with the tensor: {0}")]
    TensorError(#[from] TensorError),

    /// Kernel error
    #[error(transparent)]
    KernelError(#[from] KernelError),
}
