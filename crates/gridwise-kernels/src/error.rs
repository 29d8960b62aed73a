use thiserror::Error;

/// An error type for kernel operations.
#[derive(Error, Debug, PartialEq)]
pub enum KernelError {
    /// Length mismatch between two buffers that must be the same size.
    #[error("Length mismatch: expected {0} elements, got {1}")]
    LengthMismatch(usize, usize),

    /// The right hand side of a broadcast is neither a scalar, a row nor a full matrix.
    #[error("Cannot broadcast {len} values over a {rows}x{cols} matrix. Expected 1, {cols} or rows * cols values")]
    BroadcastMismatch {
        /// Number of values provided.
        len: usize,
        /// Rows of the target matrix.
        rows: usize,
        /// Columns of the target matrix.
        cols: usize,
    },
}
