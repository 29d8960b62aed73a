use thiserror::Error;

use crate::TensorError;

/// Reshape sentinel asking for a dimension to be inferred from the element count.
pub const INFER: i32 = -1;

/// Reshape sentinel, valid on the column argument only, asking for a single row
/// holding every element. The result is marked as 1-D.
pub const COLLAPSE: i32 = -2;

/// The physical shape of a tensor.
///
/// `is1d` is a display hint only: the buffer always holds `rows * cols` elements
/// in row-major order regardless of its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Shape {
    /// Number of rows. Always positive.
    pub rows: usize,
    /// Number of columns. Always positive.
    pub cols: usize,
    /// Whether consumers should treat the buffer as a flat vector.
    pub is1d: bool,
}

impl Shape {
    /// Creates a new shape, rejecting zero-sized dimensions.
    ///
    /// # Errors
    ///
    /// Returns [`TensorError::ZeroDimension`] if either dimension is zero.
    pub fn new(rows: usize, cols: usize, is1d: bool) -> Result<Self, TensorError> {
        if rows == 0 || cols == 0 {
            return Err(TensorError::ZeroDimension { rows, cols });
        }
        Ok(Self { rows, cols, is1d })
    }

    /// Shorthand for a 2-D shape (`is1d == false`).
    pub fn matrix(rows: usize, cols: usize) -> Result<Self, TensorError> {
        Self::new(rows, cols, false)
    }

    /// Total number of elements described by the shape.
    #[inline]
    pub fn numel(&self) -> usize {
        self.rows * self.cols
    }

    /// Returns the same dimensions with a different 1-D flag.
    #[inline]
    pub fn with_is1d(self, is1d: bool) -> Self {
        Self { is1d, ..self }
    }

    /// Returns the shape with rows and columns swapped.
    #[inline]
    pub fn transposed(self) -> Self {
        Self {
            rows: self.cols,
            cols: self.rows,
            is1d: self.is1d,
        }
    }

    /// Encodes the shape as the `(rows, cols, is1d)` triple written to shape wires.
    pub fn to_wire(&self) -> [i32; 3] {
        [self.rows as i32, self.cols as i32, self.is1d as i32]
    }
}

/// The scope of a reduction or axis-aware operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    /// Every element (`-1`).
    Flat,
    /// Reduce across rows, one result per column (`0`).
    Rows,
    /// Reduce across columns, one result per row (`1`).
    Cols,
}

impl TryFrom<i32> for Axis {
    type Error = TensorError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            -1 => Ok(Axis::Flat),
            0 => Ok(Axis::Rows),
            1 => Ok(Axis::Cols),
            other => Err(TensorError::InvalidAxis(other)),
        }
    }
}

impl From<Axis> for i32 {
    fn from(axis: Axis) -> Self {
        match axis {
            Axis::Flat => -1,
            Axis::Rows => 0,
            Axis::Cols => 1,
        }
    }
}

/// Reasons a reshape request cannot be resolved to a concrete shape.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShapeInferenceError {
    /// Both dimensions asked to be inferred.
    #[error("Cannot infer both dimensions of [{rows}, {cols}]")]
    BothInferred {
        /// Requested rows.
        rows: i32,
        /// Requested columns.
        cols: i32,
    },

    /// A dimension is zero or negative and not a sentinel.
    #[error("Shapes can not be < 0. Found {value} at dim {dim}")]
    NonPositive {
        /// The offending dimension index (0 = rows, 1 = cols).
        dim: usize,
        /// The requested value.
        value: i32,
    },

    /// The explicit dimension does not evenly divide the element count.
    #[error("The implicit shape can't be a fractional number. Got {total} / {by}")]
    NotDivisible {
        /// Total number of elements.
        total: usize,
        /// The explicit dimension.
        by: usize,
    },

    /// Both dimensions are explicit but their product is not the element count.
    #[error("Size({total}) must match the product of shape {rows},{cols}")]
    ProductMismatch {
        /// Total number of elements.
        total: usize,
        /// Requested rows.
        rows: usize,
        /// Requested columns.
        cols: usize,
    },

    /// The collapse sentinel was passed for the row argument.
    #[error("The collapse sentinel is only valid for the column argument")]
    CollapseOnRows,
}

fn explicit_dim(value: i32, dim: usize) -> Result<usize, ShapeInferenceError> {
    if value <= 0 {
        return Err(ShapeInferenceError::NonPositive { dim, value });
    }
    Ok(value as usize)
}

/// Resolves a reshape request over `total` elements into a concrete shape.
///
/// Either argument may be [`INFER`]. The column argument may also be
/// [`COLLAPSE`]: together with an inferred row count it yields `1 x total`
/// marked as 1-D; with an explicit row count it behaves like [`INFER`].
///
/// # Errors
///
/// Returns a [`ShapeInferenceError`] when the request is under- or
/// over-determined, names a non-positive dimension, or does not divide `total`.
///
/// # Example
///
/// ```
/// use gridwise_tensor::shape::{infer_reshape, Shape, COLLAPSE, INFER};
///
/// assert_eq!(infer_reshape(6, 3, INFER).unwrap(), Shape { rows: 3, cols: 2, is1d: false });
/// assert_eq!(infer_reshape(6, INFER, COLLAPSE).unwrap(), Shape { rows: 1, cols: 6, is1d: true });
/// assert!(infer_reshape(6, INFER, INFER).is_err());
/// ```
pub fn infer_reshape(
    total: usize,
    new_rows: i32,
    new_cols: i32,
) -> Result<Shape, ShapeInferenceError> {
    if new_rows == COLLAPSE {
        return Err(ShapeInferenceError::CollapseOnRows);
    }

    let cols_request = if new_cols == COLLAPSE { INFER } else { new_cols };

    match (new_rows, cols_request) {
        (INFER, INFER) if new_cols == COLLAPSE => Ok(Shape {
            rows: 1,
            cols: total,
            is1d: true,
        }),
        (INFER, INFER) => Err(ShapeInferenceError::BothInferred {
            rows: new_rows,
            cols: new_cols,
        }),
        (INFER, cols) => {
            let cols = explicit_dim(cols, 1)?;
            if total % cols != 0 {
                return Err(ShapeInferenceError::NotDivisible { total, by: cols });
            }
            Ok(Shape {
                rows: total / cols,
                cols,
                is1d: false,
            })
        }
        (rows, INFER) => {
            let rows = explicit_dim(rows, 0)?;
            if total % rows != 0 {
                return Err(ShapeInferenceError::NotDivisible { total, by: rows });
            }
            Ok(Shape {
                rows,
                cols: total / rows,
                is1d: false,
            })
        }
        (rows, cols) => {
            let rows = explicit_dim(rows, 0)?;
            let cols = explicit_dim(cols, 1)?;
            if rows * cols != total {
                return Err(ShapeInferenceError::ProductMismatch { total, rows, cols });
            }
            Ok(Shape {
                rows,
                cols,
                is1d: false,
            })
        }
    }
}
