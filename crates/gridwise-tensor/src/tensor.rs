use thiserror::Error;

use crate::{
    shape::{infer_reshape, Shape, ShapeInferenceError},
    storage::{OwnedBuffer, TensorStorage},
    Real,
};

/// Error type for tensor creation, views and element access.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TensorError {
    /// Tensor shape does not match the provided data.
    ///
    /// The product of `rows` and `cols` must equal the number of elements exactly.
    ///
    /// # Example
    /// ```ignore
    /// // Error: shape 2x3 expects 6 elements, but got 5
    /// let tensor = Tensor::from_shape_vec(2, 3, vec![1.0, 2.0, 3.0, 4.0, 5.0])?;
    /// ```
    #[error("Shape mismatch: expected {expected} elements for shape, but got {actual} elements in data")]
    InvalidShape {
        /// Expected number of elements based on shape
        expected: usize,
        /// Actual number of elements in the data
        actual: usize,
    },

    /// A dimension of the requested shape is zero.
    #[error("Tensor dimensions must be positive, got {rows}x{cols}")]
    ZeroDimension {
        /// Requested rows
        rows: usize,
        /// Requested columns
        cols: usize,
    },

    /// A reshape request could not be resolved.
    #[error("Reshape failed: {0}")]
    ShapeInference(#[from] ShapeInferenceError),

    /// The axis argument is not one of flat (`-1`), `0` or `1`.
    #[error("Invalid axis {0}, expected -1 (flat), 0 (rows) or 1 (cols)")]
    InvalidAxis(i32),

    /// The norm order is not one of the supported orders.
    #[error("Invalid norm order {0}, expected 0 (L2), 1 (L1) or 2 (MAX)")]
    InvalidNormOrd(i32),

    /// Index exceeds tensor bounds.
    #[error("Index {index} out of bounds for dimension of size {size}")]
    IndexOutOfBounds {
        /// The invalid index that was attempted
        index: usize,
        /// The size of the dimension being indexed
        size: usize,
    },

    /// Exclusive access was requested on storage that other views hold.
    ///
    /// Safe mutable slices are only handed out for uniquely held storage.
    /// Use [`Tensor::deep_copy`] to get an independent tensor, or write
    /// through [`Tensor::as_mut_ptr`] to update every view at once.
    #[error("Storage is shared by {holders} views and cannot be borrowed mutably")]
    SharedStorage {
        /// Number of views holding the storage
        holders: usize,
    },
}

impl TensorError {
    /// Creates an InvalidShape error with clear context.
    pub fn invalid_shape(expected: usize, actual: usize) -> Self {
        Self::InvalidShape { expected, actual }
    }

    /// Creates an IndexOutOfBounds error with clear context.
    pub fn index_out_of_bounds(index: usize, size: usize) -> Self {
        Self::IndexOutOfBounds { index, size }
    }

    /// Returns a user-friendly suggestion for resolving the error.
    pub fn suggestion(&self) -> &str {
        match self {
            Self::InvalidShape { .. } => {
                "Ensure rows * cols equals the number of data elements"
            }
            Self::ZeroDimension { .. } => "Use at least one row and one column",
            Self::ShapeInference(_) => {
                "Pass -1 for at most one dimension and make sure the other divides the element count"
            }
            Self::InvalidAxis(_) => "Use -1 for every element, 0 for per-column or 1 for per-row",
            Self::InvalidNormOrd(_) => "Use 0 for L2, 1 for L1 or 2 for MAX",
            Self::IndexOutOfBounds { .. } => {
                "Verify indices are within bounds (0 <= index < dimension_size)"
            }
            Self::SharedStorage { .. } => {
                "Take a deep copy before mutating, or drop the other views first"
            }
        }
    }
}

/// Axis-aligned extent of a 2-column point set.
///
/// Column 0 is read as `x` and column 1 as `y`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Bounds {
    /// Smallest x.
    pub xmin: Real,
    /// Smallest y.
    pub ymin: Real,
    /// Largest x.
    pub xmax: Real,
    /// Largest y.
    pub ymax: Real,
}

impl Bounds {
    /// Returns the bounds as `[xmin, ymin, xmax, ymax]`.
    pub fn to_array(&self) -> [Real; 4] {
        [self.xmin, self.ymin, self.xmax, self.ymax]
    }
}

/// A dense row-major 2-D tensor of [`Real`] values.
///
/// A `Tensor` is a [`Shape`] plus a handle on reference-counted
/// [`TensorStorage`]. Operations that only reinterpret the shape
/// ([`Tensor::view`], [`Tensor::flatten`], [`Tensor::reshape`] and `clone`)
/// share the storage with their source, so a write through the raw buffer of
/// one view is visible through all of them. Operations that compute values
/// always allocate fresh storage.
///
/// # Examples
///
/// ```rust
/// use gridwise_tensor::Tensor;
///
/// let t = Tensor::from_shape_vec(2, 3, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
/// let flat = t.reshape(-1, -2).unwrap();
///
/// assert_eq!((flat.rows(), flat.cols(), flat.is_1d()), (1, 6, true));
/// assert!(flat.shares_storage_with(&t));
/// ```
pub struct Tensor {
    storage: TensorStorage,
    shape: Shape,
}

impl Tensor {
    /// Creates a zero-filled tensor.
    ///
    /// # Errors
    ///
    /// Returns [`TensorError::ZeroDimension`] if either dimension is zero.
    pub fn new(rows: usize, cols: usize, is1d: bool) -> Result<Self, TensorError> {
        let shape = Shape::new(rows, cols, is1d)?;
        Ok(Self::filled(shape, 0.0))
    }

    fn filled(shape: Shape, value: Real) -> Self {
        Self {
            storage: OwnedBuffer::filled(shape.numel(), value).into_storage(),
            shape,
        }
    }

    /// Creates a new `Tensor` with the given shape and data.
    ///
    /// # Errors
    ///
    /// Returns [`TensorError::InvalidShape`] if `data.len() != rows * cols`.
    pub fn from_shape_vec(rows: usize, cols: usize, data: Vec<Real>) -> Result<Self, TensorError> {
        let shape = Shape::matrix(rows, cols)?;
        if data.len() != shape.numel() {
            return Err(TensorError::invalid_shape(shape.numel(), data.len()));
        }
        Ok(Self {
            storage: TensorStorage::from_vec(data),
            shape,
        })
    }

    /// Creates a new `Tensor` holding a copy of `data`.
    pub fn from_shape_slice(rows: usize, cols: usize, data: &[Real]) -> Result<Self, TensorError> {
        Self::from_shape_vec(rows, cols, data.to_vec())
    }

    /// Creates a new `Tensor` with every element set to `value`.
    pub fn from_shape_val(rows: usize, cols: usize, value: Real) -> Result<Self, TensorError> {
        Ok(Self::filled(Shape::matrix(rows, cols)?, value))
    }

    /// Creates a new `Tensor` whose element `(row, col)` is `f(row, col)`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use gridwise_tensor::Tensor;
    ///
    /// let t = Tensor::from_shape_fn(2, 2, |r, c| (r * 2 + c) as _).unwrap();
    /// assert_eq!(t.as_slice(), &[0.0, 1.0, 2.0, 3.0]);
    /// ```
    pub fn from_shape_fn<F>(rows: usize, cols: usize, f: F) -> Result<Self, TensorError>
    where
        F: Fn(usize, usize) -> Real,
    {
        let shape = Shape::matrix(rows, cols)?;
        let data = (0..shape.numel())
            .map(|i| f(i / shape.cols, i % shape.cols))
            .collect();
        Ok(Self {
            storage: TensorStorage::from_vec(data),
            shape,
        })
    }

    /// Wraps a freshly computed buffer in a tensor of the given shape.
    ///
    /// # Errors
    ///
    /// Returns [`TensorError::InvalidShape`] if the buffer length does not match.
    pub fn from_owned(shape: Shape, buffer: OwnedBuffer) -> Result<Self, TensorError> {
        if buffer.len() != shape.numel() {
            return Err(TensorError::invalid_shape(shape.numel(), buffer.len()));
        }
        Ok(Self {
            storage: buffer.into_storage(),
            shape,
        })
    }

    /// Creates a zero-filled 2-D tensor.
    pub fn zeros(rows: usize, cols: usize) -> Result<Self, TensorError> {
        Self::from_shape_val(rows, cols, 0.0)
    }

    /// Creates a 2-D tensor filled with ones.
    pub fn ones(rows: usize, cols: usize) -> Result<Self, TensorError> {
        Self::from_shape_val(rows, cols, 1.0)
    }

    /// Creates a tensor with ones on `(i, i)` for `i < min(rows, cols)` and zeros elsewhere.
    pub fn eye(rows: usize, cols: usize) -> Result<Self, TensorError> {
        Self::from_shape_fn(rows, cols, |r, c| if r == c { 1.0 } else { 0.0 })
    }

    /// Creates an identity-patterned tensor with the same shape as `self`,
    /// including the 1-D flag.
    pub fn identity_like(&self) -> Self {
        let cols = self.shape.cols;
        let data = (0..self.numel())
            .map(|i| if i / cols == i % cols { 1.0 } else { 0.0 })
            .collect();
        Self {
            storage: TensorStorage::from_vec(data),
            shape: self.shape,
        }
    }

    /// The shape of the tensor.
    #[inline]
    pub fn shape(&self) -> Shape {
        self.shape
    }

    /// Number of rows.
    #[inline]
    pub fn rows(&self) -> usize {
        self.shape.rows
    }

    /// Number of columns.
    #[inline]
    pub fn cols(&self) -> usize {
        self.shape.cols
    }

    /// Whether the tensor is flagged as a flat vector.
    #[inline]
    pub fn is_1d(&self) -> bool {
        self.shape.is1d
    }

    /// Total number of elements.
    #[inline]
    pub fn numel(&self) -> usize {
        self.shape.numel()
    }

    /// Returns the elements in row-major order.
    #[inline]
    pub fn as_slice(&self) -> &[Real] {
        self.storage.as_slice()
    }

    /// Returns the elements as a mutable slice.
    ///
    /// # Errors
    ///
    /// Returns [`TensorError::SharedStorage`] when other views share the storage.
    pub fn as_slice_mut(&mut self) -> Result<&mut [Real], TensorError> {
        self.storage.as_mut_slice()
    }

    /// Returns the pointer to the first element.
    #[inline]
    pub fn as_ptr(&self) -> *const Real {
        self.storage.as_ptr()
    }

    /// Returns the raw buffer shared by every view of this storage.
    ///
    /// Writes through the pointer are visible through all sharing views.
    #[inline]
    pub fn as_mut_ptr(&self) -> *mut Real {
        self.storage.as_mut_ptr()
    }

    /// Iterates over the elements in row-major order.
    pub fn iter(&self) -> std::slice::Iter<'_, Real> {
        self.as_slice().iter()
    }

    /// Iterates over the rows as slices of length `cols`.
    pub fn row_iter(&self) -> std::slice::ChunksExact<'_, Real> {
        self.as_slice().chunks_exact(self.shape.cols)
    }

    /// Returns the element at `(row, col)`, or `None` when out of bounds.
    pub fn get(&self, row: usize, col: usize) -> Option<Real> {
        if row >= self.shape.rows || col >= self.shape.cols {
            return None;
        }
        self.as_slice().get(row * self.shape.cols + col).copied()
    }

    /// Copies the elements into a vector.
    pub fn to_vec(&self) -> Vec<Real> {
        self.as_slice().to_vec()
    }

    /// The storage handle backing this tensor.
    pub fn storage(&self) -> &TensorStorage {
        &self.storage
    }

    /// Returns true if `self` and `other` are views of the same storage.
    pub fn shares_storage_with(&self, other: &Tensor) -> bool {
        self.storage.ptr_eq(&other.storage)
    }

    /// Returns a view with the same shape sharing the storage.
    pub fn view(&self) -> Self {
        self.clone()
    }

    /// Returns a view flagged as 1-D. Rows and columns are unchanged.
    pub fn flatten(&self) -> Self {
        Self {
            storage: self.storage.clone(),
            shape: self.shape.with_is1d(true),
        }
    }

    /// Reinterprets the tensor with a new shape, sharing the storage.
    ///
    /// Either argument may be [`crate::shape::INFER`]; the column argument may
    /// be [`crate::shape::COLLAPSE`] to obtain a `1 x numel` tensor flagged as 1-D.
    ///
    /// # Errors
    ///
    /// Returns [`TensorError::ShapeInference`] when the request can't be resolved.
    pub fn reshape(&self, new_rows: i32, new_cols: i32) -> Result<Self, TensorError> {
        let shape = infer_reshape(self.numel(), new_rows, new_cols)?;
        log::debug!(
            "reshape {}x{} -> ({new_rows}, {new_cols}) resolved to {}x{} (is1d: {})",
            self.shape.rows,
            self.shape.cols,
            shape.rows,
            shape.cols,
            shape.is1d
        );
        Ok(Self {
            storage: self.storage.clone(),
            shape,
        })
    }

    /// Returns a view of the same storage with a different 1-D flag.
    pub fn with_is1d(&self, is1d: bool) -> Self {
        Self {
            storage: self.storage.clone(),
            shape: self.shape.with_is1d(is1d),
        }
    }

    /// Returns a tensor with the same shape backed by independent storage.
    pub fn deep_copy(&self) -> Self {
        Self {
            storage: self.storage.to_owned_buffer().into_storage(),
            shape: self.shape,
        }
    }

    /// Copies the elements into an exclusively owned buffer.
    pub fn to_owned_buffer(&self) -> OwnedBuffer {
        self.storage.to_owned_buffer()
    }

    /// Applies `f` to every element, producing a tensor with fresh storage.
    pub fn map<F>(&self, f: F) -> Self
    where
        F: Fn(Real) -> Real,
    {
        Self {
            storage: TensorStorage::from_vec(self.iter().map(|&v| f(v)).collect()),
            shape: self.shape,
        }
    }

    /// Computes the extent of the tensor read as `(x, y)` points.
    ///
    /// Column 0 holds `x` and column 1 holds `y`; further columns are ignored.
    /// All four values start at the first element, as the host expects.
    ///
    /// # Errors
    ///
    /// Returns [`TensorError::IndexOutOfBounds`] if the tensor has fewer than
    /// two columns.
    pub fn bounds(&self) -> Result<Bounds, TensorError> {
        if self.shape.cols < 2 {
            return Err(TensorError::index_out_of_bounds(1, self.shape.cols));
        }
        let first = self.as_slice()[0];
        let init = Bounds {
            xmin: first,
            ymin: first,
            xmax: first,
            ymax: first,
        };
        Ok(self.row_iter().fold(init, |b, row| Bounds {
            xmin: b.xmin.min(row[0]),
            ymin: b.ymin.min(row[1]),
            xmax: b.xmax.max(row[0]),
            ymax: b.ymax.max(row[1]),
        }))
    }
}

impl Clone for Tensor {
    /// Returns a view sharing the storage. Use [`Tensor::deep_copy`] for an independent copy.
    fn clone(&self) -> Self {
        Self {
            storage: self.storage.clone(),
            shape: self.shape,
        }
    }
}

impl std::fmt::Debug for Tensor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tensor")
            .field("shape", &self.shape)
            .field("storage", &self.storage)
            .finish()
    }
}

/// Dimensions longer than this are elided when displayed.
const DISPLAY_MAX: usize = 8;

/// Indices to print along a dimension of `size`; `None` marks the elision.
fn display_indices(size: usize) -> Vec<Option<usize>> {
    if size > DISPLAY_MAX {
        vec![Some(0), Some(1), Some(2), None, Some(size - 1)]
    } else {
        (0..size).map(Some).collect()
    }
}

fn format_value(v: Real, scientific: bool) -> String {
    if !scientific {
        return format!("{v:.4}");
    }
    let num = format!("{v:.4e}");
    match num.split_once('e') {
        Some((mantissa, exp)) => {
            let (sign, digits) = match exp.strip_prefix('-') {
                Some(stripped) => ('-', stripped),
                None => ('+', exp),
            };
            format!("{mantissa}e{sign}{digits:0>2}")
        }
        None => num,
    }
}

impl std::fmt::Display for Tensor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let width = self
            .iter()
            .map(|v| format!("{v:.4}").len())
            .max()
            .unwrap_or(0);
        let scientific = width > 8;
        let width = self
            .iter()
            .map(|&v| format_value(v, scientific).len())
            .max()
            .unwrap_or(0);

        let write_row = |f: &mut std::fmt::Formatter<'_>, values: &[Real]| -> std::fmt::Result {
            write!(f, "[")?;
            for (n, idx) in display_indices(values.len()).into_iter().enumerate() {
                if n > 0 {
                    write!(f, ", ")?;
                }
                match idx {
                    Some(i) => write!(f, "{:>width$}", format_value(values[i], scientific))?,
                    None => write!(f, "...")?,
                }
            }
            write!(f, "]")
        };

        if self.shape.is1d {
            return write_row(f, self.as_slice());
        }

        write!(f, "[")?;
        let rows = display_indices(self.shape.rows);
        let last = rows.len() - 1;
        for (n, idx) in rows.into_iter().enumerate() {
            if n > 0 {
                write!(f, " ")?;
            }
            match idx {
                Some(r) => {
                    let start = r * self.shape.cols;
                    write_row(f, &self.as_slice()[start..start + self.shape.cols])?;
                }
                None => write!(f, "...")?,
            }
            if n != last {
                writeln!(f, ",")?;
            }
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::{COLLAPSE, INFER};

    #[test]
    fn constructor() -> Result<(), TensorError> {
        let t = Tensor::from_shape_vec(2, 3, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0])?;
        assert_eq!((t.rows(), t.cols(), t.is_1d()), (2, 3, false));
        assert_eq!(t.numel(), 6);
        assert_eq!(t.as_slice(), &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        Ok(())
    }

    #[test]
    fn constructor_rejects_bad_lengths() {
        assert_eq!(
            Tensor::from_shape_vec(2, 2, vec![1.0; 3]).err(),
            Some(TensorError::InvalidShape {
                expected: 4,
                actual: 3
            })
        );
        assert_eq!(
            Tensor::new(0, 2, false).err(),
            Some(TensorError::ZeroDimension { rows: 0, cols: 2 })
        );
    }

    #[test]
    fn new_is_zeroed() -> Result<(), TensorError> {
        let t = Tensor::new(2, 2, true)?;
        assert!(t.is_1d());
        assert!(t.iter().all(|&v| v == 0.0));
        Ok(())
    }

    #[test]
    fn eye_rectangular() -> Result<(), TensorError> {
        let t = Tensor::eye(2, 3)?;
        assert_eq!(t.as_slice(), &[1.0, 0.0, 0.0, 0.0, 1.0, 0.0]);
        let t = Tensor::eye(3, 2)?;
        assert_eq!(t.as_slice(), &[1.0, 0.0, 0.0, 1.0, 0.0, 0.0]);
        assert_eq!(t.identity_like().as_slice(), t.as_slice());
        Ok(())
    }

    #[test]
    fn get_2d() -> Result<(), TensorError> {
        let t = Tensor::from_shape_fn(2, 3, |r, c| (r * 10 + c) as Real)?;
        assert_eq!(t.get(1, 2), Some(12.0));
        assert_eq!(t.get(0, 1), Some(1.0));
        assert_eq!(t.get(2, 0), None);
        assert_eq!(t.get(0, 3), None);
        Ok(())
    }

    #[test]
    fn views_share_storage() -> Result<(), TensorError> {
        let t = Tensor::from_shape_vec(2, 2, vec![1.0, 2.0, 3.0, 4.0])?;
        let flat = t.flatten();
        let reshaped = t.reshape(INFER, 1)?;
        let view = t.view();

        assert!(flat.shares_storage_with(&t));
        assert!(reshaped.shares_storage_with(&t));
        assert!(view.shares_storage_with(&t));
        assert_eq!((flat.rows(), flat.cols(), flat.is_1d()), (2, 2, true));
        assert_eq!((reshaped.rows(), reshaped.cols()), (4, 1));
        assert_eq!(t.storage().holders(), 4);
        Ok(())
    }

    #[test]
    fn write_through_view_is_visible() -> Result<(), TensorError> {
        let t = Tensor::from_shape_vec(2, 2, vec![1.0, 2.0, 3.0, 4.0])?;
        let t2 = t.flatten();

        // SAFETY: index in bounds, no slices alive while writing
        unsafe { *t.as_mut_ptr().add(3) = 40.0 };
        assert_eq!(t2.as_slice()[3], 40.0);

        // SAFETY: as above
        unsafe { *t2.as_mut_ptr() = -1.0 };
        assert_eq!(t.get(0, 0), Some(-1.0));
        Ok(())
    }

    #[test]
    fn deep_copy_is_independent() -> Result<(), TensorError> {
        let t = Tensor::from_shape_vec(1, 3, vec![1.0, 2.0, 3.0])?;
        let mut copy = t.deep_copy();
        assert!(!copy.shares_storage_with(&t));
        copy.as_slice_mut()?[0] = 9.0;
        assert_eq!(t.as_slice(), &[1.0, 2.0, 3.0]);
        Ok(())
    }

    #[test]
    fn mutable_slice_needs_unique_storage() -> Result<(), TensorError> {
        let mut t = Tensor::zeros(2, 2)?;
        let view = t.view();
        assert_eq!(
            t.as_slice_mut().err(),
            Some(TensorError::SharedStorage { holders: 2 })
        );
        drop(view);
        t.as_slice_mut()?[1] = 5.0;
        assert_eq!(t.get(0, 1), Some(5.0));
        Ok(())
    }

    #[test]
    fn reshape_collapse() -> Result<(), TensorError> {
        let t = Tensor::ones(3, 4)?;
        let flat = t.reshape(INFER, COLLAPSE)?;
        assert_eq!(flat.shape(), Shape::new(1, 12, true)?);
        assert!(matches!(
            t.reshape(5, INFER),
            Err(TensorError::ShapeInference(
                ShapeInferenceError::NotDivisible { total: 12, by: 5 }
            ))
        ));
        assert!(t.reshape(INFER, INFER).is_err());
        Ok(())
    }

    #[test]
    fn map_allocates() -> Result<(), TensorError> {
        let t = Tensor::from_shape_vec(1, 2, vec![1.0, 2.0])?;
        let doubled = t.map(|v| v * 2.0);
        assert!(!doubled.shares_storage_with(&t));
        assert_eq!(doubled.as_slice(), &[2.0, 4.0]);
        Ok(())
    }

    #[test]
    fn bounds_of_points() -> Result<(), TensorError> {
        let t = Tensor::from_shape_vec(3, 2, vec![1.0, 5.0, -2.0, 3.0, 4.0, 7.0])?;
        let b = t.bounds()?;
        assert_eq!(b.to_array(), [-2.0, 1.0, 4.0, 7.0]);
        assert!(Tensor::zeros(3, 1)?.bounds().is_err());
        Ok(())
    }

    #[test]
    fn display_small() -> Result<(), TensorError> {
        let t = Tensor::from_shape_vec(2, 2, vec![1.0, 2.0, 3.0, 4.0])?;
        assert_eq!(
            format!("{t}"),
            "[[1.0000, 2.0000],\n [3.0000, 4.0000]]"
        );
        assert_eq!(format!("{}", t.flatten()), "[1.0000, 2.0000, 3.0000, 4.0000]");
        Ok(())
    }

    #[test]
    fn display_elides_large() -> Result<(), TensorError> {
        let t = Tensor::from_shape_fn(1, 10, |_, c| c as Real)?;
        assert_eq!(
            format!("{t}"),
            "[[0.0000, 1.0000, 2.0000, ..., 9.0000]]"
        );
        Ok(())
    }
}
