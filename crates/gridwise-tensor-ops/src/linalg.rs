use gridwise_kernels::ops::{householder_qr_kernel, matmul_kernel};
use gridwise_tensor::{Axis, OwnedBuffer, Real, Shape, Tensor, TensorError};

use crate::{error::TensorOpsError, reduce::fold_axis};

/// Columns whose Householder vector norm falls below this are left as they are.
pub const QR_EPSILON: Real = 1e-10;

/// The order of a vector norm.
///
/// The discriminants are the integer codes accepted across the host boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NormOrd {
    /// Euclidean norm, `sqrt(sum x^2)`.
    L2 = 0,
    /// Sum of absolute values.
    L1 = 1,
    /// Largest absolute value.
    Max = 2,
}

impl TryFrom<i32> for NormOrd {
    type Error = TensorError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(NormOrd::L2),
            1 => Ok(NormOrd::L1),
            2 => Ok(NormOrd::Max),
            other => Err(TensorError::InvalidNormOrd(other)),
        }
    }
}

/// Swap rows and columns into a new tensor. The 1-D flag is kept.
pub fn transpose(tensor: &Tensor) -> Result<Tensor, TensorOpsError> {
    let (rows, cols) = (tensor.rows(), tensor.cols());
    let src = tensor.as_slice();
    let mut out = OwnedBuffer::filled(rows * cols, 0.0);

    let dst = out.as_mut_slice();
    for i in 0..rows {
        for j in 0..cols {
            dst[j * rows + i] = src[i * cols + j];
        }
    }

    Ok(Tensor::from_owned(tensor.shape().transposed(), out)?)
}

/// Matrix product of `lhs` (`m x k`) and `rhs` (`k x n`).
///
/// The result is `m x n` and takes the 1-D flag of `lhs`.
///
/// # Errors
///
/// Returns [`TensorOpsError::MatmulMismatch`] if `lhs.cols() != rhs.rows()`.
///
/// # Example
///
/// ```
/// use gridwise_tensor::Tensor;
/// use gridwise_tensor_ops::linalg::matmul;
///
/// let a = Tensor::from_shape_vec(2, 2, vec![1.0, 2.0, 3.0, 4.0]).unwrap();
/// let b = Tensor::from_shape_vec(2, 1, vec![1.0, 1.0]).unwrap();
/// assert_eq!(matmul(&a, &b).unwrap().as_slice(), &[3.0, 7.0]);
/// ```
pub fn matmul(lhs: &Tensor, rhs: &Tensor) -> Result<Tensor, TensorOpsError> {
    if lhs.cols() != rhs.rows() {
        return Err(TensorOpsError::MatmulMismatch {
            lhs: [lhs.rows(), lhs.cols()],
            rhs: [rhs.rows(), rhs.cols()],
        });
    }

    let (m, k, n) = (lhs.rows(), lhs.cols(), rhs.cols());
    let mut out = OwnedBuffer::filled(m * n, 0.0);
    matmul_kernel(lhs.as_slice(), rhs.as_slice(), out.as_mut_slice(), m, k, n)?;

    Ok(Tensor::from_owned(Shape::new(m, n, lhs.is_1d())?, out)?)
}

/// Vector norm along `axis`, with the reduction shape rules of [`crate::reduce`].
///
/// # Example
///
/// ```
/// use gridwise_tensor::{Axis, Tensor};
/// use gridwise_tensor_ops::{linalg::norm, NormOrd};
///
/// let t = Tensor::from_shape_vec(1, 2, vec![3.0, 4.0]).unwrap();
/// assert_eq!(norm(&t, NormOrd::L2, Axis::Flat, false).unwrap().as_slice(), &[5.0]);
/// ```
pub fn norm(
    tensor: &Tensor,
    ord: NormOrd,
    axis: Axis,
    keepdims: bool,
) -> Result<Tensor, TensorOpsError> {
    match ord {
        NormOrd::L1 => fold_axis(tensor, axis, keepdims, 0.0, |a, x| a + x.abs(), |v, _| v),
        NormOrd::L2 => fold_axis(
            tensor,
            axis,
            keepdims,
            0.0,
            |a, x| a + x * x,
            |v, _| v.sqrt(),
        ),
        NormOrd::Max => fold_axis(
            tensor,
            axis,
            keepdims,
            Real::MIN,
            |a, x| a.max(x.abs()),
            |v, _| v,
        ),
    }
}

/// Householder QR decomposition.
///
/// Returns `R` as a new tensor and accumulates every reflection into `q`, a
/// caller-owned row-major `rows x rows` buffer which should hold the identity on
/// entry. Columns that are already eliminated are skipped.
///
/// # Errors
///
/// Returns [`TensorOpsError::KernelError`] if `q` does not hold `rows * rows` values.
pub fn qr(tensor: &Tensor, q: &mut [Real]) -> Result<Tensor, TensorOpsError> {
    let mut r = tensor.to_owned_buffer();
    let skipped = householder_qr_kernel(
        r.as_mut_slice(),
        q,
        tensor.rows(),
        tensor.cols(),
        QR_EPSILON,
    )?;
    if !skipped.is_empty() {
        log::trace!("qr: skipped degenerate columns {skipped:?}");
    }

    Ok(Tensor::from_owned(tensor.shape(), r)?)
}

/// Householder QR decomposition returning `(Q, R)`.
///
/// `Q` starts from the `rows x rows` identity.
///
/// # Example
///
/// ```
/// use gridwise_tensor::Tensor;
/// use gridwise_tensor_ops::linalg::{matmul, qr_decompose};
///
/// let a = Tensor::from_shape_vec(2, 2, vec![3.0, 1.0, 4.0, 2.0]).unwrap();
/// let (q, r) = qr_decompose(&a).unwrap();
/// let back = matmul(&q, &r).unwrap();
/// for (x, y) in back.iter().zip(a.iter()) {
///     assert!((x - y).abs() < 1e-5);
/// }
/// ```
pub fn qr_decompose(tensor: &Tensor) -> Result<(Tensor, Tensor), TensorOpsError> {
    let rows = tensor.rows();
    let mut q = Tensor::eye(rows, rows)?.to_owned_buffer();
    let r = qr(tensor, q.as_mut_slice())?;
    Ok((Tensor::from_owned(Shape::matrix(rows, rows)?, q)?, r))
}
