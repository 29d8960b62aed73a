use gridwise_kernels::ops::{broadcast_kernel, zip_kernel};
use gridwise_tensor::{OwnedBuffer, Real, Tensor};

use crate::error::TensorOpsError;

/// The right hand side of a binary elementwise operation.
#[derive(Debug, Clone, Copy)]
pub enum Operand<'a> {
    /// A single value applied to every element.
    Scalar(Real),
    /// Raw values broadcast by length: 1, `cols` or `rows * cols`.
    Slice(&'a [Real]),
    /// A tensor of exactly the same shape, matched elementwise.
    Tensor(&'a Tensor),
}

impl From<Real> for Operand<'_> {
    fn from(value: Real) -> Self {
        Operand::Scalar(value)
    }
}

impl<'a> From<&'a [Real]> for Operand<'a> {
    fn from(values: &'a [Real]) -> Self {
        Operand::Slice(values)
    }
}

impl<'a, const N: usize> From<&'a [Real; N]> for Operand<'a> {
    fn from(values: &'a [Real; N]) -> Self {
        Operand::Slice(values)
    }
}

impl<'a> From<&'a Vec<Real>> for Operand<'a> {
    fn from(values: &'a Vec<Real>) -> Self {
        Operand::Slice(values)
    }
}

impl<'a> From<&'a Tensor> for Operand<'a> {
    fn from(tensor: &'a Tensor) -> Self {
        Operand::Tensor(tensor)
    }
}

fn apply<'a, F>(
    tensor: &Tensor,
    rhs: impl Into<Operand<'a>>,
    op: F,
) -> Result<OwnedBuffer, TensorOpsError>
where
    F: Fn(Real, Real) -> Real,
{
    let mut out = tensor.to_owned_buffer();
    match rhs.into() {
        Operand::Scalar(value) => {
            out.as_mut_slice().iter_mut().for_each(|x| *x = op(*x, value));
        }
        Operand::Slice(values) => {
            let len = values.len();
            if len != 1 && len != tensor.cols() && len != tensor.numel() {
                return Err(TensorOpsError::BroadcastMismatch {
                    len,
                    rows: tensor.rows(),
                    cols: tensor.cols(),
                });
            }
            broadcast_kernel(out.as_mut_slice(), tensor.cols(), values, op)?;
        }
        Operand::Tensor(other) => {
            if other.rows() != tensor.rows() || other.cols() != tensor.cols() {
                return Err(TensorOpsError::ShapeMismatch(
                    vec![tensor.rows(), tensor.cols()],
                    vec![other.rows(), other.cols()],
                ));
            }
            zip_kernel(out.as_mut_slice(), other.as_slice(), op)?;
        }
    }
    Ok(out)
}

/// Applies `op(lhs, rhs)` elementwise into a copy of `tensor`.
///
/// This is the building block of every function in this module.
///
/// # Errors
///
/// * [`TensorOpsError::BroadcastMismatch`] if a slice operand has an unsupported length.
/// * [`TensorOpsError::ShapeMismatch`] if a tensor operand has a different shape.
pub fn binary_op<'a, F>(
    tensor: &Tensor,
    rhs: impl Into<Operand<'a>>,
    op: F,
) -> Result<Tensor, TensorOpsError>
where
    F: Fn(Real, Real) -> Real,
{
    let out = apply(tensor, rhs, op)?;
    Ok(Tensor::from_owned(tensor.shape(), out)?)
}

/// Elementwise addition.
///
/// # Example
///
/// ```
/// use gridwise_tensor::{Real, Tensor};
/// use gridwise_tensor_ops::arithmetic::add;
///
/// let t = Tensor::from_shape_vec(2, 2, vec![1.0, 2.0, 3.0, 4.0]).unwrap();
/// let row: [Real; 2] = [10.0, 20.0];
/// let out = add(&t, &row).unwrap();
/// assert_eq!(out.as_slice(), &[11.0, 22.0, 13.0, 24.0]);
/// ```
pub fn add<'a>(tensor: &Tensor, rhs: impl Into<Operand<'a>>) -> Result<Tensor, TensorOpsError> {
    binary_op(tensor, rhs, |a, b| a + b)
}

/// Elementwise subtraction.
pub fn sub<'a>(tensor: &Tensor, rhs: impl Into<Operand<'a>>) -> Result<Tensor, TensorOpsError> {
    binary_op(tensor, rhs, |a, b| a - b)
}

/// Elementwise multiplication.
pub fn mul<'a>(tensor: &Tensor, rhs: impl Into<Operand<'a>>) -> Result<Tensor, TensorOpsError> {
    binary_op(tensor, rhs, |a, b| a * b)
}

/// Elementwise division.
///
/// With `no_nan` set, every infinite or NaN quotient is replaced by `0`.
pub fn div<'a>(
    tensor: &Tensor,
    rhs: impl Into<Operand<'a>>,
    no_nan: bool,
) -> Result<Tensor, TensorOpsError> {
    let mut buffer = apply(tensor, rhs, |a, b| a / b)?;
    if !no_nan {
        return Ok(Tensor::from_owned(tensor.shape(), buffer)?);
    }

    let mut rewritten = 0usize;
    for x in buffer.as_mut_slice() {
        if !x.is_finite() {
            *x = 0.0;
            rewritten += 1;
        }
    }
    if rewritten > 0 {
        log::warn!("div: replaced {rewritten} non-finite quotients with 0");
    }
    Ok(Tensor::from_owned(tensor.shape(), buffer)?)
}

/// Elementwise maximum.
pub fn maximum<'a>(
    tensor: &Tensor,
    rhs: impl Into<Operand<'a>>,
) -> Result<Tensor, TensorOpsError> {
    binary_op(tensor, rhs, Real::max)
}

/// Elementwise minimum.
pub fn minimum<'a>(
    tensor: &Tensor,
    rhs: impl Into<Operand<'a>>,
) -> Result<Tensor, TensorOpsError> {
    binary_op(tensor, rhs, Real::min)
}

/// Elementwise floating point remainder, truncated toward zero.
pub fn modulo<'a>(
    tensor: &Tensor,
    rhs: impl Into<Operand<'a>>,
) -> Result<Tensor, TensorOpsError> {
    binary_op(tensor, rhs, |a, b| a % b)
}

/// Elementwise power `lhs^rhs`.
pub fn pow<'a>(tensor: &Tensor, rhs: impl Into<Operand<'a>>) -> Result<Tensor, TensorOpsError> {
    binary_op(tensor, rhs, Real::powf)
}

/// Elementwise `(lhs - rhs)^2`.
pub fn squared_diff<'a>(
    tensor: &Tensor,
    rhs: impl Into<Operand<'a>>,
) -> Result<Tensor, TensorOpsError> {
    binary_op(tensor, rhs, |a, b| (a - b) * (a - b))
}

/// Elementwise four-quadrant arctangent of `lhs / rhs`.
pub fn atan2<'a>(
    tensor: &Tensor,
    rhs: impl Into<Operand<'a>>,
) -> Result<Tensor, TensorOpsError> {
    binary_op(tensor, rhs, Real::atan2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sample() -> Result<Tensor, TensorOpsError> {
        Ok(Tensor::from_shape_vec(2, 3, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0])?)
    }

    #[test]
    fn add_scalar() -> Result<(), TensorOpsError> {
        let t = sample()?;
        let out = add(&t, Operand::Scalar(1.5))?;
        for (e, o) in t.iter().zip(out.iter()) {
            assert_eq!(*o, e + 1.5);
        }
        // a length-1 slice behaves like a scalar
        let one: [Real; 1] = [1.5];
        assert_eq!(add(&t, &one)?.as_slice(), out.as_slice());
        Ok(())
    }

    #[test]
    fn add_row_broadcast() -> Result<(), TensorOpsError> {
        let t = sample()?;
        let v: [Real; 3] = [10.0, 20.0, 30.0];
        let out = add(&t, &v)?;
        for i in 0..2 {
            for j in 0..3 {
                assert_eq!(out.get(i, j), Some(t.get(i, j).unwrap_or(0.0) + v[j]));
            }
        }
        Ok(())
    }

    #[test]
    fn sub_full_length() -> Result<(), TensorOpsError> {
        let t = sample()?;
        let ones: Vec<Real> = vec![1.0; 6];
        let out = sub(&t, &ones)?;
        assert_eq!(out.as_slice(), &[0.0, 1.0, 2.0, 3.0, 4.0, 5.0]);
        Ok(())
    }

    #[test]
    fn broadcast_mismatch() -> Result<(), TensorOpsError> {
        let t = sample()?;
        assert_eq!(
            mul(&t, &[1.0 as Real, 2.0]).err(),
            Some(TensorOpsError::BroadcastMismatch {
                len: 2,
                rows: 2,
                cols: 3
            })
        );
        Ok(())
    }

    #[test]
    fn tensor_operand_requires_same_shape() -> Result<(), TensorOpsError> {
        let t = sample()?;
        let other = Tensor::ones(3, 2)?;
        assert_eq!(
            maximum(&t, &other).err(),
            Some(TensorOpsError::ShapeMismatch(vec![2, 3], vec![3, 2]))
        );

        let other = Tensor::from_shape_val(2, 3, 3.5)?;
        assert_eq!(
            maximum(&t, &other)?.as_slice(),
            &[3.5, 3.5, 3.5, 4.0, 5.0, 6.0]
        );
        assert_eq!(
            minimum(&t, &other)?.as_slice(),
            &[1.0, 2.0, 3.0, 3.5, 3.5, 3.5]
        );
        Ok(())
    }

    #[test]
    fn result_does_not_alias_source() -> Result<(), TensorOpsError> {
        let t = sample()?;
        let t3 = add(&t, &[1.0 as Real])?;
        assert!(!t3.shares_storage_with(&t));

        // SAFETY: index in bounds, no slices alive while writing
        unsafe { *t3.as_mut_ptr() = 100.0 };
        assert_eq!(t.get(0, 0), Some(1.0));
        Ok(())
    }

    #[test]
    fn div_no_nan() -> Result<(), TensorOpsError> {
        let t = Tensor::from_shape_vec(1, 3, vec![1.0, -1.0, 0.0])?;
        let out = div(&t, Operand::Scalar(0.0), true)?;
        assert_eq!(out.as_slice(), &[0.0, 0.0, 0.0]);

        let out = div(&t, Operand::Scalar(0.0), false)?;
        assert!(out.as_slice()[0].is_infinite());
        assert!(out.as_slice()[1].is_infinite());
        assert!(out.as_slice()[2].is_nan());
        Ok(())
    }

    #[test]
    fn modulo_pow_squared_diff() -> Result<(), TensorOpsError> {
        let t = Tensor::from_shape_vec(1, 3, vec![5.5, -7.0, 2.0])?;
        assert_eq!(modulo(&t, Operand::Scalar(2.0))?.as_slice(), &[1.5, -1.0, 0.0]);
        assert_eq!(pow(&t, &[2.0 as Real, 1.0, 3.0])?.as_slice(), &[30.25, -7.0, 8.0]);
        assert_eq!(squared_diff(&t, Operand::Scalar(2.0))?.as_slice(), &[12.25, 81.0, 0.0]);
        Ok(())
    }

    #[test]
    fn atan2_quadrants() -> Result<(), TensorOpsError> {
        let t = Tensor::from_shape_vec(1, 2, vec![1.0, -1.0])?;
        let out = atan2(&t, Operand::Scalar(-1.0))?;
        assert_relative_eq!(
            out.as_slice()[0],
            3.0 * std::f64::consts::FRAC_PI_4 as Real,
            epsilon = 1e-6
        );
        assert_relative_eq!(
            out.as_slice()[1],
            -3.0 * std::f64::consts::FRAC_PI_4 as Real,
            epsilon = 1e-6
        );
        Ok(())
    }

    #[test]
    fn keeps_is1d_flag() -> Result<(), TensorOpsError> {
        let t = sample()?.flatten();
        assert!(add(&t, Operand::Scalar(1.0))?.is_1d());
        Ok(())
    }
}
