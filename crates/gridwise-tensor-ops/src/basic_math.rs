//! Every function maps one element to one element and returns a tensor with the
//! source's shape. Domain errors surface as NaN, following the element type.

use gridwise_tensor::{Real, Tensor};

macro_rules! unary_ops {
    ($($(#[$doc:meta])* $name:ident => $f:expr;)*) => {
        $(
            $(#[$doc])*
            pub fn $name(tensor: &Tensor) -> Tensor {
                tensor.map($f)
            }
        )*
    };
}

unary_ops! {
    /// Absolute value.
    abs => Real::abs;
    /// Arc cosine. NaN outside `[-1, 1]`.
    acos => Real::acos;
    /// Inverse hyperbolic cosine. NaN below `1`.
    acosh => Real::acosh;
    /// Arc sine. NaN outside `[-1, 1]`.
    asin => Real::asin;
    /// Inverse hyperbolic sine.
    asinh => Real::asinh;
    /// Arc tangent.
    atan => Real::atan;
    /// Inverse hyperbolic tangent. Infinite at `±1`, NaN beyond.
    atanh => Real::atanh;
    /// Smallest integer greater than or equal to each element.
    ceil => Real::ceil;
    /// Largest integer less than or equal to each element.
    floor => Real::floor;
    /// Cosine.
    cos => Real::cos;
    /// Hyperbolic cosine.
    cosh => Real::cosh;
    /// Each element multiplied by itself.
    square => |x: Real| x * x;
}

/// Saturates every element to `[lower, upper]`.
///
/// Values above `upper` become `upper`, then values below `lower` become
/// `lower`. NaN passes through unchanged.
///
/// # Example
///
/// ```
/// use gridwise_tensor::Tensor;
/// use gridwise_tensor_ops::basic_math::clip;
///
/// let t = Tensor::from_shape_vec(1, 4, vec![-2.0, 0.5, 1.0, 3.0]).unwrap();
/// assert_eq!(clip(&t, 0.0, 1.0).as_slice(), &[0.0, 0.5, 1.0, 1.0]);
/// ```
pub fn clip(tensor: &Tensor, lower: Real, upper: Real) -> Tensor {
    tensor.map(|x| {
        if x > upper {
            upper
        } else if x < lower {
            lower
        } else {
            x
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use gridwise_tensor::TensorError;

    #[test]
    fn unary_values() -> Result<(), TensorError> {
        let t = Tensor::from_shape_vec(1, 3, vec![-1.5, 0.0, 0.5])?;
        assert_eq!(abs(&t).as_slice(), &[1.5, 0.0, 0.5]);
        assert_eq!(ceil(&t).as_slice(), &[-1.0, 0.0, 1.0]);
        assert_eq!(floor(&t).as_slice(), &[-2.0, 0.0, 0.0]);
        assert_eq!(square(&t).as_slice(), &[2.25, 0.0, 0.25]);
        assert_relative_eq!(cos(&t).as_slice()[1], 1.0);
        assert_relative_eq!(cosh(&t).as_slice()[1], 1.0);
        assert_relative_eq!(atan(&t).as_slice()[2], (0.5 as Real).atan());
        assert_relative_eq!(asinh(&t).as_slice()[0], (-1.5 as Real).asinh());
        Ok(())
    }

    #[test]
    fn domain_errors_are_nan() -> Result<(), TensorError> {
        let t = Tensor::from_shape_vec(1, 2, vec![2.0, 0.5])?;
        assert!(acos(&t).as_slice()[0].is_nan());
        assert!(asin(&t).as_slice()[0].is_nan());
        assert!(acosh(&t).as_slice()[1].is_nan());
        assert!(atanh(&t).as_slice()[0].is_nan());
        assert_relative_eq!(acosh(&t).as_slice()[0], (2.0 as Real).acosh());
        assert_relative_eq!(atanh(&t).as_slice()[1], (0.5 as Real).atanh());
        Ok(())
    }

    #[test]
    fn clip_saturates() -> Result<(), TensorError> {
        let t = Tensor::from_shape_vec(2, 2, vec![-5.0, 1.0, 2.0, 9.0])?;
        let out = clip(&t, 0.0, 2.0);
        assert_eq!(out.as_slice(), &[0.0, 1.0, 2.0, 2.0]);
        assert_eq!(out.shape(), t.shape());
        assert!(!out.shares_storage_with(&t));
        Ok(())
    }
}
