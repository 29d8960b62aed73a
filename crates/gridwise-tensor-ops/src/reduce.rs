use gridwise_kernels::ops::{
    arg_extremum_kernel, arg_step_cols_kernel, arg_step_rows_kernel, fold_cols_kernel,
    fold_flat_kernel, fold_rows_kernel,
};
use gridwise_tensor::{Axis, Real, Shape, Tensor};

use crate::error::TensorOpsError;

/// Shape of a reduction result.
///
/// `Flat` gives `1 x 1`, `Rows` gives `1 x cols` and `Cols` gives `rows x 1`.
/// Only a flat reduction without `keepdims` is flagged as 1-D.
pub(crate) fn reduced_shape(
    tensor: &Tensor,
    axis: Axis,
    keepdims: bool,
) -> Result<Shape, TensorOpsError> {
    let (rows, cols) = match axis {
        Axis::Flat => (1, 1),
        Axis::Rows => (1, tensor.cols()),
        Axis::Cols => (tensor.rows(), 1),
    };
    Ok(Shape::new(rows, cols, !keepdims && axis == Axis::Flat)?)
}

/// Folds `tensor` along `axis`, then maps every folded value through `finish`.
///
/// `finish` receives the folded value and the number of elements that went into it.
pub(crate) fn fold_axis<F, G>(
    tensor: &Tensor,
    axis: Axis,
    keepdims: bool,
    init: Real,
    fold: F,
    finish: G,
) -> Result<Tensor, TensorOpsError>
where
    F: Fn(Real, Real) -> Real,
    G: Fn(Real, usize) -> Real,
{
    let src = tensor.as_slice();
    let (values, count) = match axis {
        Axis::Flat => (vec![fold_flat_kernel(src, init, fold)], tensor.numel()),
        Axis::Rows => (
            fold_rows_kernel(src, tensor.cols(), init, fold),
            tensor.rows(),
        ),
        Axis::Cols => (
            fold_cols_kernel(src, tensor.cols(), init, fold),
            tensor.cols(),
        ),
    };
    let values: Vec<Real> = values.into_iter().map(|v| finish(v, count)).collect();
    Ok(Tensor::from_owned(
        reduced_shape(tensor, axis, keepdims)?,
        values.into(),
    )?)
}

fn truthy(x: Real) -> bool {
    x != 0.0
}

fn from_bool(b: bool) -> Real {
    if b {
        1.0
    } else {
        0.0
    }
}

/// Sum of the elements along `axis`.
///
/// # Example
///
/// ```
/// use gridwise_tensor::{Axis, Tensor};
/// use gridwise_tensor_ops::reduce::sum;
///
/// let t = Tensor::from_shape_vec(2, 3, vec![1.0, 1.0, 1.0, 1.0, 1.0, 1.0]).unwrap();
/// let agg = sum(&t, Axis::Cols, false).unwrap();
/// assert_eq!((agg.rows(), agg.cols()), (2, 1));
/// assert_eq!(agg.as_slice(), &[3.0, 3.0]);
/// ```
pub fn sum(tensor: &Tensor, axis: Axis, keepdims: bool) -> Result<Tensor, TensorOpsError> {
    fold_axis(tensor, axis, keepdims, 0.0, |a, x| a + x, |v, _| v)
}

/// Product of the elements along `axis`.
pub fn prod(tensor: &Tensor, axis: Axis, keepdims: bool) -> Result<Tensor, TensorOpsError> {
    fold_axis(tensor, axis, keepdims, 1.0, |a, x| a * x, |v, _| v)
}

/// Arithmetic mean of the elements along `axis`.
pub fn mean(tensor: &Tensor, axis: Axis, keepdims: bool) -> Result<Tensor, TensorOpsError> {
    fold_axis(
        tensor,
        axis,
        keepdims,
        0.0,
        |a, x| a + x,
        |v, n| v / n as Real,
    )
}

/// Smallest element along `axis`. NaN elements are ignored.
pub fn min(tensor: &Tensor, axis: Axis, keepdims: bool) -> Result<Tensor, TensorOpsError> {
    fold_axis(
        tensor,
        axis,
        keepdims,
        Real::INFINITY,
        |a, x| if x < a { x } else { a },
        |v, _| v,
    )
}

/// Largest element along `axis`. NaN elements are ignored.
pub fn max(tensor: &Tensor, axis: Axis, keepdims: bool) -> Result<Tensor, TensorOpsError> {
    fold_axis(
        tensor,
        axis,
        keepdims,
        Real::MIN,
        |a, x| if x > a { x } else { a },
        |v, _| v,
    )
}

/// `1` where every element along `axis` is non-zero, `0` otherwise.
pub fn all(tensor: &Tensor, axis: Axis, keepdims: bool) -> Result<Tensor, TensorOpsError> {
    fold_axis(
        tensor,
        axis,
        keepdims,
        1.0,
        |a, x| from_bool(truthy(a) && truthy(x)),
        |v, _| v,
    )
}

/// `1` where any element along `axis` is non-zero, `0` otherwise.
pub fn any(tensor: &Tensor, axis: Axis, keepdims: bool) -> Result<Tensor, TensorOpsError> {
    fold_axis(
        tensor,
        axis,
        keepdims,
        0.0,
        |a, x| from_bool(truthy(a) || truthy(x)),
        |v, _| v,
    )
}

fn arg_op<F>(tensor: &Tensor, axis: Axis, better: F) -> Result<Tensor, TensorOpsError>
where
    F: Fn(Real, Real) -> bool,
{
    let src = tensor.as_slice();
    let cols = tensor.cols();

    // a flagged vector ignores the axis entirely
    let axis = if tensor.is_1d() { Axis::Flat } else { axis };
    let (indices, rows, out_cols) = match axis {
        Axis::Flat => (
            vec![arg_extremum_kernel(src, better).unwrap_or(0)],
            1,
            1,
        ),
        Axis::Rows => (arg_step_rows_kernel(src, cols, better), 1, cols),
        Axis::Cols => (arg_step_cols_kernel(src, cols, better), tensor.rows(), 1),
    };

    let values: Vec<Real> = indices.into_iter().map(|i| i as Real).collect();
    Ok(Tensor::from_owned(
        Shape::new(rows, out_cols, tensor.is_1d())?,
        values.into(),
    )?)
}

/// Index of the largest element.
///
/// * On a 1-D tensor, or with [`Axis::Flat`], the flat index of the first
///   occurrence of the maximum, as a `1 x 1` tensor. The axis is ignored for
///   1-D tensors.
/// * With [`Axis::Rows`] or [`Axis::Cols`] on a 2-D tensor, for each column
///   (resp. row) the last index whose value is greater than its immediate
///   predecessor along the axis, or `0` if there is none. This compares
///   adjacent pairs and is not an arg-max over the whole axis.
///
/// # Example
///
/// ```
/// use gridwise_tensor::{Axis, Tensor};
/// use gridwise_tensor_ops::reduce::arg_max;
///
/// let t = Tensor::from_shape_vec(1, 4, vec![5.0, 1.0, 2.0, 0.0]).unwrap();
/// // 2 > 1 at index 2 is the last adjacent improvement along the row
/// assert_eq!(arg_max(&t, Axis::Cols).unwrap().as_slice(), &[2.0]);
/// assert_eq!(arg_max(&t.flatten(), Axis::Cols).unwrap().as_slice(), &[0.0]);
/// ```
pub fn arg_max(tensor: &Tensor, axis: Axis) -> Result<Tensor, TensorOpsError> {
    arg_op(tensor, axis, |v, best| v > best)
}

/// Index of the smallest element, with the same conventions as [`arg_max`].
pub fn arg_min(tensor: &Tensor, axis: Axis) -> Result<Tensor, TensorOpsError> {
    arg_op(tensor, axis, |v, best| v < best)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sample() -> Result<Tensor, TensorOpsError> {
        // [[1, 2, 3],
        //  [4, 5, 6]]
        Ok(Tensor::from_shape_vec(2, 3, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0])?)
    }

    #[test]
    fn sum_axes() -> Result<(), TensorOpsError> {
        let t = sample()?;

        let flat = sum(&t, Axis::Flat, false)?;
        assert_eq!((flat.rows(), flat.cols(), flat.is_1d()), (1, 1, true));
        assert_eq!(flat.as_slice(), &[21.0]);

        let kept = sum(&t, Axis::Flat, true)?;
        assert!(!kept.is_1d());

        let per_col = sum(&t, Axis::Rows, false)?;
        assert_eq!((per_col.rows(), per_col.cols(), per_col.is_1d()), (1, 3, false));
        assert_eq!(per_col.as_slice(), &[5.0, 7.0, 9.0]);

        let per_row = sum(&t, Axis::Cols, false)?;
        assert_eq!((per_row.rows(), per_row.cols()), (2, 1));
        assert_eq!(per_row.as_slice(), &[6.0, 15.0]);
        Ok(())
    }

    #[test]
    fn prod_and_mean() -> Result<(), TensorOpsError> {
        let t = sample()?;
        assert_eq!(prod(&t, Axis::Flat, false)?.as_slice(), &[720.0]);
        assert_eq!(prod(&t, Axis::Rows, false)?.as_slice(), &[4.0, 10.0, 18.0]);

        assert_relative_eq!(mean(&t, Axis::Flat, false)?.as_slice()[0], 3.5);
        assert_eq!(mean(&t, Axis::Rows, false)?.as_slice(), &[2.5, 3.5, 4.5]);
        assert_eq!(mean(&t, Axis::Cols, false)?.as_slice(), &[2.0, 5.0]);
        Ok(())
    }

    #[test]
    fn min_max() -> Result<(), TensorOpsError> {
        let t = Tensor::from_shape_vec(2, 2, vec![-3.0, 8.0, 2.0, -9.0])?;
        assert_eq!(min(&t, Axis::Flat, false)?.as_slice(), &[-9.0]);
        assert_eq!(max(&t, Axis::Flat, false)?.as_slice(), &[8.0]);
        assert_eq!(min(&t, Axis::Rows, false)?.as_slice(), &[-3.0, -9.0]);
        assert_eq!(max(&t, Axis::Cols, false)?.as_slice(), &[8.0, 2.0]);
        Ok(())
    }

    #[test]
    fn all_any() -> Result<(), TensorOpsError> {
        let t = Tensor::from_shape_vec(2, 2, vec![1.0, 0.0, 2.0, 3.0])?;
        assert_eq!(all(&t, Axis::Flat, false)?.as_slice(), &[0.0]);
        assert_eq!(all(&t, Axis::Rows, false)?.as_slice(), &[1.0, 0.0]);
        assert_eq!(all(&t, Axis::Cols, false)?.as_slice(), &[0.0, 1.0]);
        assert_eq!(any(&t, Axis::Flat, false)?.as_slice(), &[1.0]);

        let z = Tensor::zeros(2, 2)?;
        assert_eq!(any(&z, Axis::Rows, false)?.as_slice(), &[0.0, 0.0]);
        Ok(())
    }

    #[test]
    fn arg_on_vector_is_global() -> Result<(), TensorOpsError> {
        let t = Tensor::from_shape_vec(1, 5, vec![3.0, 9.0, 1.0, 9.0, 1.0])?.flatten();
        let am = arg_max(&t, Axis::Rows)?;
        assert_eq!((am.rows(), am.cols(), am.is_1d()), (1, 1, true));
        assert_eq!(am.as_slice(), &[1.0]);
        assert_eq!(arg_min(&t, Axis::Flat)?.as_slice(), &[2.0]);
        Ok(())
    }

    #[test]
    fn arg_on_matrix_uses_adjacent_steps() -> Result<(), TensorOpsError> {
        // column 0: 9, 1, 5 -> last step up at row 2 even though row 0 is the max
        // column 1: 1, 2, 3 -> last step up at row 2
        let t = Tensor::from_shape_vec(3, 2, vec![9.0, 1.0, 1.0, 2.0, 5.0, 3.0])?;
        let am = arg_max(&t, Axis::Rows)?;
        assert_eq!((am.rows(), am.cols(), am.is_1d()), (1, 2, false));
        assert_eq!(am.as_slice(), &[2.0, 2.0]);

        // column 0: step down at row 1 only; column 1: never steps down
        assert_eq!(arg_min(&t, Axis::Rows)?.as_slice(), &[1.0, 0.0]);

        let am = arg_max(&t, Axis::Cols)?;
        assert_eq!((am.rows(), am.cols()), (3, 1));
        assert_eq!(am.as_slice(), &[0.0, 1.0, 0.0]);

        // flat on a matrix behaves like the vector case
        assert_eq!(arg_max(&t, Axis::Flat)?.as_slice(), &[0.0]);
        Ok(())
    }

    #[test]
    fn reductions_allocate() -> Result<(), TensorOpsError> {
        let t = Tensor::ones(1, 1)?;
        let s = sum(&t, Axis::Flat, true)?;
        assert!(!s.shares_storage_with(&t));
        Ok(())
    }
}
