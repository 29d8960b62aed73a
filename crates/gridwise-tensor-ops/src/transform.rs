use gridwise_tensor::{Axis, OwnedBuffer, Real, Shape, Tensor};

use crate::error::TensorOpsError;

/// Pad a tensor with a constant on each side.
///
/// The result has `rows + rpad_before + rpad_after` rows and
/// `cols + cpad_before + cpad_after` columns, keeps the 1-D flag of the source,
/// and holds the source at offset `(rpad_before, cpad_before)`.
///
/// # Example
///
/// ```
/// use gridwise_tensor::Tensor;
/// use gridwise_tensor_ops::transform::pad;
///
/// let t = Tensor::from_shape_vec(2, 2, vec![1.0, 2.0, 3.0, 4.0]).unwrap();
/// let p = pad(&t, 0.0, 1, 0, 0, 1).unwrap();
/// assert_eq!((p.rows(), p.cols()), (3, 3));
/// assert_eq!(p.as_slice(), &[0.0, 0.0, 0.0, 1.0, 2.0, 0.0, 3.0, 4.0, 0.0]);
/// ```
pub fn pad(
    tensor: &Tensor,
    constant: Real,
    rpad_before: usize,
    rpad_after: usize,
    cpad_before: usize,
    cpad_after: usize,
) -> Result<Tensor, TensorOpsError> {
    let overflow = || TensorOpsError::ShapeOverflow { op: "pad" };
    let rows = tensor
        .rows()
        .checked_add(rpad_before)
        .and_then(|v| v.checked_add(rpad_after))
        .ok_or_else(overflow)?;
    let cols = tensor
        .cols()
        .checked_add(cpad_before)
        .and_then(|v| v.checked_add(cpad_after))
        .ok_or_else(overflow)?;
    let len = rows.checked_mul(cols).ok_or_else(overflow)?;
    let mut out = OwnedBuffer::filled(len, constant);

    let dst = out.as_mut_slice();
    for (r, src_row) in tensor.row_iter().enumerate() {
        let start = (r + rpad_before) * cols + cpad_before;
        dst[start..start + src_row.len()].copy_from_slice(src_row);
    }

    Ok(Tensor::from_owned(
        Shape::new(rows, cols, tensor.is_1d())?,
        out,
    )?)
}

/// Spread the flattened tensor along a diagonal.
///
/// With `L = rows * cols`, the result is an `L x cols` zero matrix whose element
/// `(i, i)` is the `i`-th source element for `i < min(L, cols)`. For a 1-D
/// `1 x n` source this is the `n x n` diagonal matrix.
pub fn diag(tensor: &Tensor) -> Result<Tensor, TensorOpsError> {
    let len = tensor.numel();
    let cols = tensor.cols();
    let size = len
        .checked_mul(cols)
        .ok_or(TensorOpsError::ShapeOverflow { op: "diag" })?;
    let mut out = OwnedBuffer::filled(size, 0.0);

    let dst = out.as_mut_slice();
    for (i, &v) in tensor.iter().take(len.min(cols)).enumerate() {
        dst[i * cols + i] = v;
    }

    Ok(Tensor::from_owned(Shape::matrix(len, cols)?, out)?)
}

/// Concatenate tensors of identical shape along the rows.
///
/// The result has `rows * count` rows, the common column count and is 2-D.
///
/// # Errors
///
/// * [`TensorOpsError::EmptyStack`] if no tensor is given.
/// * [`TensorOpsError::ShapeMismatch`] if any tensor differs in shape from the first.
pub fn stack<'a, I>(tensors: I) -> Result<Tensor, TensorOpsError>
where
    I: IntoIterator<Item = &'a Tensor>,
{
    let mut iter = tensors.into_iter();
    let first = iter.next().ok_or(TensorOpsError::EmptyStack)?;
    let (rows, cols) = (first.rows(), first.cols());

    let mut data: Vec<Real> = first.to_vec();
    let mut count = 1;
    for tensor in iter {
        if tensor.rows() != rows || tensor.cols() != cols {
            return Err(TensorOpsError::ShapeMismatch(
                vec![rows, cols],
                vec![tensor.rows(), tensor.cols()],
            ));
        }
        data.extend_from_slice(tensor.as_slice());
        count += 1;
    }

    Ok(Tensor::from_owned(
        Shape::matrix(rows * count, cols)?,
        data.into(),
    )?)
}

/// Reverse the elements of a tensor along an axis.
///
/// * [`Axis::Flat`] reverses the whole buffer.
/// * [`Axis::Rows`] reverses the order of the rows.
/// * [`Axis::Cols`] reverses the elements within each row.
pub fn reverse(tensor: &Tensor, axis: Axis) -> Result<Tensor, TensorOpsError> {
    let cols = tensor.cols();
    let mut out = tensor.to_owned_buffer();
    let dst = out.as_mut_slice();

    match axis {
        Axis::Flat => dst.reverse(),
        Axis::Rows => {
            let rows = tensor.rows();
            for r in 0..rows / 2 {
                let (head, tail) = dst.split_at_mut((rows - 1 - r) * cols);
                head[r * cols..(r + 1) * cols].swap_with_slice(&mut tail[..cols]);
            }
        }
        Axis::Cols => dst.chunks_exact_mut(cols).for_each(<[Real]>::reverse),
    }

    Ok(Tensor::from_owned(tensor.shape(), out)?)
}
