use crate::error::KernelError;
use num_traits::Float;

/// Applies a binary operation between a row-major matrix and a broadcast right hand side.
///
/// The right hand side is matched against `dst` (a `rows x cols` matrix, with
/// `rows = dst.len() / cols`) using the following rules, checked in order:
///
/// * `rhs.len() == 1` - the value is applied to every element.
/// * `rhs.len() == cols` - `rhs[j]` is applied to column `j` of every row.
/// * `rhs.len() == rows * cols` - elementwise match in row-major order.
///
/// # Arguments
///
/// * `dst` - The buffer to update in place. `cols` must be non-zero.
/// * `cols` - The number of columns of the matrix stored in `dst`.
/// * `rhs` - The broadcast operand.
/// * `op` - The operation, called as `op(dst_value, rhs_value)`.
///
/// # Errors
///
/// Returns [`KernelError::BroadcastMismatch`] if `rhs` has any other length.
///
/// Example:
/// ```
/// use gridwise_kernels::ops::broadcast_kernel;
///
/// let mut dst = [1.0, 2.0, 3.0, 4.0];
/// broadcast_kernel(&mut dst, 2, &[10.0, 20.0], |a, b| a + b).unwrap();
/// assert_eq!(dst, [11.0, 22.0, 13.0, 24.0]);
/// ```
pub fn broadcast_kernel<T, F>(dst: &mut [T], cols: usize, rhs: &[T], op: F) -> Result<(), KernelError>
where
    T: Copy,
    F: Fn(T, T) -> T,
{
    let numel = dst.len();
    match rhs.len() {
        1 => {
            let scalar = rhs[0];
            dst.iter_mut().for_each(|x| *x = op(*x, scalar));
        }
        len if len == cols => {
            dst.chunks_exact_mut(cols).for_each(|row| {
                row.iter_mut()
                    .zip(rhs.iter())
                    .for_each(|(x, &v)| *x = op(*x, v))
            });
        }
        len if len == numel => {
            dst.iter_mut()
                .zip(rhs.iter())
                .for_each(|(x, &v)| *x = op(*x, v));
        }
        len => {
            return Err(KernelError::BroadcastMismatch {
                len,
                rows: numel / cols,
                cols,
            })
        }
    }
    Ok(())
}

/// Applies a binary operation between two buffers of the same length, in place on `dst`.
///
/// # Errors
///
/// Returns [`KernelError::LengthMismatch`] if the buffers differ in length.
pub fn zip_kernel<T, F>(dst: &mut [T], rhs: &[T], op: F) -> Result<(), KernelError>
where
    T: Copy,
    F: Fn(T, T) -> T,
{
    if dst.len() != rhs.len() {
        return Err(KernelError::LengthMismatch(dst.len(), rhs.len()));
    }
    dst.iter_mut()
        .zip(rhs.iter())
        .for_each(|(x, &v)| *x = op(*x, v));
    Ok(())
}

/// Folds every element of `src` into a single value.
pub fn fold_flat_kernel<T, F>(src: &[T], init: T, f: F) -> T
where
    T: Copy,
    F: Fn(T, T) -> T,
{
    src.iter().fold(init, |acc, &x| f(acc, x))
}

/// Folds a row-major matrix across its rows, producing one value per column.
///
/// Example:
/// ```
/// use gridwise_kernels::ops::fold_rows_kernel;
///
/// let src = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
/// assert_eq!(fold_rows_kernel(&src, 3, 0.0, |a, b| a + b), vec![5.0, 7.0, 9.0]);
/// ```
pub fn fold_rows_kernel<T, F>(src: &[T], cols: usize, init: T, f: F) -> Vec<T>
where
    T: Copy,
    F: Fn(T, T) -> T,
{
    let mut out = vec![init; cols];
    for row in src.chunks_exact(cols) {
        out.iter_mut()
            .zip(row.iter())
            .for_each(|(acc, &x)| *acc = f(*acc, x));
    }
    out
}

/// Folds a row-major matrix across its columns, producing one value per row.
///
/// Example:
/// ```
/// use gridwise_kernels::ops::fold_cols_kernel;
///
/// let src = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
/// assert_eq!(fold_cols_kernel(&src, 3, 0.0, |a, b| a + b), vec![6.0, 15.0]);
/// ```
pub fn fold_cols_kernel<T, F>(src: &[T], cols: usize, init: T, f: F) -> Vec<T>
where
    T: Copy,
    F: Fn(T, T) -> T,
{
    src.chunks_exact(cols)
        .map(|row| row.iter().fold(init, |acc, &x| f(acc, x)))
        .collect()
}

/// Returns the index of the first element that no later element beats.
///
/// `better(a, b)` must return true when `a` should replace the current best `b`.
/// Ties keep the earliest index. Returns `None` for an empty slice.
pub fn arg_extremum_kernel<T, F>(src: &[T], better: F) -> Option<usize>
where
    T: Copy,
    F: Fn(T, T) -> bool,
{
    let mut iter = src.iter().copied().enumerate();
    let (mut best_idx, mut best) = iter.next()?;
    for (i, v) in iter {
        if better(v, best) {
            best_idx = i;
            best = v;
        }
    }
    Some(best_idx)
}

/// For every column, the last row index whose value beats the value in the row above it.
///
/// This compares adjacent pairs only; it is not an arg-extremum over the column.
/// Columns where no adjacent improvement happens report `0`.
pub fn arg_step_rows_kernel<T, F>(src: &[T], cols: usize, better: F) -> Vec<usize>
where
    T: Copy,
    F: Fn(T, T) -> bool,
{
    let rows = src.len() / cols;
    let mut out = vec![0; cols];
    for (j, idx) in out.iter_mut().enumerate() {
        for i in 1..rows {
            if better(src[i * cols + j], src[(i - 1) * cols + j]) {
                *idx = i;
            }
        }
    }
    out
}

/// For every row, the last column index whose value beats the value to its left.
///
/// Same adjacent-pair semantics as [`arg_step_rows_kernel`].
pub fn arg_step_cols_kernel<T, F>(src: &[T], cols: usize, better: F) -> Vec<usize>
where
    T: Copy,
    F: Fn(T, T) -> bool,
{
    src.chunks_exact(cols)
        .map(|row| {
            row.windows(2)
                .enumerate()
                .filter(|(_, w)| better(w[1], w[0]))
                .map(|(j, _)| j + 1)
                .last()
                .unwrap_or(0)
        })
        .collect()
}

/// Multiplies a `m x k` matrix by a `k x n` matrix into `dst` (`m x n`).
///
/// # Errors
///
/// Returns [`KernelError::LengthMismatch`] if any buffer does not match its dimensions.
///
/// Example:
/// ```
/// use gridwise_kernels::ops::matmul_kernel;
///
/// let a = [1.0, 2.0, 3.0, 4.0];
/// let b = [5.0, 6.0, 7.0, 8.0];
/// let mut dst = [0.0; 4];
/// matmul_kernel(&a, &b, &mut dst, 2, 2, 2).unwrap();
/// assert_eq!(dst, [19.0, 22.0, 43.0, 50.0]);
/// ```
pub fn matmul_kernel<T: Float>(
    a: &[T],
    b: &[T],
    dst: &mut [T],
    m: usize,
    k: usize,
    n: usize,
) -> Result<(), KernelError> {
    if a.len() != m * k {
        return Err(KernelError::LengthMismatch(m * k, a.len()));
    }
    if b.len() != k * n {
        return Err(KernelError::LengthMismatch(k * n, b.len()));
    }
    if dst.len() != m * n {
        return Err(KernelError::LengthMismatch(m * n, dst.len()));
    }

    for i in 0..m {
        let a_row = &a[i * k..(i + 1) * k];
        for j in 0..n {
            dst[i * n + j] = a_row
                .iter()
                .enumerate()
                .fold(T::zero(), |acc, (p, &x)| acc + x * b[p * n + j]);
        }
    }
    Ok(())
}

/// In-place Householder QR of a `rows x cols` matrix.
///
/// `r` holds the matrix on entry and the upper triangular factor on exit. Every
/// reflection is also applied from the right to `q`, a `rows x rows` matrix, so
/// passing the identity yields the orthogonal factor.
///
/// Columns whose Householder vector norm is below `eps` are treated as already
/// eliminated and left untouched.
///
/// # Returns
///
/// The indices of the skipped columns.
///
/// # Errors
///
/// Returns [`KernelError::LengthMismatch`] if `r` or `q` do not match the dimensions.
pub fn householder_qr_kernel<T: Float>(
    r: &mut [T],
    q: &mut [T],
    rows: usize,
    cols: usize,
    eps: T,
) -> Result<Vec<usize>, KernelError> {
    if r.len() != rows * cols {
        return Err(KernelError::LengthMismatch(rows * cols, r.len()));
    }
    if q.len() != rows * rows {
        return Err(KernelError::LengthMismatch(rows * rows, q.len()));
    }

    let two = T::one() + T::one();
    let mut skipped = Vec::new();
    let mut v: Vec<T> = Vec::with_capacity(rows);

    for k in 0..cols.min(rows) {
        v.clear();
        v.extend((k..rows).map(|i| r[i * cols + k]));

        let mut norm_x = v.iter().fold(T::zero(), |acc, &x| acc + x * x).sqrt();
        if v[0] > T::zero() {
            norm_x = -norm_x;
        }
        v[0] = v[0] - norm_x;

        let norm_v = v.iter().fold(T::zero(), |acc, &x| acc + x * x).sqrt();
        if norm_v < eps {
            skipped.push(k);
            continue;
        }
        v.iter_mut().for_each(|x| *x = *x / norm_v);

        // R <- H R, only rows >= k are touched
        for j in k..cols {
            let dot = v
                .iter()
                .enumerate()
                .fold(T::zero(), |acc, (i, &x)| acc + x * r[(k + i) * cols + j]);
            for (i, &x) in v.iter().enumerate() {
                let idx = (k + i) * cols + j;
                r[idx] = r[idx] - two * x * dot;
            }
        }

        // Q <- Q H, only columns >= k are touched
        for q_row in q.chunks_exact_mut(rows) {
            let tail = &mut q_row[k..];
            let dot = v
                .iter()
                .zip(tail.iter())
                .fold(T::zero(), |acc, (&x, &y)| acc + x * y);
            tail.iter_mut()
                .zip(v.iter())
                .for_each(|(y, &x)| *y = *y - two * x * dot);
        }
    }

    Ok(skipped)
}
