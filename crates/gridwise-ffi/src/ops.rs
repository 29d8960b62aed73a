//! Every export takes tensor handles plus plain scalars and returns a new
//! handle, or null after reporting the error. A non-null `shape_wire` receives
//! the `(rows, cols, is1d)` of the result.

use std::slice;

use gridwise_tensor::{Axis, Real, Tensor, TensorError};
use gridwise_tensor_ops::{arithmetic, basic_math, linalg, reduce, transform, NormOrd};

use crate::error::FfiError;
use crate::tensor::{host_slice, tensor_ref, tensor_result};

macro_rules! binary_exports {
    ($($(#[$doc:meta])* $op:path => $with_slice:ident, $with_scalar:ident, $with_tensor:ident;)*) => {
        $(
            $(#[$doc])*
            ///
            /// The right hand side is `len` host values broadcast as a scalar,
            /// a row or a full matrix.
            ///
            /// # Safety
            ///
            /// Handles must be null or live, `data` valid for `len` reads and
            /// `shape_wire` null or valid for three writes.
            #[no_mangle]
            pub unsafe extern "C" fn $with_slice(
                handle: *const Tensor,
                data: *const Real,
                len: usize,
                shape_wire: *mut i32,
            ) -> *mut Tensor {
                tensor_result(shape_wire, || {
                    let rhs = host_slice("rhs", data, len)?;
                    Ok($op(tensor_ref(handle)?, rhs)?)
                })
            }

            $(#[$doc])*
            ///
            /// # Safety
            ///
            /// `handle` must be null or live and `shape_wire` null or valid for
            /// three writes.
            #[no_mangle]
            pub unsafe extern "C" fn $with_scalar(
                handle: *const Tensor,
                value: Real,
                shape_wire: *mut i32,
            ) -> *mut Tensor {
                tensor_result(shape_wire, || Ok($op(tensor_ref(handle)?, value)?))
            }

            $(#[$doc])*
            ///
            /// Both tensors must have the same shape.
            ///
            /// # Safety
            ///
            /// Handles must be null or live and `shape_wire` null or valid for
            /// three writes.
            #[no_mangle]
            pub unsafe extern "C" fn $with_tensor(
                handle: *const Tensor,
                other: *const Tensor,
                shape_wire: *mut i32,
            ) -> *mut Tensor {
                tensor_result(shape_wire, || {
                    Ok($op(tensor_ref(handle)?, tensor_ref(other)?)?)
                })
            }
        )*
    };
}

binary_exports! {
    /// Elementwise addition.
    arithmetic::add => tensor_add, tensor_add_scalar, tensor_add_tensor;
    /// Elementwise subtraction.
    arithmetic::sub => tensor_sub, tensor_sub_scalar, tensor_sub_tensor;
    /// Elementwise multiplication.
    arithmetic::mul => tensor_mul, tensor_mul_scalar, tensor_mul_tensor;
    /// Elementwise maximum.
    arithmetic::maximum => tensor_maximum, tensor_maximum_scalar, tensor_maximum_tensor;
    /// Elementwise minimum.
    arithmetic::minimum => tensor_minimum, tensor_minimum_scalar, tensor_minimum_tensor;
    /// Elementwise floating point remainder.
    arithmetic::modulo => tensor_mod, tensor_mod_scalar, tensor_mod_tensor;
    /// Elementwise power.
    arithmetic::pow => tensor_pow, tensor_pow_scalar, tensor_pow_tensor;
    /// Elementwise `(a - b)^2`.
    arithmetic::squared_diff => tensor_squared_diff, tensor_squared_diff_scalar, tensor_squared_diff_tensor;
    /// Elementwise two argument arc tangent.
    arithmetic::atan2 => tensor_atan2, tensor_atan2_scalar, tensor_atan2_tensor;
}

/// Elementwise division by `len` broadcast host values.
///
/// With `no_nan` set, infinite and NaN quotients become `0`.
///
/// # Safety
///
/// `handle` must be null or live, `data` valid for `len` reads and
/// `shape_wire` null or valid for three writes.
#[no_mangle]
pub unsafe extern "C" fn tensor_div(
    handle: *const Tensor,
    data: *const Real,
    len: usize,
    no_nan: bool,
    shape_wire: *mut i32,
) -> *mut Tensor {
    tensor_result(shape_wire, || {
        let rhs = host_slice("rhs", data, len)?;
        Ok(arithmetic::div(tensor_ref(handle)?, rhs, no_nan)?)
    })
}

/// Elementwise division by a scalar.
///
/// # Safety
///
/// `handle` must be null or live and `shape_wire` null or valid for three writes.
#[no_mangle]
pub unsafe extern "C" fn tensor_div_scalar(
    handle: *const Tensor,
    value: Real,
    no_nan: bool,
    shape_wire: *mut i32,
) -> *mut Tensor {
    tensor_result(shape_wire, || {
        Ok(arithmetic::div(tensor_ref(handle)?, value, no_nan)?)
    })
}

/// Elementwise division by a tensor of the same shape.
///
/// # Safety
///
/// Handles must be null or live and `shape_wire` null or valid for three writes.
#[no_mangle]
pub unsafe extern "C" fn tensor_div_tensor(
    handle: *const Tensor,
    other: *const Tensor,
    no_nan: bool,
    shape_wire: *mut i32,
) -> *mut Tensor {
    tensor_result(shape_wire, || {
        Ok(arithmetic::div(tensor_ref(handle)?, tensor_ref(other)?, no_nan)?)
    })
}

macro_rules! unary_exports {
    ($($op:path => $name:ident;)*) => {
        $(
            #[doc = concat!("Applies `", stringify!($op), "` to every element.")]
            ///
            /// # Safety
            ///
            /// `handle` must be null or live and `shape_wire` null or valid for
            /// three writes.
            #[no_mangle]
            pub unsafe extern "C" fn $name(
                handle: *const Tensor,
                shape_wire: *mut i32,
            ) -> *mut Tensor {
                tensor_result(shape_wire, || Ok($op(tensor_ref(handle)?)))
            }
        )*
    };
}

unary_exports! {
    basic_math::abs => tensor_abs;
    basic_math::acos => tensor_acos;
    basic_math::acosh => tensor_acosh;
    basic_math::asin => tensor_asin;
    basic_math::asinh => tensor_asinh;
    basic_math::atan => tensor_atan;
    basic_math::atanh => tensor_atanh;
    basic_math::ceil => tensor_ceil;
    basic_math::floor => tensor_floor;
    basic_math::cos => tensor_cos;
    basic_math::cosh => tensor_cosh;
    basic_math::square => tensor_square;
}

/// Saturates every element to `[lower, upper]`.
///
/// # Safety
///
/// `handle` must be null or live and `shape_wire` null or valid for three writes.
#[no_mangle]
pub unsafe extern "C" fn tensor_clip(
    handle: *const Tensor,
    lower: Real,
    upper: Real,
    shape_wire: *mut i32,
) -> *mut Tensor {
    tensor_result(shape_wire, || {
        Ok(basic_math::clip(tensor_ref(handle)?, lower, upper))
    })
}

/// Pads with `constant` on each side.
///
/// # Safety
///
/// `handle` must be null or live and `shape_wire` null or valid for three writes.
#[no_mangle]
pub unsafe extern "C" fn tensor_pad(
    handle: *const Tensor,
    constant: Real,
    rpad_before: usize,
    rpad_after: usize,
    cpad_before: usize,
    cpad_after: usize,
    shape_wire: *mut i32,
) -> *mut Tensor {
    tensor_result(shape_wire, || {
        Ok(transform::pad(
            tensor_ref(handle)?,
            constant,
            rpad_before,
            rpad_after,
            cpad_before,
            cpad_after,
        )?)
    })
}

/// Spreads the elements along a diagonal.
///
/// # Safety
///
/// `handle` must be null or live and `shape_wire` null or valid for three writes.
#[no_mangle]
pub unsafe extern "C" fn tensor_diag(handle: *const Tensor, shape_wire: *mut i32) -> *mut Tensor {
    tensor_result(shape_wire, || Ok(transform::diag(tensor_ref(handle)?)?))
}

/// Concatenates `count` tensors of one shape along the rows.
///
/// # Safety
///
/// `handles` must be valid for `count` reads of null or live handles and
/// `shape_wire` null or valid for three writes.
#[no_mangle]
pub unsafe extern "C" fn tensor_stack(
    handles: *const *const Tensor,
    count: usize,
    shape_wire: *mut i32,
) -> *mut Tensor {
    tensor_result(shape_wire, || {
        let tensors = if count == 0 {
            Vec::new()
        } else if handles.is_null() {
            return Err(FfiError::NullBuffer {
                name: "handles",
                len: count,
            });
        } else {
            slice::from_raw_parts(handles, count)
                .iter()
                .map(|&handle| tensor_ref(handle))
                .collect::<Result<Vec<_>, _>>()?
        };
        Ok(transform::stack(tensors)?)
    })
}

/// Reverses along `axis` (`-1` flat, `0` rows, `1` columns).
///
/// # Safety
///
/// `handle` must be null or live and `shape_wire` null or valid for three writes.
#[no_mangle]
pub unsafe extern "C" fn tensor_reverse(
    handle: *const Tensor,
    axis: i32,
    shape_wire: *mut i32,
) -> *mut Tensor {
    tensor_result(shape_wire, || {
        Ok(transform::reverse(tensor_ref(handle)?, Axis::try_from(axis)?)?)
    })
}

macro_rules! reduce_exports {
    ($($op:path => $name:ident;)*) => {
        $(
            #[doc = concat!("Reduces with `", stringify!($op), "` along `axis` (`-1` flat, `0` rows, `1` columns).")]
            ///
            /// # Safety
            ///
            /// `handle` must be null or live and `shape_wire` null or valid for
            /// three writes.
            #[no_mangle]
            pub unsafe extern "C" fn $name(
                handle: *const Tensor,
                axis: i32,
                keepdims: bool,
                shape_wire: *mut i32,
            ) -> *mut Tensor {
                tensor_result(shape_wire, || {
                    Ok($op(tensor_ref(handle)?, Axis::try_from(axis)?, keepdims)?)
                })
            }
        )*
    };
}

reduce_exports! {
    reduce::sum => tensor_sum;
    reduce::prod => tensor_prod;
    reduce::mean => tensor_mean;
    reduce::min => tensor_min;
    reduce::max => tensor_max;
    reduce::all => tensor_all;
    reduce::any => tensor_any;
}

/// Index of the largest element along `axis`, as a real.
///
/// A 1-D tensor or axis `-1` gives the flat index of the first maximum. Axis
/// `0`/`1` on a 2-D tensor gives, per column/row, the last index whose value is
/// greater than its immediate predecessor, or `0` when there is none.
///
/// # Safety
///
/// `handle` must be null or live and `shape_wire` null or valid for three writes.
#[no_mangle]
pub unsafe extern "C" fn tensor_arg_max(
    handle: *const Tensor,
    axis: i32,
    shape_wire: *mut i32,
) -> *mut Tensor {
    tensor_result(shape_wire, || {
        Ok(reduce::arg_max(tensor_ref(handle)?, Axis::try_from(axis)?)?)
    })
}

/// Index of the smallest element along `axis`, as a real.
///
/// A 1-D tensor or axis `-1` gives the flat index of the first minimum. Axis
/// `0`/`1` on a 2-D tensor gives, per column/row, the last index whose value is
/// less than its immediate predecessor, or `0` when there is none.
///
/// # Safety
///
/// `handle` must be null or live and `shape_wire` null or valid for three writes.
#[no_mangle]
pub unsafe extern "C" fn tensor_arg_min(
    handle: *const Tensor,
    axis: i32,
    shape_wire: *mut i32,
) -> *mut Tensor {
    tensor_result(shape_wire, || {
        Ok(reduce::arg_min(tensor_ref(handle)?, Axis::try_from(axis)?)?)
    })
}

/// Swaps rows and columns.
///
/// # Safety
///
/// `handle` must be null or live and `shape_wire` null or valid for three writes.
#[no_mangle]
pub unsafe extern "C" fn tensor_transpose(
    handle: *const Tensor,
    shape_wire: *mut i32,
) -> *mut Tensor {
    tensor_result(shape_wire, || Ok(linalg::transpose(tensor_ref(handle)?)?))
}

/// Matrix product `lhs x rhs`.
///
/// # Safety
///
/// Handles must be null or live and `shape_wire` null or valid for three writes.
#[no_mangle]
pub unsafe extern "C" fn tensor_matmul(
    lhs: *const Tensor,
    rhs: *const Tensor,
    shape_wire: *mut i32,
) -> *mut Tensor {
    tensor_result(shape_wire, || {
        Ok(linalg::matmul(tensor_ref(lhs)?, tensor_ref(rhs)?)?)
    })
}

/// Vector norm of order `ord` (`0` L2, `1` L1, `2` max) along `axis`.
///
/// # Safety
///
/// `handle` must be null or live and `shape_wire` null or valid for three writes.
#[no_mangle]
pub unsafe extern "C" fn tensor_norm(
    handle: *const Tensor,
    ord: i32,
    axis: i32,
    keepdims: bool,
    shape_wire: *mut i32,
) -> *mut Tensor {
    tensor_result(shape_wire, || {
        Ok(linalg::norm(
            tensor_ref(handle)?,
            NormOrd::try_from(ord)?,
            Axis::try_from(axis)?,
            keepdims,
        )?)
    })
}

/// Householder QR. Returns `R` and accumulates the reflections into `q`.
///
/// `q` must be a `rows x rows` tensor, normally the identity, that does not
/// share storage with `handle`. Other views of `q` observe the reflections.
///
/// # Safety
///
/// Handles must be null or live and `shape_wire` null or valid for three writes.
#[no_mangle]
pub unsafe extern "C" fn tensor_qr(
    handle: *const Tensor,
    q: *mut Tensor,
    shape_wire: *mut i32,
) -> *mut Tensor {
    tensor_result(shape_wire, || {
        let tensor = tensor_ref(handle)?;
        let q = q.as_ref().ok_or(FfiError::NullHandle("q"))?;
        // `q` would be written while it is read
        if tensor.shares_storage_with(q) {
            return Err(TensorError::SharedStorage {
                holders: q.storage().holders(),
            }
            .into());
        }
        // the storage is disjoint from `tensor`; views of `q` see the writes
        let q = slice::from_raw_parts_mut(q.as_mut_ptr(), q.numel());
        Ok(linalg::qr(tensor, q)?)
    })
}
