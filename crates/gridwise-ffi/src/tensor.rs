use std::ptr;
use std::slice;

use gridwise_tensor::{Real, Shape, Tensor};

use crate::error::{guard, status, FfiError};

/// Borrows the tensor behind `handle`.
///
/// # Safety
///
/// `handle` must be null or a live handle returned by this library.
pub(crate) unsafe fn tensor_ref<'a>(handle: *const Tensor) -> Result<&'a Tensor, FfiError> {
    handle.as_ref().ok_or(FfiError::NullHandle("tensor"))
}

/// Borrows `len` host values starting at `data`.
///
/// # Safety
///
/// `data` must be null or valid for `len` reads.
pub(crate) unsafe fn host_slice<'a>(
    name: &'static str,
    data: *const Real,
    len: usize,
) -> Result<&'a [Real], FfiError> {
    if len == 0 {
        return Ok(&[]);
    }
    if data.is_null() {
        return Err(FfiError::NullBuffer { name, len });
    }
    Ok(slice::from_raw_parts(data, len))
}

/// Writes `(rows, cols, is1d)` to `shape_wire` if it is not null.
///
/// # Safety
///
/// `shape_wire` must be null or valid for three writes.
pub(crate) unsafe fn write_shape(shape: Shape, shape_wire: *mut i32) {
    if !shape_wire.is_null() {
        ptr::copy_nonoverlapping(shape.to_wire().as_ptr(), shape_wire, 3);
    }
}

/// Boxes `tensor` into a new handle, publishing its shape on the wire.
///
/// # Safety
///
/// See [`write_shape`].
pub(crate) unsafe fn into_handle(tensor: Tensor, shape_wire: *mut i32) -> *mut Tensor {
    write_shape(tensor.shape(), shape_wire);
    Box::into_raw(Box::new(tensor))
}

/// Reports the error of `f` or boxes its tensor into a handle.
///
/// # Safety
///
/// See [`write_shape`].
pub(crate) unsafe fn tensor_result(
    shape_wire: *mut i32,
    f: impl FnOnce() -> Result<Tensor, FfiError>,
) -> *mut Tensor {
    match guard(f) {
        Some(tensor) => into_handle(tensor, shape_wire),
        None => ptr::null_mut(),
    }
}

/// Creates a zero filled `rows x cols` tensor.
///
/// Returns null and reports the error if a dimension is zero.
#[no_mangle]
pub extern "C" fn tensor_create(rows: usize, cols: usize, is1d: bool) -> *mut Tensor {
    // SAFETY: no shape wire
    unsafe { tensor_result(ptr::null_mut(), || Ok(Tensor::new(rows, cols, is1d)?)) }
}

/// Creates a `rows x cols` tensor holding a copy of `rows * cols` host values.
///
/// # Safety
///
/// `data` must be valid for `rows * cols` reads.
#[no_mangle]
pub unsafe extern "C" fn tensor_from_data(
    data: *const Real,
    rows: usize,
    cols: usize,
    is1d: bool,
) -> *mut Tensor {
    tensor_result(ptr::null_mut(), || {
        let values = host_slice("data", data, rows.saturating_mul(cols))?;
        let tensor = Tensor::from_shape_slice(rows, cols, values)?;
        Ok(tensor.with_is1d(is1d))
    })
}

/// Creates a new handle viewing the same storage as `handle`.
///
/// # Safety
///
/// `handle` must be null or a live tensor handle.
#[no_mangle]
pub unsafe extern "C" fn tensor_clone(handle: *const Tensor) -> *mut Tensor {
    tensor_result(ptr::null_mut(), || Ok(tensor_ref(handle)?.view()))
}

/// Releases a handle. The storage is freed with its last handle.
///
/// # Safety
///
/// `handle` must be null or a live tensor handle, and is dangling afterwards.
#[no_mangle]
pub unsafe extern "C" fn tensor_delete(handle: *mut Tensor) {
    if handle.is_null() {
        return;
    }
    drop(Box::from_raw(handle));
}

/// Releases `count` handles. Null entries are skipped.
///
/// # Safety
///
/// `handles` must be valid for `count` reads and every entry must be null or a
/// distinct live tensor handle.
#[no_mangle]
pub unsafe extern "C" fn tensor_batch_delete(handles: *const *mut Tensor, count: usize) {
    if handles.is_null() {
        return;
    }
    for &handle in slice::from_raw_parts(handles, count) {
        tensor_delete(handle);
    }
}

/// Writes `(rows, cols, is1d)` of `handle` to `shape_wire`.
///
/// Returns `0` or the error code.
///
/// # Safety
///
/// `handle` must be null or a live tensor handle and `shape_wire` must be
/// valid for three writes.
#[no_mangle]
pub unsafe extern "C" fn tensor_get_shape(handle: *const Tensor, shape_wire: *mut i32) -> i32 {
    status(|| {
        let tensor = tensor_ref(handle)?;
        if shape_wire.is_null() {
            return Err(FfiError::NullBuffer {
                name: "shape_wire",
                len: 3,
            });
        }
        write_shape(tensor.shape(), shape_wire);
        Ok(())
    })
}

/// Number of rows, or `0` for a null handle.
///
/// # Safety
///
/// `handle` must be null or a live tensor handle.
#[no_mangle]
pub unsafe extern "C" fn tensor_get_rows(handle: *const Tensor) -> usize {
    guard(|| Ok(tensor_ref(handle)?.rows())).unwrap_or(0)
}

/// Number of columns, or `0` for a null handle.
///
/// # Safety
///
/// `handle` must be null or a live tensor handle.
#[no_mangle]
pub unsafe extern "C" fn tensor_get_cols(handle: *const Tensor) -> usize {
    guard(|| Ok(tensor_ref(handle)?.cols())).unwrap_or(0)
}

/// The row-major element buffer behind `handle`.
///
/// Writes through it are visible from every handle sharing the storage.
///
/// # Safety
///
/// `handle` must be null or a live tensor handle. The pointer is valid until
/// the last handle sharing the storage is deleted.
#[no_mangle]
pub unsafe extern "C" fn tensor_get_data_ptr(handle: *const Tensor) -> *mut Real {
    guard(|| Ok(tensor_ref(handle)?.as_mut_ptr())).unwrap_or(ptr::null_mut())
}

/// Writes `(xmin, ymin, xmax, ymax)` of a point tensor to `bounds`.
///
/// Column 0 is read as x and column 1 as y. Returns `0` or the error code.
///
/// # Safety
///
/// `handle` must be null or a live tensor handle and `bounds` must be valid
/// for four writes.
#[no_mangle]
pub unsafe extern "C" fn tensor_get_bounds(handle: *const Tensor, bounds: *mut Real) -> i32 {
    status(|| {
        let tensor = tensor_ref(handle)?;
        if bounds.is_null() {
            return Err(FfiError::NullBuffer {
                name: "bounds",
                len: 4,
            });
        }
        let values = tensor.bounds()?.to_array();
        ptr::copy_nonoverlapping(values.as_ptr(), bounds, values.len());
        Ok(())
    })
}

/// Identity with the shape of `handle`.
///
/// # Safety
///
/// `handle` must be null or a live tensor handle and `shape_wire` null or
/// valid for three writes.
#[no_mangle]
pub unsafe extern "C" fn tensor_eye(handle: *const Tensor, shape_wire: *mut i32) -> *mut Tensor {
    tensor_result(shape_wire, || Ok(tensor_ref(handle)?.identity_like()))
}

/// View of `handle` with a new shape. `-1` infers a dimension, `-2` as the
/// column count flattens to a 1-D row.
///
/// # Safety
///
/// `handle` must be null or a live tensor handle and `shape_wire` null or
/// valid for three writes.
#[no_mangle]
pub unsafe extern "C" fn tensor_reshape(
    handle: *const Tensor,
    rows: i32,
    cols: i32,
    shape_wire: *mut i32,
) -> *mut Tensor {
    tensor_result(shape_wire, || Ok(tensor_ref(handle)?.reshape(rows, cols)?))
}

/// 1-D view of `handle`.
///
/// # Safety
///
/// `handle` must be null or a live tensor handle and `shape_wire` null or
/// valid for three writes.
#[no_mangle]
pub unsafe extern "C" fn tensor_flatten(
    handle: *const Tensor,
    shape_wire: *mut i32,
) -> *mut Tensor {
    tensor_result(shape_wire, || Ok(tensor_ref(handle)?.flatten()))
}

/// Copy of `handle` with its own storage.
///
/// # Safety
///
/// `handle` must be null or a live tensor handle and `shape_wire` null or
/// valid for three writes.
#[no_mangle]
pub unsafe extern "C" fn tensor_deep_copy(
    handle: *const Tensor,
    shape_wire: *mut i32,
) -> *mut Tensor {
    tensor_result(shape_wire, || Ok(tensor_ref(handle)?.deep_copy()))
}
