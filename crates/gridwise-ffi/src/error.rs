use std::cell::Cell;
use std::ffi::CString;
use std::os::raw::c_char;

use gridwise_kalman::KalmanError;
use gridwise_tensor::TensorError;
use gridwise_tensor_ops::TensorOpsError;
use thiserror::Error;

/// Error code for a broadcast, axis, matmul or stack shape conflict.
pub const GRIDWISE_ERR_SHAPE_MISMATCH: i32 = 1;
/// Error code for a reshape request that cannot be resolved.
pub const GRIDWISE_ERR_SHAPE_INFERENCE: i32 = 2;
/// Error code for an out of range scalar argument such as an axis, norm order or noise.
pub const GRIDWISE_ERR_INVALID_ARGUMENT: i32 = 3;
/// Error code for an observation whose channel count differs from the filter's.
pub const GRIDWISE_ERR_CHANNEL_MISMATCH: i32 = 4;
/// Error code for in-place writes into storage shared with another handle.
pub const GRIDWISE_ERR_SHARED_STORAGE: i32 = 5;
/// Error code for a null handle.
pub const GRIDWISE_ERR_NULL_HANDLE: i32 = 10;
/// Error code for a null data buffer with a non-zero length.
pub const GRIDWISE_ERR_NULL_BUFFER: i32 = 11;

/// Callback receiving every error raised at the boundary.
///
/// `message` is a nul terminated UTF-8 string valid only for the duration of the call.
pub type ErrorCallback = extern "C" fn(code: i32, message: *const c_char);

thread_local! {
    static ERROR_CALLBACK: Cell<Option<ErrorCallback>> = const { Cell::new(None) };
}

/// An error raised while serving a boundary call.
#[derive(Error, Debug)]
pub enum FfiError {
    /// Error from the tensor container.
    #[error(transparent)]
    Tensor(#[from] TensorError),

    /// Error from a tensor operation.
    #[error(transparent)]
    TensorOps(#[from] TensorOpsError),

    /// Error from the Kalman filter.
    #[error(transparent)]
    Kalman(#[from] KalmanError),

    /// A handle argument was null.
    #[error("Null {0} handle")]
    NullHandle(&'static str),

    /// A data pointer was null while its length was not zero.
    #[error("Null {name} buffer of length {len}")]
    NullBuffer {
        /// The argument name.
        name: &'static str,
        /// The length the caller announced.
        len: usize,
    },
}

impl FfiError {
    /// The stable integer code reported to the host.
    pub fn code(&self) -> i32 {
        match self {
            FfiError::Tensor(err) => tensor_code(err),
            FfiError::TensorOps(TensorOpsError::TensorError(err)) => tensor_code(err),
            FfiError::TensorOps(_) => GRIDWISE_ERR_SHAPE_MISMATCH,
            FfiError::Kalman(KalmanError::InvalidNoise { .. }) => GRIDWISE_ERR_INVALID_ARGUMENT,
            FfiError::Kalman(KalmanError::ChannelMismatch { .. }) => GRIDWISE_ERR_CHANNEL_MISMATCH,
            FfiError::NullHandle(_) => GRIDWISE_ERR_NULL_HANDLE,
            FfiError::NullBuffer { .. } => GRIDWISE_ERR_NULL_BUFFER,
        }
    }
}

fn tensor_code(err: &TensorError) -> i32 {
    match err {
        TensorError::ShapeInference(_) => GRIDWISE_ERR_SHAPE_INFERENCE,
        TensorError::InvalidAxis(_) | TensorError::InvalidNormOrd(_) => {
            GRIDWISE_ERR_INVALID_ARGUMENT
        }
        TensorError::SharedStorage { .. } => GRIDWISE_ERR_SHARED_STORAGE,
        _ => GRIDWISE_ERR_SHAPE_MISMATCH,
    }
}

/// Registers the error callback for the calling thread.
///
/// Passing null removes it, after which errors are logged at `error` level.
#[no_mangle]
pub extern "C" fn gridwise_set_error_callback(callback: Option<ErrorCallback>) {
    ERROR_CALLBACK.with(|slot| slot.set(callback));
}

/// Hands `err` to the registered callback, or logs it when there is none.
pub(crate) fn report(err: &FfiError) {
    let code = err.code();
    match ERROR_CALLBACK.with(Cell::get) {
        Some(callback) => {
            let message = CString::new(err.to_string()).unwrap_or_default();
            callback(code, message.as_ptr());
        }
        None => log::error!("gridwise error {code}: {err}"),
    }
}

/// Runs `f`, reporting its error and turning it into `None`.
pub(crate) fn guard<T>(f: impl FnOnce() -> Result<T, FfiError>) -> Option<T> {
    match f() {
        Ok(value) => Some(value),
        Err(err) => {
            report(&err);
            None
        }
    }
}

/// Runs `f` and maps the outcome to `0` or the error code.
pub(crate) fn status(f: impl FnOnce() -> Result<(), FfiError>) -> i32 {
    match f() {
        Ok(()) => 0,
        Err(err) => {
            report(&err);
            err.code()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridwise_tensor::ShapeInferenceError;

    #[test]
    fn codes() {
        assert_eq!(
            FfiError::from(TensorError::ShapeInference(
                ShapeInferenceError::CollapseOnRows
            ))
            .code(),
            GRIDWISE_ERR_SHAPE_INFERENCE
        );
        assert_eq!(
            FfiError::from(TensorOpsError::EmptyStack).code(),
            GRIDWISE_ERR_SHAPE_MISMATCH
        );
        assert_eq!(
            FfiError::from(TensorOpsError::TensorError(TensorError::InvalidAxis(4))).code(),
            GRIDWISE_ERR_INVALID_ARGUMENT
        );
        assert_eq!(
            FfiError::NullBuffer {
                name: "data",
                len: 3
            }
            .code(),
            GRIDWISE_ERR_NULL_BUFFER
        );
    }

    #[test]
    fn status_without_callback() {
        assert_eq!(status(|| Ok(())), 0);
        assert_eq!(
            status(|| Err(FfiError::NullHandle("tensor"))),
            GRIDWISE_ERR_NULL_HANDLE
        );
    }
}
