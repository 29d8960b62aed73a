use std::ptr;
use std::slice;

use gridwise_kalman::{KalmanConfig, KalmanFilter};
use gridwise_tensor::Real;

use crate::error::{guard, status, FfiError};

/// Negative host values stand for "use the default".
fn or_default(value: Real, default: Real) -> Real {
    if value < 0.0 {
        default
    } else {
        value
    }
}

fn or_none(value: Real) -> Option<Real> {
    (value >= 0.0).then_some(value)
}

/// Creates a filter. A negative `q` or `r` selects the default variance.
///
/// Returns null and reports the error for a NaN or infinite variance.
#[no_mangle]
pub extern "C" fn kalman_create(q: Real, r: Real) -> *mut KalmanFilter {
    let defaults = KalmanConfig::default();
    let config = KalmanConfig {
        q: or_default(q, defaults.q),
        r: or_default(r, defaults.r),
    };
    match guard(|| Ok(KalmanFilter::from_config(config)?)) {
        Some(filter) => Box::into_raw(Box::new(filter)),
        None => ptr::null_mut(),
    }
}

/// Releases a filter handle.
///
/// # Safety
///
/// `handle` must be null or a live filter handle, and is dangling afterwards.
#[no_mangle]
pub unsafe extern "C" fn kalman_delete(handle: *mut KalmanFilter) {
    if handle.is_null() {
        return;
    }
    drop(Box::from_raw(handle));
}

/// Makes the next update re-initialise the filter.
///
/// # Safety
///
/// `handle` must be null or a live filter handle.
#[no_mangle]
pub unsafe extern "C" fn kalman_reset(handle: *mut KalmanFilter) -> i32 {
    status(|| {
        handle
            .as_mut()
            .ok_or(FfiError::NullHandle("kalman"))?
            .reset();
        Ok(())
    })
}

/// Filters `len` observation values in place.
///
/// A negative `q` or `r` uses the variance the filter was created with.
/// Returns `0` or the error code; on error the observation is untouched.
///
/// # Safety
///
/// `handle` must be null or a live filter handle and `observation` valid for
/// `len` reads and writes.
#[no_mangle]
pub unsafe extern "C" fn kalman_update(
    handle: *mut KalmanFilter,
    observation: *mut Real,
    len: usize,
    q: Real,
    r: Real,
) -> i32 {
    status(|| {
        let filter = handle.as_mut().ok_or(FfiError::NullHandle("kalman"))?;
        let observation: &mut [Real] = if len == 0 {
            &mut []
        } else if observation.is_null() {
            return Err(FfiError::NullBuffer {
                name: "observation",
                len,
            });
        } else {
            slice::from_raw_parts_mut(observation, len)
        };
        filter.update(observation, or_none(q), or_none(r))?;
        Ok(())
    })
}
