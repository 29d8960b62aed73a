#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]
//!
//! Tensors and filters cross the boundary as opaque handles created with
//! `Box::into_raw` and released with the matching `*_delete` export. Element
//! data crosses as raw pointers plus lengths.
//!
//! Exports never unwind into the host. A failing call reports the error to
//! the callback registered with [`gridwise_set_error_callback`], or to the
//! `log` facade when there is none, and then returns null for handle results
//! or the non-zero error code for status results.
//!
//! ```rust
//! use gridwise_ffi::*;
//!
//! let data = [1.0, 2.0, 3.0, 4.0];
//! let mut wire = [0i32; 3];
//! unsafe {
//!     let t = tensor_from_data(data.as_ptr(), 2, 2, false);
//!     let sum = tensor_sum(t, -1, false, wire.as_mut_ptr());
//!     assert_eq!(wire, [1, 1, 1]);
//!     assert_eq!(*tensor_get_data_ptr(sum), 10.0);
//!     tensor_batch_delete([t, sum].as_ptr(), 2);
//! }
//! ```

mod error;
mod kalman;
mod ops;
mod tensor;

pub use error::*;
pub use kalman::*;
pub use ops::*;
pub use tensor::*;

/// Installs `env_logger` as the `log` backend, configured from `RUST_LOG`.
///
/// Returns `false` if a logger was already installed.
#[no_mangle]
pub extern "C" fn gridwise_init_logging() -> bool {
    env_logger::try_init().is_ok()
}
