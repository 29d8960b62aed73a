#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]
//!
//! Each coordinate of the observation vector is smoothed by its own scalar
//! filter; there is no coupling between channels.
//!
//! ```rust
//! use gridwise_kalman::{KalmanConfig, KalmanFilter};
//!
//! let mut filter = KalmanFilter::from_config(KalmanConfig::default()).unwrap();
//! let mut landmarks = [120.0, 64.0, 122.0, 70.0];
//! filter.update(&mut landmarks, None, None).unwrap();
//! // the first frame initialises the state, so it passes through unchanged
//! assert_eq!(landmarks, [120.0, 64.0, 122.0, 70.0]);
//! ```

mod error;
mod filter;

pub use error::KalmanError;
pub use filter::{KalmanConfig, KalmanFilter};
