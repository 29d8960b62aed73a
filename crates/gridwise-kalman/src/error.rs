use gridwise_tensor::Real;
use thiserror::Error;

/// An error type for the Kalman filter.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum KalmanError {
    /// A noise variance is negative or not finite.
    #[error("Invalid {name} noise variance {value}. Expected a finite value >= 0")]
    InvalidNoise {
        /// Which noise term, `"process"` or `"measurement"`.
        name: &'static str,
        /// The rejected value.
        value: Real,
    },

    /// The observation does not have as many channels as the filter state.
    #[error("Observation has {actual} channels but the filter tracks {expected}. Call reset() to change the channel count")]
    ChannelMismatch {
        /// Channels tracked by the filter
        expected: usize,
        /// Channels in the observation
        actual: usize,
    },
}
