use gridwise_tensor::Real;

use crate::KalmanError;

/// Noise configuration of a [`KalmanFilter`].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct KalmanConfig {
    /// Process noise variance. Smaller values average movement more.
    pub q: Real,
    /// Measurement noise variance. Larger values trust the observation less.
    pub r: Real,
}

impl Default for KalmanConfig {
    fn default() -> Self {
        Self { q: 0.1, r: 1.0 }
    }
}

impl KalmanConfig {
    /// Checks that both variances are finite and non-negative.
    pub fn validate(&self) -> Result<(), KalmanError> {
        check_noise("process", self.q)?;
        check_noise("measurement", self.r)?;
        Ok(())
    }
}

fn check_noise(name: &'static str, value: Real) -> Result<Real, KalmanError> {
    if !value.is_finite() || value < 0.0 {
        return Err(KalmanError::InvalidNoise { name, value });
    }
    Ok(value)
}

/// A bank of independent scalar Kalman filters, one per observation channel.
///
/// The first [`KalmanFilter::update`] after construction or [`KalmanFilter::reset`]
/// sizes the state to the observation, copies the observation into it and sets
/// every covariance to `1`. Every update then runs one predict/correct step per
/// channel and writes the filtered values back into the observation.
#[derive(Debug, Clone)]
pub struct KalmanFilter {
    config: KalmanConfig,
    initialized: bool,
    state: Vec<Real>,
    covariance: Vec<Real>,
}

impl KalmanFilter {
    /// Creates a filter with process noise `q` and measurement noise `r`.
    ///
    /// # Errors
    ///
    /// Returns [`KalmanError::InvalidNoise`] if either is negative or not finite.
    pub fn new(q: Real, r: Real) -> Result<Self, KalmanError> {
        Self::from_config(KalmanConfig { q, r })
    }

    /// Creates a filter from a configuration.
    pub fn from_config(config: KalmanConfig) -> Result<Self, KalmanError> {
        config.validate()?;
        Ok(Self {
            config,
            initialized: false,
            state: Vec::new(),
            covariance: Vec::new(),
        })
    }

    /// The default noise configuration of this filter.
    pub fn config(&self) -> KalmanConfig {
        self.config
    }

    /// Whether the filter holds a state from a previous update.
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Current state estimate, one value per channel.
    pub fn state(&self) -> &[Real] {
        &self.state
    }

    /// Current covariance, one value per channel.
    pub fn covariance(&self) -> &[Real] {
        &self.covariance
    }

    /// Makes the next update re-initialise from its observation.
    ///
    /// The buffers are kept and resized on that update.
    pub fn reset(&mut self) {
        self.initialized = false;
    }

    /// Filters `observation` in place.
    ///
    /// `q` and `r` override the configured variances for this call only.
    ///
    /// # Errors
    ///
    /// * [`KalmanError::InvalidNoise`] if an override is negative or not finite.
    /// * [`KalmanError::ChannelMismatch`] if the filter is initialised with a
    ///   different number of channels. Nothing is modified in that case.
    ///
    /// # Example
    ///
    /// ```
    /// use gridwise_kalman::KalmanFilter;
    ///
    /// let mut filter = KalmanFilter::new(0.0, 1.0).unwrap();
    /// let mut obs = [10.0];
    /// filter.update(&mut obs, None, None).unwrap();
    /// assert_eq!(obs, [10.0]);
    ///
    /// let mut obs = [12.0];
    /// filter.update(&mut obs, None, None).unwrap();
    /// assert!((obs[0] - 10.6667).abs() < 1e-3);
    /// ```
    pub fn update(
        &mut self,
        observation: &mut [Real],
        q: Option<Real>,
        r: Option<Real>,
    ) -> Result<(), KalmanError> {
        let q = q.map_or(Ok(self.config.q), |q| check_noise("process", q))?;
        let r = r.map_or(Ok(self.config.r), |r| check_noise("measurement", r))?;

        if !self.initialized {
            log::debug!(
                "kalman: initialising {} channels (q: {q}, r: {r})",
                observation.len()
            );
            self.state.clear();
            self.state.extend_from_slice(observation);
            self.covariance.clear();
            self.covariance.resize(observation.len(), 1.0);
            self.initialized = true;
        } else if observation.len() != self.state.len() {
            return Err(KalmanError::ChannelMismatch {
                expected: self.state.len(),
                actual: observation.len(),
            });
        }

        for ((obs, state), cov) in observation
            .iter_mut()
            .zip(self.state.iter_mut())
            .zip(self.covariance.iter_mut())
        {
            // predict
            let predicted = *cov + q;
            // correct
            let gain = predicted / (predicted + r);
            *state += gain * (*obs - *state);
            *cov = (1.0 - gain) * predicted;
            *obs = *state;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn two_step_example() -> Result<(), KalmanError> {
        let mut filter = KalmanFilter::new(0.0, 1.0)?;

        let mut obs = [10.0];
        filter.update(&mut obs, None, None)?;
        assert_eq!(obs, [10.0]);
        assert_eq!(filter.state(), &[10.0]);
        assert_relative_eq!(filter.covariance()[0], 0.5);

        let mut obs = [12.0];
        filter.update(&mut obs, None, None)?;
        assert_relative_eq!(obs[0], 10.0 + 2.0 / 3.0, epsilon = 1e-5);
        assert_relative_eq!(filter.covariance()[0], 1.0 / 3.0, epsilon = 1e-6);
        Ok(())
    }

    #[test]
    fn channels_are_independent() -> Result<(), KalmanError> {
        let mut filter = KalmanFilter::new(0.0, 1.0)?;
        filter.update(&mut [0.0, 100.0], None, None)?;

        let mut obs = [3.0, 100.0];
        filter.update(&mut obs, None, None)?;
        assert_relative_eq!(obs[0], 1.0, epsilon = 1e-6);
        assert_relative_eq!(obs[1], 100.0);
        Ok(())
    }

    #[test]
    fn overrides_apply_to_one_call() -> Result<(), KalmanError> {
        let mut filter = KalmanFilter::new(0.0, 1.0)?;
        filter.update(&mut [0.0], None, None)?;

        // r = 0 trusts the observation fully
        let mut obs = [5.0];
        filter.update(&mut obs, None, Some(0.0))?;
        assert_relative_eq!(obs[0], 5.0);
        assert_eq!(filter.config(), KalmanConfig { q: 0.0, r: 1.0 });

        assert_eq!(
            filter.update(&mut [1.0], Some(-1.0), None),
            Err(KalmanError::InvalidNoise {
                name: "process",
                value: -1.0
            })
        );
        Ok(())
    }

    #[test]
    fn reset_reinitialises_with_new_size() -> Result<(), KalmanError> {
        let mut filter = KalmanFilter::from_config(KalmanConfig::default())?;
        filter.update(&mut [1.0, 2.0], None, None)?;
        filter.update(&mut [3.0, 4.0], None, None)?;

        assert_eq!(
            filter.update(&mut [1.0, 2.0, 3.0], None, None),
            Err(KalmanError::ChannelMismatch {
                expected: 2,
                actual: 3
            })
        );

        filter.reset();
        assert!(!filter.is_initialized());

        let mut obs = [7.0, 8.0, 9.0];
        filter.update(&mut obs, None, None)?;
        assert!(filter.is_initialized());
        assert_eq!(obs, [7.0, 8.0, 9.0]);
        assert_eq!(filter.state(), &[7.0, 8.0, 9.0]);
        Ok(())
    }

    #[test]
    fn default_config_is_valid() -> Result<(), KalmanError> {
        KalmanConfig::default().validate()?;
        KalmanConfig { q: 0.0, r: 0.0 }.validate()?;
        Ok(())
    }

    #[test]
    fn rejects_bad_noise() {
        assert!(KalmanFilter::new(-0.1, 1.0).is_err());
        assert!(KalmanFilter::new(0.1, Real::NAN).is_err());
        assert_eq!(
            KalmanConfig { q: 0.1, r: -2.0 }.validate(),
            Err(KalmanError::InvalidNoise {
                name: "measurement",
                value: -2.0
            })
        );
    }

    #[cfg(feature = "serde")]
    #[test]
    fn config_serde() -> Result<(), Box<dyn std::error::Error>> {
        let config = KalmanConfig { q: 0.5, r: 2.0 };
        let back: KalmanConfig = serde_json::from_str(&serde_json::to_string(&config)?)?;
        assert_eq!(config, back);
        Ok(())
    }
}
