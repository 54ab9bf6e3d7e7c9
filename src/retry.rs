use crate::ConfigError;
use backon::ExponentialBuilder;
use std::time::Duration;

/// How failed sends are retried. Exporters don't retry unless a policy is set.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    max_attempts: u32,
    initial_backoff: Duration,
    max_backoff: Duration,
    backoff_multiplier: f32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(5),
            backoff_multiplier: 1.5,
        }
    }
}

impl RetryPolicy {
    pub fn builder() -> RetryPolicyBuilder {
        RetryPolicyBuilder {
            policy: Self::default(),
        }
    }

    /// Total number of attempts, including the first one.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn initial_backoff(&self) -> Duration {
        self.initial_backoff
    }

    pub fn max_backoff(&self) -> Duration {
        self.max_backoff
    }

    pub fn backoff_multiplier(&self) -> f32 {
        self.backoff_multiplier
    }

    /// Backoff schedule for `backon`, jittered.
    pub(crate) fn backoff(&self) -> ExponentialBuilder {
        ExponentialBuilder::default()
            .with_min_delay(self.initial_backoff)
            .with_max_delay(self.max_backoff)
            .with_factor(self.backoff_multiplier)
            .with_max_times(self.max_attempts.saturating_sub(1) as usize)
            .with_jitter()
    }
}

/// Builder for a [`RetryPolicy`].
#[derive(Debug, Clone)]
pub struct RetryPolicyBuilder {
    policy: RetryPolicy,
}

impl RetryPolicyBuilder {
    /// Must be greater than 1 and less than 6.
    pub fn max_attempts(mut self, max_attempts: u32) -> Self {
        self.policy.max_attempts = max_attempts;
        self
    }

    pub fn initial_backoff(mut self, backoff: Duration) -> Self {
        self.policy.initial_backoff = backoff;
        self
    }

    pub fn max_backoff(mut self, backoff: Duration) -> Self {
        self.policy.max_backoff = backoff;
        self
    }

    pub fn backoff_multiplier(mut self, multiplier: f32) -> Self {
        self.policy.backoff_multiplier = multiplier;
        self
    }

    pub fn build(self) -> Result<RetryPolicy, ConfigError> {
        let policy = self.policy;
        if !(2..6).contains(&policy.max_attempts) {
            return Err(ConfigError::InvalidRetryPolicy("max attempts must be > 1 and < 6"));
        }
        if policy.initial_backoff.is_zero() {
            return Err(ConfigError::InvalidRetryPolicy("initial backoff must be greater than 0"));
        }
        if policy.max_backoff.is_zero() {
            return Err(ConfigError::InvalidRetryPolicy("max backoff must be greater than 0"));
        }
        if !(policy.backoff_multiplier > 0.0) {
            return Err(ConfigError::InvalidRetryPolicy("backoff multiplier must be greater than 0"));
        }
        Ok(policy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts(), 5);
        assert_eq!(policy.initial_backoff(), Duration::from_secs(1));
        assert_eq!(policy.max_backoff(), Duration::from_secs(5));
        assert_eq!(policy.backoff_multiplier(), 1.5);
        assert_eq!(RetryPolicy::builder().build().unwrap(), policy);
    }

    #[test]
    fn rejects_out_of_range_attempts() {
        for attempts in [0, 1, 6, 10] {
            assert!(matches!(
                RetryPolicy::builder().max_attempts(attempts).build(),
                Err(ConfigError::InvalidRetryPolicy(_))
            ));
        }
        assert!(RetryPolicy::builder().max_attempts(2).build().is_ok());
    }

    #[test]
    fn rejects_zero_backoff_and_bad_multiplier() {
        assert!(RetryPolicy::builder().initial_backoff(Duration::ZERO).build().is_err());
        assert!(RetryPolicy::builder().max_backoff(Duration::ZERO).build().is_err());
        assert!(RetryPolicy::builder().backoff_multiplier(0.0).build().is_err());
        assert!(RetryPolicy::builder().backoff_multiplier(f32::NAN).build().is_err());
    }
}
