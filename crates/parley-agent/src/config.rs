//! # Environment-Based Configuration
//!
//! Resilience settings for calls to peer agents, loadable from environment
//! variables.
//!
//! ## Environment Variables
//!
//! Durations use `humantime` syntax (`250ms`, `5s`, `1m 30s`).
//!
//! - `PARLEY_REQUEST_TIMEOUT` - Ceiling for a single network call (default: 30s)
//! - `PARLEY_RETRY_MAX_ATTEMPTS` - Total tries per logical call (default: 3)
//! - `PARLEY_RETRY_BASE_DELAY` - First backoff delay (default: 200ms)
//! - `PARLEY_RETRY_MAX_DELAY` - Backoff cap (default: 5s)
//! - `PARLEY_BREAKER_FAILURE_THRESHOLD` - Consecutive failures that open the circuit (default: 5)
//! - `PARLEY_BREAKER_SUCCESS_THRESHOLD` - Probe successes that close it again (default: 2)
//! - `PARLEY_BREAKER_RECOVERY_TIMEOUT` - Time spent open before probing (default: 30s)

use std::env;
use std::time::Duration;

use crate::circuit_breaker::CircuitBreakerConfig;
use crate::retry::RetryConfig;

/// Error type for configuration loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid environment variable '{key}': {message}")]
    InvalidEnvVar { key: String, message: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

/// Resilience settings applied to every call a client makes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResilienceConfig {
    /// Retry schedule
    pub retry: RetryConfig,
    /// Breaker thresholds
    pub breaker: CircuitBreakerConfig,
    /// Ceiling for a single network call
    pub request_timeout: Duration,
}

impl Default for ResilienceConfig {
    fn default() -> Self {
        Self {
            retry: RetryConfig::default(),
            breaker: CircuitBreakerConfig::default(),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// Builder for `ResilienceConfig` with environment variable support
#[derive(Debug, Clone, Default)]
pub struct ResilienceConfigBuilder {
    config: ResilienceConfig,
}

impl ResilienceConfigBuilder {
    /// Create a new builder with default values
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if a variable is set but cannot
    /// be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut builder = Self::default();

        if let Some(timeout) = parse_duration(&lookup, "PARLEY_REQUEST_TIMEOUT")? {
            builder = builder.request_timeout(timeout);
        }

        // Retry
        if let Some(attempts) = parse_u32(&lookup, "PARLEY_RETRY_MAX_ATTEMPTS")? {
            builder = builder.max_attempts(attempts);
        }
        if let Some(delay) = parse_duration(&lookup, "PARLEY_RETRY_BASE_DELAY")? {
            builder = builder.base_delay(delay);
        }
        if let Some(delay) = parse_duration(&lookup, "PARLEY_RETRY_MAX_DELAY")? {
            builder = builder.max_delay(delay);
        }

        // Circuit breaker
        if let Some(threshold) = parse_u32(&lookup, "PARLEY_BREAKER_FAILURE_THRESHOLD")? {
            builder = builder.failure_threshold(threshold);
        }
        if let Some(threshold) = parse_u32(&lookup, "PARLEY_BREAKER_SUCCESS_THRESHOLD")? {
            builder = builder.success_threshold(threshold);
        }
        if let Some(timeout) = parse_duration(&lookup, "PARLEY_BREAKER_RECOVERY_TIMEOUT")? {
            builder = builder.recovery_timeout(timeout);
        }

        Ok(builder)
    }

    /// Set the per-call timeout
    #[must_use]
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    /// Set the total number of tries per logical call
    #[must_use]
    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.config.retry.max_attempts = attempts;
        self
    }

    /// Set the first backoff delay
    #[must_use]
    pub fn base_delay(mut self, delay: Duration) -> Self {
        self.config.retry.base_delay = delay;
        self
    }

    /// Set the backoff cap
    #[must_use]
    pub fn max_delay(mut self, delay: Duration) -> Self {
        self.config.retry.max_delay = delay;
        self
    }

    /// Set the consecutive failures that open the circuit
    #[must_use]
    pub fn failure_threshold(mut self, threshold: u32) -> Self {
        self.config.breaker.failure_threshold = threshold;
        self
    }

    /// Set the probe successes that close the circuit
    #[must_use]
    pub fn success_threshold(mut self, threshold: u32) -> Self {
        self.config.breaker.success_threshold = threshold;
        self
    }

    /// Set how long the circuit stays open before probing
    #[must_use]
    pub fn recovery_timeout(mut self, timeout: Duration) -> Self {
        self.config.breaker.recovery_timeout = timeout;
        self
    }

    /// Validate configuration and build `ResilienceConfig`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` if the configuration is invalid.
    pub fn build(self) -> Result<ResilienceConfig, ConfigError> {
        self.validate()?;
        Ok(self.config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let config = &self.config;

        if config.request_timeout.is_zero() {
            return Err(ConfigError::ValidationError(
                "request_timeout must be greater than 0".to_string(),
            ));
        }

        // Retry validation
        if config.retry.max_attempts == 0 {
            return Err(ConfigError::ValidationError(
                "retry.max_attempts must be greater than 0".to_string(),
            ));
        }
        if config.retry.base_delay.is_zero() {
            return Err(ConfigError::ValidationError(
                "retry.base_delay must be greater than 0".to_string(),
            ));
        }
        if config.retry.base_delay > config.retry.max_delay {
            return Err(ConfigError::ValidationError(
                "retry.base_delay must be <= retry.max_delay".to_string(),
            ));
        }

        // Circuit breaker validation
        if config.breaker.failure_threshold == 0 {
            return Err(ConfigError::ValidationError(
                "breaker.failure_threshold must be greater than 0".to_string(),
            ));
        }
        if config.breaker.success_threshold == 0 {
            return Err(ConfigError::ValidationError(
                "breaker.success_threshold must be greater than 0".to_string(),
            ));
        }
        if config.breaker.recovery_timeout.is_zero() {
            return Err(ConfigError::ValidationError(
                "breaker.recovery_timeout must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

// Environment variable helper functions

fn parse_u32(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<u32>, ConfigError> {
    match lookup(key) {
        Some(val) => val
            .trim()
            .parse::<u32>()
            .map(Some)
            .map_err(|e| ConfigError::InvalidEnvVar {
                key: key.to_string(),
                message: format!("invalid u32 value '{val}': {e}"),
            }),
        None => Ok(None),
    }
}

fn parse_duration(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<Duration>, ConfigError> {
    match lookup(key) {
        Some(val) => humantime::parse_duration(val.trim())
            .map(Some)
            .map_err(|e| ConfigError::InvalidEnvVar {
                key: key.to_string(),
                message: format!("invalid duration '{val}': {e}"),
            }),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_default_builder() {
        let config = ResilienceConfigBuilder::new().build().unwrap();
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.retry.base_delay, Duration::from_millis(200));
        assert_eq!(config.breaker.failure_threshold, 5);
        assert_eq!(config.breaker.success_threshold, 2);
    }

    #[test]
    fn test_from_lookup() {
        let builder = ResilienceConfigBuilder::from_lookup(lookup(&[
            ("PARLEY_REQUEST_TIMEOUT", "5s"),
            ("PARLEY_RETRY_MAX_ATTEMPTS", "4"),
            ("PARLEY_RETRY_BASE_DELAY", "50ms"),
            ("PARLEY_BREAKER_RECOVERY_TIMEOUT", "1m"),
        ]))
        .unwrap();
        let config = builder.build().unwrap();

        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert_eq!(config.retry.max_attempts, 4);
        assert_eq!(config.retry.base_delay, Duration::from_millis(50));
        assert_eq!(config.breaker.recovery_timeout, Duration::from_secs(60));
        // Untouched values keep their defaults.
        assert_eq!(config.retry.max_delay, Duration::from_secs(5));
    }

    #[test]
    fn test_invalid_env_value() {
        let err = ResilienceConfigBuilder::from_lookup(lookup(&[(
            "PARLEY_RETRY_MAX_DELAY",
            "soon",
        )]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar { ref key, .. } if key == "PARLEY_RETRY_MAX_DELAY"));
    }

    #[test]
    fn test_validation_rejects_zero_values() {
        assert!(ResilienceConfigBuilder::new().max_attempts(0).build().is_err());
        assert!(ResilienceConfigBuilder::new().failure_threshold(0).build().is_err());
        assert!(ResilienceConfigBuilder::new().success_threshold(0).build().is_err());
        assert!(
            ResilienceConfigBuilder::new()
                .request_timeout(Duration::ZERO)
                .build()
                .is_err()
        );
    }

    #[test]
    fn test_validation_base_delay_above_cap() {
        let result = ResilienceConfigBuilder::new()
            .base_delay(Duration::from_secs(10))
            .max_delay(Duration::from_secs(1))
            .build();
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }
}
