//! Transfer coordinator configuration.

use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Cancel poll interval must be greater than zero")]
    ZeroPollInterval,
    #[error("Cancel poll interval {poll:?} exceeds lock timeout {timeout:?}")]
    PollExceedsTimeout { poll: Duration, timeout: Duration },
}

/// Lock acquisition policy for transfers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferConfig {
    /// Upper bound on the wait for each account lock.
    pub lock_timeout: Duration,
    /// How often a waiting transfer checks its cancel token.
    pub cancel_poll_interval: Duration,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            lock_timeout: Duration::from_secs(1),
            cancel_poll_interval: Duration::from_millis(10),
        }
    }
}

impl TransferConfig {
    pub fn with_lock_timeout(mut self, lock_timeout: Duration) -> Self {
        self.lock_timeout = lock_timeout;
        self
    }

    pub fn with_cancel_poll_interval(mut self, cancel_poll_interval: Duration) -> Self {
        self.cancel_poll_interval = cancel_poll_interval;
        self
    }

    /// Load configuration from environment variables, keeping defaults for
    /// anything unset or unparsable.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(ms) = env_millis("LEDGER_LOCK_TIMEOUT_MS") {
            config.lock_timeout = ms;
        }

        if let Some(ms) = env_millis("LEDGER_CANCEL_POLL_MS") {
            config.cancel_poll_interval = ms;
        }

        config
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cancel_poll_interval.is_zero() {
            return Err(ConfigError::ZeroPollInterval);
        }
        if self.cancel_poll_interval > self.lock_timeout {
            return Err(ConfigError::PollExceedsTimeout {
                poll: self.cancel_poll_interval,
                timeout: self.lock_timeout,
            });
        }
        Ok(())
    }
}

fn env_millis(key: &str) -> Option<Duration> {
    std::env::var(key)
        .ok()?
        .trim()
        .parse()
        .ok()
        .map(Duration::from_millis)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = TransferConfig::default();
        assert_eq!(config.lock_timeout, Duration::from_secs(1));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn invalid_config() {
        let config = TransferConfig::default().with_cancel_poll_interval(Duration::ZERO);
        assert_eq!(config.validate(), Err(ConfigError::ZeroPollInterval));

        let config = TransferConfig::default()
            .with_lock_timeout(Duration::from_millis(5))
            .with_cancel_poll_interval(Duration::from_millis(10));
        assert!(matches!(
            config.validate(),
            Err(ConfigError::PollExceedsTimeout { .. })
        ));
    }
}
