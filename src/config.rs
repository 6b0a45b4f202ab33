//! Fixed constants and per-component configuration.
//!
//! The constants are the defaults every component starts from; [`Config`]
//! lets a caller override them before construction.

use crate::error::{Error, Result};

use std::time::Duration;

/// Maximum number of bytes read from one channel per readiness event.
pub const BUFFER_SIZE: usize = 1024;

/// Trailing marker appended to every outbound message.
pub const MESSAGE_DELIMITER: &str = "\n";

/// Port used by [`ComponentBuilder`](crate::ComponentBuilder) when none is given.
pub const DEFAULT_PORT: u16 = 9000;

/// Upper bound on a single selector wait; bounds shutdown latency.
pub const SELECT_TIMEOUT: Duration = Duration::from_millis(1000);

/// Readiness events collected per selector wait.
pub const MAX_EVENTS: usize = 64;

/// Component configuration.
///
/// # Examples
///
/// ```
/// use chat_reactor::Config;
/// use std::time::Duration;
///
/// let config = Config::default()
///     .with_buffer_size(4096)
///     .with_select_timeout(Duration::from_millis(200));
///
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Capacity of the receive buffer reused for every read
    pub buffer_size: usize,

    /// Message delimiter; must not occur inside message content
    pub delimiter: String,

    /// Bounded wait per loop iteration
    pub select_timeout: Duration,

    /// Events collected per wait
    pub max_events: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            buffer_size: BUFFER_SIZE,
            delimiter: MESSAGE_DELIMITER.to_string(),
            select_timeout: SELECT_TIMEOUT,
            max_events: MAX_EVENTS,
        }
    }
}

impl Config {
    #[must_use]
    pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size;
        self
    }

    #[must_use]
    pub fn with_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.delimiter = delimiter.into();
        self
    }

    #[must_use]
    pub fn with_select_timeout(mut self, timeout: Duration) -> Self {
        self.select_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_max_events(mut self, max_events: usize) -> Self {
        self.max_events = max_events;
        self
    }

    /// Rejects values the event loop cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.buffer_size == 0 {
            return Err(Error::invalid_config("buffer_size must be greater than zero"));
        }
        if self.delimiter.is_empty() {
            return Err(Error::invalid_config("delimiter must not be empty"));
        }
        if self.select_timeout.is_zero() {
            return Err(Error::invalid_config("select_timeout must be greater than zero"));
        }
        if self.max_events == 0 {
            return Err(Error::invalid_config("max_events must be greater than zero"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_constants() {
        let config = Config::default();

        assert_eq!(config.buffer_size, BUFFER_SIZE);
        assert_eq!(config.delimiter, MESSAGE_DELIMITER);
        assert_eq!(config.select_timeout, SELECT_TIMEOUT);
        assert_eq!(config.max_events, MAX_EVENTS);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_zero_buffer() {
        let err = Config::default().with_buffer_size(0).validate().unwrap_err();
        assert!(err.is_construction_failure());
    }

    #[test]
    fn test_rejects_empty_delimiter() {
        assert!(Config::default().with_delimiter("").validate().is_err());
    }

    #[test]
    fn test_rejects_zero_timeout() {
        assert!(
            Config::default()
                .with_select_timeout(Duration::ZERO)
                .validate()
                .is_err()
        );
    }
}
