use std::time::Duration;

use crate::config::BackoffConfig;

/// Reconnect delay: doubles after each consecutive failure up to a ceiling,
/// back to the initial value once a connection opens.
#[derive(Debug, Clone)]
pub struct Backoff {
    initial: Duration,
    max: Duration,
    current: Duration,
}

impl Backoff {
    pub fn new(config: BackoffConfig) -> Self {
        Self {
            initial: config.initial,
            max: config.max,
            current: config.initial,
        }
    }

    /// Delay the next reconnect would wait.
    pub fn current(&self) -> Duration {
        self.current
    }

    /// Take the delay for this reconnect and double the next one.
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.current;
        self.current = self.current.saturating_mul(2).min(self.max);
        delay
    }

    pub fn reset(&mut self) {
        self.current = self.initial;
    }
}
