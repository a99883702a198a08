/// file: src/backoff.rs
/// description: bounded exponential reconnect schedule for one backoff episode
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ReconnectPolicy {
    base_delay: Duration,
    max_attempts: u32,
    jitter: f64,
    attempt: u32,
}

impl ReconnectPolicy {
    pub fn new(base_delay: Duration, max_attempts: u32) -> Self {
        Self {
            base_delay,
            max_attempts,
            jitter: 0.0,
            attempt: 0,
        }
    }

    /// Spread each delay uniformly by +/- `fraction` (clamped to 0..=1).
    pub fn with_jitter(mut self, fraction: f64) -> Self {
        self.jitter = fraction.clamp(0.0, 1.0);
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Called on a successful open.
    pub fn reset(&mut self) {
        self.attempt = 0;
    }

    /// Next `(attempt, delay)` with `delay = base * 2^(attempt-1)`, or `None`
    /// once the cap is spent.
    pub fn next_delay(&mut self) -> Option<(u32, Duration)> {
        if self.attempt >= self.max_attempts {
            return None;
        }
        self.attempt += 1;

        let exponent = (self.attempt - 1).min(31);
        let delay = self.base_delay.saturating_mul(1u32 << exponent);
        Some((self.attempt, self.apply_jitter(delay)))
    }

    fn apply_jitter(&self, delay: Duration) -> Duration {
        if self.jitter == 0.0 {
            return delay;
        }
        let factor = 1.0 + self.jitter * (fastrand::f64() * 2.0 - 1.0);
        delay.mul_f64(factor.max(0.0))
    }
}
