use std::time::{Duration, Instant};

/// A cached value with a fixed time-to-live.
///
/// Starts empty; only `set` puts a value in, restamping the issue time.
/// The value is never explicitly cleared, just superseded in place.
#[derive(Debug)]
pub struct TimedValue<T> {
    value: Option<T>,
    issued_at: Instant,
    ttl: Duration,
}

impl<T> TimedValue<T> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            value: None,
            issued_at: Instant::now(),
            ttl,
        }
    }

    /// Valid exactly while the age has not exceeded the ttl. An unset value
    /// is never valid; age strictly greater than ttl invalidates.
    pub fn is_valid(&self) -> bool {
        self.value.is_some() && self.issued_at.elapsed() <= self.ttl
    }

    pub fn value(&self) -> Option<&T> {
        self.value.as_ref()
    }

    /// Stores a value and resets the clock.
    pub fn set(&mut self, value: T) -> &T {
        self.issued_at = Instant::now();
        self.value.insert(value)
    }
}
