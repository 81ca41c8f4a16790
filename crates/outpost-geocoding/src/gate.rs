//! Minimum-interval request gate.
//!
//! Public geocoding services allow roughly one request per second. Callers
//! `acquire` the gate before each request; the gate sleeps just long enough
//! to keep requests at least `min_interval` apart.

use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Spaces outgoing requests at least `min_interval` apart.
#[derive(Debug)]
pub struct RequestGate {
    last_request: Mutex<Option<Instant>>,
    min_interval: Duration,
}

impl RequestGate {
    /// Create a gate with the given minimum spacing.
    #[must_use]
    pub fn new(min_interval: Duration) -> Self {
        Self {
            last_request: Mutex::new(None),
            min_interval,
        }
    }

    /// Wait until a request may be sent, then record it as sent.
    ///
    /// The lock is held across the sleep so concurrent callers queue up
    /// behind each other instead of all firing when the interval elapses.
    pub async fn acquire(&self) {
        let mut last = self.last_request.lock().await;
        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < self.min_interval {
                let wait = self.min_interval - elapsed;
                tracing::trace!(wait_ms = wait.as_millis(), "request gate waiting");
                tokio::time::sleep(wait).await;
            }
        }
        *last = Some(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_first_acquire_is_immediate() {
        let gate = RequestGate::new(Duration::from_secs(1));
        let start = Instant::now();
        gate.acquire().await;
        assert!(start.elapsed() < Duration::from_millis(10));
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_acquire_waits_for_interval() {
        let gate = RequestGate::new(Duration::from_secs(1));
        let start = Instant::now();
        gate.acquire().await;
        gate.acquire().await;
        assert!(start.elapsed() >= Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_wait_after_interval_elapsed() {
        let gate = RequestGate::new(Duration::from_millis(100));
        gate.acquire().await;
        tokio::time::sleep(Duration::from_millis(150)).await;

        let start = Instant::now();
        gate.acquire().await;
        assert!(start.elapsed() < Duration::from_millis(10));
    }
}
