//! Time Abstractions
//!
//! Injectable time source and sleep primitive. The import engine enforces a
//! minimum gap between outbound requests; both the "how late is it" and the
//! "wait this long" halves are traits so tests can run without wall-clock
//! delays.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::time::Duration;

/// Time source trait
///
/// Abstracts system time to enable deterministic testing.
pub trait Clock: Send + Sync {
    /// Get current UTC time
    fn now(&self) -> DateTime<Utc>;

    /// Get current Unix timestamp in milliseconds
    fn unix_timestamp_millis(&self) -> i64 {
        self.now().timestamp_millis()
    }
}

/// System clock implementation using actual system time
#[derive(Debug, Clone)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Suspension primitive trait
///
/// The only places the engine suspends on time are the request throttle and
/// the 429 retry-after delay; both go through this trait.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Tokio-based sleeper for production use
#[derive(Debug, Clone)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_clock() {
        let clock = SystemClock;
        let now = clock.now();
        let millis = clock.unix_timestamp_millis();

        assert!(millis > 0);
        assert!((millis - now.timestamp_millis()).abs() < 1_000);
    }

    #[tokio::test]
    async fn test_tokio_sleeper_resolves() {
        TokioSleeper.sleep(Duration::from_millis(1)).await;
    }
}
