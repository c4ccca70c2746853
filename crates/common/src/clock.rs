//! Wall-clock abstraction
//!
//! Credential freshness is decided against wall-clock issuance timestamps, so
//! every component that asks "how old is this token" takes a [`Clock`] instead
//! of calling [`SystemTime::now`] directly. Tests swap in [`MockClock`] and
//! move time forward without sleeping.
//!
//! ```
//! # #[cfg(feature = "test-utils")]
//! # {
//! use std::time::Duration;
//!
//! use adpulse_common::clock::{Clock, MockClock};
//!
//! let clock = MockClock::new();
//! let issued = clock.now();
//! clock.advance(Duration::from_secs(56 * 60));
//! assert_eq!(clock.elapsed_since(issued), Duration::from_secs(56 * 60));
//! # }
//! ```

use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Source of wall-clock time.
pub trait Clock: Send + Sync {
    /// Current wall-clock time.
    fn now(&self) -> SystemTime;

    /// Time elapsed since `earlier`, saturating to zero when `earlier` lies in
    /// the future (clock skew, mocked time rewound).
    fn elapsed_since(&self, earlier: SystemTime) -> Duration {
        self.now().duration_since(earlier).unwrap_or_default()
    }

    /// Milliseconds since the UNIX epoch.
    fn millis_since_epoch(&self) -> u64 {
        self.now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis() as u64
    }
}

/// Real system clock. Use this in production wiring.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }
}

#[cfg(any(test, feature = "test-utils"))]
pub use mock::MockClock;

#[cfg(any(test, feature = "test-utils"))]
mod mock {
    use std::sync::Arc;
    use std::time::{Duration, SystemTime};

    use parking_lot::Mutex;

    use super::Clock;

    /// Manually driven clock for deterministic tests.
    ///
    /// Clones share the same underlying time, so a clock handed to a
    /// component can still be advanced from the test body.
    #[derive(Debug, Clone)]
    pub struct MockClock {
        current: Arc<Mutex<SystemTime>>,
    }

    impl MockClock {
        /// Start at the real current time.
        pub fn new() -> Self {
            Self::starting_at(SystemTime::now())
        }

        /// Start at a fixed instant.
        pub fn starting_at(start: SystemTime) -> Self {
            Self { current: Arc::new(Mutex::new(start)) }
        }

        /// Move time forward.
        pub fn advance(&self, by: Duration) {
            let mut current = self.current.lock();
            *current += by;
        }

        /// Jump to an absolute instant.
        pub fn set(&self, to: SystemTime) {
            *self.current.lock() = to;
        }
    }

    impl Default for MockClock {
        fn default() -> Self {
            Self::new()
        }
    }

    impl Clock for MockClock {
        fn now(&self) -> SystemTime {
            *self.current.lock()
        }
    }
}
