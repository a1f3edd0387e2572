//! Deadline token shared by every bounded wait.

use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};

use crate::application::ports::Clock;
use crate::domain::WardenError;

/// A single-use deadline.
///
/// Expiry is latched: once any caller has observed it, every later
/// observation reports expired, whatever the clock says afterwards. There is
/// no way to extend a `Timeout`.
pub struct Timeout {
    clock: Arc<dyn Clock>,
    deadline: Instant,
    expired: OnceLock<()>,
}

impl Timeout {
    /// A deadline `duration` from the clock's current instant.
    ///
    /// # Errors
    ///
    /// Returns `WardenError::Configuration` when the deadline is not
    /// representable on this platform.
    pub fn after(clock: Arc<dyn Clock>, duration: Duration) -> Result<Self, WardenError> {
        let deadline = clock.now().checked_add(duration).ok_or_else(|| {
            WardenError::Configuration(format!(
                "timeout of {}s is out of range",
                duration.as_secs()
            ))
        })?;
        Ok(Self {
            clock,
            deadline,
            expired: OnceLock::new(),
        })
    }

    /// Whether the deadline has passed.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        if self.expired.get().is_some() {
            return true;
        }
        if self.clock.now() >= self.deadline {
            let _ = self.expired.set(());
            return true;
        }
        false
    }

    /// Time left before expiry; zero once expired.
    #[must_use]
    pub fn remaining(&self) -> Duration {
        if self.is_expired() {
            return Duration::ZERO;
        }
        self.deadline.saturating_duration_since(self.clock.now())
    }

    /// Block until the deadline has passed.
    pub fn wait(&self) {
        while !self.is_expired() {
            self.clock.sleep(self.remaining());
        }
    }
}
