//! Resettable quiet-period timer.
//!
//! Each [`Debouncer::arm`] pushes the deadline out by the full quiet period,
//! so a burst of triggers settles exactly once, `quiet` after the last one.

use std::time::Duration;
use tokio::time::{Instant, sleep_until};

/// Quiet period applied to file change bursts.
pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_millis(500);

#[derive(Debug)]
pub struct Debouncer {
    quiet: Duration,
    deadline: Option<Instant>,
}

impl Debouncer {
    pub fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            deadline: None,
        }
    }

    /// Arm the timer, or restart it if already armed.
    pub fn arm(&mut self) {
        self.deadline = Some(Instant::now() + self.quiet);
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// Resolves once the quiet period has elapsed without a re-arm, then
    /// disarms. Never resolves while disarmed.
    ///
    /// Cancel safe: dropping the future leaves the deadline in place.
    pub async fn settled(&mut self) {
        match self.deadline {
            Some(deadline) => {
                sleep_until(deadline).await;
                self.deadline = None;
            }
            None => std::future::pending().await,
        }
    }
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(DEFAULT_QUIET_PERIOD)
    }
}
