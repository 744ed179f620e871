//! Failure counting for the watch loop.
//!
//! # State Transitions
//! ```text
//! Success            → counter = 0, keep polling
//! Failure, n < 3     → counter = n, keep polling
//! Failure, n >= 3    → threshold reached, loop decides how to stop
//! ```
//!
//! Owned by the loop task alone, so plain integers suffice.

use crate::watchdog::error::ProbeError;
use crate::watchdog::probe::ProbeOutcome;

/// Consecutive failures that end the watch.
pub const FAILURE_THRESHOLD: u32 = 3;

/// What the loop should do after recording a probe outcome.
#[derive(Debug)]
pub enum Verdict {
    /// The endpoint answered 200.
    Verified,
    /// The probe failed but the threshold has not been reached yet.
    Retry { attempt: u32, cause: ProbeError },
    /// The probe failed for the `attempts`-th time in a row.
    Exhausted { attempts: u32, cause: ProbeError },
}

#[derive(Debug, Default)]
pub struct WatchdogState {
    consecutive_failures: u32,
}

impl WatchdogState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    /// Fold one probe outcome into the counter.
    pub fn record(&mut self, outcome: ProbeOutcome) -> Verdict {
        match outcome {
            ProbeOutcome::Success => {
                self.consecutive_failures = 0;
                Verdict::Verified
            }
            ProbeOutcome::Failure(cause) => {
                self.consecutive_failures = self.consecutive_failures.saturating_add(1);
                if self.consecutive_failures >= FAILURE_THRESHOLD {
                    Verdict::Exhausted {
                        attempts: self.consecutive_failures,
                        cause,
                    }
                } else {
                    Verdict::Retry {
                        attempt: self.consecutive_failures,
                        cause,
                    }
                }
            }
        }
    }
}
