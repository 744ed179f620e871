//! External notifications delivered to the watch loop.

use std::fmt;

use tokio::sync::mpsc;

/// A notification from outside the watchdog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExternalSignal {
    /// Shutdown is already underway elsewhere; stop without reporting failures.
    Defer,
    /// Any other notification, identified by its raw signal number. Ignored.
    Other(i32),
}

impl ExternalSignal {
    pub fn is_defer(&self) -> bool {
        matches!(self, ExternalSignal::Defer)
    }
}

impl fmt::Display for ExternalSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExternalSignal::Defer => write!(f, "defer"),
            ExternalSignal::Other(raw) => write!(f, "signal {}", raw),
        }
    }
}

/// Create the channel the watch loop listens on.
pub fn channel(buffer: usize) -> (mpsc::Sender<ExternalSignal>, mpsc::Receiver<ExternalSignal>) {
    mpsc::channel(buffer.max(1))
}
