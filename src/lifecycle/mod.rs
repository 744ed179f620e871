//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config → Wait for component to come up → Build watchdog
//!
//! Signals (signals.rs):
//!     SIGUSR1 → Defer signal to the watch loop
//!     SIGTERM/SIGINT → cancel the watch
//! ```
//!
//! # Design Decisions
//! - The watchdog never touches OS signals; it gets a token and a channel
//! - Startup errors are fatal

pub mod signals;
pub mod startup;
