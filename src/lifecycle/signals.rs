//! OS signal handling.
//!
//! # Responsibilities
//! - Register signal handlers (SIGUSR1, SIGTERM, SIGINT)
//! - Translate signals to watchdog inputs
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - Generous channel buffer so bursts of signals are never lost
//! - SIGHUP is left alone and keeps its default disposition

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::watchdog::signal::{self, ExternalSignal};

/// Capacity of the signal channel handed to the watchdog.
pub const SIGNAL_BUFFER_SIZE: usize = 1024;

/// Install signal handlers and return the receiving end for the watch loop.
///
/// Termination signals cancel `cancel` instead of going through the channel.
#[cfg(unix)]
pub fn install(cancel: CancellationToken) -> std::io::Result<mpsc::Receiver<ExternalSignal>> {
    use tokio::signal::unix::{signal as unix_signal, SignalKind};

    let mut usr1 = unix_signal(SignalKind::user_defined1())?;
    let mut terminate = unix_signal(SignalKind::terminate())?;
    let mut interrupt = unix_signal(SignalKind::interrupt())?;
    let (tx, rx) = signal::channel(SIGNAL_BUFFER_SIZE);

    tokio::spawn(async move {
        loop {
            let forwarded = tokio::select! {
                _ = cancel.cancelled() => break,
                Some(()) = usr1.recv() => ExternalSignal::Defer,
                Some(()) = terminate.recv() => {
                    tracing::info!("SIGTERM received, shutting down");
                    cancel.cancel();
                    break;
                }
                Some(()) = interrupt.recv() => {
                    tracing::info!("SIGINT received, shutting down");
                    cancel.cancel();
                    break;
                }
                else => break,
            };

            tracing::debug!(signal = %forwarded, "Forwarding signal to watchdog");
            if tx.send(forwarded).await.is_err() {
                break;
            }
        }
    });

    Ok(rx)
}

/// Install signal handlers and return the receiving end for the watch loop.
#[cfg(not(unix))]
pub fn install(cancel: CancellationToken) -> std::io::Result<mpsc::Receiver<ExternalSignal>> {
    let (_tx, rx) = signal::channel(SIGNAL_BUFFER_SIZE);

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Ctrl+C received, shutting down");
            cancel.cancel();
        }
    });

    Ok(rx)
}
