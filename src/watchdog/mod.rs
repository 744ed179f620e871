//! Health-check watchdog.
//!
//! # Data Flow
//! ```text
//! watch():
//!     wait for first of { cancellation, external signal, poll timer }
//!     → cancellation        → Ok(())
//!     → Defer signal        → Ok(())
//!     → other signal        → ignore, keep waiting
//!     → poll timer          → probe.rs (one GET)
//!                           → state.rs (count consecutive failures)
//!                           → below threshold: re-arm timer
//!                           → threshold: take one queued signal without waiting
//!                                        Defer → Ok(()), other → re-arm, none → Err
//! ```
//!
//! # Design Decisions
//! - One task owns the loop and its state; probes never overlap
//! - Cancellation is checked before signals and the timer when several are ready
//! - The timer is re-armed after the probe completes, so slow probes push ticks later
//! - A Defer signal already queued when the threshold is hit wins over the failure

pub mod error;
pub mod probe;
pub mod signal;
pub mod state;
pub mod target;

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;

use crate::observability::metrics;

pub use error::{ProbeError, WatchdogError};
pub use probe::{HttpProbe, Probe, ProbeOutcome};
pub use signal::ExternalSignal;
pub use state::{Verdict, WatchdogState, FAILURE_THRESHOLD};
pub use target::{Credentials, EndpointTarget, Transport};

/// Polls a single endpoint until it fails too often or is told to stop.
#[derive(Debug)]
pub struct Watchdog<P = HttpProbe> {
    probe: P,
    component_name: String,
    poll_interval: Duration,
}

impl Watchdog<HttpProbe> {
    /// Create a watchdog probing `target` over HTTP.
    pub fn new(
        target: EndpointTarget,
        component_name: impl Into<String>,
        poll_interval: Duration,
        healthcheck_timeout: Duration,
    ) -> Self {
        Self::with_probe(
            HttpProbe::new(target, healthcheck_timeout),
            component_name,
            poll_interval,
        )
    }

    /// Create a watchdog from a target URL such as `http://127.0.0.1:8080/healthz`.
    pub fn from_url(
        url: &str,
        component_name: impl Into<String>,
        poll_interval: Duration,
        healthcheck_timeout: Duration,
    ) -> Result<Self, WatchdogError> {
        let target = EndpointTarget::parse(url)?;
        Ok(Self::new(target, component_name, poll_interval, healthcheck_timeout))
    }

    /// Probe the endpoint once, outside the loop.
    pub async fn hit_endpoint(&self) -> ProbeOutcome {
        self.probe.hit_endpoint().await
    }

    pub fn target(&self) -> &EndpointTarget {
        self.probe.target()
    }
}

impl<P: Probe> Watchdog<P> {
    /// Create a watchdog around any probe implementation.
    pub fn with_probe(probe: P, component_name: impl Into<String>, poll_interval: Duration) -> Self {
        Self {
            probe,
            component_name: component_name.into(),
            poll_interval,
        }
    }

    pub fn component_name(&self) -> &str {
        &self.component_name
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Run the poll loop until it is cancelled, deferred, or the endpoint
    /// fails [`FAILURE_THRESHOLD`] times in a row.
    ///
    /// Signals other than [`ExternalSignal::Defer`] are consumed and ignored.
    /// When the threshold is hit, one already queued signal is taken without
    /// waiting: a Defer stops cleanly, any other signal postpones the failure
    /// to the next failing tick. A closed signal channel only disables that
    /// event source.
    pub async fn watch(
        &self,
        cancel: CancellationToken,
        signals: &mut mpsc::Receiver<ExternalSignal>,
    ) -> Result<(), WatchdogError> {
        let mut state = WatchdogState::new();
        let poll_timer = time::sleep(self.poll_interval);
        tokio::pin!(poll_timer);

        loop {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => {
                    tracing::info!(component = %self.component_name, "Context done, exiting");
                    return Ok(());
                }

                Some(signal) = signals.recv() => {
                    if signal.is_defer() {
                        tracing::info!(component = %self.component_name, "Received defer signal, exiting");
                        return Ok(());
                    }
                    tracing::debug!(component = %self.component_name, signal = %signal, "Ignoring signal");
                }

                _ = &mut poll_timer => {
                    tracing::debug!(
                        component = %self.component_name,
                        poll_interval = ?self.poll_interval,
                        "Verifying endpoint"
                    );

                    let outcome = self.probe.probe().await;
                    metrics::record_probe(&self.component_name, outcome.is_success());

                    let verdict = state.record(outcome);
                    metrics::record_consecutive_failures(&self.component_name, state.consecutive_failures());

                    match verdict {
                        Verdict::Verified => {
                            tracing::debug!(component = %self.component_name, "Endpoint verified");
                        }
                        Verdict::Retry { attempt, cause } => {
                            tracing::debug!(
                                component = %self.component_name,
                                error = %cause,
                                attempt,
                                "Received error"
                            );
                        }
                        Verdict::Exhausted { attempts, cause } => match signals.try_recv() {
                            Ok(ExternalSignal::Defer) => {
                                tracing::info!(
                                    component = %self.component_name,
                                    error = %cause,
                                    "Received defer signal, exiting"
                                );
                                return Ok(());
                            }
                            Ok(signal) => {
                                tracing::debug!(
                                    component = %self.component_name,
                                    signal = %signal,
                                    error = %cause,
                                    attempt = attempts,
                                    "Ignoring signal"
                                );
                            }
                            Err(_) => {
                                return Err(WatchdogError::HealthcheckFailed {
                                    component: self.component_name.clone(),
                                    attempts,
                                    cause,
                                });
                            }
                        },
                    }

                    poll_timer.as_mut().reset(Instant::now() + self.poll_interval);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyper::StatusCode;
    use std::collections::VecDeque;
    use std::future::Future;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::{Arc, Mutex};

    const INTERVAL: Duration = Duration::from_millis(10);

    type Hook = Box<dyn Fn(u32) + Send + Sync>;

    /// Probe that replays a fixed script, then repeats `fallback`.
    struct ScriptedProbe {
        script: Mutex<VecDeque<bool>>,
        fallback: bool,
        calls: Arc<AtomicU32>,
        on_call: Option<Hook>,
    }

    impl ScriptedProbe {
        fn new(script: &[bool], fallback: bool) -> Self {
            Self {
                script: Mutex::new(script.iter().copied().collect()),
                fallback,
                calls: Arc::new(AtomicU32::new(0)),
                on_call: None,
            }
        }

        fn on_call(mut self, hook: impl Fn(u32) + Send + Sync + 'static) -> Self {
            self.on_call = Some(Box::new(hook));
            self
        }
    }

    impl Probe for ScriptedProbe {
        fn probe(&self) -> impl Future<Output = ProbeOutcome> + Send {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            let healthy = self.script.lock().unwrap().pop_front().unwrap_or(self.fallback);
            if let Some(hook) = &self.on_call {
                hook(call);
            }
            async move {
                if healthy {
                    ProbeOutcome::Success
                } else {
                    ProbeOutcome::Failure(ProbeError::Status(StatusCode::SERVICE_UNAVAILABLE))
                }
            }
        }
    }

    fn watchdog(probe: ScriptedProbe) -> (Watchdog<ScriptedProbe>, Arc<AtomicU32>) {
        let calls = probe.calls.clone();
        (Watchdog::with_probe(probe, "some-component", INTERVAL), calls)
    }

    fn cancel_after(token: &CancellationToken, after: Duration) {
        let token = token.clone();
        tokio::spawn(async move {
            time::sleep(after).await;
            token.cancel();
        });
    }

    #[tokio::test(start_paused = true)]
    async fn test_healthy_endpoint_runs_until_cancelled() {
        let (dog, calls) = watchdog(ScriptedProbe::new(&[], true));
        let (_tx, mut rx) = signal::channel(1);
        let cancel = CancellationToken::new();
        cancel_after(&cancel, 10 * INTERVAL);

        let result = dog.watch(cancel, &mut rx).await;

        assert!(result.is_ok());
        assert!(calls.load(Ordering::SeqCst) >= 9);
    }

    #[tokio::test(start_paused = true)]
    async fn test_always_failing_stops_after_exactly_three_ticks() {
        let (dog, calls) = watchdog(ScriptedProbe::new(&[], false));
        let (_tx, mut rx) = signal::channel(1);
        let start = Instant::now();

        let result = dog.watch(CancellationToken::new(), &mut rx).await;

        match result {
            Err(WatchdogError::HealthcheckFailed { component, attempts, cause }) => {
                assert_eq!(component, "some-component");
                assert_eq!(attempts, FAILURE_THRESHOLD);
                assert!(cause.to_string().contains("503"));
            }
            other => panic!("expected threshold failure, got {:?}", other),
        }
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(start.elapsed() >= 3 * INTERVAL);
        assert!(start.elapsed() < 4 * INTERVAL);
    }

    #[tokio::test(start_paused = true)]
    async fn test_two_failures_then_success_never_errors() {
        let (dog, calls) = watchdog(ScriptedProbe::new(&[false, false], true));
        let (_tx, mut rx) = signal::channel(1);
        let cancel = CancellationToken::new();
        cancel_after(&cancel, 10 * INTERVAL);

        assert!(dog.watch(cancel, &mut rx).await.is_ok());
        assert!(calls.load(Ordering::SeqCst) > 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_resets_failure_count() {
        let script = [false, false, true, false, false, true, false, false];
        let (dog, _) = watchdog(ScriptedProbe::new(&script, true));
        let (_tx, mut rx) = signal::channel(1);
        let cancel = CancellationToken::new();
        cancel_after(&cancel, 20 * INTERVAL);

        assert!(dog.watch(cancel, &mut rx).await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_after_recovery_needs_three_new_failures() {
        let (dog, calls) = watchdog(ScriptedProbe::new(&[false, false, true, true], false));
        let (_tx, mut rx) = signal::channel(1);

        assert!(dog.watch(CancellationToken::new(), &mut rx).await.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 7);
    }

    #[tokio::test(start_paused = true)]
    async fn test_defer_pending_at_threshold_stops_cleanly() {
        let (tx, mut rx) = signal::channel(1);
        let probe = ScriptedProbe::new(&[], false).on_call(move |call| {
            if call == 3 {
                tx.try_send(ExternalSignal::Defer).unwrap();
            }
        });
        let (dog, calls) = watchdog(probe);

        assert!(dog.watch(CancellationToken::new(), &mut rx).await.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_other_signal_at_threshold_defers_failure_one_tick() {
        let (tx, mut rx) = signal::channel(1);
        let probe = ScriptedProbe::new(&[], false).on_call(move |call| {
            if call == 3 {
                tx.try_send(ExternalSignal::Other(1)).unwrap();
            }
        });
        let (dog, calls) = watchdog(probe);

        let result = dog.watch(CancellationToken::new(), &mut rx).await;

        match result {
            Err(WatchdogError::HealthcheckFailed { attempts, .. }) => assert_eq!(attempts, 4),
            other => panic!("expected threshold failure, got {:?}", other),
        }
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_other_signal_at_threshold_then_defer_stops_cleanly() {
        let (tx, mut rx) = signal::channel(4);
        let probe = ScriptedProbe::new(&[], false).on_call(move |call| {
            if call == 3 {
                tx.try_send(ExternalSignal::Other(1)).unwrap();
                tx.try_send(ExternalSignal::Defer).unwrap();
            }
        });
        let (dog, calls) = watchdog(probe);

        assert!(dog.watch(CancellationToken::new(), &mut rx).await.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_after_ignored_signal_resets_streak() {
        let (tx, mut rx) = signal::channel(1);
        let probe = ScriptedProbe::new(&[false, false, false, true], true).on_call(move |call| {
            if call == 3 {
                tx.try_send(ExternalSignal::Other(1)).unwrap();
            }
        });
        let (dog, calls) = watchdog(probe);
        let cancel = CancellationToken::new();
        cancel_after(&cancel, 10 * INTERVAL);

        assert!(dog.watch(cancel, &mut rx).await.is_ok());
        assert!(calls.load(Ordering::SeqCst) > 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_defer_while_healthy_stops_cleanly() {
        let (tx, mut rx) = signal::channel(1);
        let probe = ScriptedProbe::new(&[], true).on_call(move |call| {
            if call == 2 {
                tx.try_send(ExternalSignal::Defer).unwrap();
            }
        });
        let (dog, calls) = watchdog(probe);

        assert!(dog.watch(CancellationToken::new(), &mut rx).await.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_other_signals_are_ignored() {
        let (tx, mut rx) = signal::channel(4);
        tx.try_send(ExternalSignal::Other(1)).unwrap();
        tx.try_send(ExternalSignal::Other(15)).unwrap();
        let (dog, calls) = watchdog(ScriptedProbe::new(&[], true));
        let cancel = CancellationToken::new();
        cancel_after(&cancel, 5 * INTERVAL);

        assert!(dog.watch(cancel, &mut rx).await.is_ok());
        assert!(calls.load(Ordering::SeqCst) >= 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_during_probe_stops_after_that_tick() {
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let probe = ScriptedProbe::new(&[], true).on_call(move |call| {
            if call == 3 {
                token.cancel();
            }
        });
        let (dog, calls) = watchdog(probe);
        let (_tx, mut rx) = signal::channel(1);

        assert!(dog.watch(cancel, &mut rx).await.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_already_cancelled_never_probes() {
        let (dog, calls) = watchdog(ScriptedProbe::new(&[], false));
        let (_tx, mut rx) = signal::channel(1);
        let cancel = CancellationToken::new();
        cancel.cancel();

        assert!(dog.watch(cancel, &mut rx).await.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_closed_signal_channel_keeps_polling() {
        let (tx, mut rx) = signal::channel(1);
        drop(tx);
        let (dog, calls) = watchdog(ScriptedProbe::new(&[], false));

        assert!(dog.watch(CancellationToken::new(), &mut rx).await.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
