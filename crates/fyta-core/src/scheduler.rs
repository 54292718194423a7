// ── Polling scheduler ──
//
// INIT -> RUNNING -> HALTED. Runs one cycle right away, then one per
// interval, and acts as a circuit breaker: consecutive soft failures are
// tolerated up to the threshold, a hard failure halts at once.

use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::{DEFAULT_FAILURE_THRESHOLD, DEFAULT_POLL_INTERVAL};
use crate::cycle::{CycleOutcome, CycleRunner};
use crate::error::CoreError;

/// Why the scheduler stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HaltReason {
    /// Email or password not configured; no cycle was run.
    MissingCredentials,
    /// Startup work failed; no cycle was run.
    Startup { message: String },
    /// The API rejected the credentials.
    InvalidCredentials,
    /// Too many soft failures in a row.
    FailureThreshold { failures: u32 },
    /// Cancelled from outside (Ctrl-C).
    Shutdown,
}

impl HaltReason {
    /// Process exit status for this halt.
    ///
    /// Halts decided by the circuit breaker or by missing configuration
    /// exit cleanly so a supervisor does not restart into the same failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Startup { .. } => 1,
            _ => 0,
        }
    }
}

impl std::fmt::Display for HaltReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingCredentials => write!(f, "no credentials configured"),
            Self::Startup { message } => write!(f, "startup failed: {message}"),
            Self::InvalidCredentials => write!(f, "credentials rejected by FYTA"),
            Self::FailureThreshold { failures } => {
                write!(f, "{failures} consecutive failed cycles")
            }
            Self::Shutdown => write!(f, "shutdown requested"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchedulerState {
    Init,
    Running,
    Halted(HaltReason),
}

pub struct PollingScheduler {
    interval: Duration,
    threshold: u32,
    consecutive_failures: u32,
    cancel: CancellationToken,
    state: SchedulerState,
}

impl Default for PollingScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_POLL_INTERVAL, DEFAULT_FAILURE_THRESHOLD)
    }
}

impl PollingScheduler {
    /// A zero `threshold` is treated as one.
    pub fn new(interval: Duration, threshold: u32) -> Self {
        Self {
            interval,
            threshold: threshold.max(1),
            consecutive_failures: 0,
            cancel: CancellationToken::new(),
            state: SchedulerState::Init,
        }
    }

    /// Token that stops [`run`](Self::run) when cancelled.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn state(&self) -> &SchedulerState {
        &self.state
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    /// Fold one cycle result into the failure counter.
    pub fn record(&mut self, outcome: CycleOutcome) -> Option<HaltReason> {
        match outcome {
            CycleOutcome::Success => {
                if self.consecutive_failures > 0 {
                    info!(after = self.consecutive_failures, "sync recovered");
                }
                self.consecutive_failures = 0;
                None
            }
            CycleOutcome::SoftFailure => {
                self.consecutive_failures += 1;
                if self.consecutive_failures >= self.threshold {
                    error!(
                        failures = self.consecutive_failures,
                        threshold = self.threshold,
                        "too many consecutive failures, stopping"
                    );
                    Some(HaltReason::FailureThreshold {
                        failures: self.consecutive_failures,
                    })
                } else {
                    warn!(
                        failures = self.consecutive_failures,
                        threshold = self.threshold,
                        "cycle failed, will retry"
                    );
                    None
                }
            }
            CycleOutcome::HardFailure => {
                error!("cycle failed permanently, stopping");
                Some(HaltReason::InvalidCredentials)
            }
        }
    }

    /// Drive `runner` until it halts, then let it shut down.
    pub async fn run<R: CycleRunner>(&mut self, runner: &R) -> HaltReason {
        self.state = SchedulerState::Init;
        self.consecutive_failures = 0;

        let reason = self.drive(runner).await;
        info!(%reason, "scheduler halted");
        self.state = SchedulerState::Halted(reason.clone());
        runner.shutdown().await;
        reason
    }

    async fn drive<R: CycleRunner>(&mut self, runner: &R) -> HaltReason {
        match runner.initialize().await {
            Ok(()) => {}
            Err(CoreError::MissingCredentials) => {
                error!("email and password must be configured, not starting");
                return HaltReason::MissingCredentials;
            }
            Err(e) => {
                error!(error = %e, "startup failed");
                return HaltReason::Startup {
                    message: e.to_string(),
                };
            }
        }

        self.state = SchedulerState::Running;
        debug!(interval_secs = self.interval.as_secs(), threshold = self.threshold, "scheduler running");

        // The first tick completes immediately.
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                () = self.cancel.cancelled() => return HaltReason::Shutdown,
                _ = ticker.tick() => {}
            }

            let pending = runner.in_flight();
            if pending > 0 {
                warn!(pending, "tasks from the previous cycle are still running, starting next cycle anyway");
            }

            let outcome = tokio::select! {
                biased;
                () = self.cancel.cancelled() => return HaltReason::Shutdown,
                outcome = runner.run_cycle() => outcome,
            };
            debug!(?outcome, "cycle finished");

            if let Some(reason) = self.record(outcome) {
                return reason;
            }
        }
    }
}
