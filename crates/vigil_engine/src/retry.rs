//! Bounded, cancellable retry of the capture/diff/select cycle.
//!
//! Both drivers share [`RetryScheduler::decide`], so blocking and async
//! callers see the same attempt accounting and the same outcomes. They
//! differ only in how they wait.

use crate::cancel::CancellationToken;
use crate::config::RetryConfig;
use crate::disambiguate::Selection;
use crate::error::{ClientError, ClientResult};
use crate::request::ResolutionOutcome;
use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// A terminal outcome and the number of attempts it took.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryReport {
    /// Terminal outcome.
    pub outcome: ResolutionOutcome,
    /// Attempts made, including the one that settled.
    pub attempts: u32,
}

/// What to do after an attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Decision {
    Finish(ResolutionOutcome),
    Wait(Duration),
}

/// Runs a step until it settles or the attempt budget runs out.
#[derive(Debug, Clone)]
pub struct RetryScheduler {
    config: RetryConfig,
}

impl RetryScheduler {
    /// Creates a scheduler.
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    /// Returns the retry configuration.
    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Settled selections finish immediately, ambiguity included: waiting
    /// can only add candidates, never remove them.
    fn decide(&self, attempt: u32, selection: Selection) -> Decision {
        match selection {
            Selection::Settled(outcome) => Decision::Finish(outcome),
            Selection::NotYet if attempt + 1 >= self.config.budget() => {
                Decision::Finish(ResolutionOutcome::TimedOut {
                    attempts: attempt + 1,
                })
            }
            Selection::NotYet => Decision::Wait(self.config.delay_for_attempt(attempt + 1)),
        }
    }

    /// Runs `step` on the current thread, sleeping between attempts.
    ///
    /// `step` receives the 0-based attempt number. Its errors end the run
    /// unchanged. Cancellation is checked before every attempt and while
    /// sleeping.
    pub fn run_blocking<F>(&self, cancel: &CancellationToken, mut step: F) -> ClientResult<RetryReport>
    where
        F: FnMut(u32) -> ClientResult<Selection>,
    {
        let mut attempt = 0;
        loop {
            if cancel.is_cancelled() {
                return Err(ClientError::Cancelled);
            }

            match self.decide(attempt, step(attempt)?) {
                Decision::Finish(outcome) => {
                    return Ok(RetryReport {
                        outcome,
                        attempts: attempt + 1,
                    })
                }
                Decision::Wait(delay) => {
                    debug!(attempt, ?delay, "nothing new yet, waiting");
                    if cancel.wait_timeout(delay) {
                        return Err(ClientError::Cancelled);
                    }
                }
            }
            attempt += 1;
        }
    }

    /// Runs `step` on the async runtime, yielding between attempts.
    ///
    /// Same contract as [`run_blocking`](Self::run_blocking).
    pub async fn run_async<F, Fut>(
        &self,
        cancel: &CancellationToken,
        mut step: F,
    ) -> ClientResult<RetryReport>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = ClientResult<Selection>>,
    {
        let mut attempt = 0;
        loop {
            if cancel.is_cancelled() {
                return Err(ClientError::Cancelled);
            }

            match self.decide(attempt, step(attempt).await?) {
                Decision::Finish(outcome) => {
                    return Ok(RetryReport {
                        outcome,
                        attempts: attempt + 1,
                    })
                }
                Decision::Wait(delay) => {
                    debug!(attempt, ?delay, "nothing new yet, waiting");
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => return Err(ClientError::Cancelled),
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
            }
            attempt += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vigil_protocol::{ObjectId, ObjectKind, ObjectRecord};

    fn record() -> ObjectRecord {
        ObjectRecord::new(ObjectId(1002), None, "dc-1", ObjectKind::Device)
    }

    #[test]
    fn settles_on_first_attempt() {
        let scheduler = RetryScheduler::new(RetryConfig::immediate(5));
        let report = scheduler
            .run_blocking(&CancellationToken::new(), |_| {
                Ok(Selection::Settled(ResolutionOutcome::Resolved(record())))
            })
            .unwrap();
        assert_eq!(report.attempts, 1);
        assert_eq!(report.outcome, ResolutionOutcome::Resolved(record()));
    }

    #[test]
    fn retries_until_settled() {
        let scheduler = RetryScheduler::new(RetryConfig::immediate(5));
        let report = scheduler
            .run_blocking(&CancellationToken::new(), |attempt| {
                Ok(if attempt < 2 {
                    Selection::NotYet
                } else {
                    Selection::Settled(ResolutionOutcome::Resolved(record()))
                })
            })
            .unwrap();
        assert_eq!(report.attempts, 3);
    }

    #[test]
    fn exhausting_budget_times_out_after_exactly_budget_steps() {
        let scheduler = RetryScheduler::new(RetryConfig::immediate(4));
        let mut calls = 0;
        let report = scheduler
            .run_blocking(&CancellationToken::new(), |_| {
                calls += 1;
                Ok(Selection::NotYet)
            })
            .unwrap();
        assert_eq!(calls, 4);
        assert_eq!(report.outcome, ResolutionOutcome::TimedOut { attempts: 4 });
    }

    #[test]
    fn ambiguity_is_not_waited_out() {
        let scheduler = RetryScheduler::new(RetryConfig::immediate(10));
        let mut calls = 0;
        let report = scheduler
            .run_blocking(&CancellationToken::new(), |_| {
                calls += 1;
                Ok(Selection::Settled(ResolutionOutcome::Ambiguous(vec![
                    record(),
                    record(),
                ])))
            })
            .unwrap();
        assert_eq!(calls, 1);
        assert!(matches!(report.outcome, ResolutionOutcome::Ambiguous(_)));
    }

    #[test]
    fn step_errors_are_not_retried() {
        let scheduler = RetryScheduler::new(RetryConfig::immediate(10));
        let mut calls = 0;
        let result = scheduler.run_blocking(&CancellationToken::new(), |_| {
            calls += 1;
            Err(ClientError::transport_retryable("connection reset"))
        });
        assert!(matches!(result, Err(ClientError::Transport { .. })));
        assert_eq!(calls, 1);
    }

    #[test]
    fn cancelled_before_start() {
        let scheduler = RetryScheduler::new(RetryConfig::immediate(3));
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = scheduler.run_blocking(&cancel, |_| Ok(Selection::NotYet));
        assert!(matches!(result, Err(ClientError::Cancelled)));
    }

    #[test]
    fn cancelled_during_delay_is_not_a_timeout() {
        let scheduler = RetryScheduler::new(RetryConfig::new(3).with_delay(Duration::from_secs(60)));
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        let result = scheduler.run_blocking(&cancel, move |_| {
            trigger.cancel();
            Ok(Selection::NotYet)
        });
        assert!(matches!(result, Err(ClientError::Cancelled)));
    }

    #[tokio::test]
    async fn async_driver_matches_blocking_driver() {
        let scheduler = RetryScheduler::new(RetryConfig::immediate(4));
        let report = scheduler
            .run_async(&CancellationToken::new(), |_| async { Ok(Selection::NotYet) })
            .await
            .unwrap();
        assert_eq!(report.outcome, ResolutionOutcome::TimedOut { attempts: 4 });

        let report = scheduler
            .run_async(&CancellationToken::new(), |attempt| async move {
                Ok(if attempt == 0 {
                    Selection::NotYet
                } else {
                    Selection::Settled(ResolutionOutcome::Resolved(record()))
                })
            })
            .await
            .unwrap();
        assert_eq!(report.attempts, 2);
    }

    #[tokio::test]
    async fn async_cancel_during_delay() {
        let scheduler = RetryScheduler::new(RetryConfig::new(3).with_delay(Duration::from_secs(60)));
        let cancel = CancellationToken::new();
        let canceller = {
            let cancel = cancel.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(20)).await;
                cancel.cancel();
            })
        };

        let result = tokio::time::timeout(
            Duration::from_secs(5),
            scheduler.run_async(&cancel, |_| async { Ok(Selection::NotYet) }),
        )
        .await
        .expect("cancellation not observed");
        assert!(matches!(result, Err(ClientError::Cancelled)));
        canceller.await.unwrap();
    }
}
