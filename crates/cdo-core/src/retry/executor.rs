//! Retry execution engine
//!
//! Runs a probe until it reports done, fails under early exit, or one of the
//! three bounds (retry limit, policy timeout, cancellation) is reached.

use std::fmt::Display;
use std::future::Future;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::error::RetryError;
use super::observer::{RetryObserver, TracingObserver};
use super::policy::RetryPolicy;

/// Poll a probe under a policy, logging progress through `tracing`
///
/// The probe returns `Ok(Some(value))` when the remote operation is done,
/// `Ok(None)` while it is still in progress, and `Err` on failure.
///
/// # Example
///
/// ```rust,no_run
/// use cdo_core::retry::{retry, RetryError, RetryPolicy};
///
/// async fn example() -> Result<(), RetryError<std::io::Error>> {
///     let policy = RetryPolicy::default();
///
///     retry(&policy, || async {
///         // ask the remote side whether it is done yet
///         Ok(Some(()))
///     })
///     .await
/// }
/// ```
pub async fn retry<F, Fut, T, E>(policy: &RetryPolicy, probe: F) -> Result<T, RetryError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>, E>>,
    E: Display,
{
    RetryExecutorBuilder::new()
        .with_policy(policy.clone())
        .with_observer(TracingObserver::new(policy.message()))
        .build()
        .execute(probe)
        .await
}

/// Builder for configuring a `RetryExecutor`
///
/// # Example
///
/// ```rust
/// use cdo_core::retry::{RetryExecutorBuilder, RetryPolicy, TracingObserver};
/// use tokio_util::sync::CancellationToken;
///
/// let cancel = CancellationToken::new();
/// let executor = RetryExecutorBuilder::new()
///     .with_policy(RetryPolicy::transaction_default())
///     .with_observer(TracingObserver::new("transaction"))
///     .with_cancellation(cancel.clone())
///     .build();
/// ```
pub struct RetryExecutorBuilder<O = TracingObserver> {
    policy: RetryPolicy,
    observer: O,
    cancellation: Option<CancellationToken>,
}

impl Default for RetryExecutorBuilder<TracingObserver> {
    fn default() -> Self {
        Self::new()
    }
}

impl RetryExecutorBuilder<TracingObserver> {
    /// Create a new builder with the default policy and a tracing observer
    pub fn new() -> Self {
        Self {
            policy: RetryPolicy::default(),
            observer: TracingObserver::default(),
            cancellation: None,
        }
    }
}

impl<O> RetryExecutorBuilder<O> {
    /// Set the retry policy
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Set the observer
    pub fn with_observer<O2>(self, observer: O2) -> RetryExecutorBuilder<O2> {
        RetryExecutorBuilder {
            policy: self.policy,
            observer,
            cancellation: self.cancellation,
        }
    }

    /// Stop the loop when `token` is cancelled
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Build the executor
    pub fn build(self) -> RetryExecutor<O> {
        RetryExecutor {
            policy: self.policy,
            observer: self.observer,
            cancellation: self.cancellation,
        }
    }
}

/// A bound that fired while the loop was waiting on a probe or a pause
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Interrupt {
    DeadlineReached,
    Cancelled,
}

/// A retry executor with a policy, an observer and optional cancellation
///
/// Use `RetryExecutorBuilder` to create an instance. The executor holds no
/// per-call state, so one instance may drive many independent loops.
pub struct RetryExecutor<O> {
    policy: RetryPolicy,
    observer: O,
    cancellation: Option<CancellationToken>,
}

impl<O> RetryExecutor<O>
where
    O: RetryObserver,
{
    /// The policy this executor enforces
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Run `probe` until it reports done or a bound is reached
    ///
    /// Attempts are strictly sequential. Both the running probe and the pause
    /// between attempts race the deadline and the cancellation token; a probe
    /// that loses the race is dropped and its result discarded.
    pub async fn execute<F, Fut, T, E>(&self, mut probe: F) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<Option<T>, E>>,
        E: Display,
    {
        let start = Instant::now();
        let deadline = self.policy.timeout().map(|timeout| start + timeout);
        let max_retries = self.policy.max_retries();
        let max_attempts = self.policy.max_attempts();

        let mut attempts: u32 = 0;
        let mut last_error: Option<E> = None;

        loop {
            if self.is_cancelled() {
                return Err(self.interrupted(Interrupt::Cancelled, attempts, start, last_error));
            }

            if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
                return Err(self.interrupted(
                    Interrupt::DeadlineReached,
                    attempts,
                    start,
                    last_error,
                ));
            }

            let attempt = attempts + 1;
            self.observer.on_attempt_start(attempt, max_attempts);

            let outcome = tokio::select! {
                biased;
                _ = self.cancelled() => Err(Interrupt::Cancelled),
                _ = Self::expiry(deadline) => Err(Interrupt::DeadlineReached),
                outcome = probe() => Ok(outcome),
            };

            match outcome {
                Err(interrupt) => {
                    return Err(self.interrupted(interrupt, attempt, start, last_error));
                }
                Ok(Ok(Some(value))) => {
                    self.observer.on_success(attempt, start.elapsed());
                    return Ok(value);
                }
                Ok(Ok(None)) => {}
                Ok(Err(err)) if self.policy.early_exit_on_error() => {
                    self.observer.on_early_exit(attempt, &err);
                    return Err(RetryError::early_exit(attempt, err));
                }
                Ok(Err(err)) => {
                    self.observer.on_attempt_failed(attempt, &err);
                    last_error = Some(err);
                }
            }

            attempts = attempt;

            if max_retries.is_some_and(|max| attempts > max) {
                self.observer
                    .on_exhausted(attempts, last_error.as_ref().map(|e| e as &dyn Display));
                return Err(RetryError::exhausted(
                    attempts,
                    last_error,
                    start.elapsed(),
                ));
            }

            self.observer
                .on_waiting(attempts, self.policy.message(), self.policy.delay());

            if let Some(interrupt) = self.pause(deadline).await {
                return Err(self.interrupted(interrupt, attempts, start, last_error));
            }
        }
    }

    /// Report a fired bound to the observer and build the matching error
    fn interrupted<E>(
        &self,
        interrupt: Interrupt,
        attempts: u32,
        start: Instant,
        last_error: Option<E>,
    ) -> RetryError<E> {
        match interrupt {
            Interrupt::Cancelled => {
                self.observer.on_cancelled(attempts);
                RetryError::cancelled(attempts, last_error)
            }
            Interrupt::DeadlineReached => {
                self.observer.on_timeout(attempts, start.elapsed());
                RetryError::timeout(attempts, start.elapsed(), last_error)
            }
        }
    }

    fn is_cancelled(&self) -> bool {
        self.cancellation
            .as_ref()
            .is_some_and(CancellationToken::is_cancelled)
    }

    /// Sleep for the policy delay, racing the deadline and the cancellation token
    async fn pause(&self, deadline: Option<Instant>) -> Option<Interrupt> {
        tokio::select! {
            biased;
            _ = self.cancelled() => Some(Interrupt::Cancelled),
            _ = Self::expiry(deadline) => Some(Interrupt::DeadlineReached),
            _ = tokio::time::sleep(self.policy.delay()) => None,
        }
    }

    /// Resolves when the cancellation token fires; never without one
    async fn cancelled(&self) {
        match &self.cancellation {
            Some(token) => token.cancelled().await,
            None => std::future::pending().await,
        }
    }

    /// Resolves at the deadline; never without one
    async fn expiry(deadline: Option<Instant>) {
        match deadline {
            Some(deadline) => tokio::time::sleep_until(deadline).await,
            None => std::future::pending().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retry::observer::StatsObserver;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    fn test_policy(retries: i64) -> RetryPolicy {
        RetryPolicy::builder()
            .retries(retries)
            .delay(Duration::from_millis(10))
            .build()
            .unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_immediate_success() {
        let observer = Arc::new(StatsObserver::new());

        let result: Result<&str, RetryError<String>> = RetryExecutorBuilder::new()
            .with_policy(test_policy(3))
            .with_observer(observer.clone())
            .build()
            .execute(|| async { Ok(Some("done")) })
            .await;

        assert_eq!(result.unwrap(), "done");
        assert_eq!(observer.attempt_starts(), 1);
        assert_eq!(observer.successes(), 1);
        assert_eq!(observer.waits(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_after_pending() {
        let observer = Arc::new(StatsObserver::new());
        let calls = Arc::new(AtomicU32::new(0));

        let result: Result<u32, RetryError<String>> = RetryExecutorBuilder::new()
            .with_policy(test_policy(5))
            .with_observer(observer.clone())
            .build()
            .execute(|| {
                let calls = calls.clone();
                async move {
                    let call = calls.fetch_add(1, Ordering::SeqCst) + 1;
                    Ok((call == 3).then_some(call))
                }
            })
            .await;

        assert_eq!(result.unwrap(), 3);
        assert_eq!(observer.attempt_starts(), 3);
        assert_eq!(observer.waits(), 2);
        assert_eq!(observer.failures(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_retries_runs_once() {
        let calls = Arc::new(AtomicU32::new(0));

        let result: Result<(), RetryError<String>> = RetryExecutorBuilder::new()
            .with_policy(test_policy(0))
            .build()
            .execute(|| {
                let calls = calls.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(None)
                }
            })
            .await;

        let err = result.unwrap_err();
        assert!(err.is_exhausted());
        assert_eq!(err.attempts(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_errors_are_recorded() {
        let observer = Arc::new(StatsObserver::new());

        let result: Result<(), RetryError<String>> = RetryExecutorBuilder::new()
            .with_policy(test_policy(2))
            .with_observer(observer.clone())
            .build()
            .execute(|| async { Err("503 service unavailable".to_string()) })
            .await;

        let err = result.unwrap_err();
        assert!(err.is_exhausted());
        assert_eq!(err.attempts(), 3);
        assert_eq!(
            err.source_ref().map(String::as_str),
            Some("503 service unavailable")
        );
        assert_eq!(observer.failures(), 3);
        assert_eq!(observer.exhaustions(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_before_first_attempt() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let calls = Arc::new(AtomicU32::new(0));

        let result: Result<(), RetryError<String>> = RetryExecutorBuilder::new()
            .with_policy(test_policy(3))
            .with_cancellation(cancel)
            .build()
            .execute(|| {
                let calls = calls.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(Some(()))
                }
            })
            .await;

        let err = result.unwrap_err();
        assert!(err.is_cancelled());
        assert_eq!(err.attempts(), 0);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_attempt_cut_off_at_deadline() {
        let policy = RetryPolicy::builder()
            .retries(-1)
            .delay(Duration::from_secs(1))
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap();
        let started = Instant::now();

        let result: Result<(), RetryError<String>> = RetryExecutorBuilder::new()
            .with_policy(policy)
            .build()
            .execute(|| async {
                tokio::time::sleep(Duration::from_secs(100)).await;
                Ok(None)
            })
            .await;

        let err = result.unwrap_err();
        assert!(err.is_timeout());
        assert_eq!(err.attempts(), 1);
        assert!(started.elapsed() < Duration::from_secs(6));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_during_attempt_discards_its_result() {
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(2)).await;
            trigger.cancel();
        });
        let started = Instant::now();

        let result: Result<(), RetryError<String>> = RetryExecutorBuilder::new()
            .with_policy(test_policy(3))
            .with_cancellation(cancel)
            .build()
            .execute(|| async {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok(Some(()))
            })
            .await;

        let err = result.unwrap_err();
        assert!(err.is_cancelled());
        assert!(started.elapsed() < Duration::from_secs(3));
    }
}
