//! Retry observation and logging
//!
//! This module provides the `RetryObserver` trait for monitoring retry attempts
//! and a `TracingObserver` implementation that logs using the `tracing` crate.
//! Observers are side effects only; nothing they do influences the loop.

use std::fmt::Display;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

/// Observer trait for retry loop events
///
/// Observers are shared between concurrently running workflows, hence the
/// `Send + Sync` bound.
///
/// # Example
///
/// ```rust
/// use cdo_core::retry::RetryObserver;
/// use std::fmt::Display;
/// use std::time::Duration;
///
/// struct ProgressPrinter;
///
/// impl RetryObserver for ProgressPrinter {
///     fn on_attempt_start(&self, attempt: u32, max_attempts: Option<u32>) {}
///
///     fn on_waiting(&self, attempt: u32, message: &str, delay: Duration) {
///         println!("{} (attempt {})", message, attempt);
///     }
///
///     fn on_success(&self, attempt: u32, total_duration: Duration) {}
///
///     fn on_exhausted(&self, attempts: u32, last_error: Option<&dyn Display>) {}
/// }
/// ```
pub trait RetryObserver: Send + Sync {
    /// Called before each probe invocation
    ///
    /// # Arguments
    ///
    /// * `attempt` - The attempt number (1-indexed)
    /// * `max_attempts` - The attempt limit, `None` when only a timeout bounds the loop
    fn on_attempt_start(&self, attempt: u32, max_attempts: Option<u32>);

    /// Called when a probe error is recorded and the loop continues
    fn on_attempt_failed(&self, attempt: u32, error: &dyn Display) {
        let _ = (attempt, error);
    }

    /// Called before sleeping between attempts, with the policy message
    fn on_waiting(&self, attempt: u32, message: &str, delay: Duration);

    /// Called when the probe reports done
    fn on_success(&self, attempt: u32, total_duration: Duration);

    /// Called when the retry limit is reached
    fn on_exhausted(&self, attempts: u32, last_error: Option<&dyn Display>);

    /// Called when the policy timeout elapses
    fn on_timeout(&self, attempts: u32, elapsed: Duration) {
        let _ = (attempts, elapsed);
    }

    /// Called when the cancellation token fires
    fn on_cancelled(&self, attempts: u32) {
        let _ = attempts;
    }

    /// Called when a probe error ends the loop because of early exit
    fn on_early_exit(&self, attempt: u32, error: &dyn Display) {
        let _ = (attempt, error);
    }
}

/// A no-op observer that does nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpObserver;

impl RetryObserver for NoOpObserver {
    fn on_attempt_start(&self, _attempt: u32, _max_attempts: Option<u32>) {}

    fn on_waiting(&self, _attempt: u32, _message: &str, _delay: Duration) {}

    fn on_success(&self, _attempt: u32, _total_duration: Duration) {}

    fn on_exhausted(&self, _attempts: u32, _last_error: Option<&dyn Display>) {}
}

/// An observer that logs retry events using the `tracing` crate
///
/// # Log Levels
///
/// - `on_attempt_start`: TRACE
/// - `on_attempt_failed`: WARN
/// - `on_waiting`: INFO
/// - `on_success`: INFO (if > 1 attempt) or DEBUG (first attempt)
/// - `on_exhausted`, `on_timeout`, `on_early_exit`: ERROR
/// - `on_cancelled`: WARN
#[derive(Debug, Clone)]
pub struct TracingObserver {
    /// Name of the workflow being polled (for log context)
    operation: String,
}

impl TracingObserver {
    /// Create a new tracing observer
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
        }
    }

    /// Get the operation name
    pub fn operation(&self) -> &str {
        &self.operation
    }
}

impl Default for TracingObserver {
    fn default() -> Self {
        Self::new("retry")
    }
}

impl RetryObserver for TracingObserver {
    fn on_attempt_start(&self, attempt: u32, max_attempts: Option<u32>) {
        tracing::trace!(
            operation = %self.operation,
            attempt = attempt,
            max_attempts = ?max_attempts,
            "starting attempt"
        );
    }

    fn on_attempt_failed(&self, attempt: u32, error: &dyn Display) {
        tracing::warn!(
            operation = %self.operation,
            attempt = attempt,
            error = %error,
            "attempt failed, will retry"
        );
    }

    fn on_waiting(&self, attempt: u32, message: &str, delay: Duration) {
        tracing::info!(
            operation = %self.operation,
            attempt = attempt,
            delay_ms = delay.as_millis() as u64,
            "{}",
            message
        );
    }

    fn on_success(&self, attempt: u32, total_duration: Duration) {
        if attempt > 1 {
            tracing::info!(
                operation = %self.operation,
                attempt = attempt,
                total_duration_ms = total_duration.as_millis() as u64,
                "finished after polling"
            );
        } else {
            tracing::debug!(
                operation = %self.operation,
                duration_ms = total_duration.as_millis() as u64,
                "finished on first attempt"
            );
        }
    }

    fn on_exhausted(&self, attempts: u32, last_error: Option<&dyn Display>) {
        match last_error {
            Some(err) => tracing::error!(
                operation = %self.operation,
                attempts = attempts,
                error = %err,
                "all retry attempts exhausted"
            ),
            None => tracing::error!(
                operation = %self.operation,
                attempts = attempts,
                "all retry attempts exhausted"
            ),
        }
    }

    fn on_timeout(&self, attempts: u32, elapsed: Duration) {
        tracing::error!(
            operation = %self.operation,
            attempts = attempts,
            elapsed_ms = elapsed.as_millis() as u64,
            "timed out"
        );
    }

    fn on_cancelled(&self, attempts: u32) {
        tracing::warn!(
            operation = %self.operation,
            attempts = attempts,
            "cancelled"
        );
    }

    fn on_early_exit(&self, attempt: u32, error: &dyn Display) {
        tracing::error!(
            operation = %self.operation,
            attempt = attempt,
            error = %error,
            "stopped on error"
        );
    }
}

/// An observer that counts retry events
///
/// Useful for testing and metrics collection.
#[derive(Debug, Default)]
pub struct StatsObserver {
    pub attempt_starts: AtomicU32,
    pub failures: AtomicU32,
    pub waits: AtomicU32,
    pub successes: AtomicU32,
    pub exhaustions: AtomicU32,
    pub timeouts: AtomicU32,
    pub cancellations: AtomicU32,
    pub early_exits: AtomicU32,
}

impl StatsObserver {
    /// Create a new stats observer
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attempt_starts(&self) -> u32 {
        self.attempt_starts.load(Ordering::SeqCst)
    }

    pub fn failures(&self) -> u32 {
        self.failures.load(Ordering::SeqCst)
    }

    pub fn waits(&self) -> u32 {
        self.waits.load(Ordering::SeqCst)
    }

    pub fn successes(&self) -> u32 {
        self.successes.load(Ordering::SeqCst)
    }

    pub fn exhaustions(&self) -> u32 {
        self.exhaustions.load(Ordering::SeqCst)
    }

    pub fn timeouts(&self) -> u32 {
        self.timeouts.load(Ordering::SeqCst)
    }

    pub fn cancellations(&self) -> u32 {
        self.cancellations.load(Ordering::SeqCst)
    }

    pub fn early_exits(&self) -> u32 {
        self.early_exits.load(Ordering::SeqCst)
    }
}

impl RetryObserver for StatsObserver {
    fn on_attempt_start(&self, _attempt: u32, _max_attempts: Option<u32>) {
        self.attempt_starts.fetch_add(1, Ordering::SeqCst);
    }

    fn on_attempt_failed(&self, _attempt: u32, _error: &dyn Display) {
        self.failures.fetch_add(1, Ordering::SeqCst);
    }

    fn on_waiting(&self, _attempt: u32, _message: &str, _delay: Duration) {
        self.waits.fetch_add(1, Ordering::SeqCst);
    }

    fn on_success(&self, _attempt: u32, _total_duration: Duration) {
        self.successes.fetch_add(1, Ordering::SeqCst);
    }

    fn on_exhausted(&self, _attempts: u32, _last_error: Option<&dyn Display>) {
        self.exhaustions.fetch_add(1, Ordering::SeqCst);
    }

    fn on_timeout(&self, _attempts: u32, _elapsed: Duration) {
        self.timeouts.fetch_add(1, Ordering::SeqCst);
    }

    fn on_cancelled(&self, _attempts: u32) {
        self.cancellations.fetch_add(1, Ordering::SeqCst);
    }

    fn on_early_exit(&self, _attempt: u32, _error: &dyn Display) {
        self.early_exits.fetch_add(1, Ordering::SeqCst);
    }
}

/// Implement RetryObserver for Arc<T> where T: RetryObserver
impl<T: RetryObserver + ?Sized> RetryObserver for std::sync::Arc<T> {
    fn on_attempt_start(&self, attempt: u32, max_attempts: Option<u32>) {
        (**self).on_attempt_start(attempt, max_attempts)
    }

    fn on_attempt_failed(&self, attempt: u32, error: &dyn Display) {
        (**self).on_attempt_failed(attempt, error)
    }

    fn on_waiting(&self, attempt: u32, message: &str, delay: Duration) {
        (**self).on_waiting(attempt, message, delay)
    }

    fn on_success(&self, attempt: u32, total_duration: Duration) {
        (**self).on_success(attempt, total_duration)
    }

    fn on_exhausted(&self, attempts: u32, last_error: Option<&dyn Display>) {
        (**self).on_exhausted(attempts, last_error)
    }

    fn on_timeout(&self, attempts: u32, elapsed: Duration) {
        (**self).on_timeout(attempts, elapsed)
    }

    fn on_cancelled(&self, attempts: u32) {
        (**self).on_cancelled(attempts)
    }

    fn on_early_exit(&self, attempt: u32, error: &dyn Display) {
        (**self).on_early_exit(attempt, error)
    }
}

/// Implement RetryObserver for Box<T> where T: RetryObserver
impl<T: RetryObserver + ?Sized> RetryObserver for Box<T> {
    fn on_attempt_start(&self, attempt: u32, max_attempts: Option<u32>) {
        (**self).on_attempt_start(attempt, max_attempts)
    }

    fn on_attempt_failed(&self, attempt: u32, error: &dyn Display) {
        (**self).on_attempt_failed(attempt, error)
    }

    fn on_waiting(&self, attempt: u32, message: &str, delay: Duration) {
        (**self).on_waiting(attempt, message, delay)
    }

    fn on_success(&self, attempt: u32, total_duration: Duration) {
        (**self).on_success(attempt, total_duration)
    }

    fn on_exhausted(&self, attempts: u32, last_error: Option<&dyn Display>) {
        (**self).on_exhausted(attempts, last_error)
    }

    fn on_timeout(&self, attempts: u32, elapsed: Duration) {
        (**self).on_timeout(attempts, elapsed)
    }

    fn on_cancelled(&self, attempts: u32) {
        (**self).on_cancelled(attempts)
    }

    fn on_early_exit(&self, attempt: u32, error: &dyn Display) {
        (**self).on_early_exit(attempt, error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noop_observer() {
        let observer = NoOpObserver;
        let error = "boom";

        observer.on_attempt_start(1, Some(3));
        observer.on_attempt_failed(1, &error);
        observer.on_waiting(1, "waiting", Duration::from_millis(100));
        observer.on_success(2, Duration::from_millis(500));
        observer.on_exhausted(3, Some(&error as &dyn Display));
        observer.on_timeout(3, Duration::from_secs(1));
        observer.on_cancelled(2);
        observer.on_early_exit(1, &error);
    }

    #[test]
    fn test_stats_observer() {
        let observer = StatsObserver::new();
        let error = "boom";

        observer.on_attempt_start(1, None);
        observer.on_attempt_failed(1, &error);
        observer.on_waiting(1, "waiting", Duration::from_millis(100));
        observer.on_attempt_start(2, None);
        observer.on_success(2, Duration::from_millis(500));

        assert_eq!(observer.attempt_starts(), 2);
        assert_eq!(observer.failures(), 1);
        assert_eq!(observer.waits(), 1);
        assert_eq!(observer.successes(), 1);
        assert_eq!(observer.exhaustions(), 0);
        assert_eq!(observer.timeouts(), 0);
    }

    #[test]
    fn test_tracing_observer_creation() {
        let observer = TracingObserver::new("device-onboarding");
        assert_eq!(observer.operation(), "device-onboarding");

        let default_observer = TracingObserver::default();
        assert_eq!(default_observer.operation(), "retry");
    }

    #[test]
    fn test_arc_observer() {
        let observer = std::sync::Arc::new(StatsObserver::new());

        observer.on_attempt_start(1, Some(3));
        observer.on_cancelled(1);

        assert_eq!(observer.attempt_starts(), 1);
        assert_eq!(observer.cancellations(), 1);
    }
}
