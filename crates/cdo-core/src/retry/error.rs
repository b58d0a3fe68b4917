//! Error types for the retry execution engine
//!
//! Each way a retry loop can end without success is a distinct variant so
//! callers branch on what happened rather than on message text.

use std::error::Error;
use std::fmt;
use std::time::Duration;

/// Errors that can end a retry loop
///
/// Generic over `E`, the error type produced by the probe.
#[derive(Debug)]
pub enum RetryError<E> {
    /// The retry limit was reached before the probe reported done
    Exhausted {
        /// Number of probe invocations made
        attempts: u32,
        /// The most recent probe error, if any attempt failed
        last_error: Option<E>,
        /// Total time spent in the loop
        total_duration: Duration,
    },

    /// The policy timeout elapsed before the probe reported done
    Timeout {
        /// Number of probe invocations made
        attempts: u32,
        /// Time spent in the loop
        elapsed: Duration,
        /// The most recent probe error, if any attempt failed
        last_error: Option<E>,
    },

    /// The caller's cancellation token fired
    Cancelled {
        /// Number of probe invocations made
        attempts: u32,
        /// The most recent probe error, if any attempt failed
        last_error: Option<E>,
    },

    /// The probe failed while the policy requested early exit
    EarlyExit {
        /// The attempt that failed (1-indexed)
        attempt: u32,
        /// The probe error
        source: E,
    },
}

impl<E: fmt::Display> fmt::Display for RetryError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetryError::Exhausted {
                attempts,
                last_error,
                total_duration,
            } => {
                write!(
                    f,
                    "retries exhausted after {} attempts over {:.2}s",
                    attempts,
                    total_duration.as_secs_f64()
                )?;
                if let Some(err) = last_error {
                    write!(f, ": {}", err)?;
                }
                Ok(())
            }
            RetryError::Timeout {
                attempts,
                elapsed,
                last_error,
            } => {
                write!(
                    f,
                    "timed out after {:.2}s and {} attempts",
                    elapsed.as_secs_f64(),
                    attempts
                )?;
                if let Some(err) = last_error {
                    write!(f, ": {}", err)?;
                }
                Ok(())
            }
            RetryError::Cancelled {
                attempts,
                last_error,
            } => {
                if let Some(err) = last_error {
                    write!(f, "cancelled after {} attempts: {}", attempts, err)
                } else {
                    write!(f, "cancelled after {} attempts", attempts)
                }
            }
            RetryError::EarlyExit { source, .. } => write!(f, "{}", source),
        }
    }
}

impl<E: Error + 'static> Error for RetryError<E> {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            RetryError::Exhausted {
                last_error: Some(err),
                ..
            }
            | RetryError::Timeout {
                last_error: Some(err),
                ..
            }
            | RetryError::Cancelled {
                last_error: Some(err),
                ..
            } => Some(err),
            RetryError::EarlyExit { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl<E> RetryError<E> {
    /// Create an exhausted error
    pub fn exhausted(attempts: u32, last_error: Option<E>, total_duration: Duration) -> Self {
        RetryError::Exhausted {
            attempts,
            last_error,
            total_duration,
        }
    }

    /// Create a timeout error
    pub fn timeout(attempts: u32, elapsed: Duration, last_error: Option<E>) -> Self {
        RetryError::Timeout {
            attempts,
            elapsed,
            last_error,
        }
    }

    /// Create a cancelled error
    pub fn cancelled(attempts: u32, last_error: Option<E>) -> Self {
        RetryError::Cancelled {
            attempts,
            last_error,
        }
    }

    /// Create an early-exit error
    pub fn early_exit(attempt: u32, source: E) -> Self {
        RetryError::EarlyExit { attempt, source }
    }

    /// Number of probe invocations made
    pub fn attempts(&self) -> u32 {
        match self {
            RetryError::Exhausted { attempts, .. }
            | RetryError::Timeout { attempts, .. }
            | RetryError::Cancelled { attempts, .. } => *attempts,
            RetryError::EarlyExit { attempt, .. } => *attempt,
        }
    }

    pub fn is_exhausted(&self) -> bool {
        matches!(self, RetryError::Exhausted { .. })
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, RetryError::Timeout { .. })
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, RetryError::Cancelled { .. })
    }

    pub fn is_early_exit(&self) -> bool {
        matches!(self, RetryError::EarlyExit { .. })
    }

    /// Get the underlying probe error, consuming this error
    pub fn into_source(self) -> Option<E> {
        match self {
            RetryError::Exhausted { last_error, .. }
            | RetryError::Timeout { last_error, .. }
            | RetryError::Cancelled { last_error, .. } => last_error,
            RetryError::EarlyExit { source, .. } => Some(source),
        }
    }

    /// Get a reference to the underlying probe error
    pub fn source_ref(&self) -> Option<&E> {
        match self {
            RetryError::Exhausted { last_error, .. }
            | RetryError::Timeout { last_error, .. }
            | RetryError::Cancelled { last_error, .. } => last_error.as_ref(),
            RetryError::EarlyExit { source, .. } => Some(source),
        }
    }

    /// Map the probe error type using a closure
    pub fn map_err<F, E2>(self, f: F) -> RetryError<E2>
    where
        F: FnOnce(E) -> E2,
    {
        match self {
            RetryError::Exhausted {
                attempts,
                last_error,
                total_duration,
            } => RetryError::Exhausted {
                attempts,
                last_error: last_error.map(f),
                total_duration,
            },
            RetryError::Timeout {
                attempts,
                elapsed,
                last_error,
            } => RetryError::Timeout {
                attempts,
                elapsed,
                last_error: last_error.map(f),
            },
            RetryError::Cancelled {
                attempts,
                last_error,
            } => RetryError::Cancelled {
                attempts,
                last_error: last_error.map(f),
            },
            RetryError::EarlyExit { attempt, source } => RetryError::EarlyExit {
                attempt,
                source: f(source),
            },
        }
    }
}
