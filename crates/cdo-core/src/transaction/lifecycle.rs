//! Client-side view of a transaction's lifecycle

use std::fmt;

use super::types::TransactionStatus;

/// Where a tracked transaction is, as seen by this client
///
/// A triggered transaction always moves to `Polling` first, whatever the
/// event. `Done`, `Error` and `TimedOut` are absorbing: once reached, no event
/// moves the lifecycle again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionLifecycle {
    Triggered,
    Polling,
    Done,
    Error,
    TimedOut,
}

/// Something the tracker learned about a transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// A snapshot arrived with this status
    Observed(TransactionStatus),
    /// The polling loop hit its retry limit or deadline, or was cancelled
    GaveUp,
}

impl TransactionLifecycle {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TransactionLifecycle::Done | TransactionLifecycle::Error | TransactionLifecycle::TimedOut
        )
    }

    /// Next lifecycle position after `event`
    pub fn advance(self, event: &LifecycleEvent) -> Self {
        match self {
            TransactionLifecycle::Triggered => return TransactionLifecycle::Polling,
            state if state.is_terminal() => return state,
            _ => {}
        }

        match event {
            LifecycleEvent::Observed(TransactionStatus::Done) => TransactionLifecycle::Done,
            LifecycleEvent::Observed(TransactionStatus::Error) => TransactionLifecycle::Error,
            LifecycleEvent::Observed(_) => TransactionLifecycle::Polling,
            LifecycleEvent::GaveUp => TransactionLifecycle::TimedOut,
        }
    }
}

impl fmt::Display for TransactionLifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TransactionLifecycle::Triggered => "triggered",
            TransactionLifecycle::Polling => "polling",
            TransactionLifecycle::Done => "done",
            TransactionLifecycle::Error => "error",
            TransactionLifecycle::TimedOut => "timed-out",
        };
        f.write_str(name)
    }
}
