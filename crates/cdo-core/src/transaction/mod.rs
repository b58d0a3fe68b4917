//! Server-side transactions
//!
//! A transaction is the service's handle for an asynchronous operation. The
//! triggering request returns a snapshot with a polling URL; the tracker
//! polls that URL until the status is DONE or ERROR.

mod lifecycle;
mod tracker;
mod types;

pub use lifecycle::{LifecycleEvent, TransactionLifecycle};
pub use tracker::{TransactionApi, TransactionInterpreter, TransactionTracker};
pub use types::{
    Transaction, TransactionError, TransactionRequest, TransactionStatus, TransactionType,
};
