//! # cdo-core
//!
//! Core library for the cdo client providing:
//! - Retry/poll engine with bounded, validated policies
//! - Classification of remote workflow states
//! - Transaction tracking
//! - Runtime configuration (~/.cdo/config.yaml)

pub mod api;
pub mod config;
pub mod error;
pub mod retry;
pub mod state;
pub mod transaction;
pub mod types;
pub mod workflow;

pub use api::{ApiError, Method, OnNotFound};
pub use config::HierarchicalConfigLoader;
pub use error::{Error, Result};
pub use workflow::WorkflowError;
