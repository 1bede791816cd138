//! Scheduled background maintenance
//!
//! A thin wrapper around `tokio-cron-scheduler` that runs the registry's
//! recurring jobs — most importantly the daily soft update of the search
//! index, which keeps time-decayed relevance scores current.

mod config;
mod core;
mod error;
pub mod tasks;

pub use config::SchedulerConfig;
pub use core::SchedulerService;
pub use error::{SchedulerError, SchedulerResult};
