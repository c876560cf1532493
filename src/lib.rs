//! Local-first tracker for personal check-ins: tagged activities with a
//! start time, duration, and record date. The collection persists on disk,
//! and every view over it (paginated listing, daily text log, per-tag
//! statistics, tag autocompletion) is a live query that recomputes itself
//! whenever the data mutates.
//!

pub mod cli;
pub mod gateway;
pub mod notify;
pub mod query;
pub mod store;
pub mod utils;
pub mod views;
