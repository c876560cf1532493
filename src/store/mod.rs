//! Storage is organized through [collection::CheckinCollection].
//! The basic idea is:
//!  - Check-ins live in an in-memory keyed map guarded by an async lock.
//!  - Every mutation is validated, written durably through [persist::CheckinStorage],
//!    and only then announced to subscribers as a change event.
//!  - Readers only ever see fully applied states.

pub mod checkin;
pub mod collection;
pub mod error;
pub mod persist;
