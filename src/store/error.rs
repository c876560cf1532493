//! Typed errors for the record store. Validation and missing-id failures are
//! recoverable and surfaced to the caller for correction; storage failures are
//! reported upward without retries.

use std::io;

use thiserror::Error;

use super::checkin::CheckinId;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("duration must be a positive number of hours, got {0}")]
    NonPositiveDuration(f64),

    #[error("duration is not a number: {0:?}")]
    NonNumericDuration(String),

    #[error("tag must not be empty")]
    EmptyTag,

    #[error("activities must not be empty")]
    EmptyActivities,

    #[error("malformed date: {0:?}")]
    MalformedDate(String),

    #[error("malformed time of day: {0:?}")]
    MalformedTime(String),
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("no check-in with id {0}")]
    NotFound(CheckinId),

    #[error("storage failure: {0}")]
    Storage(#[from] io::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;
