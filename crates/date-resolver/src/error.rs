//! Error types for date-resolver operations.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("Empty expression")]
    EmptyExpression,

    #[error("Unrecognized expression: {0}")]
    Unrecognized(String),

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("No month within {months} months has day {day}")]
    NoMatchingDay { day: u32, months: u32 },

    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),
}

pub type Result<T> = std::result::Result<T, ResolveError>;
