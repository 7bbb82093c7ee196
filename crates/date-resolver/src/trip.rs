//! Departure/return date pairing for trip slots.
//!
//! Both expressions are resolved against the same reference instant. A
//! return date earlier than the departure is rejected so the caller can
//! re-prompt; a same-day return is allowed.

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use thiserror::Error;

use crate::resolver::DateResolver;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TripError {
    #[error("Cannot resolve departure date: '{0}'")]
    DepartureUnparseable(String),

    #[error("Cannot resolve return date: '{0}'")]
    ReturnUnparseable(String),

    #[error("Return date {return_date} is before departure date {departure}")]
    ReturnBeforeDeparture {
        departure: NaiveDate,
        return_date: NaiveDate,
    },
}

/// A resolved departure date and optional return date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TripDates {
    pub departure: NaiveDate,
    pub return_date: Option<NaiveDate>,
}

impl TripDates {
    /// Nights between departure and return; `None` for a one-way trip.
    pub fn nights(&self) -> Option<i64> {
        self.return_date
            .map(|r| r.signed_duration_since(self.departure).num_days())
    }
}

impl DateResolver {
    /// Resolve a departure expression and an optional return expression.
    ///
    /// # Errors
    ///
    /// [`TripError::DepartureUnparseable`] / [`TripError::ReturnUnparseable`]
    /// when either side cannot be resolved, and
    /// [`TripError::ReturnBeforeDeparture`] when the return precedes the
    /// departure.
    pub fn resolve_trip(
        &self,
        departure: &str,
        return_expr: Option<&str>,
        reference: NaiveDateTime,
    ) -> Result<TripDates, TripError> {
        let departure_date = self
            .resolve(departure, reference)
            .ok_or_else(|| TripError::DepartureUnparseable(departure.to_string()))?;

        let return_date = match return_expr {
            Some(expr) => Some(
                self.resolve(expr, reference)
                    .ok_or_else(|| TripError::ReturnUnparseable(expr.to_string()))?,
            ),
            None => None,
        };

        if let Some(return_date) = return_date {
            if return_date < departure_date {
                return Err(TripError::ReturnBeforeDeparture {
                    departure: departure_date,
                    return_date,
                });
            }
        }

        Ok(TripDates {
            departure: departure_date,
            return_date,
        })
    }
}

/// Resolve a trip with default options. See [`DateResolver::resolve_trip`].
pub fn resolve_trip(
    departure: &str,
    return_expr: Option<&str>,
    reference: NaiveDateTime,
) -> Result<TripDates, TripError> {
    DateResolver::default().resolve_trip(departure, return_expr, reference)
}
