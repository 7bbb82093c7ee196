//! # date-resolver
//!
//! Deterministic resolution of free-text date expressions for conversational
//! booking flows.
//!
//! A user typing "next Friday", "in 2 months", "the 31st" or "9 days from
//! today" into a date slot gets a concrete calendar date back, computed
//! against a reference instant supplied by the caller. Expressions that cannot
//! be resolved come back as `None` so the caller can re-prompt.
//!
//! ## Modules
//!
//! - [`resolver`] — entry points, [`DateResolver`] and [`ResolveOptions`]
//! - [`rules`] — the ordered rule table and the [`Rule`] that fired
//! - [`trip`] — departure/return pairing with ordering check
//! - [`error`] — Error types

mod calendar;
pub mod error;
mod fuzzy;
pub mod resolver;
pub mod rules;
pub mod trip;

pub use error::ResolveError;
pub use resolver::{
    reference_in_timezone, resolve, resolve_detailed, resolve_in_timezone, resolve_iso,
    DateResolver, ResolveOptions, ResolvedDate,
};
pub use rules::Rule;
pub use trip::{resolve_trip, TripDates, TripError};
