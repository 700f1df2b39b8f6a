//! Scheduling domain models.
//!
//! Core data types for call scheduling: the roster ([`Resident`]), the
//! scheduling period ([`Horizon`]) with its weekday arithmetic, and the
//! complete optimizer configuration ([`Project`]).

mod calendar;
mod project;
mod resident;

pub use calendar::{days_until_weekday, Horizon};
pub use project::{BuddyPeriod, Project};
pub use resident::{Availability, Resident};
