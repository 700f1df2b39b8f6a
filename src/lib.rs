#![feature(int_roundings)]
//! Resident on-call schedule optimization.
//!
//! Models a medical-residency call schedule as a mixed-integer linear
//! program: one binary variable per (day, resident), structural
//! constraints for coverage and rest, a configurable catalog of hard
//! rules, and lexicographically combined minimization objectives.
//!
//! # Modules
//!
//! - **`models`**: Domain types — `Resident`, `Horizon`, `BuddyPeriod`,
//!   `Project`
//! - **`validation`**: Roster integrity checks (duplicates, lengths,
//!   uncoverable days)
//! - **`problem`**: `CallProblem` variable model, Qn indicators, solving,
//!   and the availability diagnostic
//! - **`rules`**: Serializable `ConstraintRule` / `ObjectiveRule` catalogs
//! - **`solution`**: Decoded schedules and derived statistics
//! - **`lp`**: The declarative linear-model layer over the MILP backend
//!
//! # Example
//!
//! ```no_run
//! use callsched::models::{Project, Resident};
//! use callsched::problem::CallProblem;
//! use callsched::rules::{ConstraintRule, ObjectiveRule};
//! use chrono::NaiveDate;
//!
//! # fn main() -> Result<(), callsched::error::ScheduleError> {
//! let start = NaiveDate::from_ymd_opt(2025, 6, 2).unwrap();
//! let end = NaiveDate::from_ymd_opt(2025, 6, 29).unwrap();
//! let project = Project::new(
//!     start,
//!     end,
//!     vec![
//!         Resident::new("Andrew", 2, 28),
//!         Resident::new("Jess", 2, 28),
//!         Resident::new("Paris", 3, 28),
//!     ],
//! )
//! .with_constraint(ConstraintRule::Availability)
//! .with_constraint(ConstraintRule::DistributeWeekends)
//! .with_objective(ObjectiveRule::Q2s { n: 2 });
//!
//! let mut problem = CallProblem::build(&project)?;
//! problem.apply_constraints(&project.constraints)?;
//! problem.set_objectives(&project.objectives)?;
//! let solution = problem.solve()?;
//! for (day, names) in solution.assignments()?.iter().enumerate() {
//!     println!("day {day}: {}", names.join(", "));
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # References
//!
//! - Winston (2004), "Operations Research: Applications and Algorithms"
//! - Burke et al. (2004), "The State of the Art of Nurse Rostering"

pub mod error;
pub mod lp;
pub mod models;
pub mod problem;
pub mod rules;
pub mod solution;
pub mod validation;

pub use error::ScheduleError;
pub use models::{Horizon, Project, Resident};
pub use problem::{diagnose_availability, CallProblem};
pub use rules::{ConstraintRule, ObjectiveRule};
pub use solution::Solution;
