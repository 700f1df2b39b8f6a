//! Crate-wide error taxonomy.
//!
//! Three failure families, kept deliberately distinct:
//!
//! 1. Construction-time errors (bad horizon, buddy period out of range,
//!    missing training year, duplicate variable names) abort model building
//!    and are never retried.
//! 2. Solver-reported outcomes (infeasible, unbounded) travel as a
//!    [`SolveStatus`] inside [`LpError::Unsolved`]; the caller decides how
//!    to react, typically by running the availability diagnostic.
//! 3. Decoder invariant violations (a day with no assignee, duplicate
//!    coverage claims) indicate a modeling bug and are fatal.

use chrono::NaiveDate;
use thiserror::Error;

use crate::lp::SolveStatus;
use crate::validation::ValidationError;

fn format_validation_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Errors from the linear-model layer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LpError {
    /// A variable name was registered twice in one model.
    #[error("duplicate variable `{0}`")]
    DuplicateVariable(String),

    /// `solve()` was called without an objective.
    #[error("no objective function specified")]
    NoObjective,

    /// In debug-infeasibility mode, the model stopped being feasible when
    /// this constraint (by insertion index) was added.
    #[error("model became infeasible when adding constraint {index}")]
    InfeasibleConstraint { index: usize },

    /// The solver finished without an optimal solution. No variable values
    /// are available in this case.
    #[error("solver finished with status: {0}")]
    Unsolved(SolveStatus),
}

/// Errors from schedule modeling and solution decoding.
#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error(transparent)]
    Lp(#[from] LpError),

    /// The scheduling horizon contains no days.
    #[error("scheduling horizon must contain at least one day")]
    EmptyHorizon,

    /// Buddy period dates fall outside the scheduling horizon.
    #[error("buddy period {start}..={end} falls outside the scheduling horizon")]
    InvalidBuddyPeriod { start: NaiveDate, end: NaiveDate },

    /// A required training year has no residents in the roster.
    #[error("no PGY{0} residents in the roster")]
    MissingTrainingYear(u32),

    /// Lexicographic combination needs at least one objective.
    #[error("at least one objective is required")]
    NoObjectives,

    /// The combined lexicographic bound no longer fits in an i64, which
    /// would corrupt the priority ordering.
    #[error("combined objective bound overflows i64")]
    ObjectiveOverflow,

    /// A reference schedule day names more than one resident. Buddy-call
    /// reference schedules are a known unsupported format.
    #[error(
        "reference schedule for day {day} names {found} residents; \
         buddy-call references are not supported"
    )]
    UnsupportedReference { day: usize, found: usize },

    /// A reference schedule does not cover the whole horizon.
    #[error("reference schedule has {got} days, expected {expected}")]
    ReferenceLength { expected: usize, got: usize },

    /// The roster failed integrity validation; every detected issue is
    /// carried.
    #[error("invalid roster: {}", format_validation_errors(.0))]
    Invalid(Vec<ValidationError>),

    /// A rule or reference schedule names a resident not in the roster.
    #[error("unknown resident `{0}`")]
    UnknownResident(String),

    /// Weekend constraints pair each Saturday with the following Sunday and
    /// cannot handle a horizon whose first weekend day is a Sunday.
    #[error("horizons starting on a Sunday are not supported by weekend constraints")]
    SundayStartUnsupported,

    /// Interval metrics are only defined for spacings of two days or more.
    #[error("interval spacing must be at least 2, got {0}")]
    InvalidSpacing(usize),

    /// Decoded solution left a day uncovered. Impossible for an optimal
    /// solution of a well-formed model.
    #[error("no resident assigned on day {0}")]
    NoAssignee(usize),

    /// Two residents claim coverage credit for the same day.
    #[error("multiple coverage annotations for day {day}: {names:?}")]
    DuplicateCoverage { day: usize, names: Vec<String> },
}

impl ScheduleError {
    /// The solver status behind this error, if it is a solver outcome
    /// rather than a construction or decoding failure.
    pub fn solve_status(&self) -> Option<SolveStatus> {
        match self {
            ScheduleError::Lp(LpError::Unsolved(status)) => Some(*status),
            _ => None,
        }
    }
}
