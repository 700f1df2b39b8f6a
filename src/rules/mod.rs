//! Configurable scheduling rules.
//!
//! Two serializable catalogs: [`ConstraintRule`] for hard requirements
//! layered onto a [`CallProblem`](crate::problem::CallProblem), and
//! [`ObjectiveRule`] for the quantities the optimizer minimizes.
//! [`combine_objectives`] folds a priority-ordered objective list into a
//! single lexicographic expression.

mod constraint;
mod objective;

pub use constraint::ConstraintRule;
pub use objective::{
    combine_objectives, default_weariness_map, parse_reference_schedule, ObjectiveRule,
};

use crate::error::ScheduleError;
use crate::lp::VarId;
use crate::problem::CallProblem;

/// On-call variables for every (day, resident) pair where the resident is
/// marked unavailable. The availability rule pins these to zero; the
/// availability objective counts them instead.
pub(crate) fn unavailable_day_vars(
    problem: &CallProblem,
) -> Result<Vec<VarId>, ScheduleError> {
    let mut vars = Vec::new();
    for resident in problem.residents() {
        let day_vars = problem.resident_day_vars(&resident.name)?;
        for (day, var) in day_vars.iter().enumerate() {
            if !resident.is_available(day) {
                vars.push(*var);
            }
        }
    }
    Ok(vars)
}
