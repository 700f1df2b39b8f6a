//! Bridge from the declarative model to the `good_lp` solver stack.
//!
//! The model is kept declarative until solve time; this module rebuilds it
//! as a `good_lp` problem on every call, which is what makes repeated
//! solving (debug-infeasibility mode) possible.

use good_lp::{constraint, default_solver, variable, variables, Expression, ResolutionError};
use good_lp::{Solution as _, SolverModel};

use super::expr::{CmpSense, LinExpr};
use super::{LpModel, SolveStatus, VarKind};

/// Solves the model with the default backend (microlp, pure Rust MILP).
///
/// Returns per-variable values indexed like the model's variables, or the
/// terminal solver status on failure. Solver unavailability or internal
/// errors surface as [`SolveStatus::NotSolved`], never a panic.
pub(super) fn solve(model: &LpModel, objective: Option<&LinExpr>) -> Result<Vec<f64>, SolveStatus> {
    let mut problem_vars = variables!();
    let mut solver_vars = Vec::with_capacity(model.vars.len());
    for def in &model.vars {
        let mut var = match def.kind {
            VarKind::Binary => variable().binary(),
            VarKind::Integer => variable().integer(),
            VarKind::Continuous => variable(),
        };
        if let Some(lo) = def.lower {
            var = var.min(lo);
        }
        if let Some(hi) = def.upper {
            var = var.max(hi);
        }
        solver_vars.push(problem_vars.add(var));
    }

    let to_expression = |expr: &LinExpr| {
        expr.terms
            .iter()
            .fold(Expression::from(expr.constant), |acc, (var, coeff)| {
                acc + *coeff * solver_vars[var.0]
            })
    };

    let objective_expr = objective
        .map(&to_expression)
        .unwrap_or_else(|| Expression::from(0.0));

    let mut problem = problem_vars.minimise(objective_expr).using(default_solver);
    for lin in &model.constraints {
        let lhs = to_expression(&lin.expr);
        let constraint = match lin.sense {
            CmpSense::Leq => constraint!(lhs <= 0.0),
            CmpSense::Geq => constraint!(lhs >= 0.0),
            CmpSense::Eq => constraint!(lhs == 0.0),
        };
        problem = problem.with(constraint);
    }

    match problem.solve() {
        Ok(solution) => Ok(solver_vars
            .iter()
            .map(|var| solution.value(*var))
            .collect()),
        Err(ResolutionError::Infeasible) => Err(SolveStatus::Infeasible),
        Err(ResolutionError::Unbounded) => Err(SolveStatus::Unbounded),
        Err(_) => Err(SolveStatus::NotSolved),
    }
}
