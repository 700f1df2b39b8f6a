//! Linear-model boundary.
//!
//! A thin declarative layer over an external MILP solver: variable
//! creation, linear constraint registration, one minimization objective,
//! and a blocking [`LpModel::solve`]. The model stays declarative until
//! solve time, when it is handed to the backend in one piece.
//!
//! Also provides the min/max encodings ([`LpModel::max_of`],
//! [`LpModel::min_of`]) used by workload-balance and fatigue rules.
//!
//! # Reference
//! Winston (2004), "Operations Research", Ch. 9 (integer programming
//! formulations with indicator variables)

mod backend;
mod expr;

pub use expr::{lin_sum, CmpSense, LinConstraint, LinExpr, VarId};

use std::collections::{HashMap, HashSet};
use std::fmt;

use log::{debug, info};

use crate::error::LpError;

/// Decision variable type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarKind {
    /// Takes the values 0 or 1.
    Binary,
    /// Takes integer values within its bounds.
    Integer,
    /// Takes any real value within its bounds.
    Continuous,
}

/// Terminal solver outcome for an unsuccessful run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveStatus {
    Optimal,
    Infeasible,
    Unbounded,
    NotSolved,
}

impl fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SolveStatus::Optimal => "optimal",
            SolveStatus::Infeasible => "infeasible",
            SolveStatus::Unbounded => "unbounded",
            SolveStatus::NotSolved => "not solved",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone)]
struct VarDef {
    name: String,
    kind: VarKind,
    lower: Option<f64>,
    upper: Option<f64>,
}

/// An optimal solver result: the objective value plus every variable's
/// value, keyed both by index and by name.
#[derive(Debug, Clone)]
pub struct LpSolution {
    objective_value: f64,
    values: Vec<f64>,
    by_name: HashMap<String, f64>,
}

impl LpSolution {
    /// Achieved objective value.
    pub fn objective_value(&self) -> f64 {
        self.objective_value
    }

    /// Value of a variable by handle.
    pub fn value(&self, var: VarId) -> f64 {
        self.values[var.0]
    }

    /// All variable values keyed by variable name.
    pub fn named_values(&self) -> &HashMap<String, f64> {
        &self.by_name
    }

    /// Consumes the solution, returning the name-keyed value map.
    pub fn into_named_values(self) -> HashMap<String, f64> {
        self.by_name
    }
}

/// A mixed-integer linear model under construction.
///
/// Variables are uniquely named within one model; registering the same
/// name twice is a construction error. Constraints are append-only and
/// the objective is always minimized.
pub struct LpModel {
    name: String,
    vars: Vec<VarDef>,
    var_names: HashSet<String>,
    constraints: Vec<LinConstraint>,
    objective: Option<LinExpr>,
    debug_infeasibility: bool,
    seed: Option<u64>,
    tag_counter: usize,
}

impl LpModel {
    /// Creates an empty model.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            vars: Vec::new(),
            var_names: HashSet::new(),
            constraints: Vec::new(),
            objective: None,
            debug_infeasibility: false,
            seed: None,
            tag_counter: 0,
        }
    }

    /// Enables debug-infeasibility mode: every subsequent
    /// [`add_constraint`](Self::add_constraint) re-solves the model built so
    /// far and fails on the exact constraint that broke feasibility.
    ///
    /// Costs one full solve per constraint. Diagnosis only, never
    /// production solving.
    pub fn with_debug_infeasibility(mut self) -> Self {
        self.debug_infeasibility = true;
        self
    }

    /// Records a deterministic seed to forward to the solver. Backends
    /// without a seed parameter (microlp is already deterministic) record
    /// it without effect.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// The recorded solver seed, if any.
    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// Number of registered variables.
    pub fn num_vars(&self) -> usize {
        self.vars.len()
    }

    /// Number of registered constraints.
    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    /// Name of a registered variable.
    pub fn var_name(&self, var: VarId) -> &str {
        &self.vars[var.0].name
    }

    fn register(
        &mut self,
        name: String,
        kind: VarKind,
        lower: Option<f64>,
        upper: Option<f64>,
    ) -> Result<VarId, LpError> {
        if !self.var_names.insert(name.clone()) {
            return Err(LpError::DuplicateVariable(name));
        }
        let id = VarId(self.vars.len());
        self.vars.push(VarDef {
            name,
            kind,
            lower,
            upper,
        });
        Ok(id)
    }

    /// Registers a binary variable.
    pub fn new_binary(&mut self, name: impl Into<String>) -> Result<VarId, LpError> {
        self.register(name.into(), VarKind::Binary, None, None)
    }

    /// Registers a bounded integer variable.
    pub fn new_integer(
        &mut self,
        name: impl Into<String>,
        lower: Option<i64>,
        upper: Option<i64>,
    ) -> Result<VarId, LpError> {
        self.register(
            name.into(),
            VarKind::Integer,
            lower.map(|v| v as f64),
            upper.map(|v| v as f64),
        )
    }

    /// Registers a bounded continuous variable.
    pub fn new_continuous(
        &mut self,
        name: impl Into<String>,
        lower: Option<f64>,
        upper: Option<f64>,
    ) -> Result<VarId, LpError> {
        self.register(name.into(), VarKind::Continuous, lower, upper)
    }

    /// Appends a constraint.
    ///
    /// Never fails in normal operation. In debug-infeasibility mode the
    /// model is re-solved immediately and an infeasible result fails with
    /// the constraint's insertion index.
    pub fn add_constraint(&mut self, constraint: LinConstraint) -> Result<(), LpError> {
        self.constraints.push(constraint);
        if self.debug_infeasibility {
            let index = self.constraints.len() - 1;
            if backend::solve(self, None).is_err() {
                return Err(LpError::InfeasibleConstraint { index });
            }
        }
        Ok(())
    }

    /// Sets the objective to minimize, replacing any previous one.
    pub fn set_objective(&mut self, objective: LinExpr) {
        self.objective = Some(objective);
    }

    /// A fresh index for generating unique auxiliary-variable tags.
    pub fn fresh_index(&mut self) -> usize {
        let index = self.tag_counter;
        self.tag_counter += 1;
        index
    }

    /// Builds a variable constrained to equal `max(expressions)`.
    ///
    /// One selector binary per expression, exactly one selected; the
    /// selected expression's upper bound collapses onto the new variable
    /// while the others stay slack by `max_possible`.
    ///
    /// Caller contract: `max_possible` must bound every expression from
    /// above. A bound that is too small silently yields a wrong (not
    /// infeasible) result; the expression domains cannot be checked here.
    pub fn max_of(
        &mut self,
        expressions: &[LinExpr],
        max_possible: f64,
        tag: &str,
    ) -> Result<VarId, LpError> {
        debug_assert!(!expressions.is_empty(), "max_of over no expressions");
        let max_var = self.new_continuous(tag, None, None)?;
        let selectors = self.selector_vars(tag, expressions.len())?;
        for (expr, selector) in expressions.iter().zip(selectors) {
            self.add_constraint(LinExpr::from(max_var).geq(expr.clone()))?;
            // max_var <= expr + (1 - selector) * max_possible
            self.add_constraint(
                LinExpr::from(max_var)
                    .leq(expr.clone() + max_possible - max_possible * selector),
            )?;
        }
        Ok(max_var)
    }

    /// Builds a variable constrained to equal `min(expressions)`.
    ///
    /// Dual of [`max_of`](Self::max_of), with the slack sign flipped and
    /// widened to `max_possible + 1`. The same bound contract applies.
    pub fn min_of(
        &mut self,
        expressions: &[LinExpr],
        max_possible: f64,
        tag: &str,
    ) -> Result<VarId, LpError> {
        debug_assert!(!expressions.is_empty(), "min_of over no expressions");
        let min_var = self.new_continuous(tag, None, None)?;
        let selectors = self.selector_vars(tag, expressions.len())?;
        let slack = max_possible + 1.0;
        for (expr, selector) in expressions.iter().zip(selectors) {
            self.add_constraint(LinExpr::from(min_var).leq(expr.clone()))?;
            // min_var >= expr - (1 - selector) * (max_possible + 1)
            self.add_constraint(
                LinExpr::from(min_var).geq(expr.clone() - slack + slack * selector),
            )?;
        }
        Ok(min_var)
    }

    /// Binary selector variables of which exactly one is 1.
    fn selector_vars(&mut self, tag: &str, count: usize) -> Result<Vec<VarId>, LpError> {
        let mut selectors = Vec::with_capacity(count);
        for i in 0..count {
            selectors.push(self.new_binary(format!("{tag}_decision_{i}"))?);
        }
        self.add_constraint(lin_sum(selectors.iter().copied()).eq(1.0))?;
        Ok(selectors)
    }

    /// Solves the model, blocking until the backend finishes.
    ///
    /// Fails with [`LpError::NoObjective`] if no objective was set, and
    /// with [`LpError::Unsolved`] carrying the terminal status when the
    /// solver does not prove optimality; variable values are only
    /// available on success.
    pub fn solve(&self) -> Result<LpSolution, LpError> {
        let objective = self.objective.as_ref().ok_or(LpError::NoObjective)?;
        info!(
            "solving model `{}`: {} variables, {} constraints",
            self.name,
            self.vars.len(),
            self.constraints.len()
        );
        let values = backend::solve(self, Some(objective)).map_err(LpError::Unsolved)?;
        let objective_value = objective.eval(&values);
        debug!("model `{}` solved, objective {objective_value}", self.name);
        let by_name = self
            .vars
            .iter()
            .zip(&values)
            .map(|(def, value)| (def.name.clone(), *value))
            .collect();
        Ok(LpSolution {
            objective_value,
            values,
            by_name,
        })
    }
}
