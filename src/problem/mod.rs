//! Call-problem construction and solving.
//!
//! [`CallProblem`] owns one binary on-call variable per (day, resident)
//! pair plus the structural constraints every schedule must satisfy:
//! daily coverage (single or buddy staffing), no back-to-back calls, and
//! near-even workload distribution within and across training years.
//! Constraint and objective rules from [`crate::rules`] attach to the
//! variables it exposes.
//!
//! Interval ("Qn") indicator variables are derived on demand and memoized
//! per spacing; see [`CallProblem::qn_vars`] for the encoding.

use std::collections::{BTreeMap, HashMap};

use log::{debug, info, warn};

use crate::error::ScheduleError;
use crate::lp::{lin_sum, LinExpr, LpModel, VarId};
use crate::models::{Horizon, Project, Resident};
use crate::rules::{ConstraintRule, ObjectiveRule};
use crate::solution::{key_for_day, Solution};
use crate::validation::validate_roster;

/// Training year staffing the junior slot during a buddy period.
const BUDDY_JUNIOR_PGY: u32 = 2;
/// Training years eligible for the senior slot during a buddy period.
const BUDDY_SENIOR_PGYS: [u32; 2] = [3, 4];

/// Slack upper bound for interval indicators. Must lie strictly between
/// 0.5 and 1.0 or the indicator semantics break (§ [`CallProblem::qn_vars`]).
const QN_SLACK_UPPER: f64 = 0.9;

/// A call-scheduling MILP under construction.
pub struct CallProblem {
    model: LpModel,
    horizon: Horizon,
    residents: Vec<Resident>,
    day_vars: HashMap<String, Vec<VarId>>,
    qn_cache: HashMap<usize, BTreeMap<String, Vec<VarId>>>,
    va_vars: Option<Vec<VarId>>,
    max_calls_by_year: BTreeMap<u32, VarId>,
    min_calls_by_year: BTreeMap<u32, VarId>,
}

impl CallProblem {
    /// Builds the variable model and structural constraints for a project.
    pub fn build(project: &Project) -> Result<Self, ScheduleError> {
        Self::build_impl(project, false)
    }

    /// Like [`build`](Self::build), but with debug-infeasibility mode on:
    /// every constraint addition re-solves the model, so an infeasible
    /// combination is pinpointed at the exact constraint. Diagnosis only.
    pub fn build_debug(project: &Project) -> Result<Self, ScheduleError> {
        Self::build_impl(project, true)
    }

    fn build_impl(project: &Project, debug_infeasibility: bool) -> Result<Self, ScheduleError> {
        let horizon = project.horizon()?;
        let num_days = horizon.num_days();
        validate_roster(&project.residents, &horizon).map_err(ScheduleError::Invalid)?;

        let mut model = LpModel::new("callsched");
        if debug_infeasibility {
            model = model.with_debug_infeasibility();
        }
        if let Some(seed) = project.seed {
            model = model.with_seed(seed);
        }

        // One binary on-call variable per (day, resident).
        let mut day_vars: HashMap<String, Vec<VarId>> = HashMap::new();
        for resident in &project.residents {
            let mut vars = Vec::with_capacity(num_days);
            for day in 0..num_days {
                vars.push(model.new_binary(key_for_day(day, &resident.name))?);
            }
            day_vars.insert(resident.name.clone(), vars);
        }
        debug!(
            "created {} on-call variables for {} residents over {num_days} days",
            model.num_vars(),
            project.residents.len()
        );

        // Near-even workload within each training year: max - min <= 1.
        let mut calls_by_year: BTreeMap<u32, Vec<LinExpr>> = BTreeMap::new();
        for resident in &project.residents {
            let total = lin_sum(day_vars[&resident.name].iter().copied());
            calls_by_year.entry(resident.pgy).or_default().push(total);
        }
        let mut max_calls_by_year = BTreeMap::new();
        let mut min_calls_by_year = BTreeMap::new();
        for (year, totals) in &calls_by_year {
            let upper = model.max_of(totals, num_days as f64, &format!("max_calls_pgy{year}"))?;
            let lower = model.min_of(totals, num_days as f64, &format!("min_calls_pgy{year}"))?;
            model.add_constraint((LinExpr::from(upper) - lower).leq(1.0))?;
            max_calls_by_year.insert(*year, upper);
            min_calls_by_year.insert(*year, lower);
        }

        // The junior and senior tiers must both exist, and their workloads
        // must stay within the configured gap.
        let max_pgy2 = *max_calls_by_year
            .get(&2)
            .ok_or(ScheduleError::MissingTrainingYear(2))?;
        let min_pgy3 = *min_calls_by_year
            .get(&3)
            .ok_or(ScheduleError::MissingTrainingYear(3))?;
        model.add_constraint(
            (LinExpr::from(max_pgy2) - min_pgy3).leq(project.pgy_2_3_gap as f64),
        )?;

        let mut problem = Self {
            model,
            horizon,
            residents: project.residents.clone(),
            day_vars,
            qn_cache: HashMap::new(),
            va_vars: None,
            max_calls_by_year,
            min_calls_by_year,
        };

        // Daily coverage, buddy-aware.
        if let Some(buddy) = &project.buddy_period {
            let buddy_start = problem
                .horizon
                .day_of(buddy.start_date)
                .ok_or_else(|| out_of_range_err(buddy))?;
            let buddy_end = problem
                .horizon
                .day_of(buddy.end_date)
                .ok_or_else(|| out_of_range_err(buddy))?;
            if buddy_end < buddy_start {
                return Err(out_of_range_err(buddy));
            }
            problem.require_single_coverage(0..buddy_start)?;
            for day in buddy_start..=buddy_end {
                problem.require_buddy_coverage(day)?;
            }
            problem.require_single_coverage(buddy_end + 1..num_days)?;
        } else {
            problem.require_single_coverage(0..num_days)?;
        }

        // No resident works two days in a row.
        for resident in &problem.residents {
            let vars = &problem.day_vars[&resident.name];
            for pair in vars.windows(2) {
                problem
                    .model
                    .add_constraint((LinExpr::from(pair[0]) + pair[1]).leq(1.0))?;
            }
        }

        debug!(
            "structural model ready: {} variables, {} constraints",
            problem.model.num_vars(),
            problem.model.num_constraints()
        );
        Ok(problem)
    }

    /// Exactly one resident on call for each day in `days`.
    fn require_single_coverage(
        &mut self,
        days: std::ops::Range<usize>,
    ) -> Result<(), ScheduleError> {
        for day in days {
            let everyone: Vec<VarId> = self
                .residents
                .iter()
                .map(|r| self.day_vars[&r.name][day])
                .collect();
            self.model.add_constraint(lin_sum(everyone).eq(1.0))?;
        }
        Ok(())
    }

    /// Buddy staffing for one day: exactly one junior, exactly one senior,
    /// and every other training year forced off.
    fn require_buddy_coverage(&mut self, day: usize) -> Result<(), ScheduleError> {
        let mut by_year: BTreeMap<u32, Vec<VarId>> = BTreeMap::new();
        for resident in &self.residents {
            by_year
                .entry(resident.pgy)
                .or_default()
                .push(self.day_vars[&resident.name][day]);
        }

        let juniors = by_year.remove(&BUDDY_JUNIOR_PGY).unwrap_or_default();
        if juniors.is_empty() {
            return Err(ScheduleError::MissingTrainingYear(BUDDY_JUNIOR_PGY));
        }
        self.model.add_constraint(lin_sum(juniors).eq(1.0))?;

        let seniors: Vec<VarId> = BUDDY_SENIOR_PGYS
            .iter()
            .flat_map(|year| by_year.remove(year).unwrap_or_default())
            .collect();
        if seniors.is_empty() {
            return Err(ScheduleError::MissingTrainingYear(BUDDY_SENIOR_PGYS[0]));
        }
        self.model.add_constraint(lin_sum(seniors).eq(1.0))?;

        let others: Vec<VarId> = by_year.into_values().flatten().collect();
        if !others.is_empty() {
            self.model.add_constraint(lin_sum(others).eq(0.0))?;
        }
        Ok(())
    }

    /// The scheduling horizon.
    pub fn horizon(&self) -> &Horizon {
        &self.horizon
    }

    /// The roster, in construction order.
    pub fn residents(&self) -> &[Resident] {
        &self.residents
    }

    /// Number of days in the horizon.
    pub fn num_days(&self) -> usize {
        self.horizon.num_days()
    }

    /// Number of residents.
    pub fn num_residents(&self) -> usize {
        self.residents.len()
    }

    /// A resident by name.
    pub fn resident(&self, name: &str) -> Result<&Resident, ScheduleError> {
        self.residents
            .iter()
            .find(|r| r.name == name)
            .ok_or_else(|| ScheduleError::UnknownResident(name.to_string()))
    }

    /// A resident's on-call variables, one per day.
    pub fn resident_day_vars(&self, name: &str) -> Result<&[VarId], ScheduleError> {
        self.day_vars
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| ScheduleError::UnknownResident(name.to_string()))
    }

    /// A resident's on-call variables restricted to one weekday.
    pub fn weekday_vars(
        &self,
        name: &str,
        weekday: chrono::Weekday,
    ) -> Result<Vec<VarId>, ScheduleError> {
        let vars = self.resident_day_vars(name)?;
        Ok(self.horizon.weekday_days(weekday).map(|d| vars[d]).collect())
    }

    /// On-call variables for days carrying a VA flag, cached after the
    /// first request.
    pub fn va_vars(&mut self) -> Vec<VarId> {
        if let Some(cached) = &self.va_vars {
            return cached.clone();
        }
        let mut vars = Vec::new();
        for resident in &self.residents {
            let day_vars = &self.day_vars[&resident.name];
            for (day, var) in day_vars.iter().enumerate() {
                if resident.va[day] {
                    vars.push(*var);
                }
            }
        }
        self.va_vars = Some(vars.clone());
        vars
    }

    /// The workload-maximum variable for a training year.
    pub fn max_calls_for_year(&self, pgy: u32) -> Option<VarId> {
        self.max_calls_by_year.get(&pgy).copied()
    }

    /// The workload-minimum variable for a training year.
    pub fn min_calls_for_year(&self, pgy: u32) -> Option<VarId> {
        self.min_calls_by_year.get(&pgy).copied()
    }

    /// Interval-repeat ("Qn") indicator variables, memoized per spacing.
    ///
    /// For each resident and each start day `i` with `i + n` in-horizon,
    /// a binary `q` and a continuous slack `s ∈ [0, 0.9]` satisfy
    /// `0.5·x_i + 0.5·x_{i+n} = q + s`. Both inputs on → LHS 1 → `q = 1`;
    /// one on → LHS 0.5 absorbed by the slack → `q = 0`; none → `q = 0`.
    /// The slack bound must stay strictly between 0.5 and 1.0 for this to
    /// hold. Result maps resident name → indicators ordered by start day.
    pub fn qn_vars(
        &mut self,
        n: usize,
    ) -> Result<BTreeMap<String, Vec<VarId>>, ScheduleError> {
        if n < 2 {
            return Err(ScheduleError::InvalidSpacing(n));
        }
        if let Some(cached) = self.qn_cache.get(&n) {
            return Ok(cached.clone());
        }

        let num_days = self.horizon.num_days();
        let mut result: BTreeMap<String, Vec<VarId>> = BTreeMap::new();
        for resident in self.residents.clone() {
            let day_vars = self.day_vars[&resident.name].clone();
            let mut indicators = Vec::new();
            for i in 0..num_days.saturating_sub(n) {
                let q = self.model.new_binary(format!("q{n}_{}_{i}", resident.name))?;
                let slack = self.model.new_continuous(
                    format!("q{n}_{}_{i}_cont", resident.name),
                    Some(0.0),
                    Some(QN_SLACK_UPPER),
                )?;
                self.model.add_constraint(
                    (0.5 * day_vars[i] + 0.5 * day_vars[i + n])
                        .eq(LinExpr::from(q) + slack),
                )?;
                indicators.push(q);
            }
            result.insert(resident.name.clone(), indicators);
        }
        self.qn_cache.insert(n, result.clone());
        Ok(result)
    }

    /// The underlying linear model.
    pub fn model(&self) -> &LpModel {
        &self.model
    }

    /// Mutable access for rules that add variables and constraints.
    pub fn model_mut(&mut self) -> &mut LpModel {
        &mut self.model
    }

    /// Applies a list of constraint rules.
    pub fn apply_constraints(&mut self, rules: &[ConstraintRule]) -> Result<(), ScheduleError> {
        for rule in rules {
            rule.apply(self)?;
        }
        Ok(())
    }

    /// Combines the objectives lexicographically (first has priority) and
    /// installs the result as the model objective.
    pub fn set_objectives(&mut self, objectives: &[ObjectiveRule]) -> Result<(), ScheduleError> {
        let combined = crate::rules::combine_objectives(self, objectives)?;
        self.model.set_objective(combined);
        Ok(())
    }

    /// Solves the model and decodes the result.
    ///
    /// A non-optimal solver outcome surfaces as
    /// [`LpError::Unsolved`](crate::error::LpError::Unsolved); use
    /// [`diagnose_availability`] to hint at the cause of infeasibility.
    pub fn solve(&self) -> Result<Solution, ScheduleError> {
        let lp_solution = self.model.solve()?;
        info!(
            "schedule found with objective {}",
            lp_solution.objective_value()
        );
        Ok(Solution::new(
            lp_solution.objective_value(),
            lp_solution.into_named_values(),
            self.horizon,
            self.residents.clone(),
        ))
    }
}

fn out_of_range_err(buddy: &crate::models::BuddyPeriod) -> ScheduleError {
    ScheduleError::InvalidBuddyPeriod {
        start: buddy.start_date,
        end: buddy.end_date,
    }
}

/// Last-resort diagnostic for an infeasible project: re-solve with the
/// availability rule relaxed and only the availability objective active,
/// then report every day where the relaxed schedule contradicts a
/// resident's stated availability.
///
/// Secondary objectives are deliberately left out; they would not change
/// the hint but make finding it significantly slower.
pub fn diagnose_availability(
    project: &Project,
) -> Result<BTreeMap<usize, Vec<String>>, ScheduleError> {
    warn!("running availability diagnostic for an unsolvable project");
    let relaxed: Vec<ConstraintRule> = project
        .constraints
        .iter()
        .filter(|rule| !matches!(rule, ConstraintRule::Availability))
        .cloned()
        .collect();
    let mut problem = CallProblem::build(project)?;
    problem.apply_constraints(&relaxed)?;
    problem.set_objectives(&[ObjectiveRule::Availability])?;
    let solution = problem.solve()?;
    solution.availability_violations()
}
