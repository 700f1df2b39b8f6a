//! Hard constraint catalog.
//!
//! Each variant attaches constraints to an existing
//! [`CallProblem`](crate::problem::CallProblem). The serialized form is
//! adjacently tagged (`name` / `data`) so saved projects keep their rule
//! lists readable; an unrecognized rule name fails deserialization
//! outright rather than being silently dropped.

use chrono::Weekday;
use serde::{Deserialize, Serialize};

use super::unavailable_day_vars;
use crate::error::ScheduleError;
use crate::lp::{lin_sum, LinExpr, VarId};
use crate::problem::CallProblem;

fn default_spacing() -> usize {
    2
}

/// A hard scheduling requirement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name", content = "data", rename_all = "snake_case")]
pub enum ConstraintRule {
    /// No resident takes call on a day they marked unavailable.
    Availability,
    /// Spread one weekday's calls evenly: every resident takes between
    /// `floor(count / residents)` and `ceil(count / residents)` of them.
    DistributeWeekday { weekday: Weekday },
    /// Spread weekend days (Saturdays plus Sundays) evenly, with the same
    /// floor/ceiling bounds as [`DistributeWeekday`](Self::DistributeWeekday).
    DistributeWeekends,
    /// Per-resident cap on calls falling on one weekday.
    LimitWeekday { weekday: Weekday, limit: i64 },
    /// Cap on one named resident's calls falling on one weekday.
    LimitWeekdayForResident {
        weekday: Weekday,
        limit: i64,
        resident: String,
    },
    /// Floor on one named resident's calls across a set of weekdays.
    MinimumForDaysOfWeekForResident {
        weekdays: Vec<Weekday>,
        minimum: i64,
        resident: String,
    },
    /// No resident works any part of two consecutive weekends.
    NoAdjacentWeekends,
    /// Per-resident call cap for one training year.
    LimitForPgy { pgy: u32, limit: i64 },
    /// Cap on total VA-coverage calls across the whole schedule.
    LimitVaCoverage { limit: i64 },
    /// Bound the spread of per-resident Qn counts: `max - min <= tolerance`.
    DistributeQ2s {
        #[serde(default = "default_spacing")]
        n: usize,
        tolerance: i64,
    },
    /// Per-resident cap on Qn count.
    LimitQ2s {
        #[serde(default = "default_spacing")]
        n: usize,
        limit: i64,
    },
    /// Cap on the roster-wide Qn count.
    LimitTotalQ2s {
        #[serde(default = "default_spacing")]
        n: usize,
        limit: i64,
    },
}

impl ConstraintRule {
    /// Attaches this rule's constraints to the problem.
    ///
    /// Applying the same rule twice adds redundant but consistent
    /// constraints; it never fails on its own and never changes the set
    /// of feasible schedules.
    pub fn apply(&self, problem: &mut CallProblem) -> Result<(), ScheduleError> {
        match self {
            ConstraintRule::Availability => {
                for var in unavailable_day_vars(problem)? {
                    problem
                        .model_mut()
                        .add_constraint(LinExpr::from(var).eq(0.0))?;
                }
                Ok(())
            }
            ConstraintRule::DistributeWeekday { weekday } => {
                let count = problem.horizon().count_weekday(*weekday);
                apply_distribution(problem, |p, name| p.weekday_vars(name, *weekday), count)
            }
            ConstraintRule::DistributeWeekends => {
                let count = problem.horizon().count_weekday(Weekday::Sat)
                    + problem.horizon().count_weekday(Weekday::Sun);
                apply_distribution(problem, weekend_vars, count)
            }
            ConstraintRule::LimitWeekday { weekday, limit } => {
                let names = resident_names(problem);
                for name in &names {
                    let vars = problem.weekday_vars(name, *weekday)?;
                    problem
                        .model_mut()
                        .add_constraint(lin_sum(vars).leq(*limit as f64))?;
                }
                Ok(())
            }
            ConstraintRule::LimitWeekdayForResident {
                weekday,
                limit,
                resident,
            } => {
                let vars = problem.weekday_vars(resident, *weekday)?;
                problem
                    .model_mut()
                    .add_constraint(lin_sum(vars).leq(*limit as f64))?;
                Ok(())
            }
            ConstraintRule::MinimumForDaysOfWeekForResident {
                weekdays,
                minimum,
                resident,
            } => {
                let mut vars = Vec::new();
                for weekday in weekdays {
                    vars.extend(problem.weekday_vars(resident, *weekday)?);
                }
                problem
                    .model_mut()
                    .add_constraint(lin_sum(vars).geq(*minimum as f64))?;
                Ok(())
            }
            ConstraintRule::NoAdjacentWeekends => apply_no_adjacent_weekends(problem),
            ConstraintRule::LimitForPgy { pgy, limit } => {
                let names: Vec<String> = problem
                    .residents()
                    .iter()
                    .filter(|r| r.pgy == *pgy)
                    .map(|r| r.name.clone())
                    .collect();
                for name in &names {
                    let total = lin_sum(problem.resident_day_vars(name)?.iter().copied());
                    problem
                        .model_mut()
                        .add_constraint(total.leq(*limit as f64))?;
                }
                Ok(())
            }
            ConstraintRule::LimitVaCoverage { limit } => {
                let vars = problem.va_vars();
                problem
                    .model_mut()
                    .add_constraint(lin_sum(vars).leq(*limit as f64))?;
                Ok(())
            }
            ConstraintRule::DistributeQ2s { n, tolerance } => {
                let per_resident: Vec<LinExpr> = problem
                    .qn_vars(*n)?
                    .into_values()
                    .map(|vars| lin_sum(vars))
                    .collect();
                let bound = problem.num_days() as f64;
                let index = problem.model_mut().fresh_index();
                let max_qns =
                    problem
                        .model_mut()
                        .max_of(&per_resident, bound, &format!("max_q{n}s_{index}"))?;
                let min_qns =
                    problem
                        .model_mut()
                        .min_of(&per_resident, bound, &format!("min_q{n}s_{index}"))?;
                problem
                    .model_mut()
                    .add_constraint((LinExpr::from(max_qns) - min_qns).leq(*tolerance as f64))?;
                Ok(())
            }
            ConstraintRule::LimitQ2s { n, limit } => {
                for (_, vars) in problem.qn_vars(*n)? {
                    problem
                        .model_mut()
                        .add_constraint(lin_sum(vars).leq(*limit as f64))?;
                }
                Ok(())
            }
            ConstraintRule::LimitTotalQ2s { n, limit } => {
                let all: Vec<VarId> = problem.qn_vars(*n)?.into_values().flatten().collect();
                problem
                    .model_mut()
                    .add_constraint(lin_sum(all).leq(*limit as f64))?;
                Ok(())
            }
        }
    }
}

fn resident_names(problem: &CallProblem) -> Vec<String> {
    problem.residents().iter().map(|r| r.name.clone()).collect()
}

/// Floor/ceiling distribution of `count` days over the roster, with the
/// per-resident day set produced by `vars_for`.
fn apply_distribution(
    problem: &mut CallProblem,
    vars_for: impl Fn(&CallProblem, &str) -> Result<Vec<VarId>, ScheduleError>,
    count: usize,
) -> Result<(), ScheduleError> {
    let per_resident = count as f64 / problem.num_residents() as f64;
    let min = per_resident.floor();
    let max = per_resident.ceil();
    for name in resident_names(problem) {
        let vars = vars_for(problem, &name)?;
        problem
            .model_mut()
            .add_constraint(lin_sum(vars.iter().copied()).geq(min))?;
        problem.model_mut().add_constraint(lin_sum(vars).leq(max))?;
    }
    Ok(())
}

/// A resident's on-call variables for every weekend day, ordered by date.
///
/// Weekends are anchored on Saturdays, with each Sunday attached to the
/// preceding Saturday; a horizon whose first weekend day is a Sunday has
/// no anchor for that day and is rejected.
fn weekend_vars(problem: &CallProblem, name: &str) -> Result<Vec<VarId>, ScheduleError> {
    let first_saturday = problem.horizon().days_until_weekday(Weekday::Sat);
    let first_sunday = problem.horizon().days_until_weekday(Weekday::Sun);
    if first_saturday >= first_sunday {
        return Err(ScheduleError::SundayStartUnsupported);
    }
    let day_vars = problem.resident_day_vars(name)?;
    let mut vars = Vec::new();
    let mut saturday = first_saturday;
    while saturday < problem.num_days() {
        vars.push(day_vars[saturday]);
        if saturday + 1 < problem.num_days() {
            vars.push(day_vars[saturday + 1]);
        }
        saturday += 7;
    }
    Ok(vars)
}

fn apply_no_adjacent_weekends(problem: &mut CallProblem) -> Result<(), ScheduleError> {
    let first_saturday = problem.horizon().days_until_weekday(Weekday::Sat);
    let first_sunday = problem.horizon().days_until_weekday(Weekday::Sun);
    if first_saturday >= first_sunday {
        return Err(ScheduleError::SundayStartUnsupported);
    }
    if first_saturday + 1 >= problem.num_days() {
        // No full weekend in the horizon.
        return Ok(());
    }

    let num_days = problem.num_days();
    for name in resident_names(problem) {
        let day_vars = problem.resident_day_vars(&name)?.to_vec();
        let mut last_saturday = day_vars[first_saturday];
        let mut last_sunday = day_vars[first_saturday + 1];
        let mut saturday = first_saturday + 7;
        while saturday < num_days {
            let curr_saturday = day_vars[saturday];
            if saturday + 1 < num_days {
                let curr_sunday = day_vars[saturday + 1];
                problem.model_mut().add_constraint(
                    (LinExpr::from(last_saturday) + last_sunday + curr_saturday + curr_sunday)
                        .leq(1.0),
                )?;
                last_saturday = curr_saturday;
                last_sunday = curr_sunday;
            } else {
                // Trailing Saturday with no Sunday in the horizon.
                problem.model_mut().add_constraint(
                    (LinExpr::from(last_saturday) + last_sunday + curr_saturday).leq(1.0),
                )?;
            }
            saturday += 7;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Project, Resident};
    use crate::rules::ObjectiveRule;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// Two weeks starting Monday 2025-06-02, four residents.
    fn fortnight_project() -> Project {
        Project::new(
            date(2025, 6, 2),
            date(2025, 6, 15),
            vec![
                Resident::new("Andrew", 2, 14),
                Resident::new("Jess", 2, 14),
                Resident::new("Paris", 3, 14),
                Resident::new("Alex", 3, 14),
            ],
        )
        .with_pgy_2_3_gap(4)
    }

    fn solve_with(
        project: &Project,
        rules: &[ConstraintRule],
    ) -> Result<crate::solution::Solution, ScheduleError> {
        let mut problem = CallProblem::build(project)?;
        problem.apply_constraints(rules)?;
        problem.set_objectives(&[ObjectiveRule::Q2s { n: 2 }])?;
        problem.solve()
    }

    #[test]
    fn test_availability_rule_is_honored() {
        let mut project = fortnight_project();
        project.residents[0] = Resident::new("Andrew", 2, 14)
            .with_unavailable_day(3)
            .with_unavailable_day(4);
        let solution = solve_with(&project, &[ConstraintRule::Availability]).unwrap();
        let days = solution.assignments().unwrap();
        assert!(!days[3].contains(&"Andrew".to_string()));
        assert!(!days[4].contains(&"Andrew".to_string()));
    }

    #[test]
    fn test_distribute_weekday_bounds_every_resident() {
        let project = fortnight_project();
        // Two Mondays over four residents: everyone gets 0 or 1.
        let solution = solve_with(
            &project,
            &[ConstraintRule::DistributeWeekday {
                weekday: Weekday::Mon,
            }],
        )
        .unwrap();
        for (_, count) in solution.count_of_weekday(Weekday::Mon).unwrap() {
            assert!(count <= 1, "a resident took both Mondays");
        }
    }

    #[test]
    fn test_distribute_weekends_spreads_four_days() {
        let project = fortnight_project();
        let solution = solve_with(&project, &[ConstraintRule::DistributeWeekends]).unwrap();
        // Four weekend days over four residents: exactly one each.
        let saturdays = solution.count_of_weekday(Weekday::Sat).unwrap();
        let sundays = solution.count_of_weekday(Weekday::Sun).unwrap();
        for resident in project.residents.iter().map(|r| r.name.as_str()) {
            let total = saturdays.get(resident).copied().unwrap_or(0)
                + sundays.get(resident).copied().unwrap_or(0);
            assert_eq!(total, 1, "{resident} should take exactly one weekend day");
        }
    }

    #[test]
    fn test_limit_weekday_for_resident() {
        let project = fortnight_project();
        let solution = solve_with(
            &project,
            &[ConstraintRule::LimitWeekdayForResident {
                weekday: Weekday::Fri,
                limit: 0,
                resident: "Paris".into(),
            }],
        )
        .unwrap();
        let fridays = solution.count_of_weekday(Weekday::Fri).unwrap();
        assert_eq!(fridays.get("Paris").copied().unwrap_or(0), 0);
    }

    #[test]
    fn test_unknown_resident_in_rule_is_fatal() {
        let project = fortnight_project();
        let err = solve_with(
            &project,
            &[ConstraintRule::LimitWeekdayForResident {
                weekday: Weekday::Fri,
                limit: 0,
                resident: "Nobody".into(),
            }],
        )
        .unwrap_err();
        assert!(matches!(err, ScheduleError::UnknownResident(name) if name == "Nobody"));
    }

    #[test]
    fn test_minimum_for_days_of_week() {
        let project = fortnight_project();
        let solution = solve_with(
            &project,
            &[ConstraintRule::MinimumForDaysOfWeekForResident {
                weekdays: vec![Weekday::Sat, Weekday::Sun],
                minimum: 2,
                resident: "Jess".into(),
            }],
        )
        .unwrap();
        let weekend_calls = solution
            .count_of_weekday(Weekday::Sat)
            .unwrap()
            .get("Jess")
            .copied()
            .unwrap_or(0)
            + solution
                .count_of_weekday(Weekday::Sun)
                .unwrap()
                .get("Jess")
                .copied()
                .unwrap_or(0);
        assert!(weekend_calls >= 2);
    }

    #[test]
    fn test_no_adjacent_weekends() {
        let project = fortnight_project();
        let solution = solve_with(&project, &[ConstraintRule::NoAdjacentWeekends]).unwrap();
        let days = solution.assignments().unwrap();
        // Weekend days are 5, 6 (first) and 12, 13 (second).
        for name in project.residents.iter().map(|r| &r.name) {
            let first = days[5].contains(name) || days[6].contains(name);
            let second = days[12].contains(name) || days[13].contains(name);
            assert!(!(first && second), "{name} works both weekends");
        }
    }

    #[test]
    fn test_limit_for_pgy() {
        let project = fortnight_project();
        let solution = solve_with(&project, &[ConstraintRule::LimitForPgy { pgy: 2, limit: 3 }])
            .unwrap();
        let calls = solution.calls_per_resident().unwrap();
        assert!(calls["Andrew"] <= 3);
        assert!(calls["Jess"] <= 3);
    }

    #[test]
    fn test_limit_total_q2s_forces_zero() {
        let project = fortnight_project();
        let solution =
            solve_with(&project, &[ConstraintRule::LimitTotalQ2s { n: 2, limit: 0 }]).unwrap();
        assert_eq!(solution.total_q2s().unwrap(), 0);
    }

    #[test]
    fn test_distribute_weekday_applied_twice_is_idempotent() {
        let project = fortnight_project();
        let rule = ConstraintRule::DistributeWeekday {
            weekday: Weekday::Wed,
        };
        let once = solve_with(&project, &[rule.clone()]).unwrap();
        let twice = solve_with(&project, &[rule.clone(), rule]).unwrap();
        assert_eq!(
            once.objective_value().round(),
            twice.objective_value().round()
        );
    }

    #[test]
    fn test_distribute_q2s_applied_twice_is_idempotent() {
        // Re-applying allocates fresh selector tags, so the second copy
        // must neither collide on names nor change the optimum.
        let project = fortnight_project();
        let rule = ConstraintRule::DistributeQ2s { n: 2, tolerance: 1 };
        let once = solve_with(&project, &[rule.clone()]).unwrap();
        let twice = solve_with(&project, &[rule.clone(), rule]).unwrap();
        assert_eq!(
            once.objective_value().round(),
            twice.objective_value().round()
        );
    }

    #[test]
    fn test_serde_names_are_stable() {
        let rule = ConstraintRule::LimitWeekday {
            weekday: Weekday::Mon,
            limit: 2,
        };
        let json = serde_json::to_value(&rule).unwrap();
        assert_eq!(json["name"], "limit_weekday");
        assert_eq!(json["data"]["limit"], 2);

        let unit = serde_json::to_value(ConstraintRule::DistributeWeekends).unwrap();
        assert_eq!(unit["name"], "distribute_weekends");

        let q2 = serde_json::to_value(ConstraintRule::LimitTotalQ2s { n: 2, limit: 5 }).unwrap();
        assert_eq!(q2["name"], "limit_total_q2s");
    }

    #[test]
    fn test_unknown_rule_name_fails_deserialization() {
        let result: Result<ConstraintRule, _> =
            serde_json::from_str(r#"{"name":"no_such_rule","data":{}}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_spacing_defaults_to_two() {
        let rule: ConstraintRule =
            serde_json::from_str(r#"{"name":"limit_q2s","data":{"limit":1}}"#).unwrap();
        assert_eq!(rule, ConstraintRule::LimitQ2s { n: 2, limit: 1 });
    }
}
