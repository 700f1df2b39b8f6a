//! Objective catalog and lexicographic combination.
//!
//! Each [`ObjectiveRule`] contributes a linear expression to minimize
//! plus a tight upper bound on its value; [`combine_objectives`] uses the
//! bounds to pack a priority-ordered list into one expression where no
//! amount of improvement on a later objective can outweigh a single unit
//! of an earlier one. The packing is only sound because every objective
//! here is integer-valued.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::unavailable_day_vars;
use crate::error::ScheduleError;
use crate::lp::{lin_sum, LinExpr};
use crate::problem::CallProblem;

fn default_spacing() -> usize {
    2
}

/// The default fatigue weights: a Q3 is an order of magnitude worse than
/// a Q7, with roughly geometric decay between.
pub fn default_weariness_map() -> BTreeMap<usize, i64> {
    BTreeMap::from([(3, 10), (4, 5), (5, 3), (6, 2), (7, 1)])
}

/// Parses a previously exported schedule, one comma-separated list of
/// resident names per line, one line per day.
pub fn parse_reference_schedule(text: &str) -> Vec<Vec<String>> {
    text.lines()
        .map(|line| line.trim().split(',').map(str::to_string).collect())
        .collect()
}

/// A quantity the optimizer minimizes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name", content = "data", rename_all = "snake_case")]
pub enum ObjectiveRule {
    /// Total count of Qn intervals (back-on-call after `n` days off)
    /// across the roster.
    Q2s {
        #[serde(default = "default_spacing")]
        n: usize,
    },
    /// Number of days assigned differently from a reference schedule.
    ChangesFromPreviousSolution {
        /// Where the reference came from; informational only.
        path: String,
        /// One single-resident assignment per day, spanning the horizon.
        data: Vec<Vec<String>>,
    },
    /// Total calls falling on VA-coverage days.
    VaCoverage,
    /// The worst per-resident fatigue score, where a resident's score is
    /// the weighted sum of their Qn counts under `map`.
    Weariness { map: BTreeMap<usize, i64> },
    /// Number of calls assigned on days the resident marked unavailable.
    /// Only meaningful when the availability constraint is relaxed; the
    /// infeasibility diagnostic is its one caller in practice.
    Availability,
}

impl ObjectiveRule {
    /// The expression to minimize. May add auxiliary variables to the
    /// problem, so callers must not request the expression twice for one
    /// combined objective.
    pub fn objective(&self, problem: &mut CallProblem) -> Result<LinExpr, ScheduleError> {
        match self {
            ObjectiveRule::Q2s { n } => {
                let all = problem.qn_vars(*n)?.into_values().flatten();
                Ok(lin_sum(all))
            }
            ObjectiveRule::ChangesFromPreviousSolution { data, .. } => {
                if data.len() != problem.num_days() {
                    return Err(ScheduleError::ReferenceLength {
                        expected: problem.num_days(),
                        got: data.len(),
                    });
                }
                let mut expr = LinExpr::new();
                for (day, previous) in data.iter().enumerate() {
                    let [name] = previous.as_slice() else {
                        return Err(ScheduleError::UnsupportedReference {
                            day,
                            found: previous.len(),
                        });
                    };
                    let var = problem.resident_day_vars(name)?[day];
                    expr = expr + (LinExpr::constant(1.0) - var);
                }
                Ok(expr)
            }
            ObjectiveRule::VaCoverage => Ok(lin_sum(problem.va_vars())),
            ObjectiveRule::Weariness { map } => {
                let names: Vec<String> =
                    problem.residents().iter().map(|r| r.name.clone()).collect();
                let mut scores: BTreeMap<String, LinExpr> = names
                    .iter()
                    .map(|name| (name.clone(), LinExpr::new()))
                    .collect();
                for (n, weight) in map {
                    let qn_vars = problem.qn_vars(*n)?;
                    for (name, vars) in qn_vars {
                        let weighted = lin_sum(vars) * (*weight as f64);
                        if let Some(score) = scores.remove(&name) {
                            scores.insert(name, score + weighted);
                        }
                    }
                }
                let per_resident: Vec<LinExpr> = scores.into_values().collect();
                let bound = self.max_value(problem) as f64;
                let index = problem.model_mut().fresh_index();
                let worst = problem.model_mut().max_of(
                    &per_resident,
                    bound,
                    &format!("max_weariness_{index}"),
                )?;
                Ok(LinExpr::from(worst))
            }
            ObjectiveRule::Availability => Ok(lin_sum(unavailable_day_vars(problem)?)),
        }
    }

    /// A bound the objective can never exceed. Keeping these tight keeps
    /// the lexicographic coefficients small.
    pub fn max_value(&self, problem: &CallProblem) -> i64 {
        let num_days = problem.num_days() as i64;
        let num_residents = problem.num_residents() as i64;
        match self {
            ObjectiveRule::Q2s { n } => {
                num_days.div_ceil(*n as i64) * num_residents
            }
            ObjectiveRule::ChangesFromPreviousSolution { .. } => num_days,
            ObjectiveRule::VaCoverage => num_days * num_residents,
            ObjectiveRule::Weariness { map } => map
                .iter()
                .map(|(n, weight)| num_days.div_ceil(*n as i64) * weight)
                .sum(),
            ObjectiveRule::Availability => num_days * num_residents,
        }
    }
}

/// Folds a priority-ordered objective list into one expression:
/// `combined = o1 * (bound(o2) + 1) + o2`, repeated left to right. The
/// first objective always dominates, with later ones breaking ties.
///
/// Fails with [`ScheduleError::ObjectiveOverflow`] when the combined
/// bound no longer fits an `i64`, since past that point the priority
/// ordering silently corrupts.
pub fn combine_objectives(
    problem: &mut CallProblem,
    objectives: &[ObjectiveRule],
) -> Result<LinExpr, ScheduleError> {
    let (first, rest) = objectives.split_first().ok_or(ScheduleError::NoObjectives)?;
    let mut combined = first.objective(problem)?;
    let mut combined_bound = first.max_value(problem);
    for objective in rest {
        let bound = objective.max_value(problem);
        let scale = bound.checked_add(1).ok_or(ScheduleError::ObjectiveOverflow)?;
        combined_bound = combined_bound
            .checked_mul(scale)
            .and_then(|b| b.checked_add(bound))
            .ok_or(ScheduleError::ObjectiveOverflow)?;
        combined = combined * scale as f64 + objective.objective(problem)?;
    }
    Ok(combined)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Project, Resident};
    use crate::rules::ConstraintRule;
    use chrono::NaiveDate;
    use proptest::prelude::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn week_project() -> Project {
        Project::new(
            date(2025, 6, 2),
            date(2025, 6, 8),
            vec![
                Resident::new("Andrew", 2, 7),
                Resident::new("Jess", 2, 7),
                Resident::new("Paris", 3, 7),
            ],
        )
    }

    #[test]
    fn test_max_values_are_tight_formulas() {
        let problem = CallProblem::build(&week_project()).unwrap();
        assert_eq!(ObjectiveRule::Q2s { n: 2 }.max_value(&problem), 4 * 3);
        assert_eq!(ObjectiveRule::Q2s { n: 3 }.max_value(&problem), 3 * 3);
        assert_eq!(ObjectiveRule::VaCoverage.max_value(&problem), 21);
        assert_eq!(ObjectiveRule::Availability.max_value(&problem), 21);
        let weariness = ObjectiveRule::Weariness {
            map: default_weariness_map(),
        };
        // ceil(7/3)*10 + ceil(7/4)*5 + ceil(7/5)*3 + ceil(7/6)*2 + ceil(7/7)*1
        assert_eq!(weariness.max_value(&problem), 30 + 10 + 6 + 4 + 1);
    }

    #[test]
    fn test_reference_length_mismatch() {
        let mut problem = CallProblem::build(&week_project()).unwrap();
        let rule = ObjectiveRule::ChangesFromPreviousSolution {
            path: "june.csv".into(),
            data: vec![vec!["Andrew".into()]; 5],
        };
        assert!(matches!(
            rule.objective(&mut problem),
            Err(ScheduleError::ReferenceLength {
                expected: 7,
                got: 5
            })
        ));
    }

    #[test]
    fn test_buddy_reference_unsupported() {
        let mut problem = CallProblem::build(&week_project()).unwrap();
        let mut data = vec![vec!["Andrew".into()]; 7];
        data[2] = vec!["Andrew".into(), "Paris".into()];
        let rule = ObjectiveRule::ChangesFromPreviousSolution {
            path: "june.csv".into(),
            data,
        };
        assert!(matches!(
            rule.objective(&mut problem),
            Err(ScheduleError::UnsupportedReference { day: 2, found: 2 })
        ));
    }

    #[test]
    fn test_changes_objective_prefers_reference() {
        // A feasible reference schedule should be reproduced exactly.
        let reference: Vec<Vec<String>> = ["Andrew", "Jess", "Paris", "Andrew", "Jess", "Paris", "Andrew"]
            .iter()
            .map(|name| vec![name.to_string()])
            .collect();
        let mut problem = CallProblem::build(&week_project()).unwrap();
        problem
            .set_objectives(&[ObjectiveRule::ChangesFromPreviousSolution {
                path: "june.csv".into(),
                data: reference.clone(),
            }])
            .unwrap();
        let solution = problem.solve().unwrap();
        assert_eq!(solution.objective_value().round() as i64, 0);
        assert_eq!(solution.assignments().unwrap(), &reference);
    }

    #[test]
    fn test_lexicographic_priority_dominates() {
        // With Q2s first, a zero-Q2 schedule wins even when it means more
        // changes from the reference; with the order flipped, the
        // reference (which has Q2s) wins.
        let q2_reference: Vec<Vec<String>> =
            ["Andrew", "Jess", "Andrew", "Jess", "Andrew", "Jess", "Paris"]
                .iter()
                .map(|name| vec![name.to_string()])
                .collect();
        let changes = ObjectiveRule::ChangesFromPreviousSolution {
            path: "june.csv".into(),
            data: q2_reference.clone(),
        };
        // The reference loads PGY2s heavily, so widen the year gap.
        let project = week_project().with_pgy_2_3_gap(4);

        let mut problem = CallProblem::build(&project).unwrap();
        problem
            .set_objectives(&[ObjectiveRule::Q2s { n: 2 }, changes.clone()])
            .unwrap();
        let solution = problem.solve().unwrap();
        assert_eq!(solution.total_q2s().unwrap(), 0);

        let mut problem = CallProblem::build(&project).unwrap();
        problem
            .set_objectives(&[changes, ObjectiveRule::Q2s { n: 2 }])
            .unwrap();
        let solution = problem.solve().unwrap();
        assert_eq!(solution.assignments().unwrap(), &q2_reference);
    }

    #[test]
    fn test_empty_objective_list_is_fatal() {
        let mut problem = CallProblem::build(&week_project()).unwrap();
        assert!(matches!(
            combine_objectives(&mut problem, &[]),
            Err(ScheduleError::NoObjectives)
        ));
    }

    #[test]
    fn test_weariness_minimizes_worst_resident() {
        let project = week_project();
        let mut problem = CallProblem::build(&project).unwrap();
        problem
            .apply_constraints(&[ConstraintRule::Availability])
            .unwrap();
        problem
            .set_objectives(&[ObjectiveRule::Weariness {
                map: default_weariness_map(),
            }])
            .unwrap();
        let solution = problem.solve().unwrap();
        let scores = solution
            .weariness_per_resident(&default_weariness_map())
            .unwrap();
        let worst = scores.values().map(|s| s.score).max().unwrap_or(0);
        assert_eq!(solution.objective_value().round() as i64, worst);
    }

    #[test]
    fn test_parse_reference_schedule() {
        let parsed = parse_reference_schedule("Andrew\nJess,Paris\n Andrew \n");
        assert_eq!(
            parsed,
            vec![
                vec!["Andrew".to_string()],
                vec!["Jess".to_string(), "Paris".to_string()],
                vec!["Andrew".to_string()],
            ]
        );
    }

    #[test]
    fn test_serde_names_are_stable() {
        let json = serde_json::to_value(ObjectiveRule::Q2s { n: 2 }).unwrap();
        assert_eq!(json["name"], "q2s");
        let json = serde_json::to_value(ObjectiveRule::VaCoverage).unwrap();
        assert_eq!(json["name"], "va_coverage");
        let json = serde_json::to_value(ObjectiveRule::Weariness {
            map: default_weariness_map(),
        })
        .unwrap();
        assert_eq!(json["name"], "weariness");
        assert_eq!(json["data"]["map"]["3"], 10);
    }

    proptest! {
        /// Packing two objective values with the second objective's bound
        /// decodes uniquely: the combined value determines both inputs.
        #[test]
        fn test_lexicographic_packing_is_injective(
            v1 in 0i64..100,
            v2 in 0i64..50,
            bound2 in 50i64..200,
        ) {
            let combined = v1 * (bound2 + 1) + v2;
            prop_assert_eq!(combined.div_euclid(bound2 + 1), v1);
            prop_assert_eq!(combined.rem_euclid(bound2 + 1), v2);
        }
    }
}
