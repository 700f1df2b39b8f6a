//! Project configuration.
//!
//! Everything the optimizer needs to build a call problem: the horizon
//! dates, the roster, the optional buddy period, tuning parameters, and
//! the configured constraint and objective rules. Passed explicitly into
//! model construction; there is no ambient configuration state.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{Horizon, Resident};
use crate::error::ScheduleError;
use crate::rules::{ConstraintRule, ObjectiveRule};

/// An inclusive sub-range of the horizon with two-resident staffing:
/// one junior (PGY2) plus one senior (PGY3 or PGY4) per day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuddyPeriod {
    pub start_date: NaiveDate,
    /// Inclusive.
    pub end_date: NaiveDate,
}

fn default_pgy_2_3_gap() -> i64 {
    1
}

/// A complete scheduling configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub start_date: NaiveDate,
    /// Inclusive.
    pub end_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buddy_period: Option<BuddyPeriod>,
    /// The roster, with availability covering the whole horizon.
    #[serde(rename = "availability")]
    pub residents: Vec<Resident>,
    /// Allowed spread between the busiest PGY2 and the least-busy PGY3.
    #[serde(default = "default_pgy_2_3_gap")]
    pub pgy_2_3_gap: i64,
    /// Deterministic solver seed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    #[serde(default)]
    pub constraints: Vec<ConstraintRule>,
    #[serde(default)]
    pub objectives: Vec<ObjectiveRule>,
}

impl Project {
    /// Creates a project with no rules and default tuning.
    pub fn new(start_date: NaiveDate, end_date: NaiveDate, residents: Vec<Resident>) -> Self {
        Self {
            start_date,
            end_date,
            buddy_period: None,
            residents,
            pgy_2_3_gap: default_pgy_2_3_gap(),
            seed: None,
            constraints: Vec::new(),
            objectives: Vec::new(),
        }
    }

    /// Sets the buddy period.
    pub fn with_buddy_period(mut self, start_date: NaiveDate, end_date: NaiveDate) -> Self {
        self.buddy_period = Some(BuddyPeriod {
            start_date,
            end_date,
        });
        self
    }

    /// Sets the PGY2/PGY3 workload gap tolerance.
    pub fn with_pgy_2_3_gap(mut self, gap: i64) -> Self {
        self.pgy_2_3_gap = gap;
        self
    }

    /// Sets the solver seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Appends a constraint rule.
    pub fn with_constraint(mut self, rule: ConstraintRule) -> Self {
        self.constraints.push(rule);
        self
    }

    /// Appends an objective rule (priority order: first is highest).
    pub fn with_objective(mut self, rule: ObjectiveRule) -> Self {
        self.objectives.push(rule);
        self
    }

    /// The scheduling horizon spanned by the project dates.
    pub fn horizon(&self) -> Result<Horizon, ScheduleError> {
        Horizon::from_dates(self.start_date, self.end_date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_horizon_spans_inclusive_dates() {
        let project = Project::new(date(2025, 6, 1), date(2025, 6, 28), vec![]);
        let horizon = project.horizon().unwrap();
        assert_eq!(horizon.num_days(), 28);
    }

    #[test]
    fn test_reversed_dates_rejected() {
        let project = Project::new(date(2025, 6, 28), date(2025, 6, 1), vec![]);
        assert!(matches!(
            project.horizon(),
            Err(ScheduleError::EmptyHorizon)
        ));
    }

    #[test]
    fn test_serde_round_trip() {
        let project = Project::new(
            date(2025, 6, 1),
            date(2025, 6, 28),
            vec![Resident::new("Paris", 3, 28)],
        )
        .with_buddy_period(date(2025, 6, 10), date(2025, 6, 15))
        .with_pgy_2_3_gap(4)
        .with_seed(7)
        .with_constraint(ConstraintRule::DistributeWeekends)
        .with_objective(ObjectiveRule::Q2s { n: 2 });

        let json = serde_json::to_string(&project).unwrap();
        let back: Project = serde_json::from_str(&json).unwrap();
        assert_eq!(back.buddy_period, project.buddy_period);
        assert_eq!(back.pgy_2_3_gap, 4);
        assert_eq!(back.seed, Some(7));
        assert_eq!(back.constraints, project.constraints);
        assert_eq!(back.objectives, project.objectives);
    }
}
