//! Solved-schedule snapshot and derived statistics.
//!
//! [`Solution`] holds the raw variable values from one optimal solve and
//! decodes them on demand: per-day assignments first (cached, fallible),
//! then everything else as pure functions of the assignments. Nothing
//! here touches the solver again.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Mutex;

use chrono::{NaiveDate, Weekday};
use once_cell::sync::OnceCell;

use crate::error::ScheduleError;
use crate::models::{Horizon, Resident};

/// Name of the on-call variable for a (day, resident) pair. The decode
/// contract between problem construction and this module.
pub(crate) fn key_for_day(day: usize, resident: &str) -> String {
    format!("Day_{day}_{resident}")
}

/// Binary variables come back from the solver as floats.
fn is_set(value: f64) -> bool {
    value > 0.5
}

/// A resident's fatigue score with its per-spacing breakdown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WearinessScore {
    pub score: i64,
    /// Qn count per spacing `n`.
    pub breakdown: BTreeMap<usize, usize>,
}

impl fmt::Display for WearinessScore {
    /// `"12 (1x Q3, 2x Q7)"`, zero-count spacings omitted.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .breakdown
            .iter()
            .filter(|(_, count)| **count > 0)
            .map(|(n, count)| format!("{count}x Q{n}"))
            .collect();
        write!(f, "{} ({})", self.score, parts.join(", "))
    }
}

/// One day assigned differently from a reference schedule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleChange {
    pub date: NaiveDate,
    pub previous: Vec<String>,
    pub current: Vec<String>,
}

impl fmt::Display for ScheduleChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({} -> {})",
            self.date.format("%m/%d/%Y"),
            self.previous.join(", "),
            self.current.join(", ")
        )
    }
}

/// A decoded optimal schedule.
#[derive(Debug)]
pub struct Solution {
    objective_value: f64,
    values: HashMap<String, f64>,
    horizon: Horizon,
    residents: Vec<Resident>,
    assignments: OnceCell<Vec<Vec<String>>>,
    qn_counts: Mutex<HashMap<usize, BTreeMap<String, usize>>>,
}

impl Solution {
    pub(crate) fn new(
        objective_value: f64,
        values: HashMap<String, f64>,
        horizon: Horizon,
        residents: Vec<Resident>,
    ) -> Self {
        Self {
            objective_value,
            values,
            horizon,
            residents,
            assignments: OnceCell::new(),
            qn_counts: Mutex::new(HashMap::new()),
        }
    }

    /// The achieved (combined) objective value.
    pub fn objective_value(&self) -> f64 {
        self.objective_value
    }

    /// The scheduling horizon the solution spans.
    pub fn horizon(&self) -> &Horizon {
        &self.horizon
    }

    /// Raw solver value of a named variable.
    pub fn value(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }

    fn day_value(&self, day: usize, resident: &str) -> f64 {
        self.values
            .get(&key_for_day(day, resident))
            .copied()
            .unwrap_or(0.0)
    }

    /// Residents on call for each day, in roster order. Decoded once and
    /// cached; a day with nobody assigned indicates a modeling bug and is
    /// fatal.
    pub fn assignments(&self) -> Result<&Vec<Vec<String>>, ScheduleError> {
        self.assignments.get_or_try_init(|| {
            let mut result = Vec::with_capacity(self.horizon.num_days());
            for day in 0..self.horizon.num_days() {
                let assigned: Vec<String> = self
                    .residents
                    .iter()
                    .filter(|r| is_set(self.day_value(day, &r.name)))
                    .map(|r| r.name.clone())
                    .collect();
                if assigned.is_empty() {
                    return Err(ScheduleError::NoAssignee(day));
                }
                result.push(assigned);
            }
            Ok(result)
        })
    }

    /// Total calls per resident.
    pub fn calls_per_resident(&self) -> Result<BTreeMap<String, usize>, ScheduleError> {
        let mut result: BTreeMap<String, usize> = self.zeroed_counts();
        for names in self.assignments()? {
            for name in names {
                if let Some(count) = result.get_mut(name) {
                    *count += 1;
                }
            }
        }
        Ok(result)
    }

    /// Qn count per resident: days where the resident is on call both on
    /// day `i` and day `i + n`. Cached per spacing.
    pub fn qns_per_resident(
        &self,
        n: usize,
    ) -> Result<BTreeMap<String, usize>, ScheduleError> {
        if n < 2 {
            return Err(ScheduleError::InvalidSpacing(n));
        }
        if let Some(cached) = self.qn_counts.lock().map(|c| c.get(&n).cloned()).ok().flatten() {
            return Ok(cached);
        }

        let assignments = self.assignments()?;
        let mut result = self.zeroed_counts();
        for day in 0..self.horizon.num_days().saturating_sub(n) {
            for name in &assignments[day] {
                if assignments[day + n].contains(name) {
                    if let Some(count) = result.get_mut(name) {
                        *count += 1;
                    }
                }
            }
        }
        if let Ok(mut cache) = self.qn_counts.lock() {
            cache.insert(n, result.clone());
        }
        Ok(result)
    }

    /// Roster-wide Q2 count.
    pub fn total_q2s(&self) -> Result<usize, ScheduleError> {
        Ok(self.qns_per_resident(2)?.values().sum())
    }

    /// The most Q2s any one resident has.
    pub fn max_q2s(&self) -> Result<usize, ScheduleError> {
        Ok(self.qns_per_resident(2)?.values().copied().max().unwrap_or(0))
    }

    /// Spread between the most and least Q2s across the roster.
    pub fn q2_spread(&self) -> Result<usize, ScheduleError> {
        let counts = self.qns_per_resident(2)?;
        let max = counts.values().copied().max().unwrap_or(0);
        let min = counts.values().copied().min().unwrap_or(0);
        Ok(max - min)
    }

    /// Total calls per training year.
    pub fn calls_by_year(&self) -> Result<BTreeMap<u32, usize>, ScheduleError> {
        let mut result: BTreeMap<u32, usize> = BTreeMap::new();
        for names in self.assignments()? {
            for name in names {
                if let Some(resident) = self.residents.iter().find(|r| &r.name == name) {
                    *result.entry(resident.pgy).or_insert(0) += 1;
                }
            }
        }
        Ok(result)
    }

    /// One training year's share of the horizon, in percent.
    pub fn percent_of_horizon_by_year(&self, pgy: u32) -> Result<f64, ScheduleError> {
        let calls = self.calls_by_year()?.get(&pgy).copied().unwrap_or(0);
        Ok(calls as f64 / self.horizon.num_days() as f64 * 100.0)
    }

    /// Calls per resident restricted to one weekday.
    pub fn count_of_weekday(
        &self,
        weekday: Weekday,
    ) -> Result<BTreeMap<String, usize>, ScheduleError> {
        let assignments = self.assignments()?;
        let mut result = self.zeroed_counts();
        for day in self.horizon.weekday_days(weekday) {
            for name in &assignments[day] {
                if let Some(count) = result.get_mut(name) {
                    *count += 1;
                }
            }
        }
        Ok(result)
    }

    /// Saturday calls per resident.
    pub fn saturdays(&self) -> Result<BTreeMap<String, usize>, ScheduleError> {
        self.count_of_weekday(Weekday::Sat)
    }

    /// Sunday calls per resident.
    pub fn sundays(&self) -> Result<BTreeMap<String, usize>, ScheduleError> {
        self.count_of_weekday(Weekday::Sun)
    }

    /// Dates where the assigned resident's call counts as VA coverage.
    pub fn va_covered_days(&self) -> Result<Vec<NaiveDate>, ScheduleError> {
        let mut result = Vec::new();
        for (day, names) in self.assignments()?.iter().enumerate() {
            let covered = names.iter().any(|name| {
                self.residents
                    .iter()
                    .any(|r| &r.name == name && r.va[day])
            });
            if covered {
                result.push(self.horizon.date(day));
            }
        }
        Ok(result)
    }

    /// Days assigned differently from a reference schedule, order-insensitive
    /// within a day.
    pub fn changes_from_previous(
        &self,
        previous: &[Vec<String>],
    ) -> Result<Vec<ScheduleChange>, ScheduleError> {
        let mut changes = Vec::new();
        for (day, (current, prev)) in self.assignments()?.iter().zip(previous).enumerate() {
            let mut current_sorted = current.clone();
            current_sorted.sort();
            let mut prev_sorted = prev.clone();
            prev_sorted.sort();
            if current_sorted != prev_sorted {
                changes.push(ScheduleChange {
                    date: self.horizon.date(day),
                    previous: prev.clone(),
                    current: current.clone(),
                });
            }
        }
        Ok(changes)
    }

    /// The coverage annotation for one day, as (covering resident, name of
    /// the resident covered for). Two claims for one day are fatal.
    pub fn coverage_for_day(
        &self,
        day: usize,
    ) -> Result<Option<(String, String)>, ScheduleError> {
        let claims: Vec<(String, String)> = self
            .residents
            .iter()
            .filter_map(|r| {
                r.coverage
                    .get(&day)
                    .map(|covered| (r.name.clone(), covered.clone()))
            })
            .collect();
        match claims.as_slice() {
            [] => Ok(None),
            [claim] => Ok(Some(claim.clone())),
            many => Err(ScheduleError::DuplicateCoverage {
                day,
                names: many.iter().map(|(name, _)| name.clone()).collect(),
            }),
        }
    }

    /// Days where an assigned resident had marked themselves unavailable,
    /// with the offending names. Empty for any schedule solved under the
    /// availability constraint; the diagnostic path reads this off a
    /// deliberately relaxed solve.
    pub fn availability_violations(
        &self,
    ) -> Result<BTreeMap<usize, Vec<String>>, ScheduleError> {
        let mut result: BTreeMap<usize, Vec<String>> = BTreeMap::new();
        for day in 0..self.horizon.num_days() {
            let violated: Vec<String> = self
                .residents
                .iter()
                .filter(|r| is_set(self.day_value(day, &r.name)) && !r.is_available(day))
                .map(|r| r.name.clone())
                .collect();
            if !violated.is_empty() {
                result.insert(day, violated);
            }
        }
        Ok(result)
    }

    /// Fatigue score and per-spacing breakdown for every resident under a
    /// weariness map.
    pub fn weariness_per_resident(
        &self,
        weariness_map: &BTreeMap<usize, i64>,
    ) -> Result<BTreeMap<String, WearinessScore>, ScheduleError> {
        let mut result: BTreeMap<String, WearinessScore> = self
            .residents
            .iter()
            .map(|r| {
                (
                    r.name.clone(),
                    WearinessScore {
                        score: 0,
                        breakdown: BTreeMap::new(),
                    },
                )
            })
            .collect();
        for (n, weight) in weariness_map {
            for (name, count) in self.qns_per_resident(*n)? {
                if let Some(entry) = result.get_mut(&name) {
                    entry.score += count as i64 * weight;
                    entry.breakdown.insert(*n, count);
                }
            }
        }
        Ok(result)
    }

    fn zeroed_counts(&self) -> BTreeMap<String, usize> {
        self.residents
            .iter()
            .map(|r| (r.name.clone(), 0))
            .collect()
    }
}
