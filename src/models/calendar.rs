//! Scheduling horizon and weekday arithmetic.
//!
//! The horizon is a contiguous run of calendar days; every per-resident
//! array in the model has exactly `num_days` entries. Day indices are
//! 0-based offsets from the start date.

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::ScheduleError;

/// A contiguous scheduling period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Horizon {
    start_date: NaiveDate,
    num_days: usize,
}

impl Horizon {
    /// Creates a horizon of `num_days` days starting at `start_date`.
    pub fn new(start_date: NaiveDate, num_days: usize) -> Result<Self, ScheduleError> {
        if num_days == 0 {
            return Err(ScheduleError::EmptyHorizon);
        }
        Ok(Self {
            start_date,
            num_days,
        })
    }

    /// Creates a horizon from an inclusive date range.
    pub fn from_dates(start_date: NaiveDate, end_date: NaiveDate) -> Result<Self, ScheduleError> {
        let span = (end_date - start_date).num_days();
        if span < 0 {
            return Err(ScheduleError::EmptyHorizon);
        }
        Self::new(start_date, span as usize + 1)
    }

    /// First day of the horizon.
    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    /// Number of days in the horizon.
    pub fn num_days(&self) -> usize {
        self.num_days
    }

    /// The calendar date of a day index.
    pub fn date(&self, day: usize) -> NaiveDate {
        self.start_date + Duration::days(day as i64)
    }

    /// The day index of a calendar date, if it falls inside the horizon.
    pub fn day_of(&self, date: NaiveDate) -> Option<usize> {
        let offset = (date - self.start_date).num_days();
        if offset >= 0 && (offset as usize) < self.num_days {
            Some(offset as usize)
        } else {
            None
        }
    }

    /// Days until the first occurrence of `weekday` on or after the start
    /// date (0 if the horizon starts on that weekday).
    pub fn days_until_weekday(&self, weekday: Weekday) -> usize {
        days_until_weekday(self.start_date, weekday)
    }

    /// Day indices within the horizon falling on `weekday`, ascending.
    pub fn weekday_days(&self, weekday: Weekday) -> impl Iterator<Item = usize> {
        (self.days_until_weekday(weekday)..self.num_days).step_by(7)
    }

    /// How many times `weekday` occurs within the horizon.
    pub fn count_weekday(&self, weekday: Weekday) -> usize {
        self.weekday_days(weekday).count()
    }
}

/// Days from `from` until the next occurrence of `weekday` (0 if `from`
/// already falls on it).
pub fn days_until_weekday(from: NaiveDate, weekday: Weekday) -> usize {
    let gap = 7 + weekday.num_days_from_monday() - from.weekday().num_days_from_monday();
    (gap % 7) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    fn monday() -> NaiveDate {
        // 2025-06-02 is a Monday.
        NaiveDate::from_ymd_opt(2025, 6, 2).unwrap()
    }

    #[test]
    fn test_empty_horizon_rejected() {
        assert!(matches!(
            Horizon::new(monday(), 0),
            Err(ScheduleError::EmptyHorizon)
        ));
        let earlier = monday() - Duration::days(1);
        assert!(matches!(
            Horizon::from_dates(monday(), earlier),
            Err(ScheduleError::EmptyHorizon)
        ));
    }

    #[test]
    fn test_from_dates_is_inclusive() {
        let h = Horizon::from_dates(monday(), monday() + Duration::days(6)).unwrap();
        assert_eq!(h.num_days(), 7);
        assert_eq!(h.date(6), monday() + Duration::days(6));
    }

    #[test]
    fn test_day_of() {
        let h = Horizon::new(monday(), 7).unwrap();
        assert_eq!(h.day_of(monday()), Some(0));
        assert_eq!(h.day_of(monday() + Duration::days(6)), Some(6));
        assert_eq!(h.day_of(monday() + Duration::days(7)), None);
        assert_eq!(h.day_of(monday() - Duration::days(1)), None);
    }

    #[test]
    fn test_days_until_weekday() {
        assert_eq!(days_until_weekday(monday(), Weekday::Mon), 0);
        assert_eq!(days_until_weekday(monday(), Weekday::Sat), 5);
        assert_eq!(days_until_weekday(monday(), Weekday::Sun), 6);
    }

    #[test]
    fn test_weekday_days_and_counts() {
        // Two full weeks starting Monday.
        let h = Horizon::new(monday(), 14).unwrap();
        assert_eq!(h.weekday_days(Weekday::Sat).collect::<Vec<_>>(), vec![5, 12]);
        assert_eq!(h.count_weekday(Weekday::Sat), 2);
        assert_eq!(h.count_weekday(Weekday::Mon), 2);

        // 15 days picks up a third Monday.
        let h = Horizon::new(monday(), 15).unwrap();
        assert_eq!(h.count_weekday(Weekday::Mon), 3);
        assert_eq!(h.count_weekday(Weekday::Sat), 2);
    }
}
