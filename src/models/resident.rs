use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A resident's standing for one day, serialized as `0`/`1`/`2`.
///
/// `Preferred` is accepted on input and treated exactly like `Available`
/// by every rule; preference weighting never made it past the roster
/// spreadsheets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Availability {
    Unavailable,
    Available,
    Preferred,
}

impl Availability {
    /// Whether the resident may take call on this day.
    pub fn is_available(self) -> bool {
        !matches!(self, Availability::Unavailable)
    }
}

impl From<Availability> for u8 {
    fn from(value: Availability) -> u8 {
        match value {
            Availability::Unavailable => 0,
            Availability::Available => 1,
            Availability::Preferred => 2,
        }
    }
}

impl TryFrom<u8> for Availability {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Availability::Unavailable),
            1 => Ok(Availability::Available),
            2 => Ok(Availability::Preferred),
            other => Err(format!("availability must be 0, 1 or 2, got {other}")),
        }
    }
}

/// One member of the call roster.
///
/// Every per-day array spans the full scheduling horizon; lengths are
/// checked at problem construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resident {
    pub name: String,
    /// Post-graduate training year.
    pub pgy: u32,
    /// Day-by-day availability.
    #[serde(rename = "schedule")]
    pub availability: Vec<Availability>,
    /// Days on which a call by this resident counts as VA coverage.
    #[serde(default)]
    pub va: Vec<bool>,
    /// Coverage annotations: day index to the name of the resident whose
    /// day this one is covering.
    #[serde(default)]
    pub coverage: BTreeMap<usize, String>,
}

impl Resident {
    /// A resident available on every day of a `num_days` horizon.
    pub fn new(name: impl Into<String>, pgy: u32, num_days: usize) -> Self {
        Self {
            name: name.into(),
            pgy,
            availability: vec![Availability::Available; num_days],
            va: vec![false; num_days],
            coverage: BTreeMap::new(),
        }
    }

    /// Replaces the whole availability array.
    pub fn with_availability(mut self, availability: Vec<Availability>) -> Self {
        self.availability = availability;
        self
    }

    /// Marks one day unavailable.
    pub fn with_unavailable_day(mut self, day: usize) -> Self {
        self.availability[day] = Availability::Unavailable;
        self
    }

    /// Replaces the VA-coverage flags.
    pub fn with_va(mut self, va: Vec<bool>) -> Self {
        self.va = va;
        self
    }

    /// Records a coverage annotation.
    pub fn with_coverage(mut self, day: usize, covered: impl Into<String>) -> Self {
        self.coverage.insert(day, covered.into());
        self
    }

    /// Whether the resident may take call on `day`.
    pub fn is_available(&self, day: usize) -> bool {
        self.availability[day].is_available()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_resident_fully_available() {
        let resident = Resident::new("Andrew", 2, 3);
        assert!((0..3).all(|day| resident.is_available(day)));
        assert_eq!(resident.va, vec![false; 3]);
    }

    #[test]
    fn test_unavailable_day() {
        let resident = Resident::new("Andrew", 2, 3).with_unavailable_day(1);
        assert!(resident.is_available(0));
        assert!(!resident.is_available(1));
    }

    #[test]
    fn test_preferred_counts_as_available() {
        assert!(Availability::Preferred.is_available());
        assert!(Availability::Available.is_available());
        assert!(!Availability::Unavailable.is_available());
    }

    #[test]
    fn test_availability_serializes_as_numbers() {
        let resident = Resident::new("Andrew", 2, 3).with_unavailable_day(2);
        let json = serde_json::to_string(&resident).unwrap();
        assert!(json.contains(r#""schedule":[1,1,0]"#), "{json}");

        let back: Resident = serde_json::from_str(&json).unwrap();
        assert_eq!(back, resident);
    }

    #[test]
    fn test_availability_rejects_out_of_range() {
        let result: Result<Availability, _> = serde_json::from_str("3");
        assert!(result.is_err());
    }
}
