//! Input validation for scheduling projects.
//!
//! Checks structural integrity of the roster before a call problem is
//! built. Detects:
//! - Empty rosters
//! - Duplicate resident names
//! - Availability / VA arrays not spanning the horizon
//! - Days on which nobody is available

use std::collections::HashSet;

use crate::models::{Horizon, Resident};

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// Two residents share the same name.
    DuplicateName,
    /// A per-day array does not span the horizon.
    LengthMismatch,
    /// A day has no available resident at all.
    NoAvailableResident,
    /// The roster is empty.
    EmptyRoster,
}

impl ValidationError {
    fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Validates a roster against a scheduling horizon.
///
/// Checks:
/// 1. The roster is non-empty
/// 2. No duplicate resident names
/// 3. Availability and VA arrays cover every day of the horizon
/// 4. Every day has at least one available resident
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(errors)` with all detected issues.
pub fn validate_roster(residents: &[Resident], horizon: &Horizon) -> ValidationResult {
    let mut errors = Vec::new();

    if residents.is_empty() {
        errors.push(ValidationError::new(
            ValidationErrorKind::EmptyRoster,
            "No residents in the roster",
        ));
        return Err(errors);
    }

    let mut names = HashSet::new();
    for resident in residents {
        if !names.insert(resident.name.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateName,
                format!("Duplicate resident name: {}", resident.name),
            ));
        }

        if resident.availability.len() != horizon.num_days() {
            errors.push(ValidationError::new(
                ValidationErrorKind::LengthMismatch,
                format!(
                    "Resident '{}' has availability for {} days, horizon spans {}",
                    resident.name,
                    resident.availability.len(),
                    horizon.num_days()
                ),
            ));
        }
        if resident.va.len() != horizon.num_days() {
            errors.push(ValidationError::new(
                ValidationErrorKind::LengthMismatch,
                format!(
                    "Resident '{}' has VA flags for {} days, horizon spans {}",
                    resident.name,
                    resident.va.len(),
                    horizon.num_days()
                ),
            ));
        }
    }

    // Only meaningful once lengths are consistent.
    if errors.is_empty() {
        for day in 0..horizon.num_days() {
            if !residents.iter().any(|r| r.is_available(day)) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::NoAvailableResident,
                    format!("No resident is available on {}", horizon.date(day)),
                ));
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Availability;
    use chrono::NaiveDate;

    fn horizon(num_days: usize) -> Horizon {
        Horizon::new(NaiveDate::from_ymd_opt(2025, 6, 2).unwrap(), num_days).unwrap()
    }

    #[test]
    fn test_valid_roster() {
        let residents = vec![Resident::new("Andrew", 2, 3), Resident::new("Paris", 3, 3)];
        assert!(validate_roster(&residents, &horizon(3)).is_ok());
    }

    #[test]
    fn test_empty_roster() {
        let errors = validate_roster(&[], &horizon(3)).unwrap_err();
        assert_eq!(errors[0].kind, ValidationErrorKind::EmptyRoster);
    }

    #[test]
    fn test_duplicate_names() {
        let residents = vec![Resident::new("Andrew", 2, 3), Resident::new("Andrew", 3, 3)];
        let errors = validate_roster(&residents, &horizon(3)).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::DuplicateName));
    }

    #[test]
    fn test_length_mismatch() {
        let residents = vec![Resident::new("Andrew", 2, 5)];
        let errors = validate_roster(&residents, &horizon(3)).unwrap_err();
        assert_eq!(errors.len(), 2); // availability and VA arrays
        assert!(errors
            .iter()
            .all(|e| e.kind == ValidationErrorKind::LengthMismatch));
    }

    #[test]
    fn test_day_without_available_resident() {
        let residents = vec![
            Resident::new("Andrew", 2, 3).with_unavailable_day(1),
            Resident::new("Paris", 3, 3)
                .with_availability(vec![
                    Availability::Available,
                    Availability::Unavailable,
                    Availability::Preferred,
                ]),
        ];
        let errors = validate_roster(&residents, &horizon(3)).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, ValidationErrorKind::NoAvailableResident);
        assert!(errors[0].message.contains("2025-06-03"));
    }
}
