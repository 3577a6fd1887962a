//! Eager roster checks run before any search.
//!
//! Detects:
//! - Shows whose `student_min` exceeds `student_max`
//! - Role quotas whose `min` exceeds `max`
//! - Duplicate show, slot or student names
//! - Preferences naming unknown shows
//! - Availability naming unknown slots
//!
//! Negative counts cannot reach this point; they fail to decode into the
//! unsigned roster fields.

use crate::data::Roster;
use serde::Serialize;
use std::collections::HashSet;
use thiserror::Error;

/// A validation error.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(rename_all = "camelCase")]
#[error("{kind:?}: {message}")]
pub struct ValidationError {
    pub kind: ValidationErrorKind,
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ValidationErrorKind {
    /// `student_min > student_max`.
    StudentBounds,
    /// A role quota with `min > max`.
    RoleQuotaBounds,
    /// Two entities of the same kind share a name.
    DuplicateName,
    /// A preference references a show that doesn't exist.
    UnknownShow,
    /// An availability entry references a slot that doesn't exist.
    UnknownSlot,
}

impl ValidationError {
    fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Validates a roster, returning every detected issue.
pub fn validate_roster(roster: &Roster) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let mut show_names = HashSet::new();
    for show in &roster.shows {
        if !show_names.insert(show.name.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateName,
                format!("Duplicate show name: {}", show.name),
            ));
        }
        if show.student_min > show.student_max {
            errors.push(ValidationError::new(
                ValidationErrorKind::StudentBounds,
                format!(
                    "Show {} has student_min {} greater than student_max {}",
                    show.name, show.student_min, show.student_max
                ),
            ));
        }
        for (role, quota) in &show.role_quota {
            let Some(max) = quota.max else { continue };
            if quota.min > max {
                errors.push(ValidationError::new(
                    ValidationErrorKind::RoleQuotaBounds,
                    format!(
                        "Show {} has quota for role {} with min {} greater than max {}",
                        show.name, role, quota.min, max
                    ),
                ));
            }
        }
    }

    let mut slot_names = HashSet::new();
    for slot in &roster.slots {
        if !slot_names.insert(slot.name.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateName,
                format!("Duplicate slot name: {}", slot.name),
            ));
        }
    }

    let mut student_names = HashSet::new();
    for student in &roster.students {
        if !student_names.insert(student.name.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateName,
                format!("Duplicate student name: {}", student.name),
            ));
        }
        let mut unknown_shows: Vec<&str> = student
            .preferences
            .keys()
            .map(String::as_str)
            .filter(|show| !show_names.contains(show))
            .collect();
        unknown_shows.sort_unstable();
        for show in unknown_shows {
            errors.push(ValidationError::new(
                ValidationErrorKind::UnknownShow,
                format!("Student {} has a preference for unknown show {}", student.name, show),
            ));
        }
        for slot in &student.available_slots {
            if !slot_names.contains(slot.as_str()) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::UnknownSlot,
                    format!("Student {} is available in unknown slot {}", student.name, slot),
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
