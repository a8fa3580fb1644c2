//! Client-side schema for `Todo` records.
//!
//! Runs before any request is built so a front-end can show per-field
//! messages without a round-trip. Every failing field is reported, not just
//! the first one.

use std::fmt;

use crate::types::Todo;

pub const TITLE_MAX_LEN: usize = 100;
pub const DESCRIPTION_MAX_LEN: usize = 200;

/// The record field a validation message refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Title,
    Description,
}

impl Field {
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Title => "title",
            Field::Description => "description",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: Field,
    pub message: String,
}

/// All field failures found in one record. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid todo: {}", summary(.0))]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    pub fn errors(&self) -> &[FieldError] {
        &self.0
    }

    /// First message for `field`, if that field failed.
    pub fn message_for(&self, field: Field) -> Option<&str> {
        self.0
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }
}

fn summary(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| format!("{}: {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join("; ")
}

impl Todo {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = Vec::new();
        check_text(&mut errors, Field::Title, "Title", &self.title, TITLE_MAX_LEN);
        check_text(
            &mut errors,
            Field::Description,
            "Description",
            &self.description,
            DESCRIPTION_MAX_LEN,
        );
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationErrors(errors))
        }
    }
}

fn check_text(errors: &mut Vec<FieldError>, field: Field, label: &str, value: &str, max: usize) {
    // Length is counted in chars so multi-byte titles get the full allowance.
    let message = if value.is_empty() {
        format!("{label} is required")
    } else if value.chars().count() > max {
        format!("{label} must be at most {max} characters")
    } else {
        return;
    };
    errors.push(FieldError { field, message });
}
