//! Input validation errors shared by every component.

use thiserror::Error;

/// Rejected input. Raised at the boundary, before any state is touched.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Invalid date '{0}'. Use YYYY-MM-DD.")]
    InvalidDate(String),

    #[error("Invalid section '{0}'. Valid options: breakfast, lunch, dinner, snacks")]
    InvalidSection(String),

    #[error("Meal name must not be empty")]
    EmptyName,

    #[error("Servings must be a positive number, got {0}")]
    InvalidServings(f64),

    #[error("Calories must be a non-negative number, got {0}")]
    InvalidCalories(f64),

    #[error("Macro '{name}' must be a non-negative number, got {value}")]
    InvalidMacro { name: &'static str, value: f64 },

    #[error("Weight must be a positive number, got {0}")]
    InvalidWeight(f64),

    #[error("{name} must be a positive number, got {value}")]
    InvalidMeasurement { name: &'static str, value: f64 },

    #[error("User id must not be empty")]
    EmptyUserId,

    #[error("Invalid goal '{0}'. Valid options: build, lose, maintain")]
    InvalidGoal(String),

    #[error("Invalid period '{0}'. Valid options: week, month, year")]
    InvalidPeriod(String),

    #[error("Item for {found} cannot be added to {expected}")]
    MisfiledItem { expected: String, found: String },
}
