use serde::{Deserialize, Serialize};
use std::fmt;

use super::macros::Macros;
use super::section::Section;
use crate::date_key::DateKey;
use crate::error::ValidationError;

/// One food entry, either logged (eaten) or planned.
///
/// `id` is assigned by the document store when the record is persisted on
/// its own; records that only live inside a plan section may never get one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub servings: f64,
    pub calories: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub macros: Option<Macros>,
    pub date: DateKey,
    pub section: Section,
}

impl MealRecord {
    pub fn new(name: impl Into<String>, calories: f64, date: DateKey, section: Section) -> Self {
        Self {
            id: None,
            name: name.into(),
            servings: 1.0,
            calories,
            macros: None,
            date,
            section,
        }
    }

    pub fn with_servings(mut self, servings: f64) -> Self {
        self.servings = servings;
        self
    }

    pub fn with_macros(mut self, macros: Macros) -> Self {
        self.macros = Some(macros);
        self
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Checks the numeric fields and the name.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName);
        }
        if !self.servings.is_finite() || self.servings <= 0.0 {
            return Err(ValidationError::InvalidServings(self.servings));
        }
        if !self.calories.is_finite() || self.calories < 0.0 {
            return Err(ValidationError::InvalidCalories(self.calories));
        }
        if let Some(macros) = &self.macros {
            for (name, value) in macros.channels() {
                if !value.is_finite() || value < 0.0 {
                    return Err(ValidationError::InvalidMacro { name, value });
                }
            }
        }
        Ok(())
    }
}

impl fmt::Display for MealRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}x) - {} kcal", self.name, self.servings, self.calories)?;
        if let Some(macros) = &self.macros {
            write!(f, " [{}]", macros)?;
        }
        Ok(())
    }
}
