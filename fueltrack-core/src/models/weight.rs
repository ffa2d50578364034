use serde::{Deserialize, Serialize};
use std::fmt;

use crate::date_key::DateKey;
use crate::error::ValidationError;

/// A body weight sample in kilograms.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightRecord {
    pub date: DateKey,
    pub weight: f64,
}

impl WeightRecord {
    pub fn new(date: DateKey, weight: f64) -> Self {
        Self { date, weight }
    }

    pub fn is_valid(&self) -> bool {
        self.weight.is_finite() && self.weight > 0.0
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(ValidationError::InvalidWeight(self.weight))
        }
    }
}

impl fmt::Display for WeightRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} kg", self.date, self.weight)
    }
}
