//! Statistics over logged meals and weight samples.
//!
//! [`aggregate`] is a pure function from records to chart-ready series;
//! [`StatsService`] fetches the records for a [`ReportWindow`] and runs it.

mod aggregate;
mod service;
mod window;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

pub use aggregate::{aggregate, StatsBucketSet, WeightSeries};
pub use service::{StatsError, StatsService};
pub use window::ReportWindow;

/// Reporting mode: what one bucket stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    /// Seven weekdays, Monday first.
    Week,
    /// Each day of the calendar month.
    Month,
    /// Each month of the calendar year.
    Year,
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Granularity::Week => write!(f, "week"),
            Granularity::Month => write!(f, "month"),
            Granularity::Year => write!(f, "year"),
        }
    }
}

impl FromStr for Granularity {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "week" | "7days" => Ok(Granularity::Week),
            "month" | "30days" => Ok(Granularity::Month),
            "year" | "12months" => Ok(Granularity::Year),
            _ => Err(ValidationError::InvalidPeriod(s.to_string())),
        }
    }
}
