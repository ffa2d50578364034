//! FuelTrack Core Library
//!
//! Meal planning, meal logging and statistics for FuelTrack applications.
//!
//! Everything that persists goes through a [`DocumentStore`]; inject a
//! [`MemoryStore`] in tests or an [`AutomergeStore`] for on-disk data.

pub mod automerge;
pub mod date_key;
pub mod error;
pub mod goals;
pub mod journal;
pub mod models;
pub mod plan;
pub mod profiles;
pub mod stats;
pub mod store;

pub use automerge::AutomergeStore;
pub use date_key::DateKey;
pub use error::ValidationError;
pub use goals::{DailyGoals, DailySummary};
pub use journal::{group_by_section, JournalError, MealJournal};
pub use models::{DayPlan, Goal, Macros, MealRecord, Section, UserProfile, WeightRecord};
pub use plan::{LoadOutcome, PlanError, PlanLoad, PlanStore, WriteBack, WriteFailure, WriteOutcome};
pub use profiles::{GoalsUpdate, Onboarding, ProfileError, ProfileService};
pub use stats::{
    aggregate, Granularity, ReportWindow, StatsBucketSet, StatsError, StatsService, WeightSeries,
};
pub use store::{DocPath, Document, DocumentStore, MemoryStore, SetOptions, StoreError};

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!version().is_empty());
    }
}
