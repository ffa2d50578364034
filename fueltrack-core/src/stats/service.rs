use std::sync::Arc;
use thiserror::Error;

use super::{aggregate, ReportWindow, StatsBucketSet};
use crate::journal::{JournalError, MealJournal};
use crate::profiles::{ProfileError, ProfileService};
use crate::store::DocumentStore;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StatsError {
    #[error("Failed to read meals: {0}")]
    Meals(#[from] JournalError),

    #[error("Failed to read weight history: {0}")]
    Weights(#[from] ProfileError),
}

/// Builds reports from the records in the document store.
pub struct StatsService {
    journal: MealJournal,
    profiles: ProfileService,
}

impl StatsService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            journal: MealJournal::new(Arc::clone(&store)),
            profiles: ProfileService::new(store),
        }
    }

    /// Reads the meals and weights in `window` and aggregates them. The
    /// result is a snapshot; later writes are not reflected.
    pub async fn report(&self, uid: &str, window: &ReportWindow) -> Result<StatsBucketSet, StatsError> {
        let meals = self
            .journal
            .meals_between(uid, window.start, window.end)
            .await?;
        let weights = self
            .profiles
            .weight_entries(uid, window.start, window.end)
            .await?;

        tracing::debug!(
            "Aggregating {} meals and {} weights for {} {}..{}",
            meals.len(),
            weights.len(),
            window.granularity,
            window.start,
            window.end
        );

        Ok(aggregate(
            &meals,
            &weights,
            window.start,
            window.end,
            window.granularity,
        ))
    }
}
