//! Logged meals.
//!
//! Every eaten meal is its own document in `users/{uid}/meals`, stamped with
//! `createdAt` so the collection can be read in logging order.

use chrono::Utc;
use futures::stream::{BoxStream, StreamExt};
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

use crate::date_key::DateKey;
use crate::error::ValidationError;
use crate::models::{DayPlan, MealRecord};
use crate::store::{self, DocPath, Document, DocumentStore, OrderBy, StoreError};

const CREATED_AT: &str = "createdAt";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum JournalError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Reads and writes the meal log of any user.
#[derive(Clone)]
pub struct MealJournal {
    store: Arc<dyn DocumentStore>,
}

impl MealJournal {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Validates and stores `record`, returning it with its generated id.
    pub async fn add_meal(&self, uid: &str, record: MealRecord) -> Result<MealRecord, JournalError> {
        let collection = meals_collection(uid)?;
        record.validate()?;

        let mut fields = match serde_json::to_value(&record) {
            Ok(Value::Object(fields)) => fields,
            _ => {
                return Err(StoreError::Codec {
                    path: collection.to_string(),
                    reason: "meal did not serialize to a map".to_string(),
                }
                .into())
            }
        };
        fields.remove("id");
        fields.insert(
            CREATED_AT.to_string(),
            Value::String(Utc::now().to_rfc3339()),
        );

        let id = self.store.add_document(&collection, fields).await?;
        tracing::debug!("Logged '{}' as {}", record.name, id);
        Ok(record.with_id(id))
    }

    pub async fn delete_meal(&self, uid: &str, meal_id: &str) -> Result<(), JournalError> {
        let path = meals_collection(uid)?.child(meal_id)?;
        self.store.delete_document(&path).await?;
        Ok(())
    }

    /// Meals dated within `[start, end]`, oldest logged first.
    pub async fn meals_between(
        &self,
        uid: &str,
        start: DateKey,
        end: DateKey,
    ) -> Result<Vec<MealRecord>, JournalError> {
        let collection = meals_collection(uid)?;
        let documents = self
            .store
            .list_documents(&collection, Some(&OrderBy::asc(CREATED_AT)))
            .await?;

        Ok(decode_meals(&documents)
            .into_iter()
            .filter(|meal| meal.date >= start && meal.date <= end)
            .collect())
    }

    /// Live view of one day's meals, grouped by section, newest first. A new
    /// value is produced whenever the meal log changes.
    pub fn watch_day(
        &self,
        uid: &str,
        date: DateKey,
    ) -> Result<BoxStream<'static, Result<DayPlan, JournalError>>, JournalError> {
        let collection = meals_collection(uid)?;

        let snapshots = store::subscribe(
            Arc::clone(&self.store),
            collection,
            Some(OrderBy::desc(CREATED_AT)),
        );

        Ok(snapshots
            .map(move |snapshot| -> Result<DayPlan, JournalError> {
                let documents = snapshot?;
                Ok(group_by_section(&decode_meals(&documents), date))
            })
            .boxed())
    }
}

/// Groups the records dated `date` into a [`DayPlan`], keeping their order.
pub fn group_by_section(records: &[MealRecord], date: DateKey) -> DayPlan {
    let mut plan = DayPlan::new();
    for record in records.iter().filter(|record| record.date == date) {
        plan.section_mut(record.section).push(record.clone());
    }
    plan
}

fn meals_collection(uid: &str) -> Result<DocPath, JournalError> {
    if uid.is_empty() {
        return Err(ValidationError::EmptyUserId.into());
    }
    Ok(DocPath::meals(uid)?)
}

fn decode_meals(documents: &[Document]) -> Vec<MealRecord> {
    documents
        .iter()
        .filter_map(|document| match document.decode::<MealRecord>() {
            Ok(meal) => Some(meal),
            Err(e) => {
                tracing::warn!("Skipping malformed meal {}: {}", document.id, e);
                None
            }
        })
        .collect()
}
