//! Background write-back of plan sections.

use chrono::Utc;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tokio::task::JoinHandle;

use super::{Inner, PlanError, PlanStore};
use crate::date_key::DateKey;
use crate::models::{MealRecord, Section};
use crate::store::{DocPath, Fields, SetOptions, StoreError};

/// A write-back that failed. Local state is kept as it was.
#[derive(Debug, Clone, PartialEq)]
pub struct WriteFailure {
    pub date: DateKey,
    pub section: Section,
    pub error: PlanError,
}

/// How a write-back settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The section was written to the document store.
    Written,
    /// No user is signed in, so nothing was written.
    Skipped,
}

/// Handle to a background write-back.
///
/// Dropping it detaches the write; it still runs to completion and failures
/// are still published on [`PlanStore::write_failures`].
#[derive(Debug)]
pub struct WriteBack {
    task: Option<JoinHandle<Result<(), PlanError>>>,
}

impl WriteBack {
    fn skipped() -> Self {
        Self { task: None }
    }

    /// Waits for the write-back to settle.
    pub async fn wait(self) -> Result<WriteOutcome, PlanError> {
        let Some(task) = self.task else {
            return Ok(WriteOutcome::Skipped);
        };

        task.await
            .map_err(|e| PlanError::Task(e.to_string()))??;
        Ok(WriteOutcome::Written)
    }
}

/// One async lock per `(date, section)`, so write-backs for the same section
/// run one at a time.
pub(super) struct WriteLocks {
    locks: Mutex<HashMap<(DateKey, Section), Arc<AsyncMutex<()>>>>,
}

impl WriteLocks {
    pub(super) fn new() -> Self {
        Self {
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub(super) async fn acquire(&self, date: DateKey, section: Section) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(
                locks
                    .entry((date, section))
                    .or_insert_with(|| Arc::new(AsyncMutex::new(()))),
            )
        };
        lock.lock_owned().await
    }

    /// Drops the lock for `(date, section)` once no guard or waiter holds it.
    fn release(&self, date: DateKey, section: Section) {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(lock) = locks.get(&(date, section)) {
            if Arc::strong_count(lock) == 1 {
                locks.remove(&(date, section));
            }
        }
    }

    #[cfg(test)]
    pub(super) fn len(&self) -> usize {
        self.locks.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

impl PlanStore {
    pub(super) fn spawn_write_back(&self, date: DateKey, section: Section) -> WriteBack {
        let Some(uid) = self.inner.uid.clone() else {
            tracing::debug!("No user signed in; keeping {} {} local", date, section);
            return WriteBack::skipped();
        };

        let inner = Arc::clone(&self.inner);
        let task = tokio::spawn(async move { inner.write_section(&uid, date, section).await });
        WriteBack { task: Some(task) }
    }
}

impl Inner {
    /// Writes one section of one date with merge semantics. The section is
    /// read from the cache once the lock is held, so queued write-backs all
    /// send the latest local state.
    async fn write_section(
        &self,
        uid: &str,
        date: DateKey,
        section: Section,
    ) -> Result<(), PlanError> {
        let guard = self.write_locks.acquire(date, section).await;

        let items: Vec<MealRecord> = self
            .lock_state()
            .plans
            .get(&date)
            .map(|plan| plan.section(section).to_vec())
            .unwrap_or_default();

        let result = self.send_section(uid, date, section, &items).await;
        self.lock_state().settle_write(date, section);
        drop(guard);
        self.write_locks.release(date, section);

        match &result {
            Ok(()) => tracing::debug!("Wrote {} {} ({} items)", date, section, items.len()),
            Err(e) => {
                tracing::warn!("Failed to write {} {}: {}", date, section, e);
                // Nobody listening is fine
                let _ = self.failures.send(WriteFailure {
                    date,
                    section,
                    error: e.clone(),
                });
            }
        }

        result
    }

    async fn send_section(
        &self,
        uid: &str,
        date: DateKey,
        section: Section,
        items: &[MealRecord],
    ) -> Result<(), PlanError> {
        let path = DocPath::meal_plan(uid, &date)?;
        let fields = section_fields(&path, section, items)?;
        self.store
            .set_document(&path, fields, SetOptions::merge())
            .await?;
        Ok(())
    }
}

fn section_fields(
    path: &DocPath,
    section: Section,
    items: &[MealRecord],
) -> Result<Fields, StoreError> {
    let items = serde_json::to_value(items).map_err(|e| StoreError::Codec {
        path: path.to_string(),
        reason: e.to_string(),
    })?;

    let mut fields = Fields::new();
    fields.insert(section.field_name().to_string(), items);
    fields.insert(
        "updatedAt".to_string(),
        Value::String(Utc::now().to_rfc3339()),
    );
    Ok(fields)
}
