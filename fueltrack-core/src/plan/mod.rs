//! Date-keyed cache of planned meals.
//!
//! [`PlanStore`] keeps one [`DayPlan`] per calendar day in memory. Local
//! mutations apply immediately and are written back to the document store in
//! the background; loads are deduplicated so each date has at most one read
//! in flight.
//!
//! Per-date lifecycle:
//!
//! ```text
//! Unloaded --load--> Loading --found--> Loaded
//!                       |
//!                       +--missing/failed--> (previous state kept)
//! ```
//!
//! Mutations are accepted in every state and never wait on a pending load.
//! A load that finds a document replaces the cached plan for that date,
//! except for sections changed locally while the load was in flight or
//! still waiting on a write-back when it started. Those keep their local
//! items, and their write-backs carry them to the store.
//!
//! All operations that start background work must be called from within a
//! Tokio runtime.

mod load;
mod write_back;

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tokio::sync::broadcast;

use crate::date_key::DateKey;
use crate::error::ValidationError;
use crate::models::{DayPlan, MealRecord, Section};
use crate::store::{DocumentStore, StoreError};

pub use load::{LoadOutcome, PlanLoad};
pub use write_back::{WriteBack, WriteFailure, WriteOutcome};

use load::SharedLoad;
use write_back::WriteLocks;

const FAILURE_CHANNEL_CAPACITY: usize = 32;

/// Errors raised by [`PlanStore`] operations.
///
/// `Clone` because one load result is handed to every coalesced caller.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlanError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Index {index} is out of range for a section with {len} items")]
    IndexOutOfRange { index: usize, len: usize },

    /// The background task panicked or was cancelled.
    #[error("Background task failed: {0}")]
    Task(String),
}

#[derive(Default)]
struct PlanState {
    plans: BTreeMap<DateKey, DayPlan>,
    loading: HashMap<DateKey, SharedLoad>,
    /// Sections an in-flight load must not overwrite.
    keep_local: HashMap<DateKey, HashSet<Section>>,
    /// Write-backs spawned but not yet settled, per section.
    pending_writes: HashMap<(DateKey, Section), usize>,
}

impl PlanState {
    /// Records a local change to a section. Must be called under the same
    /// lock as the change itself.
    fn touch(&mut self, date: DateKey, section: Section, write_back: bool) {
        if write_back {
            *self.pending_writes.entry((date, section)).or_default() += 1;
        }
        if self.loading.contains_key(&date) {
            self.keep_local.entry(date).or_default().insert(section);
        }
    }

    /// Sections of `date` with write-backs that have not settled.
    fn sections_pending_write(&self, date: DateKey) -> HashSet<Section> {
        self.pending_writes
            .keys()
            .filter(|(pending, _)| *pending == date)
            .map(|(_, section)| *section)
            .collect()
    }

    fn settle_write(&mut self, date: DateKey, section: Section) {
        let key = (date, section);
        match self.pending_writes.get_mut(&key) {
            Some(count) if *count > 1 => *count -= 1,
            Some(_) => {
                self.pending_writes.remove(&key);
            }
            None => {}
        }
    }
}

struct Inner {
    store: Arc<dyn DocumentStore>,
    uid: Option<String>,
    state: Mutex<PlanState>,
    write_locks: WriteLocks,
    failures: broadcast::Sender<WriteFailure>,
}

impl Inner {
    fn lock_state(&self) -> MutexGuard<'_, PlanState> {
        // Poisoning is ignored; every update is a single map operation
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Shared handle to the plan cache. Clones share state.
#[derive(Clone)]
pub struct PlanStore {
    inner: Arc<Inner>,
}

impl PlanStore {
    /// Creates a store backed by `store`.
    ///
    /// `uid` is the signed-in user whose plans receive write-backs. Without
    /// one, mutations stay local.
    pub fn new(store: Arc<dyn DocumentStore>, uid: Option<String>) -> Self {
        let (failures, _) = broadcast::channel(FAILURE_CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                store,
                uid,
                state: Mutex::new(PlanState::default()),
                write_locks: WriteLocks::new(),
                failures,
            }),
        }
    }

    pub fn uid(&self) -> Option<&str> {
        self.inner.uid.as_deref()
    }

    /// Appends `item` to a section of `date`, creating an empty plan for the
    /// date if needed, then writes the section back in the background.
    ///
    /// The item is validated before anything changes, and its own date and
    /// section must match the slot it is added to.
    pub fn add_plan_food(
        &self,
        date: DateKey,
        section: Section,
        item: MealRecord,
    ) -> Result<WriteBack, PlanError> {
        item.validate()?;
        if item.date != date || item.section != section {
            return Err(ValidationError::MisfiledItem {
                expected: format!("{} {}", date, section),
                found: format!("{} {}", item.date, item.section),
            }
            .into());
        }

        {
            let mut state = self.inner.lock_state();
            state
                .plans
                .entry(date)
                .or_default()
                .section_mut(section)
                .push(item);
            state.touch(date, section, self.inner.uid.is_some());
        }

        Ok(self.spawn_write_back(date, section))
    }

    /// Removes the item at `index` from a section of `date`. Later items
    /// shift down by one. The reduced section is written back in the
    /// background.
    pub fn delete_plan_food(
        &self,
        date: DateKey,
        section: Section,
        index: usize,
    ) -> Result<WriteBack, PlanError> {
        let removed = {
            let mut state = self.inner.lock_state();
            let removed = match state.plans.get_mut(&date).map(|plan| plan.section_mut(section)) {
                Some(items) if index < items.len() => items.remove(index),
                Some(items) => {
                    return Err(PlanError::IndexOutOfRange {
                        index,
                        len: items.len(),
                    })
                }
                None => return Err(PlanError::IndexOutOfRange { index, len: 0 }),
            };
            state.touch(date, section, self.inner.uid.is_some());
            removed
        };

        tracing::debug!("Removed '{}' from {} {}", removed.name, date, section);
        Ok(self.spawn_write_back(date, section))
    }

    /// Snapshot of the cached plan for `date`. `None` means nothing has been
    /// loaded or added for that date yet, which is not the same as an empty
    /// plan confirmed by the store.
    pub fn plan_for(&self, date: DateKey) -> Option<DayPlan> {
        self.inner.lock_state().plans.get(&date).cloned()
    }

    /// True while a load for `date` is in flight.
    pub fn is_loading(&self, date: DateKey) -> bool {
        self.inner.lock_state().loading.contains_key(&date)
    }

    /// Dates with a cached plan, in calendar order.
    pub fn loaded_dates(&self) -> Vec<DateKey> {
        self.inner.lock_state().plans.keys().copied().collect()
    }

    /// Subscribes to failed write-backs. Only failures that happen after
    /// subscribing are received.
    pub fn write_failures(&self) -> broadcast::Receiver<WriteFailure> {
        self.inner.failures.subscribe()
    }
}
