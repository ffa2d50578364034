//! Deduplicated plan loads.

use futures::future::{self, BoxFuture, FutureExt, Shared};
use serde_json::Value;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use super::{Inner, PlanError, PlanStore};
use crate::date_key::DateKey;
use crate::error::ValidationError;
use crate::models::{DayPlan, MealRecord, Section};
use crate::store::{DocPath, Fields};

pub(super) type SharedLoad = Shared<BoxFuture<'static, Result<LoadOutcome, PlanError>>>;

/// How a load settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// A plan document was found and replaced the cached plan. Sections
    /// with local changes the store has not seen yet were kept.
    Loaded,
    /// No plan document exists; the cache was left as it was.
    Missing,
}

/// Handle to a plan load. Every handle for the same in-flight load resolves
/// to the same result.
///
/// The read runs in a background task, so dropping the handle neither
/// cancels the read nor leaves the date marked as loading.
#[must_use = "a PlanLoad does nothing observable unless awaited or checked"]
pub struct PlanLoad {
    shared: SharedLoad,
    coalesced: bool,
}

impl PlanLoad {
    fn ready(result: Result<LoadOutcome, PlanError>) -> Self {
        Self {
            shared: future::ready(result).boxed().shared(),
            coalesced: false,
        }
    }

    /// True when this call joined a load that was already in flight instead
    /// of starting a read.
    pub fn is_coalesced(&self) -> bool {
        self.coalesced
    }
}

impl Future for PlanLoad {
    type Output = Result<LoadOutcome, PlanError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.shared).poll(cx)
    }
}

impl PlanStore {
    /// Loads the plan for `date` from the document store.
    ///
    /// At most one read per date is in flight: while a load is running,
    /// further calls return a handle to it. A found document replaces the
    /// cached plan, apart from sections edited after the load started or
    /// with write-backs still pending when it started. A missing document or
    /// a failed read leaves the cache as it was.
    /// Either way the date stops loading once the read settles, so a failed
    /// load can simply be retried.
    pub fn load_plan_for_date(&self, uid: &str, date: DateKey) -> PlanLoad {
        if uid.is_empty() {
            return PlanLoad::ready(Err(ValidationError::EmptyUserId.into()));
        }

        let path = match DocPath::meal_plan(uid, &date) {
            Ok(path) => path,
            Err(e) => return PlanLoad::ready(Err(e.into())),
        };

        let mut state = self.inner.lock_state();
        if let Some(in_flight) = state.loading.get(&date) {
            tracing::debug!("Joining in-flight load for {}", date);
            return PlanLoad {
                shared: in_flight.clone(),
                coalesced: true,
            };
        }

        // The task needs the state lock to finish, so it cannot clear the
        // loading entry before it is inserted below.
        let inner = Arc::clone(&self.inner);
        let task = tokio::spawn(async move { inner.read_plan(path, date).await });
        let shared = async move {
            task.await
                .map_err(|e| PlanError::Task(e.to_string()))
                .and_then(|result| result)
        }
        .boxed()
        .shared();

        let pending = state.sections_pending_write(date);
        if !pending.is_empty() {
            state.keep_local.insert(date, pending);
        }
        state.loading.insert(date, shared.clone());
        PlanLoad {
            shared,
            coalesced: false,
        }
    }
}

impl Inner {
    async fn read_plan(&self, path: DocPath, date: DateKey) -> Result<LoadOutcome, PlanError> {
        tracing::debug!("Loading plan {}", path);
        let result = self.store.get_document(&path).await;

        let mut state = self.lock_state();
        state.loading.remove(&date);
        let keep_local = state.keep_local.remove(&date).unwrap_or_default();

        match result {
            Ok(Some(document)) => {
                let mut plan = parse_plan(&document.fields, date);
                if let Some(local) = state.plans.get(&date) {
                    for section in keep_local {
                        tracing::debug!("Keeping local {} {} over the loaded plan", date, section);
                        *plan.section_mut(section) = local.section(section).to_vec();
                    }
                }
                state.plans.insert(date, plan);
                Ok(LoadOutcome::Loaded)
            }
            Ok(None) => Ok(LoadOutcome::Missing),
            Err(e) => {
                tracing::warn!("Failed to load plan for {}: {}", date, e);
                Err(e.into())
            }
        }
    }
}

/// Builds a [`DayPlan`] from a plan document. Missing sections are empty;
/// entries that do not decode are skipped.
fn parse_plan(fields: &Fields, date: DateKey) -> DayPlan {
    let mut plan = DayPlan::new();

    for section in Section::ALL {
        let Some(value) = fields.get(section.field_name()) else {
            continue;
        };
        let Value::Array(items) = value else {
            tracing::warn!("Plan {} has a non-list {} field", date, section);
            continue;
        };

        let meals = plan.section_mut(section);
        for item in items {
            match parse_item(item, date, section) {
                Ok(meal) => meals.push(meal),
                Err(e) => tracing::warn!("Skipping malformed {} entry on {}: {}", section, date, e),
            }
        }
    }

    plan
}

fn parse_item(item: &Value, date: DateKey, section: Section) -> Result<MealRecord, serde_json::Error> {
    let mut item = item.clone();
    if let Value::Object(map) = &mut item {
        map.entry("date")
            .or_insert_with(|| Value::String(date.to_string()));
        map.entry("section")
            .or_insert_with(|| Value::String(section.field_name().to_string()));
    }
    serde_json::from_value(item)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn date() -> DateKey {
        DateKey::from_ymd(2024, 3, 4).unwrap()
    }

    #[test]
    fn test_parse_plan_defaults_missing_sections() {
        let fields = json!({ "Lunch": [{ "name": "Soup", "servings": 1, "calories": 200 }] });
        let plan = parse_plan(fields.as_object().unwrap(), date());

        assert!(plan.breakfast.is_empty());
        assert_eq!(plan.lunch.len(), 1);
        assert!(plan.dinner.is_empty());
        assert!(plan.snacks.is_empty());
    }

    #[test]
    fn test_parse_plan_accepts_legacy_dates() {
        let fields = json!({
            "Dinner": [{
                "name": "Pasta",
                "servings": 2,
                "calories": 650.5,
                "macros": { "protein": 20, "carbs": 90, "fats": 15 },
                "date": "Mon Mar 04 2024",
                "section": "Dinner",
            }]
        });
        let plan = parse_plan(fields.as_object().unwrap(), date());

        assert_eq!(plan.dinner[0].date, date());
        assert_eq!(plan.dinner[0].servings, 2.0);
        assert_eq!(plan.dinner[0].macros.unwrap().carbs, 90.0);
    }

    #[test]
    fn test_parse_plan_skips_bad_entries() {
        let fields = json!({
            "Breakfast": "not a list",
            "Snacks": [
                { "name": "Apple", "servings": 1, "calories": 80 },
                "junk",
                { "servings": 1, "calories": 10 },
            ],
        });
        let plan = parse_plan(fields.as_object().unwrap(), date());

        assert!(plan.breakfast.is_empty());
        assert_eq!(plan.snacks.len(), 1);
        assert_eq!(plan.snacks[0].name, "Apple");
    }

    #[tokio::test]
    async fn test_ready_load_is_not_coalesced() {
        let load = PlanLoad::ready(Ok(LoadOutcome::Missing));
        assert!(!load.is_coalesced());
        assert_eq!(load.await.unwrap(), LoadOutcome::Missing);
    }
}
