//! User profiles and weight history.
//!
//! Both live in the `users/{uid}` document. The weight history is an array
//! field that is rewritten as a whole on every append.

use chrono::Utc;
use serde_json::{json, Value};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;

use crate::date_key::DateKey;
use crate::error::ValidationError;
use crate::models::{Goal, UserProfile, WeightRecord};
use crate::store::{DocPath, DocumentStore, Fields, SetOptions, StoreError};

const WEIGHT_HISTORY: &str = "weightHistory";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProfileError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Answers collected by the onboarding flow.
#[derive(Debug, Clone, PartialEq)]
pub struct Onboarding {
    pub age: u32,
    /// Kilograms.
    pub weight: f64,
    /// Centimetres.
    pub height: f64,
    pub goal: Goal,
}

impl Onboarding {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.age == 0 {
            return Err(ValidationError::InvalidMeasurement {
                name: "age",
                value: 0.0,
            });
        }
        positive("weight", self.weight)?;
        positive("height", self.height)
    }
}

/// Fields edited on the profile screen. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GoalsUpdate {
    pub weight: Option<f64>,
    pub goal_weight: Option<f64>,
    pub cal_intake_goal: Option<u32>,
}

impl GoalsUpdate {
    pub fn is_empty(&self) -> bool {
        self.weight.is_none() && self.goal_weight.is_none() && self.cal_intake_goal.is_none()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(weight) = self.weight {
            positive("weight", weight)?;
        }
        if let Some(goal_weight) = self.goal_weight {
            positive("goalWeight", goal_weight)?;
        }
        if self.cal_intake_goal == Some(0) {
            return Err(ValidationError::InvalidMeasurement {
                name: "calIntakeGoal",
                value: 0.0,
            });
        }
        Ok(())
    }
}

fn positive(name: &'static str, value: f64) -> Result<(), ValidationError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ValidationError::InvalidMeasurement { name, value })
    }
}

/// Profile operations for any user.
pub struct ProfileService {
    store: Arc<dyn DocumentStore>,
    // Serializes read-modify-write cycles on the weight history
    history_lock: Mutex<()>,
}

impl ProfileService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            history_lock: Mutex::new(()),
        }
    }

    /// Creates (or resets) the profile document for a new account.
    pub async fn create_profile(
        &self,
        uid: &str,
        email: &str,
        name: Option<&str>,
    ) -> Result<(), ProfileError> {
        let path = user_path(uid)?;

        let mut fields = Fields::new();
        fields.insert("email".to_string(), Value::String(email.to_string()));
        if let Some(name) = name {
            fields.insert("name".to_string(), Value::String(name.to_string()));
        }
        fields.insert(
            "createdAt".to_string(),
            Value::String(Utc::now().to_rfc3339()),
        );

        self.store
            .set_document(&path, fields, SetOptions::replace())
            .await?;
        tracing::info!("Created profile for {}", uid);
        Ok(())
    }

    /// Reads the profile. Malformed weight history entries are dropped.
    pub async fn get_profile(&self, uid: &str) -> Result<Option<UserProfile>, ProfileError> {
        let path = user_path(uid)?;
        let Some(document) = self.store.get_document(&path).await? else {
            return Ok(None);
        };

        let mut fields = document.fields;
        let history = fields.remove(WEIGHT_HISTORY);

        let mut profile: UserProfile = serde_json::from_value(Value::Object(fields))
            .map_err(|e| StoreError::Codec {
                path: path.to_string(),
                reason: e.to_string(),
            })?;
        profile.weight_history = parse_history(history.as_ref());

        Ok(Some(profile))
    }

    pub async fn record_onboarding(
        &self,
        uid: &str,
        onboarding: &Onboarding,
    ) -> Result<(), ProfileError> {
        let path = user_path(uid)?;
        onboarding.validate()?;

        let fields = json!({
            "age": onboarding.age,
            "weight": onboarding.weight,
            "height": onboarding.height,
            "goal": onboarding.goal.to_string(),
        });
        self.store
            .set_document(&path, into_fields(fields), SetOptions::merge())
            .await?;
        Ok(())
    }

    /// Applies the supplied goal fields. A new weight is also appended to
    /// the weight history, dated `today`.
    pub async fn update_goals(
        &self,
        uid: &str,
        update: &GoalsUpdate,
        today: DateKey,
    ) -> Result<(), ProfileError> {
        let path = user_path(uid)?;
        update.validate()?;
        if update.is_empty() {
            return Ok(());
        }

        let mut fields = Fields::new();
        if let Some(weight) = update.weight {
            fields.insert("weight".to_string(), json!(weight));
        }
        if let Some(goal_weight) = update.goal_weight {
            fields.insert("goalWeight".to_string(), json!(goal_weight));
        }
        if let Some(cal_intake_goal) = update.cal_intake_goal {
            fields.insert("calIntakeGoal".to_string(), json!(cal_intake_goal));
        }
        self.store
            .set_document(&path, fields, SetOptions::merge())
            .await?;

        if let Some(weight) = update.weight {
            self.add_weight_entry(uid, weight, today).await?;
        }
        Ok(())
    }

    /// Appends a weight sample. Existing entries are kept as stored, even
    /// ones this crate cannot read.
    pub async fn add_weight_entry(
        &self,
        uid: &str,
        weight: f64,
        date: DateKey,
    ) -> Result<WeightRecord, ProfileError> {
        let path = user_path(uid)?;
        let record = WeightRecord::new(date, weight);
        record.validate()?;

        let _guard = self.history_lock.lock().await;

        let mut history = match self.store.get_document(&path).await? {
            Some(document) => match document.fields.get(WEIGHT_HISTORY) {
                Some(Value::Array(entries)) => entries.clone(),
                _ => Vec::new(),
            },
            None => Vec::new(),
        };
        history.push(json!({ "date": record.date, "weight": record.weight }));

        let mut fields = Fields::new();
        fields.insert(WEIGHT_HISTORY.to_string(), Value::Array(history));
        self.store
            .set_document(&path, fields, SetOptions::merge())
            .await?;

        tracing::debug!("Recorded weight {} for {}", record, uid);
        Ok(record)
    }

    /// Weight samples dated within `[start, end]`, in stored order.
    pub async fn weight_entries(
        &self,
        uid: &str,
        start: DateKey,
        end: DateKey,
    ) -> Result<Vec<WeightRecord>, ProfileError> {
        let path = user_path(uid)?;
        let Some(document) = self.store.get_document(&path).await? else {
            return Ok(Vec::new());
        };

        Ok(parse_history(document.fields.get(WEIGHT_HISTORY))
            .into_iter()
            .filter(|entry| entry.date >= start && entry.date <= end)
            .collect())
    }
}

fn user_path(uid: &str) -> Result<DocPath, ProfileError> {
    if uid.is_empty() {
        return Err(ValidationError::EmptyUserId.into());
    }
    Ok(DocPath::user(uid)?)
}

fn into_fields(value: Value) -> Fields {
    match value {
        Value::Object(fields) => fields,
        _ => Fields::new(),
    }
}

fn parse_history(value: Option<&Value>) -> Vec<WeightRecord> {
    let Some(Value::Array(entries)) = value else {
        return Vec::new();
    };

    entries
        .iter()
        .filter_map(|entry| match serde_json::from_value::<WeightRecord>(entry.clone()) {
            Ok(record) if record.is_valid() => Some(record),
            Ok(record) => {
                tracing::warn!("Dropping invalid weight entry {}", record);
                None
            }
            Err(e) => {
                tracing::warn!("Dropping malformed weight entry: {}", e);
                None
            }
        })
        .collect()
}
