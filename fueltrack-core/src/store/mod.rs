//! Remote document store collaborator.
//!
//! The rest of the crate only talks to storage through [`DocumentStore`],
//! which models a hierarchical document database: documents hold a map of
//! JSON fields and live in collections addressed by [`DocPath`].
//!
//! Two implementations ship with the crate:
//! - [`MemoryStore`]: in-process, instrumented for tests
//! - [`AutomergeStore`](crate::automerge::AutomergeStore): one Automerge file per document

mod error;
mod hub;
mod memory;
mod path;

use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::cmp::Ordering;
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};

pub use error::StoreError;
pub use hub::{ChangeHub, CollectionChange};
pub use memory::MemoryStore;
pub use path::DocPath;

/// Field map of a document.
pub type Fields = serde_json::Map<String, Value>;

/// A document as returned by reads.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub fields: Fields,
}

impl Document {
    /// Decodes the fields into `T`, exposing the document id as an `id` field
    /// unless the document already carries one.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        let mut fields = self.fields.clone();
        fields
            .entry("id")
            .or_insert_with(|| Value::String(self.id.clone()));
        serde_json::from_value(Value::Object(fields))
    }
}

/// Write mode for [`DocumentStore::set_document`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SetOptions {
    /// Keep fields that are not part of the write.
    pub merge: bool,
}

impl SetOptions {
    pub fn merge() -> Self {
        Self { merge: true }
    }

    pub fn replace() -> Self {
        Self { merge: false }
    }
}

/// Sort order for collection reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub field: String,
    pub descending: bool,
}

impl OrderBy {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            descending: false,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            descending: true,
        }
    }
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Reads one document. `Ok(None)` if it does not exist.
    async fn get_document(&self, path: &DocPath) -> Result<Option<Document>, StoreError>;

    /// Writes a document, creating it if needed.
    async fn set_document(
        &self,
        path: &DocPath,
        fields: Fields,
        options: SetOptions,
    ) -> Result<(), StoreError>;

    /// Creates a document with a generated id and returns that id.
    async fn add_document(&self, collection: &DocPath, fields: Fields)
        -> Result<String, StoreError>;

    /// Deletes a document. Deleting a missing document succeeds.
    async fn delete_document(&self, path: &DocPath) -> Result<(), StoreError>;

    /// One-shot read of every document in a collection.
    async fn list_documents(
        &self,
        collection: &DocPath,
        order_by: Option<&OrderBy>,
    ) -> Result<Vec<Document>, StoreError>;

    /// Change notifications for a collection.
    async fn changes(&self, collection: &DocPath) -> broadcast::Receiver<CollectionChange>;
}

/// Live query: yields the current contents of `collection`, then a fresh
/// snapshot after every change. Bursts of changes collapse into one snapshot.
pub fn subscribe(
    store: Arc<dyn DocumentStore>,
    collection: DocPath,
    order_by: Option<OrderBy>,
) -> BoxStream<'static, Result<Vec<Document>, StoreError>> {
    let init = (
        store,
        collection,
        order_by,
        None::<broadcast::Receiver<CollectionChange>>,
    );

    stream::unfold(init, |(store, collection, order_by, receiver)| async move {
        let receiver = match receiver {
            // Subscribe before the first read so no write slips between them
            None => store.changes(&collection).await,
            Some(mut receiver) => {
                match receiver.recv().await {
                    Ok(_) | Err(RecvError::Lagged(_)) => {}
                    Err(RecvError::Closed) => return None,
                }
                drain(&mut receiver);
                receiver
            }
        };

        let snapshot = store.list_documents(&collection, order_by.as_ref()).await;
        Some((snapshot, (store, collection, order_by, Some(receiver))))
    })
    .boxed()
}

fn drain(receiver: &mut broadcast::Receiver<CollectionChange>) {
    loop {
        match receiver.try_recv() {
            Ok(_) | Err(TryRecvError::Lagged(_)) => continue,
            Err(_) => break,
        }
    }
}

pub(crate) fn generate_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// Orders documents by a field. Missing fields sort first; ties keep id order.
pub(crate) fn sort_documents(documents: &mut [Document], order_by: Option<&OrderBy>) {
    documents.sort_by(|a, b| a.id.cmp(&b.id));

    if let Some(order) = order_by {
        documents.sort_by(|a, b| {
            let ordering = compare_values(a.fields.get(&order.field), b.fields.get(&order.field));
            if order.descending {
                ordering.reverse()
            } else {
                ordering
            }
        });
    }
}

fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let x = x.as_f64().unwrap_or(0.0);
            let y = y.as_f64().unwrap_or(0.0);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(x), Some(y)) => x.to_string().cmp(&y.to_string()),
    }
}
