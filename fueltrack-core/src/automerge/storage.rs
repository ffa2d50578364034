//! Automerge document storage for persisting documents to disk.

use async_trait::async_trait;
use automerge::AutoCommit;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tokio::sync::{broadcast, Mutex};

use super::{read_fields, write_fields};
use crate::store::{
    generate_id, sort_documents, ChangeHub, CollectionChange, DocPath, Document, DocumentStore,
    Fields, OrderBy, SetOptions, StoreError,
};

const EXTENSION: &str = "automerge";

/// [`DocumentStore`] that keeps one Automerge file per document.
///
/// File access and Automerge encoding run on Tokio's blocking pool, one
/// operation at a time.
pub struct AutomergeStore {
    layout: Layout,
    io_lock: Mutex<()>,
    hub: ChangeHub,
}

impl AutomergeStore {
    /// Creates a new storage instance rooted at `data_dir`. The directory is
    /// created on first write.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            layout: Layout {
                data_dir: data_dir.into(),
            },
            io_lock: Mutex::new(()),
            hub: ChangeHub::new(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.layout.data_dir
    }

    /// Returns the file path backing a document.
    pub fn file_path(&self, path: &DocPath) -> PathBuf {
        self.layout.file_path(path)
    }

    /// Runs `op` on the blocking pool while holding the I/O lock.
    async fn blocking<T, F>(&self, op: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&Layout) -> Result<T, StoreError> + Send + 'static,
    {
        let _guard = self.io_lock.lock().await;
        let layout = self.layout.clone();

        tokio::task::spawn_blocking(move || op(&layout))
            .await
            .map_err(|e| StoreError::Unavailable(format!("storage task failed: {}", e)))?
    }
}

/// Maps document paths to files under the data directory. Every method
/// blocks.
#[derive(Debug, Clone)]
struct Layout {
    data_dir: PathBuf,
}

impl Layout {
    fn file_path(&self, path: &DocPath) -> PathBuf {
        let dir = path
            .parent()
            .map(|parent| self.dir_path(&parent))
            .unwrap_or_else(|| self.data_dir.clone());
        dir.join(format!("{}.{}", path.id(), EXTENSION))
    }

    fn dir_path(&self, path: &DocPath) -> PathBuf {
        let mut dir = self.data_dir.clone();
        for segment in path.segments() {
            dir.push(segment);
        }
        dir
    }

    /// Loads a document from disk. `Ok(None)` if the file doesn't exist.
    fn load(&self, path: &DocPath) -> Result<Option<AutoCommit>, StoreError> {
        let file = self.file_path(path);

        match fs::read(&file) {
            Ok(bytes) => {
                let doc = AutoCommit::load(&bytes).map_err(|e| StoreError::Codec {
                    path: path.to_string(),
                    reason: e.to_string(),
                })?;
                Ok(Some(doc))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(io_error(&file, e)),
        }
    }

    fn save(&self, path: &DocPath, doc: &mut AutoCommit) -> Result<(), StoreError> {
        let file = self.file_path(path);
        if let Some(parent) = file.parent() {
            fs::create_dir_all(parent).map_err(|e| io_error(parent, e))?;
        }

        fs::write(&file, doc.save()).map_err(|e| io_error(&file, e))
    }

    fn read_document(&self, path: &DocPath) -> Result<Option<Document>, StoreError> {
        let Some(doc) = self.load(path)? else {
            return Ok(None);
        };

        let fields = read_fields(&doc).map_err(|e| StoreError::Codec {
            path: path.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Some(Document {
            id: path.id().to_string(),
            fields,
        }))
    }

    fn write_document(
        &self,
        path: &DocPath,
        fields: &Fields,
        options: SetOptions,
    ) -> Result<(), StoreError> {
        let mut doc = if options.merge {
            self.load(path)?.unwrap_or_else(AutoCommit::new)
        } else {
            AutoCommit::new()
        };

        write_fields(&mut doc, fields).map_err(|e| StoreError::Codec {
            path: path.to_string(),
            reason: e.to_string(),
        })?;

        self.save(path, &mut doc)
    }

    /// Deletes the file; `false` if there was nothing to delete.
    fn remove(&self, path: &DocPath) -> Result<bool, StoreError> {
        let file = self.file_path(path);
        match fs::remove_file(&file) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(io_error(&file, e)),
        }
    }

    fn list(&self, collection: &DocPath) -> Result<Vec<Document>, StoreError> {
        let dir = self.dir_path(collection);

        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(io_error(&dir, e)),
        };

        let mut documents = Vec::new();
        for entry in entries {
            let file = entry.map_err(|e| io_error(&dir, e))?.path();
            if file.extension().and_then(|ext| ext.to_str()) != Some(EXTENSION) {
                continue;
            }
            let Some(id) = file.file_stem().and_then(|stem| stem.to_str()) else {
                continue;
            };
            let Ok(path) = collection.child(id) else {
                tracing::warn!("Skipping unexpected file {}", file.display());
                continue;
            };

            if let Some(document) = self.read_document(&path)? {
                documents.push(document);
            }
        }

        Ok(documents)
    }
}

#[async_trait]
impl DocumentStore for AutomergeStore {
    async fn get_document(&self, path: &DocPath) -> Result<Option<Document>, StoreError> {
        path.expect_document()?;
        let path = path.clone();
        self.blocking(move |layout| layout.read_document(&path)).await
    }

    async fn set_document(
        &self,
        path: &DocPath,
        fields: Fields,
        options: SetOptions,
    ) -> Result<(), StoreError> {
        path.expect_document()?;
        let field_count = fields.len();
        {
            let path = path.clone();
            self.blocking(move |layout| layout.write_document(&path, &fields, options))
                .await?;
        }

        tracing::debug!("Wrote {} ({} fields)", path, field_count);
        self.hub
            .notify(path, CollectionChange::Written(path.id().to_string()))
            .await;
        Ok(())
    }

    async fn add_document(
        &self,
        collection: &DocPath,
        fields: Fields,
    ) -> Result<String, StoreError> {
        collection.expect_collection()?;
        let id = generate_id();
        let path = collection.child(&id)?;
        self.set_document(&path, fields, SetOptions::replace())
            .await?;
        Ok(id)
    }

    async fn delete_document(&self, path: &DocPath) -> Result<(), StoreError> {
        path.expect_document()?;
        let removed = {
            let path = path.clone();
            self.blocking(move |layout| layout.remove(&path)).await?
        };

        if removed {
            tracing::debug!("Deleted {}", path);
            self.hub
                .notify(path, CollectionChange::Deleted(path.id().to_string()))
                .await;
        }
        Ok(())
    }

    async fn list_documents(
        &self,
        collection: &DocPath,
        order_by: Option<&OrderBy>,
    ) -> Result<Vec<Document>, StoreError> {
        collection.expect_collection()?;
        let mut documents = {
            let collection = collection.clone();
            self.blocking(move |layout| layout.list(&collection)).await?
        };

        sort_documents(&mut documents, order_by);
        Ok(documents)
    }

    async fn changes(&self, collection: &DocPath) -> broadcast::Receiver<CollectionChange> {
        self.hub.subscribe(collection).await
    }
}

fn io_error(path: &Path, e: io::Error) -> StoreError {
    StoreError::Unavailable(format!("I/O error for {}: {}", path.display(), e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::date_key::DateKey;
    use serde_json::json;
    use tempfile::TempDir;

    fn test_store() -> (AutomergeStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = AutomergeStore::new(temp_dir.path());
        (store, temp_dir)
    }

    fn fields(value: serde_json::Value) -> Fields {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_file_layout() {
        let (store, temp) = test_store();
        let date = DateKey::from_ymd(2024, 3, 4).unwrap();
        let path = DocPath::meal_plan("u1", &date).unwrap();

        assert_eq!(
            store.file_path(&path),
            temp.path()
                .join("users")
                .join("u1")
                .join("mealPlans")
                .join("2024-03-04.automerge")
        );
    }

    #[tokio::test]
    async fn test_load_nonexistent_returns_none() {
        let (store, _temp) = test_store();
        let path = DocPath::user("u1").unwrap();
        assert!(store.get_document(&path).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_creates_directories() {
        let (store, _temp) = test_store();
        let path = DocPath::meal("u1", "m1").unwrap();

        store
            .set_document(&path, fields(json!({ "name": "Oats" })), SetOptions::replace())
            .await
            .unwrap();

        assert!(store.file_path(&path).exists());
        let doc = store.get_document(&path).await.unwrap().unwrap();
        assert_eq!(doc.id, "m1");
        assert_eq!(doc.fields, fields(json!({ "name": "Oats" })));
    }

    #[tokio::test]
    async fn test_merge_writes_leave_other_sections() {
        let (store, _temp) = test_store();
        let date = DateKey::from_ymd(2024, 3, 4).unwrap();
        let path = DocPath::meal_plan("u1", &date).unwrap();

        store
            .set_document(
                &path,
                fields(json!({ "Breakfast": [{ "name": "Oats" }] })),
                SetOptions::merge(),
            )
            .await
            .unwrap();
        store
            .set_document(
                &path,
                fields(json!({ "Lunch": [{ "name": "Soup" }] })),
                SetOptions::merge(),
            )
            .await
            .unwrap();

        let doc = store.get_document(&path).await.unwrap().unwrap();
        assert_eq!(doc.fields["Breakfast"], json!([{ "name": "Oats" }]));
        assert_eq!(doc.fields["Lunch"], json!([{ "name": "Soup" }]));

        store
            .set_document(&path, fields(json!({ "Dinner": [] })), SetOptions::replace())
            .await
            .unwrap();
        let doc = store.get_document(&path).await.unwrap().unwrap();
        assert_eq!(doc.fields, fields(json!({ "Dinner": [] })));
    }

    #[tokio::test]
    async fn test_list_and_delete() {
        let (store, _temp) = test_store();
        let meals = DocPath::meals("u1").unwrap();

        let first = store
            .add_document(&meals, fields(json!({ "createdAt": "2024-03-04T10:00:00Z" })))
            .await
            .unwrap();
        let second = store
            .add_document(&meals, fields(json!({ "createdAt": "2024-03-04T08:00:00Z" })))
            .await
            .unwrap();

        let listed = store
            .list_documents(&meals, Some(&OrderBy::asc("createdAt")))
            .await
            .unwrap();
        let ids: Vec<&str> = listed.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec![second.as_str(), first.as_str()]);

        store
            .delete_document(&DocPath::meal("u1", &first).unwrap())
            .await
            .unwrap();
        store
            .delete_document(&DocPath::meal("u1", &first).unwrap())
            .await
            .unwrap();

        assert_eq!(store.list_documents(&meals, None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_list_missing_collection_is_empty() {
        let (store, _temp) = test_store();
        let meals = DocPath::meals("nobody").unwrap();
        assert!(store.list_documents(&meals, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_file_is_codec_error() {
        let (store, _temp) = test_store();
        let path = DocPath::user("u1").unwrap();
        let file = store.file_path(&path);
        fs::create_dir_all(file.parent().unwrap()).unwrap();
        fs::write(&file, b"not automerge").unwrap();

        assert!(matches!(
            store.get_document(&path).await,
            Err(StoreError::Codec { .. })
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_writes_from_many_tasks() {
        let (store, _temp) = test_store();
        let store = std::sync::Arc::new(store);
        let meals = DocPath::meals("u1").unwrap();

        let tasks: Vec<_> = (0..8)
            .map(|i| {
                let store = store.clone();
                let meals = meals.clone();
                tokio::spawn(async move {
                    store
                        .add_document(&meals, fields(json!({ "servings": i })))
                        .await
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        assert_eq!(store.list_documents(&meals, None).await.unwrap().len(), 8);
    }

    #[tokio::test]
    async fn test_writes_notify_subscribers() {
        let (store, _temp) = test_store();
        let meals = DocPath::meals("u1").unwrap();
        let mut rx = store.changes(&meals).await;

        let id = store.add_document(&meals, Fields::new()).await.unwrap();
        assert_eq!(rx.recv().await.unwrap(), CollectionChange::Written(id));
    }
}
