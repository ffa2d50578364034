//! In-process document store.
//!
//! Besides backing short-lived sessions, this is the test double for every
//! component that talks to the remote store: it counts operations, can hold
//! reads in flight, and can inject transient failures.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::{broadcast, watch, RwLock};

use super::{
    generate_id, sort_documents, ChangeHub, CollectionChange, DocPath, Document, DocumentStore,
    Fields, OrderBy, SetOptions, StoreError,
};

pub struct MemoryStore {
    documents: RwLock<BTreeMap<DocPath, Fields>>,
    hub: ChangeHub,
    reads: AtomicUsize,
    writes: AtomicUsize,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    read_gate: watch::Sender<bool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        let (read_gate, _) = watch::channel(false);
        Self {
            documents: RwLock::new(BTreeMap::new()),
            hub: ChangeHub::new(),
            reads: AtomicUsize::new(0),
            writes: AtomicUsize::new(0),
            fail_reads: AtomicBool::new(false),
            fail_writes: AtomicBool::new(false),
            read_gate,
        }
    }

    /// Number of `get_document`/`list_documents` calls so far, including
    /// ones that are still waiting or that failed.
    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Number of write calls so far, including failed ones.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Holds every subsequent read until [`resume_reads`](Self::resume_reads).
    pub fn pause_reads(&self) {
        self.read_gate.send_replace(true);
    }

    pub fn resume_reads(&self) {
        self.read_gate.send_replace(false);
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Direct read that bypasses counters, gates and failure injection.
    pub async fn peek(&self, path: &DocPath) -> Option<Fields> {
        self.documents.read().await.get(path).cloned()
    }

    async fn begin_read(&self) -> Result<(), StoreError> {
        self.reads.fetch_add(1, Ordering::SeqCst);

        let mut gate = self.read_gate.subscribe();
        loop {
            let paused = *gate.borrow_and_update();
            if !paused || gate.changed().await.is_err() {
                break;
            }
        }

        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("injected read failure".to_string()));
        }
        Ok(())
    }

    fn begin_write(&self) -> Result<(), StoreError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("injected write failure".to_string()));
        }
        Ok(())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get_document(&self, path: &DocPath) -> Result<Option<Document>, StoreError> {
        path.expect_document()?;
        self.begin_read().await?;

        let documents = self.documents.read().await;
        Ok(documents.get(path).map(|fields| Document {
            id: path.id().to_string(),
            fields: fields.clone(),
        }))
    }

    async fn set_document(
        &self,
        path: &DocPath,
        fields: Fields,
        options: SetOptions,
    ) -> Result<(), StoreError> {
        path.expect_document()?;
        self.begin_write()?;

        {
            let mut documents = self.documents.write().await;
            match documents.get_mut(path) {
                Some(existing) if options.merge => existing.extend(fields),
                _ => {
                    documents.insert(path.clone(), fields);
                }
            }
        }

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
        self.begin_write()?;

        let removed = self.documents.write().await.remove(path).is_some();
        if removed {
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
        self.begin_read().await?;

        let documents = self.documents.read().await;
        let mut found: Vec<Document> = documents
            .iter()
            .filter(|(path, _)| path.parent().as_ref() == Some(collection))
            .map(|(path, fields)| Document {
                id: path.id().to_string(),
                fields: fields.clone(),
            })
            .collect();

        sort_documents(&mut found, order_by);
        Ok(found)
    }

    async fn changes(&self, collection: &DocPath) -> broadcast::Receiver<CollectionChange> {
        self.hub.subscribe(collection).await
    }
}
