//! Port for the hosted document database the storefront delegates all
//! persistence to: four primitive operations (create, get, update with a
//! patch, delete) plus collection listing and a live `watch` subscription.
//! Two adapters exist: [`MemoryStore`] for dev/tests and [`PgStore`] for
//! deployments backed by a JSONB table.

use std::collections::HashMap;
use std::fmt;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use thiserror::Error;
use tokio::sync::broadcast;
use uuid::Uuid;

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// The four collections the storefront consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Products,
    Commands,
    Reservations,
    ContactMessages,
}

impl Collection {
    pub fn as_str(self) -> &'static str {
        match self {
            Collection::Products => "products",
            Collection::Commands => "commands",
            Collection::Reservations => "reservations",
            Collection::ContactMessages => "contactMessages",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One stored document. `data` is opaque to the store; the domain layer
/// decodes it into typed models.
#[derive(Debug, Clone)]
pub struct Document {
    pub id: Uuid,
    pub collection: Collection,
    pub data: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("document not found")]
    NotFound,

    #[error("invalid patch: {0}")]
    Patch(String),

    #[error("database error: {0}")]
    Db(#[from] sea_orm::DbErr),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Creates a document with a generated id and returns it.
    async fn create(&self, collection: Collection, data: Value) -> StoreResult<Document>;

    async fn get(&self, collection: Collection, id: Uuid) -> StoreResult<Option<Document>>;

    /// All documents of the collection, oldest first.
    async fn list(&self, collection: Collection) -> StoreResult<Vec<Document>>;

    /// Shallow-merges the top-level fields of `patch` into the document.
    async fn update(&self, collection: Collection, id: Uuid, patch: Value)
    -> StoreResult<Document>;

    /// Returns whether a document was actually removed; removing an absent
    /// id is not an error.
    async fn delete(&self, collection: Collection, id: Uuid) -> StoreResult<bool>;

    /// Subscribes to the collection: the watch carries the current listing
    /// and then yields a fresh listing on every change until dropped.
    async fn watch(&self, collection: Collection) -> StoreResult<CollectionWatch>;
}

/// Live subscription handle; dropping it unsubscribes.
pub struct CollectionWatch {
    pub current: Vec<Document>,
    rx: broadcast::Receiver<Vec<Document>>,
}

impl CollectionWatch {
    pub(crate) fn new(current: Vec<Document>, rx: broadcast::Receiver<Vec<Document>>) -> Self {
        Self { current, rx }
    }

    /// Next collection snapshot, or `None` once the store is gone. A lagged
    /// receiver skips straight to the most recent snapshot.
    pub async fn changed(&mut self) -> Option<Vec<Document>> {
        loop {
            match self.rx.recv().await {
                Ok(docs) => return Some(docs),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "collection watch lagged; catching up");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

const WATCH_CHANNEL_CAPACITY: usize = 32;

/// Fan-out of per-collection snapshots to any number of watchers. Both
/// store adapters publish here after every mutation.
pub(crate) struct ChangeFeed {
    senders: Mutex<HashMap<Collection, broadcast::Sender<Vec<Document>>>>,
}

impl ChangeFeed {
    pub(crate) fn new() -> Self {
        Self {
            senders: Mutex::new(HashMap::new()),
        }
    }

    pub(crate) fn publish(&self, collection: Collection, docs: Vec<Document>) {
        let senders = self.senders.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(sender) = senders.get(&collection) {
            // A send error only means nobody is listening right now.
            let _ = sender.send(docs);
        }
    }

    pub(crate) fn subscribe(&self, collection: Collection) -> broadcast::Receiver<Vec<Document>> {
        let mut senders = self.senders.lock().unwrap_or_else(|e| e.into_inner());
        senders
            .entry(collection)
            .or_insert_with(|| broadcast::channel(WATCH_CHANNEL_CAPACITY).0)
            .subscribe()
    }
}

/// Shallow top-level merge, the patch semantics of `update`.
pub(crate) fn merge_patch(data: &mut Value, patch: &Value) -> StoreResult<()> {
    let patch = patch
        .as_object()
        .ok_or_else(|| StoreError::Patch("patch must be a JSON object".to_string()))?;
    let target = data
        .as_object_mut()
        .ok_or_else(|| StoreError::Patch("document data is not a JSON object".to_string()))?;
    for (key, value) in patch {
        target.insert(key.clone(), value.clone());
    }
    Ok(())
}
