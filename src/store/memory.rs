use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use uuid::Uuid;

use super::{
    ChangeFeed, Collection, CollectionWatch, Document, DocumentStore, StoreError, StoreResult,
    merge_patch,
};

/// In-memory document store used in tests and when no database is
/// configured. Contents do not survive a restart.
pub struct MemoryStore {
    collections: RwLock<HashMap<Collection, HashMap<Uuid, Document>>>,
    feed: ChangeFeed,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
            feed: ChangeFeed::new(),
        }
    }

    fn snapshot(&self, collection: Collection) -> Vec<Document> {
        let collections = self.collections.read().unwrap_or_else(|e| e.into_inner());
        let mut docs: Vec<Document> = collections
            .get(&collection)
            .map(|m| m.values().cloned().collect())
            .unwrap_or_default();
        docs.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        docs
    }

    fn publish(&self, collection: Collection) {
        self.feed.publish(collection, self.snapshot(collection));
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn create(&self, collection: Collection, data: Value) -> StoreResult<Document> {
        let now = Utc::now();
        let doc = Document {
            id: Uuid::new_v4(),
            collection,
            data,
            created_at: now,
            updated_at: now,
        };
        {
            let mut collections = self.collections.write().unwrap_or_else(|e| e.into_inner());
            collections
                .entry(collection)
                .or_default()
                .insert(doc.id, doc.clone());
        }
        self.publish(collection);
        Ok(doc)
    }

    async fn get(&self, collection: Collection, id: Uuid) -> StoreResult<Option<Document>> {
        let collections = self.collections.read().unwrap_or_else(|e| e.into_inner());
        Ok(collections.get(&collection).and_then(|m| m.get(&id)).cloned())
    }

    async fn list(&self, collection: Collection) -> StoreResult<Vec<Document>> {
        Ok(self.snapshot(collection))
    }

    async fn update(
        &self,
        collection: Collection,
        id: Uuid,
        patch: Value,
    ) -> StoreResult<Document> {
        let updated = {
            let mut collections = self.collections.write().unwrap_or_else(|e| e.into_inner());
            let doc = collections
                .get_mut(&collection)
                .and_then(|m| m.get_mut(&id))
                .ok_or(StoreError::NotFound)?;
            merge_patch(&mut doc.data, &patch)?;
            doc.updated_at = Utc::now();
            doc.clone()
        };
        self.publish(collection);
        Ok(updated)
    }

    async fn delete(&self, collection: Collection, id: Uuid) -> StoreResult<bool> {
        let removed = {
            let mut collections = self.collections.write().unwrap_or_else(|e| e.into_inner());
            collections
                .get_mut(&collection)
                .and_then(|m| m.remove(&id))
                .is_some()
        };
        if removed {
            self.publish(collection);
        }
        Ok(removed)
    }

    async fn watch(&self, collection: Collection) -> StoreResult<CollectionWatch> {
        // Subscribe before snapshotting so no change can fall in between.
        let rx = self.feed.subscribe(collection);
        Ok(CollectionWatch::new(self.snapshot(collection), rx))
    }
}
