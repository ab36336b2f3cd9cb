use async_trait::async_trait;
use chrono::Utc;
use sea_orm::ActiveValue::Set;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
};
use serde_json::Value;
use uuid::Uuid;

use crate::entity::documents::{ActiveModel as DocumentActive, Column, Model as DocumentModel};
use crate::entity::Documents;

use super::{
    ChangeFeed, Collection, CollectionWatch, Document, DocumentStore, StoreError, StoreResult,
    merge_patch,
};

/// Postgres adapter: one JSONB row per document, keyed by
/// (collection, id). Watch notifications cover mutations made through this
/// process only.
// TODO: bridge Postgres LISTEN/NOTIFY into the change feed so watchers see
// writes from other app instances.
pub struct PgStore {
    conn: DatabaseConnection,
    feed: ChangeFeed,
}

impl PgStore {
    pub fn new(conn: DatabaseConnection) -> Self {
        Self {
            conn,
            feed: ChangeFeed::new(),
        }
    }

    async fn snapshot(&self, collection: Collection) -> StoreResult<Vec<Document>> {
        let models = Documents::find()
            .filter(Column::Collection.eq(collection.as_str()))
            .order_by_asc(Column::CreatedAt)
            .order_by_asc(Column::Id)
            .all(&self.conn)
            .await?;
        Ok(models
            .into_iter()
            .map(|m| doc_from_model(collection, m))
            .collect())
    }

    async fn publish(&self, collection: Collection) {
        match self.snapshot(collection).await {
            Ok(docs) => self.feed.publish(collection, docs),
            Err(err) => {
                tracing::warn!(%collection, error = %err, "failed to publish collection change")
            }
        }
    }
}

fn doc_from_model(collection: Collection, model: DocumentModel) -> Document {
    Document {
        id: model.id,
        collection,
        data: model.data,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}

#[async_trait]
impl DocumentStore for PgStore {
    async fn create(&self, collection: Collection, data: Value) -> StoreResult<Document> {
        let now = Utc::now();
        let model = DocumentActive {
            collection: Set(collection.as_str().to_string()),
            id: Set(Uuid::new_v4()),
            data: Set(data),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        }
        .insert(&self.conn)
        .await?;
        self.publish(collection).await;
        Ok(doc_from_model(collection, model))
    }

    async fn get(&self, collection: Collection, id: Uuid) -> StoreResult<Option<Document>> {
        let model = Documents::find_by_id((collection.as_str().to_string(), id))
            .one(&self.conn)
            .await?;
        Ok(model.map(|m| doc_from_model(collection, m)))
    }

    async fn list(&self, collection: Collection) -> StoreResult<Vec<Document>> {
        self.snapshot(collection).await
    }

    async fn update(
        &self,
        collection: Collection,
        id: Uuid,
        patch: Value,
    ) -> StoreResult<Document> {
        let existing = Documents::find_by_id((collection.as_str().to_string(), id))
            .one(&self.conn)
            .await?
            .ok_or(StoreError::NotFound)?;

        let mut data = existing.data.clone();
        merge_patch(&mut data, &patch)?;

        let mut active: DocumentActive = existing.into();
        active.data = Set(data);
        active.updated_at = Set(Utc::now().into());
        let model = active.update(&self.conn).await?;

        self.publish(collection).await;
        Ok(doc_from_model(collection, model))
    }

    async fn delete(&self, collection: Collection, id: Uuid) -> StoreResult<bool> {
        let result = Documents::delete_by_id((collection.as_str().to_string(), id))
            .exec(&self.conn)
            .await?;
        let removed = result.rows_affected > 0;
        if removed {
            self.publish(collection).await;
        }
        Ok(removed)
    }

    async fn watch(&self, collection: Collection) -> StoreResult<CollectionWatch> {
        // Subscribe before snapshotting so no change can fall in between.
        let rx = self.feed.subscribe(collection);
        let current = self.snapshot(collection).await?;
        Ok(CollectionWatch::new(current, rx))
    }
}
