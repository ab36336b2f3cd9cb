//! Postgres adapter round trip. Self-skips when no database is
//! configured in the environment.

use serde_json::json;

use garage_api::{
    db::{create_orm_conn, run_migrations},
    store::{Collection, DocumentStore, PgStore, StoreError},
};

#[tokio::test]
async fn documents_round_trip_through_postgres() -> anyhow::Result<()> {
    let database_url = match std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
    {
        Ok(url) => url,
        Err(_) => {
            eprintln!(
                "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run the Postgres store test."
            );
            return Ok(());
        }
    };

    let conn = create_orm_conn(&database_url).await?;
    run_migrations(&conn).await?;
    let store = PgStore::new(conn);

    let created = store
        .create(
            Collection::Products,
            json!({ "name": "Test part", "price": 12.5, "stock": 3, "available": true }),
        )
        .await?;

    let fetched = store
        .get(Collection::Products, created.id)
        .await?
        .expect("created document should be readable");
    assert_eq!(fetched.data["name"], "Test part");

    // Watch sees mutations made through this process.
    let mut watch = store.watch(Collection::Products).await?;
    let updated = store
        .update(Collection::Products, created.id, json!({ "stock": 2 }))
        .await?;
    assert_eq!(updated.data["stock"], 2);
    let snapshot = watch.changed().await.expect("watch should stay open");
    assert!(snapshot.iter().any(|d| d.id == created.id));

    // Shallow patch keeps untouched fields.
    assert_eq!(updated.data["name"], "Test part");

    // Patch of a missing document is NotFound.
    let missing = store
        .update(Collection::Products, uuid::Uuid::new_v4(), json!({ "stock": 1 }))
        .await;
    assert!(matches!(missing, Err(StoreError::NotFound)));

    // Cleanup; deleting twice reports false the second time.
    assert!(store.delete(Collection::Products, created.id).await?);
    assert!(!store.delete(Collection::Products, created.id).await?);

    Ok(())
}
