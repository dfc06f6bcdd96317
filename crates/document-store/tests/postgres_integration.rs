//! PostgreSQL integration tests
//!
//! These tests use a shared PostgreSQL container and need Docker.
//! Run with:
//!
//! ```bash
//! cargo test -p document-store --test postgres_integration -- --ignored --test-threads=1
//! ```

use std::sync::Arc;

use document_store::{
    DocumentQuery, DocumentStore, DocumentStoreExt, PostgresDocumentStore, StoreError,
    StoredDocument, UniqueKey, Version,
};
use serde_json::json;
use sqlx::PgPool;
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;
use uuid::Uuid;

/// Shared container info - container stays alive for all tests
struct ContainerInfo {
    #[allow(dead_code)] // Container must stay alive for tests
    container: ContainerAsync<Postgres>,
    connection_string: String,
}

static CONTAINER: OnceCell<Arc<ContainerInfo>> = OnceCell::const_new();

async fn get_container_info() -> Arc<ContainerInfo> {
    CONTAINER
        .get_or_init(|| async {
            let container = Postgres::default().start().await.unwrap();

            let host = container.get_host().await.unwrap();
            let port = container.get_host_port_ipv4(5432).await.unwrap();

            let connection_string =
                format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

            let temp_pool = PgPool::connect(&connection_string).await.unwrap();
            sqlx::raw_sql(include_str!(
                "../../../migrations/001_create_documents_table.sql"
            ))
            .execute(&temp_pool)
            .await
            .unwrap();
            temp_pool.close().await;

            Arc::new(ContainerInfo {
                container,
                connection_string,
            })
        })
        .await
        .clone()
}

async fn get_test_store() -> PostgresDocumentStore {
    let info = get_container_info().await;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&info.connection_string)
        .await
        .unwrap();

    sqlx::query("TRUNCATE TABLE document_keys, documents")
        .execute(&pool)
        .await
        .unwrap();

    PostgresDocumentStore::new(pool)
}

fn payment(order_id: Uuid, status: &str) -> StoredDocument {
    StoredDocument::new(
        "payments",
        Uuid::new_v4(),
        json!({"order_id": order_id.to_string(), "status": status}),
    )
    .with_unique_key(UniqueKey::new("order_id", order_id))
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn insert_and_get_round_trips_keys() {
    let store = get_test_store().await;
    let order_id = Uuid::new_v4();
    let doc = payment(order_id, "pending");
    let id = doc.id;

    assert_eq!(store.insert(doc).await.unwrap(), Version::first());

    let loaded = store.get("payments", id).await.unwrap().unwrap();
    assert_eq!(loaded.version, Version::first());
    assert_eq!(loaded.body["status"], "pending");
    assert_eq!(
        loaded.unique_keys,
        vec![UniqueKey::new("order_id", order_id)]
    );

    let by_key = store
        .get_by_key("payments", &UniqueKey::new("order_id", order_id))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(by_key.id, id);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn duplicate_key_is_rejected() {
    let store = get_test_store().await;
    let order_id = Uuid::new_v4();

    store.insert(payment(order_id, "pending")).await.unwrap();
    let result = store.insert(payment(order_id, "pending")).await;

    assert!(matches!(result, Err(StoreError::DuplicateKey { .. })));
    assert_eq!(
        store.count("payments", DocumentQuery::new()).await.unwrap(),
        1
    );
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn duplicate_id_is_rejected() {
    let store = get_test_store().await;
    let doc = payment(Uuid::new_v4(), "pending");
    let mut again = doc.clone();
    again.unique_keys.clear();

    store.insert(doc).await.unwrap();
    let result = store.insert(again).await;

    assert!(matches!(result, Err(StoreError::DocumentExists { .. })));
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn stale_replace_is_a_conflict() {
    let store = get_test_store().await;
    let order_id = Uuid::new_v4();
    let doc = payment(order_id, "pending");
    let id = doc.id;

    let v1 = store.insert(doc.clone()).await.unwrap();
    let mut processing = doc.clone();
    processing.body = json!({"order_id": order_id.to_string(), "status": "processing"});
    let v2 = store.replace(processing, v1).await.unwrap();
    assert_eq!(v2, Version::new(2));

    let mut stale = doc;
    stale.body = json!({"order_id": order_id.to_string(), "status": "failed"});
    let result = store.replace(stale, v1).await;

    match result {
        Err(StoreError::ConcurrencyConflict {
            expected, actual, ..
        }) => {
            assert_eq!(expected, v1);
            assert_eq!(actual, v2);
        }
        other => panic!("expected conflict, got {other:?}"),
    }

    let loaded = store.get("payments", id).await.unwrap().unwrap();
    assert_eq!(loaded.body["status"], "processing");
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn replace_missing_document_is_not_found() {
    let store = get_test_store().await;
    let result = store
        .replace(payment(Uuid::new_v4(), "pending"), Version::first())
        .await;
    assert!(matches!(result, Err(StoreError::NotFound { .. })));
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn replace_swaps_unique_keys() {
    let store = get_test_store().await;
    let doc = StoredDocument::new("zones", Uuid::new_v4(), json!({"name": "North"}))
        .with_unique_key(UniqueKey::new("name", "North"));
    let v1 = store.insert(doc.clone()).await.unwrap();

    let renamed = StoredDocument::new("zones", doc.id, json!({"name": "Uptown"}))
        .with_unique_key(UniqueKey::new("name", "Uptown"));
    store.replace(renamed, v1).await.unwrap();

    let freed = StoredDocument::new("zones", Uuid::new_v4(), json!({"name": "North"}))
        .with_unique_key(UniqueKey::new("name", "North"));
    assert!(store.insert(freed).await.is_ok());
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn delete_checks_version_and_releases_keys() {
    let store = get_test_store().await;
    let order_id = Uuid::new_v4();
    let doc = payment(order_id, "pending");
    let id = doc.id;
    let v1 = store.insert(doc).await.unwrap();

    let stale = store.delete("payments", id, Version::new(7)).await;
    assert!(matches!(stale, Err(StoreError::ConcurrencyConflict { .. })));

    store.delete("payments", id, v1).await.unwrap();
    assert!(!store.exists("payments", id).await.unwrap());
    assert!(store.insert(payment(order_id, "pending")).await.is_ok());
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn find_filters_by_fields_in_insertion_order() {
    let store = get_test_store().await;
    let statuses = ["available", "busy", "available", "offline", "available"];
    let mut ids = Vec::new();
    for status in statuses {
        let doc = StoredDocument::new(
            "couriers",
            Uuid::new_v4(),
            json!({"status": status, "is_suspended": false}),
        );
        ids.push(doc.id);
        store.insert(doc).await.unwrap();
    }

    let available = store
        .find(
            "couriers",
            DocumentQuery::new()
                .eq("status", "available")
                .eq("is_suspended", false),
        )
        .await
        .unwrap();
    let found: Vec<Uuid> = available.iter().map(|d| d.id).collect();
    assert_eq!(found, vec![ids[0], ids[2], ids[4]]);

    let page = store
        .find(
            "couriers",
            DocumentQuery::new().eq("status", "available").offset(1).limit(1),
        )
        .await
        .unwrap();
    assert_eq!(page.len(), 1);
    assert_eq!(page[0].id, ids[2]);
}
