use async_trait::async_trait;
use sqlx::{PgConnection, PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::{
    DocumentQuery, Result, StoreError, StoredDocument, UniqueKey, Version,
    store::{DocumentStore, record_conflict, validate_document},
};

const SELECT_DOCUMENT: &str = r#"
SELECT d.collection, d.id, d.version, d.body, d.updated_at,
       COALESCE(
           (SELECT jsonb_agg(jsonb_build_object('name', k.key_name, 'value', k.key_value))
            FROM document_keys k
            WHERE k.collection = d.collection AND k.document_id = d.id),
           '[]'::jsonb
       ) AS unique_keys
FROM documents d
"#;

/// PostgreSQL-backed document store implementation.
#[derive(Clone)]
pub struct PostgresDocumentStore {
    pool: PgPool,
}

impl PostgresDocumentStore {
    /// Creates a new PostgreSQL document store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    fn row_to_document(row: PgRow) -> Result<StoredDocument> {
        let keys: serde_json::Value = row.try_get("unique_keys")?;

        Ok(StoredDocument {
            collection: row.try_get("collection")?,
            id: row.try_get::<Uuid, _>("id")?,
            version: Version::new(row.try_get("version")?),
            body: row.try_get("body")?,
            unique_keys: serde_json::from_value(keys)?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    async fn current_version(&self, collection: &str, id: Uuid) -> Result<Option<Version>> {
        let version: Option<i64> =
            sqlx::query_scalar("SELECT version FROM documents WHERE collection = $1 AND id = $2")
                .bind(collection)
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(version.map(Version::new))
    }

    async fn claim_keys(conn: &mut PgConnection, document: &StoredDocument) -> Result<()> {
        for key in &document.unique_keys {
            sqlx::query(
                r#"
                INSERT INTO document_keys (collection, key_name, key_value, document_id)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(&document.collection)
            .bind(&key.name)
            .bind(&key.value)
            .bind(document.id)
            .execute(&mut *conn)
            .await
            .map_err(|e| map_write_error(e, document, Some(key)))?;
        }
        Ok(())
    }

    /// Maps a failed compare-and-swap to `NotFound` or `ConcurrencyConflict`.
    async fn lost_race(&self, collection: &str, id: Uuid, expected: Version) -> StoreError {
        match self.current_version(collection, id).await {
            Ok(Some(actual)) => {
                record_conflict(collection, id, expected, actual);
                StoreError::ConcurrencyConflict {
                    collection: collection.to_string(),
                    id,
                    expected,
                    actual,
                }
            }
            Ok(None) => StoreError::NotFound {
                collection: collection.to_string(),
                id,
            },
            Err(e) => e,
        }
    }
}

fn map_write_error(e: sqlx::Error, document: &StoredDocument, key: Option<&UniqueKey>) -> StoreError {
    if let sqlx::Error::Database(ref db_err) = e {
        match db_err.constraint() {
            Some("documents_pkey") => {
                return StoreError::DocumentExists {
                    collection: document.collection.clone(),
                    id: document.id,
                };
            }
            Some("unique_document_key") => {
                if let Some(key) = key {
                    return StoreError::DuplicateKey {
                        collection: document.collection.clone(),
                        key: key.name.clone(),
                        value: key.value.clone(),
                    };
                }
            }
            _ => {}
        }
    }
    StoreError::Database(e)
}

#[async_trait]
impl DocumentStore for PostgresDocumentStore {
    async fn insert(&self, document: StoredDocument) -> Result<Version> {
        validate_document(&document)?;

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO documents (collection, id, version, body, updated_at)
            VALUES ($1, $2, $3, $4, NOW())
            "#,
        )
        .bind(&document.collection)
        .bind(document.id)
        .bind(Version::first().as_i64())
        .bind(&document.body)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_write_error(e, &document, None))?;

        Self::claim_keys(&mut *tx, &document).await?;

        tx.commit().await?;
        Ok(Version::first())
    }

    async fn replace(&self, document: StoredDocument, expected: Version) -> Result<Version> {
        validate_document(&document)?;

        let new_version = expected.next();
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            r#"
            UPDATE documents
            SET body = $3, version = $4, updated_at = NOW()
            WHERE collection = $1 AND id = $2 AND version = $5
            "#,
        )
        .bind(&document.collection)
        .bind(document.id)
        .bind(&document.body)
        .bind(new_version.as_i64())
        .bind(expected.as_i64())
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(self
                .lost_race(&document.collection, document.id, expected)
                .await);
        }

        sqlx::query("DELETE FROM document_keys WHERE collection = $1 AND document_id = $2")
            .bind(&document.collection)
            .bind(document.id)
            .execute(&mut *tx)
            .await?;

        Self::claim_keys(&mut *tx, &document).await?;

        tx.commit().await?;
        Ok(new_version)
    }

    async fn delete(&self, collection: &str, id: Uuid, expected: Version) -> Result<()> {
        let deleted =
            sqlx::query("DELETE FROM documents WHERE collection = $1 AND id = $2 AND version = $3")
                .bind(collection)
                .bind(id)
                .bind(expected.as_i64())
                .execute(&self.pool)
                .await?;

        if deleted.rows_affected() == 0 {
            return Err(self.lost_race(collection, id, expected).await);
        }
        Ok(())
    }

    async fn get(&self, collection: &str, id: Uuid) -> Result<Option<StoredDocument>> {
        let sql = format!("{SELECT_DOCUMENT} WHERE d.collection = $1 AND d.id = $2");
        let row = sqlx::query(&sql)
            .bind(collection)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Self::row_to_document).transpose()
    }

    async fn get_by_key(
        &self,
        collection: &str,
        key: &UniqueKey,
    ) -> Result<Option<StoredDocument>> {
        let sql = format!(
            "{SELECT_DOCUMENT} WHERE d.collection = $1 AND d.id = (
                SELECT document_id FROM document_keys
                WHERE collection = $1 AND key_name = $2 AND key_value = $3
            )"
        );
        let row = sqlx::query(&sql)
            .bind(collection)
            .bind(&key.name)
            .bind(&key.value)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Self::row_to_document).transpose()
    }

    async fn find(&self, collection: &str, query: DocumentQuery) -> Result<Vec<StoredDocument>> {
        let sql = format!(
            "{SELECT_DOCUMENT} WHERE d.collection = $1 AND d.body @> $2
             ORDER BY d.seq ASC LIMIT $3 OFFSET $4"
        );
        let rows = sqlx::query(&sql)
            .bind(collection)
            .bind(query.containment_object())
            .bind(query.limit.map(|l| l as i64))
            .bind(query.offset.unwrap_or(0) as i64)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(Self::row_to_document).collect()
    }
}
