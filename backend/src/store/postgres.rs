//! PostgreSQL document store
//!
//! All documents live in `procurement_documents`. A partial unique index on
//! `unique_key` backs the idempotency guards; guarded writes compare the
//! stored `status` inside the transaction.

use async_trait::async_trait;
use serde_json::Value;
use shared::EntityKind;
use sqlx::{postgres::PgRow, PgPool, Postgres, Row, Transaction};
use uuid::Uuid;

use super::{duplicate_key, stale_write, DocumentFilter, DocumentStore, DocumentWrite, StoredDocument};
use crate::error::{AppError, AppResult};

const UNIQUE_VIOLATION: &str = "23505";

#[derive(Clone)]
pub struct PgDocumentStore {
    db: PgPool,
}

impl PgDocumentStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    fn row_to_document(row: PgRow) -> AppResult<StoredDocument> {
        let kind: String = row.try_get("kind")?;
        let kind = EntityKind::from_str(&kind)
            .ok_or_else(|| AppError::Internal(format!("Unknown document kind: {}", kind)))?;
        Ok(StoredDocument {
            kind,
            id: row.try_get("id")?,
            vendor_id: row.try_get("vendor_id")?,
            parent_id: row.try_get("parent_id")?,
            status: row.try_get("status")?,
            unique_key: row.try_get("unique_key")?,
            body: row.try_get::<Value, _>("body")?,
        })
    }

    async fn apply(tx: &mut Transaction<'_, Postgres>, write: DocumentWrite) -> AppResult<()> {
        let kind = write.kind();
        match write {
            DocumentWrite::Insert(doc) => {
                sqlx::query(
                    r#"
                    INSERT INTO procurement_documents
                        (id, kind, vendor_id, parent_id, status, unique_key, body)
                    VALUES ($1, $2, $3, $4, $5, $6, $7)
                    "#,
                )
                .bind(doc.id)
                .bind(doc.kind.as_str())
                .bind(doc.vendor_id)
                .bind(doc.parent_id)
                .bind(&doc.status)
                .bind(&doc.unique_key)
                .bind(&doc.body)
                .execute(&mut **tx)
                .await
                .map_err(|e| map_unique_violation(e, kind, doc.id, doc.unique_key.as_deref()))?;
            }
            DocumentWrite::Update {
                document,
                expected_status,
            } => {
                let result = sqlx::query(
                    r#"
                    UPDATE procurement_documents
                    SET status = $3, unique_key = $4, body = $5, parent_id = $6, updated_at = NOW()
                    WHERE id = $1 AND kind = $2 AND status = $7
                    "#,
                )
                .bind(document.id)
                .bind(document.kind.as_str())
                .bind(&document.status)
                .bind(&document.unique_key)
                .bind(&document.body)
                .bind(document.parent_id)
                .bind(&expected_status)
                .execute(&mut **tx)
                .await
                .map_err(|e| {
                    map_unique_violation(e, kind, document.id, document.unique_key.as_deref())
                })?;

                if result.rows_affected() == 0 {
                    return Err(stale_write(kind, document.id, &expected_status));
                }
            }
            DocumentWrite::Delete {
                kind,
                id,
                expected_status,
            } => {
                let result = sqlx::query(
                    "DELETE FROM procurement_documents WHERE id = $1 AND kind = $2 AND status = $3",
                )
                .bind(id)
                .bind(kind.as_str())
                .bind(&expected_status)
                .execute(&mut **tx)
                .await?;

                if result.rows_affected() == 0 {
                    return Err(stale_write(kind, id, &expected_status));
                }
            }
        }
        Ok(())
    }
}

fn map_unique_violation(err: sqlx::Error, kind: EntityKind, id: Uuid, key: Option<&str>) -> AppError {
    match &err {
        sqlx::Error::Database(db) if db.code().as_deref() == Some(UNIQUE_VIOLATION) => {
            duplicate_key(kind, id, key.unwrap_or("this id"))
        }
        _ => AppError::Database(err),
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn find(&self, kind: EntityKind, id: Uuid) -> AppResult<Option<StoredDocument>> {
        let row = sqlx::query(
            r#"
            SELECT id, kind, vendor_id, parent_id, status, unique_key, body
            FROM procurement_documents
            WHERE id = $1 AND kind = $2
            "#,
        )
        .bind(id)
        .bind(kind.as_str())
        .fetch_optional(&self.db)
        .await?;

        row.map(Self::row_to_document).transpose()
    }

    async fn query(&self, kind: EntityKind, filter: &DocumentFilter) -> AppResult<Vec<StoredDocument>> {
        let rows = sqlx::query(
            r#"
            SELECT id, kind, vendor_id, parent_id, status, unique_key, body
            FROM procurement_documents
            WHERE kind = $1
              AND ($2::uuid IS NULL OR vendor_id = $2)
              AND ($3::uuid IS NULL OR parent_id = $3)
              AND ($4::varchar IS NULL OR status = $4)
            ORDER BY created_at, id
            "#,
        )
        .bind(kind.as_str())
        .bind(filter.vendor_id)
        .bind(filter.parent_id)
        .bind(&filter.status)
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(Self::row_to_document).collect()
    }

    async fn commit(&self, writes: Vec<DocumentWrite>) -> AppResult<()> {
        let mut tx = self.db.begin().await?;
        for write in writes {
            // Dropping `tx` on error rolls the whole batch back
            Self::apply(&mut tx, write).await?;
        }
        tx.commit().await?;
        Ok(())
    }
}
