//! Document persistence
//!
//! Every procurement document is stored as a JSON body plus the handful of
//! columns the workflow filters and guards on. Writes are grouped into a
//! [`UnitOfWork`] and committed atomically; updates and deletes carry the
//! status the caller read, so a concurrent transition makes the commit fail
//! with `Conflict` instead of overwriting it.

mod memory;
mod postgres;

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use shared::{Document, EntityKind, WorkflowError};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

pub use memory::MemoryDocumentStore;
pub use postgres::PgDocumentStore;

/// A document as the store sees it
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub kind: EntityKind,
    pub id: Uuid,
    pub vendor_id: Uuid,
    pub parent_id: Option<Uuid>,
    pub status: String,
    /// At most one live document may hold a given key
    pub unique_key: Option<String>,
    pub body: Value,
}

impl StoredDocument {
    pub fn from_document<T: Document>(doc: &T) -> AppResult<Self> {
        let body = serde_json::to_value(doc)
            .map_err(|e| AppError::Internal(format!("Failed to encode {}: {}", T::KIND, e)))?;
        Ok(Self {
            kind: T::KIND,
            id: doc.id(),
            vendor_id: doc.vendor_id(),
            parent_id: doc.parent_id(),
            status: doc.status_label().to_string(),
            unique_key: doc.unique_key(),
            body,
        })
    }

    pub fn decode<T: Document>(self) -> AppResult<T> {
        serde_json::from_value(self.body)
            .map_err(|e| AppError::Internal(format!("Corrupt {} {}: {}", self.kind, self.id, e)))
    }
}

/// Column filters for `query`; `None` matches anything
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentFilter {
    pub vendor_id: Option<Uuid>,
    pub parent_id: Option<Uuid>,
    pub status: Option<String>,
}

impl DocumentFilter {
    pub fn by_parent(parent_id: Uuid) -> Self {
        Self {
            parent_id: Some(parent_id),
            ..Default::default()
        }
    }

    pub fn vendor(mut self, vendor_id: Option<Uuid>) -> Self {
        self.vendor_id = vendor_id;
        self
    }

    pub fn status(mut self, status: Option<String>) -> Self {
        self.status = status;
        self
    }

    pub fn matches(&self, doc: &StoredDocument) -> bool {
        self.vendor_id.map_or(true, |v| doc.vendor_id == v)
            && self.parent_id.map_or(true, |p| doc.parent_id == Some(p))
            && self.status.as_deref().map_or(true, |s| doc.status == s)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DocumentWrite {
    Insert(StoredDocument),
    /// Replace the document if its stored status still equals `expected_status`
    Update {
        document: StoredDocument,
        expected_status: String,
    },
    Delete {
        kind: EntityKind,
        id: Uuid,
        expected_status: String,
    },
}

impl DocumentWrite {
    pub fn kind(&self) -> EntityKind {
        match self {
            DocumentWrite::Insert(doc) => doc.kind,
            DocumentWrite::Update { document, .. } => document.kind,
            DocumentWrite::Delete { kind, .. } => *kind,
        }
    }
}

/// Storage backend for procurement documents
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn find(&self, kind: EntityKind, id: Uuid) -> AppResult<Option<StoredDocument>>;

    /// Matching documents in insertion order
    async fn query(&self, kind: EntityKind, filter: &DocumentFilter) -> AppResult<Vec<StoredDocument>>;

    /// Apply every write or none of them
    async fn commit(&self, writes: Vec<DocumentWrite>) -> AppResult<()>;
}

pub(crate) fn stale_write(kind: EntityKind, id: Uuid, expected_status: &str) -> AppError {
    AppError::Workflow(WorkflowError::conflict(
        kind,
        Some(id),
        format!("{} {} changed concurrently; it is no longer {}", kind, id, expected_status),
    ))
}

pub(crate) fn duplicate_key(kind: EntityKind, id: Uuid, key: &str) -> AppError {
    AppError::Workflow(WorkflowError::conflict(
        kind,
        Some(id),
        format!("another live document already holds {}", key),
    ))
}

/// An atomic batch of writes
#[derive(Debug, Default)]
pub struct UnitOfWork {
    writes: Vec<DocumentWrite>,
}

impl UnitOfWork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<T: Document>(mut self, doc: &T) -> AppResult<Self> {
        self.writes
            .push(DocumentWrite::Insert(StoredDocument::from_document(doc)?));
        Ok(self)
    }

    /// Write `after` over `before`, guarded on `before`'s status
    pub fn update<T: Document>(mut self, before: &T, after: &T) -> AppResult<Self> {
        self.writes.push(DocumentWrite::Update {
            document: StoredDocument::from_document(after)?,
            expected_status: before.status_label().to_string(),
        });
        Ok(self)
    }

    pub fn delete<T: Document>(mut self, doc: &T) -> Self {
        self.writes.push(DocumentWrite::Delete {
            kind: T::KIND,
            id: doc.id(),
            expected_status: doc.status_label().to_string(),
        });
        self
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }
}

/// Typed access to a [`DocumentStore`]
#[derive(Clone)]
pub struct Repository {
    store: Arc<dyn DocumentStore>,
}

impl Repository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryDocumentStore::new()))
    }

    pub async fn find<T: Document>(&self, id: Uuid) -> AppResult<Option<T>> {
        match self.store.find(T::KIND, id).await? {
            Some(doc) => Ok(Some(doc.decode()?)),
            None => Ok(None),
        }
    }

    pub async fn get<T: Document>(&self, id: Uuid) -> AppResult<T> {
        self.find(id)
            .await?
            .ok_or_else(|| AppError::not_found(T::KIND, id))
    }

    pub async fn list<T: Document>(&self, filter: &DocumentFilter) -> AppResult<Vec<T>> {
        self.store
            .query(T::KIND, filter)
            .await?
            .into_iter()
            .map(StoredDocument::decode)
            .collect()
    }

    pub async fn commit(&self, work: UnitOfWork) -> AppResult<()> {
        if work.is_empty() {
            return Ok(());
        }
        self.store.commit(work.writes).await
    }
}
