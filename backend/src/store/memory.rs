//! In-process document store for development and tests

use std::collections::HashMap;

use async_trait::async_trait;
use shared::EntityKind;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{duplicate_key, stale_write, DocumentFilter, DocumentStore, DocumentWrite, StoredDocument};
use crate::error::AppResult;

#[derive(Debug, Clone, Default)]
struct Snapshot {
    next_seq: u64,
    /// id -> (insertion sequence, document)
    documents: HashMap<Uuid, (u64, StoredDocument)>,
}

impl Snapshot {
    fn check_unique(&self, doc: &StoredDocument) -> AppResult<()> {
        let Some(key) = doc.unique_key.as_deref() else {
            return Ok(());
        };
        let taken = self
            .documents
            .values()
            .any(|(_, other)| other.id != doc.id && other.unique_key.as_deref() == Some(key));
        if taken {
            return Err(duplicate_key(doc.kind, doc.id, key));
        }
        Ok(())
    }

    fn apply(&mut self, write: DocumentWrite) -> AppResult<()> {
        match write {
            DocumentWrite::Insert(doc) => {
                if self.documents.contains_key(&doc.id) {
                    return Err(duplicate_key(doc.kind, doc.id, &doc.id.to_string()));
                }
                self.check_unique(&doc)?;
                let seq = self.next_seq;
                self.next_seq += 1;
                self.documents.insert(doc.id, (seq, doc));
            }
            DocumentWrite::Update {
                document,
                expected_status,
            } => {
                let seq = match self.documents.get(&document.id) {
                    Some((seq, current))
                        if current.kind == document.kind && current.status == expected_status =>
                    {
                        *seq
                    }
                    _ => return Err(stale_write(document.kind, document.id, &expected_status)),
                };
                self.check_unique(&document)?;
                self.documents.insert(document.id, (seq, document));
            }
            DocumentWrite::Delete {
                kind,
                id,
                expected_status,
            } => {
                let current = self
                    .documents
                    .get(&id)
                    .is_some_and(|(_, doc)| doc.kind == kind && doc.status == expected_status);
                if !current {
                    return Err(stale_write(kind, id, &expected_status));
                }
                self.documents.remove(&id);
            }
        }
        Ok(())
    }
}

/// Documents held in a `RwLock`ed map; a commit applies to a copy and swaps it in
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    state: RwLock<Snapshot>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn find(&self, kind: EntityKind, id: Uuid) -> AppResult<Option<StoredDocument>> {
        let state = self.state.read().await;
        Ok(state
            .documents
            .get(&id)
            .filter(|(_, doc)| doc.kind == kind)
            .map(|(_, doc)| doc.clone()))
    }

    async fn query(&self, kind: EntityKind, filter: &DocumentFilter) -> AppResult<Vec<StoredDocument>> {
        let state = self.state.read().await;
        let mut found: Vec<&(u64, StoredDocument)> = state
            .documents
            .values()
            .filter(|(_, doc)| doc.kind == kind && filter.matches(doc))
            .collect();
        found.sort_by_key(|(seq, _)| *seq);
        Ok(found.into_iter().map(|(_, doc)| doc.clone()).collect())
    }

    async fn commit(&self, writes: Vec<DocumentWrite>) -> AppResult<()> {
        let mut state = self.state.write().await;
        let mut next = state.clone();
        for write in writes {
            next.apply(write)?;
        }
        *state = next;
        Ok(())
    }
}
