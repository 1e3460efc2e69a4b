//! Persistence-facing view of a procurement document

use serde::{de::DeserializeOwned, Serialize};
use uuid::Uuid;

use crate::types::EntityKind;

/// Metadata every stored document exposes to the repository
///
/// `status_label` is the compare-and-swap guard for updates; `unique_key`
/// names a slot that at most one live document may occupy.
pub trait Document: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    const KIND: EntityKind;

    fn id(&self) -> Uuid;

    fn status_label(&self) -> &'static str;

    fn vendor_id(&self) -> Uuid;

    /// The predecessor document in the chain, if any
    fn parent_id(&self) -> Option<Uuid> {
        None
    }

    fn unique_key(&self) -> Option<String> {
        None
    }
}
