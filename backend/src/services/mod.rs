//! Business logic services for the procurement document chain
//!
//! Each service reads the snapshots it needs, runs the pure transition from
//! `shared`, commits the resulting writes as one unit of work and then
//! announces the committed transitions.

pub mod component;
pub mod enquiry;
pub mod invoice;
pub mod ledger;
pub mod loi;
pub mod order;
pub mod payment;
pub mod quotation;

pub use component::ComponentService;
pub use enquiry::EnquiryService;
pub use invoice::InvoiceService;
pub use ledger::LedgerService;
pub use loi::LoiService;
pub use order::OrderService;
pub use payment::PaymentService;
pub use quotation::QuotationService;

use serde::Deserialize;
use shared::{Actor, Document, Pagination};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::events::{EventPublisher, TransitionEvent};
use crate::store::{DocumentFilter, Repository};

/// Query string accepted by list endpoints
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListParams {
    pub status: Option<String>,
    pub parent_id: Option<Uuid>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl ListParams {
    pub fn pagination(&self) -> Pagination {
        let defaults = Pagination::default();
        Pagination {
            page: self.page.unwrap_or(defaults.page),
            per_page: self.per_page.unwrap_or(defaults.per_page),
        }
    }

    /// Filter for `actor`: vendors only ever see their own documents
    pub fn filter(&self, actor: &Actor) -> DocumentFilter {
        DocumentFilter {
            vendor_id: crate::middleware::auth::vendor_scope(actor),
            parent_id: self.parent_id,
            status: self.status.clone(),
        }
    }
}

/// Repository and publisher shared by every service
#[derive(Clone)]
pub struct Workflow {
    pub repo: Repository,
    pub events: EventPublisher,
}

impl Workflow {
    pub fn new(repo: Repository, events: EventPublisher) -> Self {
        Self { repo, events }
    }

    /// Fetch a document the actor may see; others' documents read as missing
    pub async fn visible<T: Document>(&self, actor: &Actor, id: Uuid) -> AppResult<T> {
        let doc: T = self.repo.get(id).await?;
        if actor.can_view(doc.vendor_id()) {
            Ok(doc)
        } else {
            Err(AppError::not_found(T::KIND, id))
        }
    }

    pub async fn list<T: Document>(&self, actor: &Actor, params: &ListParams) -> AppResult<Vec<T>> {
        self.repo.list(&params.filter(actor)).await
    }
}

pub(crate) fn created<T: Document>(action: &str, doc: &T, actor: &Actor) -> TransitionEvent {
    TransitionEvent::new(
        T::KIND,
        doc.id(),
        action,
        None,
        Some(doc.status_label()),
        actor,
        doc.vendor_id(),
    )
}

pub(crate) fn changed<T: Document>(action: &str, before: &T, after: &T, actor: &Actor) -> TransitionEvent {
    TransitionEvent::new(
        T::KIND,
        after.id(),
        action,
        Some(before.status_label()),
        Some(after.status_label()),
        actor,
        after.vendor_id(),
    )
}

pub(crate) fn removed<T: Document>(action: &str, doc: &T, actor: &Actor) -> TransitionEvent {
    TransitionEvent::new(
        T::KIND,
        doc.id(),
        action,
        Some(doc.status_label()),
        None,
        actor,
        doc.vendor_id(),
    )
}
